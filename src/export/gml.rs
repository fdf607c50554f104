//! GML (Graph Modelling Language) export.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{Result, SemtreeError};
use crate::graph::{EdgePolicy, NeighborhoodGraph};

/// Quote a GML string value. Quotes, ampersands and non-ASCII characters
/// become character references.
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("&quot;"),
            '&' => out.push_str("&amp;"),
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            c => out.push_str(&format!("&#{};", c as u32)),
        }
    }
    out.push('"');
    out
}

/// Write `graph` as GML. Nodes carry `label` and `color` attributes; edges
/// carry `weight`.
pub fn write_gml<W: Write>(graph: &NeighborhoodGraph, writer: &mut W) -> Result<()> {
    let directed = match graph.policy() {
        EdgePolicy::Directed => 1,
        EdgePolicy::Undirected => 0,
    };
    writeln!(writer, "graph [")?;
    writeln!(writer, "  directed {directed}")?;

    for (id, node) in graph.nodes().enumerate() {
        writeln!(writer, "  node [")?;
        writeln!(writer, "    id {id}")?;
        writeln!(writer, "    label {}", quote(&node.term))?;
        writeln!(writer, "    color {}", quote(node.role.color()))?;
        writeln!(writer, "  ]")?;
    }

    for edge in graph.edges() {
        let (source, target) = match (
            graph.node_position(&edge.source),
            graph.node_position(&edge.target),
        ) {
            (Some(s), Some(t)) => (s, t),
            _ => {
                return Err(SemtreeError::export(format!(
                    "edge {} -> {} references a missing node",
                    edge.source, edge.target
                )));
            }
        };
        writeln!(writer, "  edge [")?;
        writeln!(writer, "    source {source}")?;
        writeln!(writer, "    target {target}")?;
        writeln!(writer, "    weight {}", edge.weight)?;
        writeln!(writer, "  ]")?;
    }

    writeln!(writer, "]")?;
    Ok(())
}

/// Write `graph` as GML to `path`.
pub fn save_gml<P: AsRef<Path>>(graph: &NeighborhoodGraph, path: P) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_gml(graph, &mut writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_gml() {
        let mut graph = NeighborhoodGraph::with_root("king", EdgePolicy::Undirected);
        graph.insert_edge("king", "queen", 0.75);

        let mut out = Vec::new();
        write_gml(&graph, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("graph [\n  directed 0\n"));
        assert!(text.contains("    label \"king\"\n    color \"blue\"\n"));
        assert!(text.contains("    label \"queen\"\n    color \"red\"\n"));
        assert!(text.contains("    source 0\n    target 1\n    weight 0.75\n"));
        assert!(text.ends_with("]\n"));
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("a\"b&c"), "\"a&quot;b&amp;c\"");
        assert_eq!(quote("café"), "\"caf&#233;\"");
    }
}
