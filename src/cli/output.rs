//! Output formatting for CLI runs.

use serde::{Deserialize, Serialize};

use crate::cli::args::{OutputFormat, SemtreeArgs};
use crate::error::Result;
use crate::expander::{Expansion, StopReason};
use crate::model::ModelKind;

/// Summary of one traversal run.
#[derive(Debug, Serialize, Deserialize)]
pub struct RunSummary {
    pub model_kind: ModelKind,
    /// The word asked for, if any.
    pub requested: Option<String>,
    pub root: String,
    pub substituted: bool,
    pub nodes: usize,
    pub edges: usize,
    pub scanned: usize,
    pub oracle_calls: usize,
    pub stop: StopReason,
    pub duration_ms: u64,
    pub outputs: Vec<String>,
}

impl RunSummary {
    pub fn new(
        model_kind: ModelKind,
        requested: Option<&str>,
        expansion: &Expansion,
        duration_ms: u64,
        outputs: Vec<String>,
    ) -> Self {
        Self {
            model_kind,
            requested: requested.map(str::to_string),
            root: expansion.root.clone(),
            substituted: expansion.substitution.is_some(),
            nodes: expansion.graph.node_count(),
            edges: expansion.graph.edge_count(),
            scanned: expansion.scanned.len(),
            oracle_calls: expansion.oracle_calls,
            stop: expansion.stop,
            duration_ms,
            outputs,
        }
    }
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize>(message: &str, result: &T, args: &SemtreeArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in human-readable format.
fn output_human<T: Serialize>(message: &str, result: &T, args: &SemtreeArgs) -> Result<()> {
    if args.verbosity() == 0 {
        return Ok(());
    }
    println!("{message}");
    println!();

    let value = serde_json::to_value(result)?;
    match value {
        serde_json::Value::Object(obj) => {
            for (key, val) in obj {
                println!("{key}: {}", format_value(&val));
            }
        }
        other => println!("{}", format_value(&other)),
    }
    Ok(())
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &SemtreeArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

/// Format a JSON value for display.
fn format_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(arr) => arr
            .iter()
            .map(format_value)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&serde_json::json!("king")), "king");
        assert_eq!(format_value(&serde_json::json!(["a.gml", "b.svg"])), "a.gml, b.svg");
        assert_eq!(format_value(&serde_json::json!(3)), "3");
        assert_eq!(format_value(&serde_json::json!(true)), "true");
    }
}
