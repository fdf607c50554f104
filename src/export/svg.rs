//! Static SVG rendering of a laid-out neighborhood graph.

use std::fmt::Write as _;

use crate::error::{Result, SemtreeError};
use crate::export::layout::Layout;
use crate::graph::NeighborhoodGraph;

const WIDTH: f32 = 1000.0;
const HEIGHT: f32 = 800.0;
const MARGIN: f32 = 90.0;
const TITLE_SPACE: f32 = 60.0;
const NODE_RADIUS: f32 = 18.0;

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn to_canvas(p: [f32; 2]) -> (f32, f32) {
    let x = MARGIN + (p[0] + 1.0) / 2.0 * (WIDTH - 2.0 * MARGIN);
    let plot_height = HEIGHT - TITLE_SPACE - 2.0 * MARGIN;
    let y = TITLE_SPACE + MARGIN + (1.0 - (p[1] + 1.0) / 2.0) * plot_height;
    (x, y)
}

/// Render `graph` with `layout` as an SVG document.
///
/// `title` lines are drawn centered above the graph. The root node is
/// filled with its role color (blue), every other node red.
pub fn render_svg(graph: &NeighborhoodGraph, layout: &Layout, title: &[String]) -> Result<String> {
    if layout.len() != graph.node_count() {
        return Err(SemtreeError::export(format!(
            "layout has {} positions for {} nodes",
            layout.len(),
            graph.node_count()
        )));
    }

    let mut svg = String::new();
    let fmt_err =
        |e: std::fmt::Error| SemtreeError::export(format!("SVG formatting failed: {e}"));

    writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}">"#
    )
    .map_err(fmt_err)?;
    writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#).map_err(fmt_err)?;

    for (i, line) in title.iter().enumerate() {
        writeln!(
            svg,
            r#"<text x="{}" y="{}" text-anchor="middle" font-family="sans-serif" font-size="16">{}</text>"#,
            WIDTH / 2.0,
            28.0 + i as f32 * 20.0,
            escape(line)
        )
        .map_err(fmt_err)?;
    }

    writeln!(
        svg,
        r##"<g stroke="#555555" stroke-width="1" stroke-opacity="0.6">"##
    )
    .map_err(fmt_err)?;
    for edge in graph.edges() {
        let (Some(a), Some(b)) = (
            graph.node_position(&edge.source).and_then(|i| layout.position(i)),
            graph.node_position(&edge.target).and_then(|i| layout.position(i)),
        ) else {
            continue;
        };
        let (x1, y1) = to_canvas(a);
        let (x2, y2) = to_canvas(b);
        writeln!(
            svg,
            r#"<line x1="{x1:.1}" y1="{y1:.1}" x2="{x2:.1}" y2="{y2:.1}"/>"#
        )
        .map_err(fmt_err)?;
    }
    writeln!(svg, "</g>").map_err(fmt_err)?;

    for (i, node) in graph.nodes().enumerate() {
        let Some(p) = layout.position(i) else {
            continue;
        };
        let (x, y) = to_canvas(p);
        writeln!(
            svg,
            r#"<circle cx="{x:.1}" cy="{y:.1}" r="{NODE_RADIUS}" fill="{}" fill-opacity="0.5"/>"#,
            node.role.color()
        )
        .map_err(fmt_err)?;
        writeln!(
            svg,
            r#"<text x="{x:.1}" y="{:.1}" text-anchor="middle" font-family="sans-serif" font-size="14">{}</text>"#,
            y + 5.0,
            escape(&node.term)
        )
        .map_err(fmt_err)?;
    }

    writeln!(svg, "</svg>").map_err(fmt_err)?;
    Ok(svg)
}
