use std::{fs, path::Path};

use tracing::info;

use crate::coauthor_graph::CoauthorshipGraph;
use crate::error::Result;
use crate::layout::Point;

pub const DEFAULT_NODE_COLOR: &str = "#1f78b4";
pub const SIZE_SCALE: f64 = 200.0;

const WIDTH: f64 = 1000.0;
const HEIGHT: f64 = 800.0;
const MARGIN: f64 = 70.0;
const PX_PER_PT: f64 = 100.0 / 72.0;
const FONT_PX: f64 = 12.0 * PX_PER_PT;

/// Node radius in pixels for an area of `size * SIZE_SCALE` square points.
pub fn node_radius(size: usize) -> f64 {
    ((size as f64) * SIZE_SCALE / std::f64::consts::PI).sqrt() * PX_PER_PT
}

fn to_canvas(p: &Point) -> (f64, f64) {
    let half_w = (WIDTH - 2.0 * MARGIN) / 2.0;
    let half_h = (HEIGHT - 2.0 * MARGIN) / 2.0;
    (WIDTH / 2.0 + p[0] * half_w, HEIGHT / 2.0 - p[1] * half_h)
}

pub fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn svg_string(graph: &CoauthorshipGraph, positions: &[Point]) -> String {
    let mut out = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{WIDTH}\" height=\"{HEIGHT}\" \
         viewBox=\"0 0 {WIDTH} {HEIGHT}\">\n"
    );
    out.push_str("<rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");

    out.push_str("<g class=\"edges\">\n");
    for e in graph.edges() {
        let (x1, y1) = to_canvas(&positions[e.source_ix]);
        let (x2, y2) = to_canvas(&positions[e.target_ix]);
        out.push_str(&format!(
            "<line x1=\"{x1:.2}\" y1=\"{y1:.2}\" x2=\"{x2:.2}\" y2=\"{y2:.2}\" stroke=\"{}\" \
             stroke-width=\"1\"/>\n",
            xml_escape(e.color)
        ));
    }
    out.push_str("</g>\n");

    out.push_str("<g class=\"nodes\">\n");
    for (node, p) in graph.nodes().zip(positions.iter()) {
        let (x, y) = to_canvas(p);
        let color = node.color.as_deref().unwrap_or(DEFAULT_NODE_COLOR);
        out.push_str(&format!(
            "<circle cx=\"{x:.2}\" cy=\"{y:.2}\" r=\"{:.2}\" fill=\"{}\">\
             <title>{} ({})</title></circle>\n",
            node_radius(node.size),
            xml_escape(color),
            xml_escape(&node.name),
            node.size
        ));
    }
    out.push_str("</g>\n");

    out.push_str(&format!(
        "<g class=\"labels\" font-family=\"sans-serif\" font-size=\"{FONT_PX:.1}\" \
         text-anchor=\"middle\" dominant-baseline=\"central\">\n"
    ));
    for (node, p) in graph.nodes().zip(positions.iter()) {
        let (x, y) = to_canvas(p);
        out.push_str(&format!(
            "<text x=\"{x:.2}\" y=\"{y:.2}\">{}</text>\n",
            xml_escape(&node.name)
        ));
    }
    out.push_str("</g>\n</svg>\n");
    out
}

pub fn write_svg(graph: &CoauthorshipGraph, positions: &[Point], path: &Path) -> Result<()> {
    fs::write(path, svg_string(graph, positions))?;
    info!(path = %path.display(), nodes = graph.node_count(), "rendered figure");
    Ok(())
}
