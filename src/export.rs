use std::{
    fs::{self, File},
    io::BufWriter,
    path::Path,
};

use csv::Writer;
use serde::Serialize;

use crate::coauthor_graph::CoauthorshipGraph;
use crate::error::Result;
use crate::layout::Point;

#[derive(Serialize, Debug)]
struct NodeDump<'a> {
    name: &'a str,
    size: usize,
    color: Option<&'a str>,
    x: f64,
    y: f64,
}

#[derive(Serialize, Debug)]
struct EdgeDump<'a> {
    source: &'a str,
    target: &'a str,
    color: &'a str,
}

#[derive(Serialize, Debug)]
struct GraphDump<'a> {
    nodes: Vec<NodeDump<'a>>,
    edges: Vec<EdgeDump<'a>>,
}

fn edge_dumps(graph: &CoauthorshipGraph) -> Vec<EdgeDump<'_>> {
    graph
        .edges()
        .map(|e| EdgeDump {
            source: e.source,
            target: e.target,
            color: e.color,
        })
        .collect()
}

pub fn write_json(graph: &CoauthorshipGraph, positions: &[Point], path: &Path) -> Result<()> {
    let nodes = graph
        .nodes()
        .zip(positions.iter())
        .map(|(n, p)| NodeDump {
            name: &n.name,
            size: n.size,
            color: n.color.as_deref(),
            x: p[0],
            y: p[1],
        })
        .collect();
    let dump = GraphDump {
        nodes,
        edges: edge_dumps(graph),
    };
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}

pub fn write_edge_csv(graph: &CoauthorshipGraph, path: &Path) -> Result<()> {
    let mut writer = Writer::from_path(path)?;
    for edge in edge_dumps(graph) {
        writer.serialize(edge)?;
    }
    writer.flush()?;
    Ok(())
}

fn dot_quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

pub fn dot_string(graph: &CoauthorshipGraph) -> String {
    let mut out = String::from("graph coauthors {\n");
    for n in graph.nodes() {
        let mut attrs = format!("size={}", n.size);
        if let Some(color) = &n.color {
            attrs.push_str(&format!(", color={}", dot_quote(color)));
        }
        out.push_str(&format!("  {} [{}];\n", dot_quote(&n.name), attrs));
    }
    for e in graph.edges() {
        out.push_str(&format!(
            "  {} -- {} [color={}];\n",
            dot_quote(e.source),
            dot_quote(e.target),
            dot_quote(e.color)
        ));
    }
    out.push_str("}\n");
    out
}

pub fn write_dot(graph: &CoauthorshipGraph, path: &Path) -> Result<()> {
    fs::write(path, dot_string(graph))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::AuthorCountryRecord;
    use crate::coauthor_graph::{Palette, SizePolicy};

    fn sample() -> CoauthorshipGraph {
        let recs: Vec<AuthorCountryRecord> = vec![
            vec![("a", "India"), ("b", "France"), ("c", "France")]
                .into_iter()
                .collect(),
            vec![("d", "France"), ("e", "Kenya")].into_iter().collect(),
        ];
        CoauthorshipGraph::full(&recs, SizePolicy::LastRecord, &Palette::default())
    }

    #[test]
    fn dot_lists_nodes_and_edges() {
        let dot = dot_string(&sample());
        assert!(dot.starts_with("graph coauthors {"));
        assert!(dot.contains(r#""India" -- "France" [color="red"];"#));
        assert!(dot.contains(r#""France" -- "Kenya" [color="red"];"#));
        assert!(dot.contains(r#""France" [size=1];"#));
    }

    #[test]
    fn csv_and_json_files() {
        let dir = tempfile::tempdir().unwrap();
        let g = sample();
        let csv_path = dir.path().join("edges.csv");
        write_edge_csv(&g, &csv_path).unwrap();
        let text = std::fs::read_to_string(&csv_path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["source,target,color", "India,France,red", "France,Kenya,red"]);

        let json_path = dir.path().join("graph.json");
        let pos = vec![[0.0, 1.0], [0.5, -0.5], [-1.0, 0.0]];
        write_json(&g, &pos, &json_path).unwrap();
        let v: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(v["nodes"].as_array().unwrap().len(), 3);
        assert_eq!(v["nodes"][1]["name"], "France");
        assert_eq!(v["nodes"][1]["x"], 0.5);
        assert_eq!(v["edges"][1]["target"], "Kenya");
    }
}
