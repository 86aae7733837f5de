use hashbrown::HashMap;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::aggregate::AuthorCountryRecord;
use crate::error::{Error, Result};

/// How a country's `size` is set when several records mention it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SizePolicy {
    /// The last record mentioning the country decides its size.
    #[default]
    LastRecord,
    /// Author counts are summed over all records.
    Accumulate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub edge: String,
    pub ego_edge: String,
    pub ego_target: String,
    pub ego_node: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            edge: "red".to_string(),
            ego_edge: "cyan".to_string(),
            ego_target: "blue".to_string(),
            ego_node: "cyan".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CountryNode {
    pub name: String,
    pub size: usize,
    pub color: Option<String>,
}

/// Borrowed view of one edge; `*_ix` are positions in `nodes()` order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CountryEdge<'a> {
    pub source: &'a str,
    pub target: &'a str,
    pub source_ix: usize,
    pub target_ix: usize,
    pub color: &'a str,
}

/// Undirected country graph. Nodes and edges iterate in insertion order.
#[derive(Debug, Clone, Default)]
pub struct CoauthorshipGraph {
    graph: UnGraph<CountryNode, String>,
    name_index: HashMap<String, NodeIndex>,
}

impl CoauthorshipGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn full(records: &[AuthorCountryRecord], policy: SizePolicy, palette: &Palette) -> Self {
        let mut graph = Self::new();
        for rec in records {
            graph.add_record_nodes(rec, policy);
            let countries = rec.countries();
            for (i, a) in countries.iter().enumerate() {
                for b in countries[(i + 1)..].iter() {
                    graph.add_edge(a, b, &palette.edge);
                }
            }
        }
        graph.finish("full")
    }

    /// Only edges touching `target`; its co-occurring countries are not linked to each other.
    pub fn ego(
        records: &[AuthorCountryRecord],
        target: &str,
        policy: SizePolicy,
        palette: &Palette,
    ) -> Result<Self> {
        let target = target.trim();
        if target.is_empty() {
            return Err(Error::InvalidInput("target country is empty".to_string()));
        }
        let mut graph = Self::new();
        for rec in records {
            graph.add_record_nodes(rec, policy);
        }
        for rec in records.iter().filter(|r| r.contains_country(target)) {
            for other in rec.countries().into_iter().filter(|c| *c != target) {
                graph.add_edge(target, other, &palette.ego_edge);
            }
        }
        for node in graph.graph.node_weights_mut() {
            let color = if node.name == target {
                &palette.ego_target
            } else {
                &palette.ego_node
            };
            node.color = Some(color.clone());
        }
        Ok(graph.finish("ego"))
    }

    fn add_record_nodes(&mut self, rec: &AuthorCountryRecord, policy: SizePolicy) {
        for (country, count) in rec.country_counts() {
            self.add_node(country, count, policy);
        }
    }

    fn finish(mut self, kind: &str) -> Self {
        let removed = self.prune_isolated();
        debug!(kind, removed = removed.len(), "pruned isolated countries");
        info!(
            kind,
            nodes = self.node_count(),
            edges = self.edge_count(),
            "built co-authorship graph"
        );
        self
    }

    pub fn add_node(&mut self, name: &str, size: usize, policy: SizePolicy) -> NodeIndex {
        match self.name_index.get(name) {
            Some(&ix) => {
                let node = &mut self.graph[ix];
                node.size = match policy {
                    SizePolicy::LastRecord => size,
                    SizePolicy::Accumulate => node.size + size,
                };
                ix
            }
            None => {
                let ix = self.graph.add_node(CountryNode {
                    name: name.to_string(),
                    size,
                    color: None,
                });
                self.name_index.insert(name.to_string(), ix);
                ix
            }
        }
    }

    fn ensure_node(&mut self, name: &str) -> NodeIndex {
        match self.name_index.get(name) {
            Some(&ix) => ix,
            None => self.add_node(name, 0, SizePolicy::LastRecord),
        }
    }

    /// Adds missing endpoints with size 0. Self loops and repeated pairs are ignored.
    pub fn add_edge(&mut self, a: &str, b: &str, color: &str) {
        if a == b {
            return;
        }
        let ia = self.ensure_node(a);
        let ib = self.ensure_node(b);
        if self.graph.find_edge(ia, ib).is_none() {
            self.graph.add_edge(ia, ib, color.to_string());
        }
    }

    pub fn degree(&self, name: &str) -> usize {
        self.name_index
            .get(name)
            .map_or(0, |&ix| self.graph.edges(ix).count())
    }

    /// Removes degree-zero nodes and returns their names. Survivors keep their order.
    pub fn prune_isolated(&mut self) -> Vec<String> {
        let removed: Vec<String> = self
            .graph
            .node_indices()
            .filter(|&ix| self.graph.neighbors(ix).next().is_none())
            .map(|ix| self.graph[ix].name.clone())
            .collect();
        if removed.is_empty() {
            return removed;
        }
        let graph = &self.graph;
        self.graph = graph.filter_map(
            |ix, n| graph.neighbors(ix).next().map(|_| n.clone()),
            |_, e| Some(e.clone()),
        );
        self.name_index = self
            .graph
            .node_indices()
            .map(|ix| (self.graph[ix].name.clone(), ix))
            .collect();
        removed
    }

    pub fn node(&self, name: &str) -> Option<&CountryNode> {
        self.name_index.get(name).map(|&ix| &self.graph[ix])
    }

    pub fn node_index(&self, name: &str) -> Option<usize> {
        self.name_index.get(name).map(|ix| ix.index())
    }

    pub fn nodes(&self) -> impl Iterator<Item = &CountryNode> {
        self.graph.node_weights()
    }

    pub fn edges(&self) -> impl Iterator<Item = CountryEdge<'_>> {
        self.graph.edge_references().map(move |e| CountryEdge {
            source: &self.graph[e.source()].name,
            target: &self.graph[e.target()].name,
            source_ix: e.source().index(),
            target_ix: e.target().index(),
            color: e.weight(),
        })
    }

    pub fn has_edge(&self, a: &str, b: &str) -> bool {
        match (self.name_index.get(a), self.name_index.get(b)) {
            (Some(&ia), Some(&ib)) => self.graph.find_edge(ia, ib).is_some(),
            _ => false,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Highest-degree countries first, ties by name.
    pub fn top_by_degree(&self, n: usize) -> Vec<(&str, usize)> {
        let mut out: Vec<(&str, usize)> = self
            .graph
            .node_indices()
            .map(|ix| (self.graph[ix].name.as_str(), self.graph.edges(ix).count()))
            .collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        out.truncate(n);
        out
    }
}
