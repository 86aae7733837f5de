use std::path::{Path, PathBuf};

use tracing::info;

pub mod aggregate;
pub mod coauthor_graph;
pub mod common;
pub mod config;
pub mod error;
pub mod export;
pub mod layout;
pub mod oa_client;
pub mod oa_structs;
pub mod render;

pub use aggregate::{aggregate, AuthorCountryRecord, CountryCodeTable};
pub use coauthor_graph::{CoauthorshipGraph, Palette, SizePolicy};
pub use config::Config;
pub use error::{Error, Result};

use common::{read_gz, slug, write_gz, Stowage, EGO_PREFIX, FULL_STEM};
use layout::spring_layout;
use oa_client::{gather_records, OpenAlexClient};

pub enum Command {
    Fetch,
    Graph {
        records: Option<PathBuf>,
    },
    Ego {
        target: String,
        records: Option<PathBuf>,
    },
}

pub fn ingest(config: &Config) -> Result<Vec<AuthorCountryRecord>> {
    let client = OpenAlexClient::from_config(&config.query)?;
    gather_records(&client, &config.query, &config.countries)
}

pub fn load_records(path: &Path) -> Result<Vec<AuthorCountryRecord>> {
    let records: Vec<AuthorCountryRecord> = read_gz(path, "records")?;
    info!(path = %path.display(), records = records.len(), "loaded records");
    Ok(records)
}

fn records_or_ingest(records: Option<&Path>, config: &Config) -> Result<Vec<AuthorCountryRecord>> {
    match records {
        Some(path) => load_records(path),
        None => ingest(config),
    }
}

/// Lays out the graph and writes svg, dot, json and an edge csv next to each other.
pub fn write_outputs(
    graph: &CoauthorshipGraph,
    config: &Config,
    stowage: &Stowage,
    stem: &str,
) -> Result<()> {
    for (country, degree) in graph.top_by_degree(5) {
        info!(country, degree, "top collaborator");
    }
    let positions = spring_layout(graph, &config.layout);
    render::write_svg(graph, &positions, &stowage.graph_path(stem, "svg"))?;
    export::write_dot(graph, &stowage.graph_path(stem, "dot"))?;
    export::write_json(graph, &positions, &stowage.graph_path(stem, "json"))?;
    export::write_edge_csv(graph, &stowage.graph_path(&format!("{stem}-edges"), "csv"))?;
    Ok(())
}

pub fn runner(command: &Command, config: &Config) -> Result<()> {
    let stowage = Stowage::new(&config.output.dir)?;
    let graph_conf = &config.graph;
    match command {
        Command::Fetch => {
            let records = ingest(config)?;
            let path = stowage.records_path();
            write_gz(&path, &records)?;
            info!(path = %path.display(), "wrote records");
        }
        Command::Graph { records } => {
            let records = records_or_ingest(records.as_deref(), config)?;
            let graph =
                CoauthorshipGraph::full(&records, graph_conf.size_policy, &graph_conf.palette);
            write_outputs(&graph, config, &stowage, FULL_STEM)?;
        }
        Command::Ego { target, records } => {
            if slug(target).is_empty() {
                return Err(Error::InvalidInput(format!("bad target country {target:?}")));
            }
            let records = records_or_ingest(records.as_deref(), config)?;
            let graph = CoauthorshipGraph::ego(
                &records,
                target,
                graph_conf.size_policy,
                &graph_conf.palette,
            )?;
            let stem = format!("{}-{}", EGO_PREFIX, slug(target));
            write_outputs(&graph, config, &stowage, &stem)?;
        }
    }
    Ok(())
}
