use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use coauthor_net::{runner, Command, Config, SizePolicy};

#[derive(Parser)]
#[command(version, about = "International co-authorship graphs from OpenAlex", long_about = None)]
struct Args {
    /// TOML file with query, graph and layout settings
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, global = true)]
    out: Option<PathBuf>,

    /// OpenAlex source id of the journal
    #[arg(long, global = true)]
    source: Option<String>,

    #[arg(long, global = true)]
    min_year: Option<u16>,

    #[arg(long, global = true)]
    size_policy: Option<SizePolicy>,

    #[arg(long, global = true)]
    seed: Option<u64>,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download works and write aggregated author countries
    Fetch,
    /// Full country co-authorship graph
    Graph {
        /// Reuse a records.json.gz from an earlier fetch
        #[arg(short, long)]
        records: Option<PathBuf>,
    },
    /// Edges of one country only
    Ego {
        #[arg(short, long)]
        target: String,

        #[arg(short, long)]
        records: Option<PathBuf>,
    },
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(out) = &self.out {
            config.output.dir = out.clone();
        }
        if let Some(source) = &self.source {
            config.query.source_id = source.clone();
        }
        if let Some(min_year) = self.min_year {
            config.query.min_year = min_year;
        }
        if let Some(policy) = self.size_policy {
            config.graph.size_policy = policy;
        }
        if let Some(seed) = self.seed {
            config.layout.seed = seed;
        }
    }

    fn to_command(&self) -> Command {
        match &self.command {
            Commands::Fetch => Command::Fetch,
            Commands::Graph { records } => Command::Graph {
                records: records.clone(),
            },
            Commands::Ego { target, records } => Command::Ego {
                target: target.clone(),
                records: records.clone(),
            },
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match Config::load(args.config.as_deref()) {
        Ok(c) => c,
        Err(err) => {
            error!(%err, "could not load config");
            return ExitCode::FAILURE;
        }
    };
    args.apply(&mut config);

    match runner(&args.to_command(), &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "run failed");
            ExitCode::FAILURE
        }
    }
}
