//! Concourse - Terminal Routing Simulation
//!
//! Runs route manager scenarios against a simulated airport terminal.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use concourse_logging::{ConcourseSubscriberBuilder, FileConfig, LogConfig};
use concourse_routing::RoutingConfig;
use concourse_simulation::{ScenarioReport, SimOptions, scenarios};

#[derive(Parser)]
#[command(
    name = "concourse-sim",
    about = "Indoor/outdoor route manager simulation",
    version
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log every calculation step as JSONL
    #[arg(long, global = true, conflicts_with = "verbose")]
    trace_routes: bool,

    /// Print reports as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Also write JSONL logs into this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Delay of every navigation service call, in milliseconds
    #[arg(long, global = true, default_value = "5")]
    latency_ms: u64,

    /// Routing configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Multi-stop errands from the traveller's position
    Tsp,

    /// Point to point routes across indoor and outdoor legs
    Simple,

    /// Live updates: user movement, profile and floor switches
    Mixed,

    /// Many routes invalidated and removed mid-calculation
    Churn {
        /// Number of routes
        #[arg(short, long, default_value = "50")]
        routes: usize,

        /// Seed for picking route endpoints
        #[arg(short, long, default_value = "7")]
        seed: u64,
    },

    /// Missing user location and outdoor outage
    Failure,

    /// Run every scenario
    All,
}

fn logging(cli: &Cli) -> LogConfig {
    let mut config = if cli.trace_routes {
        LogConfig::route_trace()
    } else if cli.verbose {
        LogConfig::interactive()
    } else {
        LogConfig::quiet()
    };
    if let Some(dir) = &cli.log_dir {
        config.file = Some(FileConfig::single(dir, "concourse-sim"));
    }
    config
}

fn routing(cli: &Cli) -> anyhow::Result<RoutingConfig> {
    match &cli.config {
        Some(path) => {
            let contents = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&contents)?)
        }
        None => Ok(RoutingConfig::default()),
    }
}

fn print(cli: &Cli, reports: &[ScenarioReport]) -> anyhow::Result<()> {
    if cli.json {
        println!("{}", serde_json::to_string_pretty(reports)?);
    } else {
        for report in reports {
            println!("{report}");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = ConcourseSubscriberBuilder::new()
        .with_config(logging(&cli))
        .init();

    let mut options = SimOptions {
        latency: Duration::from_millis(cli.latency_ms),
        routing: routing(&cli)?,
        ..Default::default()
    };

    let reports = match &cli.command {
        Commands::Tsp => vec![scenarios::run_tsp_scenario(&options).await?],
        Commands::Simple => vec![scenarios::run_simple_scenario(&options).await?],
        Commands::Mixed => vec![scenarios::run_mixed_scenario(&options).await?],
        Commands::Churn { routes, seed } => {
            options.routes = *routes;
            options.seed = *seed;
            vec![scenarios::run_churn_scenario(&options).await?]
        }
        Commands::Failure => vec![scenarios::run_failure_scenario(&options).await?],
        Commands::All => scenarios::run_all(&options).await?,
    };

    print(&cli, &reports)
}
