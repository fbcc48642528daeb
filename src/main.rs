use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use env_logger::Env;

use tessera::{config::ConfigLoader, Simulation};

#[derive(Debug, Parser)]
#[command(author, version, about = "Entity churn simulation on the tessera ECS")]
struct Cli {
    /// Path to the simulation YAML file
    #[arg(long, default_value = "scenarios/churn.yaml")]
    config: PathBuf,

    /// Override tick count (uses config default when omitted)
    #[arg(long)]
    ticks: Option<u64>,

    /// Override the master seed
    #[arg(long)]
    seed: Option<u64>,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let loader = ConfigLoader::new(".");
    let mut config = loader.load(&cli.config)?;
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    env_logger::Builder::from_env(Env::default().default_filter_or(config.log_level.as_str()))
        .init();

    let ticks = config.ticks(cli.ticks);
    let mut simulation = Simulation::new(config)?;
    let summary = simulation.run(ticks)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "Simulation '{}' completed for {} ticks. Alive: {} ({} tagged), created: {}, destroyed: {}, recycled ids: {}, highest version: {}, avg tick: {:.3} ms",
            summary.name,
            summary.ticks,
            summary.alive,
            summary.tagged,
            summary.created,
            summary.destroyed,
            summary.recycled,
            summary.max_version,
            summary.avg_tick_ms
        );
    }
    Ok(())
}
