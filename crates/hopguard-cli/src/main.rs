//! Hopguard CLI: score routes and derive failure exclusions from JSON inputs.
//!
//! Subcommands: init, confidence, exclusions, rules.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use hopguard_core::{EngineConfig, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// Hopguard: route confidence and failure exclusion for payment channel networks.
#[derive(Parser, Debug)]
#[command(name = "hopguard", version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, global = true, default_value = "hopguard.toml")]
    config: PathBuf,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default configuration file.
    Init(commands::init::InitArgs),
    /// Estimate the success probability of a route.
    Confidence(commands::confidence::ConfidenceArgs),
    /// Derive exclusions from a payment failure report.
    Exclusions(commands::exclusions::ExclusionsArgs),
    /// Print the active failure-reason to exclusion-policy table.
    Rules,
}

fn init_tracing(logging: &LoggingConfig, level_override: Option<&str>) {
    let level = level_override.unwrap_or(&logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Logs go to stderr so stdout carries only command output.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = EngineConfig::load(&cli.config)?;
    init_tracing(&config.logging, cli.log_level.as_deref());

    match &cli.command {
        Commands::Init(args) => commands::init::run(args),
        Commands::Confidence(args) => commands::confidence::run(args, &config).await,
        Commands::Exclusions(args) => commands::exclusions::run(args, &config),
        Commands::Rules => commands::rules::run(&config),
    }
}
