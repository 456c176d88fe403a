//! `hopguard exclusions`: derive exclusions from a payment failure report.

use std::path::PathBuf;

use clap::Args;
use hopguard_core::EngineConfig;
use hopguard_routing::{ExclusionMapper, ExclusionRules, FailureReport};

#[derive(Args, Debug)]
pub struct ExclusionsArgs {
    /// JSON failure report: `reporting_node`, `failing_channel`, `reason`, `attempted_hops`.
    #[arg(short, long)]
    pub input: PathBuf,
}

pub fn run(args: &ExclusionsArgs, config: &EngineConfig) -> anyhow::Result<()> {
    let report: FailureReport = super::read_json(&args.input)?;
    let mapper = ExclusionMapper::new(ExclusionRules::from_config(&config.exclusion));

    let exclusions = mapper.derive_exclusions(&report)?;
    tracing::info!(count = exclusions.len(), "derived exclusions");
    println!("{}", serde_json::to_string_pretty(&exclusions)?);
    Ok(())
}
