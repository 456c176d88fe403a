//! `hopguard rules`: print the active exclusion policy table.

use hopguard_core::EngineConfig;
use hopguard_routing::ExclusionRules;

pub fn run(config: &EngineConfig) -> anyhow::Result<()> {
    let rules = ExclusionRules::from_config(&config.exclusion);

    for (reason, policy) in rules.iter() {
        println!("{:<32} {}", reason.as_str(), policy);
    }
    for reason in rules.uncovered() {
        println!("{:<32} -", reason.as_str());
        tracing::warn!(%reason, "failure reason has no exclusion policy");
    }
    Ok(())
}
