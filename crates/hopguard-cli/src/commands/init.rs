//! `hopguard init`: write a default configuration file.

use clap::Args;
use hopguard_core::EngineConfig;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (defaults to current directory).
    #[arg(default_value = ".")]
    pub dir: PathBuf,
}

pub fn run(args: &InitArgs) -> anyhow::Result<()> {
    let config_path = args.dir.join("hopguard.toml");

    if config_path.exists() {
        anyhow::bail!("configuration file already exists at {}", config_path.display());
    }

    EngineConfig::default().save(&config_path)?;
    tracing::info!(path = %config_path.display(), "wrote default config");
    println!("Initialized hopguard config at {}", config_path.display());
    println!("Add [exclusion.rules] entries to override the built-in policies.");

    Ok(())
}
