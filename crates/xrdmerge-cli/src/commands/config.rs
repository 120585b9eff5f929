use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use xrdmerge_core::io::naming::FileSelection;
use xrdmerge_core::pipeline::config::MergeConfig;

#[derive(Args)]
pub struct ConfigArgs {
    /// Write config to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Print or save a full default MergeConfig as TOML.
pub fn run(args: &ConfigArgs) -> Result<()> {
    let mut config = MergeConfig::new("data", "LaB6", "tif");
    config.selection = FileSelection::range(1, 10);
    config.output.directory = PathBuf::from("merged");
    config.output.format = Some(config.output.resolved_format());
    let toml_str = toml::to_string_pretty(&config)?;

    if let Some(ref path) = args.output {
        std::fs::write(path, &toml_str)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        println!("Default config saved to {}", path.display());
    } else {
        print!("{}", toml_str);
    }

    Ok(())
}
