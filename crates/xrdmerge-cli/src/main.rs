mod commands;
mod progress;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "xrdmerge", about = "Merge X-ray diffraction frame series")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Average and sum a series of detector frames into one container
    Merge(commands::merge::MergeArgs),
    /// Render frames as false-colour PNG figures
    Render(commands::render::RenderArgs),
    /// Show the datasets stored in a merged container
    Info(commands::info::InfoArgs),
    /// Print or save a default merge config as TOML
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Merge(args) => commands::merge::run(args),
        Commands::Render(args) => commands::render::run(args),
        Commands::Info(args) => commands::info::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
