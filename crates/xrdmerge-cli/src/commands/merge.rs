use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use tracing::debug;
use xrdmerge_core::io::container::ContainerFormat;
use xrdmerge_core::io::naming::FileSelection;
use xrdmerge_core::pipeline::config::MergeConfig;
use xrdmerge_core::pipeline::run_merge_reported;

use crate::progress::BarReporter;
use crate::summary::{print_merge_report, print_merge_summary};

#[derive(Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Npz,
    Hdf5,
}

impl From<FormatArg> for ContainerFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Npz => ContainerFormat::Npz,
            FormatArg::Hdf5 => ContainerFormat::Hdf5,
        }
    }
}

#[derive(Args)]
pub struct MergeArgs {
    /// Common file name prefix, e.g. `LaB6`
    #[arg(required_unless_present = "config")]
    pub basename: Option<String>,

    /// File extension, e.g. `tif`
    #[arg(required_unless_present = "config")]
    pub extension: Option<String>,

    /// First file number
    #[arg(short = 's', long = "start-at")]
    pub start: Option<u32>,

    /// Last file number (inclusive)
    #[arg(short = 'f', long = "finish-at")]
    pub finish: Option<u32>,

    /// Number of files
    #[arg(short = 'n', long)]
    pub number: Option<u32>,

    /// First and last file number
    #[arg(
        short = 'r',
        long,
        num_args = 2,
        value_names = ["START", "FINISH"],
        conflicts_with_all = ["start", "finish", "number"]
    )]
    pub range: Option<Vec<u32>>,

    /// Explicit file numbers, merged in the given order
    #[arg(short = 'l', long, num_args = 1.., conflicts_with_all = ["start", "finish", "number", "range"])]
    pub list: Option<Vec<u32>>,

    /// File numbers to drop from the selection
    #[arg(long, num_args = 1..)]
    pub exclude: Vec<u32>,

    /// File numbers to add to the selection
    #[arg(long, num_args = 1..)]
    pub include: Vec<u32>,

    /// Directory holding the input files
    #[arg(short = 'i', long = "input-dir")]
    pub input_dir: Option<PathBuf>,

    /// Directory for the merged container
    #[arg(short = 'o', long = "output-dir")]
    pub output_dir: Option<PathBuf>,

    /// Merge every W consecutive frames separately
    #[arg(short = 'w', long)]
    pub window: Option<usize>,

    /// Dataset path inside HDF5/NPZ inputs
    #[arg(long)]
    pub dset: Option<String>,

    /// First frame inside a container (may be after --dset-finish)
    #[arg(long = "dset-start")]
    pub dset_start: Option<usize>,

    /// Last frame inside a container (inclusive)
    #[arg(long = "dset-finish")]
    pub dset_finish: Option<usize>,

    /// Digits in the zero-padded file number
    #[arg(long = "zero-fill")]
    pub zero_fill: Option<usize>,

    /// Output container format
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,

    /// Store datasets without compression
    #[arg(long)]
    pub no_compress: bool,

    /// Decode input files in parallel
    #[arg(long)]
    pub parallel: bool,

    /// Merge config file (TOML); command-line options override it
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: &MergeArgs) -> Result<()> {
    let config = build_config(args)?;

    print_merge_summary(&config);

    let reporter = BarReporter::new();
    let report = run_merge_reported(&config, &reporter).context("Merge failed")?;

    print_merge_report(&report);
    Ok(())
}

fn build_config(args: &MergeArgs) -> Result<MergeConfig> {
    let mut config = match args.config {
        Some(ref path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            debug!(path = %path.display(), "Loading merge config");
            toml::from_str(&contents).context("Invalid merge config")?
        }
        None => {
            let (Some(basename), Some(extension)) = (&args.basename, &args.extension) else {
                bail!("BASENAME and EXTENSION are required without --config");
            };
            MergeConfig::new(".", basename, extension)
        }
    };

    if let Some(ref basename) = args.basename {
        config.input.basename = basename.clone();
    }
    if let Some(ref extension) = args.extension {
        config.input.extension = extension.trim_start_matches('.').to_string();
    }
    if let Some(ref dir) = args.input_dir {
        config.input.directory = dir.clone();
    }
    if let Some(ref dir) = args.output_dir {
        config.output.directory = dir.clone();
    }
    if let Some(zero_fill) = args.zero_fill {
        config.input.zero_fill = zero_fill;
    }

    if let Some(selection) = selection_from_args(args) {
        config.selection = selection;
    }
    if !args.exclude.is_empty() {
        config.selection.exclude = args.exclude.clone();
    }
    if !args.include.is_empty() {
        config.selection.include = args.include.clone();
    }

    if args.window.is_some() {
        config.window = args.window;
    }
    if args.dset.is_some() {
        config.dataset.path = args.dset.clone();
    }
    if args.dset_start.is_some() {
        config.dataset.start = args.dset_start;
    }
    if args.dset_finish.is_some() {
        config.dataset.end = args.dset_finish;
    }

    if let Some(format) = args.format {
        config.output.format = Some(format.into());
    }
    if args.no_compress {
        config.output.compress = false;
    }
    if args.parallel {
        config.assembly.parallel = true;
    }

    debug!(?config, "Effective merge config");
    Ok(config)
}

/// File numbers given on the command line, if any.
fn selection_from_args(args: &MergeArgs) -> Option<FileSelection> {
    if let Some(ref list) = args.list {
        return Some(FileSelection::list(list.clone()));
    }
    if let Some(ref range) = args.range {
        if let [start, finish] = range.as_slice() {
            return Some(FileSelection::range(*start, *finish));
        }
    }
    if args.start.is_some() || args.finish.is_some() || args.number.is_some() {
        return Some(FileSelection {
            start: args.start,
            finish: args.finish,
            count: args.number,
            ..Default::default()
        });
    }
    None
}
