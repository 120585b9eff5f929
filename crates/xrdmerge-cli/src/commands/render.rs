use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use xrdmerge_core::consts::{DEFAULT_OUTLIER_PERCENT, DEFAULT_TICK_SPACING};
use xrdmerge_core::io::loader::DefaultLoader;
use xrdmerge_core::pipeline::{MergeStage, ProgressReporter};
use xrdmerge_core::render::{figure_path, render_to_file, Colormap, RenderOptions, RenderSource};

use crate::progress::BarReporter;
use crate::summary::print_render_line;

#[derive(Clone, Copy, ValueEnum)]
pub enum ColormapArg {
    BluesR,
    Gray,
}

impl From<ColormapArg> for Colormap {
    fn from(arg: ColormapArg) -> Self {
        match arg {
            ColormapArg::BluesR => Colormap::BluesR,
            ColormapArg::Gray => Colormap::Gray,
        }
    }
}

#[derive(Args)]
pub struct RenderArgs {
    /// Single image to render
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Several images to render
    #[arg(short, long, num_args = 1..)]
    pub list: Option<Vec<PathBuf>>,

    /// Render every TIFF in this directory
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Histogram bins below this percentage of the fullest bin are outliers
    #[arg(short = 'o', long = "outlier-percent", default_value_t = DEFAULT_OUTLIER_PERCENT)]
    pub outlier_percent: f64,

    /// Fixed colour limits instead of histogram-derived ones
    #[arg(long = "histo-lims", num_args = 2, value_names = ["MIN", "MAX"], allow_negative_numbers = true)]
    pub histo_lims: Option<Vec<f64>>,

    /// Colour map
    #[arg(long, value_enum, default_value = "blues-r")]
    pub colormap: ColormapArg,

    /// Pixels between axis ticks
    #[arg(long, default_value_t = DEFAULT_TICK_SPACING)]
    pub tick_spacing: usize,

    /// Write figures here instead of next to the inputs
    #[arg(long = "out-dir")]
    pub out_dir: Option<PathBuf>,
}

pub fn run(args: &RenderArgs) -> Result<()> {
    let source = RenderSource::from_options(args.file.clone(), args.list.clone(), args.dir.clone())?;
    let files = source.resolve()?;

    let options = RenderOptions {
        outlier_percent: args.outlier_percent,
        limits: match args.histo_lims.as_deref() {
            Some([lo, hi]) => Some((*lo, *hi)),
            _ => None,
        },
        colormap: args.colormap.into(),
        tick_spacing: args.tick_spacing,
    };

    if let Some(ref dir) = args.out_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let loader = DefaultLoader::default();
    let reporter = BarReporter::new();
    reporter.begin_stage(MergeStage::Rendering, Some(files.len()));

    let mut rendered = Vec::with_capacity(files.len());
    for (i, input) in files.iter().enumerate() {
        let output = figure_path(input, args.out_dir.as_deref());
        let limits = render_to_file(&loader, input, &output, &options)
            .with_context(|| format!("Failed to render {}", input.display()))?;
        rendered.push((output, limits));
        reporter.advance(i + 1);
    }
    reporter.finish_stage();

    println!();
    for (input, (output, limits)) in files.iter().zip(&rendered) {
        print_render_line(input, output, *limits);
    }
    Ok(())
}
