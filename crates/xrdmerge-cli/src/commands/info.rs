use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use xrdmerge_core::consts::{AVERAGED_DATASET, SUMMED_DATASET};
use xrdmerge_core::io::container::{read_dataset, ContainerFormat};

#[derive(Args)]
pub struct InfoArgs {
    /// Merged container (.npz or .hdf)
    pub file: PathBuf,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let size = std::fs::metadata(&args.file)
        .with_context(|| format!("Cannot read {}", args.file.display()))?
        .len();

    println!("File:        {}", args.file.display());
    if let Some(format) = ContainerFormat::from_path(&args.file) {
        println!("Format:      {}", format);
    }
    println!("Size:        {:.1} MB", size as f64 / (1024.0 * 1024.0));

    for name in [AVERAGED_DATASET, SUMMED_DATASET] {
        let array = read_dataset(&args.file, name)
            .with_context(|| format!("Failed to read {name}"))?;
        let (min, max) = array
            .data
            .iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });

        println!();
        println!("{name}");
        println!("  Shape:     {:?}", array.data.shape());
        println!("  Type:      {}", array.sample_type);
        if min <= max {
            println!("  Range:     {min} .. {max}");
        } else {
            println!("  Range:     no finite values");
        }
        if array.data.ndim() == 3 {
            println!("  Windows:   {}", array.data.shape()[0]);
        }
    }

    Ok(())
}
