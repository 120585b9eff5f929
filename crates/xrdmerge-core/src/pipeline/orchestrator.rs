use std::path::PathBuf;

use tracing::info;

use crate::assemble::assemble;
use crate::error::{MergeError, Result};
use crate::frame::Sequence;
use crate::io::container::write_result;
use crate::io::loader::{load_stack, DefaultLoader, FrameSource, InputKind};
use crate::io::naming::{build_file_path, discover_separator, output_file_name};
use crate::merge::reduce;

use super::config::MergeConfig;
use super::types::{MergeReport, MergeStage, NoOpReporter, ProgressReporter};

/// How the frames of one acquisition are stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputPlan {
    /// One frame per file.
    Files(Vec<FrameSource>),
    /// A single container holding the whole frame stack.
    Container {
        path: PathBuf,
        dataset: Option<String>,
    },
}

/// Decide how to read the selected file numbers.
///
/// A single container file is read as a frame stack; anything else is one
/// frame per file, taken from `dataset.path` for container files.
pub fn plan_input(config: &MergeConfig, numbers: &[u32], separator: char) -> InputPlan {
    let input = &config.input;
    let kind = InputKind::from_extension(&input.extension);
    let paths: Vec<PathBuf> = numbers
        .iter()
        .map(|&n| {
            build_file_path(
                &input.directory,
                &input.basename,
                n,
                &input.extension,
                separator,
                input.zero_fill,
            )
        })
        .collect();

    if kind.is_container() && paths.len() == 1 {
        return InputPlan::Container {
            path: paths[0].clone(),
            dataset: config.dataset.path.clone(),
        };
    }

    let sources = paths
        .into_iter()
        .map(|p| match (&config.dataset.path, kind.is_container()) {
            (Some(dataset), true) => FrameSource::Dataset {
                container: p,
                dataset: dataset.clone(),
            },
            _ => FrameSource::File(p),
        })
        .collect();
    InputPlan::Files(sources)
}

/// Run a full merge with a thread-safe progress reporter.
pub fn run_merge_reported(
    config: &MergeConfig,
    reporter: &dyn ProgressReporter,
) -> Result<MergeReport> {
    config.validate()?;
    let input = &config.input;

    reporter.begin_stage(MergeStage::Discovering, None);
    let numbers = config.selection.resolve()?;
    let separator = match input.separator {
        Some(sep) => sep,
        None => discover_separator(
            &input.directory,
            &input.basename,
            numbers[0],
            &input.extension,
            input.zero_fill,
        )?,
    };
    reporter.finish_stage();
    info!(files = numbers.len(), separator = %separator, "Resolved input files");

    let sequence = load_sequence(config, &plan_input(config, &numbers, separator), reporter)?;
    let (rows, columns) = sequence.frame_shape();
    info!(frames = sequence.len(), rows, columns, "Sequence assembled");

    let bounds = config.dataset.bounds(sequence.len());
    let frames_merged = bounds.map_or(sequence.len(), |b| b.len());
    reporter.begin_stage(MergeStage::Merging, Some(frames_merged));
    let result = reduce(&sequence, bounds, config.window, reporter)?;
    reporter.finish_stage();
    drop(sequence);

    let format = config.output.resolved_format();
    std::fs::create_dir_all(&config.output.directory)
        .map_err(|e| MergeError::write(&config.output.directory, e))?;
    let output = config.output.directory.join(output_file_name(
        &input.basename,
        &numbers,
        bounds,
        format.extension(),
    ));

    reporter.begin_stage(MergeStage::Writing, None);
    write_result(&output, &result, &config.output.write_options())?;
    reporter.finish_stage();

    Ok(MergeReport {
        output,
        frames_merged,
        windows: result.window_count(),
        frame_shape: (rows, columns),
    })
}

fn load_sequence(
    config: &MergeConfig,
    plan: &InputPlan,
    reporter: &dyn ProgressReporter,
) -> Result<Sequence> {
    match plan {
        InputPlan::Files(sources) => {
            reporter.begin_stage(MergeStage::Loading, Some(sources.len()));
            let loader = DefaultLoader::with_dataset(config.dataset.path.clone());
            let sequence = assemble(&loader, sources, config.assembly, reporter)?;
            reporter.finish_stage();
            Ok(sequence)
        }
        InputPlan::Container { path, dataset } => {
            reporter.begin_stage(MergeStage::Loading, None);
            info!(container = %path.display(), "Reading frame stack");
            let sequence = load_stack(path, dataset.as_deref())?;
            reporter.finish_stage();
            Ok(sequence)
        }
    }
}

/// Run a full merge without progress reporting.
pub fn run_merge(config: &MergeConfig) -> Result<MergeReport> {
    run_merge_reported(config, &NoOpReporter)
}
