use std::sync::atomic::{AtomicUsize, Ordering};

use ndarray::{Array3, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MergeError, Result};
use crate::frame::{Frame, Sequence};
use crate::io::loader::{FrameLoader, FrameSource};
use crate::pipeline::ProgressReporter;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyOptions {
    /// Decode files on the rayon pool. Frame order and validation are the
    /// same as the sequential path.
    #[serde(default)]
    pub parallel: bool,
}

/// Load every source in order and stack the frames into one sequence.
///
/// The backing store is allocated only once the first frame has told us
/// the frame shape; every later frame must match it.
pub fn assemble(
    loader: &dyn FrameLoader,
    sources: &[FrameSource],
    options: AssemblyOptions,
    reporter: &dyn ProgressReporter,
) -> Result<Sequence> {
    if sources.is_empty() {
        return Err(MergeError::EmptyInput);
    }

    if options.parallel {
        assemble_parallel(loader, sources, reporter)
    } else {
        assemble_sequential(loader, sources, reporter)
    }
}

fn assemble_sequential(
    loader: &dyn FrameLoader,
    sources: &[FrameSource],
    reporter: &dyn ProgressReporter,
) -> Result<Sequence> {
    let mut data: Option<Array3<f64>> = None;
    let mut expected = (0, 0);

    for (index, source) in sources.iter().enumerate() {
        debug!(file = %source, "Reading");
        let frame = loader.load(source)?;

        if data.is_none() {
            expected = frame.shape();
            data = Some(Array3::<f64>::zeros((sources.len(), expected.0, expected.1)));
        } else {
            check_shape(&frame, index, expected)?;
        }
        if let Some(stack) = data.as_mut() {
            stack.index_axis_mut(Axis(0), index).assign(&frame.data);
        }
        reporter.advance(index + 1);
    }

    Sequence::from_array(data.ok_or(MergeError::EmptyInput)?)
}

fn assemble_parallel(
    loader: &dyn FrameLoader,
    sources: &[FrameSource],
    reporter: &dyn ProgressReporter,
) -> Result<Sequence> {
    let done = AtomicUsize::new(0);
    let frames = sources
        .par_iter()
        .map(|source| -> Result<Frame> {
            debug!(file = %source, "Reading");
            let frame = loader.load(source)?;
            reporter.advance(done.fetch_add(1, Ordering::Relaxed) + 1);
            Ok(frame)
        })
        .collect::<Result<Vec<Frame>>>()?;

    Sequence::from_frames(&frames)
}

fn check_shape(frame: &Frame, index: usize, expected: (usize, usize)) -> Result<()> {
    if frame.shape() != expected {
        return Err(MergeError::ShapeMismatch {
            index,
            expected,
            found: frame.shape(),
        });
    }
    Ok(())
}
