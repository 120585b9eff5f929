use std::ops::Range;

use ndarray::{Array3, Axis, Ix3};
use tracing::{debug, warn};

use crate::error::{MergeError, Result};
use crate::frame::{Bounds, Sequence};
use crate::pipeline::ProgressReporter;

use super::range::{merge_indices, traversal_order};
use super::Merged;

/// How a traversal of `frames` frames splits into windows of `window`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowPlan {
    pub frames: usize,
    pub window: usize,
    pub full_windows: usize,
    /// Frames left over after the full windows; they form one final window.
    pub leftover: usize,
}

impl WindowPlan {
    pub fn new(frames: usize, window: usize) -> Result<Self> {
        if window == 0 {
            return Err(MergeError::InvalidOption(
                "window size must be at least 1".into(),
            ));
        }
        if frames == 0 {
            return Err(MergeError::EmptyInput);
        }
        Ok(Self {
            frames,
            window,
            full_windows: frames / window,
            leftover: frames % window,
        })
    }

    pub fn has_partial(&self) -> bool {
        self.leftover != 0
    }

    /// Full windows plus the trailing partial one, if any.
    pub fn total_windows(&self) -> usize {
        self.full_windows + usize::from(self.has_partial())
    }

    /// Traversal positions covered by each window, partial window last.
    pub fn spans(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        (0..self.total_windows()).map(move |i| {
            let start = i * self.window;
            start..(start + self.window).min(self.frames)
        })
    }
}

/// Merge a sequence window by window.
///
/// The traversal (all frames, or `bounds` in its own direction) is cut into
/// consecutive windows of `window` frames, and each window is merged on its
/// own with the same recurrence as [`super::reduce_range`]. A trailing
/// remainder shorter than `window` is merged as one last, smaller window.
pub fn reduce_windowed(
    sequence: &Sequence,
    window: usize,
    bounds: Option<Bounds>,
    reporter: &dyn ProgressReporter,
) -> Result<Merged<Ix3>> {
    let order = traversal_order(sequence, bounds)?;
    let plan = WindowPlan::new(order.len(), window)?;

    if plan.has_partial() {
        warn!(
            frames = plan.frames,
            window,
            leftover = plan.leftover,
            "Frame count does not divide by the window size, the last window is smaller"
        );
        reporter.partial_window(plan.leftover, window);
    }

    let (rows, columns) = sequence.frame_shape();
    let n_windows = plan.total_windows();
    let mut average = Array3::<f64>::zeros((n_windows, rows, columns));
    let mut sum = Array3::<f64>::zeros((n_windows, rows, columns));

    for (i, span) in plan.spans().enumerate() {
        debug!(window = i + 1, of = n_windows, frames = span.len(), "Merging window");
        let done_before = span.start;
        let merged = merge_indices(sequence, &order[span], reporter, done_before)?;
        average.index_axis_mut(Axis(0), i).assign(&merged.average);
        sum.index_axis_mut(Axis(0), i).assign(&merged.sum);
    }

    Ok(Merged { average, sum })
}
