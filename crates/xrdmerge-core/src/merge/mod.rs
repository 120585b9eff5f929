pub mod range;
pub mod window;

use ndarray::{Array, ArrayViewD, Dimension, Ix2, Ix3};

use crate::error::Result;
use crate::frame::{Bounds, Sequence};
use crate::pipeline::ProgressReporter;

pub use range::{reduce_range, traversal_order};
pub use window::{reduce_windowed, WindowPlan};

/// An averaged and a summed array of identical shape.
#[derive(Clone, Debug)]
pub struct Merged<D: Dimension> {
    pub average: Array<f64, D>,
    pub sum: Array<f64, D>,
}

/// Output of [`reduce`]: one frame pair, or one stacked pair per window.
#[derive(Clone, Debug)]
pub enum ReductionResult {
    Whole(Merged<Ix2>),
    Windowed(Merged<Ix3>),
}

impl ReductionResult {
    pub fn average(&self) -> ArrayViewD<'_, f64> {
        match self {
            Self::Whole(m) => m.average.view().into_dyn(),
            Self::Windowed(m) => m.average.view().into_dyn(),
        }
    }

    pub fn sum(&self) -> ArrayViewD<'_, f64> {
        match self {
            Self::Whole(m) => m.sum.view().into_dyn(),
            Self::Windowed(m) => m.sum.view().into_dyn(),
        }
    }

    pub fn shape(&self) -> Vec<usize> {
        self.average().shape().to_vec()
    }

    /// Number of windows, or `None` for a whole-range merge.
    pub fn window_count(&self) -> Option<usize> {
        match self {
            Self::Whole(_) => None,
            Self::Windowed(m) => Some(m.average.dim().0),
        }
    }
}

/// Merge a sequence into averaged and summed data.
///
/// Without `window` the (bounded) range collapses to a single frame pair.
/// With `window` each consecutive block of that many frames is merged
/// separately and the results are stacked.
pub fn reduce(
    sequence: &Sequence,
    bounds: Option<Bounds>,
    window: Option<usize>,
    reporter: &dyn ProgressReporter,
) -> Result<ReductionResult> {
    match window {
        Some(w) => reduce_windowed(sequence, w, bounds, reporter).map(ReductionResult::Windowed),
        None => reduce_range(sequence, bounds, reporter).map(ReductionResult::Whole),
    }
}
