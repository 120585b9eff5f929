use ndarray::ArrayView2;

use crate::consts::HISTOGRAM_BINS;
use crate::error::{MergeError, Result};

/// Equal-width histogram. `edges` has one more entry than `counts`.
#[derive(Clone, Debug, PartialEq)]
pub struct Histogram {
    pub counts: Vec<u64>,
    pub edges: Vec<f64>,
}

impl Histogram {
    /// Bin the finite values of `values` over their own range.
    ///
    /// The last bin is closed on the right, and a constant input is spread
    /// over `[v - 0.5, v + 0.5]`, as numpy does.
    pub fn compute<'a>(values: impl IntoIterator<Item = &'a f64>, bins: usize) -> Option<Self> {
        let finite: Vec<f64> = values.into_iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() || bins == 0 {
            return None;
        }

        let mut lo = finite.iter().copied().fold(f64::INFINITY, f64::min);
        let mut hi = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }

        let width = (hi - lo) / bins as f64;
        let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();

        let mut counts = vec![0u64; bins];
        let scale = bins as f64 / (hi - lo);
        for v in finite {
            let bin = (((v - lo) * scale) as usize).min(bins - 1);
            counts[bin] += 1;
        }

        Some(Self { counts, edges })
    }
}

/// Colour-scale limits from intensity frequencies.
///
/// Builds a 256-bin histogram, drops the top edge so each bin is named by
/// its left edge, and keeps the bins whose count is above
/// `max(count) * outlier_percent / 100`. Returns the lowest and highest
/// kept edge. Sparse tails (hot pixels, dead regions) fall below the floor
/// and are trimmed.
pub fn histogram_limits(data: ArrayView2<'_, f64>, outlier_percent: f64) -> Result<(f64, f64)> {
    if !(0.0..100.0).contains(&outlier_percent) {
        return Err(MergeError::InvalidOption(format!(
            "outlier percentage must be in [0, 100), got {outlier_percent}"
        )));
    }

    let hist = Histogram::compute(data.iter(), HISTOGRAM_BINS).ok_or(MergeError::EmptyInput)?;
    let max_count = hist.counts.iter().copied().max().unwrap_or(0);
    let floor = max_count as f64 * (outlier_percent / 100.0);

    let mut kept = hist
        .counts
        .iter()
        .zip(&hist.edges)
        .filter(|(count, _)| **count as f64 > floor)
        .map(|(_, edge)| *edge);

    let first = kept.next().ok_or(MergeError::EmptyInput)?;
    let (lo, hi) = kept.fold((first, first), |(lo, hi), e| (lo.min(e), hi.max(e)));
    Ok((lo, hi))
}
