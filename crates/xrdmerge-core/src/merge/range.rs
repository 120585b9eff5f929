use ndarray::{Ix2, Zip};
use tracing::trace;

use crate::error::{MergeError, Result};
use crate::frame::{Bounds, Sequence};
use crate::pipeline::ProgressReporter;

use super::Merged;

/// Merge a contiguous (optionally reversed) range of a sequence into one
/// averaged and one summed frame.
///
/// The first frame in traversal order seeds both accumulators. Every later
/// frame `f` then updates them as
///
/// ```text
/// average = (average + f) / 2
/// sum     = sum + f
/// ```
///
/// so the average is a decaying one: the k-th frame from the end carries a
/// weight of `1 / 2^k`. It is not the arithmetic mean of the range, and
/// reversing the bounds changes it while leaving the sum untouched.
pub fn reduce_range(
    sequence: &Sequence,
    bounds: Option<Bounds>,
    reporter: &dyn ProgressReporter,
) -> Result<Merged<Ix2>> {
    let order = traversal_order(sequence, bounds)?;
    merge_indices(sequence, &order, reporter, 0)
}

/// Frame indices visited for `bounds`, or the whole sequence in order.
pub fn traversal_order(sequence: &Sequence, bounds: Option<Bounds>) -> Result<Vec<usize>> {
    if sequence.is_empty() {
        return Err(MergeError::EmptyInput);
    }

    match bounds {
        Some(b) => {
            let furthest = b.start.max(b.end);
            if furthest >= sequence.len() {
                return Err(MergeError::FrameIndexOutOfRange {
                    index: furthest,
                    total: sequence.len(),
                });
            }
            Ok(b.indices())
        }
        None => Ok((0..sequence.len()).collect()),
    }
}

/// Run the decay-average recurrence over `order`.
///
/// `done_before` offsets the progress count so windowed merges report a
/// running total across windows.
pub(crate) fn merge_indices(
    sequence: &Sequence,
    order: &[usize],
    reporter: &dyn ProgressReporter,
    done_before: usize,
) -> Result<Merged<Ix2>> {
    let (&first, rest) = order.split_first().ok_or(MergeError::EmptyInput)?;
    let total = order.len();

    let seed = sequence.frame(first)?;
    let mut average = seed.to_owned();
    let mut sum = seed.to_owned();
    trace!(frame = first, position = 1, total, "Merging");
    reporter.advance(done_before + 1);

    for (offset, &index) in rest.iter().enumerate() {
        let frame = sequence.frame(index)?;
        Zip::from(&mut average)
            .and(&mut sum)
            .and(&frame)
            .for_each(|avg, acc, &value| {
                *avg = (*avg + value) / 2.0;
                *acc += value;
            });

        let position = offset + 2;
        trace!(frame = index, position, total, "Merging");
        reporter.advance(done_before + position);
    }

    Ok(Merged { average, sum })
}
