//! Partitioning of trial groups.
//!
//! - **Threshold split**: whole contrast groups go above or below a session's
//!   psychometric threshold.
//! - **Temporal split**: trials of one matrix go early or late, either by
//!   trial order or by event timestamps relative to a median split time.
//!
//! Every split returns freshly allocated matrices; inputs are never aliased.

mod temporal;
mod threshold;

pub use temporal::{
    match_rows_to_timestamps, split_by_median_time, split_by_order, MedianSplit, MismatchPolicy,
    OrderSplit, TemporalSplit,
};
pub use threshold::{split_by_threshold, validate_threshold, SkippedGroup, ThresholdSplit};

use crate::types::TrialMatrix;

/// Stack matrices vertically. All blocks must have `ncols` columns.
pub(crate) fn stack_rows(blocks: &[&TrialMatrix], ncols: usize) -> TrialMatrix {
    let total: usize = blocks.iter().map(|b| b.nrows()).sum();
    let mut out = TrialMatrix::zeros(total, ncols);

    let mut offset = 0;
    for block in blocks {
        debug_assert_eq!(block.ncols(), ncols);
        let rows = block.nrows();
        out.view_mut((offset, 0), (rows, ncols)).copy_from(*block);
        offset += rows;
    }

    out
}
