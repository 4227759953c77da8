//! Batch planning for a sweep.

use std::num::NonZeroUsize;

/// Number of rounds needed to drain `pending` requests, `batch_size` at a
/// time.
pub fn rounds(pending: u64, batch_size: NonZeroUsize) -> u64 {
    pending.div_ceil(batch_size.get() as u64)
}
