//! # Batch Partitioning
//!
//! Splits a run's `[start, start + total)` identifier range into contiguous,
//! bounded batches. Each batch becomes one transaction on one worker.
//!
//! Batch sizes are bounded by the store's per-statement parameter ceiling:
//! `batch × parameters-per-record` must stay strictly below `PARAMETER_LIMIT`.
//! Relation rows (tags per product) are re-chunked in a second pass because
//! their volume is only known after generation.

use std::ops::Range;

use crate::error::{CatalogSeedError, Result};

/// PostgreSQL's bind-parameter ceiling for a single statement.
pub const PARAMETER_LIMIT: usize = 65_535;

/// A contiguous run of pre-assigned identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchRange {
    pub start_id: i64,
    pub count: usize,
}

impl BatchRange {
    pub fn new(start_id: i64, count: usize) -> Self {
        Self { start_id, count }
    }

    /// One past the last identifier.
    pub fn end_id(&self) -> i64 {
        self.start_id + self.count as i64
    }

    pub fn ids(&self) -> Range<i64> {
        self.start_id..self.end_id()
    }
}

/// Largest batch whose parameter count stays strictly below the ceiling.
pub fn max_batch_size(params_per_record: usize) -> usize {
    (PARAMETER_LIMIT - 1) / params_per_record.max(1)
}

/// Reject a batch size that is zero or would overflow the parameter ceiling.
pub fn check_batch_size(entity: &str, batch_size: usize, params_per_record: usize) -> Result<()> {
    if batch_size == 0 {
        return Err(CatalogSeedError::config(format!(
            "batch size for {} must be > 0",
            entity
        )));
    }
    let limit = max_batch_size(params_per_record);
    if batch_size > limit {
        return Err(CatalogSeedError::config(format!(
            "batch size {} for {} needs {} parameters per statement; \
             the limit is {} ({} params per row allows at most {} rows)",
            batch_size,
            entity,
            batch_size * params_per_record,
            PARAMETER_LIMIT,
            params_per_record,
            limit,
        )));
    }
    Ok(())
}

/// Lazily partition `total` identifiers starting at `start_id` into batches of
/// at most `max_batch` (the last batch may be shorter).
pub fn partition(start_id: i64, total: usize, max_batch: usize) -> Partition {
    debug_assert!(max_batch > 0, "max_batch must be > 0");
    Partition {
        next_id: start_id,
        remaining: total,
        max_batch: max_batch.max(1),
    }
}

/// Iterator returned by [`partition`].
#[derive(Debug, Clone)]
pub struct Partition {
    next_id: i64,
    remaining: usize,
    max_batch: usize,
}

impl Iterator for Partition {
    type Item = BatchRange;

    fn next(&mut self) -> Option<BatchRange> {
        if self.remaining == 0 {
            return None;
        }
        let count = self.remaining.min(self.max_batch);
        let batch = BatchRange::new(self.next_id, count);
        self.next_id += count as i64;
        self.remaining -= count;
        Some(batch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining.div_ceil(self.max_batch);
        (n, Some(n))
    }
}

impl ExactSizeIterator for Partition {}
