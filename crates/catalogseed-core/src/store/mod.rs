//! # Store Seam
//!
//! The coordinators and workers only ever talk to the database through
//! [`Store`]. [`postgres::PgStore`] is the production implementation; the
//! test utilities provide an in-memory one with the same key and conflict
//! rules.

pub mod postgres;

use std::future::Future;

use crate::batch::Statement;
use crate::error::Result;
use crate::schema::{KeyLookup, TableSpec};

pub use postgres::{ConnectionSettings, PgStore};

/// A transactional SQL store shared by every worker in a run.
pub trait Store: Send + Sync + 'static {
    /// `MAX(key)` over the lookup's rows, `None` when there are none.
    fn max_key(&self, lookup: KeyLookup) -> impl Future<Output = Result<Option<i64>>> + Send;

    fn row_count(&self, table: &'static TableSpec) -> impl Future<Output = Result<i64>> + Send;

    /// Ids of categories without a parent.
    fn top_level_categories(&self) -> impl Future<Output = Result<Vec<i64>>> + Send;

    /// `(subcategory_id, parent_id)` for every category that has a parent.
    fn subcategory_links(&self) -> impl Future<Output = Result<Vec<(i64, i64)>>> + Send;

    /// Up to `limit` existing product ids in random order.
    fn sample_product_ids(&self, limit: usize) -> impl Future<Output = Result<Vec<i64>>> + Send;

    /// Run every statement inside one transaction and return the rows
    /// affected. On any failure nothing from the batch is kept.
    fn execute_batch(&self, statements: &[Statement]) -> impl Future<Output = Result<u64>> + Send;
}
