//! # Import Coordinators
//!
//! One coordinator per mode. Each validates its settings, resolves the
//! starting identifier from the store, checks its preconditions, builds the
//! run's read-only inputs once and hands a [`BatchJob`](crate::dispatch::BatchJob)
//! to the dispatcher. Everything that can fail before the first batch fails
//! here, before any write.

pub mod categories;
pub mod downloads;
pub mod products;
pub mod promos;
pub mod subcategories;
pub mod tags;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::batch::partition::{check_batch_size, partition};
use crate::dispatch::{dispatch, BatchJob, DispatchConfig, RunReport};
use crate::error::{CatalogSeedError, Result};
use crate::progress::Progress;
use crate::reference::ReferenceData;
use crate::schema;
use crate::store::Store;

/// Tags loaded when no count is given.
pub const DEFAULT_TAG_COUNT: usize = 12_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportMode {
    Categories,
    Subcategories,
    Tags,
    Products,
    Promos,
    Downloads,
}

impl ImportMode {
    pub const ALL: [ImportMode; 6] = [
        ImportMode::Categories,
        ImportMode::Subcategories,
        ImportMode::Tags,
        ImportMode::Products,
        ImportMode::Promos,
        ImportMode::Downloads,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImportMode::Categories => "categories",
            ImportMode::Subcategories => "subcategories",
            ImportMode::Tags => "tags",
            ImportMode::Products => "products",
            ImportMode::Promos => "promos",
            ImportMode::Downloads => "downloads",
        }
    }

    /// Modes that refuse to run without an explicit positive count.
    pub fn requires_count(&self) -> bool {
        matches!(
            self,
            ImportMode::Subcategories
                | ImportMode::Products
                | ImportMode::Promos
                | ImportMode::Downloads
        )
    }
}

impl fmt::Display for ImportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImportMode {
    type Err = CatalogSeedError;

    fn from_str(s: &str) -> Result<Self> {
        ImportMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| {
                CatalogSeedError::config(format!(
                    "unknown mode '{}'; expected one of: categories, subcategories, tags, \
                     products, promos, downloads",
                    s
                ))
            })
    }
}

/// Rows per statement for each entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSizes {
    pub categories: usize,
    pub tags: usize,
    pub products: usize,
    pub promos: usize,
    pub downloads: usize,
    /// Relation tuples per statement, independent of the product batch.
    pub relations: usize,
}

impl Default for BatchSizes {
    fn default() -> Self {
        Self {
            categories: 1_000,
            tags: 10_000,
            products: 4_000,
            promos: 1_000,
            downloads: 5_000,
            relations: 10_000,
        }
    }
}

impl BatchSizes {
    pub fn validate(&self) -> Result<()> {
        check_batch_size("categories", self.categories, schema::CATEGORY.params_per_row())?;
        check_batch_size("tags", self.tags, schema::TAG.params_per_row())?;
        check_batch_size("products", self.products, schema::PRODUCT.params_per_row())?;
        check_batch_size("promos", self.promos, schema::PRODUCT_PROMO.params_per_row())?;
        check_batch_size(
            "downloads",
            self.downloads,
            schema::PRODUCT_DOWNLOAD.params_per_row(),
        )?;
        check_batch_size(
            "relations",
            self.relations,
            schema::PRODUCT_TAG.params_per_row(),
        )?;
        Ok(())
    }
}

/// Everything a coordinator needs besides the store and reference data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSettings {
    pub mode: ImportMode,
    pub count: Option<usize>,
    pub batch: BatchSizes,
    pub dispatch: DispatchConfig,
}

impl ImportSettings {
    pub fn new(mode: ImportMode, count: Option<usize>) -> Self {
        Self {
            mode,
            count,
            batch: BatchSizes::default(),
            dispatch: DispatchConfig::default(),
        }
    }

    /// Reject settings that cannot produce a valid run. Does no I/O.
    pub fn validate(&self) -> Result<()> {
        if self.mode.requires_count() && self.count.unwrap_or(0) == 0 {
            return Err(CatalogSeedError::config(format!(
                "--count is required and must be > 0 for '{}' mode",
                self.mode
            )));
        }
        if self.mode == ImportMode::Tags && self.count == Some(0) {
            return Err(CatalogSeedError::config("--count must be > 0 for 'tags' mode"));
        }
        if self.dispatch.workers == 0 {
            return Err(CatalogSeedError::config("workers must be > 0"));
        }
        if self.dispatch.queue_capacity == 0 {
            return Err(CatalogSeedError::config("queue_capacity must be > 0"));
        }
        self.batch.validate()
    }

    /// Records this run will generate.
    pub fn requested(&self) -> usize {
        match self.mode {
            ImportMode::Tags => self.count.unwrap_or(DEFAULT_TAG_COUNT),
            _ => self.count.unwrap_or(0),
        }
    }
}

/// Result of one import run.
#[derive(Debug)]
pub struct ImportSummary {
    pub mode: ImportMode,
    pub start_id: i64,
    pub requested: usize,
    /// Records in committed batches.
    pub inserted: u64,
    /// Records that already existed (categories mode only).
    pub skipped: u64,
    /// Rows reported written by the store, relation rows included.
    pub rows_affected: u64,
    pub batches: usize,
    pub failed_batches: usize,
    pub elapsed: Duration,
    /// First batch failure. Counts above still cover every committed batch.
    pub first_error: Option<CatalogSeedError>,
}

impl ImportSummary {
    pub fn is_success(&self) -> bool {
        self.first_error.is_none()
    }

    /// Records per second over the whole run.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.inserted as f64 / secs
        } else {
            0.0
        }
    }

    /// Turn a failed run into its first error.
    pub fn into_result(self) -> Result<Self> {
        match self.first_error {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }

    fn from_report(
        mode: ImportMode,
        start_id: i64,
        requested: usize,
        report: RunReport,
        started: Instant,
    ) -> Self {
        Self {
            mode,
            start_id,
            requested,
            inserted: report.records,
            skipped: 0,
            rows_affected: report.rows_affected,
            batches: report.batches,
            failed_batches: report.failed_batches,
            elapsed: started.elapsed(),
            first_error: report.first_error,
        }
    }
}

/// Run one import end to end.
///
/// Configuration and precondition failures come back as `Err` before any
/// write. Batch failures do not: they are reported through
/// [`ImportSummary::first_error`] once every batch has been attempted.
pub async fn run_import<S: Store>(
    store: Arc<S>,
    reference: Arc<ReferenceData>,
    settings: &ImportSettings,
    progress: Arc<dyn Progress>,
) -> Result<ImportSummary> {
    settings.validate()?;
    reference.validate()?;

    match settings.mode {
        ImportMode::Categories => {
            categories::import_categories(&*store, &reference, settings, &*progress).await
        }
        ImportMode::Subcategories => {
            subcategories::import_subcategories(store, reference, settings, progress).await
        }
        ImportMode::Tags => tags::import_tags(store, reference, settings, progress).await,
        ImportMode::Products => {
            products::import_products(store, reference, settings, progress).await
        }
        ImportMode::Promos => promos::import_promos(store, reference, settings, progress).await,
        ImportMode::Downloads => downloads::import_downloads(store, settings, progress).await,
    }
}

/// Partition `[start_id, start_id + requested)` and dispatch `job` over it.
async fn run_batches<S: Store, J: BatchJob>(
    store: Arc<S>,
    job: J,
    settings: &ImportSettings,
    start_id: i64,
    batch_size: usize,
    progress: Arc<dyn Progress>,
) -> ImportSummary {
    let started = Instant::now();
    let requested = settings.requested();

    tracing::info!(
        "Importing {} {} from id {} in batches of {} using {} workers",
        requested,
        settings.mode,
        start_id,
        batch_size,
        settings.dispatch.workers
    );

    let report = dispatch(
        store,
        Arc::new(job),
        partition(start_id, requested, batch_size),
        settings.dispatch,
        progress,
    )
    .await;

    let summary = ImportSummary::from_report(settings.mode, start_id, requested, report, started);
    tracing::info!(
        "Finished {}: {} inserted in {} batches ({} failed) in {:.1?}",
        summary.mode,
        summary.inserted,
        summary.batches,
        summary.failed_batches,
        summary.elapsed
    );
    summary
}

/// `max(key) + 1`, or `floor + 1` when the table is empty or below `floor`.
async fn next_id<S: Store>(store: &S, lookup: schema::KeyLookup, floor: i64) -> Result<i64> {
    let max = store.max_key(lookup).await?.unwrap_or(floor);
    Ok(max.max(floor) + 1)
}
