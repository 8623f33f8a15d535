//! Download log load: append-only rows on an hourly grid covering the last
//! two weeks.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;

use crate::batch::statement::build_chunked;
use crate::batch::{BatchRange, Statement};
use crate::dispatch::BatchJob;
use crate::error::{CatalogSeedError, Result};
use crate::generate::records::{hourly_timestamps, DOWNLOAD_WINDOW_DAYS};
use crate::generate::DownloadRecord;
use crate::import::{next_id, run_batches, ImportSettings, ImportSummary};
use crate::progress::Progress;
use crate::schema::{self, KeyLookup};
use crate::store::Store;

pub struct DownloadJob {
    product_space: i64,
    timestamps: Vec<DateTime<Utc>>,
    rows_per_statement: usize,
}

impl BatchJob for DownloadJob {
    async fn build<S: Store>(
        &self,
        _store: &S,
        batch: BatchRange,
        rng: &mut StdRng,
    ) -> Result<Vec<Statement>> {
        let rows: Vec<_> = batch
            .ids()
            .map(|id| DownloadRecord::generate(id, self.product_space, &self.timestamps, rng).to_row())
            .collect();
        build_chunked(&schema::PRODUCT_DOWNLOAD, rows, self.rows_per_statement)
    }
}

pub async fn import_downloads<S: Store>(
    store: Arc<S>,
    settings: &ImportSettings,
    progress: Arc<dyn Progress>,
) -> Result<ImportSummary> {
    let products = store.row_count(&schema::PRODUCT).await?;
    if products == 0 {
        return Err(CatalogSeedError::precondition(
            "no products found - run the products mode first",
        ));
    }
    let product_space = store
        .max_key(KeyLookup::all(&schema::PRODUCT))
        .await?
        .unwrap_or(products)
        .max(1);

    let timestamps = hourly_timestamps(Utc::now(), DOWNLOAD_WINDOW_DAYS);
    tracing::debug!(
        "Generated {} hourly timestamps over {} days",
        timestamps.len(),
        DOWNLOAD_WINDOW_DAYS
    );

    let start_id = next_id(&*store, KeyLookup::all(&schema::PRODUCT_DOWNLOAD), 0).await?;
    let job = DownloadJob {
        product_space,
        timestamps,
        rows_per_statement: settings.batch.downloads,
    };
    Ok(run_batches(store, job, settings, start_id, settings.batch.downloads, progress).await)
}
