//! Generated sub-categories under existing top-level categories.

use std::sync::Arc;

use chrono::Utc;
use rand::rngs::StdRng;

use crate::batch::statement::build_chunked;
use crate::batch::{BatchRange, Statement};
use crate::dispatch::BatchJob;
use crate::error::{CatalogSeedError, Result};
use crate::generate::SubcategoryRecord;
use crate::import::{next_id, run_batches, ImportSettings, ImportSummary};
use crate::progress::Progress;
use crate::reference::ReferenceData;
use crate::schema::{self, KeyLookup};
use crate::store::Store;

/// Generated sub-category ids start above this.
pub const SUBCATEGORY_ID_FLOOR: i64 = 10_000;

pub struct SubcategoryJob {
    reference: Arc<ReferenceData>,
    parents: Vec<i64>,
    rows_per_statement: usize,
}

impl BatchJob for SubcategoryJob {
    async fn build<S: Store>(
        &self,
        _store: &S,
        batch: BatchRange,
        rng: &mut StdRng,
    ) -> Result<Vec<Statement>> {
        let now = Utc::now();
        let rows: Vec<_> = batch
            .ids()
            .map(|id| SubcategoryRecord::generate(id, &self.parents, &self.reference, rng).to_row(now))
            .collect();
        build_chunked(&schema::CATEGORY, rows, self.rows_per_statement)
    }
}

pub async fn import_subcategories<S: Store>(
    store: Arc<S>,
    reference: Arc<ReferenceData>,
    settings: &ImportSettings,
    progress: Arc<dyn Progress>,
) -> Result<ImportSummary> {
    let parents = store.top_level_categories().await?;
    if parents.is_empty() {
        return Err(CatalogSeedError::precondition(
            "no top-level categories found - run the categories mode first",
        ));
    }
    tracing::info!("Found {} top-level categories", parents.len());

    let start_id = next_id(&*store, KeyLookup::nested_categories(), SUBCATEGORY_ID_FLOOR).await?;
    let job = SubcategoryJob {
        reference,
        parents,
        rows_per_statement: settings.batch.categories,
    };
    Ok(run_batches(store, job, settings, start_id, settings.batch.categories, progress).await)
}
