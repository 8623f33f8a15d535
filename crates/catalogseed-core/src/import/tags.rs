//! Tag load: `adjective-noun` or bare-noun slugs, appended after the
//! highest existing tag id.

use std::sync::Arc;

use rand::rngs::StdRng;

use crate::batch::statement::build_chunked;
use crate::batch::{BatchRange, Statement};
use crate::dispatch::BatchJob;
use crate::error::Result;
use crate::generate::records::tag_row;
use crate::import::{next_id, run_batches, ImportSettings, ImportSummary};
use crate::progress::Progress;
use crate::reference::ReferenceData;
use crate::schema::{self, KeyLookup};
use crate::store::Store;

pub struct TagJob {
    reference: Arc<ReferenceData>,
    rows_per_statement: usize,
}

impl TagJob {
    pub fn new(reference: Arc<ReferenceData>, rows_per_statement: usize) -> Self {
        Self {
            reference,
            rows_per_statement,
        }
    }
}

impl BatchJob for TagJob {
    async fn build<S: Store>(
        &self,
        _store: &S,
        batch: BatchRange,
        rng: &mut StdRng,
    ) -> Result<Vec<Statement>> {
        let rows: Vec<_> = batch
            .ids()
            .map(|id| tag_row(id, &self.reference, rng))
            .collect();
        build_chunked(&schema::TAG, rows, self.rows_per_statement)
    }
}

pub async fn import_tags<S: Store>(
    store: Arc<S>,
    reference: Arc<ReferenceData>,
    settings: &ImportSettings,
    progress: Arc<dyn Progress>,
) -> Result<ImportSummary> {
    let start_id = next_id(&*store, KeyLookup::all(&schema::TAG), 0).await?;
    let job = TagJob::new(reference, settings.batch.tags);
    Ok(run_batches(store, job, settings, start_id, settings.batch.tags, progress).await)
}
