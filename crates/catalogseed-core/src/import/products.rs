//! Product load with category and tag fan-out.
//!
//! Each batch writes its products first, then the `product_product_category`
//! and `product_tag` tuples it generated, re-chunked to the relation batch
//! size. All of it commits or rolls back together.

use std::sync::Arc;

use chrono::Utc;
use rand::rngs::StdRng;

use crate::batch::statement::{build_chunked, build_relations};
use crate::batch::{BatchRange, Statement};
use crate::dispatch::BatchJob;
use crate::error::{CatalogSeedError, Result};
use crate::generate::ProductRecord;
use crate::import::{next_id, run_batches, ImportSettings, ImportSummary};
use crate::progress::Progress;
use crate::reference::ReferenceData;
use crate::sample::CategorySampler;
use crate::schema::{self, KeyLookup};
use crate::store::Store;

pub struct ProductJob {
    reference: Arc<ReferenceData>,
    sampler: CategorySampler,
    tag_space: i64,
    rows_per_statement: usize,
    relations_per_statement: usize,
}

impl ProductJob {
    pub fn new(
        reference: Arc<ReferenceData>,
        sampler: CategorySampler,
        tag_space: i64,
        rows_per_statement: usize,
        relations_per_statement: usize,
    ) -> Self {
        Self {
            reference,
            sampler,
            tag_space,
            rows_per_statement,
            relations_per_statement,
        }
    }

    /// Generate a batch of products and every statement that loads them.
    pub fn statements(&self, batch: BatchRange, rng: &mut StdRng) -> Result<Vec<Statement>> {
        let now = Utc::now();
        let products: Vec<ProductRecord> = batch
            .ids()
            .map(|id| {
                ProductRecord::generate(id, &self.reference, &self.sampler, self.tag_space, rng)
            })
            .collect();

        let category_links: Vec<(i64, i64)> =
            products.iter().flat_map(|p| p.category_links()).collect();
        let tag_links: Vec<(i64, i64)> = products.iter().flat_map(|p| p.tag_links()).collect();

        let mut statements = build_chunked(
            &schema::PRODUCT,
            products.iter().map(|p| p.to_row(now)),
            self.rows_per_statement,
        )?;
        statements.extend(build_relations(
            &schema::PRODUCT_PRODUCT_CATEGORY,
            &category_links,
            self.relations_per_statement,
        )?);
        statements.extend(build_relations(
            &schema::PRODUCT_TAG,
            &tag_links,
            self.relations_per_statement,
        )?);
        Ok(statements)
    }
}

impl BatchJob for ProductJob {
    async fn build<S: Store>(
        &self,
        _store: &S,
        batch: BatchRange,
        rng: &mut StdRng,
    ) -> Result<Vec<Statement>> {
        self.statements(batch, rng)
    }
}

pub async fn import_products<S: Store>(
    store: Arc<S>,
    reference: Arc<ReferenceData>,
    settings: &ImportSettings,
    progress: Arc<dyn Progress>,
) -> Result<ImportSummary> {
    let links = store.subcategory_links().await?;
    if links.is_empty() {
        return Err(CatalogSeedError::precondition(
            "no sub-categories found - run the categories or subcategories mode first",
        ));
    }
    let tag_space = match store.max_key(KeyLookup::all(&schema::TAG)).await? {
        Some(max) if max > 0 => max,
        _ => {
            return Err(CatalogSeedError::precondition(
                "no tags found - run the tags mode first",
            ))
        }
    };
    tracing::info!(
        "Loaded {} sub-categories; tags drawn from 1..={}",
        links.len(),
        tag_space
    );

    let sampler = CategorySampler::new(&reference, &links)?;
    let start_id = next_id(&*store, KeyLookup::all(&schema::PRODUCT), 0).await?;
    let job = ProductJob::new(
        reference,
        sampler,
        tag_space,
        settings.batch.products,
        settings.batch.relations,
    );
    Ok(run_batches(store, job, settings, start_id, settings.batch.products, progress).await)
}
