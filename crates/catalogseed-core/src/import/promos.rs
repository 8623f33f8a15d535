//! Promo load. At most one promo exists per product: a promo for a product
//! that already has one overwrites its type, status and dates.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::Rng;

use crate::batch::statement::build_chunked;
use crate::batch::{BatchRange, Statement};
use crate::dispatch::BatchJob;
use crate::error::{CatalogSeedError, Result};
use crate::generate::PromoRecord;
use crate::import::{next_id, run_batches, ImportSettings, ImportSummary};
use crate::progress::Progress;
use crate::reference::ReferenceData;
use crate::schema::{self, KeyLookup};
use crate::store::Store;

pub struct PromoJob {
    reference: Arc<ReferenceData>,
    product_space: i64,
    rows_per_statement: usize,
}

impl BatchJob for PromoJob {
    async fn build<S: Store>(
        &self,
        store: &S,
        batch: BatchRange,
        rng: &mut StdRng,
    ) -> Result<Vec<Statement>> {
        let mut product_ids = store.sample_product_ids(batch.count).await?;
        product_ids.truncate(batch.count);
        while product_ids.len() < batch.count {
            product_ids.push(rng.random_range(1..=self.product_space));
        }

        let now = Utc::now();
        let promos: Vec<PromoRecord> = batch
            .ids()
            .zip(product_ids)
            .map(|(id, product_id)| PromoRecord::generate(id, product_id, &self.reference, now, rng))
            .collect();

        build_chunked(
            &schema::PRODUCT_PROMO,
            last_per_product(promos).iter().map(PromoRecord::to_row),
            self.rows_per_statement,
        )
    }
}

/// Keep only the last promo generated for each product, in generation order.
/// One upsert statement may not touch the same row twice.
pub fn last_per_product(promos: Vec<PromoRecord>) -> Vec<PromoRecord> {
    let mut seen = HashSet::with_capacity(promos.len());
    let mut kept: Vec<PromoRecord> = promos
        .into_iter()
        .rev()
        .filter(|p| seen.insert(p.product_id))
        .collect();
    kept.reverse();
    kept
}

pub async fn import_promos<S: Store>(
    store: Arc<S>,
    reference: Arc<ReferenceData>,
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
    tracing::info!("Found {} products", products);

    let start_id = next_id(&*store, KeyLookup::all(&schema::PRODUCT_PROMO), 0).await?;
    let job = PromoJob {
        reference,
        product_space,
        rows_per_statement: settings.batch.promos,
    };
    Ok(run_batches(store, job, settings, start_id, settings.batch.promos, progress).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn promo(id: i64, product_id: i64, status: &'static str) -> PromoRecord {
        let now = Utc::now();
        PromoRecord {
            id,
            product_id,
            promo_type: "discount",
            status,
            expires_at: now,
            created_at: now,
            last_updated_at: now,
        }
    }

    #[test]
    fn test_last_per_product_keeps_last_occurrence() {
        let kept = last_per_product(vec![
            promo(1, 7, "active"),
            promo(2, 8, "active"),
            promo(3, 7, "paused"),
        ]);
        let pairs: Vec<(i64, i64, &str)> = kept.iter().map(|p| (p.id, p.product_id, p.status)).collect();
        assert_eq!(pairs, vec![(2, 8, "active"), (3, 7, "paused")]);
    }

    #[test]
    fn test_last_per_product_without_duplicates_is_unchanged() {
        let promos = vec![promo(1, 1, "active"), promo(2, 2, "expired")];
        assert_eq!(last_per_product(promos.clone()), promos);
    }
}
