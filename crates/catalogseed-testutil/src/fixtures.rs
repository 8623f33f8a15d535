//! Reference data, seed rows and settings shared by the end-to-end tests.

use std::borrow::Cow;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;

use catalogseed_core::batch::statement::build_chunked;
use catalogseed_core::dispatch::DispatchConfig;
use catalogseed_core::generate::records::{category_row, tag_row};
use catalogseed_core::generate::ProductRecord;
use catalogseed_core::import::{ImportMode, ImportSettings};
use catalogseed_core::reference::{Category, ReferenceData};
use catalogseed_core::schema;

use crate::memory::MemoryStore;

/// Two top-level categories, K1 (id 1, weight 0.9) and K2 (id 2, weight 0.1),
/// with no static sub-categories.
pub fn two_category_reference() -> ReferenceData {
    ReferenceData::builtin().with_categories(vec![
        Category::top(1, "K1", 0.9),
        Category::top(2, "K2", 0.1),
    ])
}

/// Small, seeded settings: few workers and a short queue.
pub fn settings(mode: ImportMode, count: Option<usize>) -> ImportSettings {
    ImportSettings {
        dispatch: DispatchConfig {
            workers: 4,
            queue_capacity: 8,
            seed: Some(20_240),
        },
        ..ImportSettings::new(mode, count)
    }
}

/// Insert categories as `(id, parent)` pairs.
pub fn seed_categories(store: &MemoryStore, categories: &[(i64, Option<i64>)]) {
    let now = Utc::now();
    let rows = categories
        .iter()
        .map(|&(id, parent)| category_row(id, parent, Cow::Owned(format!("category-{}", id)), now));
    let statements = build_chunked(&schema::CATEGORY, rows, 1_000).expect("category rows");
    store.seed(&statements).expect("seed categories");
}

/// Insert tags `1..=count`.
pub fn seed_tags(store: &MemoryStore, count: i64) {
    let reference = ReferenceData::builtin();
    let mut rng = StdRng::seed_from_u64(1);
    let rows: Vec<_> = (1..=count).map(|id| tag_row(id, &reference, &mut rng)).collect();
    let statements = build_chunked(&schema::TAG, rows, 10_000).expect("tag rows");
    store.seed(&statements).expect("seed tags");
}

/// Insert bare products with the given ids.
pub fn seed_products(store: &MemoryStore, ids: impl IntoIterator<Item = i64>) {
    let now = Utc::now();
    let rows: Vec<_> = ids
        .into_iter()
        .map(|id| {
            ProductRecord {
                id,
                author_id: 1,
                category_id: 1,
                price_in_cents: 99,
                title: format!("Product {}", id),
                subcategory_ids: Vec::new(),
                tag_ids: Vec::new(),
            }
            .to_row(now)
        })
        .collect();
    let statements = build_chunked(&schema::PRODUCT, rows, 4_000).expect("product rows");
    store.seed(&statements).expect("seed products");
}
