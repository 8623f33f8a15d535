//! End-to-end import runs against the in-memory store.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use catalogseed_core::generate::records::{DOWNLOAD_WINDOW_DAYS, SECONDS_PER_DAY};
use catalogseed_core::import::{run_import, ImportMode};
use catalogseed_core::progress::{NoProgress, Progress};
use catalogseed_core::reference::ReferenceData;
use catalogseed_core::schema;
use catalogseed_core::CatalogSeedError;
use catalogseed_testutil::fixtures::{
    seed_categories, seed_products, seed_tags, settings, two_category_reference,
};
use catalogseed_testutil::MemoryStore;

fn no_progress() -> Arc<dyn Progress> {
    Arc::new(NoProgress)
}

fn builtin() -> Arc<ReferenceData> {
    Arc::new(ReferenceData::builtin())
}

#[tokio::test]
async fn test_tags_fill_contiguous_ids() {
    let store = Arc::new(MemoryStore::new());
    let mut settings = settings(ImportMode::Tags, Some(25_000));
    settings.dispatch.workers = 1;

    let counter = Arc::new(AtomicU64::new(0));
    let seen = counter.clone();
    let progress: Arc<dyn Progress> = Arc::new(move |n: u64| {
        seen.fetch_add(n, Ordering::SeqCst);
    });

    let summary = run_import(store.clone(), builtin(), &settings, progress)
        .await
        .unwrap();

    assert!(summary.is_success());
    assert_eq!(summary.start_id, 1);
    assert_eq!(summary.inserted, 25_000);
    assert_eq!(summary.batches, 3);
    assert_eq!(counter.load(Ordering::SeqCst), 25_000);

    let mut ids = store.ids(&schema::TAG);
    ids.sort_unstable();
    assert_eq!(ids, (1..=25_000).collect::<Vec<i64>>());

    let reference = ReferenceData::builtin();
    for row in store.rows(&schema::TAG).iter().take(500) {
        let slug = row[1].as_string().unwrap();
        let noun = slug.rsplit('-').next().unwrap();
        assert!(reference.nouns.iter().any(|n| *n == noun), "slug {}", slug);
    }
}

#[tokio::test]
async fn test_tags_continue_after_existing_rows() {
    let store = Arc::new(MemoryStore::new());
    seed_tags(&store, 40);

    let summary = run_import(
        store.clone(),
        builtin(),
        &settings(ImportMode::Tags, Some(10)),
        no_progress(),
    )
    .await
    .unwrap();

    assert_eq!(summary.start_id, 41);
    assert_eq!(store.len(&schema::TAG), 50);
}

#[tokio::test]
async fn test_failed_batch_keeps_the_rest() {
    let store = Arc::new(MemoryStore::new().fail_on(&schema::TAG, 501));
    let mut settings = settings(ImportMode::Tags, Some(1_000));
    settings.batch.tags = 100;

    let summary = run_import(store.clone(), builtin(), &settings, no_progress())
        .await
        .unwrap();

    assert_eq!(summary.batches, 10);
    assert_eq!(summary.failed_batches, 1);
    assert_eq!(summary.inserted, 900);
    assert_eq!(store.executed_batches(), 10);
    assert!(store.ids(&schema::TAG).iter().all(|id| !(501..=600).contains(id)));

    match summary.into_result() {
        Err(CatalogSeedError::Batch {
            start_id, count, ..
        }) => {
            assert_eq!(start_id, 501);
            assert_eq!(count, 100);
        }
        other => panic!("expected batch error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_categories_skip_existing_rows() {
    let store = Arc::new(MemoryStore::new());
    seed_categories(&store, &[(553, None)]);

    let reference = builtin();
    let total = reference.categories.len() + reference.subcategories.len();
    let summary = run_import(
        store.clone(),
        reference.clone(),
        &settings(ImportMode::Categories, None),
        no_progress(),
    )
    .await
    .unwrap();

    assert_eq!(summary.requested, total);
    assert_eq!(summary.inserted, total as u64 - 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(store.len(&schema::CATEGORY), total);

    let again = run_import(
        store.clone(),
        reference,
        &settings(ImportMode::Categories, None),
        no_progress(),
    )
    .await
    .unwrap();
    assert_eq!(again.inserted, 0);
    assert_eq!(again.skipped, total as u64);
}

#[tokio::test]
async fn test_subcategories_start_above_reserved_range() {
    let store = Arc::new(MemoryStore::new());
    seed_categories(&store, &[(1, None), (2, None), (7, Some(1))]);
    let mut settings = settings(ImportMode::Subcategories, Some(25));
    settings.batch.categories = 10;

    let summary = run_import(store.clone(), builtin(), &settings, no_progress())
        .await
        .unwrap();
    assert_eq!(summary.start_id, 10_001);
    assert_eq!(summary.inserted, 25);

    let generated: Vec<_> = store
        .rows(&schema::CATEGORY)
        .into_iter()
        .filter(|row| row[0].as_int().unwrap() > 10_000)
        .collect();
    assert_eq!(generated.len(), 25);
    for row in &generated {
        let parent = row[1].as_int().unwrap();
        assert!(parent == 1 || parent == 2);
    }

    let next = run_import(store.clone(), builtin(), &settings, no_progress())
        .await
        .unwrap();
    assert_eq!(next.start_id, 10_026);
}

#[tokio::test]
async fn test_subcategories_need_top_level_categories() {
    let store = Arc::new(MemoryStore::new());
    let err = run_import(
        store.clone(),
        builtin(),
        &settings(ImportMode::Subcategories, Some(5)),
        no_progress(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CatalogSeedError::Precondition { .. }));
    assert_eq!(store.executed_batches(), 0);
}

#[tokio::test]
async fn test_products_follow_category_weights() {
    let store = Arc::new(MemoryStore::new());
    seed_categories(&store, &[(1, None), (2, None), (101, Some(1)), (201, Some(2))]);
    seed_tags(&store, 100);

    let summary = run_import(
        store.clone(),
        Arc::new(two_category_reference()),
        &settings(ImportMode::Products, Some(4_001)),
        no_progress(),
    )
    .await
    .unwrap();

    assert!(summary.is_success());
    assert_eq!(summary.batches, 2);
    assert_eq!(summary.inserted, 4_001);

    let products = store.rows(&schema::PRODUCT);
    assert_eq!(products.len(), 4_001);
    let k1 = products
        .iter()
        .filter(|row| row[2].as_int() == Some(1))
        .count();
    let fraction = k1 as f64 / products.len() as f64;
    assert!((fraction - 0.9).abs() < 0.03, "K1 fraction {}", fraction);

    // One sub-category per parent, so exactly one link per product.
    let links = store.rows(&schema::PRODUCT_PRODUCT_CATEGORY);
    assert_eq!(links.len(), 4_001);
    for link in &links {
        let category = link[1].as_int().unwrap();
        assert!(category == 101 || category == 201);
    }

    let tagged: HashSet<i64> = store
        .rows(&schema::PRODUCT_TAG)
        .iter()
        .map(|row| {
            let tag = row[1].as_int().unwrap();
            assert!((1..=100).contains(&tag));
            row[0].as_int().unwrap()
        })
        .collect();
    assert_eq!(tagged.len(), 4_001);
}

#[tokio::test]
async fn test_products_need_tags() {
    let store = Arc::new(MemoryStore::new());
    seed_categories(&store, &[(1, None), (101, Some(1))]);

    let err = run_import(
        store.clone(),
        Arc::new(two_category_reference()),
        &settings(ImportMode::Products, Some(10)),
        no_progress(),
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("no tags found"));
    assert_eq!(store.executed_batches(), 0);
}

#[tokio::test]
async fn test_promos_keep_one_row_per_product() {
    let store = Arc::new(MemoryStore::new());
    seed_products(&store, 1..=50);
    let settings = settings(ImportMode::Promos, Some(30));

    for _ in 0..2 {
        let summary = run_import(store.clone(), builtin(), &settings, no_progress())
            .await
            .unwrap();
        assert!(summary.is_success());
    }

    let promos = store.rows(&schema::PRODUCT_PROMO);
    let products: HashSet<i64> = promos.iter().map(|row| row[1].as_int().unwrap()).collect();
    assert_eq!(products.len(), promos.len());
    assert!(promos.len() <= 50);
    assert!(products.iter().all(|id| (1..=50).contains(id)));

    let reference = ReferenceData::builtin();
    for row in &promos {
        let status = row[3].as_string().unwrap();
        assert!(reference.promo_statuses.iter().any(|s| *s == status));
        assert!(row[4].as_timestamp().unwrap() > row[5].as_timestamp().unwrap());
    }
}

#[tokio::test]
async fn test_promos_need_products() {
    let store = Arc::new(MemoryStore::new());
    let err = run_import(
        store.clone(),
        builtin(),
        &settings(ImportMode::Promos, Some(10)),
        no_progress(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CatalogSeedError::Precondition { .. }));
    assert_eq!(store.executed_batches(), 0);
    assert!(store.is_empty(&schema::PRODUCT_PROMO));
}

#[tokio::test]
async fn test_downloads_stay_in_window() {
    let store = Arc::new(MemoryStore::new());
    seed_products(&store, 1..=20);
    let mut settings = settings(ImportMode::Downloads, Some(1_000));
    settings.batch.downloads = 300;

    let summary = run_import(store.clone(), builtin(), &settings, no_progress())
        .await
        .unwrap();
    assert_eq!(summary.batches, 4);
    assert_eq!(summary.inserted, 1_000);

    let finished = chrono::Utc::now();
    let earliest = finished - chrono::Duration::days(DOWNLOAD_WINDOW_DAYS as i64 + 1);
    for row in store.rows(&schema::PRODUCT_DOWNLOAD) {
        let product = row[1].as_int().unwrap();
        assert!((1..=20).contains(&product));
        let at = row[2].as_timestamp().unwrap();
        assert!(at <= finished && at > earliest);
        assert_eq!(row[3].as_int().unwrap(), at.timestamp() / SECONDS_PER_DAY);
    }
}

#[tokio::test]
async fn test_invalid_settings_fail_before_any_write() {
    let store = Arc::new(MemoryStore::new());
    let err = run_import(
        store.clone(),
        builtin(),
        &settings(ImportMode::Products, None),
        no_progress(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CatalogSeedError::Config { .. }));
    assert_eq!(store.executed_batches(), 0);
}
