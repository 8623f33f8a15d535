//! # Synthetic Record Generator
//!
//! Produces the field values of one record from an identifier, a caller-owned
//! random stream and the run's reference data. Nothing here touches the store
//! or any shared state; each function only advances the stream it is given.
//!
//! Row layouts match the column order of the corresponding table in
//! [`crate::schema`].

use std::borrow::Cow;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde_json::json;

use crate::generate::value::Value;
use crate::reference::ReferenceData;
use crate::sample::CategorySampler;

/// Mean number of tags attached to a product.
pub const AVERAGE_TAGS_PER_PRODUCT: usize = 25;
/// Tag counts vary uniformly by up to this much around the mean.
pub const TAG_COUNT_SPREAD: usize = 5;

pub const MAX_AUTHOR_ID: i64 = 10_000;
pub const MIN_PRICE_IN_CENTS: i64 = 99;
pub const PRICE_RANGE_IN_CENTS: i64 = 10_000;

/// Promos expire 1..=90 days from now.
pub const MAX_PROMO_DAYS_UNTIL_EXPIRY: i64 = 90;
/// Promos were created 0..=29 days ago.
pub const MAX_PROMO_AGE_DAYS: i64 = 29;

/// Downloads are spread over this many days of hourly slots.
pub const DOWNLOAD_WINDOW_DAYS: usize = 14;
pub const SECONDS_PER_DAY: i64 = 86_400;

fn pick(list: &'static [&'static str], rng: &mut impl Rng) -> &'static str {
    list[rng.random_range(0..list.len())]
}

/// `adjective-noun` or a bare noun, with equal probability.
pub fn tag_slug(reference: &ReferenceData, rng: &mut impl Rng) -> Cow<'static, str> {
    if rng.random_bool(0.5) {
        let adjective = pick(reference.adjectives, rng);
        let noun = pick(reference.nouns, rng);
        Cow::Owned(format!("{}-{}", adjective, noun))
    } else {
        Cow::Borrowed(pick(reference.nouns, rng))
    }
}

/// A `tag` row: id, slug and three flags that start out false.
pub fn tag_row(id: i64, reference: &ReferenceData, rng: &mut impl Rng) -> [Value; 5] {
    [
        Value::Int(id),
        Value::String(tag_slug(reference, rng)),
        Value::Bool(false),
        Value::Bool(false),
        Value::Bool(false),
    ]
}

/// How many tags a product gets: the mean plus or minus the spread, never
/// below one.
pub fn tag_count(rng: &mut impl Rng) -> usize {
    let offset = rng.random_range(0..=2 * TAG_COUNT_SPREAD);
    (AVERAGE_TAGS_PER_PRODUCT + offset)
        .saturating_sub(TAG_COUNT_SPREAD)
        .max(1)
}

/// Tag ids drawn uniformly from `[1, tag_space]`. Duplicates are kept; the
/// relation insert ignores them.
pub fn tag_ids(tag_space: i64, rng: &mut impl Rng) -> Vec<i64> {
    let count = tag_count(rng);
    (0..count)
        .map(|_| rng.random_range(1..=tag_space.max(1)))
        .collect()
}

/// A `category` row. Top-level rows pass `None` for the parent.
pub fn category_row(
    id: i64,
    parent_id: Option<i64>,
    name: Cow<'static, str>,
    now: DateTime<Utc>,
) -> [Value; 7] {
    let description = format!("Description for {}", name);
    [
        Value::Int(id),
        parent_id.map(Value::Int).unwrap_or(Value::Null),
        Value::String(name.clone()),
        Value::owned(description),
        Value::String(name),
        Value::Timestamp(now),
        Value::Timestamp(now),
    ]
}

/// A generated sub-category filed under an existing top-level category.
#[derive(Debug, Clone, PartialEq)]
pub struct SubcategoryRecord {
    pub id: i64,
    pub parent_id: i64,
    pub slug: String,
}

impl SubcategoryRecord {
    /// `parents` must be non-empty.
    pub fn generate(
        id: i64,
        parents: &[i64],
        reference: &ReferenceData,
        rng: &mut impl Rng,
    ) -> Self {
        let parent_id = parents[rng.random_range(0..parents.len())];
        let prefix = pick(reference.subcategory_prefixes, rng);
        let suffix = pick(reference.subcategory_suffixes, rng);
        Self {
            id,
            parent_id,
            slug: format!("{}-{}-{}", prefix, suffix, id),
        }
    }

    pub fn to_row(&self, now: DateTime<Utc>) -> [Value; 7] {
        category_row(
            self.id,
            Some(self.parent_id),
            Cow::Owned(self.slug.clone()),
            now,
        )
    }
}

/// One product plus its fan-out to sub-categories and tags.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub id: i64,
    pub author_id: i64,
    pub category_id: i64,
    pub price_in_cents: i64,
    pub title: String,
    pub subcategory_ids: Vec<i64>,
    pub tag_ids: Vec<i64>,
}

impl ProductRecord {
    pub fn generate(
        id: i64,
        reference: &ReferenceData,
        sampler: &CategorySampler,
        tag_space: i64,
        rng: &mut impl Rng,
    ) -> Self {
        let category_id = sampler.pick_category(rng);
        let subcategory_ids = sampler.pick_subcategories(category_id, rng);
        let tag_ids = tag_ids(tag_space, rng);
        let title = format!(
            "Product {} - {} {}",
            id,
            pick(reference.adjectives, rng),
            pick(reference.nouns, rng)
        );

        Self {
            id,
            author_id: rng.random_range(1..=MAX_AUTHOR_ID),
            category_id,
            price_in_cents: MIN_PRICE_IN_CENTS + rng.random_range(0..PRICE_RANGE_IN_CENTS),
            title,
            subcategory_ids,
            tag_ids,
        }
    }

    pub fn slug(&self) -> String {
        format!("product-{}", self.id)
    }

    /// The 15-column `product` row.
    pub fn to_row(&self, now: DateTime<Utc>) -> [Value; 15] {
        [
            Value::Int(self.id),
            Value::Int(self.author_id),
            Value::Int(self.category_id),
            Value::Int(self.price_in_cents),
            Value::Json(json!({ "en": self.title })),
            Value::Json(json!({ "en": self.slug() })),
            Value::Json(json!({ "en": format!("Description for {}", self.title) })),
            Value::Json(json!({})),
            Value::Json(json!([])),
            Value::Json(json!([])),
            Value::borrowed("digital"),
            Value::borrowed("published"),
            Value::Json(json!({})),
            Value::Timestamp(now),
            Value::borrowed("publish"),
        ]
    }

    pub fn category_links(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.subcategory_ids.iter().map(move |&sub| (self.id, sub))
    }

    pub fn tag_links(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.tag_ids.iter().map(move |&tag| (self.id, tag))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PromoRecord {
    pub id: i64,
    pub product_id: i64,
    pub promo_type: &'static str,
    pub status: &'static str,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

impl PromoRecord {
    pub fn generate(
        id: i64,
        product_id: i64,
        reference: &ReferenceData,
        now: DateTime<Utc>,
        rng: &mut impl Rng,
    ) -> Self {
        let promo_type = pick(reference.promo_types, rng);
        let status = pick(reference.promo_statuses, rng);
        let expires_in = rng.random_range(1..=MAX_PROMO_DAYS_UNTIL_EXPIRY);
        let age = rng.random_range(0..=MAX_PROMO_AGE_DAYS);
        Self {
            id,
            product_id,
            promo_type,
            status,
            expires_at: now + Duration::days(expires_in),
            created_at: now - Duration::days(age),
            last_updated_at: now,
        }
    }

    pub fn to_row(&self) -> [Value; 7] {
        [
            Value::Int(self.id),
            Value::Int(self.product_id),
            Value::borrowed(self.promo_type),
            Value::borrowed(self.status),
            Value::Timestamp(self.expires_at),
            Value::Timestamp(self.created_at),
            Value::Timestamp(self.last_updated_at),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DownloadRecord {
    pub id: i64,
    pub product_id: i64,
    pub downloaded_at: DateTime<Utc>,
}

impl DownloadRecord {
    /// Product drawn uniformly from `[1, product_space]`, timestamp from the
    /// precomputed hourly grid (which must be non-empty).
    pub fn generate(
        id: i64,
        product_space: i64,
        timestamps: &[DateTime<Utc>],
        rng: &mut impl Rng,
    ) -> Self {
        Self {
            id,
            product_id: rng.random_range(1..=product_space.max(1)),
            downloaded_at: timestamps[rng.random_range(0..timestamps.len())],
        }
    }

    /// Whole days since the Unix epoch.
    pub fn day_normalized(&self) -> i64 {
        self.downloaded_at.timestamp().div_euclid(SECONDS_PER_DAY)
    }

    pub fn to_row(&self) -> [Value; 4] {
        [
            Value::Int(self.id),
            Value::Int(self.product_id),
            Value::Timestamp(self.downloaded_at),
            Value::Int(self.day_normalized()),
        ]
    }
}

/// One timestamp per hour for the last `days` days, newest first, starting
/// at `now` truncated to the hour.
pub fn hourly_timestamps(now: DateTime<Utc>, days: usize) -> Vec<DateTime<Utc>> {
    let seconds = now.timestamp();
    let top = DateTime::from_timestamp(seconds - seconds.rem_euclid(3_600), 0).unwrap_or(now);
    (0..days as i64 * 24)
        .map(|hour| top - Duration::hours(hour))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::Category;
    use chrono::{TimeZone, Timelike};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_tag_slug_uses_word_lists() {
        let reference = ReferenceData::builtin();
        let mut rng = StdRng::seed_from_u64(11);
        let mut saw_pair = false;
        let mut saw_single = false;
        for _ in 0..500 {
            let slug = tag_slug(&reference, &mut rng);
            assert!(!slug.is_empty());
            match slug.split_once('-') {
                Some((adjective, noun)) => {
                    saw_pair = true;
                    assert!(reference.adjectives.iter().any(|w| *w == adjective), "{}", slug);
                    assert!(reference.nouns.iter().any(|w| *w == noun), "{}", slug);
                }
                None => {
                    saw_single = true;
                    assert!(reference.nouns.iter().any(|w| *w == slug), "{}", slug);
                }
            }
        }
        assert!(saw_pair && saw_single);
    }

    #[test]
    fn test_tag_count_bounds() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut seen_min = usize::MAX;
        let mut seen_max = 0;
        for _ in 0..5_000 {
            let n = tag_count(&mut rng);
            seen_min = seen_min.min(n);
            seen_max = seen_max.max(n);
        }
        assert_eq!(seen_min, 20);
        assert_eq!(seen_max, 30);
    }

    #[test]
    fn test_tag_ids_stay_in_space() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..100 {
            let ids = tag_ids(7, &mut rng);
            assert!(ids.iter().all(|id| (1..=7).contains(id)));
        }
    }

    #[test]
    fn test_product_record_fields() {
        let reference = ReferenceData::builtin().with_categories(vec![Category::top(9, "only", 1.0)]);
        let sampler = CategorySampler::new(&reference, &[(90, 9), (91, 9)]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let now = Utc::now();

        let product = ProductRecord::generate(42, &reference, &sampler, 1_000, &mut rng);
        assert_eq!(product.category_id, 9);
        assert!((1..=MAX_AUTHOR_ID).contains(&product.author_id));
        assert!((99..=10_098).contains(&product.price_in_cents));
        assert!(product.title.starts_with("Product 42 - "));
        assert!(!product.subcategory_ids.is_empty());
        assert!(product.category_links().all(|(p, _)| p == 42));

        let row = product.to_row(now);
        assert_eq!(row[5], Value::Json(json!({ "en": "product-42" })));
        assert_eq!(row[10], Value::borrowed("digital"));
        assert_eq!(row[11], Value::borrowed("published"));
        assert_eq!(row[14], Value::borrowed("publish"));
    }

    #[test]
    fn test_promo_dates() {
        let reference = ReferenceData::builtin();
        let mut rng = StdRng::seed_from_u64(3);
        let now = Utc::now();
        for id in 1..200 {
            let promo = PromoRecord::generate(id, 5, &reference, now, &mut rng);
            let until = promo.expires_at - now;
            assert!(until >= Duration::days(1) && until <= Duration::days(90));
            let age = now - promo.created_at;
            assert!(age >= Duration::zero() && age <= Duration::days(29));
            assert_eq!(promo.last_updated_at, now);
            assert!(reference.promo_types.contains(&promo.promo_type));
        }
    }

    #[test]
    fn test_hourly_timestamps() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 15, 42, 7).unwrap();
        let grid = hourly_timestamps(now, DOWNLOAD_WINDOW_DAYS);
        assert_eq!(grid.len(), 14 * 24);
        assert_eq!(grid[0], Utc.with_ymd_and_hms(2024, 3, 10, 15, 0, 0).unwrap());
        assert_eq!(grid[1], Utc.with_ymd_and_hms(2024, 3, 10, 14, 0, 0).unwrap());
        assert!(grid.iter().all(|t| t.minute() == 0 && t.second() == 0));
    }

    #[test]
    fn test_download_day_normalized() {
        let at = Utc.with_ymd_and_hms(1970, 1, 3, 5, 0, 0).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let download = DownloadRecord::generate(1, 10, &[at], &mut rng);
        assert_eq!(download.day_normalized(), 2);
        assert!((1..=10).contains(&download.product_id));
    }

    #[test]
    fn test_subcategory_slug() {
        let reference = ReferenceData::builtin();
        let mut rng = StdRng::seed_from_u64(9);
        let sub = SubcategoryRecord::generate(10_001, &[23, 553], &reference, &mut rng);
        assert!(sub.slug.ends_with("-10001"));
        assert!([23, 553].contains(&sub.parent_id));
        let row = sub.to_row(Utc::now());
        assert_eq!(row[1], Value::Int(sub.parent_id));
        assert_eq!(row[4], Value::owned(sub.slug.clone()));
    }

    #[test]
    fn test_top_level_category_row_has_null_parent() {
        let row = category_row(23, None, Cow::Borrowed("Fonts"), Utc::now());
        assert!(row[1].is_null());
        assert_eq!(row[3], Value::owned("Description for Fonts".to_string()));
    }
}
