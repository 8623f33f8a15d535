use std::collections::HashMap;

use rand::Rng;

use crate::error::{CatalogSeedError, Result};
use crate::reference::ReferenceData;
use crate::sample::weighted::WeightTable;

/// Weight given to a sub-category that exists in the database but not in the
/// static table (e.g. rows created by the `subcategories` mode).
pub const DEFAULT_SUBCATEGORY_WEIGHT: f64 = 0.000_005;

/// Each product is filed under 1..=MAX_SUBCATEGORIES_PER_PRODUCT sub-categories.
pub const MAX_SUBCATEGORIES_PER_PRODUCT: usize = 3;

/// Weighted category and sub-category selection for product generation.
///
/// Built once per run from the static category weights and the
/// sub-category → parent links loaded from the store.
#[derive(Debug, Clone)]
pub struct CategorySampler {
    category_ids: Vec<i64>,
    categories: WeightTable,
    children: HashMap<i64, ChildTable>,
}

#[derive(Debug, Clone)]
struct ChildTable {
    ids: Vec<i64>,
    weights: WeightTable,
}

impl CategorySampler {
    /// `links` are `(subcategory_id, parent_id)` pairs. Links whose parent is
    /// not in the category table are kept: a product is never filed under
    /// that parent, so they are simply unreachable.
    pub fn new(reference: &ReferenceData, links: &[(i64, i64)]) -> Result<Self> {
        let category_ids: Vec<i64> = reference.categories.iter().map(|c| c.id).collect();
        let weights: Vec<f64> = reference.categories.iter().map(|c| c.weight).collect();
        let categories = WeightTable::from_weights(&weights)
            .ok_or_else(|| CatalogSeedError::config("category weight table is empty"))?;

        let mut grouped: HashMap<i64, Vec<i64>> = HashMap::new();
        for &(sub_id, parent_id) in links {
            grouped.entry(parent_id).or_default().push(sub_id);
        }

        let mut children = HashMap::with_capacity(grouped.len());
        for (parent_id, mut ids) in grouped {
            ids.sort_unstable();
            ids.dedup();
            let weights: Vec<f64> = ids
                .iter()
                .map(|id| {
                    reference
                        .subcategory_weight(*id)
                        .unwrap_or(DEFAULT_SUBCATEGORY_WEIGHT)
                })
                .collect();
            if let Some(table) = WeightTable::from_weights(&weights) {
                children.insert(
                    parent_id,
                    ChildTable {
                        ids,
                        weights: table,
                    },
                );
            }
        }

        Ok(Self {
            category_ids,
            categories,
            children,
        })
    }

    /// Number of sub-categories known for a parent.
    pub fn subcategory_count(&self, category_id: i64) -> usize {
        self.children
            .get(&category_id)
            .map(|c| c.ids.len())
            .unwrap_or(0)
    }

    /// Pick a top-level category by weight.
    pub fn pick_category(&self, rng: &mut impl Rng) -> i64 {
        self.category_ids[self.categories.sample(rng)]
    }

    /// Pick 1..=3 distinct sub-categories of `category_id`, clamped to how many
    /// exist. Empty when the category has none.
    pub fn pick_subcategories(&self, category_id: i64, rng: &mut impl Rng) -> Vec<i64> {
        let Some(child) = self.children.get(&category_id) else {
            return Vec::new();
        };
        let count = rng.random_range(1..=MAX_SUBCATEGORIES_PER_PRODUCT);
        child
            .weights
            .sample_distinct(count, rng)
            .into_iter()
            .map(|i| child.ids[i])
            .collect()
    }
}
