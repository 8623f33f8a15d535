//! # Reference Data
//!
//! Immutable lookup tables shared by every worker in a run: the weighted
//! category tables and the word lists used by the record generator. A
//! `ReferenceData` value is built once, wrapped in an `Arc`, and handed to each
//! batch job at construction time. Nothing mutates it afterwards.

pub mod categories;
pub mod words;

use crate::error::{CatalogSeedError, Result};

/// A category row. Top-level categories have no parent; sub-categories always
/// carry one, and their weight is relative within that parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Category {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub slug: &'static str,
    pub weight: f64,
}

impl Category {
    pub const fn top(id: i64, slug: &'static str, weight: f64) -> Self {
        Self {
            id,
            parent_id: None,
            slug,
            weight,
        }
    }

    pub const fn sub(id: i64, parent_id: i64, slug: &'static str, weight: f64) -> Self {
        Self {
            id,
            parent_id: Some(parent_id),
            slug,
            weight,
        }
    }

    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Process-wide read-only tables for one run.
#[derive(Debug, Clone)]
pub struct ReferenceData {
    pub categories: Vec<Category>,
    pub subcategories: Vec<Category>,
    pub adjectives: &'static [&'static str],
    pub nouns: &'static [&'static str],
    pub subcategory_prefixes: &'static [&'static str],
    pub subcategory_suffixes: &'static [&'static str],
    pub promo_types: &'static [&'static str],
    pub promo_statuses: &'static [&'static str],
}

impl ReferenceData {
    /// The built-in tables.
    pub fn builtin() -> Self {
        Self {
            categories: categories::CATEGORIES.to_vec(),
            subcategories: categories::SUBCATEGORIES.to_vec(),
            adjectives: words::ADJECTIVES,
            nouns: words::NOUNS,
            subcategory_prefixes: words::SUBCATEGORY_PREFIXES,
            subcategory_suffixes: words::SUBCATEGORY_SUFFIXES,
            promo_types: words::PROMO_TYPES,
            promo_statuses: words::PROMO_STATUSES,
        }
    }

    /// Replace the top-level category table (and drop sub-categories whose
    /// parent is no longer present).
    pub fn with_categories(mut self, categories: Vec<Category>) -> Self {
        self.subcategories.retain(|s| {
            categories
                .iter()
                .any(|c| Some(c.id) == s.parent_id)
        });
        self.categories = categories;
        self
    }

    /// Static weight of a sub-category, if it is in the built-in table.
    pub fn subcategory_weight(&self, id: i64) -> Option<f64> {
        self.subcategories
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.weight)
    }

    /// Check the shape invariants the generator relies on.
    pub fn validate(&self) -> Result<()> {
        if self.categories.is_empty() {
            return Err(CatalogSeedError::config("category table is empty"));
        }
        if let Some(bad) = self.categories.iter().find(|c| !c.is_top_level()) {
            return Err(CatalogSeedError::config(format!(
                "category {} ({}) has a parent but is listed as top-level",
                bad.id, bad.slug
            )));
        }
        if let Some(bad) = self.subcategories.iter().find(|c| c.is_top_level()) {
            return Err(CatalogSeedError::config(format!(
                "sub-category {} ({}) has no parent",
                bad.id, bad.slug
            )));
        }
        let lists = [
            ("adjectives", self.adjectives),
            ("nouns", self.nouns),
            ("subcategory_prefixes", self.subcategory_prefixes),
            ("subcategory_suffixes", self.subcategory_suffixes),
            ("promo_types", self.promo_types),
            ("promo_statuses", self.promo_statuses),
        ];
        for (name, list) in lists {
            if list.is_empty() {
                return Err(CatalogSeedError::config(format!("word list '{}' is empty", name)));
            }
        }
        Ok(())
    }
}

impl Default for ReferenceData {
    fn default() -> Self {
        Self::builtin()
    }
}
