//! # Target Schema
//!
//! The fixed tables this loader writes to, their column order, and the
//! conflict policy each insert uses. The column order here is the argument
//! order every generator must follow.

/// What an insert does when a row collides with an existing unique key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnConflict {
    /// No clause: a collision fails the statement (and its batch).
    Fail,
    /// `ON CONFLICT DO NOTHING` on any unique constraint.
    Ignore,
    /// `ON CONFLICT (target) DO NOTHING`.
    IgnoreOn(&'static [&'static str]),
    /// `ON CONFLICT (target) DO UPDATE SET col = EXCLUDED.col, ...`.
    UpdateOn {
        target: &'static [&'static str],
        set: &'static [&'static str],
    },
}

/// A target table: name, insert column order, and conflict policy.
#[derive(Debug, PartialEq, Eq)]
pub struct TableSpec {
    pub name: &'static str,
    /// Primary key column (the run's identifier column).
    pub key: &'static str,
    pub columns: &'static [&'static str],
    pub on_conflict: OnConflict,
}

impl TableSpec {
    /// Bind parameters each row consumes.
    pub fn params_per_row(&self) -> usize {
        self.columns.len()
    }
}

pub static CATEGORY: TableSpec = TableSpec {
    name: "category",
    key: "category_id",
    columns: &[
        "category_id",
        "parent_category_id",
        "default_name",
        "default_description",
        "url_path",
        "created_at",
        "updated_at",
    ],
    on_conflict: OnConflict::IgnoreOn(&["category_id"]),
};

pub static TAG: TableSpec = TableSpec {
    name: "tag",
    key: "tag_id",
    columns: &["tag_id", "slug", "in_landing_page", "category", "curated"],
    on_conflict: OnConflict::IgnoreOn(&["tag_id"]),
};

pub static PRODUCT: TableSpec = TableSpec {
    name: "product",
    key: "product_id",
    columns: &[
        "product_id",
        "author_id",
        "category_id",
        "price_in_cents",
        "title",
        "slug",
        "description",
        "main_image",
        "images",
        "assets",
        "product_type",
        "product_status",
        "metadata",
        "created_at",
        "status",
    ],
    on_conflict: OnConflict::IgnoreOn(&["product_id"]),
};

pub static PRODUCT_PRODUCT_CATEGORY: TableSpec = TableSpec {
    name: "product_product_category",
    key: "product_id",
    columns: &["product_id", "category_id"],
    on_conflict: OnConflict::Ignore,
};

pub static PRODUCT_TAG: TableSpec = TableSpec {
    name: "product_tag",
    key: "product_id",
    columns: &["product_id", "tag_id"],
    on_conflict: OnConflict::Ignore,
};

/// At most one promo per product: re-promoting a product overwrites it.
pub static PRODUCT_PROMO: TableSpec = TableSpec {
    name: "product_promo",
    key: "product_promo_id",
    columns: &[
        "product_promo_id",
        "product_id",
        "promo_type",
        "status",
        "expires_at",
        "created_at",
        "last_updated_at",
    ],
    on_conflict: OnConflict::UpdateOn {
        target: &["product_id"],
        set: &["promo_type", "status", "expires_at", "last_updated_at"],
    },
};

/// Append-only download log.
pub static PRODUCT_DOWNLOAD: TableSpec = TableSpec {
    name: "product_download",
    key: "download_id",
    columns: &[
        "download_id",
        "product_id",
        "downloaded_at",
        "downloaded_at_day_normalized",
    ],
    on_conflict: OnConflict::Fail,
};

/// Every table the loader writes, in dependency order.
pub static ALL_TABLES: &[&TableSpec] = &[
    &CATEGORY,
    &TAG,
    &PRODUCT,
    &PRODUCT_PRODUCT_CATEGORY,
    &PRODUCT_TAG,
    &PRODUCT_PROMO,
    &PRODUCT_DOWNLOAD,
];

/// Which rows of a table an identifier lookup considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyScope {
    All,
    /// `category` rows with a parent.
    Nested,
}

/// A `MAX(key)` lookup used to resolve a run's starting identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyLookup {
    pub table: &'static TableSpec,
    pub scope: KeyScope,
}

impl KeyLookup {
    pub fn all(table: &'static TableSpec) -> Self {
        Self {
            table,
            scope: KeyScope::All,
        }
    }

    pub fn nested_categories() -> Self {
        Self {
            table: &CATEGORY,
            scope: KeyScope::Nested,
        }
    }

    /// The SQL this lookup runs against PostgreSQL.
    pub fn to_sql(&self) -> String {
        let filter = match self.scope {
            KeyScope::All => "",
            KeyScope::Nested => " WHERE \"parent_category_id\" IS NOT NULL",
        };
        format!(
            "SELECT MAX(\"{}\")::BIGINT FROM \"{}\"{}",
            self.table.key, self.table.name, filter
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_per_row() {
        assert_eq!(TAG.params_per_row(), 5);
        assert_eq!(PRODUCT.params_per_row(), 15);
        assert_eq!(PRODUCT_PROMO.params_per_row(), 7);
        assert_eq!(PRODUCT_DOWNLOAD.params_per_row(), 4);
        assert_eq!(CATEGORY.params_per_row(), 7);
    }

    #[test]
    fn test_key_is_first_column() {
        for table in ALL_TABLES {
            assert_eq!(table.columns[0], table.key, "table {}", table.name);
        }
    }

    #[test]
    fn test_key_lookup_sql() {
        assert_eq!(
            KeyLookup::all(&TAG).to_sql(),
            "SELECT MAX(\"tag_id\")::BIGINT FROM \"tag\""
        );
        assert_eq!(
            KeyLookup::nested_categories().to_sql(),
            "SELECT MAX(\"category_id\")::BIGINT FROM \"category\" WHERE \"parent_category_id\" IS NOT NULL"
        );
    }

    #[test]
    fn test_upsert_columns_exist() {
        if let OnConflict::UpdateOn { target, set } = PRODUCT_PROMO.on_conflict {
            for col in target.iter().chain(set.iter()) {
                assert!(PRODUCT_PROMO.columns.contains(col));
            }
        } else {
            panic!("promo must upsert");
        }
    }
}
