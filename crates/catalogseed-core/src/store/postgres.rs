//! # PostgreSQL Store
//!
//! A pooled [`Store`] over `sqlx`. Every pooled connection has its
//! `search_path` pointed at the target schema, so statements use bare table
//! names. Batch statements are sent unprepared: their text depends on the
//! batch size, so caching them would only fill the statement cache.

use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::{PgArguments, PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::query::Query;
use sqlx::Postgres;

use crate::batch::statement::truncate_sql;
use crate::batch::Statement;
use crate::error::{CatalogSeedError, Result};
use crate::generate::Value;
use crate::schema::{KeyLookup, TableSpec};
use crate::store::Store;

pub const DEFAULT_MAX_CONNECTIONS: u32 = 50;
pub const CONNECTION_MAX_LIFETIME: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_SCHEMA: &str = "public";

/// Everything needed to open the pool.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub schema: String,
    pub max_connections: u32,
}

impl ConnectionSettings {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: None,
            password: None,
            schema: DEFAULT_SCHEMA.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }

    fn connect_options(&self) -> std::result::Result<PgConnectOptions, sqlx::Error> {
        let mut options = PgConnectOptions::from_str(&self.url)?;
        if let Some(username) = &self.username {
            options = options.username(username);
        }
        if let Some(password) = &self.password {
            options = options.password(password);
        }
        Ok(options.options([("search_path", self.schema.as_str())]))
    }
}

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Open the pool and verify the server is reachable.
    pub async fn connect(settings: &ConnectionSettings) -> Result<Self> {
        let connection_error = |message: &str, source: sqlx::Error| CatalogSeedError::Connection {
            message: message.to_string(),
            connection_hint: sanitize_url(&settings.url),
            source,
        };

        let options = settings
            .connect_options()
            .map_err(|e| connection_error("Invalid connection string", e))?;

        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections.max(1))
            .max_lifetime(CONNECTION_MAX_LIFETIME)
            .connect_with(options)
            .await
            .map_err(|e| connection_error("Failed to connect", e))?;

        tracing::debug!(
            "Connected to {} (schema {}, pool size {})",
            sanitize_url(&settings.url),
            settings.schema,
            settings.max_connections
        );
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn fetch_ids(&self, sql: &str) -> Result<Vec<i64>> {
        sqlx::query_scalar::<_, i64>(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| query_error(sql, e))
    }
}

impl Store for PgStore {
    async fn max_key(&self, lookup: KeyLookup) -> Result<Option<i64>> {
        let sql = lookup.to_sql();
        sqlx::query_scalar::<_, Option<i64>>(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| query_error(&sql, e))
    }

    async fn row_count(&self, table: &'static TableSpec) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM \"{}\"", table.name);
        sqlx::query_scalar::<_, i64>(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| query_error(&sql, e))
    }

    async fn top_level_categories(&self) -> Result<Vec<i64>> {
        self.fetch_ids(
            "SELECT category_id::BIGINT FROM category \
             WHERE parent_category_id IS NULL ORDER BY category_id",
        )
        .await
    }

    async fn subcategory_links(&self) -> Result<Vec<(i64, i64)>> {
        let sql = "SELECT category_id::BIGINT, parent_category_id::BIGINT FROM category \
                   WHERE parent_category_id IS NOT NULL";
        sqlx::query_as::<_, (i64, i64)>(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| query_error(sql, e))
    }

    async fn sample_product_ids(&self, limit: usize) -> Result<Vec<i64>> {
        let sql = "SELECT product_id::BIGINT FROM product ORDER BY RANDOM() LIMIT $1";
        sqlx::query_scalar::<_, i64>(sql)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| query_error(sql, e))
    }

    async fn execute_batch(&self, statements: &[Statement]) -> Result<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CatalogSeedError::Transaction {
                stage: "begin",
                source: e,
            })?;

        let mut affected = 0u64;
        for statement in statements {
            let mut query = sqlx::query(&statement.sql).persistent(false);
            for value in &statement.args {
                query = bind_value(query, value);
            }

            match query.execute(&mut *tx).await {
                Ok(result) => affected += result.rows_affected(),
                Err(e) => {
                    if let Err(rollback) = tx.rollback().await {
                        tracing::debug!("Rollback after failed insert also failed: {}", rollback);
                    }
                    return Err(CatalogSeedError::Statement {
                        table: statement.table.name.to_string(),
                        sql_preview: truncate_sql(&statement.sql, 200),
                        source: e,
                    });
                }
            }
        }

        tx.commit()
            .await
            .map_err(|e| CatalogSeedError::Transaction {
                stage: "commit",
                source: e,
            })?;

        Ok(affected)
    }
}

fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &'q Value,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        Value::Null => query.bind(None::<i64>),
        Value::Bool(b) => query.bind(*b),
        Value::Int(i) => query.bind(*i),
        Value::String(s) => query.bind(&**s),
        Value::Timestamp(ts) => query.bind(*ts),
        Value::Json(j) => query.bind(sqlx::types::Json(j)),
    }
}

fn query_error(sql: &str, source: sqlx::Error) -> CatalogSeedError {
    CatalogSeedError::Query {
        query: truncate_sql(sql, 120),
        source,
    }
}

/// Hide the password in a connection URL before it is logged or shown.
pub fn sanitize_url(db_url: &str) -> String {
    if let Ok(mut parsed) = url::Url::parse(db_url) {
        if parsed.password().is_some() {
            let _ = parsed.set_password(Some("****"));
        }
        return parsed.to_string();
    }
    db_url.to_string()
}
