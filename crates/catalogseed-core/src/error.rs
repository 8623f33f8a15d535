//! # Error Types
//!
//! Defines `CatalogSeedError`, the unified error enum for every failure mode in
//! a load run. Variants fall into four groups:
//!
//! - configuration (`Config`, `Connection`): reported before any batch starts
//! - preconditions (`Precondition`): an upfront existence check failed
//! - per-batch (`Statement`, `Transaction`, `Constraint`, `PlaceholderMismatch`),
//!   wrapped in `Batch` with the worker and range that produced them
//! - lookups (`Query`) issued by coordinators before dispatch

use thiserror::Error;

/// All errors that can occur in catalogseed operations.
#[derive(Error, Debug)]
pub enum CatalogSeedError {
    #[error("Database connection failed: {message}\n  Connection string: {connection_hint}\n  Cause: {source}")]
    Connection {
        message: String,
        connection_hint: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Lookup query '{query}' failed: {source}")]
    Query {
        query: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Insert into {table} failed\n  SQL: {sql_preview}\n  DB error: {source}")]
    Statement {
        table: String,
        sql_preview: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Failed to {stage} transaction: {source}")]
    Transaction {
        stage: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("Constraint violation on {table}: {message}")]
    Constraint { table: String, message: String },

    #[error("Statement for {table} has {placeholders} placeholders but {arguments} arguments")]
    PlaceholderMismatch {
        table: String,
        placeholders: usize,
        arguments: usize,
    },

    #[error("Precondition failed: {message}")]
    Precondition { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("worker {worker}: batch starting at {start_id} ({count} rows): {source}")]
    Batch {
        worker: usize,
        start_id: i64,
        count: usize,
        #[source]
        source: Box<CatalogSeedError>,
    },

    #[error("{0}")]
    Other(String),
}

impl CatalogSeedError {
    pub fn config(message: impl Into<String>) -> Self {
        CatalogSeedError::Config {
            message: message.into(),
        }
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        CatalogSeedError::Precondition {
            message: message.into(),
        }
    }

    /// True for errors that belong to a single batch rather than to the run.
    pub fn is_batch_error(&self) -> bool {
        matches!(self, CatalogSeedError::Batch { .. })
    }
}

pub type Result<T> = std::result::Result<T, CatalogSeedError>;
