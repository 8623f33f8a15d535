pub mod batch;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod generate;
pub mod import;
pub mod progress;
pub mod reference;
pub mod sample;
pub mod schema;
pub mod store;

// Re-export key types for convenience
pub use error::{CatalogSeedError, Result};
pub use import::{ImportMode, ImportSummary};
