use clap::{Parser, ValueEnum};

use catalogseed_core::ImportMode;

#[derive(Parser, Debug)]
#[command(
    name = "catalogseed",
    about = "Bulk-load synthetic catalog data into PostgreSQL",
    version,
    after_help = "Examples:\n  catalogseed --mode categories --db postgres://localhost/catalog\n  catalogseed --mode tags --count 1000000\n  catalogseed --mode products --count 200000 --workers 32\n  catalogseed --mode promos --count 5000 --schema staging\n  catalogseed --mode downloads --count 1000000 --seed 42"
)]
pub struct Cli {
    /// What to load
    #[arg(long, value_enum)]
    pub mode: Mode,

    /// Number of records to generate (required except for categories and tags)
    #[arg(long)]
    pub count: Option<usize>,

    /// Database connection URL
    /// Falls back to DATABASE_URL env var, .env file or catalogseed.toml
    #[arg(long, env = "DATABASE_URL")]
    pub db: Option<String>,

    /// Database user, overrides the one in the URL
    #[arg(long)]
    pub username: Option<String>,

    /// Database password, overrides the one in the URL
    #[arg(long)]
    pub password: Option<String>,

    /// Target schema (default: public)
    #[arg(long)]
    pub schema: Option<String>,

    /// Number of concurrent workers (default: 20)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Base seed for the worker random streams
    #[arg(long)]
    pub seed: Option<u64>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Categories,
    Subcategories,
    Tags,
    Products,
    Promos,
    Downloads,
}

impl From<Mode> for ImportMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Categories => ImportMode::Categories,
            Mode::Subcategories => ImportMode::Subcategories,
            Mode::Tags => ImportMode::Tags,
            Mode::Products => ImportMode::Products,
            Mode::Promos => ImportMode::Promos,
            Mode::Downloads => ImportMode::Downloads,
        }
    }
}
