use clap::Parser;
use tracing_subscriber::EnvFilter;

mod args;
mod load;

use args::Cli;

#[tokio::main]
async fn main() {
    // Load .env file if present, before clap reads DATABASE_URL
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    if let Err(err) = load::run(&cli).await {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
