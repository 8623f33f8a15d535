use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use comfy_table::{Cell, Table as ComfyTable};
use indicatif::{ProgressBar, ProgressStyle};

use catalogseed_core::config::{read_config, CatalogSeedConfig};
use catalogseed_core::import::{run_import, ImportMode, ImportSettings, ImportSummary};
use catalogseed_core::progress::Progress;
use catalogseed_core::reference::ReferenceData;
use catalogseed_core::store::postgres::sanitize_url;
use catalogseed_core::store::{ConnectionSettings, PgStore};

use crate::args::Cli;

pub async fn run(cli: &Cli) -> Result<()> {
    // Load optional catalogseed.toml config
    let config = read_config(Path::new("."))?.unwrap_or_default();

    let settings = import_settings(cli, &config);
    settings.validate()?;
    if settings.mode == ImportMode::Categories && cli.count.is_some() {
        tracing::warn!("--count is ignored in categories mode");
    }

    let connection = connection_settings(cli, &config)?;
    let store = Arc::new(PgStore::connect(&connection).await?);
    tracing::info!(
        "Loading {} into {} (schema {})",
        settings.mode,
        sanitize_url(&connection.url),
        connection.schema
    );

    let total = match settings.mode {
        ImportMode::Categories => {
            let reference = ReferenceData::builtin();
            reference.categories.len() + reference.subcategories.len()
        }
        _ => settings.requested(),
    };
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.cyan}} Loading {}... {{bar:40.cyan/dim}} {{pos}}/{{len}} ({{eta}})",
                settings.mode
            ))?
            .progress_chars("█▓░"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));

    let sink = pb.clone();
    let progress: Arc<dyn Progress> = Arc::new(move |records: u64| sink.inc(records));

    let result = run_import(
        store.clone(),
        Arc::new(ReferenceData::builtin()),
        &settings,
        progress,
    )
    .await;
    store.close().await;

    let summary = match result {
        Ok(summary) => summary,
        Err(err) => {
            pb.abandon();
            return Err(err).with_context(|| format!("Failed to load {}", settings.mode));
        }
    };

    if summary.is_success() {
        pb.finish_with_message("done");
    } else {
        pb.abandon();
    }
    println!("{}", summary_table(&summary));

    if let Some(err) = summary.first_error {
        return Err(anyhow::Error::new(err).context(format!(
            "{} of {} batches failed; {} records were committed",
            summary.failed_batches,
            summary.batches,
            summary.inserted
        )));
    }

    eprintln!(
        "\n✓ Loaded {} {} in {:.1?}",
        summary.inserted, summary.mode, summary.elapsed
    );
    Ok(())
}

/// Merge flags over the config file over the built-in defaults.
fn import_settings(cli: &Cli, config: &CatalogSeedConfig) -> ImportSettings {
    let mut settings = ImportSettings::new(cli.mode.into(), cli.count);
    settings.batch = config.batch_sizes();
    settings.dispatch = config.dispatch_config();
    if let Some(workers) = cli.workers {
        settings.dispatch.workers = workers;
    }
    if cli.seed.is_some() {
        settings.dispatch.seed = cli.seed;
    }
    settings
}

fn connection_settings(cli: &Cli, config: &CatalogSeedConfig) -> Result<ConnectionSettings> {
    let url = match cli.db.as_ref().or(config.database.url.as_ref()) {
        Some(url) => url.clone(),
        None => bail!(
            "No database URL found.\n\
             Pass --db, set DATABASE_URL (or put it in .env), or add [database] url to catalogseed.toml"
        ),
    };

    let mut settings = ConnectionSettings::new(url);
    settings.username = cli.username.clone().or_else(|| config.database.username.clone());
    settings.password = cli.password.clone().or_else(|| config.database.password.clone());
    if let Some(schema) = cli.schema.as_ref().or(config.database.schema.as_ref()) {
        settings.schema = schema.clone();
    }
    if let Some(max) = config.run.max_connections {
        settings.max_connections = max;
    }
    Ok(settings)
}

fn summary_table(summary: &ImportSummary) -> ComfyTable {
    let mut t = ComfyTable::new();
    t.set_header(vec!["Mode", "Start id", "Requested", "Inserted"]);
    t.add_row(vec![
        Cell::new(summary.mode),
        Cell::new(summary.start_id),
        Cell::new(summary.requested),
        Cell::new(summary.inserted),
    ]);

    let mut details = vec![
        ("Rows written", summary.rows_affected.to_string()),
        ("Batches", summary.batches.to_string()),
        ("Failed batches", summary.failed_batches.to_string()),
        ("Elapsed", format!("{:.1?}", summary.elapsed)),
        ("Records/s", format!("{:.0}", summary.throughput())),
    ];
    if summary.mode == ImportMode::Categories {
        details.insert(0, ("Skipped", summary.skipped.to_string()));
    }
    for (label, value) in details {
        t.add_row(vec![Cell::new(label), Cell::new(value)]);
    }
    t
}
