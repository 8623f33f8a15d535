//! # Batch Dispatcher
//!
//! Runs a partitioned job on a fixed pool of concurrent workers.
//!
//! ```text
//! feeder ──(bounded queue)──> worker 0..N ──> Store::execute_batch
//!                                  │
//!                                  └──(error channel)──> collector
//! ```
//!
//! The feeder suspends when the queue is full, so generation never runs
//! ahead of what the store is absorbing. Each worker owns its random stream
//! and its transaction; the only shared mutable state is the [`RunTally`],
//! whose lock is held for counter updates only.
//!
//! A failed batch is rolled back by the store, logged and counted. The worker
//! then moves on to the next batch: nothing is cancelled, and the first error
//! is handed back after every batch has been attempted.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;

use crate::batch::{BatchRange, Statement};
use crate::error::{CatalogSeedError, Result};
use crate::progress::Progress;
use crate::store::Store;

pub const DEFAULT_WORKERS: usize = 20;
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Turns one batch descriptor into the statements that load it.
///
/// Implementations hold the run's read-only inputs (reference data, weight
/// tables, identifier spaces). The random stream belongs to the calling
/// worker and is never shared.
pub trait BatchJob: Send + Sync + 'static {
    fn build<S: Store>(
        &self,
        store: &S,
        batch: BatchRange,
        rng: &mut StdRng,
    ) -> impl Future<Output = Result<Vec<Statement>>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
    pub workers: usize,
    pub queue_capacity: usize,
    /// Base seed for the worker streams. `None` uses the wall clock.
    pub seed: Option<u64>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            seed: None,
        }
    }
}

/// Lifecycle of one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPhase {
    Idle,
    Dispatching,
    Draining,
    Done,
}

/// Counters shared by all workers of a run.
#[derive(Debug, Default)]
pub struct RunTally {
    /// Records in committed batches.
    pub records: u64,
    /// Rows the store reported as written, relations included.
    pub rows_affected: u64,
    pub batches: usize,
    pub failed_batches: usize,
    pub first_error: Option<CatalogSeedError>,
}

/// What a finished dispatch hands back to its coordinator.
#[derive(Debug)]
pub struct RunReport {
    pub records: u64,
    pub rows_affected: u64,
    pub batches: usize,
    pub failed_batches: usize,
    pub first_error: Option<CatalogSeedError>,
}

impl RunReport {
    /// The first batch error, if any batch failed.
    pub fn into_result(self) -> Result<Self> {
        match self.first_error {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }
}

/// Seed for one worker's stream.
pub fn worker_seed(base: u64, worker: usize) -> u64 {
    base ^ (worker as u64).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

fn wall_clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

fn lock_tally(tally: &Mutex<RunTally>) -> std::sync::MutexGuard<'_, RunTally> {
    tally.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn set_phase(phase: &mut DispatchPhase, next: DispatchPhase) {
    tracing::debug!("Dispatcher {:?} -> {:?}", phase, next);
    *phase = next;
}

/// Run `job` over every batch in `batches` and wait for all of them.
pub async fn dispatch<S, J, I>(
    store: Arc<S>,
    job: Arc<J>,
    batches: I,
    config: DispatchConfig,
    progress: Arc<dyn Progress>,
) -> RunReport
where
    S: Store,
    J: BatchJob,
    I: IntoIterator<Item = BatchRange>,
    I::IntoIter: Send + 'static,
{
    let mut phase = DispatchPhase::Idle;
    let workers = config.workers.max(1);
    let base_seed = config.seed.unwrap_or_else(wall_clock_seed);

    let tally = Arc::new(Mutex::new(RunTally::default()));
    let (queue_tx, queue_rx) = mpsc::channel::<BatchRange>(config.queue_capacity.max(1));
    let queue_rx = Arc::new(tokio::sync::Mutex::new(queue_rx));
    let (error_tx, mut error_rx) = mpsc::unbounded_channel::<CatalogSeedError>();

    set_phase(&mut phase, DispatchPhase::Dispatching);

    let collector = {
        let tally = Arc::clone(&tally);
        tokio::spawn(async move {
            while let Some(err) = error_rx.recv().await {
                let mut tally = lock_tally(&tally);
                if tally.first_error.is_none() {
                    tally.first_error = Some(err);
                }
            }
        })
    };

    let batches = batches.into_iter();
    let feeder = tokio::spawn(async move {
        for batch in batches {
            if queue_tx.send(batch).await.is_err() {
                break;
            }
        }
    });

    let mut handles = Vec::with_capacity(workers);
    for worker in 0..workers {
        let store = Arc::clone(&store);
        let job = Arc::clone(&job);
        let queue_rx = Arc::clone(&queue_rx);
        let tally = Arc::clone(&tally);
        let progress = Arc::clone(&progress);
        let error_tx = error_tx.clone();
        let mut rng = StdRng::seed_from_u64(worker_seed(base_seed, worker));

        handles.push(tokio::spawn(async move {
            loop {
                let next = { queue_rx.lock().await.recv().await };
                let Some(batch) = next else { break };

                match run_batch(&*store, &*job, batch, &mut rng).await {
                    Ok(rows) => {
                        {
                            let mut tally = lock_tally(&tally);
                            tally.records += batch.count as u64;
                            tally.rows_affected += rows;
                            tally.batches += 1;
                        }
                        progress.advance(batch.count as u64);
                        tracing::debug!(
                            "Worker {} committed batch {}..{} ({} rows written)",
                            worker,
                            batch.start_id,
                            batch.end_id(),
                            rows
                        );
                    }
                    Err(source) => {
                        let err = CatalogSeedError::Batch {
                            worker,
                            start_id: batch.start_id,
                            count: batch.count,
                            source: Box::new(source),
                        };
                        tracing::warn!("{}", err);
                        {
                            let mut tally = lock_tally(&tally);
                            tally.batches += 1;
                            tally.failed_batches += 1;
                        }
                        let _ = error_tx.send(err);
                    }
                }
            }
        }));
    }
    drop(error_tx);

    if let Err(e) = feeder.await {
        tracing::warn!("Batch feeder stopped early: {}", e);
    }
    set_phase(&mut phase, DispatchPhase::Draining);

    for (worker, handle) in handles.into_iter().enumerate() {
        if let Err(e) = handle.await {
            let mut tally = lock_tally(&tally);
            if tally.first_error.is_none() {
                tally.first_error = Some(CatalogSeedError::Other(format!(
                    "worker {} terminated abnormally: {}",
                    worker, e
                )));
            }
        }
    }
    if let Err(e) = collector.await {
        tracing::warn!("Error collector stopped early: {}", e);
    }
    set_phase(&mut phase, DispatchPhase::Done);

    let mut tally = lock_tally(&tally);
    let report = RunReport {
        records: tally.records,
        rows_affected: tally.rows_affected,
        batches: tally.batches,
        failed_batches: tally.failed_batches,
        first_error: tally.first_error.take(),
    };
    report
}

async fn run_batch<S: Store, J: BatchJob>(
    store: &S,
    job: &J,
    batch: BatchRange,
    rng: &mut StdRng,
) -> Result<u64> {
    let statements = job.build(store, batch, rng).await?;
    if statements.is_empty() {
        return Ok(0);
    }
    store.execute_batch(&statements).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::partition;
    use crate::generate::Value;
    use crate::schema::{self, KeyLookup, TableSpec};
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Records executed batches; fails any batch containing `fail_at`.
    #[derive(Default)]
    struct RecordingStore {
        fail_at: Option<i64>,
        committed: Mutex<Vec<i64>>,
    }

    impl Store for RecordingStore {
        async fn max_key(&self, _lookup: KeyLookup) -> Result<Option<i64>> {
            Ok(None)
        }

        async fn row_count(&self, _table: &'static TableSpec) -> Result<i64> {
            Ok(0)
        }

        async fn top_level_categories(&self) -> Result<Vec<i64>> {
            Ok(Vec::new())
        }

        async fn subcategory_links(&self) -> Result<Vec<(i64, i64)>> {
            Ok(Vec::new())
        }

        async fn sample_product_ids(&self, _limit: usize) -> Result<Vec<i64>> {
            Ok(Vec::new())
        }

        async fn execute_batch(&self, statements: &[Statement]) -> Result<u64> {
            let ids: Vec<i64> = statements
                .iter()
                .flat_map(|s| s.rows().filter_map(|row| row[0].as_int()).collect::<Vec<_>>())
                .collect();
            if self.fail_at.is_some_and(|bad| ids.contains(&bad)) {
                return Err(CatalogSeedError::Constraint {
                    table: "tag".to_string(),
                    message: "injected failure".to_string(),
                });
            }
            let mut committed = self.committed.lock().unwrap();
            committed.extend(&ids);
            Ok(ids.len() as u64)
        }
    }

    struct IdJob;

    impl BatchJob for IdJob {
        async fn build<S: Store>(
            &self,
            _store: &S,
            batch: BatchRange,
            _rng: &mut StdRng,
        ) -> Result<Vec<Statement>> {
            crate::batch::statement::build_chunked(
                &schema::TAG,
                batch.ids().map(|id| {
                    [
                        Value::Int(id),
                        Value::borrowed("tag"),
                        Value::Bool(false),
                        Value::Bool(false),
                        Value::Bool(false),
                    ]
                }),
                batch.count,
            )
        }
    }

    fn config(workers: usize) -> DispatchConfig {
        DispatchConfig {
            workers,
            queue_capacity: 4,
            seed: Some(7),
        }
    }

    #[tokio::test]
    async fn test_every_batch_is_executed_once() {
        let store = Arc::new(RecordingStore::default());
        let advanced = Arc::new(AtomicU64::new(0));
        let sink = Arc::clone(&advanced);
        let progress: Arc<dyn Progress> = Arc::new(move |n: u64| {
            sink.fetch_add(n, Ordering::Relaxed);
        });

        let report = dispatch(
            Arc::clone(&store),
            Arc::new(IdJob),
            partition(1, 2_500, 100),
            config(8),
            progress,
        )
        .await;

        assert!(report.first_error.is_none());
        assert_eq!(report.records, 2_500);
        assert_eq!(report.batches, 25);
        assert_eq!(advanced.load(Ordering::Relaxed), 2_500);

        let committed = store.committed.lock().unwrap();
        let unique: BTreeSet<i64> = committed.iter().copied().collect();
        assert_eq!(committed.len(), 2_500);
        assert_eq!(unique, (1..=2_500).collect());
    }

    #[tokio::test]
    async fn test_failed_batch_does_not_stop_the_pool() {
        let store = Arc::new(RecordingStore {
            fail_at: Some(250),
            ..Default::default()
        });

        let report = dispatch(
            Arc::clone(&store),
            Arc::new(IdJob),
            partition(1, 1_000, 100),
            config(3),
            Arc::new(crate::progress::NoProgress),
        )
        .await;

        assert_eq!(report.batches, 10);
        assert_eq!(report.failed_batches, 1);
        assert_eq!(report.records, 900);
        assert_eq!(store.committed.lock().unwrap().len(), 900);

        let err = report.into_result().unwrap_err();
        assert!(matches!(
            err,
            CatalogSeedError::Batch {
                start_id: 201,
                count: 100,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_empty_partition_finishes() {
        let report = dispatch(
            Arc::new(RecordingStore::default()),
            Arc::new(IdJob),
            partition(1, 0, 100),
            DispatchConfig::default(),
            Arc::new(crate::progress::NoProgress),
        )
        .await;
        assert_eq!(report.batches, 0);
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn test_worker_seeds_differ() {
        let seeds: BTreeSet<u64> = (0..20).map(|w| worker_seed(42, w)).collect();
        assert_eq!(seeds.len(), 20);
        assert_eq!(worker_seed(42, 3), worker_seed(42, 3));
    }
}
