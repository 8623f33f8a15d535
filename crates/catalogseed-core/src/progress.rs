//! Progress sink the dispatcher reports completed records to.

/// Receives "advance by N records" notifications from concurrent workers.
pub trait Progress: Send + Sync {
    fn advance(&self, records: u64);
}

impl<F> Progress for F
where
    F: Fn(u64) + Send + Sync,
{
    fn advance(&self, records: u64) {
        self(records)
    }
}

/// Discards every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn advance(&self, _records: u64) {}
}
