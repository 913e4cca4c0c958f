//! Progress and error notices emitted during a run

use tracing::{info, warn};

/// Fire-and-forget sink for run notices. Nothing it does affects results.
pub trait Reporter: Send + Sync {
    fn progress(&self, current: usize, total: usize);

    fn report(&self, message: &str);
}

/// Logs notices through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn progress(&self, current: usize, total: usize) {
        info!("Analyzing position {current}/{total}");
    }

    fn report(&self, message: &str) {
        warn!("{message}");
    }
}
