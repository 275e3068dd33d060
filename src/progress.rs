// Progress reporting for long scans.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Receives per-worker row counters and status text from a scan.
///
/// Counters only ever grow. Implementations must tolerate calls from
/// several worker threads at once.
pub trait ProgressSink: Sync {
    /// Worker `worker` has processed `rows` more table rows.
    fn advance(&self, worker: usize, rows: usize);

    fn status(&self, text: &str);
}

/// Discards everything.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn advance(&self, _worker: usize, _rows: usize) {}

    fn status(&self, _text: &str) {}
}

/// Keeps the counters and the last status in memory.
#[derive(Debug, Default)]
pub struct ProgressCounters {
    counters: Mutex<Vec<usize>>,
    total: AtomicUsize,
    last_status: Mutex<String>,
}

impl ProgressCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows processed by every worker together.
    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    pub fn per_worker(&self) -> Vec<usize> {
        match self.counters.lock() {
            Ok(counters) => counters.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn last_status(&self) -> String {
        match self.last_status.lock() {
            Ok(status) => status.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ProgressSink for ProgressCounters {
    fn advance(&self, worker: usize, rows: usize) {
        self.total.fetch_add(rows, Ordering::Relaxed);
        let mut counters = match self.counters.lock() {
            Ok(c) => c,
            Err(poisoned) => poisoned.into_inner(),
        };
        if counters.len() <= worker {
            counters.resize(worker + 1, 0);
        }
        counters[worker] += rows;
    }

    fn status(&self, text: &str) {
        log::debug!("{}", text);
        let mut status = match self.last_status.lock() {
            Ok(s) => s,
            Err(poisoned) => poisoned.into_inner(),
        };
        *status = text.to_string();
    }
}
