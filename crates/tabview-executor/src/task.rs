//! Concurrent task manager
//!
//! Splits N independent units of work (rows, groups, partitions) into W
//! contiguous ranges and runs one worker per range on the rayon pool.
//!
//! ```text
//! W = max(1, min(cap, ceil(N / min_units_per_worker)))
//! ```
//!
//! Range sizes differ by at most one. With a single worker everything runs on
//! the calling thread. Workers poll cancellation every
//! [`CANCELLATION_POLL_INTERVAL`] units and stop issuing new units once any
//! worker has failed; only the first error is kept. `run` and `map` return
//! after every worker has finished. Nested managers are fine: rayon steals
//! work instead of blocking on a shared lock.

use std::{
    any::Any,
    ops::Range,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use parking_lot::Mutex;
use rayon::prelude::*;

use crate::{
    config::ExecutorConfig,
    errors::{ExecutorError, Result},
    limits::CANCELLATION_POLL_INTERVAL,
};

#[derive(Debug, Default)]
struct TokenState {
    cancelled: AtomicBool,
    deadline: Option<Instant>,
}

/// Shared cancellation signal with an optional deadline.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    state: Arc<TokenState>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        CancellationToken {
            state: Arc::new(TokenState { cancelled: AtomicBool::new(false), deadline: Some(deadline) }),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.check().is_err()
    }

    pub fn check(&self) -> Result<()> {
        if self.state.cancelled.load(Ordering::Relaxed) {
            return Err(ExecutorError::Cancelled);
        }
        if let Some(deadline) = self.state.deadline {
            if Instant::now() >= deadline {
                return Err(ExecutorError::DeadlineExceeded);
            }
        }
        Ok(())
    }
}

pub struct TaskManager {
    number: usize,
    worker_count: usize,
    cancel: CancellationToken,
    failed: AtomicBool,
    error: Mutex<Option<ExecutorError>>,
}

impl TaskManager {
    /// `min_units_per_worker` defaults to
    /// [`MIN_UNITS_PER_WORKER`](crate::limits::MIN_UNITS_PER_WORKER).
    pub fn new(
        number: usize,
        min_units_per_worker: Option<usize>,
        cap: usize,
        cancel: CancellationToken,
    ) -> Self {
        let min_units = min_units_per_worker.unwrap_or(crate::limits::MIN_UNITS_PER_WORKER).max(1);
        let wanted = number.div_ceil(min_units);
        let worker_count = wanted.min(cap).max(1);
        TaskManager {
            number,
            worker_count,
            cancel,
            failed: AtomicBool::new(false),
            error: Mutex::new(None),
        }
    }

    pub fn from_config(number: usize, config: &ExecutorConfig, cancel: CancellationToken) -> Self {
        Self::new(number, Some(config.min_units_per_worker), config.cpu, cancel)
    }

    pub fn number(&self) -> usize {
        self.number
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Contiguous ranges, one per worker; the first `N % W` get one extra unit.
    pub fn ranges(&self) -> Vec<Range<usize>> {
        let base = self.number / self.worker_count;
        let remainder = self.number % self.worker_count;
        let mut start = 0;
        (0..self.worker_count)
            .map(|i| {
                let len = base + usize::from(i < remainder);
                let range = start..start + len;
                start += len;
                range
            })
            .collect()
    }

    pub fn has_error(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }

    /// First error reported by any worker.
    pub fn err(&self) -> Option<ExecutorError> {
        self.error.lock().clone()
    }

    /// Keep `err` unless an earlier error was already recorded.
    pub fn record_error(&self, err: ExecutorError) {
        let mut slot = self.error.lock();
        if slot.is_none() {
            *slot = Some(err);
            self.failed.store(true, Ordering::Release);
        }
    }

    /// Run `f` for every unit.
    pub fn run<F>(&self, f: F) -> Result<()>
    where
        F: Fn(usize) -> Result<()> + Sync,
    {
        self.map(f).map(|_| ())
    }

    /// Run `f` for every unit and collect the results in unit order.
    pub fn map<T, F>(&self, f: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(usize) -> Result<T> + Sync,
    {
        let chunks = self.execute(|range| {
            let mut out = Vec::with_capacity(range.len());
            for (n, unit) in range.enumerate() {
                if n % CANCELLATION_POLL_INTERVAL == 0 && self.should_stop() {
                    return None;
                }
                match f(unit) {
                    Ok(value) => out.push(value),
                    Err(err) => {
                        self.record_error(err);
                        return None;
                    }
                }
            }
            Some(out)
        });

        if let Some(err) = self.err() {
            return Err(err);
        }
        Ok(chunks.into_iter().flatten().flatten().collect())
    }

    /// Run `f` once per worker range and collect one result per worker.
    pub fn map_ranges<T, F>(&self, f: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(Range<usize>) -> Result<T> + Sync,
    {
        let results = self.execute(|range| {
            if self.should_stop() {
                return None;
            }
            match f(range) {
                Ok(value) => Some(value),
                Err(err) => {
                    self.record_error(err);
                    None
                }
            }
        });

        if let Some(err) = self.err() {
            return Err(err);
        }
        Ok(results.into_iter().flatten().collect())
    }

    fn should_stop(&self) -> bool {
        if self.has_error() {
            return true;
        }
        if let Err(err) = self.cancel.check() {
            self.record_error(err);
            return true;
        }
        false
    }

    fn execute<T, W>(&self, worker: W) -> Vec<Option<T>>
    where
        T: Send,
        W: Fn(Range<usize>) -> Option<T> + Sync,
    {
        let ranges = self.ranges();
        if ranges.len() == 1 {
            return ranges.into_iter().map(|range| self.guarded(&worker, range)).collect();
        }

        log::trace!("task manager: {} units over {} workers", self.number, ranges.len());
        ranges.into_par_iter().map(|range| self.guarded(&worker, range)).collect()
    }

    fn guarded<T, W>(&self, worker: &W, range: Range<usize>) -> Option<T>
    where
        W: Fn(Range<usize>) -> Option<T>,
    {
        match panic::catch_unwind(AssertUnwindSafe(|| worker(range))) {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                log::warn!("worker panicked: {}", message);
                self.record_error(ExecutorError::WorkerPanicked(message));
                None
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
