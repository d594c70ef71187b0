//! Execution limits and parallelism defaults
//!
//! Defaults used when an [`ExecutorConfig`](crate::ExecutorConfig) does not
//! override them.

/// Maximum number of iterations of a recursive query
///
/// A negative configured value disables the check.
pub const DEFAULT_LIMIT_RECURSION: i64 = 1000;

/// Minimum number of work units a single worker should receive
///
/// The task manager never starts more than `ceil(units / this)` workers, so
/// small inputs run inline on the calling thread.
pub const MIN_UNITS_PER_WORKER: usize = 80;

/// Workers poll the cancellation token once every this many units.
pub const CANCELLATION_POLL_INTERVAL: usize = 16;
