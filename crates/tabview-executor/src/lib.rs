//! Executor - relational view engine
//!
//! This crate evaluates the relational part of a query over in-memory
//! [`View`]s: filtering, grouping, projection, ordering, limits, set
//! operations, joins and analytic (window) functions. Expressions are
//! evaluated through the [`Evaluator`] trait; [`BasicEvaluator`] covers the
//! expression kinds of `tabview-ast`.
//!
//! Per-row and per-partition work is spread over worker threads by
//! [`TaskManager`], sized from [`ExecutorConfig`].

mod analytic;
pub mod compare;
pub mod config;
pub mod errors;
pub mod evaluator;
pub mod functions;
pub mod limits;
pub mod recursive;
pub mod scope;
pub mod task;
pub mod view;

pub use compare::{comparison_key, SortValue, SortValueKind, SortValues};
pub use config::ExecutorConfig;
pub use errors::{ExecutorError, Result};
pub use evaluator::{BasicEvaluator, Evaluator};
pub use functions::{Arity, UserDefinedFunction};
pub use recursive::evaluate_recursive;
pub use scope::{ReferenceRecord, ReferenceScope};
pub use task::{CancellationToken, TaskManager};
pub use view::{Cell, FileInfo, Header, HeaderField, Record, RecordSet, View};
