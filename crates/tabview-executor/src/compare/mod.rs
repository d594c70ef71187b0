//! Comparison and sort-key subsystem
//!
//! Shared by ORDER BY, grouping, DISTINCT, set operations, partitioning and
//! ranking so that every operator agrees on what "equal" means.

mod key;
mod sort_value;

pub use key::comparison_key;
pub use sort_value::{SortValue, SortValueKind, SortValues};
