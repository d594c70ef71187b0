//! tabview - in-memory relational views with window functions
//!
//! This is the root crate that re-exports all components.

pub use tabview_ast as ast;
pub use tabview_executor as executor;
pub use tabview_types as types;
