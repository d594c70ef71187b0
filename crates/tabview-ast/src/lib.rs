//! Expression tree for tabview
//!
//! The executor never parses text. It consumes the structures defined here,
//! produced by an external parser or built directly by an embedding program.
//!
//! Every expression has a canonical textual form (its `Display`). The executor
//! uses that form as the structural identity of computed columns, so the same
//! expression evaluated twice resolves to the same column.

mod expression;
mod operators;
mod select;
mod window;

pub use expression::Expression;
pub use operators::{ArithmeticOperator, ComparisonOperator, LogicOperator};
pub use select::{
    JoinCondition, JoinDirection, JoinSpec, JoinType, LimitClause, NullsPosition, OrderDirection,
    OrderItem, SelectField, SetOperator,
};
pub use window::{AnalyticClause, AnalyticFunction, FrameBound, WindowFrame};
