//! Query clause types
//!
//! Select fields, ORDER BY items, LIMIT clauses, joins and set operators.

use std::fmt;

use crate::Expression;

// ============================================================================
// SELECT list
// ============================================================================

/// Item in the select list: `expr [AS alias]`, `*` or `view.*`
#[derive(Debug, Clone, PartialEq)]
pub struct SelectField {
    pub expr: Expression,
    pub alias: Option<String>,
}

impl SelectField {
    pub fn new(expr: Expression) -> Self {
        SelectField { expr, alias: None }
    }

    pub fn aliased(expr: Expression, alias: impl Into<String>) -> Self {
        SelectField { expr, alias: Some(alias.into()) }
    }
}

// ============================================================================
// ORDER BY
// ============================================================================

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

/// Placement of NULLs in a sort
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullsPosition {
    First,
    Last,
}

/// ORDER BY item
///
/// Missing direction means ASC. Missing NULL placement means NULLS FIRST for
/// ascending keys and NULLS LAST for descending keys.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub expr: Expression,
    pub direction: Option<OrderDirection>,
    pub nulls: Option<NullsPosition>,
}

impl OrderItem {
    pub fn new(expr: Expression) -> Self {
        OrderItem { expr, direction: None, nulls: None }
    }

    pub fn asc(expr: Expression) -> Self {
        OrderItem { expr, direction: Some(OrderDirection::Asc), nulls: None }
    }

    pub fn desc(expr: Expression) -> Self {
        OrderItem { expr, direction: Some(OrderDirection::Desc), nulls: None }
    }

    pub fn nulls(mut self, position: NullsPosition) -> Self {
        self.nulls = Some(position);
        self
    }

    pub fn effective_direction(&self) -> OrderDirection {
        self.direction.unwrap_or_default()
    }

    pub fn effective_nulls(&self) -> NullsPosition {
        match (self.nulls, self.effective_direction()) {
            (Some(position), _) => position,
            (None, OrderDirection::Asc) => NullsPosition::First,
            (None, OrderDirection::Desc) => NullsPosition::Last,
        }
    }
}

impl fmt::Display for OrderItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)?;
        match self.direction {
            Some(OrderDirection::Asc) => f.write_str(" ASC")?,
            Some(OrderDirection::Desc) => f.write_str(" DESC")?,
            None => {}
        }
        match self.nulls {
            Some(NullsPosition::First) => f.write_str(" NULLS FIRST"),
            Some(NullsPosition::Last) => f.write_str(" NULLS LAST"),
            None => Ok(()),
        }
    }
}

// ============================================================================
// LIMIT
// ============================================================================

/// `LIMIT value [PERCENT] [WITH TIES]`
#[derive(Debug, Clone, PartialEq)]
pub struct LimitClause {
    pub value: Expression,
    pub percent: bool,
    pub with_ties: bool,
}

impl LimitClause {
    pub fn rows(value: Expression) -> Self {
        LimitClause { value, percent: false, with_ties: false }
    }

    pub fn percent(value: Expression) -> Self {
        LimitClause { value, percent: true, with_ties: false }
    }

    pub fn with_ties(mut self) -> Self {
        self.with_ties = true;
        self
    }
}

// ============================================================================
// Joins
// ============================================================================

/// Side kept for unmatched rows in an outer join
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinDirection {
    Left,
    Right,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Cross,
    Inner,
    Outer(JoinDirection),
}

/// Join predicate
#[derive(Debug, Clone, PartialEq)]
pub enum JoinCondition {
    On(Expression),
    /// `USING (col, ...)`: equality on the named columns, which are coalesced
    Using(Vec<String>),
    /// Equality on every column name both sides share
    Natural,
}

/// A join between the current view and another one.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinSpec {
    pub join_type: JoinType,
    pub condition: Option<JoinCondition>,
}

impl JoinSpec {
    pub fn cross() -> Self {
        JoinSpec { join_type: JoinType::Cross, condition: None }
    }

    pub fn inner(condition: JoinCondition) -> Self {
        JoinSpec { join_type: JoinType::Inner, condition: Some(condition) }
    }

    pub fn outer(direction: JoinDirection, condition: JoinCondition) -> Self {
        JoinSpec { join_type: JoinType::Outer(direction), condition: Some(condition) }
    }
}

// ============================================================================
// Set operations
// ============================================================================

/// Set operators for combining two views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperator {
    Union,
    Except,
    Intersect,
}
