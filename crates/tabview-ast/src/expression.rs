//! Expression types

use std::fmt;

use tabview_types::Value;

use crate::{AnalyticFunction, ArithmeticOperator, ComparisonOperator, LogicOperator};

/// Expression node
///
/// Expressions are evaluated against the records of a view through an
/// evaluator. Nodes that name columns (`FieldReference`, `ColumnNumber`,
/// `AllColumns`) are resolved by the view's header.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Literal value: 42, 'hello', TRUE, NULL
    Literal(Value),

    /// Column reference: `col` or `view.col`
    FieldReference { view: Option<String>, column: String },

    /// Column by 1-based ordinal within a view: `view.2`
    ColumnNumber { view: String, number: usize },

    /// `*` or `view.*`; also the sole argument of `COUNT(*)`
    AllColumns { view: Option<String> },

    /// Comparison: left op right
    Comparison { op: ComparisonOperator, left: Box<Expression>, right: Box<Expression> },

    /// Arithmetic: left op right
    Arithmetic { op: ArithmeticOperator, left: Box<Expression>, right: Box<Expression> },

    /// AND / OR
    Logic { op: LogicOperator, left: Box<Expression>, right: Box<Expression> },

    Not(Box<Expression>),

    /// `expr IS [NOT] NULL`
    IsNull { expr: Box<Expression>, negated: bool },

    /// Row value constructor: `(a, b, c)`
    RowValue(Vec<Expression>),

    /// `expr [NOT] IN (v1, v2, ...)`
    InList { expr: Box<Expression>, list: Vec<Expression>, negated: bool },

    /// Scalar function call resolved through the scope's function registry
    Function { name: String, args: Vec<Expression> },

    /// Aggregate function call: `COUNT(*)`, `SUM(DISTINCT x)`, `LISTAGG(x, ',')`
    AggregateFunction { name: String, distinct: bool, args: Vec<Expression> },

    /// Window function call: `RANK() OVER (PARTITION BY a ORDER BY b)`
    AnalyticFunction(Box<AnalyticFunction>),
}

impl Expression {
    pub fn literal(value: impl Into<Value>) -> Self {
        Expression::Literal(value.into())
    }

    pub fn null() -> Self {
        Expression::Literal(Value::Null)
    }

    pub fn field(column: impl Into<String>) -> Self {
        Expression::FieldReference { view: None, column: column.into() }
    }

    pub fn qualified(view: impl Into<String>, column: impl Into<String>) -> Self {
        Expression::FieldReference { view: Some(view.into()), column: column.into() }
    }

    pub fn column_number(view: impl Into<String>, number: usize) -> Self {
        Expression::ColumnNumber { view: view.into(), number }
    }

    pub fn wildcard() -> Self {
        Expression::AllColumns { view: None }
    }

    pub fn comparison(op: ComparisonOperator, left: Expression, right: Expression) -> Self {
        Expression::Comparison { op, left: Box::new(left), right: Box::new(right) }
    }

    pub fn arithmetic(op: ArithmeticOperator, left: Expression, right: Expression) -> Self {
        Expression::Arithmetic { op, left: Box::new(left), right: Box::new(right) }
    }

    pub fn and(left: Expression, right: Expression) -> Self {
        Expression::Logic { op: LogicOperator::And, left: Box::new(left), right: Box::new(right) }
    }

    pub fn or(left: Expression, right: Expression) -> Self {
        Expression::Logic { op: LogicOperator::Or, left: Box::new(left), right: Box::new(right) }
    }

    pub fn function(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Expression::Function { name: name.into(), args }
    }

    pub fn aggregate(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Expression::AggregateFunction { name: name.into(), distinct: false, args }
    }

    pub fn aggregate_distinct(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Expression::AggregateFunction { name: name.into(), distinct: true, args }
    }

    /// `COUNT(*)`
    pub fn count_all() -> Self {
        Expression::aggregate("COUNT", vec![Expression::wildcard()])
    }

    pub fn analytic(function: AnalyticFunction) -> Self {
        Expression::AnalyticFunction(Box::new(function))
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Expression::AllColumns { .. })
    }

    /// Direct child expressions, in evaluation order.
    pub fn children(&self) -> Vec<&Expression> {
        match self {
            Expression::Literal(_)
            | Expression::FieldReference { .. }
            | Expression::ColumnNumber { .. }
            | Expression::AllColumns { .. } => Vec::new(),
            Expression::Comparison { left, right, .. }
            | Expression::Arithmetic { left, right, .. }
            | Expression::Logic { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            Expression::Not(inner) => vec![inner.as_ref()],
            Expression::IsNull { expr, .. } => vec![expr.as_ref()],
            Expression::RowValue(items) => items.iter().collect(),
            Expression::InList { expr, list, .. } => {
                std::iter::once(expr.as_ref()).chain(list.iter()).collect()
            }
            Expression::Function { args, .. } | Expression::AggregateFunction { args, .. } => {
                args.iter().collect()
            }
            Expression::AnalyticFunction(func) => func.expressions(),
        }
    }

    /// True when the expression contains an aggregate call outside of any
    /// window function.
    ///
    /// `is_user_aggregate` decides whether a plain `Function` node names a
    /// user-defined aggregate.
    pub fn has_aggregate(&self, is_user_aggregate: &dyn Fn(&str) -> bool) -> bool {
        match self {
            Expression::AggregateFunction { .. } => true,
            Expression::Function { name, args } => {
                is_user_aggregate(name) || args.iter().any(|a| a.has_aggregate(is_user_aggregate))
            }
            Expression::AnalyticFunction(_) => false,
            other => other.children().into_iter().any(|c| c.has_aggregate(is_user_aggregate)),
        }
    }

    /// All window function calls in the tree, outermost first.
    pub fn analytic_functions(&self) -> Vec<&AnalyticFunction> {
        let mut found = Vec::new();
        self.collect_analytic_functions(&mut found);
        found
    }

    fn collect_analytic_functions<'a>(&'a self, found: &mut Vec<&'a AnalyticFunction>) {
        if let Expression::AnalyticFunction(func) = self {
            found.push(func);
        }
        for child in self.children() {
            child.collect_analytic_functions(found);
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expression]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

fn write_literal(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
        Value::Datetime(dt) => write!(f, "'{}'", dt.to_rfc3339()),
        Value::Boolean(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
        other => write!(f, "{}", other),
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(v) => write_literal(f, v),
            Expression::FieldReference { view: Some(view), column } => {
                write!(f, "{}.{}", view, column)
            }
            Expression::FieldReference { view: None, column } => f.write_str(column),
            Expression::ColumnNumber { view, number } => write!(f, "{}.{}", view, number),
            Expression::AllColumns { view: Some(view) } => write!(f, "{}.*", view),
            Expression::AllColumns { view: None } => f.write_str("*"),
            Expression::Comparison { op, left, right } => write!(f, "{} {} {}", left, op, right),
            Expression::Arithmetic { op, left, right } => write!(f, "{} {} {}", left, op, right),
            Expression::Logic { op, left, right } => write!(f, "{} {} {}", left, op, right),
            Expression::Not(inner) => write!(f, "NOT {}", inner),
            Expression::IsNull { expr, negated } => {
                write!(f, "{} IS {}NULL", expr, if *negated { "NOT " } else { "" })
            }
            Expression::RowValue(items) => {
                f.write_str("(")?;
                write_list(f, items)?;
                f.write_str(")")
            }
            Expression::InList { expr, list, negated } => {
                write!(f, "{} {}IN (", expr, if *negated { "NOT " } else { "" })?;
                write_list(f, list)?;
                f.write_str(")")
            }
            Expression::Function { name, args } => {
                write!(f, "{}(", name.to_uppercase())?;
                write_list(f, args)?;
                f.write_str(")")
            }
            Expression::AggregateFunction { name, distinct, args } => {
                write!(f, "{}(", name.to_uppercase())?;
                if *distinct {
                    f.write_str("DISTINCT ")?;
                }
                write_list(f, args)?;
                f.write_str(")")
            }
            Expression::AnalyticFunction(func) => write!(f, "{}", func),
        }
    }
}
