//! Window (analytic) function types

use std::fmt;

use crate::{Expression, OrderItem};

/// Window function call: `name([DISTINCT] args) [IGNORE NULLS] OVER (clause)`
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticFunction {
    pub name: String,
    pub distinct: bool,
    pub args: Vec<Expression>,
    /// Skip NULL values (LAG, LEAD, FIRST_VALUE, LAST_VALUE, NTH_VALUE)
    pub ignore_nulls: bool,
    pub clause: AnalyticClause,
}

impl AnalyticFunction {
    pub fn new(name: impl Into<String>, args: Vec<Expression>, clause: AnalyticClause) -> Self {
        AnalyticFunction { name: name.into(), distinct: false, args, ignore_nulls: false, clause }
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn ignore_nulls(mut self) -> Self {
        self.ignore_nulls = true;
        self
    }

    /// Arguments, partition keys and order keys.
    pub fn expressions(&self) -> Vec<&Expression> {
        self.args
            .iter()
            .chain(self.clause.partition_by.iter())
            .chain(self.clause.order_by.iter().map(|item| &item.expr))
            .collect()
    }
}

/// OVER (...) clause
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnalyticClause {
    pub partition_by: Vec<Expression>,
    pub order_by: Vec<OrderItem>,
    /// ROWS frame; only meaningful together with ORDER BY
    pub frame: Option<WindowFrame>,
}

impl AnalyticClause {
    pub fn partition_by(mut self, exprs: Vec<Expression>) -> Self {
        self.partition_by = exprs;
        self
    }

    pub fn order_by(mut self, items: Vec<OrderItem>) -> Self {
        self.order_by = items;
        self
    }

    pub fn frame(mut self, frame: WindowFrame) -> Self {
        self.frame = Some(frame);
        self
    }
}

/// ROWS BETWEEN start AND end
///
/// A frame without an explicit end runs to the current row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowFrame {
    pub start: FrameBound,
    pub end: Option<FrameBound>,
}

impl WindowFrame {
    pub fn between(start: FrameBound, end: FrameBound) -> Self {
        WindowFrame { start, end: Some(end) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameBound {
    UnboundedPreceding,
    Preceding(usize),
    CurrentRow,
    Following(usize),
    UnboundedFollowing,
}

impl fmt::Display for FrameBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameBound::UnboundedPreceding => f.write_str("UNBOUNDED PRECEDING"),
            FrameBound::Preceding(n) => write!(f, "{} PRECEDING", n),
            FrameBound::CurrentRow => f.write_str("CURRENT ROW"),
            FrameBound::Following(n) => write!(f, "{} FOLLOWING", n),
            FrameBound::UnboundedFollowing => f.write_str("UNBOUNDED FOLLOWING"),
        }
    }
}

impl fmt::Display for WindowFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.end {
            Some(end) => write!(f, "ROWS BETWEEN {} AND {}", self.start, end),
            None => write!(f, "ROWS {}", self.start),
        }
    }
}

impl fmt::Display for AnalyticClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.partition_by.is_empty() {
            let keys: Vec<String> = self.partition_by.iter().map(ToString::to_string).collect();
            parts.push(format!("PARTITION BY {}", keys.join(", ")));
        }
        if !self.order_by.is_empty() {
            let keys: Vec<String> = self.order_by.iter().map(ToString::to_string).collect();
            parts.push(format!("ORDER BY {}", keys.join(", ")));
        }
        if let Some(frame) = &self.frame {
            parts.push(frame.to_string());
        }
        f.write_str(&parts.join(" "))
    }
}

impl fmt::Display for AnalyticFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name.to_uppercase())?;
        if self.distinct {
            f.write_str("DISTINCT ")?;
        }
        let args: Vec<String> = self.args.iter().map(ToString::to_string).collect();
        f.write_str(&args.join(", "))?;
        f.write_str(")")?;
        if self.ignore_nulls {
            f.write_str(" IGNORE NULLS")?;
        }
        write!(f, " OVER ({})", self.clause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_full_clause() {
        let func = AnalyticFunction::new(
            "sum",
            vec![Expression::field("amount")],
            AnalyticClause::default()
                .partition_by(vec![Expression::field("region")])
                .order_by(vec![OrderItem::desc(Expression::field("day"))])
                .frame(WindowFrame::between(FrameBound::Preceding(1), FrameBound::CurrentRow)),
        );
        assert_eq!(
            func.to_string(),
            "SUM(amount) OVER (PARTITION BY region ORDER BY day DESC ROWS BETWEEN 1 PRECEDING AND CURRENT ROW)"
        );
    }

    #[test]
    fn test_display_ignore_nulls() {
        let func = AnalyticFunction::new("lag", vec![Expression::field("v")], AnalyticClause::default())
            .ignore_nulls();
        assert_eq!(func.to_string(), "LAG(v) IGNORE NULLS OVER ()");
    }
}
