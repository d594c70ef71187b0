//! Function registry
//!
//! Built-in aggregate and analytic functions live in an immutable table built
//! on first use. User-defined functions are registered in the scope that
//! declares them (see [`ReferenceScope`](crate::ReferenceScope)) and never
//! shadow a built-in name.

mod aggregate;
mod user;

use std::{collections::HashMap, sync::OnceLock};

pub use aggregate::distinct_values;
pub use user::{AggregateBody, FunctionBody, ScalarBody, UserDefinedFunction};

use crate::errors::{ExecutorError, Result};

/// Aggregate functions usable over groups and window frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
    Stdev,
    Stdevp,
    Var,
    Varp,
    Median,
    Listagg,
}

/// Window-only functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalyticFunctionKind {
    RowNumber,
    Rank,
    DenseRank,
    CumeDist,
    PercentRank,
    Ntile,
    FirstValue,
    LastValue,
    NthValue,
    Lag,
    Lead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinFunction {
    Aggregate(AggregateFunction),
    Analytic(AnalyticFunctionKind),
}

/// Accepted argument count range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    pub max: usize,
}

impl Arity {
    pub const fn exactly(n: usize) -> Self {
        Arity { min: n, max: n }
    }

    pub const fn between(min: usize, max: usize) -> Self {
        Arity { min, max }
    }

    pub fn check(&self, name: &str, count: usize) -> Result<()> {
        if count < self.min || count > self.max {
            return Err(ExecutorError::argument_length(name, self.describe()));
        }
        Ok(())
    }

    /// "exactly 1 argument", "1 or 2 arguments", "1 to 3 arguments", ...
    pub fn describe(&self) -> String {
        let noun = |n: usize| if n == 1 { "argument" } else { "arguments" };
        match (self.min, self.max) {
            (0, 0) => "no argument".to_string(),
            (a, b) if a == b => format!("exactly {} {}", a, noun(a)),
            (a, b) if b == a + 1 => format!("{} or {} arguments", a, b),
            (a, b) => format!("{} to {} arguments", a, b),
        }
    }
}

static BUILTIN_FUNCTIONS: OnceLock<HashMap<&'static str, BuiltinFunction>> = OnceLock::new();

fn builtin_table() -> &'static HashMap<&'static str, BuiltinFunction> {
    BUILTIN_FUNCTIONS.get_or_init(|| {
        use AggregateFunction as A;
        use AnalyticFunctionKind as W;
        use BuiltinFunction::{Aggregate, Analytic};

        HashMap::from([
            ("COUNT", Aggregate(A::Count)),
            ("SUM", Aggregate(A::Sum)),
            ("AVG", Aggregate(A::Avg)),
            ("MIN", Aggregate(A::Min)),
            ("MAX", Aggregate(A::Max)),
            ("STDEV", Aggregate(A::Stdev)),
            ("STDEVP", Aggregate(A::Stdevp)),
            ("VAR", Aggregate(A::Var)),
            ("VARP", Aggregate(A::Varp)),
            ("MEDIAN", Aggregate(A::Median)),
            ("LISTAGG", Aggregate(A::Listagg)),
            ("ROW_NUMBER", Analytic(W::RowNumber)),
            ("RANK", Analytic(W::Rank)),
            ("DENSE_RANK", Analytic(W::DenseRank)),
            ("CUME_DIST", Analytic(W::CumeDist)),
            ("PERCENT_RANK", Analytic(W::PercentRank)),
            ("NTILE", Analytic(W::Ntile)),
            ("FIRST_VALUE", Analytic(W::FirstValue)),
            ("LAST_VALUE", Analytic(W::LastValue)),
            ("NTH_VALUE", Analytic(W::NthValue)),
            ("LAG", Analytic(W::Lag)),
            ("LEAD", Analytic(W::Lead)),
        ])
    })
}

/// Built-in function by case-insensitive name.
pub fn builtin(name: &str) -> Option<BuiltinFunction> {
    builtin_table().get(name.to_uppercase().as_str()).copied()
}

pub fn is_builtin(name: &str) -> bool {
    builtin(name).is_some()
}

impl AggregateFunction {
    pub fn from_name(name: &str) -> Option<Self> {
        match builtin(name) {
            Some(BuiltinFunction::Aggregate(f)) => Some(f),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
            AggregateFunction::Stdev => "STDEV",
            AggregateFunction::Stdevp => "STDEVP",
            AggregateFunction::Var => "VAR",
            AggregateFunction::Varp => "VARP",
            AggregateFunction::Median => "MEDIAN",
            AggregateFunction::Listagg => "LISTAGG",
        }
    }

    pub fn arity(self) -> Arity {
        match self {
            AggregateFunction::Listagg => Arity::between(1, 2),
            _ => Arity::exactly(1),
        }
    }
}

impl AnalyticFunctionKind {
    pub fn name(self) -> &'static str {
        match self {
            AnalyticFunctionKind::RowNumber => "ROW_NUMBER",
            AnalyticFunctionKind::Rank => "RANK",
            AnalyticFunctionKind::DenseRank => "DENSE_RANK",
            AnalyticFunctionKind::CumeDist => "CUME_DIST",
            AnalyticFunctionKind::PercentRank => "PERCENT_RANK",
            AnalyticFunctionKind::Ntile => "NTILE",
            AnalyticFunctionKind::FirstValue => "FIRST_VALUE",
            AnalyticFunctionKind::LastValue => "LAST_VALUE",
            AnalyticFunctionKind::NthValue => "NTH_VALUE",
            AnalyticFunctionKind::Lag => "LAG",
            AnalyticFunctionKind::Lead => "LEAD",
        }
    }

    pub fn arity(self) -> Arity {
        match self {
            AnalyticFunctionKind::RowNumber
            | AnalyticFunctionKind::Rank
            | AnalyticFunctionKind::DenseRank
            | AnalyticFunctionKind::CumeDist
            | AnalyticFunctionKind::PercentRank => Arity::exactly(0),
            AnalyticFunctionKind::Ntile
            | AnalyticFunctionKind::FirstValue
            | AnalyticFunctionKind::LastValue => Arity::exactly(1),
            AnalyticFunctionKind::NthValue => Arity::exactly(2),
            AnalyticFunctionKind::Lag | AnalyticFunctionKind::Lead => Arity::between(1, 3),
        }
    }

    /// Evaluated over a window frame rather than the whole partition.
    pub fn uses_frame(self) -> bool {
        matches!(
            self,
            AnalyticFunctionKind::FirstValue
                | AnalyticFunctionKind::LastValue
                | AnalyticFunctionKind::NthValue
        )
    }
}
