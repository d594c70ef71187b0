//! Executor error type
//!
//! Every operator reports failures through [`ExecutorError`]. Messages follow
//! a single lowercase style ("field x does not exist") so they can be shown to
//! users unchanged.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExecutorError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutorError {
    // ---- name resolution ----
    #[error("field {0} does not exist")]
    FieldNotExist(String),

    #[error("field {0} is ambiguous")]
    FieldAmbiguous(String),

    #[error("field {0} is not a group key")]
    FieldNotGroupKey(String),

    // ---- shape ----
    #[error("field length does not match: expected {expected}, found {actual}")]
    FieldLengthNotMatch { expected: usize, actual: usize },

    #[error("field name {0} is a duplicate")]
    DuplicateFieldName(String),

    #[error("row value should contain exactly {expected} values, found {actual}")]
    RowValueLengthInComparison { expected: usize, actual: usize },

    #[error("result set to be combined should contain exactly {expected} fields, found {actual}")]
    CombinedSetFieldLength { expected: usize, actual: usize },

    // ---- functions ----
    #[error("function {0} does not exist")]
    FunctionNotExist(String),

    #[error("function {name} takes {expected}")]
    FunctionArgumentLength { name: String, expected: String },

    #[error("{message} for function {name}")]
    FunctionInvalidArgument { name: String, message: String },

    #[error("aggregate functions are nested at {0}")]
    NestedAggregateFunctions(String),

    #[error("function {0} cannot aggregate not grouping records")]
    NotGroupingRecords(String),

    #[error("analytic function {0} is only available in select clause or order by clause")]
    NotAllowedAnalyticFunction(String),

    #[error("function {0} is a built-in function")]
    BuiltInFunctionDeclared(String),

    #[error("function {0} is redeclared")]
    FunctionRedeclared(String),

    // ---- limit / offset ----
    #[error("limit number {0} is not an integer value")]
    InvalidLimitNumber(String),

    #[error("limit percentage {0} is not a float value")]
    InvalidLimitPercentage(String),

    #[error("offset number {0} is not an integer value")]
    InvalidOffsetNumber(String),

    // ---- evaluation ----
    #[error("integer divided by zero")]
    IntegerDividedByZero,

    #[error("{0} cannot be evaluated as a value")]
    InvalidValueExpression(String),

    #[error("iteration of recursive query exceeded the limit {0}")]
    RecursionExceededLimit(i64),

    /// Failure reported by an external evaluator or user-defined function
    #[error("{0}")]
    Evaluation(String),

    // ---- execution control ----
    #[error("context canceled")]
    Cancelled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,

    #[error("worker panicked: {0}")]
    WorkerPanicked(String),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl ExecutorError {
    pub fn argument_length(name: &str, expected: impl Into<String>) -> Self {
        ExecutorError::FunctionArgumentLength { name: name.to_uppercase(), expected: expected.into() }
    }

    pub fn invalid_argument(name: &str, message: impl Into<String>) -> Self {
        ExecutorError::FunctionInvalidArgument { name: name.to_uppercase(), message: message.into() }
    }

    /// True for errors that stop execution regardless of the query.
    pub fn is_interruption(&self) -> bool {
        matches!(
            self,
            ExecutorError::Cancelled | ExecutorError::DeadlineExceeded | ExecutorError::WorkerPanicked(_)
        )
    }
}

impl From<toml::de::Error> for ExecutorError {
    fn from(err: toml::de::Error) -> Self {
        ExecutorError::InvalidConfiguration(err.to_string())
    }
}

impl From<tabview_types::TimezoneParseError> for ExecutorError {
    fn from(err: tabview_types::TimezoneParseError) -> Self {
        ExecutorError::InvalidConfiguration(err.to_string())
    }
}
