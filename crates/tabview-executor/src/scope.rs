//! Reference scope
//!
//! A scope carries everything an expression needs besides the expression
//! itself: the configuration, the evaluator, the cancellation token, the chain
//! of user-function registries, and the chain of "current records". Operators
//! derive a child scope per row (and per group member) rather than mutating a
//! shared one, so workers never contend on scope state.

use std::{collections::HashMap, fmt, sync::Arc};

use parking_lot::RwLock;
use tabview_ast::Expression;
use tabview_types::Value;

use crate::{
    config::ExecutorConfig,
    errors::{ExecutorError, Result},
    evaluator::Evaluator,
    functions::{self, UserDefinedFunction},
    task::{CancellationToken, TaskManager},
    view::{record::NULL, View},
};

/// One level of user-defined function declarations.
#[derive(Debug, Default)]
pub struct ScopeBlock {
    functions: RwLock<HashMap<String, Arc<UserDefinedFunction>>>,
}

/// The record an expression is evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceRecord<'a> {
    pub view: &'a View,
    pub index: usize,
    /// Member of a grouped row; aggregate arguments are evaluated per member
    pub member: Option<usize>,
}

impl<'a> ReferenceRecord<'a> {
    /// Value of column `column` as seen from this record.
    pub fn value(&self, column: usize) -> &'a Value {
        let record = &self.view.records()[self.index];
        match (record.cell(column), self.member) {
            (Some(cell), Some(member)) => cell.member(member),
            (Some(cell), None) => cell.first(),
            (None, _) => &NULL,
        }
    }
}

#[derive(Clone)]
pub struct ReferenceScope<'a> {
    config: Arc<ExecutorConfig>,
    evaluator: Arc<dyn Evaluator>,
    cancel: CancellationToken,
    /// Innermost first
    blocks: Vec<Arc<ScopeBlock>>,
    /// Innermost first
    records: Vec<ReferenceRecord<'a>>,
}

impl ReferenceScope<'static> {
    pub fn new(config: ExecutorConfig, evaluator: Arc<dyn Evaluator>) -> Self {
        ReferenceScope {
            config: Arc::new(config),
            evaluator,
            cancel: CancellationToken::new(),
            blocks: vec![Arc::new(ScopeBlock::default())],
            records: Vec::new(),
        }
    }
}

impl<'a> ReferenceScope<'a> {
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn evaluator(&self) -> &Arc<dyn Evaluator> {
        &self.evaluator
    }

    pub fn evaluate(&self, expr: &Expression) -> Result<Value> {
        self.evaluator.evaluate(self, expr)
    }

    /// Task manager sized for `units` under this scope's configuration.
    pub fn task_manager(&self, units: usize) -> TaskManager {
        TaskManager::from_config(units, &self.config, self.cancel.clone())
    }

    // ------------------------------------------------------------------
    // record chain
    // ------------------------------------------------------------------

    pub fn records(&self) -> &[ReferenceRecord<'a>] {
        &self.records
    }

    /// Child scope whose innermost record is `view[index]`.
    pub fn with_record<'b>(&'b self, view: &'b View, index: usize) -> ReferenceScope<'b>
    where
        'a: 'b,
    {
        let mut records: Vec<ReferenceRecord<'b>> = Vec::with_capacity(self.records.len() + 1);
        records.push(ReferenceRecord { view, index, member: None });
        records.extend(self.records.iter().copied());
        ReferenceScope {
            config: Arc::clone(&self.config),
            evaluator: Arc::clone(&self.evaluator),
            cancel: self.cancel.clone(),
            blocks: self.blocks.clone(),
            records,
        }
    }

    /// Same scope, pointing the innermost record at one group member.
    pub fn with_member(&self, member: usize) -> ReferenceScope<'a> {
        let mut scope = self.clone();
        if let Some(record) = scope.records.first_mut() {
            record.member = Some(member);
        }
        scope
    }

    // ------------------------------------------------------------------
    // function blocks
    // ------------------------------------------------------------------

    /// Child scope with a fresh function block.
    pub fn create_child(&self) -> ReferenceScope<'a> {
        let mut scope = self.clone();
        scope.blocks.insert(0, Arc::new(ScopeBlock::default()));
        scope
    }

    /// Register `function` in the innermost block.
    pub fn declare_function(&self, function: UserDefinedFunction) -> Result<()> {
        let name = function.name().to_uppercase();
        if functions::is_builtin(&name) {
            return Err(ExecutorError::BuiltInFunctionDeclared(function.name().to_string()));
        }
        let Some(block) = self.blocks.first() else {
            return Err(ExecutorError::FunctionNotExist(function.name().to_string()));
        };
        let mut registry = block.functions.write();
        if registry.contains_key(&name) {
            return Err(ExecutorError::FunctionRedeclared(function.name().to_string()));
        }
        registry.insert(name, Arc::new(function));
        Ok(())
    }

    /// Innermost declaration of `name`.
    pub fn get_function(&self, name: &str) -> Option<Arc<UserDefinedFunction>> {
        let name = name.to_uppercase();
        self.blocks.iter().find_map(|block| block.functions.read().get(&name).cloned())
    }

    pub fn is_user_aggregate(&self, name: &str) -> bool {
        self.get_function(name).is_some_and(|f| f.is_aggregate())
    }
}

impl fmt::Debug for ReferenceScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferenceScope")
            .field("blocks", &self.blocks.len())
            .field("records", &self.records.len())
            .finish()
    }
}
