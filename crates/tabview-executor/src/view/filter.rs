//! WHERE and HAVING

use tabview_ast::Expression;
use tabview_types::{to_ternary, Ternary};

use super::View;
use crate::{
    errors::{ExecutorError, Result},
    scope::ReferenceScope,
};

impl View {
    /// Keep the records for which `condition` is TRUE, in their original
    /// order.
    pub fn where_clause(&mut self, scope: &ReferenceScope<'_>, condition: &Expression) -> Result<()> {
        let before = self.records.len();
        let keep = self.evaluate_condition(scope, condition)?;
        let indices: Vec<usize> = keep.iter().enumerate().filter(|(_, k)| **k).map(|(i, _)| i).collect();
        self.retain_indices(&indices);
        self.clear_caches();
        log::debug!("where: {} -> {} records", before, self.records.len());
        Ok(())
    }

    /// WHERE over groups.
    ///
    /// An aggregate in `condition` over a view that was never grouped makes
    /// the whole view one group, then the condition is tried again.
    pub fn having(&mut self, scope: &ReferenceScope<'_>, condition: &Expression) -> Result<()> {
        match self.where_clause(scope, condition) {
            Err(ExecutorError::NotGroupingRecords(_)) if !self.is_grouped => {
                self.group_all();
                self.where_clause(scope, condition)
            }
            other => other,
        }
    }

    fn evaluate_condition(&self, scope: &ReferenceScope<'_>, condition: &Expression) -> Result<Vec<bool>> {
        scope
            .task_manager(self.records.len())
            .map(|i| Ok(to_ternary(&scope.with_record(self, i).evaluate(condition)?) == Ternary::True))
    }
}
