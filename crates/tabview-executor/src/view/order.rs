//! ORDER BY

use rayon::prelude::*;
use tabview_ast::OrderItem;

use super::View;
use crate::{errors::Result, scope::ReferenceScope};

impl View {
    /// Sort records by `items`.
    ///
    /// The sort keys of every record are kept afterwards for LIMIT ... WITH
    /// TIES and for ranking functions. Records equal on every key keep their
    /// current relative order.
    pub fn order_by(&mut self, scope: &ReferenceScope<'_>, items: &[OrderItem]) -> Result<()> {
        for item in items {
            for function in item.expr.analytic_functions().into_iter().rev() {
                self.analyze(scope, function)?;
            }
        }

        let mut columns = Vec::with_capacity(items.len());
        for item in items {
            columns.push(self.eval_column(scope, &item.expr, None)?);
        }

        self.sort_values = self.sort_values_for(scope, &columns)?;
        self.sort_directions = items.iter().map(OrderItem::effective_direction).collect();
        self.sort_nulls = items.iter().map(OrderItem::effective_nulls).collect();

        if self.records.len() < 2 {
            return Ok(());
        }
        scope.cancellation().check()?;

        let mut order: Vec<usize> = (0..self.records.len()).collect();
        {
            let (keys, directions, nulls) = (&self.sort_values, &self.sort_directions, &self.sort_nulls);
            order.par_sort_by(|&a, &b| keys[a].compare(&keys[b], directions, nulls));
        }
        self.retain_indices(&order);

        log::debug!("order by: {} keys over {} records", items.len(), self.records.len());
        Ok(())
    }
}
