//! SELECT projection and `fix`

use std::collections::HashSet;

use tabview_ast::{Expression, SelectField};

use super::{Cell, Header, HeaderField, Record, View};
use crate::{errors::Result, scope::ReferenceScope};

impl View {
    /// Evaluate the select list and stage the projection.
    ///
    /// Records keep every column until [`View::fix`], so ORDER BY may still
    /// reference columns that are not selected.
    pub fn select(&mut self, scope: &ReferenceScope<'_>, fields: &[SelectField], distinct: bool) -> Result<()> {
        let has_aggregate = fields.iter().any(|f| f.expr.has_aggregate(&|name| scope.is_user_aggregate(name)));
        if has_aggregate && !self.is_grouped {
            self.group_all();
            if self.records.is_empty() {
                // aggregates over nothing still produce one row
                let cells = (0..self.header.len()).map(|_| Cell::empty()).collect();
                self.records.push(Record::from_cells(cells));
            }
        }

        for field in fields {
            for function in field.expr.analytic_functions().into_iter().rev() {
                self.analyze(scope, function)?;
            }
        }

        let mut columns = Vec::with_capacity(fields.len());
        let mut labels = Vec::with_capacity(fields.len());
        for field in fields {
            if let Expression::AllColumns { view } = &field.expr {
                for idx in self.header.table_columns(view.as_deref()) {
                    columns.push(idx);
                    labels.push(self.header.fields()[idx].column.clone());
                }
                continue;
            }
            let idx = self.eval_column(scope, &field.expr, field.alias.as_deref())?;
            columns.push(idx);
            labels.push(match &field.alias {
                Some(alias) => alias.clone(),
                None => self.header.fields()[idx].column.clone(),
            });
        }

        if distinct {
            self.distinct(scope, &mut columns)?;
        }

        log::debug!("select: {} fields over {} records", columns.len(), self.records.len());
        self.select_fields = Some(columns);
        self.select_labels = labels;
        Ok(())
    }

    /// Drop records whose selected columns repeat an earlier record, then
    /// narrow records and header to those columns.
    fn distinct(&mut self, scope: &ReferenceScope<'_>, columns: &mut Vec<usize>) -> Result<()> {
        let keys = self.comparison_keys(scope, columns)?;
        let mut seen = HashSet::with_capacity(keys.len());
        let indices: Vec<usize> =
            keys.into_iter().enumerate().filter(|(_, key)| seen.insert(key.clone())).map(|(i, _)| i).collect();
        self.retain_indices(&indices);

        let fields: Vec<HeaderField> = columns.iter().map(|&c| self.header.fields()[c].clone()).collect();
        self.records = std::mem::take(&mut self.records)
            .into_iter()
            .map(|record| {
                Record::from_cells(
                    columns.iter().map(|&c| record.cell(c).cloned().unwrap_or_else(Cell::empty)).collect(),
                )
            })
            .collect();
        self.header = Header::from_fields(fields);
        *columns = (0..columns.len()).collect();
        self.clear_caches();
        Ok(())
    }

    /// Apply the staged projection.
    ///
    /// Grouped cells collapse to their first value, every field becomes a
    /// plain column named by its select label, and all caches are dropped.
    /// Without a staged projection every column is kept.
    pub fn fix(&mut self) {
        let columns = self.select_fields.take().unwrap_or_else(|| (0..self.header.len()).collect());
        let labels = std::mem::take(&mut self.select_labels);

        self.records = std::mem::take(&mut self.records)
            .into_iter()
            .map(|record| {
                let cells = columns
                    .iter()
                    .map(|&c| match record.cell(c) {
                        Some(cell) if cell.len() == 1 => cell.clone(),
                        Some(cell) => Cell::new(cell.first().clone()),
                        None => Cell::new(tabview_types::Value::Null),
                    })
                    .collect();
                Record::from_cells(cells)
            })
            .collect();

        let fields = columns
            .iter()
            .enumerate()
            .map(|(pos, &c)| {
                let source = &self.header.fields()[c];
                HeaderField {
                    view: source.view.clone(),
                    column: labels.get(pos).cloned().unwrap_or_else(|| source.column.clone()),
                    number: pos + 1,
                    is_from_table: true,
                    ..Default::default()
                }
            })
            .collect();
        self.header = Header::from_fields(fields);

        self.is_grouped = false;
        self.offset = 0;
        self.clear_caches();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tabview_ast::{ArithmeticOperator, OrderItem};
    use tabview_types::Value;

    use super::*;
    use crate::{config::ExecutorConfig, evaluator::BasicEvaluator};

    fn scope() -> ReferenceScope<'static> {
        ReferenceScope::new(ExecutorConfig::default(), Arc::new(BasicEvaluator))
    }

    fn items() -> View {
        View::from_values(
            "i",
            &["name", "qty"],
            vec![
                vec![Value::string("pen"), Value::Integer(2)],
                vec![Value::string("ink"), Value::Integer(5)],
                vec![Value::string("pen"), Value::Integer(2)],
            ],
        )
    }

    #[test]
    fn test_select_expression_with_alias() {
        let mut view = items();
        let double = Expression::arithmetic(ArithmeticOperator::Multiply, Expression::field("qty"), Expression::literal(2i64));
        view.select(&scope(), &[SelectField::new(Expression::field("name")), SelectField::aliased(double, "twice")], false)
            .unwrap();
        view.fix();
        assert_eq!(view.header().column_names(), vec!["name", "twice"]);
        assert_eq!(view.column(1), vec![Value::Integer(4), Value::Integer(10), Value::Integer(4)]);
    }

    #[test]
    fn test_order_by_unselected_column_before_fix() {
        let mut view = items();
        let scope = scope();
        view.select(&scope, &[SelectField::new(Expression::field("name"))], false).unwrap();
        view.order_by(&scope, &[OrderItem::desc(Expression::field("qty"))]).unwrap();
        view.fix();
        assert_eq!(view.field_len(), 1);
        assert_eq!(view.column(0)[0], Value::string("ink"));
    }

    #[test]
    fn test_wildcard_and_distinct() {
        let mut view = items();
        view.select(&scope(), &[SelectField::new(Expression::wildcard())], true).unwrap();
        view.fix();
        assert_eq!(
            view.values(),
            vec![vec![Value::string("pen"), Value::Integer(2)], vec![Value::string("ink"), Value::Integer(5)]]
        );
    }

    #[test]
    fn test_aggregate_over_empty_view() {
        let mut view = View::from_values("i", &["name"], vec![]);
        view.select(&scope(), &[SelectField::new(Expression::count_all())], false).unwrap();
        view.fix();
        assert_eq!(view.values(), vec![vec![Value::Integer(0)]]);
        assert_eq!(view.header().column_names(), vec!["COUNT(*)"]);
    }

    #[test]
    fn test_implicit_group_all() {
        let mut view = items();
        let sum = Expression::aggregate("sum", vec![Expression::field("qty")]);
        view.select(&scope(), &[SelectField::new(sum)], false).unwrap();
        view.fix();
        assert_eq!(view.values(), vec![vec![Value::Integer(9)]]);
    }
}
