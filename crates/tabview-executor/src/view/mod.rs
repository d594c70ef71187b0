//! View: the in-memory table a query runs against
//!
//! A view owns its header and records and is mutated in place by each
//! relational operator. Operators are implemented in the submodules:
//!
//! - `filter`: WHERE and HAVING
//! - `group`: GROUP BY and the implicit group-all
//! - `select`: projection, DISTINCT and `fix`
//! - `order`: ORDER BY
//! - `limit`: OFFSET and LIMIT
//! - `set_ops`: UNION, EXCEPT and INTERSECT
//! - `join`: cross, inner and outer joins with USING / NATURAL
//!
//! An operator that fails part-way may leave the view partially modified;
//! callers that need the original take a [`View::copy`] first.

mod filter;
mod group;
mod join;
mod limit;
mod order;
mod select;
mod set_ops;

pub mod header;
pub mod record;

use std::path::PathBuf;

use tabview_ast::{Expression, NullsPosition, OrderDirection};
use tabview_types::Value;

pub use header::{Header, HeaderField, INTERNAL_ID_COLUMN};
pub use record::{Cell, Record, RecordSet};

use crate::{
    compare::{comparison_key, SortValue, SortValues},
    errors::{ExecutorError, Result},
    scope::ReferenceScope,
};

/// Origin of a view loaded from a file.
///
/// Carried through untouched for the collaborator that writes changes back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub path: PathBuf,
    pub format: String,
    pub is_temporary: bool,
}

#[derive(Debug, Clone, Default)]
pub struct View {
    pub(crate) header: Header,
    pub(crate) records: RecordSet,
    pub(crate) file_info: Option<FileInfo>,
    pub(crate) is_grouped: bool,

    /// Projection staged by `select`, applied by `fix`
    pub(crate) select_fields: Option<Vec<usize>>,
    pub(crate) select_labels: Vec<String>,

    /// Per-record sort keys of the last ORDER BY
    pub(crate) sort_values: Vec<SortValues>,
    pub(crate) sort_directions: Vec<OrderDirection>,
    pub(crate) sort_nulls: Vec<NullsPosition>,
    /// Per-cell sort values, indexed `[record][column]`
    pub(crate) sort_value_cache: Vec<Vec<Option<SortValue>>>,

    /// Rows dropped by OFFSET, remembered for LIMIT ... PERCENT
    pub(crate) offset: usize,
}

impl View {
    pub fn new(header: Header, records: RecordSet) -> Self {
        View { header, records, ..Default::default() }
    }

    /// View over plain rows.
    pub fn from_values<S: AsRef<str>>(name: &str, columns: &[S], rows: Vec<Vec<Value>>) -> Self {
        let records = rows.into_iter().map(Record::new).collect();
        View::new(Header::new(name, columns), records)
    }

    /// View over plain rows, each prefixed with its 0-based row number as an
    /// internal identity.
    pub fn from_values_with_internal_id<S: AsRef<str>>(
        name: &str,
        columns: &[S],
        rows: Vec<Vec<Value>>,
    ) -> Self {
        let records =
            rows.into_iter().enumerate().map(|(i, row)| Record::with_internal_id(i as i64, row)).collect();
        View::new(Header::with_internal_id(name, columns), records)
    }

    pub fn with_file_info(mut self, file_info: FileInfo) -> Self {
        self.file_info = Some(file_info);
        self
    }

    /// Copy sharing every cell with `self`.
    pub fn copy(&self) -> View {
        View {
            header: self.header.clone(),
            records: self.records.clone(),
            file_info: self.file_info.clone(),
            is_grouped: self.is_grouped,
            ..Default::default()
        }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn file_info(&self) -> Option<&FileInfo> {
        self.file_info.as_ref()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn field_len(&self) -> usize {
        self.header.len()
    }

    pub fn is_grouped(&self) -> bool {
        self.is_grouped
    }

    /// Sort keys of the last ORDER BY, one per record.
    pub fn sort_values(&self) -> &[SortValues] {
        &self.sort_values
    }

    /// OFFSET applied since the last `fix`, used by LIMIT PERCENT.
    pub fn pending_offset(&self) -> usize {
        self.offset
    }

    /// First value of every cell, row by row.
    pub fn values(&self) -> Vec<Vec<Value>> {
        self.records.iter().map(Record::first_values).collect()
    }

    /// Values of one column.
    pub fn column(&self, idx: usize) -> Vec<Value> {
        self.records.iter().map(|r| r.value(idx).clone()).collect()
    }

    /// Install a new cell at `[row][column]`. Other copies of the view keep
    /// the previous cell.
    pub fn replace_value(&mut self, row: usize, column: usize, value: Value) {
        if let Some(record) = self.records.get_mut(row) {
            record.replace(column, Cell::new(value));
        }
        if let Some(cached) = self.sort_value_cache.get_mut(row).and_then(|r| r.get_mut(column)) {
            *cached = None;
        }
        self.sort_values.clear();
    }

    /// Index of the column holding `expr`, evaluating and appending it when
    /// no existing column does.
    pub fn eval_column(&mut self, scope: &ReferenceScope<'_>, expr: &Expression, alias: Option<&str>) -> Result<usize> {
        if let Some(idx) = self.header.contains_object(expr) {
            if self.is_grouped && self.header.get(idx).is_some_and(|f| f.is_from_table && !f.is_group_key) {
                return Err(ExecutorError::FieldNotGroupKey(expr.to_string()));
            }
            if let (Some(alias), Some(field)) = (alias, self.header.get_mut(idx)) {
                if !field.aliases.iter().any(|a| a.eq_ignore_ascii_case(alias)) {
                    field.aliases.push(alias.to_string());
                }
            }
            return Ok(idx);
        }

        let values = self.evaluate_rows(scope, expr)?;
        Ok(self.append_column(HeaderField::computed(expr, alias), values))
    }

    /// Evaluate `expr` once per record, in parallel.
    pub(crate) fn evaluate_rows(&self, scope: &ReferenceScope<'_>, expr: &Expression) -> Result<Vec<Value>> {
        scope.task_manager(self.records.len()).map(|i| scope.with_record(self, i).evaluate(expr))
    }

    /// Append one value per record under `field`.
    pub(crate) fn append_column(&mut self, field: HeaderField, values: Vec<Value>) -> usize {
        for (record, value) in self.records.iter_mut().zip(values) {
            record.push(Cell::new(value));
        }
        self.header.push(field)
    }

    /// Sort values of `columns` for every record, filled from and into the
    /// per-cell cache.
    pub(crate) fn sort_values_for(&mut self, scope: &ReferenceScope<'_>, columns: &[usize]) -> Result<Vec<SortValues>> {
        self.sort_value_cache.resize_with(self.records.len(), Vec::new);

        let view: &View = self;
        let config = scope.config();
        let computed = scope.task_manager(view.records.len()).map(|i| {
            let cached = &view.sort_value_cache[i];
            let record = &view.records[i];
            let values = columns
                .iter()
                .map(|&c| match cached.get(c) {
                    Some(Some(sv)) => sv.clone(),
                    _ => SortValue::new(record.value(c), config),
                })
                .collect();
            Ok(SortValues(values))
        })?;

        for (row, values) in self.sort_value_cache.iter_mut().zip(&computed) {
            for (&c, sv) in columns.iter().zip(&values.0) {
                if row.len() <= c {
                    row.resize(c + 1, None);
                }
                if row[c].is_none() {
                    row[c] = Some(sv.clone());
                }
            }
        }
        Ok(computed)
    }

    /// Serialized key of `columns` for every record.
    pub(crate) fn comparison_keys(&mut self, scope: &ReferenceScope<'_>, columns: &[usize]) -> Result<Vec<String>> {
        let sort_values = self.sort_values_for(scope, columns)?;
        Ok(sort_values.iter().map(|values| comparison_key(&values.0)).collect())
    }

    /// Drop every cache derived from record contents or order.
    pub(crate) fn clear_caches(&mut self) {
        self.sort_values.clear();
        self.sort_directions.clear();
        self.sort_nulls.clear();
        self.sort_value_cache.clear();
    }

    /// Keep only the records at `indices`, in that order, along with their
    /// cache entries.
    pub(crate) fn retain_indices(&mut self, indices: &[usize]) {
        let take_cache = self.sort_value_cache.len() == self.records.len();
        let take_sort = self.sort_values.len() == self.records.len();

        let mut records = std::mem::take(&mut self.records);
        let mut cache = std::mem::take(&mut self.sort_value_cache);
        let mut sort_values = std::mem::take(&mut self.sort_values);

        self.records = indices.iter().map(|&i| std::mem::take(&mut records[i])).collect();
        if take_cache {
            self.sort_value_cache = indices.iter().map(|&i| std::mem::take(&mut cache[i])).collect();
        }
        if take_sort {
            self.sort_values = indices.iter().map(|&i| std::mem::take(&mut sort_values[i])).collect();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tabview_ast::ArithmeticOperator;

    use super::*;
    use crate::{config::ExecutorConfig, evaluator::BasicEvaluator};

    fn scope() -> ReferenceScope<'static> {
        ReferenceScope::new(ExecutorConfig::default(), Arc::new(BasicEvaluator))
    }

    #[test]
    fn test_eval_column_reuses_existing() {
        let mut view = View::from_values("t", &["a"], vec![vec![Value::Integer(1)], vec![Value::Integer(2)]]);
        let scope = scope();
        let plus = Expression::arithmetic(ArithmeticOperator::Plus, Expression::field("a"), Expression::literal(1i64));

        let idx = view.eval_column(&scope, &plus, None).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(view.column(1), vec![Value::Integer(2), Value::Integer(3)]);
        assert_eq!(view.eval_column(&scope, &plus, Some("b")).unwrap(), 1);
        assert_eq!(view.header().get(1).unwrap().aliases, vec!["b".to_string()]);
        assert_eq!(view.eval_column(&scope, &Expression::field("a"), None).unwrap(), 0);
        assert_eq!(view.field_len(), 2);
    }

    #[test]
    fn test_eval_column_rejects_non_key_on_grouped_view() {
        let mut view = View::from_values(
            "t",
            &["k", "v"],
            vec![vec![Value::string("a"), Value::Integer(1)], vec![Value::string("a"), Value::Integer(2)]],
        );
        let scope = scope();
        view.group_by(&scope, &[Expression::field("k")]).unwrap();
        assert_eq!(view.eval_column(&scope, &Expression::field("k"), None).unwrap(), 0);
        assert_eq!(
            view.eval_column(&scope, &Expression::field("v"), None).unwrap_err(),
            ExecutorError::FieldNotGroupKey("v".into())
        );
    }

    #[test]
    fn test_copy_is_independent() {
        let view = View::from_values("t", &["a"], vec![vec![Value::Integer(1)]]);
        let mut copy = view.copy();
        copy.replace_value(0, 0, Value::Integer(9));
        assert_eq!(view.values(), vec![vec![Value::Integer(1)]]);
        assert_eq!(copy.values(), vec![vec![Value::Integer(9)]]);
    }

    #[test]
    fn test_internal_id_rows() {
        let view = View::from_values_with_internal_id("t", &["a"], vec![vec![Value::string("x")], vec![Value::string("y")]]);
        assert!(view.header().contains_internal_id());
        assert_eq!(view.column(0), vec![Value::Integer(0), Value::Integer(1)]);
    }

    #[test]
    fn test_comparison_keys_are_cached_per_cell() {
        let mut view = View::from_values("t", &["a", "b"], vec![vec![Value::Integer(1), Value::string("x")]]);
        let scope = scope();
        let keys = view.comparison_keys(&scope, &[0, 1]).unwrap();
        assert_eq!(keys, vec!["[I]1:[S]X".to_string()]);
        assert!(view.sort_value_cache[0][1].is_some());
    }
}
