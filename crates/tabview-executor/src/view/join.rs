//! Joins
//!
//! Joins are nested loops: every left record is paired with every right
//! record and the pair is kept when the condition holds. Left records are
//! split across workers. The joined header is the left header followed by the
//! right header; USING and NATURAL then move the shared columns to the front
//! as single coalesced columns.

use tabview_ast::{ComparisonOperator, Expression, JoinCondition, JoinDirection, JoinSpec, JoinType};
use tabview_types::{to_ternary, Ternary, Value};

use super::{Cell, Header, Record, View};
use crate::{
    errors::{ExecutorError, Result},
    evaluator::compare_values,
    scope::ReferenceScope,
};

/// How a left/right pair is tested.
enum Matcher<'e> {
    /// Every pair matches
    All,
    Condition(&'e Expression),
    /// `(left column, right column)` pairs that must be equal
    Columns(Vec<(usize, usize)>),
}

impl View {
    /// Join `other` onto `self` as described by `spec`.
    pub fn join(&mut self, scope: &ReferenceScope<'_>, other: View, spec: &JoinSpec) -> Result<()> {
        let (matcher, shared) = match &spec.condition {
            None => (Matcher::All, None),
            Some(JoinCondition::On(expr)) => (Matcher::Condition(expr), None),
            Some(JoinCondition::Using(columns)) => {
                let pairs = using_columns(&self.header, &other.header, columns)?;
                (Matcher::Columns(pairs.clone()), Some(pairs))
            }
            Some(JoinCondition::Natural) => {
                let pairs = natural_columns(&self.header, &other.header)?;
                (Matcher::Columns(pairs.clone()), Some(pairs))
            }
        };

        let left_len = self.header.len();
        match spec.join_type {
            JoinType::Cross => self.cross_join(other),
            JoinType::Inner => self.join_records(scope, other, &matcher, None)?,
            JoinType::Outer(direction) => self.join_records(scope, other, &matcher, Some(direction))?,
        }

        if let Some(pairs) = shared {
            self.coalesce(&pairs, left_len);
        }
        Ok(())
    }

    /// Every left record paired with every right record.
    pub fn cross_join(&mut self, other: View) {
        let left = std::mem::take(&mut self.records);
        let mut records = Vec::with_capacity(left.len() * other.records.len());
        for l in &left {
            for r in &other.records {
                records.push(concat(l, r));
            }
        }
        self.finish_join(&other, left.len(), records);
    }

    /// Pairs for which `condition` is TRUE.
    pub fn inner_join(&mut self, scope: &ReferenceScope<'_>, other: View, condition: &Expression) -> Result<()> {
        self.join_records(scope, other, &Matcher::Condition(condition), None)
    }

    /// Pairs for which `condition` is TRUE, plus the records of the kept
    /// side(s) that matched nothing, padded with NULL.
    pub fn outer_join(
        &mut self,
        scope: &ReferenceScope<'_>,
        other: View,
        condition: &Expression,
        direction: JoinDirection,
    ) -> Result<()> {
        self.join_records(scope, other, &Matcher::Condition(condition), Some(direction))
    }

    fn join_records(
        &mut self,
        scope: &ReferenceScope<'_>,
        other: View,
        matcher: &Matcher<'_>,
        outer: Option<JoinDirection>,
    ) -> Result<()> {
        let hits = self.matching_pairs(scope, &other, matcher)?;

        let left_nulls = null_record(self.header.len());
        let right_nulls = null_record(other.header.len());
        let left = std::mem::take(&mut self.records);
        let mut records = Vec::new();

        match outer {
            Some(JoinDirection::Right) => {
                let mut by_right: Vec<Vec<usize>> = vec![Vec::new(); other.records.len()];
                for (i, matched) in hits.iter().enumerate() {
                    for &j in matched {
                        by_right[j].push(i);
                    }
                }
                for (j, r) in other.records.iter().enumerate() {
                    if by_right[j].is_empty() {
                        records.push(concat(&left_nulls, r));
                    }
                    for &i in &by_right[j] {
                        records.push(concat(&left[i], r));
                    }
                }
            }
            _ => {
                let keep_left = matches!(outer, Some(JoinDirection::Left | JoinDirection::Full));
                let mut right_matched = vec![false; other.records.len()];
                for (l, matched) in left.iter().zip(&hits) {
                    if matched.is_empty() && keep_left {
                        records.push(concat(l, &right_nulls));
                    }
                    for &j in matched {
                        right_matched[j] = true;
                        records.push(concat(l, &other.records[j]));
                    }
                }
                if outer == Some(JoinDirection::Full) {
                    for (r, _) in other.records.iter().zip(&right_matched).filter(|(_, m)| !**m) {
                        records.push(concat(&left_nulls, r));
                    }
                }
            }
        }

        self.finish_join(&other, left.len(), records);
        Ok(())
    }

    /// For every left record, the indices of the right records it pairs with.
    fn matching_pairs(&self, scope: &ReferenceScope<'_>, other: &View, matcher: &Matcher<'_>) -> Result<Vec<Vec<usize>>> {
        let manager = scope.task_manager(self.records.len());
        match matcher {
            Matcher::All => Ok(vec![(0..other.records.len()).collect(); self.records.len()]),
            Matcher::Columns(pairs) => {
                let config = scope.config();
                manager.map(|i| {
                    let l = &self.records[i];
                    Ok((0..other.records.len())
                        .filter(|&j| {
                            let r = &other.records[j];
                            pairs.iter().all(|&(lc, rc)| {
                                compare_values(l.value(lc), r.value(rc), ComparisonOperator::Equal, config)
                                    == Ternary::True
                            })
                        })
                        .collect())
                })
            }
            Matcher::Condition(condition) => {
                let header = Header::merge(&self.header, &other.header);
                let chunks = manager.map_ranges(|range| {
                    // one probe view per worker, refilled for every left record
                    let mut probe = View::new(header.clone(), Vec::new());
                    let mut out = Vec::with_capacity(range.len());
                    for i in range {
                        scope.cancellation().check()?;
                        let l = &self.records[i];
                        probe.records = other.records.iter().map(|r| concat(l, r)).collect();
                        let mut matched = Vec::new();
                        for j in 0..probe.records.len() {
                            let value = scope.with_record(&probe, j).evaluate(condition)?;
                            if to_ternary(&value) == Ternary::True {
                                matched.push(j);
                            }
                        }
                        out.push(matched);
                    }
                    Ok(out)
                })?;
                Ok(chunks.into_iter().flatten().collect())
            }
        }
    }

    fn finish_join(&mut self, other: &View, left_len: usize, records: Vec<Record>) {
        log::debug!("join: {} x {} -> {} records", left_len, other.records.len(), records.len());
        self.header = Header::merge(&self.header, &other.header);
        self.records = records;
        self.file_info = None;
        self.clear_caches();
    }

    /// Replace each `(left, right)` column pair by one join column taking the
    /// left value unless it is NULL. Join columns come first.
    fn coalesce(&mut self, pairs: &[(usize, usize)], left_len: usize) {
        let include: Vec<usize> = pairs.iter().map(|&(l, _)| l).collect();
        let exclude: Vec<usize> = pairs.iter().map(|&(_, r)| left_len + r).collect();

        let mut order: Vec<usize> = include.clone();
        order.extend((0..self.header.len()).filter(|i| !include.contains(i) && !exclude.contains(i)));

        let fields = order
            .iter()
            .map(|&i| {
                let mut field = self.header.fields()[i].clone();
                if include.contains(&i) {
                    field.view.clear();
                    field.number = 0;
                    field.is_join_column = true;
                }
                field
            })
            .collect();

        self.records = std::mem::take(&mut self.records)
            .into_iter()
            .map(|record| {
                let cells = order
                    .iter()
                    .map(|&i| {
                        let alternative = include.iter().position(|&l| l == i).map(|p| exclude[p]);
                        match (record.cell(i), alternative) {
                            (Some(cell), Some(alt)) if cell.first().is_null() => {
                                record.cell(alt).cloned().unwrap_or_else(|| cell.clone())
                            }
                            (Some(cell), _) => cell.clone(),
                            (None, _) => Cell::new(Value::Null),
                        }
                    })
                    .collect();
                Record::from_cells(cells)
            })
            .collect();
        self.header = Header::from_fields(fields);
    }
}

fn concat(left: &Record, right: &Record) -> Record {
    let mut cells = Vec::with_capacity(left.len() + right.len());
    cells.extend_from_slice(left.cells());
    cells.extend_from_slice(right.cells());
    Record::from_cells(cells)
}

fn null_record(len: usize) -> Record {
    Record::new(vec![Value::Null; len])
}

fn using_columns(left: &Header, right: &Header, columns: &[String]) -> Result<Vec<(usize, usize)>> {
    columns
        .iter()
        .map(|c| Ok((left.search_name(None, c)?, right.search_name(None, c)?)))
        .collect()
}

/// Column pairs sharing a name; the left side decides the order.
fn natural_columns(left: &Header, right: &Header) -> Result<Vec<(usize, usize)>> {
    let mut pairs = Vec::new();
    for l in left.table_columns(None) {
        let column = &left.fields()[l].column;
        match right.search_name(None, column) {
            Ok(r) => pairs.push((left.search_name(None, column)?, r)),
            Err(ExecutorError::FieldNotExist(_)) => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{config::ExecutorConfig, evaluator::BasicEvaluator};

    fn scope() -> ReferenceScope<'static> {
        ReferenceScope::new(ExecutorConfig::default(), Arc::new(BasicEvaluator))
    }

    fn users() -> View {
        View::from_values(
            "u",
            &["id", "name"],
            vec![
                vec![Value::Integer(1), Value::string("ann")],
                vec![Value::Integer(2), Value::string("bob")],
                vec![Value::Null, Value::string("cid")],
            ],
        )
    }

    fn orders() -> View {
        View::from_values(
            "o",
            &["id", "item"],
            vec![
                vec![Value::Integer(1), Value::string("pen")],
                vec![Value::Integer(1), Value::string("ink")],
                vec![Value::Integer(3), Value::string("cap")],
            ],
        )
    }

    fn on_id() -> Expression {
        Expression::comparison(ComparisonOperator::Equal, Expression::qualified("u", "id"), Expression::qualified("o", "id"))
    }

    #[test]
    fn test_cross_join() {
        let mut view = users();
        view.join(&scope(), orders(), &JoinSpec::cross()).unwrap();
        assert_eq!(view.len(), 9);
        assert_eq!(view.field_len(), 4);
    }

    #[test]
    fn test_inner_join_on() {
        let mut view = users();
        view.inner_join(&scope(), orders(), &on_id()).unwrap();
        assert_eq!(view.column(3), vec![Value::string("pen"), Value::string("ink")]);
    }

    #[test]
    fn test_left_and_full_outer() {
        let mut view = users();
        view.outer_join(&scope(), orders(), &on_id(), JoinDirection::Left).unwrap();
        assert_eq!(view.len(), 4);
        assert_eq!(view.values()[2], vec![Value::Integer(2), Value::string("bob"), Value::Null, Value::Null]);

        let mut view = users();
        view.outer_join(&scope(), orders(), &on_id(), JoinDirection::Full).unwrap();
        assert_eq!(view.len(), 5);
        assert_eq!(view.values()[4], vec![Value::Null, Value::Null, Value::Integer(3), Value::string("cap")]);
    }

    #[test]
    fn test_right_outer_keeps_header_order() {
        let mut view = users();
        view.outer_join(&scope(), orders(), &on_id(), JoinDirection::Right).unwrap();
        assert_eq!(view.header().column_names(), vec!["id", "name", "id", "item"]);
        assert_eq!(view.len(), 3);
        assert_eq!(view.values()[2], vec![Value::Null, Value::Null, Value::Integer(3), Value::string("cap")]);
    }

    #[test]
    fn test_using_coalesces() {
        let mut view = users();
        let spec = JoinSpec::outer(JoinDirection::Full, JoinCondition::Using(vec!["id".into()]));
        view.join(&scope(), orders(), &spec).unwrap();
        assert_eq!(view.header().column_names(), vec!["id", "name", "item"]);
        assert!(view.header().get(0).unwrap().is_join_column);
        // unmatched right row takes the right id
        assert_eq!(view.values()[4], vec![Value::Integer(3), Value::Null, Value::string("cap")]);
        // unqualified id resolves to the join column
        assert_eq!(view.header().search(&Expression::field("id")).unwrap(), 0);
    }

    #[test]
    fn test_natural_join_never_matches_null() {
        let mut view = users();
        let mut other = orders();
        other.header_mut().get_mut(1).unwrap().column = "name".into();
        let spec = JoinSpec::inner(JoinCondition::Natural);
        view.join(&scope(), other, &spec).unwrap();
        assert!(view.is_empty());
        assert_eq!(view.header().column_names(), vec!["id", "name"]);
    }
}
