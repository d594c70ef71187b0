//! UNION, EXCEPT and INTERSECT
//!
//! Both sides are compared record by record through their comparison keys
//! over every column. Without ALL the result also drops repeated records,
//! keeping the first occurrence.

use std::collections::HashSet;

use tabview_ast::SetOperator;

use super::View;
use crate::{
    errors::{ExecutorError, Result},
    scope::ReferenceScope,
};

impl View {
    pub fn set_operation(
        &mut self,
        scope: &ReferenceScope<'_>,
        op: SetOperator,
        other: View,
        all: bool,
    ) -> Result<()> {
        match op {
            SetOperator::Union => self.union(scope, other, all),
            SetOperator::Except => self.except(scope, other, all),
            SetOperator::Intersect => self.intersect(scope, other, all),
        }
    }

    /// Records of `self` followed by records of `other`.
    pub fn union(&mut self, scope: &ReferenceScope<'_>, mut other: View, all: bool) -> Result<()> {
        self.check_field_length(&other)?;
        if all {
            self.records.append(&mut other.records);
        } else {
            let left = self.all_column_keys(scope)?;
            let right = other.all_column_keys(scope)?;
            let mut seen = HashSet::with_capacity(left.len() + right.len());
            let keep_left: Vec<bool> = left.into_iter().map(|k| seen.insert(k)).collect();
            let keep_right: Vec<bool> = right.into_iter().map(|k| seen.insert(k)).collect();

            let records = std::mem::take(&mut self.records);
            self.records = records
                .into_iter()
                .zip(keep_left)
                .chain(other.records.into_iter().zip(keep_right))
                .filter_map(|(record, keep)| keep.then_some(record))
                .collect();
        }
        self.finish_set_operation("union");
        Ok(())
    }

    /// Records of `self` that have no equal record in `other`.
    pub fn except(&mut self, scope: &ReferenceScope<'_>, mut other: View, all: bool) -> Result<()> {
        self.check_field_length(&other)?;
        let exclude: HashSet<String> = other.all_column_keys(scope)?.into_iter().collect();
        self.filter_by_keys(scope, all, |key| !exclude.contains(key))?;
        self.finish_set_operation("except");
        Ok(())
    }

    /// Records of `self` that have an equal record in `other`.
    pub fn intersect(&mut self, scope: &ReferenceScope<'_>, mut other: View, all: bool) -> Result<()> {
        self.check_field_length(&other)?;
        let include: HashSet<String> = other.all_column_keys(scope)?.into_iter().collect();
        self.filter_by_keys(scope, all, |key| include.contains(key))?;
        self.finish_set_operation("intersect");
        Ok(())
    }

    pub(crate) fn check_field_length(&self, other: &View) -> Result<()> {
        if self.header.len() != other.header.len() {
            return Err(ExecutorError::CombinedSetFieldLength {
                expected: self.header.len(),
                actual: other.header.len(),
            });
        }
        Ok(())
    }

    pub(crate) fn all_column_keys(&mut self, scope: &ReferenceScope<'_>) -> Result<Vec<String>> {
        let columns: Vec<usize> = (0..self.header.len()).collect();
        self.comparison_keys(scope, &columns)
    }

    fn filter_by_keys<F>(&mut self, scope: &ReferenceScope<'_>, all: bool, keep: F) -> Result<()>
    where
        F: Fn(&str) -> bool,
    {
        let keys = self.all_column_keys(scope)?;
        let mut seen = HashSet::with_capacity(keys.len());
        let indices: Vec<usize> = keys
            .into_iter()
            .enumerate()
            .filter(|(_, key)| keep(key))
            .filter(|(_, key)| all || seen.insert(key.clone()))
            .map(|(i, _)| i)
            .collect();
        self.retain_indices(&indices);
        Ok(())
    }

    fn finish_set_operation(&mut self, name: &str) {
        self.file_info = None;
        self.clear_caches();
        log::debug!("{}: {} records", name, self.records.len());
    }
}
