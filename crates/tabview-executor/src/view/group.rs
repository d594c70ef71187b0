//! GROUP BY

use indexmap::IndexMap;
use tabview_ast::Expression;
use tabview_types::Value;

use super::{Cell, Record, View};
use crate::{errors::Result, scope::ReferenceScope};

impl View {
    /// Bucket records by the values of `keys`.
    ///
    /// One record is produced per distinct key, in the order keys are first
    /// seen; each of its cells holds the values of every member. With no
    /// keys the whole view becomes a single group.
    pub fn group_by(&mut self, scope: &ReferenceScope<'_>, keys: &[Expression]) -> Result<()> {
        if keys.is_empty() {
            self.group_all();
            return Ok(());
        }

        let mut key_columns = Vec::with_capacity(keys.len());
        for key in keys {
            key_columns.push(self.eval_column(scope, key, None)?);
        }
        let row_keys = self.comparison_keys(scope, &key_columns)?;

        let mut buckets: IndexMap<String, Vec<usize>> = IndexMap::new();
        for (i, key) in row_keys.into_iter().enumerate() {
            buckets.entry(key).or_default().push(i);
        }

        let field_len = self.header.len();
        let records: Vec<Record> = buckets
            .values()
            .map(|members| {
                let cells = (0..field_len)
                    .map(|c| Cell::group(members.iter().map(|&m| self.records[m].value(c).clone()).collect()))
                    .collect();
                Record::from_cells(cells)
            })
            .collect();

        log::debug!("group by: {} records -> {} groups", self.records.len(), records.len());

        for &c in &key_columns {
            if let Some(field) = self.header.get_mut(c) {
                field.is_group_key = true;
            }
        }
        self.records = records;
        self.is_grouped = true;
        self.clear_caches();
        Ok(())
    }

    /// Collapse every record into one group. An empty view stays empty.
    pub(crate) fn group_all(&mut self) {
        if !self.records.is_empty() {
            let field_len = self.header.len();
            let cells = (0..field_len)
                .map(|c| Cell::group(self.records.iter().map(|r| r.value(c).clone()).collect::<Vec<Value>>()))
                .collect();
            self.records = vec![Record::from_cells(cells)];
        }
        self.is_grouped = true;
        self.clear_caches();
    }
}
