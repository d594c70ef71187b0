//! Header / field catalog
//!
//! A header describes every column of a view: where the column came from, the
//! name it answers to, and the structural identity of computed columns.

use tabview_ast::Expression;

use crate::errors::{ExecutorError, Result};

/// Column name of the synthetic row identity prepended by
/// [`Header::with_internal_id`].
pub const INTERNAL_ID_COLUMN: &str = "@__internal_id";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeaderField {
    /// Owning view name; empty for computed and coalesced join columns
    pub view: String,
    pub column: String,
    /// Canonical text of the expression that produced a computed column
    pub identifier: String,
    pub aliases: Vec<String>,
    /// 1-based ordinal within the source view; 0 when computed
    pub number: usize,
    pub is_from_table: bool,
    pub is_join_column: bool,
    pub is_group_key: bool,
}

impl HeaderField {
    /// Field loaded from a source view.
    pub fn table(view: impl Into<String>, column: impl Into<String>, number: usize) -> Self {
        HeaderField {
            view: view.into(),
            column: column.into(),
            number,
            is_from_table: true,
            ..Default::default()
        }
    }

    /// Field produced by evaluating an expression.
    pub fn computed(expr: &Expression, alias: Option<&str>) -> Self {
        let identifier = expr.to_string();
        HeaderField {
            column: identifier.clone(),
            identifier,
            aliases: alias.map(|a| vec![a.to_string()]).unwrap_or_default(),
            ..Default::default()
        }
    }

    fn answers_to(&self, name: &str) -> bool {
        self.column.eq_ignore_ascii_case(name)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Header {
    fields: Vec<HeaderField>,
}

impl Header {
    /// Header of a source view with columns numbered from 1.
    pub fn new<S: AsRef<str>>(view: &str, columns: &[S]) -> Self {
        let fields = columns
            .iter()
            .enumerate()
            .map(|(i, c)| HeaderField::table(view, c.as_ref(), i + 1))
            .collect();
        Header { fields }
    }

    /// Header with a leading internal-id column used to target rows for
    /// updates and deletes.
    pub fn with_internal_id<S: AsRef<str>>(view: &str, columns: &[S]) -> Self {
        let mut header = Header::new(view, columns);
        header.fields.insert(
            0,
            HeaderField { view: view.to_string(), column: INTERNAL_ID_COLUMN.to_string(), ..Default::default() },
        );
        header
    }

    pub fn from_fields(fields: Vec<HeaderField>) -> Self {
        Header { fields }
    }

    /// Left fields followed by right fields.
    pub fn merge(left: &Header, right: &Header) -> Header {
        let mut fields = Vec::with_capacity(left.len() + right.len());
        fields.extend(left.fields.iter().cloned());
        fields.extend(right.fields.iter().cloned());
        Header { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&HeaderField> {
        self.fields.get(idx)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut HeaderField> {
        self.fields.get_mut(idx)
    }

    pub fn fields(&self) -> &[HeaderField] {
        &self.fields
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HeaderField> {
        self.fields.iter()
    }

    pub fn push(&mut self, field: HeaderField) -> usize {
        self.fields.push(field);
        self.fields.len() - 1
    }

    pub fn column_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.column.clone()).collect()
    }

    pub fn contains_internal_id(&self) -> bool {
        self.fields.first().is_some_and(|f| f.column == INTERNAL_ID_COLUMN)
    }

    /// Resolve a field reference or column ordinal to a column index.
    pub fn search(&self, expr: &Expression) -> Result<usize> {
        match expr {
            Expression::FieldReference { view, column } => self.search_name(view.as_deref(), column),
            Expression::ColumnNumber { view, number } => self.search_number(view, *number),
            other => Err(ExecutorError::FieldNotExist(other.to_string())),
        }
    }

    /// Case-insensitive name search.
    ///
    /// A qualified name must match both view and column. An unqualified name
    /// also matches aliases, and a join column with that name wins outright.
    pub fn search_name(&self, view: Option<&str>, column: &str) -> Result<usize> {
        let display = || match view {
            Some(v) => format!("{}.{}", v, column),
            None => column.to_string(),
        };

        let mut found: Option<usize> = None;
        for (i, field) in self.fields.iter().enumerate() {
            match view {
                Some(v) => {
                    if !field.view.eq_ignore_ascii_case(v) || !field.column.eq_ignore_ascii_case(column) {
                        continue;
                    }
                }
                None => {
                    if field.is_join_column && field.column.eq_ignore_ascii_case(column) {
                        return Ok(i);
                    }
                    if !field.answers_to(column) {
                        continue;
                    }
                }
            }
            if found.is_some() {
                return Err(ExecutorError::FieldAmbiguous(display()));
            }
            found = Some(i);
        }
        found.ok_or_else(|| ExecutorError::FieldNotExist(display()))
    }

    pub fn search_number(&self, view: &str, number: usize) -> Result<usize> {
        self.fields
            .iter()
            .position(|f| number > 0 && f.number == number && f.view.eq_ignore_ascii_case(view))
            .ok_or_else(|| ExecutorError::FieldNotExist(format!("{}.{}", view, number)))
    }

    /// Column already holding `expr`, if any.
    ///
    /// References resolve by name; any other expression matches a computed
    /// column with the same canonical text.
    pub fn contains_object(&self, expr: &Expression) -> Option<usize> {
        match expr {
            Expression::FieldReference { .. } | Expression::ColumnNumber { .. } => self.search(expr).ok(),
            _ => {
                let identifier = expr.to_string();
                self.fields.iter().position(|f| !f.is_from_table && f.identifier == identifier)
            }
        }
    }

    /// Re-point every field at `view`, optionally renaming them 1:1.
    ///
    /// Aliases are dropped; they belonged to the previous owner.
    pub fn update<S: AsRef<str>>(&mut self, view: &str, names: Option<&[S]>) -> Result<()> {
        if let Some(names) = names {
            if names.len() != self.fields.len() {
                return Err(ExecutorError::FieldLengthNotMatch {
                    expected: self.fields.len(),
                    actual: names.len(),
                });
            }
            for (i, name) in names.iter().enumerate() {
                let name = name.as_ref();
                if names[..i].iter().any(|n| n.as_ref().eq_ignore_ascii_case(name)) {
                    return Err(ExecutorError::DuplicateFieldName(name.to_string()));
                }
            }
        }

        for (i, field) in self.fields.iter_mut().enumerate() {
            field.view = view.to_string();
            if let Some(names) = names {
                field.column = names[i].as_ref().to_string();
            }
            field.aliases.clear();
        }
        Ok(())
    }

    /// Indices of fields loaded from source views, optionally restricted to one
    /// view. Used for `*` and `view.*` expansion.
    pub fn table_columns(&self, view: Option<&str>) -> Vec<usize> {
        self.fields
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_from_table || f.is_join_column)
            .filter(|(_, f)| match view {
                Some(v) => f.is_from_table && f.view.eq_ignore_ascii_case(v),
                None => true,
            })
            .map(|(i, _)| i)
            .collect()
    }
}
