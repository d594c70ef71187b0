//! Record and cell model
//!
//! A [`Cell`] is an immutable, reference-counted run of values: one value in an
//! ordinary row, one value per member in a grouped row. Copying a record copies
//! only the handles, so views can be duplicated cheaply and cells are safe to
//! read from any worker thread.

use std::sync::Arc;

use tabview_types::Value;

pub(crate) static NULL: Value = Value::Null;

#[derive(Debug, Clone, PartialEq)]
pub struct Cell(Arc<[Value]>);

impl Cell {
    pub fn new(value: Value) -> Self {
        Cell(Arc::from(vec![value]))
    }

    /// Cell holding one value per group member.
    pub fn group(values: Vec<Value>) -> Self {
        Cell(Arc::from(values))
    }

    /// Cell of the synthesized empty group.
    pub fn empty() -> Self {
        Cell(Arc::from(Vec::new()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value at `idx`, or NULL past the end.
    pub fn value(&self, idx: usize) -> &Value {
        self.0.get(idx).unwrap_or(&NULL)
    }

    /// First value; NULL for an empty group.
    pub fn first(&self) -> &Value {
        self.value(0)
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    /// Value seen by a group member: single-valued cells answer every member.
    pub fn member(&self, member: usize) -> &Value {
        if self.0.len() == 1 {
            &self.0[0]
        } else {
            self.value(member)
        }
    }
}

impl From<Value> for Cell {
    fn from(value: Value) -> Self {
        Cell::new(value)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    cells: Vec<Cell>,
}

pub type RecordSet = Vec<Record>;

impl Record {
    pub fn new(values: Vec<Value>) -> Self {
        Record { cells: values.into_iter().map(Cell::new).collect() }
    }

    /// Record whose first cell carries a synthetic row identity.
    pub fn with_internal_id(id: i64, values: Vec<Value>) -> Self {
        let mut cells = Vec::with_capacity(values.len() + 1);
        cells.push(Cell::new(Value::Integer(id)));
        cells.extend(values.into_iter().map(Cell::new));
        Record { cells }
    }

    pub fn from_cells(cells: Vec<Cell>) -> Self {
        Record { cells }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cell(&self, idx: usize) -> Option<&Cell> {
        self.cells.get(idx)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn into_cells(self) -> Vec<Cell> {
        self.cells
    }

    /// First value of the cell at `idx`; NULL when out of range.
    pub fn value(&self, idx: usize) -> &Value {
        self.cells.get(idx).map(Cell::first).unwrap_or(&NULL)
    }

    pub fn push(&mut self, cell: Cell) {
        self.cells.push(cell);
    }

    /// Install a new cell; the previous one is left untouched for any other
    /// record still sharing it.
    pub fn replace(&mut self, idx: usize, cell: Cell) {
        if let Some(slot) = self.cells.get_mut(idx) {
            *slot = cell;
        }
    }

    /// Number of members in a grouped row.
    pub fn group_len(&self) -> usize {
        self.cells.first().map(Cell::len).unwrap_or(0)
    }

    /// First value of every cell, as a plain row.
    pub fn first_values(&self) -> Vec<Value> {
        self.cells.iter().map(|c| c.first().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_shares_cells() {
        let record = Record::new(vec![Value::Integer(1), Value::string("a")]);
        let copy = record.clone();
        assert!(Arc::ptr_eq(&record.cells[1].0, &copy.cells[1].0));
    }

    #[test]
    fn test_replace_leaves_other_copies() {
        let record = Record::new(vec![Value::Integer(1)]);
        let mut copy = record.clone();
        copy.replace(0, Cell::new(Value::Integer(2)));
        assert_eq!(record.value(0), &Value::Integer(1));
        assert_eq!(copy.value(0), &Value::Integer(2));
    }

    #[test]
    fn test_group_cells() {
        let record = Record::from_cells(vec![
            Cell::group(vec![Value::Integer(1), Value::Integer(2)]),
            Cell::new(Value::string("k")),
        ]);
        assert_eq!(record.group_len(), 2);
        assert_eq!(record.cell(0).unwrap().member(1), &Value::Integer(2));
        assert_eq!(record.cell(1).unwrap().member(1), &Value::string("k"));
        assert_eq!(Cell::empty().first(), &Value::Null);
    }

    #[test]
    fn test_internal_id() {
        let record = Record::with_internal_id(7, vec![Value::string("x")]);
        assert_eq!(record.len(), 2);
        assert_eq!(record.value(0), &Value::Integer(7));
    }
}
