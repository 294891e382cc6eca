use std::sync::Arc;

use crate::data_type::DataType;
use crate::error::{Error, Result};
use crate::value::Value;
use bitvec::prelude::*;

/// Physical storage for column data.
/// Each variant wraps a collection of a specific type to ensure contiguous memory
/// allocation (columnar storage).
#[derive(Debug, Clone)]
pub enum ColumnData {
    /// Vector of 64-bit integers.
    Int(Vec<i64>),
    /// Vector of thread-safe atomic reference-counted strings.
    Text(Vec<Arc<str>>),
    /// Compact bit-vector for boolean values.
    Bool(BitVec),
}

/// Represents a column within a table: metadata (name, type) plus its values.
#[derive(Debug, Clone)]
pub struct Column {
    /// The name of the column.
    pub name: String,
    /// The logical data type of the column.
    pub data_type: DataType,
    /// The actual values stored in the column.
    pub data: ColumnData,
}

impl Column {
    /// Creates a new, empty column with the specified name and data type.
    /// The underlying data storage is initialized according to the data type.
    pub fn new(name: String, data_type: DataType) -> Self {
        let data = match data_type {
            DataType::Int => ColumnData::Int(vec![]),
            DataType::Bool => ColumnData::Bool(bitvec!()),
            DataType::Text => ColumnData::Text(vec![]),
        };
        Self {
            name,
            data_type,
            data,
        }
    }

    fn check_type(&self, value: &Value) -> Result<()> {
        if value.data_type() != self.data_type {
            return Err(Error::schema(format!(
                "value {value} has type {} while column \"{}\" has type {}",
                value.data_type(),
                self.name,
                self.data_type
            )));
        }
        Ok(())
    }

    /// Appends a new value to the end of the column.
    ///
    /// # Errors
    /// Returns an error if the value's type does not match the column's data type.
    ///
    /// # Example
    /// ```
    /// # use minidb::column::Column;
    /// # use minidb::data_type::DataType;
    /// # use minidb::value::Value;
    /// let mut col = Column::new("age".into(), DataType::Int);
    /// col.push(Value::Int(30)).unwrap();
    ///
    /// assert_eq!(col.len(), 1);
    /// assert!(col.push(Value::Bool(true)).is_err());
    /// ```
    pub fn push(&mut self, value: Value) -> Result<()> {
        self.check_type(&value)?;

        match (&mut self.data, value) {
            (ColumnData::Int(col), Value::Int(v)) => col.push(v),
            (ColumnData::Text(col), Value::Text(v)) => col.push(v),
            (ColumnData::Bool(col), Value::Bool(v)) => col.push(v),
            _ => return Err(Error::runtime("internal error: column type mismatch")),
        }

        Ok(())
    }

    /// Returns the number of rows currently stored in the column.
    pub fn len(&self) -> usize {
        match &self.data {
            ColumnData::Int(col) => col.len(),
            ColumnData::Text(col) => col.len(),
            ColumnData::Bool(col) => col.len(),
        }
    }

    /// Returns true if there is no row in the column, else false.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retrieves the value at the specified row index.
    ///
    /// Returns `Some(Value)` if the index is valid, or `None` if it is out of bounds.
    pub fn get(&self, row_idx: usize) -> Option<Value> {
        match &self.data {
            ColumnData::Int(col) => col.get(row_idx).map(|v| Value::Int(*v)),
            ColumnData::Text(col) => col.get(row_idx).map(|v| Value::Text(Arc::clone(v))),
            ColumnData::Bool(col) => col.get(row_idx).map(|v| Value::Bool(*v)),
        }
    }

    /// Removes every row whose bit is set in `mask`, keeping the others in order.
    ///
    /// # Errors
    /// Returns an error if the mask length differs from the column length.
    pub fn remove_marked(&mut self, mask: &BitSlice) -> Result<()> {
        if mask.len() != self.len() {
            return Err(Error::runtime(format!(
                "deletion mask covers {} rows but column \"{}\" has {}",
                mask.len(),
                self.name,
                self.len()
            )));
        }

        match &mut self.data {
            ColumnData::Int(col) => retain_unmarked(col, mask),
            ColumnData::Text(col) => retain_unmarked(col, mask),
            ColumnData::Bool(col) => {
                *col = col
                    .iter()
                    .by_vals()
                    .zip(mask.iter().by_vals())
                    .filter(|(_, marked)| !marked)
                    .map(|(bit, _)| bit)
                    .collect();
            }
        }
        Ok(())
    }

    /// Replace a value in the column by a new value.
    ///
    /// # Errors
    /// Returns an error if the row_idx is too high or if the value's type does not match the
    /// column's data type.
    pub fn set(&mut self, row_idx: usize, value: &Value) -> Result<()> {
        if self.len() <= row_idx {
            return Err(Error::runtime(format!(
                "row index {row_idx} is out of bounds for column \"{}\"",
                self.name
            )));
        }

        self.check_type(value)?;

        match (&mut self.data, value) {
            (ColumnData::Int(col), Value::Int(v)) => col[row_idx] = *v,
            (ColumnData::Text(col), Value::Text(v)) => col[row_idx] = Arc::clone(v),
            (ColumnData::Bool(col), Value::Bool(v)) => col.set(row_idx, *v),
            _ => return Err(Error::runtime("internal error: column type mismatch")),
        }
        Ok(())
    }
}

fn retain_unmarked<T>(values: &mut Vec<T>, mask: &BitSlice) {
    let mut idx = 0;
    values.retain(|_| {
        let keep = !mask[idx];
        idx += 1;
        keep
    });
}
