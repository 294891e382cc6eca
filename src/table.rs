use std::collections::HashSet;

use bitvec::prelude::*;

use crate::ast::ColumnsSelect;
use crate::column::Column;
use crate::data_type::DataType;
use crate::error::{Error, Result};
use crate::predicate::Predicate;
use crate::row::Row;
use crate::value::Value;

/// Column definition in the schema
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: DataType,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Ordered column definitions plus an optional primary-key column.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub columns: Vec<ColumnDef>,
    pub primary_key: Option<String>,
}

impl Schema {
    /// Builds a schema, rejecting duplicate column names and a primary key
    /// that names no column.
    pub fn new(columns: Vec<ColumnDef>, primary_key: Option<String>) -> Result<Self> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(Error::schema(format!(
                    "column \"{}\" specified more than once",
                    column.name
                )));
            }
        }

        if let Some(key) = &primary_key {
            if !seen.contains(key.as_str()) {
                return Err(Error::schema(format!(
                    "primary key column \"{key}\" does not exist"
                )));
            }
        }

        Ok(Self {
            columns,
            primary_key,
        })
    }

    /// Position of `name` in schema order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    fn primary_key_position(&self) -> Option<usize> {
        self.primary_key.as_deref().and_then(|key| self.position(key))
    }
}

/// A named, schema-typed row store. Rows keep insertion order and are stored
/// column by column.
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub schema: Schema,
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    pub fn new(name: String, schema: Schema) -> Self {
        let columns = schema
            .columns
            .iter()
            .map(|column| Column::new(column.name.clone(), column.data_type))
            .collect();
        Self {
            name,
            schema,
            columns,
            row_count: 0,
        }
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    fn column_index(&self, name: &str) -> Result<usize> {
        self.schema.position(name).ok_or_else(|| {
            Error::schema(format!(
                "column \"{name}\" of relation \"{}\" does not exist",
                self.name
            ))
        })
    }

    /// Inserts one row per value tuple.
    ///
    /// Values are matched positionally with `columns`, or with the full schema
    /// order when `columns` is `None`. Every tuple is validated before the first
    /// one is stored, so a failing tuple leaves the table untouched.
    ///
    /// # Errors
    /// - [Error::Schema] on an unknown, repeated or missing column, an arity
    ///   mismatch, or a value of the wrong type.
    /// - [Error::Constraint] if a primary-key value is already stored or
    ///   appears twice in the statement.
    pub fn insert(&mut self, columns: Option<&[String]>, tuples: Vec<Vec<Value>>) -> Result<usize> {
        let targets = self.insert_targets(columns)?;

        let mut rows = Vec::with_capacity(tuples.len());
        for tuple in tuples {
            if tuple.len() != targets.len() {
                return Err(Error::schema(format!(
                    "INSERT has {} values but {} columns were expected",
                    tuple.len(),
                    targets.len()
                )));
            }

            // Reorder the tuple into schema order
            let mut row: Vec<Option<Value>> = vec![None; self.schema.columns.len()];
            for (value, &idx) in tuple.into_iter().zip(&targets) {
                let column = &self.schema.columns[idx];
                if value.data_type() != column.data_type {
                    return Err(Error::schema(format!(
                        "value {value} has type {} while column \"{}\" has type {}",
                        value.data_type(),
                        column.name,
                        column.data_type
                    )));
                }
                row[idx] = Some(value);
            }
            let row = row
                .into_iter()
                .collect::<Option<Vec<Value>>>()
                .ok_or_else(|| Error::runtime("incomplete row after column mapping"))?;
            rows.push(row);
        }

        if let Some(pk) = self.schema.primary_key_position() {
            let mut keys: HashSet<Value> = (0..self.row_count)
                .filter_map(|i| self.columns[pk].get(i))
                .collect();
            for row in &rows {
                if !keys.insert(row[pk].clone()) {
                    return Err(self.duplicate_key(&row[pk]));
                }
            }
        }

        let inserted = rows.len();
        for row in rows {
            for (column, value) in self.columns.iter_mut().zip(row) {
                column.push(value)?;
            }
            self.row_count += 1;
        }
        Ok(inserted)
    }

    /// Resolves the INSERT column list to schema positions.
    fn insert_targets(&self, columns: Option<&[String]>) -> Result<Vec<usize>> {
        let Some(columns) = columns else {
            return Ok((0..self.schema.columns.len()).collect());
        };

        let mut targets = Vec::with_capacity(columns.len());
        for name in columns {
            let idx = self.column_index(name)?;
            if targets.contains(&idx) {
                return Err(Error::schema(format!(
                    "column \"{name}\" specified more than once"
                )));
            }
            targets.push(idx);
        }

        if let Some(missing) = self
            .schema
            .column_names()
            .enumerate()
            .find(|(idx, _)| !targets.contains(idx))
        {
            return Err(Error::schema(format!(
                "missing value for column \"{}\" of relation \"{}\"",
                missing.1, self.name
            )));
        }
        Ok(targets)
    }

    /// Computes the set of rows the predicate holds for, as one bit per row.
    fn matching(&self, predicate: &Predicate) -> Result<BitVec> {
        let Some(column_name) = predicate.column() else {
            return Ok(BitVec::repeat(true, self.row_count));
        };

        let idx = self.column_index(column_name)?;
        predicate.check(&self.schema.columns[idx])?;

        let column = &self.columns[idx];
        (0..self.row_count)
            .map(|row| predicate.evaluate(column.get(row).as_ref()))
            .collect()
    }

    /// Returns the rows the predicate holds for, in stored order, projected
    /// onto `projection`.
    ///
    /// A column named more than once in the projection appears once, at its
    /// first position.
    ///
    /// # Errors
    /// Returns [Error::Schema] if a projected or filtered column is not in the schema.
    pub fn select(&self, projection: &ColumnsSelect, predicate: &Predicate) -> Result<Vec<Row>> {
        let projected: Vec<usize> = match projection {
            ColumnsSelect::Star => (0..self.columns.len()).collect(),
            ColumnsSelect::ColumnsNames(names) => {
                let mut projected = Vec::with_capacity(names.len());
                for name in names {
                    let idx = self.column_index(name)?;
                    if !projected.contains(&idx) {
                        projected.push(idx);
                    }
                }
                projected
            }
        };

        let mask = self.matching(predicate)?;

        mask.iter_ones()
            .map(|row_idx| {
                projected
                    .iter()
                    .map(|&col_idx| {
                        let column = &self.columns[col_idx];
                        column
                            .get(row_idx)
                            .map(|value| (column.name.clone(), value))
                            .ok_or_else(|| {
                                Error::runtime(format!("row {row_idx} is missing from storage"))
                            })
                    })
                    .collect::<Result<Row>>()
            })
            .collect()
    }

    /// Overwrites the assigned columns of every row the predicate holds for.
    ///
    /// Returns the number of rows changed. Either every matching row is
    /// updated or, on error, none is.
    ///
    /// # Errors
    /// - [Error::Schema] on an unknown column or a value of the wrong type.
    /// - [Error::Constraint] if the new primary-key value would collide.
    pub fn update(&mut self, assignments: &[(String, Value)], predicate: &Predicate) -> Result<usize> {
        let mut resolved = Vec::with_capacity(assignments.len());
        for (name, value) in assignments {
            let idx = self.column_index(name)?;
            let column = &self.schema.columns[idx];
            if value.data_type() != column.data_type {
                return Err(Error::schema(format!(
                    "value {value} has type {} while column \"{}\" has type {}",
                    value.data_type(),
                    column.name,
                    column.data_type
                )));
            }
            resolved.push((idx, value));
        }

        let mask = self.matching(predicate)?;
        let updated = mask.count_ones();
        if updated == 0 {
            return Ok(0);
        }

        if let Some(pk) = self.schema.primary_key_position() {
            // The last assignment to a column wins
            if let Some((_, key)) = resolved.iter().rev().find(|(idx, _)| *idx == pk) {
                if updated > 1 {
                    return Err(self.duplicate_key(key));
                }
                let collides = mask
                    .iter_zeros()
                    .any(|row| self.columns[pk].get(row).as_ref() == Some(*key));
                if collides {
                    return Err(self.duplicate_key(key));
                }
            }
        }

        for (idx, value) in resolved {
            let column = &mut self.columns[idx];
            for row in mask.iter_ones() {
                column.set(row, value)?;
            }
        }
        Ok(updated)
    }

    /// Removes every row the predicate holds for and returns how many were removed.
    ///
    /// # Errors
    /// Returns [Error::Schema] if the predicate names an unknown column.
    pub fn delete(&mut self, predicate: &Predicate) -> Result<usize> {
        let mask = self.matching(predicate)?;
        let deleted = mask.count_ones();
        if deleted == 0 {
            return Ok(0);
        }

        for column in &mut self.columns {
            column.remove_marked(&mask)?;
        }
        self.row_count -= deleted;
        Ok(deleted)
    }

    fn duplicate_key(&self, key: &Value) -> Error {
        Error::constraint(format!(
            "duplicate key value violates primary key \"{}\" of relation \"{}\": {key}",
            self.schema.primary_key.as_deref().unwrap_or_default(),
            self.name
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ComparisonOp;

    fn books() -> Table {
        let schema = Schema::new(
            vec![
                ColumnDef::new("id", DataType::Int),
                ColumnDef::new("title", DataType::Text),
                ColumnDef::new("read", DataType::Bool),
            ],
            Some("id".into()),
        )
        .unwrap();
        Table::new("books".into(), schema)
    }

    fn book(id: i64, title: &str, read: bool) -> Vec<Value> {
        vec![Value::Int(id), Value::from(title), Value::Bool(read)]
    }

    fn seeded() -> Table {
        let mut table = books();
        table
            .insert(
                None,
                vec![
                    book(1, "Dune", true),
                    book(2, "Emma", false),
                    book(3, "Ulysses", true),
                ],
            )
            .unwrap();
        table
    }

    fn stored_row(table: &Table, row_idx: usize) -> Option<Vec<Value>> {
        if table.row_count <= row_idx {
            return None;
        }
        table.columns.iter().map(|col| col.get(row_idx)).collect()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_schema_rejects_duplicates_and_unknown_key() {
        let dup = Schema::new(
            vec![
                ColumnDef::new("id", DataType::Int),
                ColumnDef::new("id", DataType::Text),
            ],
            None,
        );
        assert!(matches!(dup, Err(Error::Schema(_))));

        let bad_key = Schema::new(vec![ColumnDef::new("id", DataType::Int)], Some("x".into()));
        assert!(matches!(bad_key, Err(Error::Schema(_))));
    }

    #[test]
    fn test_table_insert_and_get() {
        let table = seeded();

        assert_eq!(table.row_count(), 3);
        assert_eq!(stored_row(&table, 1), Some(book(2, "Emma", false)));
        assert_eq!(stored_row(&table, 3), None);
        assert_eq!(table.schema.position("title"), Some(1));
        assert_eq!(table.schema.position("author"), None);
    }

    #[test]
    fn test_insert_with_reordered_columns() {
        let mut table = books();
        table
            .insert(
                Some(names(&["read", "title", "id"]).as_slice()),
                vec![vec![Value::Bool(false), Value::from("Dune"), Value::Int(7)]],
            )
            .unwrap();

        assert_eq!(stored_row(&table, 0), Some(book(7, "Dune", false)));
    }

    #[test]
    fn test_insert_validation_errors() {
        let mut table = books();

        let unknown = table.insert(
            Some(names(&["id", "title", "author"]).as_slice()),
            vec![book(1, "Dune", true)],
        );
        assert!(matches!(unknown, Err(Error::Schema(_))));

        let missing = table.insert(
            Some(names(&["id", "title"]).as_slice()),
            vec![vec![Value::Int(1), Value::from("Dune")]],
        );
        assert!(matches!(missing, Err(Error::Schema(_))));

        let arity = table.insert(None, vec![vec![Value::Int(1)]]);
        assert!(matches!(arity, Err(Error::Schema(_))));

        let wrong_type = table.insert(
            None,
            vec![vec![Value::from("1"), Value::from("Dune"), Value::Bool(true)]],
        );
        assert!(matches!(wrong_type, Err(Error::Schema(_))));

        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_insert_is_all_or_nothing() {
        let mut table = seeded();

        // The second tuple collides with a stored key
        let result = table.insert(None, vec![book(4, "Beloved", false), book(2, "Emma", false)]);
        assert!(matches!(result, Err(Error::Constraint(_))));
        assert_eq!(table.row_count(), 3);

        // Collision inside the statement itself
        let result = table.insert(None, vec![book(5, "A", false), book(5, "B", false)]);
        assert!(matches!(result, Err(Error::Constraint(_))));
        assert_eq!(table.row_count(), 3);

        // A bad tuple after a good one
        let result = table.insert(None, vec![book(6, "C", false), vec![Value::Int(7)]]);
        assert!(matches!(result, Err(Error::Schema(_))));
        assert_eq!(table.row_count(), 3);
    }

    #[test]
    fn test_select_star_in_insertion_order() {
        let table = seeded();
        let rows = table.select(&ColumnsSelect::Star, &Predicate::Always).unwrap();

        let ids: Vec<_> = rows.iter().map(|r| r.get("id").cloned()).collect();
        assert_eq!(
            ids,
            vec![Some(Value::Int(1)), Some(Value::Int(2)), Some(Value::Int(3))]
        );
        assert_eq!(
            rows[0].columns().collect::<Vec<_>>(),
            vec!["id", "title", "read"]
        );
    }

    #[test]
    fn test_select_projection_follows_request_order() {
        let table = seeded();
        let rows = table
            .select(
                &ColumnsSelect::ColumnsNames(names(&["title", "id"])),
                &Predicate::compare("read", ComparisonOp::Eq, Value::Bool(true)),
            )
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].columns().collect::<Vec<_>>(), vec!["title", "id"]);
        assert_eq!(rows[1].get("title"), Some(&Value::from("Ulysses")));
    }

    #[test]
    fn test_select_repeated_column_appears_once() {
        let table = seeded();
        let rows = table
            .select(
                &ColumnsSelect::ColumnsNames(names(&["id", "title", "id"])),
                &Predicate::compare("id", ComparisonOp::Eq, Value::Int(2)),
            )
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].columns().collect::<Vec<_>>(), vec!["id", "title"]);
        assert_eq!(rows[0].get("id"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_select_unknown_column() {
        let table = seeded();

        let projection = table.select(
            &ColumnsSelect::ColumnsNames(names(&["author"])),
            &Predicate::Always,
        );
        assert!(matches!(projection, Err(Error::Schema(_))));

        let filter = table.select(
            &ColumnsSelect::Star,
            &Predicate::compare("author", ComparisonOp::Eq, Value::from("x")),
        );
        assert!(matches!(filter, Err(Error::Schema(_))));
    }

    #[test]
    fn test_predicate_is_checked_on_empty_table() {
        let table = books();
        let result = table.select(
            &ColumnsSelect::Star,
            &Predicate::compare("read", ComparisonOp::Gt, Value::Bool(false)),
        );
        assert!(matches!(result, Err(Error::Schema(_))));
    }

    #[test]
    fn test_update_counts_rows() {
        let mut table = seeded();
        let updated = table
            .update(
                &[("read".into(), Value::Bool(false))],
                &Predicate::compare("id", ComparisonOp::GtEq, Value::Int(2)),
            )
            .unwrap();

        assert_eq!(updated, 2);
        assert_eq!(stored_row(&table, 0), Some(book(1, "Dune", true)));
        assert_eq!(stored_row(&table, 2), Some(book(3, "Ulysses", false)));
    }

    #[test]
    fn test_update_primary_key() {
        let mut table = seeded();

        // Moving a key onto itself is fine
        let same = table.update(
            &[("id".into(), Value::Int(1))],
            &Predicate::compare("id", ComparisonOp::Eq, Value::Int(1)),
        );
        assert_eq!(same, Ok(1));

        let collision = table.update(
            &[("id".into(), Value::Int(2))],
            &Predicate::compare("id", ComparisonOp::Eq, Value::Int(1)),
        );
        assert!(matches!(collision, Err(Error::Constraint(_))));

        let fan_out = table.update(&[("id".into(), Value::Int(9))], &Predicate::Always);
        assert!(matches!(fan_out, Err(Error::Constraint(_))));

        let moved = table.update(
            &[("id".into(), Value::Int(9))],
            &Predicate::compare("title", ComparisonOp::Eq, Value::from("Emma")),
        );
        assert_eq!(moved, Ok(1));
        assert_eq!(stored_row(&table, 1), Some(book(9, "Emma", false)));
    }

    #[test]
    fn test_update_validation_errors_leave_rows_untouched() {
        let mut table = seeded();

        let wrong_type = table.update(
            &[
                ("title".into(), Value::from("X")),
                ("read".into(), Value::Int(1)),
            ],
            &Predicate::Always,
        );
        assert!(matches!(wrong_type, Err(Error::Schema(_))));

        let unknown = table.update(&[("author".into(), Value::from("X"))], &Predicate::Always);
        assert!(matches!(unknown, Err(Error::Schema(_))));

        assert_eq!(stored_row(&table, 0), Some(book(1, "Dune", true)));
    }

    #[test]
    fn test_delete_with_and_without_predicate() {
        let mut table = seeded();

        let deleted = table
            .delete(&Predicate::compare("title", ComparisonOp::Lt, Value::from("F")))
            .unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(table.row_count(), 1);
        assert_eq!(stored_row(&table, 0), Some(book(3, "Ulysses", true)));

        assert_eq!(table.delete(&Predicate::Always).unwrap(), 1);
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.delete(&Predicate::Always).unwrap(), 0);
    }

    #[test]
    fn test_deleted_key_can_be_reused() {
        let mut table = seeded();
        table
            .delete(&Predicate::compare("id", ComparisonOp::Eq, Value::Int(2)))
            .unwrap();

        assert_eq!(table.insert(None, vec![book(2, "Emma", true)]), Ok(1));
        assert_eq!(stored_row(&table, 2), Some(book(2, "Emma", true)));
    }
}
