//! Row predicates built from a `WHERE` clause.
//!
//! A predicate is plain data (column, operator, literal) interpreted by
//! [compare]; tables check it against their schema before scanning so a bad
//! predicate fails even on an empty table.

use std::cmp::Ordering;

use crate::ast::{ComparisonOp, WhereClause};
use crate::error::{Error, Result};
use crate::table::ColumnDef;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Predicate {
    /// Matches every row; used when the statement has no `WHERE` clause.
    #[default]
    Always,
    /// `column op value`
    Compare {
        column: String,
        op: ComparisonOp,
        value: Value,
    },
}

impl Predicate {
    pub fn compare(column: impl Into<String>, op: ComparisonOp, value: Value) -> Self {
        Self::Compare {
            column: column.into(),
            op,
            value,
        }
    }

    /// Name of the column the predicate reads, if any.
    pub fn column(&self) -> Option<&str> {
        match self {
            Self::Always => None,
            Self::Compare { column, .. } => Some(column),
        }
    }

    /// Validates the operator and literal against the column they apply to.
    ///
    /// Runs before any row is read, so a mismatched literal fails the whole
    /// statement instead of matching nothing (see [compare]).
    ///
    /// # Errors
    /// Returns [Error::Schema] if the literal type differs from the column type,
    /// or if an ordering operator is applied to a `BOOLEAN` column.
    pub fn check(&self, column: &ColumnDef) -> Result<()> {
        let Self::Compare { op, value, .. } = self else {
            return Ok(());
        };

        if value.data_type() != column.data_type {
            return Err(Error::schema(format!(
                "cannot compare column \"{}\" of type {} with {} value {value}",
                column.name,
                column.data_type,
                value.data_type()
            )));
        }

        if op.is_ordering() && !column.data_type.is_ordered() {
            return Err(Error::schema(format!(
                "operator {op} is not supported for column \"{}\" of type {}",
                column.name, column.data_type
            )));
        }

        Ok(())
    }

    /// Evaluates the predicate against the value the row holds for [Predicate::column].
    pub fn evaluate(&self, row_value: Option<&Value>) -> Result<bool> {
        match (self, row_value) {
            (Self::Always, _) => Ok(true),
            (Self::Compare { op, value, .. }, Some(left)) => compare(left, *op, value),
            (Self::Compare { column, .. }, None) => {
                Err(Error::runtime(format!("row has no value for column \"{column}\"")))
            }
        }
    }
}

impl From<Option<WhereClause>> for Predicate {
    fn from(where_clause: Option<WhereClause>) -> Self {
        match where_clause {
            None => Self::Always,
            Some(WhereClause { column, op, value }) => Self::Compare { column, op, value },
        }
    }
}

/// Applies `op` to two values of the same type.
///
/// Integers and text use their natural ordering; booleans only support
/// equality and inequality.
///
/// Values of different types are never silently unequal: `title = 1` on a
/// `TEXT` column is an error, not an empty match, and `title != 1` is an
/// error rather than a match on every row. This makes schema errors reachable
/// from a `WHERE` clause as well as from `INSERT` and `UPDATE`.
///
/// # Errors
/// Returns [Error::Schema] on mixed types or on an ordering of booleans.
pub fn compare(left: &Value, op: ComparisonOp, right: &Value) -> Result<bool> {
    let ordering = match (left, right) {
        (Value::Int(l), Value::Int(r)) => l.cmp(r),
        (Value::Text(l), Value::Text(r)) => l.cmp(r),
        (Value::Bool(l), Value::Bool(r)) => {
            return match op {
                ComparisonOp::Eq => Ok(l == r),
                ComparisonOp::NotEq => Ok(l != r),
                _ => Err(Error::schema(format!(
                    "operator {op} is not supported for BOOLEAN values"
                ))),
            };
        }
        _ => {
            return Err(Error::schema(format!(
                "type mismatch: cannot compare {} with {}",
                left.data_type(),
                right.data_type()
            )));
        }
    };

    Ok(match op {
        ComparisonOp::Eq => ordering == Ordering::Equal,
        ComparisonOp::NotEq => ordering != Ordering::Equal,
        ComparisonOp::Lt => ordering == Ordering::Less,
        ComparisonOp::Gt => ordering == Ordering::Greater,
        ComparisonOp::LtEq => ordering != Ordering::Greater,
        ComparisonOp::GtEq => ordering != Ordering::Less,
    })
}
