//! Error type shared by every stage of the statement pipeline.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure raised while tokenizing, parsing or executing a statement.
///
/// Only [Error::Syntax] is hidden from callers of the executor; the message of
/// every other variant is surfaced verbatim in the `QueryResult`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The tokenizer or parser rejected the statement text.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// The addressed table is not registered in the catalog.
    #[error("Relation \"{0}\" does not exist")]
    NotFound(String),

    /// `CREATE TABLE` used a name that is already registered.
    #[error("Relation \"{0}\" already exists")]
    AlreadyExists(String),

    /// Unknown column, arity mismatch or type mismatch.
    #[error("{0}")]
    Schema(String),

    /// Primary-key collision.
    #[error("{0}")]
    Constraint(String),

    #[error("{0}")]
    Runtime(String),
}

impl Error {
    pub fn syntax(msg: impl Into<String>) -> Self {
        Self::Syntax(msg.into())
    }

    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    pub fn constraint(msg: impl Into<String>) -> Self {
        Self::Constraint(msg.into())
    }

    pub fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime(msg.into())
    }
}
