use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    ColumnDef,
    ast::{CreateTable, Statement},
    catalog::Catalog,
    error::{Error, Result},
    parser,
    predicate::Predicate,
    row::Row,
    table::Schema,
};

/// Message returned for every tokenizer or parser failure.
pub const SYNTAX_ERROR_MESSAGE: &str = "ERROR: invalid or unsupported syntax";

const OK_MESSAGE: &str = "RESULT OK";

/// Uniform outcome of one statement.
///
/// Serializes to `{success, rows?, rowsAffected?, message?}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<Row>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows_affected: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl QueryResult {
    fn ok() -> Self {
        Self {
            success: true,
            rows: None,
            rows_affected: None,
            message: Some(OK_MESSAGE.to_string()),
        }
    }

    fn affected(count: usize, verb: &str) -> Self {
        Self {
            success: true,
            rows: None,
            rows_affected: Some(count),
            message: Some(format!("{OK_MESSAGE}: {count} rows {verb}")),
        }
    }

    fn failure(message: String) -> Self {
        Self {
            success: false,
            rows: None,
            rows_affected: None,
            message: Some(message),
        }
    }
}

impl From<Error> for QueryResult {
    fn from(err: Error) -> Self {
        match err {
            Error::Syntax(_) => Self::failure(SYNTAX_ERROR_MESSAGE.to_string()),
            other => Self::failure(format!("ERROR: {other}")),
        }
    }
}

/// Parses and runs one statement against `catalog`.
///
/// Never fails: errors come back as a `QueryResult` with `success == false`.
/// Syntax errors are reported with [SYNTAX_ERROR_MESSAGE]; every other error
/// message is surfaced as `ERROR: <message>`.
///
/// # Example
/// ```
/// use minidb::{Catalog, Value, executor::execute};
///
/// let mut catalog = Catalog::new("main");
/// execute(&mut catalog, "CREATE TABLE books (id INTEGER PRIMARY KEY, title TEXT)");
/// execute(&mut catalog, "INSERT INTO books (id, title) VALUES (1, 'Dune')");
///
/// let result = execute(&mut catalog, "SELECT * FROM books");
/// assert!(result.success);
/// let rows = result.rows.unwrap();
/// assert_eq!(rows[0].get("title"), Some(&Value::from("Dune")));
///
/// let result = execute(&mut catalog, "SELECT FROM books");
/// assert_eq!(result.message.as_deref(), Some("ERROR: invalid or unsupported syntax"));
/// ```
pub fn execute(catalog: &mut Catalog, sql: &str) -> QueryResult {
    let statement = match parser::parse(sql) {
        Ok(statement) => statement,
        Err(err) => {
            debug!(error = %err, "rejected statement");
            return err.into();
        }
    };

    debug!(kind = statement.kind(), "executing statement");
    run(catalog, statement).unwrap_or_else(QueryResult::from)
}

fn run(catalog: &mut Catalog, statement: Statement) -> Result<QueryResult> {
    match statement {
        Statement::CreateTable(create) => {
            let (name, schema) = schema_from(create)?;
            catalog.create_table(name, schema)?;
            Ok(QueryResult::ok())
        }
        Statement::DropTable(drop) => {
            catalog.drop_table(&drop.name)?;
            Ok(QueryResult::ok())
        }
        Statement::InsertInto(insert) => {
            let table = catalog.get_table_mut(&insert.table)?;
            let inserted = table.insert(insert.columns.as_deref(), insert.rows)?;
            Ok(QueryResult {
                rows_affected: Some(inserted),
                ..QueryResult::ok()
            })
        }
        Statement::Update(update) => {
            let table = catalog.get_table_mut(&update.table)?;
            let updated = table.update(&update.assignments, &Predicate::from(update.where_clause))?;
            Ok(QueryResult::affected(updated, "updated"))
        }
        Statement::Delete(delete) => {
            let table = catalog.get_table_mut(&delete.table)?;
            let deleted = table.delete(&Predicate::from(delete.where_clause))?;
            Ok(QueryResult::affected(deleted, "deleted"))
        }
        Statement::Select(select) => {
            let table = catalog.get_table(&select.table)?;
            if let Some(join) = &select.join {
                warn!(
                    table = %select.table,
                    joined = %join.table,
                    "INNER JOIN is not executed; reading the FROM table only"
                );
            }
            let rows = table.select(&select.columns, &Predicate::from(select.where_clause))?;
            Ok(QueryResult {
                rows: Some(rows),
                ..QueryResult::ok()
            })
        }
    }
}

/// Builds the table schema of a `CREATE TABLE` statement.
///
/// When several columns are marked `PRIMARY KEY` the last one is kept.
fn schema_from(create: CreateTable) -> Result<(String, Schema)> {
    let mut primary_key = None;
    let mut columns = Vec::with_capacity(create.columns.len());

    for decl in create.columns {
        if decl.primary_key {
            if let Some(previous) = primary_key.replace(decl.name.clone()) {
                warn!(
                    table = %create.name,
                    ignored = %previous,
                    kept = %decl.name,
                    "multiple PRIMARY KEY columns, keeping the last one"
                );
            }
        }
        columns.push(ColumnDef::new(decl.name, decl.data_type));
    }

    Ok((create.name, Schema::new(columns, primary_key)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn books() -> Catalog {
        let mut catalog = Catalog::new("test");
        let result = execute(
            &mut catalog,
            "CREATE TABLE books (id INTEGER PRIMARY KEY, title TEXT)",
        );
        assert_eq!(result.message.as_deref(), Some("RESULT OK"));
        catalog
    }

    fn rows(result: QueryResult) -> Vec<Row> {
        assert!(result.success, "unexpected failure: {:?}", result.message);
        result.rows.expect("SELECT returns rows")
    }

    #[test]
    fn test_create_insert_select() {
        let mut catalog = books();

        let insert = execute(
            &mut catalog,
            "INSERT INTO books (id, title) VALUES (1, 'Dune')",
        );
        assert!(insert.success);
        assert_eq!(insert.message.as_deref(), Some("RESULT OK"));
        assert_eq!(insert.rows_affected, Some(1));

        let rows = rows(execute(&mut catalog, "SELECT * FROM books"));
        let expected: Row = [("id", Value::Int(1)), ("title", Value::from("Dune"))]
            .into_iter()
            .collect();
        assert_eq!(rows, vec![expected]);
    }

    #[test]
    fn test_update_then_select() {
        let mut catalog = books();
        execute(&mut catalog, "INSERT INTO books VALUES (1, 'Dune'), (2, 'Emma')");

        let update = execute(&mut catalog, "UPDATE books SET title = 'X' WHERE id = 1");
        assert!(update.success);
        assert_eq!(update.rows_affected, Some(1));
        assert_eq!(update.message.as_deref(), Some("RESULT OK: 1 rows updated"));

        let rows = rows(execute(&mut catalog, "SELECT * FROM books WHERE id = 1"));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("title"), Some(&Value::from("X")));
    }

    #[test]
    fn test_delete_without_where_empties_table() {
        let mut catalog = books();
        execute(&mut catalog, "INSERT INTO books VALUES (1, 'Dune'), (2, 'Emma')");

        let delete = execute(&mut catalog, "DELETE FROM books");
        assert_eq!(delete.rows_affected, Some(2));
        assert_eq!(delete.message.as_deref(), Some("RESULT OK: 2 rows deleted"));

        assert!(rows(execute(&mut catalog, "SELECT * FROM books")).is_empty());
    }

    #[test]
    fn test_unknown_table_is_named() {
        let mut catalog = Catalog::new("test");

        let result = execute(&mut catalog, "SELECT * FROM nosuchtable");
        assert!(!result.success);
        assert_eq!(
            result.message.as_deref(),
            Some("ERROR: Relation \"nosuchtable\" does not exist")
        );
    }

    #[test]
    fn test_syntax_errors_are_generic() {
        let mut catalog = books();

        for sql in [
            "SELECT FROM t",
            "",
            "SELECT * FROM books WHERE id = 1 AND title = 'x'",
            "INSERT INTO books VALUES ('unterminated)",
            "SELECT * FROM books @",
        ] {
            let result = execute(&mut catalog, sql);
            assert!(!result.success);
            assert_eq!(result.message.as_deref(), Some(SYNTAX_ERROR_MESSAGE), "{sql}");
        }
    }

    #[test]
    fn test_duplicate_primary_key_rejects_whole_insert() {
        let mut catalog = books();
        execute(&mut catalog, "INSERT INTO books VALUES (1, 'Dune')");

        let result = execute(
            &mut catalog,
            "INSERT INTO books VALUES (2, 'Emma'), (1, 'Dune again')",
        );
        assert!(!result.success);
        assert!(result.message.unwrap().starts_with("ERROR: duplicate key value"));

        assert_eq!(rows(execute(&mut catalog, "SELECT * FROM books")).len(), 1);
    }

    #[test]
    fn test_create_existing_table_fails() {
        let mut catalog = books();

        let result = execute(&mut catalog, "CREATE TABLE books (id INTEGER)");
        assert_eq!(
            result.message.as_deref(),
            Some("ERROR: Relation \"books\" already exists")
        );
    }

    #[test]
    fn test_drop_table() {
        let mut catalog = books();

        assert!(execute(&mut catalog, "DROP TABLE books").success);
        assert!(!execute(&mut catalog, "SELECT * FROM books").success);

        let again = execute(&mut catalog, "DROP TABLE books");
        assert_eq!(
            again.message.as_deref(),
            Some("ERROR: Relation \"books\" does not exist")
        );
    }

    #[test]
    fn test_last_primary_key_wins() {
        let mut catalog = Catalog::new("test");
        execute(
            &mut catalog,
            "CREATE TABLE t (a INTEGER PRIMARY KEY, b INTEGER PRIMARY KEY)",
        );

        let table = catalog.get_table("t").unwrap();
        assert_eq!(table.schema.primary_key.as_deref(), Some("b"));

        // `a` is no longer unique, `b` is
        assert!(execute(&mut catalog, "INSERT INTO t VALUES (1, 1), (1, 2)").success);
        assert!(!execute(&mut catalog, "INSERT INTO t VALUES (3, 2)").success);
    }

    #[test]
    fn test_schema_errors_surface_verbatim() {
        let mut catalog = books();
        execute(&mut catalog, "INSERT INTO books VALUES (1, 'Dune')");

        let unknown = execute(&mut catalog, "SELECT author FROM books");
        assert_eq!(
            unknown.message.as_deref(),
            Some("ERROR: column \"author\" of relation \"books\" does not exist")
        );

        let arity = execute(&mut catalog, "INSERT INTO books VALUES (2)");
        assert!(!arity.success);
        assert!(arity.message.unwrap().contains("1 values but 2 columns"));

        let duplicate = execute(&mut catalog, "CREATE TABLE t (a INTEGER, a TEXT)");
        assert!(!duplicate.success);
        assert!(catalog.get_table("t").is_err());
    }

    #[test]
    fn test_where_operators_end_to_end() {
        let mut catalog = books();
        execute(
            &mut catalog,
            "INSERT INTO books VALUES (1, 'Dune'), (2, 'Emma'), (3, 'Ulysses')",
        );

        let count = |catalog: &mut Catalog, sql: &str| rows(execute(catalog, sql)).len();
        assert_eq!(count(&mut catalog, "SELECT id FROM books WHERE id != 2"), 2);
        assert_eq!(count(&mut catalog, "SELECT id FROM books WHERE id <= 2"), 2);
        assert_eq!(count(&mut catalog, "SELECT id FROM books WHERE id > 1"), 2);
        assert_eq!(count(&mut catalog, "SELECT id FROM books WHERE title >= 'Emma'"), 2);
        assert_eq!(count(&mut catalog, "SELECT id FROM books WHERE title < 'Emma'"), 1);
    }

    #[test]
    fn test_boolean_ordering_is_rejected() {
        let mut catalog = Catalog::new("test");
        execute(&mut catalog, "CREATE TABLE flags (id INTEGER, on_ BOOLEAN)");
        execute(&mut catalog, "INSERT INTO flags VALUES (1, TRUE), (2, FALSE)");

        assert_eq!(
            rows(execute(&mut catalog, "SELECT id FROM flags WHERE on_ = FALSE")).len(),
            1
        );
        let ordered = execute(&mut catalog, "SELECT id FROM flags WHERE on_ > FALSE");
        assert!(!ordered.success);
        assert!(ordered.message.unwrap().contains("not supported"));
    }

    #[test]
    fn test_mismatched_literal_fails_instead_of_matching_nothing() {
        let mut catalog = books();
        execute(&mut catalog, "INSERT INTO books VALUES (1, 'Dune')");

        for sql in [
            "SELECT * FROM books WHERE title = 1",
            "SELECT * FROM books WHERE title != 1",
            "DELETE FROM books WHERE title != 1",
        ] {
            let result = execute(&mut catalog, sql);
            assert!(!result.success, "{sql}");
            assert_eq!(
                result.message.as_deref(),
                Some("ERROR: cannot compare column \"title\" of type TEXT with INTEGER value 1")
            );
        }
        assert_eq!(rows(execute(&mut catalog, "SELECT * FROM books")).len(), 1);
    }

    #[test]
    fn test_join_is_parsed_but_not_executed() {
        let mut catalog = books();
        execute(&mut catalog, "INSERT INTO books VALUES (1, 'Dune')");

        let rows = rows(execute(
            &mut catalog,
            "SELECT * FROM books INNER JOIN authors ON books.id = authors.book_id",
        ));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].columns().collect::<Vec<_>>(), vec!["id", "title"]);
    }

    #[test]
    fn test_repeated_projection_column_keeps_one_key() {
        let mut catalog = books();
        execute(&mut catalog, "INSERT INTO books VALUES (1, 'Dune')");

        let result = execute(&mut catalog, "SELECT id, title, id FROM books");
        assert_eq!(
            serde_json::to_string(&result).unwrap(),
            r#"{"success":true,"rows":[{"id":1,"title":"Dune"}],"message":"RESULT OK"}"#
        );
    }

    #[test]
    fn test_result_json_shape() {
        let mut catalog = books();
        execute(&mut catalog, "INSERT INTO books VALUES (1, 'Dune')");

        let select = serde_json::to_value(execute(&mut catalog, "SELECT * FROM books")).unwrap();
        assert_eq!(
            select,
            serde_json::json!({
                "success": true,
                "rows": [{"id": 1, "title": "Dune"}],
                "message": "RESULT OK"
            })
        );

        let delete = serde_json::to_value(execute(&mut catalog, "DELETE FROM books")).unwrap();
        assert_eq!(
            delete,
            serde_json::json!({
                "success": true,
                "rowsAffected": 1,
                "message": "RESULT OK: 1 rows deleted"
            })
        );
    }
}
