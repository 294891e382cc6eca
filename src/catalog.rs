use std::collections::HashMap;

use tracing::info;

use crate::error::{Error, Result};
use crate::table::{Schema, Table};

/// A named registry of tables.
///
/// A catalog is an ordinary value: create one per independent database and
/// pass it to [crate::executor::execute]. It performs no locking; callers that
/// share one across threads must serialize access themselves.
///
/// # Example
/// ```
/// use minidb::{Catalog, ColumnDef, DataType, Schema};
///
/// let mut catalog = Catalog::new("main");
/// let schema = Schema::new(vec![ColumnDef::new("id", DataType::Int)], None).unwrap();
/// catalog.create_table("users".into(), schema).unwrap();
///
/// assert!(catalog.get_table("users").is_ok());
/// assert!(catalog.drop_table("users").is_ok());
/// assert!(catalog.get_table("users").is_err());
/// ```
#[derive(Debug, Default)]
pub struct Catalog {
    pub name: String,
    /// A map of table names to their respective [Table] structures.
    tables: HashMap<String, Table>,
}

impl Catalog {
    /// Creates a new, empty catalog.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: HashMap::default(),
        }
    }

    /// Registers a new, empty table.
    ///
    /// # Errors
    /// Returns [Error::AlreadyExists] if a table with the same name already exists.
    pub fn create_table(&mut self, name: String, schema: Schema) -> Result<()> {
        if self.tables.contains_key(&name) {
            return Err(Error::AlreadyExists(name));
        }
        info!(catalog = %self.name, table = %name, "creating table");
        let table = Table::new(name.clone(), schema);
        self.tables.insert(name, table);
        Ok(())
    }

    /// Removes a table from the catalog by its name.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if the table does not exist.
    pub fn drop_table(&mut self, name: &str) -> Result<()> {
        match self.tables.remove(name) {
            Some(_) => {
                info!(catalog = %self.name, table = %name, "dropped table");
                Ok(())
            }
            None => Err(Error::NotFound(name.to_string())),
        }
    }

    /// Retrieves a reference to a table by name.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if the table does not exist.
    pub fn get_table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    /// Retrieves a mutable reference to a table by name.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if the table does not exist.
    pub fn get_table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    /// Returns the names of all tables, sorted.
    pub fn table_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
