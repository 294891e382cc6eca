pub mod ast;
pub mod catalog;
pub mod column;
pub mod data_type;
pub mod error;
pub mod executor;
pub mod parser;
pub mod predicate;
pub mod render;
pub mod row;
pub mod table;
pub mod tokenizer;
pub mod value;

pub use catalog::Catalog;
pub use column::Column;
pub use data_type::DataType;
pub use error::{Error, Result};
pub use executor::{QueryResult, execute};
pub use row::Row;
pub use table::{ColumnDef, Schema, Table};
pub use value::Value;
