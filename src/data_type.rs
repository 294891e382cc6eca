use std::fmt;

/// Represents the supported data types in the database schema.
/// These types define the structure of columns and the expected format of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// A 64-bit signed integer, declared as `INTEGER`.
    Int,
    /// A variable-length UTF-8 character string, declared as `TEXT`.
    Text,
    /// A boolean value (true or false), declared as `BOOLEAN`.
    Bool,
}

impl DataType {
    /// Maps an (uppercased) type keyword to its [DataType].
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "INTEGER" => Some(Self::Int),
            "TEXT" => Some(Self::Text),
            "BOOLEAN" => Some(Self::Bool),
            _ => None,
        }
    }

    /// Only integers and text have a total order usable by `<`, `>`, `<=`, `>=`.
    pub fn is_ordered(&self) -> bool {
        matches!(self, Self::Int | Self::Text)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match self {
            Self::Int => "INTEGER",
            Self::Text => "TEXT",
            Self::Bool => "BOOLEAN",
        };
        f.write_str(keyword)
    }
}
