use indexmap::IndexMap;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;

/// Coarse type tag of a column, enough to decide how to sanitize a value for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Integer,
    Numeric,
    Text,
    Other,
}

impl ColumnType {
    /// Classify a type name as reported by the catalog.
    pub fn from_sql_type(name: &str) -> Self {
        let name = name.trim().to_ascii_lowercase();
        match name.as_str() {
            "smallint" | "integer" | "int" | "bigint" | "int2" | "int4" | "int8"
            | "smallserial" | "serial" | "bigserial" => return ColumnType::Integer,
            "numeric" | "decimal" | "real" | "double precision" | "float4" | "float8"
            | "money" => return ColumnType::Numeric,
            "text" | "character varying" | "varchar" | "character" | "char" | "bpchar"
            | "name" | "citext" => return ColumnType::Text,
            "interval" | "point" => return ColumnType::Other,
            _ => {}
        }
        if name.contains("int") {
            ColumnType::Integer
        } else if name.contains("char") || name.contains("clob") || name.contains("text") {
            ColumnType::Text
        } else if ["real", "floa", "doub", "dec", "num"]
            .iter()
            .any(|v| name.contains(v))
        {
            ColumnType::Numeric
        } else {
            ColumnType::Other
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Numeric)
    }
}

/// Lower-cased column name to type, in catalog order.
pub type Columns = IndexMap<String, ColumnType>;

/// Columns and primary key of one table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    pub table: String,
    pub columns: Arc<Columns>,
    pub primary_key: Option<String>,
}

impl TableSchema {
    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.columns.get(name).copied()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Lookup {
    Columns,
    PrimaryKey,
}

#[derive(Debug, Clone)]
pub(crate) enum Cached {
    Columns(Arc<Columns>),
    PrimaryKey(Option<String>),
}

/// Memoized catalog lookups of one database, keyed by (lookup, table).
///
/// The mutex is held while a missing entry is computed, concurrent lookups wait for
/// the first one instead of querying the catalog twice.
#[derive(Debug, Default)]
pub struct SchemaCache {
    pub(crate) entries: Mutex<HashMap<(Lookup, String), Cached>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every table, the next lookups hit the catalog again.
    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_postgres_types() {
        assert_eq!(ColumnType::from_sql_type("integer"), ColumnType::Integer);
        assert_eq!(ColumnType::from_sql_type("bigint"), ColumnType::Integer);
        assert_eq!(ColumnType::from_sql_type("numeric"), ColumnType::Numeric);
        assert_eq!(
            ColumnType::from_sql_type("double precision"),
            ColumnType::Numeric
        );
        assert_eq!(
            ColumnType::from_sql_type("character varying"),
            ColumnType::Text
        );
        assert_eq!(ColumnType::from_sql_type("interval"), ColumnType::Other);
        assert_eq!(ColumnType::from_sql_type("boolean"), ColumnType::Other);
        assert_eq!(
            ColumnType::from_sql_type("timestamp without time zone"),
            ColumnType::Other
        );
    }

    #[test]
    fn classify_sqlite_affinity() {
        assert_eq!(ColumnType::from_sql_type("INTEGER"), ColumnType::Integer);
        assert_eq!(ColumnType::from_sql_type("UNSIGNED BIG INT"), ColumnType::Integer);
        assert_eq!(ColumnType::from_sql_type("VARCHAR(255)"), ColumnType::Text);
        assert_eq!(ColumnType::from_sql_type("DECIMAL(10,5)"), ColumnType::Numeric);
        assert_eq!(ColumnType::from_sql_type("REAL"), ColumnType::Numeric);
        assert_eq!(ColumnType::from_sql_type("BLOB"), ColumnType::Other);
        assert_eq!(ColumnType::from_sql_type(""), ColumnType::Other);
    }
}
