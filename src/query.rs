use crate::{Conjunction, Error, FilterFragment};
use indexmap::IndexMap;
use plinth_core::{Result, SqlWriter, Value, separated_by, truncate_long};
use std::fmt::{self, Display};

/// One row keyed by lower-cased column name, in column order.
pub type Row = IndexMap<String, Value>;

/// SQL text with `?` placeholders and the values bound to them, in order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", truncate_long!(self.sql))
    }
}

/// Column of an ORDER BY clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ordered {
    pub column: String,
    pub descending: bool,
}

impl Ordered {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }
}

impl From<&str> for Ordered {
    fn from(value: &str) -> Self {
        Ordered::asc(value)
    }
}

impl From<String> for Ordered {
    fn from(value: String) -> Self {
        Ordered::asc(value)
    }
}

/// Options of a single table SELECT.
///
/// ```rust
/// use plinth::{Conjunction, Ordered, Select};
/// let select = Select::from("customers")
///     .fields(["id", "name"])
///     .conjunction(Conjunction::Or)
///     .order_by([Ordered::desc("id")])
///     .limit(10);
/// assert_eq!(select.table, "customers");
/// ```
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Select {
    pub table: String,
    /// Selected columns, empty means `*`.
    pub fields: Vec<String>,
    pub filter: Vec<FilterFragment>,
    pub conjunction: Conjunction,
    /// `None` orders by the primary key, `Some` with no usable column disables ORDER BY.
    pub order_by: Option<Vec<Ordered>>,
    /// Zero means no limit.
    pub limit: u64,
}

impl Select {
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    pub fn fields<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn filter(mut self, filter: impl IntoIterator<Item = FilterFragment>) -> Self {
        self.filter.extend(filter);
        self
    }

    pub fn conjunction(mut self, conjunction: Conjunction) -> Self {
        self.conjunction = conjunction;
        self
    }

    pub fn order_by<O: Into<Ordered>>(mut self, order_by: impl IntoIterator<Item = O>) -> Self {
        self.order_by = Some(order_by.into_iter().map(Into::into).collect());
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }
}

pub fn build_select(
    writer: &dyn SqlWriter,
    select: &Select,
    default_order: Option<&str>,
) -> Statement {
    let mut sql = String::with_capacity(64 + select.fields.len() * 16 + select.filter.len() * 24);
    sql.push_str("SELECT ");
    if select.fields.is_empty() {
        sql.push('*');
    } else {
        separated_by(
            &mut sql,
            &select.fields,
            |out, v| writer.write_identifier_quoted(out, v),
            ", ",
        );
    }
    sql.push_str("\nFROM ");
    writer.write_identifier_quoted(&mut sql, &select.table);
    if !select.filter.is_empty() {
        sql.push_str("\nWHERE ");
        let separator = format!(" {} ", select.conjunction);
        separated_by(
            &mut sql,
            &select.filter,
            |out, v| out.push_str(&v.sql),
            &separator,
        );
    }
    let order_by: Vec<Ordered> = match &select.order_by {
        Some(order_by) => order_by.clone(),
        None => default_order.map(Ordered::asc).into_iter().collect(),
    };
    let mut order_by = order_by
        .into_iter()
        .filter(|v| !v.column.trim().is_empty())
        .peekable();
    if order_by.peek().is_some() {
        sql.push_str("\nORDER BY ");
        separated_by(
            &mut sql,
            order_by,
            |out, v| {
                writer.write_identifier_quoted(out, &v.column);
                if v.descending {
                    out.push_str(" DESC");
                }
            },
            ", ",
        );
    }
    if select.limit > 0 {
        sql.push_str("\nLIMIT ");
        sql.push_str(&select.limit.to_string());
    }
    Statement {
        sql,
        params: select.filter.iter().map(|v| v.param.clone()).collect(),
    }
}

/// Multi row INSERT, the column list is taken from the first row.
///
/// Later rows bind `NULL` for the columns they lack and their extra keys are ignored.
pub fn build_insert<'a>(
    writer: &dyn SqlWriter,
    table: &str,
    rows: impl IntoIterator<Item = &'a Row>,
) -> Result<Statement> {
    let mut rows = rows.into_iter().peekable();
    let Some(first) = rows.peek() else {
        return Err(Error::EmptyInsert.into());
    };
    if first.is_empty() {
        return Err(Error::InvalidDataset(format!(
            "the first row inserted into `{}` has no columns",
            table
        ))
        .into());
    }
    let columns: Vec<String> = first.keys().cloned().collect();
    let mut sql = String::with_capacity(128 + columns.len() * 32);
    let mut params = Vec::new();
    sql.push_str("INSERT INTO ");
    writer.write_identifier_quoted(&mut sql, table);
    sql.push_str(" (");
    separated_by(
        &mut sql,
        &columns,
        |out, v| writer.write_identifier_quoted(out, v),
        ", ",
    );
    sql.push_str(") VALUES\n");
    let mut separate = false;
    for row in rows {
        if separate {
            sql.push_str(",\n");
        }
        separate = true;
        sql.push('(');
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            writer.write_placeholder(&mut sql);
            params.push(row.get(column).cloned().unwrap_or_default());
        }
        sql.push(')');
    }
    Ok(Statement { sql, params })
}

/// Insert a row made entirely of column defaults.
pub fn build_insert_default(writer: &dyn SqlWriter, table: &str) -> Statement {
    let mut sql = String::with_capacity(32 + table.len());
    sql.push_str("INSERT INTO ");
    writer.write_identifier_quoted(&mut sql, table);
    sql.push_str(" DEFAULT VALUES");
    Statement {
        sql,
        params: Vec::new(),
    }
}

pub fn build_update(
    writer: &dyn SqlWriter,
    table: &str,
    fields: &Row,
    key: &str,
    key_value: Value,
) -> Result<Statement> {
    if fields.is_empty() {
        return Err(Error::InvalidDataset(format!(
            "nothing to update in `{}`",
            table
        ))
        .into());
    }
    let mut sql = String::with_capacity(64 + fields.len() * 24);
    sql.push_str("UPDATE ");
    writer.write_identifier_quoted(&mut sql, table);
    sql.push_str(" SET ");
    separated_by(
        &mut sql,
        fields.keys(),
        |out, v| {
            writer.write_identifier_quoted(out, v);
            out.push_str(" = ");
            writer.write_placeholder(out);
        },
        ", ",
    );
    sql.push_str("\nWHERE ");
    writer.write_identifier_quoted(&mut sql, key);
    sql.push_str(" = ");
    writer.write_placeholder(&mut sql);
    let mut params: Vec<Value> = fields.values().cloned().collect();
    params.push(key_value);
    Ok(Statement { sql, params })
}

pub fn build_delete(writer: &dyn SqlWriter, table: &str, key: &str, key_value: Value) -> Statement {
    let mut sql = String::with_capacity(48 + table.len());
    sql.push_str("DELETE FROM ");
    writer.write_identifier_quoted(&mut sql, table);
    sql.push_str("\nWHERE ");
    writer.write_identifier_quoted(&mut sql, key);
    sql.push_str(" = ");
    writer.write_placeholder(&mut sql);
    Statement {
        sql,
        params: vec![key_value],
    }
}
