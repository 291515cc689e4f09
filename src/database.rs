use crate::{
    ColumnType, Columns, Conjunction, Error, FilterFragment, Operator, ResolvedConfig, Row,
    SchemaCache, Select, Statement, TableSchema, build_insert, build_select,
    schema::{Cached, Lookup},
};
use plinth_core::{
    Connection, Context, Driver, Executor, Query, Result, RowLabeled, RowsAffected, SqlWriter,
    Transaction, Value,
    stream::TryStreamExt,
};
use std::sync::Arc;
use tokio::sync::Mutex;

/// A live database handle bound to one configuration alias.
///
/// Owns the transport connection, the driver SQL writer and the schema cache of this
/// database. Statements are serialized on the connection.
pub struct Database<C: Connection> {
    name: String,
    db: String,
    writer: <C::Driver as Driver>::SqlWriter,
    connection: Mutex<C>,
    schema: SchemaCache,
}

impl<C: Connection> Database<C> {
    pub fn new(name: impl Into<String>, db: impl Into<String>, connection: C) -> Self {
        let writer = connection.driver().sql_writer();
        Self {
            name: name.into(),
            db: db.into(),
            writer,
            connection: Mutex::new(connection),
            schema: SchemaCache::new(),
        }
    }

    /// Open the transport described by a resolved configuration.
    pub async fn connect(name: impl Into<String>, config: &ResolvedConfig) -> Result<Self> {
        let name = name.into();
        let url = config.url()?;
        let connection = C::connect(url.into()).await.map_err(|e| {
            let e = e.context(format!(
                "While connecting `{}` using the {} driver",
                name,
                <C::Driver as Driver>::NAME
            ));
            log::error!("{:#}", e);
            e
        })?;
        Ok(Self::new(name, config.db.clone(), connection))
    }

    /// Alias this database was created for.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Logical database name from the configuration.
    pub fn db(&self) -> &str {
        &self.db
    }

    pub fn writer(&self) -> &dyn SqlWriter {
        self.writer.as_dyn()
    }

    pub fn schema_cache(&self) -> &SchemaCache {
        &self.schema
    }

    /// Column names and types of `table`, empty when the table does not exist.
    pub async fn fetch_table_meta(&self, table: &str) -> Arc<Columns> {
        let mut entries = self.schema.entries.lock().await;
        let key = (Lookup::Columns, table.to_string());
        if let Some(Cached::Columns(columns)) = entries.get(&key) {
            return columns.clone();
        }
        let mut sql = String::new();
        self.writer().write_table_columns_query(&mut sql);
        let statement = Statement::new(sql, vec![Value::from(table)]);
        let columns = match self.try_query(&statement).await {
            Ok(rows) => rows
                .into_iter()
                .filter_map(|row| {
                    let name = row.get("column_name")?.as_str()?.to_lowercase();
                    let column_type = row
                        .get("data_type")
                        .map(|v| ColumnType::from_sql_type(&v.to_string()))
                        .unwrap_or(ColumnType::Other);
                    Some((name, column_type))
                })
                .collect(),
            Err(e) => {
                log::warn!("{:#}", e.context(format!("While reading the columns of `{}`", table)));
                Columns::new()
            }
        };
        let columns = Arc::new(columns);
        entries.insert(key, Cached::Columns(columns.clone()));
        columns
    }

    /// Primary key column of `table`, lower-cased.
    pub async fn fetch_table_pk(&self, table: &str) -> Option<String> {
        let mut entries = self.schema.entries.lock().await;
        let key = (Lookup::PrimaryKey, table.to_string());
        if let Some(Cached::PrimaryKey(pk)) = entries.get(&key) {
            return pk.clone();
        }
        let mut sql = String::new();
        self.writer().write_primary_key_query(&mut sql);
        let statement = Statement::new(sql, vec![Value::from(table)]);
        let pk = match self.try_query(&statement).await {
            Ok(rows) => rows.into_iter().find_map(|row| {
                row.get("column_name")
                    .and_then(Value::as_str)
                    .map(str::to_lowercase)
            }),
            Err(e) => {
                log::warn!(
                    "{:#}",
                    e.context(format!("While reading the primary key of `{}`", table))
                );
                None
            }
        };
        entries.insert(key, Cached::PrimaryKey(pk.clone()));
        pk
    }

    /// Whether `table` has at least one column, `force` drops every cached lookup first.
    pub async fn table_exists(&self, table: &str, force: bool) -> bool {
        if force {
            self.clear_schema_cache().await;
        }
        !self.fetch_table_meta(table).await.is_empty()
    }

    pub async fn table_schema(&self, table: &str) -> Result<TableSchema> {
        let columns = self.fetch_table_meta(table).await;
        if columns.is_empty() {
            return Err(Error::TableNotFound(table.into()).into());
        }
        Ok(TableSchema {
            table: table.into(),
            columns,
            primary_key: self.fetch_table_pk(table).await,
        })
    }

    pub async fn clear_schema_cache(&self) {
        self.schema.clear().await;
    }

    /// Rows returned by the statement, or nothing when it fails.
    pub async fn query(&self, statement: &Statement) -> Vec<Row> {
        self.try_query(statement).await.unwrap_or_else(|e| {
            log::warn!("{:#}", e);
            Vec::new()
        })
    }

    pub async fn try_query(&self, statement: &Statement) -> Result<Vec<Row>> {
        log::debug!("{}", statement);
        let mut connection = self.connection.lock().await;
        let query = prepare(&mut *connection, statement).await?;
        connection
            .fetch(query)
            .map_ok(into_row)
            .try_collect::<Vec<_>>()
            .await
            .with_context(|| format!("While fetching the rows of `{}`", statement))
    }

    /// Run a statement that does not return rows.
    pub async fn execute(&self, statement: &Statement) -> Result<RowsAffected> {
        log::debug!("{}", statement);
        let mut connection = self.connection.lock().await;
        execute(&mut *connection, statement).await.map_err(|e| {
            log::error!("{:#}", e);
            Error::sql_execution(&e).into()
        })
    }

    /// Run unparameterized SQL, possibly holding more than one statement.
    pub async fn execute_raw(&self, sql: &str) -> Result<()> {
        log::debug!("{}", sql);
        let mut connection = self.connection.lock().await;
        let query = Query::Raw(sql.into());
        match connection.execute(query).await {
            Ok(..) => Ok(()),
            Err(e) => {
                log::error!("{:#}", e);
                Err(Error::sql_execution(&e).into())
            }
        }
    }

    /// Run an insert in its own transaction and return the key it generated.
    pub async fn run_insert(&self, statement: &Statement) -> Result<Value> {
        log::debug!("{}", statement);
        let mut connection = self.connection.lock().await;
        let mut transaction = connection.begin().await.map_err(|e| {
            log::error!("{:#}", e);
            Error::sql_execution(&e)
        })?;
        let result = async {
            execute(&mut transaction, statement).await?;
            transaction.last_insert_id().await
        }
        .await;
        match result {
            Ok(id) => {
                transaction.commit().await.map_err(|e| {
                    log::error!("{:#}", e);
                    Error::sql_execution(&e)
                })?;
                Ok(id)
            }
            Err(e) => {
                log::error!("{:#}", e);
                if let Err(e) = transaction.rollback().await {
                    log::error!("{:#}", e.context("While rolling back the insert"));
                }
                Err(Error::sql_execution(&e).into())
            }
        }
    }

    /// Insert one row and return its generated key.
    pub async fn insert(&self, table: &str, row: &Row) -> Result<Value> {
        let statement = build_insert(self.writer(), table, [row])?;
        self.run_insert(&statement).await
    }

    pub async fn insert_multi(&self, table: &str, rows: &[Row]) -> Result<RowsAffected> {
        let statement = build_insert(self.writer(), table, rows)?;
        self.execute(&statement).await
    }

    /// Run a SELECT, ordered by the primary key unless the options say otherwise.
    pub async fn select(&self, select: &Select) -> Vec<Row> {
        let pk = match select.order_by {
            Some(..) => None,
            None => self.fetch_table_pk(&select.table).await,
        };
        let statement = build_select(self.writer(), select, pk.as_deref());
        self.query(&statement).await
    }

    /// Rows where `field` compares to any of `values`.
    ///
    /// Null values are skipped, as is the whole filter when `field` is empty. `invert`
    /// swaps the operands of the comparison.
    #[allow(clippy::too_many_arguments)]
    pub async fn fetch_table_data<V: Into<Value>>(
        &self,
        table: &str,
        field: &str,
        values: impl IntoIterator<Item = V>,
        operator: Operator,
        order_by: Option<&str>,
        invert: bool,
        limit: u64,
        fields: &[&str],
    ) -> Vec<Row> {
        let writer = self.writer();
        let filter: Vec<FilterFragment> = if field.trim().is_empty() {
            Vec::new()
        } else {
            values
                .into_iter()
                .map(Into::into)
                .filter(|v| !v.is_null())
                .map(|v| FilterFragment::compare(writer, field, operator, v, invert))
                .collect()
        };
        let mut select = Select::from(table)
            .fields(fields.iter().copied())
            .filter(filter)
            .conjunction(Conjunction::Or)
            .limit(limit);
        if let Some(order_by) = order_by {
            select = select.order_by([order_by]);
        }
        self.select(&select).await
    }
}

fn normalize(value: &Value) -> Value {
    match value {
        Value::Boolean(v) => Value::Int64(*v as i64),
        v => v.clone(),
    }
}

fn into_row(row: RowLabeled) -> Row {
    row.into_pairs()
        .map(|(k, v)| (k.to_lowercase(), v))
        .collect()
}

async fn prepare<E: Executor>(executor: &mut E, statement: &Statement) -> Result<Query<E::Driver>> {
    let mut query = executor
        .prepare(statement.sql.clone())
        .await
        .with_context(|| format!("While preparing `{}`", statement))?;
    for value in &statement.params {
        query.bind_value(normalize(value))?;
    }
    Ok(query)
}

async fn execute<E: Executor>(executor: &mut E, statement: &Statement) -> Result<RowsAffected> {
    let query = prepare(executor, statement).await?;
    executor
        .execute(query)
        .await
        .with_context(|| format!("While executing `{}`", statement))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleans_bind_as_integers() {
        assert_eq!(normalize(&Value::Boolean(true)), Value::Int64(1));
        assert_eq!(normalize(&Value::Boolean(false)), Value::Int64(0));
        assert_eq!(normalize(&Value::Int64(7)), Value::Int64(7));
        assert_eq!(
            normalize(&Value::Varchar("true".into())),
            Value::Varchar("true".into())
        );
        assert_eq!(normalize(&Value::Null), Value::Null);
    }
}
