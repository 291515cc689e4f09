use crate::{
    SQLiteDriver, SQLitePrepared, SQLiteTransaction, driver_error,
    extract::{ValueWrap, extract_value},
};
use plinth_core::{
    Connection, Context, Driver, Error, Executor, Query, QueryResult, Result, RowLabeled,
    RowNames, RowValues, RowsAffected, Value, future,
    stream::{self, Stream},
    truncate_long,
};
use rusqlite::{Batch, OpenFlags, Statement, params_from_iter};
use std::borrow::Cow;
use urlencoding::decode;

/// A SQLite database opened from a `sqlite://path` URL.
///
/// `sqlite://:memory:` opens a private in-memory database, a `mode` query parameter
/// (`ro`, `rw`, `rwc`) selects how a file is opened, `rwc` being the default.
pub struct SQLiteConnection {
    pub(crate) connection: rusqlite::Connection,
}

impl SQLiteConnection {
    /// Run one statement to completion, rows are decoded eagerly so that nothing borrowed
    /// from the SQLite statement outlives this call.
    pub(crate) fn run_statement(&self, sql: &str, params: &[Value]) -> Vec<Result<QueryResult>> {
        let mut results = Vec::new();
        if let Err(e) = self.collect_results(sql, params, &mut results) {
            let e = e.context(format!("While running the query:\n{}", truncate_long!(sql)));
            log::error!("{:#}", e);
            results.push(Err(e));
        }
        results
    }

    fn collect_results(
        &self,
        sql: &str,
        params: &[Value],
        out: &mut Vec<Result<QueryResult>>,
    ) -> Result<()> {
        let mut statement = self.connection.prepare_cached(sql).map_err(driver_error)?;
        collect_statement(&mut statement, params, out)
    }

    /// Unprepared SQL, each statement of a script runs in turn and the first failure stops it.
    pub(crate) fn run_script(&self, sql: &str) -> Vec<Result<QueryResult>> {
        let mut results = Vec::new();
        let mut batch = Batch::new(&self.connection, sql);
        let outcome = loop {
            let mut statement = match batch.next() {
                Ok(Some(statement)) => statement,
                Ok(None) => break Ok(()),
                Err(e) => break Err(driver_error(e)),
            };
            if let Err(e) = collect_statement(&mut statement, &[], &mut results) {
                break Err(e);
            }
        };
        if let Err(e) = outcome {
            let e = e.context(format!("While running the script:\n{}", truncate_long!(sql)));
            log::error!("{:#}", e);
            results.push(Err(e));
        }
        results
    }
}

fn collect_statement(
    statement: &mut Statement<'_>,
    params: &[Value],
    out: &mut Vec<Result<QueryResult>>,
) -> Result<()> {
    let params = params_from_iter(params.iter().map(ValueWrap));
    let count = statement.column_count();
    if count == 0 {
        let rows_affected = statement.execute(params).map_err(driver_error)?;
        out.push(Ok(RowsAffected {
            rows_affected: rows_affected as u64,
            last_affected_id: None,
        }
        .into()));
        return Ok(());
    }
    let labels: RowNames = statement
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();
    let mut rows = statement.query(params).map_err(driver_error)?;
    while let Some(row) = rows.next().map_err(driver_error)? {
        let values = (0..count)
            .map(|i| extract_value(row, i))
            .collect::<Result<RowValues>>()?;
        out.push(Ok(RowLabeled::new(labels.clone(), values).into()));
    }
    Ok(())
}

impl Executor for SQLiteConnection {
    type Driver = SQLiteDriver;

    fn driver(&self) -> &SQLiteDriver {
        &SQLiteDriver {}
    }

    fn prepare(
        &mut self,
        sql: String,
    ) -> impl Future<Output = Result<Query<SQLiteDriver>>> + Send {
        let parameter_count = self
            .connection
            .prepare(&sql)
            .map(|statement| statement.parameter_count());
        let result = match parameter_count {
            Ok(count) => Ok(Query::Prepared(SQLitePrepared::new(sql, count))),
            Err(e) => {
                let e = driver_error(e)
                    .context(format!("While preparing the query:\n{}", truncate_long!(sql)));
                log::error!("{:#}", e);
                Err(e)
            }
        };
        future::ready(result)
    }

    fn run(
        &mut self,
        query: Query<SQLiteDriver>,
    ) -> impl Stream<Item = Result<QueryResult>> + Send {
        let results = match query {
            Query::Raw(sql) => self.run_script(&sql),
            Query::Prepared(prepared) => self.run_statement(&prepared.sql, &prepared.params),
        };
        stream::iter(results)
    }

    fn last_insert_id(&mut self) -> impl Future<Output = Result<Value>> + Send {
        future::ready(Ok(Value::Int64(self.connection.last_insert_rowid())))
    }
}

impl Connection for SQLiteConnection {
    #[allow(refining_impl_trait)]
    async fn connect(url: Cow<'static, str>) -> Result<SQLiteConnection> {
        let context = || format!("While opening the SQLite database `{}`", url);
        let prefix = format!("{}://", <Self::Driver as Driver>::NAME);
        let Some(location) = url.strip_prefix(&prefix) else {
            let error = Error::msg(format!(
                "SQLite connection url must start with `{}`",
                &prefix
            ))
            .context(context());
            log::error!("{:#}", error);
            return Err(error);
        };
        let (path, query) = location.split_once('?').unwrap_or((location, ""));
        let path = decode(path).with_context(context)?;
        let mut flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE;
        for (key, value) in query.split('&').filter_map(|v| v.split_once('=')) {
            if key != "mode" {
                continue;
            }
            flags = match value {
                "ro" => OpenFlags::SQLITE_OPEN_READ_ONLY,
                "rw" => OpenFlags::SQLITE_OPEN_READ_WRITE,
                "rwc" => OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
                _ => {
                    let error = Error::msg(format!("Unknown SQLite open mode `{}`", value))
                        .context(context());
                    log::error!("{:#}", error);
                    return Err(error);
                }
            };
        }
        let connection = if path == ":memory:" {
            rusqlite::Connection::open_in_memory()
        } else {
            rusqlite::Connection::open_with_flags(&*path, flags | OpenFlags::SQLITE_OPEN_NO_MUTEX)
        }
        .map_err(|e| {
            let e = driver_error(e).context(context());
            log::error!("{:#}", e);
            e
        })?;
        Ok(Self { connection })
    }

    #[allow(refining_impl_trait)]
    fn begin(&mut self) -> impl Future<Output = Result<SQLiteTransaction<'_>>> + Send {
        SQLiteTransaction::new(self)
    }
}
