use crate::{SQLiteConnection, SQLiteDriver, driver_error};
use plinth_core::{
    Driver, Executor, Query, QueryResult, Result, SqlWriter, Transaction, Value, stream::Stream,
};

/// A `BEGIN` block on a SQLite connection, rolled back when dropped before `commit`.
pub struct SQLiteTransaction<'c> {
    connection: &'c mut SQLiteConnection,
    finished: bool,
}

impl<'c> SQLiteTransaction<'c> {
    pub async fn new(connection: &'c mut SQLiteConnection) -> Result<Self> {
        let mut sql = String::new();
        connection
            .driver()
            .sql_writer()
            .write_transaction_begin(&mut sql);
        connection.execute(Query::Raw(sql)).await?;
        Ok(Self {
            connection,
            finished: false,
        })
    }
}

impl<'c> Executor for SQLiteTransaction<'c> {
    type Driver = SQLiteDriver;

    fn driver(&self) -> &SQLiteDriver {
        self.connection.driver()
    }

    fn prepare(
        &mut self,
        sql: String,
    ) -> impl Future<Output = Result<Query<SQLiteDriver>>> + Send {
        self.connection.prepare(sql)
    }

    fn run(
        &mut self,
        query: Query<SQLiteDriver>,
    ) -> impl Stream<Item = Result<QueryResult>> + Send {
        self.connection.run(query)
    }

    fn last_insert_id(&mut self) -> impl Future<Output = Result<Value>> + Send {
        self.connection.last_insert_id()
    }
}

impl<'c> Transaction<'c> for SQLiteTransaction<'c> {
    fn commit(mut self) -> impl Future<Output = Result<()>> + Send {
        let mut sql = String::new();
        self.driver()
            .sql_writer()
            .write_transaction_commit(&mut sql);
        async move {
            self.connection.execute(Query::Raw(sql)).await?;
            self.finished = true;
            Ok(())
        }
    }

    fn rollback(mut self) -> impl Future<Output = Result<()>> + Send {
        let mut sql = String::new();
        self.driver()
            .sql_writer()
            .write_transaction_rollback(&mut sql);
        async move {
            self.finished = true;
            self.connection.execute(Query::Raw(sql)).await?;
            Ok(())
        }
    }
}

impl Drop for SQLiteTransaction<'_> {
    fn drop(&mut self) {
        if self.finished || self.connection.connection.is_autocommit() {
            return;
        }
        let mut sql = String::new();
        self.driver()
            .sql_writer()
            .write_transaction_rollback(&mut sql);
        if let Err(e) = self.connection.connection.execute_batch(&sql) {
            log::error!("{:#}", driver_error(e).context("While rolling back a dropped transaction"));
        }
    }
}
