use crate::{
    PostgresConnection, PostgresDriver, PostgresPrepared, ValueHolder,
    connection::{normalize_sql, prepare_error, run_error},
    util::{driver_error, stream_rows, stream_simple},
};
use plinth_core::{
    Executor, Query, QueryResult, Result, Transaction, Value,
    future::{Either, TryFutureExt},
    stream::{Stream, TryStreamExt},
};
use std::sync::Arc;

pub struct PostgresTransaction<'c>(pub(crate) tokio_postgres::Transaction<'c>);

impl<'c> PostgresTransaction<'c> {
    pub async fn new(connection: &'c mut PostgresConnection) -> Result<Self> {
        let transaction = connection
            .client
            .transaction()
            .await
            .map_err(driver_error)?;
        Ok(Self(transaction))
    }
}

impl<'c> Executor for PostgresTransaction<'c> {
    type Driver = PostgresDriver;

    fn driver(&self) -> &Self::Driver {
        &PostgresDriver {}
    }

    async fn prepare(&mut self, sql: String) -> Result<Query<Self::Driver>> {
        let sql = normalize_sql(&sql);
        let statement = self
            .0
            .prepare(&sql)
            .await
            .map_err(|e| prepare_error(e, &sql))?;
        Ok(Query::Prepared(PostgresPrepared::new(sql, statement)))
    }

    fn run(
        &mut self,
        query: Query<Self::Driver>,
    ) -> impl Stream<Item = Result<QueryResult>> + Send {
        let context = Arc::new(format!("While running the query:\n{}", query));
        let transaction = &self.0;
        match query {
            Query::Raw(sql) => {
                Either::Left(stream_simple(async move { transaction.simple_query(&sql).await }))
            }
            Query::Prepared(prepared) => Either::Right(stream_rows(async move {
                transaction
                    .query_raw(
                        &prepared.statement,
                        prepared.params.into_iter().map(ValueHolder),
                    )
                    .await
            })),
        }
        .map_err(run_error(context))
    }

    async fn last_insert_id(&mut self) -> Result<Value> {
        let row = self
            .0
            .query_one("SELECT lastval()", &[])
            .await
            .map_err(driver_error)?;
        Ok(row.try_get::<_, ValueHolder>(0)?.0)
    }
}

impl<'c> Transaction<'c> for PostgresTransaction<'c> {
    fn commit(self) -> impl Future<Output = Result<()>> + Send {
        self.0.commit().map_err(driver_error)
    }

    fn rollback(self) -> impl Future<Output = Result<()>> + Send {
        self.0.rollback().map_err(driver_error)
    }
}
