use crate::{
    Driver, Query, QueryResult, Result, RowLabeled, RowsAffected, Value,
    stream::{Stream, StreamExt, TryStreamExt},
};
use std::future::Future;

pub trait Executor: Send + Sized {
    type Driver: Driver;

    fn driver(&self) -> &Self::Driver;

    /// Prepare a single statement using `?` positional placeholders.
    fn prepare(
        &mut self,
        sql: String,
    ) -> impl Future<Output = Result<Query<Self::Driver>>> + Send;

    /// General method to send any query and return any result type (either row or count)
    fn run(
        &mut self,
        query: Query<Self::Driver>,
    ) -> impl Stream<Item = Result<QueryResult>> + Send;

    /// Key generated by the most recent insert on this session.
    fn last_insert_id(&mut self) -> impl Future<Output = Result<Value>> + Send;

    /// Execute the query and returns the rows.
    fn fetch(
        &mut self,
        query: Query<Self::Driver>,
    ) -> impl Stream<Item = Result<RowLabeled>> + Send {
        self.run(query).filter_map(|v| async move {
            match v {
                Ok(QueryResult::Row(v)) => Some(Ok(v)),
                Err(e) => Some(Err(e)),
                _ => None,
            }
        })
    }

    /// Execute the query and return the total number of rows affected.
    fn execute(
        &mut self,
        query: Query<Self::Driver>,
    ) -> impl Future<Output = Result<RowsAffected>> + Send {
        self.run(query)
            .filter_map(|v| async move {
                match v {
                    Ok(QueryResult::Affected(v)) => Some(Ok(v)),
                    Err(e) => Some(Err(e)),
                    _ => None,
                }
            })
            .try_collect()
    }
}
