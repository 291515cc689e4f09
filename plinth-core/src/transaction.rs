use crate::{Executor, Result};

/// An open transaction borrowing its connection until it is committed or rolled back.
///
/// Dropping a transaction without calling either rolls it back.
pub trait Transaction<'c>: Executor {
    fn commit(self) -> impl Future<Output = Result<()>> + Send;
    fn rollback(self) -> impl Future<Output = Result<()>> + Send;
}
