use crate::{Executor, Result, Transaction};
use std::{borrow::Cow, future::Future};

pub trait Connection: Executor {
    /// Open a connection to the given URL, it must start with the driver scheme.
    fn connect(url: Cow<'static, str>) -> impl Future<Output = Result<Self>> + Send;

    /// Start a transaction, the connection stays borrowed until it ends.
    fn begin(&mut self) -> impl Future<Output = Result<impl Transaction<'_>>> + Send;
}
