use crate::{Connection, Prepared, SqlWriter};

pub trait Driver: Send + Sync {
    type Connection: Connection;
    type SqlWriter: SqlWriter + Send + Sync;
    type Prepared: Prepared;

    /// Scheme expected at the start of the connection URL.
    const NAME: &'static str;

    fn sql_writer(&self) -> Self::SqlWriter;
}
