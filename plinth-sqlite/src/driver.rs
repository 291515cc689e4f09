use crate::{SQLiteConnection, SQLitePrepared, SQLiteSqlWriter};
use plinth_core::Driver;

#[derive(Debug, Default, Clone, Copy)]
pub struct SQLiteDriver {}

impl SQLiteDriver {
    pub const fn new() -> Self {
        Self {}
    }
}

impl Driver for SQLiteDriver {
    type Connection = SQLiteConnection;
    type SqlWriter = SQLiteSqlWriter;
    type Prepared = SQLitePrepared;

    const NAME: &'static str = "sqlite";

    fn sql_writer(&self) -> SQLiteSqlWriter {
        SQLiteSqlWriter {}
    }
}
