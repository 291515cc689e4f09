mod connection;
mod driver;
mod extract;
mod prepared;
mod sql_writer;
mod transaction;

pub use connection::*;
pub use driver::*;
pub use prepared::*;
pub use sql_writer::*;
pub use transaction::*;

use plinth_core::{DriverError, Error};

pub(crate) fn driver_error(error: rusqlite::Error) -> Error {
    let code = error.sqlite_error().map(|e| e.extended_code.to_string());
    Error::new(DriverError::new(code, error.to_string()))
}
