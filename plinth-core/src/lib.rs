//! Driver contract of plinth: the traits a backend implements, the dynamic [`Value`] that
//! travels between them and the engine, and a few shared utilities.
mod as_value;
mod connection;
mod driver;
mod error;
mod executor;
mod prepared;
mod query;
mod sql_writer;
mod transaction;
mod util;
mod value;

pub use ::anyhow::Context;
pub use as_value::*;
pub use connection::*;
pub use driver::*;
pub use error::*;
pub use executor::*;
pub use prepared::*;
pub use query::*;
pub use sql_writer::*;
pub use transaction::*;
pub use util::*;
pub use value::*;
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
