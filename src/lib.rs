//! A minimal schema-aware data-access layer.
//!
//! Databases are reached through named configuration entries ([`Config`], [`Registry`]),
//! their tables are introspected at runtime ([`Database::table_schema`]) and rows are read
//! and written either with the statement builders or as active records ([`Record`]).
mod config;
mod database;
mod error;
mod filter;
mod query;
mod record;
mod registry;
mod schema;
mod status;

pub use config::*;
pub use database::*;
pub use error::Error;
pub use filter::*;
pub use query::*;
pub use record::*;
pub use registry::*;
pub use schema::{ColumnType, Columns, SchemaCache, TableSchema};
pub use status::*;

pub use ::plinth_core::*;
