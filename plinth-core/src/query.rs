use crate::{AsValue, Driver, Error, Prepared, Result, Value, truncate_long};
use std::{
    fmt::{self, Display},
    sync::Arc,
};

/// A query ready to be executed by an [`Executor`](crate::Executor).
///
/// Represents either raw SQL (`Raw`) or a backend prepared statement
/// (`Prepared`) carrying the bound parameters.
#[derive(Debug)]
pub enum Query<D: Driver> {
    /// Unprepared SQL text, possibly holding more than one statement.
    Raw(String),
    /// Driver prepared handle.
    Prepared(D::Prepared),
}

impl<D: Driver> Query<D> {
    pub fn is_prepared(&self) -> bool {
        matches!(self, Query::Prepared(..))
    }
    /// Remove all the previously bound values
    pub fn clear_bindings(&mut self) -> Result<&mut Self> {
        let Self::Prepared(prepared) = self else {
            return Err(Error::msg("Cannot clear bindings of a raw query"));
        };
        prepared.clear_bindings()?;
        Ok(self)
    }
    /// Append a parameter value.
    pub fn bind(&mut self, value: impl AsValue) -> Result<&mut Self> {
        self.bind_value(value.as_value())
    }
    /// Append an already converted parameter value.
    pub fn bind_value(&mut self, value: Value) -> Result<&mut Self> {
        let Self::Prepared(prepared) = self else {
            return Err(Error::msg("Cannot bind a raw query"));
        };
        prepared.bind_value(value)?;
        Ok(self)
    }
}

impl<D: Driver> From<&str> for Query<D> {
    fn from(value: &str) -> Self {
        Query::Raw(value.into())
    }
}

impl<D: Driver> From<String> for Query<D> {
    fn from(value: String) -> Self {
        Query::Raw(value)
    }
}

impl<D: Driver> Display for Query<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Raw(query) => write!(f, "{}", truncate_long!(query)),
            Query::Prepared(query) => query.fmt(f),
        }
    }
}

/// Metadata about modify operations (INSERT/UPDATE/DELETE).
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowsAffected {
    /// Total number of rows impacted.
    pub rows_affected: u64,
    /// Backend-specific last inserted / affected identifier when available.
    pub last_affected_id: Option<i64>,
}

impl Extend<RowsAffected> for RowsAffected {
    fn extend<T: IntoIterator<Item = RowsAffected>>(&mut self, iter: T) {
        for elem in iter {
            self.rows_affected += elem.rows_affected;
            if elem.last_affected_id.is_some() {
                self.last_affected_id = elem.last_affected_id;
            }
        }
    }
}

/// Shared reference-counted column name list.
pub type RowNames = Arc<[String]>;
/// Owned row value slice matching `RowNames` length.
pub type RowValues = Box<[Value]>;

/// A result row with its corresponding column labels.
#[derive(Debug, Clone)]
pub struct RowLabeled {
    /// Column names, as reported by the backend.
    pub labels: RowNames,
    /// Data values (aligned by index with `labels`).
    pub values: RowValues,
}

impl RowLabeled {
    pub fn new(labels: RowNames, values: RowValues) -> Self {
        Self { labels, values }
    }
    pub fn names(&self) -> &[String] {
        &self.labels
    }
    pub fn values(&self) -> &[Value] {
        &self.values
    }
    pub fn get_column(&self, name: &str) -> Option<&Value> {
        self.labels
            .iter()
            .position(|v| v.eq_ignore_ascii_case(name))
            .map(|i| &self.values[i])
    }
    /// Label/value pairs in column order.
    pub fn into_pairs(self) -> impl Iterator<Item = (String, Value)> {
        let labels = self.labels;
        self.values
            .into_vec()
            .into_iter()
            .enumerate()
            .map(move |(i, v)| (labels[i].clone(), v))
    }
}

/// Heterogeneous items emitted by `Executor::run` combining rows and modify results.
#[derive(Debug)]
pub enum QueryResult {
    /// A labeled row.
    Row(RowLabeled),
    /// A modify effect aggregation.
    Affected(RowsAffected),
}

impl From<RowLabeled> for QueryResult {
    fn from(value: RowLabeled) -> Self {
        QueryResult::Row(value)
    }
}

impl From<RowsAffected> for QueryResult {
    fn from(value: RowsAffected) -> Self {
        QueryResult::Affected(value)
    }
}
