use crate::{AsValue, Result, Value};
use std::fmt::Display;

/// A parameterized, backend-prepared query handle.
///
/// `Prepared` enables drivers to pre-parse SQL statements and later bind
/// positional parameters. Values are converted via the `AsValue` trait.
///
/// # Binding Semantics
/// * `bind` appends a value (driver chooses actual placeholder numbering).
/// * `bind_index` sets the parameter at `index` (from 0).
///
/// Methods return `&mut Self` for fluent chaining:
/// ```rust,ignore
/// prepared.bind(42)?.bind("hello")?;
/// ```
pub trait Prepared: Send + Sync + Display {
    /// Remove all the previously bound values.
    fn clear_bindings(&mut self) -> Result<&mut Self>;
    /// Set the parameter at `index` (from 0).
    fn bind_index_value(&mut self, value: Value, index: u64) -> Result<&mut Self>;
    /// Index of the next parameter appended by `bind`.
    fn next_index(&self) -> u64;

    /// Append an already converted parameter value.
    fn bind_value(&mut self, value: Value) -> Result<&mut Self> {
        let index = self.next_index();
        self.bind_index_value(value, index)
    }
    /// Append a parameter value.
    fn bind(&mut self, value: impl AsValue) -> Result<&mut Self>
    where
        Self: Sized,
    {
        self.bind_value(value.as_value())
    }
    /// Bind a value at a specific index.
    fn bind_index(&mut self, value: impl AsValue, index: u64) -> Result<&mut Self>
    where
        Self: Sized,
    {
        self.bind_index_value(value.as_value(), index)
    }
}
