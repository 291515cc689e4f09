use plinth_core::{Error, Prepared, Result, Value, truncate_long};
use std::fmt::{self, Display};

/// A validated statement with its parameters, the SQLite statement itself is taken from the
/// connection cache when the query runs.
#[derive(Debug, Clone)]
pub struct SQLitePrepared {
    pub(crate) sql: String,
    pub(crate) params: Vec<Value>,
    pub(crate) index: u64,
}

impl SQLitePrepared {
    pub(crate) fn new(sql: String, parameter_count: usize) -> Self {
        Self {
            sql,
            params: vec![Value::Null; parameter_count],
            index: 0,
        }
    }
}

impl Prepared for SQLitePrepared {
    fn clear_bindings(&mut self) -> Result<&mut Self> {
        self.params.fill(Value::Null);
        self.index = 0;
        Ok(self)
    }

    fn bind_index_value(&mut self, value: Value, index: u64) -> Result<&mut Self> {
        let len = self.params.len();
        let Some(param) = self.params.get_mut(index as usize) else {
            return Err(Error::msg(format!(
                "Cannot bind the parameter {}, the query takes {}",
                index, len
            )));
        };
        *param = value;
        self.index = index + 1;
        Ok(self)
    }

    fn next_index(&self) -> u64 {
        self.index
    }
}

impl Display for SQLitePrepared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", truncate_long!(self.sql))
    }
}
