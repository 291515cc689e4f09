use plinth_core::{Error, Prepared, Result, Value, truncate_long};
use std::fmt::{self, Display};
use tokio_postgres::Statement;

pub struct PostgresPrepared {
    pub(crate) sql: String,
    pub(crate) statement: Statement,
    pub(crate) params: Vec<Value>,
    pub(crate) index: u64,
}

impl PostgresPrepared {
    pub(crate) fn new(sql: String, statement: Statement) -> Self {
        let params = vec![Value::Null; statement.params().len()];
        Self {
            sql,
            statement,
            params,
            index: 0,
        }
    }
}

impl Prepared for PostgresPrepared {
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

impl Display for PostgresPrepared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", truncate_long!(self.sql))
    }
}
