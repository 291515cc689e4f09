use crate::Error;
use plinth_core::{SqlWriter, Value};
use std::{
    fmt::{self, Display},
    str::FromStr,
};

/// Comparison placed between a field and its parameter.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    #[default]
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Like,
    /// `LIKE` with the value wrapped in `%...%`.
    Containing,
}

impl Operator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "<>",
            Operator::Lt => "<",
            Operator::LtEq => "<=",
            Operator::Gt => ">",
            Operator::GtEq => ">=",
            Operator::Like | Operator::Containing => "LIKE",
        }
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for Operator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "=" | "==" => Operator::Eq,
            "<>" | "!=" => Operator::NotEq,
            "<" => Operator::Lt,
            "<=" => Operator::LtEq,
            ">" => Operator::Gt,
            ">=" => Operator::GtEq,
            "like" => Operator::Like,
            "containing" => Operator::Containing,
            _ => {
                return Err(Error::InvalidDataset(format!(
                    "unsupported filter operator `{}`",
                    s
                )));
            }
        })
    }
}

/// Boolean operator joining the fragments of a WHERE clause.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Conjunction {
    #[default]
    And,
    Or,
}

impl Display for Conjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Conjunction::And => "AND",
            Conjunction::Or => "OR",
        })
    }
}

/// One predicate holding exactly one placeholder, with the value bound to it.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterFragment {
    pub sql: String,
    pub param: Value,
}

impl FilterFragment {
    pub fn new(sql: impl Into<String>, param: impl Into<Value>) -> Self {
        Self {
            sql: sql.into(),
            param: param.into(),
        }
    }

    /// `"field" <op> ?`, or `? <op> "field"` when inverted.
    pub fn compare(
        writer: &dyn SqlWriter,
        field: &str,
        operator: Operator,
        value: impl Into<Value>,
        invert: bool,
    ) -> Self {
        let mut sql = String::with_capacity(field.len() + 8);
        if invert {
            writer.write_placeholder(&mut sql);
            sql.push(' ');
            sql.push_str(operator.as_sql());
            sql.push(' ');
            writer.write_identifier_quoted(&mut sql, field);
        } else {
            writer.write_identifier_quoted(&mut sql, field);
            sql.push(' ');
            sql.push_str(operator.as_sql());
            sql.push(' ');
            writer.write_placeholder(&mut sql);
        }
        let value = value.into();
        let param = if operator == Operator::Containing {
            Value::Varchar(format!("%{}%", value))
        } else {
            value
        };
        Self { sql, param }
    }
}

/// One fragment per (field, value) pair, in input order.
pub fn assemble_filter<K, V>(
    writer: &dyn SqlWriter,
    values: impl IntoIterator<Item = (K, V)>,
    operator: Operator,
) -> Vec<FilterFragment>
where
    K: AsRef<str>,
    V: Into<Value>,
{
    values
        .into_iter()
        .map(|(field, value)| FilterFragment::compare(writer, field.as_ref(), operator, value, false))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use plinth_core::GenericSqlWriter;

    #[test]
    fn parse_operators() {
        assert_eq!("=".parse::<Operator>(), Ok(Operator::Eq));
        assert_eq!("!=".parse::<Operator>(), Ok(Operator::NotEq));
        assert_eq!(" LIKE ".parse::<Operator>(), Ok(Operator::Like));
        assert_eq!("Containing".parse::<Operator>(), Ok(Operator::Containing));
        assert!("; DROP TABLE x".parse::<Operator>().is_err());
    }

    #[test]
    fn inverted_comparison() {
        let fragment =
            FilterFragment::compare(&GenericSqlWriter, "total", Operator::Lt, 10, true);
        assert_eq!(fragment.sql, r#"? < "total""#);
        assert_eq!(fragment.param, Value::Int64(10));
    }
}
