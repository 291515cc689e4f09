use crate::driver_error;
use plinth_core::{Result, Value};
use rusqlite::{
    Row,
    types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef},
};
use rust_decimal::prelude::ToPrimitive;
use time::{format_description::well_known::Rfc3339, macros::format_description};

pub(crate) fn extract_value(row: &Row<'_>, index: usize) -> Result<Value> {
    Ok(match row.get_ref(index).map_err(driver_error)? {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Int64(v),
        ValueRef::Real(v) => Value::Float64(v),
        ValueRef::Text(v) => Value::Varchar(String::from_utf8_lossy(v).into_owned()),
        ValueRef::Blob(v) => Value::Blob(v.into()),
    })
}

/// Parameter adapter, temporal values are stored as ISO 8601 text.
pub(crate) struct ValueWrap<'a>(pub(crate) &'a Value);

fn conversion_failure(error: time::error::Format) -> rusqlite::Error {
    rusqlite::Error::ToSqlConversionFailure(Box::new(error))
}

impl ToSql for ValueWrap<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let value = match self.0 {
            Value::Null => SqlValue::Null,
            Value::Boolean(v) => SqlValue::Integer(*v as i64),
            Value::Int64(v) => SqlValue::Integer(*v),
            Value::Float64(v) => SqlValue::Real(*v),
            Value::Decimal(v) => match v.to_f64() {
                Some(v) => SqlValue::Real(v),
                None => SqlValue::Text(v.to_string()),
            },
            Value::Varchar(v) => return Ok(ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes()))),
            Value::Blob(v) => return Ok(ToSqlOutput::Borrowed(ValueRef::Blob(&v[..]))),
            Value::Date(v) => SqlValue::Text(
                v.format(format_description!("[year]-[month]-[day]"))
                    .map_err(conversion_failure)?,
            ),
            Value::Time(v) => SqlValue::Text(
                v.format(format_description!("[hour]:[minute]:[second].[subsecond]"))
                    .map_err(conversion_failure)?,
            ),
            Value::Timestamp(v) => SqlValue::Text(
                v.format(format_description!(
                    "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"
                ))
                .map_err(conversion_failure)?,
            ),
            Value::TimestampWithTimezone(v) => {
                SqlValue::Text(v.format(&Rfc3339).map_err(conversion_failure)?)
            }
            Value::Uuid(v) => SqlValue::Text(v.to_string()),
        };
        Ok(ToSqlOutput::Owned(value))
    }
}
