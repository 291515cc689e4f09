use rust_decimal::{Decimal, prelude::ToPrimitive};
use std::fmt::{self, Display};
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Dynamically typed value flowing between records, statements and drivers.
///
/// Rows decoded by a driver and parameters bound to a prepared statement both use
/// this representation, the column type is not known statically.
#[derive(Default, Debug, Clone, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Int64(i64),
    Float64(f64),
    Decimal(Decimal),
    Varchar(String),
    Blob(Box<[u8]>),
    Date(Date),
    Time(Time),
    Timestamp(PrimitiveDateTime),
    TimestampWithTimezone(OffsetDateTime),
    Uuid(Uuid),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for the values that do not identify a persisted row: null, empty or blank text,
    /// false and every flavour of zero (including the text `"0"`).
    pub fn is_empty_key(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Boolean(v) => !v,
            Value::Int64(v) => *v == 0,
            Value::Float64(v) => *v == 0.0,
            Value::Decimal(v) => v.is_zero(),
            Value::Varchar(v) => {
                let v = v.trim();
                v.is_empty() || v.parse::<f64>().map(|v| v == 0.0).unwrap_or(false)
            }
            Value::Blob(v) => v.is_empty(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Varchar(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Boolean(v) => Some(*v as i64),
            Value::Int64(v) => Some(*v),
            Value::Decimal(v) if v.fract().is_zero() => v.to_i64(),
            Value::Varchar(v) => v.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int64(v) => Some(*v as f64),
            Value::Float64(v) => Some(*v),
            Value::Decimal(v) => v.to_f64(),
            Value::Varchar(v) => v.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            Value::Int64(v) => Some(*v != 0),
            Value::Varchar(v) => match v.trim().to_ascii_lowercase().as_str() {
                "t" | "true" | "y" | "yes" | "on" | "1" => Some(true),
                "f" | "false" | "n" | "no" | "off" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Boolean(v) => v.fmt(f),
            Value::Int64(v) => v.fmt(f),
            Value::Float64(v) => v.fmt(f),
            Value::Decimal(v) => v.fmt(f),
            Value::Varchar(v) => f.write_str(v),
            Value::Blob(v) => {
                f.write_str("\\x")?;
                v.iter().try_for_each(|b| write!(f, "{:02x}", b))
            }
            Value::Date(v) => v.fmt(f),
            Value::Time(v) => v.fmt(f),
            Value::Timestamp(v) => v.fmt(f),
            Value::TimestampWithTimezone(v) => v.fmt(f),
            Value::Uuid(v) => v.fmt(f),
        }
    }
}
