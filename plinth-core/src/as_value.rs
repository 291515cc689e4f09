use crate::{Error, Result, Value};
use rust_decimal::{Decimal, prelude::FromPrimitive};
use std::{any, borrow::Cow};
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Conversion between native Rust types and the dynamically typed [`Value`].
///
/// `as_value` is lossless, `try_from_value` accepts the canonical variant plus the
/// reasonable alternatives a driver may hand back (integers stored as text, integer
/// booleans and so on) and fails with a descriptive error otherwise.
///
/// ```rust
/// use plinth_core::{AsValue, Value};
/// let v = 42i32.as_value();
/// assert_eq!(v, Value::Int64(42));
/// let n: i32 = AsValue::try_from_value(v).unwrap();
/// assert_eq!(n, 42);
/// ```
pub trait AsValue {
    fn as_value(self) -> Value;
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Varchar(value.into())
    }
}

impl From<Cow<'_, str>> for Value {
    fn from(value: Cow<'_, str>) -> Self {
        Value::Varchar(value.into_owned())
    }
}

fn mismatch<T>(value: &Value) -> Error {
    Error::msg(format!(
        "Cannot convert `{:?}` into {}",
        value,
        any::type_name::<T>()
    ))
}

macro_rules! impl_as_value_integer {
    ($($source:ty),+ $(,)?) => {
        $(
            impl AsValue for $source {
                fn as_value(self) -> Value {
                    Value::Int64(self as i64)
                }
                fn try_from_value(value: Value) -> Result<Self> {
                    let Some(v) = value.as_i64() else {
                        return Err(mismatch::<Self>(&value));
                    };
                    <$source>::try_from(v).map_err(|e| Error::new(e).context(mismatch::<Self>(&value)))
                }
            }
        )+
    };
}
impl_as_value_integer!(i8, i16, i32, i64, u8, u16, u32);

impl AsValue for u64 {
    fn as_value(self) -> Value {
        match i64::try_from(self) {
            Ok(v) => Value::Int64(v),
            Err(..) => Value::Decimal(Decimal::from(self)),
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match &value {
            Value::Decimal(v) => v.to_string().parse().map_err(Error::new),
            _ => value
                .as_i64()
                .and_then(|v| u64::try_from(v).ok())
                .ok_or_else(|| mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for bool {
    fn as_value(self) -> Value {
        Value::Boolean(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        value.as_bool().ok_or_else(|| mismatch::<Self>(&value))
    }
}

impl AsValue for f64 {
    fn as_value(self) -> Value {
        Value::Float64(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        value.as_f64().ok_or_else(|| mismatch::<Self>(&value))
    }
}

impl AsValue for f32 {
    fn as_value(self) -> Value {
        Value::Float64(self as f64)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        f64::try_from_value(value).map(|v| v as f32)
    }
}

impl AsValue for Decimal {
    fn as_value(self) -> Value {
        Value::Decimal(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match &value {
            Value::Decimal(v) => Ok(*v),
            Value::Int64(v) => Ok(Decimal::from(*v)),
            Value::Float64(v) => Decimal::from_f64(*v).ok_or_else(|| mismatch::<Self>(&value)),
            Value::Varchar(v) => v.trim().parse().map_err(Error::new),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for String {
    fn as_value(self) -> Value {
        Value::Varchar(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Varchar(v) => Ok(v),
            Value::Null | Value::Blob(..) => Err(mismatch::<Self>(&value)),
            v => Ok(v.to_string()),
        }
    }
}

impl AsValue for Box<[u8]> {
    fn as_value(self) -> Value {
        Value::Blob(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Blob(v) => Ok(v),
            Value::Varchar(v) => Ok(v.into_bytes().into()),
            v => Err(mismatch::<Self>(&v)),
        }
    }
}

impl AsValue for Vec<u8> {
    fn as_value(self) -> Value {
        Value::Blob(self.into())
    }
    fn try_from_value(value: Value) -> Result<Self> {
        Box::<[u8]>::try_from_value(value).map(Into::into)
    }
}

macro_rules! impl_as_value_passthrough {
    ($($source:ty => $variant:path),+ $(,)?) => {
        $(
            impl AsValue for $source {
                fn as_value(self) -> Value {
                    $variant(self)
                }
                fn try_from_value(value: Value) -> Result<Self> {
                    match value {
                        $variant(v) => Ok(v),
                        v => Err(mismatch::<Self>(&v)),
                    }
                }
            }
        )+
    };
}
impl_as_value_passthrough!(
    Date => Value::Date,
    Time => Value::Time,
    PrimitiveDateTime => Value::Timestamp,
    OffsetDateTime => Value::TimestampWithTimezone,
);

impl AsValue for Uuid {
    fn as_value(self) -> Value {
        Value::Uuid(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match &value {
            Value::Uuid(v) => Ok(*v),
            Value::Varchar(v) => Uuid::parse_str(v.trim()).map_err(Error::new),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => Value::Null,
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            v => T::try_from_value(v).map(Some),
        }
    }
}
