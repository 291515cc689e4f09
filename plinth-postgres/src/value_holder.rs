use bytes::{BufMut, BytesMut};
use plinth_core::Value;
use postgres_types::{FromSql, IsNull, Kind, ToSql, Type, to_sql_checked};
use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use std::{error::Error, str};
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset,
    format_description::{BorrowedFormatItem, well_known::Rfc3339},
    macros::format_description,
};
use uuid::Uuid;

type BoxError = Box<dyn Error + Sync + Send>;

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const TIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[hour]:[minute]:[second][optional [.[subsecond]]]");
const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]]"
);

/// Bridge between [`Value`] and the Postgres binary protocol.
///
/// Parameters are converted to the type Postgres inferred for them, so an integer bound to a
/// `boolean` parameter or a string bound to a `date` one are both accepted.
#[derive(Debug)]
pub(crate) struct ValueHolder(pub(crate) Value);

impl From<Value> for ValueHolder {
    fn from(value: Value) -> Self {
        ValueHolder(value)
    }
}

fn mismatch(value: &Value, ty: &Type) -> BoxError {
    format!("Cannot bind `{:?}` to a parameter of type `{}`", value, ty).into()
}

fn is_text(ty: &Type) -> bool {
    matches!(
        *ty,
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN
    ) || matches!(ty.kind(), Kind::Enum(..))
}

fn int_to_sql(v: i64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::BOOL => (v != 0).to_sql(ty, out),
        Type::CHAR => i8::try_from(v)?.to_sql(ty, out),
        Type::INT2 => i16::try_from(v)?.to_sql(ty, out),
        Type::INT4 => i32::try_from(v)?.to_sql(ty, out),
        Type::INT8 => v.to_sql(ty, out),
        Type::OID => u32::try_from(v)?.to_sql(ty, out),
        Type::FLOAT4 => (v as f32).to_sql(ty, out),
        Type::FLOAT8 => (v as f64).to_sql(ty, out),
        Type::NUMERIC => Decimal::from(v).to_sql(ty, out),
        _ if is_text(ty) => v.to_string().to_sql(ty, out),
        _ => Err(mismatch(&Value::Int64(v), ty)),
    }
}

fn float_to_sql(v: f64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::FLOAT4 => (v as f32).to_sql(ty, out),
        Type::FLOAT8 => v.to_sql(ty, out),
        Type::NUMERIC => Decimal::from_f64(v)
            .ok_or_else(|| mismatch(&Value::Float64(v), ty))?
            .to_sql(ty, out),
        Type::CHAR | Type::INT2 | Type::INT4 | Type::INT8 | Type::OID if v.fract() == 0.0 => {
            int_to_sql(v as i64, ty, out)
        }
        _ if is_text(ty) => v.to_string().to_sql(ty, out),
        _ => Err(mismatch(&Value::Float64(v), ty)),
    }
}

fn decimal_to_sql(v: Decimal, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::NUMERIC => v.to_sql(ty, out),
        Type::FLOAT4 | Type::FLOAT8 => float_to_sql(
            v.to_f64().ok_or_else(|| mismatch(&Value::Decimal(v), ty))?,
            ty,
            out,
        ),
        Type::CHAR | Type::INT2 | Type::INT4 | Type::INT8 | Type::OID if v.fract().is_zero() => {
            int_to_sql(
                v.to_i64().ok_or_else(|| mismatch(&Value::Decimal(v), ty))?,
                ty,
                out,
            )
        }
        _ if is_text(ty) => v.to_string().to_sql(ty, out),
        _ => Err(mismatch(&Value::Decimal(v), ty)),
    }
}

fn text_to_sql(v: &str, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    let trimmed = v.trim();
    match *ty {
        _ if is_text(ty) => v.to_sql(ty, out),
        Type::JSON | Type::XML => {
            out.put_slice(v.as_bytes());
            Ok(IsNull::No)
        }
        Type::JSONB => {
            out.put_u8(1);
            out.put_slice(v.as_bytes());
            Ok(IsNull::No)
        }
        Type::BOOL => Value::Varchar(v.into())
            .as_bool()
            .ok_or_else(|| mismatch(&Value::Varchar(v.into()), ty))?
            .to_sql(ty, out),
        Type::CHAR | Type::INT2 | Type::INT4 | Type::INT8 | Type::OID => {
            int_to_sql(trimmed.parse()?, ty, out)
        }
        Type::FLOAT4 | Type::FLOAT8 => float_to_sql(trimmed.parse()?, ty, out),
        Type::NUMERIC => trimmed.parse::<Decimal>()?.to_sql(ty, out),
        Type::BYTEA => v.as_bytes().to_sql(ty, out),
        Type::DATE => Date::parse(trimmed, DATE_FORMAT)?.to_sql(ty, out),
        Type::TIME => Time::parse(trimmed, TIME_FORMAT)?.to_sql(ty, out),
        Type::TIMESTAMP => PrimitiveDateTime::parse(trimmed, TIMESTAMP_FORMAT)?.to_sql(ty, out),
        Type::TIMESTAMPTZ => OffsetDateTime::parse(trimmed, &Rfc3339)?.to_sql(ty, out),
        Type::UUID => Uuid::parse_str(trimmed)?.to_sql(ty, out),
        _ => Err(mismatch(&Value::Varchar(v.into()), ty)),
    }
}

impl ToSql for ValueHolder {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError>
    where
        Self: Sized,
    {
        if let Kind::Domain(inner) = ty.kind() {
            return self.to_sql(inner, out);
        }
        match &self.0 {
            Value::Null => Ok(IsNull::Yes),
            Value::Boolean(v) => match *ty {
                Type::BOOL => v.to_sql(ty, out),
                _ => int_to_sql(*v as i64, ty, out),
            },
            Value::Int64(v) => int_to_sql(*v, ty, out),
            Value::Float64(v) => float_to_sql(*v, ty, out),
            Value::Decimal(v) => decimal_to_sql(*v, ty, out),
            Value::Varchar(v) => text_to_sql(v, ty, out),
            Value::Blob(v) => match *ty {
                Type::BYTEA => (&**v).to_sql(ty, out),
                _ => Err(mismatch(&self.0, ty)),
            },
            Value::Date(v) => match *ty {
                Type::DATE => v.to_sql(ty, out),
                Type::TIMESTAMP => PrimitiveDateTime::new(*v, Time::MIDNIGHT).to_sql(ty, out),
                _ if is_text(ty) => v.format(DATE_FORMAT)?.to_sql(ty, out),
                _ => Err(mismatch(&self.0, ty)),
            },
            Value::Time(v) => match *ty {
                Type::TIME => v.to_sql(ty, out),
                _ if is_text(ty) => v.format(TIME_FORMAT)?.to_sql(ty, out),
                _ => Err(mismatch(&self.0, ty)),
            },
            Value::Timestamp(v) => match *ty {
                Type::TIMESTAMP => v.to_sql(ty, out),
                Type::TIMESTAMPTZ => v.assume_utc().to_sql(ty, out),
                Type::DATE => v.date().to_sql(ty, out),
                _ if is_text(ty) => v.format(TIMESTAMP_FORMAT)?.to_sql(ty, out),
                _ => Err(mismatch(&self.0, ty)),
            },
            Value::TimestampWithTimezone(v) => match *ty {
                Type::TIMESTAMPTZ => v.to_sql(ty, out),
                Type::TIMESTAMP => {
                    let v = v.to_offset(UtcOffset::UTC);
                    PrimitiveDateTime::new(v.date(), v.time()).to_sql(ty, out)
                }
                _ if is_text(ty) => v.format(&Rfc3339)?.to_sql(ty, out),
                _ => Err(mismatch(&self.0, ty)),
            },
            Value::Uuid(v) => match *ty {
                Type::UUID => v.to_sql(ty, out),
                _ if is_text(ty) => v.to_string().to_sql(ty, out),
                _ => Err(mismatch(&self.0, ty)),
            },
        }
    }

    fn accepts(_ty: &Type) -> bool
    where
        Self: Sized,
    {
        true
    }

    to_sql_checked!();
}

impl<'a> FromSql<'a> for ValueHolder {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        let value = match *ty {
            Type::BOOL => Value::Boolean(bool::from_sql(ty, raw)?),
            Type::CHAR => Value::Int64(i8::from_sql(ty, raw)? as i64),
            Type::INT2 => Value::Int64(i16::from_sql(ty, raw)? as i64),
            Type::INT4 => Value::Int64(i32::from_sql(ty, raw)? as i64),
            Type::INT8 => Value::Int64(i64::from_sql(ty, raw)?),
            Type::OID => Value::Int64(u32::from_sql(ty, raw)? as i64),
            Type::FLOAT4 => Value::Float64(f32::from_sql(ty, raw)? as f64),
            Type::FLOAT8 => Value::Float64(f64::from_sql(ty, raw)?),
            Type::NUMERIC => Value::Decimal(Decimal::from_sql(ty, raw)?),
            Type::TEXT
            | Type::VARCHAR
            | Type::BPCHAR
            | Type::NAME
            | Type::UNKNOWN
            | Type::JSON
            | Type::XML => Value::Varchar(String::from_sql(ty, raw)?),
            Type::JSONB => Value::Varchar(str::from_utf8(raw.get(1..).unwrap_or_default())?.into()),
            Type::BYTEA => Value::Blob(raw.into()),
            Type::DATE => Value::Date(Date::from_sql(ty, raw)?),
            Type::TIME => Value::Time(Time::from_sql(ty, raw)?),
            Type::TIMESTAMP => Value::Timestamp(PrimitiveDateTime::from_sql(ty, raw)?),
            Type::TIMESTAMPTZ => Value::TimestampWithTimezone(OffsetDateTime::from_sql(ty, raw)?),
            Type::UUID => Value::Uuid(Uuid::from_sql(ty, raw)?),
            _ => match ty.kind() {
                Kind::Domain(inner) => return Self::from_sql(inner, raw),
                Kind::Enum(..) => Value::Varchar(str::from_utf8(raw)?.into()),
                _ => return Err(format!("Cannot decode the sql type `{}`", ty).into()),
            },
        };
        Ok(ValueHolder(value))
    }

    fn from_sql_null(_ty: &Type) -> Result<Self, BoxError> {
        Ok(ValueHolder(Value::Null))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: Value, ty: &Type) -> BytesMut {
        let mut out = BytesMut::new();
        let is_null = ValueHolder(value)
            .to_sql(ty, &mut out)
            .expect("The value should be encoded");
        assert!(matches!(is_null, IsNull::No));
        out
    }

    #[test]
    fn integers_follow_the_parameter_width() {
        assert_eq!(encode(Value::Int64(7), &Type::INT4).len(), 4);
        assert_eq!(encode(Value::Int64(7), &Type::INT2).len(), 2);
        assert_eq!(encode(Value::Int64(7), &Type::INT8).len(), 8);
        let mut out = BytesMut::new();
        assert!(
            ValueHolder(Value::Int64(1 << 40))
                .to_sql(&Type::INT4, &mut out)
                .is_err()
        );
    }

    #[test]
    fn integers_bind_to_booleans() {
        assert_eq!(&encode(Value::Int64(1), &Type::BOOL)[..], &[1]);
        assert_eq!(&encode(Value::Int64(0), &Type::BOOL)[..], &[0]);
    }

    #[test]
    fn text_is_parsed_for_typed_parameters() {
        assert_eq!(encode(Value::Varchar(" 42 ".into()), &Type::INT4).len(), 4);
        assert_eq!(
            encode(Value::Varchar("2024-02-29".into()), &Type::DATE).len(),
            4
        );
        assert_eq!(&encode(Value::Varchar("{}".into()), &Type::JSONB)[..], b"\x01{}");
    }

    #[test]
    fn decode_round_trip() {
        let raw = encode(Value::Int64(-12), &Type::INT2);
        let decoded = ValueHolder::from_sql(&Type::INT2, &raw).expect("Should decode");
        assert_eq!(decoded.0, Value::Int64(-12));
        let decoded = ValueHolder::from_sql_null(&Type::TEXT).expect("Should decode");
        assert_eq!(decoded.0, Value::Null);
    }
}
