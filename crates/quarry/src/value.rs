//! Dynamically typed SQL values.
//!
//! [`Value`] is what gets bound to `:name` placeholders and what a generic
//! [`Record`](crate::Record) holds per column. It encodes to whatever parameter
//! type the server inferred for the placeholder and decodes from the common
//! scalar column types. `numeric` maps to [`Decimal`], so aggregates such as
//! `sum(bigint)` and `avg(...)` decode without a cast.

use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use std::error::Error;
use tokio_postgres::types::{FromSql, IsNull, ToSql, Type};
use uuid::Uuid;

/// A single SQL value.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Uuid(Uuid),
}

impl Value {
    /// Short name of the variant, used in conversion error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Decimal(_) => "decimal",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Json(_) => "json",
            Value::Date(_) => "date",
            Value::Timestamp(_) => "timestamp",
            Value::TimestampTz(_) => "timestamptz",
            Value::Uuid(_) => "uuid",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }
}

// ==================== Rust -> Value ====================

macro_rules! impl_from_for_value {
    ($($ty:ty => |$v:ident| $conv:expr),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from($v: $ty) -> Self {
                    $conv
                }
            }
        )*
    };
}

impl_from_for_value! {
    bool => |v| Value::Bool(v),
    i16 => |v| Value::Int(v.into()),
    i32 => |v| Value::Int(v.into()),
    i64 => |v| Value::Int(v),
    u32 => |v| Value::Int(v.into()),
    f32 => |v| Value::Float(v.into()),
    f64 => |v| Value::Float(v),
    Decimal => |v| Value::Decimal(v),
    String => |v| Value::Text(v),
    &str => |v| Value::Text(v.to_string()),
    &String => |v| Value::Text(v.clone()),
    Vec<u8> => |v| Value::Bytes(v),
    &[u8] => |v| Value::Bytes(v.to_vec()),
    serde_json::Value => |v| Value::Json(v),
    NaiveDate => |v| Value::Date(v),
    NaiveDateTime => |v| Value::Timestamp(v),
    DateTime<Utc> => |v| Value::TimestampTz(v),
    Uuid => |v| Value::Uuid(v),
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

// ==================== Value -> Rust ====================

/// Conversion from a [`Value`] into a Rust type.
///
/// Used by [`Record::try_get`](crate::Record::try_get) and the `FromRow`
/// derive. The error is a human-readable message; the caller attaches the
/// column name.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, String>;
}

fn mismatch(expected: &str, got: &Value) -> String {
    format!("expected {expected}, got {}", got.kind())
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, String> {
        Ok(value.clone())
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Bool(v) => Ok(*v),
            other => Err(mismatch("bool", other)),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Int(v) => Ok(*v),
            Value::Decimal(v) if v.fract().is_zero() => v
                .to_i64()
                .ok_or_else(|| format!("{v} is out of range for i64")),
            other => Err(mismatch("int", other)),
        }
    }
}

macro_rules! impl_from_value_narrow_int {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: &Value) -> Result<Self, String> {
                    let wide = i64::from_value(value)?;
                    <$ty>::try_from(wide)
                        .map_err(|_| format!("{wide} is out of range for {}", stringify!($ty)))
                }
            }
        )*
    };
}

impl_from_value_narrow_int!(i16, i32, u32, u64);

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Float(v) => Ok(*v),
            Value::Int(v) => Ok(*v as f64),
            Value::Decimal(v) => v
                .to_f64()
                .ok_or_else(|| format!("{v} is out of range for f64")),
            other => Err(mismatch("float", other)),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Result<Self, String> {
        f64::from_value(value).map(|v| v as f32)
    }
}

impl FromValue for Decimal {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Decimal(v) => Ok(*v),
            Value::Int(v) => Ok(Decimal::from(*v)),
            Value::Float(v) => Decimal::try_from(*v).map_err(|e| e.to_string()),
            other => Err(mismatch("decimal", other)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Text(v) => Ok(v.clone()),
            other => Err(mismatch("text", other)),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Bytes(v) => Ok(v.clone()),
            other => Err(mismatch("bytes", other)),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Json(v) => Ok(v.clone()),
            other => serde_json::to_value(other).map_err(|e| e.to_string()),
        }
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Date(v) => Ok(*v),
            other => Err(mismatch("date", other)),
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Timestamp(v) => Ok(*v),
            other => Err(mismatch("timestamp", other)),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::TimestampTz(v) => Ok(*v),
            other => Err(mismatch("timestamptz", other)),
        }
    }
}

impl FromValue for Uuid {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Uuid(v) => Ok(*v),
            other => Err(mismatch("uuid", other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

// ==================== Postgres wire encoding ====================

/// Encode `v` only if its Rust type is compatible with the inferred parameter type.
fn encode<T: ToSql>(
    v: &T,
    ty: &Type,
    out: &mut BytesMut,
) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
    if !T::accepts(ty) {
        return Err(format!(
            "cannot bind a {} value to a parameter of type {}",
            std::any::type_name::<T>(),
            ty
        )
        .into());
    }
    v.to_sql(ty, out)
}

impl ToSql for Value {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => encode(v, ty, out),
            Value::Int(v) => match *ty {
                Type::INT2 => encode(&i16::try_from(*v)?, ty, out),
                Type::INT4 => encode(&i32::try_from(*v)?, ty, out),
                Type::OID => encode(&u32::try_from(*v)?, ty, out),
                Type::FLOAT4 => encode(&(*v as f32), ty, out),
                Type::FLOAT8 => encode(&(*v as f64), ty, out),
                Type::NUMERIC => encode(&Decimal::from(*v), ty, out),
                _ => encode(v, ty, out),
            },
            Value::Float(v) => match *ty {
                Type::FLOAT4 => encode(&(*v as f32), ty, out),
                Type::NUMERIC => encode(&Decimal::try_from(*v)?, ty, out),
                _ => encode(v, ty, out),
            },
            Value::Decimal(v) => match *ty {
                Type::FLOAT8 => {
                    let v = v.to_f64().ok_or("decimal is out of range for float8")?;
                    encode(&v, ty, out)
                }
                _ => encode(v, ty, out),
            },
            Value::Text(v) => encode(v, ty, out),
            Value::Bytes(v) => encode(v, ty, out),
            Value::Json(v) => encode(v, ty, out),
            Value::Date(v) => encode(v, ty, out),
            Value::Timestamp(v) => encode(v, ty, out),
            Value::TimestampTz(v) => encode(v, ty, out),
            Value::Uuid(v) => encode(v, ty, out),
        }
    }

    // The real compatibility check is per variant, in `to_sql`.
    fn accepts(_ty: &Type) -> bool {
        true
    }

    tokio_postgres::types::to_sql_checked!();
}

impl<'a> FromSql<'a> for Value {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        let value = match *ty {
            Type::BOOL => Value::Bool(bool::from_sql(ty, raw)?),
            Type::INT2 => Value::Int(i16::from_sql(ty, raw)?.into()),
            Type::INT4 => Value::Int(i32::from_sql(ty, raw)?.into()),
            Type::INT8 => Value::Int(i64::from_sql(ty, raw)?),
            Type::OID => Value::Int(u32::from_sql(ty, raw)?.into()),
            Type::FLOAT4 => Value::Float(f32::from_sql(ty, raw)?.into()),
            Type::FLOAT8 => Value::Float(f64::from_sql(ty, raw)?),
            Type::NUMERIC => Value::Decimal(Decimal::from_sql(ty, raw)?),
            Type::BYTEA => Value::Bytes(Vec::<u8>::from_sql(ty, raw)?),
            Type::JSON | Type::JSONB => Value::Json(serde_json::Value::from_sql(ty, raw)?),
            Type::DATE => Value::Date(NaiveDate::from_sql(ty, raw)?),
            Type::TIMESTAMP => Value::Timestamp(NaiveDateTime::from_sql(ty, raw)?),
            Type::TIMESTAMPTZ => Value::TimestampTz(DateTime::<Utc>::from_sql(ty, raw)?),
            Type::UUID => Value::Uuid(Uuid::from_sql(ty, raw)?),
            _ if <String as FromSql>::accepts(ty) => Value::Text(String::from_sql(ty, raw)?),
            _ => return Err(format!("unsupported column type: {ty}").into()),
        };
        Ok(value)
    }

    fn from_sql_null(_ty: &Type) -> Result<Self, Box<dyn Error + Sync + Send>> {
        Ok(Value::Null)
    }

    fn accepts(ty: &Type) -> bool {
        matches!(
            *ty,
            Type::BOOL
                | Type::INT2
                | Type::INT4
                | Type::INT8
                | Type::OID
                | Type::FLOAT4
                | Type::FLOAT8
                | Type::NUMERIC
                | Type::BYTEA
                | Type::JSON
                | Type::JSONB
                | Type::DATE
                | Type::TIMESTAMP
                | Type::TIMESTAMPTZ
                | Type::UUID
        ) || <String as FromSql>::accepts(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_narrows_to_int4_parameter() {
        let mut buf = BytesMut::new();
        let is_null = Value::Int(7).to_sql(&Type::INT4, &mut buf).unwrap();
        assert!(matches!(is_null, IsNull::No));
        assert_eq!(&buf[..], &7_i32.to_be_bytes());
    }

    #[test]
    fn int_out_of_range_for_int2_is_rejected() {
        let mut buf = BytesMut::new();
        assert!(Value::Int(70_000).to_sql(&Type::INT2, &mut buf).is_err());
    }

    #[test]
    fn text_cannot_bind_to_integer_parameter() {
        let mut buf = BytesMut::new();
        match Value::from("abc").to_sql(&Type::INT4, &mut buf) {
            Err(err) => assert!(err.to_string().contains("int4")),
            Ok(_) => panic!("text must not encode as int4"),
        }
    }

    #[test]
    fn null_binds_to_anything() {
        let mut buf = BytesMut::new();
        let is_null = Value::Null.to_sql(&Type::UUID, &mut buf).unwrap();
        assert!(matches!(is_null, IsNull::Yes));
        assert!(buf.is_empty());
    }

    #[test]
    fn decodes_int4_and_text_columns() {
        let raw = 42_i32.to_be_bytes();
        assert_eq!(Value::from_sql(&Type::INT4, &raw).unwrap(), Value::Int(42));
        assert_eq!(
            Value::from_sql(&Type::VARCHAR, b"alice").unwrap(),
            Value::Text("alice".into())
        );
        assert_eq!(Value::from_sql_null(&Type::TEXT).unwrap(), Value::Null);
    }

    #[test]
    fn from_value_conversions() {
        assert_eq!(i32::from_value(&Value::Int(5)).unwrap(), 5);
        assert!(i16::from_value(&Value::Int(i64::MAX)).is_err());
        assert_eq!(f64::from_value(&Value::Int(2)).unwrap(), 2.0);
        assert_eq!(
            Option::<String>::from_value(&Value::Null).unwrap(),
            None::<String>
        );
        assert_eq!(
            String::from_value(&Value::Int(1)).unwrap_err(),
            "expected text, got int"
        );
    }

    #[test]
    fn ints_and_floats_bind_to_numeric_parameters() {
        let mut expected = BytesMut::new();
        Decimal::from(9).to_sql(&Type::NUMERIC, &mut expected).unwrap();
        let mut buf = BytesMut::new();
        Value::Int(9).to_sql(&Type::NUMERIC, &mut buf).unwrap();
        assert_eq!(buf, expected);

        let mut buf = BytesMut::new();
        Value::Float(9.5).to_sql(&Type::NUMERIC, &mut buf).unwrap();
        assert_eq!(Decimal::from_sql(&Type::NUMERIC, &buf).unwrap(), Decimal::new(95, 1));

        let mut buf = BytesMut::new();
        assert!(Value::Float(f64::NAN).to_sql(&Type::NUMERIC, &mut buf).is_err());
    }

    #[test]
    fn numeric_columns_decode_to_decimal() {
        let price = Decimal::new(1250, 2);
        let mut raw = BytesMut::new();
        price.to_sql(&Type::NUMERIC, &mut raw).unwrap();

        let value = Value::from_sql(&Type::NUMERIC, &raw).unwrap();
        assert_eq!(value, Value::Decimal(price));
        assert!(<Value as FromSql>::accepts(&Type::NUMERIC));
        assert_eq!(f64::from_value(&value).unwrap(), 12.5);
        assert!(i64::from_value(&value).is_err());
    }

    #[test]
    fn integral_decimal_reads_as_int() {
        let sum = Value::Decimal(Decimal::from(15));
        assert_eq!(i64::from_value(&sum).unwrap(), 15);
        assert_eq!(u64::from_value(&sum).unwrap(), 15);
        assert_eq!(Decimal::from_value(&Value::Int(3)).unwrap(), Decimal::from(3));
    }

    #[test]
    fn option_into_value() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::Text("x".into()));
    }

    #[test]
    fn serializes_untagged() {
        let json = serde_json::to_string(&vec![
            Value::Null,
            Value::Int(1),
            Value::from("a"),
            Value::Bool(true),
        ])
        .unwrap();
        assert_eq!(json, r#"[null,1,"a",true]"#);
    }
}
