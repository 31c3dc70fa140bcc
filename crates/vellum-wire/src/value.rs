//! Host-side values exchanged through the binary codec.

use std::net::IpAddr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use uuid::Uuid;

use crate::numeric::Numeric;

/// A host value paired with the scalar type it represents on the wire.
///
/// Each variant corresponds to exactly one scalar column type; the codec
/// refuses to coerce, so an [`Int4`](Self::Int4) never encodes into an
/// `int8` column. `NULL` is its own variant rather than an `Option`
/// wrapper because nullability is a property of the column, not the value.
#[derive(Debug, Clone, PartialEq)]
pub enum PgValue {
    Null,
    Bool(bool),
    Int2(i16),
    Int4(i32),
    Int8(i64),
    Float4(f32),
    Float8(f64),
    Numeric(Numeric),
    Char(String),
    Varchar(String),
    Bytea(Vec<u8>),
    /// Microsecond-precision timestamp without a zone.
    Timestamp(NaiveDateTime),
    /// Microsecond-precision instant, normalized to UTC on the wire.
    TimestampTz(DateTime<Utc>),
    Date(NaiveDate),
    Time(NaiveTime),
    /// A time of day with the fixed UTC offset it was written under.
    TimeTz(NaiveTime, FixedOffset),
    /// A span kept in the three wire components. Months and days are not
    /// reduced to microseconds because their length depends on context.
    Interval {
        microseconds: i64,
        days: i32,
        months: i32,
    },
    Uuid(Uuid),
    Inet(IpAddr),
    Json(String),
    Jsonb(String),
}

impl PgValue {
    /// Short name of the variant, used in codec error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Bool(_) => "bool",
            Self::Int2(_) => "int2",
            Self::Int4(_) => "int4",
            Self::Int8(_) => "int8",
            Self::Float4(_) => "float4",
            Self::Float8(_) => "float8",
            Self::Numeric(_) => "numeric",
            Self::Char(_) => "char",
            Self::Varchar(_) => "varchar",
            Self::Bytea(_) => "bytea",
            Self::Timestamp(_) => "timestamp",
            Self::TimestampTz(_) => "timestamptz",
            Self::Date(_) => "date",
            Self::Time(_) => "time",
            Self::TimeTz(..) => "timetz",
            Self::Interval { .. } => "interval",
            Self::Uuid(_) => "uuid",
            Self::Inet(_) => "inet",
            Self::Json(_) => "json",
            Self::Jsonb(_) => "jsonb",
        }
    }

    /// Whether this is the `NULL` value.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<bool> for PgValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i16> for PgValue {
    fn from(value: i16) -> Self {
        Self::Int2(value)
    }
}

impl From<i32> for PgValue {
    fn from(value: i32) -> Self {
        Self::Int4(value)
    }
}

impl From<i64> for PgValue {
    fn from(value: i64) -> Self {
        Self::Int8(value)
    }
}

impl From<f32> for PgValue {
    fn from(value: f32) -> Self {
        Self::Float4(value)
    }
}

impl From<f64> for PgValue {
    fn from(value: f64) -> Self {
        Self::Float8(value)
    }
}

impl From<&str> for PgValue {
    fn from(value: &str) -> Self {
        Self::Varchar(value.to_owned())
    }
}

impl From<String> for PgValue {
    fn from(value: String) -> Self {
        Self::Varchar(value)
    }
}

impl From<Vec<u8>> for PgValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytea(value)
    }
}

impl From<Numeric> for PgValue {
    fn from(value: Numeric) -> Self {
        Self::Numeric(value)
    }
}

impl From<NaiveDateTime> for PgValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::Timestamp(value)
    }
}

impl From<DateTime<Utc>> for PgValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::TimestampTz(value)
    }
}

impl From<NaiveDate> for PgValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<NaiveTime> for PgValue {
    fn from(value: NaiveTime) -> Self {
        Self::Time(value)
    }
}

impl From<Uuid> for PgValue {
    fn from(value: Uuid) -> Self {
        Self::Uuid(value)
    }
}

impl From<IpAddr> for PgValue {
    fn from(value: IpAddr) -> Self {
        Self::Inet(value)
    }
}

impl<T> From<Option<T>> for PgValue
where
    T: Into<Self>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_maps_none_to_null() {
        assert_eq!(PgValue::from(None::<i32>), PgValue::Null);
        assert_eq!(PgValue::from(Some(7_i32)), PgValue::Int4(7));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(PgValue::Null.kind(), "NULL");
        assert_eq!(PgValue::from("hello").kind(), "varchar");
        assert_eq!(PgValue::Jsonb("{}".into()).kind(), "jsonb");
    }
}
