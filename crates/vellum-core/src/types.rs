//! Scalar type tags and column types.

use core::fmt;
use std::num::NonZeroU32;

/// A PostgreSQL scalar type tag.
///
/// Fixed-length character types carry their length as a [`NonZeroU32`],
/// so a zero length cannot be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    /// Boolean.
    Bool,
    /// 2-byte integer.
    Int2,
    /// 4-byte integer.
    Int4,
    /// 8-byte integer.
    Int8,
    /// 4-byte IEEE-754 float.
    Float4,
    /// 8-byte IEEE-754 float.
    Float8,
    /// Arbitrary-precision decimal.
    Numeric,
    /// Fixed-length character string.
    Char(NonZeroU32),
    /// Variable-length character string with a length bound.
    Varchar(NonZeroU32),
    /// Binary blob.
    Bytea,
    /// Timestamp without time zone.
    Timestamp,
    /// Timestamp with time zone.
    TimestampTz,
    /// Calendar date.
    Date,
    /// Time of day without time zone.
    Time,
    /// Time of day with time zone.
    TimeTz,
    /// Time interval.
    Interval,
    /// 16-byte UUID.
    Uuid,
    /// IP address (v4 or v6).
    Inet,
    /// JSON stored as text.
    Json,
    /// JSON stored in the binary jsonb form.
    Jsonb,
}

impl ScalarType {
    /// Returns the canonical Postgres name of this type.
    #[must_use]
    pub fn type_name(&self) -> String {
        match self {
            Self::Bool => String::from("bool"),
            Self::Int2 => String::from("int2"),
            Self::Int4 => String::from("int4"),
            Self::Int8 => String::from("int8"),
            Self::Float4 => String::from("float4"),
            Self::Float8 => String::from("float8"),
            Self::Numeric => String::from("numeric"),
            Self::Char(n) => format!("char({n})"),
            Self::Varchar(n) => format!("varchar({n})"),
            Self::Bytea => String::from("bytea"),
            Self::Timestamp => String::from("timestamp"),
            Self::TimestampTz => String::from("timestamptz"),
            Self::Date => String::from("date"),
            Self::Time => String::from("time"),
            Self::TimeTz => String::from("timetz"),
            Self::Interval => String::from("interval"),
            Self::Uuid => String::from("uuid"),
            Self::Inet => String::from("inet"),
            Self::Json => String::from("json"),
            Self::Jsonb => String::from("jsonb"),
        }
    }

    /// Returns true for the numeric scalar family.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Int2 | Self::Int4 | Self::Int8 | Self::Float4 | Self::Float8 | Self::Numeric
        )
    }

    /// Returns true for the character-string family.
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Char(_) | Self::Varchar(_))
    }

    /// Returns true when two tags name the same scalar type.
    ///
    /// Length bounds on character types are ignored, so `char(2)` and
    /// `char(8)` compare equal for operator purposes.
    #[must_use]
    pub const fn same_scalar(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (Self::Bool, Self::Bool)
                | (Self::Int2, Self::Int2)
                | (Self::Int4, Self::Int4)
                | (Self::Int8, Self::Int8)
                | (Self::Float4, Self::Float4)
                | (Self::Float8, Self::Float8)
                | (Self::Numeric, Self::Numeric)
                | (Self::Char(_), Self::Char(_))
                | (Self::Varchar(_), Self::Varchar(_))
                | (Self::Bytea, Self::Bytea)
                | (Self::Timestamp, Self::Timestamp)
                | (Self::TimestampTz, Self::TimestampTz)
                | (Self::Date, Self::Date)
                | (Self::Time, Self::Time)
                | (Self::TimeTz, Self::TimeTz)
                | (Self::Interval, Self::Interval)
                | (Self::Uuid, Self::Uuid)
                | (Self::Inet, Self::Inet)
                | (Self::Json, Self::Json)
                | (Self::Jsonb, Self::Jsonb)
        )
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name())
    }
}

/// Whether a column must be supplied on INSERT.
///
/// Presence is independent of nullability: a nullable column may still be
/// required (an explicit NULL must be written), and a non-nullable column
/// may carry a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// The column must be assigned by every INSERT.
    Required,
    /// The column has a default and may be omitted.
    HasDefault,
}

/// The shape of one column or expression result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnType {
    /// The scalar type tag.
    pub scalar: ScalarType,
    /// Whether values may be NULL.
    pub nullable: bool,
    /// Whether the column may be omitted on INSERT.
    pub presence: Presence,
}

impl ColumnType {
    /// Creates a non-nullable, required column type.
    #[must_use]
    pub const fn new(scalar: ScalarType) -> Self {
        Self {
            scalar,
            nullable: false,
            presence: Presence::Required,
        }
    }

    /// Marks the type as nullable.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Marks the column as having a default.
    #[must_use]
    pub const fn with_default(mut self) -> Self {
        self.presence = Presence::HasDefault;
        self
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            write!(f, "{}?", self.scalar)
        } else {
            self.scalar.fmt(f)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(v: u32) -> NonZeroU32 {
        NonZeroU32::new(v).unwrap()
    }

    #[test]
    fn test_type_names() {
        assert_eq!(ScalarType::Bool.type_name(), "bool");
        assert_eq!(ScalarType::Int8.type_name(), "int8");
        assert_eq!(ScalarType::Char(n(8)).type_name(), "char(8)");
        assert_eq!(ScalarType::Varchar(n(255)).type_name(), "varchar(255)");
        assert_eq!(ScalarType::TimestampTz.type_name(), "timestamptz");
    }

    #[test]
    fn test_families() {
        assert!(ScalarType::Numeric.is_numeric());
        assert!(ScalarType::Float4.is_numeric());
        assert!(!ScalarType::Bool.is_numeric());
        assert!(ScalarType::Varchar(n(10)).is_text());
        assert!(!ScalarType::Bytea.is_text());
    }

    #[test]
    fn test_same_scalar_ignores_length() {
        assert!(ScalarType::Char(n(2)).same_scalar(&ScalarType::Char(n(8))));
        assert!(!ScalarType::Char(n(2)).same_scalar(&ScalarType::Varchar(n(2))));
    }

    #[test]
    fn test_presence_is_independent_of_nullability() {
        let ty = ColumnType::new(ScalarType::Int4).nullable();
        assert_eq!(ty.presence, Presence::Required);

        let ty = ColumnType::new(ScalarType::Int4).with_default();
        assert!(!ty.nullable);
        assert_eq!(ty.presence, Presence::HasDefault);
    }
}
