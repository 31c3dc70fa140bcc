//! Fixed type OIDs for the built-in scalar types.

use vellum_core::types::ScalarType;

/// Format code for binary parameter and result transfer.
pub const BINARY_FORMAT: i16 = 1;

/// The server's catalog OID for a scalar type.
///
/// These are the stable `pg_type` OIDs for built-in types; they are fixed
/// across server versions and never looked up at runtime.
#[must_use]
pub const fn type_oid(scalar: &ScalarType) -> u32 {
    match scalar {
        ScalarType::Bool => 16,
        ScalarType::Bytea => 17,
        ScalarType::Int8 => 20,
        ScalarType::Int2 => 21,
        ScalarType::Int4 => 23,
        ScalarType::Json => 114,
        ScalarType::Float4 => 700,
        ScalarType::Float8 => 701,
        ScalarType::Inet => 869,
        ScalarType::Char(_) => 1042,
        ScalarType::Varchar(_) => 1043,
        ScalarType::Date => 1082,
        ScalarType::Time => 1083,
        ScalarType::Timestamp => 1114,
        ScalarType::TimestampTz => 1184,
        ScalarType::Interval => 1186,
        ScalarType::TimeTz => 1266,
        ScalarType::Numeric => 1700,
        ScalarType::Uuid => 2950,
        ScalarType::Jsonb => 3802,
    }
}
