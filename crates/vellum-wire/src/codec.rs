//! Binary encode and decode against declared column types.
//!
//! All multi-byte integers are big-endian and floats are IEEE-754 in
//! big-endian byte order, matching the server's binary transfer format.
//! Both directions are strict: a mismatch between the host value and the
//! declared column type is an error, never a coercion, and decoding checks
//! every declared length before constructing a value.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, Timelike};
use vellum_core::types::{ColumnType, ScalarType};

use crate::error::{Result, WireError};
use crate::numeric::{Numeric, Sign};
use crate::value::PgValue;

/// Microseconds from the Unix epoch to the server's 2000-01-01 epoch.
const PG_EPOCH_MICROS: i64 = 946_684_800_000_000;

/// Days from chrono's 0001-01-01 CE anchor to 2000-01-01.
const PG_EPOCH_DAYS: i32 = 730_120;

const MICROS_PER_DAY: i64 = 86_400_000_000;

const NUMERIC_SIGN_POSITIVE: u16 = 0x0000;
const NUMERIC_SIGN_NEGATIVE: u16 = 0x4000;
const NUMERIC_SIGN_NAN: u16 = 0xC000;

const JSONB_VERSION: u8 = 1;

// Address family bytes used by inet: AF_INET and AF_INET + 1.
const INET_FAMILY_V4: u8 = 2;
const INET_FAMILY_V6: u8 = 3;

/// Length-agnostic name of a scalar type for error messages.
const fn scalar_name(scalar: &ScalarType) -> &'static str {
    match scalar {
        ScalarType::Bool => "bool",
        ScalarType::Int2 => "int2",
        ScalarType::Int4 => "int4",
        ScalarType::Int8 => "int8",
        ScalarType::Float4 => "float4",
        ScalarType::Float8 => "float8",
        ScalarType::Numeric => "numeric",
        ScalarType::Char(_) => "char",
        ScalarType::Varchar(_) => "varchar",
        ScalarType::Bytea => "bytea",
        ScalarType::Timestamp => "timestamp",
        ScalarType::TimestampTz => "timestamptz",
        ScalarType::Date => "date",
        ScalarType::Time => "time",
        ScalarType::TimeTz => "timetz",
        ScalarType::Interval => "interval",
        ScalarType::Uuid => "uuid",
        ScalarType::Inet => "inet",
        ScalarType::Json => "json",
        ScalarType::Jsonb => "jsonb",
    }
}

fn mismatch(ty: &ColumnType, value: &PgValue) -> WireError {
    WireError::Encode {
        expected: scalar_name(&ty.scalar),
        found: value.kind(),
    }
}

/// Reads a fixed-size prefix or fails with a length error.
fn fixed<const N: usize>(ty: &'static str, bytes: &[u8]) -> Result<[u8; N]> {
    bytes.try_into().map_err(|_| {
        WireError::decode(ty, format!("expected {N} bytes, found {}", bytes.len()))
    })
}

/// Splits a fixed-size prefix off a multi-part field.
fn split_fixed<'a, const N: usize>(ty: &'static str, bytes: &'a [u8]) -> Result<([u8; N], &'a [u8])> {
    bytes.split_first_chunk::<N>().map(|(chunk, rest)| (*chunk, rest)).ok_or_else(|| {
        WireError::decode(
            ty,
            format!("expected at least {N} bytes, found {}", bytes.len()),
        )
    })
}

/// Encodes a host value for a column, producing `None` for SQL `NULL`.
///
/// # Errors
///
/// Returns [`WireError::Encode`] when the value's variant does not match
/// the column's scalar type, when `NULL` is supplied for a non-nullable
/// column, when text exceeds a declared length bound, or when a temporal
/// value falls outside the representable wire range. No bytes are
/// produced on any error path.
pub fn encode(value: &PgValue, ty: &ColumnType) -> Result<Option<Vec<u8>>> {
    if value.is_null() {
        if ty.nullable {
            return Ok(None);
        }
        return Err(mismatch(ty, value));
    }
    let bytes = match (value, &ty.scalar) {
        (PgValue::Bool(v), ScalarType::Bool) => vec![u8::from(*v)],
        (PgValue::Int2(v), ScalarType::Int2) => v.to_be_bytes().to_vec(),
        (PgValue::Int4(v), ScalarType::Int4) => v.to_be_bytes().to_vec(),
        (PgValue::Int8(v), ScalarType::Int8) => v.to_be_bytes().to_vec(),
        (PgValue::Float4(v), ScalarType::Float4) => v.to_be_bytes().to_vec(),
        (PgValue::Float8(v), ScalarType::Float8) => v.to_be_bytes().to_vec(),
        (PgValue::Numeric(v), ScalarType::Numeric) => encode_numeric(v),
        (PgValue::Char(v), ScalarType::Char(limit)) => {
            check_length(ty, value, v, limit.get())?;
            v.clone().into_bytes()
        }
        (PgValue::Varchar(v), ScalarType::Varchar(limit)) => {
            check_length(ty, value, v, limit.get())?;
            v.clone().into_bytes()
        }
        (PgValue::Bytea(v), ScalarType::Bytea) => v.clone(),
        (PgValue::Timestamp(v), ScalarType::Timestamp) => {
            pg_micros(ty, value, v.and_utc().timestamp_micros())?.to_be_bytes().to_vec()
        }
        (PgValue::TimestampTz(v), ScalarType::TimestampTz) => {
            pg_micros(ty, value, v.timestamp_micros())?.to_be_bytes().to_vec()
        }
        (PgValue::Date(v), ScalarType::Date) => {
            let days = v
                .num_days_from_ce()
                .checked_sub(PG_EPOCH_DAYS)
                .ok_or_else(|| mismatch(ty, value))?;
            days.to_be_bytes().to_vec()
        }
        (PgValue::Time(v), ScalarType::Time) => {
            time_micros(ty, value, v)?.to_be_bytes().to_vec()
        }
        (PgValue::TimeTz(v, offset), ScalarType::TimeTz) => {
            let mut out = Vec::with_capacity(12);
            out.extend_from_slice(&time_micros(ty, value, v)?.to_be_bytes());
            // The wire carries seconds west of UTC, the inverse of the
            // host offset's east-of-UTC convention.
            out.extend_from_slice(&(-offset.local_minus_utc()).to_be_bytes());
            out
        }
        (
            PgValue::Interval {
                microseconds,
                days,
                months,
            },
            ScalarType::Interval,
        ) => {
            let mut out = Vec::with_capacity(16);
            out.extend_from_slice(&microseconds.to_be_bytes());
            out.extend_from_slice(&days.to_be_bytes());
            out.extend_from_slice(&months.to_be_bytes());
            out
        }
        (PgValue::Uuid(v), ScalarType::Uuid) => v.as_bytes().to_vec(),
        (PgValue::Inet(v), ScalarType::Inet) => match v {
            std::net::IpAddr::V4(addr) => {
                let mut out = vec![INET_FAMILY_V4, 32, 0, 4];
                out.extend_from_slice(&addr.octets());
                out
            }
            std::net::IpAddr::V6(addr) => {
                let mut out = vec![INET_FAMILY_V6, 128, 0, 16];
                out.extend_from_slice(&addr.octets());
                out
            }
        },
        (PgValue::Json(v), ScalarType::Json) => v.clone().into_bytes(),
        (PgValue::Jsonb(v), ScalarType::Jsonb) => {
            let mut out = Vec::with_capacity(v.len() + 1);
            out.push(JSONB_VERSION);
            out.extend_from_slice(v.as_bytes());
            out
        }
        _ => return Err(mismatch(ty, value)),
    };
    Ok(Some(bytes))
}

fn check_length(ty: &ColumnType, value: &PgValue, text: &str, limit: u32) -> Result<()> {
    if text.chars().count() > limit as usize {
        return Err(mismatch(ty, value));
    }
    Ok(())
}

/// Shifts Unix-epoch microseconds onto the 2000-01-01 wire epoch.
fn pg_micros(ty: &ColumnType, value: &PgValue, unix_micros: i64) -> Result<i64> {
    unix_micros
        .checked_sub(PG_EPOCH_MICROS)
        .ok_or_else(|| mismatch(ty, value))
}

fn time_micros(ty: &ColumnType, value: &PgValue, time: &NaiveTime) -> Result<i64> {
    let micros = i64::from(time.num_seconds_from_midnight()) * 1_000_000
        + i64::from(time.nanosecond() / 1_000);
    // A leap-second `NaiveTime` lands on or past 24:00:00, which the
    // wire format cannot carry.
    if micros >= MICROS_PER_DAY {
        return Err(mismatch(ty, value));
    }
    Ok(micros)
}

fn encode_numeric(value: &Numeric) -> Vec<u8> {
    let sign = match value.sign() {
        Sign::Positive => NUMERIC_SIGN_POSITIVE,
        Sign::Negative => NUMERIC_SIGN_NEGATIVE,
        Sign::NaN => NUMERIC_SIGN_NAN,
    };
    let digits = value.digits();
    let mut out = Vec::with_capacity(8 + digits.len() * 2);
    out.extend_from_slice(&(digits.len() as u16).to_be_bytes());
    out.extend_from_slice(&value.weight().to_be_bytes());
    out.extend_from_slice(&sign.to_be_bytes());
    out.extend_from_slice(&value.dscale().to_be_bytes());
    for digit in digits {
        out.extend_from_slice(&digit.to_be_bytes());
    }
    out
}

/// Decodes a wire field against a declared column type.
///
/// An absent field (`None`) is SQL `NULL` and is only legal for nullable
/// columns. An empty byte slice is a present value, distinct from `NULL`.
///
/// # Errors
///
/// Returns [`WireError::Decode`] when the field length does not match the
/// type, when bytes are not valid for the type (bad UTF-8, unknown
/// address family, out-of-range digit groups), or when `NULL` arrives for
/// a non-nullable column.
pub fn decode(ty: &ColumnType, field: Option<&[u8]>) -> Result<PgValue> {
    let name = scalar_name(&ty.scalar);
    let Some(bytes) = field else {
        if ty.nullable {
            return Ok(PgValue::Null);
        }
        return Err(WireError::decode(name, "NULL for non-nullable column"));
    };
    match &ty.scalar {
        ScalarType::Bool => match fixed::<1>(name, bytes)? {
            [0] => Ok(PgValue::Bool(false)),
            [1] => Ok(PgValue::Bool(true)),
            [b] => Err(WireError::decode(name, format!("invalid boolean byte {b}"))),
        },
        ScalarType::Int2 => Ok(PgValue::Int2(i16::from_be_bytes(fixed(name, bytes)?))),
        ScalarType::Int4 => Ok(PgValue::Int4(i32::from_be_bytes(fixed(name, bytes)?))),
        ScalarType::Int8 => Ok(PgValue::Int8(i64::from_be_bytes(fixed(name, bytes)?))),
        ScalarType::Float4 => Ok(PgValue::Float4(f32::from_be_bytes(fixed(name, bytes)?))),
        ScalarType::Float8 => Ok(PgValue::Float8(f64::from_be_bytes(fixed(name, bytes)?))),
        ScalarType::Numeric => decode_numeric(bytes),
        ScalarType::Char(limit) => {
            let text = decode_text(name, bytes, limit.get())?;
            Ok(PgValue::Char(text))
        }
        ScalarType::Varchar(limit) => {
            let text = decode_text(name, bytes, limit.get())?;
            Ok(PgValue::Varchar(text))
        }
        ScalarType::Bytea => Ok(PgValue::Bytea(bytes.to_vec())),
        ScalarType::Timestamp => {
            let micros = i64::from_be_bytes(fixed(name, bytes)?);
            let instant = unshift_micros(name, micros)?;
            Ok(PgValue::Timestamp(instant.naive_utc()))
        }
        ScalarType::TimestampTz => {
            let micros = i64::from_be_bytes(fixed(name, bytes)?);
            Ok(PgValue::TimestampTz(unshift_micros(name, micros)?))
        }
        ScalarType::Date => {
            let days = i32::from_be_bytes(fixed(name, bytes)?);
            let date = days
                .checked_add(PG_EPOCH_DAYS)
                .and_then(NaiveDate::from_num_days_from_ce_opt)
                .ok_or_else(|| WireError::decode(name, format!("day offset {days} out of range")))?;
            Ok(PgValue::Date(date))
        }
        ScalarType::Time => {
            let micros = i64::from_be_bytes(fixed(name, bytes)?);
            Ok(PgValue::Time(decode_time(name, micros)?))
        }
        ScalarType::TimeTz => {
            let (micros, rest) = split_fixed::<8>(name, bytes)?;
            let west = i32::from_be_bytes(fixed(name, rest)?);
            let time = decode_time(name, i64::from_be_bytes(micros))?;
            let offset = FixedOffset::west_opt(west)
                .ok_or_else(|| WireError::decode(name, format!("zone offset {west} out of range")))?;
            Ok(PgValue::TimeTz(time, offset))
        }
        ScalarType::Interval => {
            let (micros, rest) = split_fixed::<8>(name, bytes)?;
            let (days, rest) = split_fixed::<4>(name, rest)?;
            Ok(PgValue::Interval {
                microseconds: i64::from_be_bytes(micros),
                days: i32::from_be_bytes(days),
                months: i32::from_be_bytes(fixed(name, rest)?),
            })
        }
        ScalarType::Uuid => Ok(PgValue::Uuid(uuid::Uuid::from_bytes(fixed(name, bytes)?))),
        ScalarType::Inet => decode_inet(bytes),
        ScalarType::Json => {
            let text = String::from_utf8(bytes.to_vec())
                .map_err(|e| WireError::decode(name, e.to_string()))?;
            Ok(PgValue::Json(text))
        }
        ScalarType::Jsonb => {
            let (&version, body) = bytes
                .split_first()
                .ok_or_else(|| WireError::decode(name, "empty jsonb field"))?;
            if version != JSONB_VERSION {
                return Err(WireError::decode(
                    name,
                    format!("unsupported jsonb version {version}"),
                ));
            }
            let text = String::from_utf8(body.to_vec())
                .map_err(|e| WireError::decode(name, e.to_string()))?;
            Ok(PgValue::Jsonb(text))
        }
    }
}

fn decode_text(name: &'static str, bytes: &[u8], limit: u32) -> Result<String> {
    let text =
        String::from_utf8(bytes.to_vec()).map_err(|e| WireError::decode(name, e.to_string()))?;
    if text.chars().count() > limit as usize {
        return Err(WireError::decode(
            name,
            format!("value exceeds declared length {limit}"),
        ));
    }
    Ok(text)
}

fn unshift_micros(name: &'static str, micros: i64) -> Result<DateTime<chrono::Utc>> {
    micros
        .checked_add(PG_EPOCH_MICROS)
        .and_then(DateTime::from_timestamp_micros)
        .ok_or_else(|| WireError::decode(name, format!("timestamp {micros} out of range")))
}

fn decode_time(name: &'static str, micros: i64) -> Result<NaiveTime> {
    if !(0..MICROS_PER_DAY).contains(&micros) {
        return Err(WireError::decode(
            name,
            format!("time of day {micros} out of range"),
        ));
    }
    let seconds = (micros / 1_000_000) as u32;
    let nanos = (micros % 1_000_000) as u32 * 1_000;
    NaiveTime::from_num_seconds_from_midnight_opt(seconds, nanos)
        .ok_or_else(|| WireError::decode(name, format!("time of day {micros} out of range")))
}

fn decode_numeric(bytes: &[u8]) -> Result<PgValue> {
    let (ndigits, rest) = split_fixed::<2>("numeric", bytes)?;
    let (weight, rest) = split_fixed::<2>("numeric", rest)?;
    let (sign, rest) = split_fixed::<2>("numeric", rest)?;
    let (dscale, body) = split_fixed::<2>("numeric", rest)?;
    let ndigits = u16::from_be_bytes(ndigits);
    let weight = i16::from_be_bytes(weight);
    let sign = u16::from_be_bytes(sign);
    let dscale = u16::from_be_bytes(dscale);
    if body.len() != usize::from(ndigits) * 2 {
        return Err(WireError::decode(
            "numeric",
            format!("expected {ndigits} digit groups, found {} bytes", body.len()),
        ));
    }
    let sign = match sign {
        NUMERIC_SIGN_POSITIVE => Sign::Positive,
        NUMERIC_SIGN_NEGATIVE => Sign::Negative,
        NUMERIC_SIGN_NAN => Sign::NaN,
        other => {
            return Err(WireError::decode(
                "numeric",
                format!("unknown sign marker {other:#06x}"),
            ))
        }
    };
    let digits = body
        .chunks_exact(2)
        .map(|pair| i16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    Ok(PgValue::Numeric(Numeric::from_parts(
        sign, weight, dscale, digits,
    )?))
}

fn decode_inet(bytes: &[u8]) -> Result<PgValue> {
    let [family, bits, is_cidr, len, addr @ ..] = bytes else {
        return Err(WireError::decode("inet", "header shorter than 4 bytes"));
    };
    if *is_cidr != 0 {
        return Err(WireError::decode("inet", "cidr flag set on inet field"));
    }
    match (family, bits, len, addr.len()) {
        (&INET_FAMILY_V4, 32, 4, 4) => {
            let octets: [u8; 4] = fixed("inet", addr)?;
            Ok(PgValue::Inet(std::net::IpAddr::from(octets)))
        }
        (&INET_FAMILY_V6, 128, 16, 16) => {
            let octets: [u8; 16] = fixed("inet", addr)?;
            Ok(PgValue::Inet(std::net::IpAddr::from(octets)))
        }
        _ => Err(WireError::decode(
            "inet",
            format!("invalid address header family={family} bits={bits} len={len}"),
        )),
    }
}

/// Appends a field to a message buffer with its 32-bit length prefix.
///
/// `NULL` is written as length `-1` with no payload, which keeps it
/// distinct from a present zero-length value.
///
/// # Errors
///
/// Returns [`WireError::Encode`] if the payload exceeds `i32::MAX` bytes.
pub fn write_field(buf: &mut Vec<u8>, field: Option<&[u8]>) -> Result<()> {
    match field {
        None => buf.extend_from_slice(&(-1_i32).to_be_bytes()),
        Some(payload) => {
            let len = i32::try_from(payload.len()).map_err(|_| WireError::Encode {
                expected: "field",
                found: "oversized payload",
            })?;
            buf.extend_from_slice(&len.to_be_bytes());
            buf.extend_from_slice(payload);
        }
    }
    Ok(())
}

/// Reads one length-prefixed field, advancing the input past it.
///
/// # Errors
///
/// Returns [`WireError::Decode`] on a truncated prefix or payload, or a
/// negative length other than the `-1` `NULL` marker.
pub fn read_field(input: &mut &[u8]) -> Result<Option<Vec<u8>>> {
    let Some((prefix, rest)) = input.split_first_chunk::<4>() else {
        return Err(WireError::decode("field", "truncated length prefix"));
    };
    let len = i32::from_be_bytes(*prefix);
    if len == -1 {
        *input = rest;
        return Ok(None);
    }
    let len = usize::try_from(len)
        .map_err(|_| WireError::decode("field", format!("invalid field length {len}")))?;
    if rest.len() < len {
        return Err(WireError::decode(
            "field",
            format!("field length {len} exceeds remaining {} bytes", rest.len()),
        ));
    }
    let (payload, rest) = rest.split_at(len);
    *input = rest;
    Ok(Some(payload.to_vec()))
}

#[cfg(test)]
mod tests {
    use std::net::IpAddr;
    use std::num::NonZeroU32;

    use chrono::{NaiveDate, TimeZone, Utc};
    use vellum_core::types::{ColumnType, ScalarType};

    use super::*;

    fn column(scalar: ScalarType) -> ColumnType {
        ColumnType::new(scalar)
    }

    fn varchar(limit: u32) -> ColumnType {
        column(ScalarType::Varchar(NonZeroU32::new(limit).unwrap()))
    }

    fn round_trip(value: PgValue, ty: &ColumnType) {
        let bytes = encode(&value, ty).unwrap();
        let back = decode(ty, bytes.as_deref()).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_integer_round_trips() {
        let ty = column(ScalarType::Int2);
        for v in [0_i16, 1, -1, i16::MIN, i16::MAX] {
            round_trip(PgValue::Int2(v), &ty);
        }
        let ty = column(ScalarType::Int8);
        for v in [0_i64, -1, i64::MIN, i64::MAX] {
            round_trip(PgValue::Int8(v), &ty);
        }
    }

    #[test]
    fn test_int4_is_big_endian() {
        let ty = column(ScalarType::Int4);
        let bytes = encode(&PgValue::Int4(0x0102_0304), &ty).unwrap().unwrap();
        assert_eq!(bytes, [1, 2, 3, 4]);
    }

    #[test]
    fn test_variant_mismatch_rejected() {
        let err = encode(&PgValue::Int4(7), &column(ScalarType::Int8)).unwrap_err();
        assert_eq!(
            err,
            WireError::Encode {
                expected: "int8",
                found: "int4"
            }
        );
    }

    #[test]
    fn test_null_requires_nullable_column() {
        let ty = varchar(10);
        assert!(encode(&PgValue::Null, &ty).is_err());
        assert!(decode(&ty, None).is_err());

        let nullable = varchar(10).nullable();
        assert_eq!(encode(&PgValue::Null, &nullable).unwrap(), None);
        assert_eq!(decode(&nullable, None).unwrap(), PgValue::Null);
    }

    #[test]
    fn test_empty_string_is_not_null() {
        let ty = varchar(10).nullable();
        let bytes = encode(&PgValue::from(""), &ty).unwrap();
        assert_eq!(bytes, Some(Vec::new()));
        assert_eq!(decode(&ty, Some(&[])).unwrap(), PgValue::from(""));
    }

    #[test]
    fn test_varchar_length_is_chars_not_bytes() {
        let ty = varchar(2);
        // Two three-byte characters fit a limit of two.
        round_trip(PgValue::from("日本"), &ty);
        assert!(encode(&PgValue::from("abc"), &ty).is_err());
    }

    #[test]
    fn test_bool_rejects_out_of_range_byte() {
        let ty = column(ScalarType::Bool);
        round_trip(PgValue::Bool(true), &ty);
        assert!(decode(&ty, Some(&[2])).is_err());
        assert!(decode(&ty, Some(&[1, 0])).is_err());
    }

    #[test]
    fn test_float_round_trips() {
        let ty = column(ScalarType::Float8);
        for v in [0.0_f64, -0.0, 1.5, f64::MIN, f64::MAX, f64::INFINITY] {
            round_trip(PgValue::Float8(v), &ty);
        }
    }

    #[test]
    fn test_numeric_wire_layout() {
        let ty = column(ScalarType::Numeric);
        let value: Numeric = "-12345.678".parse().unwrap();
        let bytes = encode(&PgValue::Numeric(value.clone()), &ty).unwrap().unwrap();
        // ndigits=3 weight=1 sign=negative dscale=3, groups 1 2345 6780.
        assert_eq!(
            bytes,
            [0, 3, 0, 1, 0x40, 0, 0, 3, 0, 1, 0x09, 0x29, 0x1A, 0x7C]
        );
        round_trip(PgValue::Numeric(value), &ty);
        round_trip(PgValue::Numeric(Numeric::nan()), &ty);
    }

    #[test]
    fn test_numeric_rejects_bad_sign_marker() {
        let ty = column(ScalarType::Numeric);
        let err = decode(&ty, Some(&[0, 0, 0, 0, 0x80, 0, 0, 0])).unwrap_err();
        assert!(matches!(err, WireError::Decode { ty: "numeric", .. }));
    }

    #[test]
    fn test_timestamp_epoch_shift() {
        let ty = column(ScalarType::Timestamp);
        let epoch = NaiveDate::from_ymd_opt(2000, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let bytes = encode(&PgValue::Timestamp(epoch), &ty).unwrap().unwrap();
        assert_eq!(bytes, 0_i64.to_be_bytes());
        round_trip(PgValue::Timestamp(epoch), &ty);
    }

    #[test]
    fn test_timestamptz_round_trips() {
        let ty = column(ScalarType::TimestampTz);
        let instant = Utc.with_ymd_and_hms(2026, 8, 26, 13, 30, 5).unwrap();
        round_trip(PgValue::TimestampTz(instant), &ty);
    }

    #[test]
    fn test_date_epoch_shift() {
        let ty = column(ScalarType::Date);
        let epoch = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        let bytes = encode(&PgValue::Date(epoch), &ty).unwrap().unwrap();
        assert_eq!(bytes, 0_i32.to_be_bytes());
        round_trip(PgValue::Date(NaiveDate::from_ymd_opt(1969, 7, 20).unwrap()), &ty);
    }

    #[test]
    fn test_time_range_checked() {
        let ty = column(ScalarType::Time);
        round_trip(
            PgValue::Time(NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999).unwrap()),
            &ty,
        );
        assert!(decode(&ty, Some(&MICROS_PER_DAY.to_be_bytes())).is_err());
        assert!(decode(&ty, Some(&(-1_i64).to_be_bytes())).is_err());
    }

    #[test]
    fn test_timetz_offset_sign_convention() {
        let ty = column(ScalarType::TimeTz);
        let time = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let east = FixedOffset::east_opt(3600).unwrap();
        let bytes = encode(&PgValue::TimeTz(time, east), &ty).unwrap().unwrap();
        // One hour east of UTC is -3600 seconds west on the wire.
        assert_eq!(&bytes[8..], (-3600_i32).to_be_bytes().as_slice());
        round_trip(PgValue::TimeTz(time, east), &ty);
    }

    #[test]
    fn test_leap_second_time_rejected_at_encode() {
        // chrono represents 23:59:60.5 as 59s with 1.5e9 nanos, which
        // lands past the last representable microsecond of the day.
        let leap = NaiveTime::from_hms_micro_opt(23, 59, 59, 1_500_000).unwrap();
        assert!(encode(&PgValue::Time(leap), &column(ScalarType::Time)).is_err());
        let east = FixedOffset::east_opt(3600).unwrap();
        assert!(encode(&PgValue::TimeTz(leap, east), &column(ScalarType::TimeTz)).is_err());
    }

    #[test]
    fn test_truncated_multipart_fields_rejected() {
        let timetz = column(ScalarType::TimeTz);
        let time = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let east = FixedOffset::east_opt(3600).unwrap();
        let bytes = encode(&PgValue::TimeTz(time, east), &timetz).unwrap().unwrap();
        assert!(decode(&timetz, Some(&bytes[..7])).is_err());
        assert!(decode(&timetz, Some(&bytes[..10])).is_err());

        let interval = column(ScalarType::Interval);
        let value = PgValue::Interval {
            microseconds: 5_000_000,
            days: -2,
            months: 13,
        };
        let bytes = encode(&value, &interval).unwrap().unwrap();
        assert!(decode(&interval, Some(&bytes[..12])).is_err());

        let numeric = column(ScalarType::Numeric);
        let bytes = encode(&PgValue::Numeric(Numeric::from(7_i64)), &numeric).unwrap().unwrap();
        assert!(decode(&numeric, Some(&bytes[..6])).is_err());
    }

    #[test]
    fn test_interval_layout() {
        let ty = column(ScalarType::Interval);
        let value = PgValue::Interval {
            microseconds: 5_000_000,
            days: -2,
            months: 13,
        };
        let bytes = encode(&value, &ty).unwrap().unwrap();
        assert_eq!(bytes.len(), 16);
        round_trip(value, &ty);
    }

    #[test]
    fn test_uuid_round_trips() {
        let ty = column(ScalarType::Uuid);
        let id = uuid::Uuid::from_u128(0x0011_2233_4455_6677_8899_AABB_CCDD_EEFF);
        round_trip(PgValue::Uuid(id), &ty);
    }

    #[test]
    fn test_inet_families() {
        let ty = column(ScalarType::Inet);
        round_trip(PgValue::Inet("192.168.0.1".parse::<IpAddr>().unwrap()), &ty);
        round_trip(PgValue::Inet("::1".parse::<IpAddr>().unwrap()), &ty);
        // CIDR flag set is not a bare address.
        assert!(decode(&ty, Some(&[2, 32, 1, 4, 10, 0, 0, 1])).is_err());
    }

    #[test]
    fn test_jsonb_version_byte() {
        let ty = column(ScalarType::Jsonb);
        let bytes = encode(&PgValue::Jsonb("{\"a\":1}".into()), &ty).unwrap().unwrap();
        assert_eq!(bytes[0], 1);
        round_trip(PgValue::Jsonb("{}".into()), &ty);
        assert!(decode(&ty, Some(&[2, b'{', b'}'])).is_err());
    }

    #[test]
    fn test_field_framing() {
        let mut buf = Vec::new();
        write_field(&mut buf, Some(&[0xAA, 0xBB])).unwrap();
        write_field(&mut buf, None).unwrap();
        write_field(&mut buf, Some(&[])).unwrap();
        assert_eq!(
            buf,
            [0, 0, 0, 2, 0xAA, 0xBB, 0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 0]
        );

        let mut input = buf.as_slice();
        assert_eq!(read_field(&mut input).unwrap(), Some(vec![0xAA, 0xBB]));
        assert_eq!(read_field(&mut input).unwrap(), None);
        assert_eq!(read_field(&mut input).unwrap(), Some(Vec::new()));
        assert!(input.is_empty());
    }

    #[test]
    fn test_read_field_rejects_truncation() {
        let mut input: &[u8] = &[0, 0, 0, 5, 1, 2];
        assert!(read_field(&mut input).is_err());
        let mut input: &[u8] = &[0, 0];
        assert!(read_field(&mut input).is_err());
    }
}
