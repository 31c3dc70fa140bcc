//! Arbitrary-precision decimals in the PostgreSQL base-10000 layout.
//!
//! A [`Numeric`] stores the exact representation the server uses on the
//! wire: a sequence of base-10000 digits, a weight placing the decimal
//! point, and a display scale recording how many fractional decimal digits
//! to show. Keeping the wire layout as the host representation means
//! encoding and decoding never round.

use std::fmt;
use std::str::FromStr;

use crate::error::WireError;

const DIGIT_BASE: i32 = 10_000;
const DECIMALS_PER_DIGIT: usize = 4;

/// Sign of a [`Numeric`] value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Positive,
    Negative,
    /// The dedicated not-a-number value. NaN carries no digits.
    NaN,
}

/// An exact decimal in PostgreSQL's base-10000 representation.
///
/// Values are kept normalized: no leading or trailing zero digit groups.
/// Equality therefore compares exact numeric values at a given display
/// scale; `1.5` and `1.50` differ only in [`dscale`](Self::dscale) and
/// compare unequal, matching the server's notion of distinct typmods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Numeric {
    sign: Sign,
    weight: i16,
    dscale: u16,
    digits: Vec<i16>,
}

impl Numeric {
    /// The not-a-number value.
    #[must_use]
    pub const fn nan() -> Self {
        Self {
            sign: Sign::NaN,
            weight: 0,
            dscale: 0,
            digits: Vec::new(),
        }
    }

    /// Whether this value is NaN.
    #[must_use]
    pub fn is_nan(&self) -> bool {
        self.sign == Sign::NaN
    }

    /// Sign of the value.
    #[must_use]
    pub const fn sign(&self) -> Sign {
        self.sign
    }

    /// Weight of the first digit group, in base-10000 positions relative to
    /// the decimal point. Weight zero means the first group counts units.
    #[must_use]
    pub const fn weight(&self) -> i16 {
        self.weight
    }

    /// Number of fractional decimal digits to display.
    #[must_use]
    pub const fn dscale(&self) -> u16 {
        self.dscale
    }

    /// The base-10000 digit groups, most significant first.
    #[must_use]
    pub fn digits(&self) -> &[i16] {
        &self.digits
    }

    /// Reassembles a value from its wire components, validating digit range.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Decode`] if any digit group falls outside
    /// `0..10000` or if a NaN carries digits.
    pub fn from_parts(sign: Sign, weight: i16, dscale: u16, digits: Vec<i16>) -> Result<Self, WireError> {
        if sign == Sign::NaN && !digits.is_empty() {
            return Err(WireError::decode("numeric", "NaN with digit groups"));
        }
        for &d in &digits {
            if !(0..DIGIT_BASE as i16).contains(&d) {
                return Err(WireError::decode(
                    "numeric",
                    format!("digit group {d} outside base-10000 range"),
                ));
            }
        }
        let mut value = Self {
            sign,
            weight,
            dscale,
            digits,
        };
        value.normalize();
        Ok(value)
    }

    /// Strips zero digit groups from both ends, adjusting the weight so the
    /// numeric value is unchanged.
    fn normalize(&mut self) {
        while self.digits.first() == Some(&0) {
            self.digits.remove(0);
            self.weight -= 1;
        }
        while self.digits.last() == Some(&0) {
            self.digits.pop();
        }
        if self.digits.is_empty() && self.sign != Sign::NaN {
            self.weight = 0;
            if self.sign == Sign::Negative {
                self.sign = Sign::Positive;
            }
        }
    }

    /// Digit group at a given weight-relative index, zero when out of range.
    fn group_at(&self, index: i32) -> i16 {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.digits.get(i).copied())
            .unwrap_or(0)
    }
}

impl From<i64> for Numeric {
    fn from(value: i64) -> Self {
        if value == 0 {
            return Self {
                sign: Sign::Positive,
                weight: 0,
                dscale: 0,
                digits: Vec::new(),
            };
        }
        let sign = if value < 0 {
            Sign::Negative
        } else {
            Sign::Positive
        };
        let mut magnitude = value.unsigned_abs();
        let mut digits = Vec::new();
        while magnitude > 0 {
            digits.push((magnitude % 10_000) as i16);
            magnitude /= 10_000;
        }
        digits.reverse();
        let weight = digits.len() as i16 - 1;
        let mut numeric = Self {
            sign,
            weight,
            dscale: 0,
            digits,
        };
        numeric.normalize();
        numeric
    }
}

impl FromStr for Numeric {
    type Err = WireError;

    /// Parses a plain decimal string such as `-123.450` or `NaN`.
    ///
    /// Exponent notation is not accepted; the wire format has no exponent
    /// and a caller holding one should expand it first.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("nan") {
            return Ok(Self::nan());
        }
        let (sign, rest) = match s.as_bytes().first() {
            Some(b'-') => (Sign::Negative, &s[1..]),
            Some(b'+') => (Sign::Positive, &s[1..]),
            _ => (Sign::Positive, s),
        };
        let (int_part, frac_part) = match rest.split_once('.') {
            Some((i, f)) => (i, f),
            None => (rest, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(WireError::decode("numeric", "no digits in input"));
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(WireError::decode(
                "numeric",
                format!("invalid decimal string {s:?}"),
            ));
        }
        let dscale = u16::try_from(frac_part.len())
            .map_err(|_| WireError::decode("numeric", "fractional part too long"))?;

        // Pad the integer part on the left and the fractional part on the
        // right so both split cleanly into four-decimal-digit groups.
        let int_part = if int_part.is_empty() { "0" } else { int_part };
        let left_pad = (DECIMALS_PER_DIGIT - int_part.len() % DECIMALS_PER_DIGIT) % DECIMALS_PER_DIGIT;
        let mut decimal = String::with_capacity(left_pad + int_part.len() + frac_part.len() + 3);
        for _ in 0..left_pad {
            decimal.push('0');
        }
        decimal.push_str(int_part);
        let int_groups = decimal.len() / DECIMALS_PER_DIGIT;
        decimal.push_str(frac_part);
        while decimal.len() % DECIMALS_PER_DIGIT != 0 {
            decimal.push('0');
        }

        let mut digits = Vec::with_capacity(decimal.len() / DECIMALS_PER_DIGIT);
        for chunk in decimal.as_bytes().chunks(DECIMALS_PER_DIGIT) {
            let mut group: i16 = 0;
            for &b in chunk {
                group = group * 10 + i16::from(b - b'0');
            }
            digits.push(group);
        }
        let weight = i16::try_from(int_groups)
            .map_err(|_| WireError::decode("numeric", "integer part too long"))?
            - 1;

        let mut numeric = Self {
            sign,
            weight,
            dscale,
            digits,
        };
        numeric.normalize();
        Ok(numeric)
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nan() {
            return f.write_str("NaN");
        }
        if self.sign == Sign::Negative {
            f.write_str("-")?;
        }
        if self.weight < 0 {
            f.write_str("0")?;
        } else {
            for i in 0..=i32::from(self.weight) {
                let group = self.group_at(i);
                if i == 0 {
                    write!(f, "{group}")?;
                } else {
                    write!(f, "{group:04}")?;
                }
            }
        }
        if self.dscale > 0 {
            let mut frac = String::new();
            let mut offset = 1;
            while frac.len() < usize::from(self.dscale) {
                let group = self.group_at(i32::from(self.weight) + offset);
                frac.push_str(&format!("{group:04}"));
                offset += 1;
            }
            frac.truncate(usize::from(self.dscale));
            write!(f, ".{frac}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Numeric {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_integer() {
        let n = parse("12345");
        assert_eq!(n.sign(), Sign::Positive);
        assert_eq!(n.weight(), 1);
        assert_eq!(n.dscale(), 0);
        assert_eq!(n.digits(), &[1, 2345]);
    }

    #[test]
    fn test_parse_fraction() {
        let n = parse("0.5");
        assert_eq!(n.weight(), -1);
        assert_eq!(n.dscale(), 1);
        assert_eq!(n.digits(), &[5000]);
    }

    #[test]
    fn test_parse_negative_small_fraction() {
        let n = parse("-0.07");
        assert_eq!(n.sign(), Sign::Negative);
        assert_eq!(n.weight(), -1);
        assert_eq!(n.dscale(), 2);
        assert_eq!(n.digits(), &[700]);
    }

    #[test]
    fn test_zero_normalizes_to_no_digits() {
        let n = parse("0.000");
        assert_eq!(n.digits(), &[] as &[i16]);
        assert_eq!(n.weight(), 0);
        assert_eq!(n.dscale(), 3);
        assert_eq!(n.to_string(), "0.000");
    }

    #[test]
    fn test_display_round_trips() {
        for s in ["0", "1", "-1", "9999", "10000", "12345.678", "0.5", "-0.07", "100", "1.50"] {
            assert_eq!(parse(s).to_string(), s);
        }
    }

    #[test]
    fn test_trailing_zero_group_stripped() {
        let n = parse("10000");
        assert_eq!(n.digits(), &[1]);
        assert_eq!(n.weight(), 1);
        assert_eq!(n.to_string(), "10000");
    }

    #[test]
    fn test_from_i64() {
        assert_eq!(Numeric::from(0).to_string(), "0");
        assert_eq!(Numeric::from(-42).to_string(), "-42");
        assert_eq!(Numeric::from(i64::MAX).to_string(), "9223372036854775807");
        assert_eq!(Numeric::from(i64::MIN).to_string(), "-9223372036854775808");
    }

    #[test]
    fn test_nan() {
        let n = parse("NaN");
        assert!(n.is_nan());
        assert_eq!(n.to_string(), "NaN");
    }

    #[test]
    fn test_from_parts_rejects_bad_digit() {
        let err = Numeric::from_parts(Sign::Positive, 0, 0, vec![10_000]);
        assert!(err.is_err());
    }

    #[test]
    fn test_rejects_exponent_notation() {
        assert!("1e5".parse::<Numeric>().is_err());
        assert!("".parse::<Numeric>().is_err());
        assert!(".".parse::<Numeric>().is_err());
    }

    #[test]
    fn test_display_scale_distinguishes_values() {
        assert_ne!(parse("1.5"), parse("1.50"));
        assert_eq!(parse("1.50"), parse("1.50"));
    }
}
