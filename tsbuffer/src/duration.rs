//! Duration strings for configuration files and command-line flags.
//!
//! Accepts Go-style duration strings such as `"250ms"`, `"1m30s"` or `"1.5s"`,
//! and integer nanoseconds. `"0"` and the empty string both mean zero, which
//! the buffer treats as unbounded.

use std::time::Duration;

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;
const NANOS_PER_MIN: u128 = 60 * NANOS_PER_SEC;
const NANOS_PER_HOUR: u128 = 60 * NANOS_PER_MIN;

/// Error returned when a duration string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid duration {input:?}: {reason}")]
pub struct ParseDurationError {
    input: String,
    reason: &'static str,
}

impl ParseDurationError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

/// Parses a duration string like `"1h30m"`, `"250ms"`, `"1.5s"` or `"10us"`.
///
/// Valid units are `h`, `m`, `s`, `ms`, `us` (or `µs`) and `ns`. Every number
/// needs a unit, except a bare `"0"`.
pub fn parse_duration(s: &str) -> Result<Duration, ParseDurationError> {
    let input = s.trim();
    if input.is_empty() || input == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total: u128 = 0;
    let mut rest = input;

    while !rest.is_empty() {
        let num_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if num_len == 0 {
            return Err(ParseDurationError::new(input, "expected a number"));
        }
        let (number, tail) = rest.split_at(num_len);

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);

        let scale = match unit {
            "h" => NANOS_PER_HOUR,
            "m" => NANOS_PER_MIN,
            "s" => NANOS_PER_SEC,
            "ms" => NANOS_PER_MILLI,
            "us" | "µs" => NANOS_PER_MICRO,
            "ns" => 1,
            "" => return Err(ParseDurationError::new(input, "missing unit")),
            _ => return Err(ParseDurationError::new(input, "unknown unit")),
        };

        total = total
            .checked_add(scale_number(number, scale).ok_or_else(|| {
                ParseDurationError::new(input, "invalid number")
            })?)
            .ok_or_else(|| ParseDurationError::new(input, "overflow"))?;
        rest = tail;
    }

    let secs = u64::try_from(total / NANOS_PER_SEC)
        .map_err(|_| ParseDurationError::new(input, "overflow"))?;
    Ok(Duration::new(secs, (total % NANOS_PER_SEC) as u32))
}

/// Multiplies a decimal string like `"1.25"` by `scale` nanoseconds without
/// going through floating point. Fraction digits beyond nanosecond precision
/// are truncated.
fn scale_number(number: &str, scale: u128) -> Option<u128> {
    let (int_part, frac_part) = match number.split_once('.') {
        Some((i, f)) => (i, f),
        None => (number, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }

    let int: u128 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().ok()?
    };
    let mut nanos = int.checked_mul(scale)?;

    let mut divisor: u128 = 1;
    let mut frac: u128 = 0;
    for c in frac_part.chars() {
        let digit = c.to_digit(10)? as u128;
        if divisor >= NANOS_PER_SEC {
            continue;
        }
        frac = frac * 10 + digit;
        divisor *= 10;
    }
    if frac > 0 {
        nanos = nanos.checked_add(frac.checked_mul(scale)? / divisor)?;
    }
    Some(nanos)
}

/// Formats a duration the way [`parse_duration`] reads it back.
///
/// Sub-second values use the largest exact unit (`250ms`, `10us`, `7ns`);
/// larger values use hours, minutes and (possibly fractional) seconds.
pub fn format_duration(d: Duration) -> String {
    let nanos = d.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }

    if nanos < NANOS_PER_SEC {
        return if nanos % NANOS_PER_MILLI == 0 {
            format!("{}ms", nanos / NANOS_PER_MILLI)
        } else if nanos % NANOS_PER_MICRO == 0 {
            format!("{}us", nanos / NANOS_PER_MICRO)
        } else {
            format!("{}ns", nanos)
        };
    }

    let hours = nanos / NANOS_PER_HOUR;
    let mins = (nanos % NANOS_PER_HOUR) / NANOS_PER_MIN;
    let secs = (nanos % NANOS_PER_MIN) / NANOS_PER_SEC;
    let frac = nanos % NANOS_PER_SEC;

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{}h", hours));
    }
    if hours > 0 || mins > 0 {
        out.push_str(&format!("{}m", mins));
    }
    if frac == 0 {
        out.push_str(&format!("{}s", secs));
    } else {
        let frac = format!("{:09}", frac);
        out.push_str(&format!("{}.{}s", secs, frac.trim_end_matches('0')));
    }
    out
}

/// Serde adapter for `std::time::Duration` fields, used with
/// `#[serde(with = "crate::duration::serde_duration")]`.
///
/// Bare integers are nanoseconds; bare floats are seconds.
pub(crate) mod serde_duration {
    use std::fmt;
    use std::time::Duration;

    use serde::{Deserializer, Serializer};

    use super::{format_duration, parse_duration};

    pub fn serialize<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_duration(*d))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        struct DurationVisitor;

        impl<'de> serde::de::Visitor<'de> for DurationVisitor {
            type Value = Duration;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str(
                    "a duration string (e.g. '250ms'), nanoseconds integer or seconds float",
                )
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
                parse_duration(v).map_err(serde::de::Error::custom)
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Self::Value, E> {
                if v < 0 {
                    return Err(serde::de::Error::custom("negative duration"));
                }
                Ok(Duration::from_nanos(v as u64))
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(Duration::from_nanos(v))
            }

            fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<Self::Value, E> {
                Duration::try_from_secs_f64(v).map_err(serde::de::Error::custom)
            }

            fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
                Ok(Duration::ZERO)
            }
        }

        deserializer.deserialize_any(DurationVisitor)
    }
}
