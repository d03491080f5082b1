//! Go-style duration strings (`1m`, `1h30m`, `500ms`).
//!
//! Parsed values render back in canonical form: `1m` becomes `1m0s`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SECOND: u128 = 1_000_000_000;
const NANOS_PER_MINUTE: u128 = 60 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: u128 = 60 * NANOS_PER_MINUTE;

/// A duration that (de)serializes as a Go duration string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct GoDuration(Duration);

/// Failure to parse a duration string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid duration {input:?}: {reason}")]
pub struct DurationParseError {
    pub input: String,
    pub reason: &'static str,
}

impl GoDuration {
    pub fn new(duration: Duration) -> Self {
        Self(duration)
    }

    pub fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

impl From<Duration> for GoDuration {
    fn from(duration: Duration) -> Self {
        Self(duration)
    }
}

impl FromStr for GoDuration {
    type Err = DurationParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let fail = |reason| DurationParseError {
            input: input.to_string(),
            reason,
        };
        let s = input.trim();
        if s.is_empty() {
            return Err(fail("empty"));
        }
        if s == "0" {
            return Ok(Self::default());
        }
        if s.starts_with('-') {
            return Err(fail("negative durations are not supported"));
        }
        let s = s.strip_prefix('+').unwrap_or(s);

        let mut total: u128 = 0;
        let mut rest = s;
        while !rest.is_empty() {
            let number_len = rest
                .find(|c: char| !(c.is_ascii_digit() || c == '.'))
                .ok_or_else(|| fail("missing unit"))?;
            if number_len == 0 {
                return Err(fail("expected a number"));
            }
            let (number, tail) = rest.split_at(number_len);
            let unit_len = tail
                .find(|c: char| c.is_ascii_digit() || c == '.')
                .unwrap_or(tail.len());
            let (unit, tail) = tail.split_at(unit_len);
            let scale = match unit {
                "ns" => 1,
                "us" | "µs" | "μs" => NANOS_PER_MICRO,
                "ms" => NANOS_PER_MILLI,
                "s" => NANOS_PER_SECOND,
                "m" => NANOS_PER_MINUTE,
                "h" => NANOS_PER_HOUR,
                _ => return Err(fail("unknown unit")),
            };
            let value = scaled(number, scale).ok_or_else(|| fail("invalid number"))?;
            total = total.checked_add(value).ok_or_else(|| fail("out of range"))?;
            rest = tail;
        }

        let secs = u64::try_from(total / NANOS_PER_SECOND).map_err(|_| fail("out of range"))?;
        let nanos = (total % NANOS_PER_SECOND) as u32;
        Ok(Self(Duration::new(secs, nanos)))
    }
}

/// Multiply a decimal literal such as `1.5` by `scale` nanoseconds.
fn scaled(number: &str, scale: u128) -> Option<u128> {
    let (whole, frac) = match number.split_once('.') {
        Some((w, f)) => (w, f),
        None => (number, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut value = whole.checked_mul(scale)?;
    let mut place = scale;
    for digit in frac.chars() {
        let d = digit.to_digit(10)? as u128;
        place /= 10;
        if place == 0 {
            break;
        }
        value = value.checked_add(d * place)?;
    }
    Some(value)
}

/// Render a fractional value of `unit` nanoseconds with trailing zeros trimmed.
fn write_fraction(f: &mut fmt::Formatter<'_>, nanos: u128, unit: u128) -> fmt::Result {
    write!(f, "{}", nanos / unit)?;
    let frac = nanos % unit;
    if frac != 0 {
        let width = unit.to_string().len() - 1;
        let digits = format!("{:0width$}", frac, width = width);
        write!(f, ".{}", digits.trim_end_matches('0'))?;
    }
    Ok(())
}

impl fmt::Display for GoDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nanos = self.0.as_nanos();
        if nanos == 0 {
            return write!(f, "0s");
        }
        if nanos < NANOS_PER_MICRO {
            return write!(f, "{}ns", nanos);
        }
        if nanos < NANOS_PER_MILLI {
            write_fraction(f, nanos, NANOS_PER_MICRO)?;
            return write!(f, "µs");
        }
        if nanos < NANOS_PER_SECOND {
            write_fraction(f, nanos, NANOS_PER_MILLI)?;
            return write!(f, "ms");
        }

        let hours = nanos / NANOS_PER_HOUR;
        let minutes = (nanos % NANOS_PER_HOUR) / NANOS_PER_MINUTE;
        let seconds = nanos % NANOS_PER_MINUTE;
        if hours > 0 {
            write!(f, "{}h{}m", hours, minutes)?;
        } else if minutes > 0 {
            write!(f, "{}m", minutes)?;
        }
        write_fraction(f, seconds, NANOS_PER_SECOND)?;
        write!(f, "s")
    }
}

impl Serialize for GoDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GoDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Duration {
        s.parse::<GoDuration>().unwrap().as_duration()
    }

    #[test]
    fn test_parse_units() {
        assert_eq!(parse("1m"), Duration::from_secs(60));
        assert_eq!(parse("1h30m"), Duration::from_secs(5400));
        assert_eq!(parse("500ms"), Duration::from_millis(500));
        assert_eq!(parse("1.5s"), Duration::from_millis(1500));
        assert_eq!(parse("0"), Duration::ZERO);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<GoDuration>().is_err());
        assert!("10".parse::<GoDuration>().is_err());
        assert!("5 days".parse::<GoDuration>().is_err());
        assert!("-1s".parse::<GoDuration>().is_err());
    }

    #[test]
    fn test_parse_rejects_overflow() {
        let near_max = "340000000000000000000000000000000000000ns";
        let err = format!("{}{}", near_max, near_max)
            .parse::<GoDuration>()
            .unwrap_err();
        assert_eq!(err.reason, "out of range");

        assert!(near_max.parse::<GoDuration>().is_err());
        assert!("340000000000000000000000000000000000000h".parse::<GoDuration>().is_err());
        assert!("1.5h340000000000000000000000000000000000000ns".parse::<GoDuration>().is_err());
    }

    #[test]
    fn test_display_canonical() {
        assert_eq!(GoDuration::from_secs(60).to_string(), "1m0s");
        assert_eq!(GoDuration::from_secs(5400).to_string(), "1h30m0s");
        assert_eq!(GoDuration::from_secs(0).to_string(), "0s");
        assert_eq!(
            GoDuration::new(Duration::from_millis(500)).to_string(),
            "500ms"
        );
        assert_eq!(
            GoDuration::new(Duration::from_millis(1500)).to_string(),
            "1.5s"
        );
    }

    #[test]
    fn test_display_parses_back() {
        for raw in ["2h", "45s", "1m30s", "250ms"] {
            let once: GoDuration = raw.parse().unwrap();
            let twice: GoDuration = once.to_string().parse().unwrap();
            assert_eq!(once, twice);
        }
    }
}
