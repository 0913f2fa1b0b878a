//! Coercion of user supplied labels onto an index's type.

use jiff::civil::{Date, DateTime};
use jiff::tz::TimeZone;
use jiff::{Span, Timestamp};
use strata_dtype::DType;
use strata_error::{StrataResult, strata_bail, strata_err};

use crate::Scalar;

/// Which end of a range a label bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelBound {
    /// Start of a slice. Partial dates resolve to the first instant of their period.
    Lower,
    /// End of a slice. Partial dates resolve to the last instant of their period.
    Upper,
}

/// The resolution a date string was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateResolution {
    Year,
    Month,
    Day,
    /// A full date-time, naming a single instant.
    Exact,
}

fn date_start(date: Date) -> StrataResult<Timestamp> {
    Ok(date.to_zoned(TimeZone::UTC)?.timestamp())
}

fn parse_part<T: std::str::FromStr>(s: &str, part: &str) -> StrataResult<T> {
    part.parse::<T>()
        .map_err(|_| strata_err!("cannot parse '{}' as a date", s))
}

/// Parse a possibly partial date string into the inclusive range of instants it covers.
///
/// `"2000"` covers the whole year, `"2000-03"` the month and `"2000-03-04"` the day.
/// Full date-times, with or without an offset, name a single instant.
pub fn parse_timestamp_range(s: &str) -> StrataResult<(Timestamp, Timestamp, DateResolution)> {
    let s = s.trim();
    if s.contains(['T', ' ', ':']) {
        let ts = match s.parse::<Timestamp>() {
            Ok(ts) => ts,
            Err(_) => s.parse::<DateTime>()?.to_zoned(TimeZone::UTC)?.timestamp(),
        };
        return Ok((ts, ts, DateResolution::Exact));
    }

    let parts: Vec<&str> = s.split('-').collect();
    let (start, period, resolution) = match parts.as_slice() {
        [y] => (
            Date::new(parse_part(s, y)?, 1, 1)?,
            Span::new().years(1),
            DateResolution::Year,
        ),
        [y, m] => (
            Date::new(parse_part(s, y)?, parse_part(s, m)?, 1)?,
            Span::new().months(1),
            DateResolution::Month,
        ),
        [y, m, d] => (
            Date::new(parse_part(s, y)?, parse_part(s, m)?, parse_part(s, d)?)?,
            Span::new().days(1),
            DateResolution::Day,
        ),
        _ => strata_bail!("cannot parse '{}' as a date", s),
    };
    let lo = date_start(start)?;
    let next = date_start(start.checked_add(period)?)?;
    let hi = Timestamp::from_nanosecond(next.as_nanosecond() - 1)?;
    Ok((lo, hi, resolution))
}

impl Scalar {
    /// Convert a label so it can be compared against an index of type `target`.
    ///
    /// Strings are parsed when the index holds timestamps, integral floats become integers on an
    /// integer index. With no `bound` a partial date resolves to its first instant.
    pub fn coerce_label(&self, target: DType, bound: Option<LabelBound>) -> StrataResult<Scalar> {
        match (self, target) {
            (Scalar::Null, _) | (_, DType::Object | DType::Null) => Ok(self.clone()),
            (Scalar::Utf8(s), DType::Timestamp) => {
                let (lo, hi, _) = parse_timestamp_range(s)?;
                Ok(Scalar::Timestamp(match bound {
                    Some(LabelBound::Upper) => hi,
                    _ => lo,
                }))
            }
            (Scalar::Int(nanos), DType::Timestamp) => Ok(Scalar::timestamp_nanos(*nanos)),
            (Scalar::Utf8(s), DType::Duration) => Ok(Scalar::Duration(s.parse()?)),
            (value, target) if value.dtype() == target => Ok(value.clone()),
            (Scalar::Int(_) | Scalar::Float(_) | Scalar::Bool(_), t) if t.is_numeric() => {
                Ok(self.clone())
            }
            (value, target) => strata_bail!(
                TypeMismatch: "cannot compare label {} of type {} with an index of type {}",
                value,
                value.dtype(),
                target
            ),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    #[test]
    fn month_range() {
        let (lo, hi, res) = parse_timestamp_range("2000-02").unwrap();
        assert_eq!(res, DateResolution::Month);
        assert_eq!(lo, ts("2000-02-01T00:00:00Z"));
        assert_eq!(hi.as_nanosecond() + 1, ts("2000-03-01T00:00:00Z").as_nanosecond());
    }

    #[test]
    fn exact_datetime() {
        let (lo, hi, res) = parse_timestamp_range("2000-01-05 10:30:00").unwrap();
        assert_eq!(res, DateResolution::Exact);
        assert_eq!(lo, hi);
        assert_eq!(lo, ts("2000-01-05T10:30:00Z"));
    }

    #[test]
    fn coerce_partial_dates() {
        let label = Scalar::from("2001");
        let lo = label.coerce_label(DType::Timestamp, Some(LabelBound::Lower)).unwrap();
        let hi = label.coerce_label(DType::Timestamp, Some(LabelBound::Upper)).unwrap();
        assert_eq!(lo, Scalar::Timestamp(ts("2001-01-01T00:00:00Z")));
        assert!(hi > Scalar::Timestamp(ts("2001-12-31T23:59:59Z")));
        assert!(hi < Scalar::Timestamp(ts("2002-01-01T00:00:00Z")));
    }

    #[test]
    fn coerce_mismatch() {
        assert!(
            Scalar::from("a")
                .coerce_label(DType::Int64, None)
                .unwrap_err()
                .is_type_mismatch()
        );
        assert_eq!(
            Scalar::from(2.0).coerce_label(DType::Int64, None).unwrap(),
            Scalar::from(2)
        );
    }
}
