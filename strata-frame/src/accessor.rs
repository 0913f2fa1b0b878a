use jiff::tz::TimeZone;
use strata_dtype::DType;
use strata_error::{StrataResult, strata_bail};
use strata_scalar::Scalar;

use crate::Series;

/// String methods of a [`Series`], applied to each value.
pub struct StringAccessor<'a> {
    series: &'a Series,
}

/// Date-time methods of a [`Series`] of timestamps, evaluated in UTC.
pub struct DatetimeAccessor<'a> {
    series: &'a Series,
}

impl Series {
    /// String methods. Fails unless the series holds strings.
    pub fn str(&self) -> StrataResult<StringAccessor<'_>> {
        if !matches!(self.dtype(), DType::Utf8 | DType::Null) {
            strata_bail!(TypeMismatch: "can only use .str with string values, not {}", self.dtype());
        }
        Ok(StringAccessor { series: self })
    }

    /// Date-time methods. Fails unless the series holds timestamps.
    pub fn dt(&self) -> StrataResult<DatetimeAccessor<'_>> {
        if !matches!(self.dtype(), DType::Timestamp | DType::Null) {
            strata_bail!(
                TypeMismatch: "can only use .dt with timestamp values, not {}",
                self.dtype()
            );
        }
        Ok(DatetimeAccessor { series: self })
    }
}

impl StringAccessor<'_> {
    fn apply<F: Fn(&str) -> Scalar>(&self, f: F) -> StrataResult<Series> {
        self.series.map(|v| {
            Ok(match v.as_str() {
                Some(s) => f(s),
                None => Scalar::Null,
            })
        })
    }

    pub fn upper(&self) -> StrataResult<Series> {
        self.apply(|s| Scalar::from(s.to_uppercase()))
    }

    pub fn lower(&self) -> StrataResult<Series> {
        self.apply(|s| Scalar::from(s.to_lowercase()))
    }

    /// Length in characters.
    pub fn len(&self) -> StrataResult<Series> {
        self.apply(|s| Scalar::from(s.chars().count()))
    }
}

impl DatetimeAccessor<'_> {
    fn apply<F: Fn(jiff::Zoned) -> StrataResult<Scalar>>(&self, f: F) -> StrataResult<Series> {
        self.series.map(|v| match v.as_timestamp() {
            Some(t) => f(t.to_zoned(TimeZone::UTC)),
            None => Ok(Scalar::Null),
        })
    }

    pub fn year(&self) -> StrataResult<Series> {
        self.apply(|z| Ok(Scalar::from(z.year())))
    }

    pub fn month(&self) -> StrataResult<Series> {
        self.apply(|z| Ok(Scalar::from(z.month())))
    }

    pub fn day(&self) -> StrataResult<Series> {
        self.apply(|z| Ok(Scalar::from(z.day())))
    }

    /// The timestamp truncated to midnight.
    pub fn date(&self) -> StrataResult<Series> {
        self.apply(|z| Ok(Scalar::Timestamp(z.date().to_zoned(TimeZone::UTC)?.timestamp())))
    }
}

#[cfg(test)]
mod test {
    use jiff::Timestamp;

    use crate::{Column, Series};
    use strata_scalar::Scalar;

    #[test]
    fn strings() {
        let s = Series::new(
            Some("s".into()),
            Column::new(vec!["Ab".into(), Scalar::Null]),
        );
        assert_eq!(
            s.str().unwrap().upper().unwrap().values(),
            &Column::new(vec!["AB".into(), Scalar::Null])
        );
        assert_eq!(s.str().unwrap().len().unwrap().values().get(0), Some(&2.into()));
        assert!(Series::new(None, Column::from(vec![1])).str().is_err());
    }

    #[test]
    fn datetimes() {
        let ts: Timestamp = "2001-02-03T04:05:06Z".parse().unwrap();
        let s = Series::new(None, Column::new(vec![Scalar::Timestamp(ts)]));
        let dt = s.dt().unwrap();
        assert_eq!(dt.year().unwrap().values(), &Column::from(vec![2001]));
        assert_eq!(dt.month().unwrap().values(), &Column::from(vec![2]));
        assert_eq!(dt.day().unwrap().values(), &Column::from(vec![3]));
        let midnight: Timestamp = "2001-02-03T00:00:00Z".parse().unwrap();
        assert_eq!(
            dt.date().unwrap().values(),
            &Column::new(vec![Scalar::Timestamp(midnight)])
        );
    }
}
