use jiff::SignedDuration;
use strata_dtype::DType;
use strata_error::{StrataResult, strata_bail};

use crate::{Scalar, parse_timestamp_range};

impl Scalar {
    /// Convert the value to `target`. Nulls cast to any type.
    pub fn cast(&self, target: DType) -> StrataResult<Scalar> {
        if self.is_null() || target == DType::Object || self.dtype() == target {
            return Ok(self.clone());
        }

        Ok(match (self, target) {
            (_, DType::Null) => Scalar::Null,
            (_, DType::Utf8) => Scalar::from(self.to_string()),
            (Scalar::Int(i), DType::Bool) => Scalar::Bool(*i != 0),
            (Scalar::Float(f), DType::Bool) => Scalar::Bool(*f != 0.0),
            (Scalar::Utf8(s), DType::Bool) => match s.to_ascii_lowercase().as_str() {
                "true" => Scalar::Bool(true),
                "false" => Scalar::Bool(false),
                _ => strata_bail!("cannot cast '{}' to bool", s),
            },
            (Scalar::Bool(b), DType::Int64) => Scalar::Int(i64::from(*b)),
            (Scalar::Float(f), DType::Int64) => {
                if !f.is_finite() || *f >= i64::MAX as f64 || *f < i64::MIN as f64 {
                    strata_bail!("cannot cast {} to int64", f);
                }
                #[allow(clippy::cast_possible_truncation)]
                let truncated = f.trunc() as i64;
                Scalar::Int(truncated)
            }
            (Scalar::Utf8(s), DType::Int64) => match s.trim().parse::<i64>() {
                Ok(i) => Scalar::Int(i),
                Err(_) => strata_bail!("cannot cast '{}' to int64", s),
            },
            (Scalar::Timestamp(t), DType::Int64) => {
                Scalar::Int(i64::try_from(t.as_nanosecond()).unwrap_or(i64::MAX))
            }
            (Scalar::Duration(d), DType::Int64) => {
                Scalar::Int(i64::try_from(d.as_nanos()).unwrap_or(i64::MAX))
            }
            (Scalar::Bool(_) | Scalar::Int(_), DType::Float64) => {
                Scalar::float(self.as_f64().unwrap_or(f64::NAN))
            }
            (Scalar::Utf8(s), DType::Float64) => match s.trim().parse::<f64>() {
                Ok(f) => Scalar::float(f),
                Err(_) => strata_bail!("cannot cast '{}' to float64", s),
            },
            (Scalar::Int(i), DType::Timestamp) => Scalar::timestamp_nanos(*i),
            (Scalar::Utf8(s), DType::Timestamp) => Scalar::Timestamp(parse_timestamp_range(s)?.0),
            (Scalar::Int(i), DType::Duration) => Scalar::Duration(SignedDuration::from_nanos(*i)),
            (Scalar::Utf8(s), DType::Duration) => Scalar::Duration(s.parse::<SignedDuration>()?),
            (value, target) => strata_bail!(
                TypeMismatch: "cannot cast {} of type {} to {}",
                value,
                value.dtype(),
                target
            ),
        })
    }
}
