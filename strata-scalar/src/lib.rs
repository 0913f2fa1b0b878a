//! Single values: cell contents, index labels and division boundaries.

use std::sync::Arc;

use jiff::{SignedDuration, Timestamp};
use strata_dtype::DType;

mod cast;
mod display;
mod label;
mod ops;
mod ord;

pub use label::*;
pub use ops::*;

/// A single logical value.
///
/// Floats never hold NaN: constructing a float scalar from NaN produces [`Scalar::Null`], so the
/// ordering over scalars is total. Integers and floats compare and hash by numeric value, which
/// makes `Scalar::Int(1) == Scalar::Float(1.0)`.
#[derive(Debug, Clone)]
pub enum Scalar {
    /// A missing value
    Null,
    /// A boolean
    Bool(bool),
    /// A 64-bit signed integer
    Int(i64),
    /// A 64-bit float, never NaN
    Float(f64),
    /// A string
    Utf8(Arc<str>),
    /// An instant in time
    Timestamp(Timestamp),
    /// A signed span of time
    Duration(SignedDuration),
    /// An ordered tuple of values, e.g. a multi-column group key
    Tuple(Arc<[Scalar]>),
}

impl Scalar {
    /// Create a float scalar, mapping NaN to null.
    pub fn float(value: f64) -> Self {
        if value.is_nan() {
            Scalar::Null
        } else {
            Scalar::Float(value)
        }
    }

    /// Create a string scalar.
    pub fn utf8<S: AsRef<str>>(value: S) -> Self {
        Scalar::Utf8(Arc::from(value.as_ref()))
    }

    /// Create a tuple scalar.
    pub fn tuple<I: IntoIterator<Item = Scalar>>(values: I) -> Self {
        Scalar::Tuple(values.into_iter().collect())
    }

    /// Create a timestamp from nanoseconds since the Unix epoch.
    pub fn timestamp_nanos(nanos: i64) -> Self {
        Timestamp::from_nanosecond(i128::from(nanos))
            .map(Scalar::Timestamp)
            .unwrap_or(Scalar::Null)
    }

    /// The logical type of this value.
    pub fn dtype(&self) -> DType {
        match self {
            Scalar::Null => DType::Null,
            Scalar::Bool(_) => DType::Bool,
            Scalar::Int(_) => DType::Int64,
            Scalar::Float(_) => DType::Float64,
            Scalar::Utf8(_) => DType::Utf8,
            Scalar::Timestamp(_) => DType::Timestamp,
            Scalar::Duration(_) => DType::Duration,
            Scalar::Tuple(_) => DType::Object,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    pub fn is_valid(&self) -> bool {
        !self.is_null()
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Int(i) => Some(*i),
            Scalar::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// The numeric value of a boolean, integer or float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            Scalar::Bool(b) => Some(f64::from(u8::from(*b))),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Utf8(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Scalar::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<SignedDuration> {
        match self {
            Scalar::Duration(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[Scalar]> {
        match self {
            Scalar::Tuple(t) => Some(t),
            _ => None,
        }
    }

    /// Whether this value is truthy when used as a row mask. Nulls are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Scalar::Null => false,
            Scalar::Bool(b) => *b,
            Scalar::Int(i) => *i != 0,
            Scalar::Float(f) => *f != 0.0,
            Scalar::Utf8(s) => !s.is_empty(),
            Scalar::Timestamp(_) => true,
            Scalar::Duration(d) => !d.is_zero(),
            Scalar::Tuple(t) => !t.is_empty(),
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

macro_rules! from_int_for_scalar {
    ($($T:ty),*) => {
        $(impl From<$T> for Scalar {
            fn from(value: $T) -> Self {
                Scalar::Int(i64::from(value))
            }
        })*
    };
}

from_int_for_scalar!(i8, i16, i32, i64, u8, u16, u32);

impl From<usize> for Scalar {
    fn from(value: usize) -> Self {
        i64::try_from(value)
            .map(Scalar::Int)
            .unwrap_or_else(|_| Scalar::float(value as f64))
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::float(value)
    }
}

impl From<f32> for Scalar {
    fn from(value: f32) -> Self {
        Scalar::float(f64::from(value))
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::utf8(value)
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Utf8(Arc::from(value))
    }
}

impl From<Arc<str>> for Scalar {
    fn from(value: Arc<str>) -> Self {
        Scalar::Utf8(value)
    }
}

impl From<Timestamp> for Scalar {
    fn from(value: Timestamp) -> Self {
        Scalar::Timestamp(value)
    }
}

impl From<SignedDuration> for Scalar {
    fn from(value: SignedDuration) -> Self {
        Scalar::Duration(value)
    }
}

impl<T> From<Option<T>> for Scalar
where
    Scalar: From<T>,
{
    fn from(value: Option<T>) -> Self {
        value.map(Scalar::from).unwrap_or(Scalar::Null)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn nan_is_null() {
        assert!(Scalar::from(f64::NAN).is_null());
        assert_eq!(Scalar::from(1.5).dtype(), DType::Float64);
    }

    #[test]
    fn accessors() {
        assert_eq!(Scalar::from(true).as_i64(), Some(1));
        assert_eq!(Scalar::from(3).as_f64(), Some(3.0));
        assert_eq!(Scalar::from("x").as_str(), Some("x"));
        assert_eq!(Scalar::from(None::<i64>), Scalar::Null);
        assert_eq!(
            Scalar::tuple([1.into(), "a".into()]).dtype(),
            DType::Object
        );
    }
}
