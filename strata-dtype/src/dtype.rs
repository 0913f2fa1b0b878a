use std::fmt::{Display, Formatter};

/// The logical type of a column, index or scalar.
///
/// All types are implicitly nullable. `Object` holds values of mixed types, including tuples
/// produced by multi-key group labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DType {
    /// Only null values
    Null,
    /// Booleans
    Bool,
    /// 64-bit signed integers
    Int64,
    /// 64-bit IEEE floats, NaN is treated as null
    Float64,
    /// UTF-8 strings
    Utf8,
    /// Instants in time with nanosecond precision
    Timestamp,
    /// Signed spans of time with nanosecond precision
    Duration,
    /// Anything else, including values of mixed types
    Object,
}

impl DType {
    /// Check if the type is a number (integer or float).
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int64 | Self::Float64)
    }

    /// Check if the type is an integer.
    pub fn is_int(&self) -> bool {
        matches!(self, Self::Int64)
    }

    /// Check if the type is a float.
    pub fn is_float(&self) -> bool {
        matches!(self, Self::Float64)
    }

    /// Check if the type is a boolean.
    pub fn is_boolean(&self) -> bool {
        matches!(self, Self::Bool)
    }

    /// Check if the type is a timestamp or a duration.
    pub fn is_temporal(&self) -> bool {
        matches!(self, Self::Timestamp | Self::Duration)
    }

    /// Check if the type is a string.
    pub fn is_utf8(&self) -> bool {
        matches!(self, Self::Utf8)
    }

    /// Whether a sum over values of this type is meaningful.
    ///
    /// Booleans sum as integers, durations sum to a duration.
    pub fn is_summable(&self) -> bool {
        matches!(
            self,
            Self::Null | Self::Bool | Self::Int64 | Self::Float64 | Self::Duration
        )
    }

    /// Whether mean, variance and standard deviation are meaningful for this type.
    pub fn is_moment_compatible(&self) -> bool {
        matches!(self, Self::Null | Self::Bool | Self::Int64 | Self::Float64)
    }

    /// The narrowest type able to hold values of both `self` and `other`.
    ///
    /// Nulls fit into any type, integers widen to floats and everything else falls back
    /// to [`DType::Object`].
    pub fn unify(&self, other: &DType) -> DType {
        use DType::*;
        match (self, other) {
            (a, b) if a == b => *a,
            (Null, t) | (t, Null) => *t,
            (Int64, Float64) | (Float64, Int64) => Float64,
            (Bool, Int64) | (Int64, Bool) => Int64,
            (Bool, Float64) | (Float64, Bool) => Float64,
            _ => Object,
        }
    }
}

impl Display for DType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use DType::*;
        match self {
            Null => write!(f, "null"),
            Bool => write!(f, "bool"),
            Int64 => write!(f, "int64"),
            Float64 => write!(f, "float64"),
            Utf8 => write!(f, "utf8"),
            Timestamp => write!(f, "timestamp[ns]"),
            Duration => write!(f, "duration[ns]"),
            Object => write!(f, "object"),
        }
    }
}
