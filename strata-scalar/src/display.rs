use std::fmt::{Display, Formatter};

use itertools::Itertools;

use crate::Scalar;

impl Display for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Null => write!(f, "null"),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Float(v) if v.fract() == 0.0 && v.abs() < 1e16 => write!(f, "{v:.1}"),
            Scalar::Float(v) => write!(f, "{v}"),
            Scalar::Utf8(s) => write!(f, "{s}"),
            Scalar::Timestamp(t) => write!(f, "{t}"),
            Scalar::Duration(d) => write!(f, "{d}"),
            Scalar::Tuple(values) => write!(f, "({})", values.iter().format(", ")),
        }
    }
}
