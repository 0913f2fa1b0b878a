//! Conversions between [`DType`] and Arrow's [`DataType`].

use arrow_schema::{DataType, TimeUnit};
use strata_error::{StrataResult, strata_bail};

use crate::DType;

impl From<DType> for DataType {
    fn from(value: DType) -> Self {
        match value {
            DType::Null => DataType::Null,
            DType::Bool => DataType::Boolean,
            DType::Int64 => DataType::Int64,
            DType::Float64 => DataType::Float64,
            DType::Utf8 | DType::Object => DataType::Utf8,
            DType::Timestamp => DataType::Timestamp(TimeUnit::Nanosecond, Some("UTC".into())),
            DType::Duration => DataType::Duration(TimeUnit::Nanosecond),
        }
    }
}

impl TryFrom<&DataType> for DType {
    type Error = strata_error::StrataError;

    fn try_from(value: &DataType) -> StrataResult<Self> {
        Ok(match value {
            DataType::Null => DType::Null,
            DataType::Boolean => DType::Bool,
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32 => DType::Int64,
            DataType::Float32 | DataType::Float64 => DType::Float64,
            DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => DType::Utf8,
            DataType::Timestamp(..) => DType::Timestamp,
            DataType::Duration(_) => DType::Duration,
            other => strata_bail!("unsupported arrow type {}", other),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrow_round_trip_for_primitive_types() {
        for dt in [DType::Bool, DType::Int64, DType::Float64, DType::Utf8, DType::Duration] {
            let arrow: DataType = dt.into();
            assert_eq!(DType::try_from(&arrow).unwrap(), dt);
        }
        assert!(DType::try_from(&DataType::Binary).unwrap_err().is_invalid_argument());
    }
}
