//! Conversion between [`Frame`]s and Arrow [`RecordBatch`]es.
//!
//! The index travels as the leading column, named after the index or [`INDEX_COLUMN`].

use std::sync::Arc;

use arrow_array::cast::AsArray;
use arrow_array::types::{
    DurationMicrosecondType, DurationMillisecondType, DurationNanosecondType,
    DurationSecondType, Float32Type, Float64Type, Int8Type, Int16Type, Int32Type, Int64Type,
    TimestampMicrosecondType, TimestampMillisecondType, TimestampNanosecondType,
    TimestampSecondType, UInt8Type, UInt16Type, UInt32Type,
};
use arrow_array::{
    Array, ArrayRef, BooleanArray, DurationNanosecondArray, Float64Array, Int64Array, NullArray,
    RecordBatch, StringArray, TimestampNanosecondArray,
};
use arrow_schema::{DataType, Field, Schema, TimeUnit};
use itertools::Itertools;
use jiff::SignedDuration;
use strata_dtype::{DType, FieldName};
use strata_error::{StrataResult, strata_bail, strata_err};
use strata_scalar::Scalar;

use crate::{Column, Frame, Index};

/// Name of the index column when the index is unnamed.
pub const INDEX_COLUMN: &str = "__index__";

fn nanos(v: &Scalar) -> Option<i64> {
    match v {
        Scalar::Timestamp(t) => i64::try_from(t.as_nanosecond()).ok(),
        Scalar::Duration(d) => i64::try_from(d.as_nanos()).ok(),
        _ => None,
    }
}

/// Convert a column to an Arrow array of the matching type. Objects become strings.
pub fn column_to_arrow(column: &Column) -> ArrayRef {
    match column.dtype() {
        DType::Null => Arc::new(NullArray::new(column.len())),
        DType::Bool => Arc::new(BooleanArray::from(
            column.iter().map(Scalar::as_bool).collect_vec(),
        )),
        DType::Int64 => Arc::new(Int64Array::from(
            column.iter().map(Scalar::as_i64).collect_vec(),
        )),
        DType::Float64 => Arc::new(Float64Array::from(
            column.iter().map(Scalar::as_f64).collect_vec(),
        )),
        DType::Timestamp => Arc::new(
            TimestampNanosecondArray::from(column.iter().map(nanos).collect_vec())
                .with_timezone("UTC"),
        ),
        DType::Duration => Arc::new(DurationNanosecondArray::from(
            column.iter().map(nanos).collect_vec(),
        )),
        DType::Utf8 | DType::Object => Arc::new(StringArray::from(
            column
                .iter()
                .map(|v| v.is_valid().then(|| v.to_string()))
                .collect_vec(),
        )),
    }
}

macro_rules! read_primitive {
    ($array:expr, $ty:ty, $f:expr) => {{
        let typed = $array.as_primitive::<$ty>();
        (0..typed.len())
            .map(|i| {
                if typed.is_null(i) {
                    Ok(Scalar::Null)
                } else {
                    $f(typed.value(i))
                }
            })
            .collect::<StrataResult<Vec<Scalar>>>()?
    }};
}

fn int(v: impl Into<i64>) -> StrataResult<Scalar> {
    Ok(Scalar::Int(v.into()))
}

fn timestamp(v: i64, per_unit: i64) -> StrataResult<Scalar> {
    let ns = i128::from(v) * i128::from(per_unit);
    Ok(Scalar::Timestamp(jiff::Timestamp::from_nanosecond(ns)?))
}

fn duration(v: i64, per_unit: i64) -> StrataResult<Scalar> {
    v.checked_mul(per_unit)
        .map(|ns| Scalar::Duration(SignedDuration::from_nanos(ns)))
        .ok_or_else(|| strata_err!(ComputeError: "duration {} overflows", v))
}

/// Convert an Arrow array to a column.
pub fn column_from_arrow(array: &dyn Array) -> StrataResult<Column> {
    let dtype = DType::try_from(array.data_type())?;
    let values: Vec<Scalar> = match array.data_type() {
        DataType::Null => vec![Scalar::Null; array.len()],
        DataType::Boolean => {
            let typed = array.as_boolean();
            (0..typed.len())
                .map(|i| (!typed.is_null(i)).then(|| typed.value(i)).into())
                .collect()
        }
        DataType::Int8 => read_primitive!(array, Int8Type, int),
        DataType::Int16 => read_primitive!(array, Int16Type, int),
        DataType::Int32 => read_primitive!(array, Int32Type, int),
        DataType::Int64 => read_primitive!(array, Int64Type, int),
        DataType::UInt8 => read_primitive!(array, UInt8Type, int),
        DataType::UInt16 => read_primitive!(array, UInt16Type, int),
        DataType::UInt32 => read_primitive!(array, UInt32Type, int),
        DataType::Float32 => read_primitive!(array, Float32Type, |v: f32| Ok(Scalar::from(v))),
        DataType::Float64 => read_primitive!(array, Float64Type, |v: f64| Ok(Scalar::from(v))),
        DataType::Utf8 => {
            let typed = array.as_string::<i32>();
            typed.iter().map(|v| v.map(Scalar::from).into()).collect()
        }
        DataType::LargeUtf8 => {
            let typed = array.as_string::<i64>();
            typed.iter().map(|v| v.map(Scalar::from).into()).collect()
        }
        DataType::Utf8View => {
            let typed = array.as_string_view();
            typed.iter().map(|v| v.map(Scalar::from).into()).collect()
        }
        DataType::Timestamp(unit, _) => match unit {
            TimeUnit::Second => {
                read_primitive!(array, TimestampSecondType, |v| timestamp(v, 1_000_000_000))
            }
            TimeUnit::Millisecond => {
                read_primitive!(array, TimestampMillisecondType, |v| timestamp(v, 1_000_000))
            }
            TimeUnit::Microsecond => {
                read_primitive!(array, TimestampMicrosecondType, |v| timestamp(v, 1_000))
            }
            TimeUnit::Nanosecond => {
                read_primitive!(array, TimestampNanosecondType, |v| timestamp(v, 1))
            }
        },
        DataType::Duration(unit) => match unit {
            TimeUnit::Second => {
                read_primitive!(array, DurationSecondType, |v| duration(v, 1_000_000_000))
            }
            TimeUnit::Millisecond => {
                read_primitive!(array, DurationMillisecondType, |v| duration(v, 1_000_000))
            }
            TimeUnit::Microsecond => {
                read_primitive!(array, DurationMicrosecondType, |v| duration(v, 1_000))
            }
            TimeUnit::Nanosecond => {
                read_primitive!(array, DurationNanosecondType, |v| duration(v, 1))
            }
        },
        other => strata_bail!("unsupported arrow type {}", other),
    };
    Ok(Column::with_dtype(dtype, values))
}

impl Frame {
    /// Convert to a record batch whose first column holds the index.
    pub fn to_record_batch(&self) -> StrataResult<RecordBatch> {
        let index_name = self
            .index()
            .name()
            .map(|n| n.to_string())
            .unwrap_or_else(|| INDEX_COLUMN.to_string());
        let mut fields = vec![Field::new(
            index_name,
            DataType::from(self.index().dtype()),
            true,
        )];
        let mut arrays = vec![column_to_arrow(self.index().labels())];
        for (name, column) in self.names().iter().zip(self.columns()) {
            fields.push(Field::new(name.as_ref(), DataType::from(column.dtype()), true));
            arrays.push(column_to_arrow(column));
        }
        Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
    }

    /// Convert from a record batch, taking the index from the column named `index`, if any.
    ///
    /// An index column named [`INDEX_COLUMN`] becomes an unnamed index.
    pub fn from_record_batch(batch: &RecordBatch, index: Option<&str>) -> StrataResult<Frame> {
        let schema = batch.schema();
        let mut names = Vec::new();
        let mut columns = Vec::new();
        let mut labels = None;
        for (field, array) in schema.fields().iter().zip(batch.columns()) {
            let column = column_from_arrow(array.as_ref())?;
            if Some(field.name().as_str()) == index {
                labels = Some((field.name().clone(), column));
            } else {
                names.push(FieldName::from(field.name().as_str()));
                columns.push(column);
            }
        }
        let index = match (labels, index) {
            (Some((name, labels)), _) => {
                let name = (name != INDEX_COLUMN).then(|| FieldName::from(name.as_str()));
                Index::new(name, labels)
            }
            (None, Some(missing)) => {
                strata_bail!(NotFound: "index column '{}' not found in record batch", missing)
            }
            (None, None) => Index::range(batch.num_rows()),
        };
        Frame::try_new(index, names, columns)
    }
}

#[cfg(test)]
mod test {
    use arrow_array::Int32Array;

    use super::*;

    fn frame() -> Frame {
        Frame::from_columns([
            ("i", Column::new(vec![1.into(), Scalar::Null])),
            ("f", Column::from(vec![1.5, 2.5])),
            ("s", Column::from(vec!["a", "b"])),
            ("t", Column::new(vec![Scalar::timestamp_nanos(5), Scalar::Null])),
        ])
        .unwrap()
    }

    #[test]
    fn record_batch_round_trip() {
        let frame = frame();
        let batch = frame.to_record_batch().unwrap();
        assert_eq!(batch.num_columns(), 5);
        assert_eq!(batch.schema().field(0).name(), INDEX_COLUMN);
        let back = Frame::from_record_batch(&batch, Some(INDEX_COLUMN)).unwrap();
        assert_eq!(back, frame);
        assert_eq!(back.dtypes(), frame.dtypes());
    }

    #[test]
    fn narrow_ints_widen() {
        let column = column_from_arrow(&Int32Array::from(vec![Some(3), None])).unwrap();
        assert_eq!(column.dtype(), DType::Int64);
        assert_eq!(column, Column::new(vec![3.into(), Scalar::Null]));
    }

    #[test]
    fn missing_index_column() {
        let batch = frame().to_record_batch().unwrap();
        assert!(
            Frame::from_record_batch(&batch, Some("nope"))
                .unwrap_err()
                .is_not_found()
        );
    }
}
