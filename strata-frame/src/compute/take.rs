use std::ops::Range;

use strata_error::{StrataResult, strata_bail};
use strata_scalar::Scalar;

use crate::Column;

/// Gather the values at `indices`.
pub fn take(column: &Column, indices: &[usize]) -> StrataResult<Column> {
    let values = indices
        .iter()
        .map(|&i| match column.get(i) {
            Some(v) => Ok(v.clone()),
            None => strata_bail!("index {} out of bounds for column of length {}", i, column.len()),
        })
        .collect::<StrataResult<Vec<_>>>()?;
    Ok(Column::with_dtype(column.dtype(), values))
}

/// Gather the values at `indices`, producing nulls for missing positions.
pub fn take_opt(column: &Column, indices: &[Option<usize>]) -> Column {
    let values = indices
        .iter()
        .map(|i| {
            i.and_then(|i| column.get(i))
                .cloned()
                .unwrap_or(Scalar::Null)
        })
        .collect();
    Column::with_dtype(column.dtype(), values)
}

/// A zero-copy-in-spirit slice, clamped to the column's length.
pub fn slice(column: &Column, range: Range<usize>) -> Column {
    let end = range.end.min(column.len());
    let start = range.start.min(end);
    Column::with_dtype(column.dtype(), column.values()[start..end].to_vec())
}

/// Keep the values where `mask` is true.
pub fn filter(column: &Column, mask: &[bool]) -> StrataResult<Column> {
    if mask.len() != column.len() {
        strata_bail!(
            "mask.len() is {}, does not equal column.len() of {}",
            mask.len(),
            column.len()
        );
    }
    if mask.iter().all(|m| *m) {
        return Ok(column.clone());
    }
    Ok(Column::with_dtype(
        column.dtype(),
        column
            .iter()
            .zip(mask)
            .filter(|(_, keep)| **keep)
            .map(|(v, _)| v.clone())
            .collect(),
    ))
}

/// Row positions where the mask column holds a truthy value.
pub fn mask_positions(mask: &Column) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter(|(_, v)| v.is_truthy())
        .map(|(i, _)| i)
        .collect()
}
