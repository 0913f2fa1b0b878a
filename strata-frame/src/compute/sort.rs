use std::cmp::Ordering;

use strata_scalar::Scalar;

use crate::Column;

/// Which side of equal values a search lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchSortedSide {
    /// The first position whose value is not less than the needle.
    Left,
    /// The first position whose value is greater than the needle.
    Right,
}

/// Binary search a sorted slice for the position at which `value` would be inserted.
pub fn search_sorted(values: &[Scalar], value: &Scalar, side: SearchSortedSide) -> usize {
    match side {
        SearchSortedSide::Left => values.partition_point(|v| v < value),
        SearchSortedSide::Right => values.partition_point(|v| v <= value),
    }
}

/// Nulls order after every valid value.
fn nulls_last(a: &Scalar, b: &Scalar) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.cmp(b),
    }
}

/// Stable ascending sort permutation, nulls last.
pub fn argsort(column: &Column) -> Vec<usize> {
    let mut positions: Vec<usize> = (0..column.len()).collect();
    let values = column.values();
    positions.sort_by(|&a, &b| nulls_last(&values[a], &values[b]));
    positions
}

/// Stable descending sort permutation, nulls last.
pub fn argsort_descending(column: &Column) -> Vec<usize> {
    let mut positions: Vec<usize> = (0..column.len()).collect();
    let values = column.values();
    positions.sort_by(|&a, &b| match (values[a].is_null(), values[b].is_null()) {
        (false, false) => values[b].cmp(&values[a]),
        _ => nulls_last(&values[a], &values[b]),
    });
    positions
}
