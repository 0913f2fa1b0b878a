use hashbrown::{HashMap, HashSet};
use itertools::Itertools;
use strata_scalar::Scalar;

use crate::Column;
use crate::compute::argsort_descending;

/// Positions of the first occurrence of each distinct value, in order of appearance.
pub fn first_occurrences(column: &Column) -> Vec<usize> {
    let mut seen = HashSet::with_capacity(column.len());
    column
        .iter()
        .enumerate()
        .filter(|(_, v)| seen.insert(*v))
        .map(|(i, _)| i)
        .collect()
}

/// Positions of the first occurrence of each distinct row across `columns`.
pub fn first_occurrences_rows(columns: &[&Column]) -> Vec<usize> {
    let len = columns.first().map(|c| c.len()).unwrap_or(0);
    let mut seen: HashSet<Vec<&Scalar>> = HashSet::with_capacity(len);
    (0..len)
        .filter(|&row| seen.insert(columns.iter().filter_map(|c| c.get(row)).collect()))
        .collect()
}

/// Positions of the `n` largest valid values, largest first. Ties keep their original order.
pub fn nlargest_positions(column: &Column, n: usize) -> Vec<usize> {
    argsort_descending(column)
        .into_iter()
        .filter(|&i| column.values()[i].is_valid())
        .take(n)
        .collect()
}

/// Distinct valid values with their frequencies, most frequent first and ties by value.
pub fn value_counts(column: &Column) -> (Column, Column) {
    let mut counts: HashMap<&Scalar, usize> = HashMap::new();
    for v in column.iter().filter(|v| v.is_valid()) {
        *counts.entry(v).or_default() += 1;
    }
    let (values, counts): (Vec<Scalar>, Vec<Scalar>) = counts
        .into_iter()
        .sorted_by(|(va, ca), (vb, cb)| cb.cmp(ca).then_with(|| va.cmp(vb)))
        .map(|(v, c)| (v.clone(), Scalar::from(c)))
        .unzip();
    (
        Column::with_dtype(column.dtype(), values),
        Column::new(counts),
    )
}
