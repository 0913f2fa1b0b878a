//! Splitting one frame into several by row key, the local half of a shuffle.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;
use strata_error::{StrataResult, strata_bail};
use strata_scalar::Scalar;

use crate::compute::{SearchSortedSide, search_sorted};
use crate::groupby::GroupKeys;
use crate::{Column, Frame};

fn hash_key(columns: &[&Column], row: usize) -> u64 {
    let mut hasher = FxHasher::default();
    for column in columns {
        column.values()[row].hash(&mut hasher);
    }
    hasher.finish()
}

/// The output partition of each row when hashing `keys` into `npartitions` buckets.
///
/// Equal keys always land in the same bucket, whatever frame they come from.
pub fn hash_assignments(keys: &[&Column], npartitions: usize) -> StrataResult<Vec<usize>> {
    if npartitions == 0 {
        strata_bail!("cannot hash rows into zero partitions");
    }
    let len = keys.first().map(|c| c.len()).unwrap_or(0);
    let buckets = npartitions as u64;
    Ok((0..len)
        .map(|row| {
            #[allow(clippy::cast_possible_truncation)]
            let bucket = (hash_key(keys, row) % buckets) as usize;
            bucket
        })
        .collect())
}

/// The output partition of each label for the boundaries `divisions`.
///
/// Partition `j` receives labels in `(divisions[j], divisions[j + 1]]`, the first partition also
/// takes `divisions[0]` itself. Labels outside the range go to the nearest edge partition and
/// nulls go last.
pub fn division_assignments(labels: &Column, divisions: &[Scalar]) -> StrataResult<Vec<usize>> {
    if divisions.len() < 2 {
        strata_bail!("at least two divisions are required, got {}", divisions.len());
    }
    let last = divisions.len() - 2;
    let uppers = &divisions[1..];
    Ok(labels
        .iter()
        .map(|label| {
            if label.is_null() {
                last
            } else {
                search_sorted(uppers, label, SearchSortedSide::Left).min(last)
            }
        })
        .collect())
}

/// Split `frame` into `npartitions` frames by bucket assignment, preserving row order.
pub fn split_by_assignment(
    frame: &Frame,
    assignments: &[usize],
    npartitions: usize,
) -> StrataResult<Vec<Frame>> {
    let mut rows = vec![Vec::new(); npartitions];
    for (row, &bucket) in assignments.iter().enumerate() {
        match rows.get_mut(bucket) {
            Some(r) => r.push(row),
            None => strata_bail!("bucket {} out of range for {} partitions", bucket, npartitions),
        }
    }
    log::trace!(
        "split {} rows into {} partitions",
        assignments.len(),
        npartitions
    );
    rows.iter().map(|r| frame.take(r)).collect()
}

impl Frame {
    /// Split rows by the hash of their group key.
    pub fn partition_by_hash(&self, keys: &GroupKeys, npartitions: usize) -> StrataResult<Vec<Frame>> {
        let columns = keys.columns().iter().collect::<Vec<_>>();
        let assignments = hash_assignments(&columns, npartitions)?;
        split_by_assignment(self, &assignments, npartitions)
    }

    /// Split rows by where their index label falls within `divisions`.
    pub fn partition_by_divisions(&self, divisions: &[Scalar]) -> StrataResult<Vec<Frame>> {
        let assignments = division_assignments(self.index().labels(), divisions)?;
        split_by_assignment(self, &assignments, divisions.len() - 1)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Index;

    #[test]
    fn boundaries_are_upper_inclusive() {
        let labels = Column::new(vec![
            0.into(),
            2.into(),
            3.into(),
            9.into(),
            12.into(),
            (-1).into(),
            Scalar::Null,
        ]);
        let divisions: Vec<Scalar> = vec![0.into(), 2.into(), 9.into()];
        assert_eq!(
            division_assignments(&labels, &divisions).unwrap(),
            vec![0, 0, 1, 1, 1, 0, 1]
        );
    }

    #[test]
    fn hash_is_stable_across_frames() {
        let a = Column::from(vec![1, 2, 3, 1]);
        let assigned = hash_assignments(&[&a], 4).unwrap();
        assert_eq!(assigned[0], assigned[3]);
        let b = Column::from(vec![3]);
        assert_eq!(hash_assignments(&[&b], 4).unwrap()[0], assigned[2]);
    }

    #[test]
    fn split_frame() {
        let frame = Frame::from_columns([("x", Column::from(vec![1, 2, 3]))])
            .unwrap()
            .with_index(Index::from(Column::from(vec![1, 5, 9])))
            .unwrap();
        let parts = frame
            .partition_by_divisions(&[0.into(), 5.into(), 9.into()])
            .unwrap();
        assert_eq!(parts[0].len(), 2);
        assert_eq!(parts[1].len(), 1);
    }
}
