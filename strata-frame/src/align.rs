//! Label-based alignment of two indexes.

use hashbrown::HashMap;
use itertools::Itertools;
use strata_scalar::Scalar;

use crate::compute::argsort;
use crate::{Column, Index};
use crate::index::common_name;

/// The result of aligning two indexes: a joined index and, for every row of it, the source row
/// on each side, `None` when that side lacks the label.
#[derive(Debug, Clone)]
pub struct Alignment {
    pub index: Index,
    pub left: Vec<Option<usize>>,
    pub right: Vec<Option<usize>>,
}

fn positions_by_label(index: &Index) -> HashMap<&Scalar, Vec<usize>> {
    let mut map: HashMap<&Scalar, Vec<usize>> = HashMap::with_capacity(index.len());
    for (i, label) in index.labels().iter().enumerate() {
        map.entry(label).or_default().push(i);
    }
    map
}

/// Outer-join two indexes on their labels.
///
/// Equal indexes align row for row. Otherwise the joined labels are sorted, and a label repeated
/// on both sides produces every pairing of its rows.
pub fn align_outer(left: &Index, right: &Index) -> Alignment {
    let name = common_name([left.name(), right.name()]);
    if left.labels() == right.labels() {
        let rows = (0..left.len()).map(Some).collect_vec();
        return Alignment {
            index: left.clone().with_name(name),
            left: rows.clone(),
            right: rows,
        };
    }

    let lpos = positions_by_label(left);
    let rpos = positions_by_label(right);
    let mut labels: Vec<&Scalar> = left.labels().iter().chain(right.labels().iter()).collect();
    labels.sort_by(|a, b| {
        a.is_null().cmp(&b.is_null()).then_with(|| a.cmp(b))
    });
    labels.dedup();

    let mut out_labels = Vec::new();
    let mut lrows = Vec::new();
    let mut rrows = Vec::new();
    let empty = Vec::new();
    for label in labels {
        let l = lpos.get(label).unwrap_or(&empty);
        let r = rpos.get(label).unwrap_or(&empty);
        match (l.is_empty(), r.is_empty()) {
            (false, true) => l.iter().for_each(|&i| {
                out_labels.push(label.clone());
                lrows.push(Some(i));
                rrows.push(None);
            }),
            (true, false) => r.iter().for_each(|&j| {
                out_labels.push(label.clone());
                lrows.push(None);
                rrows.push(Some(j));
            }),
            _ => l.iter().cartesian_product(r.iter()).for_each(|(&i, &j)| {
                out_labels.push(label.clone());
                lrows.push(Some(i));
                rrows.push(Some(j));
            }),
        }
    }
    let dtype = left.dtype().unify(&right.dtype());
    Alignment {
        index: Index::new(name, Column::with_dtype(dtype, out_labels)),
        left: lrows,
        right: rrows,
    }
}

/// For each label of `target`, the first row of `source` carrying it.
pub fn lookup_positions(target: &Index, source: &Index) -> Vec<Option<usize>> {
    if target.labels() == source.labels() {
        return (0..target.len()).map(Some).collect();
    }
    let positions = positions_by_label(source);
    target
        .labels()
        .iter()
        .map(|label| positions.get(label).and_then(|p| p.first().copied()))
        .collect()
}

/// A stable permutation sorting `index` ascending, nulls last.
pub fn sort_permutation(index: &Index) -> Vec<usize> {
    argsort(index.labels())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn outer_join_with_duplicates() {
        let left = Index::from(Column::from(vec![1, 2, 2]));
        let right = Index::from(Column::from(vec![2, 3]));
        let aligned = align_outer(&left, &right);
        assert_eq!(aligned.index.labels(), &Column::from(vec![1, 2, 2, 3]));
        assert_eq!(aligned.left, vec![Some(0), Some(1), Some(2), None]);
        assert_eq!(aligned.right, vec![None, Some(0), Some(0), Some(1)]);
    }

    #[test]
    fn identical_indexes_align_positionally() {
        let idx = Index::from(Column::from(vec![3, 1]));
        let aligned = align_outer(&idx, &idx);
        assert_eq!(aligned.left, vec![Some(0), Some(1)]);
        assert_eq!(aligned.index, idx);
    }

    #[test]
    fn lookup() {
        let target = Index::from(Column::from(vec![5, 7]));
        let source = Index::from(Column::from(vec![7, 5, 5]));
        assert_eq!(lookup_positions(&target, &source), vec![Some(1), Some(0)]);
    }
}
