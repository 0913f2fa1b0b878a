//! Reconciling the divisions of collections combined partition by partition.

use itertools::Itertools;
use strata_error::{StrataResult, strata_bail};
use strata_scalar::Scalar;

use crate::collection::Collection;
use crate::divisions::Divisions;
use crate::repartition::repartition;

/// The result of merging two division lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergedDivisions {
    /// The sorted union of both lists' boundaries within their common range.
    Overlap(Vec<Scalar>),
    /// The ranges share no label.
    Disjoint,
}

/// The unique sorted union of the boundaries of `a` and `b`, restricted to
/// `[max(a[0], b[0]), min(a[-1], b[-1])]`.
///
/// A trailing repeated boundary common to both inputs is kept, so merging a list with itself
/// returns it unchanged.
pub fn align_divisions(a: &[Scalar], b: &[Scalar]) -> StrataResult<MergedDivisions> {
    let (Some(a0), Some(an), Some(b0), Some(bn)) = (a.first(), a.last(), b.first(), b.last()) else {
        strata_bail!("cannot align empty divisions");
    };
    let lower = a0.max(b0);
    let upper = an.min(bn);
    if lower > upper {
        return Ok(MergedDivisions::Disjoint);
    }
    let mut merged = a
        .iter()
        .chain(b.iter())
        .filter(|d| *d >= lower && *d <= upper)
        .sorted()
        .dedup()
        .cloned()
        .collect_vec();
    if merged.len() == 1 {
        // a single shared label, e.g. [0, 5] against [5, 9]
        merged.push(upper.clone());
    } else if ends_repeated(a) && ends_repeated(b) && an == bn && merged.last() == Some(an) {
        merged.push(an.clone());
    }
    Ok(MergedDivisions::Overlap(merged))
}

fn ends_repeated(divisions: &[Scalar]) -> bool {
    divisions.len() >= 2 && divisions[divisions.len() - 1] == divisions[divisions.len() - 2]
}

/// The full sorted union of every boundary, spanning all inputs.
fn union_divisions(lists: &[&[Scalar]]) -> Vec<Scalar> {
    let mut union = lists
        .iter()
        .flat_map(|l| l.iter())
        .sorted()
        .dedup()
        .cloned()
        .collect_vec();
    if union.len() == 1 {
        union.push(union[0].clone());
    }
    union
}

/// Bring `inputs` onto common divisions so they can be combined partition by partition.
///
/// Inputs that already share divisions are returned as they are. Known but different divisions
/// are merged into the union of all boundaries, not only those within the common range of
/// [`align_divisions`], and every input is repartitioned onto it. Each input gains empty
/// partitions where it has no rows, so the combination is an outer join on the labels and
/// disjoint inputs keep all of their rows. Inputs with unknown divisions must have identical
/// divisions already.
pub fn align_collections(inputs: &[&Collection]) -> StrataResult<Vec<Collection>> {
    let Some(first) = inputs.first() else {
        return Ok(Vec::new());
    };
    if inputs.iter().all(|c| c.divisions() == first.divisions()) {
        return Ok(inputs.iter().map(|c| (*c).clone()).collect());
    }
    let known: Option<Vec<&[Scalar]>> = inputs.iter().map(|c| c.divisions().values()).collect();
    let Some(known) = known else {
        strata_bail!(
            "not all divisions are known and they differ: {}; repartition or set the index first",
            inputs.iter().map(|c| c.divisions()).join(" vs ")
        );
    };
    let target = union_divisions(&known);
    let overlap = known
        .iter()
        .tuple_windows()
        .map(|(a, b)| align_divisions(a, b))
        .fold_ok(true, |all, merged| all && merged != MergedDivisions::Disjoint)?;
    log::debug!(
        "aligning {} collections onto {} partitions, ranges {}",
        inputs.len(),
        target.len() - 1,
        if overlap { "overlap" } else { "are disjoint" }
    );
    inputs
        .iter()
        .map(|c| {
            if c.divisions().values() == Some(target.as_slice()) {
                Ok((*c).clone())
            } else {
                repartition(c, &target, true)
            }
        })
        .collect()
}

/// Whether `a` and `b` can be combined partition-wise without moving rows.
pub fn are_aligned(a: &Divisions, b: &Divisions) -> bool {
    a == b
}

#[cfg(test)]
mod test {
    use rstest::rstest;

    use super::*;

    fn divs(values: &[i64]) -> Vec<Scalar> {
        values.iter().map(|&v| Scalar::from(v)).collect()
    }

    #[rstest]
    #[case(&[0, 4, 9, 9])]
    #[case(&[1, 3, 7])]
    #[case(&[0, 0])]
    fn self_merge_is_identity(#[case] values: &[i64]) {
        let d = divs(values);
        assert_eq!(align_divisions(&d, &d).unwrap(), MergedDivisions::Overlap(d));
    }

    #[rstest]
    #[case(&[1, 3, 7], &[1, 4, 6, 7], &[1, 3, 4, 6, 7])]
    #[case(&[0, 5, 10], &[2, 8, 20], &[2, 5, 8, 10])]
    #[case(&[0, 5], &[5, 9], &[5, 5])]
    fn union_within_overlap(#[case] a: &[i64], #[case] b: &[i64], #[case] expected: &[i64]) {
        assert_eq!(
            align_divisions(&divs(a), &divs(b)).unwrap(),
            MergedDivisions::Overlap(divs(expected))
        );
    }

    #[test]
    fn disjoint() {
        assert_eq!(
            align_divisions(&divs(&[0, 3]), &divs(&[5, 9])).unwrap(),
            MergedDivisions::Disjoint
        );
    }

    #[test]
    fn union_spans_everything() {
        assert_eq!(
            union_divisions(&[&divs(&[0, 3]), &divs(&[5, 9])]),
            divs(&[0, 3, 5, 9])
        );
        assert!(are_aligned(&Divisions::unknown(2), &Divisions::unknown(2)));
    }

    fn labelled(name: &str, labels: Vec<i64>, divisions: &[i64]) -> Collection {
        let index = strata_frame::Index::from(strata_frame::Column::from(labels.clone()));
        let part = crate::datum::Datum::Series(
            strata_frame::Series::try_new(None, index, strata_frame::Column::from(labels)).unwrap(),
        );
        Collection::from_partitions(name.into(), vec![part], Divisions::try_known(divs(divisions)).unwrap())
            .unwrap()
    }

    #[test]
    fn disjoint_collections_keep_every_row() {
        let a = labelled("left", vec![0, 1], &[0, 1]);
        let b = labelled("right", vec![5, 6], &[5, 6]);
        let aligned = align_collections(&[&a, &b]).unwrap();
        assert_eq!(aligned.len(), 2);
        for c in &aligned {
            assert_eq!(c.divisions().values(), Some(&divs(&[0, 1, 5, 6])[..]));
        }
        let options = crate::config::ComputeOptions::sync();
        let sizes = |c: &Collection| {
            c.compute_partitions(&options)
                .unwrap()
                .iter()
                .map(|p| p.len().unwrap())
                .collect_vec()
        };
        assert_eq!(sizes(&aligned[0]), vec![1, 1, 0]);
        assert_eq!(sizes(&aligned[1]), vec![0, 0, 2]);
    }
}
