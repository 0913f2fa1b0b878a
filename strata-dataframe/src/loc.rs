//! Label based row selection using the divisions to skip partitions.

use itertools::Itertools;
use strata_dtype::DType;
use strata_error::{StrataResult, strata_bail};
use strata_frame::compute::{SearchSortedSide, search_sorted};
use strata_graph::{Arg, Key, Task, TaskFn, Tokenizer};
use strata_scalar::{DateResolution, LabelBound, Scalar, parse_timestamp_range};

use crate::collection::Collection;
use crate::datum::{Datum, arg};
use crate::divisions::{Divisions, candidate_partitions, coerce_key, contains, partition_of};
use crate::naming::{build_graph, deterministic_name};
use crate::partitionwise::partitionwise;

/// Rows labelled exactly `key`, collected into a single partition.
///
/// A partial date string on timestamp divisions selects the whole period it names.
pub fn loc_label(collection: &Collection, key: &Scalar) -> StrataResult<Collection> {
    let divisions = collection.divisions().require_known("loc")?;
    if let (Scalar::Utf8(s), DType::Timestamp) = (key, collection.divisions().dtype()) {
        let (lo, hi, resolution) = parse_timestamp_range(s)?;
        if resolution != DateResolution::Exact {
            return loc_range(
                collection,
                Some(&Scalar::Timestamp(lo)),
                Some(&Scalar::Timestamp(hi)),
            );
        }
    }
    let key = coerce_key(key, collection.divisions(), None);
    if !contains(divisions, &key) {
        strata_bail!(
            NotFound: "label {} is outside the divisions {}",
            key,
            collection.divisions()
        );
    }
    let candidates = candidate_partitions(divisions, &key);
    log::debug!(
        "loc {} on {} reads partitions {}..{}",
        key,
        collection.name(),
        candidates.start,
        candidates.end
    );

    let name = deterministic_name(
        "loc",
        Tokenizer::new("loc").arg(collection.name().as_ref()).arg(&key),
    );
    let label = key.clone();
    let func = TaskFn::new("loc", move |args: Vec<Datum>| {
        let parts: Vec<Datum> = arg(&args, 0, "loc")?
            .as_list()?
            .iter()
            .map(|p| p.loc_label(&label))
            .try_collect()?;
        Datum::concat(&parts)
    });
    let task = Task::Call(
        func,
        vec![Arg::keys(candidates.map(|i| collection.key(i)))],
    );
    Ok(Collection::derive(
        &[collection],
        name.clone(),
        vec![(Key::new(name, 0), task)],
        Divisions::try_known(vec![key.clone(), key])?,
    ))
}

/// Rows labelled within the closed range `[start, stop]`. `None` leaves that end open.
///
/// Only partitions overlapping the range are kept, and only the first and last of them are
/// sliced; partitions in between are passed through by key.
pub fn loc_range(
    collection: &Collection,
    start: Option<&Scalar>,
    stop: Option<&Scalar>,
) -> StrataResult<Collection> {
    let divisions = collection.divisions().require_known("loc")?;
    let start = start.map(|s| coerce_key(s, collection.divisions(), Some(LabelBound::Lower)));
    let stop = stop.map(|s| coerce_key(s, collection.divisions(), Some(LabelBound::Upper)));
    let name = deterministic_name(
        "loc",
        Tokenizer::new("loc")
            .arg(collection.name().as_ref())
            .option("start", &start)
            .option("stop", &stop),
    );

    if let (Some(lo), Some(hi)) = (&start, &stop) {
        if lo > hi {
            let empty = TaskFn::new("loc-empty", |args: Vec<Datum>| arg(&args, 0, "loc-empty")?.head(0));
            let task = Task::Call(empty, vec![Arg::Key(collection.key(0))]);
            return Ok(Collection::derive(
                &[collection],
                name.clone(),
                vec![(Key::new(name, 0), task)],
                Divisions::try_known(vec![lo.clone(), lo.clone()])?,
            ));
        }
    }

    let last = collection.npartitions() - 1;
    let first_part = start.as_ref().map_or(0, |s| partition_of(divisions, s));
    let last_part = stop.as_ref().map_or(last, |s| partition_of(divisions, s));

    let mut tasks = Vec::with_capacity(last_part - first_part + 1);
    for i in first_part..=last_part {
        let lower = (i == first_part)
            .then(|| start.clone().filter(|s| *s > divisions[i]))
            .flatten();
        let upper = (i == last_part)
            .then(|| stop.clone().filter(|s| *s < divisions[i + 1]))
            .flatten();
        let boundary_start = (i == first_part && i > 0)
            .then(|| start.clone().filter(|s| *s == divisions[i]))
            .flatten();
        tasks.push(match boundary_start {
            Some(label) => {
                // rows labelled with an inner boundary may also sit in earlier partitions
                let from = search_sorted(divisions, &label, SearchSortedSide::Left).saturating_sub(1);
                boundary_task(collection, from..i + 1, label, upper)
            }
            None if lower.is_none() && upper.is_none() => Task::Alias(collection.key(i)),
            None => slice_task(collection.key(i), lower, upper),
        });
    }

    let lower = match &start {
        Some(s) => s.max(&divisions[first_part]).clone(),
        None => divisions[first_part].clone(),
    };
    let upper = match &stop {
        Some(s) => s.min(&divisions[last_part + 1]).clone(),
        None => divisions[last_part + 1].clone(),
    };
    let upper = if upper < lower { lower.clone() } else { upper };
    let mut new_divisions = vec![lower];
    new_divisions.extend(divisions[first_part + 1..=last_part].iter().cloned());
    new_divisions.push(upper);

    log::debug!(
        "loc range on {} keeps partitions {}..={}",
        collection.name(),
        first_part,
        last_part
    );
    Ok(Collection::derive(
        &[collection],
        name.clone(),
        build_graph(&name, tasks),
        Divisions::try_known(new_divisions)?,
    ))
}

fn slice_task(key: Key, lower: Option<Scalar>, upper: Option<Scalar>) -> Task<Datum> {
    let func = TaskFn::new("loc", move |args: Vec<Datum>| {
        arg(&args, 0, "loc")?.loc_range(lower.as_ref(), upper.as_ref(), true)
    });
    Task::Call(func, vec![Arg::Key(key)])
}

/// The first output partition when the range starts exactly on an inner boundary: rows labelled
/// `label` from the preceding partitions followed by the partition starting there.
fn boundary_task(
    collection: &Collection,
    partitions: std::ops::Range<usize>,
    label: Scalar,
    upper: Option<Scalar>,
) -> Task<Datum> {
    let func = TaskFn::new("loc", move |args: Vec<Datum>| {
        let parts = arg(&args, 0, "loc")?.as_list()?;
        let Some((owner, earlier)) = parts.split_last() else {
            strata_bail!(ComputeError: "loc expects at least one partition");
        };
        let mut pieces: Vec<Datum> = earlier
            .iter()
            .map(|p| p.loc_range(Some(&label), Some(&label), true))
            .try_collect()?;
        pieces.push(owner.loc_range(Some(&label), upper.as_ref(), true)?);
        Datum::concat(&pieces)
    });
    Task::Call(
        func,
        vec![Arg::keys(partitions.map(|i| collection.key(i)))],
    )
}

/// The rows where the aligned boolean `mask` is true, partition by partition.
pub fn loc_mask(collection: &Collection, mask: &Collection) -> StrataResult<Collection> {
    partitionwise(
        "loc-mask",
        Tokenizer::new("loc-mask"),
        &[collection, mask],
        |parts: &[Datum]| {
            arg(parts, 0, "loc-mask")?.filter_by(arg(parts, 1, "loc-mask")?.as_series()?)
        },
    )
}

#[cfg(test)]
mod test {
    use rstest::rstest;
    use strata_frame::{Column, Series};

    use super::*;
    use crate::config::ComputeOptions;

    /// Labels `[0, 1, 3 | 5, 6, 8 | 9, 9, 9]` over divisions `[0, 4, 9, 9]`.
    fn labels() -> Collection {
        let part = |labels: Vec<i64>| {
            let index = strata_frame::Index::from(Column::from(labels.clone()));
            Datum::Series(Series::try_new(None, index, Column::from(labels)).unwrap())
        };
        Collection::from_partitions(
            "labels".into(),
            vec![part(vec![0, 1, 3]), part(vec![5, 6, 8]), part(vec![9, 9, 9])],
            Divisions::try_known(vec![0.into(), 4.into(), 9.into(), 9.into()]).unwrap(),
        )
        .unwrap()
    }

    fn computed(collection: &Collection) -> Vec<i64> {
        collection
            .compute_concat(&ComputeOptions::sync())
            .unwrap()
            .as_series()
            .unwrap()
            .values()
            .iter()
            .map(|v| v.as_i64().unwrap())
            .collect()
    }

    fn division_values(collection: &Collection) -> Vec<i64> {
        collection
            .divisions()
            .values()
            .unwrap()
            .iter()
            .map(|v| v.as_i64().unwrap())
            .collect()
    }

    #[test]
    fn range_trims_divisions() {
        let out = loc_range(&labels(), Some(&3.into()), Some(&8.into())).unwrap();
        assert_eq!(division_values(&out), vec![3, 4, 8]);
        assert_eq!(computed(&out), vec![3, 5, 6, 8]);
    }

    #[rstest]
    #[case(None, Some(5), vec![0, 1, 3, 5])]
    #[case(Some(6), None, vec![6, 8, 9, 9, 9])]
    #[case(Some(9), Some(9), vec![9, 9, 9])]
    #[case(None, None, vec![0, 1, 3, 5, 6, 8, 9, 9, 9])]
    #[case(Some(7), Some(2), vec![])]
    fn ranges(#[case] start: Option<i64>, #[case] stop: Option<i64>, #[case] expected: Vec<i64>) {
        let start = start.map(Scalar::from);
        let stop = stop.map(Scalar::from);
        let out = loc_range(&labels(), start.as_ref(), stop.as_ref()).unwrap();
        assert_eq!(computed(&out), expected);
    }

    #[test]
    fn middle_partitions_are_aliased() {
        let out = loc_range(&labels(), Some(&1.into()), None).unwrap();
        assert!(matches!(out.graph().get(&out.key(1)), Some(Task::Alias(_))));
        assert!(matches!(out.graph().get(&out.key(0)), Some(Task::Call(..))));
    }

    #[test]
    fn label_reads_every_candidate() {
        let out = loc_label(&labels(), &9.into()).unwrap();
        assert_eq!(out.npartitions(), 1);
        assert_eq!(computed(&out), vec![9, 9, 9]);
        assert_eq!(division_values(&out), vec![9, 9]);
    }

    #[test]
    fn label_outside_divisions_is_not_found() {
        let err = loc_label(&labels(), &10.into()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn unknown_divisions_are_rejected() {
        let collection = labels().with_divisions(Divisions::unknown(3));
        assert!(loc_label(&collection, &1.into()).unwrap_err().is_invalid_argument());
        assert!(loc_range(&collection, None, None).unwrap_err().is_invalid_argument());
    }
}
