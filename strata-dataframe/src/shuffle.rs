//! Full shuffles, where every output partition may draw rows from every input partition.
//!
//! A shuffle is two layers: a split task per input partition returning a list with one piece
//! per output partition, and a collect task per output partition concatenating its piece of
//! every split.

use std::sync::Arc;

use itertools::Itertools;
use strata_dtype::FieldName;
use strata_error::{StrataResult, strata_bail};
use strata_frame::compute;
use strata_frame::groupby::GroupKeys;
use strata_frame::sample::sample_positions;
use strata_frame::{Column, Frame};
use strata_graph::{Arg, Task, TaskFn, Tokenizer};
use strata_scalar::Scalar;

use crate::aca::Aca;
use crate::collection::{Collection, Partitioned};
use crate::config::{ComputeOptions, SetIndexOptions};
use crate::datum::{Datum, arg};
use crate::divisions::{Divisions, validate};
use crate::frame::DataFrame;
use crate::naming::{build_graph, deterministic_name};
use crate::partitionwise::partitionwise;
use crate::series::Series;

/// What rows are moved by: a column of the frame or a series aligned with it.
#[derive(Debug, Clone)]
pub enum ShuffleKey {
    Column(FieldName),
    Series(Series),
}

impl From<&str> for ShuffleKey {
    fn from(value: &str) -> Self {
        ShuffleKey::Column(value.into())
    }
}

impl From<&Series> for ShuffleKey {
    fn from(value: &Series) -> Self {
        ShuffleKey::Series(value.clone())
    }
}

/// Split every partition of `inputs` into `npartitions` pieces with `split` and gather the
/// pieces by output partition. `finish` runs on each gathered partition.
fn shuffle<S, F>(
    label: &str,
    tokenizer: Tokenizer,
    inputs: &[&Collection],
    npartitions: usize,
    divisions: Divisions,
    split: S,
    finish: F,
) -> StrataResult<Collection>
where
    S: Fn(&[Datum]) -> StrataResult<Vec<Datum>> + Send + Sync + 'static,
    F: Fn(Datum) -> StrataResult<Datum> + Send + Sync + 'static,
{
    if npartitions != divisions.npartitions() {
        strata_bail!(
            "{} output partitions do not match {} divisions",
            npartitions,
            divisions.npartitions() + 1
        );
    }
    let split_label = format!("{label}-split");
    let splits = partitionwise(
        &split_label,
        tokenizer.option("npartitions", &npartitions),
        inputs,
        move |parts: &[Datum]| Ok(Datum::List(split(parts)?.into())),
    )?;

    let collect_label = format!("{label}-collect");
    let name = deterministic_name(
        &collect_label,
        Tokenizer::new(&collect_label).arg(splits.name().as_ref()),
    );
    let task_label = collect_label.clone();
    let collect = TaskFn::new(collect_label.as_str(), move |args: Vec<Datum>| {
        let output = arg(&args, 0, &task_label)?.as_scalar()?;
        let Some(output) = output.as_i64().and_then(|o| usize::try_from(o).ok()) else {
            strata_bail!(ComputeError: "{} is not an output partition", output);
        };
        let pieces: Vec<Datum> = arg(&args, 1, &task_label)?
            .as_list()?
            .iter()
            .map(|split| match split.as_list()?.get(output) {
                Some(piece) => Ok(piece.clone()),
                None => strata_bail!(ComputeError: "split has no piece for partition {}", output),
            })
            .try_collect()?;
        finish(Datum::concat(&pieces)?)
    });
    let tasks = (0..npartitions)
        .map(|j| {
            Task::Call(
                collect.clone(),
                vec![
                    Arg::Literal(Datum::Scalar(Scalar::from(j))),
                    Arg::keys(splits.keys()),
                ],
            )
        })
        .collect();
    log::debug!(
        "{} of {} partitions into {} partitions",
        label,
        splits.npartitions(),
        npartitions
    );
    Ok(Collection::derive(&[&splits], name.clone(), build_graph(&name, tasks), divisions))
}

/// Run the graph of `collection` now and keep only its results.
fn materialize(collection: &Collection) -> StrataResult<Collection> {
    let parts = collection.compute_partitions(&ComputeOptions::default())?;
    Collection::from_partitions(collection.name().clone(), parts, collection.divisions().clone())
}

/// Move rows so that each one lands in the partition of `divisions` covering its key.
///
/// The key becomes the index. Partition `j` covers `(divisions[j], divisions[j + 1]]` and the
/// first one also covers `divisions[0]`. The range of the key is computed first, and the outer
/// divisions are widened to its minimum and maximum so that every row lies within the
/// divisions. With `compute` the shuffle runs immediately and the result holds only its
/// partitions.
pub fn set_partition(
    frame: &DataFrame,
    key: ShuffleKey,
    divisions: &[Scalar],
    compute: bool,
) -> StrataResult<DataFrame> {
    validate(divisions)?;
    let values = match &key {
        ShuffleKey::Column(name) => frame.column(name)?,
        ShuffleKey::Series(series) => series.clone(),
    };
    let divisions = widen_to_range(divisions, &values)?;
    let npartitions = divisions.len() - 1;
    let boundaries: Arc<[Scalar]> = divisions.as_slice().into();
    let tokenizer = Tokenizer::new("set-partition")
        .option("divisions", &divisions[..])
        .option("compute", &compute);

    let (partitioned, columns) = match key {
        ShuffleKey::Column(name) => {
            let name = frame.require_column(&name)?;
            let columns = frame.columns().iter().filter(|c| **c != name).cloned().collect();
            let column = name.clone();
            let collection = shuffle(
                "set-partition",
                tokenizer.option("key", name.as_ref()),
                &[frame.collection()],
                npartitions,
                Divisions::try_known(divisions.clone())?,
                move |parts: &[Datum]| {
                    let part = arg(parts, 0, "set-partition")?.as_frame()?;
                    split_by_divisions(&part.set_index(&column)?, &boundaries)
                },
                |part| part.sort_index(),
            )?;
            (collection, columns)
        }
        ShuffleKey::Series(series) => {
            let collection = shuffle(
                "set-partition",
                tokenizer,
                &[frame.collection(), series.collection()],
                npartitions,
                Divisions::try_known(divisions.clone())?,
                move |parts: &[Datum]| {
                    let part = arg(parts, 0, "set-partition")?.as_frame()?;
                    let key = arg(parts, 1, "set-partition")?.as_series()?;
                    split_by_divisions(&part.set_index_series(key)?, &boundaries)
                },
                |part| part.sort_index(),
            )?;
            (collection, frame.columns().clone())
        }
    };
    let partitioned = if compute { materialize(&partitioned)? } else { partitioned };
    Ok(DataFrame::from_collection(partitioned, columns))
}

/// `divisions` with the first lowered to the minimum of `values` and the last raised to
/// their maximum where the values reach past them.
fn widen_to_range(divisions: &[Scalar], values: &Series) -> StrataResult<Vec<Scalar>> {
    let mut divisions = divisions.to_vec();
    let (min, max) = (values.min()?.compute()?, values.max()?.compute()?);
    if let Some(first) = divisions.first_mut() {
        if min.is_valid() && min < *first {
            log::debug!("lowering the first division from {} to {}", first, min);
            *first = min;
        }
    }
    if let Some(last) = divisions.last_mut() {
        if max.is_valid() && max > *last {
            log::debug!("raising the last division from {} to {}", last, max);
            *last = max;
        }
    }
    Ok(divisions)
}

fn split_by_divisions(frame: &Frame, divisions: &[Scalar]) -> StrataResult<Vec<Datum>> {
    Ok(frame
        .partition_by_divisions(divisions)?
        .into_iter()
        .map(Datum::Frame)
        .collect())
}

/// Sort by `key` into partitions of roughly equal size, choosing the divisions from quantiles
/// of a sample of the key.
pub fn set_index(frame: &DataFrame, key: ShuffleKey, options: &SetIndexOptions) -> StrataResult<DataFrame> {
    let npartitions = options.npartitions().unwrap_or(frame.npartitions());
    if npartitions == 0 {
        strata_bail!("cannot set the index onto zero partitions");
    }
    let values = match &key {
        ShuffleKey::Column(name) => frame.column(name)?,
        ShuffleKey::Series(series) => series.clone(),
    };
    let divisions = estimate_divisions(&values, npartitions, options)?;
    log::debug!(
        "set_index chose divisions [{}] for {} partitions",
        divisions.iter().join(", "),
        npartitions
    );
    set_partition(frame, key, &divisions, options.compute())
}

/// Boundaries at evenly spaced quantiles of a sample of `values`, computed now.
///
/// Repeated boundaries collapse, so heavily repeated keys give fewer partitions. A key with a
/// single distinct value gives one partition.
fn estimate_divisions(values: &Series, npartitions: usize, options: &SetIndexOptions) -> StrataResult<Vec<Scalar>> {
    let seed = options.seed().unwrap_or_else(rand::random);
    let sample_size = options.sample_size();
    let levels = (0..=npartitions)
        .map(|i| i as f64 / npartitions as f64)
        .collect_vec();
    let aca = Aca::new(
        move |parts: &[Datum]| {
            let part = arg(parts, 0, "set-index-sample")?.as_series()?.dropna()?;
            if part.len() <= sample_size {
                return Ok(Datum::Series(part));
            }
            let frac = sample_size as f64 / part.len() as f64;
            Ok(Datum::Series(part.take(&sample_positions(part.len(), frac, seed)?)?))
        },
        move |sample: Datum| {
            let sample = sample.as_series()?;
            let boundaries: Vec<Scalar> = levels
                .iter()
                .map(|q| compute::quantile_lower(sample.values(), *q))
                .try_collect()?;
            Ok(Datum::Series(strata_frame::Series::new(None, Column::new(boundaries))))
        },
    )
    .with_token("set-index-sample")
    .with_option("npartitions", &npartitions)
    .with_option("sample_size", &sample_size)
    .with_option("seed", &seed);
    let estimate = aca.run(&[values.collection()])?;
    let boundaries = Series::from_collection(estimate, None).compute()?;
    let mut divisions = boundaries.values().iter().cloned().dedup().collect_vec();
    match divisions.as_slice() {
        [] | [Scalar::Null, ..] => strata_bail!("cannot choose divisions for a key without values"),
        [single] => divisions.push(single.clone()),
        _ => {}
    }
    Ok(divisions)
}

/// Move rows so that all rows with equal `keys` share a partition. Divisions become unknown.
pub(crate) fn hash_shuffle(
    collection: &Collection,
    keys: Vec<FieldName>,
    npartitions: usize,
) -> StrataResult<Collection> {
    let tokenizer = Tokenizer::new("shuffle").option("keys", &keys);
    shuffle(
        "shuffle",
        tokenizer,
        &[collection],
        npartitions,
        Divisions::unknown(npartitions),
        move |parts: &[Datum]| {
            let frame = arg(parts, 0, "shuffle")?.as_frame()?;
            let columns = keys
                .iter()
                .map(|k| Ok(frame.column(k)?.values().clone()))
                .collect::<StrataResult<Vec<_>>>()?;
            Ok(frame
                .partition_by_hash(&GroupKeys::new(None, columns)?, npartitions)?
                .into_iter()
                .map(Datum::Frame)
                .collect())
        },
        Ok,
    )
}

impl DataFrame {
    /// Sort by a column or series into partitions with estimated divisions. See [`set_index`].
    pub fn set_index<K: Into<ShuffleKey>>(&self, key: K, options: &SetIndexOptions) -> StrataResult<DataFrame> {
        set_index(self, key.into(), options)
    }

    /// Sort by a column or series into `divisions`. See [`set_partition`].
    pub fn set_partition<K: Into<ShuffleKey>>(
        &self,
        key: K,
        divisions: &[Scalar],
        compute: bool,
    ) -> StrataResult<DataFrame> {
        set_partition(self, key.into(), divisions, compute)
    }
}

#[cfg(test)]
mod test {
    use rstest::rstest;
    use strata_dtype::field_names;

    use super::*;

    /// `a = 1..=9`, `b = [4, 5, 6 | 3, 2, 1 | 0, 0, 0]` over divisions `[0, 4, 9, 9]`.
    fn frame() -> DataFrame {
        let part = |labels: Vec<i64>, a: Vec<i64>, b: Vec<i64>| {
            let local = Frame::from_columns([("a", Column::from(a)), ("b", Column::from(b))]).unwrap();
            Datum::Frame(local.with_index(strata_frame::Index::from(Column::from(labels))).unwrap())
        };
        let collection = Collection::from_partitions(
            "frame".into(),
            vec![
                part(vec![0, 1, 3], vec![1, 2, 3], vec![4, 5, 6]),
                part(vec![5, 6, 8], vec![4, 5, 6], vec![3, 2, 1]),
                part(vec![9, 9, 9], vec![7, 8, 9], vec![0, 0, 0]),
            ],
            Divisions::try_known(vec![0.into(), 4.into(), 9.into(), 9.into()]).unwrap(),
        )
        .unwrap();
        DataFrame::from_collection(collection, field_names(["a", "b"]))
    }

    #[test]
    fn boundary_key_lands_in_lower_partition() {
        let shuffled = frame().set_partition("b", &[0.into(), 2.into(), 9.into()], false).unwrap();
        assert_eq!(shuffled.npartitions(), 2);
        assert_eq!(shuffled.columns().len(), 1);
        let labels = shuffled.graph().task_labels();
        assert!(labels.contains("set-partition-split"));
        assert!(labels.contains("set-partition-collect"));

        let first = shuffled.get_division(0).unwrap().compute_with(&ComputeOptions::sync()).unwrap();
        assert_eq!(first.index().labels(), &Column::from(vec![0, 0, 0, 1, 2]));
        assert_eq!(first.column("a").unwrap().values(), &Column::from(vec![7, 8, 9, 6, 5]));
        let second = shuffled.get_division(1).unwrap().compute_with(&ComputeOptions::sync()).unwrap();
        assert_eq!(second.index().labels(), &Column::from(vec![3, 4, 5, 6]));
    }

    #[rstest]
    #[case(&[1, 2, 5], &[0, 2, 6])]
    #[case(&[-3, 4, 9], &[-3, 4, 9])]
    #[case(&[2, 3], &[0, 6])]
    fn edge_divisions_bound_the_key(#[case] given: &[i64], #[case] expected: &[i64]) {
        let given = given.iter().map(|&d| Scalar::from(d)).collect_vec();
        let shuffled = frame().set_partition("b", &given, false).unwrap();
        let expected = expected.iter().map(|&d| Scalar::from(d)).collect_vec();
        assert_eq!(shuffled.divisions().values().unwrap(), expected.as_slice());

        let options = ComputeOptions::sync();
        let parts = shuffled.collection().compute_partitions(&options).unwrap();
        for (j, part) in parts.iter().enumerate() {
            let labels = part.as_frame().unwrap().index().labels().values().to_vec();
            for label in labels {
                assert!(expected[j] <= label && label <= expected[j + 1]);
            }
        }
        assert_eq!(shuffled.compute_with(&options).unwrap().len(), 9);
    }

    #[test]
    fn eager_shuffle_keeps_only_partitions() {
        let divisions = [0.into(), 2.into(), 9.into()];
        let lazy = frame().set_partition("b", &divisions, false).unwrap();
        let eager = frame().set_partition("b", &divisions, true).unwrap();
        assert_eq!(eager.graph().len(), 2);
        assert!(eager.graph().len() < lazy.graph().len());
        assert_eq!(
            eager.compute_with(&ComputeOptions::sync()).unwrap(),
            lazy.compute_with(&ComputeOptions::sync()).unwrap()
        );
    }

    #[test]
    fn partition_by_series() {
        let df = frame();
        let key = df.column("b").unwrap().neg();
        let shuffled = df.set_partition(&key, &[(-6).into(), (-3).into(), 0.into()], false).unwrap();
        assert_eq!(shuffled.columns().len(), 2);
        let local = shuffled.compute_with(&ComputeOptions::sync()).unwrap();
        assert_eq!(local.index().labels(), &Column::from(vec![-6, -5, -4, -3, -2, -1, 0, 0, 0]));
    }

    #[test]
    fn invalid_divisions_and_keys() {
        let df = frame();
        assert!(df.set_partition("b", &[2.into(), 0.into()], false).unwrap_err().is_invalid_argument());
        assert!(df.set_partition("z", &[0.into(), 9.into()], false).unwrap_err().is_not_found());
    }

    #[test]
    fn set_index_balances_partitions() {
        let options = SetIndexOptions::default().with_npartitions(3).with_seed(7);
        let indexed = frame().set_index("a", &options).unwrap();
        assert_eq!(
            indexed.divisions().values().unwrap(),
            &[1.into(), 3.into(), 6.into(), 9.into()]
        );
        let local = indexed.compute_with(&ComputeOptions::sync()).unwrap();
        assert_eq!(local.index().labels(), &Column::from((1..=9).collect_vec()));
    }

    #[test]
    fn single_valued_key_gives_one_partition() {
        let df = frame();
        let constant = df.column("a").unwrap().mul_scalar(0).unwrap();
        let indexed = df
            .set_index(&constant, &SetIndexOptions::default().with_seed(1))
            .unwrap();
        assert_eq!(indexed.npartitions(), 1);
        assert_eq!(indexed.divisions().values().unwrap(), &[0.into(), 0.into()]);
    }

    #[test]
    fn hash_shuffle_colocates_keys() {
        let df = frame();
        let shuffled = hash_shuffle(df.collection(), vec!["b".into()], 2).unwrap();
        assert!(!shuffled.divisions().is_known());
        let parts = shuffled.compute_partitions(&ComputeOptions::sync()).unwrap();
        let owners = parts
            .iter()
            .map(|p| p.as_frame().unwrap().column("b").unwrap().values().values().to_vec())
            .collect_vec();
        assert_eq!(owners.iter().map(Vec::len).sum::<usize>(), 9);
        let zeros = owners.iter().filter(|p| p.contains(&Scalar::from(0))).count();
        assert_eq!(zeros, 1);
    }
}
