//! Stacking collections end to end.

use itertools::Itertools;
use strata_dtype::FieldName;
use strata_error::{StrataResult, strata_bail};
use strata_graph::{Task, Tokenizer};
use strata_scalar::Scalar;

use crate::collection::{Collection, Partitioned};
use crate::divisions::Divisions;
use crate::frame::DataFrame;
use crate::naming::{build_graph, deterministic_name};
use crate::series::Series;

/// The partitions of every input in order, aliased under one name.
///
/// Divisions stay known when every input has known divisions and each input ends strictly
/// before the next begins. The gap between two inputs joins the earlier partition.
pub(crate) fn concat_collections(inputs: &[&Collection]) -> StrataResult<Collection> {
    let Some(first) = inputs.first() else {
        strata_bail!("no collections to concatenate");
    };
    if inputs.len() == 1 {
        return Ok((*first).clone());
    }
    let name = deterministic_name(
        "concat",
        inputs
            .iter()
            .fold(Tokenizer::new("concat"), |t, c| t.arg(c.name().as_ref())),
    );
    let tasks = build_graph(
        &name,
        inputs
            .iter()
            .flat_map(|c| c.keys())
            .map(Task::Alias)
            .collect(),
    );
    let divisions = match concat_divisions(inputs) {
        Some(values) => Divisions::try_known(values)?,
        None => {
            log::debug!(
                "concatenating {} collections with overlapping or unknown divisions",
                inputs.len()
            );
            Divisions::unknown(inputs.iter().map(|c| c.npartitions()).sum())
        }
    };
    Ok(Collection::derive(inputs, name, tasks, divisions))
}

fn concat_divisions(inputs: &[&Collection]) -> Option<Vec<Scalar>> {
    let known: Vec<&[Scalar]> = inputs.iter().map(|c| c.divisions().values()).collect::<Option<_>>()?;
    let ordered = known
        .iter()
        .tuple_windows()
        .all(|(a, b)| matches!((a.last(), b.first()), (Some(end), Some(start)) if end < start));
    if !ordered {
        return None;
    }
    let (last, leading) = known.split_last()?;
    Some(
        leading
            .iter()
            .flat_map(|d| d[..d.len() - 1].iter().cloned())
            .chain(last.iter().cloned())
            .collect(),
    )
}

impl DataFrame {
    /// Stack frames vertically. Columns are the union of every input's columns.
    pub fn concat(frames: &[DataFrame]) -> StrataResult<DataFrame> {
        let columns: Vec<FieldName> = frames
            .iter()
            .flat_map(|f| f.columns().iter().cloned())
            .unique()
            .collect();
        let inputs = frames.iter().map(Partitioned::collection).collect_vec();
        Ok(DataFrame::from_collection(concat_collections(&inputs)?, columns.into()))
    }
}

impl Series {
    /// Stack series end to end. The result keeps the name all inputs share, if any.
    pub fn concat(series: &[Series]) -> StrataResult<Series> {
        let name = series
            .iter()
            .map(Series::name)
            .all_equal_value()
            .ok()
            .flatten()
            .cloned();
        let inputs = series.iter().map(Partitioned::collection).collect_vec();
        Ok(Series::from_collection(concat_collections(&inputs)?, name))
    }
}

#[cfg(test)]
mod test {
    use rstest::rstest;
    use strata_frame::{Column, Index};

    use super::*;
    use crate::config::ComputeOptions;
    use crate::datum::Datum;

    fn series(name: &str, labels: &[Vec<i64>], divisions: Option<Vec<i64>>) -> Series {
        let parts = labels
            .iter()
            .map(|l| {
                let index = Index::from(Column::from(l.clone()));
                Datum::Series(
                    strata_frame::Series::try_new(Some(name.into()), index, Column::from(l.clone()))
                        .unwrap(),
                )
            })
            .collect_vec();
        let divisions = match divisions {
            Some(d) => Divisions::try_known(d.into_iter().map(Scalar::from).collect()).unwrap(),
            None => Divisions::unknown(parts.len()),
        };
        let token = format!("{name}-{}", labels.iter().flatten().join("-"));
        Series::from_collection(
            Collection::from_partitions(token.into(), parts, divisions).unwrap(),
            Some(name.into()),
        )
    }

    #[test]
    fn ordered_inputs_keep_divisions() {
        let a = series("x", &[vec![0, 1], vec![4, 9]], Some(vec![0, 4, 9]));
        let b = series("x", &[vec![10, 15]], Some(vec![10, 15]));
        let both = Series::concat(&[a, b]).unwrap();
        assert_eq!(
            both.divisions().values(),
            Some(&[Scalar::from(0), 4.into(), 10.into(), 15.into()][..])
        );
        assert_eq!(both.name().map(|n| n.as_ref()), Some("x"));
        let local = both.compute_with(&ComputeOptions::sync()).unwrap();
        assert_eq!(local.values(), &Column::from(vec![0, 1, 4, 9, 10, 15]));
    }

    #[rstest]
    #[case(Some(vec![5, 12]))]
    #[case(Some(vec![9, 12]))]
    #[case(None)]
    fn overlapping_or_unknown_inputs_lose_divisions(#[case] second: Option<Vec<i64>>) {
        let a = series("x", &[vec![0, 1], vec![4, 9]], Some(vec![0, 4, 9]));
        let b = series("y", &[vec![9, 12]], second);
        let both = Series::concat(&[a, b]).unwrap();
        assert!(!both.known_divisions());
        assert_eq!(both.npartitions(), 3);
        assert!(both.name().is_none());
    }

    #[test]
    fn concat_needs_inputs() {
        assert!(Series::concat(&[]).unwrap_err().is_invalid_argument());
        let a = series("x", &[vec![0, 1]], Some(vec![0, 1]));
        let single = Series::concat(&[a.clone()]).unwrap();
        assert_eq!(single.root_name(), a.root_name());
    }

    #[test]
    fn frame_columns_are_unioned() {
        let frame = |columns: &[&str], name: &str| {
            let local = strata_frame::Frame::from_columns(
                columns.iter().map(|c| (*c, Column::from(vec![1, 2]))),
            )
            .unwrap();
            DataFrame::from_collection(
                Collection::from_partitions(name.into(), vec![Datum::Frame(local)], Divisions::unknown(1))
                    .unwrap(),
                columns.iter().map(|c| FieldName::from(*c)).collect(),
            )
        };
        let both = DataFrame::concat(&[frame(&["a", "b"], "left"), frame(&["b", "c"], "right")]).unwrap();
        assert_eq!(both.columns().len(), 3);
        let local = both.compute_with(&ComputeOptions::sync()).unwrap();
        assert_eq!(local.len(), 4);
        assert_eq!(local.column("c").unwrap().values().null_count(), 2);
    }
}
