//! Partitioned collections from local frames and series.
//!
//! Local data is sorted by its index and cut into partitions of about equal row counts. A run of
//! equal labels is never cut, so the divisions are the first label of every partition followed
//! by the last label overall. Collections are named by a token of their content, so loading the
//! same data twice yields the same graph.

use std::sync::Arc;

use itertools::Itertools;
use strata_error::{StrataResult, strata_bail};
use strata_frame::Frame;
use strata_graph::Tokenizer;
use strata_scalar::Scalar;

use crate::collection::Collection;
use crate::datum::Datum;
use crate::divisions::{Divisions, validate};
use crate::frame::DataFrame;
use crate::naming::{deterministic_name, tokenize_frame};
use crate::series::Series;

/// Row positions where partitions start, for `labels` sorted ascending.
///
/// Starts are spaced `ceil(len / npartitions)` rows apart and pushed forward past runs of equal
/// labels, so there may be fewer than `npartitions`.
pub fn sorted_division_locations(labels: &[Scalar], npartitions: usize) -> Vec<usize> {
    if labels.is_empty() || npartitions == 0 {
        return vec![0];
    }
    let chunksize = labels.len().div_ceil(npartitions);
    let mut starts = vec![0];
    let mut target = chunksize;
    while target < labels.len() {
        let mut start = target;
        while start < labels.len() && labels[start] == labels[start - 1] {
            start += 1;
        }
        if start == labels.len() {
            break;
        }
        starts.push(start);
        target = (target + chunksize).max(start + 1);
    }
    starts
}

/// Sort `local`, split it into about `npartitions` chunks and name the result `name`.
fn chunk_sorted(name: Arc<str>, local: &Datum, npartitions: usize) -> StrataResult<Collection> {
    if npartitions == 0 {
        strata_bail!("npartitions must be positive");
    }
    let sorted = local.sort_index()?;
    let index = sorted.index()?;
    if index.is_empty() {
        return Collection::from_partitions(name, vec![sorted], Divisions::unknown(1));
    }
    let labels = index.labels().values();
    let starts = sorted_division_locations(labels, npartitions);
    let mut divisions = starts.iter().map(|&s| labels[s].clone()).collect_vec();
    divisions.extend(labels.last().cloned());
    let parts: Vec<Datum> = starts
        .iter()
        .copied()
        .chain([labels.len()])
        .tuple_windows()
        .map(|(start, end)| sorted.take(&(start..end).collect_vec()))
        .try_collect()?;
    log::debug!(
        "split {} rows into {} partitions of {}",
        labels.len(),
        starts.len(),
        name
    );
    let divisions = if labels.iter().any(Scalar::is_null) {
        Divisions::unknown(starts.len())
    } else {
        Divisions::try_known(divisions)?
    };
    Collection::from_partitions(name, parts, divisions)
}

/// Place `local` onto explicit `divisions`: partition `j` holds labels in `[d[j], d[j+1])`, the
/// last partition its upper boundary too. Labels outside the divisions are dropped.
fn onto_divisions(name: Arc<str>, local: &Datum, divisions: &[Scalar]) -> StrataResult<Collection> {
    validate(divisions)?;
    let sorted = local.sort_index()?;
    let last = divisions.len() - 2;
    let parts: Vec<Datum> = divisions
        .iter()
        .tuple_windows()
        .enumerate()
        .map(|(j, (lower, upper))| sorted.loc_range(Some(lower), Some(upper), j == last))
        .try_collect()?;
    Collection::from_partitions(name, parts, Divisions::try_known(divisions.to_vec())?)
}

fn tokenize_series(tokenizer: Tokenizer, series: &strata_frame::Series) -> Tokenizer {
    tokenizer
        .arg(&series.name())
        .arg(&series.index().name())
        .arg(series.index().labels().values())
        .arg(series.values().values())
}

/// A lazy frame over `frame`, split into about `npartitions` partitions.
pub fn from_frame(frame: &Frame, npartitions: usize) -> StrataResult<DataFrame> {
    let name = deterministic_name(
        "from-frame",
        tokenize_frame(Tokenizer::new("from-frame").option("npartitions", &npartitions), frame),
    );
    let collection = chunk_sorted(name, &Datum::Frame(frame.clone()), npartitions)?;
    Ok(DataFrame::from_collection(collection, frame.names().clone()))
}

/// A lazy frame over `frame` placed onto `divisions`.
pub fn from_frame_with_divisions(frame: &Frame, divisions: &[Scalar]) -> StrataResult<DataFrame> {
    let name = deterministic_name(
        "from-frame",
        tokenize_frame(Tokenizer::new("from-frame").option("divisions", divisions), frame),
    );
    let collection = onto_divisions(name, &Datum::Frame(frame.clone()), divisions)?;
    Ok(DataFrame::from_collection(collection, frame.names().clone()))
}

/// A lazy series over `series`, split into about `npartitions` partitions.
pub fn from_series(series: &strata_frame::Series, npartitions: usize) -> StrataResult<Series> {
    let name = deterministic_name(
        "from-series",
        tokenize_series(Tokenizer::new("from-series").option("npartitions", &npartitions), series),
    );
    let collection = chunk_sorted(name, &Datum::Series(series.clone()), npartitions)?;
    Ok(Series::from_collection(collection, series.name().cloned()))
}

/// A lazy series over `series` placed onto `divisions`.
pub fn from_series_with_divisions(series: &strata_frame::Series, divisions: &[Scalar]) -> StrataResult<Series> {
    let name = deterministic_name(
        "from-series",
        tokenize_series(Tokenizer::new("from-series").option("divisions", divisions), series),
    );
    let collection = onto_divisions(name, &Datum::Series(series.clone()), divisions)?;
    Ok(Series::from_collection(collection, series.name().cloned()))
}
