//! Grouped aggregation of lazy frames and series.
//!
//! Group reductions are apply-concat-apply: each partition is reduced per group, the partial
//! results are concatenated and reduced again per group. Means and variances combine several
//! such reductions by group. `apply` instead shuffles rows so that every group sits in one
//! partition.

use itertools::{Itertools, izip};
use strata_dtype::{FieldName, FieldNames};
use strata_error::{StrataResult, strata_bail};
use strata_frame::compute::{self, Reduction};
use strata_frame::groupby::GroupKeys;
use strata_frame::{Column, Frame};
use strata_graph::{Tokenizer, function_identity};
use strata_scalar::Scalar;

use crate::aca::{Aca, combine_results};
use crate::collection::{Collection, Partitioned};
use crate::datum::{Datum, arg};
use crate::frame::DataFrame;
use crate::reduction::partial_reduction;
use crate::series::Series;
use crate::shuffle::hash_shuffle;

/// Column holding an external key while a frame is shuffled for `apply`.
const KEY_COLUMN: &str = "__groupby_key__";

/// What rows are grouped by.
#[derive(Debug, Clone)]
enum By {
    /// Columns of the grouped frame. Several columns group by tuples of their values.
    Columns(Vec<FieldName>),
    /// A series whose partitions match those of the grouped collection once aligned.
    Series(Series),
}

impl By {
    fn inputs<'a>(&'a self, source: &'a Collection) -> Vec<&'a Collection> {
        match self {
            By::Columns(_) => vec![source],
            By::Series(series) => vec![source, series.collection()],
        }
    }

    fn extractor(&self) -> KeyExtractor {
        match self {
            By::Columns(names) => KeyExtractor::Columns(names.clone()),
            By::Series(series) => KeyExtractor::Partition(series.name().cloned()),
        }
    }

    fn key_name(&self) -> String {
        match self {
            By::Columns(names) => names.iter().join(","),
            By::Series(series) => series.name().map(|n| n.to_string()).unwrap_or_default(),
        }
    }
}

/// Builds the local group keys from the arguments of a task.
#[derive(Debug, Clone)]
enum KeyExtractor {
    /// Columns of the frame in the first argument.
    Columns(Vec<FieldName>),
    /// The series in the second argument.
    Partition(Option<FieldName>),
}

impl KeyExtractor {
    fn keys(&self, parts: &[Datum]) -> StrataResult<GroupKeys> {
        match self {
            KeyExtractor::Columns(names) => {
                let frame = arg(parts, 0, "groupby")?.as_frame()?;
                let columns = names
                    .iter()
                    .map(|n| Ok(frame.column(n)?.values().clone()))
                    .collect::<StrataResult<Vec<_>>>()?;
                let name = match names.as_slice() {
                    [single] => Some(single.clone()),
                    _ => None,
                };
                GroupKeys::new(name, columns)
            }
            KeyExtractor::Partition(name) => {
                let key = arg(parts, 1, "groupby")?.as_series()?;
                Ok(GroupKeys::single(name.clone(), key.values().clone()))
            }
        }
    }
}

/// Regroup partial results by their index, which holds the group keys.
fn regroup(index: &strata_frame::Index) -> GroupKeys {
    GroupKeys::from_index(index)
}

/// A lazy frame grouped by key, see [`DataFrame::groupby`].
#[derive(Debug, Clone)]
pub struct GroupBy {
    frame: DataFrame,
    by: By,
    selection: FieldNames,
}

/// A lazy series grouped by key, see [`Series::groupby`] and [`GroupBy::column`].
#[derive(Debug, Clone)]
pub struct SeriesGroupBy {
    source: Collection,
    /// The grouped column of a frame source, `None` when the source is a series.
    column: Option<FieldName>,
    name: Option<FieldName>,
    by: By,
}

impl DataFrame {
    /// Group by one column.
    pub fn groupby(&self, column: &str) -> StrataResult<GroupBy> {
        self.groupby_columns(&[column])
    }

    /// Group by the tuple of values of several columns.
    pub fn groupby_columns<S: AsRef<str>>(&self, columns: &[S]) -> StrataResult<GroupBy> {
        if columns.is_empty() {
            strata_bail!("at least one group key is required");
        }
        let keys: Vec<FieldName> = columns
            .iter()
            .map(|c| self.require_column(c.as_ref()))
            .try_collect()?;
        let selection = self
            .columns()
            .iter()
            .filter(|c| !keys.contains(c))
            .cloned()
            .collect();
        Ok(GroupBy {
            frame: self.clone(),
            by: By::Columns(keys),
            selection,
        })
    }

    /// Group by the values of `key`, matched to rows by partition after aligning.
    pub fn groupby_series(&self, key: &Series) -> GroupBy {
        GroupBy {
            frame: self.clone(),
            by: By::Series(key.clone()),
            selection: self.columns().clone(),
        }
    }
}

impl Series {
    /// Group by the values of `key`, matched to rows by partition after aligning.
    pub fn groupby(&self, key: &Series) -> SeriesGroupBy {
        SeriesGroupBy {
            source: self.collection().clone(),
            column: None,
            name: self.name().cloned(),
            by: By::Series(key.clone()),
        }
    }
}

impl GroupBy {
    /// The columns aggregated, every column but the keys unless narrowed by [`GroupBy::columns`].
    pub fn selection(&self) -> &FieldNames {
        &self.selection
    }

    /// Aggregate a single column.
    pub fn column(&self, name: &str) -> StrataResult<SeriesGroupBy> {
        let column = self.frame.require_column(name)?;
        Ok(SeriesGroupBy {
            source: self.frame.collection().clone(),
            column: Some(column.clone()),
            name: Some(column),
            by: self.by.clone(),
        })
    }

    /// Aggregate only the named columns.
    pub fn columns<S: AsRef<str>>(&self, names: &[S]) -> StrataResult<GroupBy> {
        let selection: Vec<FieldName> = names
            .iter()
            .map(|n| self.frame.require_column(n.as_ref()))
            .try_collect()?;
        Ok(GroupBy {
            frame: self.frame.clone(),
            by: self.by.clone(),
            selection: selection.into(),
        })
    }

    fn aca(&self, reduction: Reduction) -> StrataResult<Collection> {
        let keys = self.by.extractor();
        let selection = self.selection.clone();
        let partial = partial_reduction(reduction);
        let aca = Aca::new(
            move |parts: &[Datum]| {
                let frame = arg(parts, 0, "dataframe-groupby")?.as_frame()?.select(&selection[..])?;
                check_selection(&frame, reduction)?;
                Ok(Datum::Frame(frame.groupby_reduce(&keys.keys(parts)?, reduction)?))
            },
            move |partials: Datum| {
                let partials = partials.as_frame()?;
                Ok(Datum::Frame(partials.groupby_reduce(&regroup(partials.index()), partial)?))
            },
        )
        .with_token(format!("dataframe-groupby-{reduction}"))
        .with_option("by", &self.by.key_name())
        .with_option("selection", &self.selection[..]);
        aca.run(&self.by.inputs(self.frame.collection()))
    }

    fn reduce(&self, reduction: Reduction) -> StrataResult<DataFrame> {
        Ok(DataFrame::from_collection(self.aca(reduction)?, self.selection.clone()))
    }

    pub fn sum(&self) -> StrataResult<DataFrame> {
        self.reduce(Reduction::Sum)
    }

    pub fn min(&self) -> StrataResult<DataFrame> {
        self.reduce(Reduction::Min)
    }

    pub fn max(&self) -> StrataResult<DataFrame> {
        self.reduce(Reduction::Max)
    }

    pub fn count(&self) -> StrataResult<DataFrame> {
        self.reduce(Reduction::Count)
    }

    /// Per-group sum divided by the per-group count.
    pub fn mean(&self) -> StrataResult<DataFrame> {
        let sums = self.aca(Reduction::Sum)?;
        let counts = self.aca(Reduction::Count)?;
        let collection = combine_results("dataframe-groupby-mean", &[&sums, &counts], |args: &[Datum]| {
            let sums = arg(args, 0, "dataframe-groupby-mean")?.as_frame()?;
            let counts = arg(args, 1, "dataframe-groupby-mean")?.as_frame()?;
            Ok(Datum::Frame(combine_columns(sums, &[counts], |name, columns| {
                let [sum, count] = columns else {
                    strata_bail!(ComputeError: "mean of {} needs a sum and a count", name);
                };
                Ok(mean_values(sum, count))
            })?))
        });
        Ok(DataFrame::from_collection(collection, self.selection.clone()))
    }

    fn moments(&self, label: String, ddof: u32, root: bool) -> StrataResult<DataFrame> {
        let sums = self.aca(Reduction::Sum)?;
        let squares = self.aca(Reduction::SumSquares)?;
        let counts = self.aca(Reduction::Count)?;
        let task = label.clone();
        let collection = combine_results(&label, &[&sums, &squares, &counts], move |args: &[Datum]| {
            let sums = arg(args, 0, &task)?.as_frame()?;
            let squares = arg(args, 1, &task)?.as_frame()?;
            let counts = arg(args, 2, &task)?.as_frame()?;
            Ok(Datum::Frame(combine_columns(sums, &[squares, counts], |name, columns| {
                let [sum, square, count] = columns else {
                    strata_bail!(ComputeError: "variance of {} needs three moments", name);
                };
                Ok(variance_values(sum, square, count, ddof, root))
            })?))
        });
        Ok(DataFrame::from_collection(collection, self.selection.clone()))
    }

    pub fn var(&self, ddof: u32) -> StrataResult<DataFrame> {
        self.moments(format!("dataframe-groupby-{}", Reduction::Var { ddof }), ddof, false)
    }

    pub fn std(&self, ddof: u32) -> StrataResult<DataFrame> {
        self.moments(format!("dataframe-groupby-{}", Reduction::Std { ddof }), ddof, true)
    }

    /// Apply `f` to the rows of every group, producing frames with `columns`.
    ///
    /// Rows are first hash-shuffled on the key so that each group lies in a single partition,
    /// so the result has unknown divisions.
    pub fn apply<F>(&self, columns: FieldNames, f: F) -> StrataResult<DataFrame>
    where
        F: Fn(&Frame) -> StrataResult<Frame> + Send + Sync + 'static,
    {
        let npartitions = self.frame.npartitions();
        let identity = function_identity(&f);
        let (shuffled, keys, temporary) = match &self.by {
            By::Columns(names) => (
                hash_shuffle(self.frame.collection(), names.clone(), npartitions)?,
                names.clone(),
                Vec::new(),
            ),
            By::Series(series) => {
                let with_key = self.frame.assign(KEY_COLUMN, series)?;
                let key: FieldName = KEY_COLUMN.into();
                (
                    hash_shuffle(with_key.collection(), vec![key.clone()], npartitions)?,
                    vec![key.clone()],
                    vec![key],
                )
            }
        };
        let group_name = match &self.by {
            By::Columns(names) if names.len() == 1 => Some(names[0].clone()),
            By::Series(series) => series.name().cloned(),
            By::Columns(_) => None,
        };
        let collection = shuffled.map_datum(
            "dataframe-groupby-apply",
            Tokenizer::new("dataframe-groupby-apply")
                .arg(&identity)
                .option("by", &self.by.key_name()),
            move |part| {
                let frame = part.as_frame()?;
                let columns = keys
                    .iter()
                    .map(|k| Ok(frame.column(k)?.values().clone()))
                    .collect::<StrataResult<Vec<_>>>()?;
                let group_keys = GroupKeys::new(group_name.clone(), columns)?;
                let values = frame.drop(&temporary[..])?;
                Ok(Datum::Frame(values.groupby_apply(&group_keys, &f)?))
            },
        );
        Ok(DataFrame::from_collection(collection, columns))
    }
}

/// Every selected column must take part in the reduction, so the result holds the columns the
/// lazy frame advertises.
fn check_selection(frame: &Frame, reduction: Reduction) -> StrataResult<()> {
    if let Some((name, column)) = frame
        .names()
        .iter()
        .zip(frame.columns())
        .find(|(_, c)| !reduction.accepts(c.dtype()))
    {
        strata_bail!(
            TypeMismatch: "cannot compute grouped {} of column '{}' with type {}, narrow the selection with columns()",
            reduction,
            name,
            column.dtype()
        );
    }
    Ok(())
}

/// Combine the columns of `first` with the same-named columns of `others`, row by row.
///
/// Every frame holds the same groups in the same order, as produced by reducing the same keys.
fn combine_columns<F>(first: &Frame, others: &[&Frame], f: F) -> StrataResult<Frame>
where
    F: Fn(&str, &[&Column]) -> StrataResult<Column>,
{
    if let Some(other) = others.iter().find(|o| o.index() != first.index()) {
        strata_bail!(
            ComputeError: "groups {} do not match groups {}",
            other.index(),
            first.index()
        );
    }
    let columns: Vec<Column> = first
        .names()
        .iter()
        .zip(first.columns())
        .map(|(name, column)| {
            let mut inputs = vec![column];
            for other in others {
                let pos = other.column_position(name);
                match pos.and_then(|p| other.columns().get(p)) {
                    Some(c) => inputs.push(c),
                    None => strata_bail!(NotFound: "column '{}' missing from a partial result", name),
                }
            }
            f(name, &inputs)
        })
        .try_collect()?;
    Frame::try_new(first.index().clone(), first.names().to_vec(), columns)
}

fn mean_values(sums: &Column, counts: &Column) -> Column {
    sums.iter()
        .zip(counts)
        .map(|(s, n)| match (s.as_f64(), n.as_f64()) {
            (Some(s), Some(n)) if n > 0.0 => Scalar::float(s / n),
            _ => Scalar::Null,
        })
        .collect()
}

fn variance_values(sums: &Column, squares: &Column, counts: &Column, ddof: u32, root: bool) -> Column {
    izip!(sums, squares, counts)
        .map(|(s, ss, n)| match compute::var_from_moments(s, ss, n, ddof) {
            Scalar::Float(v) if root => Scalar::float(v.sqrt()),
            other => other,
        })
        .collect()
}

impl SeriesGroupBy {
    pub fn name(&self) -> Option<&FieldName> {
        self.name.as_ref()
    }

    fn values(column: Option<&FieldName>, parts: &[Datum]) -> StrataResult<strata_frame::Series> {
        let source = arg(parts, 0, "series-groupby")?;
        match column {
            Some(name) => source.as_frame()?.column(name),
            None => Ok(source.as_series()?.clone()),
        }
    }

    fn aca(&self, reduction: Reduction) -> StrataResult<Collection> {
        let keys = self.by.extractor();
        let column = self.column.clone();
        let partial = partial_reduction(reduction);
        let aca = Aca::new(
            move |parts: &[Datum]| {
                let values = Self::values(column.as_ref(), parts)?;
                Ok(Datum::Series(values.groupby_reduce(&keys.keys(parts)?, reduction)?))
            },
            move |partials: Datum| {
                let partials = partials.as_series()?;
                Ok(Datum::Series(partials.groupby_reduce(&regroup(partials.index()), partial)?))
            },
        )
        .with_token(format!("series-groupby-{reduction}"))
        .with_option("by", &self.by.key_name())
        .with_option("column", &self.column);
        aca.run(&self.by.inputs(&self.source))
    }

    fn reduce(&self, reduction: Reduction) -> StrataResult<Series> {
        Ok(Series::from_collection(self.aca(reduction)?, self.name.clone()))
    }

    pub fn sum(&self) -> StrataResult<Series> {
        self.reduce(Reduction::Sum)
    }

    pub fn min(&self) -> StrataResult<Series> {
        self.reduce(Reduction::Min)
    }

    pub fn max(&self) -> StrataResult<Series> {
        self.reduce(Reduction::Max)
    }

    pub fn count(&self) -> StrataResult<Series> {
        self.reduce(Reduction::Count)
    }

    pub fn mean(&self) -> StrataResult<Series> {
        let sums = self.aca(Reduction::Sum)?;
        let counts = self.aca(Reduction::Count)?;
        let collection = combine_results("series-groupby-mean", &[&sums, &counts], |args: &[Datum]| {
            let sums = arg(args, 0, "series-groupby-mean")?.as_series()?;
            let counts = arg(args, 1, "series-groupby-mean")?.as_series()?;
            Ok(Datum::Series(sums.with_values(mean_values(sums.values(), counts.values()))?))
        });
        Ok(Series::from_collection(collection, self.name.clone()))
    }

    fn moments(&self, label: String, ddof: u32, root: bool) -> StrataResult<Series> {
        let sums = self.aca(Reduction::Sum)?;
        let squares = self.aca(Reduction::SumSquares)?;
        let counts = self.aca(Reduction::Count)?;
        let task = label.clone();
        let collection = combine_results(&label, &[&sums, &squares, &counts], move |args: &[Datum]| {
            let sums = arg(args, 0, &task)?.as_series()?;
            let squares = arg(args, 1, &task)?.as_series()?;
            let counts = arg(args, 2, &task)?.as_series()?;
            Ok(Datum::Series(sums.with_values(variance_values(
                sums.values(),
                squares.values(),
                counts.values(),
                ddof,
                root,
            ))?))
        });
        Ok(Series::from_collection(collection, self.name.clone()))
    }

    pub fn var(&self, ddof: u32) -> StrataResult<Series> {
        self.moments(format!("series-groupby-{}", Reduction::Var { ddof }), ddof, false)
    }

    pub fn std(&self, ddof: u32) -> StrataResult<Series> {
        self.moments(format!("series-groupby-{}", Reduction::Std { ddof }), ddof, true)
    }

    /// Number of distinct values per group.
    ///
    /// Each partition first drops repeated (key, value) pairs, so a value seen in several
    /// partitions is counted once for its group.
    pub fn nunique(&self) -> StrataResult<Series> {
        let keys = self.by.extractor();
        let column = self.column.clone();
        let aca = Aca::new(
            move |parts: &[Datum]| {
                let values = Self::values(column.as_ref(), parts)?;
                let keys = keys.keys(parts)?;
                let keyed = keyed_by_group(&values, &keys)?;
                Ok(Datum::Series(keyed.drop_duplicate_pairs()?))
            },
            |partials: Datum| {
                let pairs = partials.as_series()?.drop_duplicate_pairs()?;
                Ok(Datum::Series(pairs.groupby_reduce(&regroup(pairs.index()), Reduction::Nunique)?))
            },
        )
        .with_token("series-groupby-nunique")
        .with_option("by", &self.by.key_name())
        .with_option("column", &self.column);
        Ok(Series::from_collection(aca.run(&self.by.inputs(&self.source))?, self.name.clone()))
    }
}

/// `values` indexed by their group key instead of their row label, rows without a key dropped.
fn keyed_by_group(values: &strata_frame::Series, keys: &GroupKeys) -> StrataResult<strata_frame::Series> {
    let groups = keys.groups();
    let labels = groups.index();
    let (positions, group_labels): (Vec<usize>, Vec<Scalar>) = groups
        .rows()
        .iter()
        .enumerate()
        .flat_map(|(group, rows)| {
            let label = labels.get(group).cloned().unwrap_or(Scalar::Null);
            rows.iter().map(move |&row| (row, label.clone()))
        })
        .unzip();
    let index = strata_frame::Index::new(
        keys.name().cloned(),
        Column::with_dtype(labels.dtype(), group_labels),
    );
    strata_frame::Series::try_new(
        values.name().cloned(),
        index,
        compute::take(values.values(), &positions)?,
    )
}

#[cfg(test)]
mod test {
    use strata_dtype::field_names;

    use super::*;
    use crate::config::ComputeOptions;
    use crate::divisions::Divisions;

    /// `a = 1..=9`, `b = [4, 5, 6 | 3, 2, 1 | 0, 0, 0]`, `c` cycling `x y z`.
    fn frame() -> DataFrame {
        let part = |labels: Vec<i64>, a: Vec<i64>, b: Vec<i64>| {
            let local = Frame::from_columns([
                ("a", Column::from(a)),
                ("b", Column::from(b)),
                ("c", Column::from(vec!["x", "y", "z"])),
            ])
            .unwrap();
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
        DataFrame::from_collection(collection, field_names(["a", "b", "c"]))
    }

    fn sync() -> ComputeOptions {
        ComputeOptions::sync()
    }

    #[test]
    fn missing_keys_and_columns_are_not_found() {
        let df = frame();
        assert!(df.groupby("z").unwrap_err().is_not_found());
        let grouped = df.groupby("b").unwrap();
        assert!(grouped.column("z").unwrap_err().is_not_found());
        assert!(grouped.columns(&["a", "z"]).unwrap_err().is_not_found());
        assert_eq!(grouped.selection().len(), 2);
    }

    #[test]
    fn group_sums_combine_across_partitions() {
        let sums = frame().groupby("c").unwrap().column("a").unwrap().sum().unwrap();
        assert!(sums.graph().task_labels().contains("series-groupby-sum"));
        let local = sums.compute_with(&sync()).unwrap();
        assert_eq!(local.index().labels(), &Column::from(vec!["x", "y", "z"]));
        assert_eq!(local.values(), &Column::from(vec![12, 15, 18]));
        assert_eq!(local.name().map(|n| n.as_ref()), Some("a"));
    }

    #[test]
    fn frame_group_means() {
        let means = frame().groupby("c").unwrap().columns(&["a", "b"]).unwrap().mean().unwrap();
        assert!(means.graph().task_labels().contains("dataframe-groupby-mean"));
        let local = means.compute_with(&sync()).unwrap();
        assert_eq!(local.column("a").unwrap().values(), &Column::from(vec![4.0, 5.0, 6.0]));
        assert_eq!(
            local.column("b").unwrap().values(),
            &Column::from(vec![7.0 / 3.0, 7.0 / 3.0, 7.0 / 3.0])
        );
    }

    #[test]
    fn numeric_group_reductions_reject_string_columns() {
        let grouped = frame().groupby("b").unwrap();
        assert_eq!(grouped.selection(), &field_names(["a", "c"]));
        for lazy in [grouped.sum().unwrap(), grouped.mean().unwrap(), grouped.var(1).unwrap()] {
            assert!(lazy.compute_with(&sync()).unwrap_err().is_type_mismatch());
        }

        let counts = grouped.count().unwrap();
        let local = counts.compute_with(&sync()).unwrap();
        assert_eq!(local.names(), counts.columns());
        assert_eq!(local.column("c").unwrap().values().get(0), Some(&Scalar::from(3)));

        let sums = grouped.columns(&["a"]).unwrap().sum().unwrap();
        assert_eq!(sums.compute_with(&sync()).unwrap().names(), sums.columns());
    }

    #[test]
    fn group_variance() {
        let grouped = frame().groupby("c").unwrap().column("a").unwrap();
        let var = grouped.var(1).unwrap().compute_with(&sync()).unwrap();
        assert_eq!(var.values(), &Column::from(vec![9.0, 9.0, 9.0]));
        let std = grouped.std(0).unwrap().compute_with(&sync()).unwrap();
        assert_eq!(std.values().get(0), Some(&Scalar::from(6.0f64.sqrt())));
    }

    #[test]
    fn count_min_max() {
        let grouped = frame().groupby("b").unwrap().column("a").unwrap();
        let count = grouped.count().unwrap().compute_with(&sync()).unwrap();
        assert_eq!(count.index().first(), Some(&Scalar::from(0)));
        assert_eq!(count.values().get(0), Some(&Scalar::from(3)));
        let max = grouped.max().unwrap().compute_with(&sync()).unwrap();
        assert_eq!(max.values().get(0), Some(&Scalar::from(9)));
        let min = grouped.min().unwrap().compute_with(&sync()).unwrap();
        assert_eq!(min.values().get(0), Some(&Scalar::from(7)));
    }

    #[test]
    fn series_keys_and_nunique() {
        let df = frame();
        let parity = df.column("a").unwrap().modulo_scalar(2).unwrap();
        let nunique = df.column("c").unwrap().groupby(&parity).nunique().unwrap();
        let local = nunique.compute_with(&sync()).unwrap();
        assert_eq!(local.index().labels(), &Column::from(vec![0, 1]));
        assert_eq!(local.values(), &Column::from(vec![3, 3]));

        let by_flag = df.groupby_series(&df.column("b").unwrap().gt_scalar(2).unwrap());
        let sums = by_flag.columns(&["a"]).unwrap().sum().unwrap().compute_with(&sync()).unwrap();
        assert_eq!(sums.column("a").unwrap().values(), &Column::from(vec![35, 10]));
    }

    #[test]
    fn multiple_key_columns() {
        let df = frame();
        let flag = df.column("a").unwrap().gt_scalar(4).unwrap();
        let keyed = df.assign("big", &flag).unwrap();
        let counts = keyed.groupby_columns(&["c", "big"]).unwrap().count().unwrap();
        let local = counts.compute_with(&sync()).unwrap();
        assert_eq!(local.len(), 6);
        assert_eq!(local.index().first(), Some(&Scalar::tuple(["x".into(), false.into()])));
    }

    #[test]
    fn apply_sees_whole_groups() {
        let df = frame();
        let largest = df
            .groupby("c")
            .unwrap()
            .apply(field_names(["a"]), |group| group.nlargest(1, "a")?.select(&["a"]))
            .unwrap();
        assert!(!largest.known_divisions());
        assert!(largest.graph().task_labels().contains("dataframe-groupby-apply"));
        let local = largest.compute_with(&sync()).unwrap();
        let mut values = local.column("a").unwrap().values().values().to_vec();
        values.sort();
        assert_eq!(values, vec![Scalar::from(7), 8.into(), 9.into()]);
    }

    #[test]
    fn names_depend_on_keys() {
        let df = frame();
        let by_b = df.groupby("b").unwrap().column("a").unwrap().sum().unwrap();
        let by_c = df.groupby("c").unwrap().column("a").unwrap().sum().unwrap();
        assert_ne!(by_b.root_name(), by_c.root_name());
        let again = df.groupby("b").unwrap().column("a").unwrap().sum().unwrap();
        assert_eq!(by_b.root_name(), again.root_name());
    }
}
