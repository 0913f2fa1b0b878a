//! Reductions of lazy series and frames, built on apply-concat-apply.
//!
//! Every reduction that can be computed from partial results (sum, count, min, max) runs the
//! local reduction per partition and again over the partials. Means combine a sum and a count,
//! variances combine the first two moments and a count.

use itertools::{Itertools, izip};
use strata_dtype::FieldName;
use strata_error::{StrataResult, strata_bail};
use strata_frame::compute::{self, Reduction};
use strata_frame::groupby::GroupKeys;
use strata_frame::{Column, Frame};
use strata_graph::Tokenizer;
use strata_scalar::Scalar;

use crate::aca::{Aca, combine_results};
use crate::collection::Partitioned;
use crate::config::Axis;
use crate::datum::{Datum, arg};
use crate::frame::DataFrame;
use crate::scalar::LazyScalar;
use crate::series::Series;

/// The reduction applied to partial results, e.g. counts are summed.
pub(crate) fn partial_reduction(reduction: Reduction) -> Reduction {
    match reduction {
        Reduction::Count | Reduction::SumSquares => Reduction::Sum,
        other => other,
    }
}

fn moments(index: strata_frame::Index, sums: Column, squares: Column, counts: Column) -> StrataResult<Frame> {
    Frame::try_new(
        index,
        vec!["sum".into(), "sum-squares".into(), "count".into()],
        vec![sums, squares, counts],
    )
}

fn series_moments(series: &strata_frame::Series) -> StrataResult<Frame> {
    moments(
        strata_frame::Index::range(1),
        Column::new(vec![series.reduce(Reduction::Sum)?]),
        Column::new(vec![series.reduce(Reduction::SumSquares)?]),
        Column::new(vec![series.reduce(Reduction::Count)?]),
    )
}

/// One row of moments per numeric column, indexed by column name.
fn frame_moments(frame: &Frame) -> StrataResult<Frame> {
    let sums = frame.reduce(Reduction::Sum)?;
    let squares = frame.reduce(Reduction::SumSquares)?;
    let counts: Vec<Scalar> = sums
        .index()
        .labels()
        .iter()
        .map(|label| match label {
            Scalar::Utf8(name) => Ok(compute::count(frame.column(name)?.values())),
            other => strata_bail!(ComputeError: "column label {} is not a name", other),
        })
        .try_collect()?;
    moments(
        sums.index().clone(),
        sums.values().clone(),
        squares.values().clone(),
        Column::new(counts),
    )
}

/// Sum the partial moments of every label and turn them into a variance, or a standard
/// deviation when `root` is set.
fn variance_by_label(partials: &Frame, ddof: u32, root: bool) -> StrataResult<strata_frame::Series> {
    if partials.is_empty() {
        return Ok(strata_frame::Series::new(None, Column::new(Vec::new())));
    }
    let totals = partials.groupby_reduce(&GroupKeys::from_index(partials.index()), Reduction::Sum)?;
    let sums = totals.column("sum")?;
    let squares = totals.column("sum-squares")?;
    let counts = totals.column("count")?;
    let values = izip!(sums.values(), squares.values(), counts.values())
        .map(|(s, ss, n)| match compute::var_from_moments(s, ss, n, ddof) {
            Scalar::Float(v) if root => Scalar::float(v.sqrt()),
            other => other,
        })
        .collect();
    strata_frame::Series::try_new(None, totals.index().clone(), Column::new(values))
}

/// `sum / count`, null when the count is zero.
fn divide_mean(sum: &Scalar, count: &Scalar) -> Scalar {
    match (sum.as_f64(), count.as_f64()) {
        (Some(s), Some(n)) if n > 0.0 => Scalar::float(s / n),
        _ => Scalar::Null,
    }
}

/// Reorder a series indexed by column name to follow `columns`, skipping absent names.
fn in_column_order(series: &strata_frame::Series, columns: &[FieldName]) -> StrataResult<strata_frame::Series> {
    let positions = columns
        .iter()
        .filter_map(|c| series.index().positions_of(&Scalar::from(c.clone())).first().copied())
        .collect_vec();
    series.take(&positions)
}

fn check_quantile(q: f64) -> StrataResult<()> {
    if !(0.0..=1.0).contains(&q) {
        strata_bail!("quantile must be between 0 and 1, got {}", q);
    }
    Ok(())
}

impl Series {
    fn reduce(&self, reduction: Reduction) -> StrataResult<LazyScalar> {
        let partial = partial_reduction(reduction);
        let aca = Aca::new(
            move |parts: &[Datum]| {
                Ok(Datum::Scalar(arg(parts, 0, "series-reduce")?.as_series()?.reduce(reduction)?))
            },
            move |partials: Datum| Ok(Datum::Scalar(partials.as_series()?.reduce(partial)?)),
        )
        .with_token(format!("series-{reduction}"));
        Ok(LazyScalar::from_collection(aca.run(&[self.collection()])?))
    }

    pub fn sum(&self) -> StrataResult<LazyScalar> {
        self.reduce(Reduction::Sum)
    }

    pub fn min(&self) -> StrataResult<LazyScalar> {
        self.reduce(Reduction::Min)
    }

    pub fn max(&self) -> StrataResult<LazyScalar> {
        self.reduce(Reduction::Max)
    }

    /// Number of non-null values.
    pub fn count(&self) -> StrataResult<LazyScalar> {
        self.reduce(Reduction::Count)
    }

    /// The sum divided by the count.
    pub fn mean(&self) -> StrataResult<LazyScalar> {
        let sum = self.sum()?;
        let count = self.count()?;
        Ok(LazyScalar::from_collection(combine_results(
            "series-mean",
            &[sum.collection(), count.collection()],
            |args: &[Datum]| {
                let sum = arg(args, 0, "series-mean")?.as_scalar()?;
                let count = arg(args, 1, "series-mean")?.as_scalar()?;
                Ok(Datum::Scalar(divide_mean(sum, count)))
            },
        )))
    }

    fn moments_reduction(&self, reduction: Reduction, ddof: u32, root: bool) -> StrataResult<LazyScalar> {
        let aca = Aca::new(
            |parts: &[Datum]| Ok(Datum::Frame(series_moments(arg(parts, 0, "series-moments")?.as_series()?)?)),
            move |partials: Datum| {
                let variance = variance_by_label(partials.as_frame()?, ddof, root)?;
                Ok(Datum::Scalar(variance.values().values().first().cloned().unwrap_or(Scalar::Null)))
            },
        )
        .with_token(format!("series-{reduction}"));
        Ok(LazyScalar::from_collection(aca.run(&[self.collection()])?))
    }

    /// Variance with `ddof` delta degrees of freedom, from the sum, sum of squares and count.
    ///
    /// Null when there are no more than `ddof` values.
    pub fn var(&self, ddof: u32) -> StrataResult<LazyScalar> {
        self.moments_reduction(Reduction::Var { ddof }, ddof, false)
    }

    pub fn std(&self, ddof: u32) -> StrataResult<LazyScalar> {
        self.moments_reduction(Reduction::Std { ddof }, ddof, true)
    }

    /// The distinct values, in order of first appearance.
    pub fn drop_duplicates(&self) -> StrataResult<Series> {
        let aca = Aca::new(
            |parts: &[Datum]| Ok(Datum::Series(arg(parts, 0, "drop-duplicates")?.as_series()?.drop_duplicates()?)),
            |partials: Datum| Ok(Datum::Series(partials.as_series()?.drop_duplicates()?)),
        )
        .with_token("drop-duplicates");
        Ok(self.with_collection(aca.run(&[self.collection()])?))
    }

    /// Number of distinct non-null values.
    ///
    /// Counts the union of the distinct values of every partition, so a value repeated in
    /// several partitions is counted once.
    pub fn nunique(&self) -> StrataResult<LazyScalar> {
        let distinct = self.drop_duplicates()?;
        Ok(LazyScalar::from_collection(distinct.collection().map_datum(
            "series-nunique",
            Tokenizer::new("series-nunique"),
            |d| Ok(Datum::Scalar(d.as_series()?.reduce(Reduction::Nunique)?)),
        )))
    }

    /// The `n` largest values, largest first.
    pub fn nlargest(&self, n: usize) -> StrataResult<Series> {
        let aca = Aca::new(
            move |parts: &[Datum]| Ok(Datum::Series(arg(parts, 0, "series-nlargest")?.as_series()?.nlargest(n)?)),
            move |partials: Datum| Ok(Datum::Series(partials.as_series()?.nlargest(n)?)),
        )
        .with_token("series-nlargest")
        .with_option("n", &n);
        Ok(self.with_collection(aca.run(&[self.collection()])?))
    }

    /// How often each distinct value occurs, most frequent first.
    pub fn value_counts(&self) -> StrataResult<Series> {
        let aca = Aca::new(
            |parts: &[Datum]| Ok(Datum::Series(arg(parts, 0, "value-counts")?.as_series()?.value_counts()?)),
            |partials: Datum| {
                let partials = partials.as_series()?;
                let totals = partials.groupby_reduce(&GroupKeys::from_index(partials.index()), Reduction::Sum)?;
                Ok(Datum::Series(totals.take(&compute::argsort_descending(totals.values()))?))
            },
        )
        .with_token("value-counts");
        Ok(Series::from_collection(aca.run(&[self.collection()])?, Some("count".into())))
    }

    /// Exact quantiles over every value, interpolating linearly. The result is indexed by `qs`.
    pub fn quantile(&self, qs: &[f64]) -> StrataResult<Series> {
        qs.iter().try_for_each(|q| check_quantile(*q))?;
        let levels = qs.to_vec();
        let name = self.name().cloned();
        let aca = Aca::new(
            |parts: &[Datum]| Ok(Datum::Series(arg(parts, 0, "series-quantile")?.as_series()?.dropna()?)),
            move |values: Datum| {
                let values = values.as_series()?;
                let quantiles: Vec<Scalar> = levels.iter().map(|q| values.quantile(*q)).try_collect()?;
                let index = strata_frame::Index::from(Column::from(levels.clone()));
                Ok(Datum::Series(strata_frame::Series::try_new(
                    name.clone(),
                    index,
                    Column::new(quantiles),
                )?))
            },
        )
        .with_token("series-quantile")
        .with_option("q", &qs.iter().map(|q| q.to_bits()).collect_vec());
        Ok(self.with_collection(aca.run(&[self.collection()])?))
    }

    /// Approximate quantiles from per-partition percentiles. Not supported, use
    /// [`Series::quantile`].
    pub fn quantiles(&self, _qs: &[f64]) -> StrataResult<Series> {
        strata_bail!(NotImplemented: "approximate quantiles")
    }
}

impl DataFrame {
    fn reduce(&self, reduction: Reduction, axis: Axis) -> StrataResult<Series> {
        match axis {
            Axis::Index => self.reduce_columns(reduction),
            Axis::Columns => {
                let label = format!("dataframe-{reduction}-rows");
                let collection = self.collection().map_datum(&label, Tokenizer::new(&label), move |d| {
                    Ok(Datum::Series(d.as_frame()?.reduce_rows(reduction)?))
                });
                Ok(Series::from_collection(collection, None))
            }
        }
    }

    /// One value per column, indexed by column name.
    fn reduce_columns(&self, reduction: Reduction) -> StrataResult<Series> {
        let partial = partial_reduction(reduction);
        let columns = self.columns().clone();
        let aca = Aca::new(
            move |parts: &[Datum]| {
                Ok(Datum::Series(arg(parts, 0, "dataframe-reduce")?.as_frame()?.reduce(reduction)?))
            },
            move |partials: Datum| {
                let partials = partials.as_series()?;
                let combined = partials.groupby_reduce(&GroupKeys::from_index(partials.index()), partial)?;
                Ok(Datum::Series(in_column_order(&combined, &columns)?))
            },
        )
        .with_token(format!("dataframe-{reduction}"));
        Ok(Series::from_collection(aca.run(&[self.collection()])?, None))
    }

    fn moments_reduction(&self, reduction: Reduction, ddof: u32, root: bool) -> StrataResult<Series> {
        let columns = self.columns().clone();
        let aca = Aca::new(
            |parts: &[Datum]| Ok(Datum::Frame(frame_moments(arg(parts, 0, "dataframe-moments")?.as_frame()?)?)),
            move |partials: Datum| {
                let variance = variance_by_label(partials.as_frame()?, ddof, root)?;
                Ok(Datum::Series(in_column_order(&variance, &columns)?))
            },
        )
        .with_token(format!("dataframe-{reduction}"));
        Ok(Series::from_collection(aca.run(&[self.collection()])?, None))
    }

    pub fn sum(&self, axis: Axis) -> StrataResult<Series> {
        self.reduce(Reduction::Sum, axis)
    }

    pub fn min(&self, axis: Axis) -> StrataResult<Series> {
        self.reduce(Reduction::Min, axis)
    }

    pub fn max(&self, axis: Axis) -> StrataResult<Series> {
        self.reduce(Reduction::Max, axis)
    }

    pub fn count(&self, axis: Axis) -> StrataResult<Series> {
        self.reduce(Reduction::Count, axis)
    }

    /// Column means combine a per-column sum and count; row means stay partitioned.
    pub fn mean(&self, axis: Axis) -> StrataResult<Series> {
        if axis == Axis::Columns {
            return self.reduce(Reduction::Mean, axis);
        }
        let sums = self.reduce_columns(Reduction::Sum)?;
        let counts = self.reduce_columns(Reduction::Count)?;
        let collection = combine_results(
            "dataframe-mean",
            &[sums.collection(), counts.collection()],
            |args: &[Datum]| {
                let sums = arg(args, 0, "dataframe-mean")?.as_series()?;
                let counts = arg(args, 1, "dataframe-mean")?.as_series()?;
                let means = sums
                    .index()
                    .labels()
                    .iter()
                    .zip(sums.values())
                    .map(|(label, sum)| {
                        let count = counts
                            .index()
                            .positions_of(label)
                            .first()
                            .and_then(|&p| counts.values().get(p))
                            .cloned()
                            .unwrap_or(Scalar::Null);
                        divide_mean(sum, &count)
                    })
                    .collect();
                Ok(Datum::Series(sums.with_values(Column::new(means))?))
            },
        );
        Ok(Series::from_collection(collection, None))
    }

    pub fn var(&self, ddof: u32, axis: Axis) -> StrataResult<Series> {
        match axis {
            Axis::Index => self.moments_reduction(Reduction::Var { ddof }, ddof, false),
            Axis::Columns => self.reduce(Reduction::Var { ddof }, axis),
        }
    }

    pub fn std(&self, ddof: u32, axis: Axis) -> StrataResult<Series> {
        match axis {
            Axis::Index => self.moments_reduction(Reduction::Std { ddof }, ddof, true),
            Axis::Columns => self.reduce(Reduction::Std { ddof }, axis),
        }
    }

    /// The first occurrence of every distinct row over `subset`, or over all columns.
    pub fn drop_duplicates<S: AsRef<str>>(&self, subset: Option<&[S]>) -> StrataResult<DataFrame> {
        let subset: Option<Vec<FieldName>> = subset
            .map(|names| names.iter().map(|n| self.require_column(n.as_ref())).try_collect())
            .transpose()?;
        let chunk_subset = subset.clone();
        let subset_option = subset.clone();
        let aca = Aca::new(
            move |parts: &[Datum]| {
                let frame = arg(parts, 0, "drop-duplicates")?.as_frame()?;
                Ok(Datum::Frame(frame.drop_duplicates(chunk_subset.as_deref())?))
            },
            move |partials: Datum| Ok(Datum::Frame(partials.as_frame()?.drop_duplicates(subset.as_deref())?)),
        )
        .with_token("drop-duplicates")
        .with_option("subset", &subset_option);
        Ok(self.with_collection(aca.run(&[self.collection()])?))
    }

    /// The `n` rows with the largest values in `column`, largest first.
    pub fn nlargest(&self, n: usize, column: &str) -> StrataResult<DataFrame> {
        let column = self.require_column(column)?;
        let chunk_column = column.clone();
        let option_column = column.clone();
        let aca = Aca::new(
            move |parts: &[Datum]| {
                Ok(Datum::Frame(arg(parts, 0, "dataframe-nlargest")?.as_frame()?.nlargest(n, &chunk_column)?))
            },
            move |partials: Datum| Ok(Datum::Frame(partials.as_frame()?.nlargest(n, &column)?)),
        )
        .with_token("dataframe-nlargest")
        .with_option("n", &n)
        .with_option("column", option_column.as_ref());
        Ok(self.with_collection(aca.run(&[self.collection()])?))
    }
}

#[cfg(test)]
mod test {
    use rstest::rstest;
    use strata_dtype::field_names;

    use super::*;
    use crate::collection::Collection;
    use crate::config::ComputeOptions;
    use crate::divisions::Divisions;

    fn partitions(values: Vec<Vec<Scalar>>) -> Collection {
        let mut start = 0;
        let parts = values
            .into_iter()
            .map(|part| {
                let labels = (start..start + part.len() as i64).collect_vec();
                start += part.len() as i64;
                let index = strata_frame::Index::from(Column::from(labels));
                Datum::Series(strata_frame::Series::try_new(Some("x".into()), index, Column::new(part)).unwrap())
            })
            .collect_vec();
        let n = parts.len();
        Collection::from_partitions("values".into(), parts, Divisions::unknown(n)).unwrap()
    }

    fn series(values: Vec<Vec<i64>>) -> Series {
        let values = values
            .into_iter()
            .map(|p| p.into_iter().map(Scalar::from).collect())
            .collect();
        Series::from_collection(partitions(values), Some("x".into()))
    }

    fn frame() -> DataFrame {
        let part = |a: Vec<i64>, b: Vec<f64>, s: Vec<&str>| {
            Datum::Frame(
                Frame::from_columns([
                    ("a", Column::from(a)),
                    ("b", Column::from(b)),
                    ("s", Column::from(s)),
                ])
                .unwrap(),
            )
        };
        let collection = Collection::from_partitions(
            "frame".into(),
            vec![
                part(vec![1, 2], vec![0.5, 1.5], vec!["x", "y"]),
                part(vec![3, 4, 5], vec![2.0, 2.0, 4.0], vec!["z", "x", "w"]),
            ],
            Divisions::unknown(2),
        )
        .unwrap();
        DataFrame::from_collection(collection, field_names(["a", "b", "s"]))
    }

    fn value(scalar: &LazyScalar) -> Scalar {
        scalar.compute_with(&ComputeOptions::sync()).unwrap()
    }

    #[test]
    fn series_reductions() {
        let s = series(vec![vec![1, 2], vec![], vec![3, 4, 5]]);
        assert_eq!(value(&s.sum().unwrap()), Scalar::from(15));
        assert_eq!(value(&s.min().unwrap()), Scalar::from(1));
        assert_eq!(value(&s.max().unwrap()), Scalar::from(5));
        assert_eq!(value(&s.count().unwrap()), Scalar::from(5));
        assert_eq!(value(&s.mean().unwrap()), Scalar::from(3.0));
        assert_eq!(value(&s.var(1).unwrap()), Scalar::from(2.5));
        assert_eq!(value(&s.var(0).unwrap()), Scalar::from(2.0));
    }

    #[test]
    fn reductions_are_named_by_kind() {
        let s = series(vec![vec![1, 2], vec![3]]);
        assert!(s.sum().unwrap().key().name().starts_with("series-sum-agg-"));
        let var = s.var(1).unwrap();
        assert!(var.graph().task_labels().contains("series-var(ddof=1)"));
        assert_ne!(s.var(0).unwrap().key(), var.key());
        assert_eq!(s.var(1).unwrap().key(), var.key());
    }

    #[test]
    fn variance_needs_more_values_than_ddof() {
        let s = series(vec![vec![7]]);
        assert_eq!(value(&s.var(1).unwrap()), Scalar::Null);
        assert_eq!(value(&s.std(0).unwrap()), Scalar::from(0.0));
    }

    #[test]
    fn numeric_reductions_reject_strings() {
        let words = Series::from_collection(
            partitions(vec![vec!["a".into(), "b".into()], vec!["c".into()]]),
            Some("x".into()),
        );
        let options = ComputeOptions::sync();
        assert!(words.sum().unwrap().compute_with(&options).unwrap_err().is_type_mismatch());
        assert!(words.var(1).unwrap().compute_with(&options).unwrap_err().is_type_mismatch());
        assert_eq!(value(&words.max().unwrap()), Scalar::from("c"));
        assert_eq!(value(&words.count().unwrap()), Scalar::from(3));
    }

    #[test]
    fn nunique_counts_across_partitions() {
        let s = series(vec![vec![1, 2, 2], vec![2, 3], vec![1]]);
        let nunique = s.nunique().unwrap();
        assert!(nunique.graph().task_labels().contains("drop-duplicates"));
        assert_eq!(value(&nunique), Scalar::from(3));
        let distinct = s.drop_duplicates().unwrap().compute_with(&ComputeOptions::sync()).unwrap();
        assert_eq!(distinct.values(), &Column::from(vec![1, 2, 3]));
    }

    #[test]
    fn nlargest_and_value_counts() {
        let s = series(vec![vec![5, 1, 9], vec![7, 9], vec![2]]);
        let options = ComputeOptions::sync();
        let top = s.nlargest(3).unwrap().compute_with(&options).unwrap();
        assert_eq!(top.values(), &Column::from(vec![9, 9, 7]));
        let counts = s.value_counts().unwrap().compute_with(&options).unwrap();
        assert_eq!(counts.index().first(), Some(&Scalar::from(9)));
        assert_eq!(counts.values().get(0), Some(&Scalar::from(2)));
        assert_eq!(counts.len(), 5);
    }

    #[rstest]
    #[case(0.0, 1.0)]
    #[case(0.5, 3.0)]
    #[case(1.0, 5.0)]
    #[case(0.25, 2.0)]
    fn exact_quantiles(#[case] q: f64, #[case] expected: f64) {
        let s = series(vec![vec![5, 1], vec![3], vec![2, 4]]);
        let quantiles = s.quantile(&[q]).unwrap().compute_with(&ComputeOptions::sync()).unwrap();
        assert_eq!(quantiles.values().get(0), Some(&Scalar::from(expected)));
    }

    #[test]
    fn quantile_options() {
        let s = series(vec![vec![1]]);
        assert!(s.quantile(&[1.5]).unwrap_err().is_invalid_argument());
        assert!(s.quantiles(&[0.5]).unwrap_err().is_not_implemented());
    }

    #[test]
    fn frame_column_reductions_keep_column_order() {
        let df = frame();
        let options = ComputeOptions::sync();
        let sums = df.sum(Axis::Index).unwrap().compute_with(&options).unwrap();
        assert_eq!(sums.index().labels(), &Column::from(vec!["a", "b"]));
        assert_eq!(sums.values(), &Column::new(vec![15.into(), 10.0.into()]));
        let counts = df.count(Axis::Index).unwrap().compute_with(&options).unwrap();
        assert_eq!(counts.index().labels(), &Column::from(vec!["a", "b", "s"]));
        assert_eq!(counts.values(), &Column::from(vec![5, 5, 5]));
        let means = df.mean(Axis::Index).unwrap().compute_with(&options).unwrap();
        assert_eq!(means.values(), &Column::from(vec![3.0, 2.0]));
        let var = df.var(0, Axis::Index).unwrap().compute_with(&options).unwrap();
        assert_eq!(var.values().get(0), Some(&Scalar::from(2.0)));
    }

    #[test]
    fn frame_row_reductions_stay_partitioned() {
        let df = frame();
        let rows = df.sum(Axis::Columns).unwrap();
        assert_eq!(rows.npartitions(), 2);
        let rows = rows.compute_with(&ComputeOptions::sync()).unwrap();
        assert_eq!(rows.values(), &Column::from(vec![1.5, 3.5, 5.0, 6.0, 9.0]));
    }

    #[test]
    fn frame_dedup_and_nlargest() {
        let df = frame();
        let options = ComputeOptions::sync();
        let distinct = df.drop_duplicates(Some(&["b"][..])).unwrap().compute_with(&options).unwrap();
        assert_eq!(distinct.len(), 4);
        let top = df.nlargest(2, "a").unwrap().compute_with(&options).unwrap();
        assert_eq!(top.column("a").unwrap().values(), &Column::from(vec![5, 4]));
        assert!(df.nlargest(2, "missing").unwrap_err().is_not_found());
        assert!(df.drop_duplicates(Some(&["missing"][..])).unwrap_err().is_not_found());
    }
}
