use std::fmt::{Display, Formatter};
use std::ops::Range;

use itertools::Itertools;
use strata_dtype::{DType, FieldName};
use strata_error::{StrataResult, strata_bail};
use strata_scalar::{BinaryOperator, Scalar, UnaryOperator};

use crate::align::{align_outer, lookup_positions, sort_permutation};
use crate::compute::{self, Reduction};
use crate::{Column, Frame, Index};

/// A named column of values together with its row labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    name: Option<FieldName>,
    index: Index,
    values: Column,
}

impl Series {
    /// Create a series, checking that the index and values have the same length.
    pub fn try_new(name: Option<FieldName>, index: Index, values: Column) -> StrataResult<Self> {
        if index.len() != values.len() {
            strata_bail!(
                "index of length {} does not match values of length {}",
                index.len(),
                values.len()
            );
        }
        Ok(Self {
            name,
            index,
            values,
        })
    }

    /// Create a series labelled by position.
    pub fn new(name: Option<FieldName>, values: Column) -> Self {
        Self {
            name,
            index: Index::range(values.len()),
            values,
        }
    }

    /// An empty series of the given type.
    pub fn empty(name: Option<FieldName>, dtype: DType, index_dtype: DType) -> Self {
        Self {
            name,
            index: Index::from(Column::empty(index_dtype)),
            values: Column::empty(dtype),
        }
    }

    pub fn name(&self) -> Option<&FieldName> {
        self.name.as_ref()
    }

    pub fn with_name(self, name: Option<FieldName>) -> Self {
        Self { name, ..self }
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn values(&self) -> &Column {
        &self.values
    }

    pub fn dtype(&self) -> DType {
        self.values.dtype()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_parts(self) -> (Option<FieldName>, Index, Column) {
        (self.name, self.index, self.values)
    }

    /// Replace the values, keeping the name and index.
    pub fn with_values(&self, values: Column) -> StrataResult<Series> {
        Series::try_new(self.name.clone(), self.index.clone(), values)
    }

    pub fn with_index(self, index: Index) -> StrataResult<Series> {
        Series::try_new(self.name, index, self.values)
    }

    pub fn take(&self, positions: &[usize]) -> StrataResult<Series> {
        Series::try_new(
            self.name.clone(),
            self.index.take(positions)?,
            compute::take(&self.values, positions)?,
        )
    }

    pub fn slice(&self, range: Range<usize>) -> Series {
        Series {
            name: self.name.clone(),
            index: self.index.slice(range.clone()),
            values: compute::slice(&self.values, range),
        }
    }

    pub fn head(&self, n: usize) -> Series {
        self.slice(0..n)
    }

    pub fn tail(&self, n: usize) -> Series {
        self.slice(self.len().saturating_sub(n)..self.len())
    }

    /// Keep the rows where `mask` is true.
    pub fn filter(&self, mask: &[bool]) -> StrataResult<Series> {
        if mask.len() != self.len() {
            strata_bail!(
                "mask.len() is {}, does not equal series length {}",
                mask.len(),
                self.len()
            );
        }
        self.take(&mask.iter().positions(|m| *m).collect_vec())
    }

    /// Keep the rows whose label maps to a truthy value in `mask`.
    pub fn filter_by(&self, mask: &Series) -> StrataResult<Series> {
        let keep = mask.aligned_to(&self.index);
        self.take(&compute::mask_positions(&keep))
    }

    /// Rows whose label lies in `[lower, upper]`, the upper end exclusive unless `include_upper`.
    pub fn loc_range(
        &self,
        lower: Option<&Scalar>,
        upper: Option<&Scalar>,
        include_upper: bool,
    ) -> StrataResult<Series> {
        self.take(&self.index.positions_between(lower, upper, include_upper))
    }

    /// Rows labelled `label`.
    pub fn loc_label(&self, label: &Scalar) -> StrataResult<Series> {
        self.take(&self.index.positions_of(label))
    }

    /// The values reordered to the labels of `target`, null where a label is missing.
    pub fn aligned_to(&self, target: &Index) -> Column {
        if self.index.labels() == target.labels() {
            return self.values.clone();
        }
        compute::take_opt(&self.values, &lookup_positions(target, &self.index))
    }

    pub fn sort_index(&self) -> StrataResult<Series> {
        if self.index.is_monotonic_increasing() {
            return Ok(self.clone());
        }
        self.take(&sort_permutation(&self.index))
    }

    /// Concatenate series end to end. The name survives only when shared by all inputs.
    pub fn concat<'a, I>(series: I) -> StrataResult<Series>
    where
        I: IntoIterator<Item = &'a Series>,
    {
        let series = series.into_iter().collect_vec();
        let name = crate::index::common_name(series.iter().map(|s| s.name()));
        Series::try_new(
            name,
            Index::concat(series.iter().map(|s| &s.index)),
            compute::concat(series.iter().map(|s| &s.values)),
        )
    }

    /// Apply `op` between two series, aligning them on their labels first.
    ///
    /// The result keeps the name only when both names agree.
    pub fn binary(&self, other: &Series, op: BinaryOperator) -> StrataResult<Series> {
        let aligned = align_outer(&self.index, &other.index);
        let lhs = compute::take_opt(&self.values, &aligned.left);
        let rhs = compute::take_opt(&other.values, &aligned.right);
        let name = (self.name == other.name).then(|| self.name.clone()).flatten();
        Series::try_new(name, aligned.index, compute::binary(&lhs, &rhs, op)?)
    }

    pub fn binary_scalar(
        &self,
        scalar: &Scalar,
        op: BinaryOperator,
        reversed: bool,
    ) -> StrataResult<Series> {
        self.with_values(compute::binary_scalar(&self.values, scalar, op, reversed)?)
    }

    pub fn unary(&self, op: UnaryOperator) -> StrataResult<Series> {
        self.with_values(compute::unary(&self.values, op)?)
    }

    pub fn reduce(&self, reduction: Reduction) -> StrataResult<Scalar> {
        compute::reduce(&self.values, reduction)
    }

    /// The first occurrence of every distinct value.
    pub fn drop_duplicates(&self) -> StrataResult<Series> {
        self.take(&compute::first_occurrences(&self.values))
    }

    /// Drop rows whose label and value both repeat an earlier row.
    pub fn drop_duplicate_pairs(&self) -> StrataResult<Series> {
        self.take(&compute::first_occurrences_rows(&[
            self.index.labels(),
            &self.values,
        ]))
    }

    /// The `n` largest values, largest first.
    pub fn nlargest(&self, n: usize) -> StrataResult<Series> {
        self.take(&compute::nlargest_positions(&self.values, n))
    }

    /// Frequencies of each distinct value, indexed by the value.
    pub fn value_counts(&self) -> StrataResult<Series> {
        let (values, counts) = compute::value_counts(&self.values);
        Series::try_new(
            Some("count".into()),
            Index::new(self.name.clone(), values),
            counts,
        )
    }

    pub fn isnull(&self) -> StrataResult<Series> {
        self.with_values(compute::is_null(&self.values))
    }

    pub fn notnull(&self) -> StrataResult<Series> {
        self.with_values(compute::is_not_null(&self.values))
    }

    pub fn dropna(&self) -> StrataResult<Series> {
        self.filter(&compute::valid_mask(&self.values))
    }

    pub fn fillna(&self, fill: &Scalar) -> StrataResult<Series> {
        self.with_values(compute::fill_null(&self.values, fill))
    }

    pub fn isin(&self, values: &[Scalar]) -> StrataResult<Series> {
        self.with_values(compute::is_in(&self.values, values))
    }

    pub fn between(&self, lower: &Scalar, upper: &Scalar) -> StrataResult<Series> {
        self.with_values(compute::between(&self.values, lower, upper)?)
    }

    pub fn clip(&self, lower: Option<&Scalar>, upper: Option<&Scalar>) -> StrataResult<Series> {
        self.with_values(compute::clip(&self.values, lower, upper)?)
    }

    pub fn astype(&self, dtype: DType) -> StrataResult<Series> {
        let values = self.values.map(|v| v.cast(dtype))?;
        self.with_values(Column::with_dtype(dtype, values.values().to_vec()))
    }

    /// Apply `f` to every value.
    pub fn map<F>(&self, f: F) -> StrataResult<Series>
    where
        F: Fn(&Scalar) -> StrataResult<Scalar>,
    {
        self.with_values(self.values.map(f)?)
    }

    pub fn quantile(&self, q: f64) -> StrataResult<Scalar> {
        compute::quantile(&self.values, q)
    }

    /// A one-column frame. An unnamed series becomes column `0`.
    pub fn to_frame(&self) -> StrataResult<Frame> {
        let name = self.name.clone().unwrap_or_else(|| "0".into());
        Frame::try_new(self.index.clone(), vec![name], vec![self.values.clone()])
    }
}

impl Display for Series {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = self.name.as_deref().unwrap_or("None");
        writeln!(f, "Series {name} ({})", self.dtype())?;
        for (label, value) in self.index.labels().iter().zip(self.values.iter()) {
            writeln!(f, "{label}\t{value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use strata_scalar::BinaryOperator::*;

    use super::*;

    fn series(labels: Vec<i64>, values: Vec<i64>) -> Series {
        Series::try_new(
            Some("a".into()),
            Index::from(Column::from(labels)),
            Column::from(values),
        )
        .unwrap()
    }

    #[test]
    fn aligned_binary() {
        let a = series(vec![0, 1, 2], vec![1, 2, 3]);
        let b = series(vec![1, 2, 3], vec![10, 20, 30]);
        let sum = a.binary(&b, Add).unwrap();
        assert_eq!(sum.index().labels(), &Column::from(vec![0, 1, 2, 3]));
        assert_eq!(
            sum.values(),
            &Column::new(vec![Scalar::Null, 12.into(), 23.into(), Scalar::Null])
        );
        assert_eq!(sum.name().map(|n| n.as_ref()), Some("a"));
        let renamed = b.with_name(Some("b".into()));
        assert_eq!(a.binary(&renamed, Add).unwrap().name(), None);
    }

    #[test]
    fn selection() {
        let s = series(vec![0, 1, 3, 5, 6], vec![1, 2, 3, 4, 5]);
        assert_eq!(
            s.loc_range(Some(&1.into()), Some(&5.into()), false)
                .unwrap()
                .values(),
            &Column::from(vec![2, 3])
        );
        assert_eq!(s.head(2).len(), 2);
        assert_eq!(s.tail(10).len(), 5);
        let mask = s.binary_scalar(&3.into(), Gt, false).unwrap();
        assert_eq!(s.filter_by(&mask).unwrap().values(), &Column::from(vec![4, 5]));
    }

    #[test]
    fn value_counts_and_uniques() {
        let s = series(vec![0, 1, 2, 3], vec![5, 5, 7, 5]);
        let counts = s.value_counts().unwrap();
        assert_eq!(counts.index().labels(), &Column::from(vec![5, 7]));
        assert_eq!(counts.values(), &Column::from(vec![3, 1]));
        assert_eq!(s.drop_duplicates().unwrap().len(), 2);
        assert_eq!(s.nlargest(1).unwrap().values(), &Column::from(vec![7]));
    }

    #[test]
    fn length_mismatch() {
        assert!(Series::try_new(None, Index::range(2), Column::from(vec![1])).is_err());
    }
}
