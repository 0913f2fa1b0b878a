use std::fmt::{Display, Formatter};
use std::ops::Range;
use std::sync::Arc;

use itertools::Itertools;
use strata_dtype::{DType, FieldName, FieldNames, display_names, position_of};
use strata_error::{StrataResult, strata_bail, strata_err};
use strata_scalar::{BinaryOperator, Scalar, UnaryOperator};

use crate::align::{align_outer, sort_permutation};
use crate::compute::{self, Reduction};
use crate::{Column, Index, Series};

/// Whether a row is dropped when any or only when all of its values are null.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DropNaHow {
    #[default]
    Any,
    All,
}

/// A table: named columns of equal length sharing one index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    index: Index,
    names: FieldNames,
    columns: Arc<[Column]>,
}

impl Frame {
    /// Create a frame, checking column lengths and name uniqueness.
    pub fn try_new(index: Index, names: Vec<FieldName>, columns: Vec<Column>) -> StrataResult<Self> {
        if names.len() != columns.len() {
            strata_bail!(
                "got {} column names for {} columns",
                names.len(),
                columns.len()
            );
        }
        if let Some(dup) = names.iter().duplicates().next() {
            strata_bail!("duplicate column name '{}'", dup);
        }
        if let Some(col) = columns.iter().find(|c| c.len() != index.len()) {
            strata_bail!(
                "column of length {} does not match index of length {}",
                col.len(),
                index.len()
            );
        }
        Ok(Self {
            index,
            names: names.into(),
            columns: columns.into(),
        })
    }

    /// Create a frame labelled by position from `(name, column)` pairs.
    pub fn from_columns<I, S>(columns: I) -> StrataResult<Self>
    where
        I: IntoIterator<Item = (S, Column)>,
        S: AsRef<str>,
    {
        let (names, columns): (Vec<FieldName>, Vec<Column>) = columns
            .into_iter()
            .map(|(n, c)| (FieldName::from(n.as_ref()), c))
            .unzip();
        let len = columns.first().map(Column::len).unwrap_or(0);
        Frame::try_new(Index::range(len), names, columns)
    }

    /// A frame with the same columns and types but no rows.
    pub fn empty_like(&self) -> Frame {
        Frame {
            index: Index::new(self.index.name().cloned(), Column::empty(self.index.dtype())),
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| Column::empty(c.dtype())).collect(),
        }
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn names(&self) -> &FieldNames {
        &self.names
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn dtypes(&self) -> Vec<DType> {
        self.columns.iter().map(Column::dtype).collect()
    }

    pub fn column_position(&self, name: &str) -> Option<usize> {
        position_of(&self.names, name)
    }

    fn require_position(&self, name: &str) -> StrataResult<usize> {
        self.column_position(name).ok_or_else(|| {
            strata_err!(
                NotFound: "column '{}' not found in {}",
                name,
                display_names(&self.names)
            )
        })
    }

    /// A single column as a series sharing the frame's index.
    pub fn column(&self, name: &str) -> StrataResult<Series> {
        let pos = self.require_position(name)?;
        Series::try_new(
            Some(self.names[pos].clone()),
            self.index.clone(),
            self.columns[pos].clone(),
        )
    }

    /// The named columns, in the order given.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> StrataResult<Frame> {
        let positions: Vec<usize> = names
            .iter()
            .map(|n| self.require_position(n.as_ref()))
            .try_collect()?;
        Frame::try_new(
            self.index.clone(),
            positions.iter().map(|&p| self.names[p].clone()).collect(),
            positions.iter().map(|&p| self.columns[p].clone()).collect(),
        )
    }

    /// Add or replace a column, aligning `series` to this frame's labels.
    pub fn assign(&self, name: &str, series: &Series) -> StrataResult<Frame> {
        let values = series.aligned_to(&self.index);
        let mut names = self.names.to_vec();
        let mut columns = self.columns.to_vec();
        match self.column_position(name) {
            Some(pos) => columns[pos] = values,
            None => {
                names.push(name.into());
                columns.push(values);
            }
        }
        Frame::try_new(self.index.clone(), names, columns)
    }

    /// Remove the named columns.
    pub fn drop<S: AsRef<str>>(&self, names: &[S]) -> StrataResult<Frame> {
        let drop: Vec<usize> = names
            .iter()
            .map(|n| self.require_position(n.as_ref()))
            .try_collect()?;
        let keep = (0..self.num_columns()).filter(|p| !drop.contains(p)).collect_vec();
        Frame::try_new(
            self.index.clone(),
            keep.iter().map(|&p| self.names[p].clone()).collect(),
            keep.iter().map(|&p| self.columns[p].clone()).collect(),
        )
    }

    pub fn with_index(&self, index: Index) -> StrataResult<Frame> {
        Frame::try_new(index, self.names.to_vec(), self.columns.to_vec())
    }

    /// Move a column into the index.
    pub fn set_index(&self, name: &str) -> StrataResult<Frame> {
        let pos = self.require_position(name)?;
        let index = Index::new(Some(self.names[pos].clone()), self.columns[pos].clone());
        self.drop(&[name])?.with_index(index)
    }

    /// Use `key`, aligned on labels, as the new index. All columns are kept.
    pub fn set_index_series(&self, key: &Series) -> StrataResult<Frame> {
        let labels = key.aligned_to(&self.index);
        self.with_index(Index::new(key.name().cloned(), labels))
    }

    /// One row's values, in column order.
    pub fn row(&self, row: usize) -> Vec<Scalar> {
        self.columns
            .iter()
            .map(|c| c.get(row).cloned().unwrap_or(Scalar::Null))
            .collect()
    }

    pub fn take(&self, positions: &[usize]) -> StrataResult<Frame> {
        Ok(Frame {
            index: self.index.take(positions)?,
            names: self.names.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| compute::take(c, positions))
                .try_collect::<_, Vec<_>, _>()?
                .into(),
        })
    }

    pub fn slice(&self, range: Range<usize>) -> Frame {
        Frame {
            index: self.index.slice(range.clone()),
            names: self.names.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| compute::slice(c, range.clone()))
                .collect(),
        }
    }

    pub fn head(&self, n: usize) -> Frame {
        self.slice(0..n)
    }

    pub fn tail(&self, n: usize) -> Frame {
        self.slice(self.len().saturating_sub(n)..self.len())
    }

    pub fn filter(&self, mask: &[bool]) -> StrataResult<Frame> {
        if mask.len() != self.len() {
            strata_bail!(
                "mask.len() is {}, does not equal frame length {}",
                mask.len(),
                self.len()
            );
        }
        self.take(&mask.iter().positions(|m| *m).collect_vec())
    }

    /// Keep the rows whose label maps to a truthy value in `mask`.
    pub fn filter_by(&self, mask: &Series) -> StrataResult<Frame> {
        let keep = mask.aligned_to(&self.index);
        self.take(&compute::mask_positions(&keep))
    }

    pub fn loc_range(
        &self,
        lower: Option<&Scalar>,
        upper: Option<&Scalar>,
        include_upper: bool,
    ) -> StrataResult<Frame> {
        self.take(&self.index.positions_between(lower, upper, include_upper))
    }

    pub fn loc_label(&self, label: &Scalar) -> StrataResult<Frame> {
        self.take(&self.index.positions_of(label))
    }

    pub fn sort_index(&self) -> StrataResult<Frame> {
        if self.index.is_monotonic_increasing() {
            return Ok(self.clone());
        }
        self.take(&sort_permutation(&self.index))
    }

    /// Stack frames vertically. Columns are the union of all inputs in order of first appearance,
    /// filled with nulls where an input lacks them.
    pub fn concat<'a, I>(frames: I) -> StrataResult<Frame>
    where
        I: IntoIterator<Item = &'a Frame>,
    {
        let frames = frames.into_iter().collect_vec();
        let names: Vec<FieldName> = frames
            .iter()
            .flat_map(|f| f.names.iter().cloned())
            .unique()
            .collect();
        let columns = names
            .iter()
            .map(|name| {
                let parts = frames
                    .iter()
                    .map(|f| match f.column_position(name) {
                        Some(p) => f.columns[p].clone(),
                        None => Column::nulls(DType::Null, f.len()),
                    })
                    .collect_vec();
                compute::concat(parts.iter())
            })
            .collect_vec();
        Frame::try_new(Index::concat(frames.iter().map(|f| &f.index)), names, columns)
    }

    /// Apply `op` between two frames, aligning rows on labels and columns on names.
    ///
    /// A column present on one side only produces nulls.
    pub fn binary(&self, other: &Frame, op: BinaryOperator) -> StrataResult<Frame> {
        let aligned = align_outer(&self.index, &other.index);
        let names: Vec<FieldName> = self
            .names
            .iter()
            .chain(other.names.iter())
            .unique()
            .cloned()
            .collect();
        let columns = names
            .iter()
            .map(|name| {
                match (self.column_position(name), other.column_position(name)) {
                    (Some(l), Some(r)) => compute::binary(
                        &compute::take_opt(&self.columns[l], &aligned.left),
                        &compute::take_opt(&other.columns[r], &aligned.right),
                        op,
                    ),
                    _ => Ok(Column::nulls(DType::Null, aligned.index.len())),
                }
            })
            .try_collect()?;
        Frame::try_new(aligned.index, names, columns)
    }

    /// Apply `f` to every column.
    pub fn map_columns<F>(&self, f: F) -> StrataResult<Frame>
    where
        F: Fn(&Column) -> StrataResult<Column>,
    {
        Frame::try_new(
            self.index.clone(),
            self.names.to_vec(),
            self.columns.iter().map(f).try_collect()?,
        )
    }

    pub fn binary_scalar(
        &self,
        scalar: &Scalar,
        op: BinaryOperator,
        reversed: bool,
    ) -> StrataResult<Frame> {
        self.map_columns(|c| compute::binary_scalar(c, scalar, op, reversed))
    }

    pub fn unary(&self, op: UnaryOperator) -> StrataResult<Frame> {
        self.map_columns(|c| compute::unary(c, op))
    }

    pub fn isnull(&self) -> StrataResult<Frame> {
        self.map_columns(|c| Ok(compute::is_null(c)))
    }

    pub fn notnull(&self) -> StrataResult<Frame> {
        self.map_columns(|c| Ok(compute::is_not_null(c)))
    }

    pub fn fillna(&self, fill: &Scalar) -> StrataResult<Frame> {
        self.map_columns(|c| Ok(compute::fill_null(c, fill)))
    }

    pub fn astype(&self, dtype: DType) -> StrataResult<Frame> {
        self.map_columns(|c| {
            let values: Vec<Scalar> = c.iter().map(|v| v.cast(dtype)).try_collect()?;
            Ok(Column::with_dtype(dtype, values))
        })
    }

    pub fn clip(&self, lower: Option<&Scalar>, upper: Option<&Scalar>) -> StrataResult<Frame> {
        self.map_columns(|c| compute::clip(c, lower, upper))
    }

    /// Drop rows with nulls in the `subset` columns, or in all columns when `subset` is `None`.
    pub fn dropna<S: AsRef<str>>(&self, how: DropNaHow, subset: Option<&[S]>) -> StrataResult<Frame> {
        let columns = match subset {
            Some(names) => self.select(names)?.columns.to_vec(),
            None => self.columns.to_vec(),
        };
        let mask = (0..self.len())
            .map(|row| {
                let mut nulls = columns.iter().map(|c| c.values()[row].is_null());
                match how {
                    DropNaHow::Any => !nulls.any(|n| n),
                    DropNaHow::All => columns.is_empty() || !nulls.all(|n| n),
                }
            })
            .collect_vec();
        self.filter(&mask)
    }

    /// The first occurrence of every distinct row over `subset`, or over all columns.
    pub fn drop_duplicates<S: AsRef<str>>(&self, subset: Option<&[S]>) -> StrataResult<Frame> {
        let frame = match subset {
            Some(names) => self.select(names)?,
            None => self.clone(),
        };
        let columns = frame.columns.iter().collect_vec();
        self.take(&compute::first_occurrences_rows(&columns))
    }

    /// The `n` rows with the largest values in `column`, largest first.
    pub fn nlargest(&self, n: usize, column: &str) -> StrataResult<Frame> {
        let pos = self.require_position(column)?;
        self.take(&compute::nlargest_positions(&self.columns[pos], n))
    }

    /// Reduce each column to one value, producing a series indexed by column name.
    ///
    /// Numeric-only reductions skip columns of other types.
    pub fn reduce(&self, reduction: Reduction) -> StrataResult<Series> {
        let (names, values): (Vec<Scalar>, Vec<Scalar>) = self
            .names
            .iter()
            .zip(self.columns.iter())
            .filter(|(_, c)| reduction.accepts(c.dtype()))
            .map(|(n, c)| Ok((Scalar::from(n.clone()), compute::reduce(c, reduction)?)))
            .collect::<StrataResult<Vec<_>>>()?
            .into_iter()
            .unzip();
        Series::try_new(
            None,
            Index::from(Column::with_dtype(DType::Utf8, names)),
            Column::new(values),
        )
    }

    /// Reduce each row to one value over the accepted columns, keeping the index.
    pub fn reduce_rows(&self, reduction: Reduction) -> StrataResult<Series> {
        let accepted = self
            .columns
            .iter()
            .filter(|c| reduction.accepts(c.dtype()))
            .collect_vec();
        let values: Vec<Scalar> = (0..self.len())
            .map(|row| {
                let row_values = Column::new(
                    accepted
                        .iter()
                        .map(|c| c.values()[row].clone())
                        .collect(),
                );
                compute::reduce(&row_values, reduction)
            })
            .try_collect()?;
        Series::try_new(None, self.index.clone(), Column::new(values))
    }
}

impl Display for Frame {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\t{}", self.names.iter().join("\t"))?;
        for row in 0..self.len() {
            let label = self.index.get(row).cloned().unwrap_or(Scalar::Null);
            writeln!(f, "{label}\t{}", self.row(row).iter().join("\t"))?;
        }
        Ok(())
    }
}
