use std::fmt::{Display, Formatter};
use std::ops::Range;

use strata_dtype::{DType, FieldName};
use strata_error::StrataResult;
use strata_scalar::Scalar;

use crate::Column;
use crate::compute;

/// Row labels of a [`Series`](crate::Series) or [`Frame`](crate::Frame).
///
/// Labels may repeat and need not be sorted, although every partition of a collection with
/// known divisions holds a sorted index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    name: Option<FieldName>,
    labels: Column,
}

impl Index {
    pub fn new(name: Option<FieldName>, labels: Column) -> Self {
        Self { name, labels }
    }

    /// An unnamed index of the positions `0..len`.
    pub fn range(len: usize) -> Self {
        Self::new(None, Column::range(len))
    }

    pub fn name(&self) -> Option<&FieldName> {
        self.name.as_ref()
    }

    pub fn with_name(self, name: Option<FieldName>) -> Self {
        Self { name, ..self }
    }

    pub fn labels(&self) -> &Column {
        &self.labels
    }

    pub fn dtype(&self) -> DType {
        self.labels.dtype()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Scalar> {
        self.labels.get(idx)
    }

    pub fn first(&self) -> Option<&Scalar> {
        self.labels.values().first()
    }

    pub fn last(&self) -> Option<&Scalar> {
        self.labels.values().last()
    }

    pub fn is_monotonic_increasing(&self) -> bool {
        self.labels.is_sorted()
    }

    pub fn min(&self) -> Scalar {
        compute::min(&self.labels)
    }

    pub fn max(&self) -> Scalar {
        compute::max(&self.labels)
    }

    pub fn take(&self, positions: &[usize]) -> StrataResult<Index> {
        Ok(Self::new(self.name.clone(), compute::take(&self.labels, positions)?))
    }

    pub fn slice(&self, range: Range<usize>) -> Index {
        Self::new(self.name.clone(), compute::slice(&self.labels, range))
    }

    /// Positions of labels within `[lower, upper]`, either end unbounded when `None`.
    ///
    /// With `include_upper == false` the upper bound is exclusive. Null labels never match.
    pub fn positions_between(
        &self,
        lower: Option<&Scalar>,
        upper: Option<&Scalar>,
        include_upper: bool,
    ) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, label)| {
                label.is_valid()
                    && lower.is_none_or(|lo| *label >= lo)
                    && upper.is_none_or(|hi| if include_upper { *label <= hi } else { *label < hi })
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Positions of labels equal to `label`.
    pub fn positions_of(&self, label: &Scalar) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, l)| *l == label)
            .map(|(i, _)| i)
            .collect()
    }

    /// Concatenate indexes. The name survives only when every input shares it.
    pub fn concat<'a, I>(indexes: I) -> Index
    where
        I: IntoIterator<Item = &'a Index>,
    {
        let indexes: Vec<&Index> = indexes.into_iter().collect();
        let name = common_name(indexes.iter().map(|i| i.name()));
        Index::new(name, compute::concat(indexes.iter().map(|i| &i.labels)))
    }
}

/// The name shared by every item, or `None` when they disagree.
pub(crate) fn common_name<'a, I>(names: I) -> Option<FieldName>
where
    I: IntoIterator<Item = Option<&'a FieldName>>,
{
    let mut names = names.into_iter();
    let first = names.next().flatten().cloned();
    names
        .all(|n| n == first.as_ref())
        .then_some(first)
        .flatten()
}

impl From<Column> for Index {
    fn from(labels: Column) -> Self {
        Self::new(None, labels)
    }
}

impl Display for Index {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "Index({name}: {})", self.labels),
            None => write!(f, "Index({})", self.labels),
        }
    }
}
