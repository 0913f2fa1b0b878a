use std::fmt::{Display, Formatter};
use std::sync::Arc;

use itertools::Itertools;
use strata_dtype::DType;
use strata_error::{StrataResult, strata_bail};
use strata_scalar::Scalar;

/// An immutable, cheaply cloneable sequence of values sharing one logical type.
#[derive(Debug, Clone)]
pub struct Column {
    dtype: DType,
    values: Arc<[Scalar]>,
}

impl Column {
    /// Create a column, inferring its type from the values.
    pub fn new(values: Vec<Scalar>) -> Self {
        let dtype = infer_dtype(&values);
        Self {
            dtype,
            values: values.into(),
        }
    }

    /// Create a column with an explicit type, e.g. to keep the type of an empty result.
    pub fn with_dtype(dtype: DType, values: Vec<Scalar>) -> Self {
        Self {
            dtype,
            values: values.into(),
        }
    }

    pub fn empty(dtype: DType) -> Self {
        Self::with_dtype(dtype, Vec::new())
    }

    /// A column of `len` nulls.
    pub fn nulls(dtype: DType, len: usize) -> Self {
        Self::with_dtype(dtype, vec![Scalar::Null; len])
    }

    /// The integers `0..len`.
    pub fn range(len: usize) -> Self {
        Self::with_dtype(DType::Int64, (0..len).map(Scalar::from).collect())
    }

    #[inline]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn values(&self) -> &[Scalar] {
        &self.values
    }

    pub fn get(&self, idx: usize) -> Option<&Scalar> {
        self.values.get(idx)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Scalar> {
        self.values.iter()
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }

    /// Apply `f` to each value, inferring the type of the result.
    pub fn map<F>(&self, f: F) -> StrataResult<Column>
    where
        F: Fn(&Scalar) -> StrataResult<Scalar>,
    {
        Ok(Column::new(self.values.iter().map(f).try_collect()?))
    }

    /// Zip two columns of equal length through `f`.
    pub fn zip_with<F>(&self, other: &Column, f: F) -> StrataResult<Column>
    where
        F: Fn(&Scalar, &Scalar) -> StrataResult<Scalar>,
    {
        if self.len() != other.len() {
            strata_bail!(
                "columns must have equal lengths, got {} and {}",
                self.len(),
                other.len()
            );
        }
        Ok(Column::new(
            self.values
                .iter()
                .zip(other.values.iter())
                .map(|(a, b)| f(a, b))
                .try_collect()?,
        ))
    }

    /// Whether the values are sorted ascending, nulls ordering first.
    pub fn is_sorted(&self) -> bool {
        self.values.iter().tuple_windows().all(|(a, b)| a <= b)
    }
}

/// The narrowest type able to hold every value.
pub fn infer_dtype(values: &[Scalar]) -> DType {
    values
        .iter()
        .fold(DType::Null, |acc, v| acc.unify(&v.dtype()))
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl Eq for Column {}

impl FromIterator<Scalar> for Column {
    fn from_iter<T: IntoIterator<Item = Scalar>>(iter: T) -> Self {
        Column::new(iter.into_iter().collect())
    }
}

impl<T> From<Vec<T>> for Column
where
    Scalar: From<T>,
{
    fn from(value: Vec<T>) -> Self {
        value.into_iter().map(Scalar::from).collect()
    }
}

impl<'a> IntoIterator for &'a Column {
    type Item = &'a Scalar;
    type IntoIter = std::slice::Iter<'a, Scalar>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl Display for Column {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.values.iter().format(", "))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn infers_widest_type() {
        assert_eq!(Column::from(vec![1, 2]).dtype(), DType::Int64);
        let mixed = Column::new(vec![1.into(), Scalar::Null, 2.5.into()]);
        assert_eq!(mixed.dtype(), DType::Float64);
        assert_eq!(mixed.null_count(), 1);
        assert_eq!(Column::new(vec![1.into(), "a".into()]).dtype(), DType::Object);
    }

    #[test]
    fn zip_requires_equal_length() {
        let a = Column::from(vec![1, 2]);
        let b = Column::from(vec![1]);
        assert!(a.zip_with(&b, |x, _| Ok(x.clone())).is_err());
    }
}
