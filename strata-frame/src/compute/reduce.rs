use std::fmt::{Display, Formatter};

use hashbrown::HashSet;
use jiff::SignedDuration;
use strata_dtype::DType;
use strata_error::{StrataResult, strata_bail};
use strata_scalar::{BinaryOperator, Scalar};

use crate::Column;

/// A reduction of a column to a single value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reduction {
    Sum,
    Min,
    Max,
    /// Number of valid values
    Count,
    Mean,
    Var { ddof: u32 },
    Std { ddof: u32 },
    /// Number of distinct valid values
    Nunique,
    /// Sum of each value squared, the second moment used by variance
    SumSquares,
}

impl Reduction {
    /// Whether the reduction only makes sense for numbers, and frames should skip other columns.
    pub fn is_numeric_only(&self) -> bool {
        matches!(
            self,
            Reduction::Sum
                | Reduction::Mean
                | Reduction::Var { .. }
                | Reduction::Std { .. }
                | Reduction::SumSquares
        )
    }

    /// Whether a column of type `dtype` takes part when a frame applies this reduction.
    pub fn accepts(&self, dtype: DType) -> bool {
        !self.is_numeric_only() || dtype.is_moment_compatible()
    }
}

impl Display for Reduction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Reduction::Sum => write!(f, "sum"),
            Reduction::Min => write!(f, "min"),
            Reduction::Max => write!(f, "max"),
            Reduction::Count => write!(f, "count"),
            Reduction::Mean => write!(f, "mean"),
            Reduction::Var { ddof } => write!(f, "var(ddof={ddof})"),
            Reduction::Std { ddof } => write!(f, "std(ddof={ddof})"),
            Reduction::Nunique => write!(f, "nunique"),
            Reduction::SumSquares => write!(f, "sum-squares"),
        }
    }
}

/// Apply `reduction` to `column`.
pub fn reduce(column: &Column, reduction: Reduction) -> StrataResult<Scalar> {
    match reduction {
        Reduction::Sum => sum(column),
        Reduction::Min => Ok(min(column)),
        Reduction::Max => Ok(max(column)),
        Reduction::Count => Ok(count(column)),
        Reduction::Mean => mean(column),
        Reduction::Var { ddof } => var(column, ddof),
        Reduction::Std { ddof } => std(column, ddof),
        Reduction::Nunique => Ok(nunique(column)),
        Reduction::SumSquares => sum_squares(column),
    }
}

fn check_moment_compatible(column: &Column, what: &str) -> StrataResult<()> {
    if !column.dtype().is_moment_compatible() {
        strata_bail!(
            TypeMismatch: "cannot compute {} of a column of type {}",
            what,
            column.dtype()
        );
    }
    Ok(())
}

/// Sum the valid values. An empty or all-null column sums to zero.
pub fn sum(column: &Column) -> StrataResult<Scalar> {
    let zero = match column.dtype() {
        DType::Null | DType::Bool | DType::Int64 => Scalar::Int(0),
        DType::Float64 => Scalar::Float(0.0),
        DType::Duration => Scalar::Duration(SignedDuration::ZERO),
        other => strata_bail!(TypeMismatch: "cannot compute sum of a column of type {}", other),
    };
    column
        .iter()
        .filter(|v| v.is_valid())
        .try_fold(zero, |acc, v| acc.binary(v, BinaryOperator::Add))
}

/// Sum of squares of the valid values, as a float.
pub fn sum_squares(column: &Column) -> StrataResult<Scalar> {
    check_moment_compatible(column, "sum of squares")?;
    Ok(Scalar::Float(
        column
            .iter()
            .filter_map(Scalar::as_f64)
            .map(|v| v * v)
            .sum(),
    ))
}

/// The smallest valid value, null when there is none.
pub fn min(column: &Column) -> Scalar {
    column
        .iter()
        .filter(|v| v.is_valid())
        .min()
        .cloned()
        .unwrap_or(Scalar::Null)
}

/// The largest valid value, null when there is none.
pub fn max(column: &Column) -> Scalar {
    column
        .iter()
        .filter(|v| v.is_valid())
        .max()
        .cloned()
        .unwrap_or(Scalar::Null)
}

pub fn count(column: &Column) -> Scalar {
    Scalar::from(column.len() - column.null_count())
}

/// Arithmetic mean of the valid values, null when there is none.
pub fn mean(column: &Column) -> StrataResult<Scalar> {
    check_moment_compatible(column, "mean")?;
    let values: Vec<f64> = column.iter().filter_map(Scalar::as_f64).collect();
    if values.is_empty() {
        return Ok(Scalar::Null);
    }
    Ok(Scalar::float(values.iter().sum::<f64>() / values.len() as f64))
}

/// Variance with `ddof` delta degrees of freedom, using the two-pass definition.
///
/// Null when there are no more than `ddof` valid values.
pub fn var(column: &Column, ddof: u32) -> StrataResult<Scalar> {
    check_moment_compatible(column, "variance")?;
    let values: Vec<f64> = column.iter().filter_map(Scalar::as_f64).collect();
    let n = values.len() as f64;
    if n <= f64::from(ddof) {
        return Ok(Scalar::Null);
    }
    let mean = values.iter().sum::<f64>() / n;
    let ss: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    Ok(Scalar::float(ss / (n - f64::from(ddof))))
}

pub fn std(column: &Column, ddof: u32) -> StrataResult<Scalar> {
    Ok(match var(column, ddof)? {
        Scalar::Float(v) => Scalar::float(v.sqrt()),
        other => other,
    })
}

/// Number of distinct valid values.
pub fn nunique(column: &Column) -> Scalar {
    let distinct: HashSet<&Scalar> = column.iter().filter(|v| v.is_valid()).collect();
    Scalar::from(distinct.len())
}

/// Combine moment statistics into a variance: `sumsq/n - (sum/n)^2`, scaled by `n/(n-ddof)`.
///
/// The variance is undefined when `n <= ddof`. Float scalars never carry NaN, so the
/// undefined result is the missing value `Scalar::Null`, the same thing `Scalar::float(f64::NAN)`
/// produces.
pub fn var_from_moments(sum: &Scalar, sum_squares: &Scalar, count: &Scalar, ddof: u32) -> Scalar {
    let (Some(s), Some(ss), Some(n)) = (sum.as_f64(), sum_squares.as_f64(), count.as_f64()) else {
        return Scalar::Null;
    };
    if n <= f64::from(ddof) {
        return Scalar::Null;
    }
    let mean = s / n;
    let population = ss / n - mean * mean;
    Scalar::float((population * n / (n - f64::from(ddof))).max(0.0))
}
