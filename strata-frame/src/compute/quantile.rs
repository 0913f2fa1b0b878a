use strata_error::{StrataResult, strata_bail};
use strata_scalar::Scalar;

use crate::Column;

fn check_q(q: f64) -> StrataResult<()> {
    if !(0.0..=1.0).contains(&q) {
        strata_bail!("quantile must be between 0 and 1, got {}", q);
    }
    Ok(())
}

/// The `q`-th quantile of the valid values, interpolating linearly between neighbours.
///
/// Null when there are no valid values.
pub fn quantile(column: &Column, q: f64) -> StrataResult<Scalar> {
    check_q(q)?;
    if !column.dtype().is_moment_compatible() {
        strata_bail!(
            TypeMismatch: "cannot compute quantile of a column of type {}",
            column.dtype()
        );
    }
    let mut values: Vec<f64> = column.iter().filter_map(Scalar::as_f64).collect();
    if values.is_empty() {
        return Ok(Scalar::Null);
    }
    values.sort_by(f64::total_cmp);
    let pos = q * (values.len() - 1) as f64;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (lo, hi) = (pos.floor() as usize, pos.ceil() as usize);
    let frac = pos - pos.floor();
    Ok(Scalar::float(values[lo] + (values[hi] - values[lo]) * frac))
}

/// The `q`-th quantile picking an actual value, the lower neighbour when between two.
///
/// Works for any orderable type, e.g. to choose partition boundaries.
pub fn quantile_lower(column: &Column, q: f64) -> StrataResult<Scalar> {
    check_q(q)?;
    let mut values: Vec<&Scalar> = column.iter().filter(|v| v.is_valid()).collect();
    if values.is_empty() {
        return Ok(Scalar::Null);
    }
    values.sort();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let pos = (q * (values.len() - 1) as f64).floor() as usize;
    Ok(values[pos].clone())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn interpolates() {
        let col = Column::from(vec![4, 1, 3, 2]);
        assert_eq!(quantile(&col, 0.5).unwrap(), Scalar::from(2.5));
        assert_eq!(quantile(&col, 1.0).unwrap(), Scalar::from(4.0));
        assert_eq!(quantile_lower(&col, 0.5).unwrap(), Scalar::from(2));
        assert!(quantile(&col, 1.5).unwrap_err().is_invalid_argument());
        assert!(quantile(&Column::empty(strata_dtype::DType::Int64), 0.5).unwrap().is_null());
    }
}
