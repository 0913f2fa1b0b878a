use strata_error::{StrataResult, strata_bail};
use strata_scalar::{BinaryOperator, Scalar, UnaryOperator};

use crate::Column;

/// Apply `op` element-wise to two columns of equal length.
pub fn binary(lhs: &Column, rhs: &Column, op: BinaryOperator) -> StrataResult<Column> {
    if lhs.len() != rhs.len() {
        strata_bail!(
            "cannot apply {} to columns of length {} and {}",
            op,
            lhs.len(),
            rhs.len()
        );
    }
    lhs.zip_with(rhs, |a, b| a.binary(b, op))
}

/// Apply `op` between each value and a scalar. With `reversed` the scalar is the left operand.
pub fn binary_scalar(
    column: &Column,
    scalar: &Scalar,
    op: BinaryOperator,
    reversed: bool,
) -> StrataResult<Column> {
    if reversed {
        column.map(|v| scalar.binary(v, op))
    } else {
        column.map(|v| v.binary(scalar, op))
    }
}

/// Apply a unary operator element-wise.
pub fn unary(column: &Column, op: UnaryOperator) -> StrataResult<Column> {
    column.map(|v| v.unary(op))
}

#[cfg(test)]
mod test {
    use strata_scalar::BinaryOperator::*;

    use super::*;

    #[test]
    fn elementwise() {
        let a = Column::from(vec![1, 2, 3]);
        let b = Column::from(vec![10, 20, 30]);
        assert_eq!(binary(&a, &b, Add).unwrap(), Column::from(vec![11, 22, 33]));
        assert_eq!(
            binary_scalar(&a, &1.into(), Sub, true).unwrap(),
            Column::from(vec![0, -1, -2])
        );
        assert_eq!(
            binary_scalar(&a, &2.into(), Gt, false).unwrap(),
            Column::from(vec![false, false, true])
        );
        assert!(binary(&a, &Column::from(vec![1]), Add).is_err());
    }
}
