use hashbrown::HashSet;
use strata_error::StrataResult;
use strata_scalar::{BinaryOperator, Scalar};

use crate::Column;

/// Whether each value lies in `[lower, upper]`. Nulls are never between.
pub fn between(column: &Column, lower: &Scalar, upper: &Scalar) -> StrataResult<Column> {
    column.map(|v| {
        let above = v.binary(lower, BinaryOperator::Gte)?;
        let below = v.binary(upper, BinaryOperator::Lte)?;
        above.binary(&below, BinaryOperator::And)
    })
}

/// Limit values to `[lower, upper]`, either bound optional. Nulls stay null.
pub fn clip(column: &Column, lower: Option<&Scalar>, upper: Option<&Scalar>) -> StrataResult<Column> {
    column.map(|v| {
        if v.is_null() {
            return Ok(Scalar::Null);
        }
        let mut out = v.clone();
        if let Some(lo) = lower.filter(|lo| lo.is_valid()) {
            if out.binary(lo, BinaryOperator::Lt)?.is_truthy() {
                out = lo.clone();
            }
        }
        if let Some(hi) = upper.filter(|hi| hi.is_valid()) {
            if out.binary(hi, BinaryOperator::Gt)?.is_truthy() {
                out = hi.clone();
            }
        }
        Ok(out)
    })
}

/// Whether each value is one of `values`.
pub fn is_in(column: &Column, values: &[Scalar]) -> Column {
    let set: HashSet<&Scalar> = values.iter().collect();
    column.iter().map(|v| Scalar::Bool(set.contains(v))).collect()
}
