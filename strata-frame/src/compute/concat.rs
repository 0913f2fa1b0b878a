use itertools::Itertools;
use strata_dtype::DType;

use crate::Column;

/// Concatenate columns end to end. The result type is the unified type of the inputs.
pub fn concat<'a, I>(columns: I) -> Column
where
    I: IntoIterator<Item = &'a Column>,
{
    let columns = columns.into_iter().collect_vec();
    let dtype = columns
        .iter()
        .fold(DType::Null, |acc, c| acc.unify(&c.dtype()));
    let values = columns
        .iter()
        .flat_map(|c| c.iter().cloned())
        .collect_vec();
    Column::with_dtype(dtype, values)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn concat_unifies() {
        let a = Column::from(vec![1]);
        let b = Column::from(vec![2.5]);
        let c = concat([&a, &b]);
        assert_eq!(c.dtype(), DType::Float64);
        assert_eq!(c.len(), 2);
        assert_eq!(concat([]).dtype(), DType::Null);
    }
}
