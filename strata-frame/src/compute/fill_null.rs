use strata_scalar::Scalar;

use crate::Column;

/// A boolean column marking null values.
pub fn is_null(column: &Column) -> Column {
    column.iter().map(|v| Scalar::Bool(v.is_null())).collect()
}

/// A boolean column marking valid values.
pub fn is_not_null(column: &Column) -> Column {
    column.iter().map(|v| Scalar::Bool(v.is_valid())).collect()
}

/// Replace nulls with `fill`.
pub fn fill_null(column: &Column, fill: &Scalar) -> Column {
    if column.null_count() == 0 {
        return column.clone();
    }
    column
        .iter()
        .map(|v| if v.is_null() { fill.clone() } else { v.clone() })
        .collect()
}

/// A keep-mask selecting the valid values.
pub fn valid_mask(column: &Column) -> Vec<bool> {
    column.iter().map(Scalar::is_valid).collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn nulls() {
        let col = Column::new(vec![1.into(), Scalar::Null]);
        assert_eq!(is_null(&col), Column::from(vec![false, true]));
        assert_eq!(is_not_null(&col), Column::from(vec![true, false]));
        assert_eq!(fill_null(&col, &0.into()), Column::from(vec![1, 0]));
        assert_eq!(valid_mask(&col), vec![true, false]);
    }
}
