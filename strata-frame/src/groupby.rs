//! Grouping rows by key and aggregating each group.

use hashbrown::HashMap;
use itertools::Itertools;
use strata_dtype::{DType, FieldName};
use strata_error::{StrataResult, strata_bail};
use strata_scalar::Scalar;

use crate::compute::{self, Reduction};
use crate::{Column, Frame, Index, Series};

/// The values rows are grouped by: one column, or several forming tuple keys.
#[derive(Debug, Clone)]
pub struct GroupKeys {
    name: Option<FieldName>,
    columns: Vec<Column>,
}

impl GroupKeys {
    pub fn new(name: Option<FieldName>, columns: Vec<Column>) -> StrataResult<Self> {
        if columns.is_empty() {
            strata_bail!("at least one group key is required");
        }
        if !columns.iter().map(Column::len).all_equal() {
            strata_bail!("group keys must have equal lengths");
        }
        Ok(Self { name, columns })
    }

    pub fn single(name: Option<FieldName>, column: Column) -> Self {
        Self {
            name,
            columns: vec![column],
        }
    }

    /// Group by the labels of `index`, as when combining partial aggregates.
    pub fn from_index(index: &Index) -> Self {
        Self::single(index.name().cloned(), index.labels().clone())
    }

    pub fn name(&self) -> Option<&FieldName> {
        self.name.as_ref()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn key_at(&self, row: usize) -> Scalar {
        match self.columns.as_slice() {
            [single] => single.values()[row].clone(),
            many => Scalar::tuple(many.iter().map(|c| c.values()[row].clone())),
        }
    }

    /// Rows of each group, keys ascending. Rows with a null in any key are dropped.
    pub fn groups(&self) -> Groups {
        let mut ids: HashMap<Scalar, usize> = HashMap::new();
        let mut keys = Vec::new();
        let mut rows: Vec<Vec<usize>> = Vec::new();
        for row in 0..self.len() {
            if self.columns.iter().any(|c| c.values()[row].is_null()) {
                continue;
            }
            let key = self.key_at(row);
            let id = *ids.entry(key.clone()).or_insert_with(|| {
                keys.push(key);
                rows.push(Vec::new());
                keys.len() - 1
            });
            rows[id].push(row);
        }
        let order = (0..keys.len()).sorted_by(|&a, &b| keys[a].cmp(&keys[b])).collect_vec();
        let dtype = match self.columns.as_slice() {
            [single] => single.dtype(),
            _ => DType::Object,
        };
        Groups {
            name: self.name.clone(),
            keys: Column::with_dtype(dtype, order.iter().map(|&i| keys[i].clone()).collect()),
            rows: order.into_iter().map(|i| std::mem::take(&mut rows[i])).collect(),
        }
    }
}

/// Row positions per distinct key.
#[derive(Debug, Clone)]
pub struct Groups {
    name: Option<FieldName>,
    keys: Column,
    rows: Vec<Vec<usize>>,
}

impl Groups {
    /// The distinct keys as an index.
    pub fn index(&self) -> Index {
        Index::new(self.name.clone(), self.keys.clone())
    }

    pub fn rows(&self) -> &[Vec<usize>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Series {
    /// Reduce the values of each group.
    pub fn groupby_reduce(&self, keys: &GroupKeys, reduction: Reduction) -> StrataResult<Series> {
        check_len(keys, self.len())?;
        let groups = keys.groups();
        let values: Vec<Scalar> = groups
            .rows()
            .iter()
            .map(|rows| compute::reduce(&compute::take(self.values(), rows)?, reduction))
            .try_collect()?;
        Series::try_new(self.name().cloned(), groups.index(), Column::new(values))
    }
}

impl Frame {
    /// Reduce every accepted column within each group, producing one row per key.
    pub fn groupby_reduce(&self, keys: &GroupKeys, reduction: Reduction) -> StrataResult<Frame> {
        check_len(keys, self.len())?;
        let groups = keys.groups();
        let (names, columns): (Vec<FieldName>, Vec<Column>) = self
            .names()
            .iter()
            .zip(self.columns())
            .filter(|(_, c)| reduction.accepts(c.dtype()))
            .map(|(name, column)| {
                let values: Vec<Scalar> = groups
                    .rows()
                    .iter()
                    .map(|rows| compute::reduce(&compute::take(column, rows)?, reduction))
                    .try_collect()?;
                Ok((name.clone(), Column::new(values)))
            })
            .collect::<StrataResult<Vec<_>>>()?
            .into_iter()
            .unzip();
        Frame::try_new(groups.index(), names, columns)
    }

    /// Apply `f` to the rows of each group and stack the results in key order.
    pub fn groupby_apply<F>(&self, keys: &GroupKeys, f: F) -> StrataResult<Frame>
    where
        F: Fn(&Frame) -> StrataResult<Frame>,
    {
        check_len(keys, self.len())?;
        let groups = keys.groups();
        if groups.is_empty() {
            return f(&self.empty_like());
        }
        let parts: Vec<Frame> = groups
            .rows()
            .iter()
            .map(|rows| f(&self.take(rows)?))
            .try_collect()?;
        Frame::concat(parts.iter())
    }
}

fn check_len(keys: &GroupKeys, len: usize) -> StrataResult<()> {
    if keys.len() != len {
        strata_bail!(
            "group keys of length {} do not match {} rows",
            keys.len(),
            len
        );
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn frame() -> Frame {
        Frame::from_columns([
            ("a", Column::from(vec![1, 2, 3, 4, 5, 6])),
            ("b", Column::from(vec![4, 5, 4, 3, 5, 4])),
            ("s", Column::from(vec!["x", "y", "x", "y", "x", "y"])),
        ])
        .unwrap()
    }

    #[test]
    fn series_groupby() {
        let f = frame();
        let keys = GroupKeys::single(Some("b".into()), f.column("b").unwrap().values().clone());
        let sums = f.column("a").unwrap().groupby_reduce(&keys, Reduction::Sum).unwrap();
        assert_eq!(sums.index().labels(), &Column::from(vec![3, 4, 5]));
        assert_eq!(sums.values(), &Column::from(vec![4, 10, 7]));
        assert_eq!(sums.index().name().map(|n| n.as_ref()), Some("b"));
    }

    #[test]
    fn frame_groupby_skips_non_numeric_for_sums() {
        let f = frame();
        let keys = GroupKeys::single(None, f.column("s").unwrap().values().clone());
        let sums = f.drop(&["s"]).unwrap().groupby_reduce(&keys, Reduction::Sum).unwrap();
        assert_eq!(sums.names().len(), 2);
        let means = f.groupby_reduce(&keys, Reduction::Mean).unwrap();
        assert_eq!(means.names().len(), 2);
        let counts = f.groupby_reduce(&keys, Reduction::Count).unwrap();
        assert_eq!(counts.names().len(), 3);
    }

    #[test]
    fn tuple_keys_and_nulls() {
        let keys = GroupKeys::new(
            None,
            vec![
                Column::from(vec![1, 1, 2]),
                Column::new(vec!["a".into(), "a".into(), Scalar::Null]),
            ],
        )
        .unwrap();
        let groups = keys.groups();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups.rows()[0], vec![0, 1]);
    }

    #[test]
    fn apply_per_group() {
        let f = frame();
        let keys = GroupKeys::single(None, f.column("b").unwrap().values().clone());
        let firsts = f.groupby_apply(&keys, |g| Ok(g.head(1))).unwrap();
        assert_eq!(firsts.column("a").unwrap().values(), &Column::from(vec![4, 1, 2]));
    }
}
