use std::sync::Arc;

use itertools::Itertools;
use strata_dtype::{DType, FieldName, FieldNames, display_names, field_names, position_of};
use strata_error::{StrataResult, strata_bail};
use strata_frame::DropNaHow;
use strata_graph::{Graph, Tokenizer};
use strata_scalar::{BinaryOperator, Scalar, UnaryOperator};

use crate::collection::{Collection, Partitioned};
use crate::datum::{Datum, arg};
use crate::divisions::Divisions;
use crate::index::Index;
use crate::partitionwise::{MapPartitions, partitionwise};
use crate::series::Series;

/// A lazy, partitioned table of named columns.
#[derive(Debug, Clone)]
pub struct DataFrame {
    collection: Collection,
    columns: FieldNames,
}

impl Partitioned for DataFrame {
    type Local = strata_frame::Frame;

    fn collection(&self) -> &Collection {
        &self.collection
    }

    fn with_collection(&self, collection: Collection) -> Self {
        Self::from_collection(collection, self.columns.clone())
    }

    fn ndim(&self) -> usize {
        2
    }

    fn kind(&self) -> &'static str {
        "dataframe"
    }
}

impl DataFrame {
    /// Wrap a graph whose partitions `(name, i)` compute to frames with `columns`.
    pub fn new<S, I, C>(graph: Graph<Datum>, name: S, columns: I, divisions: Divisions) -> StrataResult<Self>
    where
        S: Into<Arc<str>>,
        I: IntoIterator<Item = C>,
        C: AsRef<str>,
    {
        Ok(Self::from_collection(
            Collection::try_new(graph, name, divisions)?,
            field_names(columns),
        ))
    }

    pub(crate) fn from_collection(collection: Collection, columns: FieldNames) -> Self {
        Self {
            collection,
            columns,
        }
    }

    pub fn columns(&self) -> &FieldNames {
        &self.columns
    }

    pub(crate) fn require_column(&self, name: &str) -> StrataResult<FieldName> {
        match position_of(&self.columns, name) {
            Some(pos) => Ok(self.columns[pos].clone()),
            None => strata_bail!(
                NotFound: "column '{}' not found in {}",
                name,
                display_names(&self.columns)
            ),
        }
    }

    /// Apply a local frame kernel to every partition, keeping the divisions.
    pub(crate) fn map_local<F>(
        &self,
        label: &str,
        tokenizer: Tokenizer,
        columns: FieldNames,
        f: F,
    ) -> DataFrame
    where
        F: Fn(&strata_frame::Frame) -> StrataResult<strata_frame::Frame> + Send + Sync + 'static,
    {
        let collection = self
            .collection
            .map_datum(label, tokenizer, move |d| Ok(Datum::Frame(f(d.as_frame()?)?)));
        DataFrame::from_collection(collection, columns)
    }

    fn elementwise<F>(&self, label: &str, tokenizer: Tokenizer, f: F) -> DataFrame
    where
        F: Fn(&strata_frame::Frame) -> StrataResult<strata_frame::Frame> + Send + Sync + 'static,
    {
        self.map_local(label, tokenizer, self.columns.clone(), f)
    }

    /// A single column. Fails with a lookup error when the frame has no such column.
    pub fn column(&self, name: &str) -> StrataResult<Series> {
        let name = self.require_column(name)?;
        let column = name.clone();
        let collection = self.collection.map_datum(
            "getitem",
            Tokenizer::new("getitem").option("column", name.as_ref()),
            move |d| Ok(Datum::Series(d.as_frame()?.column(&column)?)),
        );
        Ok(Series::from_collection(collection, Some(name)))
    }

    /// The named columns, in the order given.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> StrataResult<DataFrame> {
        let columns: FieldNames = names
            .iter()
            .map(|n| self.require_column(n.as_ref()))
            .try_collect::<_, Vec<_>, _>()?
            .into();
        let selected = columns.clone();
        Ok(self.map_local(
            "getitem",
            Tokenizer::new("getitem").option("columns", &columns[..]),
            columns,
            move |f| f.select(&selected),
        ))
    }

    /// Add or replace column `name` with `series`, aligning their divisions first.
    pub fn assign(&self, name: &str, series: &Series) -> StrataResult<DataFrame> {
        let column: FieldName = name.into();
        let mut columns = self.columns.to_vec();
        if position_of(&columns, name).is_none() {
            columns.push(column.clone());
        }
        let collection = partitionwise(
            "assign",
            Tokenizer::new("assign").option("column", column.as_ref()),
            &[&self.collection, series.collection()],
            move |parts: &[Datum]| {
                let frame = arg(parts, 0, "assign")?.as_frame()?;
                let values = arg(parts, 1, "assign")?.as_series()?;
                Ok(Datum::Frame(frame.assign(&column, values)?))
            },
        )?;
        Ok(DataFrame::from_collection(collection, columns.into()))
    }

    /// Remove the named columns.
    pub fn drop<S: AsRef<str>>(&self, names: &[S]) -> StrataResult<DataFrame> {
        let dropped: Vec<FieldName> = names
            .iter()
            .map(|n| self.require_column(n.as_ref()))
            .try_collect()?;
        let columns: FieldNames = self
            .columns
            .iter()
            .filter(|c| !dropped.contains(c))
            .cloned()
            .collect();
        let drop = dropped.clone();
        Ok(self.map_local(
            "drop",
            Tokenizer::new("drop").option("columns", &dropped),
            columns,
            move |f| f.drop(&drop),
        ))
    }

    /// The row labels.
    pub fn index(&self) -> Index {
        Index::of(&self.collection)
    }

    /// The rows where the boolean `mask` is true.
    pub fn filter(&self, mask: &Series) -> StrataResult<DataFrame> {
        self.loc_mask(mask)
    }

    /// Apply `op` between two frames, aligning divisions first and columns by name.
    pub fn binary(&self, other: &DataFrame, op: BinaryOperator) -> StrataResult<DataFrame> {
        let label = format!("dataframe-{}", op.name());
        let collection = partitionwise(
            &label,
            Tokenizer::new(&label),
            &[&self.collection, &other.collection],
            move |parts: &[Datum]| {
                let lhs = arg(parts, 0, "dataframe-binary")?.as_frame()?;
                let rhs = arg(parts, 1, "dataframe-binary")?.as_frame()?;
                Ok(Datum::Frame(lhs.binary(rhs, op)?))
            },
        )?;
        let columns = self
            .columns
            .iter()
            .chain(other.columns.iter())
            .unique()
            .cloned()
            .collect();
        Ok(DataFrame::from_collection(collection, columns))
    }

    pub fn binary_scalar(&self, scalar: &Scalar, op: BinaryOperator) -> StrataResult<DataFrame> {
        self.scalar_op(scalar, op, false)
    }

    pub fn rbinary_scalar(&self, scalar: &Scalar, op: BinaryOperator) -> StrataResult<DataFrame> {
        self.scalar_op(scalar, op, true)
    }

    fn scalar_op(&self, scalar: &Scalar, op: BinaryOperator, reversed: bool) -> StrataResult<DataFrame> {
        let label = format!("dataframe-{}", op.name());
        let literal = scalar.clone();
        Ok(self.elementwise(
            &label,
            Tokenizer::new(&label)
                .option("other", scalar)
                .option("reversed", &reversed),
            move |f| f.binary_scalar(&literal, op, reversed),
        ))
    }

    fn unary(&self, op: UnaryOperator) -> DataFrame {
        let label = format!("dataframe-{}", op.name());
        self.elementwise(&label, Tokenizer::new(&label), move |f| f.unary(op))
    }

    pub fn neg(&self) -> DataFrame {
        self.unary(UnaryOperator::Neg)
    }

    pub fn abs(&self) -> DataFrame {
        self.unary(UnaryOperator::Abs)
    }

    pub fn invert(&self) -> DataFrame {
        self.unary(UnaryOperator::Not)
    }

    pub fn astype(&self, dtype: DType) -> DataFrame {
        self.elementwise(
            "dataframe-astype",
            Tokenizer::new("dataframe-astype").option("dtype", &dtype),
            move |f| f.astype(dtype),
        )
    }

    pub fn fillna<S: Into<Scalar>>(&self, value: S) -> DataFrame {
        let value = value.into();
        self.elementwise(
            "dataframe-fillna",
            Tokenizer::new("dataframe-fillna").option("value", &value),
            move |f| f.fillna(&value),
        )
    }

    pub fn isnull(&self) -> DataFrame {
        self.elementwise("dataframe-isnull", Tokenizer::new("dataframe-isnull"), |f| f.isnull())
    }

    pub fn notnull(&self) -> DataFrame {
        self.elementwise("dataframe-notnull", Tokenizer::new("dataframe-notnull"), |f| f.notnull())
    }

    pub fn clip(&self, lower: Option<Scalar>, upper: Option<Scalar>) -> DataFrame {
        self.elementwise(
            "dataframe-clip",
            Tokenizer::new("dataframe-clip")
                .option("lower", &lower)
                .option("upper", &upper),
            move |f| f.clip(lower.as_ref(), upper.as_ref()),
        )
    }

    /// Drop rows holding nulls in `subset`, or in any column when `subset` is `None`.
    pub fn dropna<S: AsRef<str>>(&self, how: DropNaHow, subset: Option<&[S]>) -> StrataResult<DataFrame> {
        let subset: Option<Vec<FieldName>> = subset
            .map(|names| names.iter().map(|n| self.require_column(n.as_ref())).try_collect())
            .transpose()?;
        let token = Tokenizer::new("dataframe-dropna")
            .option("how", &how)
            .option("subset", &subset);
        Ok(self.elementwise("dataframe-dropna", token, move |f| f.dropna(how, subset.as_deref())))
    }

    /// Apply `f` to every partition, which must return a frame with `columns`.
    pub fn map_partitions<F>(&self, columns: FieldNames, f: F) -> StrataResult<DataFrame>
    where
        F: Fn(&[Datum]) -> StrataResult<Datum> + Send + Sync + 'static,
    {
        MapPartitions::new(self).frame(columns, f)
    }
}

#[cfg(test)]
mod test {
    use strata_frame::{Column, Frame};

    use super::*;
    use crate::config::ComputeOptions;

    fn frame() -> DataFrame {
        let part = |labels: Vec<i64>, a: Vec<i64>, b: Vec<i64>| {
            let local = Frame::from_columns([("a", Column::from(a)), ("b", Column::from(b))]).unwrap();
            Datum::Frame(local.with_index(strata_frame::Index::from(Column::from(labels))).unwrap())
        };
        let collection = Collection::from_partitions(
            "frame".into(),
            vec![
                part(vec![0, 1, 3], vec![1, 2, 3], vec![4, 5, 6]),
                part(vec![5, 6, 8], vec![4, 5, 6], vec![3, 2, 1]),
            ],
            Divisions::try_known(vec![0.into(), 5.into(), 8.into()]).unwrap(),
        )
        .unwrap();
        DataFrame::from_collection(collection, field_names(["a", "b"]))
    }

    #[test]
    fn missing_column_is_not_found() {
        let df = frame();
        assert!(df.column("z").unwrap_err().is_not_found());
        assert!(df.select(&["a", "z"]).unwrap_err().is_not_found());
        assert!(df.drop(&["z"]).unwrap_err().is_not_found());
    }

    #[test]
    fn column_metadata_follows_operations() {
        let df = frame();
        assert_eq!(df.column("a").unwrap().name().map(|n| n.as_ref()), Some("a"));
        assert_eq!(df.select(&["b"]).unwrap().columns()[0].as_ref(), "b");
        assert_eq!(df.drop(&["a"]).unwrap().columns().len(), 1);
        let assigned = df.assign("c", &df.column("a").unwrap()).unwrap();
        assert_eq!(assigned.columns().len(), 3);
        let computed = assigned.compute_with(&ComputeOptions::sync()).unwrap();
        assert_eq!(computed.column("c").unwrap().values(), computed.column("a").unwrap().values());
    }

    #[test]
    fn mask_filtering() {
        let df = frame();
        let mask = df.column("a").unwrap().gt_scalar(2).unwrap();
        let filtered = df.filter(&mask).unwrap().compute_with(&ComputeOptions::sync()).unwrap();
        assert_eq!(filtered.len(), 4);
        assert_eq!(filtered.index().first(), Some(&Scalar::from(3)));
    }

    #[test]
    fn frame_arithmetic() {
        let df = frame();
        let doubled = df.add(&df).unwrap().compute_with(&ComputeOptions::sync()).unwrap();
        assert_eq!(doubled.column("b").unwrap().values(), &Column::from(vec![8, 10, 12, 6, 4, 2]));
        let shifted = df.rsub(10).unwrap().compute_with(&ComputeOptions::sync()).unwrap();
        assert_eq!(shifted.column("a").unwrap().values(), &Column::from(vec![9, 8, 7, 6, 5, 4]));
    }
}
