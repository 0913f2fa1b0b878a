use std::sync::Arc;

use strata_dtype::{DType, FieldName};
use strata_error::StrataResult;
use strata_graph::{Graph, Tokenizer, function_identity};
use strata_scalar::{BinaryOperator, Scalar, UnaryOperator};

use crate::collection::{Collection, Partitioned};
use crate::datum::{Datum, arg};
use crate::divisions::Divisions;
use crate::frame::DataFrame;
use crate::index::Index;
use crate::partitionwise::{MapPartitions, partitionwise};

/// A lazy, partitioned column of values with row labels.
#[derive(Debug, Clone)]
pub struct Series {
    collection: Collection,
    name: Option<FieldName>,
}

impl Partitioned for Series {
    type Local = strata_frame::Series;

    fn collection(&self) -> &Collection {
        &self.collection
    }

    fn with_collection(&self, collection: Collection) -> Self {
        Self::from_collection(collection, self.name.clone())
    }

    fn ndim(&self) -> usize {
        1
    }

    fn kind(&self) -> &'static str {
        "series"
    }
}

impl Series {
    /// Wrap a graph whose partitions `(name, i)` compute to series named `series_name`.
    pub fn new<S: Into<Arc<str>>>(
        graph: Graph<Datum>,
        name: S,
        series_name: Option<FieldName>,
        divisions: Divisions,
    ) -> StrataResult<Self> {
        Ok(Self::from_collection(
            Collection::try_new(graph, name, divisions)?,
            series_name,
        ))
    }

    pub(crate) fn from_collection(collection: Collection, name: Option<FieldName>) -> Self {
        Self { collection, name }
    }

    pub fn name(&self) -> Option<&FieldName> {
        self.name.as_ref()
    }

    /// Apply a local series kernel to every partition, keeping the divisions.
    pub(crate) fn map_local<F>(
        &self,
        label: &str,
        tokenizer: Tokenizer,
        name: Option<FieldName>,
        f: F,
    ) -> Series
    where
        F: Fn(&strata_frame::Series) -> StrataResult<strata_frame::Series> + Send + Sync + 'static,
    {
        let collection = self
            .collection
            .map_datum(label, tokenizer, move |d| Ok(Datum::Series(f(d.as_series()?)?)));
        Series::from_collection(collection, name)
    }

    fn elementwise<F>(&self, label: &str, tokenizer: Tokenizer, f: F) -> Series
    where
        F: Fn(&strata_frame::Series) -> StrataResult<strata_frame::Series> + Send + Sync + 'static,
    {
        self.map_local(label, tokenizer, self.name.clone(), f)
    }

    pub fn rename(&self, name: Option<FieldName>) -> Series {
        let renamed = name.clone();
        self.map_local(
            "rename",
            Tokenizer::new("rename").option("name", &name),
            name,
            move |s| Ok(s.clone().with_name(renamed.clone())),
        )
    }

    /// Apply `op` between two series, aligning their divisions first.
    ///
    /// The result keeps the name only when both names agree.
    pub fn binary(&self, other: &Series, op: BinaryOperator) -> StrataResult<Series> {
        let label = format!("series-{}", op.name());
        let collection = partitionwise(
            &label,
            Tokenizer::new(&label),
            &[&self.collection, &other.collection],
            move |parts: &[Datum]| {
                let lhs = arg(parts, 0, "series-binary")?.as_series()?;
                let rhs = arg(parts, 1, "series-binary")?.as_series()?;
                Ok(Datum::Series(lhs.binary(rhs, op)?))
            },
        )?;
        let name = (self.name == other.name).then(|| self.name.clone()).flatten();
        Ok(Series::from_collection(collection, name))
    }

    /// `self op scalar`.
    pub fn binary_scalar(&self, scalar: &Scalar, op: BinaryOperator) -> StrataResult<Series> {
        self.scalar_op(scalar, op, false)
    }

    /// `scalar op self`.
    pub fn rbinary_scalar(&self, scalar: &Scalar, op: BinaryOperator) -> StrataResult<Series> {
        self.scalar_op(scalar, op, true)
    }

    fn scalar_op(&self, scalar: &Scalar, op: BinaryOperator, reversed: bool) -> StrataResult<Series> {
        let label = format!("series-{}", op.name());
        let literal = scalar.clone();
        Ok(self.elementwise(
            &label,
            Tokenizer::new(&label)
                .option("other", scalar)
                .option("reversed", &reversed),
            move |s| s.binary_scalar(&literal, op, reversed),
        ))
    }

    fn unary(&self, op: UnaryOperator) -> Series {
        let label = format!("series-{}", op.name());
        self.elementwise(&label, Tokenizer::new(&label), move |s| s.unary(op))
    }

    pub fn neg(&self) -> Series {
        self.unary(UnaryOperator::Neg)
    }

    pub fn abs(&self) -> Series {
        self.unary(UnaryOperator::Abs)
    }

    /// Logical not of a boolean series.
    pub fn invert(&self) -> Series {
        self.unary(UnaryOperator::Not)
    }

    pub fn astype(&self, dtype: DType) -> Series {
        self.elementwise(
            "series-astype",
            Tokenizer::new("series-astype").option("dtype", &dtype),
            move |s| s.astype(dtype),
        )
    }

    pub fn fillna<S: Into<Scalar>>(&self, value: S) -> Series {
        let value = value.into();
        self.elementwise(
            "series-fillna",
            Tokenizer::new("series-fillna").option("value", &value),
            move |s| s.fillna(&value),
        )
    }

    /// Drop null values. Divisions are kept, partitions may shrink.
    pub fn dropna(&self) -> Series {
        self.elementwise("series-dropna", Tokenizer::new("series-dropna"), |s| s.dropna())
    }

    pub fn isnull(&self) -> Series {
        self.elementwise("series-isnull", Tokenizer::new("series-isnull"), |s| s.isnull())
    }

    pub fn notnull(&self) -> Series {
        self.elementwise("series-notnull", Tokenizer::new("series-notnull"), |s| s.notnull())
    }

    /// Whether each value lies in the closed range `[lower, upper]`.
    pub fn between<L: Into<Scalar>, U: Into<Scalar>>(&self, lower: L, upper: U) -> Series {
        let (lower, upper) = (lower.into(), upper.into());
        self.elementwise(
            "series-between",
            Tokenizer::new("series-between")
                .option("lower", &lower)
                .option("upper", &upper),
            move |s| s.between(&lower, &upper),
        )
    }

    pub fn clip(&self, lower: Option<Scalar>, upper: Option<Scalar>) -> Series {
        self.elementwise(
            "series-clip",
            Tokenizer::new("series-clip")
                .option("lower", &lower)
                .option("upper", &upper),
            move |s| s.clip(lower.as_ref(), upper.as_ref()),
        )
    }

    pub fn isin(&self, values: &[Scalar]) -> Series {
        let values: Arc<[Scalar]> = values.into();
        self.elementwise(
            "series-isin",
            Tokenizer::new("series-isin").option("values", &values[..]),
            move |s| s.isin(&values),
        )
    }

    /// Apply `f` to every value. The name is derived from the function's identity.
    pub fn map<F>(&self, f: F) -> Series
    where
        F: Fn(&Scalar) -> StrataResult<Scalar> + Send + Sync + 'static,
    {
        let tokenizer = Tokenizer::new("series-map").arg(&function_identity(&f));
        self.elementwise("series-map", tokenizer, move |s| s.map(&f))
    }

    /// Apply `f` to every partition, which must return a series named `name`.
    pub fn map_partitions<F>(&self, name: Option<FieldName>, f: F) -> StrataResult<Series>
    where
        F: Fn(&[Datum]) -> StrataResult<Datum> + Send + Sync + 'static,
    {
        MapPartitions::new(self).series(name, f)
    }

    /// The rows where the boolean `mask` is true.
    pub fn filter(&self, mask: &Series) -> StrataResult<Series> {
        self.loc_mask(mask)
    }

    /// The row labels.
    pub fn index(&self) -> Index {
        Index::of(&self.collection)
    }

    /// A one-column frame. An unnamed series becomes column `0`.
    pub fn to_frame(&self) -> DataFrame {
        let column: FieldName = self.name.clone().unwrap_or_else(|| "0".into());
        let collection = self.collection.map_datum(
            "to-frame",
            Tokenizer::new("to-frame"),
            |d| Ok(Datum::Frame(d.as_series()?.to_frame()?)),
        );
        DataFrame::from_collection(collection, vec![column].into())
    }

    /// String methods, applied to each value when computed.
    pub fn str(&self) -> StringMethods<'_> {
        StringMethods { series: self }
    }

    /// Date-time methods, applied to each value when computed.
    pub fn dt(&self) -> DatetimeMethods<'_> {
        DatetimeMethods { series: self }
    }
}

macro_rules! accessor_methods {
    ($accessor:ident, $prefix:literal, $method:ident; $($name:ident),* $(,)?) => {
        impl $accessor<'_> {
            $(
                #[doc = concat!("`", stringify!($name), "` of each value.")]
                pub fn $name(&self) -> Series {
                    let label = concat!($prefix, "-", stringify!($name));
                    self.series.elementwise(label, Tokenizer::new(label), |s| s.$method()?.$name())
                }
            )*
        }
    };
}

/// Lazy string methods of a [`Series`]. A series of another type fails when computed.
pub struct StringMethods<'a> {
    series: &'a Series,
}

accessor_methods!(StringMethods, "str", str; upper, lower, len);

/// Lazy date-time methods of a [`Series`] of timestamps.
pub struct DatetimeMethods<'a> {
    series: &'a Series,
}

accessor_methods!(DatetimeMethods, "dt", dt; year, month, day, date);
