use std::sync::Arc;

use strata_dtype::FieldName;
use strata_error::StrataResult;
use strata_frame::compute::Reduction;
use strata_graph::{Graph, Tokenizer};

use crate::aca::Aca;
use crate::collection::{Collection, Partitioned};
use crate::datum::{Datum, arg};
use crate::divisions::Divisions;
use crate::scalar::LazyScalar;

/// The lazy row labels of a frame or series.
#[derive(Debug, Clone)]
pub struct Index {
    collection: Collection,
    name: Option<FieldName>,
}

impl Partitioned for Index {
    type Local = strata_frame::Index;

    fn collection(&self) -> &Collection {
        &self.collection
    }

    fn with_collection(&self, collection: Collection) -> Self {
        Self {
            collection,
            name: self.name.clone(),
        }
    }

    fn ndim(&self) -> usize {
        1
    }

    fn kind(&self) -> &'static str {
        "index"
    }
}

impl Index {
    /// Wrap a graph whose partitions `(name, i)` compute to indexes named `index_name`.
    pub fn new<S: Into<Arc<str>>>(
        graph: Graph<Datum>,
        name: S,
        index_name: Option<FieldName>,
        divisions: Divisions,
    ) -> StrataResult<Self> {
        Ok(Index {
            collection: Collection::try_new(graph, name, divisions)?,
            name: index_name,
        })
    }

    /// The labels of every partition of `collection`.
    pub(crate) fn of(collection: &Collection) -> Index {
        Index {
            collection: collection.map_datum("index", Tokenizer::new("index"), |d| {
                Ok(Datum::Index(d.index()?.clone()))
            }),
            name: None,
        }
    }

    pub fn name(&self) -> Option<&FieldName> {
        self.name.as_ref()
    }

    fn reduce(&self, reduction: Reduction) -> StrataResult<LazyScalar> {
        let aca = Aca::new(
            move |parts: &[Datum]| {
                let labels = arg(parts, 0, "index-reduce")?.as_index()?;
                Ok(Datum::Scalar(strata_frame::compute::reduce(labels.labels(), reduction)?))
            },
            move |values: Datum| Ok(Datum::Scalar(values.as_series()?.reduce(reduction)?)),
        )
        .with_token(format!("index-{reduction}"));
        Ok(LazyScalar::from_collection(aca.run(&[&self.collection])?))
    }

    /// The smallest label.
    pub fn min(&self) -> StrataResult<LazyScalar> {
        self.reduce(Reduction::Min)
    }

    /// The largest label.
    pub fn max(&self) -> StrataResult<LazyScalar> {
        self.reduce(Reduction::Max)
    }
}
