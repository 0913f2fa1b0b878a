use strata_error::StrataResult;
use strata_graph::{Graph, Key, Tokenizer, function_identity};
use strata_scalar::{BinaryOperator, Scalar};

use crate::aca::combine_results;
use crate::collection::Collection;
use crate::config::ComputeOptions;
use crate::datum::{Datum, FromDatum, arg};

/// A single value computed lazily, the result of a reduction.
#[derive(Debug, Clone)]
pub struct LazyScalar {
    collection: Collection,
}

impl LazyScalar {
    pub(crate) fn from_collection(collection: Collection) -> Self {
        Self { collection }
    }

    pub(crate) fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn graph(&self) -> &Graph<Datum> {
        self.collection.graph()
    }

    /// The key holding the value.
    pub fn key(&self) -> Key {
        self.collection.key(0)
    }

    pub fn compute(&self) -> StrataResult<Scalar> {
        self.compute_with(&ComputeOptions::default())
    }

    pub fn compute_with(&self, options: &ComputeOptions) -> StrataResult<Scalar> {
        Scalar::from_datum(self.collection.compute_partition(0, options)?)
    }

    /// Combine with another lazy value.
    pub fn binary(&self, other: &LazyScalar, op: BinaryOperator) -> LazyScalar {
        let label = format!("scalar-{}", op.name());
        LazyScalar::from_collection(combine_results(
            &label,
            &[&self.collection, &other.collection],
            move |args: &[Datum]| {
                let lhs = arg(args, 0, "scalar-binary")?.as_scalar()?;
                let rhs = arg(args, 1, "scalar-binary")?.as_scalar()?;
                Ok(Datum::Scalar(lhs.binary(rhs, op)?))
            },
        ))
    }

    /// Combine with a literal, `self op other`.
    pub fn binary_scalar(&self, other: &Scalar, op: BinaryOperator) -> LazyScalar {
        let label = format!("scalar-{}", op.name());
        let literal = other.clone();
        LazyScalar::from_collection(self.collection.map_datum(
            &label,
            Tokenizer::new(&label).option("other", other),
            move |d| Ok(Datum::Scalar(d.as_scalar()?.binary(&literal, op)?)),
        ))
    }

    /// Apply `f` to the value once it is computed.
    pub fn map<F>(&self, f: F) -> LazyScalar
    where
        F: Fn(&Scalar) -> StrataResult<Scalar> + Send + Sync + 'static,
    {
        let tokenizer = Tokenizer::new("scalar-map").arg(&function_identity(&f));
        LazyScalar::from_collection(self.collection.map_datum("scalar-map", tokenizer, move |d| {
            Ok(Datum::Scalar(f(d.as_scalar()?)?))
        }))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::divisions::Divisions;

    fn literal(value: i64) -> LazyScalar {
        LazyScalar::from_collection(
            Collection::from_partitions(
                format!("literal-{value}").into(),
                vec![Datum::Scalar(value.into())],
                Divisions::unknown(1),
            )
            .unwrap(),
        )
    }

    #[test]
    fn arithmetic_is_lazy() {
        let total = literal(6).binary(&literal(4), BinaryOperator::Sub);
        let doubled = total.binary_scalar(&2.into(), BinaryOperator::Mul);
        assert_eq!(doubled.compute_with(&ComputeOptions::sync()).unwrap(), Scalar::from(4));
        assert!(doubled.graph().len() >= 4);
    }

    #[test]
    fn map_applies_to_value() {
        let negated = literal(3).map(|v| v.binary(&(-1).into(), BinaryOperator::Mul));
        assert_eq!(negated.compute().unwrap(), Scalar::from(-3));
    }
}
