//! Apply-concat-apply: the split/combine pattern behind every aggregation.
//!
//! `chunk` runs once per partition (receiving the matching partition of every input), the
//! chunk results are concatenated, and `aggregate` turns the concatenation into the final value.
//! With a `combine` function and `split_every`, chunk results are first reduced in a tree of
//! intermediate combine tasks, each concatenating at most `split_every` results.

use std::hash::Hash;
use std::sync::Arc;

use itertools::Itertools;
use strata_error::{StrataResult, strata_bail};
use strata_graph::{Arg, Key, Task, TaskFn, Tokenizer, function_identity, tokenize};

use crate::align::align_collections;
use crate::collection::Collection;
use crate::datum::{Datum, arg};
use crate::divisions::Divisions;
use crate::naming::deterministic_name;

type ChunkFn = Arc<dyn Fn(&[Datum]) -> StrataResult<Datum> + Send + Sync>;
type AggregateFn = Arc<dyn Fn(Datum) -> StrataResult<Datum> + Send + Sync>;

/// A two or three phase aggregation over one or more aligned collections.
#[derive(Clone)]
pub struct Aca {
    chunk: ChunkFn,
    aggregate: AggregateFn,
    combine: Option<AggregateFn>,
    identity: String,
    token: Option<String>,
    options: Vec<String>,
    split_every: Option<usize>,
}

impl Aca {
    /// An aggregation identified by its functions.
    ///
    /// Functions are identified by type, so a closure capturing options must also be given a
    /// token that names those options.
    pub fn new<C, A>(chunk: C, aggregate: A) -> Self
    where
        C: Fn(&[Datum]) -> StrataResult<Datum> + Send + Sync + 'static,
        A: Fn(Datum) -> StrataResult<Datum> + Send + Sync + 'static,
    {
        let identity = format!(
            "{}|{}",
            function_identity(&chunk),
            function_identity(&aggregate)
        );
        Self {
            chunk: Arc::new(chunk),
            aggregate: Arc::new(aggregate),
            combine: None,
            identity,
            token: None,
            options: Vec::new(),
            split_every: None,
        }
    }

    /// Name the aggregation explicitly. The token replaces the function identity in the
    /// names of the tasks and labels them.
    pub fn with_token<S: Into<String>>(mut self, token: S) -> Self {
        self.token = Some(token.into());
        self
    }

    /// An option captured by the functions, hashed into the names of the tasks.
    pub fn with_option<T: Hash + ?Sized>(mut self, name: &str, value: &T) -> Self {
        self.options.push(tokenize(&(name, value)));
        self
    }

    /// Reduce chunk results in a tree with `combine` before the final aggregate.
    pub fn with_combine<F>(mut self, combine: F, split_every: usize) -> Self
    where
        F: Fn(Datum) -> StrataResult<Datum> + Send + Sync + 'static,
    {
        self.identity = format!("{}|{}", self.identity, function_identity(&combine));
        self.combine = Some(Arc::new(combine));
        self.split_every = Some(split_every);
        self
    }

    fn prefix(&self) -> &str {
        self.token.as_deref().unwrap_or("aca")
    }

    /// Build the graph over `inputs`. The result has a single partition of unknown division.
    ///
    /// Inputs with differing divisions are aligned first.
    pub fn run(&self, inputs: &[&Collection]) -> StrataResult<Collection> {
        if inputs.is_empty() {
            strata_bail!("apply-concat-apply needs at least one input");
        }
        if self.split_every.is_some_and(|n| n < 2) {
            strata_bail!("split_every must be at least 2");
        }
        let aligned = align_collections(inputs)?;
        let aligned = aligned.iter().collect_vec();
        let npartitions = aligned[0].npartitions();

        let tokenizer = inputs.iter().fold(
            Tokenizer::new(self.token.as_deref().unwrap_or(&self.identity)),
            |t, c| t.arg(c.name().as_ref()),
        );
        let token = tokenizer
            .arg(&self.options)
            .option("split_every", &self.split_every)
            .finish();
        let prefix = self.prefix();
        let chunk_name: Arc<str> = format!("{prefix}-chunk-{token}").into();
        let agg_name: Arc<str> = format!("{prefix}-agg-{token}").into();

        let chunk = self.chunk.clone();
        let chunk_fn = TaskFn::new(prefix, move |args: Vec<Datum>| chunk(&args));
        let mut tasks: Vec<(Key, Task<Datum>)> = (0..npartitions)
            .map(|i| {
                let key = Key::new(chunk_name.clone(), i);
                let args = aligned.iter().map(|c| Arg::Key(c.key(i))).collect();
                (key, Task::Call(chunk_fn.clone(), args))
            })
            .collect();
        let mut level_keys = tasks.iter().map(|(k, _)| k.clone()).collect_vec();

        if let (Some(combine), Some(split_every)) = (&self.combine, self.split_every) {
            let combine = combine.clone();
            let combine_fn = TaskFn::new(prefix, move |args: Vec<Datum>| {
                combine(Datum::concat(arg(&args, 0, "combine")?.as_list()?)?)
            });
            let mut depth = 0;
            while level_keys.len() > split_every {
                let name: Arc<str> = format!("{prefix}-combine-{depth}-{token}").into();
                let next = level_keys
                    .chunks(split_every)
                    .enumerate()
                    .map(|(j, group)| {
                        let key = Key::new(name.clone(), j);
                        tasks.push((
                            key.clone(),
                            Task::Call(combine_fn.clone(), vec![Arg::keys(group.iter().cloned())]),
                        ));
                        key
                    })
                    .collect_vec();
                level_keys = next;
                depth += 1;
            }
        }

        let aggregate = self.aggregate.clone();
        let agg_fn = TaskFn::new(prefix, move |args: Vec<Datum>| {
            aggregate(Datum::concat(arg(&args, 0, "aggregate")?.as_list()?)?)
        });
        tasks.push((
            Key::new(agg_name.clone(), 0),
            Task::Call(agg_fn, vec![Arg::keys(level_keys)]),
        ));
        log::debug!(
            "{} over {} partitions of {} inputs into {}",
            prefix,
            npartitions,
            aligned.len(),
            agg_name
        );
        Ok(Collection::derive(&aligned, agg_name, tasks, Divisions::unknown(1)))
    }
}

/// Combine several single-partition results with `f` into one value.
///
/// The final step of aggregations built from more than one apply-concat-apply, e.g. a mean from
/// a sum and a count.
pub(crate) fn combine_results<F>(label: &str, parts: &[&Collection], f: F) -> Collection
where
    F: Fn(&[Datum]) -> StrataResult<Datum> + Send + Sync + 'static,
{
    let name = deterministic_name(
        label,
        parts
            .iter()
            .fold(Tokenizer::new(label), |t, c| t.arg(c.name().as_ref())),
    );
    let func = TaskFn::new(label, move |args: Vec<Datum>| f(&args));
    let task = Task::Call(func, parts.iter().map(|c| Arg::Key(c.key(0))).collect());
    Collection::derive(
        parts,
        name.clone(),
        vec![(Key::new(name, 0), task)],
        Divisions::unknown(1),
    )
}

#[cfg(test)]
mod test {
    use strata_frame::Column;
    use strata_frame::compute::Reduction;
    use strata_scalar::Scalar;

    use super::*;
    use crate::config::ComputeOptions;

    fn numbers(npartitions: usize) -> Collection {
        let parts = (0..npartitions)
            .map(|p| {
                let values = Column::from((0..3).map(|v| p as i64 * 3 + v).collect_vec());
                Datum::Series(strata_frame::Series::new(None, values))
            })
            .collect();
        Collection::from_partitions("numbers".into(), parts, Divisions::unknown(npartitions)).unwrap()
    }

    fn sum() -> Aca {
        Aca::new(
            |parts: &[Datum]| Ok(Datum::Scalar(parts[0].as_series()?.reduce(Reduction::Sum)?)),
            |sums: Datum| Ok(Datum::Scalar(sums.as_series()?.reduce(Reduction::Sum)?)),
        )
    }

    #[test]
    fn two_phase() {
        let total = sum().with_token("series-sum").run(&[&numbers(3)]).unwrap();
        assert!(total.name().starts_with("series-sum-agg-"));
        assert_eq!(total.npartitions(), 1);
        let value = total.compute_partition(0, &ComputeOptions::sync()).unwrap();
        assert_eq!(value, Datum::Scalar(Scalar::from(36)));
    }

    #[test]
    fn tree_reduction() {
        let aca = sum().with_combine(
            |sums: Datum| Ok(Datum::Scalar(sums.as_series()?.reduce(Reduction::Sum)?)),
            2,
        );
        let total = aca.run(&[&numbers(5)]).unwrap();
        assert!(total.graph().layer_names().iter().any(|n| n.starts_with("aca-combine-1-")));
        let value = total.compute_partition(0, &ComputeOptions::sync()).unwrap();
        assert_eq!(value, Datum::Scalar(Scalar::from(105)));
    }

    #[test]
    fn names_depend_on_functions_and_token() {
        let input = numbers(2);
        let a = sum().run(&[&input]).unwrap();
        let b = sum().run(&[&input]).unwrap();
        assert_eq!(a.name(), b.name());

        let count = Aca::new(
            |parts: &[Datum]| Ok(Datum::Scalar(parts[0].as_series()?.reduce(Reduction::Count)?)),
            |sums: Datum| Ok(Datum::Scalar(sums.as_series()?.reduce(Reduction::Sum)?)),
        );
        assert_ne!(a.name(), count.run(&[&input]).unwrap().name());
        assert_ne!(
            sum().with_token("x").run(&[&input]).unwrap().name(),
            sum().with_token("y").run(&[&input]).unwrap().name()
        );
        assert_ne!(
            sum().with_option("n", &1).run(&[&input]).unwrap().name(),
            sum().with_option("n", &2).run(&[&input]).unwrap().name()
        );
    }
}
