use std::sync::Arc;

use itertools::Itertools;
use strata_error::{StrataResult, strata_bail};
use strata_graph::{Arg, Graph, Key, Task, TaskFn, Tokenizer, partition_keys};
use strata_scalar::Scalar;

use crate::aca::Aca;
use crate::config::ComputeOptions;
use crate::datum::{Datum, FromDatum, arg};
use crate::divisions::Divisions;
use crate::naming::{build_graph, deterministic_name};
use crate::{loc, random, repartition};

/// A task graph together with the name and divisions of the partitions it produces.
///
/// Partition `i` is the value of key `(name, i)`. A collection is immutable: every operation
/// returns a new collection whose graph extends the graphs of its inputs.
#[derive(Debug, Clone)]
pub struct Collection {
    graph: Graph<Datum>,
    name: Arc<str>,
    divisions: Divisions,
}

impl Collection {
    /// Wrap an existing graph. Every partition key must be defined in `graph`.
    pub fn try_new<S: Into<Arc<str>>>(
        graph: Graph<Datum>,
        name: S,
        divisions: Divisions,
    ) -> StrataResult<Self> {
        let name = name.into();
        if let Some(missing) = partition_keys(&name, divisions.npartitions())
            .into_iter()
            .find(|k| !graph.contains(k))
        {
            strata_bail!("graph does not define partition {}", missing);
        }
        Ok(Self::from_parts(graph, name, divisions))
    }

    pub(crate) fn from_parts(graph: Graph<Datum>, name: Arc<str>, divisions: Divisions) -> Self {
        Self {
            graph,
            name,
            divisions,
        }
    }

    /// A collection whose partitions are the given local values.
    pub fn from_partitions(name: Arc<str>, parts: Vec<Datum>, divisions: Divisions) -> StrataResult<Self> {
        if parts.len() != divisions.npartitions() {
            strata_bail!(
                "{} partitions do not match {} divisions",
                parts.len(),
                divisions.npartitions() + 1
            );
        }
        let tasks = build_graph(&name, parts.into_iter().map(Task::Literal).collect());
        Ok(Self::from_parts(Graph::from_tasks(tasks), name, divisions))
    }

    pub fn graph(&self) -> &Graph<Datum> {
        &self.graph
    }

    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    pub fn divisions(&self) -> &Divisions {
        &self.divisions
    }

    pub fn npartitions(&self) -> usize {
        self.divisions.npartitions()
    }

    pub fn key(&self, partition: usize) -> Key {
        Key::new(self.name.clone(), partition)
    }

    pub fn keys(&self) -> Vec<Key> {
        partition_keys(&self.name, self.npartitions())
    }

    /// A new collection named `name` whose tasks extend the merged graphs of `inputs`.
    pub(crate) fn derive(
        inputs: &[&Collection],
        name: Arc<str>,
        tasks: Vec<(Key, Task<Datum>)>,
        divisions: Divisions,
    ) -> Collection {
        let graph = Graph::merge_all(inputs.iter().map(|c| &c.graph)).with_tasks(tasks);
        Collection::from_parts(graph, name, divisions)
    }

    /// The same partitions under new divisions, e.g. after they were learned by computing.
    pub(crate) fn with_divisions(&self, divisions: Divisions) -> Collection {
        Collection::from_parts(self.graph.clone(), self.name.clone(), divisions)
    }

    /// Run the graph and return every partition.
    pub fn compute_partitions(&self, options: &ComputeOptions) -> StrataResult<Vec<Datum>> {
        strata_graph::get(&self.graph, &self.keys(), options.scheduler())
    }

    /// Run the graph for a single partition.
    pub fn compute_partition(&self, partition: usize, options: &ComputeOptions) -> StrataResult<Datum> {
        let mut values = strata_graph::get(&self.graph, &[self.key(partition)], options.scheduler())?;
        match values.pop() {
            Some(value) => Ok(value),
            None => strata_bail!(ComputeError: "partition {} produced no value", partition),
        }
    }

    /// Run the graph and concatenate the partitions.
    pub fn compute_concat(&self, options: &ComputeOptions) -> StrataResult<Datum> {
        Datum::concat(&self.compute_partitions(options)?)
    }

    /// Apply `f` to one partition at a time, keeping the divisions.
    pub(crate) fn map_datum<F>(&self, label: &str, tokenizer: Tokenizer, f: F) -> Collection
    where
        F: Fn(&Datum) -> StrataResult<Datum> + Send + Sync + 'static,
    {
        let name = deterministic_name(label, tokenizer.arg(self.name.as_ref()));
        let task_label = label.to_string();
        let func = TaskFn::new(label, move |args: Vec<Datum>| f(arg(&args, 0, &task_label)?));
        let tasks = build_graph(
            &name,
            self.keys()
                .into_iter()
                .map(|k| Task::Call(func.clone(), vec![Arg::Key(k)]))
                .collect(),
        );
        Collection::derive(&[self], name, tasks, self.divisions.clone())
    }

    /// Partitions `range` alone, sharing their keys.
    pub(crate) fn partitions(&self, label: &str, range: std::ops::Range<usize>) -> StrataResult<Collection> {
        if range.start >= range.end || range.end > self.npartitions() {
            strata_bail!(
                "partitions {}..{} out of range for {} partitions",
                range.start,
                range.end,
                self.npartitions()
            );
        }
        let name = deterministic_name(
            label,
            Tokenizer::new(label)
                .arg(self.name.as_ref())
                .option("start", &range.start)
                .option("end", &range.end),
        );
        let tasks = build_graph(
            &name,
            range.clone().map(|i| Task::Alias(self.key(i))).collect(),
        );
        Ok(Collection::derive(&[self], name, tasks, self.divisions.slice(range)))
    }
}

/// The shared surface of lazy frames, series and indexes.
///
/// Implementors carry their own metadata and rebuild themselves around a transformed
/// [`Collection`] with [`Partitioned::with_collection`].
pub trait Partitioned: Clone {
    /// What the collection computes to.
    type Local: FromDatum;

    fn collection(&self) -> &Collection;

    /// The same metadata around different partitions.
    fn with_collection(&self, collection: Collection) -> Self;

    /// 2 for frames, 1 for series and indexes.
    fn ndim(&self) -> usize;

    /// Prefix of the labels of this collection's tasks, e.g. `"series"`.
    fn kind(&self) -> &'static str;

    fn graph(&self) -> &Graph<Datum> {
        self.collection().graph()
    }

    fn root_name(&self) -> &Arc<str> {
        self.collection().name()
    }

    fn divisions(&self) -> &Divisions {
        self.collection().divisions()
    }

    fn npartitions(&self) -> usize {
        self.collection().npartitions()
    }

    fn known_divisions(&self) -> bool {
        self.divisions().is_known()
    }

    fn keys(&self) -> Vec<Key> {
        self.collection().keys()
    }

    fn compute(&self) -> StrataResult<Self::Local> {
        self.compute_with(&ComputeOptions::default())
    }

    fn compute_with(&self, options: &ComputeOptions) -> StrataResult<Self::Local> {
        Self::Local::from_datum(self.collection().compute_concat(options)?)
    }

    /// Number of rows, computed.
    fn len(&self) -> StrataResult<usize> {
        let total = Aca::new(
            |parts: &[Datum]| Ok(Datum::Scalar(Scalar::from(arg(parts, 0, "len")?.len()?))),
            |counts: Datum| Ok(Datum::Scalar(counts.as_series()?.reduce(strata_frame::compute::Reduction::Sum)?)),
        )
        .with_token(format!("{}-len", self.kind()))
        .run(&[self.collection()])?;
        let value = Scalar::from_datum(total.compute_partition(0, &ComputeOptions::default())?)?;
        match value.as_i64().map(usize::try_from) {
            Some(Ok(n)) => Ok(n),
            _ => strata_bail!(ComputeError: "row count {} is not a length", value),
        }
    }

    fn is_empty(&self) -> StrataResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Partition `i` as a collection of its own.
    fn get_division(&self, i: usize) -> StrataResult<Self> {
        if i >= self.npartitions() {
            strata_bail!(
                "partition {} out of range for {} partitions",
                i,
                self.npartitions()
            );
        }
        Ok(self.with_collection(
            self.collection()
                .partitions(&format!("get-partition-{}", self.kind()), i..i + 1)?,
        ))
    }

    /// Move the rows onto `divisions`. See [`repartition::repartition`].
    fn repartition(&self, divisions: &[Scalar], force: bool) -> StrataResult<Self> {
        Ok(self.with_collection(repartition::repartition(
            self.collection(),
            divisions,
            force,
        )?))
    }

    /// Rows labelled `key`, in a single partition.
    fn loc(&self, key: &Scalar) -> StrataResult<Self> {
        Ok(self.with_collection(loc::loc_label(self.collection(), key)?))
    }

    /// Rows labelled within the closed range `[start, stop]`, either end open when `None`.
    fn loc_range(&self, start: Option<&Scalar>, stop: Option<&Scalar>) -> StrataResult<Self> {
        Ok(self.with_collection(loc::loc_range(self.collection(), start, stop)?))
    }

    /// Rows where the boolean series `mask` is true, matched on partitions after aligning.
    fn loc_mask(&self, mask: &crate::series::Series) -> StrataResult<Self> {
        Ok(self.with_collection(loc::loc_mask(self.collection(), mask.collection())?))
    }

    /// The first `n` rows, computed from as few leading partitions as possible.
    fn head(&self, n: usize) -> StrataResult<Self::Local> {
        self.head_with(n, &ComputeOptions::default())
    }

    fn head_with(&self, n: usize, options: &ComputeOptions) -> StrataResult<Self::Local> {
        let order = (0..self.npartitions()).collect_vec();
        Self::Local::from_datum(take_rows(self.collection(), n, &order, false, options)?)
    }

    /// The last `n` rows, computed from as few trailing partitions as possible.
    fn tail(&self, n: usize) -> StrataResult<Self::Local> {
        self.tail_with(n, &ComputeOptions::default())
    }

    fn tail_with(&self, n: usize, options: &ComputeOptions) -> StrataResult<Self::Local> {
        let order = (0..self.npartitions()).rev().collect_vec();
        Self::Local::from_datum(take_rows(self.collection(), n, &order, true, options)?)
    }

    /// The first `n` rows of the first partition, lazily.
    fn head_lazy(&self, n: usize) -> StrataResult<Self> {
        let first = self.collection().partitions("head-partition", 0..1)?;
        Ok(self.with_collection(first.map_datum(
            &format!("head-{n}"),
            Tokenizer::new("head").option("n", &n),
            move |part| part.head(n),
        )))
    }

    /// The last `n` rows of the last partition, lazily.
    fn tail_lazy(&self, n: usize) -> StrataResult<Self> {
        let last = self.npartitions();
        let partition = self
            .collection()
            .partitions("tail-partition", last.saturating_sub(1)..last)?;
        Ok(self.with_collection(partition.map_datum(
            &format!("tail-{n}"),
            Tokenizer::new("tail").option("n", &n),
            move |part| part.tail(n),
        )))
    }

    /// A fraction `frac` of the rows of each partition, drawn without replacement.
    fn sample(&self, frac: f64, seed: Option<u64>) -> StrataResult<Self> {
        Ok(self.with_collection(random::sample(self.collection(), frac, seed)?))
    }

    /// Split the rows randomly into pieces sized by `fracs`.
    fn random_split(&self, fracs: &[f64], seed: Option<u64>) -> StrataResult<Vec<Self>> {
        Ok(random::random_split(self.collection(), fracs, seed)?
            .into_iter()
            .map(|c| self.with_collection(c))
            .collect())
    }
}

/// Read partitions in `order` until `n` rows are collected.
fn take_rows(
    collection: &Collection,
    n: usize,
    order: &[usize],
    from_end: bool,
    options: &ComputeOptions,
) -> StrataResult<Datum> {
    let mut parts: Vec<Datum> = Vec::new();
    let mut rows = 0;
    for &partition in order {
        let part = collection.compute_partition(partition, options)?;
        let needed = n - rows;
        let part = if from_end { part.tail(needed)? } else { part.head(needed)? };
        rows += part.len()?;
        parts.push(part);
        if rows >= n {
            break;
        }
        log::debug!(
            "partition {} of {} held {} of {} rows, reading the next",
            partition,
            collection.name(),
            rows,
            n
        );
    }
    if from_end {
        parts.reverse();
    }
    Datum::concat(&parts)
}

#[cfg(test)]
mod test {
    use strata_frame::Column;

    use super::*;

    fn parts() -> Collection {
        let series = |labels: Vec<i64>| {
            let index = strata_frame::Index::from(Column::from(labels.clone()));
            Datum::Series(strata_frame::Series::try_new(None, index, Column::from(labels)).unwrap())
        };
        Collection::from_partitions(
            "s".into(),
            vec![series(vec![0, 1]), series(vec![2]), series(vec![3, 4])],
            Divisions::try_known(vec![0.into(), 2.into(), 3.into(), 4.into()]).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn missing_partition_keys_are_rejected() {
        let collection = parts();
        let err = Collection::try_new(
            collection.graph().clone(),
            "s",
            Divisions::unknown(4),
        )
        .unwrap_err();
        assert!(err.is_invalid_argument());
        Collection::try_new(collection.graph().clone(), "s", Divisions::unknown(3)).unwrap();
    }

    #[test]
    fn take_rows_reads_only_what_it_needs() {
        let collection = parts();
        let options = ComputeOptions::sync();
        let head = take_rows(&collection, 3, &[0, 1, 2], false, &options).unwrap();
        assert_eq!(head.len().unwrap(), 3);
        let tail = take_rows(&collection, 1, &[2, 1, 0], true, &options).unwrap();
        assert_eq!(tail.index().unwrap().first(), Some(&Scalar::from(4)));
        let all = take_rows(&collection, 100, &[0, 1, 2], false, &options).unwrap();
        assert_eq!(all.len().unwrap(), 5);
    }

    #[test]
    fn partitions_share_keys() {
        let collection = parts();
        let middle = collection.partitions("part", 1..2).unwrap();
        assert_eq!(middle.npartitions(), 1);
        assert_eq!(
            middle.divisions(),
            &Divisions::try_known(vec![2.into(), 3.into()]).unwrap()
        );
        assert!(matches!(middle.graph().get(&middle.key(0)), Some(Task::Alias(k)) if *k == collection.key(1)));
    }

    #[test]
    fn row_count_sums_every_partition() {
        let series = crate::series::Series::from_collection(parts(), None);
        assert_eq!(series.len().unwrap(), 5);
        assert!(!series.is_empty().unwrap());
    }
}
