use std::fmt::{Display, Formatter};
use std::time::Instant;

use hashbrown::HashMap;
use itertools::Itertools;
use rayon::prelude::*;
use strata_error::{StrataResult, strata_bail, strata_err};

use crate::{Arg, Graph, Key, Task, TaskValue};

/// How a graph is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheduler {
    /// One task at a time on the calling thread, dependencies first.
    Sync,
    /// Independent tasks run in parallel on a rayon pool, one dependency level at a time.
    ///
    /// `None` runs on the global pool with rayon's default thread count.
    Threaded { num_threads: Option<usize> },
}

impl Default for Scheduler {
    fn default() -> Self {
        Scheduler::Threaded { num_threads: None }
    }
}

impl Display for Scheduler {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Scheduler::Sync => write!(f, "sync"),
            Scheduler::Threaded { num_threads: None } => write!(f, "threaded"),
            Scheduler::Threaded { num_threads: Some(n) } => write!(f, "threaded({n})"),
        }
    }
}

/// Compute the values of `keys`, in the order given.
pub fn get<V: TaskValue>(graph: &Graph<V>, keys: &[Key], scheduler: Scheduler) -> StrataResult<Vec<V>> {
    let start = Instant::now();
    let order = graph.topological_order(keys)?;
    log::debug!(
        "executing {} tasks for {} keys with the {} scheduler",
        order.len(),
        keys.len(),
        scheduler
    );
    let results = match scheduler {
        Scheduler::Sync => run_sync(graph, &order)?,
        Scheduler::Threaded { num_threads: None } => run_threaded(graph, &order)?,
        Scheduler::Threaded {
            num_threads: Some(n),
        } => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| strata_err!(ComputeError: "failed to build thread pool: {}", e))?;
            pool.install(|| run_threaded(graph, &order))?
        }
    };
    log::debug!(
        "executed {} tasks in {}ms",
        order.len(),
        start.elapsed().as_millis()
    );
    keys.iter()
        .map(|k| {
            results
                .get(k)
                .cloned()
                .ok_or_else(|| strata_err!(ComputeError: "key {} was not computed", k))
        })
        .try_collect()
}

fn run_sync<V: TaskValue>(graph: &Graph<V>, order: &[Key]) -> StrataResult<HashMap<Key, V>> {
    let mut results = HashMap::with_capacity(order.len());
    for key in order {
        let value = execute(graph, key, &results)?;
        results.insert(key.clone(), value);
    }
    Ok(results)
}

fn run_threaded<V: TaskValue>(graph: &Graph<V>, order: &[Key]) -> StrataResult<HashMap<Key, V>> {
    // a key's level is one more than the deepest of its dependencies
    let mut levels: HashMap<&Key, usize> = HashMap::with_capacity(order.len());
    for key in order {
        let level = task_of(graph, key)?
            .dependencies()
            .into_iter()
            .filter_map(|d| levels.get(d))
            .max()
            .map_or(0, |l| l + 1);
        levels.insert(key, level);
    }
    let by_level = order.iter().into_group_map_by(|k| levels.get(k).copied().unwrap_or(0));

    let mut results = HashMap::with_capacity(order.len());
    for level in by_level.keys().copied().sorted() {
        let Some(keys) = by_level.get(&level) else {
            continue;
        };
        log::trace!("level {}: {} tasks", level, keys.len());
        let computed: Vec<(Key, V)> = keys
            .par_iter()
            .map(|key| Ok(((*key).clone(), execute(graph, key, &results)?)))
            .collect::<StrataResult<_>>()?;
        results.extend(computed);
    }
    Ok(results)
}

fn task_of<'a, V>(graph: &'a Graph<V>, key: &Key) -> StrataResult<&'a Task<V>> {
    graph
        .get(key)
        .ok_or_else(|| strata_err!(ComputeError: "key {} is not defined in the graph", key))
}

fn execute<V: TaskValue>(graph: &Graph<V>, key: &Key, results: &HashMap<Key, V>) -> StrataResult<V> {
    let task = task_of(graph, key)?;
    log::trace!("running {} for {}", task.label(), key);
    match task {
        Task::Literal(v) => Ok(v.clone()),
        Task::Alias(target) => lookup(results, target),
        Task::Call(f, args) => {
            let args = args.iter().map(|a| resolve(a, results)).try_collect()?;
            f.call(args)
        }
    }
}

fn resolve<V: TaskValue>(arg: &Arg<V>, results: &HashMap<Key, V>) -> StrataResult<V> {
    match arg {
        Arg::Key(k) => lookup(results, k),
        Arg::Literal(v) => Ok(v.clone()),
        Arg::List(args) => Ok(V::from_list(
            args.iter().map(|a| resolve(a, results)).try_collect()?,
        )),
    }
}

fn lookup<V: TaskValue>(results: &HashMap<Key, V>, key: &Key) -> StrataResult<V> {
    match results.get(key) {
        Some(v) => Ok(v.clone()),
        None => strata_bail!(ComputeError: "dependency {} has not been computed", key),
    }
}

#[cfg(test)]
mod test {
    use rstest::rstest;
    use strata_error::strata_err;

    use super::*;
    use crate::TaskFn;

    #[derive(Debug, Clone, PartialEq)]
    enum V {
        Int(i64),
        List(Vec<V>),
    }

    impl TaskValue for V {
        fn from_list(values: Vec<Self>) -> Self {
            V::List(values)
        }
    }

    fn sum() -> TaskFn<V> {
        TaskFn::new("sum", |args: Vec<V>| {
            fn total(v: &V) -> i64 {
                match v {
                    V::Int(i) => *i,
                    V::List(vs) => vs.iter().map(total).sum(),
                }
            }
            Ok(V::Int(args.iter().map(total).sum()))
        })
    }

    fn diamond() -> Graph<V> {
        Graph::from_tasks([
            (Key::new("x", 0), Task::Literal(V::Int(1))),
            (Key::new("x", 1), Task::Literal(V::Int(2))),
            (Key::new("y", 0), Task::Call(sum(), vec![Arg::Key(Key::new("x", 0)), Arg::Literal(V::Int(10))])),
            (Key::new("y", 1), Task::Alias(Key::new("x", 1))),
            (
                Key::named("total"),
                Task::Call(sum(), vec![Arg::keys([Key::new("y", 0), Key::new("y", 1)])]),
            ),
        ])
    }

    #[rstest]
    #[case(Scheduler::Sync)]
    #[case(Scheduler::default())]
    #[case(Scheduler::Threaded { num_threads: Some(2) })]
    fn computes_in_key_order(#[case] scheduler: Scheduler) {
        let graph = diamond();
        let out = get(&graph, &[Key::named("total"), Key::new("y", 0)], scheduler).unwrap();
        assert_eq!(out, vec![V::Int(13), V::Int(11)]);
    }

    #[rstest]
    #[case(Scheduler::Sync)]
    #[case(Scheduler::default())]
    fn task_errors_propagate(#[case] scheduler: Scheduler) {
        let fail = TaskFn::new("fail", |_: Vec<V>| Err(strata_err!(TypeMismatch: "bad input")));
        let graph = diamond().with_tasks([(Key::named("bad"), Task::Call(fail, vec![]))]);
        let err = get(&graph, &[Key::named("bad")], scheduler).unwrap_err();
        assert!(err.is_type_mismatch());
    }

    #[test]
    fn missing_keys_are_compute_errors() {
        let graph = diamond();
        let err = get(&graph, &[Key::named("absent")], Scheduler::Sync).unwrap_err();
        assert!(err.to_string().contains("not defined"));
    }
}
