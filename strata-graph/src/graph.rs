use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use itertools::Itertools;
use strata_error::{StrataResult, strata_bail};

use crate::{Key, Task};

type Layer<V> = HashMap<Key, Task<V>>;

/// A persistent mapping from [`Key`] to [`Task`].
///
/// Tasks are stored in layers, one per key name, each behind an [`Arc`]. Extending or merging
/// graphs copies the layer table but shares every layer, and a key that is already bound keeps
/// its task: deterministic naming guarantees that a second binding describes the same work.
#[derive(Debug)]
pub struct Graph<V> {
    layers: HashMap<Arc<str>, Arc<Layer<V>>>,
}

impl<V> Clone for Graph<V> {
    fn clone(&self) -> Self {
        Self {
            layers: self.layers.clone(),
        }
    }
}

impl<V> Default for Graph<V> {
    fn default() -> Self {
        Self {
            layers: HashMap::new(),
        }
    }
}

impl<V: Clone> Graph<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A graph holding only `tasks`.
    pub fn from_tasks<I: IntoIterator<Item = (Key, Task<V>)>>(tasks: I) -> Self {
        Self::new().with_tasks(tasks)
    }

    /// A new graph with `tasks` added. Keys already present keep their existing task.
    pub fn with_tasks<I: IntoIterator<Item = (Key, Task<V>)>>(&self, tasks: I) -> Self {
        let mut layers = self.layers.clone();
        let grouped = tasks.into_iter().into_group_map_by(|(k, _)| k.name().clone());
        for (name, tasks) in grouped {
            let fresh = match layers.get(&name) {
                None => tasks.into_iter().collect(),
                Some(existing) => {
                    let added = tasks
                        .into_iter()
                        .filter(|(k, _)| !existing.contains_key(k))
                        .collect_vec();
                    if added.is_empty() {
                        continue;
                    }
                    let mut layer = Layer::clone(existing);
                    layer.extend(added);
                    layer
                }
            };
            layers.insert(name, Arc::new(fresh));
        }
        Self { layers }
    }

    /// The union of `self` and `other`. Layers of `self` win on conflict.
    pub fn merge(&self, other: &Graph<V>) -> Self {
        let mut layers = self.layers.clone();
        for (name, layer) in &other.layers {
            match layers.get(name) {
                None => {
                    layers.insert(name.clone(), layer.clone());
                }
                Some(existing) if Arc::ptr_eq(existing, layer) => {}
                Some(existing) => {
                    let added = layer
                        .iter()
                        .filter(|(k, _)| !existing.contains_key(*k))
                        .map(|(k, t)| (k.clone(), t.clone()))
                        .collect_vec();
                    if !added.is_empty() {
                        let mut merged = Layer::clone(existing);
                        merged.extend(added);
                        layers.insert(name.clone(), Arc::new(merged));
                    }
                }
            }
        }
        Self { layers }
    }

    /// Merge every graph in `graphs` into one.
    pub fn merge_all<'a, I>(graphs: I) -> Self
    where
        I: IntoIterator<Item = &'a Graph<V>>,
        V: 'a,
    {
        graphs
            .into_iter()
            .fold(Self::new(), |acc, g| if acc.is_empty() { g.clone() } else { acc.merge(g) })
    }
}

impl<V> Graph<V> {
    pub fn get(&self, key: &Key) -> Option<&Task<V>> {
        self.layers.get(key.name()).and_then(|l| l.get(key))
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.get(key).is_some()
    }

    /// Number of tasks.
    pub fn len(&self) -> usize {
        self.layers.values().map(|l| l.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.values().all(|l| l.is_empty())
    }

    /// All keys, sorted.
    pub fn keys(&self) -> Vec<Key> {
        self.layers
            .values()
            .flat_map(|l| l.keys().cloned())
            .sorted()
            .collect()
    }

    /// Names of the layers, sorted.
    pub fn layer_names(&self) -> Vec<Arc<str>> {
        self.layers.keys().cloned().sorted().collect()
    }

    /// Function labels of every task, for inspecting which kinds of work a graph contains.
    pub fn task_labels(&self) -> HashSet<&str> {
        self.layers
            .values()
            .flat_map(|l| l.values().map(Task::label))
            .collect()
    }

    /// Keys reachable from `keys`, dependencies before dependents.
    ///
    /// Fails when a reachable key is missing or the reachable tasks contain a cycle.
    pub fn topological_order(&self, keys: &[Key]) -> StrataResult<Vec<Key>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        let mut marks: HashMap<&Key, Mark> = HashMap::new();
        let mut order: Vec<Key> = Vec::new();
        for root in keys {
            // (key, whether its dependencies have been pushed)
            let mut stack: Vec<(&Key, bool)> = vec![(root, false)];
            while let Some((key, expanded)) = stack.pop() {
                if expanded {
                    marks.insert(key, Mark::Done);
                    order.push(key.clone());
                    continue;
                }
                match marks.get(key) {
                    Some(Mark::Done) => continue,
                    Some(Mark::Visiting) => strata_bail!(ComputeError: "cycle through key {}", key),
                    None => {}
                }
                let Some(task) = self.get(key) else {
                    strata_bail!(ComputeError: "key {} is not defined in the graph", key);
                };
                marks.insert(key, Mark::Visiting);
                stack.push((key, true));
                for dep in task.dependencies() {
                    match marks.get(dep) {
                        Some(Mark::Done) => {}
                        Some(Mark::Visiting) => {
                            strata_bail!(ComputeError: "cycle through key {}", dep)
                        }
                        None => stack.push((dep, false)),
                    }
                }
            }
        }
        Ok(order)
    }

    /// Check that every referenced key is defined and the graph is acyclic.
    pub fn validate(&self) -> StrataResult<()> {
        self.topological_order(&self.keys()).map(|_| ())
    }

    /// The subgraph needed to compute `keys`.
    pub fn cull(&self, keys: &[Key]) -> StrataResult<Graph<V>>
    where
        V: Clone,
    {
        let order = self.topological_order(keys)?;
        Ok(Graph::from_tasks(order.into_iter().filter_map(|k| {
            let task = self.get(&k)?.clone();
            Some((k, task))
        })))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Arg, TaskFn, TaskValue};

    #[derive(Debug, Clone, PartialEq)]
    struct V(i64);

    impl TaskValue for V {
        fn from_list(values: Vec<Self>) -> Self {
            V(values.iter().map(|v| v.0).sum())
        }
    }

    fn inc() -> TaskFn<V> {
        TaskFn::new("inc", |args: Vec<V>| Ok(V(args[0].0 + 1)))
    }

    #[test]
    fn extending_never_rebinds() {
        let base = Graph::from_tasks([(Key::new("x", 0), Task::Literal(V(1)))]);
        let extended = base.with_tasks([
            (Key::new("x", 0), Task::Literal(V(99))),
            (Key::new("y", 0), Task::Call(inc(), vec![Arg::Key(Key::new("x", 0))])),
        ]);
        assert_eq!(base.len(), 1);
        assert_eq!(extended.len(), 2);
        assert!(matches!(extended.get(&Key::new("x", 0)), Some(Task::Literal(V(1)))));
    }

    #[test]
    fn merge_shares_layers() {
        let a = Graph::from_tasks([(Key::new("x", 0), Task::Literal(V(1)))]);
        let b = a.with_tasks([(Key::new("y", 0), Task::Alias(Key::new("x", 0)))]);
        let c = a.with_tasks([(Key::new("z", 0), Task::Alias(Key::new("x", 0)))]);
        let merged = b.merge(&c);
        assert_eq!(merged.len(), 3);
        assert!(Arc::ptr_eq(&merged.layers["x"], &a.layers["x"]));
        merged.validate().unwrap();
    }

    #[test]
    fn missing_key_and_cycle_are_errors() {
        let missing = Graph::<V>::from_tasks([(Key::new("y", 0), Task::Alias(Key::new("x", 0)))]);
        assert!(missing.validate().is_err());

        let cycle = Graph::<V>::from_tasks([
            (Key::new("a", 0), Task::Alias(Key::new("b", 0))),
            (Key::new("b", 0), Task::Alias(Key::new("a", 0))),
        ]);
        assert!(cycle.validate().is_err());
    }

    #[test]
    fn cull_keeps_reachable() {
        let graph = Graph::from_tasks([
            (Key::new("x", 0), Task::Literal(V(1))),
            (Key::new("x", 1), Task::Literal(V(2))),
            (Key::new("y", 0), Task::Call(inc(), vec![Arg::Key(Key::new("x", 0))])),
        ]);
        let culled = graph.cull(&[Key::new("y", 0)]).unwrap();
        assert_eq!(culled.keys(), vec![Key::new("x", 0), Key::new("y", 0)]);
    }
}
