use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// The address of one task's output: a collection name and, for partitioned collections, the
/// partition number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key {
    name: Arc<str>,
    index: Option<usize>,
}

impl Key {
    /// The key of partition `index` of collection `name`.
    pub fn new<S: Into<Arc<str>>>(name: S, index: usize) -> Self {
        Self {
            name: name.into(),
            index: Some(index),
        }
    }

    /// A key without a partition number, e.g. the output of a reduction.
    pub fn named<S: Into<Arc<str>>>(name: S) -> Self {
        Self {
            name: name.into(),
            index: None,
        }
    }

    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.index {
            Some(i) => write!(f, "('{}', {i})", self.name),
            None => write!(f, "'{}'", self.name),
        }
    }
}

/// The keys `(name, 0)` to `(name, n - 1)`.
pub fn partition_keys(name: &Arc<str>, n: usize) -> Vec<Key> {
    (0..n).map(|i| Key::new(name.clone(), i)).collect()
}
