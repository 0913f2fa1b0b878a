use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use strata_error::StrataResult;

use crate::Key;

/// A value that tasks consume and produce.
pub trait TaskValue: Clone + Send + Sync + 'static {
    /// Pack the resolved elements of an [`Arg::List`] into one value.
    fn from_list(values: Vec<Self>) -> Self;
}

type BoxedTaskFn<V> = Arc<dyn Fn(Vec<V>) -> StrataResult<V> + Send + Sync>;

/// A named function invoked by a [`Task::Call`] with its resolved arguments.
pub struct TaskFn<V> {
    name: Arc<str>,
    f: BoxedTaskFn<V>,
}

impl<V: TaskValue> TaskFn<V> {
    pub fn new<S, F>(name: S, f: F) -> Self
    where
        S: Into<Arc<str>>,
        F: Fn(Vec<V>) -> StrataResult<V> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            f: Arc::new(f),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: Vec<V>) -> StrataResult<V> {
        (self.f)(args)
    }
}

impl<V> Clone for TaskFn<V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            f: self.f.clone(),
        }
    }
}

impl<V> Debug for TaskFn<V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("TaskFn").field(&self.name).finish()
    }
}

/// An argument of a [`Task::Call`].
#[derive(Debug, Clone)]
pub enum Arg<V> {
    /// The output of another task
    Key(Key),
    /// A constant
    Literal(V),
    /// Several arguments packed with [`TaskValue::from_list`]
    List(Vec<Arg<V>>),
}

impl<V> Arg<V> {
    /// A list of references to `keys`.
    pub fn keys<I: IntoIterator<Item = Key>>(keys: I) -> Self {
        Arg::List(keys.into_iter().map(Arg::Key).collect())
    }

    fn collect_keys<'a>(&'a self, out: &mut Vec<&'a Key>) {
        match self {
            Arg::Key(k) => out.push(k),
            Arg::Literal(_) => {}
            Arg::List(args) => args.iter().for_each(|a| a.collect_keys(out)),
        }
    }
}

/// How to produce the value of one key.
#[derive(Debug, Clone)]
pub enum Task<V> {
    /// A value known at construction time
    Literal(V),
    /// The value of another key
    Alias(Key),
    /// A function applied to arguments
    Call(TaskFn<V>, Vec<Arg<V>>),
}

impl<V> Task<V> {
    /// Keys whose values this task needs.
    pub fn dependencies(&self) -> Vec<&Key> {
        match self {
            Task::Literal(_) => Vec::new(),
            Task::Alias(k) => vec![k],
            Task::Call(_, args) => {
                let mut out = Vec::new();
                args.iter().for_each(|a| a.collect_keys(&mut out));
                out
            }
        }
    }

    /// The function name of a call, used in logs and tests.
    pub fn label(&self) -> &str {
        match self {
            Task::Literal(_) => "literal",
            Task::Alias(_) => "alias",
            Task::Call(f, _) => &f.name,
        }
    }
}
