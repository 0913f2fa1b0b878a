//! Task graphs for Strata.
//!
//! A [`Graph`] maps [`Key`]s to [`Task`]s: a literal value, an alias of another key, or a
//! function applied to arguments that may reference other keys. Graphs are persistent. Adding
//! tasks returns a new graph that shares every existing layer with its parent, and an existing
//! key is never rebound. Keys are named deterministically with [`tokenize`] so that two
//! constructions of the same computation produce the same keys and merge into one.
//!
//! [`get`] runs a graph with either the synchronous or the threaded scheduler.

pub use executor::*;
pub use graph::*;
pub use key::*;
pub use task::*;
pub use tokenize::*;

mod executor;
mod graph;
mod key;
mod task;
mod tokenize;
