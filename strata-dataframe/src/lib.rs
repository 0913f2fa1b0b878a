//! Lazy partitioned dataframes.
//!
//! A [`DataFrame`], [`Series`] or [`Index`] is a [`Collection`]: a task graph together with the
//! name of its partitions and their [`Divisions`], the sorted index boundaries between them.
//! Operations never compute. They return a new collection whose graph extends the graphs of
//! their inputs under deterministic names, so building the same expression twice yields the same
//! keys. Partitions are only materialised by [`Partitioned::compute`].
//!
//! Inputs with different known divisions are aligned onto the union of their boundaries before
//! being combined partition by partition. Reductions, `drop_duplicates`, `nlargest` and grouped
//! aggregations run through [`Aca`], the apply-concat-apply pattern.

pub use aca::*;
pub use align::{MergedDivisions, align_collections, align_divisions, are_aligned};
pub use collection::*;
pub use config::*;
pub use construct::*;
pub use datum::*;
pub use divisions::Divisions;
pub use frame::*;
pub use groupby::*;
pub use index::*;
pub use partitionwise::MapPartitions;
pub use repartition::{Piece, RepartitionPlan, plan_repartition};
pub use scalar::*;
pub use series::*;
pub use shuffle::ShuffleKey;

mod aca;
pub mod align;
mod collection;
mod concat;
mod config;
mod construct;
mod datum;
pub mod divisions;
mod frame;
mod groupby;
mod index;
pub mod loc;
pub mod naming;
mod ops;
mod partitionwise;
pub mod random;
mod reduction;
pub mod repartition;
mod scalar;
mod series;
pub mod shuffle;
