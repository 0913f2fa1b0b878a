//! Single-partition tables for Strata.
//!
//! A [`Frame`] is one in-memory partition of a partitioned table: an [`Index`] of row labels and
//! a set of named [`Column`]s. A [`Series`] is a single column with its index. Every kernel that
//! a task graph runs on a partition lives here, the partitioned layer only decides which kernel
//! runs on which partition.

pub use accessor::*;
pub use column::*;
pub use frame::*;
pub use index::*;
pub use series::*;

mod accessor;
pub mod align;
pub mod arrow;
mod column;
pub mod compute;
mod frame;
pub mod groupby;
mod index;
pub mod partition;
pub mod sample;
mod series;
