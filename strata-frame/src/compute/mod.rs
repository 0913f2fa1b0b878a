//! Compute kernels on top of Strata columns.
//!
//! Kernels are free functions over [`Column`](crate::Column)s. [`Series`](crate::Series) and
//! [`Frame`](crate::Frame) methods wrap them, carrying the index along.

pub use between::*;
pub use binary::*;
pub use concat::*;
pub use fill_null::*;
pub use quantile::*;
pub use reduce::*;
pub use sort::*;
pub use take::*;
pub use unique::*;

mod between;
mod binary;
mod concat;
mod fill_null;
mod quantile;
mod reduce;
mod sort;
mod take;
mod unique;
