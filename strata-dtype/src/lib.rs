#![deny(missing_docs)]

//! A type system for Strata
//!
//! This crate contains the logical types shared by cell values, index labels and division
//! boundaries. Every type is nullable: a missing value is represented by a null scalar whatever
//! the column's type.

pub use dtype::*;
pub use field::*;

#[cfg(feature = "arrow")]
pub mod arrow;
mod dtype;
mod field;
