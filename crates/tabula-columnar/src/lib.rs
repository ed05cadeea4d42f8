//! Immutable typed column storage for tabula.
//!
//! This crate focuses on:
//! - A tagged [`Column`] representation with unboxed `i64`/`f64`/bit-packed boolean variants and a
//!   general object variant that is the only one able to hold nulls.
//! - Elementwise primitive kernels (arithmetic and comparison) that never box values.
//! - A stable adaptive merge/insertion sort used for both raw buffers and row permutations.
//! - The accumulation protocol loaders use to build columns one value at a time.

#![forbid(unsafe_code)]

mod accumulator;
mod bitmap;
mod column;
mod convert;
mod error;
mod kernels;
pub mod sort;
mod types;

pub use crate::accumulator::{
    Accumulator, BoolAccumulator, Float64Accumulator, Int64Accumulator, ObjectAccumulator,
    UniqueAccumulator, ValueAccumulator, ValueHolder,
};
pub use crate::bitmap::BitVec;
pub use crate::column::{sample_positions, Column};
pub use crate::convert::ValueConverter;
pub use crate::error::{ColumnError, ColumnResult};
pub use crate::kernels::{ArithOp, CmpOp};
pub use crate::sort::SortOptions;
pub use crate::types::{Value, ValueType};
