//! In-memory tables over [`tabula_columnar`] columns: expressions, joins, grouping, sorting and
//! ranking.

#![forbid(unsafe_code)]

mod aggregate;
mod error;
mod exp;
mod group;
mod index;
mod join;
mod row;
mod sort;
mod table;
mod window;

pub use crate::aggregate::Aggregator;
pub use crate::exp::{AggFn, Exp};
pub use crate::group::GroupBy;
pub use crate::index::ColumnIndex;
pub use crate::join::{JoinIndex, JoinKind, JoinOptions, JoinPredicate, JoinStrategy};
pub use crate::row::{Row, RowCursor};
pub use crate::sort::Sorter;
pub use crate::table::Table;

pub use crate::error::{FrameError, FrameResult};

pub use tabula_columnar::{BitVec, Column, Value, ValueType};
