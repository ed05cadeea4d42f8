//! Multi-key row sorting.

use crate::error::FrameResult;
use crate::exp::Exp;
use crate::row::Row;
use crate::table::Table;
use std::cmp::Ordering;
use std::sync::Arc;
use tabula_columnar::sort::{sort_positions, sorted_positions};
use tabula_columnar::{BitVec, Column, ColumnError, Value};

/// One sort key: an expression and a direction. Built with [`Exp::asc`] / [`Exp::desc`].
#[derive(Clone, Debug, PartialEq)]
pub struct Sorter {
    exp: Exp,
    ascending: bool,
}

impl Sorter {
    pub(crate) fn new(exp: Exp, ascending: bool) -> Self {
        Self { exp, ascending }
    }

    pub fn exp(&self) -> &Exp {
        &self.exp
    }

    pub fn is_ascending(&self) -> bool {
        self.ascending
    }
}

/// Evaluated sort key. Primitive keys compare their raw buffers.
enum SortKey {
    Int(Arc<[i64]>),
    Float(Arc<[f64]>),
    Bool(Arc<BitVec>),
    Object(Arc<[Value]>),
}

impl SortKey {
    fn new(column: &Column) -> Self {
        match column {
            Column::Int64(v) => SortKey::Int(v.clone()),
            Column::Float64(v) => SortKey::Float(v.clone()),
            Column::Bool(bits) => SortKey::Bool(bits.clone()),
            Column::Object { values, .. } => SortKey::Object(values.clone()),
        }
    }

    fn compare(&self, a: usize, b: usize) -> Ordering {
        match self {
            SortKey::Int(v) => v[a].cmp(&v[b]),
            SortKey::Float(v) => v[a].total_cmp(&v[b]),
            SortKey::Bool(bits) => bits.get(a).cmp(&bits.get(b)),
            SortKey::Object(v) => v[a].total_cmp(&v[b]),
        }
    }
}

/// Compares row positions of one table by a list of sorters, left to right.
///
/// Nulls are greater than every value, so they come last ascending and first descending.
pub(crate) struct RowComparator {
    keys: Vec<(SortKey, bool)>,
}

impl RowComparator {
    pub(crate) fn new(table: &Table, sorters: &[Sorter]) -> FrameResult<Self> {
        let keys = sorters
            .iter()
            .map(|s| -> FrameResult<(SortKey, bool)> {
                let column = s.exp.eval(table)?;
                check_height("sort key", table, &column)?;
                Ok((SortKey::new(&column), s.ascending))
            })
            .collect::<FrameResult<Vec<_>>>()?;
        Ok(Self { keys })
    }

    pub(crate) fn compare(&self, a: usize, b: usize) -> Ordering {
        for (key, ascending) in &self.keys {
            let ord = key.compare(a, b);
            if ord != Ordering::Equal {
                return if *ascending { ord } else { ord.reverse() };
            }
        }
        Ordering::Equal
    }

    pub(crate) fn sort(&self, positions: &mut [usize]) {
        sort_positions(positions, |a, b| self.compare(a, b));
    }
}

/// Per-row keys must have one value per table row; aggregate expressions do not.
pub(crate) fn check_height(op: &'static str, table: &Table, column: &Column) -> FrameResult<()> {
    if column.len() != table.height() {
        return Err(ColumnError::LengthMismatch {
            op,
            expected: table.height(),
            actual: column.len(),
        }
        .into());
    }
    Ok(())
}

impl Table {
    /// Stable multi-key sort.
    pub fn sort(&self, sorters: &[Sorter]) -> FrameResult<Table> {
        let positions = self.sort_index(sorters)?;
        self.select_rows(&positions)
    }

    /// The sorting permutation, without applying it.
    pub fn sort_index(&self, sorters: &[Sorter]) -> FrameResult<Vec<usize>> {
        let cmp = RowComparator::new(self, sorters)?;
        Ok(sorted_positions(self.height(), |a, b| cmp.compare(a, b)))
    }

    /// Sort by the first column name, ascending, then each following name.
    pub fn sort_by_columns(&self, names: &[&str]) -> FrameResult<Table> {
        let sorters: Vec<Sorter> = names.iter().map(|n| Exp::column(*n).asc()).collect();
        self.sort(&sorters)
    }

    /// Stable sort with an arbitrary row comparator.
    pub fn sort_by_rows(&self, mut cmp: impl FnMut(&Row<'_>, &Row<'_>) -> Ordering) -> FrameResult<Table> {
        let positions = sorted_positions(self.height(), |a, b| {
            cmp(&Row::new(self, a), &Row::new(self, b))
        });
        self.select_rows(&positions)
    }
}
