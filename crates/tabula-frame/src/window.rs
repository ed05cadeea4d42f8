//! Ranks and row numbers over a sort order.

use crate::error::FrameResult;
use crate::sort::{RowComparator, Sorter};
use crate::table::Table;
use tabula_columnar::{Column, Value, ValueType};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RankPolicy {
    /// Ties share a rank; the next distinct key skips by the tie size.
    Standard,
    /// Ties share a rank; the next distinct key gets the next integer.
    Dense,
    /// Consecutive numbers, ties broken by order.
    RowNumber,
}

/// Write 1-based ranks for the rows in `order` into `out`, indexed by source row. `same` reports
/// whether two rows have equal sort keys.
pub(crate) fn assign_ranks(
    order: &[usize],
    policy: RankPolicy,
    mut same: impl FnMut(usize, usize) -> bool,
    out: &mut [Option<i64>],
) {
    let mut rank = 0i64;
    for (i, &row) in order.iter().enumerate() {
        let tied = i > 0 && policy != RankPolicy::RowNumber && same(order[i - 1], row);
        if !tied {
            rank = match policy {
                RankPolicy::Dense => rank + 1,
                RankPolicy::Standard | RankPolicy::RowNumber => i as i64 + 1,
            };
        }
        out[row] = Some(rank);
    }
}

/// Primitive when every row got a number, otherwise an object column with nulls.
pub(crate) fn aligned_column(values: Vec<Option<i64>>) -> Column {
    if values.iter().all(Option::is_some) {
        return Column::from_i64s(values.into_iter().flatten().collect::<Vec<_>>());
    }
    Column::build(
        ValueType::Int64,
        values.into_iter().map(|v| v.map_or(Value::Null, Value::Int64)),
    )
}

impl Table {
    fn ranked(&self, sorters: &[Sorter], policy: RankPolicy) -> FrameResult<Column> {
        let cmp = RowComparator::new(self, sorters)?;
        let mut order: Vec<usize> = (0..self.height()).collect();
        cmp.sort(&mut order);
        let mut out = vec![None; self.height()];
        assign_ranks(&order, policy, |a, b| cmp.compare(a, b).is_eq(), &mut out);
        Ok(aligned_column(out))
    }

    /// Standard competition rank of every row by `sorters`, aligned to row order.
    pub fn rank(&self, sorters: &[Sorter]) -> FrameResult<Column> {
        self.ranked(sorters, RankPolicy::Standard)
    }

    pub fn dense_rank(&self, sorters: &[Sorter]) -> FrameResult<Column> {
        self.ranked(sorters, RankPolicy::Dense)
    }

    /// `1..=height` in row order.
    pub fn row_number(&self) -> Column {
        Column::from_i64s((1..=self.height() as i64).collect::<Vec<_>>())
    }

    /// Position of every row in the order given by `sorters`, aligned to row order.
    pub fn row_number_by(&self, sorters: &[Sorter]) -> FrameResult<Column> {
        self.ranked(sorters, RankPolicy::RowNumber)
    }
}
