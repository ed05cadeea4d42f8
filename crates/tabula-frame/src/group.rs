//! Row partitioning by key.

use crate::aggregate::{aggregate_groups, Aggregator};
use crate::error::FrameResult;
use crate::exp::Exp;
use crate::row::Row;
use crate::sort::{check_height, RowComparator, Sorter};
use crate::table::Table;
use crate::window::{aligned_column, assign_ranks, RankPolicy};
use std::collections::HashMap;
use tabula_columnar::{Column, Value};

/// A table's rows split into groups of equal key.
///
/// Groups iterate in the order their key first appears. Rows whose key is null, or has a null
/// component, belong to no group.
#[derive(Clone, Debug)]
pub struct GroupBy {
    table: Table,
    keys: Vec<Vec<Value>>,
    groups: Vec<Vec<usize>>,
    lookup: HashMap<Vec<Value>, usize>,
    sorters: Vec<Sorter>,
}

impl GroupBy {
    fn partition(table: &Table, mut key_of: impl FnMut(usize) -> FrameResult<Option<Vec<Value>>>) -> FrameResult<Self> {
        let mut keys = Vec::new();
        let mut groups: Vec<Vec<usize>> = Vec::new();
        let mut lookup: HashMap<Vec<Value>, usize> = HashMap::new();
        for row in 0..table.height() {
            let Some(key) = key_of(row)? else {
                continue;
            };
            match lookup.get(&key) {
                Some(&group) => groups[group].push(row),
                None => {
                    lookup.insert(key.clone(), groups.len());
                    keys.push(key);
                    groups.push(vec![row]);
                }
            }
        }
        log::debug!("grouped {} rows into {} groups", table.height(), groups.len());
        Ok(Self {
            table: table.clone(),
            keys,
            groups,
            lookup,
            sorters: Vec::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Group keys in group order.
    pub fn keys(&self) -> &[Vec<Value>] {
        &self.keys
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Source row positions of the group with `key`.
    pub fn positions(&self, key: &[Value]) -> Option<&[usize]> {
        self.lookup.get(key).map(|&g| self.groups[g].as_slice())
    }

    /// The rows of one group, or `None` if no row has `key`.
    pub fn group(&self, key: &[Value]) -> FrameResult<Option<Table>> {
        self.positions(key)
            .map(|positions| self.table.select_rows(positions))
            .transpose()
    }

    fn map_groups(&self, f: impl Fn(&[usize]) -> Vec<usize>) -> GroupBy {
        GroupBy {
            groups: self.groups.iter().map(|g| f(g)).collect(),
            ..self.clone()
        }
    }

    /// The first `n` rows of every group.
    pub fn head(&self, n: usize) -> GroupBy {
        self.map_groups(|g| g[..n.min(g.len())].to_vec())
    }

    /// The last `n` rows of every group.
    pub fn tail(&self, n: usize) -> GroupBy {
        self.map_groups(|g| g[g.len().saturating_sub(n)..].to_vec())
    }

    /// Sort the rows inside every group. The sort order also drives [`GroupBy::rank`].
    pub fn sort(&self, sorters: &[Sorter]) -> FrameResult<GroupBy> {
        let cmp = RowComparator::new(&self.table, sorters)?;
        let mut sorted = self.clone();
        for group in &mut sorted.groups {
            cmp.sort(group);
        }
        sorted.sorters = sorters.to_vec();
        Ok(sorted)
    }

    /// All grouped rows, group after group.
    pub fn to_table(&self) -> FrameResult<Table> {
        let positions: Vec<usize> = self.groups.iter().flatten().copied().collect();
        self.table.select_rows(&positions)
    }

    /// One row per group.
    pub fn agg(&self, aggregators: &[Aggregator]) -> FrameResult<Table> {
        aggregate_groups(&self.table, &self.groups, aggregators)
    }

    fn ranks(&self, policy: RankPolicy) -> FrameResult<Column> {
        let cmp = RowComparator::new(&self.table, &self.sorters)?;
        let mut out = vec![None; self.table.height()];
        for group in &self.groups {
            assign_ranks(group, policy, |a, b| cmp.compare(a, b).is_eq(), &mut out);
        }
        Ok(aligned_column(out))
    }

    /// Standard ranking within each group by the last [`GroupBy::sort`]; every row ranks 1 when
    /// the groups were never sorted. Aligned to source rows; ungrouped rows are null.
    pub fn rank(&self) -> FrameResult<Column> {
        self.ranks(RankPolicy::Standard)
    }

    pub fn dense_rank(&self) -> FrameResult<Column> {
        self.ranks(RankPolicy::Dense)
    }

    /// 1-based position of each row within its group, aligned to source rows.
    pub fn row_number(&self) -> FrameResult<Column> {
        self.ranks(RankPolicy::RowNumber)
    }
}

impl Table {
    /// Group by the values of one or more columns.
    pub fn group_by(&self, names: &[&str]) -> FrameResult<GroupBy> {
        let columns = names
            .iter()
            .map(|n| self.column(n))
            .collect::<FrameResult<Vec<_>>>()?;
        GroupBy::partition(self, |row| {
            Ok(columns
                .iter()
                .map(|c| Some(c.value(row)).filter(|v| !v.is_null()))
                .collect())
        })
    }

    pub fn group_by_exp(&self, exp: &Exp) -> FrameResult<GroupBy> {
        let column = exp.eval(self)?;
        check_height("group_by_exp", self, &column)?;
        GroupBy::partition(self, |row| Ok(single(column.value(row))))
    }

    pub fn group_by_fn(&self, key: impl Fn(&Row<'_>) -> Value) -> FrameResult<GroupBy> {
        GroupBy::partition(self, |row| Ok(single(key(&Row::new(self, row)))))
    }
}

fn single(value: Value) -> Option<Vec<Value>> {
    (!value.is_null()).then(|| vec![value])
}
