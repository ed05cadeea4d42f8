//! Table joins.
//!
//! A join runs in two steps: the matcher produces a [`JoinIndex`] of paired row positions, then
//! both sides are gathered by those positions. Absent positions gather as nulls, so any primitive
//! column on the padded side of an outer join comes back in the object representation.

use crate::error::{FrameError, FrameResult};
use crate::index::ColumnIndex;
use crate::row::Row;
use crate::table::Table;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tabula_columnar::{Column, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JoinKind {
    /// Only matching row pairs.
    Inner,
    /// Every left row; unmatched ones get a null right half.
    Left,
    /// Every right row; unmatched ones get a null left half.
    Right,
    /// Left join plus the right rows that matched nothing.
    Full,
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinKind::Inner => write!(f, "inner"),
            JoinKind::Left => write!(f, "left"),
            JoinKind::Right => write!(f, "right"),
            JoinKind::Full => write!(f, "full"),
        }
    }
}

type RowMatcher = Arc<dyn Fn(&Row<'_>, &Row<'_>) -> bool + Send + Sync>;

/// Which row pairs match.
#[derive(Clone)]
pub enum JoinPredicate {
    /// Equality on (left column, right column) pairs. A null on either side never matches.
    On(Vec<(String, String)>),
    /// Arbitrary predicate over a (left row, right row) pair.
    Rows(RowMatcher),
}

impl JoinPredicate {
    pub fn on(left: impl Into<String>, right: impl Into<String>) -> Self {
        JoinPredicate::On(vec![(left.into(), right.into())])
    }

    /// Add one more equality pair.
    pub fn and(self, left: impl Into<String>, right: impl Into<String>) -> Self {
        let (left, right) = (left.into(), right.into());
        match self {
            JoinPredicate::On(mut pairs) => {
                pairs.push((left, right));
                JoinPredicate::On(pairs)
            }
            JoinPredicate::Rows(matcher) => JoinPredicate::Rows(Arc::new(move |l: &Row<'_>, r: &Row<'_>| {
                if !matcher(l, r) {
                    return false;
                }
                match (l.get_named(&left), r.get_named(&right)) {
                    (Ok(a), Ok(b)) => !a.is_null() && a == b,
                    _ => false,
                }
            })),
        }
    }

    pub fn rows(matcher: impl Fn(&Row<'_>, &Row<'_>) -> bool + Send + Sync + 'static) -> Self {
        JoinPredicate::Rows(Arc::new(matcher))
    }

    pub fn is_equi(&self) -> bool {
        matches!(self, JoinPredicate::On(_))
    }
}

impl fmt::Debug for JoinPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinPredicate::On(pairs) => f.debug_tuple("On").field(pairs).finish(),
            JoinPredicate::Rows(_) => f.write_str("Rows(..)"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JoinStrategy {
    /// Hash join for equality predicates, nested loop otherwise.
    #[default]
    Auto,
    Hash,
    NestedLoop,
}

impl fmt::Display for JoinStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinStrategy::Auto => write!(f, "auto"),
            JoinStrategy::Hash => write!(f, "hash"),
            JoinStrategy::NestedLoop => write!(f, "nested loop"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JoinOptions {
    pub strategy: JoinStrategy,
    /// Appended to right-side column names until they no longer collide.
    pub suffix: String,
}

impl Default for JoinOptions {
    fn default() -> Self {
        Self {
            strategy: JoinStrategy::Auto,
            suffix: "_".to_string(),
        }
    }
}

/// Paired row positions of a join result; `None` marks a padded side.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JoinIndex {
    pub left: Vec<Option<usize>>,
    pub right: Vec<Option<usize>>,
}

impl JoinIndex {
    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    fn push(&mut self, left: Option<usize>, right: Option<usize>) {
        self.left.push(left);
        self.right.push(right);
    }
}

impl Table {
    pub fn join(&self, right: &Table, kind: JoinKind, predicate: &JoinPredicate) -> FrameResult<Table> {
        self.join_with(right, kind, predicate, &JoinOptions::default())
    }

    pub fn join_with(
        &self,
        right: &Table,
        kind: JoinKind,
        predicate: &JoinPredicate,
        options: &JoinOptions,
    ) -> FrameResult<Table> {
        let index = self.join_index(right, kind, predicate, options.strategy)?;
        zip_tables(self, &index.left, right, &index.right, &options.suffix)
    }

    pub fn inner_join(&self, right: &Table, predicate: &JoinPredicate) -> FrameResult<Table> {
        self.join(right, JoinKind::Inner, predicate)
    }

    pub fn left_join(&self, right: &Table, predicate: &JoinPredicate) -> FrameResult<Table> {
        self.join(right, JoinKind::Left, predicate)
    }

    pub fn right_join(&self, right: &Table, predicate: &JoinPredicate) -> FrameResult<Table> {
        self.join(right, JoinKind::Right, predicate)
    }

    pub fn full_join(&self, right: &Table, predicate: &JoinPredicate) -> FrameResult<Table> {
        self.join(right, JoinKind::Full, predicate)
    }

    /// Matched row positions only, without materializing the joined table.
    pub fn join_index(
        &self,
        right: &Table,
        kind: JoinKind,
        predicate: &JoinPredicate,
        strategy: JoinStrategy,
    ) -> FrameResult<JoinIndex> {
        let strategy = match (strategy, predicate) {
            (JoinStrategy::Auto, JoinPredicate::On(_)) => JoinStrategy::Hash,
            (JoinStrategy::Auto, JoinPredicate::Rows(_)) => JoinStrategy::NestedLoop,
            (JoinStrategy::Hash, JoinPredicate::Rows(_)) => return Err(FrameError::HashJoinPredicate),
            (strategy, _) => strategy,
        };
        log::debug!(
            "{kind} join via {strategy}: {} x {} rows",
            self.height(),
            right.height()
        );

        // Right joins probe with the right side so the output follows right row order.
        let probe_is_left = kind != JoinKind::Right;
        let (probe, build) = if probe_is_left {
            (self, right)
        } else {
            (right, self)
        };
        let matches = match predicate {
            JoinPredicate::On(pairs) => {
                let (left_keys, right_keys) = key_columns(self, right, pairs)?;
                let (probe_keys, build_keys) = if probe_is_left {
                    (left_keys, right_keys)
                } else {
                    (right_keys, left_keys)
                };
                if strategy == JoinStrategy::Hash {
                    hash_matches(&probe_keys, probe.height(), &build_keys, build.height())
                } else {
                    nested_key_matches(&probe_keys, probe.height(), &build_keys, build.height())
                }
            }
            JoinPredicate::Rows(matcher) => nested_row_matches(probe, build, probe_is_left, matcher),
        };
        Ok(assemble(kind, &matches, build.height()))
    }
}

fn key_columns<'a>(
    left: &'a Table,
    right: &'a Table,
    pairs: &[(String, String)],
) -> FrameResult<(Vec<&'a Column>, Vec<&'a Column>)> {
    let mut left_keys = Vec::with_capacity(pairs.len());
    let mut right_keys = Vec::with_capacity(pairs.len());
    for (l, r) in pairs {
        left_keys.push(left.column(l)?);
        right_keys.push(right.column(r)?);
    }
    Ok((left_keys, right_keys))
}

/// Composite key of one row, or `None` when any component is null.
fn row_key(columns: &[&Column], row: usize) -> Option<Vec<Value>> {
    columns
        .iter()
        .map(|c| {
            let value = c.value(row);
            (!value.is_null()).then_some(value)
        })
        .collect()
}

/// For each probe row, the matching build rows in ascending order.
fn hash_matches(
    probe: &[&Column],
    probe_height: usize,
    build: &[&Column],
    build_height: usize,
) -> Vec<Vec<usize>> {
    let mut table: HashMap<Vec<Value>, Vec<usize>> = HashMap::new();
    for row in 0..build_height {
        if let Some(key) = row_key(build, row) {
            table.entry(key).or_default().push(row);
        }
    }
    (0..probe_height)
        .map(|row| {
            row_key(probe, row)
                .and_then(|key| table.get(&key).cloned())
                .unwrap_or_default()
        })
        .collect()
}

fn nested_key_matches(
    probe: &[&Column],
    probe_height: usize,
    build: &[&Column],
    build_height: usize,
) -> Vec<Vec<usize>> {
    let build_keys: Vec<Option<Vec<Value>>> = (0..build_height).map(|r| row_key(build, r)).collect();
    (0..probe_height)
        .map(|row| match row_key(probe, row) {
            None => Vec::new(),
            Some(key) => build_keys
                .iter()
                .enumerate()
                .filter(|(_, other)| other.as_ref() == Some(&key))
                .map(|(pos, _)| pos)
                .collect(),
        })
        .collect()
}

fn nested_row_matches(
    probe: &Table,
    build: &Table,
    probe_is_left: bool,
    matcher: &RowMatcher,
) -> Vec<Vec<usize>> {
    (0..probe.height())
        .map(|p| {
            let p_row = Row::new(probe, p);
            (0..build.height())
                .filter(|&b| {
                    let b_row = Row::new(build, b);
                    if probe_is_left {
                        matcher(&p_row, &b_row)
                    } else {
                        matcher(&b_row, &p_row)
                    }
                })
                .collect()
        })
        .collect()
}

/// Turn per-probe-row matches into paired positions for `kind`.
fn assemble(kind: JoinKind, matches: &[Vec<usize>], build_height: usize) -> JoinIndex {
    let mut index = JoinIndex::default();
    let mut build_matched = vec![false; build_height];
    for (probe, hits) in matches.iter().enumerate() {
        if hits.is_empty() {
            match kind {
                JoinKind::Inner => {}
                JoinKind::Left | JoinKind::Full => index.push(Some(probe), None),
                JoinKind::Right => index.push(None, Some(probe)),
            }
            continue;
        }
        for &build in hits {
            build_matched[build] = true;
            if kind == JoinKind::Right {
                index.push(Some(build), Some(probe));
            } else {
                index.push(Some(probe), Some(build));
            }
        }
    }
    if kind == JoinKind::Full {
        for (build, matched) in build_matched.into_iter().enumerate() {
            if !matched {
                index.push(None, Some(build));
            }
        }
    }
    index
}

/// Place two tables side by side, gathering each by its position list. Right-side names that
/// collide with an existing name get `suffix` appended until unique.
pub(crate) fn zip_tables(
    left: &Table,
    left_positions: &[Option<usize>],
    right: &Table,
    right_positions: &[Option<usize>],
    suffix: &str,
) -> FrameResult<Table> {
    let mut index: ColumnIndex = left.index().clone();
    for name in right.column_names() {
        index.push_unique(name, suffix);
    }
    let mut columns = Vec::with_capacity(left.width() + right.width());
    for column in left.columns() {
        columns.push(column.gather_opt(left_positions)?);
    }
    for column in right.columns() {
        columns.push(column.gather_opt(right_positions)?);
    }
    Table::from_parts(index, columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_join_appends_unmatched_right_rows_in_order() {
        let matches = vec![vec![1], vec![], vec![1]];
        let index = assemble(JoinKind::Full, &matches, 3);
        assert_eq!(
            index.left,
            vec![Some(0), Some(1), Some(2), None, None]
        );
        assert_eq!(
            index.right,
            vec![Some(1), None, Some(1), Some(0), Some(2)]
        );
    }

    #[test]
    fn right_join_pairs_are_oriented_left_right() {
        let matches = vec![vec![0, 2], vec![]];
        let index = assemble(JoinKind::Right, &matches, 3);
        assert_eq!(index.left, vec![Some(0), Some(2), None]);
        assert_eq!(index.right, vec![Some(0), Some(0), Some(1)]);
    }

    #[test]
    fn null_keys_never_match() {
        let left = Column::from_values(
            tabula_columnar::ValueType::Int64,
            vec![Value::Null, Value::Int64(1)],
        );
        let right = left.clone();
        let hashed = hash_matches(&[&left], 2, &[&right], 2);
        let nested = nested_key_matches(&[&left], 2, &[&right], 2);
        assert_eq!(hashed, vec![vec![], vec![1]]);
        assert_eq!(hashed, nested);
    }
}
