use crate::error::{FrameError, FrameResult};
use crate::exp::Exp;
use crate::index::ColumnIndex;
use crate::join::JoinKind;
use crate::row::{Row, RowCursor};
use rand::Rng;
use tabula_columnar::{
    sample_positions, Accumulator, BitVec, Column, ObjectAccumulator, Value, ValueType,
};

/// An immutable, ordered set of uniquely named columns of equal height.
///
/// Every transform returns a new table. Column storage is reference counted, so projections,
/// renames and concatenations with unchanged columns share data with their source.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    index: ColumnIndex,
    columns: Vec<Column>,
    height: usize,
}

impl Table {
    pub fn new<S: Into<String>>(
        names: impl IntoIterator<Item = S>,
        columns: Vec<Column>,
    ) -> FrameResult<Self> {
        Self::from_parts(ColumnIndex::new(names)?, columns)
    }

    pub(crate) fn from_parts(index: ColumnIndex, columns: Vec<Column>) -> FrameResult<Self> {
        if index.len() != columns.len() {
            return Err(FrameError::WidthMismatch {
                expected: index.len(),
                actual: columns.len(),
            });
        }
        let height = columns.first().map_or(0, Column::len);
        for (name, column) in index.names().iter().zip(&columns) {
            if column.len() != height {
                return Err(FrameError::HeightMismatch {
                    column: name.clone(),
                    expected: height,
                    actual: column.len(),
                });
            }
        }
        Ok(Self {
            index,
            columns,
            height,
        })
    }

    /// Assemble a table row by row. Columns are boxed; each gets the common type of its
    /// non-null values, or `Any` when they disagree.
    pub fn from_rows<S: Into<String>>(
        names: impl IntoIterator<Item = S>,
        rows: impl IntoIterator<Item = Vec<Value>>,
    ) -> FrameResult<Self> {
        let index = ColumnIndex::new(names)?;
        let width = index.len();
        let mut values: Vec<Vec<Value>> = vec![Vec::new(); width];
        for row in rows {
            if row.len() != width {
                return Err(FrameError::WidthMismatch {
                    expected: width,
                    actual: row.len(),
                });
            }
            for (slot, value) in values.iter_mut().zip(row) {
                slot.push(value);
            }
        }

        let mut columns = Vec::with_capacity(width);
        for column_values in values {
            let ty = common_type(&column_values);
            let mut acc = ObjectAccumulator::with_capacity(ty, column_values.len());
            for value in column_values {
                acc.push(value)?;
            }
            columns.push(acc.to_column());
        }
        Self::from_parts(index, columns)
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn index(&self) -> &ColumnIndex {
        &self.index
    }

    pub fn column_names(&self) -> &[String] {
        self.index.names()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> FrameResult<&Column> {
        Ok(&self.columns[self.index.position(name)?])
    }

    pub fn column_at(&self, position: usize) -> FrameResult<&Column> {
        self.columns.get(position).ok_or(FrameError::UnknownPosition {
            position,
            width: self.columns.len(),
        })
    }

    pub fn get(&self, row: usize, column: usize) -> FrameResult<Value> {
        Ok(self.column_at(column)?.get(row)?)
    }

    pub fn value_by_name(&self, row: usize, name: &str) -> FrameResult<Value> {
        Ok(self.column(name)?.get(row)?)
    }

    pub fn row(&self, position: usize) -> FrameResult<Row<'_>> {
        if position >= self.height {
            return Err(tabula_columnar::ColumnError::OutOfBounds {
                index: position,
                len: self.height,
            }
            .into());
        }
        Ok(Row::new(self, position))
    }

    pub fn cursor(&self) -> RowCursor<'_> {
        RowCursor::new(self, 0, self.height)
    }

    /// Cursor over rows `start..end`, clamped to the table.
    pub fn cursor_range(&self, start: usize, end: usize) -> RowCursor<'_> {
        RowCursor::new(self, start, end)
    }

    /// Apply the same column transform to every column.
    pub(crate) fn map_columns(
        &self,
        mut f: impl FnMut(&Column) -> FrameResult<Column>,
    ) -> FrameResult<Table> {
        let columns = self
            .columns
            .iter()
            .map(&mut f)
            .collect::<FrameResult<Vec<_>>>()?;
        Self::from_parts(self.index.clone(), columns)
    }

    pub fn select_columns(&self, names: &[&str]) -> FrameResult<Table> {
        let (index, positions) = self.index.select(names)?;
        let columns = positions.iter().map(|&p| self.columns[p].clone()).collect();
        Self::from_parts(index, columns)
    }

    pub fn select_positions(&self, positions: &[usize]) -> FrameResult<Table> {
        let names = positions
            .iter()
            .map(|&p| self.index.name(p))
            .collect::<FrameResult<Vec<_>>>()?;
        self.select_columns(&names)
    }

    pub fn drop_columns(&self, names: &[&str]) -> FrameResult<Table> {
        for name in names {
            self.index.position(name)?;
        }
        let keep: Vec<&str> = self
            .index
            .names()
            .iter()
            .map(String::as_str)
            .filter(|n| !names.contains(n))
            .collect();
        self.select_columns(&keep)
    }

    pub fn rename(&self, old: &str, new: &str) -> FrameResult<Table> {
        Self::from_parts(self.index.rename(old, new)?, self.columns.clone())
    }

    pub fn rename_all<S: Into<String>>(&self, names: impl IntoIterator<Item = S>) -> FrameResult<Table> {
        Self::from_parts(self.index.rename_all(names)?, self.columns.clone())
    }

    /// Append a column; it must match the table height unless the table has no columns yet.
    pub fn add_column(&self, name: impl Into<String>, column: Column) -> FrameResult<Table> {
        let mut index = self.index.clone();
        index.push(name.into())?;
        let mut columns = self.columns.clone();
        columns.push(column);
        Self::from_parts(index, columns)
    }

    /// Evaluate `exp` and append the result under the expression's name.
    pub fn add_column_exp(&self, exp: &Exp) -> FrameResult<Table> {
        let column = exp.eval(self)?;
        self.add_column(exp.name(), column)
    }

    pub fn eval(&self, exp: &Exp) -> FrameResult<Column> {
        exp.eval(self)
    }

    pub fn head(&self, n: usize) -> Table {
        self.with_columns(self.columns.iter().map(|c| c.head(n)).collect())
    }

    pub fn tail(&self, n: usize) -> Table {
        self.with_columns(self.columns.iter().map(|c| c.tail(n)).collect())
    }

    fn with_columns(&self, columns: Vec<Column>) -> Table {
        let height = columns.first().map_or(0, Column::len);
        Table {
            index: self.index.clone(),
            columns,
            height,
        }
    }

    /// Rows at `positions`, in that order.
    pub fn select_rows(&self, positions: &[usize]) -> FrameResult<Table> {
        self.map_columns(|c| Ok(c.gather(positions)?))
    }

    /// Rows at `positions`; absent positions produce all-null rows.
    pub fn gather_opt(&self, positions: &[Option<usize>]) -> FrameResult<Table> {
        self.map_columns(|c| Ok(c.gather_opt(positions)?))
    }

    pub fn filter(&self, mask: &BitVec) -> FrameResult<Table> {
        self.map_columns(|c| Ok(c.select_mask(mask)?))
    }

    /// Keep the rows where a boolean expression is true; null counts as false.
    pub fn filter_exp(&self, condition: &Exp) -> FrameResult<Table> {
        let mask = condition.eval_mask(self)?;
        self.filter(&mask)
    }

    pub fn filter_column(
        &self,
        name: &str,
        predicate: impl FnMut(&Value) -> bool,
    ) -> FrameResult<Table> {
        let mask = self.column(name)?.locate(predicate);
        self.filter(&mask)
    }

    /// Side-by-side concatenation of two tables of equal height.
    pub fn hconcat(&self, other: &Table) -> FrameResult<Table> {
        if self.height != other.height {
            return Err(FrameError::HeightMismatch {
                column: other.column_names().first().cloned().unwrap_or_default(),
                expected: self.height,
                actual: other.height,
            });
        }
        self.hconcat_with(JoinKind::Inner, other)
    }

    /// Side-by-side concatenation where `kind` decides the output height: inner keeps the
    /// shorter height, left/right the height of that side, full the longer height. Missing rows
    /// are null.
    pub fn hconcat_with(&self, kind: JoinKind, other: &Table) -> FrameResult<Table> {
        let height = match kind {
            JoinKind::Inner => self.height.min(other.height),
            JoinKind::Left => self.height,
            JoinKind::Right => other.height,
            JoinKind::Full => self.height.max(other.height),
        };
        let side = |len: usize| -> Vec<Option<usize>> {
            (0..height).map(|i| (i < len).then_some(i)).collect()
        };
        crate::join::zip_tables(self, &side(self.height), other, &side(other.height), "_")
    }

    /// Stack tables vertically, aligned by this table's column names. Columns missing from a
    /// later table are filled with nulls; extra columns in later tables are dropped.
    pub fn vconcat(&self, others: &[&Table]) -> FrameResult<Table> {
        let mut columns = Vec::with_capacity(self.width());
        for (name, first) in self.column_names().iter().zip(&self.columns) {
            let rest = others
                .iter()
                .map(|t| match t.column(name) {
                    Ok(c) => c.clone(),
                    Err(_) => Column::repeat(first.value_type(), &Value::Null, t.height()),
                })
                .collect::<Vec<_>>();
            let rest: Vec<&Column> = rest.iter().collect();
            columns.push(first.concat(&rest));
        }
        Self::from_parts(self.index.clone(), columns)
    }

    /// `n` rows drawn without replacement, in their original order.
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> FrameResult<Table> {
        let positions = sample_positions(self.height, n, rng)?;
        self.select_rows(&positions)
    }

    pub fn sample_random(&self, n: usize) -> FrameResult<Table> {
        self.sample(n, &mut rand::thread_rng())
    }

    pub fn to_rows(&self) -> Vec<Vec<Value>> {
        (0..self.height).map(|i| Row::new(self, i).values()).collect()
    }
}

fn common_type(values: &[Value]) -> ValueType {
    let mut types = values.iter().filter(|v| !v.is_null()).map(Value::value_type);
    match types.next() {
        None => ValueType::Any,
        Some(first) if types.all(|t| t == first) => first,
        Some(_) => ValueType::Any,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> Table {
        Table::new(
            ["a", "b"],
            vec![
                Column::from_i64s(vec![1, 2, 3]),
                Column::from_values(
                    ValueType::Str,
                    vec![Value::from("x"), Value::from("y"), Value::from("z")],
                ),
            ],
        )
        .unwrap()
    }

    #[test]
    fn rejects_ragged_columns() {
        let err = Table::new(
            ["a", "b"],
            vec![Column::from_i64s(vec![1, 2]), Column::from_i64s(vec![1])],
        )
        .unwrap_err();
        assert!(matches!(err, FrameError::HeightMismatch { expected: 2, actual: 1, .. }));
    }

    #[test]
    fn from_rows_builds_boxed_columns() {
        let t = Table::from_rows(
            ["n", "mixed"],
            vec![
                vec![Value::Int64(1), Value::from("a")],
                vec![Value::Null, Value::Int64(2)],
            ],
        )
        .unwrap();
        assert!(!t.column("n").unwrap().is_primitive());
        assert_eq!(t.column("n").unwrap().value_type(), ValueType::Int64);
        assert_eq!(t.column("mixed").unwrap().value_type(), ValueType::Any);
        assert!(Table::from_rows(["a"], vec![vec![]]).is_err());
    }

    #[test]
    fn head_and_tail_clamp_to_height() {
        let t = sample_table();
        assert_eq!(t.head(0).height(), 0);
        assert_eq!(t.head(10), t);
        assert_eq!(t.tail(1).get(0, 1).unwrap(), Value::from("z"));
    }

    #[test]
    fn projection_shares_columns() {
        let t = sample_table();
        let p = t.select_columns(&["b"]).unwrap();
        assert_eq!(p.width(), 1);
        assert_eq!(p.column_at(0).unwrap(), t.column("b").unwrap());
        assert!(t.drop_columns(&["nope"]).is_err());
        assert_eq!(t.drop_columns(&["a"]).unwrap(), p);
    }

    #[test]
    fn cursor_streams_a_window() {
        let t = sample_table();
        let mut cursor = t.cursor_range(1, 10);
        let mut seen = Vec::new();
        while cursor.has_more() {
            let row = cursor.read().unwrap();
            seen.push((row.get(0).unwrap(), row.get_named("b").unwrap()));
            cursor.advance();
        }
        assert_eq!(
            seen,
            vec![
                (Value::Int64(2), Value::from("y")),
                (Value::Int64(3), Value::from("z"))
            ]
        );
        assert!(cursor.read().is_none());
    }

    #[test]
    fn vconcat_fills_missing_columns() {
        let t = sample_table();
        let other = Table::new(["a"], vec![Column::from_i64s(vec![9])]).unwrap();
        let out = t.vconcat(&[&other]).unwrap();
        assert_eq!(out.height(), 4);
        assert!(out.column("a").unwrap().is_primitive());
        assert_eq!(out.get(3, 1).unwrap(), Value::Null);
    }
}
