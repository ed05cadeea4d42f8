//! Read-only row views over a [`Table`].

use crate::error::FrameResult;
use crate::table::Table;
use tabula_columnar::Value;

/// One logical row of a table. Values are read from the columns on demand; nothing is copied.
#[derive(Clone, Copy, Debug)]
pub struct Row<'a> {
    table: &'a Table,
    position: usize,
}

impl<'a> Row<'a> {
    pub(crate) fn new(table: &'a Table, position: usize) -> Self {
        Self { table, position }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn table(&self) -> &'a Table {
        self.table
    }

    pub fn get(&self, column: usize) -> FrameResult<Value> {
        Ok(self.table.column_at(column)?.value(self.position))
    }

    pub fn get_named(&self, name: &str) -> FrameResult<Value> {
        Ok(self.table.column(name)?.value(self.position))
    }

    pub fn values(&self) -> Vec<Value> {
        self.table
            .columns()
            .iter()
            .map(|c| c.value(self.position))
            .collect()
    }
}

/// Explicitly advanced cursor over a window of rows.
///
/// ```ignore
/// let mut cursor = table.cursor();
/// while let Some(row) = cursor.read() {
///     // ...
///     cursor.advance();
/// }
/// ```
#[derive(Clone, Debug)]
pub struct RowCursor<'a> {
    table: &'a Table,
    position: usize,
    end: usize,
}

impl<'a> RowCursor<'a> {
    pub(crate) fn new(table: &'a Table, start: usize, end: usize) -> Self {
        let end = end.min(table.height());
        Self {
            table,
            position: start.min(end),
            end,
        }
    }

    pub fn has_more(&self) -> bool {
        self.position < self.end
    }

    pub fn advance(&mut self) {
        if self.has_more() {
            self.position += 1;
        }
    }

    /// The row under the cursor, or `None` once the window is exhausted.
    pub fn read(&self) -> Option<Row<'a>> {
        self.has_more().then(|| Row::new(self.table, self.position))
    }

    pub fn remaining(&self) -> usize {
        self.end - self.position
    }
}
