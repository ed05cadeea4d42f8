use crate::error::{FrameError, FrameResult};
use std::collections::HashMap;

/// Ordered, unique column labels with name → position lookup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColumnIndex {
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

impl ColumnIndex {
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> FrameResult<Self> {
        let mut index = ColumnIndex::default();
        for name in names {
            index.push(name.into())?;
        }
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub fn position(&self, name: &str) -> FrameResult<usize> {
        self.positions
            .get(name)
            .copied()
            .ok_or_else(|| FrameError::UnknownColumn(name.to_string()))
    }

    pub fn name(&self, position: usize) -> FrameResult<&str> {
        self.names
            .get(position)
            .map(String::as_str)
            .ok_or(FrameError::UnknownPosition {
                position,
                width: self.names.len(),
            })
    }

    pub(crate) fn push(&mut self, name: String) -> FrameResult<usize> {
        if self.positions.contains_key(&name) {
            return Err(FrameError::DuplicateColumn(name));
        }
        let position = self.names.len();
        self.positions.insert(name.clone(), position);
        self.names.push(name);
        Ok(position)
    }

    /// Append `name`, adding `suffix` until it no longer collides with an existing label.
    pub(crate) fn push_unique(&mut self, name: &str, suffix: &str) -> usize {
        let mut label = name.to_string();
        while self.positions.contains_key(&label) {
            label.push_str(suffix);
        }
        let position = self.names.len();
        self.positions.insert(label.clone(), position);
        self.names.push(label);
        position
    }

    pub fn rename(&self, old: &str, new: &str) -> FrameResult<Self> {
        let position = self.position(old)?;
        let mut names = self.names.clone();
        names[position] = new.to_string();
        ColumnIndex::new(names)
    }

    pub fn rename_all<S: Into<String>>(&self, names: impl IntoIterator<Item = S>) -> FrameResult<Self> {
        let renamed = ColumnIndex::new(names)?;
        if renamed.len() != self.len() {
            return Err(FrameError::WidthMismatch {
                expected: self.len(),
                actual: renamed.len(),
            });
        }
        Ok(renamed)
    }

    /// Sub-index for `names`, in the given order, with their source positions.
    pub fn select(&self, names: &[&str]) -> FrameResult<(Self, Vec<usize>)> {
        let positions = names
            .iter()
            .map(|name| self.position(name))
            .collect::<FrameResult<Vec<_>>>()?;
        Ok((ColumnIndex::new(names.iter().copied())?, positions))
    }
}
