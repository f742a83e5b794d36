//! Cell handles.
//!
//! A [`CellId`] is a stable index into the arena of a [`Sheet`](super::Sheet).
//! Cells never move or get removed, so a handle stays valid for the whole
//! lifetime of the sheet that issued it.

use std::fmt;

/// A non-owning reference to a cell in a sheet.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct CellId(usize);

impl CellId {
    pub fn new(index: usize) -> CellId {
        CellId(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
