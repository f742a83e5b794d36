//! Evaluation functions and the view they get of the sheet.

use std::rc::Rc;

use super::id::CellId;
use super::sheet::Sheet;
use crate::error::{CellError, Result};

/// A shared evaluation function of a computed cell.
///
/// It returns `Ok(None)` when the value is legitimately empty, and
/// `Err(CellError::MissingValue)` when it needed a value that was absent.
pub type Evaluator<T> = Rc<dyn Fn(&mut Scope<'_, T>) -> Result<Option<T>>>;

/// Access to other cells from inside an evaluator.
///
/// Reads go through [`Sheet::get`], so a prerequisite that is stale gets
/// recomputed before its value is handed out. Cells read here but never
/// declared with [`Sheet::depends_on`] are not tracked: changing them will not
/// invalidate the reading cell.
pub struct Scope<'a, T> {
    sheet: &'a mut Sheet<T>,
    current: CellId,
}

impl<'a, T: Clone + 'static> Scope<'a, T> {
    pub(crate) fn new(sheet: &'a mut Sheet<T>, current: CellId) -> Self {
        Scope { sheet, current }
    }

    /// The cell being evaluated.
    pub fn current(&self) -> CellId {
        self.current
    }

    /// Read a cell, possibly empty.
    pub fn get(&mut self, id: CellId) -> Result<Option<T>> {
        self.sheet.get(id)
    }

    /// Read a cell that must hold a value.
    pub fn require(&mut self, id: CellId) -> Result<T> {
        self.sheet.get(id)?.ok_or(CellError::MissingValue(id))
    }

    /// The fault for an absent value in `id`.
    pub fn missing(&self, id: CellId) -> CellError {
        CellError::MissingValue(id)
    }
}
