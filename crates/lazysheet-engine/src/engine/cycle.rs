//! Circular dependency detection over declared prerequisites.
//!
//! Reading a cell that sits on a cycle fails with `CellError::Cycle` once the
//! evaluation re-enters it. This module lets callers check up front, without
//! evaluating anything, using a depth-first walk of the prerequisite lists.

use std::collections::HashSet;

use super::CellId;
use super::cell::Cell;

/// The first prerequisite cycle reachable from `start`, as a path that begins
/// and ends on the same cell. Cells leading into the cycle are not included.
pub(crate) fn detect_cycle<T>(start: CellId, cells: &[Cell<T>]) -> Option<Vec<CellId>> {
    let mut visiting = HashSet::new();
    let mut finished = HashSet::new();
    let mut path = Vec::new();

    if !detect_cycle_dfs(start, cells, &mut visiting, &mut finished, &mut path) {
        return None;
    }
    let closing = *path.last()?;
    let entry = path.iter().position(|&cell| cell == closing)?;
    Some(path.split_off(entry))
}

fn detect_cycle_dfs<T>(
    current: CellId,
    cells: &[Cell<T>],
    visiting: &mut HashSet<CellId>,
    finished: &mut HashSet<CellId>,
    path: &mut Vec<CellId>,
) -> bool {
    if visiting.contains(&current) {
        path.push(current);
        return true;
    }
    if finished.contains(&current) {
        return false;
    }

    let Some(cell) = cells.get(current.index()) else {
        return false;
    };

    visiting.insert(current);
    path.push(current);

    for &dep in cell.prerequisites() {
        if detect_cycle_dfs(dep, cells, visiting, finished, path) {
            return true;
        }
    }

    path.pop();
    visiting.remove(&current);
    finished.insert(current);
    false
}
