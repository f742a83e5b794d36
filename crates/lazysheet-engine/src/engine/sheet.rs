//! The cell arena and its lazy evaluation protocol.
//!
//! Staleness is never stored. A computed cell is fresh when it was assigned
//! manually, or when every prerequisite is settled and none carries a version
//! newer than the cell's own. Writes only stamp the written cell with a
//! version above all of its dependents; readers notice on their next `get`.
//!
//! A failed evaluation is remembered too. Until one of its prerequisites
//! changes, reading the cell again returns the same fault without running the
//! evaluator, and a null-safe cell that turned the fault into an empty value
//! stays fresh.
//!
//! Both the staleness check and the recompute walk the graph with explicit
//! stacks, so the length of a prerequisite chain is not limited by the call
//! stack. Only evaluators reading cells that still need evaluating nest, and
//! that nesting is bounded by [`SheetConfig::max_depth`].

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use super::cell::{Cell, CellKind, Payload};
use super::config::SheetConfig;
use super::cycle::detect_cycle;
use super::formula::Scope;
use super::id::CellId;
use crate::error::{CellError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Status {
    /// The cached value is current.
    Fresh,
    /// The last evaluation failed, and would fail the same way again.
    Faulted,
    Stale,
}

/// Statuses found while checking cells for one read.
#[derive(Default)]
struct Walk {
    statuses: HashMap<CellId, Status>,
    /// Cells found fresh or faulted that are not yet marked as checked.
    settled: Vec<CellId>,
}

impl Walk {
    fn record(&mut self, id: CellId, status: Status) {
        self.statuses.insert(id, status);
        if status != Status::Stale {
            self.settled.push(id);
        }
    }
}

/// Whether `prerequisite` moved on since `cell` was last confirmed.
fn outdated<T>(cell: &Cell<T>, prerequisite: &Cell<T>) -> bool {
    prerequisite.changed > cell.checked
        || (cell.fault.is_none() && prerequisite.version > cell.version)
}

/// A graph of memoized cells sharing one value type.
pub struct Sheet<T> {
    cells: Vec<Cell<T>>,
    /// Cells whose evaluation is in progress, outermost first.
    evaluating: Vec<CellId>,
    /// Recomputes running inside evaluators right now.
    depth: usize,
    /// Bumped by every `set` and `depends_on`. A cell checked at the current
    /// revision needs no further checking.
    revision: u64,
    config: SheetConfig,
}

impl<T> Default for Sheet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Sheet<T> {
    pub fn new() -> Self {
        Self::with_config(SheetConfig::default())
    }

    pub fn with_config(config: SheetConfig) -> Self {
        Sheet {
            cells: Vec::new(),
            evaluating: Vec::new(),
            depth: 0,
            revision: 1,
            config,
        }
    }

    pub fn config(&self) -> &SheetConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Create a leaf cell.
    pub fn value(&mut self, initial: Option<T>) -> CellId {
        self.insert(Cell::new_value(initial))
    }

    pub fn version(&self, id: CellId) -> Result<u64> {
        Ok(self.cell(id)?.version)
    }

    /// The cached value, without resolving staleness.
    pub fn cache(&self, id: CellId) -> Result<Option<&T>> {
        Ok(self.cell(id)?.cache.as_ref())
    }

    pub fn kind(&self, id: CellId) -> Result<CellKind> {
        Ok(self.cell(id)?.kind)
    }

    /// Whether a computed cell was assigned manually and lost its evaluator.
    pub fn is_overridden(&self, id: CellId) -> Result<bool> {
        Ok(self.cell(id)?.is_overridden())
    }

    /// Prerequisites in declaration order. Empty for leaf cells.
    pub fn prerequisites(&self, id: CellId) -> Result<&[CellId]> {
        Ok(self.cell(id)?.prerequisites())
    }

    /// Cells that declared `id` as a prerequisite, sorted by handle.
    pub fn dependents(&self, id: CellId) -> Result<Vec<CellId>> {
        let mut dependents: Vec<CellId> = self.cell(id)?.dependents.iter().copied().collect();
        dependents.sort();
        Ok(dependents)
    }

    /// Declare prerequisites of a computed cell.
    ///
    /// Cells already listed are skipped, so repeating a declaration is a no-op
    /// on both the prerequisite list and the prerequisites' dependents.
    pub fn depends_on(&mut self, id: CellId, prerequisites: &[CellId]) -> Result<()> {
        for &prerequisite in prerequisites {
            self.cell(prerequisite)?;
        }

        let cell = self.cell_mut(id)?;
        let Payload::Computed(derivation) = &mut cell.payload else {
            return Err(CellError::NotComputed(id));
        };
        for &prerequisite in prerequisites {
            if !derivation.prerequisites.contains(&prerequisite) {
                derivation.prerequisites.push(prerequisite);
            }
        }

        for &prerequisite in prerequisites {
            self.cells[prerequisite.index()].register_dependent(id);
        }
        self.revision += 1;
        Ok(())
    }

    /// Assign a value directly.
    ///
    /// The new version exceeds that of every current dependent, so each of
    /// them is stale on its next read. A computed cell assigned this way keeps
    /// the value for good: its evaluator is dropped.
    pub fn set(&mut self, id: CellId, value: Option<T>) -> Result<()> {
        let version = 1 + self.latest_dependent_version(self.cell(id)?);
        self.revision += 1;
        let revision = self.revision;
        let cell = self.cell_mut(id)?;
        if cell.evaluator().is_some() {
            log::debug!("Cell {} assigned manually, evaluator dropped", id);
        }
        cell.assign(value, version, revision);
        Ok(())
    }

    /// Whether `get(id)` would return the cached value without evaluating
    /// anything. A cell whose remembered fault still holds is not fresh.
    pub fn is_fresh(&self, id: CellId) -> Result<bool> {
        Ok(self.status(id, &mut Walk::default())? == Status::Fresh)
    }

    /// Look for a cycle among declared prerequisites reachable from `id`.
    pub fn find_cycle(&self, id: CellId) -> Result<Option<Vec<CellId>>> {
        self.cell(id)?;
        Ok(detect_cycle(id, &self.cells))
    }

    /// The status of `id` if it is known without looking at prerequisites.
    fn settled(&self, id: CellId, walk: &Walk) -> Result<Option<Status>> {
        let cell = self.cell(id)?;
        if cell.evaluator().is_none() {
            return Ok(Some(Status::Fresh));
        }
        if cell.checked == self.revision {
            return Ok(Some(if cell.fault.is_some() {
                Status::Faulted
            } else {
                Status::Fresh
            }));
        }
        if let Some(&status) = walk.statuses.get(&id) {
            return Ok(Some(status));
        }
        // The evaluator never ran.
        if cell.checked == 0 {
            return Ok(Some(Status::Stale));
        }
        Ok(None)
    }

    /// Depth-first check of `root` against its prerequisites, bottom-up.
    ///
    /// A prerequisite already on the walk's path counts as stale; the
    /// recompute reports the cycle.
    fn status(&self, root: CellId, walk: &mut Walk) -> Result<Status> {
        if let Some(status) = self.settled(root, walk)? {
            return Ok(status);
        }

        let mut stack: Vec<(CellId, usize)> = vec![(root, 0)];
        let mut on_path: HashSet<CellId> = HashSet::from([root]);
        while let Some(&(id, next)) = stack.last() {
            let cell = self.cell(id)?;
            let verdict = match cell.prerequisites().get(next) {
                None if cell.fault.is_some() => Some(Status::Faulted),
                None => Some(Status::Fresh),
                Some(&prerequisite) => {
                    let status = if on_path.contains(&prerequisite) {
                        Some(Status::Stale)
                    } else {
                        self.settled(prerequisite, walk)?
                    };
                    match status {
                        None => {
                            on_path.insert(prerequisite);
                            stack.push((prerequisite, 0));
                            continue;
                        }
                        Some(Status::Stale) => Some(Status::Stale),
                        Some(_) if outdated(cell, self.cell(prerequisite)?) => Some(Status::Stale),
                        Some(_) => None,
                    }
                }
            };

            match verdict {
                Some(status) => {
                    if status == Status::Stale {
                        log::trace!("Cell {} is stale at version {}", id, cell.version);
                    }
                    walk.record(id, status);
                    on_path.remove(&id);
                    stack.pop();
                }
                None => {
                    if let Some(frame) = stack.last_mut() {
                        frame.1 += 1;
                    }
                }
            }
        }
        Ok(walk.statuses.get(&root).copied().unwrap_or(Status::Stale))
    }

    /// Record that the cells a walk found settled are current at this revision.
    fn mark_settled(&mut self, walk: &mut Walk) {
        let revision = self.revision;
        for id in walk.settled.drain(..) {
            if let Some(cell) = self.cells.get_mut(id.index()) {
                cell.checked = revision;
            }
        }
    }

    fn insert(&mut self, cell: Cell<T>) -> CellId {
        let id = CellId::new(self.cells.len());
        self.cells.push(cell);
        id
    }

    /// Remove the most recently inserted cell after a failed construction.
    fn discard_last(&mut self, id: CellId) {
        if id.index() + 1 != self.cells.len() {
            return;
        }
        if let Some(cell) = self.cells.pop() {
            for prerequisite in cell.prerequisites() {
                if let Some(prerequisite) = self.cells.get_mut(prerequisite.index()) {
                    prerequisite.dependents.remove(&id);
                }
            }
        }
    }

    fn cell(&self, id: CellId) -> Result<&Cell<T>> {
        self.cells.get(id.index()).ok_or(CellError::UnknownCell(id))
    }

    fn cell_mut(&mut self, id: CellId) -> Result<&mut Cell<T>> {
        self.cells
            .get_mut(id.index())
            .ok_or(CellError::UnknownCell(id))
    }

    fn latest_dependent_version(&self, cell: &Cell<T>) -> u64 {
        cell.dependents
            .iter()
            .filter_map(|dependent| self.cells.get(dependent.index()))
            .map(|dependent| dependent.version)
            .max()
            .unwrap_or(0)
    }

    fn latest_prerequisite_version(&self, prerequisites: &[CellId]) -> u64 {
        prerequisites
            .iter()
            .filter_map(|prerequisite| self.cells.get(prerequisite.index()))
            .map(|prerequisite| prerequisite.version)
            .max()
            .unwrap_or(0)
    }
}

impl<T: Clone + 'static> Sheet<T> {
    /// Create a lazily evaluated cell. A missing value faults the read.
    pub fn computed<F>(&mut self, f: F) -> CellId
    where
        F: Fn(&mut Scope<'_, T>) -> Result<Option<T>> + 'static,
    {
        self.insert(Cell::new_computed(CellKind::Computed, Rc::new(f)))
    }

    /// Create a lazily evaluated cell that turns a missing value anywhere in
    /// its evaluation into an empty result.
    pub fn null_safe<F>(&mut self, f: F) -> CellId
    where
        F: Fn(&mut Scope<'_, T>) -> Result<Option<T>> + 'static,
    {
        self.insert(Cell::new_computed(CellKind::NullSafe, Rc::new(f)))
    }

    /// Create a cell that must never be empty.
    ///
    /// The prerequisites are declared and the cell is evaluated right away.
    /// If that evaluation fails, or yields nothing, no cell is created.
    pub fn non_null<F>(&mut self, prerequisites: &[CellId], f: F) -> Result<CellId>
    where
        F: Fn(&mut Scope<'_, T>) -> Result<Option<T>> + 'static,
    {
        let id = self.insert(Cell::new_computed(CellKind::NonNull, Rc::new(f)));
        let built = self
            .depends_on(id, prerequisites)
            .and_then(|()| self.get(id));
        match built {
            Ok(_) => Ok(id),
            Err(err) => {
                self.discard_last(id);
                Err(match err {
                    CellError::NullResult(cell) if cell == id => CellError::ConstructionInvariant,
                    other => other,
                })
            }
        }
    }

    /// Read a cell, recomputing it (and its stale prerequisites) first if
    /// needed.
    pub fn get(&mut self, id: CellId) -> Result<Option<T>> {
        let mut walk = Walk::default();
        let status = self.status(id, &mut walk)?;
        self.mark_settled(&mut walk);
        if status != Status::Stale {
            return self.recorded(id);
        }
        self.refresh(id, &mut walk)
    }

    /// The cached value, or the remembered fault.
    fn recorded(&self, id: CellId) -> Result<Option<T>> {
        let cell = self.cell(id)?;
        match &cell.fault {
            Some(fault) => Err(fault.clone()),
            None => Ok(cell.cache.clone()),
        }
    }

    fn refresh(&mut self, root: CellId, walk: &mut Walk) -> Result<Option<T>> {
        if self.depth >= self.config.max_depth {
            return Err(CellError::DepthExceeded {
                cell: root,
                limit: self.config.max_depth,
            });
        }

        let base = self.evaluating.len();
        self.depth += 1;
        let settled = self.settle(root, walk);
        self.depth -= 1;
        self.evaluating.truncate(base);

        settled?;
        self.recorded(root)
    }

    /// Bring `root` and every stale cell below it up to date.
    ///
    /// Prerequisites are forced in declaration order, depth first, before the
    /// evaluator runs. A faulted prerequisite fails its dependent without
    /// running the dependent's evaluator.
    fn settle(&mut self, root: CellId, walk: &mut Walk) -> Result<()> {
        let mut stack: Vec<(CellId, usize)> = Vec::new();
        self.enter(root, &mut stack)?;

        while let Some(&(id, next)) = stack.last() {
            let prerequisite = self.cell(id)?.prerequisites().get(next).copied();
            let outcome = match prerequisite {
                Some(prerequisite) => {
                    let status = self.status(prerequisite, walk)?;
                    self.mark_settled(walk);
                    if status == Status::Stale {
                        self.enter(prerequisite, &mut stack)?;
                        continue;
                    }
                    match self.recorded(prerequisite) {
                        Ok(_) => {
                            if let Some(frame) = stack.last_mut() {
                                frame.1 += 1;
                            }
                            continue;
                        }
                        Err(fault) => Err(fault),
                    }
                }
                None => self.evaluate(id),
            };

            stack.pop();
            self.evaluating.pop();
            let status = self.store(id, outcome)?;
            walk.statuses.insert(id, status);
        }
        Ok(())
    }

    fn enter(&mut self, id: CellId, stack: &mut Vec<(CellId, usize)>) -> Result<()> {
        if let Some(start) = self.evaluating.iter().position(|&cell| cell == id) {
            let mut path = self.evaluating[start..].to_vec();
            path.push(id);
            log::warn!("Circular dependency detected at cell {}", id);
            return Err(CellError::Cycle { path });
        }
        self.evaluating.push(id);
        stack.push((id, 0));
        Ok(())
    }

    fn evaluate(&mut self, id: CellId) -> Result<Option<T>> {
        let cell = self.cell(id)?;
        let Some(evaluator) = cell.evaluator().cloned() else {
            return Ok(cell.cache.clone());
        };
        evaluator(&mut Scope::new(self, id))
    }

    /// Apply the outcome of an evaluation to `id`.
    ///
    /// Missing values and empty non-null results are remembered as faults;
    /// any other error aborts the read.
    fn store(&mut self, id: CellId, outcome: Result<Option<T>>) -> Result<Status> {
        let kind = self.cell(id)?.kind;
        let revision = self.revision;
        let value = match outcome {
            Ok(value) => value,
            Err(CellError::MissingValue(missing)) if kind == CellKind::NullSafe => {
                log::debug!("Cell {} is empty: no value in {}", id, missing);
                None
            }
            Err(fault @ (CellError::MissingValue(_) | CellError::NullResult(_))) => {
                log::debug!("Cell {} faulted: {}", id, fault);
                self.cell_mut(id)?.record_fault(fault, revision);
                return Ok(Status::Faulted);
            }
            Err(err) => return Err(err),
        };
        if value.is_none() && kind == CellKind::NonNull {
            self.cell_mut(id)?
                .record_fault(CellError::NullResult(id), revision);
            return Ok(Status::Faulted);
        }

        let cell = self.cell(id)?;
        let version = 1 + self
            .latest_prerequisite_version(cell.prerequisites())
            .max(self.latest_dependent_version(cell));
        log::debug!(
            "Recomputed cell {}: version {} -> {}",
            id,
            cell.version,
            version
        );
        self.cell_mut(id)?.stamp(value, version, revision);
        Ok(Status::Fresh)
    }
}
