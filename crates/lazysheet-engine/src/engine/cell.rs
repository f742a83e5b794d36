//! Cell records stored in the sheet arena.
//!
//! Every cell shares the same bookkeeping:
//! - `cache` - the last computed or assigned value (may be empty)
//! - `version` - a counter that never decreases, starting at 0
//! - `dependents` - handles of cells that list this one as a prerequisite
//!
//! Computed cells additionally carry a [`Derivation`]: their prerequisites in
//! declaration order and the evaluator. Two sheet revisions track when the
//! outcome last changed and when it was last confirmed current.

use std::collections::HashSet;

use super::formula::Evaluator;
use super::id::CellId;
use crate::error::CellError;

/// The variant of a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellKind {
    /// A leaf holding an assigned value.
    Value,
    /// Derived from prerequisites; missing values fault.
    Computed,
    /// Derived; a missing value anywhere below yields an empty result.
    NullSafe,
    /// Derived, evaluated eagerly once, never empty.
    NonNull,
}

pub(crate) struct Derivation<T> {
    pub prerequisites: Vec<CellId>,
    /// `None` once the cell has been assigned manually.
    pub evaluator: Option<Evaluator<T>>,
}

pub(crate) enum Payload<T> {
    Value,
    Computed(Derivation<T>),
}

pub(crate) struct Cell<T> {
    pub cache: Option<T>,
    pub version: u64,
    pub dependents: HashSet<CellId>,
    pub kind: CellKind,
    pub payload: Payload<T>,
    /// The fault of the last evaluation, if it failed. Cache and version keep
    /// the last good result.
    pub fault: Option<CellError>,
    /// Revision at which the value or fault last changed.
    pub changed: u64,
    /// Revision at which the outcome was last confirmed; 0 if never evaluated.
    pub checked: u64,
}

impl<T> Cell<T> {
    pub fn new_value(initial: Option<T>) -> Cell<T> {
        Cell {
            cache: initial,
            version: 0,
            dependents: HashSet::new(),
            kind: CellKind::Value,
            payload: Payload::Value,
            fault: None,
            changed: 0,
            checked: 0,
        }
    }

    pub fn new_computed(kind: CellKind, evaluator: Evaluator<T>) -> Cell<T> {
        Cell {
            cache: None,
            version: 0,
            dependents: HashSet::new(),
            kind,
            payload: Payload::Computed(Derivation {
                prerequisites: Vec::new(),
                evaluator: Some(evaluator),
            }),
            fault: None,
            changed: 0,
            checked: 0,
        }
    }

    pub fn prerequisites(&self) -> &[CellId] {
        match &self.payload {
            Payload::Value => &[],
            Payload::Computed(derivation) => &derivation.prerequisites,
        }
    }

    /// The evaluator, unless this is a leaf or was assigned manually.
    pub fn evaluator(&self) -> Option<&Evaluator<T>> {
        match &self.payload {
            Payload::Value => None,
            Payload::Computed(derivation) => derivation.evaluator.as_ref(),
        }
    }

    pub fn is_overridden(&self) -> bool {
        matches!(&self.payload, Payload::Computed(d) if d.evaluator.is_none())
    }

    /// Store a value from outside. Computed cells lose their evaluator for good.
    pub fn assign(&mut self, value: Option<T>, version: u64, revision: u64) {
        self.stamp(value, version, revision);
        if let Payload::Computed(derivation) = &mut self.payload {
            derivation.evaluator = None;
        }
    }

    /// Store a freshly evaluated value.
    pub fn stamp(&mut self, value: Option<T>, version: u64, revision: u64) {
        self.cache = value;
        self.version = self.version.max(version);
        self.fault = None;
        self.changed = revision;
        self.checked = revision;
    }

    /// Remember a failed evaluation without touching cache or version.
    pub fn record_fault(&mut self, fault: CellError, revision: u64) {
        self.fault = Some(fault);
        self.changed = revision;
        self.checked = revision;
    }

    /// Returns false if `id` was already registered.
    pub fn register_dependent(&mut self, id: CellId) -> bool {
        self.dependents.insert(id)
    }
}
