//! Cell graph engine API.
//!
//! This module provides the lazily recomputed dependency graph:
//!
//! - [`Sheet`] - Arena of cells with `get`/`set`/`depends_on`
//! - [`CellId`] - Stable, non-owning handle to a cell
//! - [`CellKind`] - Value, computed, null-safe and non-null cells
//! - [`Scope`], [`Evaluator`] - What an evaluation function sees and is
//! - [`SheetConfig`] - Evaluation depth bound

mod cell;
mod config;
mod cycle;
mod formula;
mod id;
mod sheet;

pub use cell::CellKind;
pub use config::{DEFAULT_MAX_DEPTH, SheetConfig};
pub use formula::{Evaluator, Scope};
pub use id::CellId;
pub use sheet::Sheet;
