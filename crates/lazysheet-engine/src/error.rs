//! Error types for the cell engine.

use thiserror::Error;

use crate::engine::CellId;

/// Faults raised while building or reading a sheet.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CellError {
    /// An evaluator required a value that is absent.
    #[error("Missing value in cell {0}")]
    MissingValue(CellId),

    /// A non-null cell evaluated to nothing while being constructed.
    #[error("Non-null cell evaluated to an empty value on construction")]
    ConstructionInvariant,

    /// A non-null cell recomputed to nothing after construction.
    #[error("Non-null cell {0} evaluated to an empty value")]
    NullResult(CellId),

    #[error("Circular dependency detected: {}", format_path(.path))]
    Cycle { path: Vec<CellId> },

    #[error("Evaluation depth limit of {limit} exceeded at cell {cell}")]
    DepthExceeded { cell: CellId, limit: usize },

    #[error("Unknown cell {0}")]
    UnknownCell(CellId),

    #[error("Cell {0} is not a computed cell")]
    NotComputed(CellId),
}

fn format_path(path: &[CellId]) -> String {
    path.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

pub type Result<T> = std::result::Result<T, CellError>;
