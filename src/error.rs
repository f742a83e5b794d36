//! Error types for the lazysheet command line

use lazysheet_core::CoreError;
use lazysheet_engine::CellError;
use thiserror::Error;

/// Errors that can occur while seeding or reading the sheet
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unknown cell: {0}")]
    UnknownCell(String),

    #[error("Invalid assignment '{0}': expected NAME=VALUE")]
    InvalidAssignment(String),

    #[error("Invalid value for {name}: '{value}' is not an integer")]
    InvalidValue { name: String, value: String },

    #[error(transparent)]
    Cell(#[from] CellError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type Result<T> = std::result::Result<T, AppError>;
