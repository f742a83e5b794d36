//! lazysheet-core - Table storage and pruning utilities.
//!
//! Neither module touches the cell engine; they are used to move flat string
//! data in and out of a sheet and to tidy values read from it.

pub mod error;
pub mod prune;
pub mod storage;

pub use error::{CoreError, Result};
pub use storage::{Row, Table};
