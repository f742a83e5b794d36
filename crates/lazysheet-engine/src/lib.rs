//! lazysheet_engine - Lazily evaluated, versioned cell graph.
//!
//! A cell either holds an assigned value or derives one from its
//! prerequisites. Derived cells recompute on read, and only when a
//! prerequisite changed since their last evaluation.
//!
//! ```
//! use lazysheet_engine::engine::Sheet;
//!
//! let mut sheet = Sheet::new();
//! let a = sheet.value(Some(2i64));
//! let square = sheet.computed(move |s| {
//!     let a = s.require(a)?;
//!     Ok(Some(a * a))
//! });
//! sheet.depends_on(square, &[a]).unwrap();
//!
//! assert_eq!(sheet.get(square).unwrap(), Some(4));
//! sheet.set(a, Some(3)).unwrap();
//! assert_eq!(sheet.get(square).unwrap(), Some(9));
//! ```

pub mod engine;
pub mod error;

pub use engine::{CellId, CellKind, Scope, Sheet, SheetConfig};
pub use error::{CellError, Result};
