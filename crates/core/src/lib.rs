//! `datagrid-core` - shared value types for the grid data engine.
//!
//! Records and their typed fields, plus the cell selection model.

pub mod record;
pub mod selection;

pub use record::{FieldValue, Record};
pub use selection::{Cell, CellRange, Selection};
