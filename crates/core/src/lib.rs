//! Shared data model for pagegrid: rows as they come out of a record source,
//! the scalar values they hold, and the cell coordinates used by validation
//! and navigation.

pub mod cell;
pub mod row;

pub use cell::{CellError, CellRange};
pub use row::{Row, Value};
