//! Multi-level column headers.
//!
//! A nested [`ColumnGroupSpec`] tree is compiled into flat leaf columns plus a
//! header grid ([`compile`]), the grid is post-processed into merged header
//! regions ([`merge`]), and the same tree drives a hierarchical show/hide
//! picker ([`ColumnPicker`]).

mod compile;
mod format;
mod merge;
pub mod presets;
mod spec;
mod visibility;

pub use compile::{compile, ColumnLayout, FlatColumn, HeaderGrid};
pub use format::{format_value, header_tint};
pub use merge::{merge, MergedHeader, MergedRegion};
pub use spec::{ColumnGroupSpec, ColumnKind, ColumnMeta, ColumnWidth, DataType, LayoutError};
pub use visibility::{build_tree, toggle, ColumnNode, ColumnPicker, NodePath, PATH_SEPARATOR};
