//! Grid engine: paged row loading, row validation, error surfacing and
//! multi-level column headers.

pub mod columns;
pub mod error_index;
pub mod error_panel;
pub mod events;
pub mod filter;
pub mod loader;
pub mod navigator;
pub mod notify;
pub mod schedule;
pub mod session;
pub mod source;
pub mod validation;

pub use error_index::{escape_html, CellStyle, ErrorIndex, HitTarget, TooltipAction, TooltipTracker};
pub use loader::{IncrementalLoader, PageRequest, RecordView, RowGroup, ViewportState};
pub use session::{GridSession, SaveOutcome};
pub use source::{FundSample, RecordSource, SampleSales, VecSource};
pub use validation::{RuleColumns, Validator};
