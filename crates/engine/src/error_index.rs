//! Per-cell lookup of validation errors, for rendering and hover.
//!
//! An [`ErrorIndex`] is immutable. Each validation pass builds a fresh one
//! and the owner swaps it in whole, so a reader sees either the previous
//! index or the new one, never a partially populated map.

use pagegrid_core::{CellError, CellRange};
use rustc_hash::FxHashMap;

/// Rendering hint for one data cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellStyle {
    pub highlighted: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ErrorIndex {
    generation: u64,
    errors: Vec<CellError>,
    by_cell: FxHashMap<(usize, usize), usize>,
}

impl ErrorIndex {
    /// Index a validation result against the current bounds. Errors outside
    /// `rows x cols` refer to a stale layout or row set and are dropped.
    /// When two errors share a cell the first one wins the lookup.
    pub fn rebuild(generation: u64, errors: Vec<CellError>, rows: usize, cols: usize) -> Self {
        let total = errors.len();
        let errors: Vec<CellError> = errors
            .into_iter()
            .filter(|e| e.row < rows && e.col < cols)
            .collect();
        if errors.len() < total {
            log::debug!("dropped {} out-of-range error(s)", total - errors.len());
        }

        let mut by_cell = FxHashMap::default();
        for (i, e) in errors.iter().enumerate() {
            by_cell.entry((e.row, e.col)).or_insert(i);
        }
        Self { generation, errors, by_cell }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn errors(&self) -> &[CellError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn index_of(&self, row: usize, col: usize) -> Option<&CellError> {
        self.by_cell.get(&(row, col)).map(|&i| &self.errors[i])
    }

    pub fn style_for(&self, row: usize, col: usize) -> CellStyle {
        CellStyle { highlighted: self.index_of(row, col).is_some() }
    }

    /// Hover text, escaped for a markup context.
    pub fn tooltip_for(&self, row: usize, col: usize) -> Option<String> {
        self.index_of(row, col).map(|e| escape_html(&e.message))
    }
}

/// Escape text for insertion into HTML.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

// ============================================================================
// Tooltip hover tracking
// ============================================================================

/// What the pointer is over, as reported by the widget's hit test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Cell { row: usize, col: usize },
    Header,
    Outside,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TooltipAction {
    Show { text: String, range: CellRange },
    Hide,
    Unchanged,
}

/// Tracks which error cell the tooltip is showing so repeated moves within
/// the same cell do nothing.
#[derive(Debug, Clone, Default)]
pub struct TooltipTracker {
    current: Option<CellRange>,
}

impl TooltipTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<CellRange> {
        self.current
    }

    pub fn hover(&mut self, hit: HitTarget, index: &ErrorIndex) -> TooltipAction {
        if let HitTarget::Cell { row, col } = hit {
            let range = CellRange::single(row, col);
            if self.current == Some(range) {
                return TooltipAction::Unchanged;
            }
            if let Some(text) = index.tooltip_for(row, col) {
                self.current = Some(range);
                return TooltipAction::Show { text, range };
            }
        }
        self.hide()
    }

    /// Pointer left the grid.
    pub fn leave(&mut self) -> TooltipAction {
        self.hide()
    }

    fn hide(&mut self) -> TooltipAction {
        match self.current.take() {
            Some(_) => TooltipAction::Hide,
            None => TooltipAction::Unchanged,
        }
    }
}
