//! Search, column filters and sorting - Row View Layer
//!
//! This module provides the view layer that maps between:
//! - View space (what the grid shows, affected by sort/filter)
//! - Data space (the loader's published rows, 0..N-1)
//!
//! Key invariants:
//! - The grid and navigation use display positions (visible view rows)
//! - Validation and the error index use data rows
//! - Conversion happens at the boundary only
//! - visible_mask is indexed by DATA row (not view row)
//! - All lookups are O(1)

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use ordered_float::OrderedFloat;
use pagegrid_core::{Row, Value};
use serde::{Deserialize, Serialize};

use crate::columns::{format_value, FlatColumn};
use crate::loader::RecordView;

// =============================================================================
// RowView: The core view layer mapping
// =============================================================================

/// Row view layer: maps between view space and data space
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    /// Maps view_row index -> data_row index
    /// Identity by default: [0, 1, 2, ..., N-1]
    row_order: Vec<usize>,

    /// Inverse map: data_row -> view_row
    data_to_view_map: Vec<usize>,

    /// Visibility mask indexed by DATA row (not view row)
    visible_mask: Vec<bool>,

    /// Cached list of visible VIEW row indices, in display order
    visible_rows: Vec<usize>,

    /// data_row -> position in visible_rows
    display_map: Vec<Option<usize>>,
}

impl Default for RowView {
    fn default() -> Self {
        Self::new(0)
    }
}

impl RowView {
    /// Initialize identity mapping for N rows
    pub fn new(row_count: usize) -> Self {
        Self {
            row_order: (0..row_count).collect(),
            data_to_view_map: (0..row_count).collect(),
            visible_mask: vec![true; row_count],
            visible_rows: (0..row_count).collect(),
            display_map: (0..row_count).map(Some).collect(),
        }
    }

    /// Total number of rows (data rows)
    pub fn row_count(&self) -> usize {
        self.row_order.len()
    }

    /// Number of visible rows
    pub fn visible_count(&self) -> usize {
        self.visible_rows.len()
    }

    /// Map view row to data row
    pub fn view_to_data(&self, view_row: usize) -> Option<usize> {
        self.row_order.get(view_row).copied()
    }

    /// Map data row to view row. None if hidden by a filter.
    pub fn data_to_view(&self, data_row: usize) -> Option<usize> {
        if self.is_data_row_visible(data_row) {
            Some(self.data_to_view_map[data_row])
        } else {
            None
        }
    }

    /// Position on screen of a data row. None if hidden or out of range.
    pub fn data_to_display(&self, data_row: usize) -> Option<usize> {
        self.display_map.get(data_row).copied().flatten()
    }

    /// Data row shown at a screen position.
    pub fn display_to_data(&self, display_row: usize) -> Option<usize> {
        self.visible_rows
            .get(display_row)
            .map(|&view_row| self.row_order[view_row])
    }

    pub fn is_data_row_visible(&self, data_row: usize) -> bool {
        data_row < self.visible_mask.len() && self.visible_mask[data_row]
    }

    /// Visible view rows (for rendering/navigation)
    pub fn visible_rows(&self) -> &[usize] {
        &self.visible_rows
    }

    /// Visible data rows in display order.
    pub fn visible_data_rows(&self) -> impl Iterator<Item = usize> + '_ {
        self.visible_rows.iter().map(|&v| self.row_order[v])
    }

    /// Is any filtering active?
    pub fn is_filtered(&self) -> bool {
        self.visible_count() < self.row_count()
    }

    /// Is the view sorted (non-identity order)?
    pub fn is_sorted(&self) -> bool {
        self.row_order.iter().enumerate().any(|(i, &d)| i != d)
    }

    // -------------------------------------------------------------------------
    // Internal rebuilders
    // -------------------------------------------------------------------------

    fn rebuild_inverse_map(&mut self) {
        self.data_to_view_map = vec![0; self.row_order.len()];
        for (view_row, &data_row) in self.row_order.iter().enumerate() {
            self.data_to_view_map[data_row] = view_row;
        }
    }

    fn rebuild_visible_cache(&mut self) {
        self.visible_rows = self
            .row_order
            .iter()
            .enumerate()
            .filter(|(_, &data_row)| self.visible_mask[data_row])
            .map(|(view_row, _)| view_row)
            .collect();

        self.display_map = vec![None; self.row_order.len()];
        for (display, &view_row) in self.visible_rows.iter().enumerate() {
            self.display_map[self.row_order[view_row]] = Some(display);
        }
    }

    // -------------------------------------------------------------------------
    // Mutators
    // -------------------------------------------------------------------------

    /// Apply a sort permutation mapping new_view_row -> data_row.
    pub fn apply_sort(&mut self, permutation: Vec<usize>) {
        debug_assert_eq!(permutation.len(), self.row_order.len());
        self.row_order = permutation;
        self.rebuild_inverse_map();
        self.rebuild_visible_cache();
    }

    /// Apply filter visibility (mask indexed by data row)
    pub fn apply_filter(&mut self, visible_mask: Vec<bool>) {
        debug_assert_eq!(visible_mask.len(), self.row_order.len());
        self.visible_mask = visible_mask;
        self.rebuild_visible_cache();
    }

    /// Clear all filters (all rows visible)
    pub fn clear_filter(&mut self) {
        self.visible_mask = vec![true; self.row_order.len()];
        self.rebuild_visible_cache();
    }
}

// =============================================================================
// FilterKey: Typed values for comparison
// =============================================================================

/// Typed key derived from a cell value, not its display formatting.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterKey {
    Number(OrderedFloat<f64>),
    Date(NaiveDate),
    /// Trimmed and lowercased
    Text(String),
    Bool(bool),
    Blank,
}

impl FilterKey {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Empty => FilterKey::Blank,
            Value::Number(n) => FilterKey::Number(OrderedFloat(*n)),
            Value::Bool(b) => FilterKey::Bool(*b),
            Value::Date(d) => FilterKey::Date(*d),
            Value::Text(s) if s.trim().is_empty() => FilterKey::Blank,
            Value::Text(s) => FilterKey::Text(s.trim().to_lowercase()),
            Value::Record(_) => FilterKey::Text(value.display().to_lowercase()),
        }
    }

    /// Type rank: Numbers(0) < Dates(1) < Text(2) < Bool(3) < Blank(4)
    fn type_rank(&self) -> u8 {
        match self {
            FilterKey::Number(_) => 0,
            FilterKey::Date(_) => 1,
            FilterKey::Text(_) => 2,
            FilterKey::Bool(_) => 3,
            FilterKey::Blank => 4,
        }
    }

    /// Order for sorting. Blanks stay last in both directions.
    fn sort_cmp(&self, other: &Self, descending: bool) -> Ordering {
        match self.type_rank().cmp(&other.type_rank()) {
            Ordering::Equal if descending => other.cmp(self),
            Ordering::Equal => self.cmp(other),
            rank if self.is_blank() || other.is_blank() => rank,
            rank if descending => rank.reverse(),
            rank => rank,
        }
    }

    fn is_blank(&self) -> bool {
        matches!(self, FilterKey::Blank)
    }
}

fn cell<'a>(row: &'a Row, binding: &str) -> &'a Value {
    const EMPTY: &Value = &Value::Empty;
    row.get(binding).unwrap_or(EMPTY)
}

// =============================================================================
// Search and column filters
// =============================================================================

/// Free-text search across every visible column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalSearch {
    pub text: String,
}

impl GlobalSearch {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn is_active(&self) -> bool {
        !self.text.trim().is_empty()
    }

    /// Case-insensitive substring match against formatted cell text.
    pub fn matches(&self, row: &Row, columns: &[FlatColumn]) -> bool {
        if !self.is_active() {
            return true;
        }
        let needle = self.text.trim().to_lowercase();
        columns.iter().filter(|c| c.visible).any(|c| {
            format_value(cell(row, &c.binding), c.format.as_deref())
                .to_lowercase()
                .contains(&needle)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
}

impl CompareOp {
    fn holds(self, lhs: f64, rhs: f64) -> bool {
        match self {
            CompareOp::Lt => lhs < rhs,
            CompareOp::Le => lhs <= rhs,
            CompareOp::Eq => lhs == rhs,
            CompareOp::Ge => lhs >= rhs,
            CompareOp::Gt => lhs > rhs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterCondition {
    /// Case-insensitive substring of the display text
    Contains(String),
    /// Display text equals one of these (trimmed, case-insensitive)
    OneOf(Vec<String>),
    /// Numeric comparison. Non-numeric values fail.
    Compare { op: CompareOp, value: f64 },
}

/// Per-column filter criteria
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnFilter {
    pub binding: String,
    pub condition: FilterCondition,
}

impl ColumnFilter {
    pub fn new(binding: impl Into<String>, condition: FilterCondition) -> Self {
        Self { binding: binding.into(), condition }
    }

    pub fn passes(&self, row: &Row) -> bool {
        let value = cell(row, &self.binding);
        match &self.condition {
            FilterCondition::Contains(needle) => value
                .display()
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            FilterCondition::OneOf(options) => {
                let text = value.display().trim().to_lowercase();
                options.iter().any(|o| o.trim().to_lowercase() == text)
            }
            FilterCondition::Compare { op, value: rhs } => match value {
                Value::Number(n) => op.holds(*n, *rhs),
                _ => false,
            },
        }
    }
}

// =============================================================================
// Sorting
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub binding: String,
    pub descending: bool,
}

impl SortKey {
    pub fn ascending(binding: impl Into<String>) -> Self {
        Self { binding: binding.into(), descending: false }
    }

    pub fn descending(binding: impl Into<String>) -> Self {
        Self { binding: binding.into(), descending: true }
    }
}

impl FromStr for SortKey {
    type Err = String;

    /// `binding`, `binding:asc` or `binding:desc`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (binding, direction) = match s.rsplit_once(':') {
            Some((b, d)) => (b.trim(), d.trim().to_ascii_lowercase()),
            None => (s.trim(), String::from("asc")),
        };
        if binding.is_empty() {
            return Err(format!("empty sort binding in '{}'", s));
        }
        match direction.as_str() {
            "asc" => Ok(SortKey::ascending(binding)),
            "desc" => Ok(SortKey::descending(binding)),
            other => Err(format!("unknown sort direction '{}'", other)),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = if self.descending { "desc" } else { "asc" };
        write!(f, "{}:{}", self.binding, direction)
    }
}

/// Stable multi-key sort over data rows. Returns new_view_row -> data_row.
pub fn sort_rows(view: &RecordView, keys: &[SortKey]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..view.len()).collect();
    if keys.is_empty() {
        return order;
    }

    // Precompute keys once per row
    let table: Vec<Vec<FilterKey>> = view
        .rows()
        .map(|row| keys.iter().map(|k| FilterKey::from_value(cell(row, &k.binding))).collect())
        .collect();

    order.sort_by(|&a, &b| {
        keys.iter()
            .enumerate()
            .map(|(i, k)| table[a][i].sort_cmp(&table[b][i], k.descending))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
    order
}

// =============================================================================
// FilterState
// =============================================================================

/// Search, filters and sort applied to the published rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    pub search: GlobalSearch,
    pub column_filters: Vec<ColumnFilter>,
    pub sort: Vec<SortKey>,
}

impl FilterState {
    pub fn is_active(&self) -> bool {
        self.search.is_active() || !self.column_filters.is_empty() || !self.sort.is_empty()
    }

    pub fn set_search(&mut self, text: impl Into<String>) {
        self.search = GlobalSearch::new(text);
    }

    /// Add a filter, replacing any existing one on the same binding.
    pub fn set_filter(&mut self, filter: ColumnFilter) {
        self.column_filters.retain(|f| f.binding != filter.binding);
        self.column_filters.push(filter);
    }

    pub fn remove_filter(&mut self, binding: &str) -> bool {
        let before = self.column_filters.len();
        self.column_filters.retain(|f| f.binding != binding);
        self.column_filters.len() != before
    }

    pub fn set_sort(&mut self, keys: Vec<SortKey>) {
        self.sort = keys;
    }

    /// Reset search, every column filter and the sort.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn passes(&self, row: &Row, columns: &[FlatColumn]) -> bool {
        self.search.matches(row, columns) && self.column_filters.iter().all(|f| f.passes(row))
    }

    pub fn apply(&self, view: &RecordView, columns: &[FlatColumn]) -> RowView {
        let mut row_view = RowView::new(view.len());
        if !self.sort.is_empty() {
            row_view.apply_sort(sort_rows(view, &self.sort));
        }
        if self.search.is_active() || !self.column_filters.is_empty() {
            let mask = view.rows().map(|row| self.passes(row, columns)).collect();
            row_view.apply_filter(mask);
        }
        row_view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::{compile, presets};
    use crate::loader::IncrementalLoader;
    use crate::source::VecSource;

    fn rows() -> Vec<Row> {
        vec![
            Row::new().with("product", "Apple").with("sales", 300.0).with("rating", "B"),
            Row::new().with("product", "banana").with("sales", 50.0).with("rating", "D"),
            Row::new().with("product", "Cherry").with("rating", "A"),
            Row::new().with("product", "apricot").with("sales", 300.0).with("rating", "C"),
        ]
    }

    fn view() -> std::sync::Arc<RecordView> {
        let mut loader = IncrementalLoader::new(VecSource::new(rows()), 10, 100);
        loader.initialize()
    }

    fn columns() -> Vec<FlatColumn> {
        compile(&presets::sales_layout()).unwrap().columns
    }

    #[test]
    fn test_row_view_identity() {
        let rv = RowView::new(3);
        assert_eq!(rv.visible_count(), 3);
        assert_eq!(rv.data_to_display(2), Some(2));
        assert!(!rv.is_sorted());
        assert!(!rv.is_filtered());
        assert_eq!(rv.display_to_data(5), None);
    }

    #[test]
    fn test_row_view_sort_then_filter() {
        let mut rv = RowView::new(4);
        rv.apply_sort(vec![3, 2, 1, 0]);
        rv.apply_filter(vec![true, false, true, true]);
        assert_eq!(rv.visible_data_rows().collect::<Vec<_>>(), vec![3, 2, 0]);
        assert_eq!(rv.data_to_display(0), Some(2));
        assert_eq!(rv.data_to_display(1), None);
        assert_eq!(rv.data_to_view(3), Some(0));
        assert_eq!(rv.display_to_data(1), Some(2));
    }

    #[test]
    fn test_global_search_case_insensitive() {
        let mut state = FilterState::default();
        state.set_search("AP");
        let rv = state.apply(&view(), &columns());
        assert_eq!(rv.visible_data_rows().collect::<Vec<_>>(), vec![0, 3]);
    }

    #[test]
    fn test_search_skips_hidden_columns() {
        let mut cols = columns();
        for c in cols.iter_mut().filter(|c| c.binding == "product") {
            c.visible = false;
        }
        let search = GlobalSearch::new("apple");
        assert!(!search.matches(&rows()[0], &cols));
    }

    #[test]
    fn test_column_filters() {
        let r = rows();
        let cmp = ColumnFilter::new("sales", FilterCondition::Compare { op: CompareOp::Ge, value: 100.0 });
        assert!(cmp.passes(&r[0]));
        assert!(!cmp.passes(&r[1]));
        assert!(!cmp.passes(&r[2]));

        let one_of = ColumnFilter::new("rating", FilterCondition::OneOf(vec!["a".into(), " B ".into()]));
        assert!(one_of.passes(&r[0]));
        assert!(one_of.passes(&r[2]));
        assert!(!one_of.passes(&r[3]));

        let contains = ColumnFilter::new("product", FilterCondition::Contains("ERR".into()));
        assert!(contains.passes(&r[2]));
    }

    #[test]
    fn test_set_filter_replaces_and_clear() {
        let mut state = FilterState::default();
        state.set_filter(ColumnFilter::new("rating", FilterCondition::Contains("a".into())));
        state.set_filter(ColumnFilter::new("rating", FilterCondition::Contains("b".into())));
        assert_eq!(state.column_filters.len(), 1);
        state.set_search("x");
        state.set_sort(vec![SortKey::ascending("sales")]);
        assert!(state.is_active());
        state.clear();
        assert!(!state.is_active());
        assert_eq!(state, FilterState::default());
    }

    #[test]
    fn test_multi_sort_stable_blanks_last() {
        let v = view();
        // sales desc, then product asc; row 2 has no sales
        let order = sort_rows(&v, &[SortKey::descending("sales"), SortKey::ascending("product")]);
        assert_eq!(order, vec![0, 3, 1, 2]);

        let asc = sort_rows(&v, &[SortKey::ascending("sales")]);
        // ties keep data order, blank last
        assert_eq!(asc, vec![1, 0, 3, 2]);
    }

    #[test]
    fn test_sort_key_parse() {
        assert_eq!("sales:desc".parse::<SortKey>().unwrap(), SortKey::descending("sales"));
        assert_eq!("perf.ytd".parse::<SortKey>().unwrap(), SortKey::ascending("perf.ytd"));
        assert!("sales:sideways".parse::<SortKey>().is_err());
        assert!(":desc".parse::<SortKey>().is_err());
        assert_eq!(SortKey::descending("x").to_string(), "x:desc");
    }
}
