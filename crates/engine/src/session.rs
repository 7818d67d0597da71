//! The grid session: one place that owns loading, validation, error
//! surfacing, column layout and filtering for a single grid.
//!
//! Cell coordinates passed to `error_at`, `style_for`, `tooltip_for`,
//! `hover`, `cell_text` and `jump_to` are data coordinates: row indices
//! into the published [`RecordView`] and column indices into the compiled
//! layout. Use [`GridSession::visible_rows`] to go from screen rows to data
//! rows.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use pagegrid_config::{Color, Messages, Settings};
use pagegrid_core::CellError;

use crate::columns::{
    compile, format_value, header_tint, merge, presets, ColumnGroupSpec, ColumnLayout, ColumnPicker,
    LayoutError, MergedHeader, NodePath,
};
use crate::error_index::{CellStyle, ErrorIndex, HitTarget, TooltipAction, TooltipTracker};
use crate::error_panel::{ErrorCursor, ErrorPanel, PanelLine};
use crate::events::{
    ColumnsCompiledEvent, ErrorsReplacedEvent, EventCallback, GridEvent, RowsPublishedEvent,
    VisibilityChangedEvent,
};
use crate::filter::{ColumnFilter, FilterState, RowView, SortKey};
use crate::loader::{IncrementalLoader, PageRequest, RecordView, ViewportState};
use crate::navigator::Navigator;
use crate::notify::{NoticeAction, NoticeActionId, NoticeKind, NoticeOptions, Notifier};
use crate::schedule::{GridControl, Scheduler};
use crate::source::{RecordSource, SampleSales};
use crate::validation::{RuleColumns, RuleMessages, Validator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    Rejected { errors: usize },
}

pub struct GridSession<S: RecordSource> {
    loader: IncrementalLoader<S>,
    validator: Validator,
    messages: Messages,
    palette: BTreeMap<String, Color>,
    highlight: Color,
    preview_limit: usize,
    error_duration: Duration,
    success_duration: Duration,

    errors: Arc<ErrorIndex>,
    error_generation: u64,
    cursor: ErrorCursor,
    panel: ErrorPanel,
    tooltip: TooltipTracker,

    layout: ColumnLayout,
    header: MergedHeader,
    picker: ColumnPicker,

    filter: FilterState,
    row_view: RowView,

    scheduler: Scheduler,
    navigator: Navigator,
    listeners: Vec<EventCallback>,
}

impl GridSession<SampleSales> {
    /// The sales grid over generated data.
    pub fn sales(settings: &Settings, seed: u64) -> Result<Self, LayoutError> {
        Self::new(SampleSales::new(settings.max_records, seed), settings, &presets::sales_layout())
    }
}

impl<S: RecordSource> GridSession<S> {
    pub fn new(source: S, settings: &Settings, specs: &[ColumnGroupSpec]) -> Result<Self, LayoutError> {
        let layout = compile(specs)?;
        let header = merge(&layout.headers, &layout.columns);
        let messages = settings.messages();
        let loader = IncrementalLoader::new(source, settings.page_size, settings.max_records)
            .with_group_by(settings.group_by.clone());

        Ok(Self {
            loader,
            validator: Validator::new(RuleColumns::default(), RuleMessages::from(&messages)),
            messages,
            palette: settings.role_palette(),
            highlight: settings.highlight_color(),
            preview_limit: settings.error_preview_limit,
            error_duration: Duration::from_millis(settings.error_duration_ms),
            success_duration: Duration::from_millis(settings.success_duration_ms),
            errors: Arc::new(ErrorIndex::default()),
            error_generation: 0,
            cursor: ErrorCursor::new(),
            panel: ErrorPanel::new(),
            tooltip: TooltipTracker::new(),
            picker: ColumnPicker::new(specs),
            layout,
            header,
            filter: FilterState::default(),
            row_view: RowView::default(),
            scheduler: Scheduler::new(),
            navigator: Navigator::new(),
            listeners: Vec::new(),
        })
    }

    /// Replace the validator, e.g. to bind rules to other column positions.
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    pub fn subscribe(&mut self, callback: EventCallback) {
        self.listeners.push(callback);
    }

    fn emit(&mut self, event: GridEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
    }

    pub fn messages(&self) -> &Messages {
        &self.messages
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Start (or restart) the session with the first page. Errors from a
    /// previous session are discarded.
    pub fn load_initial(&mut self) -> Arc<RecordView> {
        let view = self.loader.initialize();
        self.replace_errors(Vec::new());
        self.panel.close();
        self.refresh_rows();
        view
    }

    /// Scroll handler; see [`IncrementalLoader::on_viewport_advance`].
    pub fn on_scroll(&mut self, viewport: ViewportState) -> Option<Arc<RecordView>> {
        let view = self.loader.on_viewport_advance(viewport)?;
        self.refresh_rows();
        Some(view)
    }

    /// First half of an asynchronous scroll fetch.
    pub fn request_next(&mut self, viewport: ViewportState) -> Option<PageRequest> {
        self.loader.request_next(viewport)
    }

    /// Second half of an asynchronous scroll fetch.
    pub fn apply_page(&mut self, request: PageRequest, rows: Vec<pagegrid_core::Row>) -> Option<Arc<RecordView>> {
        let view = self.loader.apply_page(request, rows)?;
        self.refresh_rows();
        Some(view)
    }

    /// Hand back a request whose fetch failed so a later scroll retries it.
    pub fn abandon_page(&mut self, request: PageRequest) -> bool {
        self.loader.abandon(request)
    }

    pub fn view(&self) -> Option<Arc<RecordView>> {
        self.loader.view()
    }

    pub fn loader(&self) -> &IncrementalLoader<S> {
        &self.loader
    }

    fn row_count(&self) -> usize {
        self.loader.view().map_or(0, |v| v.len())
    }

    fn refresh_rows(&mut self) {
        let Some(view) = self.loader.view() else {
            return;
        };
        self.row_view = self.filter.apply(&view, &self.layout.columns);
        let event = RowsPublishedEvent {
            generation: view.generation(),
            len: view.len(),
            visible: self.row_view.visible_count(),
        };
        self.emit(GridEvent::RowsPublished(event));
    }

    // ========================================================================
    // Validation and errors
    // ========================================================================

    /// Validate every materialized row and swap in a fresh error index.
    pub fn validate(&mut self) -> Vec<CellError> {
        let errors = match self.loader.view() {
            Some(view) => self.validator.validate(view.rows()),
            None => Vec::new(),
        };
        self.replace_errors(errors.clone());
        errors
    }

    fn replace_errors(&mut self, errors: Vec<CellError>) {
        self.error_generation += 1;
        let index = ErrorIndex::rebuild(
            self.error_generation,
            errors,
            self.row_count(),
            self.layout.columns.len(),
        );
        let count = index.len();
        self.errors = Arc::new(index);
        self.tooltip.leave();
        let event = ErrorsReplacedEvent { generation: self.error_generation, count };
        self.emit(GridEvent::ErrorsReplaced(event));
    }

    /// Validate and report the result as a notice. Rejected saves offer a
    /// "see details" action that opens the error panel.
    pub fn save(&mut self, notifier: &mut dyn Notifier) -> SaveOutcome {
        let errors = self.validate();
        if errors.is_empty() {
            self.panel.close();
            notifier.notify(
                NoticeKind::Success,
                &self.messages.save_succeeded_title,
                NoticeOptions {
                    description: Some(self.messages.save_succeeded_description.clone()),
                    action: None,
                    duration: Some(self.success_duration),
                },
            );
            log::info!("save accepted");
            return SaveOutcome::Saved;
        }

        let preview = ErrorPanel::preview(&self.errors, &self.messages, self.preview_limit);
        let description = format!("{}\n{}", self.messages.save_failed_description, preview.to_text());
        notifier.notify(
            NoticeKind::Error,
            &self.messages.save_failed(errors.len()),
            NoticeOptions {
                description: Some(description),
                action: Some(NoticeAction {
                    label: self.messages.see_details.clone(),
                    id: NoticeActionId::ShowErrorPanel,
                }),
                duration: Some(self.error_duration),
            },
        );
        log::warn!("save rejected: {} error(s)", errors.len());
        SaveOutcome::Rejected { errors: errors.len() }
    }

    pub fn handle_action(&mut self, action: NoticeActionId) {
        match action {
            NoticeActionId::ShowErrorPanel => self.panel.open(),
        }
    }

    /// The current error index. Cheap to clone and safe to hold across
    /// later validation passes.
    pub fn errors(&self) -> Arc<ErrorIndex> {
        Arc::clone(&self.errors)
    }

    pub fn error_at(&self, row: usize, col: usize) -> Option<&CellError> {
        self.errors.index_of(row, col)
    }

    pub fn style_for(&self, row: usize, col: usize) -> CellStyle {
        self.errors.style_for(row, col)
    }

    pub fn tooltip_for(&self, row: usize, col: usize) -> Option<String> {
        self.errors.tooltip_for(row, col)
    }

    pub fn highlight_color(&self) -> Color {
        self.highlight
    }

    pub fn hover(&mut self, hit: HitTarget) -> TooltipAction {
        self.tooltip.hover(hit, &self.errors)
    }

    pub fn leave(&mut self) -> TooltipAction {
        self.tooltip.leave()
    }

    pub fn error_panel(&self) -> &ErrorPanel {
        &self.panel
    }

    pub fn close_error_panel(&mut self) {
        self.panel.close();
    }

    pub fn error_panel_lines(&self) -> Vec<PanelLine> {
        ErrorPanel::lines(&self.errors, &self.messages)
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Queue a jump to a data cell. Returns false when the row is filtered
    /// out or the column is hidden; nothing is queued then.
    pub fn jump_to(&mut self, row: usize, col: usize) -> bool {
        let Some(display_row) = self.row_view.data_to_display(row) else {
            log::debug!("jump to row {row} skipped: not displayed");
            return false;
        };
        let Some(display_col) = self.display_column(col) else {
            log::debug!("jump to column {col} skipped: not displayed");
            return false;
        };
        self.navigator.jump_to(display_row, display_col, &mut self.scheduler);
        true
    }

    /// Jump to the next error, wrapping around.
    pub fn next_error(&mut self) -> Option<CellError> {
        let index = Arc::clone(&self.errors);
        let error = self.cursor.next(&index)?.clone();
        self.jump_to(error.row, error.col);
        Some(error)
    }

    /// Run deferred work against the rendered grid.
    pub fn tick(&mut self, control: &mut dyn GridControl) -> usize {
        self.scheduler.tick(control)
    }

    /// Position of a layout column among the visible ones.
    pub fn display_column(&self, col: usize) -> Option<usize> {
        self.layout.visible_columns().position(|(i, _)| i == col)
    }

    // ========================================================================
    // Columns
    // ========================================================================

    /// Replace the column layout. Errors outside the new bounds are dropped
    /// and the index is republished under a new generation, so the
    /// next-error cursor restarts. The picker is rebuilt with every column
    /// visible.
    pub fn compile_columns(&mut self, specs: &[ColumnGroupSpec]) -> Result<&ColumnLayout, LayoutError> {
        let layout = compile(specs)?;
        self.header = merge(&layout.headers, &layout.columns);
        self.picker = ColumnPicker::new(specs);
        self.layout = layout;

        let errors = self.errors.errors().to_vec();
        self.replace_errors(errors);

        let event = ColumnsCompiledEvent {
            columns: self.layout.columns.len(),
            header_rows: self.layout.headers.row_count(),
        };
        self.emit(GridEvent::ColumnsCompiled(event));
        self.refresh_rows();
        Ok(&self.layout)
    }

    pub fn layout(&self) -> &ColumnLayout {
        &self.layout
    }

    pub fn header(&self) -> &MergedHeader {
        &self.header
    }

    pub fn picker(&self) -> &ColumnPicker {
        &self.picker
    }

    pub fn toggle_picker(&mut self) -> bool {
        self.picker.toggle_open()
    }

    pub fn find_column_node(&self, label: &str) -> Option<NodePath> {
        self.picker.find(label)
    }

    /// Show or hide a picker node and every column beneath it.
    pub fn toggle_column_visibility(&mut self, path: &NodePath, visible: bool) -> bool {
        let Some(node) = self.picker.node(path) else {
            return false;
        };
        let bindings: Vec<String> = node.leaf_bindings().into_iter().map(String::from).collect();
        if !self.picker.toggle(path, visible, &mut self.layout.columns) {
            return false;
        }
        self.emit(GridEvent::VisibilityChanged(VisibilityChangedEvent { bindings, visible }));
        if self.filter.search.is_active() {
            self.refresh_rows();
        }
        true
    }

    pub fn header_tint(&self, col: usize) -> Option<Color> {
        self.layout.columns.get(col).and_then(|c| header_tint(c, &self.palette))
    }

    /// Display text for a data cell, using the column's format string.
    pub fn cell_text(&self, row: usize, col: usize) -> Option<String> {
        let view = self.loader.view()?;
        let column = self.layout.columns.get(col)?;
        let value = view.row(row)?.get(&column.binding).cloned().unwrap_or_default();
        Some(format_value(&value, column.format.as_deref()))
    }

    // ========================================================================
    // Filtering
    // ========================================================================

    pub fn visible_rows(&self) -> &RowView {
        &self.row_view
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn set_search(&mut self, text: &str) {
        self.filter.set_search(text);
        self.refresh_rows();
    }

    pub fn set_column_filter(&mut self, filter: ColumnFilter) {
        self.filter.set_filter(filter);
        self.refresh_rows();
    }

    pub fn remove_column_filter(&mut self, binding: &str) {
        if self.filter.remove_filter(binding) {
            self.refresh_rows();
        }
    }

    pub fn set_sort(&mut self, keys: Vec<SortKey>) {
        self.filter.set_sort(keys);
        self.refresh_rows();
    }

    /// The "reset filters" button.
    pub fn clear_filters(&mut self) {
        self.filter.clear();
        self.refresh_rows();
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    /// Cancel pending jumps, hide the tooltip and close popups. Listeners
    /// are dropped.
    pub fn teardown(&mut self) -> TooltipAction {
        self.navigator.cancel_pending();
        self.picker.close();
        self.panel.close();
        self.listeners.clear();
        self.tooltip.leave()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NoticeLog;
    use crate::schedule::RecordingControl;
    use crate::source::VecSource;
    use pagegrid_config::Locale;
    use pagegrid_core::Row;

    fn settings() -> Settings {
        Settings { locale: Locale::En, ..Settings::default() }
    }

    fn sales_rows() -> Vec<Row> {
        vec![
            Row::new().with("product", "商品1").with("sales", 500.0).with("rating", "A"),
            Row::new().with("product", "").with("sales", 50.0).with("rating", "D"),
            Row::new().with("product", "商品3").with("sales", 800.0).with("rating", "B"),
        ]
    }

    fn session(rows: Vec<Row>) -> GridSession<VecSource> {
        GridSession::new(VecSource::new(rows), &settings(), &presets::sales_layout()).unwrap()
    }

    #[test]
    fn test_validate_swaps_index() {
        let mut s = session(sales_rows());
        s.load_initial();
        let before = s.errors();
        let errors = s.validate();
        assert_eq!(errors.len(), 3);
        assert!(!Arc::ptr_eq(&before, &s.errors()));
        assert!(before.is_empty());
        assert_eq!(s.error_at(1, 0).unwrap().message, "product name missing");
        assert!(s.style_for(1, 4).highlighted);
        assert_eq!(s.tooltip_for(1, 6).as_deref(), Some("rating too low"));
    }

    #[test]
    fn test_save_rejected_then_panel() {
        let mut s = session(sales_rows());
        s.load_initial();
        let mut log = NoticeLog::new();
        assert_eq!(s.save(&mut log), SaveOutcome::Rejected { errors: 3 });

        let notice = log.last().unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(notice.message, "Save failed: 3 input error(s)");
        assert_eq!(notice.options.duration, Some(Duration::from_millis(8000)));
        let action = notice.options.action.clone().unwrap();
        assert_eq!(action.label, "See details");
        assert!(notice.options.description.as_deref().unwrap().contains("Row 2, Col 1"));

        s.handle_action(action.id);
        assert!(s.error_panel().is_open());
        assert_eq!(s.error_panel_lines().len(), 3);
    }

    #[test]
    fn test_save_success_closes_panel() {
        let mut rows = sales_rows();
        rows.remove(1);
        let mut s = session(rows);
        s.load_initial();
        s.handle_action(NoticeActionId::ShowErrorPanel);
        let mut log = NoticeLog::new();
        assert_eq!(s.save(&mut log), SaveOutcome::Saved);
        assert_eq!(log.last().unwrap().kind, NoticeKind::Success);
        assert_eq!(log.last().unwrap().options.duration, Some(Duration::from_millis(3000)));
        assert!(!s.error_panel().is_open());
    }

    #[test]
    fn test_jump_through_filter_and_hidden_column() {
        let mut s = session(sales_rows());
        s.load_initial();
        s.set_search("商品3");
        assert_eq!(s.visible_rows().visible_count(), 1);
        assert!(!s.jump_to(0, 0));
        assert!(s.jump_to(2, 0));

        let mut grid = RecordingControl::new(1, 7);
        s.tick(&mut grid);
        assert_eq!(grid.scrolled, vec![(0, 0)]);

        let path = s.find_column_node("商品").unwrap();
        assert!(s.toggle_column_visibility(&path, false));
        assert!(!s.jump_to(2, 0));
        assert_eq!(s.display_column(4), Some(3));
    }

    #[test]
    fn test_next_error_cycles_and_jumps() {
        let mut s = session(sales_rows());
        s.load_initial();
        s.validate();
        let cols: Vec<usize> = (0..4).filter_map(|_| s.next_error()).map(|e| e.col).collect();
        assert_eq!(cols, vec![0, 4, 6, 0]);
        let mut grid = RecordingControl::new(3, 7);
        assert_eq!(s.tick(&mut grid), 4);
        assert_eq!(grid.selected.len(), 4);
    }

    #[test]
    fn test_load_initial_clears_errors() {
        let mut s = session(sales_rows());
        s.load_initial();
        s.validate();
        assert!(!s.errors().is_empty());
        s.load_initial();
        assert!(s.errors().is_empty());
    }

    #[test]
    fn test_compile_columns_drops_out_of_range_errors() {
        let mut s = session(sales_rows());
        s.load_initial();
        s.validate();
        let narrow = vec![ColumnGroupSpec::leaf("商品", "product")];
        let layout = s.compile_columns(&narrow).unwrap();
        assert_eq!(layout.columns.len(), 1);
        assert_eq!(s.errors().len(), 1);
        assert!(s.error_at(1, 4).is_none());
    }

    #[test]
    fn test_compile_columns_restarts_error_cursor() {
        let mut s = session(sales_rows());
        s.load_initial();
        s.validate();
        let before = s.errors().generation();
        assert_eq!(s.next_error().map(|e| e.col), Some(0));

        let narrow = vec![
            ColumnGroupSpec::leaf("商品", "product"),
            ColumnGroupSpec::leaf("a", "category1"),
            ColumnGroupSpec::leaf("b", "category2"),
            ColumnGroupSpec::leaf("c", "category3"),
            ColumnGroupSpec::leaf("売上", "sales"),
        ];
        s.compile_columns(&narrow).unwrap();
        assert!(s.errors().generation() > before);
        assert_eq!(s.errors().len(), 2);
        // Cursor starts over on the shrunk list instead of skipping ahead
        assert_eq!(s.next_error().map(|e| e.col), Some(0));
        assert_eq!(s.next_error().map(|e| e.col), Some(4));
        assert_eq!(s.next_error().map(|e| e.col), Some(0));
    }

    #[test]
    fn test_teardown_cancels_jumps() {
        let mut s = session(sales_rows());
        s.load_initial();
        s.validate();
        s.hover(HitTarget::Cell { row: 1, col: 0 });
        s.jump_to(1, 0);
        assert_eq!(s.teardown(), TooltipAction::Hide);
        let mut grid = RecordingControl::new(3, 7);
        assert_eq!(s.tick(&mut grid), 0);
    }

    #[test]
    fn test_cell_text_and_tint() {
        let mut s = session(sales_rows());
        s.load_initial();
        assert_eq!(s.cell_text(0, 0).as_deref(), Some("商品1"));
        assert!(s.cell_text(9, 0).is_none());
        assert!(s.header_tint(4).is_some());
        assert!(s.header_tint(0).is_none());
    }
}
