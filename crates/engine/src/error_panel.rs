//! Error list surfaces: the "next error" cursor and the details panel.

use pagegrid_config::Messages;
use pagegrid_core::CellError;

use crate::error_index::ErrorIndex;

/// Cycles through the current error list. Restarts from the first error
/// whenever a new index replaces the one it was walking.
#[derive(Debug, Clone, Default)]
pub struct ErrorCursor {
    generation: Option<u64>,
    position: usize,
}

impl ErrorCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next<'a>(&mut self, index: &'a ErrorIndex) -> Option<&'a CellError> {
        if index.is_empty() {
            return None;
        }
        if self.generation != Some(index.generation()) {
            self.generation = Some(index.generation());
            self.position = 0;
        }
        let error = &index.errors()[self.position % index.len()];
        self.position = (self.position + 1) % index.len();
        Some(error)
    }

    pub fn reset(&mut self) {
        self.generation = None;
        self.position = 0;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelLine {
    pub row: usize,
    pub col: usize,
    pub text: String,
}

/// Shortened listing for a notice body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPreview {
    pub lines: Vec<String>,
    pub more: Option<String>,
}

impl ErrorPreview {
    pub fn to_text(&self) -> String {
        let mut out = self.lines.join("\n");
        if let Some(more) = &self.more {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(more);
        }
        out
    }
}

#[derive(Debug, Clone, Default)]
pub struct ErrorPanel {
    open: bool,
}

impl ErrorPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// One localized line per error, row-major as validated.
    pub fn lines(index: &ErrorIndex, messages: &Messages) -> Vec<PanelLine> {
        index
            .errors()
            .iter()
            .map(|e| PanelLine {
                row: e.row,
                col: e.col,
                text: messages.error_line(e.row, e.col, &e.message),
            })
            .collect()
    }

    pub fn preview(index: &ErrorIndex, messages: &Messages, limit: usize) -> ErrorPreview {
        let lines = index
            .errors()
            .iter()
            .take(limit)
            .map(|e| messages.error_line(e.row, e.col, &e.message))
            .collect();
        let rest = index.len().saturating_sub(limit);
        ErrorPreview {
            lines,
            more: (rest > 0).then(|| messages.more_errors(rest)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagegrid_config::Locale;

    fn index(generation: u64, count: usize) -> ErrorIndex {
        let errors = (0..count).map(|r| CellError::new(r, 0, "product name missing")).collect();
        ErrorIndex::rebuild(generation, errors, 100, 7)
    }

    #[test]
    fn test_cursor_wraps() {
        let idx = index(1, 2);
        let mut cursor = ErrorCursor::new();
        assert_eq!(cursor.next(&idx).unwrap().row, 0);
        assert_eq!(cursor.next(&idx).unwrap().row, 1);
        assert_eq!(cursor.next(&idx).unwrap().row, 0);
    }

    #[test]
    fn test_cursor_restarts_on_new_index() {
        let mut cursor = ErrorCursor::new();
        let first = index(1, 3);
        cursor.next(&first);
        cursor.next(&first);
        let second = index(2, 3);
        assert_eq!(cursor.next(&second).unwrap().row, 0);
        assert!(cursor.next(&index(3, 0)).is_none());
    }

    #[test]
    fn test_preview_with_more() {
        let messages = Messages::for_locale(Locale::En);
        let preview = ErrorPanel::preview(&index(1, 5), &messages, 3);
        assert_eq!(preview.lines.len(), 3);
        assert_eq!(preview.lines[0], "Row 1, Col 1: product name missing");
        assert_eq!(preview.more.as_deref(), Some("2 more error(s)"));
        assert_eq!(preview.to_text().lines().count(), 4);

        let short = ErrorPanel::preview(&index(1, 2), &messages, 3);
        assert!(short.more.is_none());
    }

    #[test]
    fn test_panel_lines_and_state() {
        let messages = Messages::for_locale(Locale::Ja);
        let lines = ErrorPanel::lines(&index(1, 2), &messages);
        assert_eq!(lines[1].text, "行2・列1: product name missing");

        let mut panel = ErrorPanel::new();
        assert!(!panel.is_open());
        panel.open();
        assert!(panel.is_open());
        panel.close();
        assert!(!panel.is_open());
    }
}
