use serde::{Deserialize, Serialize};

/// A validation finding attached to one cell.
///
/// `row` indexes the materialized row set, `col` the flat column list.
/// Produced fresh on every validation pass and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellError {
    pub row: usize,
    pub col: usize,
    pub message: String,
}

impl CellError {
    pub fn new(row: usize, col: usize, message: impl Into<String>) -> Self {
        Self { row, col, message: message.into() }
    }
}

/// Inclusive rectangular cell range, always normalized so that
/// `row <= row2` and `col <= col2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRange {
    pub row: usize,
    pub col: usize,
    pub row2: usize,
    pub col2: usize,
}

impl CellRange {
    pub fn new(row: usize, col: usize, row2: usize, col2: usize) -> Self {
        Self {
            row: row.min(row2),
            col: col.min(col2),
            row2: row.max(row2),
            col2: col.max(col2),
        }
    }

    pub fn single(row: usize, col: usize) -> Self {
        Self { row, col, row2: row, col2: col }
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        row >= self.row && row <= self.row2 && col >= self.col && col <= self.col2
    }

    pub fn row_span(&self) -> usize {
        self.row2 - self.row + 1
    }

    pub fn column_span(&self) -> usize {
        self.col2 - self.col + 1
    }

    pub fn is_single(&self) -> bool {
        self.row == self.row2 && self.col == self.col2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_normalizes() {
        let r = CellRange::new(3, 4, 1, 2);
        assert_eq!((r.row, r.col, r.row2, r.col2), (1, 2, 3, 4));
        assert_eq!(r.row_span(), 3);
        assert_eq!(r.column_span(), 3);
    }

    #[test]
    fn test_range_contains() {
        let r = CellRange::new(0, 1, 2, 1);
        assert!(r.contains(0, 1));
        assert!(r.contains(2, 1));
        assert!(!r.contains(1, 0));
        assert!(!r.contains(3, 1));
        assert!(CellRange::single(5, 5).is_single());
    }
}
