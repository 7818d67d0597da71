use pagegrid_core::CellRange;
use serde::Serialize;

use super::compile::{FlatColumn, HeaderGrid};

/// A rectangle of header cells rendered as one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergedRegion {
    /// Header-grid coordinates (row = header row, col = leaf column).
    pub range: CellRange,
    pub label: String,
}

/// Header grid after the merge pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedHeader {
    pub grid: HeaderGrid,
    /// Maximal regions covering every labelled cell, row-major by top-left corner.
    pub regions: Vec<MergedRegion>,
    /// The corner above the row-header area merges into a single cell.
    pub top_left_mergeable: bool,
}

impl MergedHeader {
    /// Region covering a header cell.
    pub fn region_at(&self, row: usize, col: usize) -> Option<&MergedRegion> {
        self.regions.iter().find(|r| r.range.contains(row, col))
    }

    /// Data range selected by clicking a header cell: every data row under
    /// the full column span of the clicked (possibly merged) cell.
    pub fn header_selection(&self, row: usize, col: usize, data_rows: usize) -> Option<CellRange> {
        if data_rows == 0 {
            return None;
        }
        let range = self
            .region_at(row, col)
            .map(|r| r.range)
            .unwrap_or_else(|| CellRange::single(row, col));
        Some(CellRange::new(0, range.col, data_rows - 1, range.col2))
    }
}

/// Merge pass. Runs once after [`compile`](super::compile) and before rendering.
///
/// Below a leaf's own label row, a cell that is unset or holds the leaf's
/// binding is not a real group label, so it takes the label above it. Leaf
/// columns that sit shallower than the deepest group thus read the same
/// label all the way down and merge vertically, while group labels and the
/// leaf's own label stay put.
pub fn merge(headers: &HeaderGrid, columns: &[FlatColumn]) -> MergedHeader {
    let mut grid = headers.clone();
    for (c, column) in columns.iter().enumerate().take(grid.column_count()) {
        for r in column.depth + 1..grid.row_count() {
            let filler = match grid.get(r, c) {
                None => true,
                Some(label) => label == column.binding,
            };
            if filler {
                let above = grid.get(r - 1, c).map(str::to_string);
                grid.set(r, c, above);
            }
        }
    }

    let regions = find_regions(&grid);
    MergedHeader {
        grid,
        regions,
        top_left_mergeable: true,
    }
}

/// Greedy maximal rectangles of equal labels. A horizontal run never
/// crosses a region boundary in the row above, so two sibling groups that
/// happen to share a label under different parents stay separate.
fn find_regions(grid: &HeaderGrid) -> Vec<MergedRegion> {
    let rows = grid.row_count();
    let cols = grid.column_count();
    let mut owner: Vec<Vec<Option<usize>>> = vec![vec![None; cols]; rows];
    let mut regions = Vec::new();

    for r in 0..rows {
        for c in 0..cols {
            if owner[r][c].is_some() {
                continue;
            }
            let Some(label) = grid.get(r, c) else {
                continue;
            };

            let same_parent = |a: usize, b: usize| r == 0 || owner[r - 1][a] == owner[r - 1][b];
            let mut c2 = c;
            while c2 + 1 < cols
                && owner[r][c2 + 1].is_none()
                && grid.get(r, c2 + 1) == Some(label)
                && same_parent(c2, c2 + 1)
            {
                c2 += 1;
            }

            let mut r2 = r;
            while r2 + 1 < rows
                && (c..=c2).all(|cc| owner[r2 + 1][cc].is_none() && grid.get(r2 + 1, cc) == Some(label))
            {
                r2 += 1;
            }

            let id = regions.len();
            for row in owner.iter_mut().take(r2 + 1).skip(r) {
                for cell in row.iter_mut().take(c2 + 1).skip(c) {
                    *cell = Some(id);
                }
            }
            regions.push(MergedRegion {
                range: CellRange::new(r, c, r2, c2),
                label: label.to_string(),
            });
        }
    }
    regions
}
