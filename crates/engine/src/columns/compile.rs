use std::collections::HashSet;

use serde::Serialize;

use super::spec::{ColumnGroupSpec, ColumnKind, ColumnWidth, DataType, LayoutError};

/// A leaf column after flattening. Order is the pre-order leaf order of the
/// spec. `visible` is the only field that changes after compilation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatColumn {
    pub binding: String,
    pub header: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,
    /// Header row holding this leaf's own label.
    pub depth: usize,
    pub allow_sorting: bool,
    pub visible: bool,
}

impl FlatColumn {
    pub fn width_token(&self) -> Option<ColumnWidth> {
        self.width.as_deref().and_then(|w| w.parse().ok())
    }
}

/// Header labels indexed by (header row, leaf column). Unset cells are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HeaderGrid {
    rows: Vec<Vec<Option<String>>>,
}

impl HeaderGrid {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.rows.first().map(|r| r.len()).unwrap_or(0)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col)?.as_deref()
    }

    /// Row labels with unset cells as empty strings.
    pub fn row_labels(&self, row: usize) -> Vec<&str> {
        self.rows
            .get(row)
            .map(|r| r.iter().map(|c| c.as_deref().unwrap_or("")).collect())
            .unwrap_or_default()
    }

    pub(crate) fn set(&mut self, row: usize, col: usize, label: Option<String>) {
        self.ensure_rows(row + 1);
        let cells = &mut self.rows[row];
        if cells.len() <= col {
            cells.resize(col + 1, None);
        }
        cells[col] = label;
    }

    fn ensure_rows(&mut self, count: usize) {
        while self.rows.len() < count {
            self.rows.push(Vec::new());
        }
    }

    fn pad_columns(&mut self, width: usize) {
        for row in &mut self.rows {
            row.resize(width, None);
        }
    }
}

/// Result of compiling a column spec.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnLayout {
    pub columns: Vec<FlatColumn>,
    pub headers: HeaderGrid,
}

impl ColumnLayout {
    pub fn column_index(&self, binding: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.binding == binding)
    }

    pub fn column(&self, binding: &str) -> Option<&FlatColumn> {
        self.columns.iter().find(|c| c.binding == binding)
    }

    /// Set one column's visibility. Returns false if no column has `binding`.
    pub fn set_visible(&mut self, binding: &str, visible: bool) -> bool {
        match self.columns.iter_mut().find(|c| c.binding == binding) {
            Some(col) => {
                col.visible = visible;
                true
            }
            None => false,
        }
    }

    pub fn visible_columns(&self) -> impl Iterator<Item = (usize, &FlatColumn)> {
        self.columns.iter().enumerate().filter(|(_, c)| c.visible)
    }
}

/// Flatten a nested spec into leaf columns and a header grid.
///
/// Pre-order depth-first: a leaf appends a column and writes its label at
/// its own depth; a group first compiles its children, then writes its label
/// at its depth across every column its subtree appended. Header rows are
/// created the first time a depth is reached.
pub fn compile(specs: &[ColumnGroupSpec]) -> Result<ColumnLayout, LayoutError> {
    let mut layout = ColumnLayout::default();
    let mut seen = HashSet::new();
    compile_level(&mut layout, &mut seen, specs, 0, None)?;
    let width = layout.columns.len();
    layout.headers.pad_columns(width);
    log::debug!(
        "compiled column layout: {} column(s), {} header row(s)",
        width,
        layout.headers.row_count()
    );
    Ok(layout)
}

fn compile_level(
    layout: &mut ColumnLayout,
    seen: &mut HashSet<String>,
    specs: &[ColumnGroupSpec],
    level: usize,
    inherited_role: Option<&str>,
) -> Result<(), LayoutError> {
    if !specs.is_empty() {
        layout.headers.ensure_rows(level + 1);
    }

    for spec in specs {
        let role = spec.meta.role.as_deref().or(inherited_role);
        match &spec.kind {
            ColumnKind::Leaf { binding } => {
                if !seen.insert(binding.clone()) {
                    return Err(LayoutError::DuplicateBinding { binding: binding.clone() });
                }
                layout.columns.push(FlatColumn {
                    binding: binding.clone(),
                    header: spec.header.clone(),
                    role: role.map(str::to_string),
                    format: spec.meta.format.clone(),
                    width: spec.meta.width.map(|w| w.to_string()),
                    data_type: spec.meta.data_type,
                    depth: level,
                    allow_sorting: true,
                    visible: true,
                });
                let col = layout.columns.len() - 1;
                layout.headers.set(level, col, Some(spec.header.clone()));
            }
            ColumnKind::Group { children } => {
                if children.is_empty() {
                    return Err(LayoutError::EmptyGroup { header: spec.header.clone() });
                }
                let start = layout.columns.len();
                compile_level(layout, seen, children, level + 1, role)?;
                for col in start..layout.columns.len() {
                    layout.headers.set(level, col, Some(spec.header.clone()));
                }
            }
        }
    }
    Ok(())
}
