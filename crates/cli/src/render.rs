//! Plain-text rendering for terminal output.

use pagegrid_engine::columns::{ColumnNode, FlatColumn, MergedHeader, PATH_SEPARATOR};

fn width(s: &str) -> usize {
    s.chars().count()
}

fn pad(s: &str, w: usize) -> String {
    let mut out = s.to_string();
    out.extend(std::iter::repeat(' ').take(w.saturating_sub(width(s))));
    out
}

/// Header rows with each merged region's label printed once, at its
/// top-left cell, followed by a row of bindings.
pub fn header_table(header: &MergedHeader, columns: &[FlatColumn]) -> String {
    let rows = header.grid.row_count();
    let mut cells: Vec<Vec<String>> = (0..rows)
        .map(|r| {
            (0..columns.len())
                .map(|c| match header.region_at(r, c) {
                    Some(region) if region.range.row == r && region.range.col == c => region.label.clone(),
                    Some(_) => String::new(),
                    None => header.grid.get(r, c).unwrap_or("").to_string(),
                })
                .collect()
        })
        .collect();
    cells.push(columns.iter().map(|c| c.binding.clone()).collect());

    let widths: Vec<usize> = (0..columns.len())
        .map(|c| cells.iter().map(|row| width(&row[c])).max().unwrap_or(0))
        .collect();

    let mut out = String::new();
    for (i, row) in cells.iter().enumerate() {
        if i == rows {
            let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
            out.push_str(&rule.join("-+-"));
            out.push('\n');
        }
        let mut line = String::new();
        for (c, (s, w)) in row.iter().zip(&widths).enumerate() {
            if c > 0 {
                line.push_str(if i < rows && same_region(header, i, c - 1, c) { "   " } else { " | " });
            }
            line.push_str(&pad(s, *w));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

fn same_region(header: &MergedHeader, row: usize, a: usize, b: usize) -> bool {
    match (header.region_at(row, a), header.region_at(row, b)) {
        (Some(x), Some(y)) => x.range == y.range,
        _ => false,
    }
}

/// Picker tree, one node per line, `[x]` for checked.
pub fn picker_tree(nodes: &[ColumnNode]) -> String {
    let mut out = String::new();
    write_nodes(nodes, 0, &mut out);
    out
}

fn write_nodes(nodes: &[ColumnNode], depth: usize, out: &mut String) {
    for node in nodes {
        let mark = if node.checked { "x" } else { " " };
        let name = node.label.rsplit(PATH_SEPARATOR).next().unwrap_or(&node.label);
        out.push_str(&"  ".repeat(depth));
        out.push_str(&format!("[{}] {}", mark, name));
        if let Some(binding) = &node.binding {
            out.push_str(&format!(" ({})", binding));
        }
        out.push('\n');
        write_nodes(&node.children, depth + 1, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagegrid_engine::columns::{build_tree, compile, merge, ColumnGroupSpec};

    #[test]
    fn test_header_table_prints_span_once() {
        let specs = vec![ColumnGroupSpec::group(
            "A",
            vec![ColumnGroupSpec::leaf("A1", "a1"), ColumnGroupSpec::leaf("A2", "a2")],
        )];
        let layout = compile(&specs).unwrap();
        let merged = merge(&layout.headers, &layout.columns);
        let text = header_table(&merged, &layout.columns);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "A");
        assert_eq!(lines[1], "A1 | A2");
        assert_eq!(lines[2], "---+---");
        assert_eq!(lines[3], "a1 | a2");
    }

    #[test]
    fn test_picker_tree_indents() {
        let specs = vec![ColumnGroupSpec::group("G", vec![ColumnGroupSpec::leaf("L", "l")])];
        let text = picker_tree(&build_tree(&specs));
        assert_eq!(text, "[x] G\n  [x] L (l)\n");
    }
}
