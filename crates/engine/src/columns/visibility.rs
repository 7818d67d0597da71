use serde::Serialize;

use super::compile::FlatColumn;
use super::spec::ColumnGroupSpec;

/// Separator between ancestor headers in a picker label.
pub const PATH_SEPARATOR: &str = " > ";

/// A checkbox node in the column picker. Mirrors the column-group tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnNode {
    /// Ancestor headers joined with `" > "`, ending in this node's header.
    pub label: String,
    /// Set for leaves only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binding: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ColumnNode>,
    /// This node's own checkbox. Not derived from children.
    pub checked: bool,
}

impl ColumnNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Bindings of every leaf under (and including) this node.
    pub fn leaf_bindings(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_bindings(&mut out);
        out
    }

    fn collect_bindings<'a>(&'a self, out: &mut Vec<&'a str>) {
        if let Some(b) = &self.binding {
            out.push(b);
        }
        for child in &self.children {
            child.collect_bindings(out);
        }
    }

    fn set_checked_all(&mut self, checked: bool) {
        self.checked = checked;
        for child in &mut self.children {
            child.set_checked_all(checked);
        }
    }
}

/// Build the picker tree for a spec. Every node starts checked.
pub fn build_tree(specs: &[ColumnGroupSpec]) -> Vec<ColumnNode> {
    build_level(specs, &[])
}

fn build_level(specs: &[ColumnGroupSpec], path: &[&str]) -> Vec<ColumnNode> {
    specs
        .iter()
        .map(|spec| {
            let mut node_path = path.to_vec();
            node_path.push(&spec.header);
            ColumnNode {
                label: node_path.join(PATH_SEPARATOR),
                binding: spec.binding().map(str::to_string),
                children: build_level(spec.children(), &node_path),
                checked: true,
            }
        })
        .collect()
}

/// Cascade a visibility change from `node` to every descendant leaf column.
/// Only `visible` changes; column order and the rest of each column stay put.
pub fn toggle(node: &ColumnNode, visible: bool, columns: &mut [FlatColumn]) {
    for binding in node.leaf_bindings() {
        if let Some(col) = columns.iter_mut().find(|c| c.binding == binding) {
            col.visible = visible;
        }
    }
}

/// Address of a node: child indices from the roots down.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NodePath(pub Vec<usize>);

/// Hierarchical show/hide picker.
///
/// Toggling a node overwrites the checkboxes of all its descendants and
/// cascades to their columns. Parents are not recomputed from children, so
/// a parent stays checked after its last child is unchecked.
#[derive(Debug, Clone, Default)]
pub struct ColumnPicker {
    roots: Vec<ColumnNode>,
    open: bool,
}

impl ColumnPicker {
    pub fn new(specs: &[ColumnGroupSpec]) -> Self {
        Self { roots: build_tree(specs), open: false }
    }

    pub fn roots(&self) -> &[ColumnNode] {
        &self.roots
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Gear-icon toggle; returns the new state.
    pub fn toggle_open(&mut self) -> bool {
        self.open = !self.open;
        self.open
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn node(&self, path: &NodePath) -> Option<&ColumnNode> {
        let (first, rest) = path.0.split_first()?;
        let mut node = self.roots.get(*first)?;
        for &i in rest {
            node = node.children.get(i)?;
        }
        Some(node)
    }

    fn node_mut(&mut self, path: &NodePath) -> Option<&mut ColumnNode> {
        let (first, rest) = path.0.split_first()?;
        let mut node = self.roots.get_mut(*first)?;
        for &i in rest {
            node = node.children.get_mut(i)?;
        }
        Some(node)
    }

    /// Find a node by its full label (`"Performance > Return"`) or, failing
    /// that, by its last segment when that is unambiguous.
    pub fn find(&self, label: &str) -> Option<NodePath> {
        let mut exact = None;
        let mut by_tail = Vec::new();
        walk(&self.roots, &mut Vec::new(), &mut |path, node| {
            if node.label == label && exact.is_none() {
                exact = Some(NodePath(path.to_vec()));
            }
            if node.label.rsplit(PATH_SEPARATOR).next() == Some(label) {
                by_tail.push(NodePath(path.to_vec()));
            }
        });
        exact.or_else(|| if by_tail.len() == 1 { by_tail.pop() } else { None })
    }

    /// Set a node's checkbox (and all descendants') and cascade to columns.
    /// Returns false when the path does not exist.
    pub fn toggle(&mut self, path: &NodePath, visible: bool, columns: &mut [FlatColumn]) -> bool {
        let Some(node) = self.node_mut(path) else {
            return false;
        };
        node.set_checked_all(visible);
        toggle(node, visible, columns);
        log::debug!("column picker: '{}' -> {}", node.label, if visible { "shown" } else { "hidden" });
        true
    }
}

fn walk<'a>(nodes: &'a [ColumnNode], path: &mut Vec<usize>, f: &mut dyn FnMut(&[usize], &'a ColumnNode)) {
    for (i, node) in nodes.iter().enumerate() {
        path.push(i);
        f(path, node);
        walk(&node.children, path, f);
        path.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::{compile, presets};

    #[test]
    fn test_tree_labels() {
        let tree = build_tree(&presets::fund_layout());
        assert_eq!(tree[0].label, "Name");
        assert_eq!(tree[0].binding.as_deref(), Some("name"));
        let perf = &tree[2];
        assert!(perf.binding.is_none());
        assert_eq!(perf.children[0].children[0].label, "Performance > Return > Short Term");
        assert_eq!(
            perf.children[0].children[0].children[1].label,
            "Performance > Return > Short Term > 6 M"
        );
        assert!(tree.iter().all(|n| n.checked));
    }

    #[test]
    fn test_toggle_group_cascades() {
        let specs = presets::fund_layout();
        let mut layout = compile(&specs).unwrap();
        let mut picker = ColumnPicker::new(&specs);
        let path = picker.find("Performance > Return > Long Term").unwrap();

        assert!(picker.toggle(&path, false, &mut layout.columns));
        let hidden: Vec<&str> = layout
            .columns
            .iter()
            .filter(|c| !c.visible)
            .map(|c| c.binding.as_str())
            .collect();
        assert_eq!(hidden, vec!["perf.ytd", "perf.m12"]);

        let node = picker.node(&path).unwrap();
        assert!(!node.checked);
        assert!(node.children.iter().all(|c| !c.checked));
        // No upward aggregation
        assert!(picker.node(&NodePath(vec![2])).unwrap().checked);

        assert!(picker.toggle(&path, true, &mut layout.columns));
        assert!(layout.columns.iter().all(|c| c.visible));
    }

    #[test]
    fn test_toggle_keeps_order_and_metadata() {
        let specs = presets::fund_layout();
        let mut layout = compile(&specs).unwrap();
        let before = layout.clone();
        let mut picker = ColumnPicker::new(&specs);
        let path = picker.find("Allocation").unwrap();
        picker.toggle(&path, false, &mut layout.columns);
        for (a, b) in before.columns.iter().zip(&layout.columns) {
            assert_eq!(a.binding, b.binding);
            assert_eq!(a.width, b.width);
            assert_eq!(a.format, b.format);
        }
    }

    #[test]
    fn test_find_by_tail_and_missing_path() {
        let specs = presets::fund_layout();
        let mut layout = compile(&specs).unwrap();
        let mut picker = ColumnPicker::new(&specs);
        assert_eq!(picker.find("Cash"), Some(NodePath(vec![3, 0, 2])));
        assert!(picker.find("Nope").is_none());
        assert!(!picker.toggle(&NodePath(vec![99]), false, &mut layout.columns));
        assert!(!picker.toggle(&NodePath(vec![]), false, &mut layout.columns));
    }

    #[test]
    fn test_open_state() {
        let mut picker = ColumnPicker::new(&presets::fund_layout());
        assert!(!picker.is_open());
        assert!(picker.toggle_open());
        assert!(!picker.toggle_open());
    }
}
