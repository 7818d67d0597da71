use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ============================================================================
// Errors
// ============================================================================

/// Malformed column configuration. Raised at configuration time, never
/// while rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutError {
    /// A node declares both a binding and child columns.
    BindingAndChildren { header: String },
    /// A group node has an empty child list.
    EmptyGroup { header: String },
    /// A node has neither a binding nor children.
    MissingBinding { header: String },
    /// Two leaves read the same field.
    DuplicateBinding { binding: String },
    /// Layout text could not be parsed.
    Parse(String),
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BindingAndChildren { header } => {
                write!(f, "column '{header}' has both a binding and child columns")
            }
            Self::EmptyGroup { header } => write!(f, "column group '{header}' has no columns"),
            Self::MissingBinding { header } => {
                write!(f, "column '{header}' has neither a binding nor child columns")
            }
            Self::DuplicateBinding { binding } => write!(f, "duplicate column binding '{binding}'"),
            Self::Parse(msg) => write!(f, "layout parse error: {msg}"),
        }
    }
}

impl std::error::Error for LayoutError {}

// ============================================================================
// Metadata
// ============================================================================

/// Width token: `*` / `2*` (star weight) or a pixel count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnWidth {
    Star(u32),
    Pixels(u32),
}

impl FromStr for ColumnWidth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(weight) = s.strip_suffix('*') {
            if weight.is_empty() {
                return Ok(ColumnWidth::Star(1));
            }
            return weight
                .parse()
                .map(ColumnWidth::Star)
                .map_err(|_| format!("invalid star width '{s}'"));
        }
        s.parse()
            .map(ColumnWidth::Pixels)
            .map_err(|_| format!("invalid width '{s}'"))
    }
}

impl fmt::Display for ColumnWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnWidth::Star(1) => write!(f, "*"),
            ColumnWidth::Star(n) => write!(f, "{n}*"),
            ColumnWidth::Pixels(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    String,
    Number,
    Date,
    Boolean,
}

/// Optional presentation metadata. None of it affects compilation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnMeta {
    pub format: Option<String>,
    pub width: Option<ColumnWidth>,
    pub data_type: Option<DataType>,
    /// Semantic role used for header tinting; inherited by descendant leaves.
    pub role: Option<String>,
}

// ============================================================================
// Spec tree
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnKind {
    Leaf { binding: String },
    Group { children: Vec<ColumnGroupSpec> },
}

/// One node of a nested column specification. A node is either a leaf
/// (reads `binding`) or a group (labels its children); the enum makes the
/// two mutually exclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawColumnGroup", into = "RawColumnGroup")]
pub struct ColumnGroupSpec {
    pub header: String,
    pub kind: ColumnKind,
    pub meta: ColumnMeta,
}

impl ColumnGroupSpec {
    pub fn leaf(header: impl Into<String>, binding: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            kind: ColumnKind::Leaf { binding: binding.into() },
            meta: ColumnMeta::default(),
        }
    }

    pub fn group(header: impl Into<String>, children: Vec<ColumnGroupSpec>) -> Self {
        Self {
            header: header.into(),
            kind: ColumnKind::Group { children },
            meta: ColumnMeta::default(),
        }
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.meta.format = Some(format.into());
        self
    }

    pub fn width(mut self, width: ColumnWidth) -> Self {
        self.meta.width = Some(width);
        self
    }

    pub fn data_type(mut self, data_type: DataType) -> Self {
        self.meta.data_type = Some(data_type);
        self
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.meta.role = Some(role.into());
        self
    }

    pub fn binding(&self) -> Option<&str> {
        match &self.kind {
            ColumnKind::Leaf { binding } => Some(binding),
            ColumnKind::Group { .. } => None,
        }
    }

    pub fn children(&self) -> &[ColumnGroupSpec] {
        match &self.kind {
            ColumnKind::Leaf { .. } => &[],
            ColumnKind::Group { children } => children,
        }
    }

    /// Header rows this subtree needs (a leaf is 1).
    pub fn depth(&self) -> usize {
        1 + self.children().iter().map(|c| c.depth()).max().unwrap_or(0)
    }

    /// Parse a JSON array of column nodes.
    pub fn from_json(text: &str) -> Result<Vec<Self>, LayoutError> {
        serde_json::from_str(text).map_err(|e| LayoutError::Parse(e.to_string()))
    }

    /// Parse a TOML document with a top-level `[[columns]]` array.
    pub fn from_toml_str(text: &str) -> Result<Vec<Self>, LayoutError> {
        #[derive(Deserialize)]
        struct LayoutFile {
            columns: Vec<ColumnGroupSpec>,
        }
        toml::from_str::<LayoutFile>(text)
            .map(|f| f.columns)
            .map_err(|e| LayoutError::Parse(e.to_string()))
    }

    pub fn to_json(specs: &[Self]) -> Result<String, LayoutError> {
        serde_json::to_string_pretty(specs).map_err(|e| LayoutError::Parse(e.to_string()))
    }
}

/// Wire shape of a column node: `binding` and `columns` are both optional
/// here and checked on conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawColumnGroup {
    header: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    binding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    columns: Option<Vec<ColumnGroupSpec>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    width: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data_type: Option<DataType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
}

impl TryFrom<RawColumnGroup> for ColumnGroupSpec {
    type Error = LayoutError;

    fn try_from(raw: RawColumnGroup) -> Result<Self, Self::Error> {
        let kind = match (raw.binding, raw.columns) {
            (Some(_), Some(_)) => {
                return Err(LayoutError::BindingAndChildren { header: raw.header })
            }
            (None, None) => return Err(LayoutError::MissingBinding { header: raw.header }),
            (None, Some(children)) if children.is_empty() => {
                return Err(LayoutError::EmptyGroup { header: raw.header })
            }
            (Some(binding), None) => ColumnKind::Leaf { binding },
            (None, Some(children)) => ColumnKind::Group { children },
        };
        let width = raw
            .width
            .as_deref()
            .map(ColumnWidth::from_str)
            .transpose()
            .map_err(LayoutError::Parse)?;
        Ok(Self {
            header: raw.header,
            kind,
            meta: ColumnMeta {
                format: raw.format,
                width,
                data_type: raw.data_type,
                role: raw.role,
            },
        })
    }
}

impl From<ColumnGroupSpec> for RawColumnGroup {
    fn from(spec: ColumnGroupSpec) -> Self {
        let (binding, columns) = match spec.kind {
            ColumnKind::Leaf { binding } => (Some(binding), None),
            ColumnKind::Group { children } => (None, Some(children)),
        };
        Self {
            header: spec.header,
            binding,
            columns,
            format: spec.meta.format,
            width: spec.meta.width.map(|w| w.to_string()),
            data_type: spec.meta.data_type,
            role: spec.meta.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_tokens() {
        assert_eq!("*".parse::<ColumnWidth>().unwrap(), ColumnWidth::Star(1));
        assert_eq!("2*".parse::<ColumnWidth>().unwrap(), ColumnWidth::Star(2));
        assert_eq!("120".parse::<ColumnWidth>().unwrap(), ColumnWidth::Pixels(120));
        assert!("wide".parse::<ColumnWidth>().is_err());
        assert_eq!(ColumnWidth::Star(2).to_string(), "2*");
    }

    #[test]
    fn test_json_leaf_and_group() {
        let specs = ColumnGroupSpec::from_json(
            r#"[
                {"header": "Name", "binding": "name", "width": "2*"},
                {"header": "Perf", "role": "performance", "columns": [
                    {"header": "1 M", "binding": "perf.m1", "format": "p2", "dataType": "Number"}
                ]}
            ]"#,
        )
        .unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].binding(), Some("name"));
        assert_eq!(specs[0].meta.width, Some(ColumnWidth::Star(2)));
        assert_eq!(specs[1].children().len(), 1);
        assert_eq!(specs[1].children()[0].meta.data_type, Some(DataType::Number));
        assert_eq!(specs[1].depth(), 2);
    }

    #[test]
    fn test_binding_and_children_rejected() {
        let err = ColumnGroupSpec::from_json(
            r#"[{"header": "Bad", "binding": "x", "columns": [{"header": "y", "binding": "y"}]}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, LayoutError::Parse(msg) if msg.contains("both a binding")));
    }

    #[test]
    fn test_empty_group_rejected() {
        let err = ColumnGroupSpec::from_json(r#"[{"header": "G", "columns": []}]"#).unwrap_err();
        assert!(matches!(err, LayoutError::Parse(msg) if msg.contains("has no columns")));
    }

    #[test]
    fn test_toml_layout() {
        let specs = ColumnGroupSpec::from_toml_str(
            r#"
[[columns]]
header = "A"

[[columns.columns]]
header = "A1"
binding = "a1"

[[columns.columns]]
header = "A2"
binding = "a2"
"#,
        )
        .unwrap();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].children()[1].binding(), Some("a2"));
    }

    #[test]
    fn test_json_output_reparses() {
        let specs = vec![ColumnGroupSpec::group(
            "G",
            vec![ColumnGroupSpec::leaf("x", "x").format("n0").width(ColumnWidth::Pixels(80))],
        )];
        let text = ColumnGroupSpec::to_json(&specs).unwrap();
        assert!(text.contains("\"columns\""));
        assert_eq!(ColumnGroupSpec::from_json(&text).unwrap(), specs);
    }
}
