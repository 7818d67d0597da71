use chrono::NaiveDate;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// A single field value inside a row.
///
/// Rows coming from a record source are immutable once fetched, so values
/// are plain owned data. Nested sub-records (e.g. a fund's `perf` block) are
/// stored as `Record` and addressed with dotted paths.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
    Date(NaiveDate),
    Record(Row),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Truthiness used by the validation rules: empty, `""`, `0`, NaN and
    /// `false` are falsy. Dates and records are always truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Empty => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Text(s) => !s.is_empty(),
            Value::Date(_) | Value::Record(_) => true,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Numeric view of the value. Text is not coerced.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Row> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Plain display text, no format applied.
    pub fn display(&self) -> String {
        match self {
            Value::Empty => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            Value::Text(s) => s.clone(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::Record(r) => {
                let parts: Vec<String> = r
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v.display()))
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<Row> for Value {
    fn from(r: Row) -> Self {
        Value::Record(r)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Empty,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Empty),
            serde_json::Value::String(s) => Value::Text(s),
            // Arrays have no cell representation; keep their JSON text.
            serde_json::Value::Array(items) => {
                Value::Text(serde_json::Value::Array(items).to_string())
            }
            serde_json::Value::Object(map) => {
                let mut row = Row::new();
                for (k, v) in map {
                    row.set(k, Value::from(v));
                }
                Value::Record(row)
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Empty => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Date(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
            Value::Record(r) => r.serialize(serializer),
        }
    }
}

/// An ordered, insertion-stable mapping from field name to value.
///
/// Field counts per row are small (a dozen or so), so lookups scan a vector;
/// this keeps the declared field order for display and serialization.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    fields: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Insert or replace a field. Replacing keeps the original position.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.fields.iter_mut().find(|(k, _)| *k == name) {
            slot.1 = value;
        } else {
            self.fields.push((name, value));
        }
    }

    /// Top-level field lookup (no path resolution).
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Resolve a binding path. `"perf.m1"` walks into the `perf` record.
    /// A top-level field whose name literally contains a dot wins over
    /// path traversal.
    pub fn get(&self, path: &str) -> Option<&Value> {
        if let Some(v) = self.field(path) {
            return Some(v);
        }
        let (head, rest) = path.split_once('.')?;
        self.field(head)?.as_record()?.get(rest)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Leaf fields with dotted paths, in declaration order.
    pub fn flatten(&self) -> Vec<(String, Value)> {
        let mut out = Vec::new();
        self.flatten_into("", &mut out);
        out
    }

    fn flatten_into(&self, prefix: &str, out: &mut Vec<(String, Value)>) {
        for (k, v) in &self.fields {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{}.{}", prefix, k)
            };
            match v {
                Value::Record(inner) => inner.flatten_into(&path, out),
                other => out.push((path, other.clone())),
            }
        }
    }

    /// Build a row from a JSON object. Non-objects yield `None`.
    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        match Value::from(value) {
            Value::Record(row) => Some(row),
            _ => None,
        }
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fund_row() -> Row {
        Row::new()
            .with("name", "Aventium")
            .with("perf", Row::new().with("ytd", 0.0523).with("m1", 0.0142))
            .with("amount", 1_200_000.0)
    }

    #[test]
    fn test_set_keeps_position() {
        let mut row = Row::new().with("a", 1.0).with("b", 2.0);
        row.set("a", 3.0);
        let keys: Vec<&str> = row.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(row.get("a"), Some(&Value::Number(3.0)));
    }

    #[test]
    fn test_dotted_path_lookup() {
        let row = fund_row();
        assert_eq!(row.get("perf.m1"), Some(&Value::Number(0.0142)));
        assert_eq!(row.get("perf.missing"), None);
        assert_eq!(row.get("name.first"), None);
    }

    #[test]
    fn test_flatten_order() {
        let flat = fund_row().flatten();
        let keys: Vec<&str> = flat.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["name", "perf.ytd", "perf.m1", "amount"]);
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Empty.is_truthy());
        assert!(!Value::text("").is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(Value::text("x").is_truthy());
        assert!(Value::Number(-1.0).is_truthy());
    }

    #[test]
    fn test_serialize_preserves_order() {
        let json = serde_json::to_string(&fund_row()).unwrap();
        assert_eq!(
            json,
            r#"{"name":"Aventium","perf":{"ytd":0.0523,"m1":0.0142},"amount":1200000.0}"#
        );
    }

    #[test]
    fn test_from_json_object() {
        let row = Row::from_json(serde_json::json!({"product": "x", "sales": 50})).unwrap();
        assert_eq!(row.get("sales").and_then(Value::as_number), Some(50.0));
        assert!(Row::from_json(serde_json::json!([1, 2])).is_none());
    }
}
