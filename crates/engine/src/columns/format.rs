use std::collections::BTreeMap;

use pagegrid_config::Color;
use pagegrid_core::Value;

use super::compile::FlatColumn;

/// Header background for a column, derived from its role. Read-only view;
/// never feeds back into the column itself.
pub fn header_tint(column: &FlatColumn, palette: &BTreeMap<String, Color>) -> Option<Color> {
    column.role.as_deref().and_then(|role| palette.get(role)).copied()
}

/// Display text for a cell under a column format.
///
/// Supported: `pN` percent, `nN` grouped number, `fN` fixed, `dN`
/// zero-padded integer, and date patterns built from `yyyy MM dd HH mm ss`.
/// Anything else falls back to the plain display text.
pub fn format_value(value: &Value, format: Option<&str>) -> String {
    let Some(format) = format.filter(|f| !f.is_empty()) else {
        return value.display();
    };
    match value {
        Value::Number(n) => format_number(*n, format).unwrap_or_else(|| value.display()),
        Value::Date(d) => d.format(&date_pattern(format)).to_string(),
        _ => value.display(),
    }
}

fn format_number(n: f64, format: &str) -> Option<String> {
    let mut chars = format.chars();
    let kind = chars.next()?.to_ascii_lowercase();
    let digits = chars.as_str();
    let precision: usize = if digits.is_empty() { 2 } else { digits.parse().ok()? };
    match kind {
        'p' => Some(format!("{}%", group_thousands(&format!("{:.*}", precision, n * 100.0)))),
        'n' => Some(group_thousands(&format!("{:.*}", precision, n))),
        'f' => Some(format!("{:.*}", precision, n)),
        'd' => {
            let i = n.round() as i64;
            let width = if digits.is_empty() { 0 } else { precision };
            if i < 0 {
                Some(format!("-{:0width$}", -i, width = width))
            } else {
                Some(format!("{:0width$}", i, width = width))
            }
        }
        _ => None,
    }
}

/// Insert `,` every three digits of the integer part.
fn group_thousands(fixed: &str) -> String {
    let (sign, body) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed),
    };
    let (int_part, frac_part) = match body.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (body, None),
    };
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

/// Translate a .NET-style date pattern into a chrono format string.
fn date_pattern(format: &str) -> String {
    const TOKENS: [(&str, &str); 6] = [
        ("yyyy", "%Y"),
        ("MM", "%m"),
        ("dd", "%d"),
        ("HH", "%H"),
        ("mm", "%M"),
        ("ss", "%S"),
    ];
    let mut out = String::new();
    let mut rest = format;
    'outer: while !rest.is_empty() {
        for (token, spec) in TOKENS {
            if let Some(tail) = rest.strip_prefix(token) {
                out.push_str(spec);
                rest = tail;
                continue 'outer;
            }
        }
        let mut chars = rest.chars();
        if let Some(ch) = chars.next() {
            if ch == '%' {
                out.push_str("%%");
            } else {
                out.push(ch);
            }
        }
        rest = chars.as_str();
    }
    out
}
