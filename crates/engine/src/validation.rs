//! Row validation for the save action.
//!
//! A pass runs synchronously over the entire materialized row set and
//! returns every finding at once; nothing short-circuits. Output is
//! row-major, and within a row follows rule declaration order:
//!
//! 1. product (or `name`) is empty/falsy
//! 2. sales (or `amount`) is below the threshold
//! 3. rating equals the failing grade
//!
//! ## Column coupling
//!
//! Rules report against fixed column indices held in [`RuleColumns`]. They
//! are not looked up by binding while validating, so a layout that reorders
//! these columns needs a matching `RuleColumns` (see
//! [`RuleColumns::from_layout`], which resolves them once at configuration
//! time).

use pagegrid_config::Messages;
use pagegrid_core::{CellError, Row, Value};

use crate::columns::FlatColumn;

/// Default threshold below which a sales figure is flagged.
pub const DEFAULT_SALES_THRESHOLD: f64 = 100.0;

/// Default rating grade that is flagged.
pub const DEFAULT_FAILING_RATING: &str = "D";

// ============================================================================
// Rule -> column mapping
// ============================================================================

/// Column indices the rules report against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleColumns {
    pub product: usize,
    pub sales: usize,
    pub rating: usize,
}

impl Default for RuleColumns {
    /// Positions in the sales layout: product | category1..3 | sales, profit | rating
    fn default() -> Self {
        Self { product: 0, sales: 4, rating: 6 }
    }
}

impl RuleColumns {
    /// Resolve indices from a compiled layout by binding. Returns `None`
    /// when any of the three columns is absent.
    pub fn from_layout(columns: &[FlatColumn]) -> Option<Self> {
        let find = |names: &[&str]| {
            names
                .iter()
                .find_map(|name| columns.iter().position(|c| c.binding == *name))
        };
        Some(Self {
            product: find(&["product", "name"])?,
            sales: find(&["sales", "amount"])?,
            rating: find(&["rating"])?,
        })
    }
}

// ============================================================================
// Rules
// ============================================================================

/// One row-level rule. Evaluation order is the order of [`Validator::rules`].
#[derive(Debug, Clone, PartialEq)]
pub enum RowRule {
    /// `product` (falling back to `name`) is empty or falsy.
    ProductMissing,
    /// `sales` (falling back to `amount`) is below `threshold`.
    ValueTooLow { threshold: f64 },
    /// `rating` equals `grade`.
    RatingTooLow { grade: String },
}

impl RowRule {
    /// Column index errors from this rule are reported at.
    pub fn column(&self, columns: &RuleColumns) -> usize {
        match self {
            RowRule::ProductMissing => columns.product,
            RowRule::ValueTooLow { .. } => columns.sales,
            RowRule::RatingTooLow { .. } => columns.rating,
        }
    }

    pub fn violated_by(&self, row: &Row) -> bool {
        match self {
            RowRule::ProductMissing => {
                let value = row.get("product").or_else(|| row.get("name"));
                !value.map(Value::is_truthy).unwrap_or(false)
            }
            RowRule::ValueTooLow { threshold } => {
                let value = row.get("sales").or_else(|| row.get("amount"));
                matches!(value.and_then(numeric), Some(n) if n < *threshold)
            }
            RowRule::RatingTooLow { grade } => {
                row.get("rating").and_then(Value::as_str) == Some(grade.as_str())
            }
        }
    }

    fn message<'a>(&self, messages: &'a RuleMessages) -> &'a str {
        match self {
            RowRule::ProductMissing => &messages.product_missing,
            RowRule::ValueTooLow { .. } => &messages.value_too_low,
            RowRule::RatingTooLow { .. } => &messages.rating_too_low,
        }
    }
}

/// Numbers as-is; numeric text is accepted, blank text is not.
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Text(s) if !s.trim().is_empty() => s.trim().parse().ok(),
        other => other.as_number(),
    }
}

/// Localized rule messages.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleMessages {
    pub product_missing: String,
    pub value_too_low: String,
    pub rating_too_low: String,
}

impl From<&Messages> for RuleMessages {
    fn from(m: &Messages) -> Self {
        Self {
            product_missing: m.product_missing.clone(),
            value_too_low: m.value_too_low.clone(),
            rating_too_low: m.rating_too_low.clone(),
        }
    }
}

impl Default for RuleMessages {
    fn default() -> Self {
        Self::from(&Messages::default())
    }
}

// ============================================================================
// Validator
// ============================================================================

#[derive(Debug, Clone)]
pub struct Validator {
    columns: RuleColumns,
    messages: RuleMessages,
    rules: Vec<RowRule>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(RuleColumns::default(), RuleMessages::default())
    }
}

impl Validator {
    pub fn new(columns: RuleColumns, messages: RuleMessages) -> Self {
        Self {
            columns,
            messages,
            rules: vec![
                RowRule::ProductMissing,
                RowRule::ValueTooLow { threshold: DEFAULT_SALES_THRESHOLD },
                RowRule::RatingTooLow { grade: DEFAULT_FAILING_RATING.to_string() },
            ],
        }
    }

    /// Replace the sales threshold, keeping rule order.
    pub fn with_sales_threshold(mut self, threshold: f64) -> Self {
        for rule in &mut self.rules {
            if let RowRule::ValueTooLow { threshold: t } = rule {
                *t = threshold;
            }
        }
        self
    }

    pub fn columns(&self) -> &RuleColumns {
        &self.columns
    }

    pub fn rules(&self) -> &[RowRule] {
        &self.rules
    }

    /// Validate every row. Row indices are positions in `rows`.
    pub fn validate<'a, I>(&self, rows: I) -> Vec<CellError>
    where
        I: IntoIterator<Item = &'a Row>,
    {
        let mut errors = Vec::new();
        let mut row_count = 0;
        for (index, row) in rows.into_iter().enumerate() {
            row_count += 1;
            for rule in &self.rules {
                if rule.violated_by(row) {
                    errors.push(CellError::new(
                        index,
                        rule.column(&self.columns),
                        rule.message(&self.messages),
                    ));
                }
            }
        }
        log::debug!("validated {} row(s): {} error(s)", row_count, errors.len());
        errors
    }
}
