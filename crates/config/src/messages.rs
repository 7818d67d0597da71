// User-visible strings, per locale

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ja,
    En,
}

impl Locale {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ja" | "ja-jp" => Some(Locale::Ja),
            "en" | "en-us" | "en-gb" => Some(Locale::En),
            _ => None,
        }
    }
}

/// Every label and message the grid shows to a user.
///
/// Templates use `{row}`, `{col}`, `{message}` and `{count}` placeholders;
/// see [`Messages::fill`].
#[derive(Debug, Clone, PartialEq)]
pub struct Messages {
    pub product_missing: String,
    pub value_too_low: String,
    pub rating_too_low: String,
    pub save_failed_title: String,
    pub save_failed_description: String,
    pub see_details: String,
    pub save_succeeded_title: String,
    pub save_succeeded_description: String,
    pub errors_heading: String,
    pub error_line: String,
    pub more_errors: String,
    pub next_error: String,
    pub close: String,
    pub search_placeholder: String,
    pub reset_filter: String,
}

impl Messages {
    pub fn for_locale(locale: Locale) -> Self {
        match locale {
            Locale::Ja => Self::japanese(),
            Locale::En => Self::english(),
        }
    }

    fn japanese() -> Self {
        Self {
            product_missing: "商品名が未入力です".into(),
            value_too_low: "売上が低すぎます".into(),
            rating_too_low: "評価が低すぎます".into(),
            save_failed_title: "保存失敗：{count}件の入力エラー".into(),
            save_failed_description: "セルを確認してください".into(),
            see_details: "詳細を見る".into(),
            save_succeeded_title: "保存完了".into(),
            save_succeeded_description: "すべてのデータが正常です".into(),
            errors_heading: "入力エラー一覧".into(),
            error_line: "行{row}・列{col}: {message}".into(),
            more_errors: "他 {count} 件のエラーがあります".into(),
            next_error: "次のエラーへ".into(),
            close: "閉じる".into(),
            search_placeholder: "グローバル検索".into(),
            reset_filter: "フィルタをリセット".into(),
        }
    }

    fn english() -> Self {
        Self {
            product_missing: "product name missing".into(),
            value_too_low: "value too low".into(),
            rating_too_low: "rating too low".into(),
            save_failed_title: "Save failed: {count} input error(s)".into(),
            save_failed_description: "Please check the highlighted cells".into(),
            see_details: "See details".into(),
            save_succeeded_title: "Saved".into(),
            save_succeeded_description: "All data is valid".into(),
            errors_heading: "Input errors".into(),
            error_line: "Row {row}, Col {col}: {message}".into(),
            more_errors: "{count} more error(s)".into(),
            next_error: "Next error".into(),
            close: "Close".into(),
            search_placeholder: "Global search".into(),
            reset_filter: "Reset filters".into(),
        }
    }

    /// Substitute placeholders in a template. Unknown placeholders are left as-is.
    pub fn fill(template: &str, vars: &[(&str, &str)]) -> String {
        let mut out = template.to_string();
        for (name, value) in vars {
            out = out.replace(&format!("{{{}}}", name), value);
        }
        out
    }

    pub fn save_failed(&self, count: usize) -> String {
        Self::fill(&self.save_failed_title, &[("count", &count.to_string())])
    }

    /// Error-panel line; `row`/`col` are 0-based and shown 1-based.
    pub fn error_line(&self, row: usize, col: usize, message: &str) -> String {
        Self::fill(
            &self.error_line,
            &[
                ("row", &(row + 1).to_string()),
                ("col", &(col + 1).to_string()),
                ("message", message),
            ],
        )
    }

    pub fn more_errors(&self, count: usize) -> String {
        Self::fill(&self.more_errors, &[("count", &count.to_string())])
    }
}

impl Default for Messages {
    fn default() -> Self {
        Self::for_locale(Locale::default())
    }
}
