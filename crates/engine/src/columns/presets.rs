//! Built-in column layouts for the sample sources.

use super::spec::{ColumnGroupSpec as C, ColumnWidth, DataType};

/// product | カテゴリ詳細 (1..3) | 業績情報 (sales, profit) | rating
///
/// Leaf positions match [`RuleColumns::default`](crate::validation::RuleColumns).
pub fn sales_layout() -> Vec<C> {
    vec![
        C::leaf("商品", "product"),
        C::group(
            "カテゴリ詳細",
            vec![
                C::leaf("カテゴリ詳細1", "category1"),
                C::leaf("カテゴリ詳細2", "category2"),
                C::leaf("カテゴリ詳細3", "category3"),
            ],
        ),
        C::group(
            "業績情報",
            vec![
                C::leaf("売上", "sales").data_type(DataType::Number).format("n0"),
                C::leaf("利益", "profit").data_type(DataType::Number).format("n0"),
            ],
        )
        .role("performance"),
        C::leaf("評価", "rating"),
    ]
}

/// Four-level fund header: performance returns and asset allocation groups.
pub fn fund_layout() -> Vec<C> {
    let star = ColumnWidth::Star(1);
    let pct = |header: &str, binding: &str, format: &str| {
        C::leaf(header, binding).format(format).width(star)
    };
    vec![
        C::leaf("Name", "name").width(ColumnWidth::Star(2)),
        C::leaf("Curr", "currency").width(star),
        C::group(
            "Performance",
            vec![C::group(
                "Return",
                vec![
                    C::group(
                        "Short Term",
                        vec![pct("1 M", "perf.m1", "p2"), pct("6 M", "perf.m6", "p2")],
                    ),
                    C::group(
                        "Long Term",
                        vec![pct("YTD", "perf.ytd", "p2"), pct("12 M", "perf.m12", "p2")],
                    ),
                ],
            )],
        )
        .role("performance"),
        C::group(
            "Allocation",
            vec![C::group(
                "Asset Class",
                vec![
                    pct("Stocks", "alloc.stock", "p0"),
                    pct("Bonds", "alloc.bond", "p0"),
                    pct("Cash", "alloc.cash", "p0"),
                    pct("Other", "alloc.other", "p0"),
                    pct("Real Estate", "alloc.realEstate", "p0"),
                ],
            )],
        )
        .role("allocation"),
        C::leaf("Note", "note").data_type(DataType::String).width(star).role("meta"),
        C::leaf("Setup Date", "setupDate")
            .data_type(DataType::Date)
            .format("yyyy/MM/dd")
            .width(star)
            .role("meta"),
        C::leaf("Amount (円)", "amount").data_type(DataType::Number).format("n0").width(star),
        C::leaf("Achievement (%)", "achievement")
            .data_type(DataType::Number)
            .format("p0")
            .width(star),
    ]
}
