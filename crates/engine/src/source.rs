//! Record sources: where rows come from.
//!
//! A source answers `fetch(offset, count)` with at most
//! `min(count, max_records - offset)` rows and degrades to an empty result
//! for anything out of range. Sources carry no hidden cursor state, so the
//! same request always returns the same rows.

use chrono::NaiveDate;
use pagegrid_core::Row;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Supplier of rows by offset/count, bounded by a fixed corpus size.
pub trait RecordSource {
    /// Rows `[offset, offset + count)` clipped to the corpus.
    fn fetch(&self, offset: usize, count: usize) -> Vec<Row>;

    /// Maximum corpus size.
    fn max_records(&self) -> usize;

    /// Number of rows `fetch(offset, count)` will return.
    fn clipped_len(&self, offset: usize, count: usize) -> usize {
        count.min(self.max_records().saturating_sub(offset))
    }
}

impl<S: RecordSource + ?Sized> RecordSource for Box<S> {
    fn fetch(&self, offset: usize, count: usize) -> Vec<Row> {
        (**self).fetch(offset, count)
    }

    fn max_records(&self) -> usize {
        (**self).max_records()
    }
}

// ============================================================================
// Sample sales data
// ============================================================================

pub const SALES_CATEGORIES: [&str; 3] = ["電子機器", "日用品", "玩具"];
pub const RATINGS: [&str; 4] = ["A", "B", "C", "D"];

/// Synthetic product/sales corpus.
///
/// Every field is keyed by the absolute row index: categories cycle by index
/// and measures come from an RNG seeded by it, so a row is identical no
/// matter which page it is fetched in.
#[derive(Debug, Clone)]
pub struct SampleSales {
    pub max_records: usize,
    pub seed: u64,
}

impl Default for SampleSales {
    fn default() -> Self {
        Self { max_records: 10_000, seed: 0 }
    }
}

impl SampleSales {
    pub fn new(max_records: usize, seed: u64) -> Self {
        Self { max_records, seed }
    }

    fn row_at(&self, index: usize) -> Row {
        let mut rng = StdRng::seed_from_u64(self.seed ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
        let detail = index % 3 + 1;
        Row::new()
            .with("category", SALES_CATEGORIES[index % SALES_CATEGORIES.len()])
            .with("product", format!("商品{}", index))
            .with("category1", format!("詳細{}-1", detail))
            .with("category2", format!("詳細{}-2", detail))
            .with("category3", format!("詳細{}-3", detail))
            .with("sales", f64::from(rng.gen_range(0..=1000u32)))
            .with("profit", f64::from(rng.gen_range(0..=500u32)))
            .with("rating", RATINGS[rng.gen_range(0..RATINGS.len())])
    }
}

impl RecordSource for SampleSales {
    fn fetch(&self, offset: usize, count: usize) -> Vec<Row> {
        let n = self.clipped_len(offset, count);
        (offset..offset + n).map(|i| self.row_at(i)).collect()
    }

    fn max_records(&self) -> usize {
        self.max_records
    }
}

// ============================================================================
// Fund sample
// ============================================================================

/// The four-fund sample used by the hierarchical header grid. Each record
/// nests `perf` and `alloc` sub-records addressed as `perf.m1`, `alloc.bond`…
#[derive(Debug, Clone, Default)]
pub struct FundSample;

struct Fund {
    name: &'static str,
    currency: &'static str,
    fund_type: &'static str,
    region: &'static str,
    perf: [f64; 4],  // ytd, m1, m6, m12
    alloc: [f64; 5], // stock, bond, cash, other, realEstate
    note: &'static str,
    setup: (i32, u32, u32),
    amount: f64,
    achievement: f64,
}

const FUNDS: [Fund; 4] = [
    Fund {
        name: "Aventium",
        currency: "USD",
        fund_type: "株式型",
        region: "北米",
        perf: [0.0523, 0.0142, 0.0443, 0.0743],
        alloc: [0.17, 0.32, 0.36, 0.15, 0.05],
        note: "安定運用",
        setup: (2018, 5, 1),
        amount: 1_200_000.0,
        achievement: 0.87,
    },
    Fund {
        name: "Brillion",
        currency: "EUR",
        fund_type: "債券型",
        region: "欧州",
        perf: [0.0343, 0.043, 0.0244, 0.0543],
        alloc: [0.61, 0.8, 0.9, 0.22, 0.1],
        note: "高リスク",
        setup: (2019, 7, 15),
        amount: 950_000.0,
        achievement: 0.78,
    },
    Fund {
        name: "Cortollix",
        currency: "YEN",
        fund_type: "バランス型",
        region: "アジア",
        perf: [0.0522, 0.0143, 0.0458, 0.0732],
        alloc: [0.66, 0.09, 0.19, 0.06, 0.2],
        note: "分散投資",
        setup: (2020, 2, 10),
        amount: 780_000.0,
        achievement: 0.92,
    },
    Fund {
        name: "Zenith",
        currency: "USD",
        fund_type: "株式型",
        region: "北米",
        perf: [0.045, 0.02, 0.03, 0.06],
        alloc: [0.5, 0.2, 0.2, 0.05, 0.05],
        note: "成長重視",
        setup: (2021, 3, 5),
        amount: 1_500_000.0,
        achievement: 0.95,
    },
];

impl Fund {
    fn to_row(&self) -> Row {
        let [ytd, m1, m6, m12] = self.perf;
        let [stock, bond, cash, other, real_estate] = self.alloc;
        let mut row = Row::new()
            .with("name", self.name)
            .with("currency", self.currency)
            .with("fundType", self.fund_type)
            .with("region", self.region)
            .with(
                "perf",
                Row::new().with("ytd", ytd).with("m1", m1).with("m6", m6).with("m12", m12),
            )
            .with(
                "alloc",
                Row::new()
                    .with("stock", stock)
                    .with("bond", bond)
                    .with("cash", cash)
                    .with("other", other)
                    .with("realEstate", real_estate),
            )
            .with("note", self.note);
        let (y, m, d) = self.setup;
        if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
            row.set("setupDate", date);
        }
        row.with("amount", self.amount).with("achievement", self.achievement)
    }
}

impl RecordSource for FundSample {
    fn fetch(&self, offset: usize, count: usize) -> Vec<Row> {
        FUNDS.iter().skip(offset).take(count).map(Fund::to_row).collect()
    }

    fn max_records(&self) -> usize {
        FUNDS.len()
    }
}

// ============================================================================
// Caller-supplied rows
// ============================================================================

/// Rows supplied up front (real data, fixtures). The corpus is the vector,
/// optionally capped.
#[derive(Debug, Clone, Default)]
pub struct VecSource {
    rows: Vec<Row>,
    cap: Option<usize>,
}

impl VecSource {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows, cap: None }
    }

    pub fn with_cap(mut self, cap: usize) -> Self {
        self.cap = Some(cap);
        self
    }

    /// Parse a JSON array of objects. Non-object elements are skipped.
    pub fn from_json(text: &str) -> Result<Self, String> {
        let value: serde_json::Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
        let items = match value {
            serde_json::Value::Array(items) => items,
            _ => return Err("expected a JSON array of row objects".to_string()),
        };
        let rows: Vec<Row> = items.into_iter().filter_map(Row::from_json).collect();
        Ok(Self::new(rows))
    }
}

impl RecordSource for VecSource {
    fn fetch(&self, offset: usize, count: usize) -> Vec<Row> {
        let n = self.clipped_len(offset, count);
        self.rows[offset.min(self.rows.len())..][..n].to_vec()
    }

    fn max_records(&self) -> usize {
        match self.cap {
            Some(cap) => cap.min(self.rows.len()),
            None => self.rows.len(),
        }
    }
}
