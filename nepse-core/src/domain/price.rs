//! PriceRow: one trading day of price history for a single symbol.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Column headers of a per-symbol price file, in file order.
pub const PRICE_HEADERS: [&str; 9] = [
    "S.N.", "Date", "Open", "High", "Low", "Ltp", "% Change", "Qty", "Turnover",
];

/// Text written for a numeric cell the page left blank.
pub const MISSING_CELL: &str = "-";

/// Daily price record as published on the price-history table.
///
/// The trade date is the key: a symbol file never holds two rows for the
/// same date. `sn` is a 1-based recency rank and is reassigned on every merge.
/// Numeric cells are `None` where the page printed a placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceRow {
    pub sn: u32,
    pub date: NaiveDate,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub ltp: Option<Decimal>,
    pub pct_change: Option<Decimal>,
    pub qty: Option<Decimal>,
    pub turnover: Option<Decimal>,
}

fn number_cell(value: Option<Decimal>) -> String {
    value.map_or_else(|| MISSING_CELL.to_string(), |v| v.to_string())
}

/// On-disk shape of a price row. Numeric cells stay text so that stored files
/// written by older tooling (with thousands separators) still load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRecord {
    #[serde(rename = "S.N.")]
    pub sn: String,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Open")]
    pub open: String,
    #[serde(rename = "High")]
    pub high: String,
    #[serde(rename = "Low")]
    pub low: String,
    #[serde(rename = "Ltp")]
    pub ltp: String,
    #[serde(rename = "% Change")]
    pub pct_change: String,
    #[serde(rename = "Qty")]
    pub qty: String,
    #[serde(rename = "Turnover")]
    pub turnover: String,
}

impl PriceRow {
    /// Cells in table order, the same order the price-history page uses.
    pub fn to_cells(&self) -> [String; 9] {
        [
            self.sn.to_string(),
            self.date.format("%Y-%m-%d").to_string(),
            number_cell(self.open),
            number_cell(self.high),
            number_cell(self.low),
            number_cell(self.ltp),
            number_cell(self.pct_change),
            number_cell(self.qty),
            number_cell(self.turnover),
        ]
    }

    pub fn to_record(&self) -> PriceRecord {
        let [sn, date, open, high, low, ltp, pct_change, qty, turnover] = self.to_cells();
        PriceRecord {
            sn,
            date,
            open,
            high,
            low,
            ltp,
            pct_change,
            qty,
            turnover,
        }
    }
}

impl PriceRecord {
    pub fn into_cells(self) -> Vec<String> {
        vec![
            self.sn,
            self.date,
            self.open,
            self.high,
            self.low,
            self.ltp,
            self.pct_change,
            self.qty,
            self.turnover,
        ]
    }
}

/// Sort rows newest first and renumber `sn` from 1.
///
/// When two rows share a date the earlier one in `rows` is kept, so callers
/// put freshly fetched rows in front of stored ones.
pub fn normalize(rows: Vec<PriceRow>) -> Vec<PriceRow> {
    let mut rows = rows;
    // stable: equal dates keep their relative order before dedup
    rows.sort_by(|a, b| b.date.cmp(&a.date));
    rows.dedup_by(|later, earlier| later.date == earlier.date);
    for (i, row) in rows.iter_mut().enumerate() {
        row.sn = (i + 1) as u32;
    }
    rows
}

/// Latest trade date in a set of rows.
pub fn max_date(rows: &[PriceRow]) -> Option<NaiveDate> {
    rows.iter().map(|r| r.date).max()
}
