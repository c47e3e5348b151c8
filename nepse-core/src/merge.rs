//! Incremental merge engine for per-symbol price history.
//!
//! Pages arrive newest first. Collection stops at the first row whose date
//! is not strictly newer than the newest stored date, so an up-to-date
//! symbol costs one page fetch. New rows go in front of stored rows, then
//! the whole set is re-sorted descending and renumbered from 1.

use chrono::NaiveDate;
use tracing::debug;

use crate::data::source::{FetchError, PageSource};
use crate::domain::price::{self, PriceRow};
use crate::parse::parse_price_row;

/// Rows gathered from a page source before merging.
#[derive(Debug, Clone, Default)]
pub struct Collected {
    pub rows: Vec<PriceRow>,
    /// Pages requested, including the one that triggered the stop.
    pub pages: usize,
    /// True when collection ended on an already stored date rather than
    /// on the end of the listing.
    pub reached_stored: bool,
    /// Rows dropped because they did not parse.
    pub skipped: usize,
}

/// Pull rows from `source` until a row dated at or before `stop_at` shows up
/// or the listing runs out. With no `stop_at` every row is kept.
///
/// An empty page counts as the end of the listing.
pub fn collect_new_rows<S: PageSource + ?Sized>(
    source: &mut S,
    stop_at: Option<NaiveDate>,
) -> Result<Collected, FetchError> {
    let mut out = Collected::default();

    'pages: while let Some(page) = source.next_page()? {
        out.pages += 1;
        if page.is_empty() {
            break;
        }
        for cells in &page {
            let row = match parse_price_row(cells) {
                Ok(row) => row,
                Err(e) => {
                    debug!(source = source.name(), page = out.pages, error = %e, "skipping row");
                    out.skipped += 1;
                    continue;
                }
            };
            if stop_at.is_some_and(|stop| row.date <= stop) {
                out.reached_stored = true;
                break 'pages;
            }
            out.rows.push(row);
        }
    }

    Ok(out)
}

/// Put `fresh` rows in front of `stored`, sort newest first, drop duplicate
/// dates (fresh wins) and renumber.
pub fn merge_rows(fresh: Vec<PriceRow>, stored: Vec<PriceRow>) -> Vec<PriceRow> {
    let mut all = fresh;
    all.extend(stored);
    price::normalize(all)
}

/// Result of an incremental update for one symbol.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// Full merged table, newest first, renumbered.
    pub rows: Vec<PriceRow>,
    /// Number of rows that were not stored before.
    pub added: usize,
    /// Newest date among the added rows.
    pub latest_added: Option<NaiveDate>,
    /// Stored maximum date that acted as the stop date.
    pub stop_date: Option<NaiveDate>,
    pub pages: usize,
}

impl MergeOutcome {
    pub fn has_new_rows(&self) -> bool {
        self.added > 0
    }
}

/// Incrementally update one symbol's history.
///
/// `stored` is `None` when the symbol has no file yet; then no stop date
/// applies and everything the source yields is kept.
pub fn update_symbol<S: PageSource + ?Sized>(
    stored: Option<Vec<PriceRow>>,
    source: &mut S,
) -> Result<MergeOutcome, FetchError> {
    let stored = stored.unwrap_or_default();
    let stop_date = price::max_date(&stored);
    let collected = collect_new_rows(source, stop_date)?;

    let fresh = price::normalize(collected.rows);
    let added = fresh.len();
    let latest_added = price::max_date(&fresh);
    let rows = if added == 0 {
        stored
    } else {
        merge_rows(fresh, stored)
    };

    Ok(MergeOutcome {
        rows,
        added,
        latest_added,
        stop_date,
        pages: collected.pages,
    })
}

/// Full rebuild: ignore anything stored and keep every fetched row.
pub fn scrape_full<S: PageSource + ?Sized>(source: &mut S) -> Result<MergeOutcome, FetchError> {
    update_symbol(None, source)
}
