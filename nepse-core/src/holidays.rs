//! Holiday discovery and merge into the trading calendar.
//!
//! Discovery walks the holiday listing year by year, newest year first, and
//! keeps only (date, description) pairs the calendar does not already hold.
//! Merging makes sure the holiday's month exists with weekend rows before
//! the holiday itself is written, so a holiday announced for a month the
//! calendar has not reached yet still lands in a complete month.

use std::collections::{BTreeSet, HashSet};

use tracing::{info, warn};

use crate::data::source::{FetchError, PageSource};
use crate::domain::calendar::{CalendarEntry, TradingCalendar, YearMonth};
use crate::domain::HolidayRecord;
use crate::parse::parse_holiday_row;
use crate::reconcile::{month_range, reconcile_month, ReconcileReport};

/// (date `YYYY-MM-DD`, description) pairs already known.
pub type SeenPairs = HashSet<(String, String)>;

/// Pairs present in the calendar, for deduplicating scraped records.
pub fn seen_pairs(calendar: &TradingCalendar) -> SeenPairs {
    calendar.known_pairs().collect()
}

/// Years to scrape: from `latest` down to `earliest`, both inclusive.
pub fn years_to_scrape(latest: i32, earliest: i32) -> Vec<i32> {
    (earliest..=latest).rev().collect()
}

/// Outcome of scraping one year of the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearScrape {
    pub year: i32,
    pub pages: usize,
    pub new_records: usize,
    /// The year could not be opened or a page failed midway.
    pub failed: bool,
}

/// Everything discovery produced.
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub records: Vec<HolidayRecord>,
    pub years: Vec<YearScrape>,
}

/// Scrape the holiday listing for `years` (newest first) and return records
/// not already in `seen`. `seen` is extended as records are found.
///
/// The first year is always followed by the second. From then on a year
/// that yields nothing new ends the walk, since older years were covered by
/// earlier runs. A year that cannot be opened, or whose first page fails
/// to load, is skipped without ending the walk.
pub fn discover_holidays<S, F>(years: &[i32], seen: &mut SeenPairs, mut open_year: F) -> Discovery
where
    S: PageSource,
    F: FnMut(i32) -> Result<S, FetchError>,
{
    let mut discovery = Discovery::default();

    for (idx, &year) in years.iter().enumerate() {
        let mut source = match open_year(year) {
            Ok(source) => source,
            Err(e) => {
                warn!(year, error = %e, "failed to open holiday listing, skipping year");
                discovery.years.push(YearScrape {
                    year,
                    pages: 0,
                    new_records: 0,
                    failed: true,
                });
                continue;
            }
        };

        let (found, pages, failed) = scrape_year(&mut source, year, seen);
        let new_records = found.len();
        discovery.records.extend(found);
        discovery.years.push(YearScrape {
            year,
            pages,
            new_records,
            failed,
        });

        // first page never loaded
        if failed && pages == 0 {
            warn!(year, "holiday listing unreadable, skipping year");
            continue;
        }
        if idx > 0 && new_records == 0 {
            info!(year, "no new holidays, stopping walk");
            break;
        }
    }

    discovery
}

fn scrape_year<S: PageSource>(
    source: &mut S,
    year: i32,
    seen: &mut SeenPairs,
) -> (Vec<HolidayRecord>, usize, bool) {
    let mut found = Vec::new();
    let mut pages = 0;

    loop {
        let page = match source.next_page() {
            Ok(Some(page)) if !page.is_empty() => page,
            Ok(_) => break,
            Err(e) => {
                warn!(year, page = pages + 1, error = %e, "holiday page failed, stopping year");
                return (found, pages, true);
            }
        };
        pages += 1;

        let before = found.len();
        for cells in &page {
            let Ok(record) = parse_holiday_row(cells) else {
                continue;
            };
            if seen.insert(record.key()) {
                found.push(record);
            }
        }
        info!(year, page = pages, new = found.len() - before, "scraped holiday page");
    }

    (found, pages, false)
}

/// What merging new holidays changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Reconciliation done to make room for the holidays.
    pub reconciled: ReconcileReport,
    /// Months that had to be (re)reconciled.
    pub months_prepared: Vec<YearMonth>,
    /// Existing entries turned into holidays.
    pub updated: usize,
    /// Entries created for holidays.
    pub inserted: usize,
}

/// Fold newly discovered holidays into the calendar.
///
/// For every month that holds a new holiday: if the month lies beyond the
/// calendar's last date, every month up to it is reconciled first; if it is
/// inside the calendar but has no weekend rows, it is reconciled again. Then
/// each holiday's date is forced non-trading with the holiday description,
/// replacing a plain "Weekend" label.
pub fn merge_holidays(calendar: &mut TradingCalendar, records: &[HolidayRecord]) -> MergeReport {
    let mut report = MergeReport::default();

    let months: BTreeSet<YearMonth> = records.iter().map(|r| YearMonth::of(r.date)).collect();
    for month in months {
        match calendar.max_date() {
            Some(max) if month.first_day() <= max => {
                if !calendar.has_weekend_rows(month) {
                    info!(%month, "month is missing weekend rows, reconciling");
                    report.reconciled += reconcile_month(calendar, month);
                    report.months_prepared.push(month);
                }
            }
            max => {
                let from = max.map(|m| YearMonth::of(m).next()).unwrap_or(month);
                for gap in month_range(from, month) {
                    info!(month = %gap, "extending calendar for new holidays");
                    report.reconciled += reconcile_month(calendar, gap);
                    report.months_prepared.push(gap);
                }
            }
        }
    }

    for record in records {
        match calendar.get_mut(record.date) {
            Some(entry) => {
                *entry = CalendarEntry::holiday(record.description.clone());
                report.updated += 1;
            }
            None => {
                calendar.insert(record.date, CalendarEntry::holiday(record.description.clone()));
                report.inserted += 1;
            }
        }
        info!(date = %record.date, description = %record.description, "merged holiday");
    }

    report
}
