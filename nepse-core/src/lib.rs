//! NEPSE Core: domain types, row parsing, incremental merge, calendar
//! reconciliation and CSV stores.
//!
//! This crate holds everything that does not touch version control:
//! - Domain types (price rows, calendar entries, holiday records)
//! - Page sources: the lazy paginated row sequence and its HTTP implementation
//! - Incremental per-symbol merge with stop-at-seen-date
//! - Month-by-month calendar reconciliation and holiday merge
//! - Sector listing lookup and CSV persistence

pub mod data;
pub mod domain;
pub mod holidays;
pub mod merge;
pub mod parse;
pub mod reconcile;

pub use data::{FetchError, PageSource, RawRow, SectorListing, StoreError};
pub use domain::{CalendarEntry, HolidayRecord, PriceRow, TradingCalendar, YearMonth};
pub use merge::{update_symbol, MergeOutcome};
pub use reconcile::{fill_through, reconcile_month, ReconcileReport};
