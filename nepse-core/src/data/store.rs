//! CSV stores for price files, the trading calendar and the sector listing.
//!
//! Layout under the data root:
//! - `Nepse_Data/{category}/{symbol}.csv` (a `/` in the symbol becomes `_`)
//! - `other_nepse_detail/trading_calendar.csv`
//! - `other_nepse_detail/only_public_holidays.csv`
//! - `other_nepse_detail/public_and_weekly_holidays.csv`
//! - `other_nepse_detail/listed_company.csv`
//!
//! Writes are atomic (write to .tmp, rename into place) and skipped when the
//! rendered table hashes the same as the file already on disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::listing::{file_safe_symbol, ListingError, SectorListing};
use super::source::FetchError;
use crate::domain::calendar::{CalendarRecord, TradingCalendar};
use crate::domain::price::{self, PriceRecord, PriceRow};
use crate::parse::{parse_price_row, ParseError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("listing file {path}: {source}")]
    Listing {
        path: PathBuf,
        #[source]
        source: ListingError,
    },

    #[error("unreadable row at line {line} of {path}: {source}")]
    Row {
        path: PathBuf,
        line: usize,
        #[source]
        source: ParseError,
    },

    #[error("failed to download {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: FetchError,
    },
}

impl StoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn csv(path: &Path, source: csv::Error) -> Self {
        StoreError::Csv {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Whether a write touched the disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Unchanged,
}

/// Write `bytes` to `path` unless the file already holds the same content.
pub fn write_if_changed(path: &Path, bytes: &[u8]) -> Result<WriteOutcome, StoreError> {
    if let Ok(existing) = fs::read(path) {
        if blake3::hash(&existing) == blake3::hash(bytes) {
            debug!(path = %path.display(), "content unchanged, skipping write");
            return Ok(WriteOutcome::Unchanged);
        }
    }
    write_atomic(path, bytes)?;
    Ok(WriteOutcome::Written)
}

/// Write to a sibling `.tmp` file and rename it into place.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, bytes).map_err(|e| StoreError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        StoreError::io(path, e)
    })
}

fn render_csv<T: Serialize>(path: &Path, records: &[T], headers: &[&str]) -> Result<Vec<u8>, StoreError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(!records.is_empty())
        .from_writer(Vec::new());
    // serde only emits a header alongside the first record
    if records.is_empty() {
        wtr.write_record(headers).map_err(|e| StoreError::csv(path, e))?;
    }
    for record in records {
        wtr.serialize(record).map_err(|e| StoreError::csv(path, e))?;
    }
    wtr.into_inner()
        .map_err(|e| StoreError::io(path, e.into_error()))
}

fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| StoreError::csv(path, e))?;
    rdr.deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|e| StoreError::csv(path, e))
}

/// Fetch `url` into `path` with `download` when `path` does not exist yet.
///
/// Returns true when a download happened.
pub fn ensure_local<F>(path: &Path, url: &str, download: F) -> Result<bool, StoreError>
where
    F: FnOnce(&str) -> Result<Vec<u8>, FetchError>,
{
    if path.exists() {
        return Ok(false);
    }
    info!(path = %path.display(), %url, "local file missing, downloading");
    let bytes = download(url).map_err(|source| StoreError::Download {
        url: url.to_string(),
        source,
    })?;
    write_atomic(path, &bytes)?;
    Ok(true)
}

/// Per-symbol price files under `{root}/{category}/`.
#[derive(Debug, Clone)]
pub struct PriceStore {
    root: PathBuf,
}

impl PriceStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn category_dir(&self, category: &str) -> PathBuf {
        self.root.join(category)
    }

    pub fn path_for(&self, category: &str, symbol: &str) -> PathBuf {
        self.category_dir(category)
            .join(format!("{}.csv", file_safe_symbol(symbol)))
    }

    /// Stored rows for a symbol, or `None` when it has no file yet.
    ///
    /// A stored row that does not parse is an error, so the file is never
    /// rewritten with rows missing. The result is sorted newest first and
    /// renumbered.
    pub fn load(&self, category: &str, symbol: &str) -> Result<Option<Vec<PriceRow>>, StoreError> {
        let path = self.path_for(category, symbol);
        if !path.exists() {
            return Ok(None);
        }
        let records: Vec<PriceRecord> = read_csv(&path)?;
        let mut rows = Vec::with_capacity(records.len());
        for (i, record) in records.into_iter().enumerate() {
            let row = parse_price_row(&record.into_cells()).map_err(|source| {
                warn!(path = %path.display(), line = i + 2, error = %source, "unreadable stored row");
                StoreError::Row {
                    path: path.clone(),
                    line: i + 2,
                    source,
                }
            })?;
            rows.push(row);
        }
        Ok(Some(price::normalize(rows)))
    }

    /// Write a symbol's full table. Rows are expected newest first with
    /// `sn` already assigned.
    pub fn save(&self, category: &str, symbol: &str, rows: &[PriceRow]) -> Result<WriteOutcome, StoreError> {
        let path = self.path_for(category, symbol);
        let records: Vec<PriceRecord> = rows.iter().map(PriceRow::to_record).collect();
        let bytes = render_csv(&path, &records, &crate::domain::PRICE_HEADERS)?;
        write_if_changed(&path, &bytes)
    }
}

/// Paths of the calendar file and its derived lists.
#[derive(Debug, Clone)]
pub struct CalendarStore {
    pub calendar: PathBuf,
    pub public_holidays: PathBuf,
    pub all_holidays: PathBuf,
}

/// Outcome of saving the calendar and both derived lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarWrite {
    pub calendar: WriteOutcome,
    pub public_holidays: WriteOutcome,
    pub all_holidays: WriteOutcome,
}

impl CalendarWrite {
    pub fn any_written(&self) -> bool {
        [self.calendar, self.public_holidays, self.all_holidays].contains(&WriteOutcome::Written)
    }
}

const CALENDAR_HEADERS: [&str; 3] = ["Date", "IsTradingDay", "HolidayName"];
const HOLIDAY_LIST_HEADERS: [&str; 2] = ["Date", "HolidayName"];

impl CalendarStore {
    /// Standard file names inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            calendar: dir.join("trading_calendar.csv"),
            public_holidays: dir.join("only_public_holidays.csv"),
            all_holidays: dir.join("public_and_weekly_holidays.csv"),
        }
    }

    pub fn load(&self) -> Result<TradingCalendar, StoreError> {
        let records: Vec<CalendarRecord> = read_csv(&self.calendar)?;
        Ok(TradingCalendar::from_records(records))
    }

    /// Rewrite the calendar (newest first) and regenerate both derived lists.
    pub fn save(&self, calendar: &TradingCalendar) -> Result<CalendarWrite, StoreError> {
        let records = calendar.to_records();
        let calendar_bytes = render_csv(&self.calendar, &records, &CALENDAR_HEADERS)?;
        let public = render_csv(&self.public_holidays, &calendar.public_holidays(), &HOLIDAY_LIST_HEADERS)?;
        let all = render_csv(&self.all_holidays, &calendar.non_trading_days(), &HOLIDAY_LIST_HEADERS)?;

        Ok(CalendarWrite {
            calendar: write_if_changed(&self.calendar, &calendar_bytes)?,
            public_holidays: write_if_changed(&self.public_holidays, &public)?,
            all_holidays: write_if_changed(&self.all_holidays, &all)?,
        })
    }

    pub fn paths(&self) -> [&Path; 3] {
        [&self.calendar, &self.public_holidays, &self.all_holidays]
    }
}

/// Load the sector listing file.
pub fn load_listing(path: &Path) -> Result<SectorListing, StoreError> {
    let file = fs::File::open(path).map_err(|e| StoreError::io(path, e))?;
    SectorListing::from_reader(file).map_err(|source| StoreError::Listing {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the sector listing file.
pub fn save_listing(path: &Path, listing: &SectorListing) -> Result<WriteOutcome, StoreError> {
    let mut bytes = Vec::new();
    listing.write_to(&mut bytes).map_err(|source| StoreError::Listing {
        path: path.to_path_buf(),
        source,
    })?;
    write_if_changed(path, &bytes)
}
