//! Row parser: raw cell text to typed records.
//!
//! Cells arrive exactly as the page renders them: thousands separators,
//! surrounding whitespace and the occasional placeholder dash.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::{HolidayRecord, PriceRow};

/// Number of cells in a price-history row.
pub const PRICE_CELLS: usize = 9;

/// Number of cells in a holiday-listing row (index, date, description).
pub const HOLIDAY_CELLS: usize = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected {expected} cells, found {found}")]
    CellCount { expected: usize, found: usize },

    #[error("unparsable date '{0}'")]
    Date(String),

    #[error("unparsable number '{value}' in column {column}")]
    Number { column: &'static str, value: String },

    #[error("empty holiday description")]
    EmptyDescription,
}

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y"];

/// Parse a date cell. Accepts a trailing time part (`2024-01-10 00:00:00`).
pub fn parse_date(raw: &str) -> Result<NaiveDate, ParseError> {
    let day = raw.trim().split([' ', 'T']).next().unwrap_or("");
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(day, fmt).ok())
        .ok_or_else(|| ParseError::Date(raw.trim().to_string()))
}

/// Parse a numeric cell, dropping thousands separators and a trailing `%`.
pub fn parse_decimal(column: &'static str, raw: &str) -> Result<Decimal, ParseError> {
    let cleaned: String = raw
        .trim()
        .trim_end_matches('%')
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    Decimal::from_str(&cleaned).map_err(|_| ParseError::Number {
        column,
        value: raw.trim().to_string(),
    })
}

/// Cells the site prints when a value is not available.
const PLACEHOLDERS: [&str; 5] = ["", "-", "--", "n/a", "nan"];

/// Parse a numeric price cell. A placeholder gives `None`; anything else
/// must be a number.
pub fn parse_price_cell(column: &'static str, raw: &str) -> Result<Option<Decimal>, ParseError> {
    let trimmed = raw.trim();
    if PLACEHOLDERS.iter().any(|p| trimmed.eq_ignore_ascii_case(p)) {
        return Ok(None);
    }
    parse_decimal(column, trimmed).map(Some)
}

/// Parse one price-history row. The sequence cell is ignored; rows are
/// renumbered after merging.
pub fn parse_price_row(cells: &[String]) -> Result<PriceRow, ParseError> {
    if cells.len() < PRICE_CELLS {
        return Err(ParseError::CellCount {
            expected: PRICE_CELLS,
            found: cells.len(),
        });
    }
    Ok(PriceRow {
        sn: 0,
        date: parse_date(&cells[1])?,
        open: parse_price_cell("Open", &cells[2])?,
        high: parse_price_cell("High", &cells[3])?,
        low: parse_price_cell("Low", &cells[4])?,
        ltp: parse_price_cell("Ltp", &cells[5])?,
        pct_change: parse_price_cell("% Change", &cells[6])?,
        qty: parse_price_cell("Qty", &cells[7])?,
        turnover: parse_price_cell("Turnover", &cells[8])?,
    })
}

/// Parse one holiday-listing row: `[index, date, description]`.
pub fn parse_holiday_row(cells: &[String]) -> Result<HolidayRecord, ParseError> {
    if cells.len() != HOLIDAY_CELLS {
        return Err(ParseError::CellCount {
            expected: HOLIDAY_CELLS,
            found: cells.len(),
        });
    }
    let description = cells[2].trim();
    if description.is_empty() {
        return Err(ParseError::EmptyDescription);
    }
    Ok(HolidayRecord::new(parse_date(&cells[1])?, description))
}
