//! Trading calendar: one entry per calendar date.

use chrono::{Datelike, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Label stored on plain weekend days.
pub const WEEKEND_LABEL: &str = "Weekend";

/// The exchange's weekly non-trading days.
pub const WEEKEND_DAYS: [Weekday; 2] = [Weekday::Fri, Weekday::Sat];

pub fn is_weekend(date: NaiveDate) -> bool {
    WEEKEND_DAYS.contains(&date.weekday())
}

/// Classification of a single date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEntry {
    pub is_trading_day: bool,
    /// `None` on ordinary trading days.
    pub holiday_name: Option<String>,
}

impl CalendarEntry {
    pub fn trading() -> Self {
        Self {
            is_trading_day: true,
            holiday_name: None,
        }
    }

    pub fn weekend() -> Self {
        Self {
            is_trading_day: false,
            holiday_name: Some(WEEKEND_LABEL.to_string()),
        }
    }

    pub fn holiday(name: impl Into<String>) -> Self {
        Self {
            is_trading_day: false,
            holiday_name: Some(name.into()),
        }
    }

    /// Name as stored in the file: empty when there is none.
    pub fn name_or_empty(&self) -> &str {
        self.holiday_name.as_deref().unwrap_or("")
    }

    pub fn is_weekend_label(&self) -> bool {
        self.holiday_name.as_deref() == Some(WEEKEND_LABEL)
    }

    /// A non-trading day carrying a real holiday name.
    pub fn is_public_holiday(&self) -> bool {
        !self.is_trading_day && !self.name_or_empty().is_empty() && !self.is_weekend_label()
    }
}

/// A calendar month, used as the unit of reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        // year/month validated at construction
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn next(&self) -> Self {
        let next = self.first_day() + Months::new(1);
        Self::of(next)
    }

    /// Every date of the month in ascending order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let month = *self;
        self.first_day()
            .iter_days()
            .take_while(move |d| d.month() == month.month && d.year() == month.year)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.first_day().format("%B %Y"))
    }
}

/// Date-indexed trading calendar.
///
/// Keyed by date, so a date can never hold two entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TradingCalendar {
    entries: BTreeMap<NaiveDate, CalendarEntry>,
}

impl TradingCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&CalendarEntry> {
        self.entries.get(&date)
    }

    pub fn get_mut(&mut self, date: NaiveDate) -> Option<&mut CalendarEntry> {
        self.entries.get_mut(&date)
    }

    /// Insert or replace the entry for `date`, returning the previous one.
    pub fn insert(&mut self, date: NaiveDate, entry: CalendarEntry) -> Option<CalendarEntry> {
        self.entries.insert(date, entry)
    }

    pub fn min_date(&self) -> Option<NaiveDate> {
        self.entries.keys().next().copied()
    }

    pub fn max_date(&self) -> Option<NaiveDate> {
        self.entries.keys().next_back().copied()
    }

    /// Entries in ascending date order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (NaiveDate, &CalendarEntry)> {
        self.entries.iter().map(|(d, e)| (*d, e))
    }

    /// Entries in one month, ascending.
    pub fn month(&self, month: YearMonth) -> impl Iterator<Item = (NaiveDate, &CalendarEntry)> {
        let start = month.first_day();
        let end = month.next().first_day();
        self.entries.range(start..end).map(|(d, e)| (*d, e))
    }

    /// True when at least one date in `month` carries the weekend label.
    pub fn has_weekend_rows(&self, month: YearMonth) -> bool {
        self.month(month).any(|(_, e)| e.is_weekend_label())
    }

    /// Every (date, name) pair currently stored, formatted the way the
    /// holiday listing prints dates.
    pub fn known_pairs(&self) -> impl Iterator<Item = (String, String)> + '_ {
        self.iter()
            .map(|(d, e)| (d.format("%Y-%m-%d").to_string(), e.name_or_empty().to_string()))
    }

    /// Non-trading days with a real holiday name, newest first.
    pub fn public_holidays(&self) -> Vec<HolidayListRecord> {
        self.iter()
            .rev()
            .filter(|(_, e)| !e.is_trading_day && !e.is_weekend_label())
            .map(|(d, e)| HolidayListRecord::new(d, e))
            .collect()
    }

    /// Every non-trading day, weekends included, newest first.
    pub fn non_trading_days(&self) -> Vec<HolidayListRecord> {
        self.iter()
            .rev()
            .filter(|(_, e)| !e.is_trading_day)
            .map(|(d, e)| HolidayListRecord::new(d, e))
            .collect()
    }

    /// The whole calendar as file records, newest first.
    pub fn to_records(&self) -> Vec<CalendarRecord> {
        self.iter()
            .rev()
            .map(|(date, e)| CalendarRecord {
                date,
                is_trading_day: e.is_trading_day,
                holiday_name: e.name_or_empty().to_string(),
            })
            .collect()
    }

    /// Build a calendar from file records. A later record for an already
    /// seen date replaces the earlier one.
    pub fn from_records(records: impl IntoIterator<Item = CalendarRecord>) -> Self {
        let mut calendar = Self::new();
        for r in records {
            let name = r.holiday_name.trim();
            let holiday_name = if name.is_empty() || name.eq_ignore_ascii_case("nan") {
                None
            } else {
                Some(name.to_string())
            };
            calendar.insert(
                r.date,
                CalendarEntry {
                    is_trading_day: r.is_trading_day,
                    holiday_name,
                },
            );
        }
        calendar
    }
}

/// Row of the trading calendar file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarRecord {
    #[serde(rename = "Date", with = "date_cell")]
    pub date: NaiveDate,
    #[serde(rename = "IsTradingDay", with = "bool_cell")]
    pub is_trading_day: bool,
    #[serde(rename = "HolidayName", default)]
    pub holiday_name: String,
}

/// Row of the derived holiday lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayListRecord {
    #[serde(rename = "Date", with = "date_cell")]
    pub date: NaiveDate,
    #[serde(rename = "HolidayName", default)]
    pub holiday_name: String,
}

impl HolidayListRecord {
    fn new(date: NaiveDate, entry: &CalendarEntry) -> Self {
        Self {
            date,
            holiday_name: entry.name_or_empty().to_string(),
        }
    }
}

/// Dates are written `YYYY-MM-DD`; a trailing time part is tolerated on read.
mod date_cell {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&date.format("%Y-%m-%d"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        let day = raw.trim().split([' ', 'T']).next().unwrap_or("");
        NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(de::Error::custom)
    }
}

/// Booleans are written `True`/`False`; reading accepts any case and 0/1.
mod bool_cell {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(if *value { "True" } else { "False" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        let raw = String::deserialize(d)?;
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            other => Err(de::Error::custom(format!("invalid boolean '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn friday_and_saturday_are_weekend() {
        assert!(is_weekend(d("2025-12-05"))); // Friday
        assert!(is_weekend(d("2025-12-06"))); // Saturday
        assert!(!is_weekend(d("2025-12-07"))); // Sunday
    }

    #[test]
    fn year_month_days_cover_whole_month() {
        let feb = YearMonth::new(2024, 2).unwrap();
        assert_eq!(feb.days().count(), 29);
        let dec = YearMonth::new(2025, 12).unwrap();
        assert_eq!(dec.days().last(), Some(d("2025-12-31")));
        assert_eq!(dec.next(), YearMonth::new(2026, 1).unwrap());
    }

    #[test]
    fn year_month_rejects_invalid_month() {
        assert!(YearMonth::new(2025, 13).is_none());
        assert!(YearMonth::new(2025, 0).is_none());
    }

    #[test]
    fn year_month_accessors_match_construction() {
        let ym = YearMonth::of(d("2025-12-25"));
        assert_eq!((ym.year(), ym.month()), (2025, 12));
        assert_eq!(ym.first_day(), d("2025-12-01"));
        assert_eq!(ym, YearMonth::new(2025, 12).unwrap());
    }

    #[test]
    fn derived_views_filter_and_sort_descending() {
        let mut cal = TradingCalendar::new();
        cal.insert(d("2025-12-24"), CalendarEntry::trading());
        cal.insert(d("2025-12-25"), CalendarEntry::holiday("Christmas"));
        cal.insert(d("2025-12-26"), CalendarEntry::weekend());
        cal.insert(d("2025-12-20"), CalendarEntry::holiday("Festival"));

        let public: Vec<NaiveDate> = cal.public_holidays().iter().map(|r| r.date).collect();
        assert_eq!(public, [d("2025-12-25"), d("2025-12-20")]);

        let all: Vec<NaiveDate> = cal.non_trading_days().iter().map(|r| r.date).collect();
        assert_eq!(all, [d("2025-12-26"), d("2025-12-25"), d("2025-12-20")]);
    }

    #[test]
    fn records_roundtrip_normalizes_empty_names() {
        let records = vec![
            CalendarRecord {
                date: d("2025-01-02"),
                is_trading_day: true,
                holiday_name: "".into(),
            },
            CalendarRecord {
                date: d("2025-01-03"),
                is_trading_day: false,
                holiday_name: "Weekend".into(),
            },
        ];
        let cal = TradingCalendar::from_records(records);
        assert_eq!(cal.get(d("2025-01-02")).unwrap().holiday_name, None);
        let back = cal.to_records();
        assert_eq!(back[0].date, d("2025-01-03"));
        assert_eq!(back[1].holiday_name, "");
    }

    #[test]
    fn weekend_rows_detected_per_month() {
        let mut cal = TradingCalendar::new();
        cal.insert(d("2025-11-07"), CalendarEntry::weekend());
        assert!(cal.has_weekend_rows(YearMonth::new(2025, 11).unwrap()));
        assert!(!cal.has_weekend_rows(YearMonth::new(2025, 12).unwrap()));
    }
}
