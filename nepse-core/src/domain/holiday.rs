//! HolidayRecord: a public holiday as published on the holiday listing.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HolidayRecord {
    pub date: NaiveDate,
    pub description: String,
}

impl HolidayRecord {
    pub fn new(date: NaiveDate, description: impl Into<String>) -> Self {
        Self {
            date,
            description: description.into(),
        }
    }

    /// Identity used for deduplication against the stored calendar.
    pub fn key(&self) -> (String, String) {
        (
            self.date.format("%Y-%m-%d").to_string(),
            self.description.clone(),
        )
    }
}
