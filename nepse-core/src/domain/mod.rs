//! Domain types for the NEPSE dataset

pub mod calendar;
pub mod holiday;
pub mod price;

pub use calendar::{
    is_weekend, CalendarEntry, CalendarRecord, HolidayListRecord, TradingCalendar, YearMonth,
    WEEKEND_DAYS, WEEKEND_LABEL,
};
pub use holiday::HolidayRecord;
pub use price::{PriceRecord, PriceRow, PRICE_HEADERS};
