//! Calendar reconciler: month-by-month gap filling and weekend correction.
//!
//! Rules for each date of a month:
//! - weekend day, no entry → insert non-trading "Weekend"
//! - weekend day, non-trading, blank or "Weekend" name → label "Weekend"
//! - weekend day, non-trading, public holiday name → untouched
//! - weekend day marked trading → corrected to non-trading "Weekend"
//! - weekday, no entry → insert trading with no name
//!
//! Existing weekday entries are never touched.

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::domain::calendar::{is_weekend, CalendarEntry, TradingCalendar, YearMonth, WEEKEND_LABEL};

/// What a reconciliation pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub weekends_added: usize,
    pub weekdays_added: usize,
    pub weekends_corrected: usize,
    pub weekends_existing: usize,
}

impl ReconcileReport {
    /// Number of entries inserted or rewritten.
    pub fn changes(&self) -> usize {
        self.weekends_added + self.weekdays_added + self.weekends_corrected
    }

    pub fn is_noop(&self) -> bool {
        self.changes() == 0
    }

    fn absorb(&mut self, other: ReconcileReport) {
        self.weekends_added += other.weekends_added;
        self.weekdays_added += other.weekdays_added;
        self.weekends_corrected += other.weekends_corrected;
        self.weekends_existing += other.weekends_existing;
    }
}

impl std::ops::Add for ReconcileReport {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self.absorb(rhs);
        self
    }
}

impl std::ops::AddAssign for ReconcileReport {
    fn add_assign(&mut self, rhs: Self) {
        self.absorb(rhs);
    }
}

/// Reconcile every date of `month` in `calendar`.
pub fn reconcile_month(calendar: &mut TradingCalendar, month: YearMonth) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    for date in month.days() {
        if is_weekend(date) {
            reconcile_weekend_day(calendar, date, &mut report);
        } else if calendar.get(date).is_none() {
            calendar.insert(date, CalendarEntry::trading());
            report.weekdays_added += 1;
        }
    }

    if !report.is_noop() {
        info!(
            %month,
            weekends_added = report.weekends_added,
            weekdays_added = report.weekdays_added,
            weekends_corrected = report.weekends_corrected,
            "reconciled month"
        );
    }
    report
}

fn reconcile_weekend_day(calendar: &mut TradingCalendar, date: NaiveDate, report: &mut ReconcileReport) {
    let Some(entry) = calendar.get_mut(date) else {
        calendar.insert(date, CalendarEntry::weekend());
        report.weekends_added += 1;
        return;
    };

    if entry.is_trading_day {
        *entry = CalendarEntry::weekend();
        report.weekends_corrected += 1;
        debug!(%date, "corrected trading weekend day");
        return;
    }

    match entry.holiday_name.as_deref() {
        Some(WEEKEND_LABEL) => report.weekends_existing += 1,
        None | Some("") => {
            entry.holiday_name = Some(WEEKEND_LABEL.to_string());
            report.weekends_corrected += 1;
            debug!(%date, "labelled unnamed weekend day");
        }
        // public holiday on a weekend keeps its name
        Some(_) => report.weekends_existing += 1,
    }
}

/// Months from `from` through `to`, both inclusive.
pub fn month_range(from: YearMonth, to: YearMonth) -> impl Iterator<Item = YearMonth> {
    std::iter::successors(Some(from), move |m| {
        let next = m.next();
        (next <= to).then_some(next)
    })
    .take_while(move |m| *m <= to)
}

/// Reconcile every month from the calendar's earliest month through the
/// month containing `today`. An empty calendar gets only the current month.
pub fn fill_through(calendar: &mut TradingCalendar, today: NaiveDate) -> ReconcileReport {
    let last = YearMonth::of(today);
    let first = calendar.min_date().map(YearMonth::of).unwrap_or(last);

    let mut total = ReconcileReport::default();
    for month in month_range(first, last) {
        total += reconcile_month(calendar, month);
    }
    info!(
        from = %first,
        to = %last,
        weekends_added = total.weekends_added,
        weekdays_added = total.weekdays_added,
        weekends_corrected = total.weekends_corrected,
        "calendar fill complete"
    );
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Weekday};

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn ym(y: i32, m: u32) -> YearMonth {
        YearMonth::new(y, m).unwrap()
    }

    #[test]
    fn missing_month_is_synthesized() {
        let mut cal = TradingCalendar::new();
        let report = reconcile_month(&mut cal, ym(2025, 12));

        assert_eq!(cal.len(), 31);
        // December 2025: Fridays 5,12,19,26 and Saturdays 6,13,20,27
        assert_eq!(report.weekends_added, 8);
        assert_eq!(report.weekdays_added, 23);
        for (date, entry) in cal.iter() {
            if matches!(date.weekday(), Weekday::Fri | Weekday::Sat) {
                assert_eq!(entry, &CalendarEntry::weekend(), "{date}");
            } else {
                assert_eq!(entry, &CalendarEntry::trading(), "{date}");
            }
        }
    }

    #[test]
    fn second_pass_is_a_noop() {
        let mut cal = TradingCalendar::new();
        reconcile_month(&mut cal, ym(2025, 12));
        let snapshot = cal.clone();
        let again = reconcile_month(&mut cal, ym(2025, 12));
        assert!(again.is_noop());
        assert_eq!(again.weekends_existing, 8);
        assert_eq!(cal, snapshot);
    }

    #[test]
    fn public_holiday_on_weekend_is_preserved() {
        let mut cal = TradingCalendar::new();
        cal.insert(d("2025-12-06"), CalendarEntry::holiday("Constitution Day"));
        reconcile_month(&mut cal, ym(2025, 12));
        assert_eq!(
            cal.get(d("2025-12-06")),
            Some(&CalendarEntry::holiday("Constitution Day"))
        );
    }

    #[test]
    fn trading_weekend_day_is_corrected() {
        let mut cal = TradingCalendar::new();
        cal.insert(d("2025-12-05"), CalendarEntry::trading());
        let report = reconcile_month(&mut cal, ym(2025, 12));
        assert_eq!(report.weekends_corrected, 1);
        assert_eq!(cal.get(d("2025-12-05")), Some(&CalendarEntry::weekend()));
    }

    #[test]
    fn unnamed_non_trading_weekend_gets_label() {
        let mut cal = TradingCalendar::new();
        cal.insert(
            d("2025-12-13"),
            CalendarEntry {
                is_trading_day: false,
                holiday_name: None,
            },
        );
        let report = reconcile_month(&mut cal, ym(2025, 12));
        assert_eq!(report.weekends_corrected, 1);
        assert!(cal.get(d("2025-12-13")).unwrap().is_weekend_label());
    }

    #[test]
    fn existing_weekday_holiday_is_left_alone() {
        let mut cal = TradingCalendar::new();
        cal.insert(d("2025-12-25"), CalendarEntry::holiday("Christmas Day"));
        reconcile_month(&mut cal, ym(2025, 12));
        assert_eq!(
            cal.get(d("2025-12-25")),
            Some(&CalendarEntry::holiday("Christmas Day"))
        );
    }

    #[test]
    fn month_range_is_inclusive_and_crosses_years() {
        let months: Vec<YearMonth> = month_range(ym(2025, 11), ym(2026, 2)).collect();
        assert_eq!(months, [ym(2025, 11), ym(2025, 12), ym(2026, 1), ym(2026, 2)]);
        assert_eq!(month_range(ym(2026, 3), ym(2026, 2)).count(), 0);
    }

    #[test]
    fn fill_through_covers_gap_months() {
        let mut cal = TradingCalendar::new();
        cal.insert(d("2025-09-01"), CalendarEntry::trading());
        fill_through(&mut cal, d("2025-12-15"));
        assert_eq!(cal.min_date(), Some(d("2025-09-01")));
        assert_eq!(cal.max_date(), Some(d("2025-12-31")));
        // Sep (30) + Oct (31) + Nov (30) + Dec (31)
        assert_eq!(cal.len(), 122);
    }

    #[test]
    fn fill_through_on_empty_calendar_fills_current_month() {
        let mut cal = TradingCalendar::new();
        fill_through(&mut cal, d("2026-02-10"));
        assert_eq!(cal.len(), 28);
    }
}
