//! Trading calendar refresh.
//!
//! Fill every month through today with weekend and weekday rows, discover
//! new public holidays year by year, fold them in, rewrite the calendar and
//! both derived lists, and publish. Unlike the price job, nothing is
//! committed when the files did not change.

use chrono::{Datelike, NaiveDate};
use nepse_core::data::store::CalendarWrite;
use nepse_core::holidays::{discover_holidays, merge_holidays, seen_pairs, years_to_scrape, MergeReport, YearScrape};
use nepse_core::reconcile::{fill_through, ReconcileReport};
use nepse_core::HolidayRecord;
use tracing::info;

use super::{JobContext, JobError};
use crate::publish::{PublishOutcome, PublishRequest};

pub const CALENDAR_COMMIT_MESSAGE: &str = "Updated holiday lists";

#[derive(Debug, Clone)]
pub struct HolidaySummary {
    pub filled: ReconcileReport,
    pub years: Vec<YearScrape>,
    pub new_holidays: Vec<HolidayRecord>,
    pub merge: MergeReport,
    pub written: CalendarWrite,
    pub published: Option<PublishOutcome>,
}

pub fn run_holidays(ctx: &JobContext<'_>, today: NaiveDate) -> Result<HolidaySummary, JobError> {
    let store = ctx.config.calendar_store();
    ctx.bootstrap(&store.calendar, &ctx.config.remote.calendar_url)?;
    let mut calendar = store.load()?;
    info!(entries = calendar.len(), "loaded trading calendar");

    let filled = fill_through(&mut calendar, today);

    let latest_year = calendar.max_date().map(|d| d.year()).unwrap_or(today.year());
    let years = years_to_scrape(latest_year, ctx.config.holidays.earliest_year);
    let mut seen = seen_pairs(&calendar);
    let discovery = discover_holidays(&years, &mut seen, |year| ctx.sources.holidays(year));

    let total = discovery.years.len();
    for (i, year) in discovery.years.iter().enumerate() {
        let unit = year.year.to_string();
        ctx.progress.on_start(&unit, i, total);
        if year.failed {
            ctx.progress.on_complete(&unit, i, total, Err("listing could not be read"));
        } else {
            let detail = format!("{} new holidays over {} pages", year.new_records, year.pages);
            ctx.progress.on_complete(&unit, i, total, Ok(&detail));
        }
    }
    info!(new = discovery.records.len(), "holiday discovery complete");

    let merge = merge_holidays(&mut calendar, &discovery.records);
    let written = store.save(&calendar)?;
    info!(
        entries = calendar.len(),
        public_holidays = calendar.public_holidays().len(),
        changed = written.any_written(),
        "calendar saved"
    );

    let published = ctx.publish(PublishRequest {
        paths: store.paths().iter().map(|p| p.to_path_buf()).collect(),
        message: CALENDAR_COMMIT_MESSAGE.into(),
        allow_empty: false,
    })?;

    let failed = discovery.years.iter().filter(|y| y.failed).count();
    ctx.progress.on_job_complete("holidays", total - failed, failed);

    Ok(HolidaySummary {
        filled,
        years: discovery.years,
        new_holidays: discovery.records,
        merge,
        written,
        published,
    })
}
