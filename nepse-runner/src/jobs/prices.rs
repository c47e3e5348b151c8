//! Incremental price update, one sector at a time.
//!
//! For every symbol in the listing: load the stored file, pull pages until
//! an already stored date shows up, merge and save. Each sector with new
//! rows gets its own commit naming the newest date added.

use chrono::NaiveDate;
use nepse_core::data::{PriceStore, Sector};
use nepse_core::merge::{update_symbol, MergeOutcome};
use tracing::{info, warn};

use super::{JobContext, JobError};
use crate::publish::{PublishOutcome, PublishRequest};

/// Per-sector result of a price run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectorResult {
    pub sector: String,
    /// Symbols whose file gained rows.
    pub updated: Vec<String>,
    pub failed: Vec<String>,
    pub latest: Option<NaiveDate>,
    pub published: Option<PublishOutcome>,
    /// Publish was attempted and failed.
    pub publish_error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceSummary {
    pub sectors: Vec<SectorResult>,
}

impl PriceSummary {
    pub fn symbols_updated(&self) -> usize {
        self.sectors.iter().map(|s| s.updated.len()).sum()
    }

    pub fn symbols_failed(&self) -> usize {
        self.sectors.iter().map(|s| s.failed.len()).sum()
    }
}

/// Commit message for a sector update.
pub fn sector_commit_message(sector: &str, latest: Option<NaiveDate>) -> String {
    let name = sector.replace('_', " ");
    match latest {
        Some(date) => format!("Updated {name} data up to {}", date.format("%Y-%m-%d")),
        None => format!("Updated {name} data"),
    }
}

/// Run the incremental update. An empty `only` means every sector.
pub fn run_prices(ctx: &JobContext<'_>, only: &[String]) -> Result<PriceSummary, JobError> {
    let listing = ctx.load_listing()?;
    for wanted in only {
        if listing.sector(wanted).is_none() {
            warn!(sector = %wanted, "sector not in listing, ignoring");
        }
    }

    let store = PriceStore::new(ctx.config.price_dir());
    let mut summary = PriceSummary::default();
    for sector in &listing.sectors {
        if !only.is_empty() && !only.contains(&sector.name) {
            continue;
        }
        summary.sectors.push(update_sector(ctx, &store, sector));
    }

    ctx.progress.on_job_complete(
        "prices",
        summary.symbols_updated(),
        summary.symbols_failed(),
    );
    Ok(summary)
}

fn update_sector(ctx: &JobContext<'_>, store: &PriceStore, sector: &Sector) -> SectorResult {
    info!(sector = %sector.name, symbols = sector.symbols.len(), "processing sector");
    let mut result = SectorResult {
        sector: sector.name.clone(),
        updated: Vec::new(),
        failed: Vec::new(),
        latest: None,
        published: None,
        publish_error: None,
    };

    let total = sector.symbols.len();
    for (i, symbol) in sector.symbols.iter().enumerate() {
        ctx.progress.on_start(symbol, i, total);
        match update_one(ctx, store, &sector.name, symbol) {
            Ok(outcome) if outcome.has_new_rows() => {
                let detail = format!("{} new rows", outcome.added);
                ctx.progress.on_complete(symbol, i, total, Ok(&detail));
                result.updated.push(symbol.clone());
                result.latest = result.latest.max(outcome.latest_added);
            }
            Ok(_) => ctx.progress.on_complete(symbol, i, total, Ok("up to date")),
            Err(e) => {
                ctx.progress.on_complete(symbol, i, total, Err(&e.to_string()));
                result.failed.push(symbol.clone());
            }
        }
    }

    if result.updated.is_empty() {
        info!(sector = %sector.name, "no updates for sector");
        return result;
    }

    let request = PublishRequest {
        paths: vec![store.category_dir(&sector.name)],
        message: sector_commit_message(&sector.name, result.latest),
        allow_empty: true,
    };
    match ctx.publish(request) {
        Ok(outcome) => result.published = outcome,
        Err(e) => {
            warn!(sector = %sector.name, error = %e, "publishing sector failed");
            result.publish_error = Some(e.to_string());
        }
    }
    result
}

fn update_one(
    ctx: &JobContext<'_>,
    store: &PriceStore,
    category: &str,
    symbol: &str,
) -> Result<MergeOutcome, JobError> {
    let stored = store.load(category, symbol)?;
    let mut source = ctx.sources.prices(symbol)?;
    let outcome = update_symbol(stored, &mut *source)?;
    if outcome.has_new_rows() {
        store.save(category, symbol, &outcome.rows)?;
        info!(
            %symbol,
            added = outcome.added,
            latest = ?outcome.latest_added,
            pages = outcome.pages,
            "saved new rows"
        );
    }
    Ok(outcome)
}
