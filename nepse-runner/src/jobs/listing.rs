//! Sector listing refresh.
//!
//! Scrapes the company listing once per configured sector and rewrites the
//! listing file with one column per sector.

use std::collections::BTreeMap;

use nepse_core::data::{store, PageSource, SectorListing};
use nepse_core::FetchError;
use tracing::{info, warn};

use super::{JobContext, JobError};
use crate::publish::{PublishOutcome, PublishRequest};

pub const LISTING_COMMIT_MESSAGE: &str = "Updated listed company data";

/// Column of the company-listing table holding the symbol.
const SYMBOL_COLUMN: usize = 1;

#[derive(Debug, Clone)]
pub struct ListingSummary {
    pub listing: SectorListing,
    /// Site sector names whose scrape failed.
    pub failed: Vec<String>,
    pub published: Option<PublishOutcome>,
}

pub fn run_listing(ctx: &JobContext<'_>) -> Result<ListingSummary, JobError> {
    let mut scraped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut failed = Vec::new();

    let total = ctx.config.sectors.len();
    for (i, mapping) in ctx.config.sectors.iter().enumerate() {
        ctx.progress.on_start(&mapping.site_name, i, total);
        let symbols = ctx
            .sources
            .listing(&mapping.site_name)
            .and_then(|mut source| collect_symbols(&mut *source));
        match symbols {
            Ok(symbols) => {
                let detail = format!("{} symbols", symbols.len());
                ctx.progress.on_complete(&mapping.site_name, i, total, Ok(&detail));
                scraped
                    .entry(ctx.config.folder_for(&mapping.site_name))
                    .or_default()
                    .extend(symbols);
            }
            Err(e) => {
                warn!(sector = %mapping.site_name, error = %e, "sector listing failed, skipping");
                ctx.progress.on_complete(&mapping.site_name, i, total, Err(&e.to_string()));
                failed.push(mapping.site_name.clone());
            }
        }
    }

    let listing = SectorListing::from_scraped(scraped, &ctx.config.folder_order());
    if listing.sectors.is_empty() {
        return Err(JobError::Nothing("no sector yielded any symbols".into()));
    }
    ctx.progress.on_job_complete("listing", total - failed.len(), failed.len());

    let path = ctx.config.listing_path();
    store::save_listing(&path, &listing)?;
    info!(
        sectors = listing.sectors.len(),
        symbols = listing.symbol_count(),
        path = %path.display(),
        "listing saved"
    );

    let published = ctx.publish(PublishRequest {
        paths: vec![path],
        message: LISTING_COMMIT_MESSAGE.into(),
        allow_empty: true,
    })?;

    Ok(ListingSummary {
        listing,
        failed,
        published,
    })
}

/// Symbols from every page of one sector's listing.
fn collect_symbols(source: &mut dyn PageSource) -> Result<Vec<String>, FetchError> {
    let mut symbols = Vec::new();
    while let Some(page) = source.next_page()? {
        if page.is_empty() {
            break;
        }
        symbols.extend(
            page.iter()
                .filter_map(|row| row.get(SYMBOL_COLUMN))
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        );
    }
    Ok(symbols)
}
