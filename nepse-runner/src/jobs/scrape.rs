//! Full history scrape for explicitly named symbols.
//!
//! No stop date: every page is fetched and the symbol file is overwritten.
//! Nothing is committed.

use nepse_core::data::{ListingError, PriceStore};
use nepse_core::merge::scrape_full;
use tracing::{info, warn};

use super::{JobContext, JobError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeSummary {
    /// (symbol, category, rows written)
    pub scraped: Vec<(String, String, usize)>,
    /// Symbols not found in the listing.
    pub unknown: Vec<String>,
    pub failed: Vec<String>,
}

pub fn run_scrape(ctx: &JobContext<'_>, symbols: &[String]) -> Result<ScrapeSummary, JobError> {
    let listing = ctx.load_listing()?;
    let store = PriceStore::new(ctx.config.price_dir());
    let mut summary = ScrapeSummary::default();

    let total = symbols.len();
    for (i, raw) in symbols.iter().enumerate() {
        let symbol = raw.trim().to_uppercase();
        ctx.progress.on_start(&symbol, i, total);

        let category = match listing.category_of(&symbol) {
            Ok(category) => category.to_string(),
            Err(e @ ListingError::NotFound { .. }) => {
                warn!(%symbol, "symbol not in listing, skipping");
                ctx.progress.on_complete(&symbol, i, total, Err(&e.to_string()));
                summary.unknown.push(symbol);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        match scrape_one(ctx, &store, &category, &symbol) {
            Ok(rows) => {
                ctx.progress.on_complete(&symbol, i, total, Ok(&format!("{rows} rows")));
                summary.scraped.push((symbol, category, rows));
            }
            Err(e) => {
                ctx.progress.on_complete(&symbol, i, total, Err(&e.to_string()));
                summary.failed.push(symbol);
            }
        }
    }

    ctx.progress.on_job_complete(
        "scrape",
        summary.scraped.len(),
        summary.failed.len() + summary.unknown.len(),
    );
    Ok(summary)
}

fn scrape_one(ctx: &JobContext<'_>, store: &PriceStore, category: &str, symbol: &str) -> Result<usize, JobError> {
    let mut source = ctx.sources.prices(symbol)?;
    let outcome = scrape_full(&mut *source)?;
    if outcome.rows.is_empty() {
        return Err(JobError::Nothing(format!("no price rows found for {symbol}")));
    }
    store.save(category, symbol, &outcome.rows)?;
    info!(%symbol, %category, rows = outcome.rows.len(), pages = outcome.pages, "full history saved");
    Ok(outcome.rows.len())
}
