//! Refresh jobs.
//!
//! Each job processes its units (symbols, sectors or years) one at a time.
//! A unit that fails is logged and reported through [`JobProgress`]; the
//! job carries on with the next unit. Setup failures (missing bootstrap
//! file that cannot be downloaded, unreadable listing, calendar write or
//! commit failure) end the job with a [`JobError`].

pub mod holidays;
pub mod listing;
pub mod prices;
pub mod scrape;

use std::path::Path;

use nepse_core::data::store::{self, StoreError};
use nepse_core::data::{FetchError, ListingError, SectorListing};
use thiserror::Error;

use crate::config::Config;
use crate::progress::JobProgress;
use crate::publish::{self, Credentials, PublishError, PublishOutcome, PublishRequest, VersionControl};
use crate::sources::Sources;

pub use holidays::{run_holidays, HolidaySummary};
pub use listing::{run_listing, ListingSummary};
pub use prices::{run_prices, PriceSummary, SectorResult};
pub use scrape::{run_scrape, ScrapeSummary};

#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Listing(#[from] ListingError),

    #[error("publish failed: {0}")]
    Publish(#[from] PublishError),

    #[error("{0}")]
    Nothing(String),
}

/// Git access for a job run. `None` in [`JobContext::publisher`] means
/// files are written but git is not touched.
pub struct Publisher<'a> {
    pub vcs: &'a dyn VersionControl,
    pub credentials: Credentials,
}

/// Everything a job needs from the outside world.
pub struct JobContext<'a> {
    pub config: &'a Config,
    pub sources: &'a dyn Sources,
    pub progress: &'a dyn JobProgress,
    pub publisher: Option<Publisher<'a>>,
}

impl JobContext<'_> {
    /// Publish through the configured publisher, if any.
    pub(crate) fn publish(&self, request: PublishRequest) -> Result<Option<PublishOutcome>, PublishError> {
        match &self.publisher {
            None => Ok(None),
            Some(p) => publish::publish(p.vcs, &self.config.git, &p.credentials, &request).map(Some),
        }
    }

    /// Download `path` from `url` if it is missing locally.
    pub(crate) fn bootstrap(&self, path: &Path, url: &str) -> Result<(), StoreError> {
        store::ensure_local(path, url, |u| self.sources.download(u))?;
        Ok(())
    }

    /// The sector listing, downloaded first when missing.
    pub(crate) fn load_listing(&self) -> Result<SectorListing, StoreError> {
        let path = self.config.listing_path();
        self.bootstrap(&path, &self.config.remote.listing_url)?;
        store::load_listing(&path)
    }
}
