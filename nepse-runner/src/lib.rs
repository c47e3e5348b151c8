//! NEPSE Runner: refresh jobs, configuration and git publishing.
//!
//! This crate builds on `nepse-core` to provide:
//! - TOML configuration with built-in defaults
//! - Live and fixture page sources
//! - Price, full-scrape, holiday calendar and sector listing jobs
//! - Publishing through git with a no-op commit check
//! - Progress reporting through `tracing`

pub mod config;
pub mod jobs;
pub mod progress;
pub mod publish;
pub mod sources;

pub use config::{Config, ConfigError, SectorMapping};
pub use jobs::{
    run_holidays, run_listing, run_prices, run_scrape, HolidaySummary, JobContext, JobError,
    ListingSummary, PriceSummary, Publisher, ScrapeSummary,
};
pub use progress::{JobProgress, LogProgress, RecordingProgress};
pub use publish::{
    Credentials, GitCli, PublishError, PublishOutcome, PushStatus, RecordingVcs, VersionControl,
};
pub use sources::{FixtureSources, HttpSources, Sources};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_is_send_sync() {
        assert_send::<Config>();
        assert_sync::<Config>();
    }

    #[test]
    fn summaries_are_send_sync() {
        assert_send::<PriceSummary>();
        assert_sync::<PriceSummary>();
        assert_send::<HolidaySummary>();
        assert_sync::<HolidaySummary>();
    }
}
