//! Where jobs get their pages from.
//!
//! [`Sources`] hands out one page source per symbol, sector or year and
//! downloads bootstrap files. [`HttpSources`] is the live implementation;
//! [`FixtureSources`] serves canned pages for tests and offline runs.

use std::collections::HashMap;
use std::sync::Mutex;

use nepse_core::data::{FetchError, HttpClient, MemoryPages, PageSource, RawRow};

use crate::config::SourcesConfig;

pub trait Sources {
    /// Price-history pages for `symbol`, newest first.
    fn prices(&self, symbol: &str) -> Result<Box<dyn PageSource>, FetchError>;

    /// Company-listing pages for a sector, by its site name.
    fn listing(&self, site_sector: &str) -> Result<Box<dyn PageSource>, FetchError>;

    /// Holiday-listing pages for `year`.
    fn holidays(&self, year: i32) -> Result<Box<dyn PageSource>, FetchError>;

    /// Raw bytes at `url`.
    fn download(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Live sources over HTTP.
pub struct HttpSources {
    client: HttpClient,
    config: SourcesConfig,
}

impl HttpSources {
    pub fn new(client: HttpClient, config: SourcesConfig) -> Self {
        Self { client, config }
    }
}

impl Sources for HttpSources {
    fn prices(&self, symbol: &str) -> Result<Box<dyn PageSource>, FetchError> {
        // the site's company pages use lowercase symbols
        let symbol = symbol.to_lowercase();
        let source = self.client.table_source(
            format!("prices {symbol}"),
            &self.config.price_url,
            &[("symbol", &symbol)],
            self.config.price_anchor.as_deref(),
        )?;
        Ok(Box::new(source))
    }

    fn listing(&self, site_sector: &str) -> Result<Box<dyn PageSource>, FetchError> {
        let source = self.client.table_source(
            format!("listing {site_sector}"),
            &self.config.listing_url,
            &[("sector", site_sector)],
            self.config.listing_anchor.as_deref(),
        )?;
        Ok(Box::new(source))
    }

    fn holidays(&self, year: i32) -> Result<Box<dyn PageSource>, FetchError> {
        let year = year.to_string();
        let source = self.client.table_source(
            format!("holidays {year}"),
            &self.config.holiday_url,
            &[("year", &year)],
            self.config.holiday_anchor.as_deref(),
        )?;
        Ok(Box::new(source))
    }

    fn download(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.client.get_bytes(url)
    }
}

type Pages = Vec<Vec<RawRow>>;

/// Canned pages keyed by symbol, sector or year. Unknown keys fail like an
/// unreachable page, and every request is counted.
#[derive(Debug, Default)]
pub struct FixtureSources {
    prices: HashMap<String, Pages>,
    listings: HashMap<String, Pages>,
    holidays: HashMap<i32, Pages>,
    downloads: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
}

impl FixtureSources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prices(mut self, symbol: &str, pages: Pages) -> Self {
        self.prices.insert(symbol.to_string(), pages);
        self
    }

    pub fn with_listing(mut self, site_sector: &str, pages: Pages) -> Self {
        self.listings.insert(site_sector.to_string(), pages);
        self
    }

    pub fn with_holidays(mut self, year: i32, pages: Pages) -> Self {
        self.holidays.insert(year, pages);
        self
    }

    pub fn with_download(mut self, url: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.downloads.insert(url.to_string(), bytes.into());
        self
    }

    /// Requests made so far, as `kind:key`.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn note(&self, request: String) {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
    }

    fn serve(name: String, pages: Option<&Pages>) -> Result<Box<dyn PageSource>, FetchError> {
        match pages {
            Some(pages) => Ok(Box::new(MemoryPages::new(name, pages.clone()))),
            None => Err(FetchError::NetworkUnreachable(format!("no fixture for {name}"))),
        }
    }
}

impl Sources for FixtureSources {
    fn prices(&self, symbol: &str) -> Result<Box<dyn PageSource>, FetchError> {
        self.note(format!("prices:{symbol}"));
        Self::serve(format!("prices {symbol}"), self.prices.get(symbol))
    }

    fn listing(&self, site_sector: &str) -> Result<Box<dyn PageSource>, FetchError> {
        self.note(format!("listing:{site_sector}"));
        Self::serve(format!("listing {site_sector}"), self.listings.get(site_sector))
    }

    fn holidays(&self, year: i32) -> Result<Box<dyn PageSource>, FetchError> {
        self.note(format!("holidays:{year}"));
        Self::serve(format!("holidays {year}"), self.holidays.get(&year))
    }

    fn download(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.note(format!("download:{url}"));
        self.downloads.get(url).cloned().ok_or_else(|| FetchError::Status {
            status: 404,
            url: url.to_string(),
        })
    }
}
