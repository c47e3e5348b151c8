//! Page source trait and structured fetch errors.
//!
//! A page source abstracts over wherever table rows come from (the live
//! site over HTTP, a saved fixture, an in-memory list) so the merge engine
//! can be driven and tested without a network.

use std::collections::VecDeque;
use thiserror::Error;

/// Cell text of one table row, in column order.
pub type RawRow = Vec<String>;

/// Structured error types for fetch operations.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("table not found on {0}")]
    TableNotFound(String),

    #[error("page limit of {0} reached without exhausting the listing")]
    PageLimit(usize),

    #[error("invalid source configuration: {0}")]
    Config(String),
}

/// A lazy, paginated sequence of table rows.
///
/// Each call yields the next page, or `None` once the listing has no further
/// page. Consumers stop calling as soon as they have what they need, which
/// is how stop-on-seen-date avoids fetching older history.
pub trait PageSource {
    /// Human-readable name of this source, used in logs.
    fn name(&self) -> &str;

    /// Fetch the next page of rows.
    fn next_page(&mut self) -> Result<Option<Vec<RawRow>>, FetchError>;
}

impl<S: PageSource + ?Sized> PageSource for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn next_page(&mut self) -> Result<Option<Vec<RawRow>>, FetchError> {
        (**self).next_page()
    }
}

/// Page source backed by pages held in memory.
///
/// Counts how many pages were handed out so callers can check early
/// termination.
#[derive(Debug, Default)]
pub struct MemoryPages {
    name: String,
    pages: VecDeque<Result<Vec<RawRow>, String>>,
    served: usize,
}

impl MemoryPages {
    pub fn new(name: impl Into<String>, pages: Vec<Vec<RawRow>>) -> Self {
        Self {
            name: name.into(),
            pages: pages.into_iter().map(Ok).collect(),
            served: 0,
        }
    }

    /// Append a page that fails to load when reached.
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.pages.push_back(Err(message.into()));
        self
    }

    /// Pages handed out so far, failures included.
    pub fn served(&self) -> usize {
        self.served
    }
}

impl PageSource for MemoryPages {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_page(&mut self) -> Result<Option<Vec<RawRow>>, FetchError> {
        match self.pages.pop_front() {
            None => Ok(None),
            Some(page) => {
                self.served += 1;
                page.map(Some).map_err(FetchError::NetworkUnreachable)
            }
        }
    }
}

/// Build a row from string slices.
pub fn raw_row(cells: &[&str]) -> RawRow {
    cells.iter().map(|c| c.to_string()).collect()
}
