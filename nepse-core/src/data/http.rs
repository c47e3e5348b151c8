//! HTTP page sources.
//!
//! Pages are fetched with a blocking `reqwest` client, one request at a time,
//! with a fixed delay between pages of the same listing. URLs come from
//! templates whose `{name}` placeholders are filled per request; `{page}` is
//! the 1-based page number.

use std::thread;
use std::time::Duration;

use tracing::debug;

use super::html;
use super::source::{FetchError, PageSource, RawRow};

/// Client settings shared by every source.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout: Duration,
    pub user_agent: String,
    pub page_delay: Duration,
    pub max_pages: usize,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".into(),
            page_delay: Duration::from_millis(1000),
            max_pages: 500,
        }
    }
}

/// Thin wrapper over a blocking client that maps failures to [`FetchError`].
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::blocking::Client,
    settings: HttpSettings,
}

impl HttpClient {
    pub fn new(settings: HttpSettings) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &HttpSettings {
        &self.settings
    }

    fn get(&self, url: &str) -> Result<reqwest::blocking::Response, FetchError> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchError::NetworkUnreachable(format!("{url}: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(resp)
    }

    pub fn get_text(&self, url: &str) -> Result<String, FetchError> {
        self.get(url)?
            .text()
            .map_err(|e| FetchError::NetworkUnreachable(format!("{url}: {e}")))
    }

    pub fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.get(url)?
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| FetchError::NetworkUnreachable(format!("{url}: {e}")))
    }

    /// Paginated table source for `template` with its placeholders filled.
    pub fn table_source(
        &self,
        name: impl Into<String>,
        template: &str,
        vars: &[(&str, &str)],
        anchor: Option<&str>,
    ) -> Result<HttpTableSource, FetchError> {
        let url_template = fill_template(template, vars)?;
        Ok(HttpTableSource {
            client: self.clone(),
            name: name.into(),
            url_template,
            anchor: anchor.map(str::to_string),
            page: 0,
            previous: None,
            done: false,
        })
    }
}

/// Fill every `{name}` placeholder except `{page}`. Values are
/// percent-encoded. An unknown placeholder is a configuration error.
pub fn fill_template(template: &str, vars: &[(&str, &str)]) -> Result<String, FetchError> {
    let mut out = template.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{key}}}"), &urlencoding::encode(value));
    }
    let leftover = out.replace("{page}", "");
    if let Some(start) = leftover.find('{') {
        let end = leftover[start..].find('}').map(|i| start + i + 1).unwrap_or(leftover.len());
        return Err(FetchError::Config(format!(
            "unfilled placeholder {} in '{template}'",
            &leftover[start..end]
        )));
    }
    Ok(out)
}


/// A paginated HTML table fetched page by page.
///
/// The listing ends when a page has no data rows or repeats the previous
/// page (sites that clamp out-of-range page numbers). Rows with fewer than
/// two cells are "no data" notices and are dropped.
#[derive(Debug)]
pub struct HttpTableSource {
    client: HttpClient,
    name: String,
    url_template: String,
    anchor: Option<String>,
    page: usize,
    previous: Option<Vec<RawRow>>,
    done: bool,
}

impl HttpTableSource {
    fn page_url(&self, page: usize) -> String {
        self.url_template.replace("{page}", &page.to_string())
    }
}

impl PageSource for HttpTableSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_page(&mut self) -> Result<Option<Vec<RawRow>>, FetchError> {
        if self.done {
            return Ok(None);
        }
        let settings = self.client.settings();
        if self.page >= settings.max_pages {
            return Err(FetchError::PageLimit(settings.max_pages));
        }
        if self.page > 0 {
            thread::sleep(settings.page_delay);
        }
        self.page += 1;

        let url = self.page_url(self.page);
        debug!(source = %self.name, page = self.page, %url, "fetching page");
        let body = self.client.get_text(&url)?;
        let rows: Vec<RawRow> = html::table_rows(&body, self.anchor.as_deref())?
            .into_iter()
            .filter(|r| r.len() > 1)
            .collect();

        if rows.is_empty() || self.previous.as_ref() == Some(&rows) {
            self.done = true;
            return Ok(None);
        }
        // a template without {page} yields a single page
        if !self.url_template.contains("{page}") {
            self.done = true;
        }
        self.previous = Some(rows.clone());
        Ok(Some(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_fills_and_encodes() {
        let url = fill_template(
            "https://example.test/list?sector={sector}&page={page}",
            &[("sector", "Hotels & Tourism")],
        )
        .unwrap();
        assert_eq!(
            url,
            "https://example.test/list?sector=Hotels%20%26%20Tourism&page={page}"
        );
    }

    #[test]
    fn reserved_and_non_ascii_values_are_encoded() {
        let url = fill_template("https://example.test/company/{symbol}", &[("symbol", "nica/p é")]).unwrap();
        assert_eq!(url, "https://example.test/company/nica%2Fp%20%C3%A9");
    }

    #[test]
    fn unfilled_placeholder_is_rejected() {
        let err = fill_template("https://example.test/{symbol}?page={page}", &[]).unwrap_err();
        assert!(matches!(err, FetchError::Config(m) if m.contains("{symbol}")));
    }

    #[test]
    fn default_settings_are_bounded() {
        let s = HttpSettings::default();
        assert!(s.max_pages > 0);
        assert_eq!(s.timeout, Duration::from_secs(30));
    }
}
