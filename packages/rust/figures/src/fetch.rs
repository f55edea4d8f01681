//! Page-fetch collaborator used by the figure extractor.

use std::future::Future;
use std::time::Duration;

use paperscout_shared::{FiguresConfig, PaperScoutError, Result};
use reqwest::Client;
use tracing::debug;

/// Browser-like User-Agent; the rendered-paper host serves reduced pages to
/// unknown clients.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Timeout for full page fetches.
const PAGE_TIMEOUT_SECS: u64 = 30;

/// Result of a GET request. `body` is only read for successful responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub status: u16,
    pub body: Option<String>,
}

impl FetchedPage {
    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }
}

/// HTTP access needed to locate figures: page fetches and existence checks.
pub trait PageFetcher {
    /// GET a page. Transport errors are `Err`; HTTP error statuses are not.
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchedPage>> + Send;

    /// HEAD a resource and return its status code.
    fn head(&self, url: &str) -> impl Future<Output = Result<u16>> + Send;
}

/// [`PageFetcher`] over reqwest.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    probe_timeout: Duration,
}

impl HttpFetcher {
    pub fn new(config: &FiguresConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(PAGE_TIMEOUT_SECS))
            .build()
            .map_err(|e| PaperScoutError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            probe_timeout: Duration::from_secs(config.probe_timeout_secs),
        })
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        debug!(%url, "fetching page");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PaperScoutError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Ok(FetchedPage {
                status: status.as_u16(),
                body: None,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| PaperScoutError::Network(format!("{url}: body read failed: {e}")))?;

        Ok(FetchedPage {
            status: status.as_u16(),
            body: Some(body),
        })
    }

    async fn head(&self, url: &str) -> Result<u16> {
        let response = self
            .client
            .head(url)
            .timeout(self.probe_timeout)
            .send()
            .await
            .map_err(|e| PaperScoutError::Network(format!("{url}: {e}")))?;
        Ok(response.status().as_u16())
    }
}
