//! arXiv search: query construction, the Atom record parser, and the HTTP
//! client that ties them together.
//!
//! The pipeline talks to search through the [`PaperSearch`] trait so tests can
//! substitute canned results; [`ArxivClient`] is the production implementation.

mod parser;
mod query;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use paperscout_shared::{Paper, PaperScoutError, Result, SearchConfig};
use reqwest::Client;
use tracing::{debug, info, instrument};

pub use parser::{FeedNamespaces, parse_feed};
pub use query::{DOMAIN_CATEGORIES, SearchRequest, build_search_query};

/// Maximum number of redirects to follow on API and PDF requests.
const MAX_REDIRECTS: usize = 5;

/// User-Agent string for search requests.
const USER_AGENT: &str = concat!("PaperScout/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// PaperSearch trait
// ---------------------------------------------------------------------------

/// Source of candidate papers for a free-text query.
pub trait PaperSearch {
    /// Return up to `max_results` papers, most relevant first.
    fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> impl Future<Output = Result<Vec<Paper>>> + Send;
}

// ---------------------------------------------------------------------------
// ArxivClient
// ---------------------------------------------------------------------------

/// Client for the arXiv export API.
#[derive(Debug, Clone)]
pub struct ArxivClient {
    client: Client,
    api_url: String,
    namespaces: FeedNamespaces,
}

impl ArxivClient {
    /// Build a client from the search section of the configuration.
    pub fn new(config: &SearchConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            api_url: config.api_url.clone(),
            namespaces: FeedNamespaces::default(),
        })
    }

    /// Point the client at a different API endpoint.
    pub fn with_endpoint(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Download a paper's PDF to `<dir>/<arxiv_id>.pdf`, creating `dir` if needed.
    #[instrument(skip_all, fields(id = %paper.arxiv_id))]
    pub async fn download_pdf(&self, paper: &Paper, dir: &Path) -> Result<PathBuf> {
        let pdf_url = paper
            .pdf_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| {
                PaperScoutError::validation(format!("{} has no PDF link", paper.arxiv_id))
            })?;
        if paper.arxiv_id.is_empty() {
            return Err(PaperScoutError::validation(format!(
                "cannot name download for {pdf_url}: paper has no identifier"
            )));
        }

        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| PaperScoutError::io(dir, e))?;

        let response = self
            .client
            .get(pdf_url)
            .send()
            .await
            .map_err(|e| PaperScoutError::Network(format!("{pdf_url}: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(PaperScoutError::Network(format!("{pdf_url}: HTTP {status}")));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| PaperScoutError::Network(format!("{pdf_url}: failed to read body: {e}")))?;

        let path = dir.join(format!("{}.pdf", paper.arxiv_id.replace('/', "_")));
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| PaperScoutError::io(&path, e))?;

        info!(path = %path.display(), bytes = bytes.len(), "PDF saved");
        Ok(path)
    }
}

impl PaperSearch for ArxivClient {
    #[instrument(skip_all, fields(query = %query, max_results = max_results))]
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Paper>> {
        let request = SearchRequest::new(query, max_results);
        debug!(search_query = %request.search_query, "querying arXiv");

        let response = self
            .client
            .get(&self.api_url)
            .query(&request.query_pairs())
            .send()
            .await
            .map_err(|e| PaperScoutError::Network(format!("{}: {e}", self.api_url)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PaperScoutError::Network(format!(
                "{}: HTTP {status}",
                self.api_url
            )));
        }

        let body = response.text().await.map_err(|e| {
            PaperScoutError::Network(format!("{}: failed to read body: {e}", self.api_url))
        })?;

        let mut papers = parse_feed(&body, &self.namespaces)?;
        papers.truncate(max_results);
        info!(found = papers.len(), "search complete");
        Ok(papers)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| PaperScoutError::Network(format!("failed to build HTTP client: {e}")))
}
