//! Notion database backend.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::Local;
use paperscout_shared::{
    ArchiveConfig, MAX_FIGURES, NotionCredentials, Paper, PaperScoutError, Result,
    TranslationStatus,
};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, instrument};

const NOTION_VERSION: &str = "2022-06-28";

/// Rows requested per database query page (the API maximum).
const PAGE_SIZE: u32 = 100;

/// Notion rejects rich-text items longer than this.
const MAX_RICH_TEXT_CHARS: usize = 2000;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Property holding the paper's identity URL.
const URL_PROPERTY: &str = "URL";

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<PageObject>,
    #[serde(default)]
    has_more: bool,
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PageObject {
    #[serde(default)]
    properties: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct CreatedPage {
    id: String,
}

/// Archive backed by a Notion database.
#[derive(Debug, Clone)]
pub struct NotionStore {
    client: Client,
    token: String,
    database_id: String,
    api_url: String,
    title_property: String,
}

impl NotionStore {
    pub fn new(credentials: &NotionCredentials, config: &ArchiveConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| PaperScoutError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            token: credentials.token.clone(),
            database_id: credentials.database_id.clone(),
            api_url: config.notion_api_url.trim_end_matches('/').to_string(),
            title_property: config.notion_title_property.clone(),
        })
    }

    async fn post(&self, path: &str, body: &Value) -> Result<reqwest::Response> {
        let url = format!("{}{path}", self.api_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
            .json(body)
            .send()
            .await
            .map_err(|e| PaperScoutError::Storage(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(PaperScoutError::Storage(format!("{url}: HTTP {status}: {detail}")));
        }
        Ok(response)
    }

    /// Every URL-typed `URL` property in the database, across all result pages.
    #[instrument(skip_all)]
    pub async fn existing_urls(&self) -> Result<HashSet<String>> {
        let path = format!("/v1/databases/{}/query", self.database_id);
        let mut urls = HashSet::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut body = json!({ "page_size": PAGE_SIZE });
            if let Some(c) = &cursor {
                body["start_cursor"] = json!(c);
            }

            let page: QueryResponse = self
                .post(&path, &body)
                .await?
                .json()
                .await
                .map_err(|e| PaperScoutError::Storage(format!("invalid query response: {e}")))?;

            urls.extend(page.results.iter().filter_map(url_property));
            debug!(collected = urls.len(), has_more = page.has_more, "database page read");

            match page.next_cursor {
                Some(next) if page.has_more => cursor = Some(next),
                _ => break,
            }
        }

        info!(count = urls.len(), "existing papers in Notion database");
        Ok(urls)
    }

    /// Create a page for `paper` and return its id.
    #[instrument(skip_all, fields(id = %paper.arxiv_id))]
    pub async fn create_page(&self, paper: &Paper, keyword: &str) -> Result<String> {
        let body = json!({
            "parent": { "database_id": self.database_id },
            "properties": self.page_properties(paper, keyword),
            "children": page_blocks(paper),
        });

        let created: CreatedPage = self
            .post("/v1/pages", &body)
            .await?
            .json()
            .await
            .map_err(|e| PaperScoutError::Storage(format!("invalid page response: {e}")))?;

        info!(page_id = %created.id, "saved to Notion");
        Ok(created.id)
    }

    fn page_properties(&self, paper: &Paper, keyword: &str) -> Value {
        let title = if paper.title.is_empty() {
            "Unknown Title"
        } else {
            paper.title.as_str()
        };

        let mut properties = json!({
            "Read": { "select": { "name": "UNREAD" } },
            "Date Added": { "date": { "start": Local::now().format("%Y-%m-%d").to_string() } },
        });
        properties[self.title_property.as_str()] = json!({ "title": rich_text(title) });
        if !keyword.is_empty() {
            properties["keyword"] = json!({ "rich_text": rich_text(keyword) });
        }
        if let Some(url) = paper.identity_url() {
            properties[URL_PROPERTY] = json!({ "url": url });
        }
        properties
    }
}

fn url_property(page: &PageObject) -> Option<String> {
    let prop = page.properties.get(URL_PROPERTY)?;
    if prop.get("type")?.as_str()? != "url" {
        return None;
    }
    prop.get("url")?
        .as_str()
        .filter(|u| !u.is_empty())
        .map(str::to_string)
}

/// Rich-text items for `text`, split to respect the per-item length limit.
fn rich_text(text: &str) -> Vec<Value> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(MAX_RICH_TEXT_CHARS)
        .map(|part| json!({ "type": "text", "text": { "content": part.iter().collect::<String>() } }))
        .collect()
}

fn heading(text: &str) -> Value {
    json!({
        "object": "block",
        "type": "heading_2",
        "heading_2": { "rich_text": rich_text(text) }
    })
}

fn paragraph(items: Vec<Value>) -> Value {
    json!({
        "object": "block",
        "type": "paragraph",
        "paragraph": { "rich_text": items }
    })
}

fn page_blocks(paper: &Paper) -> Vec<Value> {
    let mut blocks = Vec::new();

    if !paper.authors.is_empty() {
        blocks.push(heading("Authors"));
        blocks.push(paragraph(rich_text(&paper.authors_str())));
    }

    if !paper.abstract_text.is_empty() {
        blocks.push(heading("English Abstract"));
        blocks.push(paragraph(rich_text(&paper.abstract_text)));
    }

    match (&paper.translated_abstract, &paper.translation) {
        (Some(translated), _) if !translated.is_empty() => {
            blocks.push(heading("Japanese Translation (DeepL)"));
            blocks.push(paragraph(rich_text(translated)));
        }
        (_, TranslationStatus::Skipped { reason }) => {
            blocks.push(heading("Japanese Translation (DeepL)"));
            blocks.push(paragraph(rich_text(&format!("Translation skipped: {reason}"))));
        }
        (_, TranslationStatus::Failed { reason }) => {
            blocks.push(heading("Japanese Translation (DeepL)"));
            blocks.push(paragraph(rich_text(&format!("Translation failed: {reason}"))));
        }
        _ => {}
    }

    if !paper.figures.is_empty() {
        blocks.push(heading("Figures"));
        for (i, figure) in paper.figures.iter().take(MAX_FIGURES).enumerate() {
            blocks.push(paragraph(vec![
                json!({ "type": "text", "text": { "content": format!("Figure {}: ", i + 1) } }),
                json!({
                    "type": "text",
                    "text": { "content": figure.url, "link": { "url": figure.url } }
                }),
            ]));
            if !figure.caption.is_empty() {
                blocks.push(paragraph(rich_text(&format!("Caption: {}", figure.caption))));
            }
        }
    }

    blocks
}
