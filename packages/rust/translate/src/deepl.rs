//! DeepL REST client.

use std::time::Duration;

use paperscout_shared::{PaperScoutError, Result, TranslationConfig};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{Translator, Usage};

const FREE_API_URL: &str = "https://api-free.deepl.com";
const PRO_API_URL: &str = "https://api.deepl.com";

/// Suffix that marks a free-tier authentication key.
const FREE_KEY_SUFFIX: &str = ":fx";

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct UsageResponse {
    character_count: u64,
    character_limit: u64,
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    text: [&'a str; 1],
    target_lang: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(default)]
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
struct Translation {
    text: String,
}

/// [`Translator`] backed by the DeepL v2 API.
#[derive(Debug, Clone)]
pub struct DeepLClient {
    client: Client,
    api_key: String,
    api_url: String,
}

impl DeepLClient {
    /// Build a client for `api_key`. The endpoint comes from the config when
    /// set, otherwise from the key type (free keys end in `:fx`).
    pub fn new(api_key: impl Into<String>, config: &TranslationConfig) -> Result<Self> {
        let api_key = api_key.into();
        let api_url = config.api_url.clone().unwrap_or_else(|| {
            if api_key.ends_with(FREE_KEY_SUFFIX) {
                FREE_API_URL.to_string()
            } else {
                PRO_API_URL.to_string()
            }
        });

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| PaperScoutError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn auth_header(&self) -> String {
        format!("DeepL-Auth-Key {}", self.api_key)
    }
}

impl Translator for DeepLClient {
    async fn usage(&self) -> Result<Usage> {
        let url = format!("{}/v2/usage", self.api_url);
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .send()
            .await
            .map_err(|e| PaperScoutError::Translation(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PaperScoutError::Translation(format!("{url}: HTTP {status}")));
        }

        let body: UsageResponse = response
            .json()
            .await
            .map_err(|e| PaperScoutError::Translation(format!("{url}: invalid usage body: {e}")))?;

        Ok(Usage {
            used: body.character_count,
            limit: body.character_limit,
        })
    }

    #[instrument(skip_all, fields(chars = text.chars().count(), target_lang = %target_lang))]
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String> {
        let url = format!("{}/v2/translate", self.api_url);
        let response = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .json(&TranslateRequest {
                text: [text],
                target_lang,
            })
            .send()
            .await
            .map_err(|e| PaperScoutError::Translation(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PaperScoutError::Translation(format!("{url}: HTTP {status}")));
        }

        let body: TranslateResponse = response.json().await.map_err(|e| {
            PaperScoutError::Translation(format!("{url}: invalid translation body: {e}"))
        })?;

        let text = body
            .translations
            .into_iter()
            .next()
            .map(|t| t.text)
            .unwrap_or_default();
        debug!(translated_chars = text.chars().count(), "chunk translated");
        Ok(text)
    }
}
