//! Chat notifications: the [`Messenger`] collaborator, the LINE push client,
//! and the message renderers.

mod messages;

use std::future::Future;
use std::time::Duration;

use paperscout_shared::{LineConfig, PaperScoutError, Result};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, instrument};

pub use messages::{
    render_basic_info, render_header, render_no_relevant, render_no_results, render_summary,
};

/// LINE rejects text messages longer than this.
pub const MAX_MESSAGE_CHARS: usize = 5000;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Delivers text messages to the configured recipient.
pub trait Messenger {
    fn send(&self, message: &str) -> impl Future<Output = Result<()>> + Send;
}

// ---------------------------------------------------------------------------
// LINE
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct PushRequest<'a> {
    to: &'a str,
    messages: [TextMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

/// [`Messenger`] that pushes to a single LINE user.
#[derive(Debug, Clone)]
pub struct LineMessenger {
    client: Client,
    token: String,
    user_id: String,
    push_url: String,
}

impl LineMessenger {
    pub fn new(
        token: impl Into<String>,
        user_id: impl Into<String>,
        config: &LineConfig,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| PaperScoutError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            token: token.into(),
            user_id: user_id.into(),
            push_url: format!("{}/v2/bot/message/push", config.api_url.trim_end_matches('/')),
        })
    }
}

impl Messenger for LineMessenger {
    #[instrument(skip_all, fields(chars = message.chars().count()))]
    async fn send(&self, message: &str) -> Result<()> {
        let text = truncate_chars(message, MAX_MESSAGE_CHARS);
        let response = self
            .client
            .post(&self.push_url)
            .bearer_auth(&self.token)
            .json(&PushRequest {
                to: &self.user_id,
                messages: [TextMessage {
                    kind: "text",
                    text: &text,
                }],
            })
            .send()
            .await
            .map_err(|e| PaperScoutError::Notify(format!("{}: {e}", self.push_url)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PaperScoutError::Notify(format!(
                "{}: HTTP {status}: {body}",
                self.push_url
            )));
        }

        debug!("message pushed");
        Ok(())
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
