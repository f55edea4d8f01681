//! Quota-aware translation of paper abstracts.
//!
//! An abstract is translated all-or-nothing: it is skipped when the remaining
//! character quota is smaller than the text, and any chunk that fails or comes
//! back empty fails the whole abstract. Neither case is an error for the
//! caller; both are reported through [`TranslationOutcome`].

mod chunker;
mod deepl;
mod quota;

use std::future::Future;

use paperscout_shared::{Paper, Result, SkipReason, TranslationConfig, TranslationStatus};
use tracing::{debug, info, instrument, warn};

pub use chunker::{SENTENCE_DELIMITER, split_into_chunks};
pub use deepl::DeepLClient;
pub use quota::{QuotaTracker, Usage, remaining_quota};

/// Abstracts shorter than this (after trimming) are not worth a request.
pub const MIN_TRANSLATABLE_CHARS: usize = 10;

// ---------------------------------------------------------------------------
// Translator trait
// ---------------------------------------------------------------------------

/// Translation service collaborator.
pub trait Translator {
    /// Characters used and allowed in the current billing period.
    fn usage(&self) -> impl Future<Output = Result<Usage>> + Send;

    /// Translate one piece of text. An empty string means "no usable result".
    fn translate(
        &self,
        text: &str,
        target_lang: &str,
    ) -> impl Future<Output = Result<String>> + Send;
}

// ---------------------------------------------------------------------------
// Options and outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslateOptions {
    pub target_lang: String,
    /// Texts longer than this many characters are chunked.
    pub chunk_threshold: usize,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self::from(&TranslationConfig::default())
    }
}

impl From<&TranslationConfig> for TranslateOptions {
    fn from(config: &TranslationConfig) -> Self {
        Self {
            target_lang: config.target_lang.clone(),
            chunk_threshold: config.chunk_threshold,
        }
    }
}

/// Result of one abstract translation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationOutcome {
    /// Chunk translations joined with a single space.
    Translated { text: String, chunks: usize },
    Skipped(SkipReason),
    Failed { reason: String },
}

impl TranslationOutcome {
    /// Record the outcome on the paper. The original abstract is never touched.
    pub fn apply_to(self, paper: &mut Paper) {
        match self {
            Self::Translated { text, .. } => {
                paper.translated_abstract = Some(text);
                paper.translation = TranslationStatus::Translated;
            }
            Self::Skipped(reason) => {
                paper.translated_abstract = None;
                paper.translation = TranslationStatus::Skipped { reason };
            }
            Self::Failed { reason } => {
                paper.translated_abstract = None;
                paper.translation = TranslationStatus::Failed { reason };
            }
        }
    }
}

// ---------------------------------------------------------------------------
// translate_abstract
// ---------------------------------------------------------------------------

/// Translate an abstract within the remaining quota.
///
/// Texts at or under the chunk threshold go out in one call; longer texts are
/// split with [`split_into_chunks`] and translated in order. The quota is
/// decremented by each translated chunk's length.
#[instrument(skip_all, fields(chars = abstract_text.chars().count(), remaining = quota.remaining()))]
pub async fn translate_abstract<T: Translator>(
    translator: &T,
    abstract_text: &str,
    quota: &mut QuotaTracker,
    opts: &TranslateOptions,
) -> TranslationOutcome {
    if abstract_text.trim().chars().count() < MIN_TRANSLATABLE_CHARS {
        debug!("abstract too short to translate");
        return TranslationOutcome::Skipped(SkipReason::TooShort);
    }

    let length = abstract_text.chars().count();
    let needed = length as u64;
    if !quota.can_afford(needed) {
        info!(needed, remaining = quota.remaining(), "insufficient quota, skipping translation");
        return TranslationOutcome::Skipped(SkipReason::InsufficientQuota {
            needed,
            remaining: quota.remaining(),
        });
    }

    let chunks = if length <= opts.chunk_threshold {
        vec![abstract_text.to_string()]
    } else {
        split_into_chunks(abstract_text, opts.chunk_threshold)
    };

    let mut translated = Vec::with_capacity(chunks.len());
    for (i, chunk) in chunks.iter().enumerate() {
        match translator.translate(chunk, &opts.target_lang).await {
            Ok(text) if !text.trim().is_empty() => {
                quota.consume(chunk.chars().count() as u64);
                translated.push(text);
            }
            Ok(_) => {
                warn!(chunk = i, "translation returned no text");
                return TranslationOutcome::Failed {
                    reason: format!("empty translation for chunk {}", i + 1),
                };
            }
            Err(e) => {
                warn!(chunk = i, error = %e, "translation failed");
                return TranslationOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        }
    }

    info!(chunks = translated.len(), "abstract translated");
    TranslationOutcome::Translated {
        text: translated.join(" "),
        chunks: translated.len(),
    }
}
