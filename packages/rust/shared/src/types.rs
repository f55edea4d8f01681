//! Core domain types: papers, figures, and translation status.

use serde::{Deserialize, Serialize};

/// Maximum number of figures kept per paper.
pub const MAX_FIGURES: usize = 5;

// ---------------------------------------------------------------------------
// Figure
// ---------------------------------------------------------------------------

/// A figure image associated with a paper. Identity is the image URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Figure {
    /// Absolute image URL.
    pub url: String,
    /// Alt text of the image tag, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    /// Caption text (empty if none was found).
    #[serde(default)]
    pub caption: String,
}

// ---------------------------------------------------------------------------
// Translation status
// ---------------------------------------------------------------------------

/// Why a translation was not attempted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// The remaining character quota is smaller than the abstract.
    InsufficientQuota { needed: u64, remaining: u64 },
    /// The abstract is empty or too short to be worth translating.
    TooShort,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientQuota { needed, remaining } => {
                write!(f, "insufficient quota (need {needed}, have {remaining})")
            }
            Self::TooShort => write!(f, "abstract too short"),
        }
    }
}

/// Translation state of a paper's abstract.
///
/// Lets consumers tell "untranslated because skipped" apart from
/// "untranslated because it failed".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TranslationStatus {
    /// Translation has not been attempted yet.
    #[default]
    Pending,
    /// `Paper::translated_abstract` holds the translation.
    Translated,
    /// Translation was deliberately not attempted.
    Skipped { reason: SkipReason },
    /// Translation was attempted and failed.
    Failed { reason: String },
}

// ---------------------------------------------------------------------------
// Paper
// ---------------------------------------------------------------------------

/// A normalized search result, enriched in place by the figure extractor and
/// the translator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paper {
    /// Stable identifier, the last path segment of [`Paper::url`].
    pub arxiv_id: String,
    /// Canonical detail-page URL.
    pub url: String,
    pub title: String,
    /// Author names in feed order.
    pub authors: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// Publication date (`YYYY-MM-DD`).
    pub published: String,
    /// Last-updated date (`YYYY-MM-DD`).
    pub updated: String,
    /// Category tags; the first one is the primary category.
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_abstract: Option<String>,
    #[serde(default)]
    pub translation: TranslationStatus,
    /// At most [`MAX_FIGURES`] figures, unique by URL.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub figures: Vec<Figure>,
}

impl Paper {
    /// Derive the paper identifier from its detail URL (last path segment).
    pub fn identifier_from_url(url: &str) -> String {
        url.trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string()
    }

    /// Authors joined with `", "`.
    pub fn authors_str(&self) -> String {
        self.authors.join(", ")
    }

    /// The primary category, or `""` when the paper has none.
    pub fn primary_category(&self) -> &str {
        self.categories.first().map(String::as_str).unwrap_or("")
    }

    /// The URL used for duplicate detection: the PDF URL when present,
    /// otherwise the detail URL. `None` when both are empty.
    pub fn identity_url(&self) -> Option<&str> {
        self.pdf_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .or_else(|| Some(self.url.as_str()).filter(|u| !u.is_empty()))
    }

    /// Append figures, skipping URLs already present and capping the list.
    pub fn attach_figures(&mut self, figures: impl IntoIterator<Item = Figure>) {
        for figure in figures {
            if self.figures.len() >= MAX_FIGURES {
                break;
            }
            if !self.figures.iter().any(|f| f.url == figure.url) {
                self.figures.push(figure);
            }
        }
    }

    /// Title truncated to `max` characters, for log lines.
    pub fn short_title(&self, max: usize) -> String {
        if self.title.chars().count() <= max {
            return self.title.clone();
        }
        let mut s: String = self.title.chars().take(max).collect();
        s.push_str("...");
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn figure(url: &str) -> Figure {
        Figure {
            url: url.into(),
            alt: None,
            caption: String::new(),
        }
    }

    #[test]
    fn identifier_is_last_path_segment() {
        assert_eq!(
            Paper::identifier_from_url("http://arxiv.org/abs/2401.01234v2"),
            "2401.01234v2"
        );
        assert_eq!(
            Paper::identifier_from_url("http://arxiv.org/abs/physics/0601001v1"),
            "0601001v1"
        );
        assert_eq!(Paper::identifier_from_url(""), "");
    }

    #[test]
    fn identity_url_prefers_pdf() {
        let mut paper = Paper {
            url: "http://arxiv.org/abs/2401.01234v1".into(),
            pdf_url: Some("http://arxiv.org/pdf/2401.01234v1".into()),
            ..Default::default()
        };
        assert_eq!(paper.identity_url(), Some("http://arxiv.org/pdf/2401.01234v1"));

        paper.pdf_url = Some(String::new());
        assert_eq!(paper.identity_url(), Some("http://arxiv.org/abs/2401.01234v1"));

        paper.url.clear();
        assert_eq!(paper.identity_url(), None);
    }

    #[test]
    fn primary_category_defaults_to_empty() {
        let mut paper = Paper::default();
        assert_eq!(paper.primary_category(), "");
        paper.categories = vec!["physics.ao-ph".into(), "cs.LG".into()];
        assert_eq!(paper.primary_category(), "physics.ao-ph");
    }

    #[test]
    fn attach_figures_dedups_and_caps() {
        let mut paper = Paper::default();
        paper.attach_figures(vec![figure("a.png"), figure("b.png"), figure("a.png")]);
        assert_eq!(paper.figures.len(), 2);

        paper.attach_figures((0..10).map(|i| figure(&format!("x{i}.png"))));
        assert_eq!(paper.figures.len(), MAX_FIGURES);
        assert_eq!(paper.figures[0].url, "a.png");
        assert_eq!(paper.figures[4].url, "x2.png");
    }

    #[test]
    fn translation_status_serializes_tagged() {
        let status = TranslationStatus::Skipped {
            reason: SkipReason::InsufficientQuota {
                needed: 1200,
                remaining: 10,
            },
        };
        let json = serde_json::to_string(&status).expect("serialize");
        assert!(json.contains(r#""status":"skipped""#));
        let parsed: TranslationStatus = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, status);
    }

    #[test]
    fn short_title_truncates_on_char_boundary() {
        let paper = Paper {
            title: "台風の眼の構造解析".into(),
            ..Default::default()
        };
        assert_eq!(paper.short_title(3), "台風の...");
        assert_eq!(paper.short_title(50), "台風の眼の構造解析");
    }
}
