//! Persistence collaborators for processed papers.
//!
//! The [`PaperStore`] trait is what the pipeline sees: the set of identity
//! URLs already archived, and a `save` per processed paper. [`Archive`] picks
//! a backend from configuration:
//! - [`NotionStore`]: a Notion database (one page per paper)
//! - [`LocalArchive`]: a local libSQL file with schema migrations
//! - disabled: nothing is persisted and nothing is known beforehand

mod local;
mod migrations;
mod notion;

use std::collections::HashSet;
use std::future::Future;

use paperscout_shared::{
    ArchiveBackend, ArchiveConfig, NotionCredentials, Paper, PaperScoutError, Result, expand_home,
};
use tracing::{info, warn};

pub use local::{ArchivedPaper, LocalArchive};
pub use notion::NotionStore;

/// Durable record of processed papers.
pub trait PaperStore {
    /// Whether saves are persisted anywhere.
    fn is_enabled(&self) -> bool;

    /// Identity URLs of every paper stored so far.
    fn list_existing_urls(&self) -> impl Future<Output = Result<HashSet<String>>> + Send;

    /// Persist a paper found by `keyword`; returns the backend's record id.
    fn save(&self, paper: &Paper, keyword: &str) -> impl Future<Output = Result<String>> + Send;
}

/// Configured persistence backend.
pub enum Archive {
    Notion(NotionStore),
    Local(LocalArchive),
    Disabled,
}

impl Archive {
    /// Build the backend named in the config. A Notion backend without
    /// credentials, or any backend that fails to open, degrades to
    /// [`Archive::Disabled`]: the run then only dedups within itself.
    pub async fn from_config(config: &ArchiveConfig, notion: Option<&NotionCredentials>) -> Self {
        match config.backend {
            ArchiveBackend::Notion => match notion {
                Some(credentials) => match NotionStore::new(credentials, config) {
                    Ok(store) => {
                        info!("Notion archive enabled");
                        Self::Notion(store)
                    }
                    Err(e) => {
                        warn!(error = %e, "Notion archive disabled (client setup failed)");
                        Self::Disabled
                    }
                },
                None => {
                    warn!("Notion archive disabled (missing credentials)");
                    Self::Disabled
                }
            },
            ArchiveBackend::Local => {
                let path = expand_home(&config.local_path);
                match LocalArchive::open(&path).await {
                    Ok(archive) => Self::Local(archive),
                    Err(e) => {
                        warn!(
                            path = %path.display(),
                            error = %e,
                            "local archive disabled (could not open)"
                        );
                        Self::Disabled
                    }
                }
            }
            ArchiveBackend::None => Self::Disabled,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Notion(_) => "notion",
            Self::Local(_) => "local",
            Self::Disabled => "disabled",
        }
    }
}

impl PaperStore for Archive {
    fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }

    async fn list_existing_urls(&self) -> Result<HashSet<String>> {
        match self {
            Self::Notion(store) => store.existing_urls().await,
            Self::Local(archive) => archive.identity_urls().await,
            Self::Disabled => Ok(HashSet::new()),
        }
    }

    async fn save(&self, paper: &Paper, keyword: &str) -> Result<String> {
        match self {
            Self::Notion(store) => store.create_page(paper, keyword).await,
            Self::Local(archive) => archive.insert_paper(paper, keyword).await,
            Self::Disabled => Err(PaperScoutError::Storage("archive is disabled".into())),
        }
    }
}
