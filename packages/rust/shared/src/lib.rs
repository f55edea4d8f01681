//! Shared types, error model, and configuration for paperscout.
//!
//! This crate is the foundation depended on by all other paperscout crates.
//! It provides:
//! - [`PaperScoutError`]: the unified error type
//! - Domain types ([`Paper`], [`Figure`], [`TranslationStatus`])
//! - Configuration ([`AppConfig`], [`Credentials`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ArchiveBackend, ArchiveConfig, Credentials, FiguresConfig, LineConfig,
    NotionCredentials, PacingConfig, SearchConfig, TranslationConfig, config_dir,
    config_file_path, expand_home, init_config, load_config, load_config_from, require_env,
    validate_config,
};
pub use error::{PaperScoutError, Result};
pub use types::{Figure, MAX_FIGURES, Paper, SkipReason, TranslationStatus};
