//! Application configuration for paperscout.
//!
//! User config lives at `~/.paperscout/paperscout.toml`.
//! CLI flags override config file values, which override defaults.
//! Secrets never live in the file: each section names the env var holding them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PaperScoutError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "paperscout.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".paperscout";

// ---------------------------------------------------------------------------
// Config structs (matching paperscout.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub pacing: PacingConfig,

    #[serde(default)]
    pub figures: FiguresConfig,

    #[serde(default)]
    pub translation: TranslationConfig,

    #[serde(default)]
    pub line: LineConfig,

    #[serde(default)]
    pub archive: ArchiveConfig,
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Queries processed in order on each run.
    #[serde(default = "default_queries")]
    pub queries: Vec<String>,

    /// Papers handed off per query.
    #[serde(default = "default_papers_per_query")]
    pub papers_per_query: usize,

    /// Stop issuing queries once this many new papers were processed.
    #[serde(default = "default_max_new_papers")]
    pub max_new_papers_per_day: usize,

    /// Candidates requested per wanted paper, to absorb filtering loss.
    #[serde(default = "default_candidate_multiplier")]
    pub candidate_multiplier: usize,

    /// arXiv export API endpoint.
    #[serde(default = "default_search_api_url")]
    pub api_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            queries: default_queries(),
            papers_per_query: default_papers_per_query(),
            max_new_papers_per_day: default_max_new_papers(),
            candidate_multiplier: default_candidate_multiplier(),
            api_url: default_search_api_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_queries() -> Vec<String> {
    vec![
        "typhoon intensity prediction".into(),
        "tropical cyclone track forecast".into(),
        "hurricane eye wall replacement".into(),
        "typhoon landfall prediction".into(),
    ]
}
fn default_papers_per_query() -> usize {
    1
}
fn default_max_new_papers() -> usize {
    2
}
fn default_candidate_multiplier() -> usize {
    3
}
fn default_search_api_url() -> String {
    "https://export.arxiv.org/api/query".into()
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[pacing]` section. All values in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Delay between per-entry page requests during discovery.
    #[serde(default = "default_request_interval")]
    pub request_interval_ms: u64,

    /// Delay after each notification.
    #[serde(default = "default_message_interval")]
    pub message_interval_ms: u64,

    /// Delay between queries.
    #[serde(default = "default_query_interval")]
    pub query_interval_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            request_interval_ms: default_request_interval(),
            message_interval_ms: default_message_interval(),
            query_interval_ms: default_query_interval(),
        }
    }
}

impl PacingConfig {
    /// No delays at all (tests, dry runs).
    pub fn none() -> Self {
        Self {
            request_interval_ms: 0,
            message_interval_ms: 0,
            query_interval_ms: 0,
        }
    }
}

fn default_request_interval() -> u64 {
    1_000
}
fn default_message_interval() -> u64 {
    2_000
}
fn default_query_interval() -> u64 {
    5_000
}

/// `[figures]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiguresConfig {
    /// Base URL of rendered HTML papers (`<base><id>`).
    #[serde(default = "default_html_base")]
    pub html_base: String,

    /// Base URL of abstract pages, used when no rendered page exists.
    #[serde(default = "default_abs_base")]
    pub abs_base: String,

    /// Base URL of paper source files, probed for conventional figure names.
    #[serde(default = "default_src_base")]
    pub src_base: String,

    /// Whether to probe conventional figure filenames.
    #[serde(default = "default_true")]
    pub probe_catalogue: bool,

    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
}

impl Default for FiguresConfig {
    fn default() -> Self {
        Self {
            html_base: default_html_base(),
            abs_base: default_abs_base(),
            src_base: default_src_base(),
            probe_catalogue: true,
            probe_timeout_secs: default_probe_timeout(),
        }
    }
}

fn default_html_base() -> String {
    "https://arxiv.org/html/".into()
}
fn default_abs_base() -> String {
    "https://arxiv.org/abs/".into()
}
fn default_src_base() -> String {
    "https://arxiv.org/src/".into()
}
fn default_true() -> bool {
    true
}
fn default_probe_timeout() -> u64 {
    5
}

/// `[translation]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// Name of the env var holding the DeepL key.
    #[serde(default = "default_deepl_key_env")]
    pub api_key_env: String,

    /// Explicit API endpoint; derived from the key type when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default = "default_target_lang")]
    pub target_lang: String,

    /// Texts longer than this are split into sentence chunks.
    #[serde(default = "default_chunk_threshold")]
    pub chunk_threshold: usize,

    /// Character limit assumed when the usage endpoint is unreachable.
    #[serde(default = "default_fallback_limit")]
    pub fallback_limit: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_deepl_key_env(),
            api_url: None,
            target_lang: default_target_lang(),
            chunk_threshold: default_chunk_threshold(),
            fallback_limit: default_fallback_limit(),
        }
    }
}

fn default_deepl_key_env() -> String {
    "DEEPL_API_KEY".into()
}
fn default_target_lang() -> String {
    "JA".into()
}
fn default_chunk_threshold() -> usize {
    4_000
}
fn default_fallback_limit() -> u64 {
    500_000
}

/// `[line]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineConfig {
    #[serde(default = "default_line_token_env")]
    pub token_env: String,

    #[serde(default = "default_line_user_env")]
    pub user_id_env: String,

    #[serde(default = "default_line_api_url")]
    pub api_url: String,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            token_env: default_line_token_env(),
            user_id_env: default_line_user_env(),
            api_url: default_line_api_url(),
        }
    }
}

fn default_line_token_env() -> String {
    "LINE_CHANNEL_ACCESS_TOKEN".into()
}
fn default_line_user_env() -> String {
    "LINE_USER_ID".into()
}
fn default_line_api_url() -> String {
    "https://api.line.me".into()
}

/// Which persistence collaborator archives processed papers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveBackend {
    /// Notion workspace database.
    #[default]
    Notion,
    /// Local libSQL database file.
    Local,
    /// No persistence; only in-run deduplication applies.
    None,
}

/// `[archive]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    #[serde(default)]
    pub backend: ArchiveBackend,

    #[serde(default = "default_notion_token_env")]
    pub notion_token_env: String,

    #[serde(default = "default_notion_database_env")]
    pub notion_database_env: String,

    #[serde(default = "default_notion_api_url")]
    pub notion_api_url: String,

    /// Name of the database's title property.
    #[serde(default = "default_notion_title_property")]
    pub notion_title_property: String,

    /// Database file for the local backend.
    #[serde(default = "default_local_path")]
    pub local_path: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            backend: ArchiveBackend::default(),
            notion_token_env: default_notion_token_env(),
            notion_database_env: default_notion_database_env(),
            notion_api_url: default_notion_api_url(),
            notion_title_property: default_notion_title_property(),
            local_path: default_local_path(),
        }
    }
}

fn default_notion_token_env() -> String {
    "NOTION_TOKEN".into()
}
fn default_notion_database_env() -> String {
    "NOTION_DATABASE_ID".into()
}
fn default_notion_api_url() -> String {
    "https://api.notion.com".into()
}
fn default_notion_title_property() -> String {
    "Name".into()
}
fn default_local_path() -> String {
    "~/.paperscout/archive.db".into()
}

/// Expand a leading `~/` against the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

// ---------------------------------------------------------------------------
// Credentials (resolved from env vars named in the config)
// ---------------------------------------------------------------------------

/// Notion access, present only when both values are set.
#[derive(Debug, Clone)]
pub struct NotionCredentials {
    pub token: String,
    pub database_id: String,
}

/// Secrets resolved from the environment at startup.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub deepl_key: String,
    pub line_token: String,
    pub line_user_id: String,
    /// `None` disables the Notion backend.
    pub notion: Option<NotionCredentials>,
}

impl Credentials {
    /// Resolve all credentials. Translation and messaging are mandatory;
    /// Notion is optional.
    pub fn resolve(config: &AppConfig) -> Result<Self> {
        let deepl_key = require_env(&config.translation.api_key_env, "DeepL API key")?;
        let line_token = require_env(&config.line.token_env, "LINE channel access token")?;
        let line_user_id = require_env(&config.line.user_id_env, "LINE user id")?;

        let notion = match (
            read_env(&config.archive.notion_token_env),
            read_env(&config.archive.notion_database_env),
        ) {
            (Some(token), Some(database_id)) => Some(NotionCredentials { token, database_id }),
            _ => {
                if config.archive.backend == ArchiveBackend::Notion {
                    tracing::warn!(
                        token_env = %config.archive.notion_token_env,
                        database_env = %config.archive.notion_database_env,
                        "Notion credentials missing, persistence disabled"
                    );
                }
                None
            }
        };

        Ok(Self {
            deepl_key,
            line_token,
            line_user_id,
            notion,
        })
    }
}

fn read_env(var_name: &str) -> Option<String> {
    std::env::var(var_name).ok().filter(|v| !v.trim().is_empty())
}

/// Read a mandatory env var, failing with a config error naming it.
pub fn require_env(var_name: &str, what: &str) -> Result<String> {
    read_env(var_name).ok_or_else(|| {
        PaperScoutError::config(format!(
            "{what} not found. Set the {var_name} environment variable."
        ))
    })
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.paperscout/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| PaperScoutError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.paperscout/paperscout.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| PaperScoutError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        PaperScoutError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Reject settings the pipeline cannot run with.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    if config.search.papers_per_query == 0 {
        return Err(PaperScoutError::config("search.papers_per_query must be at least 1"));
    }
    if config.search.candidate_multiplier == 0 {
        return Err(PaperScoutError::config(
            "search.candidate_multiplier must be at least 1",
        ));
    }
    if config.translation.chunk_threshold == 0 {
        return Err(PaperScoutError::config(
            "translation.chunk_threshold must be positive",
        ));
    }
    Ok(())
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| PaperScoutError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| PaperScoutError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| PaperScoutError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
