//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use paperscout_core::pipeline::{
    Pipeline, PipelineSettings, ProgressReporter, RunSummary, StopReason,
};
use paperscout_discovery::{ArxivClient, PaperSearch};
use paperscout_figures::{FigureExtractor, HttpFetcher};
use paperscout_notify::LineMessenger;
use paperscout_shared::{
    AppConfig, Credentials, Paper, init_config, load_config, load_config_from, require_env,
};
use paperscout_storage::Archive;
use paperscout_translate::{DeepLClient, Translator};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// PaperScout: daily arXiv discovery with figures, translation, and delivery.
#[derive(Parser)]
#[command(
    name = "paperscout",
    version,
    about = "Find new arXiv papers, translate their abstracts, and deliver them to LINE.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file to use instead of ~/.paperscout/paperscout.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the daily pipeline over the configured queries.
    Run {
        /// Query to run instead of the configured list (repeatable).
        #[arg(short, long = "query")]
        queries: Vec<String>,
    },

    /// Search arXiv and print the results without filtering or delivery.
    Search {
        /// Free-text query.
        query: String,

        /// Maximum number of results.
        #[arg(short = 'n', long, default_value = "5")]
        max_results: usize,

        /// Also locate figures for each result.
        #[arg(long)]
        figures: bool,

        /// Download each result's PDF into this directory.
        #[arg(long)]
        download: Option<PathBuf>,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show translation quota usage.
    Usage,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Create a default config file.
    Init,
    /// Show the resolved config.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "paperscout=info",
        1 => "paperscout=debug",
        _ => "paperscout=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Run { queries } => cmd_run(config_path, queries).await,
        Command::Search {
            query,
            max_results,
            figures,
            download,
            json,
        } => {
            cmd_search(
                config_path,
                &query,
                max_results,
                figures,
                download.as_deref(),
                json,
            )
            .await
        }
        Command::Usage => cmd_usage(config_path).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(config_path).await,
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    Ok(match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    })
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_run(config_path: Option<&Path>, queries: Vec<String>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let queries = if queries.is_empty() {
        config.search.queries.clone()
    } else {
        queries
    };
    if queries.is_empty() {
        return Err(eyre!("no queries configured: add [search] queries or pass --query"));
    }

    // Mandatory collaborators fail here, before any query is issued.
    let credentials = Credentials::resolve(&config)?;
    let translator = DeepLClient::new(&credentials.deepl_key, &config.translation)?;
    let messenger = LineMessenger::new(
        &credentials.line_token,
        &credentials.line_user_id,
        &config.line,
    )?;
    let archive = Archive::from_config(&config.archive, credentials.notion.as_ref()).await;
    let search = ArxivClient::new(&config.search)?;
    let figures = FigureExtractor::new(HttpFetcher::new(&config.figures)?, config.figures.clone());

    info!(
        queries = queries.len(),
        archive = archive.name(),
        cap = config.search.max_new_papers_per_day,
        "starting run"
    );

    let mut pipeline = Pipeline::new(
        search,
        figures,
        translator,
        messenger,
        archive,
        PipelineSettings::from(&config),
    );
    let reporter = CliProgress::new();
    let summary = pipeline.run(&queries, &reporter).await;

    println!();
    println!("  Run complete");
    println!("  Queries:   {}/{}", summary.queries_run, queries.len());
    println!("  Processed: {}", summary.papers_processed);
    println!(
        "  Stopped:   {}",
        match summary.stop {
            StopReason::QueriesExhausted => "all queries done",
            StopReason::DailyCapReached => "daily limit reached",
        }
    );
    if !summary.handoff_failures.is_empty() {
        println!("  Failures:");
        for failure in &summary.handoff_failures {
            println!(
                "    {} ({}): {}",
                failure.arxiv_id, failure.step, failure.reason
            );
        }
    }
    println!();

    Ok(())
}

async fn cmd_search(
    config_path: Option<&Path>,
    query: &str,
    max_results: usize,
    with_figures: bool,
    download: Option<&Path>,
    json: bool,
) -> Result<()> {
    let config = resolve_config(config_path)?;
    let client = ArxivClient::new(&config.search)?;

    let mut papers = client.search(query, max_results).await?;

    if with_figures {
        let extractor =
            FigureExtractor::new(HttpFetcher::new(&config.figures)?, config.figures.clone());
        for paper in &mut papers {
            let scan = extractor.extract(&paper.url).await;
            paper.attach_figures(scan.figures);
        }
    }

    if let Some(dir) = download {
        for paper in &papers {
            match client.download_pdf(paper, dir).await {
                Ok(path) => info!(path = %path.display(), "downloaded"),
                Err(e) => tracing::warn!(id = %paper.arxiv_id, error = %e, "download failed"),
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&papers)?);
        return Ok(());
    }

    if papers.is_empty() {
        println!("No papers found for '{query}'.");
        return Ok(());
    }
    for (i, paper) in papers.iter().enumerate() {
        print_paper(paper, i + 1, papers.len());
    }
    Ok(())
}

fn print_paper(paper: &Paper, n: usize, total: usize) {
    println!("[{n}/{total}] {}", paper.title);
    println!("  ID:         {}", paper.arxiv_id);
    println!("  Authors:    {}", paper.authors_str());
    println!("  Published:  {}", paper.published);
    println!("  Categories: {}", paper.categories.join(", "));
    if let Some(pdf) = &paper.pdf_url {
        println!("  PDF:        {pdf}");
    }
    if let Some(doi) = &paper.doi {
        println!("  DOI:        {doi}");
    }
    for (i, figure) in paper.figures.iter().enumerate() {
        println!("  Figure {}:   {}", i + 1, figure.url);
    }
    println!();
}

async fn cmd_usage(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let key = require_env(&config.translation.api_key_env, "DeepL API key")?;
    let client = DeepLClient::new(key, &config.translation)?;

    let usage = client.usage().await?;
    println!("Endpoint:  {}", client.api_url());
    println!("Used:      {}", usage.used);
    println!("Limit:     {}", usage.limit);
    println!("Remaining: {}", usage.remaining());
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn query_started(&self, query: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Query [{current}/{total}] {query}"));
    }

    fn paper_started(&self, title: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Paper [{current}/{total}] {title}"));
    }

    fn done(&self, _summary: &RunSummary) {
        self.spinner.finish_and_clear();
    }
}
