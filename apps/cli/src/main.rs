//! PaperScout CLI: daily arXiv paper discovery.
//!
//! Searches arXiv for the configured queries, attaches figures and a
//! translated abstract to new papers, sends them to LINE, and archives them.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
