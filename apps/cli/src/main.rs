//! TutorForge CLI — generate multi-section tutorials from documentation sites.
//!
//! Crawls a documentation site, then drives an LLM workflow that outlines,
//! drafts, and compiles a complete Markdown tutorial.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
