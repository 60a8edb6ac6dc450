//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use url::Url;

use tutorforge_core::pipeline::{
    GenerateConfig, GenerateResult, ProgressReporter, generate_tutorial, slugify,
};
use tutorforge_core::workflow::{Stage, WorkflowProgress};
use tutorforge_crawler::CrawlEvent;
use tutorforge_llm::OpenRouterClient;
use tutorforge_shared::{AppConfig, init_config, load_config, resolve_api_key};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// TutorForge — turn documentation sites into complete tutorials.
#[derive(Parser)]
#[command(
    name = "tutorforge",
    version,
    about = "Crawl a documentation site and generate a multi-section Markdown tutorial.",
    long_about = None,
)]
pub(crate) struct Cli {
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
    /// Crawl a documentation site and generate a tutorial from it.
    Generate {
        /// Seed documentation URL to crawl.
        url: String,

        /// What the tutorial should cover (defaults to a request derived
        /// from the URL).
        #[arg(short, long)]
        query: Option<String>,

        /// Maximum crawl depth from the seed URL.
        #[arg(short, long)]
        depth: Option<u32>,

        /// Output directory for the generated tutorial.
        #[arg(short, long)]
        out: Option<String>,

        /// Model ID override for all generation calls.
        #[arg(short, long)]
        model: Option<String>,

        /// Omit the generated-at metadata line from the document.
        #[arg(long)]
        no_metadata: bool,
    },

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
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "tutorforge=info",
        1 => "tutorforge=debug",
        _ => "tutorforge=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
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
    match cli.command {
        Command::Generate {
            url,
            query,
            depth,
            out,
            model,
            no_metadata,
        } => {
            cmd_generate(
                &url,
                query,
                depth,
                out.as_deref(),
                model.as_deref(),
                no_metadata,
            )
            .await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

async fn cmd_generate(
    url: &str,
    query: Option<String>,
    depth: Option<u32>,
    out: Option<&str>,
    model: Option<&str>,
    no_metadata: bool,
) -> Result<()> {
    let mut config = load_config()?;

    if let Some(model) = model {
        config.llm.model = model.to_string();
    }
    if let Some(depth) = depth {
        config.crawl.max_depth = depth;
    }

    // Fail on a missing API key before any network work.
    resolve_api_key(&config.llm)?;

    let parsed_url = Url::parse(url).map_err(|e| eyre!("invalid URL '{url}': {e}"))?;

    let output_dir = match out {
        Some(p) => expand_home(p),
        None => expand_home(&config.defaults.output_dir),
    };

    let generate_config = GenerateConfig {
        url: parsed_url,
        query,
        crawl: config.crawl.clone(),
        include_metadata: !no_metadata,
    };

    info!(url, model = %config.llm.model, depth = config.crawl.max_depth, "generating tutorial");

    let client = OpenRouterClient::from_config(&config.llm)?;
    let reporter = CliProgress::new();

    let result = generate_tutorial(&generate_config, &client, &reporter).await?;

    std::fs::create_dir_all(&output_dir)
        .map_err(|e| eyre!("cannot create output directory '{}': {e}", output_dir.display()))?;

    let slug = if result.title.is_empty() {
        slugify(url)
    } else {
        slugify(&result.title)
    };
    let output_path = output_dir.join(format!("{slug}.md"));
    std::fs::write(&output_path, &result.document)
        .map_err(|e| eyre!("cannot write '{}': {e}", output_path.display()))?;

    println!();
    if let Some(error) = &result.error {
        println!("  Tutorial generation failed: {error}");
    } else {
        println!("  Tutorial generated successfully!");
    }
    println!("  Title:    {}", result.title);
    println!("  Pages:    {}", result.page_count);
    println!(
        "  Sections: {} ({} failed)",
        result.sections_total, result.sections_failed
    );
    println!("  Path:     {}", output_path.display());
    println!("  Time:     {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

/// Expand a leading `~/` to the user's home directory.
fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => PathBuf::from(path),
        },
        None => PathBuf::from(path),
    }
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
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl WorkflowProgress for CliProgress {
    fn stage(&self, _stage: Stage, percent: u8, detail: &str) {
        self.spinner.set_message(format!("[{percent:>3}%] {detail}"));
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn crawl_event(&self, event: &CrawlEvent) {
        match event {
            CrawlEvent::UrlFound { url } => {
                self.spinner.set_message(format!("Found {url}"));
            }
            CrawlEvent::PageCrawled { url, .. } => {
                self.spinner.set_message(format!("Crawled {url}"));
            }
            CrawlEvent::PageError { url, message } => {
                self.spinner.set_message(format!("Skipped {url}: {message}"));
            }
            CrawlEvent::CrawlComplete { total_pages, .. } => {
                self.spinner
                    .set_message(format!("Crawl complete: {total_pages} pages"));
            }
        }
    }

    fn done(&self, _result: &GenerateResult) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// Config commands
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
