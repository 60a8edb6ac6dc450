//! End-to-end generation pipeline: URL → crawl → workflow → final document.

use std::time::Instant;

use tracing::{info, instrument};
use url::Url;
use uuid::Uuid;

use tutorforge_crawler::{CrawlEvent, Crawler};
use tutorforge_llm::LlmClient;
use tutorforge_shared::{CrawlConfig, Result, TutorForgeError};

use crate::compile::CompileOptions;
use crate::workflow::{self, Stage, TutorialState, WorkflowProgress};

/// Configuration for one generation request.
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    /// Seed URL to crawl.
    pub url: Url,
    /// Generation request text; defaults to a request synthesized from the URL.
    pub query: Option<String>,
    /// Crawl configuration.
    pub crawl: CrawlConfig,
    /// Whether to emit the generated-at metadata line in the document.
    pub include_metadata: bool,
}

/// Result of one generation request.
#[derive(Debug, Clone)]
pub struct GenerateResult {
    /// Unique request identifier (UUID v7).
    pub request_id: String,
    /// Tutorial title (empty when the outline stage failed).
    pub title: String,
    /// The compiled Markdown document.
    pub document: String,
    /// Number of pages that survived the crawl filter.
    pub page_count: usize,
    /// Section count from the outline.
    pub sections_total: usize,
    /// Sections whose draft is a generation-error placeholder.
    pub sections_failed: usize,
    /// Terminal workflow error, if any.
    pub error: Option<String>,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Progress callback for the full pipeline.
pub trait ProgressReporter: WorkflowProgress {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called for each crawl event.
    fn crawl_event(&self, event: &CrawlEvent);
    /// Called when the pipeline completes.
    fn done(&self, result: &GenerateResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl WorkflowProgress for SilentProgress {
    fn stage(&self, _stage: Stage, _percent: u8, _detail: &str) {}
}

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn crawl_event(&self, _event: &CrawlEvent) {}
    fn done(&self, _result: &GenerateResult) {}
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Run the full generation pipeline.
///
/// 1. Crawl the documentation site, streaming progress
/// 2. Join kept pages into the generation corpus
/// 3. Run the tutorial workflow (outline → sections → compile)
#[instrument(skip_all, fields(url = %config.url))]
pub async fn generate_tutorial<C: LlmClient, P: ProgressReporter>(
    config: &GenerateConfig,
    client: &C,
    progress: &P,
) -> Result<GenerateResult> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    info!(%request_id, url = %config.url, "starting generation request");

    // --- Phase 1: Crawl ---
    progress.phase("Crawling documentation");
    let crawler = Crawler::new(config.url.clone(), config.crawl.clone())?;
    let mut events = crawler.crawl();

    let mut pages = Vec::new();
    while let Some(event) = events.recv().await {
        progress.crawl_event(&event);
        if let CrawlEvent::CrawlComplete { pages: complete, .. } = event {
            pages = complete;
        }
    }

    if pages.is_empty() {
        return Err(TutorForgeError::validation(
            "could not find any content to process",
        ));
    }

    // --- Phase 2: Build corpus ---
    let corpus = pages
        .iter()
        .map(|p| format!("Source URL: {}\n\n{}", p.url, p.content))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n");

    let query = config.query.clone().unwrap_or_else(|| {
        format!(
            "Create a comprehensive tutorial from the documentation at {}",
            config.url
        )
    });

    // --- Phase 3: Workflow ---
    progress.phase("Generating tutorial");
    let compile_opts = CompileOptions {
        generated_at: config
            .include_metadata
            .then(|| chrono::Utc::now().to_rfc3339()),
    };

    let state = TutorialState::new(query, corpus);
    let state = workflow::run_workflow(client, state, &compile_opts, progress).await;

    let result = GenerateResult {
        request_id,
        title: state
            .outline
            .as_ref()
            .map(|o| o.title.clone())
            .unwrap_or_default(),
        sections_total: state.outline.as_ref().map_or(0, |o| o.sections.len()),
        sections_failed: state
            .drafts
            .values()
            .filter(|d| d.starts_with("Error generating section content:"))
            .count(),
        document: state.final_document,
        page_count: pages.len(),
        error: state.error,
        elapsed: start.elapsed(),
    };

    progress.done(&result);

    info!(
        request_id = %result.request_id,
        page_count = result.page_count,
        sections_total = result.sections_total,
        sections_failed = result.sections_failed,
        elapsed_ms = result.elapsed.as_millis(),
        "generation request finished"
    );

    Ok(result)
}

/// Derive a filesystem-safe slug from a tutorial title.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_dash = true;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }

    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() { "tutorial".into() } else { slug }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{ScriptedLlm, ok};

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("Intro to Widgets"), "intro-to-widgets");
        assert_eq!(slugify("Rust: The Book!"), "rust-the-book");
        assert_eq!(slugify("///"), "tutorial");
    }

    fn filler(topic: &str) -> String {
        format!(
            "This page explains {topic} with enough words to clear the \
             crawler's minimum content threshold for keeping a page. "
        )
        .repeat(5)
    }

    async fn mock_site() -> wiremock::MockServer {
        let server = wiremock::MockServer::start().await;
        let body = format!(
            r#"<html><body><main><h1>Widgets</h1><p>{}</p></main></body></html>"#,
            filler("widgets")
        );
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;
        server
    }

    fn config(url: &str) -> GenerateConfig {
        GenerateConfig {
            url: Url::parse(url).expect("valid url"),
            query: Some("teach me widgets".into()),
            crawl: CrawlConfig {
                max_depth: 0,
                fetch_timeout_secs: 10,
                min_content_words: 50,
            },
            include_metadata: false,
        }
    }

    #[tokio::test]
    async fn end_to_end_single_page_single_section() {
        let server = mock_site().await;

        let client = ScriptedLlm::new([
            ok(r#"{"title": "Widget Tutorial", "sections": [{"title": "Basics", "brief_description": "Widget basics"}]}"#),
            ok("Widgets are configured via TOML."),
            ok("- **Widget** — the unit of work."),
            ok("```toml\n[widget]\n```"),
            ok("Exercise 1: configure a widget."),
        ]);

        let result = generate_tutorial(&config(&server.uri()), &client, &SilentProgress)
            .await
            .expect("pipeline");

        assert_eq!(result.title, "Widget Tutorial");
        assert_eq!(result.page_count, 1);
        assert_eq!(result.sections_total, 1);
        assert_eq!(result.sections_failed, 0);
        assert!(result.error.is_none());
        assert!(result.document.contains("# Widget Tutorial"));
        assert!(result.document.contains("## 1. Basics"));
        assert!(result.document.contains("Widgets are configured via TOML"));
    }

    #[tokio::test]
    async fn empty_crawl_is_a_terminal_error() {
        // Nothing mounted: the seed fetch 404s and no pages survive.
        let server = wiremock::MockServer::start().await;
        let client = ScriptedLlm::new([]);

        let err = generate_tutorial(&config(&server.uri()), &client, &SilentProgress)
            .await
            .expect_err("no content");

        assert!(err.to_string().contains("could not find any content"));
        assert_eq!(client.remaining(), 0);
    }
}
