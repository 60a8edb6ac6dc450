//! Breadth-first, host-contained crawl engine.
//!
//! The crawler starts from a seed URL and performs a sequential BFS bounded
//! by depth and host. Progress is exposed as a lazy [`CrawlEvent`] stream:
//! the caller receives per-URL events incrementally and a terminal
//! [`CrawlEvent::CrawlComplete`] carrying the full ordered page set.
//!
//! A crawler instance is single-use: [`Crawler::crawl`] consumes it, and a
//! new crawl requires constructing a new instance.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use reqwest::Client;
use scraper::{Html, Selector};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use url::Url;

use tutorforge_shared::{CrawlConfig, CrawledPage, Result, TutorForgeError};

use crate::extract;

/// User-Agent string for crawl requests.
const USER_AGENT: &str = concat!("TutorForge/", env!("CARGO_PKG_VERSION"));

/// Extensions that identify binary assets the crawler never fetches.
const BINARY_EXTENSIONS: &[&str] = &[
    ".pdf", ".zip", ".jpg", ".jpeg", ".png", ".gif", ".svg", ".ico", ".mp4", ".webm", ".tar",
    ".gz",
];

/// Buffer size for the crawl event channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

// ---------------------------------------------------------------------------
// CrawlEvent
// ---------------------------------------------------------------------------

/// Incremental crawl progress events.
///
/// Only [`CrawlEvent::CrawlComplete`] is consumed by downstream generation
/// stages; the other variants exist for progress reporting.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CrawlEvent {
    /// A new in-scope link was discovered and enqueued.
    UrlFound { url: String },
    /// A page was fetched and its text kept.
    PageCrawled { url: String, content_length: usize },
    /// A single page failed to fetch or parse; the crawl continues.
    PageError { url: String, message: String },
    /// Terminal event with the full ordered page set.
    CrawlComplete {
        total_pages: usize,
        pages: Vec<CrawledPage>,
    },
}

// ---------------------------------------------------------------------------
// Crawler
// ---------------------------------------------------------------------------

/// Sequential BFS crawler bounded by depth and seed host.
pub struct Crawler {
    seed: Url,
    config: CrawlConfig,
    client: Client,
}

impl Crawler {
    /// Create a new crawler for one crawl invocation.
    pub fn new(seed: Url, config: CrawlConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()
            .map_err(|e| TutorForgeError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            seed,
            config,
            client,
        })
    }

    /// Start the crawl and return the lazy event stream.
    ///
    /// Fetches run sequentially in a spawned task; dropping the receiver
    /// cancels the crawl at the next event boundary.
    pub fn crawl(self) -> mpsc::Receiver<CrawlEvent> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        tokio::spawn(async move {
            self.run(tx).await;
        });
        rx
    }

    async fn run(self, tx: mpsc::Sender<CrawlEvent>) {
        let seed_host = self.seed.host_str().unwrap_or_default().to_string();

        // `visited` is updated at enqueue time, so a URL is enqueued at most once.
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(normalize_url(&self.seed));

        let mut queue: VecDeque<(Url, u32)> = VecDeque::new();
        queue.push_back((self.seed.clone(), 0));

        let mut pages: Vec<CrawledPage> = Vec::new();

        info!(seed = %self.seed, max_depth = self.config.max_depth, "starting crawl");

        while let Some((url, depth)) = queue.pop_front() {
            if depth > self.config.max_depth {
                continue;
            }

            debug!(%url, depth, "fetching page");

            let body = match self.fetch(&url).await {
                Ok(body) => body,
                Err(e) => {
                    warn!(%url, error = %e, "page fetch failed");
                    let event = CrawlEvent::PageError {
                        url: url.to_string(),
                        message: e.to_string(),
                    };
                    if tx.send(event).await.is_err() {
                        return;
                    }
                    continue;
                }
            };

            // Parse and extract synchronously so no `Html` lives across an await.
            let (text, links) = process_body(&body, &url);

            if let Some(text) = text {
                if extract::word_count(&text) > self.config.min_content_words {
                    let event = CrawlEvent::PageCrawled {
                        url: url.to_string(),
                        content_length: text.len(),
                    };
                    pages.push(CrawledPage {
                        url: url.to_string(),
                        content: text,
                    });
                    if tx.send(event).await.is_err() {
                        return;
                    }
                } else {
                    debug!(%url, "page below word threshold, skipping");
                }
            }

            // Leaf-depth pages are not explored for further links.
            if depth < self.config.max_depth {
                for link in links {
                    let normalized = normalize_url(&link);

                    if link.host_str().unwrap_or_default() != seed_host {
                        continue;
                    }
                    if is_binary_asset(&link) {
                        continue;
                    }
                    if !visited.insert(normalized.clone()) {
                        continue;
                    }

                    match Url::parse(&normalized) {
                        Ok(next) => queue.push_back((next, depth + 1)),
                        Err(_) => continue,
                    }

                    let event = CrawlEvent::UrlFound { url: normalized };
                    if tx.send(event).await.is_err() {
                        return;
                    }
                }
            }
        }

        info!(total_pages = pages.len(), "crawl complete");

        let _ = tx
            .send(CrawlEvent::CrawlComplete {
                total_pages: pages.len(),
                pages,
            })
            .await;
    }

    async fn fetch(&self, url: &Url) -> Result<String> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| TutorForgeError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TutorForgeError::Network(format!("{url}: HTTP {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| TutorForgeError::Network(format!("{url}: body read failed: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

/// Extract page text and outgoing links from a fetched body.
///
/// Text extraction failure is non-fatal: the page contributes no content
/// but its links are still discovered.
fn process_body(body: &str, base_url: &Url) -> (Option<String>, Vec<Url>) {
    let links = {
        let doc = Html::parse_document(body);
        extract_links(&doc, base_url)
    };

    let text = extract::page_text(body).ok();
    (text, links)
}

/// Extract all links from a document, resolved against the base URL.
fn extract_links(doc: &Html, base_url: &Url) -> Vec<Url> {
    let link_sel = Selector::parse("a[href]").expect("valid selector");
    let mut links = Vec::new();

    for el in doc.select(&link_sel) {
        if let Some(href) = el.value().attr("href") {
            // Skip anchors, javascript:, mailto:
            if href.starts_with('#')
                || href.starts_with("javascript:")
                || href.starts_with("mailto:")
            {
                continue;
            }

            if let Ok(resolved) = base_url.join(href) {
                links.push(resolved);
            }
        }
    }

    links
}

/// Normalize a URL for crawl-visit identity: fragment and query are stripped,
/// so two URLs differing only in those parts are the same node.
pub fn normalize_url(url: &Url) -> String {
    let mut normalized = url.clone();
    normalized.set_fragment(None);
    normalized.set_query(None);
    normalized.to_string()
}

/// Check whether a URL points at a binary asset by extension.
fn is_binary_asset(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    BINARY_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
