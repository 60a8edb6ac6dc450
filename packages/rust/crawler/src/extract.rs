//! Page text extraction.
//!
//! Strips site chrome from a fetched HTML document and converts the main
//! content to markdown-ish text via the `htmd` crate. The crawler keeps a
//! page only when the extracted text clears a minimum word count, so
//! near-empty navigation/boilerplate pages never reach the LLM corpus.

use scraper::{Html, Selector};
use tutorforge_shared::{Result, TutorForgeError};

/// Tags that never contribute tutorial-worthy text.
const SKIP_TAGS: &[&str] = &[
    "script", "style", "nav", "header", "footer", "aside", "iframe", "noscript", "svg",
];

/// Extract the text content of an HTML page.
///
/// Prefers `<main>` or `<article>` as the content root, falling back to
/// `<body>`, then converts the selected HTML to markdown text.
pub fn page_text(html: &str) -> Result<String> {
    let content_html = content_root_html(html);

    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(SKIP_TAGS.to_vec())
        .build();

    converter
        .convert(&content_html)
        .map_err(|e| TutorForgeError::parse(format!("text extraction failed: {e}")))
}

/// Count whitespace-separated words in extracted text.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Select the most content-dense root element and return its HTML.
fn content_root_html(html: &str) -> String {
    let doc = Html::parse_document(html);

    for sel in ["main", "article", "body"] {
        let selector = Selector::parse(sel).expect("valid selector");
        if let Some(el) = doc.select(&selector).next() {
            return el.html();
        }
    }

    html.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_main_over_body() {
        let html = r#"<html><body>
            <nav>Home | Docs | Blog</nav>
            <main><h1>Guide</h1><p>Real content here.</p></main>
            <footer>Copyright</footer>
        </body></html>"#;

        let text = page_text(html).expect("extract");
        assert!(text.contains("Real content here"));
        assert!(!text.contains("Copyright"));
        assert!(!text.contains("Home | Docs"));
    }

    #[test]
    fn strips_script_and_style() {
        let html = r#"<html><body>
            <p>Visible text.</p>
            <script>trackPageView();</script>
            <style>.x { color: red; }</style>
        </body></html>"#;

        let text = page_text(html).expect("extract");
        assert!(text.contains("Visible text"));
        assert!(!text.contains("trackPageView"));
        assert!(!text.contains("color: red"));
    }

    #[test]
    fn word_count_splits_on_whitespace() {
        assert_eq!(word_count("one two  three\nfour"), 4);
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   "), 0);
    }
}
