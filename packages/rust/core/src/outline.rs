//! Outline generation: one LLM call converting the crawled corpus into a
//! structured section list.
//!
//! The model is asked for JSON but rarely returns it bare: the extractor
//! tolerates fenced blocks and surrounding prose, falling back to a scan for
//! the first balanced `{...}` span. Any failure here is reported as an error
//! to the workflow, never a panic.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, instrument};

use tutorforge_llm::LlmClient;
use tutorforge_shared::{Outline, Result, TutorForgeError};

use crate::prompts;

/// Maximum corpus prefix submitted with the outline prompt.
pub const MAX_CORPUS_CHARS: usize = 20_000;

/// Generate a tutorial outline from the crawled corpus.
///
/// An empty `sections` list is a valid result: the workflow then compiles an
/// empty tutorial rather than rejecting the outline at this layer.
#[instrument(skip_all, fields(corpus_len = corpus.len()))]
pub async fn generate_outline<C: LlmClient>(
    client: &C,
    corpus: &str,
    query: &str,
) -> Result<Outline> {
    let excerpt = truncate_prefix(corpus, MAX_CORPUS_CHARS);
    let prompt = prompts::outline(excerpt, query);

    let response = client
        .invoke(&prompt)
        .await
        .map_err(|e| TutorForgeError::Llm(format!("outline call failed: {e}")))?;

    let json = extract_json_object(&response).ok_or_else(|| {
        TutorForgeError::parse(format!(
            "no JSON object found in outline response ({} chars)",
            response.len()
        ))
    })?;

    let outline: Outline = serde_json::from_str(&json)
        .map_err(|e| TutorForgeError::parse(format!("invalid outline JSON: {e}")))?;

    debug!(
        title = %outline.title,
        sections = outline.sections.len(),
        "outline parsed"
    );

    Ok(outline)
}

/// Take a prefix of at most `max` bytes, backed off to a char boundary.
fn truncate_prefix(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Extract the first JSON object from an LLM response.
///
/// Tries, in order: a ```json fenced block, any fenced block, then a scan
/// for the first balanced `{...}` span outside string literals.
fn extract_json_object(response: &str) -> Option<String> {
    static JSON_FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?s)```json\s*(\{.*?\})\s*```").expect("valid regex")
    });
    static ANY_FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?s)```\s*(\{.*?\})\s*```").expect("valid regex")
    });

    if let Some(caps) = JSON_FENCE_RE.captures(response) {
        return Some(caps[1].to_string());
    }
    if let Some(caps) = ANY_FENCE_RE.captures(response) {
        return Some(caps[1].to_string());
    }

    balanced_object_span(response)
}

/// Scan for the first `{`..`}` span with balanced braces, skipping braces
/// inside string literals.
fn balanced_object_span(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[start..start + i + c.len_utf8()].to_string());
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUTLINE_JSON: &str = r#"{"title": "Widget Guide", "sections": [{"title": "Intro", "brief_description": "What widgets are"}]}"#;

    #[test]
    fn extracts_from_json_fence() {
        let response = format!("Here is the outline:\n```json\n{OUTLINE_JSON}\n```\nDone.");
        let json = extract_json_object(&response).expect("extracted");
        let outline: Outline = serde_json::from_str(&json).expect("parsed");
        assert_eq!(outline.title, "Widget Guide");
    }

    #[test]
    fn extracts_from_unlabeled_fence() {
        let response = format!("```\n{OUTLINE_JSON}\n```");
        assert!(extract_json_object(&response).is_some());
    }

    #[test]
    fn extracts_bare_object_surrounded_by_prose() {
        let response = format!("Sure! The outline is {OUTLINE_JSON} — let me know.");
        let json = extract_json_object(&response).expect("extracted");
        let outline: Outline = serde_json::from_str(&json).expect("parsed");
        assert_eq!(outline.sections.len(), 1);
    }

    #[test]
    fn braces_inside_strings_do_not_unbalance() {
        let response = r#"{"title": "Uses {braces}", "sections": []}"#;
        let json = extract_json_object(response).expect("extracted");
        let outline: Outline = serde_json::from_str(&json).expect("parsed");
        assert_eq!(outline.title, "Uses {braces}");
    }

    #[test]
    fn prose_without_json_yields_none() {
        let response = "I could not produce an outline for this content, sorry.";
        assert!(extract_json_object(response).is_none());
    }

    #[test]
    fn truncate_prefix_respects_char_boundaries() {
        let s = "héllo wörld";
        let t = truncate_prefix(s, 2);
        assert!(s.starts_with(t));
        assert!(t.len() <= 2);

        assert_eq!(truncate_prefix("short", 100), "short");
    }
}
