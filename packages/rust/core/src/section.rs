//! Per-section drafting pipeline.
//!
//! A section draft is assembled from four independent LLM calls: main body
//! content, key concepts, worked examples, and practice exercises. The main
//! body is required — its failure fails the whole attempt, which the section
//! boundary converts into a placeholder draft. The three auxiliary calls are
//! best-effort: a failure contributes nothing, and even a successful response
//! is appended only when it passes a shape heuristic (emphasis marker, code
//! fence, exercise marker) that filters refusals and junk output.

use tracing::{debug, instrument, warn};

use tutorforge_llm::LlmClient;
use tutorforge_shared::{Outline, Result, SectionSpec, TutorForgeError};

use crate::prompts;

/// Read-only view of the workflow state a section writer needs.
pub struct SectionContext<'a> {
    /// The full crawled corpus.
    pub corpus: &'a str,
    /// The immutable outline; `sections[index]` describes the target section.
    pub outline: &'a Outline,
}

/// Draft one section, absorbing any failure into a placeholder body.
///
/// The caller (the workflow controller) guarantees `index` is in range.
/// This function never fails: failure of one section must not abort the
/// workflow.
#[instrument(skip_all, fields(index))]
pub async fn write_section<C: LlmClient>(
    client: &C,
    ctx: &SectionContext<'_>,
    index: usize,
) -> String {
    match draft_section(client, ctx, index).await {
        Ok(body) => body,
        Err(e) => {
            warn!(index, error = %e, "section draft failed");
            format!("Error generating section content: {e}")
        }
    }
}

async fn draft_section<C: LlmClient>(
    client: &C,
    ctx: &SectionContext<'_>,
    index: usize,
) -> Result<String> {
    let spec = &ctx.outline.sections[index];
    let outline_json = serde_json::to_string(ctx.outline)
        .map_err(|e| TutorForgeError::parse(format!("outline serialization: {e}")))?;

    // Main body is required; its failure fails the section attempt.
    let body = client
        .invoke(&prompts::section_content(ctx.corpus, &outline_json, spec))
        .await
        .map_err(|e| TutorForgeError::Llm(format!("main content: {e}")))?;

    let mut merged = body;

    // Auxiliary sub-calls: independent, best-effort, shape-gated.
    match client.invoke(&prompts::key_concepts(ctx.corpus, spec)).await {
        Ok(concepts) if concepts.contains("**") => {
            merged.push_str("\n\n### Key Concepts\n\n");
            merged.push_str(concepts.trim());
        }
        Ok(_) => debug!(index, "concepts output lacked emphasis markers, dropped"),
        Err(e) => warn!(index, error = %e, "key concepts call failed"),
    }

    match client.invoke(&prompts::examples(ctx.corpus, spec)).await {
        Ok(examples) if examples.contains("```") => {
            merged.push_str("\n\n### Examples\n\n");
            merged.push_str(examples.trim());
        }
        Ok(_) => debug!(index, "examples output lacked a code fence, dropped"),
        Err(e) => warn!(index, error = %e, "examples call failed"),
    }

    match client.invoke(&prompts::exercises(ctx.corpus, spec)).await {
        Ok(exercises) if exercises.to_lowercase().contains("exercise") => {
            merged.push_str("\n\n### Practice Exercises\n\n");
            merged.push_str(exercises.trim());
        }
        Ok(_) => debug!(index, "exercises output lacked an exercise marker, dropped"),
        Err(e) => warn!(index, error = %e, "exercises call failed"),
    }

    Ok(normalize(&merged, spec))
}

// ---------------------------------------------------------------------------
// Normalization passes
// ---------------------------------------------------------------------------

/// Normalize a merged section draft: guarantee a leading header and
/// consistent blank-line separation around fences, headers, and list items.
fn normalize(draft: &str, spec: &SectionSpec) -> String {
    let mut result = draft.trim().to_string();

    result = ensure_leading_header(&result, &spec.title);
    result = space_block_elements(&result);
    result = collapse_blank_runs(&result);

    result.trim_end().to_string()
}

/// Synthesize a section header from the title when the draft lacks one.
fn ensure_leading_header(draft: &str, title: &str) -> String {
    let starts_with_header = draft
        .lines()
        .find(|l| !l.trim().is_empty())
        .is_some_and(|l| l.trim_start().starts_with('#'));

    if starts_with_header {
        draft.to_string()
    } else {
        format!("### {title}\n\n{draft}")
    }
}

/// Insert blank lines around code fences and headers, and before the first
/// item of each list block.
fn space_block_elements(draft: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut in_code_block = false;

    for line in draft.lines() {
        let trimmed = line.trim_start();
        let is_fence = trimmed.starts_with("```");
        let is_header = !in_code_block && trimmed.starts_with('#');
        let is_list_item = !in_code_block
            && (trimmed.starts_with("- ")
                || trimmed.starts_with("* ")
                || starts_with_ordinal(trimmed));

        let prev = out.last().map(String::as_str);
        let prev_blank = prev.is_none_or(|p| p.trim().is_empty());
        let prev_list = prev.is_some_and(|p| {
            let t = p.trim_start();
            t.starts_with("- ") || t.starts_with("* ") || starts_with_ordinal(t)
        });

        let needs_gap = if is_fence || is_header {
            !prev_blank && !(is_fence && in_code_block)
        } else {
            // Only the first item of a list block gets a separating blank.
            is_list_item && !prev_blank && !prev_list
        };

        if needs_gap {
            out.push(String::new());
        }

        // Closing fence: blank line after is handled when the next line arrives.
        let was_closing_fence = is_fence && in_code_block;
        let was_header = is_header;

        if is_fence {
            in_code_block = !in_code_block;
        }

        out.push(line.to_string());

        if (was_closing_fence || was_header) && !in_code_block {
            out.push(String::new());
        }
    }

    out.join("\n")
}

fn starts_with_ordinal(line: &str) -> bool {
    let digits: String = line.chars().take_while(|c| c.is_ascii_digit()).collect();
    !digits.is_empty() && line[digits.len()..].starts_with(". ")
}

/// Collapse runs of 3+ blank lines into exactly one blank line pair.
fn collapse_blank_runs(draft: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut blanks = 0usize;

    for line in draft.lines() {
        if line.trim().is_empty() {
            blanks += 1;
            if blanks <= 1 {
                out.push("");
            }
        } else {
            blanks = 0;
            out.push(line);
        }
    }

    out.join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
