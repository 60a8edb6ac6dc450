//! Tutorial generation state machine.
//!
//! Stages: `Outlining → Dispatching → Writing → Dispatching → ... →
//! Compiling → Done`. `Dispatching` is a decision point, not an LLM call:
//! it compares the draft count against the outline's section count and
//! either dispatches the next section write or moves to compilation.
//!
//! Failure isolation follows a fixed policy: an outline failure
//! short-circuits to compilation with the error preserved; a section failure
//! becomes a placeholder draft and never blocks later sections; compilation
//! always runs exactly once per request.

use std::collections::BTreeMap;

use tracing::{info, instrument, warn};

use tutorforge_llm::LlmClient;
use tutorforge_shared::Outline;

use crate::compile::{self, CompileOptions};
use crate::outline;
use crate::section::{self, SectionContext};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Per-request workflow state, threaded through every stage.
///
/// Created fresh for each generation request and discarded after the final
/// document is emitted; nothing persists across requests.
#[derive(Debug, Clone)]
pub struct TutorialState {
    /// The original generation request.
    pub query: String,
    /// Concatenated crawled text, immutable after the crawl.
    pub corpus: String,
    /// Set once by a successful outline stage, immutable thereafter.
    pub outline: Option<Outline>,
    /// Section drafts keyed by section index. Grows monotonically; indices
    /// are filled in strictly increasing order.
    pub drafts: BTreeMap<usize, String>,
    /// Terminal failure message. Once set, no stage runs except compilation.
    pub error: Option<String>,
    /// Index of the next section to write.
    pub cursor: usize,
    /// Output of the compile stage.
    pub final_document: String,
}

impl TutorialState {
    /// Create fresh state for one generation request.
    pub fn new(query: impl Into<String>, corpus: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            corpus: corpus.into(),
            outline: None,
            drafts: BTreeMap::new(),
            error: None,
            cursor: 0,
            final_document: String::new(),
        }
    }

    fn section_count(&self) -> usize {
        self.outline.as_ref().map_or(0, |o| o.sections.len())
    }
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// Workflow stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Outlining,
    Dispatching,
    Writing,
    Compiling,
    Done,
}

impl Stage {
    /// Stable stage name for progress events.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Outlining => "outlining",
            Self::Dispatching => "dispatching",
            Self::Writing => "writing",
            Self::Compiling => "compiling",
            Self::Done => "done",
        }
    }
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Stage-level progress callback.
///
/// `percent` is a coarse, monotonically non-decreasing completion estimate.
pub trait WorkflowProgress: Send + Sync {
    /// Called at stage entry with the stage, progress estimate, and detail.
    fn stage(&self, stage: Stage, percent: u8, detail: &str);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentWorkflowProgress;

impl WorkflowProgress for SilentWorkflowProgress {
    fn stage(&self, _stage: Stage, _percent: u8, _detail: &str) {}
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Run the full workflow over `state` and return the terminal state.
///
/// The workflow reaches the compile stage exactly once per request,
/// regardless of how many sections succeeded or failed.
#[instrument(skip_all, fields(corpus_len = state.corpus.len()))]
pub async fn run_workflow<C: LlmClient>(
    client: &C,
    mut state: TutorialState,
    compile_opts: &CompileOptions,
    progress: &dyn WorkflowProgress,
) -> TutorialState {
    let mut stage = Stage::Outlining;

    loop {
        match stage {
            Stage::Outlining => {
                progress.stage(Stage::Outlining, 5, "generating tutorial outline");
                match outline::generate_outline(client, &state.corpus, &state.query).await {
                    Ok(outline) => {
                        info!(sections = outline.sections.len(), "outline generated");
                        state.outline = Some(outline);
                        stage = Stage::Dispatching;
                    }
                    Err(e) => {
                        // Outline failure short-circuits to compile with an
                        // empty draft set.
                        warn!(error = %e, "outline stage failed");
                        state.error = Some(format!("Outline generation failed: {e}"));
                        stage = Stage::Compiling;
                    }
                }
            }

            Stage::Dispatching => {
                let total = state.section_count();
                if state.error.is_some() || state.drafts.len() >= total {
                    stage = Stage::Compiling;
                } else {
                    // Count-based dispatch: drafts fill indices 0..N in order,
                    // so the next unfilled index is the current draft count.
                    state.cursor = state.drafts.len();
                    stage = Stage::Writing;
                }
            }

            Stage::Writing => {
                let index = state.cursor;
                let total = state.section_count();
                let percent = writing_percent(state.drafts.len(), total);

                if let Some(outline) = state.outline.as_ref() {
                    progress.stage(
                        Stage::Writing,
                        percent,
                        &format!("writing section {} of {total}", index + 1),
                    );
                    let ctx = SectionContext {
                        corpus: &state.corpus,
                        outline,
                    };
                    let draft = section::write_section(client, &ctx, index).await;
                    debug_assert!(
                        !state.drafts.contains_key(&index),
                        "draft index {index} written twice"
                    );
                    state.drafts.insert(index, draft);
                }

                stage = Stage::Dispatching;
            }

            Stage::Compiling => {
                progress.stage(Stage::Compiling, 90, "compiling final tutorial");
                state.final_document =
                    compile::compile(state.outline.as_ref(), &state.drafts, compile_opts);
                progress.stage(Stage::Done, 100, "tutorial complete");
                stage = Stage::Done;
            }

            Stage::Done => break,
        }
    }

    info!(
        sections = state.drafts.len(),
        error = state.error.is_some(),
        document_len = state.final_document.len(),
        "workflow finished"
    );

    state
}

/// Progress estimate while writing: sections span 10..90 percent.
fn writing_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 10;
    }
    (10 + done * 80 / total) as u8
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::MISSING_SECTION_PLACEHOLDER;
    use crate::testutil::{ScriptedLlm, fail, ok};
    use std::sync::Mutex;

    fn outline_json(n: usize) -> String {
        let sections: Vec<String> = (0..n)
            .map(|i| {
                format!(
                    r#"{{"title": "Section {i}", "brief_description": "About part {i}"}}"#
                )
            })
            .collect();
        format!(
            r#"{{"title": "Test Tutorial", "sections": [{}]}}"#,
            sections.join(", ")
        )
    }

    /// A full successful section script: body + three gated extras.
    fn section_ok(i: usize) -> Vec<std::result::Result<String, String>> {
        vec![
            ok(&format!("Body of section {i}.")),
            ok("- **Concept** — explained."),
            ok("```sh\nexample\n```"),
            ok("Exercise 1: try it."),
        ]
    }

    async fn run(client: &ScriptedLlm) -> TutorialState {
        let state = TutorialState::new("make a tutorial", "corpus text");
        run_workflow(
            client,
            state,
            &CompileOptions::default(),
            &SilentWorkflowProgress,
        )
        .await
    }

    #[tokio::test]
    async fn happy_path_writes_every_section() {
        let mut script = vec![ok(&outline_json(2))];
        script.extend(section_ok(0));
        script.extend(section_ok(1));
        let client = ScriptedLlm::new(script);

        let state = run(&client).await;

        assert!(state.error.is_none());
        assert_eq!(state.drafts.len(), 2);
        assert!(state.final_document.contains("# Test Tutorial"));
        assert!(state.final_document.contains("## 1. Section 0"));
        assert!(state.final_document.contains("## 2. Section 1"));
        assert!(state.final_document.contains("Body of section 0"));
        assert!(state.final_document.contains("Body of section 1"));
        assert!(!state.final_document.contains(MISSING_SECTION_PLACEHOLDER));
        assert_eq!(client.remaining(), 0);
    }

    #[tokio::test]
    async fn failed_section_becomes_placeholder_without_global_error() {
        let mut script = vec![ok(&outline_json(3))];
        script.extend(section_ok(0));
        // Section 1: main content fails; no auxiliary calls are made.
        script.push(fail("model unavailable"));
        script.extend(section_ok(2));
        let client = ScriptedLlm::new(script);

        let state = run(&client).await;

        assert!(state.error.is_none());
        assert_eq!(state.drafts.len(), 3);
        assert!(state.final_document.contains("Body of section 0"));
        assert!(
            state
                .final_document
                .contains("Error generating section content:")
        );
        assert!(state.final_document.contains("Body of section 2"));
        assert_eq!(client.remaining(), 0);
    }

    #[tokio::test]
    async fn outline_failure_short_circuits_to_compile() {
        let client = ScriptedLlm::new([ok("Sorry, I can only answer in prose.")]);

        let state = run(&client).await;

        assert!(state.error.as_deref().unwrap_or_default().len() > 0);
        assert!(state.drafts.is_empty());
        assert!(state.final_document.is_empty());
        // No section calls were attempted.
        assert_eq!(client.remaining(), 0);
    }

    #[tokio::test]
    async fn outline_llm_error_short_circuits_to_compile() {
        let client = ScriptedLlm::new([fail("connection refused")]);

        let state = run(&client).await;

        let error = state.error.expect("error set");
        assert!(error.contains("Outline generation failed"));
        assert!(state.drafts.is_empty());
    }

    #[tokio::test]
    async fn empty_outline_compiles_immediately() {
        let client = ScriptedLlm::new([ok(&outline_json(0))]);

        let state = run(&client).await;

        assert!(state.error.is_none());
        assert!(state.drafts.is_empty());
        assert_eq!(state.final_document, "# Test Tutorial\n");
        // Zero section-write attempts for a zero-section outline.
        assert_eq!(client.remaining(), 0);
    }

    #[tokio::test]
    async fn progress_percent_is_monotonic() {
        struct Recording(Mutex<Vec<u8>>);
        impl WorkflowProgress for Recording {
            fn stage(&self, _stage: Stage, percent: u8, _detail: &str) {
                self.0.lock().expect("lock").push(percent);
            }
        }

        let mut script = vec![ok(&outline_json(2))];
        script.extend(section_ok(0));
        script.extend(section_ok(1));
        let client = ScriptedLlm::new(script);

        let recording = Recording(Mutex::new(Vec::new()));
        let state = TutorialState::new("q", "corpus");
        run_workflow(&client, state, &CompileOptions::default(), &recording).await;

        let percents = recording.0.into_inner().expect("lock");
        assert!(percents.windows(2).all(|w| w[0] <= w[1]), "{percents:?}");
        assert_eq!(*percents.last().expect("events"), 100);
    }

    #[test]
    fn stage_names_are_stable() {
        assert_eq!(Stage::Outlining.name(), "outlining");
        assert_eq!(Stage::Writing.name(), "writing");
        assert_eq!(Stage::Compiling.name(), "compiling");
    }

    #[test]
    fn writing_percent_spans_expected_range() {
        assert_eq!(writing_percent(0, 4), 10);
        assert_eq!(writing_percent(2, 4), 50);
        assert_eq!(writing_percent(4, 4), 90);
        assert_eq!(writing_percent(0, 0), 10);
    }
}
