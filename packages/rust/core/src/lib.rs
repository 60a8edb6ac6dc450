//! Tutorial generation engine.
//!
//! Turns a crawled documentation corpus into a multi-section Markdown
//! tutorial through a staged workflow: outline generation, per-section
//! drafting with failure isolation, and deterministic final assembly.

pub mod compile;
pub mod outline;
pub mod pipeline;
pub mod prompts;
pub mod section;
pub mod workflow;

#[cfg(test)]
mod testutil;

pub use compile::{CompileOptions, MISSING_SECTION_PLACEHOLDER, compile};
pub use pipeline::{
    GenerateConfig, GenerateResult, ProgressReporter, SilentProgress, generate_tutorial, slugify,
};
pub use workflow::{Stage, TutorialState, WorkflowProgress, run_workflow};
