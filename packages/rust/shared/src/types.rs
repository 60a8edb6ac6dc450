//! Core domain types shared across the TutorForge crates.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Outline
// ---------------------------------------------------------------------------

/// The structured tutorial outline produced once per generation request.
///
/// `sections` is immutable after the outline stage succeeds: the workflow
/// and compiler both iterate it by fixed index order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outline {
    /// Title for the whole tutorial.
    pub title: String,
    /// Ordered section list. May be empty (yields an empty tutorial).
    #[serde(default)]
    pub sections: Vec<SectionSpec>,
}

/// One planned section within an [`Outline`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSpec {
    /// Section title.
    pub title: String,
    /// Short description of what the section should cover.
    #[serde(default)]
    pub brief_description: String,
}

// ---------------------------------------------------------------------------
// CrawledPage
// ---------------------------------------------------------------------------

/// A crawled page that survived the content filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawledPage {
    /// Normalized page URL.
    pub url: String,
    /// Extracted text content (markdown-ish, chrome stripped).
    pub content: String,
}
