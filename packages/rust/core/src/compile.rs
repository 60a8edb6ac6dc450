//! Final document assembly.
//!
//! Iterates the outline's sections in fixed index order and emits a numbered
//! heading plus the draft body, or a fixed placeholder when no draft exists
//! for an index. The emitted document is always structurally complete, even
//! under partial upstream failure, and byte-identical across repeated calls
//! with equal inputs.

use std::collections::BTreeMap;

use tutorforge_shared::Outline;

/// Body substituted for a section that has no draft at all.
pub const MISSING_SECTION_PLACEHOLDER: &str =
    "Error: Content for this section was not generated.";

/// Options for document assembly.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// When set, a metadata line with this timestamp is emitted under the
    /// title. Omit for deterministic output in tests.
    pub generated_at: Option<String>,
}

/// Assemble the final tutorial document.
///
/// A missing outline (the outline-failure path) compiles to an empty
/// document; the workflow's error message carries the reason.
pub fn compile(
    outline: Option<&Outline>,
    drafts: &BTreeMap<usize, String>,
    opts: &CompileOptions,
) -> String {
    let Some(outline) = outline else {
        return String::new();
    };

    let mut doc = format!("# {}\n", outline.title);

    if let Some(ts) = &opts.generated_at {
        doc.push_str(&format!("\n_Generated: {ts}_\n"));
    }

    for (i, section) in outline.sections.iter().enumerate() {
        let body = drafts
            .get(&i)
            .map(String::as_str)
            .unwrap_or(MISSING_SECTION_PLACEHOLDER);

        doc.push_str(&format!("\n## {}. {}\n\n{}\n", i + 1, section.title, body));
    }

    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutorforge_shared::SectionSpec;

    fn outline(n: usize) -> Outline {
        Outline {
            title: "Test Tutorial".into(),
            sections: (0..n)
                .map(|i| SectionSpec {
                    title: format!("Part {i}"),
                    brief_description: String::new(),
                })
                .collect(),
        }
    }

    #[test]
    fn one_heading_per_section_in_outline_order() {
        let mut drafts = BTreeMap::new();
        drafts.insert(0, "First body.".to_string());
        drafts.insert(1, "Second body.".to_string());

        let doc = compile(Some(&outline(2)), &drafts, &CompileOptions::default());

        assert!(doc.starts_with("# Test Tutorial\n"));
        let first = doc.find("## 1. Part 0").expect("heading 1");
        let second = doc.find("## 2. Part 1").expect("heading 2");
        assert!(first < second);
        assert_eq!(doc.matches("\n## ").count(), 2);
    }

    #[test]
    fn missing_draft_gets_placeholder() {
        let mut drafts = BTreeMap::new();
        drafts.insert(0, "Only the first.".to_string());

        let doc = compile(Some(&outline(3)), &drafts, &CompileOptions::default());

        assert!(doc.contains("Only the first."));
        assert_eq!(doc.matches(MISSING_SECTION_PLACEHOLDER).count(), 2);
        assert_eq!(doc.matches("\n## ").count(), 3);
    }

    #[test]
    fn no_outline_compiles_to_empty_document() {
        let doc = compile(None, &BTreeMap::new(), &CompileOptions::default());
        assert!(doc.is_empty());
    }

    #[test]
    fn empty_outline_is_title_only() {
        let doc = compile(Some(&outline(0)), &BTreeMap::new(), &CompileOptions::default());
        assert_eq!(doc, "# Test Tutorial\n");
    }

    #[test]
    fn output_is_deterministic() {
        let mut drafts = BTreeMap::new();
        drafts.insert(0, "Body.".to_string());

        let a = compile(Some(&outline(1)), &drafts, &CompileOptions::default());
        let b = compile(Some(&outline(1)), &drafts, &CompileOptions::default());
        assert_eq!(a, b);
    }

    #[test]
    fn metadata_line_emitted_when_requested() {
        let opts = CompileOptions {
            generated_at: Some("2026-01-01T00:00:00Z".into()),
        };
        let doc = compile(Some(&outline(0)), &BTreeMap::new(), &opts);
        assert!(doc.contains("_Generated: 2026-01-01T00:00:00Z_"));
    }
}
