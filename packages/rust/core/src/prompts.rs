//! Prompt builders for the generation stages.
//!
//! Each builder returns the full prompt string for one LLM call. The corpus
//! excerpt is always embedded between `---` delimiters so the model can tell
//! instructions from source material.

use tutorforge_shared::SectionSpec;

/// Prompt for the outline stage: asks for a JSON outline of the tutorial.
pub fn outline(content: &str, query: &str) -> String {
    format!(
        "Based on the following documentation content, create a logical, \
         beginner-friendly tutorial outline.\n\
         The output must be a JSON object with a 'title' for the whole tutorial \
         and a list of 'sections', where each section has a 'title' and a \
         'brief_description'.\n\n\
         Documentation Content:\n---\n{content}\n---\n\
         User's original request: {query}\n\n\
         JSON Output:"
    )
}

/// Prompt for a section's main body content.
pub fn section_content(context: &str, outline_json: &str, section: &SectionSpec) -> String {
    format!(
        "You are an expert technical writer creating a tutorial.\n\
         Write a detailed, clear, and beginner-friendly tutorial section.\n\
         Use the provided documentation content as your primary source of truth.\n\
         Include code examples where relevant, formatted in Markdown.\n\n\
         Full Documentation Context:\n---\n{context}\n---\n\n\
         Tutorial Outline: {outline_json}\n\n\
         Write the content for this section:\n\
         - Section Title: {title}\n\
         - Section Description: {description}\n\n\
         Generate only the Markdown content for this specific section.",
        title = section.title,
        description = section.brief_description,
    )
}

/// Prompt for the key-concepts summary of a section.
pub fn key_concepts(context: &str, section: &SectionSpec) -> String {
    format!(
        "From the documentation below, list the key concepts a beginner must \
         understand for the section \"{title}\".\n\
         Format each concept as a Markdown bullet with the concept name in \
         **bold** followed by a one-sentence explanation.\n\n\
         Documentation Context:\n---\n{context}\n---",
        title = section.title,
    )
}

/// Prompt for worked examples in a section.
pub fn examples(context: &str, section: &SectionSpec) -> String {
    format!(
        "Using the documentation below, write one or two short worked examples \
         for the section \"{title}\".\n\
         Each example must include a fenced Markdown code block and a brief \
         explanation of what it does.\n\n\
         Documentation Context:\n---\n{context}\n---",
        title = section.title,
    )
}

/// Prompt for practice exercises in a section.
pub fn exercises(context: &str, section: &SectionSpec) -> String {
    format!(
        "Using the documentation below, write two or three practice exercises \
         for the section \"{title}\".\n\
         Number each one and start it with the word \"Exercise\".\n\n\
         Documentation Context:\n---\n{context}\n---",
        title = section.title,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> SectionSpec {
        SectionSpec {
            title: "Getting Started".into(),
            brief_description: "Install and configure the tool".into(),
        }
    }

    #[test]
    fn outline_embeds_content_and_query() {
        let prompt = outline("the docs", "make a tutorial");
        assert!(prompt.contains("the docs"));
        assert!(prompt.contains("make a tutorial"));
        assert!(prompt.contains("JSON"));
    }

    #[test]
    fn section_prompts_embed_title() {
        let s = spec();
        for prompt in [
            section_content("ctx", "{}", &s),
            key_concepts("ctx", &s),
            examples("ctx", &s),
            exercises("ctx", &s),
        ] {
            assert!(prompt.contains("Getting Started"));
            assert!(prompt.contains("ctx"));
        }
    }
}
