//! Static prompt registry.
//!
//! Templates take `{spec_title}`, `{spec_client}`, `{slide_id}`,
//! `{slide_title}`, and `{slide_layout}` placeholders.

use deckgen_core::CoreError;

const PROMPTS: &[(&str, &str)] = &[
    (
        "content.baseline",
        "Summarize the body of slide \"{slide_title}\" as up to three bullet points. \
         Project: {spec_title} / Client: {spec_client}.",
    ),
    (
        "content.cover",
        "Write a one-line lead for the cover slide \"{slide_title}\". \
         Project: {spec_title}.",
    ),
    (
        "content.summary",
        "Summarize slide \"{slide_title}\" in at most three lines, \
         leading with the point the reader must understand first.",
    ),
];

/// Look up a registered prompt template.
pub fn get_prompt_template(prompt_id: &str) -> Result<&'static str, CoreError> {
    PROMPTS
        .iter()
        .find(|(id, _)| *id == prompt_id)
        .map(|(_, template)| *template)
        .ok_or_else(|| CoreError::Policy(format!("prompt_id '{prompt_id}' is not registered")))
}

pub fn list_prompt_ids() -> Vec<&'static str> {
    PROMPTS.iter().map(|(id, _)| *id).collect()
}
