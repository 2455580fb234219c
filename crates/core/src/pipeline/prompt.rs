//! Prompt construction for the generation pipeline.

use crate::store::ContentItem;

/// Phrases in a prompt template that signal the user wants long-form
/// output instead of one-liners.
const DETAIL_SIGNALS: &[&str] = &[
    "detailed",
    "in depth",
    "in-depth",
    "step by step",
    "step-by-step",
    "full code",
    "long form",
    "long-form",
];

/// Whether the topic's prompt template asks for long-form items.
pub fn wants_detailed(prompt_template: &str) -> bool {
    let lower = prompt_template.to_lowercase();
    DETAIL_SIGNALS.iter().any(|signal| lower.contains(signal))
}

/// System instructions for the generator.
pub fn build_system_prompt(detailed: bool) -> String {
    let length_rule = if detailed {
        "Each item may be long-form: full explanations, worked examples, fenced code blocks where they help."
    } else {
        "Each item must be very short, one or two sentences, like a single card in a feed."
    };

    format!(
        r#"You are a content generator for an infinite scroll feed. Generate multiple unique pieces of content, each standing alone. {length_rule}

Respond with a JSON array only, no other text. One element per item:
[
  {{"content": "the item text (markdown allowed)", "source_title": "site name or null", "source_url": "https link or null"}}
]

Rules:
- Every item must be factually plausible, self-contained and distinct from the others.
- Do not repeat themes or examples from the recent items you are shown.
- Attribute real sources when you rely on one; otherwise use null for both source fields."#
    )
}

/// User prompt for one generation call.
///
/// `existing` is the full chronological history; only the most recent
/// `history_window` item texts are sent to bound prompt size.
pub fn build_user_prompt(
    prompt_template: &str,
    existing: &[ContentItem],
    history_window: usize,
    requested_count: usize,
) -> String {
    let mut prompt = format!(
        "Generate {} unique feed items strictly about: {}",
        requested_count, prompt_template
    );

    let recent: Vec<&str> = existing
        .iter()
        .rev()
        .take(history_window)
        .map(|item| item.content.as_str())
        .collect();

    if !recent.is_empty() {
        prompt.push_str("\n\nRecent items already in the feed (do not duplicate their themes or examples):\n");
        for content in recent.iter().rev() {
            // Keep each history line bounded; long items get truncated
            let line: String = content.chars().take(160).collect();
            prompt.push_str("- ");
            prompt.push_str(&line);
            prompt.push('\n');
        }
    }

    prompt
}
