//! Topic suggestions for the creation flow.
//!
//! Short queries get the static list; longer ones ask the generator for
//! related topics. Every failure degrades to a canned answer, so this
//! service never returns an error.

use std::sync::Arc;

use tracing::debug;

use crate::config::SuggestionsConfig;
use crate::llm::{CompletionRequest, LlmClient};

/// Queries shorter than this (after trim) get static suggestions.
const MIN_QUERY_LEN: usize = 2;

/// Longest suggestion accepted from the generator.
const MAX_SUGGESTION_LEN: usize = 50;

pub struct SuggestionService {
    llm: Option<Arc<dyn LlmClient>>,
    config: SuggestionsConfig,
}

impl SuggestionService {
    pub fn new(llm: Option<Arc<dyn LlmClient>>, config: SuggestionsConfig) -> Self {
        Self { llm, config }
    }

    /// Suggest topics for a partial query. Infallible by design.
    pub async fn suggest(&self, query: &str) -> Vec<String> {
        let query = query.trim();
        let max = self.config.max_suggestions as usize;

        if query.len() < MIN_QUERY_LEN {
            return self.static_suggestions(max);
        }

        let Some(llm) = &self.llm else {
            return derived_suggestions(query, max);
        };

        let request = CompletionRequest::new(format!(
            "Complete or suggest similar topics to: \"{}\"",
            query
        ))
        .with_system(format!(
            "Generate {} short, engaging infinite scroll topics based on the user's partial \
             input. Each topic should be 2-4 words maximum. Return ONLY a comma-separated \
             list without any other formatting.",
            max
        ))
        .with_max_tokens(120)
        .with_temperature(0.7);

        match llm.complete(request).await {
            Ok(response) => {
                let parsed = parse_suggestions(&response.text, max);
                if parsed.is_empty() {
                    debug!(query, "no usable suggestions parsed, deriving from query");
                    derived_suggestions(query, max)
                } else {
                    parsed
                }
            }
            Err(e) => {
                debug!(query, error = %e, "suggestion generation failed, serving static list");
                self.static_suggestions(max)
            }
        }
    }

    fn static_suggestions(&self, max: usize) -> Vec<String> {
        self.config
            .static_suggestions
            .iter()
            .take(max)
            .cloned()
            .collect()
    }
}

/// Parse a comma/newline separated list, stripping bullets, numbering
/// and quotes.
fn parse_suggestions(text: &str, max: usize) -> Vec<String> {
    text.split(['\n', ','])
        .map(|s| {
            s.trim()
                .trim_start_matches(['-', '*', '•'])
                .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ')')
                .trim()
                .trim_matches(['"', '\u{201c}', '\u{201d}'])
                .trim()
                .to_string()
        })
        .filter(|s| !s.is_empty() && s.len() < MAX_SUGGESTION_LEN)
        .take(max)
        .collect()
}

/// Canned suggestions built from the query itself.
fn derived_suggestions(query: &str, max: usize) -> Vec<String> {
    ["facts", "trivia", "quotes", "tips", "history"]
        .iter()
        .take(max)
        .map(|suffix| format!("{} {}", query, suffix))
        .collect()
}
