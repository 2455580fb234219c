//! Testing utilities and mock implementations.
//!
//! The mock LLM client lets pipeline and server tests script generator
//! behavior (responses, failures, latency) without network access.

mod mock_llm;

pub use mock_llm::{MockLlmClient, RecordedCompletion};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::pipeline::RawGeneratedItem;

    /// A structured generator response for `count` distinct items.
    pub fn structured_response(count: usize) -> String {
        let items: Vec<RawGeneratedItem> = (0..count)
            .map(|i| RawGeneratedItem::text(format!("Generated item number {}.", i)))
            .collect();
        serde_json::to_string(&items).unwrap()
    }

    /// A structured generator response with explicit contents.
    pub fn structured_response_of(contents: &[&str]) -> String {
        let items: Vec<RawGeneratedItem> = contents
            .iter()
            .map(|c| RawGeneratedItem::text(*c))
            .collect();
        serde_json::to_string(&items).unwrap()
    }
}
