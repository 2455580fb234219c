//! Content generation pipeline.
//!
//! One generation round: build a prompt from the topic and its recent
//! history, call the generator, parse the structured response (numbered
//! list as legacy fallback), dedup against history, classify size, and
//! persist. Generator failures degrade to synthesized placeholder items
//! instead of surfacing.

mod generator;
mod parse;
mod prompt;
mod types;

pub use generator::GenerationPipeline;
pub use parse::{parse_numbered_list, parse_structured};
pub use prompt::wants_detailed;
pub use types::{PipelineConfig, RawGeneratedItem};
