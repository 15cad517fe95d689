//! Analyzer implementations that combine char filters, tokenizers and filters.

mod analyzer;
mod message;
mod pipeline;

pub use analyzer::Analyzer;
pub use message::MessageAnalyzer;
pub use pipeline::PipelineAnalyzer;
