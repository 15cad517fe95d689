//! Text analysis for disaster-response messages.
//!
//! Raw message text is turned into a [`TokenSequence`] by an [`Analyzer`]:
//! char filters rewrite the text, a tokenizer splits it, and token filters
//! drop or rewrite the resulting tokens. [`MessageAnalyzer`] is the fixed
//! normalizer used for training and prediction.

pub mod analyzer;
pub mod char_filter;
pub mod token;
pub mod token_filter;
pub mod tokenizer;

// Re-export commonly used types
pub use analyzer::*;
pub use token::*;
pub use token_filter::*;
pub use tokenizer::*;
