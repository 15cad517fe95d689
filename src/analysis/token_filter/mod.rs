//! Token filter implementations for token transformation.

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for filters that transform token streams.
pub trait Filter: Send + Sync {
    /// Apply this filter to a token stream.
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream>;

    /// Get the name of this filter (for debugging and configuration).
    fn name(&self) -> &'static str;
}

// Individual filter modules
pub mod lemmatize;
pub mod stop;

// Re-export all filters for convenient access
pub use lemmatize::{LemmatizeFilter, Lemmatizer, WordNetVerbLemmatizer};
pub use stop::StopFilter;
