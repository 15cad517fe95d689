//! Core analyzer trait definition.
//!
//! Analyzers run the complete text processing pipeline:
//!
//! ```text
//! Raw Text → Char Filters → Tokenizer → Filter 1 → ... → Filter N → Token Stream
//! ```
//!
//! # Examples
//!
//! Implementing a custom analyzer:
//!
//! ```
//! use triage::analysis::analyzer::Analyzer;
//! use triage::analysis::token::TokenStream;
//! use triage::error::Result;
//!
//! struct NothingAnalyzer;
//!
//! impl Analyzer for NothingAnalyzer {
//!     fn analyze(&self, _text: &str) -> Result<TokenStream> {
//!         Ok(Box::new(std::iter::empty()))
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "nothing"
//!     }
//!
//!     fn as_any(&self) -> &dyn std::any::Any {
//!         self
//!     }
//! }
//!
//! assert!(NothingAnalyzer.normalize("anything").unwrap().is_empty());
//! ```

use crate::analysis::token::{TokenSequence, TokenStream};
use crate::error::Result;

/// Trait for analyzers that convert text into processed tokens.
///
/// The trait requires `Send + Sync` so one analyzer can be shared by the
/// worker threads that fit and score models.
pub trait Analyzer: Send + Sync {
    /// Analyze the given text and return a stream of tokens.
    fn analyze(&self, text: &str) -> Result<TokenStream>;

    /// Get the name of this analyzer (for debugging and logging).
    fn name(&self) -> &'static str;

    /// Provide access to the concrete type for downcasting.
    fn as_any(&self) -> &dyn std::any::Any;

    /// Analyze the text and keep only the surviving token texts, in order.
    fn normalize(&self, text: &str) -> Result<TokenSequence> {
        Ok(self.analyze(text)?.map(|token| token.text).collect())
    }
}
