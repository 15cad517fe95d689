//! Message analyzer: the fixed normalizer for disaster-response messages.
//!
//! # Pipeline
//!
//! 1. LowercaseCharFilter (Unicode lowercase of the whole message)
//! 2. PatternReplaceCharFilter (every char outside `[a-zA-Z0-9]` becomes a space)
//! 3. WhitespaceTokenizer
//! 4. StopFilter (NLTK English list, 179 words)
//! 5. LemmatizeFilter (WordNet verb lemmas)
//!
//! # Examples
//!
//! ```
//! use triage::analysis::analyzer::{Analyzer, MessageAnalyzer};
//!
//! let analyzer = MessageAnalyzer::new();
//! let tokens = analyzer.normalize("We NEED tents, the river flooded!").unwrap();
//! assert_eq!(tokens, vec!["need", "tent", "river", "flood"]);
//!
//! assert!(analyzer.normalize("?!...").unwrap().is_empty());
//! ```

use std::sync::Arc;

use crate::analysis::analyzer::analyzer::Analyzer;
use crate::analysis::analyzer::pipeline::PipelineAnalyzer;
use crate::analysis::char_filter::lowercase::LowercaseCharFilter;
use crate::analysis::char_filter::pattern_replace::PatternReplaceCharFilter;
use crate::analysis::token::TokenStream;
use crate::analysis::token_filter::lemmatize::LemmatizeFilter;
use crate::analysis::token_filter::stop::StopFilter;
use crate::analysis::tokenizer::WhitespaceTokenizer;
use crate::error::Result;

/// The analyzer every message goes through before feature encoding.
///
/// Normalization is total: any input string, including the empty string,
/// produces a (possibly empty) token sequence.
#[derive(Clone)]
pub struct MessageAnalyzer {
    inner: PipelineAnalyzer,
}

impl MessageAnalyzer {
    /// Create the message analyzer.
    pub fn new() -> Self {
        let analyzer = PipelineAnalyzer::new(Arc::new(WhitespaceTokenizer::new()))
            .add_char_filter(Arc::new(LowercaseCharFilter::new()))
            .add_char_filter(Arc::new(PatternReplaceCharFilter::non_alphanumeric()))
            .add_filter(Arc::new(StopFilter::new()))
            .add_filter(Arc::new(LemmatizeFilter::new()))
            .with_name("message");

        MessageAnalyzer { inner: analyzer }
    }

    /// Get the inner pipeline analyzer.
    pub fn inner(&self) -> &PipelineAnalyzer {
        &self.inner
    }
}

impl Default for MessageAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for MessageAnalyzer {
    fn analyze(&self, text: &str) -> Result<TokenStream> {
        self.inner.analyze(text)
    }

    fn name(&self) -> &'static str {
        "message"
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

impl std::fmt::Debug for MessageAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageAnalyzer")
            .field("inner", &self.inner)
            .finish()
    }
}
