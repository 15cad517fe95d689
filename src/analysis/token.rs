//! Token types for text analysis.
//!
//! A [`Token`] is the unit that flows between the tokenizer and the token
//! filters of an analysis pipeline. Once a message has been fully analyzed
//! only the token text matters; [`TokenSequence`] is that final form.
//!
//! # Examples
//!
//! ```
//! use triage::analysis::token::Token;
//!
//! let token = Token::with_offsets("water", 1, 5, 10);
//! assert_eq!(token.text, "water");
//! assert_eq!(token.position, 1);
//! assert_eq!(token.start_offset, 5);
//! assert_eq!(token.len(), 5);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// A token represents a single unit of text after tokenization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// The text content of the token
    pub text: String,

    /// The position of the token in the original token stream (0-based)
    pub position: usize,

    /// The byte offset where this token starts in the tokenized text
    pub start_offset: usize,

    /// The byte offset where this token ends in the tokenized text
    pub end_offset: usize,
}

impl Token {
    /// Create a new token with the given text and position.
    pub fn new<S: Into<String>>(text: S, position: usize) -> Self {
        Token {
            text: text.into(),
            position,
            start_offset: 0,
            end_offset: 0,
        }
    }

    /// Create a new token with text, position, and byte offsets.
    pub fn with_offsets<S: Into<String>>(
        text: S,
        position: usize,
        start_offset: usize,
        end_offset: usize,
    ) -> Self {
        Token {
            text: text.into(),
            position,
            start_offset,
            end_offset,
        }
    }

    /// Get the length of the token text.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Check if the token is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Clone this token with updated text.
    pub fn with_text<S: Into<String>>(&self, text: S) -> Self {
        let mut token = self.clone();
        token.text = text.into();
        token
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// A token stream represents a sequence of tokens from the analysis pipeline.
pub type TokenStream = Box<dyn Iterator<Item = Token>>;

/// The normalized words of one message, in order. May be empty.
pub type TokenSequence = Vec<String>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_creation() {
        let token = Token::new("hello", 0);
        assert_eq!(token.text, "hello");
        assert_eq!(token.position, 0);
        assert_eq!(token.start_offset, 0);
        assert_eq!(token.end_offset, 0);
        assert!(!token.is_empty());
    }

    #[test]
    fn test_token_rewrite_keeps_offsets() {
        let token = Token::with_offsets("floods", 2, 7, 13);
        let rewritten = token.with_text("flood");
        assert_eq!(rewritten.text, "flood");
        assert_eq!(rewritten.position, 2);
        assert_eq!(rewritten.start_offset, 7);
        assert_eq!(rewritten.end_offset, 13);
    }

    #[test]
    fn test_token_display() {
        let token = Token::new("hello", 0);
        assert_eq!(format!("{token}"), "hello");
    }
}
