use std::sync::LazyLock;

use regex::Regex;

use super::CharFilter;
use crate::error::{Result, TriageError};

/// Matches every character that is not an ASCII letter or digit.
static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9]").expect("static pattern is valid"));

/// A char filter that replaces characters matching a regex pattern.
#[derive(Clone, Debug)]
pub struct PatternReplaceCharFilter {
    pattern: Regex,
    replacement: String,
}

impl PatternReplaceCharFilter {
    /// Create a new pattern replace char filter.
    pub fn new(pattern: &str, replacement: &str) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)
                .map_err(|e| TriageError::configuration(format!("Invalid regex pattern: {e}")))?,
            replacement: replacement.to_string(),
        })
    }

    /// Replace each character outside `[a-zA-Z0-9]` with one space.
    pub fn non_alphanumeric() -> Self {
        Self {
            pattern: NON_ALPHANUMERIC.clone(),
            replacement: " ".to_string(),
        }
    }

    /// Get the regex pattern used by this filter.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

impl CharFilter for PatternReplaceCharFilter {
    fn filter(&self, input: &str) -> String {
        self.pattern
            .replace_all(input, self.replacement.as_str())
            .into_owned()
    }

    fn name(&self) -> &'static str {
        "pattern_replace"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_replace() {
        let filter = PatternReplaceCharFilter::new(r"(\d+)", "NUM").unwrap();
        assert_eq!(filter.filter("Year 2024"), "Year NUM");
    }

    #[test]
    fn test_remove_pattern() {
        let filter = PatternReplaceCharFilter::new(r"-", "").unwrap();
        assert_eq!(filter.filter("123-456-789"), "123456789");
    }

    #[test]
    fn test_non_alphanumeric_is_per_character() {
        let filter = PatternReplaceCharFilter::non_alphanumeric();
        // One space per stripped character, multi-byte characters included.
        assert_eq!(filter.filter("a,b"), "a b");
        assert_eq!(filter.filter("café!"), "caf  ");
        assert_eq!(filter.filter("?!."), "   ");
    }

    #[test]
    fn test_invalid_pattern() {
        let result = PatternReplaceCharFilter::new(r"(", "");
        assert!(matches!(result, Err(TriageError::Configuration(_))));
    }
}
