//! Lowercase char filter implementation.

use super::CharFilter;

/// A char filter that lowercases the entire input.
///
/// Lowercasing happens on the raw text, before any character is stripped, so
/// letters whose lowercase form is ASCII survive later ASCII-only filtering.
#[derive(Clone, Debug, Default)]
pub struct LowercaseCharFilter;

impl LowercaseCharFilter {
    /// Create a new lowercase char filter.
    pub fn new() -> Self {
        LowercaseCharFilter
    }
}

impl CharFilter for LowercaseCharFilter {
    fn filter(&self, input: &str) -> String {
        if input.is_ascii() {
            input.to_ascii_lowercase()
        } else {
            input.to_lowercase()
        }
    }

    fn name(&self) -> &'static str {
        "lowercase"
    }
}
