//! WordNet-style verb lemmatizer.
//!
//! Lemmas are looked up in a built-in verb lexicon. A word listed as an
//! irregular inflection resolves through the exception table; any other word
//! is reduced by repeatedly stripping verb suffixes until a form from the
//! lexicon appears. When several base forms qualify, the shortest one wins,
//! ties going to the first candidate found. Words with no known base form are
//! returned unchanged.
//!
//! # Examples
//!
//! ```
//! use triage::analysis::token_filter::lemmatize::{Lemmatizer, WordNetVerbLemmatizer};
//!
//! let lemmatizer = WordNetVerbLemmatizer::new();
//! assert_eq!(lemmatizer.lemmatize("flooded"), "flood");
//! assert_eq!(lemmatizer.lemmatize("went"), "go");
//! assert_eq!(lemmatizer.lemmatize("medicines"), "medicine");
//! assert_eq!(lemmatizer.lemmatize("families"), "families");
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, LazyLock};

use super::Lemmatizer;

/// Verb suffix substitutions, tried in this order.
const VERB_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("s", ""),
    ("ies", "y"),
    ("es", "e"),
    ("es", ""),
    ("ed", "e"),
    ("ed", ""),
    ("ing", "e"),
    ("ing", ""),
];

/// One verb base form per line, in the first field.
const VERBS: &str = include_str!("verbs.txt");

/// Irregular inflections: `inflected base [base ...]` per line.
const VERB_EXCEPTIONS: &str = include_str!("verb_exceptions.txt");

/// The built-in verb lexicon, parsed once.
pub static DEFAULT_VERB_LEXICON: LazyLock<Arc<VerbLexicon>> =
    LazyLock::new(|| Arc::new(VerbLexicon::parse(VERBS, VERB_EXCEPTIONS)));

/// Verb base forms plus the irregular inflection table.
#[derive(Clone, Debug, Default)]
pub struct VerbLexicon {
    lemmas: HashSet<String>,
    exceptions: HashMap<String, Vec<String>>,
}

impl VerbLexicon {
    /// Build a lexicon from a word list and an exception table.
    ///
    /// Only the first field of a word list line is read, so a WordNet
    /// `index.verb` file parses as is. Blank lines, lines starting with `#`
    /// and indented lines (the WordNet license header) are ignored in both
    /// inputs.
    pub fn parse(lemmas: &str, exceptions: &str) -> Self {
        let lemmas = content_lines(lemmas)
            .filter_map(|line| line.split_whitespace().next())
            .map(str::to_string)
            .collect();

        let mut table: HashMap<String, Vec<String>> = HashMap::new();
        for line in content_lines(exceptions) {
            let mut fields = line.split_whitespace();
            if let Some(inflected) = fields.next() {
                let bases = table.entry(inflected.to_string()).or_default();
                for base in fields {
                    if !bases.iter().any(|b| b == base) {
                        bases.push(base.to_string());
                    }
                }
            }
        }

        VerbLexicon {
            lemmas,
            exceptions: table,
        }
    }

    /// Check whether `word` is a known verb base form.
    pub fn contains(&self, word: &str) -> bool {
        self.lemmas.contains(word)
    }

    /// Base forms listed for an irregular inflection.
    pub fn exceptions(&self, word: &str) -> Option<&[String]> {
        self.exceptions.get(word).map(|bases| bases.as_slice())
    }

    /// Number of base forms.
    pub fn len(&self) -> usize {
        self.lemmas.len()
    }

    /// Check if the lexicon has no base forms.
    pub fn is_empty(&self) -> bool {
        self.lemmas.is_empty()
    }

    /// Keep the forms present in the lexicon, first occurrence wins.
    fn known_forms<'a, I>(&self, forms: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut known: Vec<String> = Vec::new();
        for form in forms {
            if self.contains(form) && !known.contains(form) {
                known.push(form.clone());
            }
        }
        known
    }
}

fn content_lines(input: &str) -> impl Iterator<Item = &str> {
    input
        .lines()
        .filter(|line| !line.starts_with([' ', '\t']))
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

/// Apply every matching substitution to every form, dropping duplicates.
fn apply_substitutions(forms: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut next = Vec::new();
    for form in forms {
        for (suffix, replacement) in VERB_SUBSTITUTIONS {
            if let Some(stem) = form.strip_suffix(suffix) {
                let candidate = format!("{stem}{replacement}");
                if seen.insert(candidate.clone()) {
                    next.push(candidate);
                }
            }
        }
    }
    next
}

/// Lemmatizer that treats every word as a verb.
#[derive(Clone, Debug)]
pub struct WordNetVerbLemmatizer {
    lexicon: Arc<VerbLexicon>,
}

impl WordNetVerbLemmatizer {
    /// Create a lemmatizer backed by the built-in lexicon.
    pub fn new() -> Self {
        WordNetVerbLemmatizer {
            lexicon: Arc::clone(&DEFAULT_VERB_LEXICON),
        }
    }

    /// Create a lemmatizer backed by a custom lexicon.
    pub fn with_lexicon(lexicon: VerbLexicon) -> Self {
        WordNetVerbLemmatizer {
            lexicon: Arc::new(lexicon),
        }
    }

    /// All base forms the lexicon accepts for `word`, in discovery order.
    pub fn candidates(&self, word: &str) -> Vec<String> {
        let word = word.to_string();

        if let Some(bases) = self.lexicon.exceptions(&word) {
            return self
                .lexicon
                .known_forms(std::iter::once(&word).chain(bases.iter()));
        }

        let mut forms = apply_substitutions(std::slice::from_ref(&word));
        let found = self
            .lexicon
            .known_forms(std::iter::once(&word).chain(forms.iter()));
        if !found.is_empty() {
            return found;
        }

        while !forms.is_empty() {
            forms = apply_substitutions(&forms);
            let found = self.lexicon.known_forms(forms.iter());
            if !found.is_empty() {
                return found;
            }
        }

        Vec::new()
    }
}

impl Default for WordNetVerbLemmatizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Lemmatizer for WordNetVerbLemmatizer {
    fn lemmatize(&self, word: &str) -> String {
        self.candidates(word)
            .into_iter()
            .min_by_key(|candidate| candidate.len())
            .unwrap_or_else(|| word.to_string())
    }

    fn name(&self) -> &'static str {
        "wordnet_verb"
    }
}
