//! SQL magic command tokens
//!
//! Notebook kernels mark SQL cells with a magic command on the first line,
//! e.g. `%%sql` or `%sparksql`. This module holds the recognized tokens as
//! plain data so new dialects can be added without touching the range logic.

/// The magic tokens recognized out of the box.
///
/// Each supported engine comes in a line (`%`) and a cell (`%%`) form.
pub const DEFAULT_MAGICS: &[&str] = &[
    "%%sql",
    "%sql",
    "%%sparksql",
    "%sparksql",
    "%%trino",
    "%trino",
];

/// A closed set of magic command tokens
///
/// Matching is a strict, case-sensitive prefix check against the start of
/// the cell text. Leading whitespace is not skipped.
///
/// # Example
///
/// ```rust
/// use sqlmagicfmt::magic::MagicSet;
///
/// let magics = MagicSet::default().with_token("%%duckdb");
/// assert!(magics.is_magic("%%duckdb\nselect 1"));
/// assert!(!magics.is_magic(" %%sql\nselect 1"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MagicSet {
    tokens: Vec<String>,
}

impl MagicSet {
    /// A set with no tokens; nothing is ever detected as magic.
    pub fn empty() -> Self {
        Self { tokens: Vec::new() }
    }

    /// Add a token to the set. Duplicates are ignored.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        if !token.is_empty() && !self.tokens.contains(&token) {
            self.tokens.push(token);
        }
        self
    }

    /// The tokens in the order they were added
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    /// Returns true iff `text` starts with one of the tokens.
    pub fn is_magic(&self, text: &str) -> bool {
        self.tokens.iter().any(|magic| text.starts_with(magic.as_str()))
    }

    /// The token `text` starts with, if any. Longest match wins so that
    /// `%%sparksql` is reported over a shorter token sharing its prefix.
    pub fn matching(&self, text: &str) -> Option<&str> {
        self.tokens
            .iter()
            .filter(|magic| text.starts_with(magic.as_str()))
            .max_by_key(|magic| magic.len())
            .map(String::as_str)
    }
}

impl Default for MagicSet {
    fn default() -> Self {
        DEFAULT_MAGICS
            .iter()
            .fold(Self::empty(), |set, token| set.with_token(*token))
    }
}

impl<S: Into<String>> FromIterator<S> for MagicSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::empty(), |set, token| set.with_token(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_default_token_is_detected() {
        let magics = MagicSet::default();
        for token in DEFAULT_MAGICS {
            assert!(magics.is_magic(token), "{token} alone");
            assert!(magics.is_magic(&format!("{token}\nselect 1")), "{token} + sql");
            assert!(magics.is_magic(&format!("{token} --section x")), "{token} + args");
        }
    }

    #[test]
    fn non_magic_text_is_rejected() {
        let magics = MagicSet::default();
        for text in [
            "",
            "select 1",
            " %%sql\nselect 1",
            "\n%%sql",
            "%%SQL\nselect 1",
            "%%python",
            "%sq",
            "-- %%sql",
        ] {
            assert!(!magics.is_magic(text), "{text:?}");
        }
    }

    #[test]
    fn prefix_check_is_literal() {
        // "%sqlite" still begins with "%sql"
        assert!(MagicSet::default().is_magic("%sqlite"));
    }

    #[test]
    fn matching_prefers_longest_token() {
        let magics = MagicSet::default();
        assert_eq!(magics.matching("%%sparksql\nselect 1"), Some("%%sparksql"));
        assert_eq!(magics.matching("%%sql"), Some("%%sql"));
        assert_eq!(magics.matching("%sql x"), Some("%sql"));
        assert_eq!(magics.matching("select 1"), None);
    }

    #[test]
    fn custom_sets() {
        let magics: MagicSet = ["%%bq", "%%bq", ""].into_iter().collect();
        assert_eq!(magics.tokens().collect::<Vec<_>>(), vec!["%%bq"]);
        assert!(magics.is_magic("%%bq\nselect 1"));
        assert!(!magics.is_magic("%%sql\nselect 1"));
        assert!(!MagicSet::empty().is_magic("%%sql"));
    }
}
