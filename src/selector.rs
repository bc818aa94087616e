//! Magic-aware selection of the SQL lines in a cell
//!
//! A notebook cell may start with a magic command such as `%%sql`. That line
//! belongs to the notebook kernel, not to the query, so only the lines after
//! it are handed to the SQL formatter.
//!
//! # Example
//!
//! ```rust
//! use sqlmagicfmt::selector::{FormatRange, MagicAwareRangeSelector};
//!
//! let selector = MagicAwareRangeSelector::default();
//! assert_eq!(
//!     selector.select_range("%%sql\nselect a,b from t"),
//!     FormatRange { first_line: 1, last_line: 1 },
//! );
//! assert_eq!(
//!     selector.select_range("select a,b from t"),
//!     FormatRange { first_line: 0, last_line: 0 },
//! );
//! ```

use crate::magic::MagicSet;

/// Zero-based, inclusive line span of a cell that holds SQL
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormatRange {
    pub first_line: usize,
    pub last_line: usize,
}

impl FormatRange {
    /// True for a magic line with nothing after it (`first_line > last_line`).
    pub fn is_inverted(&self) -> bool {
        self.first_line > self.last_line
    }
}

/// Decides which lines of a cell are SQL
#[derive(Clone, Debug, Default)]
pub struct MagicAwareRangeSelector {
    magics: MagicSet,
}

impl MagicAwareRangeSelector {
    /// A selector recognizing the tokens in `magics`
    pub fn new(magics: MagicSet) -> Self {
        Self { magics }
    }

    /// The magic tokens this selector recognizes
    pub fn magics(&self) -> &MagicSet {
        &self.magics
    }

    /// Returns true iff `text` starts with a recognized magic token.
    pub fn is_magic(&self, text: &str) -> bool {
        self.magics.is_magic(text)
    }

    /// Compute the line range to format.
    ///
    /// `first_line` skips the magic line when there is one; `last_line` is
    /// always the index of the final line. For a cell holding only a magic
    /// line the result is inverted, see [`FormatRange::is_inverted`].
    pub fn select_range(&self, text: &str) -> FormatRange {
        let first_line = usize::from(self.is_magic(text));
        FormatRange {
            first_line,
            last_line: line_count(text) - 1,
        }
    }
}

/// Number of lines in `text` as an editor counts them.
///
/// Lines end at `\n`, `\r\n` or a lone `\r`; an empty text still has one
/// (empty) line and a trailing line break opens a final empty line.
pub fn line_count(text: &str) -> usize {
    line_spans(text).len()
}

/// Byte spans of each line's content, line breaks excluded
pub fn line_spans(text: &str) -> Vec<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                spans.push((start, i));
                i += 1;
                start = i;
            }
            b'\r' => {
                spans.push((start, i));
                i += if bytes.get(i + 1) == Some(&b'\n') { 2 } else { 1 };
                start = i;
            }
            _ => i += 1,
        }
    }
    spans.push((start, bytes.len()));
    spans
}

/// The first line break used in `text`, `\n` when there is none
pub fn line_ending(text: &str) -> &'static str {
    match text.find(['\r', '\n']) {
        Some(i) if text[i..].starts_with("\r\n") => "\r\n",
        Some(i) if text.as_bytes()[i] == b'\r' => "\r",
        _ => "\n",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select(text: &str) -> FormatRange {
        MagicAwareRangeSelector::default().select_range(text)
    }

    #[test]
    fn counts_lines_like_an_editor() {
        assert_eq!(line_count(""), 1);
        assert_eq!(line_count("select 1"), 1);
        assert_eq!(line_count("select 1\n"), 2);
        assert_eq!(line_count("a\r\nb\r\nc"), 3);
        assert_eq!(line_count("\n\n"), 3);
        assert_eq!(line_count("a\rb"), 2);
        assert_eq!(line_count("a\r"), 2);
    }

    #[test]
    fn spans_exclude_every_break_style() {
        assert_eq!(line_spans("a\r\nbc\rd\n"), vec![(0, 1), (3, 5), (6, 7), (8, 8)]);
        assert_eq!(line_spans(""), vec![(0, 0)]);
    }

    #[test]
    fn detects_line_ending() {
        assert_eq!(line_ending("select 1"), "\n");
        assert_eq!(line_ending("%%sql\nselect 1\r\n"), "\n");
        assert_eq!(line_ending("%%sql\r\nselect 1"), "\r\n");
        assert_eq!(line_ending("%%sql\rselect 1"), "\r");
    }

    #[test]
    fn lone_carriage_return_ends_magic_line() {
        assert_eq!(
            select("%%sql\rselect 1"),
            FormatRange {
                first_line: 1,
                last_line: 1
            }
        );
    }

    #[test]
    fn magic_cell_skips_first_line() {
        assert_eq!(
            select("%%sql\nselect a,b from t"),
            FormatRange {
                first_line: 1,
                last_line: 1
            }
        );
        assert_eq!(
            select("%sparksql\nselect 1\nunion all\nselect 2\n"),
            FormatRange {
                first_line: 1,
                last_line: 4
            }
        );
    }

    #[test]
    fn plain_cell_starts_at_zero() {
        assert_eq!(
            select("select a,b from t"),
            FormatRange {
                first_line: 0,
                last_line: 0
            }
        );
        assert_eq!(
            select("select a\nfrom t"),
            FormatRange {
                first_line: 0,
                last_line: 1
            }
        );
    }

    #[test]
    fn empty_text_has_one_line() {
        let range = select("");
        assert_eq!(range.first_line, 0);
        assert_eq!(range.last_line, 0);
        assert!(!range.is_inverted());
    }

    #[test]
    fn magic_only_cell_is_inverted() {
        let range = select("%%sql");
        assert_eq!(
            range,
            FormatRange {
                first_line: 1,
                last_line: 0
            }
        );
        assert!(range.is_inverted());

        // A trailing newline gives the magic line an (empty) body
        assert!(!select("%%sql\n").is_inverted());
    }

    #[test]
    fn first_line_tracks_magic_detection() {
        let selector = MagicAwareRangeSelector::default();
        for text in ["%%trino\nselect 1", "%trino select 1", " %%sql\nx", "x\n%%sql"] {
            let expected = usize::from(selector.is_magic(text));
            assert_eq!(selector.select_range(text).first_line, expected, "{text:?}");
            assert_eq!(selector.select_range(text).last_line, line_count(text) - 1);
        }
    }

    #[test]
    fn custom_magics() {
        let selector = MagicAwareRangeSelector::new(MagicSet::empty().with_token("%%duckdb"));
        assert_eq!(selector.select_range("%%duckdb\nselect 1").first_line, 1);
        assert_eq!(selector.select_range("%%sql\nselect 1").first_line, 0);
    }
}
