//! Capabilities consumed from the host editor
//!
//! The formatter only needs to read a document and to describe a replacement.
//! Both are expressed as traits so any editor binding can supply them:
//!
//! - [`DocumentReader`] - full text, line ranges and text slices of a document
//! - [`EditEmitter`] - construction of a replace-range edit
//!
//! Positions and edits use the Language Server Protocol types from
//! [`lsp_types`], so columns are counted in UTF-16 code units.
//! [`TextDocument`] is an in-memory implementation used by the command line
//! tool and the tests.

use crate::selector::{line_ending, line_spans};
use anyhow::{Result, anyhow, bail};
use lsp_types::{Position, Range, TextEdit};

/// URI scheme editors use for the pseudo-documents backing notebook cells
pub const NOTEBOOK_CELL_SCHEME: &str = "vscode-notebook-cell";

/// Read access to a document owned by the host
pub trait DocumentReader {
    /// Full text of the document
    fn text(&self) -> &str;

    /// Number of lines; an empty document has one line. `\n`, `\r\n` and a
    /// lone `\r` each end a line.
    fn line_count(&self) -> usize;

    /// Range of the given line, excluding its line break
    fn line_range(&self, line: usize) -> Result<Range>;

    /// Text covered by `range`
    fn text_in(&self, range: Range) -> Result<&str>;

    /// Language the host assigned to the document, e.g. `sql`
    fn language_id(&self) -> &str;

    /// Identifier of the document; its scheme tells files and cells apart
    fn uri(&self) -> &str;

    /// Line break used by the document, `\n` when it has a single line
    fn eol(&self) -> &'static str {
        line_ending(self.text())
    }

    /// Whether the document is a cell of a notebook rather than a file
    fn is_notebook_cell(&self) -> bool {
        uri_scheme(self.uri()) == Some(NOTEBOOK_CELL_SCHEME)
    }
}

/// Builds replace instructions in the host's edit representation
pub trait EditEmitter {
    type Edit;

    fn replace(&self, range: Range, new_text: String) -> Self::Edit;
}

/// Emits plain LSP [`TextEdit`]s
#[derive(Clone, Copy, Debug, Default)]
pub struct LspEditEmitter;

impl EditEmitter for LspEditEmitter {
    type Edit = TextEdit;

    fn replace(&self, range: Range, new_text: String) -> TextEdit {
        TextEdit::new(range, new_text)
    }
}

/// Scheme part of a URI (`file` in `file:///a.sql`)
pub fn uri_scheme(uri: &str) -> Option<&str> {
    let (scheme, _) = uri.split_once(':')?;
    let valid = scheme
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some(scheme)
}

/// An in-memory text document
///
/// # Example
///
/// ```rust
/// use sqlmagicfmt::host::{DocumentReader, TextDocument};
///
/// let doc = TextDocument::new("file:///q.sql", "sql", "%%sql\nselect 1");
/// assert_eq!(doc.line_count(), 2);
/// let second = doc.line_range(1).unwrap();
/// assert_eq!(doc.text_in(second).unwrap(), "select 1");
/// ```
#[derive(Clone, Debug)]
pub struct TextDocument {
    uri: String,
    language_id: String,
    text: String,
    lines: Vec<(usize, usize)>,
}

impl TextDocument {
    pub fn new(
        uri: impl Into<String>,
        language_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        let text = text.into();
        let lines = line_spans(&text);
        Self {
            uri: uri.into(),
            language_id: language_id.into(),
            text,
            lines,
        }
    }

    /// Consume the document, returning its text
    pub fn into_text(self) -> String {
        self.text
    }

    /// Byte span of a line's content, without its line break
    fn line_span(&self, line: usize) -> Result<(usize, usize)> {
        self.lines.get(line).copied().ok_or_else(|| {
            anyhow!(
                "line {} out of range for {} ({} lines)",
                line,
                self.uri,
                self.line_count()
            )
        })
    }

    /// Byte offset of an LSP position
    pub fn offset_at(&self, position: Position) -> Result<usize> {
        let (start, end) = self.line_span(position.line as usize)?;
        let mut units = 0u32;
        for (i, c) in self.text[start..end].char_indices() {
            if units == position.character {
                return Ok(start + i);
            }
            if units > position.character {
                bail!(
                    "position {}:{} splits a character in {}",
                    position.line,
                    position.character,
                    self.uri
                );
            }
            units += c.len_utf16() as u32;
        }
        if units == position.character {
            Ok(end)
        } else {
            bail!(
                "column {} out of range on line {} of {}",
                position.character,
                position.line,
                self.uri
            )
        }
    }

    /// Apply edits and return the resulting text.
    ///
    /// Edits must not overlap; they are applied back to front so earlier
    /// offsets stay valid.
    pub fn apply_edits(&self, edits: &[TextEdit]) -> Result<String> {
        let mut spans = edits
            .iter()
            .map(|edit| {
                let start = self.offset_at(edit.range.start)?;
                let end = self.offset_at(edit.range.end)?;
                if start > end {
                    bail!("edit range {:?} is inverted", edit.range);
                }
                Ok((start, end, edit.new_text.as_str()))
            })
            .collect::<Result<Vec<_>>>()?;
        spans.sort_by_key(|(start, end, _)| (*start, *end));
        if spans.windows(2).any(|pair| pair[0].1 > pair[1].0) {
            bail!("overlapping edits for {}", self.uri);
        }

        let mut output = self.text.clone();
        for (start, end, new_text) in spans.into_iter().rev() {
            output.replace_range(start..end, new_text);
        }
        Ok(output)
    }
}

impl DocumentReader for TextDocument {
    fn text(&self) -> &str {
        &self.text
    }

    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn line_range(&self, line: usize) -> Result<Range> {
        let (start, end) = self.line_span(line)?;
        let width: usize = self.text[start..end].chars().map(char::len_utf16).sum();
        let line = line as u32;
        Ok(Range::new(
            Position::new(line, 0),
            Position::new(line, width as u32),
        ))
    }

    fn text_in(&self, range: Range) -> Result<&str> {
        let start = self.offset_at(range.start)?;
        let end = self.offset_at(range.end)?;
        if start > end {
            bail!("range {:?} is inverted", range);
        }
        Ok(&self.text[start..end])
    }

    fn language_id(&self) -> &str {
        &self.language_id
    }

    fn uri(&self) -> &str {
        &self.uri
    }
}
