//! The document formatting provider
//!
//! [`SqlMagicFormatter`] ties the pieces together: it selects the SQL lines
//! of a document with [`MagicAwareRangeSelector`], formats that text with
//! [`format_sql`] and describes the result as a single replace edit over the
//! selected range. The magic line, if any, is never part of the edit.

use crate::formatter::format_sql;
use crate::host::{DocumentReader, EditEmitter, LspEditEmitter};
use crate::selector::MagicAwareRangeSelector;
use anyhow::Result;
use lsp_types::{Range, TextEdit};

/// Contract a host calls to obtain formatting edits for a document
pub trait DocumentFormattingEditProvider: Send + Sync {
    /// Edits that format `document`, in application order. An empty list
    /// means there is nothing to change.
    fn provide_document_formatting_edits(
        &self,
        document: &dyn DocumentReader,
    ) -> Result<Vec<TextEdit>>;
}

/// Formats SQL documents and notebook cells that may start with a magic line
#[derive(Clone, Debug, Default)]
pub struct SqlMagicFormatter {
    selector: MagicAwareRangeSelector,
}

impl SqlMagicFormatter {
    /// A formatter selecting SQL lines with `selector`
    pub fn new(selector: MagicAwareRangeSelector) -> Self {
        Self { selector }
    }

    /// The selector deciding which lines are SQL
    pub fn selector(&self) -> &MagicAwareRangeSelector {
        &self.selector
    }

    /// The document range holding SQL, or `None` for a cell that is only a
    /// magic line.
    pub fn sql_range(&self, document: &dyn DocumentReader) -> Result<Option<Range>> {
        let selected = self.selector.select_range(document.text());
        if selected.is_inverted() {
            return Ok(None);
        }
        let first = document.line_range(selected.first_line)?;
        let last = document.line_range(selected.last_line)?;
        Ok(Some(Range::new(first.start, last.end)))
    }

    /// Compute the formatting edits using the host's edit representation.
    ///
    /// Yields at most one edit. A magic line with no SQL after it yields none.
    pub fn edits_with<E: EditEmitter>(
        &self,
        document: &dyn DocumentReader,
        emitter: &E,
    ) -> Result<Vec<E::Edit>> {
        let Some(range) = self.sql_range(document)? else {
            tracing::debug!(uri = document.uri(), "magic line without SQL, nothing to format");
            return Ok(Vec::new());
        };

        if document.is_notebook_cell() {
            tracing::debug!(uri = document.uri(), "formatting notebook SQL cell");
        } else {
            tracing::debug!(uri = document.uri(), "formatting SQL document");
        }

        let text = document.text_in(range)?;
        let formatted = with_line_ending(format_sql(Some(text)), document.eol());
        tracing::trace!(
            "replacing {}:{} - {}:{}",
            range.start.line,
            range.start.character,
            range.end.line,
            range.end.character
        );
        Ok(vec![emitter.replace(range, formatted)])
    }
}

/// Rewrite the formatter's `\n` breaks to the document's own line ending.
fn with_line_ending(formatted: String, eol: &str) -> String {
    if eol == "\n" {
        formatted
    } else {
        formatted.replace("\r\n", "\n").replace('\n', eol)
    }
}

impl DocumentFormattingEditProvider for SqlMagicFormatter {
    fn provide_document_formatting_edits(
        &self,
        document: &dyn DocumentReader,
    ) -> Result<Vec<TextEdit>> {
        self.edits_with(document, &LspEditEmitter)
    }
}
