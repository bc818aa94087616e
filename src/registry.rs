//! Registration of the formatter with a host
//!
//! A host keeps formatting providers keyed by a document selector. The
//! formatter is registered once at startup with [`register_formatter`] and
//! removed again with [`Registration::unregister`]; nothing is kept in
//! process-wide state. [`FormatterRegistry`] is a host that lives in memory
//! and is what the command line tool formats through.

use crate::host::{DocumentReader, uri_scheme};
use crate::provider::{DocumentFormattingEditProvider, SqlMagicFormatter};
use crate::selector::MagicAwareRangeSelector;
use anyhow::Result;
use lsp_types::{DocumentFilter, TextEdit};
use std::sync::Arc;

/// Language id the formatter is registered for
pub const SQL_LANGUAGE_ID: &str = "sql";

/// Documents a provider applies to; a document matches if any filter does
pub type DocumentSelector = Vec<DocumentFilter>;

/// Handle identifying one provider registration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RegistrationId(u64);

/// Host side of the formatting-provider contract
pub trait FormattingHost {
    fn register_document_formatting_provider(
        &mut self,
        selector: DocumentSelector,
        provider: Arc<dyn DocumentFormattingEditProvider>,
    ) -> RegistrationId;

    /// Remove a registration. Returns false if it was already gone.
    fn unregister(&mut self, id: RegistrationId) -> bool;
}

/// A live registration of the SQL formatter
#[must_use = "dropping the registration leaves the provider registered"]
#[derive(Debug)]
pub struct Registration {
    id: RegistrationId,
}

impl Registration {
    pub fn id(&self) -> RegistrationId {
        self.id
    }

    pub fn unregister<H: FormattingHost + ?Sized>(self, host: &mut H) -> bool {
        host.unregister(self.id)
    }
}

/// Selector matching SQL documents, whether files or notebook cells
pub fn sql_document_selector() -> DocumentSelector {
    vec![DocumentFilter {
        language: Some(SQL_LANGUAGE_ID.to_string()),
        scheme: None,
        pattern: None,
    }]
}

/// Register a [`SqlMagicFormatter`] built from `selector` for SQL documents.
pub fn register_formatter<H: FormattingHost + ?Sized>(
    host: &mut H,
    selector: MagicAwareRangeSelector,
) -> Registration {
    let provider = Arc::new(SqlMagicFormatter::new(selector));
    let id = host.register_document_formatting_provider(sql_document_selector(), provider);
    tracing::debug!(?id, "registered SQL formatter");
    Registration { id }
}

/// Whether `filter` applies to `document`
///
/// Glob patterns are matched against the URI with `*` as the only wildcard.
pub fn filter_matches(filter: &DocumentFilter, document: &dyn DocumentReader) -> bool {
    let language = filter
        .language
        .as_deref()
        .is_none_or(|language| language == document.language_id());
    let scheme = filter
        .scheme
        .as_deref()
        .is_none_or(|scheme| uri_scheme(document.uri()) == Some(scheme));
    let pattern = filter
        .pattern
        .as_deref()
        .is_none_or(|pattern| wildcard_match(pattern, document.uri()));
    language && scheme && pattern
}

fn wildcard_match(pattern: &str, text: &str) -> bool {
    let mut parts = pattern.split('*');
    let Some(head) = parts.next() else {
        return true;
    };
    let Some(mut rest) = text.strip_prefix(head) else {
        return false;
    };
    let parts: Vec<&str> = parts.collect();
    let Some((tail, middle)) = parts.split_last() else {
        return rest.is_empty();
    };
    for part in middle {
        match rest.find(part) {
            Some(i) => rest = &rest[i + part.len()..],
            None => return false,
        }
    }
    rest.ends_with(tail)
}

struct Entry {
    id: RegistrationId,
    selector: DocumentSelector,
    provider: Arc<dyn DocumentFormattingEditProvider>,
}

/// In-memory formatting host
#[derive(Default)]
pub struct FormatterRegistry {
    entries: Vec<Entry>,
    next_id: u64,
}

impl FormatterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The most recently registered provider whose selector matches.
    pub fn provider_for(
        &self,
        document: &dyn DocumentReader,
    ) -> Option<&Arc<dyn DocumentFormattingEditProvider>> {
        self.entries
            .iter()
            .rev()
            .find(|entry| {
                entry
                    .selector
                    .iter()
                    .any(|filter| filter_matches(filter, document))
            })
            .map(|entry| &entry.provider)
    }

    /// Ask the matching provider for edits. Documents no provider claims
    /// get no edits. Provider errors are returned unchanged.
    pub fn format_document(&self, document: &dyn DocumentReader) -> Result<Vec<TextEdit>> {
        match self.provider_for(document) {
            Some(provider) => provider.provide_document_formatting_edits(document),
            None => {
                tracing::trace!(
                    uri = document.uri(),
                    language = document.language_id(),
                    "no formatter registered"
                );
                Ok(Vec::new())
            }
        }
    }
}

impl FormattingHost for FormatterRegistry {
    fn register_document_formatting_provider(
        &mut self,
        selector: DocumentSelector,
        provider: Arc<dyn DocumentFormattingEditProvider>,
    ) -> RegistrationId {
        let id = RegistrationId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            selector,
            provider,
        });
        id
    }

    fn unregister(&mut self, id: RegistrationId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }
}
