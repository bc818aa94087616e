//! # sqlmagicfmt - SQL Formatter for Notebook Cells
//!
//! sqlmagicfmt formats SQL written in notebook cells, including cells that
//! start with a SQL magic command such as `%%sql`, `%sparksql` or `%%trino`.
//! The magic line is left exactly as written; only the SQL after it is
//! reformatted. Formatting itself is done by [sqlformat](https://docs.rs/sqlformat)
//! with a fixed profile: two-space indentation, uppercase keywords and blank
//! lines between statements.
//!
//! ## Usage
//!
//! ### As a Library
//!
//! ```rust
//! use sqlmagicfmt::host::TextDocument;
//! use sqlmagicfmt::registry::{FormatterRegistry, register_formatter};
//! use sqlmagicfmt::selector::MagicAwareRangeSelector;
//!
//! let mut registry = FormatterRegistry::new();
//! let registration = register_formatter(&mut registry, MagicAwareRangeSelector::default());
//!
//! let cell = TextDocument::new("vscode-notebook-cell:/nb.ipynb#cell0", "sql", "%%sql\nselect a,b from t");
//! let edits = registry.format_document(&cell).unwrap();
//! assert_eq!(cell.apply_edits(&edits).unwrap(), "%%sql\nSELECT\n  a,\n  b\nFROM\n  t");
//!
//! registration.unregister(&mut registry);
//! ```
//!
//! ### As a CLI Tool
//!
//! `sqlmagicfmt fmt` formats `.sql` files and the SQL cells of `.ipynb`
//! notebooks. See the binary's `--help` for details.
//!
//! ## Modules
//!
//! - [`magic`] - The set of recognized magic command tokens
//! - [`selector`] - Which lines of a cell are SQL
//! - [`formatter`] - The fixed SQL formatting profile
//! - [`host`] - Document and edit capabilities supplied by an editor
//! - [`provider`] - The document formatting provider
//! - [`registry`] - Registering the provider with a host
//! - [`notebook`] - Jupyter notebook documents

/// Recognized SQL magic command tokens
pub mod magic;

/// Magic-aware selection of the SQL line range
pub mod selector;

/// SQL formatting with a fixed profile
pub mod formatter;

/// Host editor capabilities
pub mod host;

/// Formatting provider combining selection and formatting
pub mod provider;

/// Provider registration and an in-memory host
pub mod registry;

/// Jupyter notebook support
pub mod notebook;
