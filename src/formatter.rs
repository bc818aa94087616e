//! SQL pretty-printing with a fixed profile
//!
//! The actual formatting is done by [`sqlformat`]. This module pins the
//! profile used for notebook SQL: two-space indentation, uppercase keywords
//! and blank lines between consecutive statements. The profile is not
//! adjustable at runtime.
//!
//! # Example
//!
//! ```rust
//! use sqlmagicfmt::formatter::format_sql;
//!
//! let formatted = format_sql(Some("select a,b from t"));
//! assert_eq!(formatted, "SELECT\n  a,\n  b\nFROM\n  t");
//! ```

use once_cell::sync::Lazy;
use sqlformat::{FormatOptions, Indent, QueryParams};

/// Number of spaces per indentation level
pub const INDENT_WIDTH: u8 = 2;

/// Line breaks emitted after a statement terminator; three breaks leave two
/// blank lines before the next statement
pub const LINES_BETWEEN_QUERIES: u8 = 3;

/// The formatting profile shared by every request
///
/// Spark SQL is formatted with the generic grammar, which covers the
/// keywords and punctuation notebook queries use.
pub static SQL_FORMAT_OPTIONS: Lazy<FormatOptions<'static>> = Lazy::new(|| FormatOptions {
    indent: Indent::Spaces(INDENT_WIDTH),
    uppercase: Some(true),
    lines_between_queries: LINES_BETWEEN_QUERIES,
    ..FormatOptions::default()
});

/// Output mode for the command line tool
///
/// Determines how the formatted documents are handled after processing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Print formatted documents to stdout
    Stdout,
    /// Write formatted documents back to their files
    Write,
    /// Check if formatting would change anything (used for CI/validation)
    Check,
}

/// Format a piece of SQL with [`SQL_FORMAT_OPTIONS`]
///
/// Absent input is treated as the empty string. Malformed SQL is not
/// rejected; the formatter does its best with whatever tokens it finds.
pub fn format_sql(text: Option<&str>) -> String {
    sqlformat::format(text.unwrap_or_default(), &QueryParams::None, &SQL_FORMAT_OPTIONS)
}
