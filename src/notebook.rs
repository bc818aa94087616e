//! Jupyter notebook documents
//!
//! Loads `.ipynb` files (nbformat 4 JSON), exposes their code cells as
//! notebook-cell documents and writes formatted cells back. Only the `cells`
//! array is interpreted; every other field is carried through untouched.
//!
//! A code cell is treated as SQL when its editor metadata says so
//! (`metadata.vscode.languageId`) or when it starts with a SQL magic line.

use crate::host::{DocumentReader, NOTEBOOK_CELL_SCHEME, TextDocument};
use crate::magic::MagicSet;
use crate::registry::{FormatterRegistry, SQL_LANGUAGE_ID};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Notebook type of documents in the Jupyter format
pub const JUPYTER_NOTEBOOK_TYPE: &str = "jupyter-notebook";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawNotebook {
    cells: Vec<RawCell>,
    #[serde(default)]
    metadata: Map<String, Value>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawCell {
    cell_type: String,
    #[serde(default)]
    metadata: Map<String, Value>,
    source: Source,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

/// nbformat allows the source as one string or as a list of lines
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum Source {
    Lines(Vec<String>),
    Text(String),
}

impl Source {
    fn text(&self) -> String {
        match self {
            Source::Lines(lines) => lines.concat(),
            Source::Text(text) => text.clone(),
        }
    }

    fn replace(&mut self, text: &str) {
        match self {
            Source::Lines(lines) => {
                *lines = text.split_inclusive('\n').map(String::from).collect();
            }
            Source::Text(old) => *old = text.to_string(),
        }
    }
}

/// A code cell viewed as its own document
#[derive(Debug, Clone)]
pub struct NotebookCell {
    /// Position of the cell in the notebook, counting every cell kind
    pub index: usize,
    pub document: TextDocument,
}

/// A parsed notebook
#[derive(Debug, Clone)]
pub struct NotebookDocument {
    uri: String,
    notebook_type: String,
    raw: RawNotebook,
}

impl NotebookDocument {
    /// Parse nbformat JSON. `uri` identifies the notebook, e.g. its path.
    pub fn parse(uri: impl Into<String>, json: &str) -> Result<Self> {
        let uri = uri.into();
        let raw: RawNotebook =
            serde_json::from_str(json).with_context(|| format!("invalid notebook {}", uri))?;
        if let Some(major) = raw.rest.get("nbformat").and_then(Value::as_u64) {
            if major < 4 {
                bail!("{}: nbformat {} is not supported", uri, major);
            }
        }
        Ok(Self {
            uri,
            notebook_type: JUPYTER_NOTEBOOK_TYPE.to_string(),
            raw,
        })
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn notebook_type(&self) -> &str {
        &self.notebook_type
    }

    pub fn is_jupyter_notebook(&self) -> bool {
        self.notebook_type == JUPYTER_NOTEBOOK_TYPE
    }

    /// Language of the kernel, `python` when the notebook does not say
    pub fn kernel_language(&self) -> &str {
        let metadata = &self.raw.metadata;
        metadata
            .get("language_info")
            .and_then(|info| info.get("name"))
            .or_else(|| metadata.get("kernelspec").and_then(|k| k.get("language")))
            .and_then(Value::as_str)
            .unwrap_or("python")
    }

    /// Code cells as documents. Language ids come from the cell metadata,
    /// then from a magic line, then from the kernel.
    pub fn code_cells(&self, magics: &MagicSet) -> Vec<NotebookCell> {
        self.raw
            .cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.cell_type == "code")
            .map(|(index, cell)| {
                let text = cell.source.text();
                let language = cell
                    .metadata
                    .get("vscode")
                    .and_then(|vscode| vscode.get("languageId"))
                    .and_then(Value::as_str)
                    .unwrap_or_else(|| {
                        if magics.is_magic(&text) {
                            SQL_LANGUAGE_ID
                        } else {
                            self.kernel_language()
                        }
                    })
                    .to_string();
                let uri = format!("{}:{}#cell{}", NOTEBOOK_CELL_SCHEME, self.uri, index);
                NotebookCell {
                    index,
                    document: TextDocument::new(uri, language, text),
                }
            })
            .collect()
    }

    /// Replace the source of the cell at `index`.
    pub fn set_cell_text(&mut self, index: usize, text: &str) -> Result<()> {
        let cell = self
            .raw
            .cells
            .get_mut(index)
            .with_context(|| format!("{}: no cell {}", self.uri, index))?;
        cell.source.replace(text);
        Ok(())
    }

    /// Format every code cell through `registry`. Returns how many cells
    /// changed.
    pub fn format_cells(&mut self, registry: &FormatterRegistry, magics: &MagicSet) -> Result<usize> {
        let mut changed = 0;
        for cell in self.code_cells(magics) {
            let edits = registry.format_document(&cell.document)?;
            if edits.is_empty() {
                continue;
            }
            let formatted = cell.document.apply_edits(&edits)?;
            if formatted != cell.document.text() {
                self.set_cell_text(cell.index, &formatted)?;
                changed += 1;
            }
        }
        Ok(changed)
    }

    /// Serialize the way Jupyter writes notebooks: sorted keys, one-space
    /// indentation and a trailing newline.
    pub fn to_json(&self) -> Result<String> {
        let value = serde_json::to_value(&self.raw)?;
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b" ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        value.serialize(&mut serializer)?;
        out.push(b'\n');
        Ok(String::from_utf8(out)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::register_formatter;
    use crate::selector::MagicAwareRangeSelector;
    use serde_json::json;

    fn notebook() -> NotebookDocument {
        let json = json!({
            "cells": [
                {
                    "cell_type": "markdown",
                    "metadata": {},
                    "source": ["# Report\n"]
                },
                {
                    "cell_type": "code",
                    "execution_count": null,
                    "metadata": {},
                    "outputs": [],
                    "source": ["%%sql\n", "select a,b from t"]
                },
                {
                    "cell_type": "code",
                    "execution_count": 1,
                    "metadata": {},
                    "outputs": [],
                    "source": "df = spark.table('t')"
                },
                {
                    "cell_type": "code",
                    "execution_count": null,
                    "metadata": {"vscode": {"languageId": "sql"}},
                    "outputs": [],
                    "source": "select 1"
                },
                {
                    "cell_type": "code",
                    "execution_count": null,
                    "metadata": {},
                    "outputs": [],
                    "source": ["%%sql"]
                }
            ],
            "metadata": {"language_info": {"name": "python"}},
            "nbformat": 4,
            "nbformat_minor": 5
        });
        NotebookDocument::parse("/work/report.ipynb", &json.to_string()).unwrap()
    }

    #[test]
    fn exposes_code_cells_with_languages() {
        let nb = notebook();
        assert!(nb.is_jupyter_notebook());
        assert_eq!(nb.kernel_language(), "python");

        let cells = nb.code_cells(&MagicSet::default());
        let summary: Vec<_> = cells
            .iter()
            .map(|c| (c.index, c.document.language_id().to_string()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (1, "sql".to_string()),
                (2, "python".to_string()),
                (3, "sql".to_string()),
                (4, "sql".to_string()),
            ]
        );
        assert_eq!(cells[0].document.text(), "%%sql\nselect a,b from t");
        assert!(cells[0].document.is_notebook_cell());
        assert_eq!(
            cells[0].document.uri(),
            "vscode-notebook-cell:/work/report.ipynb#cell1"
        );
    }

    #[test]
    fn formats_sql_cells_only() {
        let mut nb = notebook();
        let mut registry = FormatterRegistry::new();
        let _registration = register_formatter(&mut registry, MagicAwareRangeSelector::default());

        let changed = nb.format_cells(&registry, &MagicSet::default()).unwrap();
        assert_eq!(changed, 2);

        let value: Value = serde_json::from_str(&nb.to_json().unwrap()).unwrap();
        assert_eq!(
            value["cells"][1]["source"],
            json!(["%%sql\n", "SELECT\n", "  a,\n", "  b\n", "FROM\n", "  t"])
        );
        assert_eq!(value["cells"][2]["source"], json!("df = spark.table('t')"));
        assert_eq!(value["cells"][3]["source"], json!("SELECT\n  1"));
        assert_eq!(value["cells"][4]["source"], json!(["%%sql"]));
        assert_eq!(value["cells"][0]["source"], json!(["# Report\n"]));
        assert_eq!(value["nbformat_minor"], json!(5));
        assert_eq!(value["cells"][1]["execution_count"], Value::Null);
    }

    #[test]
    fn writes_jupyter_layout() {
        let json = notebook().to_json().unwrap();
        assert!(json.ends_with("}\n"));
        assert!(json.starts_with("{\n \"cells\": [\n  {\n"));
    }

    #[test]
    fn rejects_old_or_broken_notebooks() {
        assert!(NotebookDocument::parse("a.ipynb", "not json").is_err());
        assert!(NotebookDocument::parse("a.ipynb", r#"{"cells": [], "nbformat": 3}"#).is_err());
        assert!(NotebookDocument::parse("a.ipynb", r#"{"cells": [], "nbformat": 4}"#).is_ok());
    }

    #[test]
    fn set_cell_text_checks_index() {
        let mut nb = notebook();
        assert!(nb.set_cell_text(9, "x").is_err());
        nb.set_cell_text(2, "x = 1\ny = 2").unwrap();
        let cells = nb.code_cells(&MagicSet::default());
        assert_eq!(cells[1].document.text(), "x = 1\ny = 2");
    }
}
