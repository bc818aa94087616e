use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use sqlmagicfmt::formatter::Mode;
use sqlmagicfmt::host::{DocumentReader, TextDocument};
use sqlmagicfmt::magic::MagicSet;
use sqlmagicfmt::notebook::NotebookDocument;
use sqlmagicfmt::provider::SqlMagicFormatter;
use sqlmagicfmt::registry::{FormatterRegistry, SQL_LANGUAGE_ID, register_formatter};
use sqlmagicfmt::selector::MagicAwareRangeSelector;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "sqlmagicfmt",
    version,
    about = "Format SQL in notebook cells and .sql files"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Fmt {
        /// Paths (files or directories) to format (defaults to current dir)
        paths: Vec<PathBuf>,
        /// Write the formatted content back to the files
        #[arg(long)]
        write: bool,
        /// Check if files are formatted; non-zero exit if changes needed
        #[arg(long)]
        check: bool,
        /// Additional magic command tokens to recognize, e.g. %%duckdb
        #[arg(long = "magic", value_name = "TOKEN")]
        magics: Vec<String>,
    },
    /// Show the detected magic line and SQL range of each cell
    Inspect {
        /// .sql file or .ipynb notebook to inspect
        file: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FileKind {
    Sql,
    Notebook,
}

impl FileKind {
    fn of(path: &Path) -> Option<Self> {
        match path.extension().and_then(|s| s.to_str()) {
            Some("sql") => Some(FileKind::Sql),
            Some("ipynb") => Some(FileKind::Notebook),
            _ => None,
        }
    }
}

struct Session {
    registry: FormatterRegistry,
    magics: MagicSet,
    mode: Mode,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Fmt {
            paths,
            write,
            check,
            magics,
        } => {
            if write && check {
                bail!("--write and --check are mutually exclusive");
            }
            let mode = if write {
                Mode::Write
            } else if check {
                Mode::Check
            } else {
                Mode::Stdout
            };
            let magics = magics
                .into_iter()
                .fold(MagicSet::default(), |set, token| set.with_token(token));

            let mut registry = FormatterRegistry::new();
            let registration =
                register_formatter(&mut registry, MagicAwareRangeSelector::new(magics.clone()));
            let ctx = Session {
                registry,
                magics,
                mode,
            };

            let targets = if paths.is_empty() {
                vec![PathBuf::from(".")]
            } else {
                paths
            };
            let mut files = Vec::new();
            for p in targets {
                collect_files(&p, &mut files);
            }

            let results: Vec<_> = files
                .par_iter()
                .map(|path| process_file(path, &ctx))
                .collect();
            let mut had_change = false;
            let mut had_error = false;
            for (path, r) in files.iter().zip(results) {
                match r {
                    Ok(changed) => {
                        if changed && mode == Mode::Check {
                            println!("{}", path.display());
                        }
                        had_change |= changed;
                    }
                    Err(e) => {
                        had_error = true;
                        eprintln!("{:#}", e);
                    }
                }
            }

            let Session { mut registry, .. } = ctx;
            registration.unregister(&mut registry);

            if had_error || (mode == Mode::Check && had_change) {
                std::process::exit(1);
            }
        }
        Commands::Inspect { file } => {
            inspect_file(&file)?;
        }
    }
    Ok(())
}

fn collect_files(path: &Path, out: &mut Vec<PathBuf>) {
    if path.is_file() {
        if FileKind::of(path).is_some() {
            out.push(path.to_path_buf());
        } else {
            tracing::warn!("skipping {}: not a .sql or .ipynb file", path.display());
        }
        return;
    }
    for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
        let p = entry.path();
        if p.is_file() && FileKind::of(p).is_some() {
            out.push(p.to_path_buf());
        }
    }
}

fn process_file(path: &Path, ctx: &Session) -> Result<bool> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let formatted = match FileKind::of(path) {
        Some(FileKind::Sql) => format_sql_file(path, &content, ctx)?,
        Some(FileKind::Notebook) => format_notebook_file(path, &content, ctx)?,
        None => bail!("{}: unsupported file type", path.display()),
    };
    let changed = formatted != content;
    tracing::debug!(path = %path.display(), changed, "processed");
    match ctx.mode {
        Mode::Stdout => {
            println!("===== {} =====", path.display());
            print!("{}", formatted);
        }
        Mode::Write => {
            if changed {
                fs::write(path, formatted)
                    .with_context(|| format!("writing {}", path.display()))?;
            }
        }
        Mode::Check => {}
    }
    Ok(changed)
}

fn format_sql_file(path: &Path, content: &str, ctx: &Session) -> Result<String> {
    let doc = TextDocument::new(file_uri(path), SQL_LANGUAGE_ID, content);
    let edits = ctx.registry.format_document(&doc)?;
    if edits.is_empty() {
        return Ok(doc.into_text());
    }
    let mut formatted = doc.apply_edits(&edits)?;
    // The formatter trims its output; keep the file's final line break
    let eol = doc.eol();
    if content.ends_with(eol) && !formatted.ends_with(eol) {
        formatted.push_str(eol);
    }
    Ok(formatted)
}

fn format_notebook_file(path: &Path, content: &str, ctx: &Session) -> Result<String> {
    let mut notebook = NotebookDocument::parse(path.display().to_string(), content)?;
    let changed = notebook.format_cells(&ctx.registry, &ctx.magics)?;
    if changed == 0 {
        return Ok(content.to_string());
    }
    tracing::debug!(path = %path.display(), cells = changed, "formatted notebook cells");
    notebook.to_json()
}

fn file_uri(path: &Path) -> String {
    format!("file://{}", path.display())
}

fn inspect_file(path: &Path) -> Result<()> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let formatter = SqlMagicFormatter::default();
    println!("===== {} =====", path.display());
    match FileKind::of(path) {
        Some(FileKind::Sql) => {
            let doc = TextDocument::new(file_uri(path), SQL_LANGUAGE_ID, content);
            print_document(&formatter, &doc)?;
        }
        Some(FileKind::Notebook) => {
            let notebook = NotebookDocument::parse(path.display().to_string(), &content)?;
            println!("notebook type: {}", notebook.notebook_type());
            for cell in notebook.code_cells(formatter.selector().magics()) {
                print!("cell {} ", cell.index);
                print_document(&formatter, &cell.document)?;
            }
        }
        None => bail!("{}: expected a .sql or .ipynb file", path.display()),
    }
    Ok(())
}

fn print_document(formatter: &SqlMagicFormatter, doc: &TextDocument) -> Result<()> {
    let selector = formatter.selector();
    let text = doc.text();
    let magic = selector.magics().matching(text).unwrap_or("-");
    let selected = selector.select_range(text);
    let range = match formatter.sql_range(doc)? {
        Some(r) => format!(
            "{}:{}-{}:{}",
            r.start.line, r.start.character, r.end.line, r.end.character
        ),
        None => "empty".to_string(),
    };
    println!(
        "[{}] magic={} lines={}..={} range={}",
        doc.language_id(),
        magic,
        selected.first_line,
        selected.last_line,
        range
    );
    Ok(())
}
