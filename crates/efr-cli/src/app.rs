//! CLI Application logic
//!
//! Contains the command-line interface implementation.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{debug, Level};
use tracing_subscriber::EnvFilter;

use efr_core::{
    compile_batch, lorem, FsStore, HouseStyle, JobId, LatexCompiler, Pipeline, ReportStore,
    Settings, CONFIG_FILE_NAME,
};
use efr_markup::{build_equation, expand, scan_figures, scan_references};

/// Output format for reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for tool consumption
    Json,
}

/// What `expand` prints
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExpandView {
    /// Expanded body only
    #[default]
    Body,
    /// Complete source with house style
    Full,
    /// Markers found in the body
    Markers,
}

/// Upper bound for `lorem --paras`
const MAX_LOREM_PARAGRAPHS: i64 = 1000;

#[derive(Parser)]
#[command(name = "efr")]
#[command(author, version, about = "Collaborative LaTeX reports with a shared house style", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./efr.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a stored document to PDF
    Compile {
        /// Document id
        id: String,

        /// Output PDF file (defaults to <ID>.pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compile a document body file to PDF
    CompileFile {
        /// Input body file
        input: PathBuf,

        /// House style: a .toml style file or a raw LaTeX preamble
        #[arg(short, long)]
        style: Option<PathBuf>,

        /// Output PDF file (defaults to the input name with .pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compile several stored documents (all of them when none are named)
    Batch {
        /// Document ids
        ids: Vec<String>,

        /// Maximum concurrent compiler processes
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Directory for the produced PDFs
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show the LaTeX a document body expands to
    Expand {
        /// Input body file
        input: PathBuf,

        /// Print the complete source including the house style
        #[arg(long, conflicts_with = "list")]
        full: bool,

        /// List the figure and reference markers instead
        #[arg(long)]
        list: bool,

        /// House style: a .toml style file or a raw LaTeX preamble
        #[arg(short, long)]
        style: Option<PathBuf>,

        /// Output format for --list (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Print a LaTeX equation block
    Equation {
        /// Left-hand side
        #[arg(long)]
        lhs: String,

        /// Right-hand side
        #[arg(long)]
        rhs: String,

        /// Cross-reference label (emitted as eq:LABEL)
        #[arg(short, long)]
        label: Option<String>,
    },

    /// Print placeholder paragraphs
    Lorem {
        /// Number of paragraphs
        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(..=MAX_LOREM_PARAGRAPHS))]
        paras: u16,
    },

    /// Check that the configured LaTeX compiler is installed
    Doctor,

    /// Create a config file, documents directory and default house style
    Init {
        /// Workspace directory
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Overwrite an existing config and style
        #[arg(long)]
        force: bool,
    },
}

/// Run the CLI application
///
/// This is the main entry point for the command-line interface.
/// It parses arguments and dispatches to the appropriate command.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Compile { id, output } => {
            let settings = load_settings(config)?;
            compile_command(&settings, &id, output.as_deref())?;
        }
        Commands::CompileFile {
            input,
            style,
            output,
        } => {
            let settings = load_settings(config)?;
            compile_file_command(&settings, &input, style.as_deref(), output.as_deref())?;
        }
        Commands::Batch {
            ids,
            jobs,
            output_dir,
            format,
        } => {
            let settings = load_settings(config)?;
            batch_command(&settings, &ids, jobs, &output_dir, format)?;
        }
        Commands::Expand {
            input,
            full,
            list,
            style,
            format,
        } => {
            let settings = load_settings(config)?;
            let view = if list {
                ExpandView::Markers
            } else if full {
                ExpandView::Full
            } else {
                ExpandView::Body
            };
            expand_command(&settings, &input, view, style.as_deref(), format)?;
        }
        Commands::Equation { lhs, rhs, label } => {
            equation_command(&lhs, &rhs, label.as_deref());
        }
        Commands::Lorem { paras } => {
            lorem_command(paras.into());
        }
        Commands::Doctor => {
            let settings = load_settings(config)?;
            doctor_command(&settings)?;
        }
        Commands::Init { dir, force } => {
            init_command(&dir, force)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    // A subscriber may already be installed when run_cli is embedded
    let _ = tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose, rust_log.as_deref()))
        .with_writer(std::io::stderr)
        .try_init();
}

/// Log filter: `RUST_LOG` as given unless `-v` was passed, otherwise the
/// `-v` level on top of any `RUST_LOG` directives
fn log_filter(verbose: u8, rust_log: Option<&str>) -> EnvFilter {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let from_env = rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok());

    match from_env {
        Some(filter) if verbose == 0 => filter,
        Some(filter) => filter.add_directive(level.into()),
        None => EnvFilter::new("").add_directive(level.into()),
    }
}

fn load_settings(config: Option<&Path>) -> Result<Settings> {
    Settings::load(config).with_context(|| match config {
        Some(path) => format!("Failed to load config: {}", path.display()),
        None => format!("Failed to load {}", CONFIG_FILE_NAME),
    })
}

/// Resolve the house style: an explicit file, or the store's current style
fn load_style(settings: &Settings, style: Option<&Path>) -> Result<HouseStyle> {
    let Some(path) = style else {
        return settings
            .open_store()
            .house_style()
            .context("Failed to read house style");
    };

    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read style file: {}", path.display()))?;

    if path.extension().and_then(|e| e.to_str()) == Some("toml") {
        HouseStyle::from_toml_str(&text)
            .with_context(|| format!("Invalid house style: {}", path.display()))
    } else {
        Ok(HouseStyle::with_preamble(text))
    }
}

/// Execute the compile command
pub fn compile_command(settings: &Settings, id: &str, output: Option<&Path>) -> Result<PathBuf> {
    println!("efr v{}", efr_core::VERSION);
    println!("Compiling document: {}", id);

    let store = settings.open_store();
    let pipeline = settings.build_pipeline();

    let pdf = match pipeline.compile_stored(&store, id) {
        Ok(pdf) => pdf,
        Err(e) => {
            debug!(id = %id, error = %e, "Compile failed");
            anyhow::bail!("{}", e.user_message());
        }
    };

    let output_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(format!("{}.pdf", id)));
    write_pdf(&output_path, &pdf)?;
    Ok(output_path)
}

/// Execute the compile-file command
pub fn compile_file_command(
    settings: &Settings,
    input: &Path,
    style: Option<&Path>,
    output: Option<&Path>,
) -> Result<PathBuf> {
    println!("efr v{}", efr_core::VERSION);
    println!("Compiling: {}", input.display());

    // Check input file exists
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    let body = fs::read_to_string(input)
        .with_context(|| format!("Failed to read input file: {}", input.display()))?;
    let style = load_style(settings, style)?;

    let job = JobId::new(
        input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document"),
    );

    let source_dir = input
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let pipeline = settings.build_pipeline_for(source_dir);
    let pdf = pipeline
        .compile_document(&body, &style.preamble, &job)
        .map_err(|failure| {
            debug!(job = %job, error = %failure, "Compile failed");
            anyhow::anyhow!("{}", failure.user_message())
        })?;

    let output_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| input.with_extension("pdf"));
    write_pdf(&output_path, &pdf)?;
    Ok(output_path)
}

fn write_pdf(path: &Path, pdf: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, pdf).with_context(|| format!("Failed to write PDF: {}", path.display()))?;

    println!();
    println!("Compile complete!");
    println!("  Output: {}", path.display());
    println!("  Size: {} bytes", pdf.len());
    Ok(())
}

/// One line of the batch report
#[derive(Debug, Serialize)]
struct BatchEntry {
    id: String,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bytes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Execute the batch command
///
/// Returns the number of documents compiled; fails if any document failed.
pub fn batch_command(
    settings: &Settings,
    ids: &[String],
    jobs: Option<usize>,
    output_dir: &Path,
    format: OutputFormat,
) -> Result<usize> {
    let store = settings.open_store();
    let ids = if ids.is_empty() {
        store
            .document_ids()
            .context("Failed to list stored documents")?
    } else {
        ids.to_vec()
    };

    if ids.is_empty() {
        if format == OutputFormat::Text {
            println!("No documents found in {}", store.documents_dir().display());
        } else {
            println!("[]");
        }
        return Ok(0);
    }

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create directory: {}", output_dir.display()))?;

    let max_jobs = jobs.unwrap_or(settings.batch.max_jobs);
    let pipeline = settings.build_pipeline();
    let outcomes = compile_batch(&pipeline, &store, &ids, max_jobs);

    let mut entries = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        let entry = match outcome.result {
            Ok(pdf) => {
                let path = output_dir.join(format!("{}.pdf", outcome.id));
                fs::write(&path, &pdf)
                    .with_context(|| format!("Failed to write PDF: {}", path.display()))?;
                BatchEntry {
                    id: outcome.id,
                    ok: true,
                    output: Some(path.display().to_string()),
                    bytes: Some(pdf.len()),
                    error: None,
                }
            }
            Err(e) => BatchEntry {
                id: outcome.id,
                ok: false,
                output: None,
                bytes: None,
                error: Some(e.user_message()),
            },
        };
        entries.push(entry);
    }

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&entries)
                .context("Failed to serialize batch report to JSON")?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            for entry in &entries {
                match (&entry.output, &entry.error) {
                    (Some(output), _) => println!("✓ {} -> {}", entry.id, output),
                    (None, Some(error)) => println!("✗ {}: {}", entry.id, error),
                    (None, None) => println!("✗ {}", entry.id),
                }
            }
        }
    }

    let compiled = entries.iter().filter(|e| e.ok).count();
    let failed = entries.len() - compiled;
    if failed > 0 {
        anyhow::bail!("{} of {} documents failed to compile", failed, entries.len());
    }
    Ok(compiled)
}

/// Marker listing printed by `expand --list`
#[derive(Debug, Serialize)]
struct MarkerReport {
    figures: Vec<efr_markup::FigureMarker>,
    references: Vec<efr_markup::ReferenceMarker>,
    /// Reference labels with no figure of that label in the same body
    unresolved: Vec<String>,
}

/// Produce the text printed by `expand`
pub fn render_expansion(
    body: &str,
    view: ExpandView,
    style: &HouseStyle,
    format: OutputFormat,
) -> Result<String> {
    match view {
        ExpandView::Body => Ok(expand(body)),
        ExpandView::Full => Ok(Pipeline::render_source(body, &style.preamble)),
        ExpandView::Markers => {
            let figures = scan_figures(body);
            let references = scan_references(body);
            let mut unresolved: Vec<String> = Vec::new();
            for r in &references {
                if !figures.iter().any(|f| f.label == r.label) && !unresolved.contains(&r.label) {
                    unresolved.push(r.label.clone());
                }
            }

            let report = MarkerReport {
                figures,
                references,
                unresolved,
            };

            match format {
                OutputFormat::Json => serde_json::to_string_pretty(&report)
                    .context("Failed to serialize markers to JSON"),
                OutputFormat::Text => {
                    let mut out = String::new();
                    out.push_str(&format!("Figures: {}\n", report.figures.len()));
                    for f in &report.figures {
                        out.push_str(&format!("  fig:{} {} \"{}\"\n", f.label, f.path, f.caption));
                    }
                    out.push_str(&format!("References: {}\n", report.references.len()));
                    for r in &report.references {
                        out.push_str(&format!("  fig:{}\n", r.label));
                    }
                    if !report.unresolved.is_empty() {
                        out.push_str(&format!(
                            "Unresolved: {}\n",
                            report.unresolved.join(", ")
                        ));
                    }
                    Ok(out)
                }
            }
        }
    }
}

/// Execute the expand command
pub fn expand_command(
    settings: &Settings,
    input: &Path,
    view: ExpandView,
    style: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    // Check input file exists
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    let body = fs::read_to_string(input)
        .with_context(|| format!("Failed to read input file: {}", input.display()))?;

    let style = if view == ExpandView::Full {
        load_style(settings, style)?
    } else {
        HouseStyle::default()
    };

    println!("{}", render_expansion(&body, view, &style, format)?);
    Ok(())
}

/// Execute the equation command
pub fn equation_command(lhs: &str, rhs: &str, label: Option<&str>) {
    println!("{}", build_equation(lhs, rhs, label));
}

/// Execute the lorem command
pub fn lorem_command(paras: usize) {
    println!("{}", lorem::paragraphs(paras));
}

/// Execute the doctor command
pub fn doctor_command(settings: &Settings) -> Result<()> {
    println!("efr v{}", efr_core::VERSION);

    let compiler = settings.to_pdflatex();
    let store = settings.open_store();

    println!(
        "  Documents: {} ({})",
        store.documents_dir().display(),
        if store.documents_dir().is_dir() {
            "ok"
        } else {
            "missing"
        }
    );
    println!(
        "  House style: {} ({})",
        store.style_file().display(),
        if store.style_file().is_file() {
            "ok"
        } else {
            "default"
        }
    );

    match compiler.locate() {
        Some(path) if compiler.is_available() => {
            println!("✓ {} found at {}", compiler.program(), path.display());
            println!("  Timeout: {}s", compiler.timeout().as_secs());
            Ok(())
        }
        _ => anyhow::bail!(
            "{} not found. Please install a LaTeX distribution.",
            compiler.program()
        ),
    }
}

/// Execute the init command
pub fn init_command(dir: &Path, force: bool) -> Result<()> {
    println!("efr v{}", efr_core::VERSION);
    println!("Initializing: {}", dir.display());

    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    let config_path = dir.join(CONFIG_FILE_NAME);
    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        );
    }

    let settings = Settings::default();
    let text = settings
        .to_toml_string()
        .context("Failed to serialize default settings")?;
    fs::write(&config_path, text)
        .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
    println!("  Created: {}", config_path.display());

    for sub in [&settings.storage.documents_dir, &settings.storage.uploads_dir] {
        let path = dir.join(sub);
        fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
        println!("  Created: {}", path.display());
    }

    let store = FsStore::new(
        dir.join(&settings.storage.documents_dir),
        dir.join(&settings.storage.style_file),
    );
    if force || !store.style_file().exists() {
        store
            .save_house_style(&HouseStyle::default())
            .context("Failed to write default house style")?;
        println!("  Created: {}", store.style_file().display());
    }

    println!();
    println!("Workspace initialized.");
    Ok(())
}
