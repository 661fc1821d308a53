//! Compile requests against a scoped working directory
//!
//! Every request gets its own temporary directory holding
//! `tmp_<job>.tex` and, after a successful run, `tmp_<job>.pdf`. The
//! directory is removed when the request finishes, whatever the outcome.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::compiler::LatexCompiler;
use crate::error::{CompileFailure, CompileResult, InvokeError};

/// Number of compiler log lines included in failure diagnostics
const DIAGNOSTIC_TAIL_LINES: usize = 20;

/// File-name-safe identifier for one compile job
///
/// Characters outside `[A-Za-z0-9_-]` are replaced with `_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(String);

impl JobId {
    pub fn new(raw: impl AsRef<str>) -> Self {
        let cleaned: String = raw
            .as_ref()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        if cleaned.is_empty() {
            Self("job".to_string())
        } else {
            Self(cleaned)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the LaTeX source file for this job
    pub fn tex_file_name(&self) -> String {
        format!("tmp_{}.tex", self.0)
    }

    /// Name of the PDF the compiler is expected to produce
    pub fn pdf_file_name(&self) -> String {
        format!("tmp_{}.pdf", self.0)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<u64> for JobId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

/// Temporary working directory for one job, removed on drop
pub struct WorkDir {
    dir: TempDir,
    job: JobId,
}

impl WorkDir {
    /// Create a working directory under the system temp directory
    pub fn create(job: &JobId) -> io::Result<Self> {
        let prefix = format!("efr-{}-", job);
        let dir = tempfile::Builder::new().prefix(&prefix).tempdir()?;
        Ok(Self {
            dir,
            job: job.clone(),
        })
    }

    /// Create a working directory under `root`
    pub fn create_in(root: &Path, job: &JobId) -> io::Result<Self> {
        fs::create_dir_all(root)?;
        let prefix = format!("efr-{}-", job);
        let dir = tempfile::Builder::new().prefix(&prefix).tempdir_in(root)?;
        Ok(Self {
            dir,
            job: job.clone(),
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn tex_path(&self) -> PathBuf {
        self.path().join(self.job.tex_file_name())
    }

    pub fn pdf_path(&self) -> PathBuf {
        self.path().join(self.job.pdf_file_name())
    }

    /// Last lines of the compiler's log, if it wrote one
    pub fn diagnostics_tail(&self) -> Option<String> {
        let tex = self.tex_path();
        let text = ["log", "out"]
            .iter()
            .find_map(|ext| fs::read_to_string(tex.with_extension(ext)).ok())?;

        let lines: Vec<&str> = text.lines().collect();
        let start = lines.len().saturating_sub(DIAGNOSTIC_TAIL_LINES);
        Some(lines[start..].join("\n"))
    }

    /// Keep the directory on disk and return its path
    pub fn persist(self) -> PathBuf {
        self.dir.keep()
    }
}

/// Runs compile requests through a [`LatexCompiler`]
pub struct CompilerInvoker {
    compiler: Box<dyn LatexCompiler>,
    work_root: Option<PathBuf>,
    keep_workdir: bool,
}

impl CompilerInvoker {
    pub fn new(compiler: impl LatexCompiler + 'static) -> Self {
        Self::from_boxed(Box::new(compiler))
    }

    pub fn from_boxed(compiler: Box<dyn LatexCompiler>) -> Self {
        Self {
            compiler,
            work_root: None,
            keep_workdir: false,
        }
    }

    /// Create working directories under `root` instead of the system temp dir
    pub fn with_work_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.work_root = Some(root.into());
        self
    }

    /// Leave working directories on disk after each request (debugging aid)
    pub fn keep_workdir(mut self, keep: bool) -> Self {
        self.keep_workdir = keep;
        self
    }

    pub fn compiler(&self) -> &dyn LatexCompiler {
        self.compiler.as_ref()
    }

    /// Compile an assembled LaTeX source to PDF bytes
    ///
    /// Never panics on compiler or filesystem errors; every failure is
    /// returned as a [`CompileFailure`].
    pub fn compile(&self, source: &str, job: &JobId) -> CompileResult {
        let workdir = match &self.work_root {
            Some(root) => WorkDir::create_in(root, job),
            None => WorkDir::create(job),
        }
        .map_err(|e| {
            CompileFailure::Workspace(format!("failed to create working directory: {}", e))
        })?;

        let result = self.compile_in(&workdir, source, job);

        if self.keep_workdir {
            let kept = workdir.persist();
            info!(job = %job, path = %kept.display(), "Kept working directory");
        }

        result
    }

    fn compile_in(&self, workdir: &WorkDir, source: &str, job: &JobId) -> CompileResult {
        let tex_path = workdir.tex_path();
        fs::write(&tex_path, source).map_err(|e| {
            CompileFailure::Workspace(format!("failed to write {}: {}", tex_path.display(), e))
        })?;

        debug!(
            job = %job,
            compiler = self.compiler.name(),
            source_len = source.len(),
            "Invoking LaTeX compiler"
        );

        let exit = match self.compiler.run(&tex_path) {
            Ok(exit) => exit,
            Err(InvokeError::NotFound { program }) => {
                warn!(job = %job, program = %program, "LaTeX toolchain missing");
                return Err(CompileFailure::ToolchainMissing { program });
            }
            Err(InvokeError::TimedOut { after }) => {
                warn!(job = %job, timeout_secs = after.as_secs(), "LaTeX compilation timed out");
                return Err(CompileFailure::TimedOut { after });
            }
            Err(InvokeError::Io(e)) => {
                warn!(job = %job, err = %e, "Failed to run LaTeX compiler");
                return Err(CompileFailure::Workspace(format!(
                    "failed to run {}: {}",
                    self.compiler.name(),
                    e
                )));
            }
        };

        if !exit.is_success() {
            if let Some(tail) = workdir.diagnostics_tail() {
                debug!(job = %job, log_tail = %tail, "Compiler log");
            }
            warn!(job = %job, exit_code = ?exit.code, "LaTeX compilation failed");
            return Err(CompileFailure::CompilationError {
                exit_code: exit.code,
            });
        }

        let pdf_path = workdir.pdf_path();
        match fs::read(&pdf_path) {
            Ok(bytes) => {
                info!(job = %job, bytes = bytes.len(), "Compiled PDF");
                Ok(bytes)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(job = %job, "Compiler exited cleanly without producing a PDF");
                Err(CompileFailure::OutputMissing {
                    file: job.pdf_file_name(),
                })
            }
            Err(e) => Err(CompileFailure::Workspace(format!(
                "failed to read {}: {}",
                pdf_path.display(),
                e
            ))),
        }
    }
}
