//! Configuration
//!
//! Settings are loaded from `efr.toml`; every section and field is optional.
//!
//! ```toml
//! [compiler]
//! program = "pdflatex"
//! args = ["-interaction=nonstopmode", "-halt-on-error"]
//! timeout_secs = 60
//! keep_workdir = false
//!
//! [storage]
//! documents_dir = "documents"
//! style_file = "house_style.toml"
//! uploads_dir = "static/uploads"
//!
//! [batch]
//! max_jobs = 2
//! ```
//!
//! Relative storage paths, and a compiler program given as a relative path,
//! are resolved against the directory holding the config file. That
//! directory is also where the compiler looks for files a document refers
//! to, such as `static/uploads/plot.png`.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use efr_latex::{CompilerInvoker, Pdflatex};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::pipeline::Pipeline;
use crate::store::FsStore;

/// Default config file name
pub const CONFIG_FILE_NAME: &str = "efr.toml";

/// Top-level settings structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub compiler: CompilerSettings,
    pub storage: StorageSettings,
    pub batch: BatchSettings,
    /// Directory of the loaded config file
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

/// LaTeX toolchain settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerSettings {
    /// Compiler program, looked up on `PATH` unless it is a path
    pub program: String,
    /// Arguments passed before the `.tex` file name
    pub args: Vec<String>,
    /// Seconds before a running compiler is killed
    pub timeout_secs: u64,
    /// Keep per-job working directories for inspection
    pub keep_workdir: bool,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            program: efr_latex::DEFAULT_PROGRAM.to_string(),
            args: efr_latex::default_args(),
            timeout_secs: efr_latex::DEFAULT_TIMEOUT.as_secs(),
            keep_workdir: false,
        }
    }
}

impl CompilerSettings {
    fn resolve_against(&mut self, base: &Path) {
        let program = Path::new(&self.program);
        if program.is_relative() && program.components().count() > 1 {
            self.program = base.join(program).to_string_lossy().into_owned();
        }
    }
}

/// Where documents, the house style and uploaded images live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub documents_dir: PathBuf,
    pub style_file: PathBuf,
    pub uploads_dir: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            documents_dir: PathBuf::from("documents"),
            style_file: PathBuf::from("house_style.toml"),
            uploads_dir: Path::new("static").join("uploads"),
        }
    }
}

impl StorageSettings {
    fn resolve_against(&mut self, base: &Path) {
        for path in [
            &mut self.documents_dir,
            &mut self.style_file,
            &mut self.uploads_dir,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

/// Batch compile settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    /// Maximum number of compiler processes running at once
    pub max_jobs: usize,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self { max_jobs: 2 }
    }
}

impl Settings {
    /// Parse settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load settings
    ///
    /// With an explicit path the file must exist. Without one, `efr.toml`
    /// in the current directory is used if present, otherwise defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                Self::load_file(path)
            }
            None => {
                let default_path = Path::new(CONFIG_FILE_NAME);
                if default_path.is_file() {
                    Self::load_file(default_path)
                } else {
                    debug!("No {} found, using default settings", CONFIG_FILE_NAME);
                    Ok(Self::default())
                }
            }
        }
    }

    fn load_file(path: &Path) -> Result<Self, ConfigError> {
        debug!(path = %path.display(), "Loading settings");
        let text = fs::read_to_string(path)?;
        let mut settings = Self::from_toml_str(&text)?;
        let base = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(base) => {
                settings.storage.resolve_against(base);
                settings.compiler.resolve_against(base);
                base
            }
            None => Path::new("."),
        };
        settings.base_dir = Some(std::path::absolute(base)?);
        Ok(settings)
    }

    /// Directory documents' relative file references resolve against
    ///
    /// The config file's directory, or the current directory when settings
    /// were not loaded from a file.
    pub fn base_dir(&self) -> PathBuf {
        self.base_dir
            .clone()
            .or_else(|| env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Compiler time limit (at least one second)
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.compiler.timeout_secs.max(1))
    }

    fn bare_pdflatex(&self) -> Pdflatex {
        Pdflatex::new()
            .with_program(self.compiler.program.clone())
            .with_args(self.compiler.args.clone())
            .with_timeout(self.timeout())
    }

    fn with_site_dirs(&self, compiler: Pdflatex) -> Pdflatex {
        compiler
            .with_search_dir(self.base_dir())
            .with_search_dir(&self.storage.uploads_dir)
    }

    /// Build the configured compiler
    ///
    /// It searches the base directory and the uploads directory for files
    /// documents refer to.
    pub fn to_pdflatex(&self) -> Pdflatex {
        self.with_site_dirs(self.bare_pdflatex())
    }

    fn pipeline_with(&self, compiler: Pdflatex) -> Pipeline {
        let invoker = CompilerInvoker::new(compiler).keep_workdir(self.compiler.keep_workdir);
        Pipeline::new(invoker)
    }

    /// Build a pipeline around the configured compiler
    pub fn build_pipeline(&self) -> Pipeline {
        self.pipeline_with(self.to_pdflatex())
    }

    /// Build a pipeline for a source file outside the store
    ///
    /// `source_dir` is searched before the configured directories.
    pub fn build_pipeline_for(&self, source_dir: &Path) -> Pipeline {
        let compiler = self.with_site_dirs(self.bare_pdflatex().with_search_dir(source_dir));
        self.pipeline_with(compiler)
    }

    /// Open the configured filesystem store
    pub fn open_store(&self) -> FsStore {
        FsStore::new(&self.storage.documents_dir, &self.storage.style_file)
    }
}
