//! LaTeX compiler abstraction
//!
//! [`LatexCompiler`] is the seam between the report pipeline and the
//! external toolchain. [`Pdflatex`] runs a real `pdflatex`-compatible
//! program; tests substitute their own implementations.

use std::env;
use std::ffi::{OsStr, OsString};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::error::{InvokeError, InvokeResult};

/// Default compiler program
pub const DEFAULT_PROGRAM: &str = "pdflatex";

/// Default time limit for one compiler run
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Environment variable LaTeX searches for `\input` and `\includegraphics` files
pub const TEXINPUTS: &str = "TEXINPUTS";

/// Exit status of a compiler run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompilerExit {
    /// Process exit code, `None` if the process was terminated by a signal
    pub code: Option<i32>,
}

impl CompilerExit {
    pub fn success() -> Self {
        Self { code: Some(0) }
    }

    pub fn failure(code: i32) -> Self {
        Self { code: Some(code) }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<ExitStatus> for CompilerExit {
    fn from(status: ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

/// Trait for LaTeX compilers
///
/// A compiler receives the path of a `.tex` file and is expected to leave a
/// like-named `.pdf` next to it on success.
///
/// # Thread Safety
///
/// Compilers must be `Send + Sync` so one instance can serve concurrent
/// compile requests.
pub trait LatexCompiler: Send + Sync {
    /// Human-readable name of this compiler
    fn name(&self) -> &str;

    /// Check whether the compiler can currently be run
    fn is_available(&self) -> bool {
        true
    }

    /// Compile the given `.tex` file
    fn run(&self, tex_path: &Path) -> InvokeResult<CompilerExit>;
}

/// `pdflatex` (or a compatible program) run as a subprocess
///
/// The process runs in the directory containing the `.tex` file. Its
/// stdout and stderr go to a `.out` file beside it; they are kept for
/// diagnostics and never returned to the caller.
///
/// Since that directory is a scratch one, relative paths in the source
/// (`static/uploads/plot.png`) are found through the search directories,
/// which are put in front of `TEXINPUTS`.
#[derive(Debug, Clone)]
pub struct Pdflatex {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    poll_interval: Duration,
    search_dirs: Vec<PathBuf>,
}

impl Default for Pdflatex {
    fn default() -> Self {
        Self::new()
    }
}

impl Pdflatex {
    /// Create a compiler running `pdflatex` in non-interactive mode
    pub fn new() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            args: default_args(),
            timeout: DEFAULT_TIMEOUT,
            poll_interval: Duration::from_millis(50),
            search_dirs: Vec::new(),
        }
    }

    /// Use a different program (e.g. `xelatex` or an absolute path)
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Replace the arguments passed before the file name
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the time limit after which the process is killed
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Add a directory (searched recursively) for files the source refers to
    ///
    /// Relative directories are made absolute against the current directory.
    pub fn with_search_dir(mut self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let dir = std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf());
        if !self.search_dirs.contains(&dir) {
            self.search_dirs.push(dir);
        }
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolve the program on the search path
    pub fn locate(&self) -> Option<PathBuf> {
        find_program(&self.program)
    }

    /// Program as it is handed to the OS
    ///
    /// The child runs in another directory, so a relative path such as
    /// `./bin/latex` is made absolute against the current directory first.
    /// Bare names are left for the `PATH` lookup.
    fn spawn_program(&self) -> OsString {
        let program = Path::new(&self.program);
        if is_bare_name(program) || program.is_absolute() {
            return program.as_os_str().to_os_string();
        }
        std::path::absolute(program)
            .map(PathBuf::into_os_string)
            .unwrap_or_else(|_| program.as_os_str().to_os_string())
    }

    /// `TEXINPUTS` for the child: search directories, then the inherited
    /// value (or an empty entry, which stands for the default path)
    fn texinputs(&self) -> Option<OsString> {
        if self.search_dirs.is_empty() {
            return None;
        }

        let separator = if cfg!(windows) { ";" } else { ":" };
        let mut value = OsString::new();
        for dir in &self.search_dirs {
            value.push(dir.as_os_str());
            value.push("//");
            value.push(separator);
        }
        if let Some(inherited) = env::var_os(TEXINPUTS) {
            value.push(inherited);
        }
        Some(value)
    }
}

/// A program name without any directory part
fn is_bare_name(program: &Path) -> bool {
    program.components().count() <= 1 && !program.is_absolute()
}

/// Arguments that keep `pdflatex` from waiting on stdin after an error
pub fn default_args() -> Vec<String> {
    vec![
        "-interaction=nonstopmode".to_string(),
        "-halt-on-error".to_string(),
    ]
}

impl LatexCompiler for Pdflatex {
    fn name(&self) -> &str {
        &self.program
    }

    fn is_available(&self) -> bool {
        self.locate().is_some()
    }

    fn run(&self, tex_path: &Path) -> InvokeResult<CompilerExit> {
        let file_name = tex_path.file_name().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a file path: {}", tex_path.display()),
            )
        })?;
        let workdir = tex_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let capture = File::create(workdir.join(Path::new(file_name).with_extension("out")))?;
        let capture_err = capture.try_clone()?;

        trace!(program = %self.program, workdir = %workdir.display(), "Spawning compiler");

        let mut command = Command::new(self.spawn_program());
        command
            .args(&self.args)
            .arg(file_name)
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(capture))
            .stderr(Stdio::from(capture_err));
        if let Some(texinputs) = self.texinputs() {
            trace!(texinputs = ?texinputs, "Setting search path");
            command.env(TEXINPUTS, texinputs);
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(program = %self.program, "Compiler not found");
                return Err(InvokeError::NotFound {
                    program: self.program.clone(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let start = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                trace!(
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    code = ?status.code(),
                    "Compiler exited"
                );
                return Ok(status.into());
            }

            if start.elapsed() >= self.timeout {
                warn!(
                    program = %self.program,
                    timeout_secs = self.timeout.as_secs(),
                    "Compiler timed out, killing process"
                );
                // The process may have exited between try_wait and kill
                let _ = child.kill();
                let _ = child.wait();
                return Err(InvokeError::TimedOut {
                    after: self.timeout,
                });
            }

            thread::sleep(self.poll_interval);
        }
    }
}

/// Find `program` on `PATH`, or check it directly if it contains a path separator
fn find_program(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if !is_bare_name(candidate) {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let paths = env::var_os("PATH")?;
    env::split_paths(&paths).find_map(|dir| {
        let path = dir.join(program);
        if path.is_file() {
            return Some(path);
        }
        if cfg!(windows) && path.extension() != Some(OsStr::new("exe")) {
            let exe = path.with_extension("exe");
            if exe.is_file() {
                return Some(exe);
            }
        }
        None
    })
}
