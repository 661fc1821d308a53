//! Error types for LaTeX compilation

use std::time::Duration;

use thiserror::Error;

/// Outcome of compiling one assembled source: PDF bytes or a classified failure
pub type CompileResult = std::result::Result<Vec<u8>, CompileFailure>;

/// Result type for a single compiler process run
pub type InvokeResult<T> = std::result::Result<T, InvokeError>;

/// Why a compile request did not produce a PDF
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileFailure {
    /// The compiler binary could not be found
    #[error("LaTeX toolchain not found: {program}")]
    ToolchainMissing { program: String },

    /// The compiler ran and exited with a failure status
    #[error("LaTeX compilation failed ({})", describe_exit(.exit_code))]
    CompilationError { exit_code: Option<i32> },

    /// The compiler did not finish in time and was killed
    #[error("LaTeX compilation timed out after {}s", .after.as_secs())]
    TimedOut { after: Duration },

    /// The compiler exited successfully but left no PDF behind
    #[error("Compiler produced no output file: {file}")]
    OutputMissing { file: String },

    /// The working directory or its files could not be prepared or read
    #[error("Working directory error: {0}")]
    Workspace(String),
}

impl CompileFailure {
    /// Message suitable for showing to the document author
    pub fn user_message(&self) -> String {
        match self {
            CompileFailure::ToolchainMissing { program } => {
                format!("{} not found. Please install a LaTeX distribution.", program)
            }
            CompileFailure::CompilationError { .. } => {
                "Compilation failed. Check your LaTeX content for errors.".to_string()
            }
            CompileFailure::TimedOut { after } => format!(
                "Compilation took longer than {} seconds and was stopped. Please try again.",
                after.as_secs()
            ),
            CompileFailure::OutputMissing { .. } | CompileFailure::Workspace(_) => {
                "Compilation could not be completed. Please contact an administrator.".to_string()
            }
        }
    }

    /// Whether resubmitting the same source may succeed
    pub fn is_retriable(&self) -> bool {
        matches!(self, CompileFailure::TimedOut { .. })
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

/// Errors from launching or waiting on the compiler process
#[derive(Error, Debug)]
pub enum InvokeError {
    /// Program not found on the search path
    #[error("Program not found: {program}")]
    NotFound { program: String },

    /// Process exceeded its time limit
    #[error("Process timed out after {}s", .after.as_secs())]
    TimedOut { after: Duration },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
