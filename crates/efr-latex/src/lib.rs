//! efr-latex - LaTeX to PDF via an external toolchain
//!
//! This crate turns an assembled LaTeX source into PDF bytes by running a
//! LaTeX compiler as a subprocess.
//!
//! # Architecture
//!
//! - [`LatexCompiler`] - capability trait for "compile this `.tex` file"
//! - [`Pdflatex`] - subprocess implementation with a time limit
//! - [`CompilerInvoker`] - writes the source into a per-job scoped working
//!   directory, runs the compiler and classifies the outcome
//!
//! # Example
//!
//! ```ignore
//! use efr_latex::{CompilerInvoker, JobId, Pdflatex};
//!
//! let invoker = CompilerInvoker::new(Pdflatex::new());
//! match invoker.compile(&source, &JobId::from(42u64)) {
//!     Ok(pdf) => std::fs::write("report.pdf", pdf)?,
//!     Err(failure) => eprintln!("{}", failure.user_message()),
//! }
//! ```

mod compiler;
mod error;
mod invoker;

pub use compiler::{
    default_args, CompilerExit, LatexCompiler, Pdflatex, DEFAULT_PROGRAM, DEFAULT_TIMEOUT,
    TEXINPUTS,
};
pub use error::{CompileFailure, CompileResult, InvokeError, InvokeResult};
pub use invoker::{CompilerInvoker, JobId, WorkDir};
