//! efr CLI - Command-line interface library
//!
//! This library provides the CLI functionality for ExtraFabulousReports:
//! - Compile: stored documents or loose files to PDF
//! - Batch: many stored documents with a bounded number of compilers
//! - Expand: preview the LaTeX a document turns into
//! - Equation / Lorem: authoring helpers
//! - Doctor / Init: toolchain check and workspace setup
//!
//! # Binary Usage
//!
//! ```bash
//! # Set up a report workspace
//! efr init reports/
//!
//! # Compile stored document 42 to 42.pdf
//! efr -c reports/efr.toml compile 42
//!
//! # Preview the expanded body of a draft
//! efr expand draft.tex --list
//! ```

pub mod app;

// Re-export main entry point and types
pub use app::{
    batch_command, compile_command, compile_file_command, doctor_command, equation_command,
    expand_command, init_command, lorem_command, render_expansion,
};
pub use app::{run_cli, ExpandView, OutputFormat};
