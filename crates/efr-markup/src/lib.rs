//! efr-markup - Report shorthand to LaTeX
//!
//! Authors write report bodies in LaTeX with a small set of shorthand
//! markers on top. This crate turns those markers into real LaTeX and wraps
//! the result in a complete source file.
//!
//! # Pipeline
//!
//! 1. **Figures** - `{{figure:PATH|CAPTION|LABEL}}` becomes a `figure` environment
//! 2. **References** - `{{ref:LABEL}}` becomes `Figure \ref{fig:LABEL}`
//! 3. **Assembly** - house style preamble + expanded body become one `.tex` source
//!
//! Equations are not scanned from the body; [`build_equation`] is a helper
//! that callers use to produce an `equation` block.
//!
//! # Example
//!
//! ```
//! use efr_markup::{assemble, expand};
//!
//! let body = expand("See {{ref:plot}}.\n{{figure:img/plot.png|A plot|plot}}");
//! assert!(body.contains("Figure \\ref{fig:plot}"));
//! assert!(body.contains("\\includegraphics{img/plot.png}"));
//!
//! let source = assemble("\\usepackage{graphicx}", &body);
//! assert!(source.starts_with("\\documentclass{article}"));
//! ```

mod assemble;
mod equation;
mod figures;

pub use assemble::assemble;
pub use equation::{build_equation, Equation};
pub use figures::{
    expand_figures, expand_references, scan_figures, scan_references, FigureMarker,
    ReferenceMarker,
};

/// Expand every shorthand marker in a document body.
///
/// Figures are expanded before references so that a reference written
/// inside a figure caption is still resolved.
pub fn expand(text: &str) -> String {
    let with_figures = expand_figures(text);
    expand_references(&with_figures)
}
