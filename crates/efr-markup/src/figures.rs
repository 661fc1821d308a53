//! Figure and reference shorthand
//!
//! ```text
//! {{figure:static/uploads/plot.png|Measured throughput|throughput}}
//! As shown in {{ref:throughput}}, ...
//! ```
//!
//! `PATH` and `CAPTION` may contain anything except `|`, `LABEL` anything
//! except `}`. All three must be non-empty. A marker that does not match
//! (missing separator, unterminated braces) is left in the text as-is.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::debug;

fn figure_re() -> &'static Regex {
    static FIGURE_RE: OnceLock<Regex> = OnceLock::new();
    FIGURE_RE.get_or_init(|| Regex::new(r"\{\{figure:([^|]+)\|([^|]+)\|([^}]+)\}\}").unwrap())
}

fn reference_re() -> &'static Regex {
    static REF_RE: OnceLock<Regex> = OnceLock::new();
    REF_RE.get_or_init(|| Regex::new(r"\{\{ref:([^}]+)\}\}").unwrap())
}

/// A parsed `{{figure:PATH|CAPTION|LABEL}}` marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FigureMarker {
    /// Image path, relative to the LaTeX working directory
    pub path: String,
    /// Caption shown below the image
    pub caption: String,
    /// Cross-reference label (without the `fig:` prefix)
    pub label: String,
}

impl FigureMarker {
    fn from_captures(caps: &Captures<'_>) -> Self {
        Self {
            path: caps[1].to_string(),
            caption: caps[2].to_string(),
            label: caps[3].to_string(),
        }
    }

    /// Render this marker as a LaTeX `figure` environment
    pub fn to_latex(&self) -> String {
        format!(
            "\\begin{{figure}}[h]\n\
             \\centering\n\
             \\includegraphics{{{}}}\n\
             \\caption{{{}}}\n\
             \\label{{fig:{}}}\n\
             \\end{{figure}}\n",
            self.path, self.caption, self.label
        )
    }
}

/// A parsed `{{ref:LABEL}}` marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceMarker {
    /// Label of the referenced figure (without the `fig:` prefix)
    pub label: String,
}

impl ReferenceMarker {
    /// Render this marker as LaTeX reference text
    pub fn to_latex(&self) -> String {
        format!("Figure \\ref{{fig:{}}}", self.label)
    }
}

/// Replace every figure marker with a LaTeX `figure` environment
pub fn expand_figures(text: &str) -> String {
    let mut count = 0usize;
    let out = figure_re().replace_all(text, |caps: &Captures<'_>| {
        count += 1;
        FigureMarker::from_captures(caps).to_latex()
    });
    if count > 0 {
        debug!(figures = count, "Expanded figure markers");
    }
    out.into_owned()
}

/// Replace every reference marker with `Figure \ref{fig:LABEL}`
pub fn expand_references(text: &str) -> String {
    let mut count = 0usize;
    let out = reference_re().replace_all(text, |caps: &Captures<'_>| {
        count += 1;
        ReferenceMarker {
            label: caps[1].to_string(),
        }
        .to_latex()
    });
    if count > 0 {
        debug!(references = count, "Expanded reference markers");
    }
    out.into_owned()
}

/// Collect the figure markers in `text`, in document order
pub fn scan_figures(text: &str) -> Vec<FigureMarker> {
    figure_re()
        .captures_iter(text)
        .map(|caps| FigureMarker::from_captures(&caps))
        .collect()
}

/// Collect the reference markers in `text`, in document order
pub fn scan_references(text: &str) -> Vec<ReferenceMarker> {
    reference_re()
        .captures_iter(text)
        .map(|caps| ReferenceMarker {
            label: caps[1].to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_figure_block_exact() {
        let out = expand_figures("{{figure:img.png|Cap|lbl}}");
        assert_eq!(
            out,
            "\\begin{figure}[h]\n\\centering\n\\includegraphics{img.png}\n\\caption{Cap}\n\\label{fig:lbl}\n\\end{figure}\n"
        );
    }

    #[test]
    fn test_reference_exact() {
        assert_eq!(
            expand_references("see {{ref:x}}."),
            "see Figure \\ref{fig:x}."
        );
    }

    #[test]
    fn test_multiple_figures() {
        let text = "{{figure:a.png|A|a}}\ntext\n{{figure:b.png|B|b}}";
        let out = expand_figures(text);
        assert_eq!(out.matches("\\begin{figure}[h]").count(), 2);
        assert!(out.contains("\\label{fig:a}"));
        assert!(out.contains("\\label{fig:b}"));
        assert!(out.contains("\ntext\n"));
    }

    #[test]
    fn test_missing_separator_passes_through() {
        let text = "{{figure:img.png|only caption}}";
        assert_eq!(expand_figures(text), text);
    }

    #[test]
    fn test_unterminated_marker_passes_through() {
        let text = "{{figure:img.png|Cap|lbl";
        assert_eq!(expand_figures(text), text);
        let text = "{{ref:lbl";
        assert_eq!(expand_references(text), text);
    }

    #[test]
    fn test_empty_fields_pass_through() {
        assert_eq!(expand_figures("{{figure:|Cap|l}}"), "{{figure:|Cap|l}}");
        assert_eq!(expand_references("{{ref:}}"), "{{ref:}}");
    }

    #[test]
    fn test_replacement_is_literal() {
        // `$1` in user text must not be treated as a capture group reference
        let out = expand_figures("{{figure:$1.png|costs $2|l$0}}");
        assert!(out.contains("\\includegraphics{$1.png}"));
        assert!(out.contains("\\caption{costs $2}"));
        assert!(out.contains("\\label{fig:l$0}"));
    }

    #[test]
    fn test_scan_markers_in_order() {
        let text = "{{ref:b}} {{figure:a.png|A|a}} {{ref:a}}";
        let figures = scan_figures(text);
        assert_eq!(
            figures,
            vec![FigureMarker {
                path: "a.png".to_string(),
                caption: "A".to_string(),
                label: "a".to_string(),
            }]
        );
        let refs: Vec<_> = scan_references(text).into_iter().map(|r| r.label).collect();
        assert_eq!(refs, vec!["b", "a"]);
    }
}
