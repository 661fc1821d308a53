//! Equation block construction

use serde::{Deserialize, Serialize};

/// Build a LaTeX `equation` environment for `lhs = rhs`.
///
/// A `\label{eq:LABEL}` line is added only when `label` is present and
/// non-empty.
///
/// ```
/// let eq = efr_markup::build_equation("E", "mc^2", Some("mass_energy"));
/// assert_eq!(
///     eq,
///     "\\begin{equation}\nE = mc^2\n\\label{eq:mass_energy}\n\\end{equation}"
/// );
/// ```
pub fn build_equation(lhs: &str, rhs: &str, label: Option<&str>) -> String {
    let mut lines = vec!["\\begin{equation}".to_string(), format!("{} = {}", lhs, rhs)];

    if let Some(label) = label.filter(|l| !l.is_empty()) {
        lines.push(format!("\\label{{eq:{}}}", label));
    }

    lines.push("\\end{equation}".to_string());
    lines.join("\n")
}

/// An equation to be rendered into a document body
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Equation {
    /// Left-hand side
    pub lhs: String,
    /// Right-hand side
    pub rhs: String,
    /// Optional cross-reference label (without the `eq:` prefix)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Equation {
    pub fn new(lhs: impl Into<String>, rhs: impl Into<String>) -> Self {
        Self {
            lhs: lhs.into(),
            rhs: rhs.into(),
            label: None,
        }
    }

    /// Attach a cross-reference label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn to_latex(&self) -> String {
        build_equation(&self.lhs, &self.rhs, self.label.as_deref())
    }
}
