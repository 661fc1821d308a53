//! Shared house style
//!
//! One style record per deployment: the LaTeX preamble inserted into every
//! compiled report, plus the colour theme used by the web front end.
//!
//! ```toml
//! preamble = '''
//! \usepackage{graphicx}
//! \usepackage[margin=2cm]{geometry}
//! '''
//! primary_color = "#003366"
//! secondary_color = "#ffffff"
//! ```

use serde::{Deserialize, Serialize};

use crate::error::StyleError;

/// Default colour for headers, links and buttons
pub const DEFAULT_PRIMARY_COLOR: &str = "#003366";

/// Default colour for page background and text
pub const DEFAULT_SECONDARY_COLOR: &str = "#ffffff";

/// House style record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HouseStyle {
    /// LaTeX preamble placed between `\documentclass` and `\begin{document}`
    pub preamble: String,
    /// Primary UI colour (`#rrggbb`)
    pub primary_color: String,
    /// Secondary UI colour (`#rrggbb`)
    pub secondary_color: String,
}

impl Default for HouseStyle {
    fn default() -> Self {
        Self {
            preamble: String::new(),
            primary_color: DEFAULT_PRIMARY_COLOR.to_string(),
            secondary_color: DEFAULT_SECONDARY_COLOR.to_string(),
        }
    }
}

impl HouseStyle {
    pub fn with_preamble(preamble: impl Into<String>) -> Self {
        Self {
            preamble: preamble.into(),
            ..Self::default()
        }
    }

    /// Check that both colours are `#rrggbb` hex values
    pub fn validate(&self) -> Result<(), StyleError> {
        for (field, value) in [
            ("primary_color", &self.primary_color),
            ("secondary_color", &self.secondary_color),
        ] {
            if !is_hex_color(value) {
                return Err(StyleError::InvalidColor {
                    field,
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}
