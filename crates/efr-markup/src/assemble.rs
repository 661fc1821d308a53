//! Full document assembly

/// Wrap a house style preamble and an expanded body into a compilable
/// `article` source.
///
/// Both inputs are inserted verbatim. The preamble is trusted and the body
/// has already been expanded; anything invalid in either shows up as a
/// compiler failure, not here.
pub fn assemble(style: &str, body: &str) -> String {
    format!(
        "\\documentclass{{article}}\n{}\n\\begin{{document}}\n{}\n\\end{{document}}",
        style, body
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_assemble_layout() {
        let src = assemble("\\usepackage{graphicx}", "Hello.");
        assert_eq!(
            src,
            "\\documentclass{article}\n\\usepackage{graphicx}\n\\begin{document}\nHello.\n\\end{document}"
        );
    }

    #[test]
    fn test_assemble_empty_style() {
        let src = assemble("", "Body");
        assert_eq!(
            src,
            "\\documentclass{article}\n\n\\begin{document}\nBody\n\\end{document}"
        );
    }

    #[test]
    fn test_assemble_does_not_escape() {
        let body = "100% {raw} \\LaTeX & _under_";
        assert!(assemble("", body).contains(body));
    }
}
