//! Integration tests for the efr CLI
//!
//! Commands are driven through their library functions against a scratch
//! workspace created by `init_command`.

use std::fs;

use efr_cli::{
    batch_command, compile_command, compile_file_command, doctor_command, init_command,
    render_expansion, ExpandView, OutputFormat,
};
use efr_core::{FsStore, HouseStyle, ReportStore, Settings, CONFIG_FILE_NAME};
use tempfile::TempDir;

/// Initialise a workspace and load its settings
fn workspace() -> (TempDir, Settings) {
    let dir = TempDir::new().unwrap();
    init_command(dir.path(), false).unwrap();
    let settings = Settings::load(Some(dir.path().join(CONFIG_FILE_NAME).as_path())).unwrap();
    (dir, settings)
}

/// A `sh` script standing in for pdflatex: copies the source into the PDF
/// and fails when the source contains `\broken`
#[cfg(unix)]
fn fake_latex(settings: &mut Settings) {
    settings.compiler.program = "sh".to_string();
    settings.compiler.args = vec![
        "-c".to_string(),
        "grep -q broken \"$0\" && exit 1; cp \"$0\" \"${0%.tex}.pdf\"".to_string(),
    ];
}

/// Like [`fake_latex`], but fails unless `path` is found through
/// `TEXINPUTS` the way pdflatex resolves `\includegraphics`
#[cfg(unix)]
fn fake_latex_requiring(settings: &mut Settings, path: &str) {
    settings.compiler.program = "sh".to_string();
    settings.compiler.args = vec![
        "-c".to_string(),
        format!(
            "IFS=:; for d in $TEXINPUTS; do [ -f \"${{d%//}}/{}\" ] && found=1; done; \
             [ -n \"$found\" ] || exit 1; cp \"$0\" \"${{0%.tex}}.pdf\"",
            path
        ),
    ];
}

fn store(settings: &Settings) -> FsStore {
    settings.open_store()
}

#[test]
fn test_init_creates_workspace() {
    let (dir, settings) = workspace();

    assert!(dir.path().join(CONFIG_FILE_NAME).is_file());
    assert!(settings.storage.documents_dir.is_dir());
    assert!(settings.storage.uploads_dir.is_dir());
    assert!(settings.storage.documents_dir.starts_with(dir.path()));

    let style = store(&settings).house_style().unwrap();
    assert_eq!(style, HouseStyle::default());
}

#[test]
fn test_init_refuses_to_overwrite() {
    let dir = TempDir::new().unwrap();
    init_command(dir.path(), false).unwrap();

    let err = init_command(dir.path(), false).unwrap_err();
    assert!(err.to_string().contains("already exists"));

    init_command(dir.path(), true).unwrap();
}

#[test]
fn test_compile_missing_document() {
    let (dir, settings) = workspace();
    let output = dir.path().join("out.pdf");

    let err = compile_command(&settings, "404", Some(output.as_path())).unwrap_err();
    assert_eq!(err.to_string(), "Document 404 does not exist.");
    assert!(!output.exists());
}

#[test]
fn test_compile_without_toolchain() {
    let (dir, mut settings) = workspace();
    settings.compiler.program = "efr-no-such-latex-binary".to_string();
    store(&settings).save_document("1", "Hello").unwrap();

    let err = compile_command(&settings, "1", Some(dir.path().join("1.pdf").as_path())).unwrap_err();
    assert_eq!(
        err.to_string(),
        "efr-no-such-latex-binary not found. Please install a LaTeX distribution."
    );
}

#[test]
fn test_doctor_reports_missing_compiler() {
    let (_dir, mut settings) = workspace();
    settings.compiler.program = "efr-no-such-latex-binary".to_string();

    let err = doctor_command(&settings).unwrap_err();
    assert!(err.to_string().contains("efr-no-such-latex-binary not found"));
}

#[test]
fn test_compile_file_missing_input() {
    let (dir, settings) = workspace();
    let err = compile_file_command(&settings, &dir.path().join("nope.tex"), None, None)
        .unwrap_err();
    assert!(err.to_string().contains("Input file not found"));
}

#[test]
fn test_render_body_expands_markers() {
    let body = "See {{ref:plot}}.\n{{figure:plot.png|A plot|plot}}";
    let text =
        render_expansion(body, ExpandView::Body, &HouseStyle::default(), OutputFormat::Text)
            .unwrap();
    assert!(text.starts_with("See Figure \\ref{fig:plot}.\n\\begin{figure}[h]\n"));
    assert!(text.contains("\\caption{A plot}\n\\label{fig:plot}\n\\end{figure}\n"));
}

#[cfg(unix)]
mod with_fake_latex {
    use super::*;

    #[test]
    fn test_compile_stored_document() {
        let (dir, mut settings) = workspace();
        fake_latex(&mut settings);
        store(&settings)
            .save_document("1", "See {{ref:plot}}.\n{{figure:plot.png|A plot|plot}}")
            .unwrap();

        let output = dir.path().join("reports").join("one.pdf");
        let written = compile_command(&settings, "1", Some(output.as_path())).unwrap();
        assert_eq!(written, output);

        let pdf = fs::read_to_string(&output).unwrap();
        assert!(pdf.starts_with("\\documentclass{article}\n"));
        assert!(pdf.contains("See Figure \\ref{fig:plot}."));
        assert!(pdf.contains("\\includegraphics{plot.png}"));
        assert!(pdf.ends_with("\\end{document}"));
    }

    #[test]
    fn test_compile_finds_uploaded_image() {
        let (dir, mut settings) = workspace();
        fake_latex_requiring(&mut settings, "static/uploads/img.png");
        fs::write(settings.storage.uploads_dir.join("img.png"), b"png").unwrap();
        store(&settings)
            .save_document("fig", "{{figure:static/uploads/img.png|Cap|x}}")
            .unwrap();

        let output = dir.path().join("fig.pdf");
        compile_command(&settings, "fig", Some(output.as_path())).unwrap();
        let pdf = fs::read_to_string(&output).unwrap();
        assert!(pdf.contains("\\includegraphics{static/uploads/img.png}"));
    }

    #[test]
    fn test_compile_file_finds_image_beside_input() {
        let (dir, mut settings) = workspace();
        fake_latex_requiring(&mut settings, "chart.png");

        let drafts = dir.path().join("drafts");
        fs::create_dir_all(&drafts).unwrap();
        fs::write(drafts.join("chart.png"), b"png").unwrap();
        let input = drafts.join("draft.tex");
        fs::write(&input, "{{figure:chart.png|Chart|chart}}").unwrap();

        let written = compile_file_command(&settings, &input, None, None).unwrap();
        assert_eq!(written, drafts.join("draft.pdf"));
    }

    #[test]
    fn test_relative_compiler_path_in_config() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        init_command(dir.path(), true).unwrap();
        let bin = dir.path().join("bin");
        fs::create_dir_all(&bin).unwrap();
        let script = bin.join("fakelatex");
        fs::write(&script, "#!/bin/sh\ncp \"$1\" \"${1%.tex}.pdf\"\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let config = dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &config,
            "[compiler]\nprogram = \"bin/fakelatex\"\nargs = []\n",
        )
        .unwrap();
        let settings = Settings::load(Some(config.as_path())).unwrap();
        store(&settings).save_document("1", "Hello").unwrap();

        doctor_command(&settings).unwrap();
        let output = dir.path().join("1.pdf");
        compile_command(&settings, "1", Some(output.as_path())).unwrap();
        assert!(fs::read_to_string(&output).unwrap().contains("Hello"));
    }

    #[test]
    fn test_compile_failure_message() {
        let (dir, mut settings) = workspace();
        fake_latex(&mut settings);
        store(&settings).save_document("2", "\\broken").unwrap();

        let err = compile_command(&settings, "2", Some(dir.path().join("2.pdf").as_path())).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Compilation failed. Check your LaTeX content for errors."
        );
    }

    #[test]
    fn test_compile_file_with_preamble_style() {
        let (dir, mut settings) = workspace();
        fake_latex(&mut settings);

        let input = dir.path().join("draft.tex");
        let style = dir.path().join("preamble.sty");
        fs::write(&input, "Body text").unwrap();
        fs::write(&style, "\\usepackage{graphicx}").unwrap();

        let written = compile_file_command(&settings, &input, Some(style.as_path()), None).unwrap();
        assert_eq!(written, dir.path().join("draft.pdf"));

        let pdf = fs::read_to_string(&written).unwrap();
        assert_eq!(
            pdf,
            "\\documentclass{article}\n\\usepackage{graphicx}\n\\begin{document}\nBody text\n\\end{document}"
        );
    }

    #[test]
    fn test_compile_file_with_toml_style() {
        let (dir, mut settings) = workspace();
        fake_latex(&mut settings);

        let input = dir.path().join("draft.tex");
        let style = dir.path().join("style.toml");
        fs::write(&input, "Body").unwrap();
        fs::write(&style, "preamble = \"% corporate\"\n").unwrap();

        let written = compile_file_command(&settings, &input, Some(style.as_path()), None).unwrap();
        let pdf = fs::read_to_string(written).unwrap();
        assert!(pdf.contains("% corporate\n\\begin{document}"));
    }

    #[test]
    fn test_batch_writes_every_document() {
        let (dir, mut settings) = workspace();
        fake_latex(&mut settings);
        let store = store(&settings);
        for id in ["a", "b", "c"] {
            store.save_document(id, &format!("doc {}", id)).unwrap();
        }

        let out = dir.path().join("out");
        let compiled = batch_command(&settings, &[], Some(2), &out, OutputFormat::Text).unwrap();
        assert_eq!(compiled, 3);
        for id in ["a", "b", "c"] {
            let pdf = fs::read_to_string(out.join(format!("{}.pdf", id))).unwrap();
            assert!(pdf.contains(&format!("doc {}", id)));
        }
    }

    #[test]
    fn test_batch_reports_failures() {
        let (dir, mut settings) = workspace();
        fake_latex(&mut settings);
        let store = store(&settings);
        store.save_document("good", "fine").unwrap();
        store.save_document("bad", "\\broken").unwrap();

        let out = dir.path().join("out");
        let ids = vec!["good".to_string(), "bad".to_string()];
        let err = batch_command(&settings, &ids, None, &out, OutputFormat::Json).unwrap_err();
        assert_eq!(err.to_string(), "1 of 2 documents failed to compile");
        assert!(out.join("good.pdf").is_file());
        assert!(!out.join("bad.pdf").exists());
    }
}
