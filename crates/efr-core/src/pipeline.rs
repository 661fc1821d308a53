//! Compile pipeline
//!
//! ```text
//! body ──expand──▶ expanded body ──assemble(style)──▶ source ──compile──▶ PDF | failure
//! ```
//!
//! Each request is independent: no retries, no shared state beyond the
//! compiler configuration. A failure is returned to the caller unchanged.

use efr_latex::{CompileResult, CompilerInvoker, JobId};
use efr_markup::{assemble, expand};
use tracing::{debug, info};

use crate::error::PipelineError;
use crate::store::ReportStore;

/// Runs documents through expansion, assembly and compilation
pub struct Pipeline {
    invoker: CompilerInvoker,
}

impl Pipeline {
    pub fn new(invoker: CompilerInvoker) -> Self {
        Self { invoker }
    }

    pub fn invoker(&self) -> &CompilerInvoker {
        &self.invoker
    }

    /// Expand a body and wrap it with the style preamble, without compiling
    pub fn render_source(body: &str, style: &str) -> String {
        let expanded = expand(body);
        assemble(style, &expanded)
    }

    /// Compile one document body with the given house style preamble
    pub fn compile_document(&self, body: &str, style: &str, job: &JobId) -> CompileResult {
        debug!(job = %job, body_len = body.len(), "Expanding and assembling document");
        let source = Self::render_source(body, style);
        self.invoker.compile(&source, job)
    }

    /// Compile a stored document using the store's current house style
    ///
    /// The style and body are read once, before compilation starts.
    pub fn compile_stored(
        &self,
        store: &dyn ReportStore,
        id: &str,
    ) -> Result<Vec<u8>, PipelineError> {
        let style = store.house_style()?;
        let body = store.document_body(id)?;

        let pdf = self.compile_document(&body, &style.preamble, &JobId::new(id))?;
        info!(id = %id, bytes = pdf.len(), "Compiled stored document");
        Ok(pdf)
    }
}
