//! efr-core - Report compilation for ExtraFabulousReports
//!
//! Ties the markup expander and the LaTeX invoker together into a compile
//! pipeline, and provides the pieces around it: the shared house style, a
//! read interface to stored documents, configuration and batch compiles.
//!
//! # Example
//!
//! ```ignore
//! use efr_core::{MemoryStore, ReportStore, Settings};
//!
//! let settings = Settings::load(None)?;
//! let pipeline = settings.build_pipeline();
//!
//! let store = MemoryStore::new();
//! store.insert_document("1", "See {{ref:plot}}.\n{{figure:plot.png|A plot|plot}}");
//! let pdf = pipeline.compile_stored(&store, "1")?;
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod lorem;
pub mod pipeline;
pub mod store;
pub mod style;

pub use batch::{compile_batch, BatchOutcome};
pub use config::{BatchSettings, CompilerSettings, Settings, StorageSettings, CONFIG_FILE_NAME};
pub use error::{ConfigError, PipelineError, StoreError, StyleError};
pub use pipeline::Pipeline;
pub use store::{FsStore, MemoryStore, ReportStore};
pub use style::HouseStyle;

// Re-export the types callers need to drive the pipeline
pub use efr_latex::{CompileFailure, CompileResult, CompilerInvoker, JobId, LatexCompiler};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
