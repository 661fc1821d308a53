//! Bounded concurrent compilation of stored documents
//!
//! Spawning a LaTeX toolchain costs a process and disk I/O per request, so
//! batches run through a fixed number of worker threads.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;

use tracing::debug;

use crate::error::PipelineError;
use crate::pipeline::Pipeline;
use crate::store::ReportStore;

/// Result of compiling one document in a batch
#[derive(Debug)]
pub struct BatchOutcome {
    /// Document id
    pub id: String,
    /// PDF bytes or the reason compilation did not produce one
    pub result: Result<Vec<u8>, PipelineError>,
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Compile `ids` with at most `max_jobs` compiles running at once
///
/// Outcomes are returned in the same order as `ids`. `max_jobs` of zero is
/// treated as one.
pub fn compile_batch(
    pipeline: &Pipeline,
    store: &dyn ReportStore,
    ids: &[String],
    max_jobs: usize,
) -> Vec<BatchOutcome> {
    let workers = max_jobs.max(1).min(ids.len());
    debug!(documents = ids.len(), workers, "Starting batch compile");

    let next = AtomicUsize::new(0);
    let slots: Mutex<Vec<Option<BatchOutcome>>> =
        Mutex::new(std::iter::repeat_with(|| None).take(ids.len()).collect());

    thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| loop {
                let index = next.fetch_add(1, Ordering::Relaxed);
                let Some(id) = ids.get(index) else {
                    break;
                };

                let result = pipeline.compile_stored(store, id);
                let outcome = BatchOutcome {
                    id: id.clone(),
                    result,
                };
                slots.lock().unwrap_or_else(|e| e.into_inner())[index] = Some(outcome);
            });
        }
    });

    slots
        .into_inner()
        .unwrap_or_else(|e| e.into_inner())
        .into_iter()
        .flatten()
        .collect()
}
