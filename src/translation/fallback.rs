/*!
 * Line-by-line fallback.
 *
 * Used when a batch request fails outright or comes back with segments
 * missing. Lines are retried through the single-line path in small
 * concurrent chunks, with the pacer's delay between chunks.
 */

use futures::future::join_all;
use log::{debug, warn};
use tokio_util::sync::CancellationToken;

use crate::errors::TranslationError;

use super::core::TranslationService;
use super::lines::LineTask;
use super::pacer::AdaptivePacer;
use super::progress::{OutputBuffer, ProgressTracker};
use super::retry::sleep_or_cancel;

/// Outcome of resolving a set of lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FallbackSummary {
    /// Lines written with a translation
    pub translated: usize,
    /// Lines written with a failure marker
    pub failed: usize,
    /// Lines left pending because the job was cancelled
    pub skipped: usize,
}

/// Outcome of one line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineOutcome {
    Translated,
    Failed,
    Skipped,
}

/// Resolves lines one by one into the output buffer
pub struct FallbackResolver<'a> {
    service: &'a TranslationService,
    pacer: &'a AdaptivePacer,
    buffer: &'a OutputBuffer,
    progress: &'a ProgressTracker,
    concurrency: usize,
    source_language: &'a str,
    target_language: &'a str,
}

impl<'a> FallbackResolver<'a> {
    /// Create a resolver writing into `buffer`
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        service: &'a TranslationService,
        pacer: &'a AdaptivePacer,
        buffer: &'a OutputBuffer,
        progress: &'a ProgressTracker,
        concurrency: usize,
        source_language: &'a str,
        target_language: &'a str,
    ) -> Self {
        Self {
            service,
            pacer,
            buffer,
            progress,
            concurrency: concurrency.max(1),
            source_language,
            target_language,
        }
    }

    /// Translate `tasks` line by line, `concurrency` at a time
    pub async fn resolve(&self, tasks: &[LineTask], cancel: &CancellationToken) -> FallbackSummary {
        let mut summary = FallbackSummary::default();
        let chunks: Vec<&[LineTask]> = tasks.chunks(self.concurrency).collect();

        for (position, chunk) in chunks.iter().enumerate() {
            if cancel.is_cancelled() {
                summary.skipped += tasks.len() - position * self.concurrency;
                break;
            }

            let outcomes = join_all(chunk.iter().map(|task| self.resolve_line(task, cancel))).await;
            for outcome in outcomes {
                match outcome {
                    LineOutcome::Translated => summary.translated += 1,
                    LineOutcome::Failed => summary.failed += 1,
                    LineOutcome::Skipped => summary.skipped += 1,
                }
            }
            self.progress.report_progress(self.buffer);

            if position + 1 < chunks.len() {
                let delay = self.pacer.current_delay();
                debug!("Fallback pausing {}ms before next chunk", delay.as_millis());
                if !sleep_or_cancel(delay, cancel).await {
                    summary.skipped += tasks.len() - (position + 1) * self.concurrency;
                    break;
                }
            }
        }

        summary
    }

    /// Translate one line and write its slot
    ///
    /// A blank reply counts as a failure. Cancellation leaves the slot pending.
    pub async fn resolve_one(&self, task: &LineTask, cancel: &CancellationToken) -> bool {
        self.resolve_line(task, cancel).await == LineOutcome::Translated
    }

    async fn resolve_line(&self, task: &LineTask, cancel: &CancellationToken) -> LineOutcome {
        let result = self
            .service
            .translate_single_line(&task.text, self.source_language, self.target_language, cancel)
            .await;

        match result {
            Ok(text) if !text.trim().is_empty() => {
                self.buffer.set_translated(task.index, text.trim());
                LineOutcome::Translated
            }
            Ok(_) => {
                warn!("Line {} came back empty; marking it failed", task.index + 1);
                self.buffer.set_failed(task.index, task.text.clone());
                LineOutcome::Failed
            }
            Err(TranslationError::Cancelled) => LineOutcome::Skipped,
            Err(e) => {
                warn!("Line {} failed: {}", task.index + 1, e);
                self.buffer.set_failed(task.index, task.text.clone());
                LineOutcome::Failed
            }
        }
    }
}
