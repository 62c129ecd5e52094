/*!
 * Translation job orchestration.
 *
 * A `TranslationJob` owns everything that lives for one file: cancellation
 * token, pacer and state. The translation service and the cache are injected
 * and may be shared between jobs.
 *
 * Flow: split → batch → translate all batches (bounded concurrency, fallback
 * per batch) → verification sweep → accounting check → export.
 */

use chrono::Local;
use futures::future::join_all;
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::app_config::BatchConfig;
use crate::errors::TranslationError;

use super::batch::{create_batches, Batch};
use super::cache::TranslationCache;
use super::concurrency::ConcurrencyController;
use super::core::TranslationService;
use super::fallback::FallbackResolver;
use super::lines::{split_lines, SplitDocument};
use super::pacer::AdaptivePacer;
use super::progress::{estimate_duration, format_time, OutputBuffer, ProgressCallback, ProgressTracker};
use super::report::{ReportExporter, TranslationReport};

/// Lifecycle of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Splitting,
    Batching,
    Translating,
    Verifying,
    Exporting,
    Done,
    Cancelled,
    Failed,
}

impl JobState {
    /// Whether the job has stopped
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Done | JobState::Cancelled | JobState::Failed)
    }
}

/// Counters collected while a job runs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobStats {
    /// Batches created
    pub batches: usize,
    /// Batches answered from the cache
    pub cache_hits: usize,
    /// Batches whose request failed after all retries
    pub batch_failures: usize,
    /// Batches whose response lacked segments
    pub split_mismatches: usize,
    /// Lines sent through the single-line fallback
    pub fallback_lines: usize,
    /// Lines still pending after all batches and repaired by the verification sweep
    pub verification_repairs: usize,
    /// Highest number of batches in flight at once
    pub peak_in_flight: usize,
    /// Wall-clock time of the job
    pub elapsed: Duration,
}

/// Result of a completed job
#[derive(Debug, Clone, PartialEq)]
pub struct JobSummary {
    /// The exported report
    pub report: TranslationReport,
    /// Where the exporter put it, if on disk
    pub export_path: Option<PathBuf>,
    /// Job counters
    pub stats: JobStats,
}

/// How a job ended when it did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// Every line resolved and the report was exported
    Completed(JobSummary),
    /// The job was cancelled; nothing was exported
    Cancelled(JobStats),
}

/// Per-job job settings
#[derive(Debug, Clone)]
pub struct JobSettings {
    /// Source language code or "auto"
    pub source_language: String,
    /// Target language code
    pub target_language: String,
    /// Batch size and concurrency
    pub batch: BatchConfig,
}

/// Cloneable handle for cancelling a job and observing its state
#[derive(Debug, Clone)]
pub struct JobHandle {
    cancel: CancellationToken,
    state: Arc<Mutex<JobState>>,
}

impl JobHandle {
    /// Request cancellation; the job stops at its next suspension point
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Current state
    pub fn state(&self) -> JobState {
        *self.state.lock()
    }
}

#[derive(Debug, Default)]
struct JobCounters {
    cache_hits: AtomicUsize,
    batch_failures: AtomicUsize,
    split_mismatches: AtomicUsize,
    fallback_lines: AtomicUsize,
}

/// Shared state handed to every batch of a run
struct RunContext<'a> {
    document: &'a SplitDocument,
    buffer: OutputBuffer,
    tracker: ProgressTracker,
    controller: ConcurrencyController,
    counters: JobCounters,
    total_batches: usize,
}

/// One file translation
pub struct TranslationJob {
    id: Uuid,
    service: TranslationService,
    cache: TranslationCache,
    settings: JobSettings,
    cancel: CancellationToken,
    state: Arc<Mutex<JobState>>,
    pacer: AdaptivePacer,
    progress_callback: Option<ProgressCallback>,
}

impl TranslationJob {
    /// Create a job using `service` for requests and `cache` for batch results
    pub fn new(service: TranslationService, cache: TranslationCache, settings: JobSettings) -> Self {
        let pacer = AdaptivePacer::new(Duration::from_millis(settings.batch.initial_delay_ms));
        Self {
            id: Uuid::new_v4(),
            service,
            cache,
            settings,
            cancel: CancellationToken::new(),
            state: Arc::new(Mutex::new(JobState::Idle)),
            pacer,
            progress_callback: None,
        }
    }

    /// Set the progress callback
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Unique id used in logs
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Handle for cancelling from another task
    pub fn handle(&self) -> JobHandle {
        JobHandle {
            cancel: self.cancel.clone(),
            state: self.state.clone(),
        }
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Current state
    pub fn state(&self) -> JobState {
        *self.state.lock()
    }

    fn set_state(&self, state: JobState) {
        let mut current = self.state.lock();
        debug!("Job {}: {:?} -> {:?}", self.id, *current, state);
        *current = state;
    }

    fn fail(&self, error: TranslationError) -> TranslationError {
        error!("Job {} failed: {}", self.id, error);
        self.set_state(JobState::Failed);
        error
    }

    fn cancelled(&self, stats: JobStats) -> JobOutcome {
        warn!("Job {} cancelled", self.id);
        self.set_state(JobState::Cancelled);
        JobOutcome::Cancelled(stats)
    }

    /// Translate `text` and hand the report to `exporter`
    ///
    /// `file_name` only labels the report and names the exported file.
    pub async fn run(
        &self,
        file_name: &str,
        text: &str,
        exporter: &dyn ReportExporter,
    ) -> Result<JobOutcome, TranslationError> {
        let started = Instant::now();

        self.set_state(JobState::Splitting);
        let document = split_lines(text).map_err(|e| self.fail(e))?;

        self.set_state(JobState::Batching);
        let batches = create_batches(&document.tasks, self.settings.batch.batch_size);
        let estimate = estimate_duration(
            document.translatable_lines(),
            self.settings.batch.batch_size,
            self.settings.batch.max_concurrent,
        );
        info!(
            "Translating {} line(s) of {} in {} batch(es), estimated {}",
            document.translatable_lines(),
            file_name,
            batches.len(),
            format_time(estimate.as_secs_f64())
        );

        let context = RunContext {
            document: &document,
            buffer: OutputBuffer::from_document(&document),
            tracker: ProgressTracker::new(self.progress_callback.clone(), document.translatable_lines()),
            controller: ConcurrencyController::new(self.settings.batch.max_concurrent),
            counters: JobCounters::default(),
            total_batches: batches.len(),
        };

        self.set_state(JobState::Translating);
        join_all(batches.iter().map(|batch| self.translate_batch(batch, &context))).await;

        if self.cancel.is_cancelled() {
            return Ok(self.cancelled(self.stats(&context, 0, started)));
        }

        self.set_state(JobState::Verifying);
        let repairs = self.verify(&context).await;

        if self.cancel.is_cancelled() {
            return Ok(self.cancelled(self.stats(&context, repairs, started)));
        }

        let counts = context.buffer.counts();
        let accounted = counts.translated + counts.failed + counts.blank;
        if counts.pending > 0 || accounted != document.total_lines {
            return Err(self.fail(TranslationError::ProgressInvariant {
                expected: document.total_lines,
                actual: accounted,
            }));
        }

        context.tracker.report(
            &context.buffer,
            format!("Translation complete! Success rate: {:.1}%", counts.success_rate()),
        );

        self.set_state(JobState::Exporting);
        let stats = self.stats(&context, repairs, started);
        let report = TranslationReport {
            file_name: file_name.to_string(),
            source_language: self.settings.source_language.clone(),
            target_language: self.settings.target_language.clone(),
            finished_at: Local::now(),
            elapsed: stats.elapsed,
            success_count: counts.translated,
            error_count: counts.failed,
            total_lines: document.total_lines,
            lines: context.buffer.render_lines(),
        };
        let export_path = exporter.export(&report).map_err(|e| self.fail(e))?;

        self.set_state(JobState::Done);
        info!(
            "Job {} done: {} translated, {} failed, {} blank in {}",
            self.id,
            counts.translated,
            counts.failed,
            counts.blank,
            format_time(stats.elapsed.as_secs_f64())
        );

        Ok(JobOutcome::Completed(JobSummary {
            report,
            export_path,
            stats,
        }))
    }

    fn stats(&self, context: &RunContext<'_>, verification_repairs: usize, started: Instant) -> JobStats {
        JobStats {
            batches: context.total_batches,
            cache_hits: context.counters.cache_hits.load(Ordering::SeqCst),
            batch_failures: context.counters.batch_failures.load(Ordering::SeqCst),
            split_mismatches: context.counters.split_mismatches.load(Ordering::SeqCst),
            fallback_lines: context.counters.fallback_lines.load(Ordering::SeqCst),
            verification_repairs,
            peak_in_flight: context.controller.peak_in_flight(),
            elapsed: started.elapsed(),
        }
    }

    fn fallback<'a>(&'a self, context: &'a RunContext<'_>) -> FallbackResolver<'a> {
        FallbackResolver::new(
            &self.service,
            &self.pacer,
            &context.buffer,
            &context.tracker,
            self.settings.batch.effective_fallback_concurrency(),
            &self.settings.source_language,
            &self.settings.target_language,
        )
    }

    /// Look up or request the composite translation of a batch
    async fn batch_response(&self, composite: &str, context: &RunContext<'_>) -> Result<String, TranslationError> {
        let source = &self.settings.source_language;
        let target = &self.settings.target_language;

        if let Some(hit) = self.cache.get(composite, source, target) {
            context.counters.cache_hits.fetch_add(1, Ordering::SeqCst);
            return Ok(hit);
        }

        let started = Instant::now();
        let response = self
            .service
            .translate_batch_text(composite, source, target, &self.cancel)
            .await?;
        self.pacer.record(started.elapsed());
        self.cache.store(composite, source, target, &response);
        Ok(response)
    }

    async fn translate_batch(&self, batch: &Batch, context: &RunContext<'_>) {
        let Some(_permit) = context.controller.admit(&self.cancel).await else {
            return;
        };
        debug!(
            "Batch {}/{} admitted ({} in flight)",
            batch.number + 1,
            context.total_batches,
            context.controller.in_flight()
        );

        match self.batch_response(&batch.compose(), context).await {
            Ok(response) => {
                let split = batch.split_response(&response);
                for (task, text) in &split.resolved {
                    context.buffer.set_translated(task.index, text.clone());
                }
                if !split.is_complete() {
                    warn!(
                        "Batch {}/{}: {} of {} line(s) missing from the response, retrying them one by one",
                        batch.number + 1,
                        context.total_batches,
                        split.unmatched.len(),
                        batch.len()
                    );
                    context.counters.split_mismatches.fetch_add(1, Ordering::SeqCst);
                    context.counters.fallback_lines.fetch_add(split.unmatched.len(), Ordering::SeqCst);
                    self.fallback(context).resolve(&split.unmatched, &self.cancel).await;
                }
            }
            Err(TranslationError::Cancelled) => return,
            Err(e) => {
                warn!(
                    "Batch {}/{} failed ({}), retrying its {} line(s) one by one",
                    batch.number + 1,
                    context.total_batches,
                    e,
                    batch.len()
                );
                context.counters.batch_failures.fetch_add(1, Ordering::SeqCst);
                context.counters.fallback_lines.fetch_add(batch.len(), Ordering::SeqCst);
                self.fallback(context).resolve(batch.tasks(), &self.cancel).await;
            }
        }

        if !self.cancel.is_cancelled() {
            context.tracker.report_progress(&context.buffer);
        }
    }

    /// Retry every still-pending line sequentially; returns how many were repaired
    async fn verify(&self, context: &RunContext<'_>) -> usize {
        let pending = context.buffer.pending_indices();
        if pending.is_empty() {
            return 0;
        }

        warn!("Verification found {} unresolved line(s), retrying them", pending.len());
        let resolver = self.fallback(context);
        let mut repaired = 0;

        for index in pending {
            if self.cancel.is_cancelled() {
                break;
            }
            let Ok(position) = context.document.tasks.binary_search_by_key(&index, |task| task.index) else {
                continue;
            };
            let task = &context.document.tasks[position];
            if resolver.resolve_one(task, &self.cancel).await {
                repaired += 1;
            }
            context.tracker.report_progress(&context.buffer);
        }

        if repaired > 0 {
            warn!("Verification repaired {} line(s)", repaired);
        }
        repaired
    }
}
