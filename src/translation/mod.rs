/*!
 * Batch file translation pipeline.
 *
 * This module turns a text file into translated lines using a chat-completion
 * provider. It is split into several submodules:
 *
 * - `lines`: Splitting file text into indexed line tasks
 * - `batch`: Grouping tasks into composite requests and splitting responses
 * - `core`: Translation service with per-path retry
 * - `retry`: Retry policies and cancellable waits
 * - `cache`: Caching of composite translations
 * - `concurrency`: Admission control for batches
 * - `pacer`: Latency-driven delay between fallback chunks
 * - `fallback`: Line-by-line recovery of failed or partial batches
 * - `progress`: Output buffer, progress updates and time formatting
 * - `report`: Report rendering and export
 * - `job`: Orchestration of one file translation
 * - `prompts`: System prompt templates
 */

// Re-export main types for easier usage
pub use self::cache::TranslationCache;
pub use self::core::{TokenUsageStats, TranslationService};
pub use self::job::{JobHandle, JobOutcome, JobSettings, JobState, JobStats, JobSummary, TranslationJob};
pub use self::progress::{OutputBuffer, ProgressCallback, ProgressUpdate, Slot};
pub use self::report::{FileExporter, ReportExporter, TranslationReport};
pub use self::retry::RetryPolicy;

// Submodules
pub mod batch;
pub mod cache;
pub mod concurrency;
pub mod core;
pub mod fallback;
pub mod job;
pub mod lines;
pub mod pacer;
pub mod progress;
pub mod prompts;
pub mod report;
pub mod retry;
