/*!
 * Integration tests for the batch translation pipeline.
 *
 * Every test drives a full `TranslationJob` against a scripted provider, with
 * tokio's clock paused so backoff waits and latencies cost no real time.
 */

use parking_lot::Mutex;
use rand::seq::SliceRandom;
use std::sync::Arc;
use std::time::Duration;

use linewise::errors::TranslationError;
use linewise::providers::mock::{fake_translate, MockProvider};
use linewise::translation::{JobOutcome, JobState, JobSummary, ProgressUpdate, TranslationCache, TranslationJob};

use crate::common::mock_providers;
use crate::common::{batch_config, job_for, job_with_cache, numbered_lines, FailingExporter, MemoryExporter};

async fn run_to_completion(job: &TranslationJob, text: &str) -> JobSummary {
    let exporter = MemoryExporter::default();
    match job.run("input.txt", text, &exporter).await {
        Ok(JobOutcome::Completed(summary)) => {
            assert_eq!(exporter.reports().len(), 1);
            summary
        }
        other => panic!("expected a completed job, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_run_with20Lines_shouldAdmitAllThreeBatchesAtOnce() {
    let provider = mock_providers::translating(Duration::from_millis(200));
    let job = job_for(provider.clone(), batch_config(8, 3));

    let summary = run_to_completion(&job, &numbered_lines(20)).await;

    let calls = provider.calls();
    assert_eq!(calls.len(), 3);
    let sizes: Vec<usize> = calls.iter().map(|c| c.user_text.split("\n---\n").count()).collect();
    assert_eq!(sizes, vec![8, 8, 4]);
    assert_eq!(provider.peak_in_flight(), 3);
    assert_eq!(summary.stats.peak_in_flight, 3);
    assert_eq!(summary.stats.batches, 3);
    assert_eq!(summary.report.success_count, 20);
    assert_eq!(job.state(), JobState::Done);
}

#[tokio::test(start_paused = true)]
async fn test_run_withConcurrencyLimit_shouldNeverExceedIt() {
    let provider = mock_providers::translating(Duration::from_millis(100));
    let job = job_for(provider.clone(), batch_config(2, 2));

    let summary = run_to_completion(&job, &numbered_lines(20)).await;

    assert_eq!(provider.call_count(), 10);
    assert_eq!(provider.peak_in_flight(), 2);
    assert_eq!(summary.stats.peak_in_flight, 2);
}

#[tokio::test(start_paused = true)]
async fn test_run_withMissingSegment_shouldRetryOnlyThatLine() {
    let provider = mock_providers::dropping_last_segment();
    let job = job_for(provider.clone(), batch_config(5, 3));

    let summary = run_to_completion(&job, &numbered_lines(5)).await;

    let calls = provider.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].is_composite());
    assert_eq!(calls[1].user_text, "line 5");
    assert_eq!(summary.report.lines, (1..=5).map(|i| fake_translate(&format!("line {}", i))).collect::<Vec<_>>());
    assert_eq!(summary.stats.split_mismatches, 1);
    assert_eq!(summary.stats.fallback_lines, 1);
    assert_eq!(summary.report.error_count, 0);
}

#[tokio::test(start_paused = true)]
async fn test_run_withRateLimitedBatch_shouldBackOffAndSucceed() {
    let provider = mock_providers::rate_limited_first(2);
    let job = job_for(provider.clone(), batch_config(8, 3));

    let started = tokio::time::Instant::now();
    let summary = run_to_completion(&job, &numbered_lines(4)).await;
    let waited = started.elapsed();

    assert!(waited >= Duration::from_millis(6000), "waited {:?}", waited);
    assert!(waited < Duration::from_millis(6100), "waited {:?}", waited);
    assert_eq!(provider.call_count(), 3);
    assert_eq!(summary.report.success_count, 4);
    assert_eq!(summary.stats.batch_failures, 0);
}

#[tokio::test(start_paused = true)]
async fn test_run_withOneUnrecoverableLine_shouldMarkItFailed() {
    let provider = mock_providers::failing_line("line 3");
    let job = job_for(provider.clone(), batch_config(8, 3));

    let summary = run_to_completion(&job, &numbered_lines(6)).await;

    assert_eq!(summary.report.success_count, 5);
    assert_eq!(summary.report.error_count, 1);
    assert_eq!(summary.report.total_lines, 6);
    assert_eq!(summary.report.lines[2], "[translation failed: line 3]");
    assert_eq!(summary.report.lines[3], "<line 4>");
    // one batch call plus five single-line attempts
    assert_eq!(provider.call_count(), 6);

    let rendered = summary.report.render();
    assert!(rendered.contains("Succeeded: 5 lines"));
    assert!(rendered.contains("Failed: 1 lines"));
}

#[tokio::test(start_paused = true)]
async fn test_run_withFailingBatches_shouldFallBackLineByLine() {
    let provider = mock_providers::failing_batches();
    let job = job_for(provider.clone(), batch_config(4, 3));

    let summary = run_to_completion(&job, &numbered_lines(8)).await;

    assert_eq!(summary.stats.batch_failures, 2);
    assert_eq!(summary.stats.fallback_lines, 8);
    assert_eq!(summary.report.success_count, 8);
    assert_eq!(summary.report.lines[7], "<line 8>");
    // 2 batches × 3 attempts, then 8 single lines
    assert_eq!(provider.call_count(), 14);
}

#[tokio::test(start_paused = true)]
async fn test_run_withDuplicateBatches_shouldHitCacheInsteadOfRequesting() {
    let provider = mock_providers::translating(Duration::from_millis(10));
    let job = job_for(provider.clone(), batch_config(2, 1));

    let summary = run_to_completion(&job, "hello\nworld\nhello\nworld").await;

    assert_eq!(provider.call_count(), 1);
    assert_eq!(summary.stats.cache_hits, 1);
    assert_eq!(summary.report.lines, vec!["<hello>", "<world>", "<hello>", "<world>"]);
}

#[tokio::test(start_paused = true)]
async fn test_run_withSharedCache_shouldNotRequestAgainInSecondJob() {
    let provider = mock_providers::translating(Duration::from_millis(10));
    let cache = TranslationCache::default();
    let text = numbered_lines(10);

    let first = job_with_cache(provider.clone(), batch_config(8, 3), cache.clone());
    run_to_completion(&first, &text).await;
    let calls_after_first = provider.call_count();

    let second = job_with_cache(provider.clone(), batch_config(8, 3), cache.clone());
    let summary = run_to_completion(&second, &text).await;

    assert_eq!(provider.call_count(), calls_after_first);
    assert_eq!(summary.stats.cache_hits, 2);
    assert_eq!(cache.stats().hits, 2);
}

#[tokio::test(start_paused = true)]
async fn test_run_withShuffledLatencies_shouldKeepInputOrder() {
    let mut latencies: Vec<u64> = (1..=10).map(|i| i * 37).collect();
    latencies.shuffle(&mut rand::rng());
    let latencies = Arc::new(latencies);

    let provider = Arc::new(MockProvider::translating().with_latency_fn({
        let latencies = latencies.clone();
        move |call| Duration::from_millis(latencies[call.index % latencies.len()])
    }));
    let job = job_for(provider.clone(), batch_config(3, 5));

    let summary = run_to_completion(&job, &numbered_lines(30)).await;

    let expected: Vec<String> = (1..=30).map(|i| format!("<line {}>", i)).collect();
    assert_eq!(summary.report.lines, expected);
}

#[tokio::test(start_paused = true)]
async fn test_run_withBlankLines_shouldPassThemThrough() {
    let provider = mock_providers::translating(Duration::ZERO);
    let job = job_for(provider, batch_config(8, 3));

    let summary = run_to_completion(&job, "one\n\n  \ntwo\n").await;

    assert_eq!(summary.report.lines, vec!["<one>", "", "", "<two>", ""]);
    assert_eq!(summary.report.total_lines, 5);
    assert_eq!(summary.report.success_count, 2);
    assert_eq!(summary.report.success_rate(), 100.0);
}

#[tokio::test]
async fn test_run_withEmptyInput_shouldFailWithoutRequests() {
    let provider = mock_providers::translating(Duration::ZERO);
    let job = job_for(provider.clone(), batch_config(8, 3));
    let exporter = MemoryExporter::default();

    let result = job.run("empty.txt", "\n \n", &exporter).await;

    assert!(matches!(result, Err(TranslationError::EmptyInput(_))));
    assert_eq!(job.state(), JobState::Failed);
    assert_eq!(provider.call_count(), 0);
    assert!(exporter.reports().is_empty());
}

#[tokio::test]
async fn test_run_withFailingExporter_shouldFailJob() {
    let provider = mock_providers::translating(Duration::ZERO);
    let job = job_for(provider, batch_config(8, 3));

    let result = job.run("input.txt", "a\nb", &FailingExporter).await;

    assert!(matches!(result, Err(TranslationError::Export(_))));
    assert_eq!(job.state(), JobState::Failed);
}

#[tokio::test(start_paused = true)]
async fn test_run_shouldReportProgressUpToCompletion() {
    let updates: Arc<Mutex<Vec<ProgressUpdate>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = updates.clone();
    let provider = mock_providers::translating(Duration::from_millis(50));
    let job = job_for(provider, batch_config(4, 2)).with_progress_callback(Arc::new(move |update: &ProgressUpdate| {
        sink.lock().push(update.clone());
    }));

    run_to_completion(&job, &numbered_lines(12)).await;

    let updates = updates.lock();
    assert!(updates.len() >= 4, "one update per batch plus completion");
    assert!(updates.windows(2).all(|pair| pair[0].lines_translated <= pair[1].lines_translated));
    let last = updates.last().unwrap();
    assert_eq!(last.percentage, 100);
    assert_eq!(last.lines_translated, 12);
    assert_eq!(last.total_lines, 12);
    assert!(last.status_message.starts_with("Translation complete!"));
}
