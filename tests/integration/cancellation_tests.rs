/*!
 * Cancellation of running translation jobs
 */

use std::time::Duration;

use linewise::translation::{JobOutcome, JobState};

use crate::common::mock_providers;
use crate::common::{batch_config, job_for, numbered_lines, MemoryExporter};

#[tokio::test(start_paused = true)]
async fn test_cancel_duringFirstBatches_shouldStopWithoutExport() {
    let provider = mock_providers::translating(Duration::from_secs(1));
    let job = job_for(provider.clone(), batch_config(8, 3));
    let handle = job.handle();
    let exporter = MemoryExporter::default();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        handle.cancel();
    });

    let text = numbered_lines(80);
    let outcome = job.run("long.txt", &text, &exporter).await.unwrap();

    assert!(matches!(outcome, JobOutcome::Cancelled(_)));
    assert_eq!(job.state(), JobState::Cancelled);
    assert!(job.handle().is_cancelled());
    assert!(exporter.reports().is_empty());

    // only the first three batches were ever admitted
    assert_eq!(provider.call_count(), 3);
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(provider.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_beforeRun_shouldSendNothing() {
    let provider = mock_providers::translating(Duration::ZERO);
    let job = job_for(provider.clone(), batch_config(8, 3));
    let exporter = MemoryExporter::default();

    job.cancel();
    let outcome = job.run("input.txt", &numbered_lines(10), &exporter).await.unwrap();

    match outcome {
        JobOutcome::Cancelled(stats) => {
            assert_eq!(stats.batches, 2);
            assert_eq!(stats.cache_hits, 0);
        }
        other => panic!("expected cancellation, got {:?}", other),
    }
    assert_eq!(provider.call_count(), 0);
    assert!(exporter.reports().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_duringRateLimitBackoff_shouldStopWaiting() {
    let provider = mock_providers::rate_limited_first(usize::MAX);
    let job = job_for(provider.clone(), batch_config(8, 1));
    let handle = job.handle();
    let exporter = MemoryExporter::default();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.cancel();
    });

    let started = tokio::time::Instant::now();
    let outcome = job.run("input.txt", "a\nb", &exporter).await.unwrap();

    assert!(matches!(outcome, JobOutcome::Cancelled(_)));
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_handle_shouldObserveTerminalState() {
    let provider = mock_providers::translating(Duration::from_millis(10));
    let job = job_for(provider, batch_config(8, 3));
    let handle = job.handle();
    assert_eq!(handle.state(), JobState::Idle);

    job.run("input.txt", "a", &MemoryExporter::default()).await.unwrap();

    assert_eq!(handle.state(), JobState::Done);
    assert!(handle.state().is_terminal());
    assert!(!handle.is_cancelled());
}
