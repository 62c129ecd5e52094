/*!
 * End-to-end runs through the application controller
 */

use chrono::Local;
use std::fs;
use std::time::Duration;

use linewise::app_controller::{Controller, ISSUES_LOG_FILE};
use linewise::errors::{AppError, TranslationError};
use linewise::translation::JobOutcome;

use crate::common::mock_providers;
use crate::common::{batch_config, create_temp_dir, create_test_file, service_for, test_config};

fn controller_for(provider: std::sync::Arc<linewise::providers::mock::MockProvider>) -> Controller {
    let mut config = test_config();
    config.batch = batch_config(8, 3);
    Controller::with_service(config, service_for(provider))
}

#[tokio::test(start_paused = true)]
async fn test_run_shouldWriteReportNextToInput() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "notes.txt", "hello\n\nworld").unwrap();
    let provider = mock_providers::translating(Duration::from_millis(20));
    let controller = controller_for(provider);
    assert!(controller.is_initialized());

    let outcome = controller
        .run(input.clone(), dir.path().to_path_buf(), false)
        .await
        .unwrap();

    let expected_path = dir
        .path()
        .join(format!("notes_French_{}.txt", Local::now().format("%Y-%m-%d")));
    match outcome {
        Some(JobOutcome::Completed(summary)) => {
            assert_eq!(summary.export_path.as_deref(), Some(expected_path.as_path()));
        }
        other => panic!("expected a completed run, got {:?}", other),
    }
    assert_eq!(controller.report_path(&input, dir.path()), expected_path);

    let written = fs::read_to_string(&expected_path).unwrap();
    assert!(written.starts_with("=== File Translation Report ===\nOriginal file: notes.txt\n"));
    assert!(written.contains("Target language: French"));
    assert!(written.ends_with("<hello>\n\n<world>\n"));
    assert!(!dir.path().join(ISSUES_LOG_FILE).exists());
}

#[tokio::test(start_paused = true)]
async fn test_run_withExistingReport_shouldSkipUnlessForced() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "notes.txt", "hello").unwrap();
    let provider = mock_providers::translating(Duration::ZERO);
    let controller = controller_for(provider.clone());

    controller.run(input.clone(), dir.path().to_path_buf(), false).await.unwrap();
    assert_eq!(provider.call_count(), 1);

    let skipped = controller.run(input.clone(), dir.path().to_path_buf(), false).await.unwrap();
    assert!(skipped.is_none());
    assert_eq!(provider.call_count(), 1);

    let forced = controller.run(input, dir.path().to_path_buf(), true).await.unwrap();
    assert!(matches!(forced, Some(JobOutcome::Completed(_))));
    // the forced rerun is answered by the controller's cache
    assert_eq!(provider.call_count(), 1);
    assert_eq!(controller.cache().stats().hits, 1);
}

#[tokio::test(start_paused = true)]
async fn test_run_withFailedLine_shouldAppendToIssuesLog() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "notes.txt", "good\nbad\nfine").unwrap();
    let controller = controller_for(mock_providers::failing_line("bad"));

    let outcome = controller
        .run(input, dir.path().to_path_buf(), false)
        .await
        .unwrap();

    match outcome {
        Some(JobOutcome::Completed(summary)) => {
            assert_eq!(summary.report.error_count, 1);
            assert_eq!(summary.report.lines[1], "[translation failed: bad]");
        }
        other => panic!("expected a completed run, got {:?}", other),
    }
    let log = fs::read_to_string(dir.path().join(ISSUES_LOG_FILE)).unwrap();
    assert!(log.contains("1 of 3 line(s) failed"));
}

#[tokio::test]
async fn test_run_withMissingInput_shouldFail() {
    let dir = create_temp_dir().unwrap();
    let controller = controller_for(mock_providers::translating(Duration::ZERO));

    let result = controller
        .run(dir.path().join("missing.txt"), dir.path().to_path_buf(), false)
        .await;

    assert!(matches!(result, Err(AppError::File(ref m)) if m.contains("missing.txt")));
}

#[tokio::test]
async fn test_run_withBlankFile_shouldFailWithEmptyInput() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "blank.txt", "\n\n").unwrap();
    let controller = controller_for(mock_providers::translating(Duration::ZERO));

    let error = controller
        .run(input, dir.path().to_path_buf(), false)
        .await
        .unwrap_err();

    assert!(matches!(error, AppError::Translation(TranslationError::EmptyInput(_))));
    assert!(error.to_string().contains("No translatable content"));
}

#[test]
fn test_test_connection_withFailingEndpoint_shouldReturnProviderFailure() {
    let provider = std::sync::Arc::new(linewise::providers::mock::MockProvider::failing(
        linewise::errors::ProviderError::from_status(401, "invalid api key"),
    ));
    let controller = controller_for(provider);

    let error = tokio_test::block_on(controller.test_connection()).unwrap_err();

    assert!(matches!(error, AppError::Translation(TranslationError::Network(ref m)) if m.contains("invalid api key")));
}

#[test]
fn test_test_connection_shouldReturnModelReply() {
    let provider = mock_providers::translating(Duration::ZERO);
    let controller = controller_for(provider.clone());

    let reply = tokio_test::block_on(controller.test_connection()).unwrap();

    assert_eq!(reply, "<Hello>");
    let calls = provider.calls();
    assert_eq!(calls[0].max_tokens, 10);
    assert_eq!(calls[0].user_text, "Hello");
}
