/*!
 * Tests for configuration loading and validation
 */

use linewise::app_config::{Config, LogLevel};

use crate::common::{create_temp_dir, create_test_file, test_config};

#[test]
fn test_load_or_create_withMissingFile_shouldWriteDefaults() {
    let dir = create_temp_dir().unwrap();
    let path = dir.path().join("conf.json");

    let (config, created) = Config::load_or_create(&path).unwrap();

    assert!(created);
    assert!(path.exists());
    assert_eq!(config.batch.batch_size, 8);

    let (reloaded, created_again) = Config::load_or_create(&path).unwrap();
    assert!(!created_again);
    assert_eq!(reloaded.batch, config.batch);
    assert_eq!(reloaded.retry, config.retry);
}

#[test]
fn test_load_or_create_withPartialFile_shouldFillDefaults() {
    let dir = create_temp_dir().unwrap();
    let path = create_test_file(
        dir.path(),
        "conf.json",
        r#"{"target_language": "fr", "api": {"api_key": "sk-x"}, "batch": {"batch_size": 4}, "log_level": "debug"}"#,
    )
    .unwrap();

    let (config, created) = Config::load_or_create(&path).unwrap();

    assert!(!created);
    assert_eq!(config.target_language, "fr");
    assert_eq!(config.source_language, "auto");
    assert_eq!(config.api.api_key, "sk-x");
    assert_eq!(config.api.model, "deepseek-chat");
    assert_eq!(config.batch.batch_size, 4);
    assert_eq!(config.batch.max_concurrent, 3);
    assert_eq!(config.log_level, LogLevel::Debug);
    assert!(config.validate().is_ok());
}

#[test]
fn test_load_or_create_withInvalidJson_shouldFail() {
    let dir = create_temp_dir().unwrap();
    let path = create_test_file(dir.path(), "conf.json", "{ not json").unwrap();

    assert!(Config::load_or_create(&path).is_err());
}

#[test]
fn test_validate_withInvalidTargetLanguage_shouldFail() {
    let mut config = test_config();
    config.target_language = "xx".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withAutoSource_shouldPass() {
    let mut config = test_config();
    config.source_language = "auto".to_string();
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_withBadEndpoint_shouldFail() {
    let mut config = test_config();
    config.api.endpoint = "not a url".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withZeroBatchSizeOrConcurrency_shouldFail() {
    let mut config = test_config();
    config.batch.batch_size = 0;
    assert!(config.validate().is_err());

    let mut config = test_config();
    config.batch.max_concurrent = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withZeroRetryAttempts_shouldFail() {
    let mut config = test_config();
    config.retry.single_line.max_attempts = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_effective_fallback_concurrency_shouldNotExceedBatchConcurrency() {
    let mut config = test_config();
    config.batch.max_concurrent = 1;
    config.batch.fallback_concurrency = 4;
    assert_eq!(config.batch.effective_fallback_concurrency(), 1);

    config.batch.fallback_concurrency = 0;
    assert_eq!(config.batch.effective_fallback_concurrency(), 1);
}
