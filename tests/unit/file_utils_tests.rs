/*!
 * Tests for file utility functions
 */

use chrono::NaiveDate;
use std::fs;

use linewise::errors::TranslationError;
use linewise::file_utils::FileManager;
use linewise::translation::lines::split_lines;

use crate::common::{create_temp_dir, create_test_file};

#[test]
fn test_read_to_string_withUtf8File_shouldReturnContent() {
    let dir = create_temp_dir().unwrap();
    let path = create_test_file(dir.path(), "notes.txt", "héllo\nwörld\n").unwrap();

    assert_eq!(FileManager::read_to_string(&path).unwrap(), "héllo\nwörld\n");
}

#[test]
fn test_read_to_string_withInvalidUtf8_shouldFailWithFileRead() {
    let dir = create_temp_dir().unwrap();
    let path = dir.path().join("binary.txt");
    fs::write(&path, [0x66, 0x6f, 0xff, 0xfe, 0x6f]).unwrap();

    let result = FileManager::read_to_string(&path);

    assert!(matches!(result, Err(TranslationError::FileRead(ref m)) if m.contains("UTF-8")));
}

#[test]
fn test_read_to_string_withMissingFile_shouldFailWithFileRead() {
    let dir = create_temp_dir().unwrap();
    let result = FileManager::read_to_string(dir.path().join("missing.txt"));
    assert!(matches!(result, Err(TranslationError::FileRead(_))));
}

#[test]
fn test_write_to_file_shouldCreateParentDirectories() {
    let dir = create_temp_dir().unwrap();
    let path = dir.path().join("a").join("b").join("out.txt");

    FileManager::write_to_file(&path, "content").unwrap();

    assert!(FileManager::file_exists(&path));
    assert_eq!(fs::read_to_string(&path).unwrap(), "content");
}

#[test]
fn test_file_exists_withDirectory_shouldBeFalse() {
    let dir = create_temp_dir().unwrap();
    assert!(!FileManager::file_exists(dir.path()));
}

#[test]
fn test_generate_report_path_withMultiWordLanguage_shouldUseUnderscores() {
    let date = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
    let path = FileManager::generate_report_path("dir/chapter.one.txt", "out", "Modern Greek", date);
    assert_eq!(
        path.file_name().unwrap().to_string_lossy(),
        "chapter.one_Modern_Greek_2025-01-31.txt"
    );
    assert!(path.starts_with("out"));
}

#[test]
fn test_append_to_log_file_shouldAppendTimestampedLines() {
    let dir = create_temp_dir().unwrap();
    let path = dir.path().join("logs").join("issues.log");

    FileManager::append_to_log_file(&path, "first").unwrap();
    FileManager::append_to_log_file(&path, "second").unwrap();

    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with('[') && lines[0].ends_with("] first"));
    assert!(lines[1].ends_with("] second"));
}

#[test]
fn test_read_to_string_withOnlyByteOrderMark_shouldLeaveNothingToTranslate() {
    let dir = create_temp_dir().unwrap();
    let path = create_test_file(dir.path(), "bom.txt", "\u{feff}\n  \n").unwrap();

    let text = FileManager::read_to_string(&path).unwrap();

    assert_eq!(text, "\n  \n");
    assert!(matches!(split_lines(&text), Err(TranslationError::EmptyInput(_))));
}

#[test]
fn test_read_to_string_withByteOrderMark_shouldKeepFirstLineClean() {
    let dir = create_temp_dir().unwrap();
    let path = create_test_file(dir.path(), "bom.txt", "\u{feff}Hello\nWorld").unwrap();

    let document = split_lines(&FileManager::read_to_string(&path).unwrap()).unwrap();

    assert_eq!(document.tasks[0].text, "Hello");
    assert_eq!(document.tasks[1].text, "World");
}
