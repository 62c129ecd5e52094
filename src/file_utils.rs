use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use chrono::Local;

use crate::errors::TranslationError;

// @module: File and directory utilities

/// UTF-8 byte-order mark some editors put at the start of text files
pub const BYTE_ORDER_MARK: char = '\u{feff}';

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    /// Read a UTF-8 text file for translation
    ///
    /// Invalid UTF-8 is rejected rather than lossily decoded, since every byte
    /// of the input ends up in a prompt. A leading byte-order mark is dropped.
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String, TranslationError> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .map_err(|e| TranslationError::FileRead(format!("{}: {}", path.display(), e)))?;

        let text = String::from_utf8(bytes)
            .map_err(|e| TranslationError::FileRead(format!("{}: not valid UTF-8 ({})", path.display(), e)))?;

        match text.strip_prefix(BYTE_ORDER_MARK) {
            Some(rest) => Ok(rest.to_string()),
            None => Ok(text),
        }
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }

    // @generates: Output path for a translation report
    // @params: input_file, output_dir, target language display name, date
    pub fn generate_report_path<P1: AsRef<Path>, P2: AsRef<Path>>(
        input_file: P1,
        output_dir: P2,
        target_language_name: &str,
        date: NaiveDate,
    ) -> PathBuf {
        let stem = input_file
            .as_ref()
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "translated".to_string());

        let output_filename = format!(
            "{}_{}_{}.txt",
            stem,
            target_language_name.replace(' ', "_"),
            date.format("%Y-%m-%d")
        );

        output_dir.as_ref().join(output_filename)
    }

    /// Append content to a log file with timestamp
    pub fn append_to_log_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file: {:?}", path.as_ref()))?;

        writeln!(file, "[{}] {}", timestamp, content)
            .with_context(|| format!("Failed to write to log file: {:?}", path.as_ref()))?;

        Ok(())
    }
}
