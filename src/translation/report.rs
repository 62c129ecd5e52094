/*!
 * Translation report rendering and export.
 */

use chrono::{DateTime, Local};
use log::info;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::TranslationError;
use crate::file_utils::FileManager;
use crate::language_utils;

use super::progress::format_time;

/// Width of the rule closing the header
const RULE_WIDTH: usize = 50;

/// Finished job, ready to be written out
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationReport {
    /// Name of the translated file
    pub file_name: String,
    /// Source language code
    pub source_language: String,
    /// Target language code
    pub target_language: String,
    /// When the job finished
    pub finished_at: DateTime<Local>,
    /// Wall-clock time of the job
    pub elapsed: Duration,
    /// Lines translated successfully
    pub success_count: usize,
    /// Lines rendered as failure markers
    pub error_count: usize,
    /// Lines of the input file, blank ones included
    pub total_lines: usize,
    /// Output lines in input order
    pub lines: Vec<String>,
}

impl TranslationReport {
    /// Percentage of translatable lines that succeeded
    pub fn success_rate(&self) -> f64 {
        let attempted = self.success_count + self.error_count;
        if attempted == 0 {
            100.0
        } else {
            self.success_count as f64 / attempted as f64 * 100.0
        }
    }

    /// Header block followed by one line per input line
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("=== File Translation Report ===\n");
        out.push_str(&format!("Original file: {}\n", self.file_name));
        out.push_str(&format!("Source language: {}\n", language_utils::display_name(&self.source_language)));
        out.push_str(&format!("Target language: {}\n", language_utils::display_name(&self.target_language)));
        out.push_str(&format!("Translated at: {}\n", self.finished_at.format("%Y-%m-%d %H:%M:%S")));
        out.push_str(&format!("Elapsed: {}\n", format_time(self.elapsed.as_secs_f64())));
        out.push_str(&format!("Succeeded: {} lines\n", self.success_count));
        out.push_str(&format!("Failed: {} lines\n", self.error_count));
        out.push_str(&format!("Total lines: {} lines\n", self.total_lines));
        out.push_str(&format!("Success rate: {:.1}%\n", self.success_rate()));
        out.push_str(&"=".repeat(RULE_WIDTH));
        out.push_str("\n\n");
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

/// Destination of finished reports
pub trait ReportExporter: Send + Sync {
    /// Write the report; returns where it went, if anywhere on disk
    fn export(&self, report: &TranslationReport) -> Result<Option<PathBuf>, TranslationError>;
}

/// Writes reports to `<output dir>/<stem>_<target language name>_<date>.txt`
#[derive(Debug, Clone)]
pub struct FileExporter {
    output_dir: PathBuf,
}

impl FileExporter {
    /// Create an exporter writing into `output_dir`
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    /// Path a report will be written to
    pub fn path_for(&self, report: &TranslationReport) -> PathBuf {
        let language_name = language_utils::display_name(&report.target_language);
        FileManager::generate_report_path(
            &report.file_name,
            &self.output_dir,
            &language_name,
            report.finished_at.date_naive(),
        )
    }
}

impl ReportExporter for FileExporter {
    fn export(&self, report: &TranslationReport) -> Result<Option<PathBuf>, TranslationError> {
        let path = self.path_for(report);
        FileManager::write_to_file(&path, &report.render())
            .map_err(|e| TranslationError::Export(format!("{:#}", e)))?;
        info!("Report written to {}", path.display());
        Ok(Some(path))
    }
}
