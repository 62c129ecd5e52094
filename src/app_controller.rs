use anyhow::Result;
use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::app_config::Config;
use crate::errors::AppError;
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::translation::{
    FileExporter, JobOutcome, JobSettings, ProgressUpdate, TranslationCache, TranslationJob, TranslationService,
};

// @module: Application controller for file translation

/// Name of the log collecting files that finished with failed lines
pub const ISSUES_LOG_FILE: &str = "linewise.issues.log";

/// Main application controller for file translation
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Client used for every job
    service: TranslationService,
    // @field: Cache shared by every job of this controller
    cache: TranslationCache,
}

impl Controller {
    // @method: Create a new controller talking to the configured endpoint
    pub fn with_config(config: Config) -> Result<Self> {
        let service = TranslationService::from_config(&config)?;
        Ok(Self::with_service(config, service))
    }

    /// Create a controller on top of an existing service
    pub fn with_service(config: Config, service: TranslationService) -> Self {
        Self {
            config,
            service,
            cache: TranslationCache::default(),
        }
    }

    /// Check if the controller is properly initialized with configuration
    pub fn is_initialized(&self) -> bool {
        !self.config.source_language.is_empty() && !self.config.target_language.is_empty()
    }

    /// Cache shared by the jobs of this controller
    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    /// Path the report for `input_file` would be written to today
    pub fn report_path(&self, input_file: &Path, output_dir: &Path) -> PathBuf {
        FileManager::generate_report_path(
            input_file,
            output_dir,
            &language_utils::display_name(&self.config.target_language),
            Local::now().date_naive(),
        )
    }

    /// Send one tiny request to check endpoint, key and model
    pub async fn test_connection(&self) -> Result<String, AppError> {
        info!(
            "Testing connection to {} with model {}",
            self.config.api.endpoint, self.config.api.model
        );
        let reply = self.service.test_connection(&CancellationToken::new()).await?;
        info!("Connection OK, model replied: {}", reply.trim());
        Ok(reply)
    }

    /// Translate one file into `output_dir`
    ///
    /// Returns `None` when the report already exists and `force_overwrite` is off.
    /// Ctrl-C cancels the running job.
    pub async fn run(
        &self,
        input_file: PathBuf,
        output_dir: PathBuf,
        force_overwrite: bool,
    ) -> Result<Option<JobOutcome>, AppError> {
        if !FileManager::file_exists(&input_file) {
            return Err(AppError::File(format!("Input file does not exist: {:?}", input_file)));
        }
        FileManager::ensure_dir(&output_dir)
            .map_err(|e| AppError::File(format!("Cannot create output directory {:?}: {}", output_dir, e)))?;

        let output_path = self.report_path(&input_file, &output_dir);
        if output_path.exists() && !force_overwrite {
            warn!("Skipping file, translation already exists at {:?} (use -f to force overwrite)", output_path);
            return Ok(None);
        }

        let text = FileManager::read_to_string(&input_file)?;
        let file_name = input_file
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "input.txt".to_string());

        let progress_bar = Self::create_progress_bar();
        let bar = progress_bar.clone();
        let job = TranslationJob::new(
            self.service.clone(),
            self.cache.clone(),
            JobSettings {
                source_language: self.config.source_language.clone(),
                target_language: self.config.target_language.clone(),
                batch: self.config.batch.clone(),
            },
        )
        .with_progress_callback(Arc::new(move |update: &ProgressUpdate| {
            bar.set_length(update.total_lines as u64);
            bar.set_position(update.lines_translated as u64);
            bar.set_message(update.status_message.clone());
        }));

        let handle = job.handle();
        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling translation");
                handle.cancel();
            }
        });

        let exporter = FileExporter::new(&output_dir);
        let result = job.run(&file_name, &text, &exporter).await;
        interrupt.abort();

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                progress_bar.abandon_with_message("Failed");
                return Err(e.into());
            }
        };

        match &outcome {
            JobOutcome::Completed(summary) => {
                progress_bar.finish_with_message("Done");
                let stats = &summary.stats;
                info!(
                    "{}: {} translated, {} failed, success rate {:.1}% ({} batch(es), {} cached, {} fallback line(s), {} repaired)",
                    file_name,
                    summary.report.success_count,
                    summary.report.error_count,
                    summary.report.success_rate(),
                    stats.batches,
                    stats.cache_hits,
                    stats.fallback_lines,
                    stats.verification_repairs
                );
                info!("API usage: {}", self.service.usage().summary());

                if summary.report.error_count > 0 {
                    let log_path = output_dir.join(ISSUES_LOG_FILE);
                    let entry = format!(
                        "{}: {} of {} line(s) failed, see {}",
                        input_file.display(),
                        summary.report.error_count,
                        summary.report.success_count + summary.report.error_count,
                        summary.export_path.as_deref().unwrap_or(&output_path).display()
                    );
                    if let Err(e) = FileManager::append_to_log_file(&log_path, &entry) {
                        error!("Failed to write issues log: {}", e);
                    }
                }
            }
            JobOutcome::Cancelled(stats) => {
                progress_bar.abandon_with_message("Cancelled");
                warn!(
                    "Translation of {} cancelled after {} batch(es); no report written",
                    file_name, stats.batches
                );
            }
        }

        Ok(Some(outcome))
    }

    fn create_progress_bar() -> ProgressBar {
        let progress_bar = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} lines ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar.set_message("Translating");
        progress_bar
    }
}
