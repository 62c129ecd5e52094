use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use url::Url;

use crate::translation::retry::RetryPolicy;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO) or "auto"
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Chat-completion endpoint settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Batching and concurrency settings
    #[serde(default)]
    pub batch: BatchConfig,

    /// Retry policies for the two request paths
    #[serde(default)]
    pub retry: RetryConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Chat-completion endpoint configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApiConfig {
    /// Base URL; requests go to `{endpoint}/chat/completions`
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Bearer credential
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Temperature for composite batch requests
    #[serde(default = "default_batch_temperature")]
    pub batch_temperature: f32,

    /// Token budget for composite batch requests
    #[serde(default = "default_batch_max_tokens")]
    pub batch_max_tokens: u32,

    /// Temperature for single-line requests; lower for stability
    #[serde(default = "default_single_line_temperature")]
    pub single_line_temperature: f32,

    /// Token budget for single-line requests
    #[serde(default = "default_single_line_max_tokens")]
    pub single_line_max_tokens: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: String::new(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            batch_temperature: default_batch_temperature(),
            batch_max_tokens: default_batch_max_tokens(),
            single_line_temperature: default_single_line_temperature(),
            single_line_max_tokens: default_single_line_max_tokens(),
        }
    }
}

/// Batching and concurrency configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BatchConfig {
    /// Lines per composite request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Maximum batches in flight at once
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Upper bound on concurrent single-line fallback requests
    #[serde(default = "default_fallback_concurrency")]
    pub fallback_concurrency: usize,

    /// Starting delay of the adaptive pacer in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_concurrent: default_max_concurrent(),
            fallback_concurrency: default_fallback_concurrency(),
            initial_delay_ms: default_initial_delay_ms(),
        }
    }
}

impl BatchConfig {
    /// Concurrency used by the fallback resolver, never above the batch concurrency
    pub fn effective_fallback_concurrency(&self) -> usize {
        self.fallback_concurrency.min(self.max_concurrent).max(1)
    }
}

/// Retry policies for the batch and single-line request paths
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RetryConfig {
    /// Policy for composite batch requests
    #[serde(default = "RetryPolicy::batch")]
    pub batch: RetryPolicy,

    /// Policy for single-line requests
    #[serde(default = "RetryPolicy::single_line")]
    pub single_line: RetryPolicy,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            batch: RetryPolicy::batch(),
            single_line: RetryPolicy::single_line(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching filter for the `log` facade
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    "auto".to_string()
}

fn default_target_language() -> String {
    "zh".to_string()
}

fn default_endpoint() -> String {
    "https://api.deepseek.com/v1".to_string()
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_batch_temperature() -> f32 {
    0.3
}

fn default_batch_max_tokens() -> u32 {
    4000
}

fn default_single_line_temperature() -> f32 {
    0.1
}

fn default_single_line_max_tokens() -> u32 {
    2000
}

fn default_batch_size() -> usize {
    8
}

fn default_max_concurrent() -> usize {
    3
}

fn default_fallback_concurrency() -> usize {
    2
}

fn default_initial_delay_ms() -> u64 {
    150
}

impl Config {
    /// Load a configuration file, or write and return the defaults when it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<(Self, bool)> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok((config, false));
        }

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {}", path.display()))?;

        Ok((config, true))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.source_language.trim() != "auto" {
            crate::language_utils::get_language_name(&self.source_language)?;
        }
        crate::language_utils::get_language_name(&self.target_language)?;

        if self.api.api_key.trim().is_empty() {
            return Err(anyhow!("API key is required (set api.api_key or LINEWISE_API_KEY)"));
        }

        Url::parse(&self.api.endpoint)
            .with_context(|| format!("Invalid API endpoint: {}", self.api.endpoint))?;

        if self.api.model.trim().is_empty() {
            return Err(anyhow!("Model name cannot be empty"));
        }

        if self.batch.batch_size == 0 {
            return Err(anyhow!("Batch size must be at least 1"));
        }

        if self.batch.max_concurrent == 0 {
            return Err(anyhow!("Max concurrent requests must be at least 1"));
        }

        for (name, policy) in [("batch", &self.retry.batch), ("single_line", &self.retry.single_line)] {
            if policy.max_attempts == 0 {
                return Err(anyhow!("Retry policy '{}' needs at least one attempt", name));
            }
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            api: ApiConfig::default(),
            batch: BatchConfig::default(),
            retry: RetryConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
