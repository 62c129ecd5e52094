/*!
 * # linewise - line-by-line file translation with chat-completion models
 *
 * A Rust library for translating text files line by line through any
 * OpenAI-compatible chat-completion endpoint.
 *
 * ## Features
 *
 * - Lines are grouped into batches and translated as one composite request
 * - Bounded concurrency with adaptive pacing
 * - Exponential-backoff retry with rate-limit and token-limit handling
 * - Line-by-line fallback for failed or partially answered batches
 * - Output order always matches input order; failures are marked in place
 * - Cooperative cancellation of a running job
 * - Plain-text report with a statistics header
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `translation`: The translation pipeline:
 *   - `translation::job`: Orchestration of one file
 *   - `translation::core`: Translation service with retry
 *   - `translation::batch`: Composite batches
 *   - `translation::cache`: Caching of composite translations
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `providers`: Chat-completion clients:
 *   - `providers::openai`: OpenAI-compatible API client
 *   - `providers::mock`: Scripted provider for tests
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod file_utils;
pub mod translation;
pub mod app_controller;
pub mod language_utils;
pub mod providers;
pub mod errors;

// Re-export main types for easier usage
pub use app_config::Config;
pub use translation::{TranslationJob, TranslationService};
pub use language_utils::{language_codes_match, normalize_to_part2t, get_language_name};
pub use errors::{AppError, ProviderError, TranslationError};
