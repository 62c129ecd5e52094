// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};

use linewise::app_config::{self, Config};
use linewise::app_controller::Controller;
use linewise::translation::JobOutcome;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a text file line by line (default command)
    Translate(TranslateArgs),

    /// Send one tiny request to check endpoint, API key and model
    TestConnection(ConfigArgs),

    /// Generate shell completions for linewise
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Options that select and override the configuration
#[derive(Args, Debug, Clone)]
struct ConfigArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// API key (overrides the configuration file)
    #[arg(long, env = "LINEWISE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Base URL of the OpenAI-compatible endpoint
    #[arg(long)]
    endpoint: Option<String>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// Options of a translation run
#[derive(Args, Debug, Clone)]
struct TranslateOptions {
    /// Directory for the report (defaults to the input file's directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Force overwrite of an existing report
    #[arg(short, long)]
    force_overwrite: bool,

    /// Source language code (e.g., 'en', 'es', or 'auto')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'zh', 'fr')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Lines per batch request
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Maximum batch requests in flight
    #[arg(short = 'j', long)]
    max_concurrent: Option<usize>,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Args, Debug)]
struct TranslateArgs {
    /// Text file to translate
    #[arg(value_name = "INPUT_FILE")]
    input_file: PathBuf,

    #[command(flatten)]
    options: TranslateOptions,
}

/// linewise - line-by-line file translation with chat-completion models
#[derive(Parser, Debug)]
#[command(name = "linewise")]
#[command(version)]
#[command(about = "Batch line-by-line file translation through chat-completion APIs")]
#[command(long_about = "linewise translates a text file line by line through any OpenAI-compatible
chat-completion endpoint. Lines are sent in batches, failures fall back to
line-by-line requests, and the result is written as a report next to the input.

EXAMPLES:
    linewise notes.txt                          # Translate using default config
    linewise -s en -t fr notes.txt              # Translate from English to French
    linewise -f -o out/ notes.txt               # Overwrite an existing report in out/
    linewise test-connection                    # Check endpoint, key and model
    linewise completions bash > linewise.bash   # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically. The API key may also come from LINEWISE_API_KEY.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Text file to translate
    #[arg(value_name = "INPUT_FILE")]
    input_file: Option<PathBuf>,

    #[command(flatten)]
    options: TranslateOptions,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Tag and ANSI color for a log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("ERROR", "\x1B[1;31m"),
            Level::Warn => ("WARN ", "\x1B[1;33m"),
            Level::Info => ("INFO ", "\x1B[1;32m"),
            Level::Debug => ("DEBUG", "\x1B[1;36m"),
            Level::Trace => ("TRACE", "\x1B[1;35m"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (tag, color) = Self::style_for_level(record.level());
            let _ = writeln!(std::io::stderr(), "{}{} {} {}\x1B[0m", color, now, tag, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Accept everything here; the effective level is set once the config is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "linewise", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::TestConnection(args)) => {
            let config = load_config(&args, |_| {})?;
            let controller = Controller::with_config(config)?;
            controller.test_connection().await.context("Connection test failed")?;
            Ok(())
        }
        Some(Commands::Translate(args)) => run_translate(args).await,
        None => {
            // Default behavior - a bare path means "translate"
            let input_file = cli.input_file.ok_or_else(|| {
                anyhow!("INPUT_FILE is required when no subcommand is specified")
            })?;
            run_translate(TranslateArgs {
                input_file,
                options: cli.options,
            })
            .await
        }
    }
}

/// Load the configuration file, apply CLI overrides and validate
fn load_config(args: &ConfigArgs, extra: impl FnOnce(&mut Config)) -> Result<Config> {
    if let Some(level) = &args.log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let (mut config, created) = Config::load_or_create(&args.config_path)?;
    if created {
        warn!("Config file not found at '{}', created a default one.", args.config_path);
    }

    if let Some(api_key) = &args.api_key {
        config.api.api_key = api_key.clone();
    }
    if let Some(endpoint) = &args.endpoint {
        config.api.endpoint = endpoint.clone();
    }
    if let Some(model) = &args.model {
        config.api.model = model.clone();
    }
    if let Some(level) = &args.log_level {
        config.log_level = level.clone().into();
    }
    extra(&mut config);

    config.validate().context("Configuration validation failed")?;

    // Config file level applies unless the command line set one
    if args.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }

    Ok(config)
}

async fn run_translate(args: TranslateArgs) -> Result<()> {
    let options = args.options;
    let config = load_config(&options.config, |config| {
        if let Some(source) = &options.source_language {
            config.source_language = source.clone();
        }
        if let Some(target) = &options.target_language {
            config.target_language = target.clone();
        }
        if let Some(batch_size) = options.batch_size {
            config.batch.batch_size = batch_size;
        }
        if let Some(max_concurrent) = options.max_concurrent {
            config.batch.max_concurrent = max_concurrent;
        }
    })?;

    let output_dir = options.output_dir.clone().unwrap_or_else(|| {
        args.input_file
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf()
    });

    let controller = Controller::with_config(config)?;
    match controller.run(args.input_file, output_dir, options.force_overwrite).await? {
        Some(JobOutcome::Completed(summary)) => {
            if let Some(path) = summary.export_path {
                info!("Success: {}", path.display());
            }
            Ok(())
        }
        Some(JobOutcome::Cancelled(_)) => Err(anyhow!("Translation cancelled")),
        None => Ok(()),
    }
}
