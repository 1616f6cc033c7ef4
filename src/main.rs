// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{error, info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};

use paratrans::app_config::{self, Config, TranslationProvider};
use paratrans::app_controller::Controller;
use paratrans::document_sink::OutputFormat;
use paratrans::errors::AppError;
use paratrans::language_utils;
use paratrans::reflow::BlankRendering;

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    Ollama,
    #[value(name = "openai")]
    OpenAI,
    Anthropic,
    #[value(name = "lmstudio")]
    LMStudio,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Ollama => TranslationProvider::Ollama,
            CliTranslationProvider::OpenAI => TranslationProvider::OpenAI,
            CliTranslationProvider::Anthropic => TranslationProvider::Anthropic,
            CliTranslationProvider::LMStudio => TranslationProvider::LMStudio,
        }
    }
}

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

#[derive(Debug, Clone, ValueEnum)]
enum CliOutputFormat {
    Text,
    Markdown,
    Json,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(cli_format: CliOutputFormat) -> Self {
        match cli_format {
            CliOutputFormat::Text => OutputFormat::Text,
            CliOutputFormat::Markdown => OutputFormat::Markdown,
            CliOutputFormat::Json => OutputFormat::Json,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate shell completions for paratrans
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// paratrans - paragraph-preserving document translation with AI
///
/// Re-flows hard-wrapped text extracted from paginated documents into
/// paragraphs, translates them in bounded chunks and rebuilds the pages.
#[derive(Parser, Debug)]
#[command(name = "paratrans")]
#[command(version)]
#[command(about = "Paragraph-preserving document translation with AI providers")]
#[command(long_about = "paratrans reads text dumps of paginated documents (pages separated by form feeds), \
merges wrapped lines into paragraphs, translates them in bounded chunks and writes the translated document.

EXAMPLES:
    paratrans report.txt                          # Translate using default config
    paratrans -f report.txt                       # Force overwrite existing files
    paratrans -p openai -m gpt-4o report.txt      # Use specific provider and model
    paratrans -s fr -t en report.txt              # Translate from French to English
    paratrans --format markdown -o out/ report.txt
    paratrans --dry-run --preview report.txt      # Run the pipeline without a provider
    paratrans --log-level debug /documents/       # Process an entire directory
    paratrans -p lmstudio --test-connection       # Check the provider is reachable
    paratrans completions bash > paratrans.bash   # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. If the config file doesn't
    exist, a default one will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input text dump or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Output directory (defaults to the input's directory)
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// API key for remote providers
    #[arg(long, env = "PARATRANS_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Source language code (e.g., 'auto', 'en', 'fr')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Output document format
    #[arg(long, value_enum)]
    format: Option<CliOutputFormat>,

    /// Maximum characters per translation request
    #[arg(long)]
    max_chunk_size: Option<usize>,

    /// Pause between translation requests in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Render blank lines as empty paragraphs instead of dropping them
    #[arg(long)]
    keep_blank_lines: bool,

    /// Run the whole pipeline without calling a provider
    #[arg(long)]
    dry_run: bool,

    /// Print source and translated previews after translating a single file
    #[arg(long)]
    preview: bool,

    /// Disable progress bars
    #[arg(long)]
    no_progress: bool,

    /// Check the configured provider can be reached, then exit
    #[arg(long)]
    test_connection: bool,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger::new(level)))?;
        log::set_max_level(level);
        Ok(())
    }

    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌",
            Level::Warn => "🚧",
            Level::Info => " ",
            Level::Debug => "🔍",
            Level::Trace => "📋",
        }
    }

    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let now = chrono::Local::now().format("%H:%M:%S.%3f");
        let mut stderr = std::io::stderr();
        let _ = writeln!(
            stderr,
            "{}{} {} {}\x1B[0m",
            Self::get_color_for_level(record.level()),
            now,
            Self::get_emoji_for_level(record.level()),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The logger accepts everything, the effective level is set through max_level
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Some(Commands::Completions { shell }) = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "paratrans", &mut std::io::stdout());
        return Ok(());
    }

    if let Err(e) = run_translate(cli).await {
        error!("{:#}", e);
        std::process::exit(AppError::from(e).exit_code());
    }

    Ok(())
}

fn load_config(options: &CommandLineOptions) -> Result<Config> {
    let config_path = Path::new(&options.config_path);

    let mut config = if config_path.exists() {
        Config::from_file(config_path)?
    } else {
        warn!("Config file not found at '{}', creating default config.", options.config_path);
        let config = Config::default();
        config.save(config_path)?;
        config
    };

    // Override config with CLI options if provided
    if let Some(provider) = &options.provider {
        config.translation.provider = provider.clone().into();
    }
    if let Some(model) = &options.model {
        config.translation.active_provider_config_mut().model = model.clone();
    }
    if let Some(api_key) = &options.api_key {
        config.translation.active_provider_config_mut().api_key = api_key.clone();
    }
    if let Some(source_lang) = &options.source_language {
        config.source_language = source_lang.clone();
    }
    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }
    if let Some(format) = &options.format {
        config.output_format = format.clone().into();
    }
    if let Some(max_chunk_size) = options.max_chunk_size {
        config.reflow.max_chunk_size = max_chunk_size;
    }
    if let Some(delay_ms) = options.delay_ms {
        config.reflow.inter_call_delay_ms = delay_ms;
    }
    if options.keep_blank_lines {
        config.reflow.blank_rendering = BlankRendering::EmptyParagraph;
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    Ok(config)
}

async fn run_translate(options: CommandLineOptions) -> Result<()> {
    let config = load_config(&options)?;
    log::set_max_level(config.log_level.to_level_filter());

    let controller = if options.dry_run {
        language_utils::validate_source_language(&config.source_language)?;
        language_utils::validate_target_language(&config.target_language)?;
        info!("Dry run: chunks are passed through unchanged");
        Controller::dry_run(config)
    } else {
        config.validate()?;
        info!(
            "Translating {} -> {} with {} ({})",
            config.source_language,
            language_utils::describe_language(&config.target_language),
            config.translation.provider.display_name(),
            config.translation.get_model()
        );
        Controller::with_config(config)?
    };
    let controller = controller.with_progress(!options.no_progress);

    if options.test_connection {
        controller.test_connection().await?;
        println!("Connection OK");
        return Ok(());
    }

    let input_path = options.input_path.clone().ok_or_else(|| {
        anyhow!("INPUT_PATH is required when no subcommand is specified")
    })?;

    if input_path.is_file() {
        let output_dir = options.output_dir.clone().unwrap_or_else(|| {
            input_path.parent().unwrap_or(Path::new(".")).to_path_buf()
        });

        if let Some(report) = controller.run(input_path, output_dir, options.force_overwrite).await? {
            info!("Success: {:?} (run {})", report.output_path, report.output.run_id);
            if options.preview {
                println!("===== SOURCE =====\n{}\n", report.output.preview.original);
                println!("===== TRANSLATED =====\n{}", report.output.preview.translated);
            }
        }
    } else if input_path.is_dir() {
        if options.output_dir.is_some() {
            warn!("--output-dir is ignored in folder mode, translations are written next to their sources");
        }
        let summary = controller.run_folder(input_path, options.force_overwrite).await?;
        if summary.failed > 0 {
            return Err(anyhow!("{} document(s) failed to translate", summary.failed));
        }
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", input_path));
    }

    Ok(())
}
