// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, debug, error, warn};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use linguawave::app_config::Config;
use linguawave::app_controller::Controller;
use linguawave::server;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Address to bind (overrides server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides server.port)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Generate shell completions for linguawave
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// LinguaWave - speech translation pipeline
///
/// Transcribes an audio file, translates the transcript and speaks the
/// translation back as a single MP3 file.
#[derive(Parser, Debug)]
#[command(name = "linguawave")]
#[command(version)]
#[command(about = "Transcribe, translate and re-voice audio")]
#[command(long_about = "LinguaWave transcribes an audio file, translates the transcript and synthesizes the translation as speech.

EXAMPLES:
    linguawave talk.wav                          # Spanish audio in translated_audio.mp3
    linguawave talk.wav -l fr -o talk_fr.mp3     # French audio in talk_fr.mp3
    linguawave -v talk.wav                       # Debug logging, no spinner
    linguawave serve --port 9000                 # Run the HTTP API
    linguawave completions bash > linguawave.bash

CONFIGURATION:
    Configuration is stored in linguawave.json by default. You can specify a
    different file with --config-path. If the file doesn't exist, a default one
    is created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input audio file
    #[arg(value_name = "INPUT_FILE")]
    input_file: Option<PathBuf>,

    /// Output audio file
    #[arg(short, long, default_value = "translated_audio.mp3")]
    output: PathBuf,

    /// Target language code (e.g., 'es', 'fr', 'pt-BR'); defaults to the configured target_language
    #[arg(short, long)]
    language: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, env = "LINGUAWAVE_CONFIG", default_value = "linguawave.json")]
    config_path: PathBuf,
}

// @struct: Custom logger implementation
struct CustomLogger;

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        // Filtering goes through log::max_level so the level can change after init
        log::set_boxed_logger(Box::new(CustomLogger))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour and marker for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "❌ "),
            Level::Warn => ("\x1B[1;33m", "🚧 "),
            Level::Info => ("\x1B[1;32m", " "),
            Level::Debug => ("\x1B[1;36m", "🔍 "),
            Level::Trace => ("\x1B[1;35m", "📋 "),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (colour, marker) = Self::style_for_level(record.level());
            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {} {}\x1B[0m", colour, now, marker, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = CustomLogger::init(LevelFilter::Info) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    let cli = CommandLineOptions::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: CommandLineOptions) -> Result<()> {
    if let Some(Commands::Completions { shell }) = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "linguawave", &mut std::io::stdout());
        return Ok(());
    }

    let mut config = load_or_create_config(&cli.config_path)?;
    if config.transcription.api_key.is_empty() {
        if let Ok(api_key) = std::env::var("OPENAI_API_KEY") {
            config.transcription.api_key = api_key;
        }
    }
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        config.log_level.to_level_filter()
    };
    log::set_max_level(level);
    config.validate().context("Invalid configuration")?;

    match cli.command {
        Some(Commands::Serve { host, port }) => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            server::serve(&config, &host, port).await
        }
        Some(Commands::Completions { .. }) => Ok(()),
        None => {
            let input_file = cli
                .input_file
                .ok_or_else(|| anyhow!("INPUT_FILE is required when no subcommand is specified"))?;
            let target_language = cli.language.unwrap_or_else(|| config.target_language.clone());

            let controller = Controller::with_config(config)?;
            controller
                .run(input_file, cli.output, &target_language, !cli.verbose)
                .await?;
            Ok(())
        }
    }
}

fn load_or_create_config(config_path: &Path) -> Result<Config> {
    if config_path.exists() {
        debug!("Loading config from {}", config_path.display());
        return Config::load(config_path);
    }

    warn!("Config file not found at '{}', creating default config.", config_path.display());
    let config = Config::default();
    if let Err(e) = config.save(config_path) {
        warn!("Could not write default config: {:#}", e);
    }
    Ok(config)
}
