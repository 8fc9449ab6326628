//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// VocabScene - themed vocabulary picture generator
#[derive(Parser)]
#[command(
    name = "vs",
    about = "Compose themed vocabulary scene prompts and generate pictures",
    version = env!("CARGO_PKG_VERSION"),
    after_help = generate_after_help(),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Path to settings file
    #[arg(short, long, global = true, help = "Path to settings file")]
    pub settings: Option<PathBuf>,

    /// Vocabulary catalog file or URL, overrides the config
    #[arg(long, global = true, value_name = "PATH|URL")]
    pub catalog: Option<String>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List themes and their suggested titles
    Themes,

    /// Print the scene prompt for a theme and title
    Prompt {
        /// Theme or scenario, e.g. 超市
        theme: String,

        /// Picture title
        title: String,
    },

    /// Generate a picture and print its URL
    Generate {
        /// Theme or scenario, e.g. 超市
        theme: String,

        /// Picture title
        title: String,

        /// Resolution tag for this job only
        #[arg(long)]
        resolution: Option<String>,

        /// Output format for this job only
        #[arg(long)]
        output_format: Option<String>,

        /// Aspect ratio for this job only
        #[arg(long)]
        aspect_ratio: Option<String>,
    },

    /// Poll a generation task once
    Status {
        /// Remote task id
        task_id: String,
    },

    /// Show or change persisted settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },

    /// Interactive theme → title → picture chat (default)
    Chat,
}

/// Settings subcommands
#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// Print current settings (the API key is redacted)
    Show,

    /// Update settings; omitted values are kept
    Set {
        /// API key for the image service
        #[arg(long)]
        api_key: Option<String>,

        /// Resolution tag, e.g. 1K, 2K, 4K
        #[arg(long)]
        resolution: Option<String>,

        /// Output format, e.g. png, jpg
        #[arg(long)]
        output_format: Option<String>,

        /// Aspect ratio, e.g. 3:4, 1:1
        #[arg(long)]
        aspect_ratio: Option<String>,
    },
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vocabscene")
        .join("logs")
        .join("vocabscene.log");
    debug!(?path, "get_log_path: returning path");
    path
}

/// Generate the after_help text
pub fn generate_after_help() -> String {
    format!("Logs are written to: {}\n", get_log_path().display())
}
