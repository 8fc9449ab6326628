//! VocabScene - themed vocabulary picture generator
//!
//! CLI entry point for prompt composition, one-shot generation and the
//! interactive chat.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info};

use vocabscene::app::App;
use vocabscene::cli::{Cli, Command, SettingsCommand, get_log_path};
use vocabscene::config::Config;
use vocabscene::job::{GenerationOptions, JobProgress, JobState};
use vocabscene::repl;
use vocabscene::settings::{SecretString, Settings};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_path = get_log_path();
    let log_dir = log_path.parent().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    // Setup logging with priority: CLI > config > INFO default
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    if let Some(source) = cli.catalog {
        debug!(%source, "main: catalog overridden on the command line");
        config.catalog.source = Some(source);
    }
    info!("VocabScene loaded config: base-url={}", config.api.base_url);

    let app = App::load(config, cli.settings).await?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Themes) => cmd_themes(&app),
        Some(Command::Prompt { theme, title }) => cmd_prompt(&app, &theme, &title),
        Some(Command::Generate {
            theme,
            title,
            resolution,
            output_format,
            aspect_ratio,
        }) => {
            let mut options = GenerationOptions::from(&app.settings.snapshot());
            if let Some(v) = resolution {
                options.resolution = v;
            }
            if let Some(v) = output_format {
                options.output_format = v;
            }
            if let Some(v) = aspect_ratio {
                options.aspect_ratio = v;
            }
            cmd_generate(&app, &theme, &title, options).await
        }
        Some(Command::Status { task_id }) => cmd_status(&app, &task_id).await,
        Some(Command::Settings { command }) => cmd_settings(&app, command),
        Some(Command::Chat) | None => {
            debug!("main: launching chat");
            repl::run_interactive(&app).await
        }
    }
}

/// List catalog themes
fn cmd_themes(app: &App) -> Result<()> {
    debug!("cmd_themes: called");
    for theme in app.catalog.themes() {
        println!("{}", theme.name.bold());
        for title in &theme.titles {
            println!("  - {}", title);
        }
    }
    Ok(())
}

/// Print the composed prompt
fn cmd_prompt(app: &App, theme: &str, title: &str) -> Result<()> {
    debug!(%theme, %title, "cmd_prompt: called");
    println!("{}", app.prompts.generate_prompt(theme, title));
    Ok(())
}

/// Submit a job and wait for the image URL
async fn cmd_generate(app: &App, theme: &str, title: &str, options: GenerationOptions) -> Result<()> {
    debug!(%theme, %title, ?options, "cmd_generate: called");
    let prompt = app.prompts.generate_prompt(theme, title);
    let runner = app.runner()?;

    let (tx, mut rx) = mpsc::channel::<JobProgress>(16);
    let printer = tokio::spawn(async move {
        while let Some(progress) = rx.recv().await {
            eprintln!("{}", progress.to_string().dimmed());
        }
    });

    let result = runner.run_to_completion(&prompt, &options, tx).await;
    let _ = printer.await;

    let url = result.context("Generation failed")?;
    println!("{}", url);
    Ok(())
}

/// Poll a task once and report its state
async fn cmd_status(app: &App, task_id: &str) -> Result<()> {
    debug!(%task_id, "cmd_status: called");
    let runner = app.runner()?;
    let status = runner.status(task_id).await.context("Failed to fetch task status")?;

    println!("{}: {}", status.task_id, status.state);
    match status.state {
        JobState::Success => {
            for url in &status.result_urls {
                println!("  {}", url);
            }
        }
        JobState::Fail => {
            println!("  {}", status.fail_msg.as_deref().unwrap_or("Unknown error").red());
        }
        _ => {}
    }
    Ok(())
}

/// Show or update persisted settings
fn cmd_settings(app: &App, command: SettingsCommand) -> Result<()> {
    debug!(?command, "cmd_settings: called");
    match command {
        SettingsCommand::Show => {
            let settings = app.settings.snapshot();
            print_settings(&settings);
            println!("{} {}", "file:".dimmed(), app.settings_path.display());
            Ok(())
        }
        SettingsCommand::Set {
            api_key,
            resolution,
            output_format,
            aspect_ratio,
        } => {
            // Keys taken from the environment are not persisted
            let mut settings = Settings::load(&app.settings_path)?;
            if let Some(v) = api_key {
                settings.api_key = Some(SecretString::new(v));
            }
            if let Some(v) = resolution {
                settings.resolution = v;
            }
            if let Some(v) = output_format {
                settings.output_format = v;
            }
            if let Some(v) = aspect_ratio {
                settings.aspect_ratio = v;
            }
            settings.save(&app.settings_path)?;
            app.settings.replace(settings.clone());
            println!("{} settings saved", "✓".green());
            print_settings(&settings);
            Ok(())
        }
    }
}

fn print_settings(settings: &Settings) {
    let key = if settings.has_credential() { "set" } else { "not set" };
    println!("api-key:       {}", key);
    println!("resolution:    {}", settings.resolution);
    println!("output-format: {}", settings.output_format);
    println!("aspect-ratio:  {}", settings.aspect_ratio);
}
