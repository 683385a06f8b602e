//! Tercüman - English to Turkish news translation
//!
//! Command-line entry point: one-off translations and summaries, batch files,
//! validator checks and the HTTP server.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tercuman::cli::{Args, Commands};
use tercuman::config::Config;
use tercuman::server;
use tercuman::service::TranslationService;
use tercuman::validate::{ValidationVerdict, Validator};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(args.verbose)?;

    if let Commands::ConfigInit { output, force } = &args.command {
        return write_default_config(output, *force);
    }

    let config = Config::load(args.config.as_deref())?.with_env_credentials();

    match args.command {
        Commands::Translate { text, file, target, strict } => {
            let raw = read_input(text, file.as_deref())?;
            let service = TranslationService::from_config(&config)?;

            if strict {
                match service.translate_for_endpoint(&raw).await {
                    Ok(translation) => println!("{}", translation),
                    Err(failure) => {
                        eprintln!("{}", failure.translation);
                        anyhow::bail!("Translation failed: {}", failure.error);
                    }
                }
            } else {
                let target = target.unwrap_or(config.pipeline.target_language);
                println!("{}", service.translate_text_to(&raw, target).await);
            }
        }
        Commands::Summarize { title, content, content_file } => {
            let content = match (content, content_file) {
                (Some(content), _) => content,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                (None, None) => String::new(),
            };
            let service = TranslationService::from_config(&config)?;
            let result = service.summarize_and_translate(&title, &content).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Batch { input, output } => {
            let content = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let texts = parse_batch_input(&content);

            let service = TranslationService::from_config(&config)?;

            let spinner = ProgressBar::new_spinner();
            spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]")?);
            spinner.set_message(format!("Translating {} item(s)", texts.len()));
            spinner.enable_steady_tick(Duration::from_millis(120));

            let translations = service.translate_batch(&texts).await;
            spinner.finish_with_message(format!("Translated {} item(s)", translations.len()));

            let json = serde_json::to_string_pretty(&translations)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    info!("Batch output written to {}", path.display());
                }
                None => println!("{}", json),
            }
        }
        Commands::Validate { text, target } => {
            let validator = Validator::load(config.validation.rules_path.as_deref())?;
            match validator.validate(&text, target) {
                ValidationVerdict::Accepted(kept) => println!("accepted: {}", kept),
                ValidationVerdict::Rejected(reason) => anyhow::bail!("rejected: {}", reason),
            }
        }
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            let service = Arc::new(TranslationService::from_config(&config)?);
            server::serve(service, &bind).await?;
        }
        Commands::ConfigInit { .. } => unreachable!("handled before configuration is loaded"),
    }

    Ok(())
}

/// Text from the positional argument, a file, or stdin
fn read_input(text: Option<String>, file: Option<&Path>) -> Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }
    if let Some(path) = file {
        return std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()));
    }
    let mut buffer = String::new();
    std::io::Read::read_to_string(&mut std::io::stdin(), &mut buffer)?;
    Ok(buffer)
}

/// A JSON array of strings, or else one item per non-empty line
fn parse_batch_input(content: &str) -> Vec<String> {
    match serde_json::from_str::<Vec<String>>(content) {
        Ok(items) => items,
        Err(_) => content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect(),
    }
}

fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists, pass --force to overwrite", path.display());
    }
    Config::default().save_to_file(path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".tercuman").join("log");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = rolling::daily(&log_dir, "tercuman.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    // Console output goes to stderr so stdout stays clean for results
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        "Logging initialized - console: {}, file: {}",
        log_level,
        log_dir.join("tercuman.log").display()
    );

    Ok(())
}
