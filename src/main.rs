use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::{LevelFilter, info};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use parsegen::domain::{AttemptOutcome, RunReport, RunState, Target, TargetPaths};
use parsegen::llm::{Credentials, LlmClient, build_client};
use parsegen::prompt::PromptRenderer;
use parsegen::runner::GenerationLoop;
use parsegen::sandbox::SubprocessExecutor;

mod cli;
mod config;

use cli::Cli;
use config::Config;

/// Log to stderr. Dependencies stay at warn; our own level is set once config is known.
fn setup_logging() {
    let mut builder = env_logger::Builder::new();
    builder
        .target(env_logger::Target::Stderr)
        .format_timestamp_millis();

    match std::env::var("RUST_LOG") {
        Ok(filters) => {
            builder.parse_filters(&filters);
        }
        Err(_) => {
            builder
                .filter_level(LevelFilter::Warn)
                .filter_module(env!("CARGO_CRATE_NAME"), LevelFilter::Trace);
        }
    }

    builder.init();
}

/// `RUST_LOG` wins, then `-v`, then the config file
fn apply_log_level(cli: &Cli, config: &Config) {
    if std::env::var_os("RUST_LOG").is_some() {
        return;
    }
    let level = if cli.is_verbose() {
        LevelFilter::Debug
    } else {
        config
            .log_level
            .as_deref()
            .and_then(|l| LevelFilter::from_str(l).ok())
            .unwrap_or(LevelFilter::Info)
    };
    log::set_max_level(level);
}

fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    if let Some(max_attempts) = cli.max_attempts {
        config.generation.max_attempts = max_attempts;
    }
    if let Some(root) = &cli.root {
        config.paths.root = root.clone();
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

async fn run_application(cli: &Cli, config: &Config) -> Result<RunReport> {
    let target = Target::new(cli.target.as_str()).context("Invalid target")?;

    let credentials =
        Credentials::from_env(config.llm.provider).context("Generator credential missing")?;

    let executor = SubprocessExecutor::new(config.sandbox.subprocess_config(target.as_str()));
    let interpreter = executor
        .check_interpreter()
        .context("Parser interpreter unavailable")?;
    info!("Using interpreter {}", interpreter.display());

    let renderer = match &config.prompt.template_path {
        Some(path) => PromptRenderer::from_path(path),
        None => PromptRenderer::new(),
    }
    .context("Failed to prepare prompt template")?;

    let client = build_client(credentials, config.llm.client_config())
        .context("Failed to build generator client")?;
    if !client.is_ready() {
        eyre::bail!("Generator client for {} is not ready", config.llm.provider);
    }
    info!("Generator: {} ({})", config.llm.provider, client.model());

    let paths = TargetPaths::new(
        &config.paths.root,
        &target,
        &config.paths.document_ext,
        &config.paths.source_ext,
    );

    let runner = GenerationLoop::with_config(
        client.clone(),
        Arc::new(executor),
        renderer,
        target,
        paths,
        config.loop_config(),
    );
    let report = runner.run().await;
    log_usage(client.as_ref());
    Ok(report)
}

fn log_usage(client: &dyn LlmClient) {
    let usage = client.usage();
    info!(
        "Generator usage for {}: {} tokens ({} input, {} output)",
        client.model(),
        usage.total(),
        usage.input_tokens,
        usage.output_tokens
    );
}

fn print_summary(report: &RunReport) {
    println!();
    match &report.state {
        RunState::Succeeded(attempt) => {
            println!(
                "{} parser for '{}' accepted on attempt {}/{}",
                "Success:".green().bold(),
                report.target,
                attempt,
                report.max_attempts
            );
            if let Some(artifact) = &report.artifact {
                println!("  parser: {}", artifact.parser.display());
                println!("  output: {}", artifact.output.display());
            }
        }
        RunState::Exhausted => {
            println!(
                "{} all {} attempts failed for '{}'; no parser saved",
                "Exhausted:".yellow().bold(),
                report.max_attempts,
                report.target
            );
        }
        RunState::Failed(reason) => {
            println!("{} {}", "Failed:".red().bold(), reason);
        }
        other => {
            println!("{} run ended in state {:?}", "Warning:".yellow(), other);
        }
    }

    for attempt in &report.attempts {
        let outcome = match attempt.outcome {
            AttemptOutcome::Success => attempt.outcome.to_string().green(),
            AttemptOutcome::Mismatch => attempt.outcome.to_string().yellow(),
            AttemptOutcome::ExecutionFailure => attempt.outcome.to_string().red(),
        };
        let digest = attempt.code_digest.as_deref().unwrap_or("-");
        let headline = attempt.diagnostic.lines().next().unwrap_or("");
        println!(
            "  #{} {} [{}] {}ms {}",
            attempt.ordinal,
            outcome,
            digest.dimmed(),
            attempt.elapsed_ms,
            headline
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging();

    let config = resolve_config(&cli)?;
    apply_log_level(&cli, &config);
    info!("Starting with config from: {:?}", cli.config);

    let report = run_application(&cli, &config)
        .await
        .context("Application failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?
        );
    } else {
        print_summary(&report);
    }

    // No artifact is the signal for Failed and Exhausted; the exit status stays 0
    Ok(())
}
