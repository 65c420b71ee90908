//! termagent - tool execution engine for a terminal AI agent
//!
//! CLI entry point: list the tool catalog, run a single tool, or replay a
//! recorded turn through the dispatch loop.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{info, warn};

use termagent::agent::{ConsoleObserver, DispatchLoop, ScriptedSession, TurnOutcome};
use termagent::cli::{Cli, Command, OutputFormat, get_log_path};
use termagent::config::Config;
use termagent::confirm::ConfirmationGate;
use termagent::tools::{ToolContext, ToolInvocation, ToolProfile, ToolRegistry};

fn setup_logging(debug_enabled: bool) -> Result<()> {
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Setup tracing subscriber - write to log file, not stdout/stderr
    let level = if debug_enabled { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!(debug = debug_enabled, "Logging initialized");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration, then let flags win
    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.debug |= cli.debug;
    config.auto_approve |= cli.yolo;
    config.validate().context("Invalid configuration")?;

    setup_logging(config.debug).context("Failed to setup logging")?;
    info!(
        "termagent loaded config: profile={:?}, max_steps={}, auto_approve={}",
        config.agent.profile, config.agent.max_steps, config.auto_approve
    );

    let cwd = std::env::current_dir().context("Failed to determine working directory")?;
    let gate = ConfirmationGate::new(config.auto_approve);
    let ctx = ToolContext::from_config(cwd, &config, gate);

    match cli.command {
        Command::Tools { read_only, format } => {
            let profile = if read_only {
                ToolProfile::ReadOnly
            } else {
                config.agent.profile.into()
            };
            cmd_tools(&ToolRegistry::with_profile(profile), format)
        }
        Command::Exec { tool, args } => {
            cmd_exec(&ToolRegistry::with_profile(config.agent.profile.into()), &ctx, tool, &args).await
        }
        Command::Replay { script, max_steps } => {
            let registry = Arc::new(ToolRegistry::with_profile(config.agent.profile.into()));
            cmd_replay(registry, ctx, script, max_steps.unwrap_or(config.agent.max_steps)).await
        }
    }
}

fn cmd_tools(registry: &ToolRegistry, format: OutputFormat) -> Result<()> {
    let definitions = registry.definitions();
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&definitions)?);
        }
        OutputFormat::Text => {
            for def in definitions {
                let summary = def.description.lines().next().unwrap_or_default();
                println!("{:<16} {}", def.name.bold(), summary);
            }
        }
    }
    Ok(())
}

async fn cmd_exec(registry: &ToolRegistry, ctx: &ToolContext, tool: String, args: &str) -> Result<()> {
    let input: serde_json::Value = serde_json::from_str(args).context("Tool arguments must be valid JSON")?;
    let call = ToolInvocation::new(tool, input);
    info!("Executing {} ({})", call.name, call.id);

    let result = registry.dispatch(&call, ctx).await;
    println!("{}", serde_json::to_string_pretty(&result.payload)?);
    if let Some(line) = registry.render(&call.name, &result) {
        eprintln!("{}", line);
    }

    if result.is_error {
        std::process::exit(1);
    }
    Ok(())
}

async fn cmd_replay(registry: Arc<ToolRegistry>, ctx: ToolContext, script: PathBuf, max_steps: u32) -> Result<()> {
    let content =
        fs::read_to_string(&script).context(format!("Failed to read script {}", script.display()))?;
    let mut session = ScriptedSession::from_json(&content).context("Failed to parse model events")?;

    let dispatch = DispatchLoop::new(registry, ctx, max_steps)?.with_observer(Arc::new(ConsoleObserver));

    // Ctrl-C cancels the turn between events
    let cancel = dispatch.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling turn");
            cancel.cancel();
        }
    });

    let report = dispatch.run_turn(&mut session).await?;
    println!();
    match report.outcome {
        TurnOutcome::Completed => {
            println!("{} ({} tool call(s))", "✓ Turn complete".green(), report.rounds);
        }
        TurnOutcome::Cancelled => {
            println!("{}", "⚠ Turn cancelled".yellow());
        }
        TurnOutcome::StepLimitExceeded { limit } => {
            println!("{}", format!("✗ Step limit ({}) exceeded", limit).red());
            std::process::exit(1);
        }
        TurnOutcome::ModelError(message) => {
            println!("{} {}", "✗ Model error:".red(), message);
            std::process::exit(1);
        }
    }
    Ok(())
}

