//! DeployFast - Entry point
//!
//! Parses CLI arguments, loads the configuration, connects to the remote
//! host, runs one script workflow and closes the connection.

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use deployfast::config::{Args, Command, Config};
use deployfast::runner::{ExecutionOutcome, ScriptRunner};
use deployfast::ssh::{CredentialProvider, Session, StaticCredential, TerminalPrompt};

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout carries the script's output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = Config::from_args(&args)?;
    let (job, policy) = config.job_for(&args.command)?;

    info!("DeployFast v{} starting...", env!("CARGO_PKG_VERSION"));
    if let Some(source) = &config.source {
        info!("Using configuration from {}", source.display());
    }
    if let Some(app) = &config.app_name {
        info!(
            "Application: {}{}",
            app,
            config
                .repository
                .as_deref()
                .map(|r| format!(" ({})", r))
                .unwrap_or_default()
        );
    }

    let credentials: Box<dyn CredentialProvider> = match &config.password {
        Some(password) => Box::new(StaticCredential::new(password.clone())),
        None => Box::new(TerminalPrompt),
    };

    let session = Session::connect(config.ssh_config(), credentials.as_ref())
        .await
        .context("Failed to create SSH client")?;

    let result = ScriptRunner::new(&session).run(&job, policy).await;
    session.close().await;

    let what = match &args.command {
        Command::Provision { .. } => "provision script".to_string(),
        Command::Run { script, .. } => format!("script {}", script.display()),
    };
    let report = result.with_context(|| format!("Failed to run {}", what))?;

    if let ExecutionOutcome::Collected(output) = &report.outcome {
        print!("{}", output.combined_output());
    }
    if let Some(warning) = &report.cleanup_warning {
        warn!("{}", warning);
    }

    println!("{} executed successfully", capitalize(&what));
    Ok(())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
