use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use check_trigger::{
    AgentProcessExecutor, CompletionEvaluator, Config, DeduplicationGate, GitHubClient,
    InboundEvent, ReviewLifecycleLabeler, ReviewTriggerOrchestrator,
};

#[derive(Parser)]
#[command(name = "check-trigger")]
#[command(about = "Check-completion review trigger for automated PR reviews")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(long, default_value = ".check-trigger/config.yml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Handle one completion event
    Handle {
        /// Repository (owner/repo)
        #[arg(long)]
        repo: String,

        /// Path to the event JSON (or read from stdin if not provided)
        #[arg(long)]
        event_file: Option<PathBuf>,
    },

    /// Dry-run the readiness evaluation for a revision
    Evaluate {
        /// Repository (owner/repo)
        #[arg(long)]
        repo: String,

        /// Revision (commit SHA) to evaluate
        #[arg(long)]
        revision: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("check_trigger=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)?;
    config.apply_env()?;

    match cli.command {
        Commands::Handle { repo, event_file } => {
            run_handle(config, &repo, event_file).await?;
        }
        Commands::Evaluate { repo, revision } => {
            run_evaluate(config, &repo, &revision).await?;
        }
    }

    Ok(())
}

async fn run_handle(config: Config, repo: &str, event_file: Option<PathBuf>) -> Result<()> {
    // Fail fast on inconsistent trigger settings
    let mode = config.trigger_mode()?;

    let raw = match event_file {
        Some(path) => fs::read_to_string(&path)
            .with_context(|| format!("Failed to read event file: {}", path.display()))?,
        None => {
            use std::io::Read;
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read event from stdin")?;
            buffer
        }
    };

    let event = InboundEvent::parse(&raw)?;

    let token = std::env::var("GITHUB_TOKEN").context("GITHUB_TOKEN not set")?;
    let github = GitHubClient::new(&token)?;

    let gate = Arc::new(DeduplicationGate::new(config.gate_ttl()));
    let sweeper = Arc::clone(&gate).spawn_sweeper(config.sweep_interval());

    let orchestrator = ReviewTriggerOrchestrator::new(
        CompletionEvaluator::new(github.clone(), &config),
        ReviewLifecycleLabeler::new(github.clone()),
        AgentProcessExecutor::new(&config.executor),
        github.clone(),
        github,
        Arc::clone(&gate),
        mode,
    );

    let outcomes = orchestrator.handle(repo, &event).await;
    sweeper.abort();

    println!("{}", serde_json::to_string_pretty(&outcomes)?);

    Ok(())
}

async fn run_evaluate(mut config: Config, repo: &str, revision: &str) -> Result<()> {
    // No point debouncing an operator-initiated dry run
    config.timeouts.debounce_delay_ms = 0;

    let token = std::env::var("GITHUB_TOKEN").context("GITHUB_TOKEN not set")?;
    let github = GitHubClient::new(&token)?;

    let evaluator = CompletionEvaluator::new(github, &config);

    let classified = evaluator.inspect(repo, revision).await?;
    if classified.is_empty() {
        println!("No check suites reported for {}", revision);
        return Ok(());
    }

    println!("Check suites for {}:\n", revision);
    for (suite, class) in &classified {
        println!(
            "  #{} {} status={:?} conclusion={:?} -> {}",
            suite.id, suite.origin_app, suite.status, suite.conclusion, class
        );
    }

    let ready = evaluator.evaluate(repo, revision).await?;
    info!(repo, revision, ready, "Evaluation complete");
    println!("\nReview-ready: {}", ready);

    Ok(())
}
