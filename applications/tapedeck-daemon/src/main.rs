/// Tapedeck - command-driven playback daemon with a persistent event journal
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tapedeck_audio::Mp3DecoderFactory;
use tapedeck_daemon::{health, ingress, open_journal, open_output, DaemonConfig, Engine};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tapedeck")]
#[command(about = "Tapedeck playback daemon", long_about = None)]
struct Cli {
    /// Configuration file path (default: ./tapedeck.toml if present)
    #[arg(short, long, global = true, env = "TAPEDECK_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play the configured tracks, reading commands from stdin
    Run,
    /// Inspect or maintain the event journal
    Journal {
        #[command(subcommand)]
        action: JournalAction,
    },
}

#[derive(Subcommand)]
enum JournalAction {
    /// Print every entry, oldest first
    Dump,
    /// Print every entry and remove them from the journal
    Drain,
    /// Remove every entry
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tapedeck=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = DaemonConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run => run(config).await?,
        Commands::Journal { action } => journal(&config, action)?,
    }

    Ok(())
}

async fn run(config: DaemonConfig) -> anyhow::Result<()> {
    config.validate()?;
    tracing::info!("Starting tapedeck");

    let journal = open_journal(&config)?;
    let (sink, volume) = open_output(&config)?;
    let engine = Engine::start(
        &config,
        Arc::clone(&journal),
        Arc::new(Mp3DecoderFactory),
        sink,
        volume,
    )?;

    let reporter = config
        .health_interval()
        .map(|period| health::spawn(Arc::clone(&journal), period));

    // Blocking stdin reader; it ends with the process
    let commands = engine.sender();
    std::thread::Builder::new()
        .name("tapedeck-stdin".to_string())
        .spawn(move || {
            let stats = ingress::pump(std::io::stdin().lock(), &commands);
            tracing::info!(
                accepted = stats.accepted,
                rejected = stats.rejected,
                "Command input closed"
            );
        })?;

    tracing::info!("Ready, reading commands from stdin (Ctrl+C to quit)");
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    if let Some(reporter) = reporter {
        reporter.abort();
    }
    let stats = tokio::task::spawn_blocking(move || engine.shutdown()).await??;
    tracing::info!(
        failures = stats.track_failures,
        dropped = stats.blocks_dropped,
        "Tapedeck stopped"
    );

    Ok(())
}

fn journal(config: &DaemonConfig, action: JournalAction) -> anyhow::Result<()> {
    let journal = open_journal(config)?;

    match action {
        JournalAction::Dump => {
            println!("{}", journal.to_json()?);
        }
        JournalAction::Drain => {
            let exported: Vec<_> = journal
                .drain()?
                .iter()
                .map(|entry| entry.export_in(&chrono::Local))
                .collect();
            println!("{}", serde_json::to_string_pretty(&exported)?);
            tracing::info!(entries = exported.len(), "Journal drained");
        }
        JournalAction::Clear => {
            let removed = journal.len();
            journal.clear()?;
            tracing::info!(removed, "Journal cleared");
        }
    }

    Ok(())
}
