/// platform-statectl - Operator CLI for the audio HAL platform state
use anyhow::Context;
use audio_hal_core::{LoopbackRouteConnector, LoopbackStreamInterface};
use audio_platform_state::{
    diagnostics::dump_files, PlatformState, PlatformStateError, PlatformStateSettings,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "platform-statectl")]
#[command(about = "Inspect and exercise audio HAL platform state configurations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a configuration and print the resulting state
    Check {
        /// HAL configuration file
        #[arg(short, long)]
        conf: PathBuf,
        /// Settings file (TOML)
        #[arg(short, long)]
        settings: Option<PathBuf>,
    },
    /// Apply parameter strings in order and print the outcome
    Apply {
        /// HAL configuration file
        #[arg(short, long)]
        conf: PathBuf,
        /// Settings file (TOML)
        #[arg(short, long)]
        settings: Option<PathBuf>,
        /// Request synchronous routing reconsideration
        #[arg(long)]
        sync: bool,
        /// Parameter strings, e.g. "mode=InCall;mic_mute=true"
        #[arg(required = true)]
        pairs: Vec<String>,
    },
    /// Stream diagnostic files to the error log
    Dump {
        /// Settings file (TOML)
        #[arg(short, long)]
        settings: Option<PathBuf>,
        /// Files to dump
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

/// Outcome of the `apply` command
#[derive(Debug, Serialize)]
struct ApplyReport {
    parameters: String,
    rejected: usize,
    commits: usize,
    notifications: usize,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "audio_platform_state=info,platform_statectl=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check { conf, settings } => {
            let settings = PlatformStateSettings::load(settings.as_deref())?;
            let (_, _, state) = open(settings, &conf)?;
            println!("{}", serde_json::to_string_pretty(&state.snapshot())?);
        }
        Commands::Apply {
            conf,
            settings,
            sync,
            pairs,
        } => {
            let settings = PlatformStateSettings::load(settings.as_deref())?;
            let report = apply(settings, &conf, &pairs, sync)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Dump { settings, files } => {
            let settings = PlatformStateSettings::load(settings.as_deref())?;
            let report = dump_files(&files, settings.debug_chunk_size);
            println!("{}", serde_json::to_string_pretty(&report)?);
            if report.dumped.is_empty() {
                anyhow::bail!("none of the {} file(s) could be opened", files.len());
            }
        }
    }

    Ok(())
}

type Engine = (
    Arc<LoopbackStreamInterface>,
    Arc<LoopbackRouteConnector>,
    PlatformState,
);

fn open(settings: PlatformStateSettings, conf: &Path) -> anyhow::Result<Engine> {
    let stream = Arc::new(LoopbackStreamInterface::new());
    let connector = Arc::new(LoopbackRouteConnector::new(settings.route_conf_path()));
    let state = PlatformState::from_conf_file(settings, conf, stream.clone(), connector.clone())
        .with_context(|| format!("loading {}", conf.display()))?;
    state.start()?;
    Ok((stream, connector, state))
}

fn apply(
    settings: PlatformStateSettings,
    conf: &Path,
    pairs: &[String],
    synchronous: bool,
) -> anyhow::Result<ApplyReport> {
    let (stream, connector, state) = open(settings, conf)?;

    let mut rejected = 0;
    for text in pairs {
        match state.set_parameters(text, synchronous) {
            Ok(()) => {}
            Err(PlatformStateError::BadValue { count }) => {
                tracing::warn!("{}: {} value(s) rejected", text, count);
                rejected += count;
            }
            Err(e) => return Err(e.into()),
        }
    }

    let keys = state.keys().join(";");
    Ok(ApplyReport {
        parameters: state.get_parameters(&keys),
        rejected,
        commits: connector.apply_count(),
        notifications: stream.reconsider_count(),
    })
}
