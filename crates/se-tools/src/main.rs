//! se-tools entry point

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use se_tools::{EngineKind, ToolConfig, ToolRouter, run_script};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "se-tools")]
#[command(version, about = "Run sketch and feature tool calls from a JSON lines script")]
struct Args {
    /// Script of `{"tool": ..., "args": {...}}` lines (stdin when absent)
    script: Option<PathBuf>,

    /// RON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Engine to run against, overriding the configuration
    #[arg(long, value_enum)]
    engine: Option<EngineKind>,
}

fn main() -> Result<()> {
    // stdout carries result records only
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "se_tools=info,se_cad=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ToolConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ToolConfig::default(),
    };
    if let Some(engine) = args.engine {
        config.engine = engine;
    }

    let mut router = ToolRouter::from_config(&config);
    tracing::info!(engine = router.engine_name(), "Starting tool session");

    let input: Box<dyn BufRead> = match &args.script {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    };

    let processed = run_script(&mut router, input, io::stdout().lock())?;
    tracing::info!(processed, "Tool session finished");
    Ok(())
}
