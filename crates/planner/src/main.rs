use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::de::DeserializeOwned;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use types::{PlannerConfig, PlanningInput};

/// Plans exam slots, rooms and invigilations for one semester.
#[derive(Parser, Debug)]
#[command(name = "planner", version)]
struct Args {
    /// Planning input document (JSON).
    #[arg(required_unless_present = "schema")]
    input: Option<PathBuf>,

    /// Planner configuration (JSON); defaults apply when absent.
    #[arg(env = "EXAMPLAN__CONFIG")]
    config: Option<PathBuf>,

    /// Print the JSON Schemas of the input and configuration documents.
    #[arg(long, conflicts_with = "input")]
    schema: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .init();

    let args = Args::parse();

    if args.schema {
        let schemas = serde_json::json!({
            "input": schemars::schema_for!(PlanningInput),
            "config": schemars::schema_for!(PlannerConfig),
        });
        return emit(&schemas);
    }

    let Some(input_path) = args.input else {
        bail!("an input document is required");
    };
    let input: PlanningInput = read_json(&input_path)?;
    let cfg: PlannerConfig = match &args.config {
        Some(path) => read_json(path)?,
        None => PlannerConfig::default(),
    };
    tracing::info!(
        input = %input_path.display(),
        seed = cfg.ga.seed,
        runs = cfg.ga.runs,
        "planning"
    );

    let outcome = planner::run(&input, &cfg).context("planning failed")?;
    emit(&outcome)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn emit<T: serde::Serialize>(value: &T) -> Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value).context("writing result")?;
    writeln!(out).context("writing result")?;
    Ok(())
}
