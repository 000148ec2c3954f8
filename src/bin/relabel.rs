//! Assign synthetic confidence tiers to a CSV dataset

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use geovision_api::relabel::{relabel_file, DEFAULT_SEED};

#[derive(Debug, Parser)]
#[command(name = "relabel", version, about = "Add confidence/color tiers (10% red, 20% yellow, 70% green) to a CSV")]
struct Args {
    /// Input CSV with a header row
    #[arg(short, long, default_value = "data.csv")]
    input: PathBuf,

    /// Where to write the relabelled CSV
    #[arg(short, long, default_value = "data_modified.csv")]
    output: PathBuf,

    /// Shuffle seed
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relabel=info,geovision_api=info".into()),
        )
        .init();

    let args = Args::parse();

    let counts = relabel_file(&args.input, &args.output, args.seed)
        .with_context(|| format!("failed to relabel {}", args.input.display()))?;

    tracing::info!(
        "Wrote {} rows to {}: {} red, {} yellow, {} green",
        counts.total(),
        args.output.display(),
        counts.red,
        counts.yellow,
        counts.green
    );

    Ok(())
}
