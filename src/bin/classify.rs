//! Classify a single building photo from the command line

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use geovision_api::classifier::{ImageClassifier, OnnxClassifier};
use geovision_api::config::default_labels_path;

#[derive(Debug, Parser)]
#[command(name = "classify", version, about = "Predict the floor count of a building photo")]
struct Args {
    /// Image to classify
    image: PathBuf,

    /// Exported ONNX model
    #[arg(short, long, default_value = "models/floor_detector.onnx")]
    model: PathBuf,

    /// Label file; defaults to <model>.labels.json
    #[arg(short, long)]
    labels: Option<PathBuf>,

    /// Square input size the model was exported with
    #[arg(long, default_value_t = 224)]
    size: u32,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let args = Args::parse();
    let labels = args.labels.unwrap_or_else(|| default_labels_path(&args.model));

    let classifier = OnnxClassifier::load(&args.model, &labels, args.size)
        .context("failed to load classifier")?;

    let image = std::fs::read(&args.image)
        .with_context(|| format!("failed to read {}", args.image.display()))?;
    let prediction = classifier.classify(&image)?;

    println!("Predicted Class: {}", prediction.predicted_class);
    println!("Class Index: {}", prediction.class_index);
    println!("Probabilities: {:?}", prediction.probabilities);

    Ok(())
}
