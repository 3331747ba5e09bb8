//! Colorizes a single image from disk and writes the result next to a
//! grayscale/color comparison, without starting the HTTP server.

use std::{fs, path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use tracing::info;

use grayscale_colorizer_service::{
    InferenceInvoker, config::parse_device, model::TorchScriptGenerator, pipeline,
    telemetry::init_tracing,
};

#[derive(Debug, Parser)]
#[command(about = "Run the colorization model on a local image")]
struct Args {
    /// Grayscale (or color) image to colorize
    input: PathBuf,
    /// Where to write the colorized PNG
    #[arg(long, default_value = "colorized.png")]
    output: PathBuf,
    /// Where to write the side-by-side comparison PNG
    #[arg(long, default_value = "comparison.png")]
    comparison: PathBuf,
    #[arg(long, env = "MODEL_PATH", default_value = "models/colorization_generator.pt")]
    model_path: PathBuf,
    #[arg(long, env = "DEVICE", default_value = "cpu")]
    device: String,
}

fn main() -> anyhow::Result<()> {
    init_tracing("info");

    let args = Args::parse();
    let bytes = fs::read(&args.input)
        .with_context(|| format!("failed to read input image {}", args.input.display()))?;

    let generator = TorchScriptGenerator::load(&args.model_path, parse_device(&args.device)?)
        .with_context(|| format!("failed to load {}", args.model_path.display()))?;
    info!(model = %args.model_path.display(), "generator loaded");
    let invoker = InferenceInvoker::new(Arc::new(generator));

    let colorized = pipeline::colorize(&invoker, &bytes)
        .with_context(|| format!("failed to colorize {}", args.input.display()))?;
    info!(shape = ?colorized.input.shape(), "input tensor");

    colorized
        .output
        .clone()
        .into_dynamic()
        .save(&args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    colorized
        .comparison()?
        .save(&args.comparison)
        .with_context(|| format!("failed to write {}", args.comparison.display()))?;

    info!(
        output = %args.output.display(),
        comparison = %args.comparison.display(),
        "results saved"
    );
    Ok(())
}
