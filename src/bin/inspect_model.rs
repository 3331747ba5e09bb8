//! Prints every named parameter of a TorchScript generator artifact.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use grayscale_colorizer_service::{
    Generator, config::parse_device, model::TorchScriptGenerator, telemetry::init_tracing,
};

#[derive(Debug, Parser)]
#[command(about = "Inspect the structure of a colorization model artifact")]
struct Args {
    /// TorchScript module to inspect
    #[arg(long, env = "MODEL_PATH", default_value = "models/colorization_generator.pt")]
    model_path: PathBuf,
    /// `cpu`, `cuda` or `cuda:N`
    #[arg(long, env = "DEVICE", default_value = "cpu")]
    device: String,
    /// Emit JSON instead of a table
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    init_tracing("warn");

    let args = Args::parse();
    let generator = TorchScriptGenerator::load(&args.model_path, parse_device(&args.device)?)
        .with_context(|| format!("failed to load {}", args.model_path.display()))?;
    let parameters = generator
        .parameters()
        .context("failed to enumerate parameters")?;
    let metadata = generator.metadata();

    if args.json {
        let report = serde_json::json!({
            "model": metadata,
            "parameters": parameters,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{} ({} bytes, {})", metadata.name, metadata.size_bytes, metadata.device);
    let width = parameters.iter().map(|p| p.name.len()).max().unwrap_or(0);
    for param in &parameters {
        println!(
            "  {:<width$}  {:<20}  {}",
            param.name,
            format!("{:?}", param.shape),
            param.dtype
        );
    }
    let total: usize = parameters.iter().map(|p| p.numel).sum();
    println!("{} tensors, {} parameters", parameters.len(), total);

    Ok(())
}
