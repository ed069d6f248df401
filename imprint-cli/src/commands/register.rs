//! Register command: watermark an image and record ownership.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::info;

use crate::commands::{format_timestamp, load_image};
use crate::state;

/// Default output path: `<IMAGE stem>.protected.png`. PNG keeps the
/// watermark intact; distributing a recompressed copy is the owner's call.
fn default_output(image: &Path) -> PathBuf {
    let stem = image
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("content");
    image.with_file_name(format!("{stem}.protected.png"))
}

pub fn execute(
    registry: &Path,
    image_path: &Path,
    owner: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let engine = state::load_engine(registry)?;
    let image = load_image(image_path)?;
    info!(path = %image_path.display(), owner, "registering content");

    let protected = engine.protect(&image, owner)?;

    let output = output.unwrap_or_else(|| default_output(image_path));
    protected
        .image
        .save(&output)
        .with_context(|| format!("Failed to write watermarked image: {}", output.display()))?;
    state::save_engine(registry, &engine)?;

    println!();
    println!("{}", "Content registered".green().bold());
    println!(
        "   {} {}",
        "Identifier:".dimmed(),
        protected.receipt.identifier
    );
    println!("   {} {}", "Owner:".dimmed(), owner);
    println!(
        "   {} {}",
        "Registered:".dimmed(),
        format_timestamp(protected.receipt.timestamp)
    );
    println!("   {} {}", "Watermarked copy:".dimmed(), output.display());
    Ok(())
}
