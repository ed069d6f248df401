//! Extract command: read a raw watermark identifier from an image.

use std::path::Path;

use anyhow::{bail, Result};
use colored::Colorize;
use imprint_core::codec;

use crate::commands::load_image;

pub fn execute(image_path: &Path) -> Result<()> {
    let image = load_image(image_path)?;

    match codec::extract(&image) {
        Some(identifier) => {
            println!("{} {}", "Watermark:".green().bold(), identifier);
            Ok(())
        }
        None => {
            println!("{}", "No recoverable watermark.".dimmed());
            bail!("no watermark found in {}", image_path.display());
        }
    }
}
