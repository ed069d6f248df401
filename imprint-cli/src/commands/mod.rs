//! Command implementations.

pub mod detect;
pub mod extract;
pub mod register;
pub mod revoke;
pub mod show;
pub mod verify;

use std::path::Path;

use anyhow::{Context, Result};
use image::DynamicImage;

/// Load an image file for a command.
pub(crate) fn load_image(path: &Path) -> Result<DynamicImage> {
    image::open(path).with_context(|| format!("Failed to read image: {}", path.display()))
}

/// Human-readable form of a Unix-ms timestamp.
pub(crate) fn format_timestamp(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| format!("{ms} ms"))
}
