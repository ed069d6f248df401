//! Detect command: scan an image against the registered corpus.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use imprint_core::MatchKind;
use tracing::debug;

use crate::commands::{format_timestamp, load_image};
use crate::state;

pub fn execute(registry: &Path, image_path: &Path, json: bool) -> Result<()> {
    let engine = state::load_engine(registry)?;
    let image = load_image(image_path)?;

    debug!(path = %image_path.display(), "running detection");
    let matches = engine.detect(&image)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&matches)?);
        return Ok(());
    }

    if matches.is_empty() {
        println!("{}", "No registered content matched.".dimmed());
        return Ok(());
    }

    println!();
    println!("{} {}", matches.len(), "match(es) found".bold());
    for m in &matches {
        let tag = match m.kind {
            MatchKind::Exact => "EXACT  ".green().bold(),
            MatchKind::Similar => "SIMILAR".yellow().bold(),
        };
        let score = m
            .similarity
            .map(|s| format!("{s:.3}"))
            .unwrap_or_else(|| "-".into());
        println!(
            "   [{tag}] {}  owner={}  similarity={}  registered={}  status={}",
            m.identifier,
            m.owner,
            score,
            format_timestamp(m.registered_at),
            m.status
        );
    }
    Ok(())
}
