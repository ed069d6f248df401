//! Verify command: check an image against the registry.

use std::path::Path;

use anyhow::{bail, Result};
use colored::Colorize;
use imprint_core::VerificationResult;
use tracing::debug;

use crate::commands::{format_timestamp, load_image};
use crate::state;

pub fn execute(registry: &Path, image_path: &Path, json: bool) -> Result<()> {
    let engine = state::load_engine(registry)?;
    let image = load_image(image_path)?;

    debug!(path = %image_path.display(), "verifying content");
    let result = engine.verify(&image)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        if matches!(result, VerificationResult::NotFound) {
            bail!("verification failed: no registered match");
        }
        return Ok(());
    }

    match result {
        VerificationResult::Verified {
            identifier,
            owner,
            registered_at,
            status,
        } => {
            println!();
            println!("{}", "╔════════════════════════════════════════╗".green());
            println!(
                "{}",
                "║               VERIFIED                 ║".green().bold()
            );
            println!("{}", "╚════════════════════════════════════════╝".green());
            println!();
            println!("   {} {}", "Identifier:".dimmed(), identifier);
            println!("   {} {}", "Owner:".dimmed(), owner);
            println!(
                "   {} {}",
                "Registered:".dimmed(),
                format_timestamp(registered_at)
            );
            println!("   {} {}", "Status:".dimmed(), status);
            println!(
                "   {} {}",
                "Match:".dimmed(),
                "exact (watermark)".green()
            );
        }
        VerificationResult::PartialMatch {
            identifier,
            similarity,
        } => {
            println!();
            println!("{}", "╔════════════════════════════════════════╗".yellow());
            println!(
                "{}",
                "║             PARTIAL MATCH              ║".yellow().bold()
            );
            println!("{}", "╚════════════════════════════════════════╝".yellow());
            println!();
            println!("   {} {}", "Closest record:".dimmed(), identifier);
            println!("   {} {similarity:.3}", "Similarity:".dimmed());
            println!(
                "   {} {}",
                "Match:".dimmed(),
                "fingerprint only (non-authoritative)".yellow()
            );
        }
        VerificationResult::NotFound => {
            println!();
            println!("{}", "╔════════════════════════════════════════╗".red());
            println!(
                "{}",
                "║              NOT FOUND                 ║".red().bold()
            );
            println!("{}", "╚════════════════════════════════════════╝".red());
            println!();
            bail!("verification failed: no registered match");
        }
    }
    Ok(())
}
