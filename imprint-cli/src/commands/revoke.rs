//! Revoke command: owner-only status change to `Revoked`.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use imprint_core::ContentStatus;
use tracing::info;

use crate::commands::format_timestamp;
use crate::state;

pub fn execute(registry: &Path, identifier: &str, requester: &str) -> Result<()> {
    let engine = state::load_engine(registry)?;

    let receipt = engine
        .registry()
        .update_status(identifier, ContentStatus::Revoked, requester)?;
    state::save_engine(registry, &engine)?;

    info!(identifier, requester, "record revoked");
    println!();
    println!("{}", "Record revoked".yellow().bold());
    println!("   {} {}", "Identifier:".dimmed(), receipt.identifier);
    println!("   {} {}", "Revision:".dimmed(), receipt.revision);
    println!(
        "   {} {}",
        "At:".dimmed(),
        format_timestamp(receipt.timestamp)
    );
    println!();
    println!(
        "{}",
        "The record stops matching by fingerprint; watermarks in already-distributed copies remain readable."
            .dimmed()
    );
    Ok(())
}
