//! Show command: print a registry record.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use crate::commands::format_timestamp;
use crate::state;

pub fn execute(registry: &Path, identifier: &str, json: bool) -> Result<()> {
    let engine = state::load_engine(registry)?;
    let record = engine.registry().get_record(identifier)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    println!();
    println!("{}", record.identifier.bold());
    println!("   {} {}", "Owner:".dimmed(), record.owner);
    println!("   {} {}", "Status:".dimmed(), record.status);
    println!("   {} {}", "Revision:".dimmed(), record.revision);
    println!(
        "   {} {}",
        "Registered:".dimmed(),
        format_timestamp(record.registered_at)
    );
    println!("   {} {}", "Source hash:".dimmed(), record.source_hash);
    println!("   {} {}", "Content hash:".dimmed(), record.content_hash);
    println!(
        "   {} {} bits",
        "Watermark payload:".dimmed(),
        record.payload_bits
    );
    println!(
        "   {} {} dims",
        "Fingerprint:".dimmed(),
        record.fingerprint.dimension()
    );
    Ok(())
}
