//! Imprint CLI - invisible watermarking and content protection tool.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

mod commands;
mod exit_codes;
mod state;

#[derive(Parser)]
#[command(name = "imprint")]
#[command(author, version, about = "Invisible watermarking and content protection", long_about = None)]
struct Cli {
    /// Path to the registry snapshot file
    #[arg(long, global = true, default_value = "imprint-registry.json")]
    registry: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watermark an image and register it to an owner
    Register {
        /// Path to the image to protect
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Principal id of the owner
        #[arg(short, long)]
        owner: String,

        /// Output path for the watermarked copy (defaults to
        /// <IMAGE>.protected.png; use a lossless format)
        #[arg(short = 'O', long)]
        output: Option<PathBuf>,
    },

    /// Verify an image against the registry
    Verify {
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Emit the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Scan an image for matches against all registered content
    Detect {
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Emit the matches as JSON
        #[arg(long)]
        json: bool,
    },

    /// Revoke a registered record (owner only)
    Revoke {
        /// Identifier of the record to revoke
        #[arg(value_name = "IDENTIFIER")]
        identifier: String,

        /// Principal id of the requester; must match the record owner
        #[arg(short, long)]
        requester: String,
    },

    /// Show a registry record
    Show {
        #[arg(value_name = "IDENTIFIER")]
        identifier: String,

        /// Emit the record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract a raw watermark identifier from an image
    Extract {
        #[arg(value_name = "IMAGE")]
        image: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let registry = cli.registry;

    let result: Result<()> = match cli.command {
        Commands::Register {
            image,
            owner,
            output,
        } => commands::register::execute(&registry, &image, &owner, output),
        Commands::Verify { image, json } => commands::verify::execute(&registry, &image, json),
        Commands::Detect { image, json } => commands::detect::execute(&registry, &image, json),
        Commands::Revoke {
            identifier,
            requester,
        } => commands::revoke::execute(&registry, &identifier, &requester),
        Commands::Show { identifier, json } => {
            commands::show::execute(&registry, &identifier, json)
        }
        Commands::Extract { image } => commands::extract::execute(&image),
    };

    if let Err(err) = result {
        let exit = exit_codes::ExitCode::from_anyhow(&err);
        eprintln!("{} {err:#}", "error:".red().bold());
        std::process::exit(exit.code);
    }
}
