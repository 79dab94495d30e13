//! Class list replay tool.
//!
//! Feeds a recorded stream of type load/unload events through the class list
//! writer, or checks that an existing manifest is ordered.

mod events;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use classlist_core::{parse_manifest, verify_topology, ClassListConfig, ClassListWriter, PathStyle};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "classlist-replay")]
#[command(about = "Replay class load events into a class list manifest")]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a manifest from a JSON-lines event file
    Replay {
        /// Event file, one JSON object per line
        #[arg(long)]
        events: PathBuf,

        /// Manifest to create (`%p` and `%t` are expanded)
        #[arg(long)]
        output: PathBuf,

        /// Strip sources as on drive-letter platforms
        #[arg(long)]
        drive_letter: bool,

        /// Behave as a runtime without a packaged module image
        #[arg(long)]
        exploded: bool,
    },
    /// Check that a manifest only refers back to earlier records
    Check {
        manifest: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    match args.command {
        Command::Replay {
            events: events_path,
            output,
            drive_letter,
            exploded,
        } => {
            let style = if drive_letter {
                PathStyle::DriveLetter
            } else {
                PathStyle::Posix
            };
            let config = ClassListConfig::with_output(output)
                .path_style(style)
                .runtime_image(!exploded);

            let writer = ClassListWriter::new(config);
            writer.init()?;

            let file = File::open(&events_path)
                .with_context(|| format!("Failed to open {}", events_path.display()))?;
            let summary = events::replay(BufReader::new(file), &writer)?;
            writer.close();

            info!(
                "Replayed events: {} recorded, {} rejected, {} unloaded",
                summary.recorded, summary.rejected, summary.unloaded
            );
            if summary.disabled > 0 {
                bail!("class list dumping was disabled after {} records", summary.recorded);
            }
        }
        Command::Check { manifest } => {
            let text = std::fs::read_to_string(&manifest)
                .with_context(|| format!("Failed to read {}", manifest.display()))?;
            let entries = parse_manifest(&text)?;
            verify_topology(&entries)?;
            info!("{}: {} records in order", manifest.display(), entries.len());
        }
    }

    Ok(())
}
