//! pktdecode CLI entry point.

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use pktdecode::cli::{write_report, Args, OutputFormatter};
use pktdecode_core::protocol::ProtocolTag;
use pktdecode_core::storage::{NullSink, PacketSink};
use pktdecode_core::{PacketProcessor, PcapReader};

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Set up logging
    let filter = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(io::stderr)
        .init();

    if args.list_protocols {
        list_protocols();
        return Ok(());
    }

    let capture = args
        .file
        .as_ref()
        .context("Capture file required. Use --help for usage.")?;

    let sink = open_sink(&args)?;
    let processor = PacketProcessor::new(args.processor_config(), sink)
        .context("Invalid pipeline configuration")?;

    let reader = PcapReader::open(capture)
        .with_context(|| format!("Failed to open capture file: {}", capture.display()))?;

    let formatter = OutputFormatter::new(args.output_format());
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut skipped = 0u64;

    for frame in reader {
        let frame = frame.context("Failed to read capture file")?;

        if !frame.is_ethernet() {
            if skipped == 0 {
                warn!(link_type = frame.link_type, "skipping frames with a non-Ethernet link type");
            }
            skipped += 1;
            continue;
        }

        match processor.process(&frame.data, frame.timestamp_secs()) {
            Ok(packet) => formatter.write(&frame, &packet, &mut out)?,
            Err(e) => warn!(frame = frame.frame_number, "skipping frame: {}", e),
        }
    }

    if !processor.shutdown() {
        warn!("pipeline did not drain before the shutdown timeout");
    }

    if skipped > 0 {
        writeln!(out, "Skipped {} non-Ethernet frames", skipped)?;
    }
    let cache = processor.cache_stats();
    write_report(
        &mut out,
        &processor.stats(),
        cache.as_ref(),
        &processor.pipeline_status(),
    )?;
    out.flush()?;

    Ok(())
}

/// Persistence target: SQLite when `--db` is given, otherwise discard.
fn open_sink(args: &Args) -> Result<Box<dyn PacketSink>> {
    #[cfg(feature = "sqlite")]
    if let Some(path) = &args.db {
        let sink = pktdecode_core::storage::SqliteSink::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        return Ok(Box::new(sink));
    }

    #[cfg(not(feature = "sqlite"))]
    let _ = args;

    Ok(Box::new(NullSink::new()))
}

fn list_protocols() {
    println!("Supported Protocols:");
    println!("{:-<60}", "");

    for tag in ProtocolTag::ALL {
        println!("  L{} {:<10} {}", tag.layer(), tag.name(), tag.description());
    }
}
