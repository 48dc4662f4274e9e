//! Command-line interface module.
//!
//! This module handles:
//! - Argument parsing via clap and mapping onto the library configuration
//! - Per-frame output (summary line, field details, hex dump)
//! - The end-of-run statistics report

mod args;
mod output;

pub use args::Args;
pub use output::{format_timestamp, write_report, OutputFormat, OutputFormatter};
