//! Command Line Interface for the Triage binaries.

pub mod args;
pub mod commands;
pub mod output;

// Re-export commonly used types
pub use args::*;
pub use commands::*;
pub use output::*;

use std::io::Write;

use env_logger::Builder;
use log::LevelFilter;

/// Set up logging for a binary from its verbosity level.
pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => LevelFilter::Error, // Quiet mode
        1 => LevelFilter::Warn,  // Default
        2 => LevelFilter::Info,  // Verbose
        _ => LevelFilter::Debug, // Very verbose (3+)
    };

    Builder::new()
        .filter_level(log_level)
        .parse_default_env()
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();
}
