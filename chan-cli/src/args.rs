//! Command-line arguments

use std::path::PathBuf;

use clap::Parser;

/// Run a channel combiner scenario and print the merged stream
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "chanmux-sim", version)]
pub struct CliArgs {
    /// Scenario file (JSON)
    pub scenario: PathBuf,

    /// Run through the real-time actor instead of the tick simulation
    #[arg(long)]
    pub live: bool,

    /// Actor tick period in microseconds
    #[arg(long, requires = "live")]
    pub tick_us: Option<u64>,
}
