use std::path::PathBuf;

use clap::{Parser, Subcommand};
use gaze_config::GazeConfig;

/// Top-level CLI parser for the `gazelog` binary.
#[derive(Debug, Parser)]
#[command(
    name = "gazelog",
    version,
    about = "Gaze experiment telemetry ingestion service"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Listen port (overrides PORT and config files)
    #[arg(short, long, global = true)]
    pub port: Option<u16>,

    /// Directory the experiment client is served from
    #[arg(long, global = true)]
    pub static_dir: Option<PathBuf>,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Run the HTTP service (default)
    #[default]
    Serve,
    /// Create the gaze_logs table and missing columns, then exit
    EnsureSchema,
}

impl Cli {
    /// The subcommand to run; `serve` when none was given.
    #[must_use]
    pub fn subcommand(&self) -> Commands {
        self.command.unwrap_or_default()
    }

    /// Apply command-line overrides on top of loaded configuration.
    pub fn apply_overrides(&self, config: &mut GazeConfig) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(dir) = &self.static_dir {
            config.server.static_dir.clone_from(dir);
        }
    }
}
