use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Payment success-rate monitor
#[derive(Parser)]
#[command(name = "payment-monitor", version, about)]
pub struct Cli {
    /// YAML config file; environment variables are used when omitted
    #[arg(long, global = true, env = "MONITOR_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Connect to the live feed and serve the dashboard API
    Serve {
        /// Port to bind (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
        /// WebSocket feed URL (overrides config)
        #[arg(long)]
        feed_url: Option<String>,
    },

    /// Replay a recorded feed (one JSON event per line) and print the chart
    Replay {
        file: PathBuf,
        /// Dimension to chart (defaults to the configured default)
        #[arg(short, long)]
        dimension: Option<String>,
    },
}
