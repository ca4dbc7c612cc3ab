//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};

use clap::Parser;

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "workout-timer")]
#[command(about = "A persistent exercise/rest workout timer service")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Directory holding the persisted timer record and preferences
    #[arg(short, long, default_value = "./timer-data")]
    pub data_dir: PathBuf,

    /// Display refresh cadence in milliseconds
    #[arg(long, default_value = "100", value_parser = clap::value_parser!(u64).range(10..=5000))]
    pub tick_ms: u64,

    /// User identity for the remote mirror (mirroring is off without one)
    #[arg(long, env = "WORKOUT_TIMER_USER_ID")]
    pub user_id: Option<String>,

    /// Base URL of the remote mirror's REST endpoint
    #[arg(long, env = "WORKOUT_TIMER_MIRROR_URL")]
    pub mirror_url: Option<String>,

    /// API key sent to the remote mirror
    #[arg(long, env = "WORKOUT_TIMER_MIRROR_KEY", hide_env_values = true)]
    pub mirror_key: Option<String>,

    /// Ring the terminal bell when a rest ends
    #[arg(long)]
    pub bell: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Mirror is only active with both a URL and a user identity
    pub fn mirror_enabled(&self) -> bool {
        self.mirror_url.is_some() && self.user_id.is_some()
    }
}
