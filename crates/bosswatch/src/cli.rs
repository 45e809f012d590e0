//! Command-line interface handling for the bosswatch client.
//!
//! This module provides command-line argument parsing using the `clap`
//! crate for robust argument handling.

use clap::{Arg, Command};
use std::path::PathBuf;

/// Command line arguments parsed from user input.
///
/// Holds the command-line options that can override configuration file
/// settings or provide runtime parameters.
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Path to the configuration file
    pub config_path: PathBuf,
    /// Optional override for the relay WebSocket URL
    pub relay_url: Option<String>,
    /// Optional override for the simulated world number
    pub world: Option<u32>,
    /// Optional override for log level
    pub log_level: Option<String>,
    /// Whether to force JSON log output
    pub json_logs: bool,
    /// Optional run duration in seconds (default: run until signalled)
    pub duration: Option<u64>,
}

impl CliArgs {
    /// Parses command line arguments using clap.
    ///
    /// # Returns
    ///
    /// A `CliArgs` instance containing all parsed command-line options.
    pub fn parse() -> Self {
        let matches = Command::new("Bosswatch Scouting Client")
            .version("0.1.0")
            .about("Crowdsourced target scouting client with a simulated observer")
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .value_name("FILE")
                    .help("Configuration file path")
                    .default_value("bosswatch.toml"),
            )
            .arg(
                Arg::new("url")
                    .short('u')
                    .long("url")
                    .value_name("URL")
                    .help("Relay WebSocket URL (e.g., wss://relay.example.net)"),
            )
            .arg(
                Arg::new("world")
                    .short('w')
                    .long("world")
                    .value_name("WORLD")
                    .help("World number the simulated observer plays on")
                    .value_parser(clap::value_parser!(u32)),
            )
            .arg(
                Arg::new("log-level")
                    .short('l')
                    .long("log-level")
                    .value_name("LEVEL")
                    .help("Log level (trace, debug, info, warn, error)"),
            )
            .arg(
                Arg::new("json-logs")
                    .long("json-logs")
                    .help("Output logs in JSON format")
                    .action(clap::ArgAction::SetTrue),
            )
            .arg(
                Arg::new("duration")
                    .short('d')
                    .long("duration")
                    .value_name("SECONDS")
                    .help("Stop after this many seconds instead of running until signalled")
                    .value_parser(clap::value_parser!(u64)),
            )
            .get_matches();

        Self {
            config_path: PathBuf::from(
                matches
                    .get_one::<String>("config")
                    .expect("Default config path should always be set"),
            ),
            relay_url: matches.get_one::<String>("url").cloned(),
            world: matches.get_one::<u32>("world").copied(),
            log_level: matches.get_one::<String>("log-level").cloned(),
            json_logs: matches.get_flag("json-logs"),
            duration: matches.get_one::<u64>("duration").copied(),
        }
    }
}
