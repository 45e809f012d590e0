//! # Bosswatch - Headless Crowdsourced Scouting Client
//!
//! Connects the scouting coordinator from `scout_core` to a relay and
//! drives it with a simulated game world, so the full client behavior —
//! zone subscription, reporter election, report gating, reconnection —
//! can be exercised end to end without a host game engine. This entry
//! point handles CLI parsing, configuration loading, and application
//! lifecycle management.
//!
//! ## Quick Start
//!
//! ```bash
//! # Run with default configuration
//! bosswatch
//!
//! # Specify custom configuration
//! bosswatch --config production.toml
//!
//! # Override specific settings
//! bosswatch --url wss://relay.example.net --world 305 --log-level debug
//!
//! # JSON logging for production
//! bosswatch --json-logs
//! ```
//!
//! ## Configuration
//!
//! Loads configuration from a TOML file (default: `bosswatch.toml`). If
//! the file doesn't exist, a default configuration is created.
//!
//! ## Signal Handling
//!
//! Shuts down gracefully on SIGINT (Ctrl+C) and SIGTERM, announcing
//! departure to the relay before closing the session.

use tracing::error;

mod app;
mod cli;
mod config;
mod logging;
mod signals;
mod sim;

use app::Application;
use cli::CliArgs;
use config::AppConfig;

/// Main entry point for the bosswatch client.
///
/// Handles the complete application lifecycle:
/// 1. Command-line argument parsing
/// 2. Configuration loading and validation
/// 3. Logging system initialization
/// 4. Application creation and execution
///
/// # Exit Codes
///
/// * **0**: Successful execution and shutdown
/// * **1**: Error during startup, configuration, or runtime
pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    // Parse CLI arguments first
    let args = CliArgs::parse();

    // Load configuration to get logging settings
    let config = AppConfig::load_from_file(&args.config_path)
        .await
        .unwrap_or_default();

    // Setup logging before anything else
    if let Err(e) = logging::setup_logging(&config.logging, args.json_logs) {
        eprintln!("❌ Failed to setup logging: {e}");
        std::process::exit(1);
    }

    // Create and run application
    match Application::new(args).await {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("❌ Application error: {e:?}");
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("❌ Failed to start application: {e:?}");
            std::process::exit(1);
        }
    }

    Ok(())
}

// Re-export main types for potential library usage
pub use config::{LoggingSettings, RelaySettings, ScoutingSettings, SimulationSettings};
