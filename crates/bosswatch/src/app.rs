//! Main application logic and lifecycle management.
//!
//! This module contains the `Application` struct that orchestrates client
//! startup, the simulation tick loop, periodic status reporting, and
//! graceful shutdown.

use crate::config::AppConfig;
use crate::logging::display_banner;
use crate::sim::{SimulatedObserver, SimulatedSwitcher};
use crate::{cli::CliArgs, signals};
use scout_core::{ScoutingCoordinator, SortKey};
use std::time::Duration;
use tracing::info;

/// Main application struct.
///
/// Manages the complete lifecycle of the bosswatch client: configuration
/// loading, coordinator construction, the tick loop that stands in for the
/// host game's simulation step, and graceful teardown.
pub struct Application {
    /// Loaded application configuration
    config: AppConfig,
    /// Optional bounded run duration
    duration: Option<Duration>,
}

impl Application {
    /// Creates a new application instance.
    ///
    /// Loads configuration, applies CLI overrides, validates settings, and
    /// displays the startup banner.
    ///
    /// # Process
    ///
    /// 1. Load configuration from file (creating default if missing)
    /// 2. Apply command-line argument overrides
    /// 3. Validate merged configuration
    /// 4. Display startup banner
    pub async fn new(args: CliArgs) -> Result<Self, Box<dyn std::error::Error>> {
        info!("🔧 Loading configuration from: {}", args.config_path.display());
        let mut config = AppConfig::load_from_file(&args.config_path).await?;

        // Apply CLI overrides
        if let Some(url) = args.relay_url {
            config.relay.url = url;
        }
        if let Some(world) = args.world {
            config.simulation.world = world;
        }
        if let Some(log_level) = args.log_level {
            config.logging.level = log_level;
        }
        if args.json_logs {
            config.logging.json_format = true;
        }

        if let Err(e) = config.validate() {
            return Err(format!("Configuration validation failed: {e}").into());
        }
        info!("✅ Configuration loaded and validated successfully");

        display_banner();

        info!(
            "📂 Config: {} | Relay: {}",
            args.config_path.display(),
            config.relay.url
        );

        Ok(Self {
            config,
            duration: args.duration.map(Duration::from_secs),
        })
    }

    /// Runs the application until signalled (or the configured duration
    /// elapses), then shuts down gracefully.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let scout_config = self.config.to_scout_config();
        scout_config.validate()?;

        let mut scout = ScoutingCoordinator::new(scout_config);
        scout.connect();
        let handle = scout.handle();

        let mut observer = SimulatedObserver::new(
            &self.config.simulation,
            &self.config.scouting.zones,
            &self.config.scouting.target,
        );
        let mut switcher = SimulatedSwitcher::default();

        self.log_configuration_summary();

        // Periodic status reporting from the display-side handle, the same
        // view a UI panel would consume.
        let status_handle = handle.clone();
        let monitoring_handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(30));
            interval.tick().await; // skip the immediate first tick
            loop {
                interval.tick().await;
                let fresh = status_handle.peers().fresh_sorted(SortKey::World, true);
                info!(
                    "📊 {} worlds reporting | connected: {} | reporter: {}",
                    fresh.len(),
                    status_handle.is_connected(),
                    status_handle.is_reporter()
                );
                for record in fresh.iter().take(5) {
                    info!(
                        "  🌍 world {} | zone {} | hp {}% | players {}/{}",
                        record.world,
                        record.chunk,
                        record.health,
                        record.attacking_players,
                        record.total_players
                    );
                }
            }
        });

        info!("✅ Bosswatch is now running!");
        info!("🛑 Press Ctrl+C to gracefully shutdown");

        let mut ticker =
            tokio::time::interval(Duration::from_millis(self.config.scouting.tick_interval_ms));
        let started = std::time::Instant::now();
        let shutdown = signals::wait_for_shutdown();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    observer.advance();
                    scout.tick(&observer, &mut switcher);
                    if let Some(world) = switcher.take_completed() {
                        info!(world, "simulated observer switched worlds");
                        observer.jump_to(world);
                    }
                    if let Some(limit) = self.duration {
                        if started.elapsed() >= limit {
                            info!("⏰ Configured duration elapsed, shutting down");
                            break;
                        }
                    }
                }
                _ = &mut shutdown => break,
            }
        }

        info!("🛑 Beginning graceful shutdown...");
        monitoring_handle.abort();
        scout.shutdown(&observer);

        // Give the session task a moment to flush the departure message
        // and close frame.
        tokio::time::sleep(Duration::from_millis(250)).await;

        info!("✅ Bosswatch shutdown complete");
        Ok(())
    }

    /// Logs the configuration summary at startup.
    fn log_configuration_summary(&self) {
        info!("📋 Configuration Summary:");
        info!("  🌐 Relay: {}", self.config.relay.url);
        info!("  🌍 World: {}", self.config.simulation.world);
        let zones: Vec<String> = self
            .config
            .scouting
            .zones
            .iter()
            .map(|z| format!("{} ({})", z.name, z.region))
            .collect();
        info!("  🗺️ Zones: {}", zones.join(", "));
        info!(
            "  ⏱️ Tick interval: {}ms | heartbeat: {} ticks | no-sight: {} ticks",
            self.config.scouting.tick_interval_ms,
            self.config.scouting.heartbeat_ticks,
            self.config.scouting.no_sight_ticks
        );
    }
}
