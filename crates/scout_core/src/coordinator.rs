//! Top-level per-tick driver wiring all scouting components together.
//!
//! The coordinator is the only component that knows about all the others.
//! It owns the reporter-role state cell, which is updated exclusively by
//! inbound relay messages, the no-sight resignation path, disconnects, and
//! zone exits — never self-assigned.

use crate::config::ScoutConfig;
use crate::gate::ReportGate;
use crate::peers::PeerDataStore;
use crate::perception::{EntityHandle, EntityInfo, Perception, WorldId, WorldJumper};
use crate::protocol::{ClientMessage, RelayMessage};
use crate::session::{ConnectionState, SessionEvent, SessionManager};
use crate::target::{ObservedState, TargetTracker};
use crate::zone::{ZoneId, ZoneTracker};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Whether this client is the elected reporter for its current world.
///
/// Derived entirely from the last relay message received (or the local
/// resignation path); the relay is authoritative and may regrant the role
/// to another client at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReporterRole {
    Listener,
    Reporter,
}

/// Read-side view handed to display code.
///
/// Cheap to clone and safe to use from a thread other than the tick
/// driver's: peer reads are snapshot-at-read, the flags are atomics or
/// watch reads, and the jump intent sink is a mutex-guarded cell the
/// coordinator drains on its own tick.
#[derive(Debug, Clone)]
pub struct ScoutHandle {
    peers: PeerDataStore,
    state: watch::Receiver<ConnectionState>,
    reporter: Arc<AtomicBool>,
    jump_intent: Arc<Mutex<Option<WorldId>>>,
}

impl ScoutHandle {
    /// The shared per-world report table.
    pub fn peers(&self) -> &PeerDataStore {
        &self.peers
    }

    pub fn is_connected(&self) -> bool {
        *self.state.borrow() == ConnectionState::Connected
    }

    pub fn is_reporter(&self) -> bool {
        self.reporter.load(Ordering::Relaxed)
    }

    /// Asks the coordinator to switch the client to another world. Best
    /// effort; a newer request overwrites an undelivered one.
    pub fn request_world_jump(&self, world: WorldId) {
        if let Ok(mut slot) = self.jump_intent.lock() {
            *slot = Some(world);
        }
    }
}

/// The scouting coordinator, invoked once per game simulation tick.
pub struct ScoutingCoordinator {
    session: SessionManager,
    zones: ZoneTracker,
    target: TargetTracker,
    gate: ReportGate,
    peers: PeerDataStore,
    role: ReporterRole,
    reporter_flag: Arc<AtomicBool>,
    jump_intent: Arc<Mutex<Option<WorldId>>>,
    active_jump: Option<WorldId>,
    jump_attempts: u8,
    max_jump_attempts: u8,
}

impl ScoutingCoordinator {
    pub fn new(config: ScoutConfig) -> Self {
        let session = SessionManager::new(config.session.clone());
        Self::with_session(config, session)
    }

    pub(crate) fn with_session(config: ScoutConfig, session: SessionManager) -> Self {
        Self {
            session,
            zones: ZoneTracker::new(config.zones),
            target: TargetTracker::new(config.selector),
            gate: ReportGate::new(config.gate),
            peers: PeerDataStore::new(config.stale_after_ms),
            role: ReporterRole::Listener,
            reporter_flag: Arc::new(AtomicBool::new(false)),
            jump_intent: Arc::new(Mutex::new(None)),
            active_jump: None,
            jump_attempts: 0,
            max_jump_attempts: config.max_jump_attempts,
        }
    }

    /// Starts the relay session. Idempotent.
    pub fn connect(&mut self) {
        self.session.connect();
    }

    /// Announces departure if currently inside a zone, then tears the
    /// session down permanently.
    pub fn shutdown(&mut self, perception: &dyn Perception) {
        if self.zones.current().is_some() {
            self.session.send(ClientMessage::Leave {
                world: perception.current_world(),
            });
        }
        self.session.close();
        self.set_role(ReporterRole::Listener, "shutdown");
    }

    /// Builds a display view of this coordinator.
    pub fn handle(&self) -> ScoutHandle {
        ScoutHandle {
            peers: self.peers.clone(),
            state: self.session.state_watch(),
            reporter: self.reporter_flag.clone(),
            jump_intent: self.jump_intent.clone(),
        }
    }

    pub fn role(&self) -> ReporterRole {
        self.role
    }

    pub fn is_reporter(&self) -> bool {
        self.role == ReporterRole::Reporter
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    pub fn peers(&self) -> &PeerDataStore {
        &self.peers
    }

    /// Forwards an entity-spawn notification. Only relevant while inside a
    /// monitored zone.
    pub fn handle_entity_spawned(&mut self, entity: &EntityInfo) {
        if self.zones.current().is_some() {
            self.target.note_spawn(entity);
        }
    }

    /// Forwards an entity-despawn notification.
    pub fn handle_entity_despawned(&mut self, handle: EntityHandle) {
        self.target.note_despawn(handle);
    }

    /// Runs one simulation tick. Never blocks; all network interaction is
    /// channel-based.
    pub fn tick(&mut self, perception: &dyn Perception, jumper: &mut dyn WorldJumper) {
        self.drain_session_events(perception);
        self.drive_world_jump(jumper);

        let transition = self.zones.classify(perception.current_region());
        if let Some(zone) = transition.exited {
            self.on_zone_exit(perception, zone);
        }
        if let Some(zone) = transition.entered {
            self.on_zone_enter(perception, zone);
        }
        if let Some(zone) = transition.current {
            self.tick_in_zone(perception, zone);
        }
    }

    /// Applies queued session events in relay arrival order, before any
    /// tick processing observes the state they touch.
    fn drain_session_events(&mut self, perception: &dyn Perception) {
        while let Some(event) = self.session.poll_event() {
            match event {
                SessionEvent::Connected => {
                    if let Some(zone) = self.zones.current() {
                        // The relay holds no session memory across a
                        // reconnect; re-send the subscription for the zone
                        // we are still standing in.
                        info!(zone = zone.0, "reconnected inside a monitored zone, resubscribing");
                        self.session.send(ClientMessage::Join {
                            world: perception.current_world(),
                            chunk: zone.0,
                        });
                    }
                }
                SessionEvent::Disconnected => {
                    // Indistinguishable from an explicit revocation: the
                    // relay may have reassigned our role while we were away.
                    self.set_role(ReporterRole::Listener, "disconnected");
                }
                SessionEvent::Relay(RelayMessage::Role { is_reporter }) => {
                    self.on_role_message(is_reporter, perception);
                }
                SessionEvent::Relay(RelayMessage::Update { worlds }) => {
                    self.peers.apply_update(worlds);
                }
            }
        }
    }

    fn on_role_message(&mut self, is_reporter: bool, perception: &dyn Perception) {
        if !is_reporter {
            self.set_role(ReporterRole::Listener, "revoked by relay");
            return;
        }
        self.set_role(ReporterRole::Reporter, "granted by relay");

        // Give the relay fresh data as soon as we become reporter instead
        // of waiting for the next gate pass.
        let Some(zone) = self.zones.current() else {
            return;
        };
        if !self.target.has_target() {
            self.target.scan(perception);
        }
        if let Some(state) = self.target.observed_state(perception) {
            self.send_report(perception, zone, state);
        }
    }

    fn on_zone_enter(&mut self, perception: &dyn Perception, zone: ZoneId) {
        let world = perception.current_world();
        info!(world, zone = zone.0, "entered monitored zone");
        self.session.send(ClientMessage::Join {
            world,
            chunk: zone.0,
        });
        self.target.scan(perception);
    }

    fn on_zone_exit(&mut self, perception: &dyn Perception, zone: ZoneId) {
        let world = perception.current_world();
        info!(world, zone = zone.0, "left monitored zone");
        self.session.send(ClientMessage::Leave { world });
        self.target.clear();
        self.set_role(ReporterRole::Listener, "left zone");
        self.gate.reset();
    }

    fn tick_in_zone(&mut self, perception: &dyn Perception, zone: ZoneId) {
        self.gate.tick();
        if self.role != ReporterRole::Reporter {
            return;
        }

        if !self.target.has_target() {
            self.target.scan(perception);
        }
        if !self.target.has_target() {
            if self.gate.target_missing() {
                let world = perception.current_world();
                info!(world, "target unseen too long, resigning reporter role");
                self.session.send(ClientMessage::Resign { world });
                self.set_role(ReporterRole::Listener, "no sight");
            }
            return;
        }
        self.gate.target_visible();

        // A target that wandered into another zone is somebody else's to
        // report; drop it and rescan next tick.
        if self.target.enforce_zone(perception, &self.zones, zone) {
            return;
        }
        let Some(state) = self.target.observed_state(perception) else {
            return;
        };
        if self.gate.should_report(&state) {
            self.send_report(perception, zone, state);
        }
    }

    fn send_report(&mut self, perception: &dyn Perception, zone: ZoneId, state: ObservedState) {
        let world = perception.current_world();
        debug!(
            world,
            chunk = zone.0,
            health = state.health_percent,
            total = state.total_players,
            attacking = state.attacking_players,
            reason = self.gate.report_reason(&state),
            "sending report"
        );
        self.session.send(ClientMessage::Report {
            world,
            chunk: zone.0,
            health: state.health_percent,
            total_players: state.total_players,
            attacking_players: state.attacking_players,
        });
        self.gate.mark_reported(state);
    }

    fn set_role(&mut self, role: ReporterRole, reason: &str) {
        if self.role == role {
            return;
        }
        info!(?role, reason, "reporter role changed");
        self.role = role;
        self.reporter_flag
            .store(role == ReporterRole::Reporter, Ordering::Relaxed);
        if role == ReporterRole::Listener {
            self.gate.reset();
        }
    }

    fn drive_world_jump(&mut self, jumper: &mut dyn WorldJumper) {
        if self.active_jump.is_none() {
            if let Ok(mut slot) = self.jump_intent.lock() {
                if let Some(world) = slot.take() {
                    info!(world, "world jump requested");
                    self.active_jump = Some(world);
                    self.jump_attempts = 0;
                }
            }
        }
        let Some(world) = self.active_jump else {
            return;
        };
        if jumper.attempt_jump(world) {
            debug!(world, "world jump issued");
            self.active_jump = None;
            self.jump_attempts = 0;
        } else {
            self.jump_attempts += 1;
            if self.jump_attempts >= self.max_jump_attempts {
                warn!(
                    world,
                    attempts = self.jump_attempts,
                    "world jump abandoned"
                );
                self.active_jump = None;
                self.jump_attempts = 0;
            }
        }
    }
}
