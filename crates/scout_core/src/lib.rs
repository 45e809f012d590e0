//! # Scout Core - Crowdsourced Target Scouting Client
//!
//! The client-side core for crowdsourcing observation of a single shared,
//! ephemeral game entity ("the target") across many game worlds. At most
//! one client per world actively observes and reports the target's state;
//! every other interested client passively consumes the aggregated
//! per-world table fanned out by a relay.
//!
//! ## Design Philosophy
//!
//! The core contains **no presentation and no engine bindings** — it is
//! meant to be embedded in a host game client, which supplies perception
//! queries and a world-switch primitive through the traits in
//! [`perception`]:
//!
//! * **Zone state machine** - per-tick classification with enter/exit edges
//! * **Target tracking** - acquisition, loss, and re-acquisition of the
//!   single target instance per zone
//! * **Report gating** - change detection plus a heartbeat upper bound,
//!   trading report frequency for bandwidth
//! * **Role lifecycle** - reporter role derived exclusively from relay
//!   messages; never self-assigned
//! * **Session management** - reconnect-forever relay connection with
//!   resubscription, owned by a dedicated task
//!
//! ## Tick Flow
//!
//! 1. The host invokes [`ScoutingCoordinator::tick`] once per simulation
//!    step with fresh perception access
//! 2. Queued relay events (role grants, peer updates, connection changes)
//!    are applied in arrival order before anything else runs
//! 3. Zone transitions drive `join`/`leave` subscription messages
//! 4. While inside a zone with the reporter role, the target is observed
//!    and the gate decides whether a `report` goes out
//!
//! ## Thread Safety
//!
//! The tick driver owns all coordinator state and performs no blocking
//! I/O. The session task owns the socket and the reconnect timer; all
//! cross-thread flow is message passing. The peer table is the single
//! lock-guarded shared structure, read through copy-on-read snapshots.
//!
//! ## Error Handling
//!
//! There are no fatal error paths: transient network failures recover via
//! reconnect, per-message protocol errors are logged and dropped, and
//! perception inconsistencies are ordinary state transitions.

// Re-export core types for easy access
pub use config::ScoutConfig;
pub use coordinator::{ReporterRole, ScoutHandle, ScoutingCoordinator};
pub use error::ScoutError;
pub use gate::{GatePolicy, ReportGate};
pub use peers::{PeerDataStore, SortKey, DEFAULT_STALE_AFTER_MS};
pub use perception::{
    EntityHandle, EntityInfo, HealthBar, Perception, PlayerInfo, RegionId, WorldId, WorldJumper,
};
pub use protocol::{ClientMessage, PeerRecord, RelayMessage};
pub use session::{ConnectionState, SessionConfig, SessionEvent, SessionManager};
pub use target::{ObservedState, TargetSelector, TargetTracker};
pub use zone::{ZoneId, ZoneTracker, ZoneTransition};

// Public module declarations
pub mod config;
pub mod coordinator;
pub mod error;
pub mod gate;
pub mod peers;
pub mod perception;
pub mod protocol;
pub mod session;
pub mod target;
pub mod zone;
