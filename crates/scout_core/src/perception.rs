//! Collaborator interfaces consumed by the scouting core.
//!
//! The core never talks to a game engine directly. The host embeds it and
//! supplies read-only perception queries plus a best-effort world-switch
//! primitive through the traits defined here. Everything is queried fresh
//! each tick; the core holds no references into engine memory beyond the
//! opaque [`EntityHandle`].

/// Identifier of a map region as reported by the host engine.
pub type RegionId = u32;

/// Identifier of a game world (server instance).
pub type WorldId = u32;

/// Opaque, comparable reference to a perceivable entity instance.
///
/// Owned exclusively by the target tracker while a target is held; becomes
/// meaningless once the engine despawns the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityHandle(pub u64);

/// Identity-relevant facts about one perceivable entity.
#[derive(Debug, Clone)]
pub struct EntityInfo {
    pub handle: EntityHandle,
    /// Canonical type identifier, when the engine has resolved it. Not
    /// always populated at spawn time.
    pub type_id: Option<u32>,
    /// Display name, when available.
    pub name: Option<String>,
}

/// One perceivable player, reduced to what the core needs.
#[derive(Debug, Clone, Copy)]
pub struct PlayerInfo {
    /// The entity this player is currently interacting with, if any.
    pub interacting_with: Option<EntityHandle>,
}

/// A raw health bar reading: `ratio` filled segments out of `scale`.
///
/// Engines report `-1` for either component while the bar is not being
/// displayed; such a reading is treated as full health.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthBar {
    pub ratio: i32,
    pub scale: i32,
}

impl HealthBar {
    /// Converts the reading to a 0..=100 percentage.
    pub fn percent(&self) -> u8 {
        if self.ratio < 0 || self.scale <= 0 {
            return 100;
        }
        let pct = (self.ratio as i64 * 100) / self.scale as i64;
        pct.clamp(0, 100) as u8
    }
}

/// Read-only per-tick game-state queries supplied by the host.
///
/// Implementations must be cheap; every method may be called once or more
/// per tick. None of them may block.
pub trait Perception {
    /// The region the local observer currently stands in, or `None` while
    /// not in a world (login screen, loading, mid-switch).
    fn current_region(&self) -> Option<RegionId>;

    /// The world the local observer is connected to.
    fn current_world(&self) -> WorldId;

    /// All currently perceivable candidate entities, in engine scan order.
    fn visible_entities(&self) -> Vec<EntityInfo>;

    /// The region an entity currently occupies, or `None` if it is no
    /// longer perceivable.
    fn entity_region(&self, handle: EntityHandle) -> Option<RegionId>;

    /// The entity's health bar reading, if one is being displayed.
    fn entity_health(&self, handle: EntityHandle) -> Option<HealthBar>;

    /// All perceivable players.
    fn players(&self) -> Vec<PlayerInfo>;
}

/// Best-effort world-switch primitive supplied by the host.
pub trait WorldJumper {
    /// Performs one step of switching to `world`. Returns `true` once the
    /// switch has been issued; the coordinator retries a bounded number of
    /// times and then abandons the intent. Must not block.
    fn attempt_jump(&mut self, world: WorldId) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_percent_from_ratio_and_scale() {
        assert_eq!(HealthBar { ratio: 24, scale: 30 }.percent(), 80);
        assert_eq!(HealthBar { ratio: 0, scale: 30 }.percent(), 0);
        assert_eq!(HealthBar { ratio: 30, scale: 30 }.percent(), 100);
    }

    #[test]
    fn hidden_health_bar_reads_full() {
        assert_eq!(HealthBar { ratio: -1, scale: 30 }.percent(), 100);
        assert_eq!(HealthBar { ratio: 24, scale: -1 }.percent(), 100);
        assert_eq!(HealthBar { ratio: -1, scale: -1 }.percent(), 100);
    }
}
