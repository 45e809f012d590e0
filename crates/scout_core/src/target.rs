//! Target acquisition, loss tracking, and state observation.

use crate::perception::{EntityHandle, EntityInfo, Perception};
use crate::zone::{ZoneId, ZoneTracker};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A fresh snapshot of the tracked target, computed once per tick while a
/// target is held. Undefined (never computed) with no target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservedState {
    /// Target health percentage, 0..=100
    pub health_percent: u8,
    /// Players perceivable in the zone
    pub total_players: u32,
    /// Players currently engaging the target; never exceeds `total_players`
    pub attacking_players: u32,
}

/// Identity predicate for the scouted target.
///
/// The canonical type identifier is checked first for every scanned entity.
/// The fuzzy name fallback exists because the canonical identifier is not
/// always resolved at spawn time; it matches names containing both the
/// required and class tokens while rejecting the exclusion token. The
/// fallback is a known source of potential false positives under unusual
/// entity names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSelector {
    /// Canonical entity type identifier
    pub canonical_id: u32,
    /// Token the fuzzy name match requires
    pub name_token: String,
    /// Second token the fuzzy name match requires
    pub class_token: String,
    /// Token that disqualifies an otherwise-matching name
    pub exclude_token: String,
}

impl TargetSelector {
    /// Whether an entity satisfies the identity predicate. The canonical
    /// id check takes priority; the name check only runs when it fails.
    pub fn matches(&self, entity: &EntityInfo) -> bool {
        if entity.type_id == Some(self.canonical_id) {
            return true;
        }
        entity
            .name
            .as_deref()
            .map(|name| self.matches_name(name))
            .unwrap_or(false)
    }

    fn matches_name(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        lower.contains(&self.name_token)
            && lower.contains(&self.class_token)
            && !lower.contains(&self.exclude_token)
    }
}

/// Tracks the single target instance within the current zone.
///
/// Owns the only live [`EntityHandle`] in the system. The handle is
/// dropped on despawn, zone exit, or when the target wanders into a
/// different zone; re-acquisition is attempted by scanning on the next
/// tick. Tracking has no side effects — it never triggers reports itself.
#[derive(Debug)]
pub struct TargetTracker {
    selector: TargetSelector,
    current: Option<EntityHandle>,
}

impl TargetTracker {
    pub fn new(selector: TargetSelector) -> Self {
        Self {
            selector,
            current: None,
        }
    }

    pub fn has_target(&self) -> bool {
        self.current.is_some()
    }

    pub fn current_handle(&self) -> Option<EntityHandle> {
        self.current
    }

    /// Drops the held handle, if any. Called on zone exit.
    pub fn clear(&mut self) {
        self.current = None;
    }

    /// Scans all perceivable entities for a target match. First match in
    /// scan order wins; at most one target instance is expected per zone in
    /// practice, but nothing here assumes it.
    pub fn scan(&mut self, perception: &dyn Perception) {
        let entities = perception.visible_entities();
        let scanned = entities.len();
        for entity in entities {
            if self.selector.matches(&entity) {
                debug!(
                    handle = entity.handle.0,
                    type_id = ?entity.type_id,
                    name = entity.name.as_deref().unwrap_or(""),
                    "acquired target"
                );
                self.current = Some(entity.handle);
                return;
            }
        }
        debug!(scanned, "target not found in visible entities");
    }

    /// Adopts a freshly spawned entity when it matches the predicate.
    /// Replaces any held handle; a respawn supersedes the stale instance.
    pub fn note_spawn(&mut self, entity: &EntityInfo) {
        if self.selector.matches(entity) {
            debug!(handle = entity.handle.0, "target spawned");
            self.current = Some(entity.handle);
        }
    }

    /// Drops the held handle when the despawn names that exact handle.
    /// Despawns of unrelated entities are ignored.
    pub fn note_despawn(&mut self, handle: EntityHandle) {
        if self.current == Some(handle) {
            debug!(handle = handle.0, "target despawned");
            self.current = None;
        }
    }

    /// Drops the handle when the target's own location no longer maps to
    /// the expected zone. Returns `true` when the handle was dropped; the
    /// caller retries acquisition on the next tick.
    pub fn enforce_zone(
        &mut self,
        perception: &dyn Perception,
        zones: &ZoneTracker,
        expected: ZoneId,
    ) -> bool {
        let Some(handle) = self.current else {
            return false;
        };
        let target_zone = perception
            .entity_region(handle)
            .and_then(|region| zones.zone_of(region));
        if target_zone != Some(expected) {
            debug!(
                handle = handle.0,
                ?target_zone,
                expected = expected.0,
                "target left the current zone, dropping handle"
            );
            self.current = None;
            return true;
        }
        false
    }

    /// Computes a fresh state snapshot for the held target.
    pub fn observed_state(&self, perception: &dyn Perception) -> Option<ObservedState> {
        let handle = self.current?;
        let health_percent = perception
            .entity_health(handle)
            .map(|bar| bar.percent())
            .unwrap_or(100);

        let mut total_players = 0;
        let mut attacking_players = 0;
        for player in perception.players() {
            total_players += 1;
            if player.interacting_with == Some(handle) {
                attacking_players += 1;
            }
        }

        Some(ObservedState {
            health_percent,
            total_players,
            attacking_players,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perception::{HealthBar, PlayerInfo, RegionId, WorldId};
    use std::collections::HashMap;

    fn selector() -> TargetSelector {
        TargetSelector {
            canonical_id: 14779,
            name_token: "gemstone".to_string(),
            class_token: "crab".to_string(),
            exclude_token: "shell".to_string(),
        }
    }

    fn entity(handle: u64, type_id: Option<u32>, name: Option<&str>) -> EntityInfo {
        EntityInfo {
            handle: EntityHandle(handle),
            type_id,
            name: name.map(str::to_string),
        }
    }

    /// Scripted perception backend for tracker tests.
    struct FakeWorld {
        region: Option<RegionId>,
        entities: Vec<EntityInfo>,
        entity_regions: HashMap<u64, RegionId>,
        health: Option<HealthBar>,
        players: Vec<PlayerInfo>,
    }

    impl FakeWorld {
        fn empty() -> Self {
            Self {
                region: Some(4913),
                entities: Vec::new(),
                entity_regions: HashMap::new(),
                health: None,
                players: Vec::new(),
            }
        }
    }

    impl Perception for FakeWorld {
        fn current_region(&self) -> Option<RegionId> {
            self.region
        }

        fn current_world(&self) -> WorldId {
            301
        }

        fn visible_entities(&self) -> Vec<EntityInfo> {
            self.entities.clone()
        }

        fn entity_region(&self, handle: EntityHandle) -> Option<RegionId> {
            self.entity_regions.get(&handle.0).copied()
        }

        fn entity_health(&self, _handle: EntityHandle) -> Option<HealthBar> {
            self.health
        }

        fn players(&self) -> Vec<PlayerInfo> {
            self.players.clone()
        }
    }

    #[test]
    fn canonical_id_matches_regardless_of_name() {
        let sel = selector();
        assert!(sel.matches(&entity(1, Some(14779), Some("Something else"))));
        assert!(sel.matches(&entity(1, Some(14779), None)));
    }

    #[test]
    fn fuzzy_name_match_requires_both_tokens_and_no_exclusion() {
        let sel = selector();
        assert!(sel.matches(&entity(1, None, Some("Gemstone Crab"))));
        assert!(sel.matches(&entity(1, Some(5), Some("GEMSTONE CRAB"))));
        assert!(!sel.matches(&entity(1, None, Some("Gemstone Crab Shell"))));
        assert!(!sel.matches(&entity(1, None, Some("Gemstone Golem"))));
        assert!(!sel.matches(&entity(1, None, Some("Rock Crab"))));
        assert!(!sel.matches(&entity(1, None, None)));
    }

    #[test]
    fn scan_takes_first_match_in_order() {
        let mut world = FakeWorld::empty();
        world.entities = vec![
            entity(1, Some(1), Some("Seagull")),
            entity(2, None, Some("Gemstone Crab")),
            entity(3, Some(14779), None),
        ];
        let mut tracker = TargetTracker::new(selector());
        tracker.scan(&world);
        assert_eq!(tracker.current_handle(), Some(EntityHandle(2)));
    }

    #[test]
    fn despawn_of_unrelated_handle_is_ignored() {
        let mut tracker = TargetTracker::new(selector());
        tracker.note_spawn(&entity(7, Some(14779), None));
        assert!(tracker.has_target());

        tracker.note_despawn(EntityHandle(99));
        assert!(tracker.has_target());

        tracker.note_despawn(EntityHandle(7));
        assert!(!tracker.has_target());
    }

    #[test]
    fn spawn_replaces_stale_handle() {
        let mut tracker = TargetTracker::new(selector());
        tracker.note_spawn(&entity(7, Some(14779), None));
        tracker.note_spawn(&entity(8, Some(14779), None));
        assert_eq!(tracker.current_handle(), Some(EntityHandle(8)));
    }

    #[test]
    fn zone_mismatch_drops_the_handle() {
        let mut zones = HashMap::new();
        zones.insert(4913u32, ZoneId(4913));
        zones.insert(4911u32, ZoneId(4911));
        let zones = ZoneTracker::new(zones);

        let mut world = FakeWorld::empty();
        world.entity_regions.insert(7, 4911);

        let mut tracker = TargetTracker::new(selector());
        tracker.note_spawn(&entity(7, Some(14779), None));
        assert!(tracker.enforce_zone(&world, &zones, ZoneId(4913)));
        assert!(!tracker.has_target());
    }

    #[test]
    fn matching_zone_keeps_the_handle() {
        let mut zones = HashMap::new();
        zones.insert(4913u32, ZoneId(4913));
        let zones = ZoneTracker::new(zones);

        let mut world = FakeWorld::empty();
        world.entity_regions.insert(7, 4913);

        let mut tracker = TargetTracker::new(selector());
        tracker.note_spawn(&entity(7, Some(14779), None));
        assert!(!tracker.enforce_zone(&world, &zones, ZoneId(4913)));
        assert!(tracker.has_target());
    }

    #[test]
    fn observed_state_counts_attackers() {
        let mut world = FakeWorld::empty();
        world.health = Some(HealthBar { ratio: 24, scale: 30 });
        world.players = vec![
            PlayerInfo { interacting_with: Some(EntityHandle(7)) },
            PlayerInfo { interacting_with: None },
            PlayerInfo { interacting_with: Some(EntityHandle(9)) },
        ];

        let mut tracker = TargetTracker::new(selector());
        tracker.note_spawn(&entity(7, Some(14779), None));

        let state = tracker.observed_state(&world).unwrap();
        assert_eq!(state.health_percent, 80);
        assert_eq!(state.total_players, 3);
        assert_eq!(state.attacking_players, 1);
    }

    #[test]
    fn hidden_health_bar_reports_full() {
        let mut tracker = TargetTracker::new(selector());
        tracker.note_spawn(&entity(7, Some(14779), None));
        let world = FakeWorld::empty();
        let state = tracker.observed_state(&world).unwrap();
        assert_eq!(state.health_percent, 100);
    }
}
