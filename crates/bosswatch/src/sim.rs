//! Simulated game world driving the coordinator without a host engine.
//!
//! The observer walks into a monitored camp after a short delay, watches a
//! target whose health decays under simulated attackers, and survives
//! world switches with a brief loading blackout — enough behavior to
//! exercise every coordinator path against a live relay.

use crate::config::{SimulationSettings, TargetSettings, ZoneSettings};
use rand::Rng;
use scout_core::{
    EntityHandle, EntityInfo, HealthBar, Perception, PlayerInfo, RegionId, WorldId, WorldJumper,
};

/// Region the observer stands in before walking to a camp.
const OUTSIDE_REGION: RegionId = 1;

/// Health bar scale used for the simulated target.
const HEALTH_SCALE: i32 = 30;

/// Spawn age below which the engine has not resolved the canonical type
/// id yet, leaving only the display name to match on.
const UNRESOLVED_ID_TICKS: u32 = 2;

#[derive(Debug)]
struct SimTarget {
    handle: EntityHandle,
    ratio: i32,
    age: u32,
}

/// Scripted observer implementing the perception contract.
#[derive(Debug)]
pub struct SimulatedObserver {
    world: WorldId,
    regions: Vec<RegionId>,
    camp_index: usize,
    entry_delay_ticks: u32,
    respawn_delay_ticks: u32,
    max_players: u32,
    target_type_id: u32,
    target_name: String,
    tick: u32,
    blackout: u32,
    region: Option<RegionId>,
    target: Option<SimTarget>,
    respawn_in: u32,
    next_handle: u64,
    players: u32,
    attacking: u32,
}

impl SimulatedObserver {
    pub fn new(
        settings: &SimulationSettings,
        zones: &[ZoneSettings],
        target: &TargetSettings,
    ) -> Self {
        let regions: Vec<RegionId> = zones.iter().map(|z| z.region).collect();
        let target_name = format!(
            "{} {}",
            capitalize(&target.name_token),
            capitalize(&target.class_token)
        );
        Self {
            world: settings.world,
            regions,
            camp_index: 0,
            entry_delay_ticks: settings.entry_delay_ticks,
            respawn_delay_ticks: settings.respawn_delay_ticks,
            max_players: settings.max_players.max(1),
            target_type_id: target.canonical_id,
            target_name,
            tick: 0,
            blackout: 0,
            region: None,
            target: None,
            respawn_in: 0,
            next_handle: 0,
            players: 1,
            attacking: 0,
        }
    }

    fn camp_region(&self) -> RegionId {
        self.regions[self.camp_index % self.regions.len().max(1)]
    }

    /// Advances the simulation by one tick.
    pub fn advance(&mut self) {
        if self.blackout > 0 {
            // World switch in progress; nothing is perceivable.
            self.blackout -= 1;
            self.region = None;
            return;
        }

        self.tick += 1;
        if self.tick <= self.entry_delay_ticks || self.regions.is_empty() {
            self.region = Some(OUTSIDE_REGION);
            return;
        }
        self.region = Some(self.camp_region());

        match &mut self.target {
            Some(target) => {
                target.age += 1;
                let chip = rand::thread_rng().gen_range(0..=self.attacking.min(2)) as i32;
                target.ratio = (target.ratio - chip).max(0);
                if target.ratio == 0 {
                    self.target = None;
                    self.respawn_in = self.respawn_delay_ticks;
                }
            }
            None => {
                if self.respawn_in > 0 {
                    self.respawn_in -= 1;
                } else {
                    self.next_handle += 1;
                    self.target = Some(SimTarget {
                        handle: EntityHandle(self.next_handle),
                        ratio: HEALTH_SCALE,
                        age: 0,
                    });
                }
            }
        }

        // Player churn: a gentle random walk, attackers only when there is
        // something to attack.
        let mut rng = rand::thread_rng();
        let step: i64 = rng.gen_range(-1..=1);
        self.players = (self.players as i64 + step).clamp(1, self.max_players as i64) as u32;
        self.attacking = if self.target.is_some() {
            rng.gen_range(0..=self.players)
        } else {
            0
        };
    }

    /// Completes a world switch: a few blacked-out loading ticks, then the
    /// walk back into the camp from outside.
    pub fn jump_to(&mut self, world: WorldId) {
        self.world = world;
        self.blackout = 3;
        self.region = None;
        self.target = None;
        self.respawn_in = 0;
        self.tick = 0;
    }
}

impl Perception for SimulatedObserver {
    fn current_region(&self) -> Option<RegionId> {
        self.region
    }

    fn current_world(&self) -> WorldId {
        self.world
    }

    fn visible_entities(&self) -> Vec<EntityInfo> {
        match &self.target {
            Some(target) => {
                let resolved = target.age >= UNRESOLVED_ID_TICKS;
                vec![EntityInfo {
                    handle: target.handle,
                    type_id: resolved.then_some(self.target_type_id),
                    name: Some(self.target_name.clone()),
                }]
            }
            None => Vec::new(),
        }
    }

    fn entity_region(&self, handle: EntityHandle) -> Option<RegionId> {
        match &self.target {
            Some(target) if target.handle == handle => Some(self.camp_region()),
            _ => None,
        }
    }

    fn entity_health(&self, handle: EntityHandle) -> Option<HealthBar> {
        match &self.target {
            Some(target) if target.handle == handle => Some(HealthBar {
                ratio: target.ratio,
                scale: HEALTH_SCALE,
            }),
            _ => None,
        }
    }

    fn players(&self) -> Vec<PlayerInfo> {
        let target = self.target.as_ref().map(|t| t.handle);
        let mut players = Vec::with_capacity(self.players as usize);
        for i in 0..self.players {
            players.push(PlayerInfo {
                interacting_with: if i < self.attacking { target } else { None },
            });
        }
        players
    }
}

/// Simulated world switcher: the first attempt opens the switcher, the
/// second issues the hop.
#[derive(Debug, Default)]
pub struct SimulatedSwitcher {
    switcher_open: bool,
    completed: Option<WorldId>,
}

impl SimulatedSwitcher {
    /// The world a completed hop landed on, if one finished since the last
    /// call. The application applies it to the observer between ticks.
    pub fn take_completed(&mut self) -> Option<WorldId> {
        self.completed.take()
    }
}

impl WorldJumper for SimulatedSwitcher {
    fn attempt_jump(&mut self, world: WorldId) -> bool {
        if !self.switcher_open {
            self.switcher_open = true;
            return false;
        }
        self.switcher_open = false;
        self.completed = Some(world);
        true
    }
}

fn capitalize(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn observer() -> SimulatedObserver {
        let config = AppConfig::default();
        SimulatedObserver::new(
            &config.simulation,
            &config.scouting.zones,
            &config.scouting.target,
        )
    }

    #[test]
    fn walks_into_the_camp_after_the_entry_delay() {
        let mut sim = observer();
        for _ in 0..10 {
            sim.advance();
            assert_eq!(sim.current_region(), Some(OUTSIDE_REGION));
        }
        sim.advance();
        assert_eq!(sim.current_region(), Some(4913));
    }

    #[test]
    fn target_spawns_and_matches_by_name_before_id_resolves() {
        let mut sim = observer();
        for _ in 0..11 {
            sim.advance();
        }
        let entities = sim.visible_entities();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].type_id, None);
        assert_eq!(entities[0].name.as_deref(), Some("Gemstone Crab"));

        sim.advance();
        sim.advance();
        let entities = sim.visible_entities();
        assert_eq!(entities[0].type_id, Some(14779));
    }

    #[test]
    fn jump_blacks_out_perception_then_recovers() {
        let mut sim = observer();
        for _ in 0..15 {
            sim.advance();
        }
        sim.jump_to(305);
        assert_eq!(sim.current_world(), 305);
        for _ in 0..3 {
            sim.advance();
            assert_eq!(sim.current_region(), None);
        }
        sim.advance();
        assert_eq!(sim.current_region(), Some(OUTSIDE_REGION));
    }

    #[test]
    fn switcher_opens_then_hops() {
        let mut switcher = SimulatedSwitcher::default();
        assert!(!switcher.attempt_jump(305));
        assert!(switcher.attempt_jump(305));
        assert_eq!(switcher.take_completed(), Some(305));
        assert_eq!(switcher.take_completed(), None);
    }
}
