//! Report gating: change detection, heartbeat, and the no-sight policy.

use crate::target::ObservedState;
use serde::{Deserialize, Serialize};

/// Thresholds governing when reports are emitted and when an unseen target
/// forces resignation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatePolicy {
    /// Health change (percentage points) that must be exceeded to report
    pub health_delta: u8,
    /// Ticks without a report before a heartbeat report is forced
    pub heartbeat_ticks: u32,
    /// Consecutive target-missing ticks before the reporter role is
    /// voluntarily resigned
    pub no_sight_ticks: u32,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            health_delta: 5,
            heartbeat_ticks: 100,
            no_sight_ticks: 50,
        }
    }
}

/// Decides whether an observed state change is worth transmitting.
///
/// This is a debouncing policy: it trades report frequency for bandwidth
/// while guaranteeing an upper bound between reports whenever a reporter is
/// active, so the relay's freshness timer stays alive even with no state
/// change.
#[derive(Debug)]
pub struct ReportGate {
    policy: GatePolicy,
    last_reported: Option<ObservedState>,
    ticks_since_report: u32,
    ticks_without_target: u32,
}

impl ReportGate {
    pub fn new(policy: GatePolicy) -> Self {
        Self {
            policy,
            last_reported: None,
            ticks_since_report: 0,
            ticks_without_target: 0,
        }
    }

    /// Advances the heartbeat counter. Called once per tick inside a zone.
    pub fn tick(&mut self) {
        self.ticks_since_report = self.ticks_since_report.saturating_add(1);
    }

    /// Ticks elapsed since the last reported snapshot.
    pub fn ticks_since_report(&self) -> u32 {
        self.ticks_since_report
    }

    /// Whether the current observation is due for transmission.
    ///
    /// A missing last snapshot is an implicit large delta: the first
    /// observation always reports.
    pub fn should_report(&self, current: &ObservedState) -> bool {
        let Some(last) = &self.last_reported else {
            return true;
        };
        let health_changed = (i32::from(current.health_percent) - i32::from(last.health_percent))
            .abs()
            > i32::from(self.policy.health_delta);
        let players_changed = current.total_players != last.total_players;
        let heartbeat = self.ticks_since_report >= self.policy.heartbeat_ticks;
        health_changed || players_changed || heartbeat
    }

    /// Short label for why the current observation is due, for logging.
    pub fn report_reason(&self, current: &ObservedState) -> &'static str {
        match &self.last_reported {
            None => "first observation",
            Some(last) => {
                if (i32::from(current.health_percent) - i32::from(last.health_percent)).abs()
                    > i32::from(self.policy.health_delta)
                {
                    "health"
                } else if current.total_players != last.total_players {
                    "players"
                } else {
                    "heartbeat"
                }
            }
        }
    }

    /// Records a transmitted snapshot and zeroes the heartbeat counter.
    pub fn mark_reported(&mut self, state: ObservedState) {
        self.last_reported = Some(state);
        self.ticks_since_report = 0;
    }

    /// Notes a tick on which the target was visible.
    pub fn target_visible(&mut self) {
        self.ticks_without_target = 0;
    }

    /// Notes a tick on which the target was missing while holding the
    /// reporter role. Returns `true` when the no-sight threshold is reached
    /// and resignation is due; the counter resets after firing.
    pub fn target_missing(&mut self) -> bool {
        self.ticks_without_target = self.ticks_without_target.saturating_add(1);
        if self.ticks_without_target >= self.policy.no_sight_ticks {
            self.ticks_without_target = 0;
            return true;
        }
        false
    }

    /// Clears the snapshot and both counters. Called on zone exit and role
    /// loss.
    pub fn reset(&mut self) {
        self.last_reported = None;
        self.ticks_since_report = 0;
        self.ticks_without_target = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(health: u8, total: u32, attacking: u32) -> ObservedState {
        ObservedState {
            health_percent: health,
            total_players: total,
            attacking_players: attacking,
        }
    }

    #[test]
    fn first_observation_always_reports() {
        let gate = ReportGate::new(GatePolicy::default());
        assert!(gate.should_report(&state(100, 0, 0)));
    }

    #[test]
    fn health_delta_boundary() {
        let mut gate = ReportGate::new(GatePolicy::default());
        gate.mark_reported(state(50, 3, 1));

        // Delta of exactly 5 stays quiet; 6 reports.
        assert!(!gate.should_report(&state(55, 3, 1)));
        assert!(!gate.should_report(&state(45, 3, 1)));
        assert!(gate.should_report(&state(56, 3, 1)));
        assert!(gate.should_report(&state(44, 3, 1)));
    }

    #[test]
    fn player_count_change_reports() {
        let mut gate = ReportGate::new(GatePolicy::default());
        gate.mark_reported(state(50, 3, 1));
        assert!(gate.should_report(&state(50, 4, 1)));
        // Attacking-count changes alone do not gate.
        assert!(!gate.should_report(&state(50, 3, 2)));
    }

    #[test]
    fn heartbeat_fires_at_exactly_the_threshold() {
        let mut gate = ReportGate::new(GatePolicy::default());
        gate.mark_reported(state(50, 3, 1));

        for _ in 0..99 {
            gate.tick();
        }
        assert!(!gate.should_report(&state(50, 3, 1)));

        gate.tick();
        assert_eq!(gate.ticks_since_report(), 100);
        assert!(gate.should_report(&state(50, 3, 1)));
        assert_eq!(gate.report_reason(&state(50, 3, 1)), "heartbeat");

        // Reporting resets the counter.
        gate.mark_reported(state(50, 3, 1));
        assert_eq!(gate.ticks_since_report(), 0);
        assert!(!gate.should_report(&state(50, 3, 1)));
    }

    #[test]
    fn no_sight_fires_at_fifty_not_before() {
        let mut gate = ReportGate::new(GatePolicy::default());
        for _ in 0..49 {
            assert!(!gate.target_missing());
        }
        assert!(gate.target_missing());
    }

    #[test]
    fn sighting_resets_the_no_sight_counter() {
        let mut gate = ReportGate::new(GatePolicy::default());
        for _ in 0..49 {
            assert!(!gate.target_missing());
        }
        gate.target_visible();
        for _ in 0..49 {
            assert!(!gate.target_missing());
        }
        assert!(gate.target_missing());
    }

    #[test]
    fn reset_clears_snapshot_and_counters() {
        let mut gate = ReportGate::new(GatePolicy::default());
        gate.mark_reported(state(50, 3, 1));
        gate.tick();
        gate.reset();
        assert_eq!(gate.ticks_since_report(), 0);
        assert!(gate.should_report(&state(50, 3, 1)));
    }
}
