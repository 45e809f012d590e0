//! Per-tick zone classification and enter/exit edge detection.

use crate::perception::RegionId;
use std::collections::HashMap;

/// Identifier of a monitored zone.
///
/// Zones correspond one-to-one with monitored regions, so the zone id is
/// the region id of the zone's anchor region; it is also the wire-level
/// `chunk` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ZoneId(pub u32);

/// Result of one classification step.
///
/// At most one zone is current at any tick. Crossing directly from one
/// zone into another yields both an `exited` and an `entered` edge in the
/// same tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneTransition {
    /// The zone occupied this tick, if any.
    pub current: Option<ZoneId>,
    /// Set when this tick crossed into a zone.
    pub entered: Option<ZoneId>,
    /// Set when this tick crossed out of a zone.
    pub exited: Option<ZoneId>,
}

/// Classifies the observer's region against a fixed set of monitored zones.
///
/// Pure over a static region→zone mapping; the only retained state is the
/// previous classification, used to detect edges. Unknown regions (and no
/// region at all) classify to no zone — there are no error conditions.
#[derive(Debug)]
pub struct ZoneTracker {
    zones: HashMap<RegionId, ZoneId>,
    previous: Option<ZoneId>,
}

impl ZoneTracker {
    /// Creates a tracker over the given region→zone mapping.
    pub fn new(zones: HashMap<RegionId, ZoneId>) -> Self {
        Self {
            zones,
            previous: None,
        }
    }

    /// Looks a region up in the static mapping without touching edge state.
    pub fn zone_of(&self, region: RegionId) -> Option<ZoneId> {
        self.zones.get(&region).copied()
    }

    /// The zone produced by the most recent [`classify`](Self::classify).
    pub fn current(&self) -> Option<ZoneId> {
        self.previous
    }

    /// Classifies the current region and reports enter/exit edges against
    /// the previous tick. Call exactly once per tick.
    pub fn classify(&mut self, region: Option<RegionId>) -> ZoneTransition {
        let current = region.and_then(|r| self.zone_of(r));
        let transition = if current == self.previous {
            ZoneTransition {
                current,
                entered: None,
                exited: None,
            }
        } else {
            ZoneTransition {
                current,
                entered: current,
                exited: self.previous,
            }
        };
        self.previous = current;
        transition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> ZoneTracker {
        let mut zones = HashMap::new();
        zones.insert(4913, ZoneId(4913));
        zones.insert(4911, ZoneId(4911));
        ZoneTracker::new(zones)
    }

    #[test]
    fn unknown_region_maps_to_none() {
        let mut t = tracker();
        let step = t.classify(Some(9999));
        assert_eq!(step.current, None);
        assert_eq!(step.entered, None);
        assert_eq!(step.exited, None);
    }

    #[test]
    fn enter_edge_fires_once_per_interval() {
        let mut t = tracker();
        let step = t.classify(Some(4913));
        assert_eq!(step.entered, Some(ZoneId(4913)));

        // Repeated ticks inside the same zone produce no further edges.
        for _ in 0..10 {
            let step = t.classify(Some(4913));
            assert_eq!(step.current, Some(ZoneId(4913)));
            assert_eq!(step.entered, None);
            assert_eq!(step.exited, None);
        }

        let step = t.classify(Some(1000));
        assert_eq!(step.exited, Some(ZoneId(4913)));
        assert_eq!(step.entered, None);
        assert_eq!(step.current, None);
    }

    #[test]
    fn logged_out_counts_as_exit() {
        let mut t = tracker();
        t.classify(Some(4913));
        let step = t.classify(None);
        assert_eq!(step.exited, Some(ZoneId(4913)));
    }

    #[test]
    fn direct_zone_to_zone_crossing_reports_both_edges() {
        let mut t = tracker();
        t.classify(Some(4913));
        let step = t.classify(Some(4911));
        assert_eq!(step.exited, Some(ZoneId(4913)));
        assert_eq!(step.entered, Some(ZoneId(4911)));
        assert_eq!(step.current, Some(ZoneId(4911)));
    }
}
