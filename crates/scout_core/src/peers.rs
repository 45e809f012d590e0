//! Shared table of the most recent report per world.
//!
//! Written only by the coordinator's inbound-message handling; read by
//! display code on its own cadence. Readers always get a copied snapshot,
//! never a live reference into the table.

use crate::protocol::PeerRecord;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Age in milliseconds at which a record stops being shown.
pub const DEFAULT_STALE_AFTER_MS: u64 = 90_000;

/// Column a display snapshot is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    World,
    Zone,
    Health,
    Players,
}

/// Most recent relay report per world, with freshness filtering.
///
/// Records are never deleted; staleness is a derived property of a
/// record's age, and a stale record stays in the table until a newer
/// update for the same world overwrites it.
#[derive(Debug, Clone)]
pub struct PeerDataStore {
    records: Arc<RwLock<HashMap<u32, PeerRecord>>>,
    stale_after_ms: u64,
}

impl PeerDataStore {
    pub fn new(stale_after_ms: u64) -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            stale_after_ms,
        }
    }

    /// Merges an `update` message into the table. Each record overwrites
    /// the prior entry for its world; worlds absent from the update keep
    /// whatever they had.
    pub fn apply_update(&self, worlds: Vec<PeerRecord>) {
        let count = worlds.len();
        if let Ok(mut records) = self.records.write() {
            for record in worlds {
                records.insert(record.world, record);
            }
            debug!(updated = count, tracked = records.len(), "applied peer update");
        }
    }

    /// Whether a record is still fresh at `now_ms`.
    pub fn is_fresh(&self, record: &PeerRecord, now_ms: u64) -> bool {
        now_ms.saturating_sub(record.last_update) < self.stale_after_ms
    }

    /// Copies every stored record, fresh or stale, in world order.
    pub fn snapshot(&self) -> Vec<PeerRecord> {
        let mut all: Vec<PeerRecord> = match self.records.read() {
            Ok(records) => records.values().cloned().collect(),
            Err(_) => Vec::new(),
        };
        all.sort_by_key(|r| r.world);
        all
    }

    /// Copies the fresh records sorted for display.
    pub fn fresh_sorted(&self, key: SortKey, ascending: bool) -> Vec<PeerRecord> {
        self.fresh_sorted_at(key, ascending, now_millis())
    }

    /// As [`fresh_sorted`](Self::fresh_sorted) with an explicit clock, so
    /// freshness boundaries are testable.
    pub fn fresh_sorted_at(&self, key: SortKey, ascending: bool, now_ms: u64) -> Vec<PeerRecord> {
        let mut fresh: Vec<PeerRecord> = match self.records.read() {
            Ok(records) => records
                .values()
                .filter(|r| self.is_fresh(r, now_ms))
                .cloned()
                .collect(),
            Err(_) => Vec::new(),
        };

        match key {
            SortKey::World => fresh.sort_by_key(|r| r.world),
            SortKey::Zone => fresh.sort_by_key(|r| r.chunk),
            SortKey::Health => fresh.sort_by_key(|r| r.health),
            SortKey::Players => fresh.sort_by_key(|r| r.total_players),
        }
        if !ascending {
            fresh.reverse();
        }
        fresh
    }

    /// Number of worlds with any record, fresh or stale.
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Current wall-clock time as epoch milliseconds.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(world: u32, health: u8, total: u32, last_update: u64) -> PeerRecord {
        PeerRecord {
            world,
            chunk: 4913,
            health,
            total_players: total,
            attacking_players: 0,
            last_update,
        }
    }

    #[test]
    fn freshness_boundary() {
        let store = PeerDataStore::new(DEFAULT_STALE_AFTER_MS);
        let now: u64 = 10_000_000;
        assert!(store.is_fresh(&record(301, 80, 3, now - 89_999), now));
        assert!(!store.is_fresh(&record(301, 80, 3, now - 90_000), now));
        assert!(!store.is_fresh(&record(301, 80, 3, now - 90_001), now));
    }

    #[test]
    fn update_overwrites_by_world_and_keeps_others() {
        let store = PeerDataStore::new(DEFAULT_STALE_AFTER_MS);
        store.apply_update(vec![record(301, 80, 3, 1_000), record(302, 60, 5, 1_000)]);
        store.apply_update(vec![record(301, 40, 7, 2_000)]);

        let all = store.snapshot();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].world, 301);
        assert_eq!(all[0].health, 40);
        assert_eq!(all[0].last_update, 2_000);
        assert_eq!(all[1].world, 302);
        assert_eq!(all[1].health, 60);
    }

    #[test]
    fn stale_records_hidden_from_display_but_retained() {
        let store = PeerDataStore::new(DEFAULT_STALE_AFTER_MS);
        let now: u64 = 10_000_000;
        store.apply_update(vec![
            record(301, 80, 3, now - 5_000),
            record(302, 60, 5, now - 95_000),
        ]);

        let shown = store.fresh_sorted_at(SortKey::World, true, now);
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].world, 301);

        // The stale record is still stored, awaiting a newer update.
        assert_eq!(store.len(), 2);
        store.apply_update(vec![record(302, 50, 2, now)]);
        let shown = store.fresh_sorted_at(SortKey::World, true, now);
        assert_eq!(shown.len(), 2);
    }

    #[test]
    fn sort_keys_and_direction() {
        let store = PeerDataStore::new(DEFAULT_STALE_AFTER_MS);
        let now: u64 = 10_000_000;
        store.apply_update(vec![
            record(303, 20, 9, now),
            record(301, 80, 3, now),
            record(302, 50, 6, now),
        ]);

        let by_world: Vec<u32> = store
            .fresh_sorted_at(SortKey::World, true, now)
            .iter()
            .map(|r| r.world)
            .collect();
        assert_eq!(by_world, vec![301, 302, 303]);

        let by_health_desc: Vec<u8> = store
            .fresh_sorted_at(SortKey::Health, false, now)
            .iter()
            .map(|r| r.health)
            .collect();
        assert_eq!(by_health_desc, vec![80, 50, 20]);

        let by_players: Vec<u32> = store
            .fresh_sorted_at(SortKey::Players, true, now)
            .iter()
            .map(|r| r.total_players)
            .collect();
        assert_eq!(by_players, vec![3, 6, 9]);
    }
}
