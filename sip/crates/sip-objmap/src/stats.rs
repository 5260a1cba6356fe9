//! Stats Module - Object Map Counters
//!
//! Counts lookups, insertions, removals and table rebuilds so callers can
//! see how often the address-reuse and reorganisation paths are taken.

use indexmap::IndexMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Operation counters for one map
///
/// Counters are relaxed atomics so `find` can update them through `&self`.
#[derive(Debug, Default)]
pub struct MapStats {
    finds: AtomicU64,
    hits: AtomicU64,
    adds: AtomicU64,
    shared_adds: AtomicU64,
    displaced: AtomicU64,
    removes: AtomicU64,
    remove_misses: AtomicU64,
    reorganisations: AtomicU64,
    grows: AtomicU64,
    compactions: AtomicU64,
}

impl MapStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn record_find(&self, hit: bool) {
        self.finds.fetch_add(1, Ordering::Relaxed);
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub(crate) fn record_add(&self, shared: bool, displaced: usize) {
        self.adds.fetch_add(1, Ordering::Relaxed);
        if shared {
            self.shared_adds.fetch_add(1, Ordering::Relaxed);
        }
        self.displaced.fetch_add(displaced as u64, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_remove(&self, found: bool) {
        if found {
            self.removes.fetch_add(1, Ordering::Relaxed);
        } else {
            self.remove_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_reorganisation(&self, grew: bool) {
        self.reorganisations.fetch_add(1, Ordering::Relaxed);
        if grew {
            self.grows.fetch_add(1, Ordering::Relaxed);
        } else {
            self.compactions.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Point-in-time copy of all counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            finds: self.finds.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            adds: self.adds.load(Ordering::Relaxed),
            shared_adds: self.shared_adds.load(Ordering::Relaxed),
            displaced: self.displaced.load(Ordering::Relaxed),
            removes: self.removes.load(Ordering::Relaxed),
            remove_misses: self.remove_misses.load(Ordering::Relaxed),
            reorganisations: self.reorganisations.load(Ordering::Relaxed),
            grows: self.grows.load(Ordering::Relaxed),
            compactions: self.compactions.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero
    pub fn reset(&self) {
        for counter in [
            &self.finds,
            &self.hits,
            &self.adds,
            &self.shared_adds,
            &self.displaced,
            &self.removes,
            &self.remove_misses,
            &self.reorganisations,
            &self.grows,
            &self.compactions,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// Plain copy of [`MapStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub finds: u64,
    pub hits: u64,
    pub adds: u64,
    pub shared_adds: u64,
    pub displaced: u64,
    pub removes: u64,
    pub remove_misses: u64,
    pub reorganisations: u64,
    pub grows: u64,
    pub compactions: u64,
}

impl StatsSnapshot {
    /// Fraction of finds that returned a record
    pub fn hit_rate(&self) -> f64 {
        if self.finds == 0 {
            0.0
        } else {
            self.hits as f64 / self.finds as f64
        }
    }

    fn metrics(&self) -> IndexMap<&'static str, u64> {
        let mut metrics = IndexMap::new();
        metrics.insert("sip_objmap_finds_total", self.finds);
        metrics.insert("sip_objmap_hits_total", self.hits);
        metrics.insert("sip_objmap_adds_total", self.adds);
        metrics.insert("sip_objmap_shared_adds_total", self.shared_adds);
        metrics.insert("sip_objmap_displaced_total", self.displaced);
        metrics.insert("sip_objmap_removes_total", self.removes);
        metrics.insert("sip_objmap_remove_misses_total", self.remove_misses);
        metrics.insert("sip_objmap_reorganisations_total", self.reorganisations);
        metrics.insert("sip_objmap_grows_total", self.grows);
        metrics.insert("sip_objmap_compactions_total", self.compactions);
        metrics
    }

    /// Export to Prometheus text format
    pub fn to_prometheus(&self) -> String {
        let mut output = String::new();
        for (name, value) in self.metrics() {
            output.push_str(&format!("{} {}\n", name, value));
        }
        output
    }

    /// Export to JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let stats = MapStats::new();
        stats.record_find(true);
        stats.record_find(false);
        stats.record_add(true, 0);
        stats.record_add(false, 2);
        stats.record_remove(true);
        stats.record_remove(false);
        stats.record_reorganisation(true);
        stats.record_reorganisation(false);

        let snap = stats.snapshot();
        assert_eq!(snap.finds, 2);
        assert_eq!(snap.hits, 1);
        assert_eq!(snap.adds, 2);
        assert_eq!(snap.shared_adds, 1);
        assert_eq!(snap.displaced, 2);
        assert_eq!(snap.removes, 1);
        assert_eq!(snap.remove_misses, 1);
        assert_eq!(snap.reorganisations, 2);
        assert_eq!(snap.grows, 1);
        assert_eq!(snap.compactions, 1);
        assert!((snap.hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reset() {
        let stats = MapStats::new();
        stats.record_find(true);
        stats.reset();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn test_prometheus_order() {
        let snap = StatsSnapshot {
            finds: 3,
            ..Default::default()
        };
        let text = snap.to_prometheus();
        assert!(text.starts_with("sip_objmap_finds_total 3\n"));
        assert_eq!(text.lines().count(), 10);
    }

    #[test]
    fn test_json_export() {
        let snap = StatsSnapshot {
            grows: 4,
            ..Default::default()
        };
        let value: serde_json::Value = serde_json::from_str(&snap.to_json()).unwrap();
        assert_eq!(value["grows"], 4);
    }
}
