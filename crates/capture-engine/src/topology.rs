//! Monitor topology snapshots and the diff between consecutive ticks.
//!
//! A monitor whose geometry changes gets a new identity, so a resolution
//! change or a swap of two monitors' positions shows up as one removal
//! plus one addition. There is no rename detection.

use std::collections::{BTreeMap, BTreeSet};

use lapse_platform_core::{resolve_identities, MonitorIdentity, MonitorInfo, MonitorRecord};

/// Who is present at a given tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopologySnapshot {
    monitors: BTreeMap<MonitorIdentity, MonitorRecord>,
}

impl TopologySnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot from detected monitors. When two monitors resolve to
    /// the same identity the first one wins.
    pub fn from_monitors(monitors: &[MonitorInfo]) -> Self {
        let mut snapshot = Self::default();
        for record in resolve_identities(monitors) {
            if let Some(existing) = snapshot.monitors.get(&record.identity) {
                tracing::warn!(
                    identity = %record.identity,
                    kept = %existing.info.name,
                    dropped = %record.info.name,
                    "Two monitors share the same geometry"
                );
                continue;
            }
            snapshot.monitors.insert(record.identity, record);
        }
        snapshot
    }

    pub fn get(&self, identity: &MonitorIdentity) -> Option<&MonitorRecord> {
        self.monitors.get(identity)
    }

    pub fn contains(&self, identity: &MonitorIdentity) -> bool {
        self.monitors.contains_key(identity)
    }

    pub fn identities(&self) -> BTreeSet<MonitorIdentity> {
        self.monitors.keys().copied().collect()
    }

    /// Records in identity order.
    pub fn records(&self) -> impl Iterator<Item = &MonitorRecord> {
        self.monitors.values()
    }

    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }
}

/// Classification of every identity seen in either of two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopologyDiff {
    pub unchanged: BTreeSet<MonitorIdentity>,
    pub removed: BTreeSet<MonitorIdentity>,
    pub added: BTreeSet<MonitorIdentity>,
}

impl TopologyDiff {
    /// No monitor appeared or disappeared.
    pub fn is_quiescent(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }
}

/// Compare the previous tick's topology against the current one.
pub fn diff_topology(previous: &TopologySnapshot, current: &TopologySnapshot) -> TopologyDiff {
    let before = previous.identities();
    let after = current.identities();

    TopologyDiff {
        unchanged: before.intersection(&after).copied().collect(),
        removed: before.difference(&after).copied().collect(),
        added: after.difference(&before).copied().collect(),
    }
}
