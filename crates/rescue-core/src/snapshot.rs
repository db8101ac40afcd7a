//! Snapshot policy and the round-keyed snapshot table.
//!
//! Snapshots bound the cost of a seek: instead of replaying from round 1,
//! a seek starts from the closest snapshot at or before its target. The
//! table is sparse; lookups never assume every multiple of the interval
//! has been captured.

use std::collections::BTreeMap;

use crate::config::TimelineConfig;
use crate::round::Round;

/// When the timeline captures snapshots and whether seeks may use them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotPolicy {
    /// Capture a snapshot every `interval` rounds. Always at least 1.
    interval: u32,
    /// Use interval snapshots and the live round to shorten seeks.
    lazy: bool,
}

impl SnapshotPolicy {
    /// Default snapshot interval, in rounds.
    pub const DEFAULT_INTERVAL: u32 = 10;

    /// Create a policy. An interval of 0 is treated as 1.
    pub const fn new(interval: u32, lazy: bool) -> Self {
        let interval = if interval == 0 { 1 } else { interval };
        Self { interval, lazy }
    }

    /// Snapshot interval in rounds.
    pub const fn interval(self) -> u32 {
        self.interval
    }

    /// Whether seeks take the accelerated path.
    pub const fn is_lazy(self) -> bool {
        self.lazy
    }

    /// Whether a snapshot should be captured right after `round` starts.
    pub const fn is_due(self, round: u32) -> bool {
        round != 0 && matches!(round.checked_rem(self.interval), Some(0))
    }
}

impl Default for SnapshotPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INTERVAL, true)
    }
}

impl From<&TimelineConfig> for SnapshotPolicy {
    fn from(config: &TimelineConfig) -> Self {
        Self::new(config.snapshot_interval, config.lazy_snapshots)
    }
}

/// Deep copies of past rounds, keyed by round number.
#[derive(Debug, Clone, Default)]
pub struct SnapshotTable {
    /// Snapshots in round order.
    snapshots: BTreeMap<u32, Round>,
}

impl SnapshotTable {
    /// Create an empty table.
    pub const fn new() -> Self {
        Self {
            snapshots: BTreeMap::new(),
        }
    }

    /// Store a copy of `round`, keyed by its round number. An existing
    /// snapshot for the same round is kept.
    pub fn capture(&mut self, round: &Round) {
        self.snapshots
            .entry(round.round())
            .or_insert_with(|| round.clone());
    }

    /// Whether a snapshot exists for `round`.
    pub fn contains(&self, round: u32) -> bool {
        self.snapshots.contains_key(&round)
    }

    /// The snapshot for exactly `round`.
    pub fn get(&self, round: u32) -> Option<&Round> {
        self.snapshots.get(&round)
    }

    /// The snapshot with the highest round number not above `target`.
    pub fn closest_at_or_before(&self, target: u32) -> Option<&Round> {
        self.snapshots
            .range(..=target)
            .next_back()
            .map(|(_, round)| round)
    }

    /// Captured round numbers in ascending order.
    pub fn rounds(&self) -> Vec<u32> {
        self.snapshots.keys().copied().collect()
    }

    /// Number of snapshots.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether no snapshot has been captured.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
