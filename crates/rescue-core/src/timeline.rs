//! The delta log, its snapshots, and the live cursor.
//!
//! A [`Timeline`] holds one run's history. Deltas arrive in strict round
//! order through [`Timeline::append`] and are never modified afterwards.
//! Seeking rebuilds the live [`Round`] for any round in the log:
//!
//! 1. Clamp the target to `[1, max_round]`.
//! 2. Find the closest snapshot at or before the target.
//! 3. If the live round already sits between that snapshot and the target,
//!    continue from it in place; otherwise start from a copy of the snapshot.
//! 4. Finish the current round and start the next one until the target is
//!    reached, capturing a snapshot at every interval boundary on the way.
//!
//! After a seek the live round sits at turn 0 of the target round.

use std::sync::Arc;

use rescue_agents::AgentRoster;
use rescue_types::RoundDelta;
use rescue_world::WorldState;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::round::Round;
use crate::snapshot::{SnapshotPolicy, SnapshotTable};

/// Errors from growing the delta log.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimelineError {
    /// The delta is not the next round. The log is unchanged.
    #[error("expected delta for round {expected}, got round {got}")]
    OutOfOrder {
        /// `max_round + 1`.
        expected: u32,
        /// Round number carried by the rejected delta.
        got: u32,
    },

    /// The log already holds `u32::MAX` rounds.
    #[error("timeline is full")]
    Full,
}

/// How a seek reached its target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeekOutcome {
    /// Round the live state ended on.
    pub round: u32,
    /// Snapshot the replay started from, if it did not continue the live round.
    pub from_snapshot: Option<u32>,
    /// Whether the live round was advanced in place.
    pub reused_live: bool,
    /// Number of rounds started during the seek.
    pub rounds_replayed: u32,
}

/// Delta log plus snapshot table plus live cursor for one run.
#[derive(Debug, Clone)]
pub struct Timeline {
    /// Delta log; index 0 holds round 1.
    deltas: Vec<Arc<RoundDelta>>,
    /// Round-keyed snapshots.
    snapshots: SnapshotTable,
    /// The state every query reads from.
    live: Round,
    /// Snapshot interval and seek strategy.
    policy: SnapshotPolicy,
}

impl Timeline {
    /// Create an empty timeline whose live round is round 0.
    pub const fn new(world: WorldState, roster: AgentRoster, policy: SnapshotPolicy) -> Self {
        Self {
            deltas: Vec::new(),
            snapshots: SnapshotTable::new(),
            live: Round::new(world, roster),
            policy,
        }
    }

    /// Append the next round's delta and return its round number.
    ///
    /// The first delta also starts round 1 on the live round and captures
    /// the round-1 snapshot every seek can fall back to. Later appends only
    /// grow the log; the live round does not move.
    ///
    /// # Errors
    ///
    /// Returns [`TimelineError::OutOfOrder`] if `delta.round` is not
    /// `max_round + 1`.
    pub fn append(&mut self, delta: RoundDelta) -> Result<u32, TimelineError> {
        let expected = self
            .max_round()
            .checked_add(1)
            .ok_or(TimelineError::Full)?;
        if delta.round != expected {
            return Err(TimelineError::OutOfOrder {
                expected,
                got: delta.round,
            });
        }

        let delta = Arc::new(delta);
        self.deltas.push(Arc::clone(&delta));

        if self.live.round() == 0 {
            self.live.start_round(Some(delta));
            self.snapshots.capture(&self.live);
        }
        Ok(expected)
    }

    /// Rebuild the live round at turn 0 of `target`.
    ///
    /// Targets outside `[1, max_round]` are clamped. Seeking an empty
    /// timeline, or to the round already live, does nothing.
    pub fn jump_to_round(&mut self, target: u32) -> SeekOutcome {
        let max_round = self.max_round();
        let current = self.live.round();
        let mut outcome = SeekOutcome {
            round: current,
            ..SeekOutcome::default()
        };
        if max_round == 0 {
            return outcome;
        }
        let target = target.clamp(1, max_round);
        if target == current {
            return outcome;
        }

        let base = if self.policy.is_lazy() {
            self.snapshots.closest_at_or_before(target)
        } else {
            self.snapshots.get(1)
        };
        let Some(base) = base else {
            warn!(target, "no snapshot at or before seek target");
            return outcome;
        };

        let base_round = base.round();
        if self.policy.is_lazy() && base_round <= current && current <= target {
            outcome.reused_live = true;
        } else {
            self.live = base.clone();
            outcome.from_snapshot = Some(base_round);
        }

        while self.live.round() < target {
            let next = self.live.round().saturating_add(1);
            let Some(delta) = self.delta(next).cloned() else {
                break;
            };
            self.live.finish_round();
            self.live.start_round(Some(delta));
            outcome.rounds_replayed = outcome.rounds_replayed.saturating_add(1);

            if self.policy.is_lazy() && self.policy.is_due(next) {
                self.snapshots.capture(&self.live);
            }
        }

        outcome.round = self.live.round();
        debug!(
            target,
            from = current,
            from_snapshot = ?outcome.from_snapshot,
            reused_live = outcome.reused_live,
            rounds_replayed = outcome.rounds_replayed,
            "seek complete"
        );
        outcome
    }

    /// Seek relative to the current round. Saturates instead of wrapping.
    pub fn step_round(&mut self, delta: i64) -> SeekOutcome {
        let target = i64::from(self.live.round()).saturating_add(delta);
        let target = u32::try_from(target.max(0)).unwrap_or(u32::MAX);
        self.jump_to_round(target)
    }

    /// Replay turns of the live round up to `turn`. Forward only.
    pub fn jump_to_turn(&mut self, turn: usize) {
        self.live.jump_to_turn(turn);
    }

    /// Round the live state is on.
    pub const fn current_round(&self) -> u32 {
        self.live.round()
    }

    /// Highest round in the log.
    pub fn max_round(&self) -> u32 {
        u32::try_from(self.deltas.len()).unwrap_or(u32::MAX)
    }

    /// Whether the live round is the last round in the log.
    pub fn is_end(&self) -> bool {
        self.current_round() >= self.max_round()
    }

    /// Delta for `round`, if it has been appended.
    pub fn delta(&self, round: u32) -> Option<&Arc<RoundDelta>> {
        let index = usize::try_from(round.checked_sub(1)?).ok()?;
        self.deltas.get(index)
    }

    /// Rounds that currently have a snapshot, ascending.
    pub fn snapshot_rounds(&self) -> Vec<u32> {
        self.snapshots.rounds()
    }

    /// Number of captured snapshots.
    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }

    /// The state every query reads from.
    pub const fn live(&self) -> &Round {
        &self.live
    }

    /// Snapshot interval and seek strategy.
    pub const fn policy(&self) -> SnapshotPolicy {
        self.policy
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rescue_types::{AgentId, Location, Spawn, TeamId, Turn, WorldInit};

    use super::*;

    fn timeline(policy: SnapshotPolicy, rounds: u32) -> Timeline {
        let world = WorldState::from_init(WorldInit::blank(40, 1, 1000)).unwrap();
        let spawn = Spawn {
            agent_id: AgentId::new(1),
            team: TeamId::new(0),
            location: Location::new(0, 0),
        };
        let roster = AgentRoster::from_spawns(&[spawn], world.start_energy());
        let mut timeline = Timeline::new(world, roster, policy);
        for round in 1..=rounds {
            let x = i32::try_from(round).unwrap();
            let turn = Turn {
                agent_id: AgentId::new(1),
                location: Location::new(x, 0),
                energy: 1000 - x * 10,
            };
            timeline.append(RoundDelta::with_turns(round, vec![turn])).unwrap();
        }
        timeline
    }

    #[test]
    fn first_append_starts_round_one() {
        let timeline = timeline(SnapshotPolicy::default(), 1);
        assert_eq!(timeline.current_round(), 1);
        assert_eq!(timeline.live().turn(), 0);
        assert_eq!(timeline.snapshot_rounds(), vec![1]);
        assert!(timeline.is_end());
    }

    #[test]
    fn later_appends_do_not_move_the_cursor() {
        let timeline = timeline(SnapshotPolicy::default(), 5);
        assert_eq!(timeline.current_round(), 1);
        assert_eq!(timeline.max_round(), 5);
        assert!(!timeline.is_end());
    }

    #[test]
    fn out_of_order_append_is_rejected() {
        let mut timeline = timeline(SnapshotPolicy::default(), 3);
        let result = timeline.append(RoundDelta::with_turns(5, Vec::new()));
        assert_eq!(
            result,
            Err(TimelineError::OutOfOrder {
                expected: 4,
                got: 5
            })
        );
        let result = timeline.append(RoundDelta::with_turns(3, Vec::new()));
        assert!(result.is_err());
        assert_eq!(timeline.max_round(), 3);
    }

    #[test]
    fn empty_timeline_seek_is_noop() {
        let mut timeline = timeline(SnapshotPolicy::default(), 0);
        let outcome = timeline.jump_to_round(4);
        assert_eq!(outcome, SeekOutcome::default());
        assert_eq!(timeline.current_round(), 0);
        assert!(timeline.snapshot_rounds().is_empty());
    }

    #[test]
    fn seek_clamps_to_log() {
        let mut timeline = timeline(SnapshotPolicy::default(), 12);
        assert_eq!(timeline.jump_to_round(99).round, 12);
        assert_eq!(timeline.jump_to_round(0).round, 1);
    }

    #[test]
    fn forward_seek_reuses_live_round() {
        let mut timeline = timeline(SnapshotPolicy::default(), 25);
        let outcome = timeline.jump_to_round(5);
        assert!(outcome.reused_live);
        assert_eq!(outcome.rounds_replayed, 4);

        let outcome = timeline.jump_to_round(8);
        assert!(outcome.reused_live);
        assert_eq!(outcome.rounds_replayed, 3);
    }

    #[test]
    fn backward_seek_starts_from_snapshot() {
        let mut timeline = timeline(SnapshotPolicy::default(), 25);
        timeline.jump_to_round(25);
        assert_eq!(timeline.snapshot_rounds(), vec![1, 10, 20]);

        let outcome = timeline.jump_to_round(15);
        assert!(!outcome.reused_live);
        assert_eq!(outcome.from_snapshot, Some(10));
        assert_eq!(outcome.rounds_replayed, 5);
    }

    #[test]
    fn forward_seek_past_snapshot_jumps_ahead() {
        let mut timeline = timeline(SnapshotPolicy::default(), 25);
        timeline.jump_to_round(22);
        timeline.jump_to_round(3);
        let outcome = timeline.jump_to_round(21);
        assert_eq!(outcome.from_snapshot, Some(20));
        assert_eq!(outcome.rounds_replayed, 1);
    }

    #[test]
    fn eager_policy_always_replays_from_round_one() {
        let mut timeline = timeline(SnapshotPolicy::new(10, false), 25);
        let outcome = timeline.jump_to_round(5);
        assert_eq!(outcome.from_snapshot, Some(1));
        assert!(!outcome.reused_live);
        let outcome = timeline.jump_to_round(24);
        assert_eq!(outcome.from_snapshot, Some(1));
        assert_eq!(outcome.rounds_replayed, 23);
        assert_eq!(timeline.snapshot_rounds(), vec![1]);
    }

    #[test]
    fn step_round_saturates() {
        let mut timeline = timeline(SnapshotPolicy::default(), 6);
        assert_eq!(timeline.step_round(3).round, 4);
        assert_eq!(timeline.step_round(-2).round, 2);
        assert_eq!(timeline.step_round(i64::MIN).round, 1);
        assert_eq!(timeline.step_round(i64::MAX).round, 6);
    }

    #[test]
    fn seek_lands_on_turn_zero() {
        let mut timeline = timeline(SnapshotPolicy::default(), 6);
        timeline.jump_to_turn(1);
        timeline.jump_to_round(4);
        assert_eq!(timeline.live().turn(), 0);
        let agent = timeline.live().roster().get(AgentId::new(1)).unwrap();
        assert_eq!(agent.location, Location::new(3, 0));
        timeline.jump_to_turn(1);
        let agent = timeline.live().roster().get(AgentId::new(1)).unwrap();
        assert_eq!(agent.location, Location::new(4, 0));
    }

    #[test]
    fn delta_lookup_is_one_based() {
        let timeline = timeline(SnapshotPolicy::default(), 3);
        assert!(timeline.delta(0).is_none());
        assert_eq!(timeline.delta(1).unwrap().round, 1);
        assert_eq!(timeline.delta(3).unwrap().round, 3);
        assert!(timeline.delta(4).is_none());
    }
}
