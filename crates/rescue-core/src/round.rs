//! One point in simulation history: a world, a roster, and a cursor.
//!
//! A [`Round`] advances in two granularities. [`Round::start_round`] moves
//! to the next round and applies that round's world changes in one step;
//! [`Round::step_turn`] then replays the round's agent turns one at a time,
//! which is what lets the renderer animate movement within a round.
//!
//! Cloning a round is deep for the world and the roster and shallow for the
//! delta, which is immutable and shared through an [`Arc`].

use std::sync::Arc;

use rescue_agents::AgentRoster;
use rescue_types::{Agent, Cell, Location, RoundDelta, WorldObject};
use rescue_world::WorldState;
use serde::{Deserialize, Serialize};

/// Where a round's cursor sits relative to its turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    /// The round has started but none of its turns have been applied.
    BetweenRounds,
    /// Some, but not all, turns have been applied.
    MidRound,
    /// Every turn has been applied, or there is nothing to apply.
    RoundComplete,
}

/// World and agent state at a (round, turn) position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    /// Round number. 0 before the first delta has been started.
    round: u32,
    /// Number of turns of the current delta already applied.
    turn: usize,
    /// The delta that produced the current round.
    delta: Option<Arc<RoundDelta>>,
    /// Agent state.
    roster: AgentRoster,
    /// Grid state.
    world: WorldState,
}

impl Round {
    /// Create a round-0 state from the initial world and roster.
    pub const fn new(world: WorldState, roster: AgentRoster) -> Self {
        Self {
            round: 0,
            turn: 0,
            delta: None,
            roster,
            world,
        }
    }

    /// Advance to the next round.
    ///
    /// Records every agent's location as its last location, applies the
    /// delta's world changes, and rewinds the turn cursor. The delta's turns
    /// are not applied; use [`step_turn`](Self::step_turn) or
    /// [`finish_round`](Self::finish_round) for that.
    pub fn start_round(&mut self, delta: Option<Arc<RoundDelta>>) {
        self.roster.begin_round();
        self.round = self.round.saturating_add(1);
        if let Some(delta) = delta.as_deref() {
            self.world.apply_delta(delta);
        }
        self.turn = 0;
        self.delta = delta;
    }

    /// Apply the next turn. Returns `false` if there is none.
    pub fn step_turn(&mut self) -> bool {
        let Some(delta) = self.delta.as_deref() else {
            return false;
        };
        let Some(turn) = delta.turns.get(self.turn) else {
            return false;
        };
        self.roster.apply_turn(turn);
        self.turn = self.turn.saturating_add(1);
        true
    }

    /// Step forward until `target` turns have been applied or the round runs
    /// out of turns. A target at or behind the current turn does nothing.
    pub fn jump_to_turn(&mut self, target: usize) {
        while self.turn < target && self.step_turn() {}
    }

    /// Apply every remaining turn of the current round.
    pub fn finish_round(&mut self) {
        self.jump_to_turn(self.turns_len());
    }

    /// Current round number.
    pub const fn round(&self) -> u32 {
        self.round
    }

    /// Number of turns applied so far in the current round.
    pub const fn turn(&self) -> usize {
        self.turn
    }

    /// Number of turns in the current round.
    pub fn turns_len(&self) -> usize {
        self.delta.as_deref().map_or(0, RoundDelta::turns_len)
    }

    /// Where the turn cursor sits.
    pub fn phase(&self) -> RoundPhase {
        if self.turn >= self.turns_len() {
            RoundPhase::RoundComplete
        } else if self.turn == 0 {
            RoundPhase::BetweenRounds
        } else {
            RoundPhase::MidRound
        }
    }

    /// The delta that produced the current round, if any.
    pub fn current_delta(&self) -> Option<&Arc<RoundDelta>> {
        self.delta.as_ref()
    }

    /// Grid state.
    pub const fn world(&self) -> &WorldState {
        &self.world
    }

    /// Agent state.
    pub const fn roster(&self) -> &AgentRoster {
        &self.roster
    }

    /// Agents standing on `location`.
    pub fn agents_at(&self, location: Location) -> Vec<&Agent> {
        self.roster.agents_at(location)
    }

    /// The cell at `location`.
    pub fn cell_at(&self, location: Location) -> Option<&Cell> {
        self.world.cell_at(location)
    }

    /// Content layers at `location`, bottom first.
    pub fn layers_at(&self, location: Location) -> &[WorldObject] {
        self.world.layers_at(location)
    }
}
