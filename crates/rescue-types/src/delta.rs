//! Round deltas and the ingestion event envelope.
//!
//! A [`RoundDelta`] is everything that changed during one simulation round.
//! Once appended to a timeline it is immutable and shared read-only between
//! the live round and any snapshots.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::AgentId;
use crate::structs::{Location, Spawn, WorldInit};

/// Result of one agent action within a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Turn {
    /// The acting agent.
    pub agent_id: AgentId,
    /// Where the agent ended up.
    pub location: Location,
    /// The agent's energy after the action. May be reported negative.
    pub energy: i32,
}

/// A change to a cell's move cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MoveCostUpdate {
    /// The affected cell.
    pub location: Location,
    /// The new move cost.
    pub move_cost: u32,
}

/// One round's worth of change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RoundDelta {
    /// The round this delta produces (1-based).
    pub round: u32,
    /// Cells whose top layer was removed this round, in removal order.
    #[serde(default)]
    pub layers_removed: Vec<Location>,
    /// Move cost changes applied this round.
    #[serde(default)]
    pub move_cost_updates: Vec<MoveCostUpdate>,
    /// Agent actions, in the order the simulation resolved them.
    #[serde(default)]
    pub turns: Vec<Turn>,
}

impl RoundDelta {
    /// Create a delta carrying only turns.
    pub const fn with_turns(round: u32, turns: Vec<Turn>) -> Self {
        Self {
            round,
            layers_removed: Vec::new(),
            move_cost_updates: Vec::new(),
            turns,
        }
    }

    /// Number of turns in this round.
    pub fn turns_len(&self) -> usize {
        self.turns.len()
    }
}

/// Everything the ingestion adapter can hand to a replay session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum IngestEvent {
    /// A new run begins. Any previous history is discarded.
    WorldInit {
        /// Initial grid.
        world: WorldInit,
        /// Initial agent placements.
        #[serde(default)]
        spawns: Vec<Spawn>,
    },
    /// The next round's delta.
    Round {
        /// The delta.
        delta: RoundDelta,
    },
    /// The simulation finished; no more deltas will arrive for this run.
    Completed,
    /// The simulation process went away.
    Disconnected,
}
