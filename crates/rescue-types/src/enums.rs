//! Enumeration types for the rescue simulation: cell kinds and the world
//! objects that can be stacked inside a cell.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::ObjectId;

/// The terrain kind of a grid cell.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum CellType {
    /// Plain ground.
    #[default]
    Normal,
    /// Agents standing here recharge energy.
    Charging,
    /// Agents entering this cell die.
    Killer,
    /// Agents spawn here at the start of a run.
    Spawn,
}

/// One content layer in a cell's stack.
///
/// Layers are ordered bottom to top; only the top layer can be removed by
/// an agent action, which is what a round delta records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum WorldObject {
    /// A survivor waiting to be rescued.
    Survivor {
        /// Object identifier.
        id: ObjectId,
        /// Remaining health of the survivor.
        health: i32,
    },
    /// Rubble that must be cleared before reaching what lies below.
    Rubble {
        /// Object identifier.
        id: ObjectId,
        /// Energy an agent spends to dig through it.
        energy_required: i32,
        /// Number of agents that must dig together.
        agents_required: u32,
    },
}

impl WorldObject {
    /// Return the identifier of this object.
    pub const fn id(&self) -> ObjectId {
        match self {
            Self::Survivor { id, .. } | Self::Rubble { id, .. } => *id,
        }
    }

    /// Whether this layer is a survivor.
    pub const fn is_survivor(&self) -> bool {
        matches!(self, Self::Survivor { .. })
    }

    /// Whether this layer is rubble.
    pub const fn is_rubble(&self) -> bool {
        matches!(self, Self::Rubble { .. })
    }
}
