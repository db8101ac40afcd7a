//! Core entity structs: grid locations, cells, agents, and the
//! world-initialization payload that seeds a run.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{CellType, WorldObject};
use crate::ids::{AgentId, TeamId};

/// A grid coordinate.
///
/// Coordinates are signed so that positions reported by the simulation are
/// carried through verbatim even when they fall outside the grid; such
/// positions simply address no cell.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct Location {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Location {
    /// Create a location from its coordinates.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl core::fmt::Display for Location {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One grid cell and its stack of content layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Cell {
    /// Where the cell sits in the grid.
    pub location: Location,
    /// Energy cost of moving into this cell.
    pub move_cost: u32,
    /// Terrain kind.
    #[serde(default)]
    pub cell_type: CellType,
    /// Content layers, bottom first. The last element is the top layer.
    #[serde(default)]
    pub layers: Vec<WorldObject>,
}

impl Cell {
    /// Create an empty normal cell with a move cost of 1.
    pub const fn empty(location: Location) -> Self {
        Self {
            location,
            move_cost: 1,
            cell_type: CellType::Normal,
            layers: Vec::new(),
        }
    }

    /// The most recently added layer, if any.
    pub fn top_layer(&self) -> Option<&WorldObject> {
        self.layers.last()
    }
}

/// Initial placement of one agent, delivered with the world-init event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Spawn {
    /// Agent identifier.
    pub agent_id: AgentId,
    /// Team the agent plays for.
    pub team: TeamId,
    /// Starting location.
    pub location: Location,
}

/// Mutable per-round state of one agent as seen by the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Agent {
    /// Agent identifier.
    pub id: AgentId,
    /// Team the agent plays for.
    pub team: TeamId,
    /// Current location.
    pub location: Location,
    /// Current energy, never negative.
    pub energy: i32,
    /// Location at the start of the current round, used to animate movement.
    pub last_location: Location,
}

impl Agent {
    /// Create an agent at its spawn location with the given energy.
    pub const fn spawned(spawn: Spawn, energy: i32) -> Self {
        Self {
            id: spawn.agent_id,
            team: spawn.team,
            location: spawn.location,
            energy,
            last_location: spawn.location,
        }
    }

    /// Whether the agent still has energy left.
    pub const fn is_alive(&self) -> bool {
        self.energy > 0
    }
}

/// One-time payload describing the grid a run starts from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WorldInit {
    /// Number of columns.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
    /// Seed the simulation generated the world from.
    #[serde(default)]
    pub seed: u64,
    /// Energy every agent starts with.
    pub start_energy: i32,
    /// Dense cell list, indexed by `x + y * width`.
    pub cells: Vec<Cell>,
}

impl WorldInit {
    /// Build an empty `width` x `height` grid of normal cells.
    pub fn blank(width: u32, height: u32, start_energy: i32) -> Self {
        let cells = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| {
                let x = i32::try_from(x).unwrap_or(i32::MAX);
                let y = i32::try_from(y).unwrap_or(i32::MAX);
                Cell::empty(Location::new(x, y))
            })
            .collect();
        Self {
            width,
            height,
            seed: 0,
            start_energy,
            cells,
        }
    }
}
