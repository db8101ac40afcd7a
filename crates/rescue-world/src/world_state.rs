//! The grid of cells as of one point in simulation history.
//!
//! A [`WorldState`] is owned by exactly one round. Snapshots take a deep
//! copy through [`Clone`]: every cell and every layer vector is duplicated,
//! so mutating one copy never shows through another.
//!
//! Cells are stored densely in row-major order (`index = x + y * width`).

use rescue_types::{Cell, CellType, Location, RoundDelta, WorldInit, WorldObject};
use tracing::{debug, trace};

use crate::error::WorldError;

/// Grid world state: dimensions plus one [`Cell`] per grid position.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WorldState {
    /// Number of columns. Fixed for the lifetime of the world.
    width: u32,
    /// Number of rows. Fixed for the lifetime of the world.
    height: u32,
    /// Seed the simulation generated the world from.
    seed: u64,
    /// Energy agents spawn with.
    start_energy: i32,
    /// Row-major cell storage.
    cells: Vec<Cell>,
}

impl WorldState {
    /// Build a world from the initialization payload.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::EmptyGrid`] for a zero dimension,
    /// [`WorldError::CellCountMismatch`] when the cell list does not cover
    /// the grid exactly, or [`WorldError::CellOutOfPlace`] when a cell's
    /// location disagrees with its index.
    pub fn from_init(init: WorldInit) -> Result<Self, WorldError> {
        let WorldInit {
            width,
            height,
            seed,
            start_energy,
            cells,
        } = init;

        if width == 0 || height == 0 {
            return Err(WorldError::EmptyGrid { width, height });
        }

        let expected = usize::try_from(width)
            .ok()
            .zip(usize::try_from(height).ok())
            .and_then(|(w, h)| w.checked_mul(h))
            .ok_or(WorldError::ArithmeticOverflow)?;
        if cells.len() != expected {
            return Err(WorldError::CellCountMismatch {
                expected,
                actual: cells.len(),
            });
        }

        for (index, cell) in cells.iter().enumerate() {
            let expected_location = location_of(width, index)?;
            if cell.location != expected_location {
                return Err(WorldError::CellOutOfPlace {
                    index,
                    claimed: cell.location,
                    expected: expected_location,
                });
            }
        }

        Ok(Self {
            width,
            height,
            seed,
            start_energy,
            cells,
        })
    }

    /// Number of columns.
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// World generation seed.
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Energy agents spawn with.
    pub const fn start_energy(&self) -> i32 {
        self.start_energy
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Map a location to its storage index, or `None` if it is off-grid.
    pub fn index_of(&self, location: Location) -> Option<usize> {
        let x = u32::try_from(location.x).ok()?;
        let y = u32::try_from(location.y).ok()?;
        if x >= self.width || y >= self.height {
            return None;
        }
        let row = usize::try_from(y).ok()?.checked_mul(usize::try_from(self.width).ok()?)?;
        row.checked_add(usize::try_from(x).ok()?)
    }

    /// The cell at `location`, if it lies on the grid.
    pub fn cell_at(&self, location: Location) -> Option<&Cell> {
        self.index_of(location).and_then(|i| self.cells.get(i))
    }

    fn cell_at_mut(&mut self, location: Location) -> Option<&mut Cell> {
        self.index_of(location).and_then(|i| self.cells.get_mut(i))
    }

    /// Content layers at `location`, bottom first. Empty when off-grid.
    pub fn layers_at(&self, location: Location) -> &[WorldObject] {
        self.cell_at(location).map_or(&[], |cell| cell.layers.as_slice())
    }

    /// The top content layer at `location`.
    pub fn top_layer(&self, location: Location) -> Option<&WorldObject> {
        self.cell_at(location).and_then(Cell::top_layer)
    }

    /// Iterate over cells of the given type.
    pub fn cells_of_type(&self, cell_type: CellType) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(move |c| c.cell_type == cell_type)
    }

    /// Number of survivor layers anywhere on the grid.
    pub fn survivor_count(&self) -> usize {
        self.count_layers(WorldObject::is_survivor)
    }

    /// Number of rubble layers anywhere on the grid.
    pub fn rubble_count(&self) -> usize {
        self.count_layers(WorldObject::is_rubble)
    }

    fn count_layers(&self, pred: fn(&WorldObject) -> bool) -> usize {
        self.cells
            .iter()
            .flat_map(|c| c.layers.iter())
            .filter(|layer| pred(layer))
            .count()
    }

    /// Apply the world-affecting part of a round delta.
    ///
    /// Each entry in `layers_removed` pops the top layer of that cell, in
    /// order, so a location listed twice loses two layers. Move cost
    /// updates are applied afterwards. Off-grid locations and pops from an
    /// empty stack are skipped.
    ///
    /// Must be applied at most once per delta; the timeline guarantees this.
    pub fn apply_delta(&mut self, delta: &RoundDelta) {
        for &location in &delta.layers_removed {
            match self.cell_at_mut(location) {
                Some(cell) => match cell.layers.pop() {
                    Some(layer) => {
                        trace!(
                            round = delta.round,
                            %location,
                            object = %layer.id(),
                            survivor = layer.is_survivor(),
                            "layer removed"
                        );
                    }
                    None => {
                        debug!(
                            round = delta.round,
                            %location,
                            "layer removal on empty cell skipped"
                        );
                    }
                },
                None => {
                    debug!(round = delta.round, %location, "layer removal off grid skipped");
                }
            }
        }

        for update in &delta.move_cost_updates {
            match self.cell_at_mut(update.location) {
                Some(cell) => cell.move_cost = update.move_cost,
                None => {
                    debug!(
                        round = delta.round,
                        location = %update.location,
                        "move cost update off grid skipped"
                    );
                }
            }
        }
    }
}

/// Location implied by a row-major storage index.
fn location_of(width: u32, index: usize) -> Result<Location, WorldError> {
    let width = usize::try_from(width).map_err(|_err| WorldError::ArithmeticOverflow)?;
    let x = index.checked_rem(width).ok_or(WorldError::ArithmeticOverflow)?;
    let y = index.checked_div(width).ok_or(WorldError::ArithmeticOverflow)?;
    let x = i32::try_from(x).map_err(|_err| WorldError::ArithmeticOverflow)?;
    let y = i32::try_from(y).map_err(|_err| WorldError::ArithmeticOverflow)?;
    Ok(Location::new(x, y))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rescue_types::{MoveCostUpdate, ObjectId};

    use super::*;

    fn survivor(id: u32) -> WorldObject {
        WorldObject::Survivor {
            id: ObjectId::new(id),
            health: 10,
        }
    }

    fn rubble(id: u32) -> WorldObject {
        WorldObject::Rubble {
            id: ObjectId::new(id),
            energy_required: 3,
            agents_required: 1,
        }
    }

    /// 3x3 world with a survivor under rubble at (1, 1).
    fn stacked_world() -> WorldState {
        let mut init = WorldInit::blank(3, 3, 100);
        if let Some(cell) = init.cells.get_mut(4) {
            cell.layers = vec![survivor(1), rubble(2)];
        }
        WorldState::from_init(init).unwrap()
    }

    #[test]
    fn rejects_wrong_cell_count() {
        let mut init = WorldInit::blank(2, 2, 10);
        init.cells.pop();
        let result = WorldState::from_init(init);
        assert!(matches!(
            result,
            Err(WorldError::CellCountMismatch { expected: 4, actual: 3 })
        ));
    }

    #[test]
    fn rejects_zero_dimension() {
        let init = WorldInit::blank(0, 4, 10);
        assert!(matches!(
            WorldState::from_init(init),
            Err(WorldError::EmptyGrid { .. })
        ));
    }

    #[test]
    fn rejects_cell_out_of_place() {
        let mut init = WorldInit::blank(2, 2, 10);
        init.cells.swap(0, 3);
        assert!(matches!(
            WorldState::from_init(init),
            Err(WorldError::CellOutOfPlace { index: 0, .. })
        ));
    }

    #[test]
    fn off_grid_locations_address_no_cell() {
        let world = stacked_world();
        assert!(world.cell_at(Location::new(-1, 0)).is_none());
        assert!(world.cell_at(Location::new(3, 0)).is_none());
        assert!(world.cell_at(Location::new(0, 3)).is_none());
        assert!(world.layers_at(Location::new(9, 9)).is_empty());
        assert_eq!(world.index_of(Location::new(2, 1)), Some(5));
    }

    #[test]
    fn removal_pops_top_layer_only() {
        let mut world = stacked_world();
        let center = Location::new(1, 1);
        let delta = RoundDelta {
            round: 1,
            layers_removed: vec![center],
            move_cost_updates: Vec::new(),
            turns: Vec::new(),
        };
        world.apply_delta(&delta);
        assert_eq!(world.layers_at(center), &[survivor(1)]);
        assert_eq!(world.top_layer(center), Some(&survivor(1)));
        assert_eq!(world.rubble_count(), 0);
        assert_eq!(world.survivor_count(), 1);
    }

    #[test]
    fn malformed_removals_are_skipped() {
        let mut world = stacked_world();
        let before = world.clone();
        let delta = RoundDelta {
            round: 1,
            layers_removed: vec![Location::new(0, 0), Location::new(40, 40)],
            move_cost_updates: vec![MoveCostUpdate {
                location: Location::new(-2, 0),
                move_cost: 9,
            }],
            turns: Vec::new(),
        };
        world.apply_delta(&delta);
        assert_eq!(world, before);
    }

    #[test]
    fn move_cost_updates_apply() {
        let mut world = stacked_world();
        let delta = RoundDelta {
            round: 1,
            layers_removed: Vec::new(),
            move_cost_updates: vec![MoveCostUpdate {
                location: Location::new(2, 0),
                move_cost: 5,
            }],
            turns: Vec::new(),
        };
        world.apply_delta(&delta);
        assert_eq!(world.cell_at(Location::new(2, 0)).unwrap().move_cost, 5);
    }

    #[test]
    fn clone_is_deep() {
        let original = stacked_world();
        let mut copy = original.clone();
        let delta = RoundDelta {
            round: 1,
            layers_removed: vec![Location::new(1, 1), Location::new(1, 1)],
            move_cost_updates: Vec::new(),
            turns: Vec::new(),
        };
        copy.apply_delta(&delta);
        assert!(copy.layers_at(Location::new(1, 1)).is_empty());
        assert_eq!(original.layers_at(Location::new(1, 1)).len(), 2);
    }

    #[test]
    fn cells_of_type_filters() {
        let mut init = WorldInit::blank(2, 1, 10);
        if let Some(cell) = init.cells.get_mut(1) {
            cell.cell_type = CellType::Charging;
        }
        let world = WorldState::from_init(init).unwrap();
        let charging: Vec<Location> = world
            .cells_of_type(CellType::Charging)
            .map(|c| c.location)
            .collect();
        assert_eq!(charging, vec![Location::new(1, 0)]);
    }
}
