//! Error types for the `rescue-world` crate.
//!
//! Only construction can fail. Applying deltas to an existing world is
//! total: malformed locations are skipped rather than reported.

use rescue_types::Location;

/// Errors that can occur while building a [`WorldState`](crate::WorldState).
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The grid has a zero dimension.
    #[error("world dimensions must be non-zero, got {width}x{height}")]
    EmptyGrid {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// The number of cells does not match `width * height`.
    #[error("expected {expected} cells for the grid, got {actual}")]
    CellCountMismatch {
        /// `width * height`.
        expected: usize,
        /// Number of cells supplied.
        actual: usize,
    },

    /// A cell's recorded location disagrees with its position in the list.
    #[error("cell at index {index} claims location {claimed}, expected {expected}")]
    CellOutOfPlace {
        /// Position in the cell list.
        index: usize,
        /// Location stored in the cell.
        claimed: Location,
        /// Location implied by the index.
        expected: Location,
    },

    /// Arithmetic overflow while sizing the grid.
    #[error("arithmetic overflow computing grid size")]
    ArithmeticOverflow,
}
