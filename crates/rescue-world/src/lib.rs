//! Grid world state for the rescue simulation replay viewer.
//!
//! This crate models the physical grid: cells with a move cost, a terrain
//! type, and a stack of content layers (survivors and rubble). It knows how
//! to apply the world-affecting part of a round delta and nothing else.
//!
//! # Modules
//!
//! - [`error`] -- Error types for world construction.
//! - [`world_state`] -- [`WorldState`], the dense cell grid.

pub mod error;
pub mod world_state;

// Re-export primary types at crate root.
pub use error::WorldError;
pub use world_state::WorldState;
