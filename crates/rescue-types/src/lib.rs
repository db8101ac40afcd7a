//! Shared type definitions for the rescue simulation replay viewer.
//!
//! This crate is the single source of truth for the data model exchanged
//! between the ingestion adapter, the replay engine, and the observer API.
//! Types flow downstream to `TypeScript` via `ts-rs` for the canvas
//! renderer.
//!
//! # Modules
//!
//! - [`ids`] -- Integer id wrappers for agents, teams, and world objects
//! - [`enums`] -- Cell types and stacked world objects
//! - [`structs`] -- Locations, cells, agents, spawns, and the world-init payload
//! - [`delta`] -- Per-round deltas, turns, and the ingestion event envelope

pub mod delta;
pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use delta::{IngestEvent, MoveCostUpdate, RoundDelta, Turn};
pub use enums::{CellType, WorldObject};
pub use ids::{AgentId, ObjectId, TeamId};
pub use structs::{Agent, Cell, Location, Spawn, WorldInit};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation for the renderer.

    #[test]
    fn export_bindings() {
        // ts-rs writes the bindings relative to the crate root when
        // `export_all` is called.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::AgentId::export_all();
        let _ = crate::ids::TeamId::export_all();
        let _ = crate::ids::ObjectId::export_all();

        // Enums
        let _ = crate::enums::CellType::export_all();
        let _ = crate::enums::WorldObject::export_all();

        // Structs
        let _ = crate::structs::Location::export_all();
        let _ = crate::structs::Cell::export_all();
        let _ = crate::structs::Spawn::export_all();
        let _ = crate::structs::Agent::export_all();
        let _ = crate::structs::WorldInit::export_all();

        // Deltas
        let _ = crate::delta::Turn::export_all();
        let _ = crate::delta::MoveCostUpdate::export_all();
        let _ = crate::delta::RoundDelta::export_all();
        let _ = crate::delta::IngestEvent::export_all();
    }
}
