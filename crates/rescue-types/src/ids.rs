//! Type-safe identifier wrappers around the integer ids assigned by the
//! external simulation.
//!
//! The simulation process owns id allocation; the viewer never mints ids
//! of its own. Wrapping them keeps an agent id from being passed where a
//! team or world-object id is expected.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Generates a transparent newtype wrapper around `u32` with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub u32);

        impl $name {
            /// Wrap a raw id received from the simulation.
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// Return the raw `u32` value.
            pub const fn into_inner(self) -> u32 {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for an agent, stable for the agent's lifetime.
    AgentId
}

define_id! {
    /// Team tag an agent belongs to.
    TeamId
}

define_id! {
    /// Identifier of a world object (survivor or rubble) stacked in a cell.
    ObjectId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_serializes_as_bare_integer() {
        let id = AgentId::new(7);
        let json = serde_json::to_string(&id).ok();
        assert_eq!(json.as_deref(), Some("7"));
        let restored: Result<AgentId, _> = serde_json::from_str("7");
        assert_eq!(restored.ok(), Some(id));
    }

    #[test]
    fn id_display_matches_raw_value() {
        assert_eq!(TeamId::new(3).to_string(), "3");
        assert_eq!(u32::from(ObjectId::from(12)), 12);
    }
}
