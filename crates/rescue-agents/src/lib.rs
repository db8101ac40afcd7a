//! Agent roster for the rescue simulation replay viewer.
//!
//! The roster tracks every agent's location and energy as rounds are
//! replayed. It sits between `rescue-types` (the data structures) and
//! `rescue-core` (the timeline that drives it).
//!
//! # Modules
//!
//! - [`roster`] -- Per-round agent state ([`AgentRoster`])

pub mod roster;

// Re-export primary types at crate root for convenience.
pub use roster::AgentRoster;
