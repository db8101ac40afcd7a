//! Per-round agent state.
//!
//! The [`AgentRoster`] holds one [`Agent`] per id. Rounds copy it through
//! [`Clone`] when snapshotting; agents are plain `Copy` values so the copy
//! shares nothing with the original.
//!
//! Turns are applied one at a time. A turn for an id the roster has never
//! seen is ignored: the simulation occasionally reports actions for agents
//! that were never spawned on this client, and the replay must not stall.

use std::collections::{BTreeMap, BTreeSet};

use rescue_types::{Agent, AgentId, Location, Spawn, TeamId, Turn};
use tracing::{debug, warn};

/// All agents of a run, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AgentRoster {
    /// Agents in id order.
    agents: BTreeMap<AgentId, Agent>,
}

impl AgentRoster {
    /// Create an empty roster.
    pub const fn new() -> Self {
        Self {
            agents: BTreeMap::new(),
        }
    }

    /// Place every spawned agent at its spawn location with `start_energy`.
    ///
    /// If an id is spawned twice the later spawn wins.
    pub fn from_spawns(spawns: &[Spawn], start_energy: i32) -> Self {
        let mut agents = BTreeMap::new();
        for &spawn in spawns {
            if agents
                .insert(spawn.agent_id, Agent::spawned(spawn, start_energy))
                .is_some()
            {
                warn!(agent_id = %spawn.agent_id, "agent spawned twice, keeping the later spawn");
            }
        }
        Self { agents }
    }

    /// Record every agent's current location as where it started the round.
    pub fn begin_round(&mut self) {
        for agent in self.agents.values_mut() {
            agent.last_location = agent.location;
        }
    }

    /// Apply one turn. Returns `false` if the agent is unknown.
    ///
    /// Reported energy below zero is stored as zero.
    pub fn apply_turn(&mut self, turn: &Turn) -> bool {
        let Some(agent) = self.agents.get_mut(&turn.agent_id) else {
            debug!(agent_id = %turn.agent_id, "turn for unknown agent ignored");
            return false;
        };
        agent.location = turn.location;
        agent.energy = turn.energy.max(0);
        true
    }

    /// Look up an agent.
    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    /// Iterate over all agents in id order.
    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    /// Agents currently standing on `location`, in id order.
    pub fn agents_at(&self, location: Location) -> Vec<&Agent> {
        self.agents
            .values()
            .filter(|a| a.location == location)
            .collect()
    }

    /// Number of agents.
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether the roster has no agents.
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Distinct teams present in the roster.
    pub fn teams(&self) -> BTreeSet<TeamId> {
        self.agents.values().map(|a| a.team).collect()
    }

    /// Number of agents with energy left.
    pub fn alive_count(&self) -> usize {
        self.agents.values().filter(|a| a.is_alive()).count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn spawn(id: u32, x: i32, y: i32) -> Spawn {
        Spawn {
            agent_id: AgentId::new(id),
            team: TeamId::new(id % 2),
            location: Location::new(x, y),
        }
    }

    fn turn(id: u32, x: i32, y: i32, energy: i32) -> Turn {
        Turn {
            agent_id: AgentId::new(id),
            location: Location::new(x, y),
            energy,
        }
    }

    #[test]
    fn spawns_start_with_world_energy() {
        let roster = AgentRoster::from_spawns(&[spawn(1, 0, 0), spawn(2, 3, 3)], 1000);
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.teams().len(), 2);
        assert!(roster.agents().all(|a| a.energy == 1000));
        assert_eq!(roster.alive_count(), 2);
    }

    #[test]
    fn duplicate_spawn_keeps_the_later_one() {
        let roster = AgentRoster::from_spawns(&[spawn(1, 0, 0), spawn(1, 1, 1)], 10);
        assert_eq!(roster.len(), 1);
        assert_eq!(
            roster.get(AgentId::new(1)).unwrap().location,
            Location::new(1, 1)
        );
    }

    #[test]
    fn turn_moves_agent_and_clamps_energy() {
        let mut roster = AgentRoster::from_spawns(&[spawn(1, 0, 0)], 10);
        assert!(roster.apply_turn(&turn(1, 1, 0, -5)));
        let agent = roster.get(AgentId::new(1)).unwrap();
        assert_eq!(agent.location, Location::new(1, 0));
        assert_eq!(agent.energy, 0);
        assert_eq!(roster.alive_count(), 0);
    }

    #[test]
    fn unknown_agent_turn_is_ignored() {
        let mut roster = AgentRoster::from_spawns(&[spawn(1, 0, 0)], 10);
        let before = roster.clone();
        assert!(!roster.apply_turn(&turn(99, 4, 4, 1)));
        assert_eq!(roster, before);
    }

    #[test]
    fn begin_round_records_last_location() {
        let mut roster = AgentRoster::from_spawns(&[spawn(1, 0, 0)], 10);
        roster.apply_turn(&turn(1, 2, 0, 9));
        roster.begin_round();
        roster.apply_turn(&turn(1, 3, 0, 8));
        let agent = roster.get(AgentId::new(1)).unwrap();
        assert_eq!(agent.last_location, Location::new(2, 0));
        assert_eq!(agent.location, Location::new(3, 0));
    }

    #[test]
    fn agents_at_filters_by_location() {
        let roster =
            AgentRoster::from_spawns(&[spawn(1, 0, 0), spawn(2, 0, 0), spawn(3, 1, 0)], 10);
        let here: Vec<AgentId> = roster
            .agents_at(Location::new(0, 0))
            .iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(here, vec![AgentId::new(1), AgentId::new(2)]);
        assert!(roster.agents_at(Location::new(5, 5)).is_empty());
    }
}
