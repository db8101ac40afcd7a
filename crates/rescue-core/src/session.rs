//! The replay session: owner of the current run and the ingestion boundary.
//!
//! A [`ReplaySession`] holds at most one [`Timeline`] and the
//! [`PlaybackDriver`] that animates it. Everything that can change the
//! timeline (ingestion, playback ticks, user control) goes through the
//! session, and the session is shared as a [`SharedSession`] so those
//! callers serialize on one lock.

use std::sync::Arc;

use rescue_agents::AgentRoster;
use rescue_types::{
    Agent, AgentId, Cell, CellType, IngestEvent, Location, RoundDelta, Spawn, WorldInit,
    WorldObject,
};
use rescue_world::{WorldError, WorldState};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::ReplayConfig;
use crate::playback::{
    PlaybackControl, PlaybackDriver, PlaybackError, PlaybackState, TickOutcome,
};
use crate::round::RoundPhase;
use crate::snapshot::SnapshotPolicy;
use crate::timeline::{SeekOutcome, Timeline, TimelineError};

/// A session shared between the ingestion task, the playback loop, and
/// the observer API.
pub type SharedSession = Arc<Mutex<ReplaySession>>;

/// Errors surfaced by session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The operation needs a run, and there is none.
    #[error("no active run")]
    NoActiveRun,

    /// The world-init payload was malformed.
    #[error("invalid world: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// A delta was rejected by the timeline.
    #[error("delta rejected: {source}")]
    Timeline {
        /// The underlying timeline error.
        #[from]
        source: TimelineError,
    },

    /// Playback could not be started or reconfigured.
    #[error("playback: {source}")]
    Playback {
        /// The underlying playback error.
        #[from]
        source: PlaybackError,
    },
}

/// What an ingested event did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// A new run replaced any previous one.
    RunStarted {
        /// Number of agents spawned.
        agents: usize,
    },
    /// A delta was appended.
    Appended {
        /// Its round number.
        round: u32,
        /// Whether autoplay (re)started playback because of it.
        resumed_playback: bool,
    },
    /// The run was marked complete.
    Completed,
    /// The run was discarded.
    Disconnected,
}

/// Position and playback state pushed to observers after the cursor moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundUpdate {
    /// Live round.
    pub round: u32,
    /// Turns applied in the live round.
    pub turn: usize,
    /// Highest round received.
    pub max_round: u32,
    /// Whether the live round is the last one received.
    pub is_end: bool,
    /// Playback state after the move.
    pub playback: PlaybackState,
}

/// Full session status for the observer API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    /// Whether a run is loaded.
    pub active: bool,
    /// Live round.
    pub round: u32,
    /// Highest round received.
    pub max_round: u32,
    /// Turns applied in the live round.
    pub turn: usize,
    /// Turns in the live round.
    pub turns_in_round: usize,
    /// Turn cursor phase, when a run is loaded.
    pub phase: Option<RoundPhase>,
    /// Whether the live round is the last one received.
    pub is_end: bool,
    /// Whether the simulation reported that it finished.
    pub completed: bool,
    /// Playback state.
    pub playback: PlaybackState,
    /// Playback interval in milliseconds.
    pub round_interval_ms: u64,
    /// Number of captured snapshots.
    pub snapshot_count: usize,
    /// Grid width, 0 without a run.
    pub width: u32,
    /// Grid height, 0 without a run.
    pub height: u32,
    /// Agents in the roster.
    pub agent_count: usize,
    /// Agents with energy left.
    pub alive_count: usize,
    /// Agents out of energy.
    pub dead_count: usize,
    /// Distinct teams in the roster.
    pub team_count: usize,
    /// Survivor layers still on the grid.
    pub survivor_count: usize,
    /// Rubble layers still on the grid.
    pub rubble_count: usize,
    /// Charging cells on the grid.
    pub charging_cells: usize,
}

/// Owner of the current run's timeline and playback state.
#[derive(Debug)]
pub struct ReplaySession {
    /// The current run, if any.
    timeline: Option<Timeline>,
    /// Playback state machine.
    driver: PlaybackDriver,
    /// Snapshot policy applied to each new timeline.
    policy: SnapshotPolicy,
    /// Start and resume playback automatically as rounds arrive.
    autoplay: bool,
    /// Whether the simulation reported completion for this run.
    completed: bool,
    /// Wakes the playback loop on state changes.
    control: Arc<PlaybackControl>,
}

impl ReplaySession {
    /// Create an idle session.
    pub fn new(policy: SnapshotPolicy, driver: PlaybackDriver, autoplay: bool) -> Self {
        Self {
            timeline: None,
            driver,
            policy,
            autoplay,
            completed: false,
            control: Arc::new(PlaybackControl::new()),
        }
    }

    /// Create an idle session from configuration.
    pub fn from_config(config: &ReplayConfig) -> Self {
        Self::new(
            SnapshotPolicy::from(&config.timeline),
            PlaybackDriver::new(config.playback.round_interval_ms),
            config.playback.autoplay,
        )
    }

    /// Wrap the session for sharing between tasks.
    pub fn into_shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    // -----------------------------------------------------------------------
    // Ingestion
    // -----------------------------------------------------------------------

    /// Feed one event from the simulation.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::World`] for a malformed world-init,
    /// [`SessionError::NoActiveRun`] for a delta before any world-init, or
    /// [`SessionError::Timeline`] for an out-of-order delta. None of these
    /// change the session.
    pub fn ingest(&mut self, event: IngestEvent) -> Result<IngestOutcome, SessionError> {
        match event {
            IngestEvent::WorldInit { world, spawns } => self.start_run(world, &spawns),
            IngestEvent::Round { delta } => self.append(delta),
            IngestEvent::Completed => {
                self.completed = true;
                info!(
                    max_round = self.timeline.as_ref().map(Timeline::max_round),
                    "simulation completed"
                );
                Ok(IngestOutcome::Completed)
            }
            IngestEvent::Disconnected => {
                self.timeline = None;
                self.completed = false;
                self.driver.stop();
                self.control.wake();
                info!("simulation disconnected, run discarded");
                Ok(IngestOutcome::Disconnected)
            }
        }
    }

    fn start_run(
        &mut self,
        init: WorldInit,
        spawns: &[Spawn],
    ) -> Result<IngestOutcome, SessionError> {
        let world = WorldState::from_init(init)?;
        let roster = AgentRoster::from_spawns(spawns, world.start_energy());
        let agents = roster.len();
        info!(
            width = world.width(),
            height = world.height(),
            seed = world.seed(),
            agents,
            "new run started"
        );
        self.timeline = Some(Timeline::new(world, roster, self.policy));
        self.completed = false;
        self.driver.stop();
        self.control.wake();
        Ok(IngestOutcome::RunStarted { agents })
    }

    fn append(&mut self, delta: RoundDelta) -> Result<IngestOutcome, SessionError> {
        let Some(timeline) = self.timeline.as_mut() else {
            warn!(round = delta.round, "delta received before world init, dropped");
            return Err(SessionError::NoActiveRun);
        };
        let round = timeline.append(delta).inspect_err(|err| {
            warn!(error = %err, "delta rejected");
        })?;

        let mut resumed_playback = false;
        let idle = self.driver.state() == PlaybackState::Stopped || self.driver.is_auto_paused();
        if self.autoplay && idle && self.driver.play(Some(&*timeline)).is_ok() {
            resumed_playback = true;
            self.control.wake();
        }
        Ok(IngestOutcome::Appended {
            round,
            resumed_playback,
        })
    }

    // -----------------------------------------------------------------------
    // Control
    // -----------------------------------------------------------------------

    /// Seek to `round` (clamped to the received range).
    ///
    /// A seek while paused at the end of the log makes the pause the
    /// user's: autoplay will not resume from the new position.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoActiveRun`] without a run.
    pub fn jump_to_round(&mut self, round: u32) -> Result<SeekOutcome, SessionError> {
        let outcome = self.timeline_mut()?.jump_to_round(round);
        self.driver.release_auto_pause();
        Ok(outcome)
    }

    /// Seek relative to the live round.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoActiveRun`] without a run.
    pub fn step_round(&mut self, delta: i64) -> Result<SeekOutcome, SessionError> {
        let outcome = self.timeline_mut()?.step_round(delta);
        self.driver.release_auto_pause();
        Ok(outcome)
    }

    /// Replay turns of the live round up to `turn`. Returns the turn reached.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoActiveRun`] without a run.
    pub fn jump_to_turn(&mut self, turn: usize) -> Result<usize, SessionError> {
        let timeline = self.timeline_mut()?;
        timeline.jump_to_turn(turn);
        Ok(timeline.live().turn())
    }

    /// Start playback.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Playback`] when there is no run or nothing
    /// left to play.
    pub fn play(&mut self) -> Result<(), SessionError> {
        self.driver.play(self.timeline.as_ref())?;
        self.control.wake();
        Ok(())
    }

    /// Pause playback. The pending tick, if any, is abandoned.
    pub fn pause(&mut self) {
        self.driver.pause();
        self.control.wake();
    }

    /// Change the playback interval. Returns the previous interval in ms.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Playback`] below the minimum interval.
    pub fn set_round_interval(&mut self, ms: u64) -> Result<u64, SessionError> {
        let previous = self.driver.set_round_interval_ms(ms)?;
        self.control.wake();
        Ok(previous)
    }

    /// Run one playback tick. Returns an update if the cursor moved.
    pub fn tick(&mut self) -> Option<RoundUpdate> {
        let timeline = self.timeline.as_mut()?;
        match self.driver.tick(timeline) {
            TickOutcome::Idle => None,
            TickOutcome::Advanced { .. } | TickOutcome::ReachedEnd { .. } => self.round_update(),
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Current position, or `None` without a run.
    pub fn round_update(&self) -> Option<RoundUpdate> {
        let timeline = self.timeline.as_ref()?;
        Some(RoundUpdate {
            round: timeline.current_round(),
            turn: timeline.live().turn(),
            max_round: timeline.max_round(),
            is_end: timeline.is_end(),
            playback: self.driver.state(),
        })
    }

    /// Full status snapshot.
    pub fn status(&self) -> SessionStatus {
        let mut status = SessionStatus {
            active: false,
            round: 0,
            max_round: 0,
            turn: 0,
            turns_in_round: 0,
            phase: None,
            is_end: true,
            completed: self.completed,
            playback: self.driver.state(),
            round_interval_ms: self.driver.round_interval_ms(),
            snapshot_count: 0,
            width: 0,
            height: 0,
            agent_count: 0,
            alive_count: 0,
            dead_count: 0,
            team_count: 0,
            survivor_count: 0,
            rubble_count: 0,
            charging_cells: 0,
        };
        if let Some(timeline) = &self.timeline {
            let live = timeline.live();
            status.active = true;
            status.round = live.round();
            status.max_round = timeline.max_round();
            status.turn = live.turn();
            status.turns_in_round = live.turns_len();
            status.phase = Some(live.phase());
            status.is_end = timeline.is_end();
            status.snapshot_count = timeline.snapshot_count();
            status.width = live.world().width();
            status.height = live.world().height();
            let roster = live.roster();
            let world = live.world();
            status.agent_count = roster.len();
            status.alive_count = roster.alive_count();
            status.dead_count = roster.len().saturating_sub(roster.alive_count());
            status.team_count = roster.teams().len();
            status.survivor_count = world.survivor_count();
            status.rubble_count = world.rubble_count();
            status.charging_cells = world.cells_of_type(CellType::Charging).count();
        }
        status
    }

    /// All agents in the live round, in id order.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoActiveRun`] without a run.
    pub fn agents(&self) -> Result<Vec<Agent>, SessionError> {
        Ok(self.timeline()?.live().roster().agents().copied().collect())
    }

    /// One agent in the live round.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoActiveRun`] without a run.
    pub fn agent(&self, id: AgentId) -> Result<Option<Agent>, SessionError> {
        Ok(self.timeline()?.live().roster().get(id).copied())
    }

    /// Agents standing on `location` in the live round.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoActiveRun`] without a run.
    pub fn agents_at(&self, location: Location) -> Result<Vec<Agent>, SessionError> {
        Ok(self
            .timeline()?
            .live()
            .agents_at(location)
            .into_iter()
            .copied()
            .collect())
    }

    /// The cell at `location` in the live round.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoActiveRun`] without a run.
    pub fn cell_at(&self, location: Location) -> Result<Option<Cell>, SessionError> {
        Ok(self.timeline()?.live().cell_at(location).cloned())
    }

    /// Content layers at `location` in the live round, bottom first.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoActiveRun`] without a run.
    pub fn layers_at(&self, location: Location) -> Result<Vec<WorldObject>, SessionError> {
        Ok(self.timeline()?.live().layers_at(location).to_vec())
    }

    /// The current run's timeline.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoActiveRun`] without a run.
    pub fn timeline(&self) -> Result<&Timeline, SessionError> {
        self.timeline.as_ref().ok_or(SessionError::NoActiveRun)
    }

    fn timeline_mut(&mut self) -> Result<&mut Timeline, SessionError> {
        self.timeline.as_mut().ok_or(SessionError::NoActiveRun)
    }

    /// Playback state machine.
    pub const fn driver(&self) -> &PlaybackDriver {
        &self.driver
    }

    /// Whether the simulation reported completion for this run.
    pub const fn is_completed(&self) -> bool {
        self.completed
    }

    /// Wake-up channel for the playback loop.
    pub fn control(&self) -> Arc<PlaybackControl> {
        Arc::clone(&self.control)
    }
}

impl Default for ReplaySession {
    fn default() -> Self {
        Self::from_config(&ReplayConfig::default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rescue_types::{TeamId, Turn};

    use super::*;

    fn world_init() -> IngestEvent {
        IngestEvent::WorldInit {
            world: WorldInit::blank(5, 5, 100),
            spawns: vec![Spawn {
                agent_id: AgentId::new(7),
                team: TeamId::new(0),
                location: Location::new(0, 0),
            }],
        }
    }

    fn round(n: u32) -> IngestEvent {
        let x = i32::try_from(n).unwrap();
        IngestEvent::Round {
            delta: RoundDelta::with_turns(
                n,
                vec![Turn {
                    agent_id: AgentId::new(7),
                    location: Location::new(x % 5, 0),
                    energy: 100 - x,
                }],
            ),
        }
    }

    #[test]
    fn queries_without_run_report_no_active_run() {
        let session = ReplaySession::default();
        assert!(matches!(session.agents(), Err(SessionError::NoActiveRun)));
        assert!(matches!(
            session.cell_at(Location::new(0, 0)),
            Err(SessionError::NoActiveRun)
        ));
        let status = session.status();
        assert!(!status.active);
        assert_eq!(status.playback, PlaybackState::Stopped);
    }

    #[test]
    fn delta_before_world_init_is_dropped() {
        let mut session = ReplaySession::default();
        assert!(matches!(
            session.ingest(round(1)),
            Err(SessionError::NoActiveRun)
        ));
    }

    #[test]
    fn malformed_world_init_is_rejected() {
        let mut session = ReplaySession::default();
        let mut init = WorldInit::blank(3, 3, 10);
        init.cells.pop();
        let result = session.ingest(IngestEvent::WorldInit {
            world: init,
            spawns: Vec::new(),
        });
        assert!(matches!(result, Err(SessionError::World { .. })));
        assert!(session.timeline().is_err());
    }

    #[test]
    fn world_init_spawns_with_start_energy() {
        let mut session = ReplaySession::default();
        let outcome = session.ingest(world_init()).unwrap();
        assert_eq!(outcome, IngestOutcome::RunStarted { agents: 1 });
        let agents = session.agents().unwrap();
        assert_eq!(agents.len(), 1);
        assert_eq!(agents.first().unwrap().energy, 100);
        assert_eq!(session.status().round, 0);
    }

    #[test]
    fn out_of_order_delta_leaves_state_unchanged() {
        let mut session = ReplaySession::default();
        session.ingest(world_init()).unwrap();
        session.ingest(round(1)).unwrap();
        let before = session.status();
        assert!(matches!(
            session.ingest(round(3)),
            Err(SessionError::Timeline { .. })
        ));
        assert_eq!(session.status(), before);
    }

    #[test]
    fn new_world_init_discards_history() {
        let mut session = ReplaySession::default();
        session.ingest(world_init()).unwrap();
        for n in 1..=4 {
            session.ingest(round(n)).unwrap();
        }
        session.jump_to_round(4).unwrap();
        session.ingest(IngestEvent::Completed).unwrap();
        assert!(session.is_completed());

        session.ingest(world_init()).unwrap();
        let status = session.status();
        assert_eq!(status.max_round, 0);
        assert_eq!(status.round, 0);
        assert!(!status.completed);
        assert!(session.ingest(round(1)).is_ok());
    }

    #[test]
    fn disconnect_drops_the_run() {
        let mut session = ReplaySession::default();
        session.ingest(world_init()).unwrap();
        session.ingest(round(1)).unwrap();
        session.ingest(round(2)).unwrap();
        session.play().unwrap();

        assert_eq!(
            session.ingest(IngestEvent::Disconnected).unwrap(),
            IngestOutcome::Disconnected
        );
        assert!(session.timeline().is_err());
        assert_eq!(session.driver().state(), PlaybackState::Stopped);
        assert!(session.tick().is_none());
    }

    #[test]
    fn play_without_run_fails() {
        let mut session = ReplaySession::default();
        assert!(matches!(
            session.play(),
            Err(SessionError::Playback {
                source: PlaybackError::NoTimeline
            })
        ));
    }

    #[test]
    fn tick_reports_round_updates() {
        let mut session = ReplaySession::default();
        session.ingest(world_init()).unwrap();
        for n in 1..=3 {
            session.ingest(round(n)).unwrap();
        }
        assert!(session.tick().is_none());
        session.play().unwrap();
        let update = session.tick().unwrap();
        assert_eq!(update.round, 2);
        assert_eq!(update.playback, PlaybackState::Playing);
        let update = session.tick().unwrap();
        assert_eq!(update.round, 3);
        assert!(update.is_end);
        assert_eq!(update.playback, PlaybackState::Paused);
    }

    #[test]
    fn autoplay_starts_and_resumes_with_new_rounds() {
        let mut session =
            ReplaySession::new(SnapshotPolicy::default(), PlaybackDriver::default(), true);
        session.ingest(world_init()).unwrap();
        let first = session.ingest(round(1)).unwrap();
        assert_eq!(
            first,
            IngestOutcome::Appended {
                round: 1,
                resumed_playback: false
            }
        );
        let second = session.ingest(round(2)).unwrap();
        assert_eq!(
            second,
            IngestOutcome::Appended {
                round: 2,
                resumed_playback: true
            }
        );

        // Catch up with the feed; the driver pauses itself.
        session.tick().unwrap();
        assert!(session.driver().is_auto_paused());

        // The next round resumes playback.
        let third = session.ingest(round(3)).unwrap();
        assert_eq!(
            third,
            IngestOutcome::Appended {
                round: 3,
                resumed_playback: true
            }
        );
        assert!(session.driver().is_playing());
    }

    #[test]
    fn autoplay_respects_a_user_pause() {
        let mut session =
            ReplaySession::new(SnapshotPolicy::default(), PlaybackDriver::default(), true);
        session.ingest(world_init()).unwrap();
        session.ingest(round(1)).unwrap();
        session.ingest(round(2)).unwrap();
        session.pause();
        session.ingest(round(3)).unwrap();
        assert_eq!(session.driver().state(), PlaybackState::Paused);
    }

    #[test]
    fn seeking_after_catching_up_holds_the_cursor() {
        let mut session =
            ReplaySession::new(SnapshotPolicy::default(), PlaybackDriver::default(), true);
        session.ingest(world_init()).unwrap();
        for n in 1..=4 {
            session.ingest(round(n)).unwrap();
        }
        while session.driver().is_playing() {
            session.tick();
        }
        assert!(session.driver().is_auto_paused());

        session.jump_to_round(2).unwrap();
        let appended = session.ingest(round(5)).unwrap();
        assert_eq!(
            appended,
            IngestOutcome::Appended {
                round: 5,
                resumed_playback: false
            }
        );
        assert_eq!(session.driver().state(), PlaybackState::Paused);
        assert!(session.tick().is_none());
        assert_eq!(session.status().round, 2);

        session.step_round(1).unwrap();
        session.ingest(round(6)).unwrap();
        assert_eq!(session.status().round, 3);
    }

    #[test]
    fn status_counts_world_and_roster() {
        let mut init = WorldInit::blank(3, 2, 100);
        let charging = init.cells.get_mut(4).unwrap();
        charging.cell_type = CellType::Charging;
        let pile = init.cells.get_mut(2).unwrap();
        pile.layers.push(WorldObject::Survivor {
            id: rescue_types::ObjectId::new(0),
            health: 10,
        });
        pile.layers.push(WorldObject::Rubble {
            id: rescue_types::ObjectId::new(1),
            energy_required: 3,
            agents_required: 1,
        });
        let spawns = (1..=3)
            .map(|id| Spawn {
                agent_id: AgentId::new(id),
                team: TeamId::new(id % 2),
                location: Location::new(0, 0),
            })
            .collect();

        let mut session = ReplaySession::default();
        session
            .ingest(IngestEvent::WorldInit {
                world: init,
                spawns,
            })
            .unwrap();
        let mut delta = RoundDelta::with_turns(
            1,
            vec![Turn {
                agent_id: AgentId::new(2),
                location: Location::new(1, 0),
                energy: 0,
            }],
        );
        delta.layers_removed.push(Location::new(2, 0));
        session.ingest(IngestEvent::Round { delta }).unwrap();

        // Round 1 started: the rubble is gone, agent 2 still has energy.
        let status = session.status();
        assert_eq!(status.survivor_count, 1);
        assert_eq!(status.rubble_count, 0);
        assert_eq!(status.charging_cells, 1);
        assert_eq!(status.team_count, 2);
        assert_eq!(status.alive_count, 3);
        assert_eq!(status.dead_count, 0);

        session.jump_to_turn(1).unwrap();
        let status = session.status();
        assert_eq!(status.alive_count, 2);
        assert_eq!(status.dead_count, 1);
    }

    #[test]
    fn cell_and_layer_queries_read_the_live_round() {
        let mut session = ReplaySession::default();
        session.ingest(world_init()).unwrap();
        session.ingest(round(1)).unwrap();
        let cell = session.cell_at(Location::new(4, 4)).unwrap().unwrap();
        assert_eq!(cell.location, Location::new(4, 4));
        assert!(session.cell_at(Location::new(5, 0)).unwrap().is_none());
        assert!(session.layers_at(Location::new(0, 0)).unwrap().is_empty());
        assert_eq!(session.agents_at(Location::new(0, 0)).unwrap().len(), 1);
        session.jump_to_turn(1).unwrap();
        assert_eq!(
            session.agent(AgentId::new(7)).unwrap().unwrap().location,
            Location::new(1, 0)
        );
    }
}
