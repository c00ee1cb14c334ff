//! A match: the roster, its rounds and the termination policy.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{Configuration, RoundMode};
use crate::controller::Controller;
use crate::error::EngineError;
use crate::event::{Event, MatchEvent, PlayerEvent};
use crate::journal::Journal;
use crate::persist::MatchRecord;
use crate::register::ControllerRegister;
use crate::round::{Round, RoundContext};
use crate::scheduler::SchedulerControl;
use crate::shot::{PlayerId, RoundId, TeamId};
use crate::state::{MatchState, PlayerState, RoundState};
use crate::subscriber::EventSubscriber;

/// Every player joins this team while only free-for-all play exists.
pub const DEFAULT_TEAM: TeamId = TeamId(0);

/// A series of rounds between registered controllers.
///
/// All state is derived from the journal. The match owns the controller
/// registers and the control token its scheduler coordinates through.
pub struct Match {
    config: Configuration,
    journal: Journal,
    registers: HashMap<PlayerId, ControllerRegister>,
    next_id: u32,
    control: Arc<SchedulerControl>,
}

impl Match {
    /// Create a match, rejecting configurations that cannot drive one.
    pub fn new(config: Configuration) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            config,
            journal: Journal::new(),
            registers: HashMap::new(),
            next_id: 0,
            control: Arc::new(SchedulerControl::default()),
        })
    }

    /// Register a controller as a new player.
    pub fn add_player(&mut self, controller: Box<dyn Controller>) -> Result<PlayerId, EngineError> {
        if self.journal.state().ended() {
            return Err(EngineError::state("cannot add a player to an ended match"));
        }
        if self.journal.state().started() && self.config.match_playeradd_init_only {
            return Err(EngineError::state(
                "players can only be added before the first round",
            ));
        }
        let player = PlayerId(self.next_id);
        let name = controller.name().to_string();
        self.journal.record(MatchEvent::PlayerAdded {
            player,
            name: name.clone(),
        })?;
        self.journal.record(PlayerEvent::TeamAssigned {
            player,
            previous: None,
            team: DEFAULT_TEAM,
        })?;
        self.registers.insert(
            player,
            ControllerRegister::new(player, controller, self.config.controller_timeout),
        );
        self.next_id += 1;
        log::info!("player {} joined as \"{}\"", player, name);
        Ok(player)
    }

    /// Play one round to its conclusion.
    ///
    /// Returns `true` once the match is over; an over match is left untouched.
    pub async fn play_round(&mut self) -> Result<bool, EngineError> {
        if self.is_over() {
            return Ok(true);
        }
        if !self.journal.is_live() {
            return Err(EngineError::state(
                "cannot play while the journal is rewound",
            ));
        }
        let participants: Vec<PlayerId> = self.players().iter().map(|p| p.id).collect();
        if participants.len() < 2 {
            return Err(EngineError::state(format!(
                "a round needs at least 2 players, {} registered",
                participants.len()
            )));
        }

        let round = Round::create(&self.config, RoundId(self.rounds().len()))?;
        if !self.journal.state().started() {
            self.journal.record(MatchEvent::Started)?;
            log::info!("match started with {} players", participants.len());
        }
        round.announce(&mut self.journal, participants)?;
        round
            .play(RoundContext {
                journal: &mut self.journal,
                registers: &self.registers,
                config: &self.config,
            })
            .await?;
        Ok(self.conditions_met())
    }

    /// End the match and ask a running scheduler to stop. Idempotent.
    pub fn end(&mut self) -> Result<(), EngineError> {
        if !self.journal.state().ended() {
            self.journal.record(MatchEvent::Ended)?;
            log::info!(
                "match ended after {} rounds",
                self.journal.state().completed_rounds()
            );
        }
        self.control.request_pause();
        Ok(())
    }

    /// Whether the termination policy is satisfied.
    pub fn conditions_met(&self) -> bool {
        let target = self.config.match_rounds;
        match self.config.match_rounds_mode {
            RoundMode::AllRounds => self.journal.state().completed_rounds() >= target as usize,
            RoundMode::FirstTo => self.players().iter().any(|p| p.score >= target),
        }
    }

    /// An ended match is over even when the policy is not yet satisfied.
    pub fn is_over(&self) -> bool {
        self.journal.state().ended() || self.conditions_met()
    }

    pub fn is_started(&self) -> bool {
        self.journal.state().started()
    }

    pub fn player(&self, id: PlayerId) -> Result<&PlayerState, EngineError> {
        self.journal
            .state()
            .player(id)
            .ok_or(EngineError::Lookup { player: id })
    }

    pub fn players(&self) -> &[PlayerState] {
        self.journal.state().players()
    }

    pub fn rounds(&self) -> &[RoundState] {
        self.journal.state().rounds()
    }

    pub fn round(&self, id: RoundId) -> Option<&RoundState> {
        self.journal.state().round(id)
    }

    pub fn state(&self) -> &MatchState {
        self.journal.state()
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> + '_ {
        self.journal.events()
    }

    pub fn subscribe(&mut self, subscriber: impl EventSubscriber + 'static) {
        self.journal.subscribe(subscriber);
    }

    /// Undo every event from log index `to` on.
    pub fn rewind(&mut self, to: usize) -> Result<(), EngineError> {
        self.journal.rewind(to)
    }

    /// Re-apply every rewound event.
    pub fn replay(&mut self) -> Result<(), EngineError> {
        self.journal.replay()
    }

    pub fn seek(&mut self, to: usize) -> Result<(), EngineError> {
        self.journal.seek(to)
    }

    /// Snapshot of the configuration and the full event log.
    pub fn record(&self) -> MatchRecord {
        MatchRecord::new(self.config.clone(), self.journal.events().cloned().collect())
    }

    pub(crate) fn control(&self) -> Arc<SchedulerControl> {
        Arc::clone(&self.control)
    }
}

impl core::fmt::Debug for Match {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Match")
            .field("players", &self.players().len())
            .field("rounds", &self.rounds().len())
            .field("events", &self.journal.len())
            .field("started", &self.is_started())
            .field("ended", &self.journal.state().ended())
            .finish()
    }
}
