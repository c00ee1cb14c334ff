//! Round variants and the classic turn loop.
//!
//! A round never mutates state directly. Every step is recorded as an event
//! in the match journal, and every decision is read back from the state the
//! journal derives.

use std::collections::HashMap;

use crate::config::{Configuration, GameMode};
use crate::controller::{OpponentView, PlacementContext, ShotContext};
use crate::error::{ControllerFailure, EngineError};
use crate::event::{Elimination, Event, MatchEvent, PlayerEvent, RoundEvent};
use crate::journal::Journal;
use crate::register::{ControllerRegister, PLACE_SHIPS, SELECT_SHOT};
use crate::rules::ClassicRules;
use crate::shot::{Coordinates, PlayerId, RoundId, Shot};
use crate::state::{Fleet, MatchState, PlayerState};

/// What a round needs from its match while it is played.
pub struct RoundContext<'a> {
    pub journal: &'a mut Journal,
    pub registers: &'a HashMap<PlayerId, ControllerRegister>,
    pub config: &'a Configuration,
}

/// A round played under one game mode.
#[derive(Debug, Clone)]
pub enum Round {
    Classic(ClassicRound),
}

impl Round {
    /// Build round `id`. Modes of `config.game_mode` are used in rotation.
    pub fn create(config: &Configuration, id: RoundId) -> Result<Round, EngineError> {
        if config.game_mode.is_empty() {
            return Err(EngineError::config("no game mode configured"));
        }
        match config.game_mode[id.0 % config.game_mode.len()] {
            GameMode::Classic => Ok(Round::Classic(ClassicRound::new(id, config))),
            mode => Err(EngineError::config(format!(
                "the {:?} game mode is not supported",
                mode
            ))),
        }
    }

    pub fn id(&self) -> RoundId {
        match self {
            Round::Classic(round) => round.id,
        }
    }

    /// Record the start of the round for `participants`.
    pub fn announce(
        &self,
        journal: &mut Journal,
        participants: Vec<PlayerId>,
    ) -> Result<(), EngineError> {
        match self {
            Round::Classic(round) => round.announce(journal, participants),
        }
    }

    /// Play the round to its conclusion and return the winner, if any.
    pub async fn play(&self, ctx: RoundContext<'_>) -> Result<Option<PlayerId>, EngineError> {
        match self {
            Round::Classic(round) => round.play(ctx).await,
        }
    }
}

/// Free-for-all battleship: deploy, then take turns in roster order until
/// at most one fleet is left.
#[derive(Debug, Clone)]
pub struct ClassicRound {
    id: RoundId,
    width: u32,
    height: u32,
    ship_sizes: Vec<u32>,
    rules: ClassicRules,
}

impl ClassicRound {
    pub fn new(id: RoundId, config: &Configuration) -> Self {
        Self {
            id,
            width: config.field_width,
            height: config.field_height,
            ship_sizes: config.ship_sizes.clone(),
            rules: ClassicRules::new(config.field_width, config.field_height),
        }
    }

    pub fn id(&self) -> RoundId {
        self.id
    }

    /// Record `RoundStarted` for the given participants.
    pub fn announce(
        &self,
        journal: &mut Journal,
        participants: Vec<PlayerId>,
    ) -> Result<(), EngineError> {
        journal.record(MatchEvent::RoundStarted {
            round: self.id,
            width: self.width,
            height: self.height,
            ship_sizes: self.ship_sizes.clone(),
            participants,
        })?;
        Ok(())
    }

    pub async fn play(&self, mut ctx: RoundContext<'_>) -> Result<Option<PlayerId>, EngineError> {
        let participants = match ctx.journal.state().round(self.id) {
            Some(round) if !round.concluded => round.participants.clone(),
            Some(_) => return Err(EngineError::state(format!("{} is already concluded", self.id))),
            None => return Err(EngineError::state(format!("{} was never started", self.id))),
        };
        log::info!("{}: {} players on {}x{}", self.id, participants.len(), self.width, self.height);

        let mark = ctx.journal.cursor();
        for &player in participants.iter() {
            self.deploy(&mut ctx, player).await?;
        }
        self.broadcast(&ctx, &participants, mark).await;

        let limit = ctx.config.turn_limit(participants.len());
        let mut holder: Option<PlayerId> = None;
        let mut taken = 0u32;
        let winner = loop {
            let active = ctx.journal.state().active_participants(self.id);
            if active.len() <= 1 {
                break active.first().copied();
            }
            if taken >= limit {
                log::info!("{}: turn limit of {} reached", self.id, limit);
                break None;
            }
            let next = next_turn(&participants, holder, &active);
            let mark = ctx.journal.cursor();
            ctx.journal.record(RoundEvent::TurnChanged {
                round: self.id,
                previous: holder,
                next: Some(next),
            })?;
            holder = Some(next);
            taken += 1;
            self.take_turn(&mut ctx, &participants, next).await?;
            self.broadcast(&ctx, &participants, mark).await;
        };

        let mark = ctx.journal.cursor();
        if let Some(player) = winner {
            ctx.journal.record(PlayerEvent::Won {
                player,
                round: self.id,
            })?;
        }
        ctx.journal.record(RoundEvent::Ended {
            round: self.id,
            winner,
        })?;
        self.broadcast(&ctx, &participants, mark).await;
        match winner {
            Some(player) => log::info!("{}: won by {} after {} turns", self.id, player, taken),
            None => log::info!("{}: no winner after {} turns", self.id, taken),
        }
        Ok(winner)
    }

    async fn deploy(
        &self,
        ctx: &mut RoundContext<'_>,
        player: PlayerId,
    ) -> Result<(), EngineError> {
        let registers = ctx.registers;
        let register = registers
            .get(&player)
            .ok_or(EngineError::Lookup { player })?;
        let previous = player_state(ctx.journal.state(), player)?.fleet.clone();
        let request = PlacementContext {
            player,
            round: self.id,
            width: self.width,
            height: self.height,
            ship_sizes: self.ship_sizes.clone(),
        };
        let placed = match register.request_placement(request).await {
            Ok(ships) => match self.rules.check_placement(&ships, &self.ship_sizes) {
                Ok(()) => Ok(ships),
                Err(e) => Err(ControllerFailure::Fault {
                    method: PLACE_SHIPS,
                    reason: e.to_string(),
                }),
            },
            Err(failure) => Err(failure),
        };
        match placed {
            Ok(ships) => {
                ctx.journal.record(PlayerEvent::ShipsPlaced {
                    player,
                    round: self.id,
                    previous,
                    fleet: Fleet::deployed(ships),
                })?;
            }
            Err(failure) => {
                // An empty fleet keeps the player out of the turn order.
                ctx.journal.record(PlayerEvent::ShipsPlaced {
                    player,
                    round: self.id,
                    previous,
                    fleet: Fleet::default(),
                })?;
                self.penalize(ctx, player, failure)?;
                if !player_state(ctx.journal.state(), player)?.fleet.eliminated {
                    ctx.journal.record(RoundEvent::PlayerEliminated {
                        round: self.id,
                        player,
                        cause: Elimination::NoFleet,
                    })?;
                }
            }
        }
        Ok(())
    }

    async fn take_turn(
        &self,
        ctx: &mut RoundContext<'_>,
        participants: &[PlayerId],
        player: PlayerId,
    ) -> Result<(), EngineError> {
        let registers = ctx.registers;
        let register = registers
            .get(&player)
            .ok_or(EngineError::Lookup { player })?;
        let request = self.shot_context(ctx.journal.state(), participants, player);
        let shot = match register.request_move(request).await {
            Ok(shot) => shot,
            Err(failure) => return self.penalize(ctx, player, failure),
        };

        let state = ctx.journal.state();
        let receiver = participants
            .contains(&shot.receiver())
            .then(|| state.player(shot.receiver()))
            .flatten();
        if let Err(e) = self.rules.check_shot(player, &shot, receiver) {
            let failure = ControllerFailure::Fault {
                method: SELECT_SHOT,
                reason: e.to_string(),
            };
            return self.penalize(ctx, player, failure);
        }
        self.fire(ctx, player, shot)
    }

    /// Record a shot that already passed the rules check.
    fn fire(
        &self,
        ctx: &mut RoundContext<'_>,
        shooter: PlayerId,
        shot: Shot,
    ) -> Result<(), EngineError> {
        let state = ctx.journal.state();
        let receiver = player_state(state, shot.receiver())?;
        let resolution = self.rules.resolve(&receiver.fleet, shot.coordinates());
        let previous_last_shot = player_state(state, shooter)?.fleet.last_shot;

        ctx.journal.record(RoundEvent::ShotResolved {
            round: self.id,
            shooter,
            shot,
            outcome: resolution.outcome,
            previous_last_shot,
        })?;
        if let Some((index, ship)) = resolution.sunk {
            ctx.journal.record(RoundEvent::ShipSunk {
                round: self.id,
                owner: shot.receiver(),
                index,
                ship,
            })?;
        }
        Ok(())
    }

    /// Record `failure` and apply the configured timeout policy.
    fn penalize(
        &self,
        ctx: &mut RoundContext<'_>,
        player: PlayerId,
        failure: ControllerFailure,
    ) -> Result<(), EngineError> {
        log::warn!("{}: player {}: {}", self.id, player, failure);
        match failure {
            ControllerFailure::Timeout { method } => ctx.journal.record(PlayerEvent::TimedOut {
                player,
                method: method.to_string(),
            })?,
            ControllerFailure::Fault { method, reason } => {
                ctx.journal.record(PlayerEvent::Faulted {
                    player,
                    method: method.to_string(),
                    reason,
                })?
            }
        };
        let fleet = &player_state(ctx.journal.state(), player)?.fleet;
        if !fleet.eliminated && ctx.config.timeout_policy.eliminates(fleet.failures) {
            ctx.journal.record(RoundEvent::PlayerEliminated {
                round: self.id,
                player,
                cause: Elimination::ControllerFailures,
            })?;
        }
        Ok(())
    }

    /// Deliver events recorded since `mark` to every participant.
    async fn broadcast(&self, ctx: &RoundContext<'_>, participants: &[PlayerId], mark: usize) {
        let events = ctx.journal.events_since(mark);
        if events.is_empty() {
            return;
        }
        for player in participants {
            let Some(register) = ctx.registers.get(player) else {
                continue;
            };
            let visible: Vec<Event> = events
                .iter()
                .filter(|event| visible_to(event, *player))
                .cloned()
                .collect();
            register.notify(visible).await;
        }
    }

    fn shot_context(
        &self,
        state: &MatchState,
        participants: &[PlayerId],
        player: PlayerId,
    ) -> ShotContext {
        let opponents = participants
            .iter()
            .filter(|id| **id != player)
            .filter_map(|id| state.player(*id))
            .map(opponent_view)
            .collect();
        ShotContext {
            player,
            round: self.id,
            width: self.width,
            height: self.height,
            opponents,
        }
    }
}

/// Next active participant after `holder` in roster order, wrapping around.
fn next_turn(participants: &[PlayerId], holder: Option<PlayerId>, active: &[PlayerId]) -> PlayerId {
    let start = holder
        .and_then(|h| participants.iter().position(|p| *p == h))
        .map(|i| i + 1)
        .unwrap_or(0);
    (0..participants.len())
        .map(|offset| participants[(start + offset) % participants.len()])
        .find(|p| active.contains(p))
        .unwrap_or(active[0])
}

fn opponent_view(player: &PlayerState) -> OpponentView {
    let fleet = &player.fleet;
    let (hits, misses): (Vec<Coordinates>, Vec<Coordinates>) = fleet
        .cells_shot()
        .into_iter()
        .partition(|cell| fleet.is_hit(*cell));
    OpponentView {
        id: player.id,
        active: player.is_active(),
        hits,
        misses,
        sunk: fleet.sunk_ships(),
        ship_lengths_remaining: fleet.ships_left.iter().map(|s| s.length()).collect(),
    }
}

/// Placements are private to their owner.
fn visible_to(event: &Event, player: PlayerId) -> bool {
    match event {
        Event::Player(PlayerEvent::ShipsPlaced { player: owner, .. }) => *owner == player,
        _ => true,
    }
}

fn player_state(state: &MatchState, player: PlayerId) -> Result<&PlayerState, EngineError> {
    state.player(player).ok_or(EngineError::Lookup { player })
}
