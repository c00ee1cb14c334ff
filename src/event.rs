//! Reversible state-change records.
//!
//! Every event carries the data for both directions of application, so the
//! log can be walked backward and forward without recomputing anything.
//! Applying an event forward and then backward restores the exact prior
//! [`MatchState`].

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::ship::Ship;
use crate::shot::{PlayerId, RoundId, Shot, TeamId};
use crate::state::{Fleet, MatchState, PlayerState, RoundState};

/// Direction an event is applied in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub fn is_backward(self) -> bool {
        matches!(self, Direction::Backward)
    }
}

/// Result of a shot on the receiver's board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShotOutcome {
    Hit,
    Miss,
}

/// Why a player left a round early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Elimination {
    /// Too many controller timeouts or faults under the configured policy.
    ControllerFailures,
    /// No legal ship placement was obtained.
    NoFleet,
}

/// Events owned by the match itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchEvent {
    PlayerAdded {
        player: PlayerId,
        name: String,
    },
    Started,
    RoundStarted {
        round: RoundId,
        width: u32,
        height: u32,
        ship_sizes: Vec<u32>,
        participants: Vec<PlayerId>,
    },
    Ended,
}

/// Events owned by a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundEvent {
    TurnChanged {
        round: RoundId,
        previous: Option<PlayerId>,
        next: Option<PlayerId>,
    },
    ShotResolved {
        round: RoundId,
        shooter: PlayerId,
        shot: Shot,
        outcome: ShotOutcome,
        previous_last_shot: Option<Shot>,
    },
    ShipSunk {
        round: RoundId,
        owner: PlayerId,
        /// Position of the ship in the owner's `ships_left` before sinking.
        index: usize,
        ship: Ship,
    },
    PlayerEliminated {
        round: RoundId,
        player: PlayerId,
        cause: Elimination,
    },
    Ended {
        round: RoundId,
        winner: Option<PlayerId>,
    },
}

/// Events owned by a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerEvent {
    TeamAssigned {
        player: PlayerId,
        previous: Option<TeamId>,
        team: TeamId,
    },
    ShipsPlaced {
        player: PlayerId,
        round: RoundId,
        previous: Fleet,
        fleet: Fleet,
    },
    TimedOut {
        player: PlayerId,
        method: String,
    },
    Faulted {
        player: PlayerId,
        method: String,
        reason: String,
    },
    Won {
        player: PlayerId,
        round: RoundId,
    },
}

/// Entity an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Owner {
    Match,
    Round(RoundId),
    Player(PlayerId),
}

/// Any loggable state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    Match(MatchEvent),
    Round(RoundEvent),
    Player(PlayerEvent),
}

impl From<MatchEvent> for Event {
    fn from(ev: MatchEvent) -> Self {
        Event::Match(ev)
    }
}

impl From<RoundEvent> for Event {
    fn from(ev: RoundEvent) -> Self {
        Event::Round(ev)
    }
}

impl From<PlayerEvent> for Event {
    fn from(ev: PlayerEvent) -> Self {
        Event::Player(ev)
    }
}

impl Event {
    pub fn owner(&self) -> Owner {
        match self {
            Event::Match(_) => Owner::Match,
            Event::Round(ev) => Owner::Round(ev.round()),
            Event::Player(ev) => Owner::Player(ev.player()),
        }
    }

    /// Apply the event to `state`. On error `state` is left untouched.
    pub fn apply(&self, state: &mut MatchState, direction: Direction) -> Result<(), String> {
        match self {
            Event::Match(ev) => ev.apply(state, direction),
            Event::Round(ev) => ev.apply(state, direction),
            Event::Player(ev) => ev.apply(state, direction),
        }
    }
}

impl MatchEvent {
    fn apply(&self, state: &mut MatchState, direction: Direction) -> Result<(), String> {
        match (self, direction) {
            (MatchEvent::PlayerAdded { player, name }, Direction::Forward) => {
                state.push_player(PlayerState::new(*player, name.clone()))
            }
            (MatchEvent::PlayerAdded { player, .. }, Direction::Backward) => {
                state.pop_player(*player).map(drop)
            }
            (MatchEvent::Started, dir) => state.set_started(!dir.is_backward()),
            (
                MatchEvent::RoundStarted {
                    round,
                    width,
                    height,
                    ship_sizes,
                    participants,
                },
                Direction::Forward,
            ) => {
                if let Some(missing) = participants.iter().find(|p| state.player(**p).is_none()) {
                    return Err(format!("participant {} is not registered", missing));
                }
                state.push_round(RoundState::new(
                    *round,
                    *width,
                    *height,
                    ship_sizes.clone(),
                    participants.clone(),
                ))
            }
            (MatchEvent::RoundStarted { round, .. }, Direction::Backward) => {
                state.pop_round(*round).map(drop)
            }
            (MatchEvent::Ended, dir) => state.set_ended(!dir.is_backward()),
        }
    }
}

impl RoundEvent {
    pub fn round(&self) -> RoundId {
        match self {
            RoundEvent::TurnChanged { round, .. }
            | RoundEvent::ShotResolved { round, .. }
            | RoundEvent::ShipSunk { round, .. }
            | RoundEvent::PlayerEliminated { round, .. }
            | RoundEvent::Ended { round, .. } => *round,
        }
    }

    fn apply(&self, state: &mut MatchState, direction: Direction) -> Result<(), String> {
        match self {
            RoundEvent::TurnChanged {
                round,
                previous,
                next,
            } => {
                let (from, to) = match direction {
                    Direction::Forward => (previous, next),
                    Direction::Backward => (next, previous),
                };
                let r = state.round_mut(*round)?;
                if r.current_turn != *from {
                    return Err(format!(
                        "turn holder is {:?}, expected {:?}",
                        r.current_turn, from
                    ));
                }
                if previous.is_some() {
                    r.turns = match direction {
                        Direction::Forward => r.turns + 1,
                        Direction::Backward => r
                            .turns
                            .checked_sub(1)
                            .ok_or_else(|| "turn counter underflow".to_string())?,
                    };
                }
                r.current_turn = *to;
                Ok(())
            }
            RoundEvent::ShotResolved {
                shooter,
                shot,
                previous_last_shot,
                ..
            } => {
                let receiver = shot.receiver();
                if state.player(*shooter).is_none() {
                    return Err(format!("shooter {} is not registered", shooter));
                }
                match direction {
                    Direction::Forward => {
                        state.player_mut(receiver)?.fleet.shots_against.push(*shot);
                        let fleet = &mut state.player_mut(*shooter)?.fleet;
                        fleet.shots.push(*shot);
                        fleet.last_shot = Some(*shot);
                    }
                    Direction::Backward => {
                        let fired = state.player(*shooter).and_then(|p| p.fleet.shots.last());
                        let taken = state
                            .player(receiver)
                            .and_then(|p| p.fleet.shots_against.last());
                        if fired != Some(shot) || taken != Some(shot) {
                            return Err(format!("shot {} is not the latest on record", shot));
                        }
                        state.player_mut(receiver)?.fleet.shots_against.pop();
                        let fleet = &mut state.player_mut(*shooter)?.fleet;
                        fleet.shots.pop();
                        fleet.last_shot = *previous_last_shot;
                    }
                }
                Ok(())
            }
            RoundEvent::ShipSunk {
                owner, index, ship, ..
            } => {
                let fleet = &mut state.player_mut(*owner)?.fleet;
                match direction {
                    Direction::Forward => {
                        if fleet.ships_left.get(*index) != Some(ship) {
                            return Err(format!("{:?} is not afloat at slot {}", ship, index));
                        }
                        fleet.ships_left.remove(*index);
                    }
                    Direction::Backward => {
                        if *index > fleet.ships_left.len() {
                            return Err(format!("slot {} is out of range", index));
                        }
                        fleet.ships_left.insert(*index, *ship);
                    }
                }
                Ok(())
            }
            RoundEvent::PlayerEliminated { player, .. } => {
                let fleet = &mut state.player_mut(*player)?.fleet;
                let eliminated = !direction.is_backward();
                if fleet.eliminated == eliminated {
                    return Err(format!(
                        "player {} eliminated flag is already {}",
                        player, eliminated
                    ));
                }
                fleet.eliminated = eliminated;
                Ok(())
            }
            RoundEvent::Ended { round, winner } => {
                let r = state.round_mut(*round)?;
                match direction {
                    Direction::Forward if !r.concluded => {
                        r.concluded = true;
                        r.winner = *winner;
                    }
                    Direction::Backward if r.concluded && r.winner == *winner => {
                        r.concluded = false;
                        r.winner = None;
                    }
                    _ => return Err(format!("{} conclusion does not match", round)),
                }
                Ok(())
            }
        }
    }
}

impl PlayerEvent {
    pub fn player(&self) -> PlayerId {
        match self {
            PlayerEvent::TeamAssigned { player, .. }
            | PlayerEvent::ShipsPlaced { player, .. }
            | PlayerEvent::TimedOut { player, .. }
            | PlayerEvent::Faulted { player, .. }
            | PlayerEvent::Won { player, .. } => *player,
        }
    }

    fn apply(&self, state: &mut MatchState, direction: Direction) -> Result<(), String> {
        let p = state.player_mut(self.player())?;
        match self {
            PlayerEvent::TeamAssigned { previous, team, .. } => {
                let (from, to) = match direction {
                    Direction::Forward => (*previous, Some(*team)),
                    Direction::Backward => (Some(*team), *previous),
                };
                if p.team != from {
                    return Err(format!("team of {} is {:?}, expected {:?}", p.id, p.team, from));
                }
                p.team = to;
            }
            PlayerEvent::ShipsPlaced {
                previous, fleet, ..
            } => {
                let (from, to) = match direction {
                    Direction::Forward => (previous, fleet),
                    Direction::Backward => (fleet, previous),
                };
                if p.fleet != *from {
                    return Err(format!("fleet of {} does not match the recorded one", p.id));
                }
                p.fleet = to.clone();
            }
            PlayerEvent::TimedOut { .. } => {
                let (timeouts, failures) = step(direction, p.timeouts, p.fleet.failures)?;
                p.timeouts = timeouts;
                p.fleet.failures = failures;
            }
            PlayerEvent::Faulted { .. } => {
                let (faults, failures) = step(direction, p.faults, p.fleet.failures)?;
                p.faults = faults;
                p.fleet.failures = failures;
            }
            PlayerEvent::Won { .. } => {
                p.score = match direction {
                    Direction::Forward => p.score + 1,
                    Direction::Backward => p
                        .score
                        .checked_sub(1)
                        .ok_or_else(|| "score underflow".to_string())?,
                };
            }
        }
        Ok(())
    }
}

/// Increment or decrement a pair of counters together.
fn step(direction: Direction, a: u32, b: u32) -> Result<(u32, u32), String> {
    match direction {
        Direction::Forward => Ok((a + 1, b + 1)),
        Direction::Backward => match (a.checked_sub(1), b.checked_sub(1)) {
            (Some(a), Some(b)) => Ok((a, b)),
            _ => Err("failure counter underflow".to_string()),
        },
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Match(MatchEvent::PlayerAdded { player, name }) => {
                write!(f, "player {} joined as \"{}\"", player, name)
            }
            Event::Match(MatchEvent::Started) => write!(f, "match started"),
            Event::Match(MatchEvent::RoundStarted {
                round,
                width,
                height,
                participants,
                ..
            }) => write!(
                f,
                "{} started on {}x{} with {} players",
                round,
                width,
                height,
                participants.len()
            ),
            Event::Match(MatchEvent::Ended) => write!(f, "match ended"),
            Event::Round(RoundEvent::TurnChanged { round, next, .. }) => match next {
                Some(next) => write!(f, "{}: turn passes to {}", round, next),
                None => write!(f, "{}: no turn holder", round),
            },
            Event::Round(RoundEvent::ShotResolved {
                round,
                shooter,
                shot,
                outcome,
                ..
            }) => write!(f, "{}: {} fires {} - {:?}", round, shooter, shot, outcome),
            Event::Round(RoundEvent::ShipSunk {
                round, owner, ship, ..
            }) => write!(
                f,
                "{}: {} loses a ship of length {}",
                round,
                owner,
                ship.length()
            ),
            Event::Round(RoundEvent::PlayerEliminated {
                round,
                player,
                cause,
            }) => write!(f, "{}: {} eliminated ({:?})", round, player, cause),
            Event::Round(RoundEvent::Ended { round, winner }) => match winner {
                Some(w) => write!(f, "{} won by {}", round, w),
                None => write!(f, "{} ended without a winner", round),
            },
            Event::Player(PlayerEvent::TeamAssigned { player, team, .. }) => {
                write!(f, "player {} assigned to team {}", player, team.0)
            }
            Event::Player(PlayerEvent::ShipsPlaced {
                player,
                round,
                fleet,
                ..
            }) => write!(f, "{}: {} placed {} ships", round, player, fleet.ships.len()),
            Event::Player(PlayerEvent::TimedOut { player, method }) => {
                write!(f, "player {} timed out in {}", player, method)
            }
            Event::Player(PlayerEvent::Faulted {
                player,
                method,
                reason,
            }) => write!(f, "player {} faulted in {}: {}", player, method, reason),
            Event::Player(PlayerEvent::Won { player, round }) => {
                write!(f, "{}: {} wins", round, player)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ship::Orientation;
    use crate::shot::Coordinates;

    fn two_player_state() -> MatchState {
        let mut state = MatchState::new();
        for (id, name) in [(0, "a"), (1, "b")] {
            MatchEvent::PlayerAdded {
                player: PlayerId(id),
                name: name.into(),
            }
            .apply(&mut state, Direction::Forward)
            .unwrap();
        }
        MatchEvent::RoundStarted {
            round: RoundId(0),
            width: 10,
            height: 10,
            ship_sizes: vec![2],
            participants: vec![PlayerId(0), PlayerId(1)],
        }
        .apply(&mut state, Direction::Forward)
        .unwrap();
        state
    }

    fn roundtrip(state: &mut MatchState, event: Event) {
        let before = state.clone();
        event.apply(state, Direction::Forward).unwrap();
        assert_ne!(*state, before, "{} should change state", event);
        let after = state.clone();
        event.apply(state, Direction::Backward).unwrap();
        assert_eq!(*state, before);
        event.apply(state, Direction::Forward).unwrap();
        assert_eq!(*state, after);
    }

    #[test]
    fn each_event_kind_is_reversible() {
        let mut state = two_player_state();
        let ship = Ship::new(Coordinates::new(0, 0), Orientation::Horizontal, 2);
        let shot = Shot::new(PlayerId(1), Coordinates::new(0, 0));
        let events: Vec<Event> = vec![
            MatchEvent::Started.into(),
            PlayerEvent::TeamAssigned {
                player: PlayerId(0),
                previous: None,
                team: TeamId(0),
            }
            .into(),
            PlayerEvent::ShipsPlaced {
                player: PlayerId(1),
                round: RoundId(0),
                previous: Fleet::default(),
                fleet: Fleet::deployed(vec![ship]),
            }
            .into(),
            RoundEvent::TurnChanged {
                round: RoundId(0),
                previous: None,
                next: Some(PlayerId(0)),
            }
            .into(),
            RoundEvent::ShotResolved {
                round: RoundId(0),
                shooter: PlayerId(0),
                shot,
                outcome: ShotOutcome::Hit,
                previous_last_shot: None,
            }
            .into(),
            RoundEvent::TurnChanged {
                round: RoundId(0),
                previous: Some(PlayerId(0)),
                next: Some(PlayerId(1)),
            }
            .into(),
            PlayerEvent::TimedOut {
                player: PlayerId(1),
                method: "select_shot".into(),
            }
            .into(),
            PlayerEvent::Faulted {
                player: PlayerId(1),
                method: "select_shot".into(),
                reason: "bad".into(),
            }
            .into(),
            RoundEvent::ShipSunk {
                round: RoundId(0),
                owner: PlayerId(1),
                index: 0,
                ship,
            }
            .into(),
            RoundEvent::PlayerEliminated {
                round: RoundId(0),
                player: PlayerId(1),
                cause: Elimination::ControllerFailures,
            }
            .into(),
            PlayerEvent::Won {
                player: PlayerId(0),
                round: RoundId(0),
            }
            .into(),
            RoundEvent::Ended {
                round: RoundId(0),
                winner: Some(PlayerId(0)),
            }
            .into(),
            MatchEvent::Ended.into(),
        ];
        for event in events {
            roundtrip(&mut state, event);
        }
        assert_eq!(state.player(PlayerId(0)).unwrap().score, 1);
        assert_eq!(state.round(RoundId(0)).unwrap().turns, 1);
    }

    #[test]
    fn mismatched_event_leaves_state_untouched() {
        let mut state = two_player_state();
        let before = state.clone();
        let bogus = Event::Round(RoundEvent::TurnChanged {
            round: RoundId(0),
            previous: Some(PlayerId(1)),
            next: Some(PlayerId(0)),
        });
        assert!(bogus.apply(&mut state, Direction::Forward).is_err());
        let unknown_round = Event::Round(RoundEvent::Ended {
            round: RoundId(3),
            winner: None,
        });
        assert!(unknown_round.apply(&mut state, Direction::Forward).is_err());
        assert_eq!(state, before);
    }
}
