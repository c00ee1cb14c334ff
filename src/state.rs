//! Match state derived exclusively by applying events.
//!
//! Players and rounds live in arena vectors owned by [`MatchState`]; every
//! cross reference is a [`PlayerId`] or [`RoundId`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ship::Ship;
use crate::shot::{Coordinates, PlayerId, RoundId, Shot, TeamId};

/// A player's board and shot bookkeeping for the round in progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fleet {
    /// Placement submitted at the start of the round.
    pub ships: Vec<Ship>,
    /// Ships not yet sunk, in placement order.
    pub ships_left: Vec<Ship>,
    /// Shots this player fired.
    pub shots: Vec<Shot>,
    /// Shots fired at this player.
    pub shots_against: Vec<Shot>,
    pub last_shot: Option<Shot>,
    pub eliminated: bool,
    /// Controller timeouts and faults during the round.
    pub failures: u32,
}

impl Fleet {
    /// A fresh fleet for a new round.
    pub fn deployed(ships: Vec<Ship>) -> Self {
        Self {
            ships_left: ships.clone(),
            ships,
            ..Self::default()
        }
    }

    /// Cells of this fleet that have been shot at.
    pub fn cells_shot(&self) -> Vec<Coordinates> {
        self.shots_against.iter().map(|s| s.coordinates()).collect()
    }

    pub fn is_hit(&self, cell: Coordinates) -> bool {
        self.ships.iter().any(|ship| ship.contains(cell))
    }

    /// Ships that have been sunk, in placement order.
    pub fn sunk_ships(&self) -> Vec<Ship> {
        self.ships
            .iter()
            .filter(|ship| !self.ships_left.contains(ship))
            .copied()
            .collect()
    }
}

/// Per-match state of one registered player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerState {
    pub id: PlayerId,
    pub name: String,
    pub team: Option<TeamId>,
    pub fleet: Fleet,
    /// Rounds won.
    pub score: u32,
    pub timeouts: u32,
    pub faults: u32,
}

impl PlayerState {
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            team: None,
            fleet: Fleet::default(),
            score: 0,
            timeouts: 0,
            faults: 0,
        }
    }

    /// A player still in the round: not eliminated and with ships afloat.
    pub fn is_active(&self) -> bool {
        !self.fleet.eliminated && !self.fleet.ships_left.is_empty()
    }
}

/// One game instance within a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundState {
    pub id: RoundId,
    pub width: u32,
    pub height: u32,
    pub ship_sizes: Vec<u32>,
    /// Players taking part, in roster order. Fixes the turn order.
    pub participants: Vec<PlayerId>,
    pub current_turn: Option<PlayerId>,
    /// Completed turn changes.
    pub turns: u32,
    pub concluded: bool,
    pub winner: Option<PlayerId>,
}

impl RoundState {
    pub fn new(
        id: RoundId,
        width: u32,
        height: u32,
        ship_sizes: Vec<u32>,
        participants: Vec<PlayerId>,
    ) -> Self {
        Self {
            id,
            width,
            height,
            ship_sizes,
            participants,
            current_turn: None,
            turns: 0,
            concluded: false,
            winner: None,
        }
    }
}

/// Arena holding every player and round of a match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchState {
    players: Vec<PlayerState>,
    index: HashMap<PlayerId, usize>,
    rounds: Vec<RoundState>,
    started: bool,
    ended: bool,
}

impl MatchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Players in insertion order.
    pub fn players(&self) -> &[PlayerState] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&PlayerState> {
        self.index.get(&id).map(|&i| &self.players[i])
    }

    pub fn rounds(&self) -> &[RoundState] {
        &self.rounds
    }

    pub fn round(&self, id: RoundId) -> Option<&RoundState> {
        self.rounds.get(id.0)
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn ended(&self) -> bool {
        self.ended
    }

    /// Rounds that reached their conclusion.
    pub fn completed_rounds(&self) -> usize {
        self.rounds.iter().filter(|r| r.concluded).count()
    }

    /// Participants of `round` still in play, in turn order.
    pub fn active_participants(&self, round: RoundId) -> Vec<PlayerId> {
        self.round(round)
            .map(|r| {
                r.participants
                    .iter()
                    .copied()
                    .filter(|id| self.player(*id).is_some_and(PlayerState::is_active))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn player_mut(&mut self, id: PlayerId) -> Result<&mut PlayerState, String> {
        match self.index.get(&id) {
            Some(&i) => Ok(&mut self.players[i]),
            None => Err(format!("player {} is not registered", id)),
        }
    }

    pub(crate) fn round_mut(&mut self, id: RoundId) -> Result<&mut RoundState, String> {
        self.rounds
            .get_mut(id.0)
            .ok_or_else(|| format!("{} does not exist", id))
    }

    pub(crate) fn push_player(&mut self, player: PlayerState) -> Result<(), String> {
        if self.index.contains_key(&player.id) {
            return Err(format!("player {} is already registered", player.id));
        }
        self.index.insert(player.id, self.players.len());
        self.players.push(player);
        Ok(())
    }

    pub(crate) fn pop_player(&mut self, id: PlayerId) -> Result<PlayerState, String> {
        match self.players.last() {
            Some(last) if last.id == id => {}
            _ => return Err(format!("player {} is not the most recent registration", id)),
        }
        self.index.remove(&id);
        self.players
            .pop()
            .ok_or_else(|| format!("player {} is not registered", id))
    }

    pub(crate) fn push_round(&mut self, round: RoundState) -> Result<(), String> {
        if round.id.0 != self.rounds.len() {
            return Err(format!(
                "{} cannot follow {} existing rounds",
                round.id,
                self.rounds.len()
            ));
        }
        self.rounds.push(round);
        Ok(())
    }

    pub(crate) fn pop_round(&mut self, id: RoundId) -> Result<RoundState, String> {
        match self.rounds.last() {
            Some(last) if last.id == id => {}
            _ => return Err(format!("{} is not the most recent round", id)),
        }
        self.rounds
            .pop()
            .ok_or_else(|| format!("{} does not exist", id))
    }

    pub(crate) fn set_started(&mut self, started: bool) -> Result<(), String> {
        if self.started == started {
            return Err(format!("match started flag is already {}", started));
        }
        self.started = started;
        Ok(())
    }

    pub(crate) fn set_ended(&mut self, ended: bool) -> Result<(), String> {
        if self.ended == ended {
            return Err(format!("match ended flag is already {}", ended));
        }
        self.ended = ended;
        Ok(())
    }
}
