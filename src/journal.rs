//! Append-only event log and the journal that derives match state from it.
//!
//! The log keeps a cursor: entries before it are applied, entries at or
//! after it have been rewound. Appending is only possible while the cursor
//! sits at the tail; a rewound log must be replayed before it accepts new
//! events.

use crate::error::EngineError;
use crate::event::{Direction, Event, Owner};
use crate::shot::{PlayerId, RoundId};
use crate::state::MatchState;
use crate::subscriber::{EventBus, EventSubscriber};

/// A logged event and the direction it was last applied in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    event: Event,
    last_applied: Direction,
}

impl LogEntry {
    pub fn event(&self) -> &Event {
        &self.event
    }

    pub fn last_applied(&self) -> Direction {
        self.last_applied
    }
}

/// Ordered, append-only sequence of reversible events.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    entries: Vec<LogEntry>,
    cursor: usize,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries currently applied.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// `true` while every entry is applied and appends are accepted.
    pub fn is_live(&self) -> bool {
        self.cursor == self.entries.len()
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Append `event`, apply it forward and notify `bus`.
    pub fn append(
        &mut self,
        event: Event,
        state: &mut MatchState,
        bus: &mut EventBus,
    ) -> Result<usize, EngineError> {
        if !self.is_live() {
            return Err(EngineError::state(format!(
                "cannot append while the log is rewound to {} of {}",
                self.cursor,
                self.entries.len()
            )));
        }
        let index = self.entries.len();
        event
            .apply(state, Direction::Forward)
            .map_err(|reason| EngineError::Inconsistent { index, reason })?;
        log::debug!("event #{}: {}", index, event);
        bus.publish(&event, false);
        self.entries.push(LogEntry {
            event,
            last_applied: Direction::Forward,
        });
        self.cursor = self.entries.len();
        Ok(index)
    }

    /// Undo every applied entry at index `to` and later, newest first.
    pub fn rewind(
        &mut self,
        to: usize,
        state: &mut MatchState,
        bus: &mut EventBus,
    ) -> Result<(), EngineError> {
        if to > self.entries.len() {
            return Err(EngineError::state(format!(
                "cannot rewind to {} in a log of {} events",
                to,
                self.entries.len()
            )));
        }
        while self.cursor > to {
            let index = self.cursor - 1;
            let entry = &mut self.entries[index];
            entry
                .event
                .apply(state, Direction::Backward)
                .map_err(|reason| EngineError::Inconsistent { index, reason })?;
            entry.last_applied = Direction::Backward;
            bus.publish(&entry.event, true);
            self.cursor = index;
        }
        Ok(())
    }

    /// Re-apply rewound entries in original order until `to` are applied.
    pub fn replay_to(
        &mut self,
        to: usize,
        state: &mut MatchState,
        bus: &mut EventBus,
    ) -> Result<(), EngineError> {
        if to > self.entries.len() {
            return Err(EngineError::state(format!(
                "cannot replay to {} in a log of {} events",
                to,
                self.entries.len()
            )));
        }
        while self.cursor < to {
            let index = self.cursor;
            let entry = &mut self.entries[index];
            entry
                .event
                .apply(state, Direction::Forward)
                .map_err(|reason| EngineError::Inconsistent { index, reason })?;
            entry.last_applied = Direction::Forward;
            bus.publish(&entry.event, false);
            self.cursor = index + 1;
        }
        Ok(())
    }
}

/// The event log together with the state it derives and its subscribers.
#[derive(Debug, Default)]
pub struct Journal {
    log: EventLog,
    state: MatchState,
    bus: EventBus,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a journal by applying `events` in order.
    pub fn from_events(events: impl IntoIterator<Item = Event>) -> Result<Self, EngineError> {
        let mut journal = Self::new();
        for event in events {
            journal.record(event)?;
        }
        Ok(journal)
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.log.cursor()
    }

    pub fn is_live(&self) -> bool {
        self.log.is_live()
    }

    pub fn subscribe(&mut self, subscriber: impl EventSubscriber + 'static) {
        self.bus.subscribe(subscriber);
    }

    pub fn record(&mut self, event: impl Into<Event>) -> Result<usize, EngineError> {
        self.log.append(event.into(), &mut self.state, &mut self.bus)
    }

    pub fn rewind(&mut self, to: usize) -> Result<(), EngineError> {
        self.log.rewind(to, &mut self.state, &mut self.bus)
    }

    /// Re-apply every rewound event.
    pub fn replay(&mut self) -> Result<(), EngineError> {
        let len = self.log.len();
        self.log.replay_to(len, &mut self.state, &mut self.bus)
    }

    pub fn replay_to(&mut self, to: usize) -> Result<(), EngineError> {
        self.log.replay_to(to, &mut self.state, &mut self.bus)
    }

    /// Move the cursor to `to` in whichever direction is needed.
    pub fn seek(&mut self, to: usize) -> Result<(), EngineError> {
        if to < self.cursor() {
            self.rewind(to)
        } else {
            self.replay_to(to)
        }
    }

    /// Undo the newest applied event. Returns `false` at the start of the log.
    pub fn step_backward(&mut self) -> Result<bool, EngineError> {
        match self.cursor() {
            0 => Ok(false),
            n => self.rewind(n - 1).map(|_| true),
        }
    }

    /// Re-apply the next rewound event. Returns `false` at the tail.
    pub fn step_forward(&mut self) -> Result<bool, EngineError> {
        if self.is_live() {
            return Ok(false);
        }
        let next = self.cursor() + 1;
        self.replay_to(next).map(|_| true)
    }

    /// Every logged event, applied or not, in log order.
    pub fn events(&self) -> impl Iterator<Item = &Event> + '_ {
        self.log.entries().iter().map(LogEntry::event)
    }

    /// Applied events recorded since log index `from`.
    pub fn events_since(&self, from: usize) -> Vec<Event> {
        self.log.entries()[from.min(self.cursor())..self.cursor()]
            .iter()
            .map(|e| e.event.clone())
            .collect()
    }

    fn applied_for(&self, owner: Owner) -> impl Iterator<Item = &Event> + '_ {
        self.log.entries()[..self.cursor()]
            .iter()
            .map(LogEntry::event)
            .filter(move |e| e.owner() == owner)
    }

    /// Applied events owned by the match.
    pub fn match_events(&self) -> impl Iterator<Item = &Event> + '_ {
        self.applied_for(Owner::Match)
    }

    /// Applied events owned by `round`.
    pub fn round_events(&self, round: RoundId) -> impl Iterator<Item = &Event> + '_ {
        self.applied_for(Owner::Round(round))
    }

    /// Applied events owned by `player`.
    pub fn player_events(&self, player: PlayerId) -> impl Iterator<Item = &Event> + '_ {
        self.applied_for(Owner::Player(player))
    }
}
