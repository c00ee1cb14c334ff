//! Event-sourced battleship matches between pluggable controllers.
//!
//! Every state change of a [`Match`] is a reversible [`Event`] in its
//! [`Journal`], so a match can be paused, resumed, rewound and replayed.

mod config;
pub mod controller;
mod error;
pub mod event;
mod game_match;
pub mod journal;
mod logging;
pub mod persist;
mod register;
pub mod round;
mod rules;
pub mod scheduler;
mod ship;
mod shot;
pub mod state;
pub mod subscriber;

pub mod prelude;

pub use config::*;
pub use controller::{Controller, ProbabilityController, RandomController};
pub use error::{ControllerFailure, EngineError};
pub use event::{
    Direction, Elimination, Event, MatchEvent, Owner, PlayerEvent, RoundEvent, ShotOutcome,
};
pub use game_match::{Match, DEFAULT_TEAM};
pub use journal::{EventLog, Journal, LogEntry};
pub use logging::init_logging;
pub use persist::{
    FileRecorder, MatchRecord, MemoryRecorder, Recorder, Replay, RECORD_FORMAT_VERSION,
};
pub use register::{ControllerRegister, NOTIFY, PLACE_SHIPS, SELECT_SHOT};
pub use round::{ClassicRound, Round, RoundContext};
pub use rules::*;
pub use scheduler::{Scheduler, SchedulerControl};
pub use ship::*;
pub use shot::*;
pub use state::{Fleet, MatchState, PlayerState, RoundState};
pub use subscriber::{ChannelSubscriber, EventBus, EventSubscriber, Notification};
