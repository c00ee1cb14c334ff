//! Commonly used types and utilities for ease of import.

pub use crate::{
    Configuration, Controller, Coordinates, EngineError, Event, GameMode, Match, PlayerId,
    ProbabilityController, RandomController, RoundId, RoundMode, Scheduler, Ship, Shot,
    TimeoutPolicy,
};

pub use crate::controller::{OpponentView, PlacementContext, ShotContext};
pub use crate::persist::{FileRecorder, MatchRecord, MemoryRecorder, Recorder, Replay};
