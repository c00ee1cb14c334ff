//! Match records, recorders and the replay viewer.
//!
//! A record is the configuration snapshot plus the full event log. Loading
//! a record and replaying its events rebuilds identical match state.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Configuration;
use crate::error::EngineError;
use crate::event::Event;
use crate::journal::Journal;
use crate::state::MatchState;
use crate::subscriber::EventSubscriber;

/// Version of the record layout written by this crate.
pub const RECORD_FORMAT_VERSION: u32 = 1;

/// Serializable snapshot of a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub format_version: u32,
    pub config: Configuration,
    pub events: Vec<Event>,
}

impl MatchRecord {
    pub fn new(config: Configuration, events: Vec<Event>) -> Self {
        Self {
            format_version: RECORD_FORMAT_VERSION,
            config,
            events,
        }
    }

    /// Encode with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EngineError> {
        bincode::serialize(self)
            .map_err(|e| EngineError::persistence("cannot encode match record", e))
    }

    /// Decode a bincode record, rejecting unknown format versions.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EngineError> {
        let record: MatchRecord = bincode::deserialize(bytes)
            .map_err(|e| EngineError::persistence("cannot decode match record", e))?;
        if record.format_version != RECORD_FORMAT_VERSION {
            return Err(EngineError::Persistence {
                reason: format!(
                    "unsupported record format {}, expected {}",
                    record.format_version, RECORD_FORMAT_VERSION
                ),
                source: None,
            });
        }
        Ok(record)
    }
}

/// Storage for match records.
#[async_trait]
pub trait Recorder: Send + Sync {
    async fn save(&mut self, record: &MatchRecord) -> Result<(), EngineError>;
    async fn load(&mut self) -> Result<MatchRecord, EngineError>;
}

/// Keeps the encoded record in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryRecorder {
    bytes: Option<Vec<u8>>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encoded size of the stored record, if any.
    pub fn stored_len(&self) -> Option<usize> {
        self.bytes.as_ref().map(Vec::len)
    }
}

#[async_trait]
impl Recorder for MemoryRecorder {
    async fn save(&mut self, record: &MatchRecord) -> Result<(), EngineError> {
        self.bytes = Some(record.to_bytes()?);
        Ok(())
    }

    async fn load(&mut self) -> Result<MatchRecord, EngineError> {
        match &self.bytes {
            Some(bytes) => MatchRecord::from_bytes(bytes),
            None => Err(EngineError::Persistence {
                reason: "no record has been saved".to_string(),
                source: None,
            }),
        }
    }
}

/// Writes the encoded record to a file.
#[derive(Debug, Clone)]
pub struct FileRecorder {
    path: PathBuf,
}

impl FileRecorder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Recorder for FileRecorder {
    async fn save(&mut self, record: &MatchRecord) -> Result<(), EngineError> {
        let bytes = record.to_bytes()?;
        tokio::fs::write(&self.path, bytes).await.map_err(|e| {
            EngineError::persistence(format!("cannot write {}", self.path.display()), e)
        })?;
        log::debug!(
            "saved {} events to {}",
            record.events.len(),
            self.path.display()
        );
        Ok(())
    }

    async fn load(&mut self) -> Result<MatchRecord, EngineError> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            EngineError::persistence(format!("cannot read {}", self.path.display()), e)
        })?;
        MatchRecord::from_bytes(&bytes)
    }
}

/// Read-only view over a recorded match that can be stepped through.
#[derive(Debug)]
pub struct Replay {
    config: Configuration,
    journal: Journal,
}

impl Replay {
    /// Rebuild the match by applying every recorded event.
    pub fn from_record(record: &MatchRecord) -> Result<Self, EngineError> {
        Ok(Self {
            config: record.config.clone(),
            journal: Journal::from_events(record.events.iter().cloned())?,
        })
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn state(&self) -> &MatchState {
        self.journal.state()
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn len(&self) -> usize {
        self.journal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.journal.is_empty()
    }

    /// Number of events currently applied.
    pub fn position(&self) -> usize {
        self.journal.cursor()
    }

    pub fn subscribe(&mut self, subscriber: impl EventSubscriber + 'static) {
        self.journal.subscribe(subscriber);
    }

    pub fn seek(&mut self, to: usize) -> Result<(), EngineError> {
        self.journal.seek(to)
    }

    pub fn step_forward(&mut self) -> Result<bool, EngineError> {
        self.journal.step_forward()
    }

    pub fn step_backward(&mut self) -> Result<bool, EngineError> {
        self.journal.step_backward()
    }
}
