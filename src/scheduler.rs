//! Background progression of a match.
//!
//! The scheduler runs one tokio task that plays rounds until the match is
//! over or a pause is requested. Pause requests are honoured between rounds.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::error::EngineError;
use crate::game_match::Match;

/// Flags shared between a match and the scheduler driving it.
#[derive(Debug, Default)]
pub struct SchedulerControl {
    running: AtomicBool,
    pause: AtomicBool,
}

impl SchedulerControl {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn pause_requested(&self) -> bool {
        self.pause.load(Ordering::SeqCst)
    }

    /// Ask the running scheduler to stop after the current round.
    pub fn request_pause(&self) {
        self.pause.store(true, Ordering::SeqCst);
    }

    fn claim(&self) -> bool {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    fn release(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn clear_pause(&self) {
        self.pause.store(false, Ordering::SeqCst);
    }
}

/// Drives a shared match round by round on a tokio task.
pub struct Scheduler {
    game: Arc<Mutex<Match>>,
    control: Arc<SchedulerControl>,
    task: Option<JoinHandle<Result<bool, EngineError>>>,
}

impl Scheduler {
    pub fn new(game: Match) -> Self {
        let control = game.control();
        Self {
            game: Arc::new(Mutex::new(game)),
            control,
            task: None,
        }
    }

    /// Attach to a match that is already shared.
    pub async fn from_shared(game: Arc<Mutex<Match>>) -> Self {
        let control = game.lock().await.control();
        Self {
            game,
            control,
            task: None,
        }
    }

    pub fn game(&self) -> Arc<Mutex<Match>> {
        Arc::clone(&self.game)
    }

    pub fn is_running(&self) -> bool {
        self.control.is_running()
    }

    /// Spawn the progression task. Only one scheduler may drive a match.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if !self.control.claim() {
            return Err(EngineError::state("a scheduler is already running this match"));
        }
        self.control.clear_pause();
        let game = Arc::clone(&self.game);
        let control = Arc::clone(&self.control);
        self.task = Some(tokio::spawn(async move {
            let result = drive(&game, &control).await;
            control.release();
            if let Err(e) = &result {
                log::error!("scheduler stopped: {}", e);
            }
            result
        }));
        Ok(())
    }

    /// Stop after the round in progress.
    pub fn pause(&self) {
        self.control.request_pause();
    }

    /// Let a paused scheduler finish its round, then continue from the
    /// current state.
    pub async fn resume(&mut self) -> Result<(), EngineError> {
        self.wait().await?;
        self.start()
    }

    /// Wait for the progression task. Returns whether the match is over.
    pub async fn wait(&mut self) -> Result<bool, EngineError> {
        match self.task.take() {
            Some(task) => task
                .await
                .map_err(|e| EngineError::state(format!("scheduler task failed: {}", e)))?,
            None => Ok(self.game.lock().await.is_over()),
        }
    }
}

async fn drive(game: &Mutex<Match>, control: &SchedulerControl) -> Result<bool, EngineError> {
    loop {
        if control.pause_requested() {
            log::info!("scheduler paused");
            return Ok(false);
        }
        let mut game = game.lock().await;
        if game.play_round().await? {
            game.end()?;
            return Ok(true);
        }
    }
}

impl core::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Scheduler")
            .field("control", &self.control)
            .field("task", &self.task.is_some())
            .finish()
    }
}
