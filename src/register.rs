//! Deadline-bounded access to a player's controller.
//!
//! Every call runs on its own worker thread. The caller waits at most the
//! configured deadline; on expiry the call is abandoned and any result it
//! produces later is dropped without touching match state. Decision calls
//! queue behind an abandoned one and count against their own deadline.
//! Notifications for a controller that is still busy are dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::time::Duration;

use tokio::sync::oneshot;

use crate::controller::{Controller, PlacementContext, ShotContext};
use crate::error::ControllerFailure;
use crate::event::Event;
use crate::ship::Ship;
use crate::shot::{PlayerId, Shot};

/// Controller call names, as recorded in timeout and fault events.
pub const PLACE_SHIPS: &str = "place_ships";
pub const SELECT_SHOT: &str = "select_shot";
pub const NOTIFY: &str = "notify";

/// A player's controller behind a per-call deadline.
pub struct ControllerRegister {
    player: PlayerId,
    name: String,
    controller: Arc<Mutex<Box<dyn Controller>>>,
    deadline: Duration,
}

impl ControllerRegister {
    pub fn new(player: PlayerId, controller: Box<dyn Controller>, deadline: Duration) -> Self {
        Self {
            player,
            name: controller.name().to_string(),
            controller: Arc::new(Mutex::new(controller)),
            deadline,
        }
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Ask the controller for a ship placement.
    pub async fn request_placement(
        &self,
        ctx: PlacementContext,
    ) -> Result<Vec<Ship>, ControllerFailure> {
        self.invoke(PLACE_SHIPS, Access::Queue, move |c| c.place_ships(&ctx)).await
    }

    /// Ask the controller for its next shot.
    pub async fn request_move(&self, ctx: ShotContext) -> Result<Shot, ControllerFailure> {
        self.invoke(SELECT_SHOT, Access::Queue, move |c| c.select_shot(&ctx)).await
    }

    /// Deliver `events` to the controller. Failures are logged only.
    pub async fn notify(&self, events: Vec<Event>) {
        let result = self
            .invoke(NOTIFY, Access::SkipIfBusy, move |c| {
                c.notify(&events);
                Ok(())
            })
            .await;
        if let Err(failure) = result {
            log::warn!("player {} ({}): {}", self.player, self.name, failure);
        }
    }

    async fn invoke<T, F>(
        &self,
        method: &'static str,
        access: Access,
        call: F,
    ) -> Result<T, ControllerFailure>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn Controller) -> anyhow::Result<T> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let abandoned = Arc::new(AtomicBool::new(false));
        let worker_abandoned = Arc::clone(&abandoned);
        let controller = Arc::clone(&self.controller);
        let player = self.player;

        let spawned = std::thread::Builder::new()
            .name(format!("controller-{}-{}", player.0, method))
            .spawn(move || {
                let Some(mut guard) = access.acquire(&controller) else {
                    let _ = tx.send(Err(anyhow::anyhow!(
                        "controller is still busy with an abandoned call"
                    )));
                    return;
                };
                if worker_abandoned.load(Ordering::SeqCst) {
                    log::debug!("skipping abandoned {} call of player {}", method, player);
                    return;
                }
                let result = call(&mut **guard);
                drop(guard);
                if worker_abandoned.load(Ordering::SeqCst) {
                    log::debug!("discarding late {} result of player {}", method, player);
                    return;
                }
                let _ = tx.send(result);
            });
        if let Err(e) = spawned {
            return Err(ControllerFailure::Fault {
                method,
                reason: format!("cannot start controller worker: {}", e),
            });
        }

        match tokio::time::timeout(self.deadline, rx).await {
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(e))) => Err(ControllerFailure::Fault {
                method,
                reason: format!("{:#}", e),
            }),
            Ok(Err(_)) => Err(ControllerFailure::Fault {
                method,
                reason: "controller panicked".to_string(),
            }),
            Err(_) => {
                abandoned.store(true, Ordering::SeqCst);
                log::warn!(
                    "player {} ({}) exceeded {:?} in {}",
                    player,
                    self.name,
                    self.deadline,
                    method
                );
                Err(ControllerFailure::Timeout { method })
            }
        }
    }
}

/// How a worker takes the controller lock.
#[derive(Debug, Clone, Copy)]
enum Access {
    /// Wait for an earlier call to finish. The caller's deadline bounds the wait.
    Queue,
    /// Give up at once if an earlier call still holds the controller.
    SkipIfBusy,
}

impl Access {
    fn acquire(
        self,
        controller: &Mutex<Box<dyn Controller>>,
    ) -> Option<MutexGuard<'_, Box<dyn Controller>>> {
        match self {
            Access::Queue => Some(controller.lock().unwrap_or_else(|p| p.into_inner())),
            Access::SkipIfBusy => match controller.try_lock() {
                Ok(guard) => Some(guard),
                Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
                Err(TryLockError::WouldBlock) => None,
            },
        }
    }
}

impl core::fmt::Debug for ControllerRegister {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ControllerRegister")
            .field("player", &self.player)
            .field("name", &self.name)
            .field("deadline", &self.deadline)
            .finish()
    }
}
