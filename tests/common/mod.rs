#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use fleetmatch::controller::{PlacementContext, ShotContext};
use fleetmatch::{Controller, Coordinates, Event, Orientation, Ship, Shot};

/// Places ships on consecutive rows from the top-left and fires row-major at
/// the first active opponent.
pub struct Sweeper {
    name: String,
}

impl Sweeper {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl Controller for Sweeper {
    fn name(&self) -> &str {
        &self.name
    }

    fn place_ships(&mut self, ctx: &PlacementContext) -> anyhow::Result<Vec<Ship>> {
        Ok(ctx
            .ship_sizes
            .iter()
            .enumerate()
            .map(|(row, len)| {
                Ship::new(Coordinates::new(row as i32, 0), Orientation::Horizontal, *len)
            })
            .collect())
    }

    fn select_shot(&mut self, ctx: &ShotContext) -> anyhow::Result<Shot> {
        let target = ctx
            .active_opponents()
            .next()
            .ok_or_else(|| anyhow::anyhow!("nobody left"))?;
        for r in 0..ctx.height as i32 {
            for c in 0..ctx.width as i32 {
                let cell = Coordinates::new(r, c);
                if !target.is_tried(cell) {
                    return Ok(Shot::new(target.id, cell));
                }
            }
        }
        Err(anyhow::anyhow!("board exhausted"))
    }
}

/// A sweeper that stalls for `sleep` on its `stall_on`-th shot request.
pub struct Sleepy {
    inner: Sweeper,
    sleep: Duration,
    stall_on: usize,
    calls: usize,
}

impl Sleepy {
    pub fn new(sleep: Duration, stall_on: usize) -> Self {
        Self {
            inner: Sweeper::new("sleepy"),
            sleep,
            stall_on,
            calls: 0,
        }
    }
}

impl Controller for Sleepy {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn place_ships(&mut self, ctx: &PlacementContext) -> anyhow::Result<Vec<Ship>> {
        self.inner.place_ships(ctx)
    }

    fn select_shot(&mut self, ctx: &ShotContext) -> anyhow::Result<Shot> {
        self.calls += 1;
        if self.calls == self.stall_on {
            std::thread::sleep(self.sleep);
        }
        self.inner.select_shot(ctx)
    }
}

/// A sweeper whose shot requests never return.
pub struct Hung {
    inner: Sweeper,
}

impl Hung {
    pub fn new() -> Self {
        Self {
            inner: Sweeper::new("hung"),
        }
    }
}

impl Controller for Hung {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn place_ships(&mut self, ctx: &PlacementContext) -> anyhow::Result<Vec<Ship>> {
        self.inner.place_ships(ctx)
    }

    fn select_shot(&mut self, _ctx: &ShotContext) -> anyhow::Result<Shot> {
        loop {
            std::thread::sleep(Duration::from_secs(3600));
        }
    }
}

/// How a [`Faulty`] controller misbehaves when asked for a shot.
#[derive(Clone, Copy, Debug)]
pub enum Misbehaviour {
    Error,
    Panic,
    OwnBoard,
    OutOfBounds,
}

pub struct Faulty {
    inner: Sweeper,
    mode: Misbehaviour,
}

impl Faulty {
    pub fn new(mode: Misbehaviour) -> Self {
        Self {
            inner: Sweeper::new("faulty"),
            mode,
        }
    }
}

impl Controller for Faulty {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn place_ships(&mut self, ctx: &PlacementContext) -> anyhow::Result<Vec<Ship>> {
        self.inner.place_ships(ctx)
    }

    fn select_shot(&mut self, ctx: &ShotContext) -> anyhow::Result<Shot> {
        match self.mode {
            Misbehaviour::Error => Err(anyhow::anyhow!("out of ideas")),
            Misbehaviour::Panic => panic!("controller crashed"),
            Misbehaviour::OwnBoard => Ok(Shot::new(ctx.player, Coordinates::new(0, 0))),
            Misbehaviour::OutOfBounds => {
                let target = ctx.opponents[0].id;
                Ok(Shot::new(target, Coordinates::new(ctx.height as i32, 0)))
            }
        }
    }
}

/// Submits two overlapping ships.
pub struct Overlapping;

impl Controller for Overlapping {
    fn name(&self) -> &str {
        "overlapping"
    }

    fn place_ships(&mut self, ctx: &PlacementContext) -> anyhow::Result<Vec<Ship>> {
        Ok(ctx
            .ship_sizes
            .iter()
            .map(|len| Ship::new(Coordinates::new(0, 0), Orientation::Horizontal, *len))
            .collect())
    }

    fn select_shot(&mut self, _ctx: &ShotContext) -> anyhow::Result<Shot> {
        Err(anyhow::anyhow!("never deployed"))
    }
}

/// A sweeper that keeps every notification it receives.
pub struct Listener {
    inner: Sweeper,
    pub seen: Arc<Mutex<Vec<Event>>>,
}

impl Listener {
    pub fn new(name: &str) -> (Self, Arc<Mutex<Vec<Event>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                inner: Sweeper::new(name),
                seen: Arc::clone(&seen),
            },
            seen,
        )
    }
}

impl Controller for Listener {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn place_ships(&mut self, ctx: &PlacementContext) -> anyhow::Result<Vec<Ship>> {
        self.inner.place_ships(ctx)
    }

    fn select_shot(&mut self, ctx: &ShotContext) -> anyhow::Result<Shot> {
        self.inner.select_shot(ctx)
    }

    fn notify(&mut self, events: &[Event]) {
        self.seen.lock().unwrap().extend_from_slice(events);
    }
}
