//! Controller trait and built-in implementations
//!
//! A controller is the external decision maker behind a player. The engine
//! only ever calls it through a [`ControllerRegister`](crate::ControllerRegister),
//! which bounds every call by the configured deadline.
//! - RandomController: uniform random placement and targeting
//! - ProbabilityController: hunt/target probability density shooter

use rand::Rng;

use crate::event::Event;
use crate::ship::{Orientation, Ship};
use crate::shot::{Coordinates, PlayerId, RoundId, Shot};

/// What a controller sees when asked to place its ships.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementContext {
    pub player: PlayerId,
    pub round: RoundId,
    pub width: u32,
    pub height: u32,
    pub ship_sizes: Vec<u32>,
}

/// Public view of an opponent's board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpponentView {
    pub id: PlayerId,
    /// Still a legal target this round.
    pub active: bool,
    /// Cells shot at by anyone that hit a ship.
    pub hits: Vec<Coordinates>,
    /// Cells shot at by anyone that missed.
    pub misses: Vec<Coordinates>,
    /// Ships already sunk, with their position revealed.
    pub sunk: Vec<Ship>,
    /// Lengths of ships still afloat.
    pub ship_lengths_remaining: Vec<u32>,
}

impl OpponentView {
    pub fn is_tried(&self, cell: Coordinates) -> bool {
        self.hits.contains(&cell) || self.misses.contains(&cell)
    }
}

/// What a controller sees when asked for its next shot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShotContext {
    pub player: PlayerId,
    pub round: RoundId,
    pub width: u32,
    pub height: u32,
    /// Other participants in turn order.
    pub opponents: Vec<OpponentView>,
}

impl ShotContext {
    pub fn active_opponents(&self) -> impl Iterator<Item = &OpponentView> + '_ {
        self.opponents.iter().filter(|o| o.active)
    }
}

/// Interface implemented by decision-making agents.
///
/// Calls may run on a worker thread and can be abandoned when they exceed
/// the deadline, so implementations should be pure decision functions.
pub trait Controller: Send {
    /// Display name recorded when the player joins a match.
    fn name(&self) -> &str;

    /// Place one ship for every size in `ctx.ship_sizes`.
    fn place_ships(&mut self, ctx: &PlacementContext) -> anyhow::Result<Vec<Ship>>;

    /// Choose the next target.
    fn select_shot(&mut self, ctx: &ShotContext) -> anyhow::Result<Shot>;

    /// Inform the controller of the events produced by the last turn.
    fn notify(&mut self, _events: &[Event]) {}
}

/// Random non-overlapping placement for every ship in `ctx`, retrying the
/// whole fleet when a ship cannot be fitted.
pub fn random_placement<R: Rng + ?Sized>(
    rng: &mut R,
    ctx: &PlacementContext,
) -> anyhow::Result<Vec<Ship>> {
    const FLEET_ATTEMPTS: usize = 100;
    const SHIP_ATTEMPTS: usize = 100;
    'fleet: for _ in 0..FLEET_ATTEMPTS {
        let mut ships: Vec<Ship> = Vec::with_capacity(ctx.ship_sizes.len());
        for &len in ctx.ship_sizes.iter() {
            let mut placed = None;
            for _ in 0..SHIP_ATTEMPTS {
                let orient = if rng.random() {
                    Orientation::Horizontal
                } else {
                    Orientation::Vertical
                };
                let (rows, cols) = match orient {
                    Orientation::Vertical => (ctx.height.checked_sub(len), Some(ctx.width - 1)),
                    Orientation::Horizontal => (Some(ctx.height - 1), ctx.width.checked_sub(len)),
                };
                let (Some(max_r), Some(max_c)) = (rows, cols) else {
                    continue;
                };
                let r = rng.random_range(0..=max_r) as i32;
                let c = rng.random_range(0..=max_c) as i32;
                let ship = Ship::new(Coordinates::new(r, c), orient, len);
                if !ships.iter().any(|other| other.overlaps(&ship)) {
                    placed = Some(ship);
                    break;
                }
            }
            match placed {
                Some(ship) => ships.push(ship),
                None => continue 'fleet,
            }
        }
        return Ok(ships);
    }
    Err(anyhow::anyhow!(
        "unable to place ships {:?} on a {}x{} field",
        ctx.ship_sizes,
        ctx.width,
        ctx.height
    ))
}

pub mod probability;
pub mod random;

pub use probability::ProbabilityController;
pub use random::RandomController;
