use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::{random_placement, Controller, PlacementContext, ShotContext};
use crate::ship::Ship;
use crate::shot::{Coordinates, Shot};

/// Controller that places and fires uniformly at random among untried cells.
pub struct RandomController {
    name: String,
    rng: SmallRng,
}

impl RandomController {
    /// Deterministic controller for reproducible matches.
    pub fn seeded(seed: u64) -> Self {
        Self {
            name: format!("random-{}", seed),
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn new() -> Self {
        let mut seed_rng = rand::rng();
        Self {
            name: "random".to_string(),
            rng: SmallRng::from_rng(&mut seed_rng),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Default for RandomController {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller for RandomController {
    fn name(&self) -> &str {
        &self.name
    }

    fn place_ships(&mut self, ctx: &PlacementContext) -> anyhow::Result<Vec<Ship>> {
        random_placement(&mut self.rng, ctx)
    }

    fn select_shot(&mut self, ctx: &ShotContext) -> anyhow::Result<Shot> {
        let targets: Vec<_> = ctx.active_opponents().collect();
        if targets.is_empty() {
            return Err(anyhow::anyhow!("no active opponent to shoot at"));
        }
        let target = targets[self.rng.random_range(0..targets.len())];
        let open: Vec<Coordinates> = (0..ctx.height as i32)
            .flat_map(|r| (0..ctx.width as i32).map(move |c| Coordinates::new(r, c)))
            .filter(|cell| !target.is_tried(*cell))
            .collect();
        if open.is_empty() {
            return Err(anyhow::anyhow!("no untried cell left on {}", target.id));
        }
        let cell = open[self.rng.random_range(0..open.len())];
        Ok(Shot::new(target.id, cell))
    }
}
