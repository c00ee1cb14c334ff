// Probability-based targeting against an opponent's public board.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::{random_placement, Controller, OpponentView, PlacementContext, ShotContext};
use crate::ship::{Orientation, Ship};
use crate::shot::{Coordinates, Shot};

/// Row-major density matrix, `height` rows of `width` cells.
pub type Density = Vec<Vec<f64>>;

/// Compute a probability density over all untried cells of `view` given the
/// known hits and misses and the lengths of ships still afloat. Each entry
/// sums the relative likelihood of a ship segment occupying that cell. Cells
/// of revealed sunk ships count as blocked.
pub fn calc_pdf(view: &OpponentView, width: u32, height: u32) -> Density {
    let (w, h) = (width as usize, height as usize);
    let mut matrix = vec![vec![0.0f64; w]; h];
    let blocked = |cell: Coordinates| {
        view.misses.contains(&cell) || view.sunk.iter().any(|s| s.contains(cell))
    };
    let live_hit = |cell: Coordinates| {
        view.hits.contains(&cell) && !view.sunk.iter().any(|s| s.contains(cell))
    };

    for &len in view.ship_lengths_remaining.iter() {
        let len = len as usize;
        if len == 0 {
            continue;
        }
        for orient in [Orientation::Horizontal, Orientation::Vertical] {
            let (max_row, max_col) = match orient {
                Orientation::Vertical if len <= h => (h - len + 1, w),
                Orientation::Horizontal if len <= w => (h, w - len + 1),
                _ => continue,
            };
            for r in 0..max_row {
                for c in 0..max_col {
                    let ship = Ship::new(Coordinates::new(r as i32, c as i32), orient, len as u32);
                    if ship.cells().any(blocked) {
                        continue;
                    }
                    let n_hits = ship.cells().filter(|cell| live_hit(*cell)).count();
                    // Placements covering observed hits dominate so that
                    // cells next to confirmed hits stand out.
                    const HIT_BIAS: f64 = 10.0;
                    let weight = HIT_BIAS.powi(n_hits as i32);
                    for cell in ship.cells() {
                        if !view.is_tried(cell) {
                            matrix[cell.row as usize][cell.col as usize] += weight;
                        }
                    }
                }
            }
        }
    }

    normalize(matrix)
}

fn normalize(mut matrix: Density) -> Density {
    let total: f64 = matrix.iter().flatten().sum();
    if total > 0.0 {
        for v in matrix.iter_mut().flatten() {
            *v /= total;
        }
    }
    matrix
}

/// Sample a cell from `pdf` using a temperature parameter. Returns `None`
/// when the matrix carries no weight.
pub fn sample_pdf<R: Rng + ?Sized>(
    pdf: &Density,
    temperature: f64,
    rng: &mut R,
) -> Option<Coordinates> {
    let adjusted: Vec<Vec<f64>> = pdf
        .iter()
        .map(|row| row.iter().map(|v| v.powf(1.0 / temperature)).collect())
        .collect();
    let total: f64 = adjusted.iter().flatten().sum();
    if total <= 0.0 || !total.is_finite() {
        return None;
    }
    let threshold: f64 = rng.random_range(0.0..total);
    let mut cumulative = 0.0;
    let mut last = None;
    for (r, row) in adjusted.iter().enumerate() {
        for (c, &v) in row.iter().enumerate() {
            if v <= 0.0 {
                continue;
            }
            cumulative += v;
            last = Some(Coordinates::new(r as i32, c as i32));
            if threshold < cumulative {
                return last;
            }
        }
    }
    last
}

/// Hunt/target controller: concentrates fire where the density of possible
/// ship placements is highest.
pub struct ProbabilityController {
    name: String,
    rng: SmallRng,
    temperature: f64,
}

impl ProbabilityController {
    pub fn seeded(seed: u64) -> Self {
        Self {
            name: format!("probability-{}", seed),
            rng: SmallRng::seed_from_u64(seed),
            temperature: 0.5,
        }
    }

    pub fn new() -> Self {
        let mut seed_rng = rand::rng();
        Self {
            name: "probability".to_string(),
            rng: SmallRng::from_rng(&mut seed_rng),
            temperature: 0.5,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Lower temperatures bias sampling towards the most likely cells.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature.max(f64::EPSILON);
        self
    }
}

impl Default for ProbabilityController {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller for ProbabilityController {
    fn name(&self) -> &str {
        &self.name
    }

    fn place_ships(&mut self, ctx: &PlacementContext) -> anyhow::Result<Vec<Ship>> {
        random_placement(&mut self.rng, ctx)
    }

    fn select_shot(&mut self, ctx: &ShotContext) -> anyhow::Result<Shot> {
        // Prefer the opponent with the most unsunk hits.
        let target = ctx
            .active_opponents()
            .max_by_key(|o| {
                o.hits
                    .iter()
                    .filter(|h| !o.sunk.iter().any(|s| s.contains(**h)))
                    .count()
            })
            .ok_or_else(|| anyhow::anyhow!("no active opponent to shoot at"))?;

        let pdf = calc_pdf(target, ctx.width, ctx.height);
        if let Some(cell) = sample_pdf(&pdf, self.temperature, &mut self.rng) {
            return Ok(Shot::new(target.id, cell));
        }
        let open: Vec<Coordinates> = (0..ctx.height as i32)
            .flat_map(|r| (0..ctx.width as i32).map(move |c| Coordinates::new(r, c)))
            .filter(|cell| !target.is_tried(*cell))
            .collect();
        if open.is_empty() {
            return Err(anyhow::anyhow!("no untried cell left on {}", target.id));
        }
        Ok(Shot::new(target.id, open[self.rng.random_range(0..open.len())]))
    }
}
