//! Placement legality and shot resolution for the classic game mode.

use crate::event::ShotOutcome;
use crate::ship::Ship;
use crate::shot::{Coordinates, PlayerId, Shot};
use crate::state::{Fleet, PlayerState};

/// Errors returned when checking a ship placement.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    /// The submitted ship lengths differ from the configured template.
    #[error("expected ships of sizes {expected:?}, got {got:?}")]
    WrongFleet { expected: Vec<u32>, got: Vec<u32> },
    /// A ship extends past the field edge.
    #[error("ship placement is out of bounds: {0:?}")]
    ShipOutOfBounds(Ship),
    /// Two ships share a cell.
    #[error("ship placement overlaps with another ship: {0:?} / {1:?}")]
    ShipOverlaps(Ship, Ship),
}

/// Errors returned when checking a shot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShotError {
    /// Target cell lies outside the field.
    #[error("target {0} is out of bounds")]
    OutOfBounds(Coordinates),
    /// The shooter aimed at its own board.
    #[error("cannot shoot at own board")]
    OwnBoard,
    /// The receiver is not an active participant of the round.
    #[error("player {0} is not a valid target")]
    InvalidReceiver(PlayerId),
    /// The cell on the receiver's board was already shot at.
    #[error("target {0} was already shot at")]
    AlreadyTaken(Coordinates),
}

/// Outcome of resolving a legal shot against the receiver's fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub outcome: ShotOutcome,
    /// Slot in `ships_left` and the ship that the shot finished off.
    pub sunk: Option<(usize, Ship)>,
}

/// Rules of classic battleship on a `width`×`height` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassicRules {
    width: u32,
    height: u32,
}

impl ClassicRules {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Check that `ships` match the `template` sizes, fit the field and do
    /// not overlap.
    pub fn check_placement(&self, ships: &[Ship], template: &[u32]) -> Result<(), PlacementError> {
        let mut expected = template.to_vec();
        let mut got: Vec<u32> = ships.iter().map(Ship::length).collect();
        expected.sort_unstable();
        got.sort_unstable();
        if expected != got {
            return Err(PlacementError::WrongFleet { expected, got });
        }
        for (i, ship) in ships.iter().enumerate() {
            if !ship.fits(self.width, self.height) {
                return Err(PlacementError::ShipOutOfBounds(*ship));
            }
            if let Some(other) = ships[..i].iter().find(|other| other.overlaps(ship)) {
                return Err(PlacementError::ShipOverlaps(*other, *ship));
            }
        }
        Ok(())
    }

    /// Check that `shooter` may fire `shot` at an active `receiver`.
    pub fn check_shot(
        &self,
        shooter: PlayerId,
        shot: &Shot,
        receiver: Option<&PlayerState>,
    ) -> Result<(), ShotError> {
        let target = shot.coordinates();
        if shot.receiver() == shooter {
            return Err(ShotError::OwnBoard);
        }
        let receiver = match receiver {
            Some(r) if r.id == shot.receiver() && r.is_active() => r,
            _ => return Err(ShotError::InvalidReceiver(shot.receiver())),
        };
        if !target.within(self.width, self.height) {
            return Err(ShotError::OutOfBounds(target));
        }
        if receiver
            .fleet
            .shots_against
            .iter()
            .any(|s| s.coordinates() == target)
        {
            return Err(ShotError::AlreadyTaken(target));
        }
        Ok(())
    }

    /// Resolve a legal shot against `fleet`, before it is recorded.
    pub fn resolve(&self, fleet: &Fleet, target: Coordinates) -> Resolution {
        let Some(index) = fleet.ships_left.iter().position(|s| s.contains(target)) else {
            return Resolution {
                outcome: if fleet.is_hit(target) {
                    ShotOutcome::Hit
                } else {
                    ShotOutcome::Miss
                },
                sunk: None,
            };
        };
        let mut hits = fleet.cells_shot();
        hits.push(target);
        let ship = fleet.ships_left[index];
        Resolution {
            outcome: ShotOutcome::Hit,
            sunk: ship.is_sunk(&hits).then_some((index, ship)),
        }
    }
}
