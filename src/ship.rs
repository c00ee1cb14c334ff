//! Ship definitions and placement geometry on a runtime-sized field.

use core::fmt;
use serde::{Deserialize, Serialize};

use crate::shot::Coordinates;

/// Orientation of a ship on the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// A ship anchored at `origin` and extending right (horizontal) or down
/// (vertical) for `length` cells.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ship {
    origin: Coordinates,
    orientation: Orientation,
    length: u32,
}

impl Ship {
    pub const fn new(origin: Coordinates, orientation: Orientation, length: u32) -> Self {
        Self {
            origin,
            orientation,
            length,
        }
    }

    pub fn origin(&self) -> Coordinates {
        self.origin
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    /// Cells covered by the ship, from the origin outwards.
    pub fn cells(&self) -> impl Iterator<Item = Coordinates> + '_ {
        (0..self.length as i32).map(move |i| match self.orientation {
            Orientation::Horizontal => Coordinates::new(self.origin.row, self.origin.col + i),
            Orientation::Vertical => Coordinates::new(self.origin.row + i, self.origin.col),
        })
    }

    pub fn contains(&self, cell: Coordinates) -> bool {
        match self.orientation {
            Orientation::Horizontal => {
                cell.row == self.origin.row
                    && cell.col >= self.origin.col
                    && cell.col < self.origin.col + self.length as i32
            }
            Orientation::Vertical => {
                cell.col == self.origin.col
                    && cell.row >= self.origin.row
                    && cell.row < self.origin.row + self.length as i32
            }
        }
    }

    /// Returns `true` when every cell is covered by `hits`.
    pub fn is_sunk(&self, hits: &[Coordinates]) -> bool {
        self.cells().all(|cell| hits.contains(&cell))
    }

    /// Returns `true` when the whole ship lies inside a `width`×`height` field.
    pub fn fits(&self, width: u32, height: u32) -> bool {
        self.length > 0 && self.cells().all(|c| c.within(width, height))
    }

    pub fn overlaps(&self, other: &Ship) -> bool {
        self.cells().any(|c| other.contains(c))
    }
}

impl fmt::Debug for Ship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ship {{ origin: {}, orientation: {:?}, length: {} }}",
            self.origin, self.orientation, self.length,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_and_contains() {
        let ship = Ship::new(Coordinates::new(0, 0), Orientation::Vertical, 4);
        let cells: Vec<_> = ship.cells().collect();
        assert_eq!(
            cells,
            vec![
                Coordinates::new(0, 0),
                Coordinates::new(1, 0),
                Coordinates::new(2, 0),
                Coordinates::new(3, 0)
            ]
        );
        for c in cells {
            assert!(ship.contains(c));
        }
        assert!(!ship.contains(Coordinates::new(4, 0)));
    }

    #[test]
    fn sunk_needs_every_cell() {
        let ship = Ship::new(Coordinates::new(1, 1), Orientation::Horizontal, 2);
        let mut hits = vec![Coordinates::new(1, 1)];
        assert!(!ship.is_sunk(&hits));
        hits.push(Coordinates::new(1, 2));
        assert!(ship.is_sunk(&hits));
    }

    #[test]
    fn fits_and_overlaps() {
        let a = Ship::new(Coordinates::new(2, 6), Orientation::Horizontal, 5);
        assert!(!a.fits(10, 10));
        let b = Ship::new(Coordinates::new(2, 5), Orientation::Horizontal, 5);
        assert!(b.fits(10, 10));
        let c = Ship::new(Coordinates::new(0, 7), Orientation::Vertical, 3);
        assert!(b.overlaps(&c));
        let d = Ship::new(Coordinates::new(3, 0), Orientation::Vertical, 3);
        assert!(!b.overlaps(&d));
    }
}
