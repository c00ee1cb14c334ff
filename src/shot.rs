//! Identity and targeting primitives: player ids, coordinates and shots.

use core::fmt;
use serde::{Deserialize, Serialize};

/// Identifier of a player registered with a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Index of a round within a match's round history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoundId(pub usize);

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "round {}", self.0)
    }
}

/// Team a player belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TeamId(pub u32);

/// A cell on the field. Ordering is row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coordinates {
    pub row: i32,
    pub col: i32,
}

impl Coordinates {
    /// Marker for "not yet targeted".
    pub const UNSET: Coordinates = Coordinates { row: -1, col: -1 };

    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Returns `true` when the cell lies inside a `width`×`height` field.
    pub fn within(&self, width: u32, height: u32) -> bool {
        self.row >= 0 && self.col >= 0 && (self.row as u32) < height && (self.col as u32) < width
    }

    pub fn is_unset(&self) -> bool {
        *self == Self::UNSET
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// A targeted cell on the board of the receiving player.
///
/// Equality and ordering compare the coordinates first and the receiver
/// second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Shot {
    coordinates: Coordinates,
    receiver: PlayerId,
}

impl Shot {
    pub const fn new(receiver: PlayerId, coordinates: Coordinates) -> Self {
        Self {
            coordinates,
            receiver,
        }
    }

    /// A shot aimed at `receiver` whose target has not been chosen yet.
    pub const fn unset(receiver: PlayerId) -> Self {
        Self::new(receiver, Coordinates::UNSET)
    }

    pub fn coordinates(&self) -> Coordinates {
        self.coordinates
    }

    pub fn receiver(&self) -> PlayerId {
        self.receiver
    }

    pub fn is_unset(&self) -> bool {
        self.coordinates.is_unset()
    }
}

impl fmt::Display for Shot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=>[{}]", self.coordinates, self.receiver)
    }
}
