use std::f64::consts::{FRAC_PI_2, PI};

use serde::{Deserialize, Serialize};

/// A grid cell. Rows grow south, columns grow east.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub row: i32,
    pub col: i32,
}

impl Pos {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    pub fn step(self, dir: Dir) -> Self {
        let (dr, dc) = dir.offset();
        Self::new(self.row + dr, self.col + dc)
    }

    pub fn in_bounds(self, board_size: i32) -> bool {
        self.row >= 0 && self.row < board_size && self.col >= 0 && self.col < board_size
    }

    pub fn distance(self, other: Pos) -> f64 {
        let dr = (other.row - self.row) as f64;
        let dc = (other.col - self.col) as f64;
        dr.hypot(dc)
    }

    /// Angle from `self` towards `other`, east = 0, counter-clockwise positive.
    pub fn bearing_to(self, other: Pos) -> f64 {
        let north = (self.row - other.row) as f64;
        let east = (other.col - self.col) as f64;
        north.atan2(east)
    }
}

/// Heading, cyclic in clockwise order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dir {
    North = 0,
    East = 1,
    South = 2,
    West = 3,
}

impl Dir {
    pub const ALL: [Dir; 4] = [Dir::North, Dir::East, Dir::South, Dir::West];

    pub fn from_ordinal(n: u8) -> Self {
        Self::ALL[(n % 4) as usize]
    }

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn opposite(self) -> Self {
        Self::from_ordinal(self.ordinal() + 2)
    }

    pub fn left(self) -> Self {
        Self::from_ordinal(self.ordinal() + 3)
    }

    pub fn right(self) -> Self {
        Self::from_ordinal(self.ordinal() + 1)
    }

    /// Unit step as (row, col) delta.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Dir::North => (-1, 0),
            Dir::East => (0, 1),
            Dir::South => (1, 0),
            Dir::West => (0, -1),
        }
    }

    pub fn bearing(self) -> f64 {
        match self {
            Dir::East => 0.,
            Dir::North => FRAC_PI_2,
            Dir::West => PI,
            Dir::South => -FRAC_PI_2,
        }
    }
}
