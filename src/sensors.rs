//! Direction-relative features for a policy.
//!
//! Every value lies in `[0, 1]` regardless of board size, so one network
//! topology can be trained on one board and evaluated on another. The
//! order of a layout is part of the policy's contract.

use std::f64::consts::{PI, TAU};

use serde::{Deserialize, Serialize};

use crate::game::{Game, Probe};
use crate::pos::{Dir, Pos};
use crate::reward::proximity;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorLayout {
    /// `[hazard_fwd, hazard_left, hazard_right, apple_proximity,
    /// apple_angle_left, apple_angle_right]`
    #[default]
    Canonical,
    /// `[wall_fwd, wall_left, wall_right, body_fwd, body_left, body_right,
    /// apple_fwd, apple_left, apple_right]`
    RayScan,
}

impl SensorLayout {
    pub fn len(self) -> usize {
        match self {
            SensorLayout::Canonical => 6,
            SensorLayout::RayScan => 9,
        }
    }

    pub fn encode(self, game: &Game) -> Vec<f64> {
        let head = game.head();
        let heading = game.heading();
        let looks = [heading, heading.left(), heading.right()];

        match self {
            SensorLayout::Canonical => {
                let mut out: Vec<f64> = looks
                    .iter()
                    .map(|&d| dist_scale(game, head, d, Probe::Hazard))
                    .collect();
                out.push(proximity(game.board_size(), head, game.apple()));
                out.push(angle_ratio(head, game.apple(), heading.left()));
                out.push(angle_ratio(head, game.apple(), heading.right()));
                out
            }
            SensorLayout::RayScan => [Probe::OutOfBounds, Probe::Body, Probe::Apple]
                .iter()
                .flat_map(|&probe| looks.into_iter().map(move |d| dist_scale(game, head, d, probe)))
                .collect(),
        }
    }
}

/// Walks from `from` towards `dir` until `probe` holds, at most
/// `board_size` steps. Yields `0.5^steps`: 1 on the origin itself and
/// `0.5^(board_size + 1)` when nothing was found.
pub fn dist_scale(game: &Game, from: Pos, dir: Dir, probe: Probe) -> f64 {
    let cap = game.board_size();
    let mut cell = from;
    for steps in 0..=cap {
        if game.probe(cell, probe) {
            return 0.5f64.powi(steps);
        }
        cell = cell.step(dir);
    }
    0.5f64.powi(cap + 1)
}

/// Angle between the bearing to `apple` and `relative`, scaled to `[0, 1]`.
/// 0 when the apple lies exactly along `relative`, 1 when directly behind it.
pub fn angle_ratio(head: Pos, apple: Pos, relative: Dir) -> f64 {
    let mut angle = head.bearing_to(apple) - relative.bearing();
    // into (-pi, pi]
    while angle <= -PI {
        angle += TAU;
    }
    while angle > PI {
        angle -= TAU;
    }
    angle.abs() / PI
}
