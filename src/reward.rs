use std::f64::consts::SQRT_2;

use serde::{Deserialize, Serialize};

use crate::game::Game;
use crate::pos::Pos;

/// How a finished (or abandoned) world is turned into a fitness value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreModel {
    /// `length + proximity` at the final instant.
    TerminalOnly,
    /// `length_weight * length + accumulated shaping bonus`.
    Shaped { length_weight: f64 },
}

impl Default for ScoreModel {
    fn default() -> Self {
        ScoreModel::Shaped { length_weight: 10. }
    }
}

impl ScoreModel {
    pub fn score(&self, game: &Game) -> f64 {
        let length = game.len() as f64;
        match *self {
            ScoreModel::TerminalOnly => length + proximity(game.board_size(), game.head(), game.apple()),
            ScoreModel::Shaped { length_weight } => length_weight * length + game.shaping(),
        }
    }
}

pub fn max_diagonal(board_size: i32) -> f64 {
    board_size as f64 * SQRT_2
}

/// 1 when the apple sits on the head, falling to 0 at a full board diagonal.
pub fn proximity(board_size: i32, head: Pos, apple: Pos) -> f64 {
    let max = max_diagonal(board_size);
    (max - head.distance(apple)) / max
}

/// Per-step bonus for closing on (positive) or retreating from (doubled,
/// negative) the apple.
pub fn shaping_bonus(board_size: i32, previous_distance: f64, current_distance: f64) -> f64 {
    let delta = current_distance - previous_distance;
    let bonus = -delta / (2. * max_diagonal(board_size));
    if delta > 0. { bonus * 2. } else { bonus }
}
