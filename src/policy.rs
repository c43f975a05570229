use serde::{Deserialize, Serialize};

use crate::pos::Dir;
use crate::sensors::SensorLayout;

/// A steering decision relative to the current heading.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Turn {
    Left,
    Straight,
    Right,
}

impl Turn {
    /// Index order shared by both encodings.
    pub const ALL: [Turn; 3] = [Turn::Left, Turn::Straight, Turn::Right];

    pub fn apply(self, heading: Dir) -> Dir {
        match self {
            Turn::Left => heading.left(),
            Turn::Straight => heading,
            Turn::Right => heading.right(),
        }
    }
}

/// How raw policy outputs map to a `Turn`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionEncoding {
    /// Argmax over three outputs `[left, straight, right]`; ties go to the
    /// earliest index.
    #[default]
    Categorical,
    /// One output split into equal bands: `< 1/3` left, `< 2/3` straight,
    /// otherwise right.
    Scalar,
}

impl ActionEncoding {
    pub fn outputs(self) -> usize {
        match self {
            ActionEncoding::Categorical => 3,
            ActionEncoding::Scalar => 1,
        }
    }

    /// Outputs are not sanitised: a NaN only wins the argmax from the first
    /// slot, and falls in the right band.
    pub fn decode(self, outputs: &[f64]) -> Turn {
        match self {
            ActionEncoding::Categorical => {
                let mut best: Option<(usize, f64)> = None;
                for (i, &v) in outputs.iter().take(3).enumerate() {
                    if best.is_none_or(|(_, b)| v > b) {
                        best = Some((i, v));
                    }
                }
                best.map_or(Turn::Straight, |(i, _)| Turn::ALL[i])
            }
            ActionEncoding::Scalar => match outputs.first() {
                None => Turn::Straight,
                Some(&v) if v < 1. / 3. => Turn::Left,
                Some(&v) if v < 2. / 3. => Turn::Straight,
                Some(_) => Turn::Right,
            },
        }
    }

    /// An output vector that decodes back to `turn`.
    pub fn encode(self, turn: Turn) -> Vec<f64> {
        match self {
            ActionEncoding::Categorical => Turn::ALL
                .iter()
                .map(|&t| if t == turn { 1. } else { 0. })
                .collect(),
            ActionEncoding::Scalar => vec![match turn {
                Turn::Left => 1. / 6.,
                Turn::Straight => 0.5,
                Turn::Right => 5. / 6.,
            }],
        }
    }
}

/// Anything that maps a sensor vector to raw action outputs.
pub trait Policy {
    fn decide(&mut self, sensors: &[f64]) -> Vec<f64>;
}

impl<F> Policy for F
where
    F: FnMut(&[f64]) -> Vec<f64>,
{
    fn decide(&mut self, sensors: &[f64]) -> Vec<f64> {
        self(sensors)
    }
}

pub mod baseline {
    use super::*;

    /// Always goes straight ahead.
    #[derive(Clone, Copy, Debug)]
    pub struct Straight {
        pub encoding: ActionEncoding,
    }

    impl Policy for Straight {
        fn decide(&mut self, _sensors: &[f64]) -> Vec<f64> {
            self.encoding.encode(Turn::Straight)
        }
    }

    /// Takes the least dangerous direction, breaking ties towards the apple.
    #[derive(Clone, Copy, Debug)]
    pub struct Cautious {
        pub layout: SensorLayout,
        pub encoding: ActionEncoding,
    }

    impl Cautious {
        /// Inputs that don't fit `layout` keep the heading.
        fn pick(&self, s: &[f64]) -> Turn {
            if s.len() != self.layout.len() {
                return Turn::Straight;
            }
            // (danger, appeal) per [left, straight, right]
            let rate: [(f64, f64); 3] = match self.layout {
                SensorLayout::Canonical => [
                    (s[1], 1. - s[4]),
                    (s[0], 0.5 * ((1. - s[4]) + (1. - s[5]))),
                    (s[2], 1. - s[5]),
                ],
                SensorLayout::RayScan => [
                    (s[1].max(s[4]), s[7]),
                    (s[0].max(s[3]), s[6]),
                    (s[2].max(s[5]), s[8]),
                ],
            };

            let mut best = 1;
            for i in [0, 2] {
                let (danger, appeal) = rate[i];
                let (best_danger, best_appeal) = rate[best];
                if danger < best_danger || (danger == best_danger && appeal > best_appeal) {
                    best = i;
                }
            }
            Turn::ALL[best]
        }
    }

    impl Policy for Cautious {
        fn decide(&mut self, sensors: &[f64]) -> Vec<f64> {
            let turn = self.pick(sensors);
            self.encoding.encode(turn)
        }
    }
}
