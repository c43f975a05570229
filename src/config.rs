use std::fs;
use std::path::Path;

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::policy::ActionEncoding;
use crate::reward::ScoreModel;
use crate::sensors::SensorLayout;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub board_size: i32,
    pub sensors: SensorLayout,
    pub encoding: ActionEncoding,
    pub score: ScoreModel,
    /// Minimum steps without growth before an episode is abandoned.
    pub stagnation_floor: usize,
    pub seeds_per_member: usize,
    /// Seeds the per-generation seed draw; entropy when absent.
    pub master_seed: Option<u64>,
    /// Stop training once a generation's best fitness reaches this.
    pub fitness_goal: Option<f64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            board_size: 40,
            sensors: SensorLayout::Canonical,
            encoding: ActionEncoding::Categorical,
            score: ScoreModel::default(),
            stagnation_floor: 50,
            seeds_per_member: 50,
            master_seed: None,
            fitness_goal: None,
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
        let config: Config =
            serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        // a single cell leaves nowhere to place the apple
        ensure!(self.board_size >= 2, "board_size must be at least 2, got {}", self.board_size);
        ensure!(self.seeds_per_member > 0, "seeds_per_member must be positive");
        if let ScoreModel::Shaped { length_weight } = self.score {
            ensure!(length_weight.is_finite(), "length_weight must be finite, got {}", length_weight);
        }
        if let Some(goal) = self.fitness_goal {
            ensure!(!goal.is_nan(), "fitness_goal must be a number");
        }
        Ok(())
    }

    /// Number of sensor inputs and action outputs a policy must accept.
    pub fn topology(&self) -> (usize, usize) {
        (self.sensors.len(), self.encoding.outputs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let c = Config::default();
        c.validate().unwrap();
        assert_eq!(c.topology(), (6, 3));
        assert_eq!(c.score, ScoreModel::Shaped { length_weight: 10. });
    }

    #[test]
    fn partial_json_fills_defaults() {
        let c: Config = serde_json::from_str(
            r#"{"board_size": 12, "sensors": "ray_scan", "encoding": "scalar", "score": "terminal_only"}"#,
        )
        .unwrap();
        assert_eq!(c.board_size, 12);
        assert_eq!(c.topology(), (9, 1));
        assert_eq!(c.score, ScoreModel::TerminalOnly);
        assert_eq!(c.seeds_per_member, 50);
    }

    #[test]
    fn shaped_weight_from_json() {
        let c: Config = serde_json::from_str(r#"{"score": {"shaped": {"length_weight": 4.0}}}"#).unwrap();
        assert_eq!(c.score, ScoreModel::Shaped { length_weight: 4. });
    }

    #[test]
    fn rejects_degenerate_values() {
        let bad = [
            Config {
                board_size: 1,
                ..Config::default()
            },
            Config {
                seeds_per_member: 0,
                ..Config::default()
            },
            Config {
                score: ScoreModel::Shaped {
                    length_weight: f64::INFINITY,
                },
                ..Config::default()
            },
        ];
        for c in bad {
            assert!(c.validate().is_err(), "{:?}", c);
        }
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Config::load("/nonexistent/snake.json").unwrap_err();
        assert!(format!("{:#}", err).contains("reading config"));
    }
}
