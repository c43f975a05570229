//! Grid Snake as a fitness function for evolved policies.
//!
//! `game` holds the rules, `sensors` turns a board into policy inputs,
//! `reward` scores a board, `episode` plays one seeded game against a
//! policy and `training` fans that out over a population.

pub mod config;
pub mod episode;
pub mod game;
pub mod policy;
pub mod pos;
pub mod reward;
pub mod sensors;
pub mod training;

pub use config::Config;
pub use episode::{EpisodeOutcome, EpisodeRunner, EpisodeState, Rollout, Termination, Trajectory};
pub use game::{Game, Probe};
pub use policy::{ActionEncoding, Policy, Turn};
pub use pos::{Dir, Pos};
pub use reward::ScoreModel;
pub use sensors::SensorLayout;
pub use training::{GenerationReport, Trainer, TrainingContext, TrainingLoop};
