use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::game::Game;
use crate::policy::{ActionEncoding, Policy, Turn};
use crate::pos::{Dir, Pos};
use crate::reward::ScoreModel;
use crate::sensors::SensorLayout;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    Collision,
    Stagnation,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EpisodeState {
    Running,
    Done(Termination),
}

/// Ends episodes that stop growing.
#[derive(Clone, Copy, Debug)]
pub struct Stagnation {
    floor: usize,
    best_len: usize,
    since_growth: usize,
}

impl Stagnation {
    pub fn new(floor: usize, start_len: usize) -> Self {
        Self {
            floor,
            best_len: start_len,
            since_growth: 0,
        }
    }

    pub fn cutoff(&self, board_size: i32, len: usize) -> usize {
        self.floor.max(board_size.max(0) as usize * len / 2)
    }

    /// Records one step; true once the allowance is exceeded.
    pub fn observe(&mut self, board_size: i32, len: usize) -> bool {
        if len > self.best_len {
            self.best_len = len;
            self.since_growth = 0;
        } else {
            self.since_growth += 1;
        }
        self.since_growth > self.cutoff(board_size, len)
    }

    pub fn since_growth(&self) -> usize {
        self.since_growth
    }
}

/// World state after one committed step.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub turn: Turn,
    pub heading: Dir,
    pub head: Pos,
    pub apple: Pos,
    pub length: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub seed: u64,
    pub first_apple: Pos,
    pub frames: Vec<Frame>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpisodeOutcome {
    pub seed: u64,
    pub score: f64,
    pub steps: usize,
    pub length: usize,
    pub termination: Termination,
    pub trajectory: Option<Trajectory>,
}

/// Everything a rollout needs besides the policy and the seed.
#[derive(Clone, Copy, Debug)]
pub struct EpisodeRunner {
    pub board_size: i32,
    pub sensors: SensorLayout,
    pub encoding: ActionEncoding,
    pub score: ScoreModel,
    pub stagnation_floor: usize,
}

impl From<&Config> for EpisodeRunner {
    fn from(c: &Config) -> Self {
        Self {
            board_size: c.board_size,
            sensors: c.sensors,
            encoding: c.encoding,
            score: c.score,
            stagnation_floor: c.stagnation_floor,
        }
    }
}

impl EpisodeRunner {
    pub fn rollout(&self, seed: u64) -> Rollout {
        Rollout::new(*self, Game::new(self.board_size, seed), seed)
    }

    pub fn run<P: Policy + ?Sized>(&self, policy: &mut P, seed: u64) -> EpisodeOutcome {
        let mut r = self.rollout(seed);
        while r.tick(policy) == EpisodeState::Running {}
        r.finish()
    }

    pub fn run_recorded<P: Policy + ?Sized>(&self, policy: &mut P, seed: u64) -> EpisodeOutcome {
        let mut r = self.rollout(seed).recording();
        while r.tick(policy) == EpisodeState::Running {}
        r.finish()
    }
}

/// One episode, advanced a decision at a time.
#[derive(Clone, Debug)]
pub struct Rollout {
    runner: EpisodeRunner,
    game: Game,
    seed: u64,
    stagnation: Stagnation,
    steps: usize,
    state: EpisodeState,
    trajectory: Option<Trajectory>,
}

impl Rollout {
    /// Drives an existing world; `seed` only labels the outcome.
    pub fn new(runner: EpisodeRunner, game: Game, seed: u64) -> Self {
        let stagnation = Stagnation::new(runner.stagnation_floor, game.len());
        Self {
            runner,
            game,
            seed,
            stagnation,
            steps: 0,
            state: EpisodeState::Running,
            trajectory: None,
        }
    }

    pub fn recording(mut self) -> Self {
        self.trajectory = Some(Trajectory {
            seed: self.seed,
            first_apple: self.game.apple(),
            frames: Vec::new(),
        });
        self
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn state(&self) -> EpisodeState {
        self.state
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Sense, decide, turn, step, then check for stagnation.
    pub fn tick<P: Policy + ?Sized>(&mut self, policy: &mut P) -> EpisodeState {
        if self.state != EpisodeState::Running {
            return self.state;
        }
        if self.game.is_done() {
            self.state = EpisodeState::Done(Termination::Collision);
            return self.state;
        }

        let sensors = self.runner.sensors.encode(&self.game);
        let turn = self.runner.encoding.decode(&policy.decide(&sensors));
        self.game.set_heading(turn.apply(self.game.heading()));
        self.game.step();
        self.steps += 1;

        if self.game.is_done() {
            self.state = EpisodeState::Done(Termination::Collision);
            return self.state;
        }

        if let Some(t) = self.trajectory.as_mut() {
            t.frames.push(Frame {
                turn,
                heading: self.game.heading(),
                head: self.game.head(),
                apple: self.game.apple(),
                length: self.game.len(),
            });
        }

        if self.stagnation.observe(self.game.board_size(), self.game.len()) {
            self.state = EpisodeState::Done(Termination::Stagnation);
        }
        self.state
    }

    /// Scores the world as it stands, whichever way the episode ended.
    pub fn finish(self) -> EpisodeOutcome {
        let termination = match self.state {
            EpisodeState::Done(t) => t,
            EpisodeState::Running if self.game.is_done() => Termination::Collision,
            // abandoned by the caller
            EpisodeState::Running => Termination::Stagnation,
        };
        let score = self.runner.score.score(&self.game);
        debug!(
            seed = self.seed,
            ?termination,
            steps = self.steps,
            length = self.game.len(),
            score,
            "episode finished"
        );

        EpisodeOutcome {
            seed: self.seed,
            score,
            steps: self.steps,
            length: self.game.len(),
            termination,
            trajectory: self.trajectory,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::baseline::Straight;

    fn runner(board_size: i32) -> EpisodeRunner {
        EpisodeRunner {
            board_size,
            ..EpisodeRunner::from(&Config::default())
        }
    }

    #[test]
    fn cutoff_scales_with_length() {
        let s = Stagnation::new(50, 1);
        assert_eq!(s.cutoff(5, 1), 50);
        assert_eq!(s.cutoff(40, 10), 200);
    }

    #[test]
    fn growth_resets_the_counter() {
        let mut s = Stagnation::new(2, 1);
        assert!(!s.observe(4, 1));
        assert!(!s.observe(4, 1));
        assert!(!s.observe(4, 2));
        assert_eq!(s.since_growth(), 0);
        assert!(!s.observe(4, 2));
        assert!(!s.observe(4, 2));
        assert!(!s.observe(4, 2));
        assert!(!s.observe(4, 2));
        assert!(s.observe(4, 2));
    }

    #[test]
    fn straight_runner_hits_the_wall() {
        let r = runner(10);
        let mut p = Straight {
            encoding: r.encoding,
        };
        let out = r.run(&mut p, 11);
        assert_eq!(out.termination, Termination::Collision);
        // centre (5,5) to row 0 takes 5 moves, the 6th leaves the board
        assert!(out.steps <= 6);
        assert!(out.score > 9.);
    }

    #[test]
    fn tick_after_done_is_stable() {
        let r = runner(6);
        let mut p = Straight {
            encoding: r.encoding,
        };
        let mut roll = r.rollout(2);
        while roll.tick(&mut p) == EpisodeState::Running {}
        let steps = roll.steps();
        assert_eq!(roll.tick(&mut p), EpisodeState::Done(Termination::Collision));
        assert_eq!(roll.steps(), steps);
    }

    #[test]
    fn recording_captures_each_surviving_step() {
        let r = runner(10);
        let mut p = Straight {
            encoding: r.encoding,
        };
        let out = r.run_recorded(&mut p, 3);
        let t = out.trajectory.unwrap();
        assert_eq!(t.seed, 3);
        assert_eq!(t.first_apple, Game::new(10, 3).apple());
        // the fatal step is not recorded
        assert_eq!(t.frames.len(), out.steps - 1);
        assert!(t.frames.iter().all(|f| f.heading == Dir::North));
    }
}
