use anyhow::Result;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::Config;
use crate::episode::EpisodeRunner;
use crate::policy::Policy;

/// Generation bookkeeping owned by one `TrainingLoop`.
#[derive(Clone, Debug)]
pub struct TrainingContext {
    generation: usize,
    seeds_per_member: usize,
    seed_source: SmallRng,
    seeds: Vec<u64>,
}

impl TrainingContext {
    pub fn new(seeds_per_member: usize, master_seed: Option<u64>) -> Self {
        let seed_source = match master_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self {
            generation: 0,
            seeds_per_member,
            seed_source,
            seeds: Vec::new(),
        }
    }

    /// Draws the seeds every member of the next generation plays.
    pub fn begin_generation(&mut self) -> &[u64] {
        self.generation += 1;
        let source = &mut self.seed_source;
        self.seeds = (0..self.seeds_per_member).map(|_| source.r#gen()).collect();
        &self.seeds
    }

    /// Generations started so far.
    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn seeds(&self) -> &[u64] {
        &self.seeds
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub generation: usize,
    pub fitness: Vec<f64>,
    pub best: f64,
    pub mean: f64,
    pub best_index: Option<usize>,
}

impl GenerationReport {
    fn new(generation: usize, fitness: Vec<f64>) -> Self {
        let mut best_index = None;
        let mut best = f64::NEG_INFINITY;
        for (i, &f) in fitness.iter().enumerate() {
            if f > best {
                best = f;
                best_index = Some(i);
            }
        }
        let mean = if fitness.is_empty() {
            0.
        } else {
            fitness.iter().sum::<f64>() / fitness.len() as f64
        };
        Self {
            generation,
            fitness,
            best,
            mean,
            best_index,
        }
    }
}

/// The evolutionary engine on the other side of the loop. It owns the
/// population and everything that changes it.
pub trait Trainer {
    type Member: Policy + Send;

    fn population(&mut self) -> &mut [Self::Member];

    /// Called once every member has its fitness for the generation.
    fn advance(&mut self, report: &GenerationReport);
}

/// Sum of one member's scores over `seeds`.
pub fn evaluate_member<P: Policy + ?Sized>(runner: &EpisodeRunner, policy: &mut P, seeds: &[u64]) -> f64 {
    seeds.iter().map(|&seed| runner.run(&mut *policy, seed).score).sum()
}

pub struct TrainingLoop {
    runner: EpisodeRunner,
    context: TrainingContext,
    fitness_goal: Option<f64>,
}

impl TrainingLoop {
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            runner: EpisodeRunner::from(config),
            context: TrainingContext::new(config.seeds_per_member, config.master_seed),
            fitness_goal: config.fitness_goal,
        })
    }

    pub fn runner(&self) -> &EpisodeRunner {
        &self.runner
    }

    pub fn context(&self) -> &TrainingContext {
        &self.context
    }

    /// Plays every member against the same fresh seeds, in parallel.
    /// Fitness is returned in population order.
    pub fn evaluate_generation<P: Policy + Send>(&mut self, population: &mut [P]) -> GenerationReport {
        let runner = self.runner;
        let seeds = self.context.begin_generation();
        let fitness: Vec<f64> = population
            .par_iter_mut()
            .map(|member| evaluate_member(&runner, member, seeds))
            .collect();

        let report = GenerationReport::new(self.context.generation(), fitness);
        info!(
            generation = report.generation,
            best = report.best,
            mean = report.mean,
            best_index = ?report.best_index,
            "generation evaluated"
        );
        report
    }

    /// Evaluates and hands back to `trainer` for up to `generations`
    /// rounds, stopping early at the fitness goal.
    pub fn run<T: Trainer>(&mut self, trainer: &mut T, generations: usize) -> Vec<GenerationReport> {
        let mut reports = Vec::with_capacity(generations);
        for _ in 0..generations {
            let report = self.evaluate_generation(trainer.population());
            trainer.advance(&report);

            let reached = self.fitness_goal.is_some_and(|goal| report.best >= goal);
            reports.push(report);
            if reached {
                warn!(generation = self.context.generation(), "fitness goal reached");
                break;
            }
        }
        reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::baseline::{Cautious, Straight};
    use crate::policy::{ActionEncoding, Turn};
    use crate::sensors::SensorLayout;

    fn config() -> Config {
        Config {
            board_size: 10,
            seeds_per_member: 5,
            master_seed: Some(99),
            ..Config::default()
        }
    }

    #[test]
    fn fresh_seeds_each_generation() {
        let mut ctx = TrainingContext::new(4, Some(1));
        let first = ctx.begin_generation().to_vec();
        let second = ctx.begin_generation().to_vec();
        assert_eq!(first.len(), 4);
        assert_ne!(first, second);
        assert_eq!(ctx.generation(), 2);

        let mut again = TrainingContext::new(4, Some(1));
        assert_eq!(again.begin_generation(), first.as_slice());
    }

    #[test]
    fn identical_members_tie() {
        let mut tl = TrainingLoop::new(&config()).unwrap();
        let mut pop = vec![
            Straight {
                encoding: ActionEncoding::Categorical
            };
            3
        ];
        let report = tl.evaluate_generation(&mut pop);
        assert_eq!(report.fitness.len(), 3);
        assert!(report.fitness.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(report.best_index, Some(0));
    }

    #[test]
    fn fitness_is_sum_over_seeds() {
        let tl = TrainingLoop::new(&config()).unwrap();
        let seeds = [1, 2, 3];
        let mut p = Cautious {
            layout: SensorLayout::Canonical,
            encoding: ActionEncoding::Categorical,
        };
        let total = evaluate_member(tl.runner(), &mut p, &seeds);
        let by_hand: f64 = seeds.iter().map(|&s| tl.runner().run(&mut p, s).score).sum();
        assert_eq!(total, by_hand);
    }

    struct Fixed {
        pop: Vec<Box<dyn FnMut(&[f64]) -> Vec<f64> + Send>>,
        seen: Vec<usize>,
    }

    impl Trainer for Fixed {
        type Member = Box<dyn FnMut(&[f64]) -> Vec<f64> + Send>;

        fn population(&mut self) -> &mut [Self::Member] {
            &mut self.pop
        }

        fn advance(&mut self, report: &GenerationReport) {
            self.seen.push(report.generation);
        }
    }

    #[test]
    fn run_stops_at_goal() {
        let enc = ActionEncoding::Categorical;
        let member: Box<dyn FnMut(&[f64]) -> Vec<f64> + Send> = Box::new(move |_: &[f64]| enc.encode(Turn::Straight));
        let mut trainer = Fixed {
            pop: vec![member],
            seen: Vec::new(),
        };
        let mut c = config();
        c.fitness_goal = Some(0.);
        let mut tl = TrainingLoop::new(&c).unwrap();
        let reports = tl.run(&mut trainer, 10);
        assert_eq!(reports.len(), 1);
        assert_eq!(trainer.seen, vec![1]);

        c.fitness_goal = None;
        let mut tl = TrainingLoop::new(&c).unwrap();
        assert_eq!(tl.run(&mut trainer, 3).len(), 3);
        assert_eq!(trainer.seen, vec![1, 1, 2, 3]);
    }
}
