use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use snake_neuroevo::policy::baseline::{Cautious, Straight};
use snake_neuroevo::{Config, EpisodeRunner, EpisodeState, Policy, TrainingLoop};

#[derive(Parser)]
#[command(name = "snake-neuroevo")]
#[command(version, about = "Headless Snake rollouts for evolved policies")]
struct Cli {
    /// JSON config; defaults apply to missing fields
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the board size
    #[arg(long, global = true)]
    board_size: Option<i32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Score the baseline policies as one generation
    Evaluate {
        /// Generations to evaluate, each with fresh seeds
        #[arg(long, default_value = "1")]
        generations: usize,
    },
    /// Play a single seeded episode and print it as JSON
    Rollout {
        #[arg(long, default_value = "cautious")]
        policy: Baseline,

        #[arg(long, default_value = "0")]
        seed: u64,

        /// Include every step in the output
        #[arg(long)]
        trajectory: bool,

        /// Print the final board
        #[arg(long)]
        show: bool,
    },
    /// Print the effective config
    Config,
}

#[derive(Clone, Copy, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
enum Baseline {
    Straight,
    Cautious,
}

impl Baseline {
    fn build(self, config: &Config) -> Member {
        match self {
            Baseline::Straight => Member::Straight(Straight {
                encoding: config.encoding,
            }),
            Baseline::Cautious => Member::Cautious(Cautious {
                layout: config.sensors,
                encoding: config.encoding,
            }),
        }
    }
}

#[derive(Clone, Copy)]
enum Member {
    Straight(Straight),
    Cautious(Cautious),
}

impl Policy for Member {
    fn decide(&mut self, sensors: &[f64]) -> Vec<f64> {
        match self {
            Member::Straight(p) => p.decide(sensors),
            Member::Cautious(p) => p.decide(sensors),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(size) = cli.board_size {
        config.board_size = size;
    }
    config.validate()?;

    match cli.command {
        Command::Evaluate { generations } => {
            let names = [Baseline::Straight, Baseline::Cautious];
            let mut population: Vec<Member> = names.iter().map(|b| b.build(&config)).collect();
            let mut training = TrainingLoop::new(&config)?;
            info!(
                board_size = config.board_size,
                seeds = config.seeds_per_member,
                members = population.len(),
                "evaluating baselines"
            );

            for _ in 0..generations {
                let report = training.evaluate_generation(&mut population);
                let rows: Vec<_> = names.iter().zip(&report.fitness).collect();
                println!(
                    "{}",
                    serde_json::to_string(&serde_json::json!({
                        "generation": report.generation,
                        "seeds": training.context().seeds().len(),
                        "fitness": rows,
                        "best": report.best,
                        "mean": report.mean,
                    }))?
                );
            }
        }
        Command::Rollout {
            policy,
            seed,
            trajectory,
            show,
        } => {
            let runner = EpisodeRunner::from(&config);
            let mut p = policy.build(&config);
            let mut rollout = runner.rollout(seed);
            if trajectory {
                rollout = rollout.recording();
            }
            while rollout.tick(&mut p) == EpisodeState::Running {}
            if show {
                eprint!("{}", rollout.game());
            }
            println!("{}", serde_json::to_string_pretty(&rollout.finish())?);
        }
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
