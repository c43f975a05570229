use std::collections::VecDeque;
use std::fmt;

use ahash::AHashSet;
use anyhow::{Result, ensure};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

use crate::pos::{Dir, Pos};
use crate::reward::shaping_bonus;

/// Cell tests the sensors can run against a world.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Probe {
    OutOfBounds,
    /// Any body segment except the head.
    Body,
    Apple,
    /// `OutOfBounds` or `Body`: moving there ends the game.
    Hazard,
}

/// Single-snake, single-apple square grid.
#[derive(Clone, Debug)]
pub struct Game {
    board_size: i32,
    // tail at the front, head at the back
    snake: VecDeque<Pos>,
    occupied: AHashSet<Pos>,
    heading: Dir,
    apple: Pos,
    done: bool,
    shaping: f64,
    rng: SmallRng,
}

impl Game {
    /// One segment in the centre heading north, apple placed from `seed`.
    ///
    /// # Panics
    ///
    /// If `board_size` is not positive. `Config::validate` rules that out
    /// for every world built through an `EpisodeRunner`.
    pub fn new(board_size: i32, seed: u64) -> Self {
        assert!(board_size > 0, "board size must be positive, got {}", board_size);
        let start = Pos::new(board_size / 2, board_size / 2);
        let mut g = Self {
            board_size,
            snake: VecDeque::from([start]),
            occupied: AHashSet::from_iter([start]),
            heading: Dir::North,
            // rejected by the first spawn
            apple: start,
            done: false,
            shaping: 0.,
            rng: SmallRng::seed_from_u64(seed),
        };
        g.spawn_apple();
        g
    }

    /// Builds a world in a known layout. `snake` runs tail to head.
    pub fn from_parts(board_size: i32, snake: Vec<Pos>, heading: Dir, apple: Pos, seed: u64) -> Result<Self> {
        ensure!(board_size > 0, "board size must be positive, got {}", board_size);
        ensure!(!snake.is_empty(), "snake needs at least one segment");

        let mut occupied = AHashSet::with_capacity(snake.len());
        for &p in &snake {
            ensure!(p.in_bounds(board_size), "segment {:?} is off the board", p);
            ensure!(occupied.insert(p), "segment {:?} appears twice", p);
        }
        ensure!(apple.in_bounds(board_size), "apple {:?} is off the board", apple);
        ensure!(!occupied.contains(&apple), "apple {:?} overlaps the snake", apple);

        Ok(Self {
            board_size,
            snake: snake.into(),
            occupied,
            heading,
            apple,
            done: false,
            shaping: 0.,
            rng: SmallRng::seed_from_u64(seed),
        })
    }

    /// Reversals are ignored.
    pub fn set_heading(&mut self, dir: Dir) {
        if dir != self.heading.opposite() {
            self.heading = dir;
        }
    }

    /// Advances one cell. Returns true if an apple was eaten on this step.
    pub fn step(&mut self) -> bool {
        if self.done {
            return false;
        }

        let head = self.head();
        let next_head = head.step(self.heading);
        if !next_head.in_bounds(self.board_size) || self.occupied.contains(&next_head) {
            self.done = true;
            return false;
        }

        let before = head.distance(self.apple);
        self.snake.push_back(next_head);
        self.occupied.insert(next_head);

        // measured against the apple being chased, not its replacement
        let after = next_head.distance(self.apple);
        self.shaping += shaping_bonus(self.board_size, before, after);

        let ate = next_head == self.apple;
        if ate {
            trace!(length = self.snake.len(), at = ?next_head, "apple eaten");
            self.spawn_apple();
        } else if let Some(tail) = self.snake.pop_front() {
            self.occupied.remove(&tail);
        }
        ate
    }

    /// Never returns while the snake covers every cell.
    pub fn spawn_apple(&mut self) {
        let old = self.apple;
        loop {
            let p = Pos::new(
                self.rng.gen_range(0..self.board_size),
                self.rng.gen_range(0..self.board_size),
            );
            if p != old && !self.occupied.contains(&p) {
                self.apple = p;
                break;
            }
        }
    }

    pub fn probe(&self, cell: Pos, probe: Probe) -> bool {
        match probe {
            Probe::OutOfBounds => !cell.in_bounds(self.board_size),
            Probe::Body => cell != self.head() && self.occupied.contains(&cell),
            Probe::Apple => cell == self.apple,
            Probe::Hazard => self.probe(cell, Probe::OutOfBounds) || self.probe(cell, Probe::Body),
        }
    }

    pub fn board_size(&self) -> i32 {
        self.board_size
    }

    pub fn head(&self) -> Pos {
        // never empty: the only removal follows a push
        self.snake[self.snake.len() - 1]
    }

    /// Tail first, head last.
    pub fn body(&self) -> &VecDeque<Pos> {
        &self.snake
    }

    pub fn len(&self) -> usize {
        self.snake.len()
    }

    pub fn contains(&self, cell: Pos) -> bool {
        self.occupied.contains(&cell)
    }

    pub fn apple(&self) -> Pos {
        self.apple
    }

    pub fn heading(&self) -> Dir {
        self.heading
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Accumulated approach/retreat bonus.
    pub fn shaping(&self) -> f64 {
        self.shaping
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head = self.head();
        for row in 0..self.board_size {
            for col in 0..self.board_size {
                let p = Pos::new(row, col);
                let c = if p == head {
                    '#'
                } else if self.occupied.contains(&p) {
                    'o'
                } else if p == self.apple {
                    '@'
                } else {
                    '.'
                };
                write!(f, "{}", c)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
