use proptest::prelude::*;

use snake_neuroevo::sensors::dist_scale;
use snake_neuroevo::{Dir, Game, Pos, Probe, Turn};

fn turn(n: u8) -> Turn {
    Turn::ALL[(n % 3) as usize]
}

proptest! {
    #[test]
    fn head_stays_on_board(board in 4i32..16, seed in any::<u64>(), turns in prop::collection::vec(0u8..3, 0..300)) {
        let mut g = Game::new(board, seed);
        for t in turns {
            let before = g.len();
            g.set_heading(turn(t).apply(g.heading()));
            let ate = g.step();
            if g.is_done() {
                break;
            }
            prop_assert!(g.head().in_bounds(board));
            prop_assert!(g.apple().in_bounds(board));
            prop_assert!(!g.contains(g.apple()));
            prop_assert_eq!(g.len(), if ate { before + 1 } else { before });
        }
    }

    #[test]
    fn heading_never_reverses(dirs in prop::collection::vec(0u8..4, 1..64)) {
        let mut g = Game::new(10, 0);
        for d in dirs {
            let before = g.heading();
            g.set_heading(Dir::from_ordinal(d));
            prop_assert_ne!(g.heading(), before.opposite());
        }
    }

    #[test]
    fn finished_games_stay_frozen(seed in any::<u64>(), extra in 1usize..20) {
        let mut g = Game::new(6, seed);
        while !g.is_done() {
            g.step();
        }
        let (body, apple, shaping) = (g.body().clone(), g.apple(), g.shaping());
        for _ in 0..extra {
            g.step();
        }
        prop_assert_eq!(g.body(), &body);
        prop_assert_eq!(g.apple(), apple);
        prop_assert_eq!(g.shaping(), shaping);
    }

    #[test]
    fn dist_scale_halves_with_distance(board in 5i32..20, k in 1i32..4) {
        // apple k cells east of the head
        let g = Game::from_parts(board, vec![Pos::new(1, 0)], Dir::East, Pos::new(1, k), 0).unwrap();
        let v = dist_scale(&g, g.head(), Dir::East, Probe::Apple);
        prop_assert_eq!(v, 0.5f64.powi(k));
        prop_assert!(v > 0. && v < 1.);
        prop_assert_eq!(dist_scale(&g, g.apple(), Dir::East, Probe::Apple), 1.);
    }
}
