//! Move-choosing strategies behind one interface.
//!
//! A [`Player`] is asked for a move in a position and answers with a point,
//! `PASS_MOVE` or `RESIGN_MOVE`. The board is borrowed, never modified; the
//! caller applies the move.

use fastrand::Rng;

use crate::board::{Board, Point};
use crate::constants::{PASS_MOVE, RESIGN_MOVE};
use crate::generators::RandomMoveGenerator;
use crate::mcts::{SearchConfig, UctSearch};
use crate::playout::PlayoutPolicy;

pub trait Player {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Choose a move for the side to move on `board`.
    fn get_move(&mut self, board: &Board) -> Point;
}

/// Full UCT search, optionally resigning hopeless positions.
pub struct UctPlayer {
    config: SearchConfig,
    search: Option<UctSearch>,
    resign_threshold: Option<f32>,
}

impl UctPlayer {
    pub fn new(config: SearchConfig) -> Self {
        UctPlayer {
            config,
            search: None,
            resign_threshold: None,
        }
    }

    /// Resign when the best root move's mean falls below `threshold`.
    pub fn with_resign_threshold(mut self, threshold: f32) -> Self {
        self.resign_threshold = Some(threshold);
        self
    }

    /// The search behind the last move, for diagnostics.
    pub fn search(&self) -> Option<&UctSearch> {
        self.search.as_ref()
    }
}

impl Player for UctPlayer {
    fn name(&self) -> &str {
        "uct"
    }

    fn get_move(&mut self, board: &Board) -> Point {
        let config = &self.config;
        let search = self
            .search
            .get_or_insert_with(|| UctSearch::new(board, config.clone()));
        search.set_root(board);
        search.run_search();

        let mv = search.best_move();
        if let (Some(threshold), Some(value)) = (self.resign_threshold, search.best_value())
            && mv != PASS_MOVE
            && value < threshold
        {
            return RESIGN_MOVE;
        }
        mv
    }
}

/// One move of the playout policy, no search.
pub struct PolicyPlayer {
    policy: PlayoutPolicy,
    rng: Rng,
}

impl PolicyPlayer {
    pub fn new(seed: u64) -> Self {
        PolicyPlayer {
            policy: PlayoutPolicy::new(),
            rng: Rng::with_seed(seed),
        }
    }
}

impl Player for PolicyPlayer {
    fn name(&self) -> &str {
        "policy"
    }

    fn get_move(&mut self, board: &Board) -> Point {
        self.policy.initialize(board, &mut self.rng);
        self.policy.generate_move(board, &mut self.rng)
    }
}

/// Uniformly random among legal moves that do not fill own eyes.
pub struct RandomPlayer {
    generator: RandomMoveGenerator,
    rng: Rng,
}

impl RandomPlayer {
    pub fn new(seed: u64) -> Self {
        RandomPlayer {
            generator: RandomMoveGenerator::new(),
            rng: Rng::with_seed(seed),
        }
    }
}

impl Player for RandomPlayer {
    fn name(&self) -> &str {
        "random"
    }

    fn get_move(&mut self, board: &Board) -> Point {
        self.generator.initialize(board, &mut self.rng);
        self.generator.select_random_move(board)
    }
}
