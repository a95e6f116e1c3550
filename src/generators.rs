//! Incremental move generators feeding the playout policy.
//!
//! Both generators keep a candidate list that is cheap to keep in sync with
//! the board: call `initialize` once per playout and `on_play` after every
//! move applied to the board.

use fastrand::Rng;

use crate::board::{Board, Cell, Point};
use crate::constants::PASS_MOVE;
use crate::playout::is_move_good;

/// Tracks blocks in atari so capturing moves can be found without a board scan.
#[derive(Clone, Debug, Default)]
pub struct CaptureGenerator {
    candidates: Vec<Point>,
}

impl CaptureGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the anchor of every block currently in atari.
    pub fn initialize(&mut self, board: &Board) {
        self.candidates.clear();
        for p in board.points() {
            if board.cell(p) != Cell::Empty && board.anchor(p) == p && board.in_atari(p) {
                self.candidates.push(p);
            }
        }
    }

    /// Append the capturing move for every opponent block still in atari.
    ///
    /// Stale candidates (captured, or no longer in atari) are dropped. A block
    /// reached through two candidates yields its liberty twice.
    pub fn generate(&mut self, board: &Board, moves: &mut Vec<Point>) {
        let opp = Cell::from(board.to_move().opp());
        let mut i = 0;
        while i < self.candidates.len() {
            let p = self.candidates[i];
            if !board.occupied_in_atari(p) {
                self.candidates.swap_remove(i);
                continue;
            }
            if board.cell(p) == opp {
                moves.push(board.the_liberty(p));
            }
            i += 1;
        }
    }

    /// Record blocks put in atari by the last move.
    pub fn on_play(&mut self, board: &Board) {
        let last = board.last_move();
        if !board.is_on_board(last) {
            return;
        }
        if board.occupied_in_atari(last) {
            self.candidates.push(board.anchor(last));
        }
        // Opponent blocks only lose liberties if the last move touches them.
        if board.num_neighbors(last, board.to_move()) == 0 {
            return;
        }
        for n in board.neighbors(last) {
            if board.occupied_in_atari(n) {
                self.candidates.push(board.anchor(n));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Shuffled pool of empty points for uniform random move selection.
#[derive(Clone, Debug, Default)]
pub struct RandomMoveGenerator {
    moves: Vec<Point>,
}

impl RandomMoveGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initialize(&mut self, board: &Board, rng: &mut Rng) {
        self.moves.clear();
        for p in board.points() {
            if board.cell(p) == Cell::Empty {
                self.insert(p, rng);
            }
        }
    }

    /// Scan from the tail for an empty point that is a good move, dropping
    /// occupied points on the way. Returns pass when nothing is left.
    pub fn select_random_move(&mut self, board: &Board) -> Point {
        let mut i = self.moves.len();
        while i > 0 {
            i -= 1;
            let p = self.moves[i];
            if board.cell(p) != Cell::Empty {
                self.moves.swap_remove(i);
            } else if is_move_good(board, p) {
                return p;
            }
        }
        PASS_MOVE
    }

    /// Points freed by captures become candidates again.
    pub fn on_play(&mut self, board: &Board, rng: &mut Rng) {
        for &p in board.captured_stones() {
            self.insert(p, rng);
        }
    }

    /// Insert at a random position by moving the displaced entry to the end.
    fn insert(&mut self, p: Point, rng: &mut Rng) {
        if self.moves.is_empty() {
            self.moves.push(p);
        } else {
            let i = rng.usize(..self.moves.len());
            let displaced = self.moves[i];
            self.moves.push(displaced);
            self.moves[i] = p;
        }
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}
