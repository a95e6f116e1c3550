//! Heuristic playout policy.
//!
//! The policy picks one move for the side to move by trying a fixed list of
//! tactical tiers in order. Each tier collects candidates; one is drawn at
//! random and the first candidate that is legal and not a pointless fill
//! wins. The tier that produced the move is reported as a [`MoveType`], which
//! the search uses to tell quiet positions from contested ones.
//!
//! The policy keeps incremental generators in sync with a board it does not
//! own. After `initialize`, the caller must call `on_play` after every move
//! applied to that board.

use arrayvec::ArrayVec;
use fastrand::Rng;

use crate::board::{Board, Cell, Point};
use crate::constants::PASS_MOVE;
use crate::generators::{CaptureGenerator, RandomMoveGenerator};
use crate::patterns;

/// Which tier of the policy produced a move.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MoveType {
    /// No move generated yet.
    None,
    /// Capture the block of the last move, which is in atari.
    AtariCapture,
    /// Save an own block put in atari by the last move.
    AtariDefense,
    /// Fight over a block left with two liberties.
    LowLib,
    /// A shape move next to one of the last two moves.
    Pattern,
    /// Capture any block in atari on the board.
    Capture,
    /// Uniformly random fill.
    Random,
    /// Nothing left to play.
    Pass,
}

/// True if `p` is legal for the side to move and does not fill a point
/// completely surrounded by one color.
#[inline]
pub fn is_move_good(board: &Board, p: Point) -> bool {
    board.is_legal(p, board.to_move()) && !board.is_completely_surrounded(p)
}

#[derive(Clone, Debug)]
pub struct PlayoutPolicy {
    random_generator: RandomMoveGenerator,
    capture_generator: CaptureGenerator,
    moves: Vec<Point>,
    move_type: MoveType,
}

impl Default for PlayoutPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayoutPolicy {
    pub fn new() -> Self {
        PlayoutPolicy {
            random_generator: RandomMoveGenerator::new(),
            capture_generator: CaptureGenerator::new(),
            moves: Vec::with_capacity(8),
            move_type: MoveType::None,
        }
    }

    /// Prepare the generators for a new playout from `board`.
    pub fn initialize(&mut self, board: &Board, rng: &mut Rng) {
        self.random_generator.initialize(board, rng);
        self.capture_generator.initialize(board);
        self.moves.clear();
        self.move_type = MoveType::None;
    }

    /// Tier that produced the most recent move.
    pub fn move_type(&self) -> MoveType {
        self.move_type
    }

    /// Candidates of the tier that produced the most recent move, all of
    /// which the policy would consider equally good.
    pub fn equivalent_best_moves(&self) -> &[Point] {
        &self.moves
    }

    /// Keep the generators in sync after a move was applied to the board.
    pub fn on_play(&mut self, board: &Board, rng: &mut Rng) {
        self.random_generator.on_play(board, rng);
        self.capture_generator.on_play(board);
    }

    /// Choose a move for the side to move. Always legal; pass when nothing
    /// else is.
    pub fn generate_move(&mut self, board: &Board, rng: &mut Rng) -> Point {
        self.moves.clear();
        self.move_type = MoveType::None;

        let mut mv = None;
        let last = board.last_move();
        if board.is_on_board(last) {
            if self.generate_atari_capture_move(board) {
                mv = self.select(board, rng, MoveType::AtariCapture);
            }
            if mv.is_none() && self.generate_atari_defense_move(board) {
                mv = self.select(board, rng, MoveType::AtariDefense);
            }
            if mv.is_none() && self.generate_low_lib_move(board, last) {
                mv = self.select(board, rng, MoveType::LowLib);
            }
            if mv.is_none() && self.generate_pattern_move(board) {
                mv = self.select(board, rng, MoveType::Pattern);
            }
        }

        if mv.is_none() {
            self.moves.clear();
            self.capture_generator.generate(board, &mut self.moves);
            mv = self.select(board, rng, MoveType::Capture);
        }

        let mv = match mv {
            Some(mv) => mv,
            None => {
                let random = self.random_generator.select_random_move(board);
                self.move_type = if random == PASS_MOVE {
                    MoveType::Pass
                } else {
                    MoveType::Random
                };
                random
            }
        };

        let mv = match board.do_self_atari_correction(mv) {
            Some(corrected) => {
                self.moves.clear();
                self.moves.push(corrected);
                corrected
            }
            None => mv,
        };

        debug_assert!(board.is_legal(mv, board.to_move()));
        mv
    }

    fn generate_atari_capture_move(&mut self, board: &Board) -> bool {
        let last = board.last_move();
        if board.in_atari(last) {
            self.moves.push(board.the_liberty(last));
            return true;
        }
        false
    }

    fn generate_atari_defense_move(&mut self, board: &Board) -> bool {
        let to_move = board.to_move();
        let last = board.last_move();
        if board.num_neighbors(last, to_move) == 0 {
            return false;
        }

        let own = Cell::from(to_move);
        let mut seen = ArrayVec::<Point, 4>::new();
        for n in board.neighbors(last) {
            if board.cell(n) != own || !board.in_atari(n) {
                continue;
            }
            let anchor = board.anchor(n);
            if seen.contains(&anchor) {
                continue;
            }
            seen.push(anchor);

            // Extending is only an escape if it is not a self-atari.
            let liberty = board.the_liberty(anchor);
            if !board.self_atari(liberty, to_move) {
                self.moves.push(liberty);
            }

            for opp_block in board.adjacent_blocks(anchor, 1) {
                let opp_liberty = board.the_liberty(opp_block);
                if opp_liberty != liberty {
                    self.moves.push(opp_liberty);
                }
            }
        }
        !self.moves.is_empty()
    }

    fn generate_low_lib_move(&mut self, board: &Board, last: Point) -> bool {
        if board.num_liberties(last) == 2 {
            self.play_good_liberties(board, board.anchor(last));
        }

        let to_move = board.to_move();
        if board.num_neighbors(last, to_move) != 0 {
            let own = Cell::from(to_move);
            let mut seen = ArrayVec::<Point, 4>::new();
            for n in board.neighbors(last) {
                if board.cell(n) == own && board.num_liberties(n) == 2 {
                    let anchor = board.anchor(n);
                    if !seen.contains(&anchor) {
                        seen.push(anchor);
                        self.play_good_liberties(board, anchor);
                    }
                }
            }
        }
        !self.moves.is_empty()
    }

    /// Liberties of a two-liberty block that gain liberties without self-atari.
    /// Blocks that form a simple chain with a neighbour are left alone.
    fn play_good_liberties(&mut self, board: &Board, anchor: Point) {
        if board.is_simple_chain(anchor).is_some() {
            return;
        }
        for &liberty in board.liberties(anchor) {
            if board.gains_liberties(anchor, liberty) && !board.self_atari(liberty, board.to_move()) {
                self.moves.push(liberty);
            }
        }
    }

    fn generate_pattern_move(&mut self, board: &Board) -> bool {
        self.add_pattern_moves_around(board, board.last_move());
        let second = board.second_last_move();
        if board.is_on_board(second) {
            self.add_pattern_moves_around(board, second);
        }
        !self.moves.is_empty()
    }

    fn add_pattern_moves_around(&mut self, board: &Board, center: Point) {
        let to_move = board.to_move();
        for p in board.neighbors(center).into_iter().chain(board.diagonals(center)) {
            if board.cell(p) == Cell::Empty
                && !self.moves.contains(&p)
                && patterns::match_any(board, p)
                && !board.self_atari(p, to_move)
            {
                self.moves.push(p);
            }
        }
    }

    /// Draw candidates at random until one is a good move. Rejected
    /// candidates are removed, so `moves` ends up holding the survivors.
    fn select(&mut self, board: &Board, rng: &mut Rng, move_type: MoveType) -> Option<Point> {
        match self.moves.len() {
            0 => return None,
            1 => {
                let mv = self.moves[0];
                if is_move_good(board, mv) {
                    self.move_type = move_type;
                    return Some(mv);
                }
                self.moves.clear();
                return None;
            }
            _ => {}
        }

        let mut i = rng.usize(..self.moves.len());
        while !self.moves.is_empty() {
            let mv = self.moves[i];
            if is_move_good(board, mv) {
                self.move_type = move_type;
                return Some(mv);
            }
            self.moves.swap_remove(i);
            if i >= self.moves.len() {
                i = 0;
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Color;

    #[test]
    fn test_empty_board_plays_random() {
        let board = Board::new(9);
        let mut rng = Rng::with_seed(3);
        let mut policy = PlayoutPolicy::new();
        policy.initialize(&board, &mut rng);
        let mv = policy.generate_move(&board, &mut rng);
        assert!(board.is_on_board(mv));
        assert_eq!(policy.move_type(), MoveType::Random);
    }

    #[test]
    fn test_atari_capture_tier() {
        let mut board = Board::new(9);
        let mut rng = Rng::with_seed(3);
        for s in ["D5", "F5", "E6"] {
            let p = board.parse_point(s).unwrap();
            board.place_non_played_stone(p, Color::Black);
        }
        board.set_to_move(Color::White);
        let e5 = board.parse_point("E5").unwrap();
        board.play_checked(e5).unwrap();

        let mut policy = PlayoutPolicy::new();
        policy.initialize(&board, &mut rng);
        let mv = policy.generate_move(&board, &mut rng);
        assert_eq!(board.point_notation(mv), "E4");
        assert_eq!(policy.move_type(), MoveType::AtariCapture);
        assert_eq!(policy.equivalent_best_moves(), &[mv]);
    }

    #[test]
    fn test_full_board_passes() {
        let mut board = Board::new(2);
        let mut rng = Rng::with_seed(5);
        for s in ["A1", "B2"] {
            let p = board.parse_point(s).unwrap();
            board.place_non_played_stone(p, Color::Black);
        }
        // Only A2 and B1 are left, both single-point eyes of Black.
        let mut policy = PlayoutPolicy::new();
        policy.initialize(&board, &mut rng);
        let mv = policy.generate_move(&board, &mut rng);
        assert_eq!(mv, PASS_MOVE);
        assert_eq!(policy.move_type(), MoveType::Pass);
    }
}
