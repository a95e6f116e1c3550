//! Regression positions for the playout policy.
//!
//! Each position leaves exactly one candidate in the tier that fires, so
//! the expected move does not depend on the random number generator.

mod common;

use fastrand::Rng;

use common::board_from_sgf;
use thinkgo::board::Board;
use thinkgo::playout::{MoveType, PlayoutPolicy};

fn generate(board: &Board, seed: u64) -> (String, MoveType) {
    let mut rng = Rng::with_seed(seed);
    let mut policy = PlayoutPolicy::new();
    policy.initialize(board, &mut rng);
    let mv = policy.generate_move(board, &mut rng);
    (board.point_notation(mv), policy.move_type())
}

#[test]
fn test_global_capture() {
    let board = board_from_sgf("SZ[9]KM[7.5]AB[ef][fe][gf]AW[ff]PL[W];W[cc]");
    for seed in 0..5 {
        assert_eq!(generate(&board, seed), ("F3".to_string(), MoveType::Capture));
    }
}

#[test]
fn test_atari_defense_extends() {
    let board = board_from_sgf("SZ[9]KM[7.5]AB[ai]PL[W];W[ah]");
    for seed in 0..5 {
        assert_eq!(
            generate(&board, seed),
            ("B1".to_string(), MoveType::AtariDefense)
        );
    }
}

/// The liberty D1 does not escape the atari; B3 does, by capturing a block
/// adjacent to the block that was just put in atari.
#[test]
fn test_atari_defense_by_counter_capture() {
    let board =
        board_from_sgf("SZ[9]KM[7.5]AB[ah][bh][cg]AW[ai][bi][ci][ag][ch]PL[B];B[dh]");
    for seed in 0..5 {
        assert_eq!(
            generate(&board, seed),
            ("B3".to_string(), MoveType::AtariDefense)
        );
    }
}

/// B2 does not escape the atari, so the atari tiers stay silent and the
/// pattern tier, which runs before global captures, answers D2.
#[test]
fn test_pattern_before_capture() {
    let board = board_from_sgf("SZ[9]KM[7.5]AB[ah][bg][di]AW[ai][ag][bi][ci]PL[B];B[ch]");
    for seed in 0..5 {
        let (mv, move_type) = generate(&board, seed);
        assert_ne!(mv, "B2");
        assert_eq!((mv.as_str(), move_type), ("D2", MoveType::Pattern));
    }
}

/// The policy only ever returns legal moves and ends a game on its own.
#[test]
fn test_policy_plays_out_a_game() {
    let mut board = Board::new(9);
    let mut rng = Rng::with_seed(99);
    let mut policy = PlayoutPolicy::new();
    policy.initialize(&board, &mut rng);

    let mut moves = 0;
    while !board.is_game_over() && moves < 500 {
        let mv = policy.generate_move(&board, &mut rng);
        assert!(board.is_legal(mv, board.to_move()));
        board.place_stone(mv);
        policy.on_play(&board, &mut rng);
        moves += 1;
    }
    assert!(board.is_game_over(), "game did not end in {moves} moves");
    board.check_invariants();
}
