//! UCT search behaviour on small boards and regression positions.

mod common;

use std::time::Duration;

use common::{board_from_sgf, play_all, pt, setup};
use thinkgo::board::{Board, Color};
use thinkgo::constants::PASS_MOVE;
use thinkgo::mcts::{SearchBudget, SearchConfig, UctSearch};

fn config(sims: usize, seed: u64) -> SearchConfig {
    SearchConfig {
        budget: SearchBudget::Simulations(sims),
        seed,
        ..SearchConfig::default()
    }
}

fn best_move(board: &Board, sims: usize, seed: u64) -> String {
    let mut search = UctSearch::new(board, config(sims, seed));
    search.run_search();
    board.point_notation(search.best_move())
}

// =============================================================================
// Regression positions
// =============================================================================

/// Whoever plays B1 wins the game.
#[test]
fn test_finds_only_winning_move() {
    let board = board_from_sgf(
        "SZ[9]KM[6.5]\
         AB[ah][af][ad][ab][bh][bf][be][bd][bc][bb][ba][ch][cf][cd][cb][di][dh][df][de][dd]\
         [dc][db][da][ef][ee][ed][ec][eb][ea][fc][fb][fa][gc][gb][hb][ha][ib]\
         AW[ag][bg][cg][dg][ei][eh][eg][fi][fh][fg][ff][fe][fd][gh][gf][gd][hi][hh][hg][hf]\
         [he][hd][hc][ih][if][id][ic]\
         PL[B]",
    );
    assert_eq!(board.to_move(), Color::Black);
    assert_eq!(best_move(&board, 2000, 42), "B1");
}

/// Black E3 put the white group D5 E5 E4 in atari; D4 is the only move
/// that keeps it alive.
#[test]
fn test_finds_only_living_move() {
    let board = board_from_sgf(
        "SZ[9]KM[7.5];B[fd];W[ee];B[ed];W[de];B[dd];W[dh];B[ce];W[cf];B[fe];W[cd]\
         ;B[be];W[bf];B[df];W[ef];B[ff];W[dg];B[eg]",
    );
    assert_eq!(board.to_move(), Color::White);
    assert_eq!(best_move(&board, 2000, 42), "D4");
}

// =============================================================================
// Search mechanics
// =============================================================================

#[test]
fn test_search_is_deterministic_for_a_seed() {
    let mut board = Board::new(7);
    play_all(&mut board, &["D4", "C3"]);

    let mut a = UctSearch::new(&board, config(300, 7));
    let mut b = UctSearch::new(&board, config(300, 7));
    a.run_search();
    b.run_search();
    assert_eq!(a.best_move(), b.best_move());
    assert_eq!(a.principal_variation(), b.principal_variation());
    assert_eq!(a.root_children(), b.root_children());
}

#[test]
fn test_root_visits_match_simulations() {
    let board = Board::new(5);
    let mut search = UctSearch::new(&board, config(400, 1));
    let sims = search.run_search();
    assert_eq!(sims, 400);
    assert_eq!(search.simulations_run(), 400);

    let children = search.root_children();
    let visits: u32 = children.iter().map(|c| c.visits).sum();
    // The first simulation only plays out from the unexpanded root.
    assert_eq!(visits, 399);
    assert!(children.windows(2).all(|w| w[0].visits >= w[1].visits));
    assert_eq!(search.best_move(), children[0].mv);
}

#[test]
fn test_time_budget_runs_simulations() {
    let board = Board::new(9);
    let mut search = UctSearch::new(
        &board,
        SearchConfig {
            budget: SearchBudget::Time(Duration::from_millis(50)),
            ..SearchConfig::default()
        },
    );
    assert!(search.run_search() > 0);
}

#[test]
fn test_set_budget_applies_to_next_search() {
    let board = Board::new(5);
    let mut search = UctSearch::new(&board, config(100, 9));
    assert_eq!(search.run_search(), 100);
    search.set_budget(SearchBudget::Simulations(50));
    assert_eq!(search.run_search(), 50);
    assert_eq!(search.simulations_run(), 50);
}

#[test]
fn test_no_simulations_gives_pass() {
    let board = Board::new(9);
    let mut search = UctSearch::new(&board, config(0, 1));
    search.run_search();
    assert_eq!(search.best_move(), PASS_MOVE);
    assert_eq!(search.principal_variation(), vec![PASS_MOVE]);
    assert_eq!(search.best_value(), None);
}

#[test]
fn test_finished_game_passes() {
    // Black owns the whole 3x3 board apart from four eyes; White has no
    // legal move except pass, and Black gains nothing by filling an eye.
    let mut board = Board::new(3);
    setup(&mut board, &["A2", "B2", "C2", "B1", "B3"], &[]);
    board.set_to_move(Color::White);
    play_all(&mut board, &["pass"]);
    assert_eq!(best_move(&board, 200, 3), "pass");
}

#[test]
fn test_set_root_reuses_search() {
    let mut board = Board::new(5);
    let mut search = UctSearch::new(&board, config(100, 5));
    search.run_search();
    let first = search.best_move();
    assert!(board.is_legal(first, Color::Black));

    board.place_stone(first);
    search.set_root(&board);
    search.run_search();
    let second = search.best_move();
    assert!(board.is_legal(second, Color::White));

    let mut bigger = Board::new(7);
    bigger.place_stone(pt(&bigger, "D4"));
    search.set_root(&bigger);
    assert_eq!(search.run_search(), 100);
    assert!(bigger.is_legal(search.best_move(), Color::White));
}
