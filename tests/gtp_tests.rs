//! GTP sessions driven through the text interface.

use thinkgo::gtp::GtpEngine;
use thinkgo::mcts::{SearchBudget, SearchConfig};

/// Run a session and split the output into responses.
fn session(engine: &mut GtpEngine, input: &str) -> Vec<String> {
    let mut out = Vec::new();
    engine.run_with(input.as_bytes(), &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    text.split("\n\n")
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

fn fast_engine() -> GtpEngine {
    GtpEngine::with_config(SearchConfig {
        budget: SearchBudget::Simulations(200),
        ..SearchConfig::default()
    })
}

#[test]
fn test_ids_and_errors() {
    let mut engine = GtpEngine::new();
    let responses = session(
        &mut engine,
        "1 protocol_version\n# comment\n\n2 frobnicate\nname\n3 boardsize 0\n",
    );
    assert_eq!(responses, vec!["=1 2", "?2 unknown command", "= thinkgo", "?3 unacceptable size"]);
}

#[test]
fn test_quit_stops_reading() {
    let mut engine = GtpEngine::new();
    let responses = session(&mut engine, "quit\nname\n");
    assert_eq!(responses, vec!["= "]);
}

#[test]
fn test_list_commands_are_known() {
    let mut engine = GtpEngine::new();
    let responses = session(&mut engine, "list_commands\n");
    let list = responses[0].strip_prefix("= ").unwrap();
    for command in list.lines() {
        let answer = session(&mut engine, &format!("known_command {command}\n"));
        assert_eq!(answer, vec!["= true"], "{command}");
    }
}

#[test]
fn test_play_rejects_illegal_moves() {
    let mut engine = GtpEngine::new();
    let responses = session(
        &mut engine,
        "play black E5\nplay white E5\nplay white Z1\nplay purple A1\nplay black\n",
    );
    assert_eq!(responses[0], "= ");
    assert!(responses[1].starts_with("? illegal move"), "{}", responses[1]);
    assert!(responses[2].starts_with("? invalid coordinate"), "{}", responses[2]);
    assert_eq!(responses[3], "? invalid color");
    assert_eq!(responses[4], "? missing arguments");
}

#[test]
fn test_game_on_small_board() {
    let mut engine = fast_engine();
    let responses = session(
        &mut engine,
        "boardsize 7\nkomi 0.5\nplay b D4\ngenmove w\ngenmove b\nshowboard\nfinal_score\n",
    );
    assert_eq!(responses.len(), 7);
    for vertex in &responses[3..5] {
        let vertex = vertex.strip_prefix("= ").unwrap();
        assert!(!vertex.is_empty() && vertex != "resign", "{vertex}");
    }
    // Three stones on the board unless someone passed.
    let showboard = &responses[5];
    assert!(showboard.contains('X') && showboard.contains("7"));
    let score = responses[6].strip_prefix("= ").unwrap();
    assert!(score.starts_with("B+") || score.starts_with("W+"), "{score}");
}

#[test]
fn test_clear_board_keeps_komi() {
    let mut engine = GtpEngine::new();
    let responses = session(&mut engine, "komi 3.5\nplay b A1\nclear_board\nfinal_score\n");
    assert_eq!(responses[3], "= W+3.5");
}
