//! Shared helpers for setting up test positions.

#![allow(dead_code)]

use thinkgo::board::{Board, Color, Point};

/// Properties of an SGF fragment in order of appearance, e.g.
/// `AB[ef][fe]AW[ff]PL[W];W[cc]`. Comments and escapes are not supported.
fn sgf_properties(sgf: &str) -> Vec<(String, Vec<String>)> {
    let mut props: Vec<(String, Vec<String>)> = Vec::new();
    let mut ident = String::new();
    let mut chars = sgf.chars();
    while let Some(c) = chars.next() {
        match c {
            'A'..='Z' => ident.push(c),
            '[' => {
                let value: String = chars.by_ref().take_while(|&c| c != ']').collect();
                if ident.is_empty() {
                    let (_, values) = props.last_mut().expect("value without property");
                    values.push(value);
                } else {
                    props.push((std::mem::take(&mut ident), vec![value]));
                }
            }
            _ => ident.clear(),
        }
    }
    props
}

/// Build a board from an SGF fragment: `SZ` and `KM` set up the board,
/// `AB`/`AW` place setup stones, `PL` sets the side to move and `B`/`W`
/// play moves. Board size defaults to 9.
pub fn board_from_sgf(sgf: &str) -> Board {
    let props = sgf_properties(sgf);
    let size = props
        .iter()
        .find(|(k, _)| k == "SZ")
        .map_or(9, |(_, v)| v[0].parse().expect("bad SZ"));
    let mut board = Board::new(size);

    for (key, values) in &props {
        match key.as_str() {
            "KM" => board.set_komi(values[0].parse().expect("bad KM")),
            "AB" | "AW" => {
                let color = if key == "AB" { Color::Black } else { Color::White };
                for v in values {
                    let p = board.parse_sgf_point(v).expect("bad setup point");
                    board.place_non_played_stone(p, color);
                }
            }
            "PL" => board.set_to_move(color_of(&values[0])),
            "B" | "W" => {
                board.set_to_move(color_of(key));
                let p = board.parse_sgf_point(&values[0]).expect("bad move");
                board.play_checked(p).expect("illegal move in fixture");
            }
            _ => {}
        }
    }
    board
}

fn color_of(s: &str) -> Color {
    Color::parse(s).expect("bad color")
}

/// Place setup stones given in human notation.
pub fn setup(board: &mut Board, black: &[&str], white: &[&str]) {
    for s in black {
        let p = pt(board, s);
        board.place_non_played_stone(p, Color::Black);
    }
    for s in white {
        let p = pt(board, s);
        board.place_non_played_stone(p, Color::White);
    }
}

/// Point for human notation such as `D4`.
pub fn pt(board: &Board, s: &str) -> Point {
    board
        .parse_point(s)
        .unwrap_or_else(|e| panic!("bad point {s}: {e}"))
}

/// Play a sequence of moves for alternating colors.
pub fn play_all(board: &mut Board, moves: &[&str]) {
    for s in moves {
        let p = pt(board, s);
        board
            .play_checked(p)
            .unwrap_or_else(|e| panic!("cannot play {s}: {e}"));
    }
}
