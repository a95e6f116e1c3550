//! 3x3 shape patterns around an empty point.
//!
//! A point's surroundings are encoded as a base-4 number over its eight
//! neighbours (see [`neighborhood_code`]), using the cell values of
//! [`Cell`] as digits. The pattern table is a 65536-bit set built once from
//! a short list of hand-written shapes, expanded over rotations, reflections,
//! colour swaps and wildcards.
//!
//! Matching is colour-agnostic: a shape and its colour-swapped twin are both
//! in the table, so it does not matter whose turn it is.

use std::sync::OnceLock;

use crate::board::{Board, Cell, Color, Point};

/// Shapes as 3x3 grids, read row by row from the top-left, centre empty.
///
/// - `X`, `O`: stones of either colour (the opposite colour of each other)
/// - `.`: empty
/// - `x`: not `X` (`O`, `.` or `#`)
/// - `o`: not `O` (`X`, `.` or `#`)
/// - `?`: anything
/// - `#`: off the board
const PAT3_SRC: &[&str] = &[
    // hane: enclosing hane
    "XOX...???",
    // hane: non-cutting hane
    "XO....?.?",
    // hane: magari
    "XO?X..x.?",
    // katatsuke or diagonal attachment
    ".O.X.....",
    // cut1: unprotected cut
    "XO?O.o?o?",
    // cut1: peeped cut
    "XO?O.X???",
    // cut2
    "?X?O.Oooo",
    // cut keima
    "OX?o.O???",
    // side: chase
    "X.?O.?##?",
    // side: block side cut
    "OX?X.O###",
    // side: block side connection
    "?X?x.O###",
    // side: sagari
    "?XOx.x###",
    // side: cut
    "?OXX.O###",
];

/// Number of distinct neighbourhood codes.
const NUM_CODES: usize = 1 << 16;

/// Bitset over all neighbourhood codes.
static PAT3SET: OnceLock<Vec<u64>> = OnceLock::new();

/// True if the neighbourhood of empty point `p` matches any shape.
#[inline]
pub fn match_any(board: &Board, p: Point) -> bool {
    // Every shape has a stone orthogonally adjacent to the centre.
    if board.num_neighbors(p, Color::Black) == 0 && board.num_neighbors(p, Color::White) == 0 {
        return false;
    }
    let set = PAT3SET.get_or_init(make_pat3set);
    let code = neighborhood_code(board, p) as usize;
    set[code >> 6] & (1 << (code & 63)) != 0
}

/// Build the table eagerly, e.g. before timing a search.
pub fn init_patterns() {
    PAT3SET.get_or_init(make_pat3set);
}

/// Base-4 code of the eight neighbours of `p` in the order NW, N, NE, W, E,
/// SW, S, SE, least significant digit first.
pub fn neighborhood_code(board: &Board, p: Point) -> u16 {
    let ns = board.ns();
    let around = [
        p - ns - 1,
        p - ns,
        p - ns + 1,
        p - 1,
        p + 1,
        p + ns - 1,
        p + ns,
        p + ns + 1,
    ];
    around
        .iter()
        .rev()
        .fold(0u16, |code, &q| (code << 2) | board.cell(q) as u16)
}

fn make_pat3set() -> Vec<u64> {
    let mut set = vec![0u64; NUM_CODES / 64];
    for src in PAT3_SRC {
        let mut grid: [u8; 9] = [0; 9];
        grid.copy_from_slice(src.as_bytes());
        pat_enumerate(grid, &mut set);
    }
    set
}

/// All eight symmetries, each with and without colour swap.
fn pat_enumerate(mut grid: [u8; 9], set: &mut [u64]) {
    for _ in 0..2 {
        let mut g = grid;
        for _ in 0..2 {
            let mut h = g;
            for _ in 0..2 {
                pat_wildexp(&h, 0, set);
                pat_wildexp(&swapcolor(h), 0, set);
                horizflip(&mut h);
            }
            vertflip(&mut g);
        }
        rot90(&mut grid);
    }
}

fn pat_wildexp(grid: &[u8; 9], i: usize, set: &mut [u64]) {
    if i == 9 {
        let code = compute_code(grid) as usize;
        set[code >> 6] |= 1 << (code & 63);
        return;
    }
    let choices: &[u8] = match grid[i] {
        b'?' => b"XO.#",
        b'x' => b"O.#",
        b'o' => b"X.#",
        _ => return pat_wildexp(grid, i + 1, set),
    };
    for &c in choices {
        let mut expanded = *grid;
        expanded[i] = c;
        pat_wildexp(&expanded, i + 1, set);
    }
}

/// Neighbourhood code of a fully expanded grid, matching [`neighborhood_code`].
fn compute_code(grid: &[u8; 9]) -> u16 {
    const ORDER: [usize; 8] = [0, 1, 2, 3, 5, 6, 7, 8];
    ORDER
        .iter()
        .rev()
        .fold(0u16, |code, &i| (code << 2) | cell_of(grid[i]) as u16)
}

fn cell_of(c: u8) -> Cell {
    match c {
        b'O' => Cell::White,
        b'X' => Cell::Black,
        b'.' => Cell::Empty,
        _ => Cell::Border,
    }
}

fn swapcolor(mut grid: [u8; 9]) -> [u8; 9] {
    for c in grid.iter_mut() {
        *c = match *c {
            b'X' => b'O',
            b'O' => b'X',
            b'x' => b'o',
            b'o' => b'x',
            other => other,
        };
    }
    grid
}

fn horizflip(grid: &mut [u8; 9]) {
    grid.swap(0, 6);
    grid.swap(1, 7);
    grid.swap(2, 8);
}

fn vertflip(grid: &mut [u8; 9]) {
    grid.swap(0, 2);
    grid.swap(3, 5);
    grid.swap(6, 8);
}

fn rot90(grid: &mut [u8; 9]) {
    let t = grid[0];
    grid[0] = grid[2];
    grid[2] = grid[8];
    grid[8] = grid[6];
    grid[6] = t;

    let t = grid[1];
    grid[1] = grid[5];
    grid[5] = grid[7];
    grid[7] = grid[3];
    grid[3] = t;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(board: &mut Board, black: &[&str], white: &[&str]) {
        for s in black {
            let p = board.parse_point(s).unwrap();
            board.place_non_played_stone(p, Color::Black);
        }
        for s in white {
            let p = board.parse_point(s).unwrap();
            board.place_non_played_stone(p, Color::White);
        }
    }

    #[test]
    fn test_make_pat3set() {
        let set = make_pat3set();
        let count: u32 = set.iter().map(|w| w.count_ones()).sum();
        assert!(count > 1000, "expected many codes, got {count}");
        let empty = compute_code(b".........") as usize;
        assert_eq!(set[empty >> 6] & (1 << (empty & 63)), 0);
    }

    #[test]
    fn test_code_agrees_with_board() {
        let mut board = Board::new(9);
        setup(&mut board, &["C5", "E6"], &["D6"]);
        let d5 = board.parse_point("D5").unwrap();
        let code = neighborhood_code(&board, d5);
        // NW=C6 ., N=D6 O, NE=E6 X, W=C5 X, E=E5 ., SW=C4 ., S=D4 ., SE=E4 .
        assert_eq!(code, compute_code(b".OXX....."));
    }

    #[test]
    fn test_cut_shape_matches() {
        let mut board = Board::new(9);
        setup(&mut board, &["C5", "E5"], &["D6"]);
        let d5 = board.parse_point("D5").unwrap();
        assert!(match_any(&board, d5));
    }

    #[test]
    fn test_isolated_point_does_not_match() {
        let mut board = Board::new(9);
        setup(&mut board, &["C3"], &[]);
        let g7 = board.parse_point("G7").unwrap();
        assert!(!match_any(&board, g7));
    }

    #[test]
    fn test_colour_swap_matches() {
        let mut board = Board::new(9);
        setup(&mut board, &["D6"], &["C5", "E5"]);
        let d5 = board.parse_point("D5").unwrap();
        assert!(match_any(&board, d5));
    }
}
