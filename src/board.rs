//! Go board with incremental block and liberty tracking.
//!
//! The board is a 1D array with a border ring (see [`crate::constants::stride`]),
//! so every playable point has four addressable neighbours. Stones are grouped
//! into blocks kept in an arena indexed by point: a block lives in the slot of
//! the point where it was created, and that point stays one of its stones for
//! as long as the block exists, so it doubles as the block's anchor. A slot is
//! free exactly when its point is empty, which makes the arena its own free list.
//!
//! Moves are applied with [`Board::place_stone`], which assumes the caller has
//! already checked legality. [`Board::play_checked`] is the validating entry
//! point for input coming from outside the engine.

use std::fmt;

use arrayvec::ArrayVec;

use crate::constants::{
    MAX_SIZE, MIN_SIZE, NULL_MOVE, PASS_MOVE, RESIGN_MOVE, buffer_len, stride,
};
use crate::error::GoError;

/// A point on the board, represented as an index into the padded 1D array.
pub type Point = usize;

/// Stone color.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    Black,
    White,
}

impl Color {
    #[inline]
    pub fn opp(self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    /// Dense index for per-color tables.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Color::Black => 0,
            Color::White => 1,
        }
    }

    /// Parse a GTP color argument (`b`, `black`, `w`, `white`).
    pub fn parse(s: &str) -> Option<Color> {
        match s.to_ascii_lowercase().as_str() {
            "b" | "black" => Some(Color::Black),
            "w" | "white" => Some(Color::White),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Black => write!(f, "black"),
            Color::White => write!(f, "white"),
        }
    }
}

/// Content of one cell of the padded array.
///
/// The discriminants are the base-4 digits used by the pattern table.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Cell {
    White = 0,
    Black = 1,
    Empty = 2,
    Border = 3,
}

impl Cell {
    #[inline]
    pub fn color(self) -> Option<Color> {
        match self {
            Cell::Black => Some(Color::Black),
            Cell::White => Some(Color::White),
            _ => None,
        }
    }
}

impl From<Color> for Cell {
    #[inline]
    fn from(c: Color) -> Cell {
        match c {
            Color::Black => Cell::Black,
            Color::White => Cell::White,
        }
    }
}

/// Index of a block in the arena. Always equal to the block's anchor point.
type BlockId = usize;

#[derive(Clone, Debug)]
struct Block {
    anchor: Point,
    color: Color,
    stones: Vec<Point>,
    liberties: Vec<Point>,
}

impl Block {
    fn empty() -> Self {
        Block {
            anchor: PASS_MOVE,
            color: Color::Black,
            stones: Vec::new(),
            liberties: Vec::new(),
        }
    }

    fn init_single_stone(&mut self, p: Point, c: Color) {
        self.anchor = p;
        self.color = c;
        self.stones.clear();
        self.stones.push(p);
        self.liberties.clear();
    }

    /// Copy another block while keeping this slot's allocations.
    fn copy_from(&mut self, other: &Block) {
        self.anchor = other.anchor;
        self.color = other.color;
        self.stones.clone_from(&other.stones);
        self.liberties.clone_from(&other.liberties);
    }

    /// Remove a liberty by swapping the last one into its slot.
    fn exclude_liberty(&mut self, p: Point) {
        if let Some(i) = self.liberties.iter().rposition(|&l| l == p) {
            self.liberties.swap_remove(i);
        }
    }
}

/// Generation-stamped point set, cleared in O(1).
#[derive(Clone, Debug)]
struct PointMarker {
    current: u32,
    marks: Vec<u32>,
}

impl PointMarker {
    fn new(len: usize) -> Self {
        PointMarker {
            current: 1,
            marks: vec![0; len],
        }
    }

    fn clear(&mut self) {
        self.current = self.current.wrapping_add(1);
        if self.current == 0 {
            self.marks.fill(0);
            self.current = 1;
        }
    }

    fn include(&mut self, p: Point) {
        self.marks[p] = self.current;
    }

    /// Mark `p`, returning false if it was already marked.
    fn new_mark(&mut self, p: Point) -> bool {
        if self.marks[p] == self.current {
            return false;
        }
        self.marks[p] = self.current;
        true
    }
}

/// A Go position with incrementally maintained blocks.
#[derive(Clone, Debug)]
pub struct Board {
    size: usize,
    ns: usize,
    cells: Vec<Cell>,
    num_neighbors: [Vec<u8>; 2],
    num_empty: Vec<u8>,
    block_of: Vec<Option<BlockId>>,
    blocks: Vec<Block>,
    ko_point: Option<Point>,
    last_move: Point,
    second_last_move: Point,
    prisoners: [u32; 2],
    to_move: Color,
    komi: f32,
    captured: Vec<Point>,
    marker: PointMarker,
}

impl Board {
    /// Create an empty board. Panics on an unsupported size; use
    /// [`Board::try_new`] for sizes coming from user input.
    pub fn new(size: usize) -> Self {
        match Self::try_new(size) {
            Ok(board) => board,
            Err(e) => panic!("{e}"),
        }
    }

    pub fn try_new(size: usize) -> Result<Self, GoError> {
        if !(MIN_SIZE..=MAX_SIZE).contains(&size) {
            return Err(GoError::UnsupportedSize(size));
        }
        let len = buffer_len(size);
        let mut board = Board {
            size,
            ns: stride(size),
            cells: vec![Cell::Border; len],
            num_neighbors: [vec![0; len], vec![0; len]],
            num_empty: vec![0; len],
            block_of: vec![None; len],
            blocks: (0..len).map(|_| Block::empty()).collect(),
            ko_point: None,
            last_move: NULL_MOVE,
            second_last_move: NULL_MOVE,
            prisoners: [0; 2],
            to_move: Color::Black,
            komi: crate::constants::DEFAULT_KOMI,
            captured: Vec::new(),
            marker: PointMarker::new(len),
        };
        board.reset();
        Ok(board)
    }

    /// Clear to an empty board with Black to move. Komi is kept.
    pub fn reset(&mut self) {
        self.cells.fill(Cell::Border);
        self.num_neighbors[0].fill(0);
        self.num_neighbors[1].fill(0);
        self.num_empty.fill(0);
        self.block_of.fill(None);

        for p in self.points() {
            self.cells[p] = Cell::Empty;
        }
        for p in self.points() {
            let empty = self
                .neighbors(p)
                .iter()
                .filter(|&&n| self.cells[n] == Cell::Empty)
                .count();
            self.num_empty[p] = empty as u8;
        }

        self.ko_point = None;
        self.last_move = NULL_MOVE;
        self.second_last_move = NULL_MOVE;
        self.prisoners = [0; 2];
        self.to_move = Color::Black;
        self.captured.clear();
    }

    /// Deep-copy all mutable state from another board of the same size.
    ///
    /// Panics if the sizes differ. Block slots keep their allocations, so
    /// repeatedly re-initialising a scratch board does not allocate.
    pub fn initialize(&mut self, src: &Board) {
        assert_eq!(
            self.size, src.size,
            "cannot initialize a {}x{} board from a {}x{} board",
            self.size, self.size, src.size, src.size
        );

        self.cells.clone_from(&src.cells);
        self.num_neighbors[0].clone_from(&src.num_neighbors[0]);
        self.num_neighbors[1].clone_from(&src.num_neighbors[1]);
        self.num_empty.clone_from(&src.num_empty);
        self.block_of.clone_from(&src.block_of);
        for p in src.points() {
            if src.block_of[p] == Some(p) {
                self.blocks[p].copy_from(&src.blocks[p]);
            }
        }

        self.ko_point = src.ko_point;
        self.last_move = src.last_move;
        self.second_last_move = src.second_last_move;
        self.prisoners = src.prisoners;
        self.to_move = src.to_move;
        self.komi = src.komi;
        self.captured.clear();

        #[cfg(feature = "verify")]
        self.check_invariants();
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Row stride of the padded array.
    #[inline]
    pub fn ns(&self) -> usize {
        self.ns
    }

    #[inline]
    pub fn cell(&self, p: Point) -> Cell {
        self.cells[p]
    }

    #[inline]
    pub fn to_move(&self) -> Color {
        self.to_move
    }

    /// Set the side to move (board setup, GTP `play`/`genmove` with an explicit color).
    pub fn set_to_move(&mut self, c: Color) {
        self.to_move = c;
    }

    #[inline]
    pub fn last_move(&self) -> Point {
        self.last_move
    }

    #[inline]
    pub fn second_last_move(&self) -> Point {
        self.second_last_move
    }

    #[inline]
    pub fn ko_point(&self) -> Option<Point> {
        self.ko_point
    }

    /// Number of stones captured by `c`.
    #[inline]
    pub fn prisoners(&self, c: Color) -> u32 {
        self.prisoners[c.index()]
    }

    #[inline]
    pub fn komi(&self) -> f32 {
        self.komi
    }

    pub fn set_komi(&mut self, komi: f32) {
        self.komi = komi;
    }

    /// Points emptied by the most recent `place_stone`.
    #[inline]
    pub fn captured_stones(&self) -> &[Point] {
        &self.captured
    }

    /// True after two consecutive passes.
    pub fn is_game_over(&self) -> bool {
        self.last_move == PASS_MOVE && self.second_last_move == PASS_MOVE
    }

    /// True if `p` names a playable point (not pass, not a sentinel, not border).
    #[inline]
    pub fn is_on_board(&self, p: Point) -> bool {
        p < self.cells.len() && self.cells[p] != Cell::Border
    }

    /// All playable points, row by row from the top.
    pub fn points(&self) -> impl Iterator<Item = Point> + use<> {
        let (size, ns) = (self.size, self.ns);
        (0..size).flat_map(move |y| (0..size).map(move |x| (y + 1) * ns + x + 1))
    }

    /// Orthogonal neighbours: north, west, east, south.
    #[inline]
    pub fn neighbors(&self, p: Point) -> [Point; 4] {
        [p - self.ns, p - 1, p + 1, p + self.ns]
    }

    /// Diagonal neighbours: north-west, north-east, south-west, south-east.
    #[inline]
    pub fn diagonals(&self, p: Point) -> [Point; 4] {
        [p - self.ns - 1, p - self.ns + 1, p + self.ns - 1, p + self.ns + 1]
    }

    // =========================================================================
    // Coordinates
    // =========================================================================

    /// Point for column `x` and row `y`, both 0-based from the top-left.
    #[inline]
    pub fn point(&self, x: usize, y: usize) -> Point {
        debug_assert!(x < self.size && y < self.size);
        (y + 1) * self.ns + x + 1
    }

    /// Column and row (0-based from the top-left) of a playable point.
    #[inline]
    pub fn xy(&self, p: Point) -> (usize, usize) {
        (p % self.ns - 1, p / self.ns - 1)
    }

    /// Human notation: column letter (A, B, C, ... with no letter skipped)
    /// followed by the row counted from the bottom.
    pub fn point_notation(&self, p: Point) -> String {
        match p {
            PASS_MOVE => "pass".into(),
            RESIGN_MOVE => "resign".into(),
            NULL_MOVE => "null".into(),
            _ => {
                let (x, y) = self.xy(p);
                format!("{}{}", (b'A' + x as u8) as char, self.size - y)
            }
        }
    }

    /// Parse human notation such as `D4` or `pass`.
    pub fn parse_point(&self, s: &str) -> Result<Point, GoError> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("pass") {
            return Ok(PASS_MOVE);
        }
        let invalid = || GoError::InvalidCoordinate(s.to_string());

        let mut chars = s.chars();
        let col = chars.next().ok_or_else(invalid)?.to_ascii_uppercase();
        if !col.is_ascii_uppercase() {
            return Err(invalid());
        }
        let x = (col as u8 - b'A') as usize;
        let row: usize = chars.as_str().parse().map_err(|_| invalid())?;
        if x >= self.size || row == 0 || row > self.size {
            return Err(invalid());
        }
        Ok(self.point(x, self.size - row))
    }

    /// Parse an SGF point (`ah` = column a, row h from the top). The empty
    /// string and `tt` on boards up to 19x19 are SGF passes.
    pub fn parse_sgf_point(&self, s: &str) -> Result<Point, GoError> {
        if s.is_empty() || (s == "tt" && self.size <= 19) {
            return Ok(PASS_MOVE);
        }
        let b = s.as_bytes();
        if b.len() != 2 || !b[0].is_ascii_lowercase() || !b[1].is_ascii_lowercase() {
            return Err(GoError::InvalidCoordinate(s.to_string()));
        }
        let (x, y) = ((b[0] - b'a') as usize, (b[1] - b'a') as usize);
        if x >= self.size || y >= self.size {
            return Err(GoError::InvalidCoordinate(s.to_string()));
        }
        Ok(self.point(x, y))
    }

    // =========================================================================
    // Legality
    // =========================================================================

    /// Pass is always legal; occupied points, suicide, and retaking the ko
    /// point on the very next ply are not.
    pub fn is_legal(&self, p: Point, c: Color) -> bool {
        if p == PASS_MOVE {
            return true;
        }
        if p >= self.cells.len() || self.cells[p] != Cell::Empty {
            return false;
        }
        if self.is_suicide(p, c) {
            return false;
        }
        !(self.ko_point == Some(p) && c == self.to_move)
    }

    /// True if playing `p` leaves the new block without liberties and captures nothing.
    pub fn is_suicide(&self, p: Point, c: Color) -> bool {
        if self.num_empty[p] != 0 {
            return false;
        }
        let opp = c.opp();
        for n in self.neighbors(p) {
            match self.block_of[n] {
                Some(b) if self.blocks[b].color == c && self.blocks[b].liberties.len() > 1 => {
                    return false;
                }
                Some(b) if self.blocks[b].color == opp && self.blocks[b].liberties.len() == 1 => {
                    return false;
                }
                _ => {}
            }
        }
        true
    }

    /// Validate and play a move for the side to move.
    ///
    /// Returns the captured points on success.
    pub fn play_checked(&mut self, p: Point) -> Result<&[Point], GoError> {
        if p != PASS_MOVE {
            if !self.is_on_board(p) {
                return Err(GoError::OffBoard(p));
            }
            let c = self.to_move;
            if self.cells[p] != Cell::Empty {
                return Err(GoError::Occupied(self.point_notation(p)));
            }
            if self.is_suicide(p, c) {
                return Err(GoError::Suicide(self.point_notation(p)));
            }
            if self.ko_point == Some(p) {
                return Err(GoError::Ko(self.point_notation(p)));
            }
        }
        Ok(self.place_stone(p))
    }

    // =========================================================================
    // Move execution
    // =========================================================================

    /// Play a move (or pass) for the side to move.
    ///
    /// Legality is the caller's responsibility. Returns the captured points,
    /// valid until the next call.
    pub fn place_stone(&mut self, mv: Point) -> &[Point] {
        self.captured.clear();
        self.ko_point = None;
        let color = self.to_move;
        let opp = color.opp();

        if mv != PASS_MOVE {
            debug_assert!(
                self.cells[mv] == Cell::Empty,
                "placing on non-empty point {}",
                self.point_notation(mv)
            );
            self.add_stone(mv, color);

            let mut own = ArrayVec::<BlockId, 4>::new();
            if self.num_neighbors[color.index()][mv] > 0 || self.num_neighbors[opp.index()][mv] > 0
            {
                self.remove_liberties_and_kill(mv, opp, &mut own);
            }
            self.update_blocks_after_add_stone(mv, color, &own);

            if self.ko_point.is_some() {
                let b = &self.blocks[self.block_id(mv)];
                if b.stones.len() > 1 || b.liberties.len() > 1 {
                    self.ko_point = None;
                }
            }
            debug_assert!(
                !self.blocks[self.block_id(mv)].liberties.is_empty(),
                "suicide at {}",
                self.point_notation(mv)
            );
        }

        self.second_last_move = self.last_move;
        self.last_move = mv;
        self.to_move = opp;

        #[cfg(feature = "verify")]
        self.check_invariants();

        &self.captured
    }

    /// Place a setup stone (handicap, fixture position) without disturbing
    /// the side to move or the last-move history.
    pub fn place_non_played_stone(&mut self, p: Point, c: Color) {
        let last_move = self.last_move;
        let second_last_move = self.second_last_move;
        let to_move = self.to_move;

        self.to_move = c;
        self.place_stone(p);

        self.to_move = to_move;
        self.last_move = last_move;
        self.second_last_move = second_last_move;
    }

    fn add_stone(&mut self, p: Point, c: Color) {
        self.cells[p] = c.into();
        for n in self.neighbors(p) {
            if self.cells[n] != Cell::Border {
                self.num_empty[n] -= 1;
                self.num_neighbors[c.index()][n] += 1;
            }
        }
    }

    /// Remove `p` from the liberties of adjacent blocks and kill opponent
    /// blocks left without liberties. Collects adjacent blocks of our color.
    fn remove_liberties_and_kill(&mut self, p: Point, opp: Color, own: &mut ArrayVec<BlockId, 4>) {
        let mut seen = ArrayVec::<BlockId, 4>::new();
        for n in self.neighbors(p) {
            let Some(b) = self.block_of[n] else { continue };
            if seen.contains(&b) {
                continue;
            }
            seen.push(b);
            self.blocks[b].exclude_liberty(p);
            if self.blocks[b].color == opp {
                if self.blocks[b].liberties.is_empty() {
                    self.kill_block(b);
                }
            } else {
                own.push(b);
            }
        }
    }

    fn kill_block(&mut self, b: BlockId) {
        let color = self.blocks[b].color;
        let opp = color.opp();
        let stones = std::mem::take(&mut self.blocks[b].stones);

        for &p in &stones {
            self.add_lib_to_adj_blocks(p, opp);
            self.cells[p] = Cell::Empty;
            for n in self.neighbors(p) {
                if self.cells[n] != Cell::Border {
                    self.num_empty[n] += 1;
                    self.num_neighbors[color.index()][n] -= 1;
                }
            }
            self.captured.push(p);
            self.block_of[p] = None;
        }

        self.prisoners[opp.index()] += stones.len() as u32;
        if stones.len() == 1 {
            self.ko_point = Some(stones[0]);
        }
        self.blocks[b].stones = stones;
        self.blocks[b].stones.clear();
        self.blocks[b].liberties.clear();
    }

    /// A freed point becomes a liberty of every adjacent block of color `c`.
    fn add_lib_to_adj_blocks(&mut self, p: Point, c: Color) {
        if self.num_neighbors[c.index()][p] == 0 {
            return;
        }
        let mut seen = ArrayVec::<BlockId, 4>::new();
        for n in self.neighbors(p) {
            if self.cells[n] != Cell::from(c) {
                continue;
            }
            if let Some(b) = self.block_of[n] {
                if !seen.contains(&b) {
                    seen.push(b);
                    self.blocks[b].liberties.push(p);
                }
            }
        }
    }

    fn update_blocks_after_add_stone(&mut self, p: Point, c: Color, own: &[BlockId]) {
        match own.len() {
            0 => self.create_single_stone_block(p, c),
            1 => self.add_stone_to_block(p, own[0]),
            _ => self.merge_blocks(p, own),
        }
    }

    fn create_single_stone_block(&mut self, p: Point, c: Color) {
        debug_assert_eq!(self.num_neighbors[c.index()][p], 0);
        let neighbors = self.neighbors(p);
        let block = &mut self.blocks[p];
        block.init_single_stone(p, c);
        for n in neighbors {
            if self.cells[n] == Cell::Empty {
                block.liberties.push(n);
            }
        }
        self.block_of[p] = Some(p);
    }

    fn add_stone_to_block(&mut self, p: Point, b: BlockId) {
        debug_assert_eq!(Some(self.blocks[b].color), self.cells[p].color());
        self.blocks[b].stones.push(p);
        for n in self.neighbors(p) {
            if self.cells[n] == Cell::Empty && !self.is_adjacent_to(n, b) {
                self.blocks[b].liberties.push(n);
            }
        }
        self.block_of[p] = Some(b);
    }

    /// Merge every block in `adj` into the one with most stones.
    fn merge_blocks(&mut self, p: Point, adj: &[BlockId]) {
        let largest = adj
            .iter()
            .copied()
            .max_by_key(|&b| self.blocks[b].stones.len())
            .unwrap_or(adj[0]);

        self.blocks[largest].stones.push(p);
        self.marker.clear();
        for &l in &self.blocks[largest].liberties {
            self.marker.include(l);
        }

        for &b in adj {
            if b == largest {
                continue;
            }
            let stones = std::mem::take(&mut self.blocks[b].stones);
            let liberties = std::mem::take(&mut self.blocks[b].liberties);
            for &s in &stones {
                self.block_of[s] = Some(largest);
            }
            self.blocks[largest].stones.extend_from_slice(&stones);
            for &l in &liberties {
                if self.marker.new_mark(l) {
                    self.blocks[largest].liberties.push(l);
                }
            }
            // Hand the emptied buffers back to the dead slot for reuse.
            self.blocks[b].stones = stones;
            self.blocks[b].stones.clear();
            self.blocks[b].liberties = liberties;
            self.blocks[b].liberties.clear();
        }

        self.block_of[p] = Some(largest);
        for n in self.neighbors(p) {
            if self.cells[n] == Cell::Empty && self.marker.new_mark(n) {
                self.blocks[largest].liberties.push(n);
            }
        }
    }

    fn is_adjacent_to(&self, p: Point, b: BlockId) -> bool {
        self.neighbors(p).iter().any(|&n| self.block_of[n] == Some(b))
    }

    // =========================================================================
    // Block queries
    // =========================================================================

    /// Arena slot of the block at an occupied point.
    #[inline]
    fn block_id(&self, p: Point) -> BlockId {
        match self.block_of[p] {
            Some(b) => b,
            None => panic!("no block at {}", self.point_notation(p)),
        }
    }

    /// Anchor of the block containing `p`. `p` must be occupied.
    #[inline]
    pub fn anchor(&self, p: Point) -> Point {
        self.blocks[self.block_id(p)].anchor
    }

    /// Stones of the block containing `p`. `p` must be occupied.
    #[inline]
    pub fn stones(&self, p: Point) -> &[Point] {
        &self.blocks[self.block_id(p)].stones
    }

    /// Liberties of the block containing `p`. `p` must be occupied.
    #[inline]
    pub fn liberties(&self, p: Point) -> &[Point] {
        &self.blocks[self.block_id(p)].liberties
    }

    #[inline]
    pub fn num_liberties(&self, p: Point) -> usize {
        self.liberties(p).len()
    }

    /// True if the block at occupied point `p` has at most one liberty.
    #[inline]
    pub fn in_atari(&self, p: Point) -> bool {
        self.num_liberties(p) <= 1
    }

    /// Like [`Board::in_atari`] but false for empty points.
    #[inline]
    pub fn occupied_in_atari(&self, p: Point) -> bool {
        match self.block_of.get(p).copied().flatten() {
            Some(b) => self.blocks[b].liberties.len() <= 1,
            None => false,
        }
    }

    /// The single liberty of a block in atari.
    #[inline]
    pub fn the_liberty(&self, p: Point) -> Point {
        debug_assert!(self.in_atari(p));
        self.liberties(p)[0]
    }

    #[inline]
    pub fn num_neighbors(&self, p: Point, c: Color) -> usize {
        self.num_neighbors[c.index()][p] as usize
    }

    #[inline]
    pub fn num_neighbors_empty(&self, p: Point) -> usize {
        self.num_empty[p] as usize
    }

    pub fn num_diagonals(&self, p: Point, c: Color) -> usize {
        let cell = Cell::from(c);
        self.diagonals(p)
            .iter()
            .filter(|&&d| self.cells[d] == cell)
            .count()
    }

    /// Anchors of distinct blocks of color `c` adjacent to `p` having at most
    /// `max_libs` liberties.
    pub fn neighbor_blocks(&self, p: Point, c: Color, max_libs: usize) -> ArrayVec<Point, 4> {
        let mut anchors = ArrayVec::new();
        if self.num_neighbors[c.index()][p] == 0 {
            return anchors;
        }
        for n in self.neighbors(p) {
            let Some(b) = self.block_of[n] else { continue };
            let block = &self.blocks[b];
            if block.color == c && block.liberties.len() <= max_libs && !anchors.contains(&block.anchor)
            {
                anchors.push(block.anchor);
            }
        }
        anchors
    }

    /// Anchors of opponent blocks adjacent to the block at `p` having at most
    /// `max_libs` liberties.
    pub fn adjacent_blocks(&self, p: Point, max_libs: usize) -> Vec<Point> {
        let b = self.block_id(p);
        let opp = self.blocks[b].color.opp();
        let mut anchors = Vec::new();
        for &stone in &self.blocks[b].stones {
            for anchor in self.neighbor_blocks(stone, opp, max_libs) {
                if !anchors.contains(&anchor) {
                    anchors.push(anchor);
                }
            }
        }
        anchors
    }

    /// True if empty point `p` is a liberty of the block anchored at `anchor`.
    pub fn is_liberty_of_block(&self, p: Point, anchor: Point) -> bool {
        debug_assert_eq!(self.cells[p], Cell::Empty);
        let b = self.block_id(anchor);
        if self.num_neighbors[self.blocks[b].color.index()][p] == 0 {
            return false;
        }
        self.is_adjacent_to(p, b)
    }

    /// True if playing `p` leaves the mover's block with exactly one liberty,
    /// counting liberties gained by simultaneous captures.
    pub fn self_atari(&self, p: Point, c: Color) -> bool {
        debug_assert_eq!(self.cells[p], Cell::Empty);
        if self.num_empty[p] >= 2 {
            return false;
        }

        let opp = c.opp();
        let mut lib: Option<Point> = None;
        let mut has_own_target = false;
        let mut has_capture = false;

        for target in self.neighbors(p) {
            match self.cells[target] {
                Cell::Empty => {
                    if lib.is_some_and(|l| l != target) {
                        return false;
                    }
                    lib = Some(target);
                }
                cell if cell == Cell::from(c) => {
                    let liberties = self.liberties(target);
                    if liberties.len() > 2 {
                        return false;
                    }
                    for &l in liberties.iter().filter(|&&l| l != p) {
                        if lib.is_some_and(|x| x != l) {
                            return false;
                        }
                        lib = Some(l);
                    }
                    has_own_target = true;
                }
                cell if cell == Cell::from(opp) => {
                    if self.in_atari(target) {
                        if lib.is_some_and(|l| l != target) {
                            return false;
                        }
                        if lib.is_none() {
                            has_capture = true;
                        }
                        lib = Some(target);
                    }
                }
                _ => {}
            }
        }

        let Some(lib) = lib else {
            // Suicide, not self-atari.
            return false;
        };
        if !has_own_target && has_capture {
            // Ko-type capture.
            return false;
        }
        if has_own_target && has_capture {
            // Capturing frees more than one liberty if another captured stone
            // touches one of the blocks we join.
            let anchors = self.neighbor_blocks(p, c, 1);
            let gains = self
                .stones(lib)
                .iter()
                .any(|&s| s != lib && self.is_neighbor_of_some(s, &anchors));
            if gains {
                return false;
            }
        }
        true
    }

    fn is_neighbor_of_some(&self, p: Point, anchors: &[Point]) -> bool {
        self.neighbors(p).iter().any(|&n| match self.block_of[n] {
            Some(b) => anchors.contains(&self.blocks[b].anchor),
            None => false,
        })
    }

    /// For a block with exactly two liberties, returns the anchor of another
    /// block of the same color adjacent to both liberties, if any.
    pub fn is_simple_chain(&self, p: Point) -> Option<Point> {
        let b = self.block_id(p);
        let block = &self.blocks[b];
        if block.liberties.len() != 2 {
            return None;
        }
        let anchors1 = self.neighbor_blocks(block.liberties[0], block.color, usize::MAX);
        let anchors2 = self.neighbor_blocks(block.liberties[1], block.color, usize::MAX);
        anchors1
            .iter()
            .copied()
            .find(|&a| a != block.anchor && anchors2.contains(&a))
    }

    /// True if `p` is a single-point eye of color `c`: surrounded by one
    /// block, or by two blocks that also share a second such eye.
    pub fn is_simple_eye(&self, p: Point, c: Color) -> bool {
        if self.cells[p] != Cell::Empty {
            return false;
        }
        if self.num_empty[p] > 0 || self.num_neighbors[c.opp().index()][p] > 0 {
            return false;
        }

        let mut anchors = ArrayVec::<Point, 2>::new();
        for n in self.neighbors(p) {
            if self.cells[n] == Cell::Border {
                continue;
            }
            let anchor = self.anchor(n);
            if !anchors.contains(&anchor) {
                if anchors.is_full() {
                    return false;
                }
                anchors.push(anchor);
            }
        }
        if anchors.len() == 1 {
            return true;
        }

        let cell = Cell::from(c);
        'libs: for &lib in self.liberties(anchors[0]) {
            if lib == p {
                continue;
            }
            let mut found = ArrayVec::<Point, 2>::new();
            for n in self.neighbors(lib) {
                match self.cells[n] {
                    Cell::Border => continue,
                    x if x != cell => continue 'libs,
                    _ => {}
                }
                let anchor = self.anchor(n);
                if !anchors.contains(&anchor) {
                    continue 'libs;
                }
                if !found.contains(&anchor) {
                    found.push(anchor);
                }
            }
            if found.len() == 2 {
                return true;
            }
        }
        false
    }

    /// True if playing on `liberty` gives the block at `anchor` at least two
    /// new liberties. Captures are not considered.
    pub fn gains_liberties(&self, anchor: Point, liberty: Point) -> bool {
        debug_assert_eq!(self.cells[liberty], Cell::Empty);
        let color = self.cells[anchor];
        let mut found = ArrayVec::<Point, 2>::new();
        let count = |p: Point, found: &mut ArrayVec<Point, 2>| {
            if !self.is_liberty_of_block(p, anchor) && !found.contains(&p) {
                found.push(p);
            }
            found.is_full()
        };

        for n in self.neighbors(liberty) {
            let cell = self.cells[n];
            if cell == Cell::Empty {
                if count(n, &mut found) {
                    return true;
                }
            } else if cell == color && self.anchor(n) != self.anchor(anchor) {
                for &other in self.liberties(n) {
                    if other != liberty && count(other, &mut found) {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// True if empty point `p` has only stones of one color around it and no
    /// adjacent block is in atari. Filling such a point is never useful in a
    /// random playout.
    pub fn is_completely_surrounded(&self, p: Point) -> bool {
        debug_assert_eq!(self.cells[p], Cell::Empty);
        if self.num_empty[p] != 0 {
            return false;
        }
        if self.num_neighbors[0][p] != 0 && self.num_neighbors[1][p] != 0 {
            return false;
        }
        !self.neighbors(p).iter().any(|&n| match self.block_of[n] {
            Some(b) => self.blocks[b].liberties.len() == 1,
            None => false,
        })
    }

    /// If `p` is a self-atari for the side to move that joins an existing
    /// block, returns the block's other liberty when playing there is legal
    /// and not itself a self-atari.
    pub fn do_self_atari_correction(&self, p: Point) -> Option<Point> {
        let c = self.to_move;
        if p == PASS_MOVE || self.num_empty[p] >= 2 || self.num_neighbors[c.index()][p] == 0 {
            return None;
        }
        if !self.self_atari(p, c) {
            return None;
        }

        let own = Cell::from(c);
        let replacement = self.neighbors(p).iter().find_map(|&n| match self.cells[n] {
            Cell::Empty => Some(n),
            x if x == own => self.liberties(n).iter().copied().find(|&l| l != p),
            _ => None,
        })?;

        if self.is_legal(replacement, c) && !self.self_atari(replacement, c) {
            Some(replacement)
        } else {
            None
        }
    }

    // =========================================================================
    // Scoring
    // =========================================================================

    /// Area score of a settled position, Black positive.
    ///
    /// Every stone counts for its color; an empty point counts for a color if
    /// it touches only that color's stones. Everything else is neutral.
    pub fn score_simple_end_position(&self, komi: f32) -> f32 {
        let mut score = -komi;
        for p in self.points() {
            match self.owner(p) {
                Some(Color::Black) => score += 1.0,
                Some(Color::White) => score -= 1.0,
                None => {}
            }
        }
        score
    }

    /// Same as [`Board::score_simple_end_position`] and records the owner of
    /// every point, indexed by point.
    pub fn score_simple_end_position_with(&self, komi: f32, owners: &mut Vec<Option<Color>>) -> f32 {
        owners.clear();
        owners.resize(self.cells.len(), None);
        for p in self.points() {
            owners[p] = self.owner(p);
        }
        self.score_simple_end_position(komi)
    }

    fn owner(&self, p: Point) -> Option<Color> {
        match self.cells[p] {
            Cell::Empty => {
                let black = self.num_neighbors[Color::Black.index()][p] > 0;
                let white = self.num_neighbors[Color::White.index()][p] > 0;
                match (black, white) {
                    (true, false) => Some(Color::Black),
                    (false, true) => Some(Color::White),
                    _ => None,
                }
            }
            cell => cell.color(),
        }
    }

    // =========================================================================
    // Consistency check
    // =========================================================================

    /// Verify every incremental structure against a from-scratch recomputation.
    ///
    /// Panics on the first inconsistency. Runs after every mutation when the
    /// `verify` feature is enabled; tests call it directly.
    pub fn check_invariants(&self) {
        for p in self.points() {
            assert_ne!(self.cells[p], Cell::Border, "playable point marked border");

            let mut empty = 0;
            let mut counts = [0u8; 2];
            for n in self.neighbors(p) {
                match self.cells[n] {
                    Cell::Empty => empty += 1,
                    Cell::Black => counts[0] += 1,
                    Cell::White => counts[1] += 1,
                    Cell::Border => {}
                }
            }
            let name = self.point_notation(p);
            assert_eq!(self.num_empty[p], empty, "empty neighbour count at {name}");
            assert_eq!(self.num_neighbors[0][p], counts[0], "black neighbour count at {name}");
            assert_eq!(self.num_neighbors[1][p], counts[1], "white neighbour count at {name}");

            let Some(color) = self.cells[p].color() else {
                assert!(self.block_of[p].is_none(), "empty point {name} has a block");
                continue;
            };
            let b = self.block_of[p].unwrap_or_else(|| panic!("stone at {name} has no block"));
            let block = &self.blocks[b];
            assert_eq!(block.anchor, b, "block slot and anchor differ at {name}");
            assert_eq!(block.color, color, "block color differs at {name}");
            assert!(block.stones.contains(&p), "block misses stone {name}");
            assert!(!block.liberties.is_empty(), "block at {name} has no liberties");

            if block.anchor != p {
                continue;
            }
            let mut expected = Vec::new();
            for &s in &block.stones {
                assert_eq!(self.block_of[s], Some(b), "stone of block at {name} points elsewhere");
                for n in self.neighbors(s) {
                    match self.cells[n] {
                        Cell::Empty => expected.push(n),
                        x if x == self.cells[p] => {
                            assert_eq!(self.block_of[n], Some(b), "unmerged neighbour of {name}");
                        }
                        _ => {}
                    }
                }
            }
            expected.sort_unstable();
            expected.dedup();
            let mut actual = block.liberties.clone();
            actual.sort_unstable();
            let before = actual.len();
            actual.dedup();
            assert_eq!(before, actual.len(), "duplicate liberty in block at {name}");
            assert_eq!(actual, expected, "liberties of block at {name}");
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "   ")?;
        for x in 0..self.size {
            write!(f, "{} ", (b'A' + x as u8) as char)?;
        }
        writeln!(f)?;
        for y in 0..self.size {
            write!(f, "{:>2} ", self.size - y)?;
            for x in 0..self.size {
                let ch = match self.cells[self.point(x, y)] {
                    Cell::Black => 'X',
                    Cell::White => 'O',
                    _ => '.',
                };
                write!(f, "{ch} ")?;
            }
            writeln!(f, "{}", self.size - y)?;
        }
        Ok(())
    }
}
