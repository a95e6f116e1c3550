//! Game records and the self-play loop.
//!
//! A [`GameRecord`] is everything needed to rebuild a position exactly: board
//! size, komi, handicap, and the moves played since the handicap stones went
//! down. It persists as plain `Key=Value` lines:
//!
//! ```text
//! Handicap=0
//! Komi=7.5
//! Size=9
//! MoveCount=2
//! ToMove=black
//! Move0=E5
//! Move1=pass
//! ```

use std::collections::HashMap;
use std::fmt::Write as _;

use tracing::{debug, trace};

use crate::board::{Board, Color, Point};
use crate::constants::{RESIGN_MOVE, max_game_len};
use crate::error::{GoError, RecordError};
use crate::player::Player;

/// Most handicap stones that have a fixed placement.
pub const MAX_HANDICAP: usize = 9;

/// Smallest board with distinct star points for handicap stones.
pub const MIN_HANDICAP_SIZE: usize = 7;

/// Put `handicap` black stones on the star points and give White the move.
///
/// Stones go down in a fixed order: the two corners on one diagonal, then the
/// other two, then the centre for an odd count, then the side points.
pub fn place_handicap(board: &mut Board, handicap: usize) -> Result<(), RecordError> {
    if handicap == 0 {
        return Ok(());
    }
    let size = board.size();
    if handicap > MAX_HANDICAP || size < MIN_HANDICAP_SIZE {
        return Err(RecordError::InvalidValue {
            key: "Handicap".into(),
            value: handicap.to_string(),
        });
    }

    let small = if size < 13 { 2 } else { 3 };
    let large = if size < 13 { size - 3 } else { size - 4 };
    let center = size / 2;

    let mut stones = vec![(small, small)];
    if handicap >= 2 {
        stones.push((large, large));
    }
    if handicap >= 3 {
        stones.push((small, large));
    }
    if handicap >= 4 {
        stones.push((large, small));
    }
    if handicap == 5 {
        stones.push((center, center));
    }
    if handicap >= 6 {
        stones.push((center, large));
        stones.push((center, small));
    }
    if handicap >= 7 {
        stones.push((center, center));
    }
    if handicap >= 8 {
        stones.push((large, center));
    }
    if handicap >= 9 {
        stones.push((small, center));
    }

    for (x, y) in stones {
        let p = board.point(x, y);
        board.place_non_played_stone(p, Color::Black);
    }
    board.set_to_move(Color::White);
    Ok(())
}

#[derive(Clone, Debug, PartialEq)]
pub struct GameRecord {
    pub size: usize,
    pub komi: f32,
    pub handicap: usize,
    /// Side to move after the last recorded move.
    pub to_move: Color,
    pub moves: Vec<Point>,
}

impl GameRecord {
    /// An empty record. Fails if the size or handicap is unsupported.
    pub fn new(size: usize, komi: f32, handicap: usize) -> Result<Self, RecordError> {
        let mut record = GameRecord {
            size,
            komi,
            handicap,
            to_move: Color::Black,
            moves: Vec::new(),
        };
        record.to_move = record.start_board()?.to_move();
        Ok(record)
    }

    /// The position before the first recorded move.
    pub fn start_board(&self) -> Result<Board, RecordError> {
        let mut board = Board::try_new(self.size)?;
        board.set_komi(self.komi);
        place_handicap(&mut board, self.handicap)?;
        Ok(board)
    }

    /// Append a move just applied to `board`.
    pub fn push(&mut self, mv: Point, board: &Board) {
        self.moves.push(mv);
        self.to_move = board.to_move();
    }

    /// Rebuild the final position by playing every recorded move in turn.
    pub fn replay(&self) -> Result<Board, RecordError> {
        let mut board = self.start_board()?;
        for (index, &mv) in self.moves.iter().enumerate() {
            board
                .play_checked(mv)
                .map_err(|source| RecordError::IllegalMove { index, source })?;
        }
        board.set_to_move(self.to_move);
        Ok(board)
    }

    pub fn to_properties(&self) -> String {
        let notation = Board::new(self.size);
        let mut out = String::new();
        writeln!(out, "Handicap={}", self.handicap).ok();
        writeln!(out, "Komi={}", self.komi).ok();
        writeln!(out, "Size={}", self.size).ok();
        writeln!(out, "MoveCount={}", self.moves.len()).ok();
        writeln!(out, "ToMove={}", self.to_move).ok();
        for (i, &mv) in self.moves.iter().enumerate() {
            writeln!(out, "Move{i}={}", notation.point_notation(mv)).ok();
        }
        out
    }

    /// Parse `Key=Value` lines. Blank lines, `#` comments and unknown keys
    /// are ignored.
    pub fn from_properties(text: &str) -> Result<Self, RecordError> {
        let props: HashMap<&str, &str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| line.split_once('='))
            .map(|(k, v)| (k.trim(), v.trim()))
            .collect();

        let get = |key: &str| {
            props
                .get(key)
                .copied()
                .ok_or_else(|| RecordError::MissingKey(key.to_string()))
        };
        let invalid = |key: &str, value: &str| RecordError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        let parse_usize = |key: &str| -> Result<usize, RecordError> {
            let value = get(key)?;
            value.parse().map_err(|_| invalid(key, value))
        };

        let handicap = parse_usize("Handicap")?;
        let size = parse_usize("Size")?;
        let komi_str = get("Komi")?;
        let komi: f32 = komi_str.parse().map_err(|_| invalid("Komi", komi_str))?;
        let to_move_str = get("ToMove")?;
        let to_move = Color::parse(to_move_str).ok_or_else(|| invalid("ToMove", to_move_str))?;
        let move_count = parse_usize("MoveCount")?;

        let notation = Board::try_new(size)?;
        let mut moves = Vec::with_capacity(move_count);
        for i in 0..move_count {
            let key = format!("Move{i}");
            let value = get(&key)?;
            let mv = notation
                .parse_point(value)
                .map_err(|_| invalid(&key, value))?;
            moves.push(mv);
        }

        Ok(GameRecord {
            size,
            komi,
            handicap,
            to_move,
            moves,
        })
    }
}

/// How a finished game was decided.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Outcome {
    /// Both sides passed, or the move limit was hit; area score, Black positive.
    Score(f32),
    /// The given side resigned.
    Resignation(Color),
}

impl Outcome {
    pub fn winner(&self) -> Option<Color> {
        match *self {
            Outcome::Score(s) if s > 0.0 => Some(Color::Black),
            Outcome::Score(s) if s < 0.0 => Some(Color::White),
            Outcome::Score(_) => None,
            Outcome::Resignation(loser) => Some(loser.opp()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct GameResult {
    pub record: GameRecord,
    pub outcome: Outcome,
    pub board: Board,
}

/// Play one game between two players until two passes, a resignation, or
/// the move limit.
pub fn play_game(
    black: &mut dyn Player,
    white: &mut dyn Player,
    size: usize,
    komi: f32,
    handicap: usize,
) -> Result<GameResult, RecordError> {
    let mut record = GameRecord::new(size, komi, handicap)?;
    let mut board = record.start_board()?;
    let limit = max_game_len(size);

    let mut resigned = None;
    while !board.is_game_over() && record.moves.len() < limit {
        let color = board.to_move();
        let player: &mut dyn Player = match color {
            Color::Black => &mut *black,
            Color::White => &mut *white,
        };
        let mv = player.get_move(&board);
        if mv == RESIGN_MOVE {
            resigned = Some(color);
            break;
        }
        trace!(
            player = player.name(),
            %color,
            mv = %board.point_notation(mv),
            "move"
        );
        board
            .play_checked(mv)
            .map_err(|source: GoError| RecordError::IllegalMove {
                index: record.moves.len(),
                source,
            })?;
        record.push(mv, &board);
    }

    let outcome = match resigned {
        Some(color) => Outcome::Resignation(color),
        None => Outcome::Score(board.score_simple_end_position(komi)),
    };
    debug!(moves = record.moves.len(), ?outcome, "game finished");
    Ok(GameResult {
        record,
        outcome,
        board,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Cell;
    use crate::constants::PASS_MOVE;
    use crate::player::RandomPlayer;

    #[test]
    fn test_handicap_points_9x9() {
        let mut board = Board::new(9);
        place_handicap(&mut board, 4).unwrap();
        for s in ["C7", "G3", "C3", "G7"] {
            let p = board.parse_point(s).unwrap();
            assert_eq!(board.cell(p), Cell::Black, "{s}");
        }
        assert_eq!(board.to_move(), Color::White);
        assert!(!board.is_on_board(board.last_move()));
    }

    #[test]
    fn test_handicap_five_and_nine_use_center() {
        for handicap in [5, 9] {
            let mut board = Board::new(19);
            place_handicap(&mut board, handicap).unwrap();
            let stones = board
                .points()
                .filter(|&p| board.cell(p) == Cell::Black)
                .count();
            assert_eq!(stones, handicap);
            let center = board.parse_point("J10").unwrap();
            assert_eq!(board.cell(center), Cell::Black);
        }
    }

    #[test]
    fn test_handicap_rejected() {
        let mut board = Board::new(5);
        assert!(place_handicap(&mut board, 2).is_err());
        let mut board = Board::new(9);
        assert!(place_handicap(&mut board, 10).is_err());
    }

    #[test]
    fn test_properties_roundtrip() {
        let mut record = GameRecord::new(9, 6.5, 2).unwrap();
        let mut board = record.start_board().unwrap();
        for s in ["E5", "D4", "pass"] {
            let mv = board.parse_point(s).unwrap();
            board.play_checked(mv).unwrap();
            record.push(mv, &board);
        }

        let text = record.to_properties();
        assert!(text.contains("Handicap=2\n"));
        assert!(text.contains("ToMove=black\n"));
        assert!(text.contains("Move2=pass\n"));

        let parsed = GameRecord::from_properties(&text).unwrap();
        assert_eq!(parsed, record);

        let replayed = parsed.replay().unwrap();
        assert_eq!(replayed.to_string(), board.to_string());
        assert_eq!(replayed.last_move(), PASS_MOVE);
    }

    #[test]
    fn test_missing_and_invalid_keys() {
        let err = GameRecord::from_properties("Handicap=0\nKomi=7.5\n").unwrap_err();
        assert_eq!(err, RecordError::MissingKey("Size".into()));

        let text = "Handicap=0\nKomi=7.5\nSize=9\nMoveCount=1\nToMove=white\nMove0=Z9\n";
        let err = GameRecord::from_properties(text).unwrap_err();
        assert!(matches!(err, RecordError::InvalidValue { ref key, .. } if key == "Move0"));
    }

    #[test]
    fn test_replay_rejects_illegal_move() {
        let text = "Handicap=0\nKomi=7.5\nSize=9\nMoveCount=2\nToMove=black\nMove0=E5\nMove1=E5\n";
        let record = GameRecord::from_properties(text).unwrap();
        let err = record.replay().unwrap_err();
        assert!(matches!(
            err,
            RecordError::IllegalMove {
                index: 1,
                source: GoError::Occupied(_)
            }
        ));
    }

    #[test]
    fn test_random_game_ends_and_replays() {
        let mut black = RandomPlayer::new(1);
        let mut white = RandomPlayer::new(2);
        let result = play_game(&mut black, &mut white, 5, 0.5, 0).unwrap();
        assert!(result.board.is_game_over() || result.record.moves.len() == max_game_len(5));
        assert!(result.outcome.winner().is_some());

        let replayed = result.record.replay().unwrap();
        assert_eq!(replayed.to_string(), result.board.to_string());
    }
}
