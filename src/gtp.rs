//! Go Text Protocol (GTP) front end.
//!
//! GTP is a text-based protocol for communicating with Go-playing programs.
//! This module implements the subset of GTP version 2 that graphical clients
//! such as Sabaki or GoGui need to play a game against the engine.
//!
//! ## Supported Commands
//!
//! - `name`, `version`, `protocol_version`
//! - `list_commands`, `known_command <cmd>`
//! - `quit`
//! - `boardsize <size>` - any size from 2 to 19; clears the board
//! - `clear_board`
//! - `komi <value>`
//! - `play <color> <vertex>` - the color may be out of turn
//! - `genmove <color>` - search and play; answers a vertex, `pass` or `resign`
//! - `showboard`
//! - `final_score` - area score of the current position, e.g. `B+3.5`
//!
//! Vertices use GTP column letters, which skip `I`.
//!
//! ## Example
//!
//! ```
//! use thinkgo::gtp::GtpEngine;
//!
//! let mut engine = GtpEngine::new();
//! let mut out = Vec::new();
//! engine.run_with("boardsize 9\nplay b E5\nquit\n".as_bytes(), &mut out).unwrap();
//! assert!(String::from_utf8(out).unwrap().starts_with("= \n"));
//! ```

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::board::{Board, Color, Point};
use crate::constants::{
    DEFAULT_KOMI, DEFAULT_SIZE, MAX_SIZE, MIN_SIZE, PASS_MOVE, RESIGN_MOVE, RESIGN_THRES,
};
use crate::error::GoError;
use crate::mcts::SearchConfig;
use crate::player::{Player, UctPlayer};

/// The list of known GTP commands.
const KNOWN_COMMANDS: &[&str] = &[
    "boardsize",
    "clear_board",
    "final_score",
    "genmove",
    "known_command",
    "komi",
    "list_commands",
    "name",
    "play",
    "protocol_version",
    "quit",
    "showboard",
    "version",
];

/// Column letters of GTP vertices.
const GTP_COLUMNS: &[u8] = b"ABCDEFGHJKLMNOPQRST";

/// Parse a GTP vertex such as `J9` or `pass`.
pub fn parse_vertex(board: &Board, s: &str) -> Result<Point, GoError> {
    if s.eq_ignore_ascii_case("pass") {
        return Ok(PASS_MOVE);
    }
    let invalid = || GoError::InvalidCoordinate(s.to_string());

    let mut chars = s.chars();
    let col = chars.next().ok_or_else(invalid)?.to_ascii_uppercase();
    let x = GTP_COLUMNS
        .iter()
        .position(|&c| c as char == col)
        .ok_or_else(invalid)?;
    let row: usize = chars.as_str().parse().map_err(|_| invalid())?;
    let size = board.size();
    if x >= size || row == 0 || row > size {
        return Err(invalid());
    }
    Ok(board.point(x, size - row))
}

pub fn format_vertex(board: &Board, p: Point) -> String {
    match p {
        PASS_MOVE => "pass".to_string(),
        RESIGN_MOVE => "resign".to_string(),
        _ => {
            let (x, y) = board.xy(p);
            format!("{}{}", GTP_COLUMNS[x] as char, board.size() - y)
        }
    }
}

/// GTP engine state.
pub struct GtpEngine {
    /// Current game position
    board: Board,
    /// Search used by `genmove`
    player: UctPlayer,
}

impl Default for GtpEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl GtpEngine {
    /// Create a GTP engine with the default board and search settings.
    pub fn new() -> Self {
        Self::with_config(SearchConfig::default())
    }

    /// Create a GTP engine that searches with `config` on every `genmove`.
    pub fn with_config(config: SearchConfig) -> Self {
        let mut board = Board::new(DEFAULT_SIZE);
        board.set_komi(DEFAULT_KOMI);
        Self {
            board,
            player: UctPlayer::new(config).with_resign_threshold(RESIGN_THRES),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Run the GTP command loop on stdin and stdout.
    pub fn run(&mut self) -> Result<()> {
        let stdin = io::stdin();
        self.run_with(stdin.lock(), io::stdout())
    }

    /// Run the GTP command loop until `quit` or end of input.
    pub fn run_with<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> Result<()> {
        for line in input.lines() {
            let line = line.context("failed to read GTP command")?;

            // Skip empty lines and comments
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (id, command_line) = Self::parse_id(line);
            let parts: Vec<&str> = command_line.split_whitespace().collect();
            let Some((command, args)) = parts.split_first() else {
                continue;
            };
            let command = command.to_lowercase();

            debug!(%command, ?args, "gtp command");
            let (success, message) = self.execute(&command, args);
            if !success {
                warn!(%command, %message, "gtp command failed");
            }

            let prefix = if success { '=' } else { '?' };
            let id_str = id.map(|i| i.to_string()).unwrap_or_default();
            // A response ends with exactly one empty line.
            let message = message.trim_end();
            write!(output, "{prefix}{id_str} {message}\n\n")
                .and_then(|()| output.flush())
                .context("failed to write GTP response")?;

            if command == "quit" {
                break;
            }
        }
        Ok(())
    }

    /// Parse an optional numeric command ID from the beginning of the line.
    fn parse_id(line: &str) -> (Option<u32>, &str) {
        let trimmed = line.trim();
        let end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        if end > 0
            && let Ok(id) = trimmed[..end].parse::<u32>()
        {
            return (Some(id), trimmed[end..].trim());
        }
        (None, trimmed)
    }

    /// Execute a GTP command and return (success, response).
    fn execute(&mut self, command: &str, args: &[&str]) -> (bool, String) {
        match command {
            "name" => (true, env!("CARGO_PKG_NAME").to_string()),

            "version" => (true, env!("CARGO_PKG_VERSION").to_string()),

            "protocol_version" => (true, "2".to_string()),

            "list_commands" => (true, KNOWN_COMMANDS.join("\n")),

            "known_command" => {
                let Some(name) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                let known = KNOWN_COMMANDS.contains(&name.to_lowercase().as_str());
                (true, known.to_string())
            }

            "quit" => (true, String::new()),

            "boardsize" => {
                let Some(arg) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                match arg.parse::<usize>() {
                    Ok(size) if (MIN_SIZE..=MAX_SIZE).contains(&size) => {
                        let komi = self.board.komi();
                        self.board = Board::new(size);
                        self.board.set_komi(komi);
                        (true, String::new())
                    }
                    Ok(_) => (false, "unacceptable size".to_string()),
                    Err(_) => (false, "invalid size".to_string()),
                }
            }

            "clear_board" => {
                self.board.reset();
                (true, String::new())
            }

            "komi" => {
                let Some(arg) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                match arg.parse::<f32>() {
                    Ok(komi) => {
                        self.board.set_komi(komi);
                        (true, String::new())
                    }
                    Err(_) => (false, "invalid komi".to_string()),
                }
            }

            "play" => {
                let [color, vertex, ..] = args else {
                    return (false, "missing arguments".to_string());
                };
                let Some(color) = Color::parse(color) else {
                    return (false, "invalid color".to_string());
                };
                let mv = match parse_vertex(&self.board, vertex) {
                    Ok(mv) => mv,
                    Err(e) => return (false, e.to_string()),
                };

                let previous = self.board.to_move();
                self.board.set_to_move(color);
                match self.board.play_checked(mv) {
                    Ok(_) => (true, String::new()),
                    Err(e) => {
                        self.board.set_to_move(previous);
                        (false, e.to_string())
                    }
                }
            }

            "genmove" => {
                let Some(color) = args.first().and_then(|c| Color::parse(c)) else {
                    return (false, "invalid color".to_string());
                };
                self.board.set_to_move(color);

                let mv = self.player.get_move(&self.board);
                if let Some(search) = self.player.search() {
                    info!(
                        %color,
                        mv = %format_vertex(&self.board, mv),
                        simulations = search.simulations_run(),
                        value = search.best_value().unwrap_or(0.5),
                        "genmove"
                    );
                }
                if mv == RESIGN_MOVE {
                    return (true, "resign".to_string());
                }

                // The search only proposes legal moves.
                self.board.place_stone(mv);
                (true, format_vertex(&self.board, mv))
            }

            "showboard" => (true, format!("\n{}", self.board)),

            "final_score" => {
                let score = self.board.score_simple_end_position(self.board.komi());
                let result = if score > 0.0 {
                    format!("B+{score}")
                } else if score < 0.0 {
                    format!("W+{}", -score)
                } else {
                    "0".to_string()
                };
                (true, result)
            }

            _ => (false, "unknown command".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Cell;
    use crate::mcts::SearchBudget;

    fn fast_engine() -> GtpEngine {
        GtpEngine::with_config(SearchConfig {
            budget: SearchBudget::Simulations(100),
            ..SearchConfig::default()
        })
    }

    #[test]
    fn test_parse_id_with_id() {
        let (id, cmd) = GtpEngine::parse_id("123 name");
        assert_eq!(id, Some(123));
        assert_eq!(cmd, "name");
    }

    #[test]
    fn test_parse_id_without_id() {
        let (id, cmd) = GtpEngine::parse_id("name");
        assert_eq!(id, None);
        assert_eq!(cmd, "name");
    }

    #[test]
    fn test_name_command() {
        let mut engine = GtpEngine::new();
        let (success, response) = engine.execute("name", &[]);
        assert!(success);
        assert_eq!(response, "thinkgo");
    }

    #[test]
    fn test_known_command() {
        let mut engine = GtpEngine::new();

        let (success, response) = engine.execute("known_command", &["showboard"]);
        assert!(success);
        assert_eq!(response, "true");

        let (success, response) = engine.execute("known_command", &["unknown_cmd"]);
        assert!(success);
        assert_eq!(response, "false");
    }

    #[test]
    fn test_boardsize() {
        let mut engine = GtpEngine::new();

        let (success, _) = engine.execute("boardsize", &["13"]);
        assert!(success);
        assert_eq!(engine.board.size(), 13);

        let (success, _) = engine.execute("boardsize", &["25"]);
        assert!(!success);
        assert_eq!(engine.board.size(), 13);
    }

    #[test]
    fn test_play_out_of_turn_and_clear() {
        let mut engine = GtpEngine::new();

        let (success, _) = engine.execute("play", &["white", "D4"]);
        assert!(success);
        let d4 = engine.board.parse_point("D4").unwrap();
        assert_eq!(engine.board.cell(d4), Cell::White);
        assert_eq!(engine.board.to_move(), Color::Black);

        let (success, _) = engine.execute("play", &["white", "D4"]);
        assert!(!success);
        // A rejected move leaves the side to move alone.
        assert_eq!(engine.board.to_move(), Color::Black);

        let (success, _) = engine.execute("clear_board", &[]);
        assert!(success);
        assert_eq!(engine.board.cell(d4), Cell::Empty);
    }

    #[test]
    fn test_genmove_plays_for_color() {
        let mut engine = fast_engine();
        engine.execute("boardsize", &["7"]);
        let (success, response) = engine.execute("genmove", &["w"]);
        assert!(success);
        let mv = parse_vertex(&engine.board, &response).unwrap();
        assert_eq!(engine.board.cell(mv), Cell::White);
        assert_eq!(engine.board.to_move(), Color::Black);
    }

    #[test]
    fn test_vertices_skip_i() {
        let board = Board::new(9);
        let j9 = parse_vertex(&board, "J9").unwrap();
        assert_eq!(board.xy(j9), (8, 0));
        assert_eq!(format_vertex(&board, j9), "J9");
        assert_eq!(parse_vertex(&board, "h1").map(|p| board.xy(p)), Ok((7, 8)));
        assert!(parse_vertex(&board, "I5").is_err());
        assert!(parse_vertex(&board, "K5").is_err());
        assert_eq!(parse_vertex(&board, "PASS"), Ok(PASS_MOVE));
    }

    #[test]
    fn test_final_score() {
        let mut engine = GtpEngine::new();
        engine.execute("komi", &["0.5"]);
        let (_, response) = engine.execute("final_score", &[]);
        assert_eq!(response, "W+0.5");

        engine.execute("play", &["b", "E5"]);
        let (_, response) = engine.execute("final_score", &[]);
        assert_eq!(response, "B+4.5");
    }
}
