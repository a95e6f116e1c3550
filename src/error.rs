//! Errors surfaced at the engine's API boundary.
//!
//! Contract violations inside the engine (playing an unvalidated illegal move,
//! copying between boards of different size) are panics, not errors. These
//! types cover input that comes from outside: coordinates, GTP arguments and
//! persisted game records.

use thiserror::Error;

use crate::board::Point;

/// Result of validating a move or coordinate handed to the board.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GoError {
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),
    #[error("point {0} is not on the board")]
    OffBoard(Point),
    #[error("illegal move: {0} is not empty")]
    Occupied(String),
    #[error("illegal move: {0} retakes ko")]
    Ko(String),
    #[error("illegal move: {0} is suicide")]
    Suicide(String),
    #[error("unsupported board size {0}")]
    UnsupportedSize(usize),
}

/// Failure to read a persisted game record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("missing key {0}")]
    MissingKey(String),
    #[error("invalid value {value:?} for key {key}")]
    InvalidValue { key: String, value: String },
    #[error("move {index} cannot be replayed: {source}")]
    IllegalMove {
        index: usize,
        #[source]
        source: GoError,
    },
    #[error(transparent)]
    Board(#[from] GoError),
}
