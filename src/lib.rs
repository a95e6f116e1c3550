//! ThinkGo: a UCT Go engine.
//!
//! The engine searches with UCT and RAVE over an incrementally maintained
//! board, running simulations with a tactical playout policy.
//!
//! ## Modules
//!
//! - [`constants`] - Geometry, move sentinels and search parameters
//! - [`error`] - Errors for coordinates, moves and game records
//! - [`board`] - Board with incremental blocks, legality, ko and scoring
//! - [`patterns`] - 3x3 shape table used by the policy and priors
//! - [`generators`] - Incremental capture and random move generators
//! - [`playout`] - Tiered playout policy
//! - [`tree`] - Search tree arena and node statistics
//! - [`mcts`] - UCT search with RAVE and heuristic priors
//! - [`player`] - Move-choosing strategies
//! - [`game`] - Game records, handicap setup and the self-play loop
//! - [`gtp`] - Go Text Protocol front end
//!
//! ## Example
//!
//! ```
//! use thinkgo::board::Board;
//! use thinkgo::mcts::{SearchBudget, SearchConfig, UctSearch};
//!
//! let mut board = Board::new(9);
//! let e5 = board.parse_point("E5").unwrap();
//! board.play_checked(e5).unwrap();
//!
//! let config = SearchConfig {
//!     budget: SearchBudget::Simulations(100),
//!     ..SearchConfig::default()
//! };
//! let mut search = UctSearch::new(&board, config);
//! search.run_search();
//! println!("Best move: {}", board.point_notation(search.best_move()));
//! ```

pub mod board;
pub mod constants;
pub mod error;
pub mod game;
pub mod generators;
pub mod gtp;
pub mod mcts;
pub mod patterns;
pub mod player;
pub mod playout;
pub mod tree;
