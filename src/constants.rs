//! Constants for board geometry, move sentinels, search parameters, and priors.
//!
//! The board uses a 1D array representation with a border ring so that
//! neighbor lookups never need bounds checks. Unlike the fixed-size layout
//! the engine started from, the size is chosen at runtime (anything from
//! `MIN_SIZE` to `MAX_SIZE`), so everything geometric here is a function of it.

// =============================================================================
// Board Geometry
// =============================================================================

/// Smallest supported board.
pub const MIN_SIZE: usize = 2;

/// Largest supported board.
pub const MAX_SIZE: usize = 19;

/// Default board size for new games.
pub const DEFAULT_SIZE: usize = 9;

/// Default komi (compensation points for White).
pub const DEFAULT_KOMI: f32 = 7.5;

/// Row stride of the padded buffer: one border column shared by both edges.
#[inline]
pub const fn stride(size: usize) -> usize {
    size + 1
}

/// Total buffer length including the border ring and the extra trailing cell
/// needed for the south-east diagonal of the last point.
#[inline]
pub const fn buffer_len(size: usize) -> usize {
    (size + 2) * stride(size) + 1
}

/// Maximum number of moves in one simulated game (3 times board area to allow
/// for captures and replays). Exceeding it aborts the simulation as a draw.
#[inline]
pub const fn max_game_len(size: usize) -> usize {
    3 * size * size
}

// =============================================================================
// Special Move Values
// =============================================================================

/// Pass move marker (index 0 is border padding, so it never names a point).
pub const PASS_MOVE: usize = 0;

/// "No move yet" marker, used for `last_move` on a fresh board.
pub const NULL_MOVE: usize = usize::MAX - 1;

/// Resign move marker.
pub const RESIGN_MOVE: usize = usize::MAX;

// =============================================================================
// UCT Search Parameters
// =============================================================================

/// Default number of simulations per move decision.
pub const N_SIMS: usize = 1000;

/// Exploration constant C of the UCB1 bias term.
pub const BIAS_TERM_CONSTANT: f32 = 0.7;

/// RAVE weight when the RAVE count is small.
pub const RAVE_WEIGHT_INITIAL: f32 = 0.9;

/// Asymptotic RAVE weight as the RAVE count grows.
pub const RAVE_WEIGHT_FINAL: f32 = 20000.0;

/// Value of a child that has neither mean nor RAVE statistics.
pub const FIRST_PLAY_URGENCY: f32 = 10000.0;

/// Minimum visit count before an unexpanded node is expanded.
pub const EXPAND_THRESHOLD: u32 = 1;

/// Share of the evaluation given to the score margin.
pub const SCORE_MODIFICATION: f32 = 0.02;

/// Winrate threshold below which the GTP engine resigns.
pub const RESIGN_THRES: f32 = 0.1;

/// Default seed for the search random number generator.
pub const DEFAULT_SEED: u64 = 0x7468_696e_6b67_6f;

// =============================================================================
// Prior Values (for node initialization at expansion)
// =============================================================================

/// Boards smaller than this use the small-board prior counts.
pub const SMALL_BOARD_LIMIT: usize = 15;

/// Prior pseudo-count on small boards / large boards.
pub const PRIOR_COUNT_SMALL: u32 = 9;
pub const PRIOR_COUNT_LARGE: u32 = 18;

/// Prior pseudo-count for heuristic moves in a quiet (fill-board) position.
pub const PRIOR_COUNT_HEURISTIC: u32 = 3;

/// Prior value for self-atari moves and for pass.
pub const PRIOR_BAD: f32 = 0.1;

/// Prior values in quiet positions.
pub const PRIOR_QUIET_ATARI: f32 = 1.0;
pub const PRIOR_QUIET_PATTERN: f32 = 0.8;
pub const PRIOR_QUIET_OTHER: f32 = 0.5;

/// Prior values in contested positions (the policy produced a tactical move).
pub const PRIOR_POLICY: f32 = 1.0;
pub const PRIOR_ATARI: f32 = 0.8;
pub const PRIOR_PATTERN: f32 = 0.6;
pub const PRIOR_OTHER: f32 = 0.4;

/// Locality bonus by Manhattan distance to the last move (1, 2, 3, further).
pub const PRIOR_LOCALITY: [f32; 4] = [0.3, 0.3, 0.2, 0.1];

/// Pseudo-count added with the locality bonus on small / large boards.
pub const PRIOR_LOCALITY_COUNT_SMALL: u32 = 4;
pub const PRIOR_LOCALITY_COUNT_LARGE: u32 = 5;
