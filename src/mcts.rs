//! UCT search with RAVE.
//!
//! Each simulation copies the root position into a scratch board and then:
//!
//! 1. walks down the tree, picking at each node the child with the highest
//!    upper bound (mean and RAVE value blended, plus a UCB1 exploration term);
//! 2. expands the first unexpanded node that has been visited before,
//!    seeding its children with priors from the playout policy and a few
//!    board-wide heuristics;
//! 3. finishes the game with the playout policy;
//! 4. backs the result up the path, alternating perspective, and updates the
//!    RAVE statistics of every sibling whose move was played later in the
//!    game by the same side.
//!
//! A simulation that runs past `3 * size * size` moves is aborted and counts
//! as a draw. This is what bounds long ko cycles, since only simple ko is
//! enforced.

use std::time::{Duration, Instant};

use fastrand::Rng;
use tracing::debug;

use crate::board::{Board, Cell, Color, Point};
use crate::constants::{
    BIAS_TERM_CONSTANT, DEFAULT_SEED, EXPAND_THRESHOLD, FIRST_PLAY_URGENCY, N_SIMS, PASS_MOVE,
    PRIOR_ATARI, PRIOR_BAD, PRIOR_COUNT_HEURISTIC, PRIOR_COUNT_LARGE, PRIOR_COUNT_SMALL,
    PRIOR_LOCALITY, PRIOR_LOCALITY_COUNT_LARGE, PRIOR_LOCALITY_COUNT_SMALL, PRIOR_OTHER,
    PRIOR_PATTERN, PRIOR_POLICY, PRIOR_QUIET_ATARI, PRIOR_QUIET_OTHER, PRIOR_QUIET_PATTERN,
    RAVE_WEIGHT_FINAL, RAVE_WEIGHT_INITIAL, SCORE_MODIFICATION, SMALL_BOARD_LIMIT, buffer_len,
    max_game_len,
};
use crate::patterns;
use crate::playout::{MoveType, PlayoutPolicy};
use crate::tree::{MoveInfo, NodeId, UctTree};

/// How long a search runs.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SearchBudget {
    /// A fixed number of simulations.
    Simulations(usize),
    /// Simulations until the wall-clock budget is used up, checked between
    /// simulations.
    Time(Duration),
}

/// Tunable search parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchConfig {
    pub budget: SearchBudget,
    /// Exploration constant C of the UCB1 term. Zero disables exploration.
    pub bias_term_constant: f32,
    pub use_rave: bool,
    pub rave_weight_initial: f32,
    pub rave_weight_final: f32,
    pub first_play_urgency: f32,
    pub expand_threshold: u32,
    pub seed: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            budget: SearchBudget::Simulations(N_SIMS),
            bias_term_constant: BIAS_TERM_CONSTANT,
            use_rave: true,
            rave_weight_initial: RAVE_WEIGHT_INITIAL,
            rave_weight_final: RAVE_WEIGHT_FINAL,
            first_play_urgency: FIRST_PLAY_URGENCY,
            expand_threshold: EXPAND_THRESHOLD,
            seed: DEFAULT_SEED,
        }
    }
}

/// Statistics of one root child, for diagnostics.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ChildStats {
    pub mv: Point,
    pub visits: u32,
    pub mean: f32,
    pub rave_value: f32,
    pub rave_count: f32,
}

/// How the in-tree phase of a simulation ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum InTree {
    /// Reached a leaf; continue with a playout.
    Leaf,
    /// No legal moves left for either side; score the board as is.
    Terminal,
    /// Hit the move cap.
    Aborted,
}

const HEURISTIC_ATARI: u8 = 1;
const HEURISTIC_PATTERN: u8 = 2;

pub struct UctSearch {
    config: SearchConfig,
    root_board: Board,
    board: Board,
    tree: UctTree,
    policy: PlayoutPolicy,
    rng: Rng,
    rave_param1: f32,
    rave_param2: f32,
    simulations: usize,
    // Per-simulation scratch, reused between simulations.
    nodes: Vec<NodeId>,
    sequence: Vec<Point>,
    legal_moves: Vec<MoveInfo>,
    heuristics: Vec<u8>,
    first_play: Vec<usize>,
}

impl UctSearch {
    /// Create a search over a copy of `root`.
    pub fn new(root: &Board, config: SearchConfig) -> Self {
        let len = buffer_len(root.size());
        let mut search = UctSearch {
            rng: Rng::with_seed(config.seed),
            rave_param1: 1.0 / config.rave_weight_initial,
            rave_param2: 1.0 / config.rave_weight_final,
            config,
            root_board: root.clone(),
            board: root.clone(),
            tree: UctTree::new(),
            policy: PlayoutPolicy::new(),
            simulations: 0,
            nodes: Vec::new(),
            sequence: Vec::new(),
            legal_moves: Vec::new(),
            heuristics: vec![0; len],
            first_play: vec![usize::MAX; 2 * len],
        };
        search.tree.clear();
        search
    }

    /// Search from a new root position, keeping allocations when the board
    /// size is unchanged. The old tree is discarded.
    pub fn set_root(&mut self, root: &Board) {
        if root.size() == self.root_board.size() {
            self.root_board.initialize(root);
        } else {
            let len = buffer_len(root.size());
            self.root_board = root.clone();
            self.board = root.clone();
            self.heuristics = vec![0; len];
            self.first_play = vec![usize::MAX; 2 * len];
        }
        self.tree.clear();
        self.simulations = 0;
    }

    /// Budget for the following searches.
    pub fn set_budget(&mut self, budget: SearchBudget) {
        self.config.budget = budget;
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn root_board(&self) -> &Board {
        &self.root_board
    }

    pub fn tree(&self) -> &UctTree {
        &self.tree
    }

    /// Simulations run by the last search.
    pub fn simulations_run(&self) -> usize {
        self.simulations
    }

    /// Run a full search from a fresh tree. Returns the number of simulations.
    pub fn run_search(&mut self) -> usize {
        self.tree.clear();
        self.simulations = 0;
        patterns::init_patterns();

        let start = Instant::now();
        match self.config.budget {
            SearchBudget::Simulations(n) => {
                for _ in 0..n {
                    self.play_game();
                }
            }
            SearchBudget::Time(limit) => {
                while start.elapsed() < limit {
                    self.play_game();
                }
            }
        }

        let best = self.best_move();
        debug!(
            simulations = self.simulations,
            nodes = self.tree.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            best = %self.root_board.point_notation(best),
            "search finished"
        );
        self.simulations
    }

    /// Most visited root child, or pass if no child has been visited.
    pub fn best_move(&self) -> Point {
        self.find_best_child(UctTree::ROOT)
            .map_or(PASS_MOVE, |child| self.tree.node(child).mv())
    }

    /// Follow the most visited child from the root for as long as there is
    /// one. A root without visited children yields a lone pass.
    pub fn principal_variation(&self) -> Vec<Point> {
        let mut result = Vec::new();
        let mut current = UctTree::ROOT;
        while let Some(child) = self.find_best_child(current) {
            result.push(self.tree.node(child).mv());
            current = child;
        }
        if result.is_empty() {
            result.push(PASS_MOVE);
        }
        result
    }

    /// Mean value of the best root child from the root mover's perspective.
    pub fn best_value(&self) -> Option<f32> {
        self.find_best_child(UctTree::ROOT)
            .map(|child| self.tree.node(child).mean())
    }

    /// Root children sorted by visit count, most visited first.
    pub fn root_children(&self) -> Vec<ChildStats> {
        let mut stats: Vec<ChildStats> = self
            .tree
            .children(UctTree::ROOT)
            .map(|id| {
                let node = self.tree.node(id);
                ChildStats {
                    mv: node.mv(),
                    visits: node.visits(),
                    mean: node.mean(),
                    rave_value: node.rave_value(),
                    rave_count: node.rave_count(),
                }
            })
            .collect();
        stats.sort_by(|a, b| b.visits.cmp(&a.visits));
        stats
    }

    fn find_best_child(&self, node: NodeId) -> Option<NodeId> {
        let mut best: Option<(NodeId, u32)> = None;
        for child in self.tree.children(node) {
            let visits = self.tree.node(child).visits();
            if visits > 0 && best.is_none_or(|(_, v)| visits > v) {
                best = Some((child, visits));
            }
        }
        best.map(|(child, _)| child)
    }

    // =========================================================================
    // One simulation
    // =========================================================================

    fn play_game(&mut self) {
        self.board.initialize(&self.root_board);
        self.nodes.clear();
        self.sequence.clear();

        let eval = match self.play_in_tree() {
            InTree::Aborted => 0.5,
            InTree::Terminal => self.evaluate(),
            InTree::Leaf => {
                if self.playout_game() {
                    self.evaluate()
                } else {
                    0.5
                }
            }
        };
        // Evaluation is for the side to move at the end; turn it into the
        // root mover's perspective.
        let eval = if self.sequence.len() % 2 == 1 {
            1.0 - eval
        } else {
            eval
        };

        self.update_tree(eval);
        if self.config.use_rave {
            self.update_rave_values(eval);
        }
        self.simulations += 1;
    }

    fn play_in_tree(&mut self) -> InTree {
        let max_len = max_game_len(self.board.size());
        let mut current = UctTree::ROOT;
        self.nodes.push(current);

        loop {
            if self.sequence.len() >= max_len {
                return InTree::Aborted;
            }

            let mut expanded = false;
            if self.tree.node(current).num_children() == 0 {
                if self.tree.node(current).move_count() < self.config.expand_threshold {
                    return InTree::Leaf;
                }
                self.generate_legal_moves();
                if self.legal_moves.is_empty() {
                    return InTree::Terminal;
                }
                self.score_moves();
                self.tree.expand(current, &self.legal_moves);
                expanded = true;
            }

            current = self.select_child(current);
            self.nodes.push(current);
            let mv = self.tree.node(current).mv();
            self.board.place_stone(mv);
            self.sequence.push(mv);

            if expanded {
                return InTree::Leaf;
            }
        }
    }

    /// Play the policy to the end of the game. Returns false if the move cap
    /// was hit.
    fn playout_game(&mut self) -> bool {
        let max_len = max_game_len(self.board.size());
        self.policy.initialize(&self.board, &mut self.rng);
        while !self.board.is_game_over() {
            if self.sequence.len() > max_len {
                return false;
            }
            let mv = self.policy.generate_move(&self.board, &mut self.rng);
            self.board.place_stone(mv);
            self.sequence.push(mv);
            self.policy.on_play(&self.board, &mut self.rng);
        }
        true
    }

    /// Value in [0, 1] for the side to move: wins land near 1 and losses
    /// near 0, shifted slightly by the margin.
    fn evaluate(&self) -> f32 {
        let komi = self.board.komi();
        let mut score = self.board.score_simple_end_position(komi);
        if self.board.to_move() == Color::White {
            score = -score;
        }
        // |score| never exceeds the board area plus |komi|.
        let size = self.board.size() as f32;
        let margin = SCORE_MODIFICATION * score / (size * size + komi.abs());
        let value = if score > f32::EPSILON {
            (1.0 - SCORE_MODIFICATION) + margin
        } else if score < -f32::EPSILON {
            SCORE_MODIFICATION + margin
        } else {
            0.5
        };
        value.clamp(0.0, 1.0)
    }

    fn update_tree(&mut self, eval: f32) {
        let inverse_eval = 1.0 - eval;
        for (i, &id) in self.nodes.iter().enumerate() {
            if i > 0 {
                self.tree.node_mut(self.nodes[i - 1]).increment_pos_count();
            }
            let value = if i % 2 == 1 { eval } else { inverse_eval };
            self.tree.node_mut(id).add_game_result(value);
        }
    }

    /// Credit every child of every in-tree node whose move the same side
    /// played later in the game, weighted by how soon it was played.
    fn update_rave_values(&mut self, eval: f32) {
        let len = self.sequence.len();
        if len == 0 {
            return;
        }
        let stride = self.first_play.len() / 2;
        self.first_play.fill(usize::MAX);

        let num_nodes = self.nodes.len();
        let mut i = len - 1;
        while i >= num_nodes {
            self.first_play[(i % 2) * stride + self.sequence[i]] = i;
            i -= 1;
        }
        loop {
            self.first_play[(i % 2) * stride + self.sequence[i]] = i;
            self.update_rave_children(i, eval, len, stride);
            if i == 0 {
                break;
            }
            i -= 1;
        }
    }

    fn update_rave_children(&mut self, i: usize, eval: f32, len: usize, stride: usize) {
        let parity = i % 2;
        let value = if parity == 0 { eval } else { 1.0 - eval };
        let mut child = self.tree.node(self.nodes[i]).first_child();
        while let Some(id) = child {
            let node = self.tree.node_mut(id);
            let first = self.first_play[parity * stride + node.mv()];
            if first != usize::MAX {
                let weight = 2.0 - (first - i) as f32 / (len - i) as f32;
                node.add_rave_value(value, weight);
            }
            child = node.next();
        }
    }

    // =========================================================================
    // Selection
    // =========================================================================

    fn select_child(&self, node: NodeId) -> NodeId {
        let parent = self.tree.node(node);
        let pos_count = parent.pos_count();
        let mut children = self.tree.children(node);
        let Some(first) = children.next() else {
            panic!("selecting a child of an unexpanded node");
        };
        if pos_count == 0 {
            return first;
        }

        let log_pos_count = (pos_count as f32).ln();
        let mut best = first;
        let mut best_bound = self.bound(log_pos_count, first);
        for child in children {
            let bound = self.bound(log_pos_count, child);
            if bound > best_bound {
                best = child;
                best_bound = bound;
            }
        }
        best
    }

    fn bound(&self, log_pos_count: f32, child: NodeId) -> f32 {
        let value = self.value_estimate(child);
        if self.config.bias_term_constant == 0.0 {
            return value;
        }
        let count = self.tree.node(child).move_count() as f32;
        value + self.config.bias_term_constant * (log_pos_count / (count + 1.0)).sqrt()
    }

    /// Mean and RAVE value blended by their weights; first-play urgency for
    /// a child with neither.
    fn value_estimate(&self, child: NodeId) -> f32 {
        let node = self.tree.node(child);
        let mut value = 0.0;
        let mut weight_sum = 0.0;

        if node.has_mean() {
            let weight = node.move_count() as f32;
            value += weight * node.mean();
            weight_sum += weight;
        }
        if self.config.use_rave && node.has_rave_value() {
            let rave_count = node.rave_count();
            let weight = rave_count / (self.rave_param1 + self.rave_param2 * rave_count);
            value += weight * node.rave_value();
            weight_sum += weight;
        }

        if weight_sum > 0.0 {
            value / weight_sum
        } else {
            self.config.first_play_urgency
        }
    }

    // =========================================================================
    // Expansion
    // =========================================================================

    /// Legal moves for the side to move, simple eyes excluded, with a random
    /// move first and pass last. Empty after two passes, or when neither
    /// side has anything but pass.
    fn generate_legal_moves(&mut self) {
        self.legal_moves.clear();
        if self.board.is_game_over() {
            return;
        }

        let to_move = self.board.to_move();
        for p in self.board.points() {
            if self.board.is_legal(p, to_move) && !self.board.is_simple_eye(p, to_move) {
                self.legal_moves.push(MoveInfo::new(p));
            }
        }
        if self.legal_moves.is_empty() {
            let opp = to_move.opp();
            let board = &self.board;
            if !board
                .points()
                .any(|p| board.is_legal(p, opp) && !board.is_simple_eye(p, opp))
            {
                return;
            }
        }

        // Only the first move is randomised; RAVE sorts out the rest quickly.
        if self.legal_moves.len() > 1 {
            let index = self.rng.usize(..self.legal_moves.len());
            self.legal_moves.swap(0, index);
        }
        self.legal_moves.push(MoveInfo::new(PASS_MOVE));
    }

    /// Assign a prior to every candidate in `legal_moves`.
    fn score_moves(&mut self) {
        self.policy.initialize(&self.board, &mut self.rng);
        self.policy.generate_move(&self.board, &mut self.rng);
        let quiet = self.policy.move_type() == MoveType::Random;
        let any_heuristic = self.find_global_pattern_and_atari_moves();

        let small = self.board.size() < SMALL_BOARD_LIMIT;
        let bad_count = if small { PRIOR_COUNT_SMALL } else { PRIOR_COUNT_LARGE };
        let to_move = self.board.to_move();
        let policy_moves = self.policy.equivalent_best_moves();

        for info in self.legal_moves.iter_mut() {
            if info.point == PASS_MOVE {
                info.value = PRIOR_BAD;
                info.count = bad_count;
                continue;
            }
            let flags = self.heuristics[info.point];
            let self_atari = self.board.self_atari(info.point, to_move);
            (info.value, info.count) = if quiet {
                if self_atari {
                    (PRIOR_BAD, bad_count)
                } else if flags & HEURISTIC_ATARI != 0 {
                    (PRIOR_QUIET_ATARI, PRIOR_COUNT_HEURISTIC)
                } else if flags & HEURISTIC_PATTERN != 0 {
                    (PRIOR_QUIET_PATTERN, PRIOR_COUNT_HEURISTIC)
                } else if any_heuristic {
                    (PRIOR_QUIET_OTHER, PRIOR_COUNT_HEURISTIC)
                } else {
                    (0.0, 0)
                }
            } else {
                let value = if self_atari {
                    PRIOR_BAD
                } else if policy_moves.contains(&info.point) {
                    PRIOR_POLICY
                } else if flags & HEURISTIC_ATARI != 0 {
                    PRIOR_ATARI
                } else if flags & HEURISTIC_PATTERN != 0 {
                    PRIOR_PATTERN
                } else {
                    PRIOR_OTHER
                };
                (value, bad_count)
            };
        }

        if self.board.is_on_board(self.board.last_move()) {
            self.add_locality_bonus(small);
        }
    }

    /// Flag empty points that put an opponent block in atari or match a
    /// shape. Returns true if any point was flagged.
    fn find_global_pattern_and_atari_moves(&mut self) -> bool {
        self.heuristics.fill(0);
        let mut any = false;
        for p in self.board.points() {
            if self.board.cell(p) != Cell::Empty {
                continue;
            }
            let mut flags = 0;
            if sets_atari(&self.board, p) {
                flags |= HEURISTIC_ATARI;
            }
            if patterns::match_any(&self.board, p) {
                flags |= HEURISTIC_PATTERN;
            }
            self.heuristics[p] = flags;
            any |= flags != 0;
        }
        any
    }

    fn add_locality_bonus(&mut self, small: bool) {
        let (tx, ty) = self.board.xy(self.board.last_move());
        let count = if small {
            PRIOR_LOCALITY_COUNT_SMALL
        } else {
            PRIOR_LOCALITY_COUNT_LARGE
        };
        for info in self.legal_moves.iter_mut() {
            if info.point == PASS_MOVE {
                info.value += PRIOR_LOCALITY[PRIOR_LOCALITY.len() - 1];
            } else {
                let (x, y) = self.board.xy(info.point);
                let dist = tx.abs_diff(x) + ty.abs_diff(y);
                let index = dist.clamp(1, PRIOR_LOCALITY.len()) - 1;
                info.value += PRIOR_LOCALITY[index];
            }
            info.count += count;
        }
    }
}

/// True if playing `p` leaves an adjacent opponent block with one liberty.
fn sets_atari(board: &Board, p: Point) -> bool {
    let opp = board.to_move().opp();
    if board.num_neighbors(p, opp) == 0 {
        return false;
    }
    board
        .neighbors(p)
        .iter()
        .any(|&n| board.cell(n).color() == Some(opp) && board.num_liberties(n) == 2)
}
