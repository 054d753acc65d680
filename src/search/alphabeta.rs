use cozy_chess::{Board, Move};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::search::aspiration::AspirationWindow;
use crate::search::eval::{
    eval_cp, mate_in, mated_in, non_pawn_material, opponent, DRAW_SCORE, MATE_BOUND, MATE_SCORE,
    MAX_PLY, VALUE_NONE,
};
use crate::search::history::History;
use crate::search::limits::{SearchLimits, TimeManager};
use crate::search::multicut;
use crate::search::see;
use crate::search::stack::SearchStack;
use crate::search::tt::{Bound, Entry, Tt};

// The cancellation flag and deadline are polled once per this many nodes.
const ABORT_CHECK_INTERVAL: u64 = 1024;

// Pruning margins are tuned configuration, not behavioral contracts; only
// the gating shape around them is.
const RAZOR_MARGIN: i32 = 520;
const RAZOR_MAX_DEPTH: i32 = 3;
const FUTILITY_BASE: i32 = 100;
const FUTILITY_IMPROVING: i32 = 50;
const FUTILITY_MAX_DEPTH: i32 = 8;
const NULL_MIN_DEPTH: i32 = 2;
const IID_MIN_DEPTH: i32 = 6;
const IID_REDUCTION: i32 = 4;
const SINGULAR_MIN_DEPTH: i32 = 8;
const LMP_BASE: i32 = 3;
const QSEARCH_SEE_MARGIN: i32 = -50;
const MULTICUT_REDUCTION: i32 = 3;
const EVAL_CACHE_MIN_DEPTH: i32 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum NodeType {
    Root,
    Pv,
    NonPv,
}

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SearchParams {
    pub depth: u32,
    pub max_nodes: Option<u64>,
    pub movetime: Option<Duration>,
    pub use_tt: bool,
    pub threads: usize,
    pub use_aspiration: bool,
    pub aspiration_window_cp: i32,
    pub use_nullmove: bool,
    pub use_lmr: bool,
    pub use_singular: bool,
    pub use_multicut: bool,
}

#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub bestmove: Option<String>,
    pub score_cp: i32,
    pub nodes: u64,
}

/// Per-worker counters; never shared between parallel search instances.
#[derive(Debug, Default, Clone, Copy)]
pub struct SearchStats {
    pub nodes: u64,
    pub beta_cutoffs: u64,
    pub first_move_cutoffs: u64,
    pub null_cutoffs: u64,
    pub tt_hits: u64,
}

impl SearchStats {
    pub fn branching_factor(&self) -> f64 {
        if self.beta_cutoffs == 0 {
            2.0
        } else {
            self.nodes as f64 / self.beta_cutoffs as f64
        }
    }
}

pub struct Searcher {
    tt: Arc<Tt>,
    history: History,
    stack: SearchStack,
    stats: SearchStats,
    // Static evals of expensive positions, aged by the table generation.
    eval_cache: HashMap<u64, (i32, u8)>,
    root_best: Option<Move>,
    node_limit: u64,
    deadline: Option<Instant>,
    abort: Option<Arc<AtomicBool>>,
    stopped: bool,
    threads: usize,
    use_nullmove: bool,
    use_lmr: bool,
    use_singular: bool,
    use_multicut: bool,
}

impl Default for Searcher {
    fn default() -> Self {
        let mut tt = Tt::new();
        tt.set_capacity_entries(4096);
        Self {
            tt: Arc::new(tt),
            history: History::new(),
            stack: SearchStack::new(),
            stats: SearchStats::default(),
            eval_cache: HashMap::new(),
            root_best: None,
            node_limit: u64::MAX,
            deadline: None,
            abort: None,
            stopped: false,
            threads: 1,
            use_nullmove: false,
            use_lmr: false,
            use_singular: false,
            use_multicut: false,
        }
    }
}

impl Searcher {
    pub fn set_tt_capacity_mb(&mut self, mb: usize) {
        self.tt = Arc::new(Tt::with_mb(mb));
    }

    pub fn set_abort(&mut self, flag: Arc<AtomicBool>) {
        self.abort = Some(flag);
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    pub fn get_threads(&self) -> usize {
        self.threads
    }

    pub fn tt_probe(&self, board: &Board) -> Option<Entry> {
        self.tt.probe(board.hash())
    }

    pub fn qsearch_eval_cp(&mut self, board: &Board) -> i32 {
        self.qsearch(board, -MATE_SCORE, MATE_SCORE, 0)
    }

    /// One full-window search at a fixed depth. The caller's board is left
    /// untouched on every path.
    pub fn search_depth(&mut self, board: &Board, depth: u32) -> SearchResult {
        self.tt.new_search();
        self.search_depth_window(board, depth, -MATE_SCORE, MATE_SCORE)
    }

    /// Fixed-depth search under an explicit window; fails soft, so the
    /// returned score may land outside `[alpha, beta)`.
    pub fn search_depth_window(&mut self, board: &Board, depth: u32, alpha: i32, beta: i32) -> SearchResult {
        self.stopped = false;
        let score = self.root_iteration(board, depth as i32, alpha, beta);
        SearchResult {
            bestmove: self.root_best.map(|m| format!("{}", m)),
            score_cp: score,
            nodes: self.stats.nodes,
        }
    }

    pub fn search_with_params(&mut self, board: &Board, params: SearchParams) -> SearchResult {
        self.stats = SearchStats::default();
        self.stopped = false;
        self.node_limit = params.max_nodes.unwrap_or(u64::MAX);
        if !params.use_tt {
            // Unallocated table: every probe misses, every store is a no-op.
            self.tt = Arc::new(Tt::new());
        }
        self.threads = params.threads.max(1);
        self.use_nullmove = params.use_nullmove;
        self.use_lmr = params.use_lmr;
        self.use_singular = params.use_singular;
        self.use_multicut = params.use_multicut;
        self.history.clear();
        self.eval_cache.clear();

        let limits = SearchLimits {
            depth: Some(params.depth),
            nodes: params.max_nodes,
            movetime: params.movetime,
        };
        let tm = TimeManager::new(&limits);
        self.deadline = tm.deadline();

        let mut best: Option<String> = None;
        let mut last_score = 0;
        for d in 1..=params.depth.max(1) {
            self.tt.new_search();
            let r = if self.threads > 1 && d > 1 {
                self.search_root_parallel(board, d)
            } else if params.use_aspiration && d > 1 {
                self.search_aspirated(board, last_score, d, params.aspiration_window_cp.max(10))
            } else {
                self.search_depth_window(board, d, -MATE_SCORE, MATE_SCORE)
            };
            if !self.stopped || d == 1 {
                best = r.bestmove.clone();
                last_score = r.score_cp;
                log::debug!(
                    "depth {} score {} nodes {} bf {:.2}",
                    d,
                    last_score,
                    self.stats.nodes,
                    self.stats.branching_factor()
                );
            }
            if self.stopped || tm.should_stop(&self.stats) {
                break;
            }
        }
        SearchResult { bestmove: best, score_cp: last_score, nodes: self.stats.nodes }
    }

    fn search_aspirated(&mut self, board: &Board, prev_score: i32, depth: u32, window_cp: i32) -> SearchResult {
        let mut window = AspirationWindow::with_window(prev_score, window_cp);
        loop {
            let r = self.search_depth_window(board, depth, window.alpha, window.beta);
            if self.stopped || window.accepts(r.score_cp) || window.exhausted() {
                return r;
            }
            if r.score_cp <= window.alpha {
                window.widen_down();
            } else {
                window.widen_up();
            }
        }
    }

    // Root split: every root move is searched full-window by an independent
    // worker; the shared table is the only cross-worker structure.
    fn search_root_parallel(&mut self, board: &Board, depth: u32) -> SearchResult {
        let tt_move = self.tt.probe(board.hash()).and_then(|e| e.best);
        let moves = self.ordered_moves(board, tt_move, 0);
        if moves.is_empty() {
            let score = if !board.checkers().is_empty() { mated_in(0) } else { DRAW_SCORE };
            return SearchResult { bestmove: None, score_cp: score, nodes: self.stats.nodes };
        }

        let shared_tt = self.tt.clone();
        let deadline = self.deadline;
        let abort = self.abort.clone();
        let use_nullmove = self.use_nullmove;
        let use_lmr = self.use_lmr;
        let use_singular = self.use_singular;
        let use_multicut = self.use_multicut;
        let results: Vec<(Move, i32, u64)> = moves
            .par_iter()
            .map(|&m| {
                let mut child = board.clone();
                child.play(m);
                let mut w = Searcher {
                    tt: shared_tt.clone(),
                    deadline,
                    abort: abort.clone(),
                    use_nullmove,
                    use_lmr,
                    use_singular,
                    use_multicut,
                    ..Searcher::default()
                };
                let score = -w.search(&child, NodeType::Pv, -MATE_SCORE, MATE_SCORE, depth as i32 - 1, 1, false);
                (m, score, w.stats.nodes)
            })
            .collect();

        let mut best: Option<(Move, i32)> = None;
        for (m, s, n) in results {
            self.stats.nodes += n;
            if best.map_or(true, |(_, bs)| s > bs) {
                best = Some((m, s));
            }
        }
        let (bm, score) = best.expect("non-empty move list");
        self.root_best = Some(bm);
        self.tt.store(board.hash(), score, VALUE_NONE, Some(bm), depth as i32, Bound::Exact);
        SearchResult { bestmove: Some(format!("{}", bm)), score_cp: score, nodes: self.stats.nodes }
    }

    fn root_iteration(&mut self, board: &Board, depth: i32, alpha: i32, beta: i32) -> i32 {
        self.root_best = None;
        self.stack.clear();
        self.search(board, NodeType::Root, alpha, beta, depth, 0, false)
    }

    fn poll_abort(&mut self) {
        if self.stats.nodes % ABORT_CHECK_INTERVAL != 0 {
            return;
        }
        if let Some(ref flag) = self.abort {
            if flag.load(Ordering::Relaxed) {
                self.stopped = true;
            }
        }
        if let Some(dl) = self.deadline {
            if Instant::now() >= dl {
                self.stopped = true;
            }
        }
        if self.stats.nodes >= self.node_limit {
            self.stopped = true;
        }
    }

    fn search(
        &mut self,
        board: &Board,
        node: NodeType,
        mut alpha: i32,
        mut beta: i32,
        depth: i32,
        ply: usize,
        cut_node: bool,
    ) -> i32 {
        debug_assert!(alpha < beta, "inverted window");
        let root = node == NodeType::Root;
        let pv = node != NodeType::NonPv;

        if depth <= 0 {
            return self.qsearch(board, alpha, beta, ply);
        }

        self.stats.nodes += 1;
        self.poll_abort();
        if self.stopped {
            return eval_cp(board);
        }
        if ply >= MAX_PLY - 2 {
            return eval_cp(board);
        }

        // Mate-distance clamp: neither bound can beat the fastest mate still
        // reachable from this ply. A collapsed window is a pruned result and
        // is never stored.
        if !root {
            alpha = alpha.max(mated_in(ply));
            beta = beta.min(mate_in(ply + 1));
            if alpha >= beta {
                return alpha;
            }
        }

        let key = board.hash();
        let excluded = self.stack[ply].excluded;
        let mut tt_entry = if excluded.is_none() { self.tt.probe(key) } else { None };
        if tt_entry.is_some() {
            self.stats.tt_hits += 1;
        }

        if !pv {
            if let Some(e) = tt_entry {
                if e.depth >= depth && tt_cutoff(&e, alpha, beta) {
                    return e.value;
                }
            }
        }

        let in_check = !board.checkers().is_empty();
        let eval = if in_check { VALUE_NONE } else { self.cached_eval(board, key) };
        self.stack[ply].static_eval = eval;
        let improving = !in_check && ply >= 2 && {
            let prev = self.stack[ply - 2].static_eval;
            prev != VALUE_NONE && eval > prev
        };

        if !pv && !in_check && excluded.is_none() {
            // Razoring: hopeless eval at shallow depth drops straight into
            // quiescence instead of a full subtree.
            if depth < RAZOR_MAX_DEPTH && eval < alpha - RAZOR_MARGIN - 100 * depth {
                return self.qsearch(board, alpha, beta, ply);
            }

            // Futility: the margin cannot lift a quiet node back above alpha.
            let futility = FUTILITY_BASE * depth - if improving { FUTILITY_IMPROVING } else { 0 };
            if depth < FUTILITY_MAX_DEPTH && eval + futility <= alpha {
                return eval;
            }

            // Null move: hand the opponent a free shot; if the reduced reply
            // still cannot reach beta, the real position will not either.
            // Unsound without non-pawn material, so gated on it.
            if self.use_nullmove
                && depth >= NULL_MIN_DEPTH
                && eval >= beta
                && non_pawn_material(board, board.side_to_move()) > 0
            {
                if let Some(nulled) = board.null_move() {
                    let r = 3 + depth / 4 + ((eval - beta) / 200).min(3);
                    self.stack[ply].current_move = None;
                    let null_value =
                        -self.search(&nulled, NodeType::NonPv, -beta, -beta + 1, depth - r, ply + 1, !cut_node);
                    if !self.stopped && null_value >= beta {
                        self.stats.null_cutoffs += 1;
                        // Unverified mate scores from a null search are not
                        // trusted beyond the bound itself.
                        return if null_value >= MATE_BOUND { beta } else { null_value };
                    }
                }
            }
        }

        let mut tt_move = tt_entry.and_then(|e| e.best);

        // Internal iterative deepening: a PV node with no ordering hint runs
        // a shallower search purely to seed one, then re-probes.
        if pv && depth >= IID_MIN_DEPTH && tt_move.is_none() && excluded.is_none() {
            self.search(board, node, alpha, beta, depth - IID_REDUCTION, ply, cut_node);
            if self.stopped {
                return eval_cp(board);
            }
            if let Some(e) = self.tt.probe(key) {
                tt_move = e.best;
                tt_entry = Some(e);
            }
        }

        let moves = self.ordered_moves(board, tt_move, ply);
        // A stored move can come from a colliding or stale entry; it only
        // counts once it matches an actually-legal candidate.
        let tt_move = tt_move.filter(|m| moves.contains(m));

        // Multi-cut: at an expected cut node, cheap reduced probes over the
        // first few candidates; enough fail-highs prune the node at beta.
        if self.use_multicut
            && !pv
            && cut_node
            && !in_check
            && excluded.is_none()
            && depth >= multicut::MIN_DEPTH
            && moves.len() >= multicut::MIN_MOVES
        {
            let probe_depth = (depth - 1 - MULTICUT_REDUCTION).max(1);
            let mut tried = 0usize;
            let mut cutoffs = 0usize;
            for &m in moves.iter().take(multicut::MIN_MOVES) {
                let mut child = board.clone();
                child.play(m);
                tried += 1;
                let v = -self.search(&child, NodeType::NonPv, -beta, -beta + 1, probe_depth, ply + 1, false);
                if self.stopped {
                    break;
                }
                if v >= beta {
                    cutoffs += 1;
                    if multicut::should_multi_cut(depth, tried, cutoffs) {
                        return beta;
                    }
                }
            }
        }

        let stm = board.side_to_move();
        let enemy = board.colors(opponent(stm));
        let original_alpha = alpha;
        let mut best_value = -MATE_SCORE;
        let mut best_move: Option<Move> = None;
        let mut move_count = 0usize;
        let mut tried_quiets: Vec<Move> = Vec::new();
        let lmp_threshold = LMP_BASE + depth * depth + if improving { depth } else { 0 };

        for &m in &moves {
            if Some(m) == excluded {
                continue;
            }
            move_count += 1;
            let is_quiet = !(enemy.has(m.to) || m.promotion.is_some());

            // Late move pruning: past a quadratically growing count, quiet
            // candidates are no longer worth a subtree.
            if !pv && !in_check && is_quiet && move_count as i32 > lmp_threshold {
                continue;
            }

            // Singular extension: verify no sibling comes close to the TT
            // move's score; a uniquely best move earns an extra ply.
            let mut extension = 0;
            if self.use_singular
                && !root
                && depth >= SINGULAR_MIN_DEPTH
                && Some(m) == tt_move
                && excluded.is_none()
            {
                if let Some(e) = tt_entry {
                    if e.bound != Bound::Upper && e.depth >= depth - 3 && e.value.abs() < MATE_BOUND {
                        let singular_beta = e.value - 2 * depth;
                        self.stack[ply].excluded = Some(m);
                        let v = self.search(
                            board,
                            NodeType::NonPv,
                            singular_beta - 1,
                            singular_beta,
                            (depth - 1) / 2,
                            ply,
                            cut_node,
                        );
                        self.stack[ply].excluded = None;
                        if v < singular_beta {
                            extension = 1;
                        }
                    }
                }
            }

            // Late move reduction for quiet candidates, shrunk by PV status,
            // an improving eval and a good history record.
            let mut reduction = 0;
            if self.use_lmr && depth >= 3 && move_count > 1 && is_quiet {
                reduction = 1 + depth / 8 + move_count as i32 / 16;
                if pv {
                    reduction -= 1;
                }
                if improving {
                    reduction -= 1;
                }
                reduction -= self.history.history_score(stm, m) / 8192;
                reduction = reduction.clamp(0, depth - 1);
            }

            let mut child = board.clone();
            child.play(m);
            self.stack[ply].current_move = Some(m);
            let new_depth = depth - 1 + extension;

            let value = if move_count == 1 {
                let child_node = if pv { NodeType::Pv } else { NodeType::NonPv };
                -self.search(&child, child_node, -beta, -alpha, new_depth, ply + 1, false)
            } else {
                // Scout at reduced depth; escalation restores depth first,
                // then the window, never more than those two steps.
                let mut v =
                    -self.search(&child, NodeType::NonPv, -alpha - 1, -alpha, new_depth - reduction, ply + 1, true);
                if v > alpha && reduction > 0 {
                    v = -self.search(&child, NodeType::NonPv, -alpha - 1, -alpha, new_depth, ply + 1, !cut_node);
                }
                if v > alpha && v < beta && pv {
                    v = -self.search(&child, NodeType::Pv, -beta, -alpha, new_depth, ply + 1, false);
                }
                v
            };

            if self.stopped {
                return best_value;
            }

            if value > best_value {
                best_value = value;
                best_move = Some(m);
                if root {
                    self.root_best = Some(m);
                }
                if value > alpha {
                    alpha = value;
                    if value >= beta {
                        self.stats.beta_cutoffs += 1;
                        if move_count == 1 {
                            self.stats.first_move_cutoffs += 1;
                        }
                        if is_quiet {
                            self.history.update_killer(ply, m);
                            self.history.update_history(stm, m, depth, true);
                            for &q in &tried_quiets {
                                self.history.update_history(stm, q, depth, false);
                            }
                        }
                        break;
                    }
                }
            }
            if is_quiet {
                tried_quiets.push(m);
                self.history.update_butterfly(stm, m, depth);
            }
        }

        if move_count == 0 {
            return if excluded.is_some() {
                alpha
            } else if in_check {
                mated_in(ply)
            } else {
                DRAW_SCORE
            };
        }

        let bound = if best_value >= beta {
            Bound::Lower
        } else if best_value <= original_alpha {
            Bound::Upper
        } else {
            Bound::Exact
        };
        if excluded.is_none() && !self.stopped {
            self.tt.store(key, best_value, eval, best_move, depth, bound);
            if !in_check && depth >= EVAL_CACHE_MIN_DEPTH {
                self.eval_cache.insert(key, (eval, self.tt.generation()));
            }
        }
        best_value
    }

    // Horizon stabilizer: tactical moves only, with the static eval as a
    // stand-pat floor since the mover may always decline further tactics.
    fn qsearch(&mut self, board: &Board, mut alpha: i32, beta: i32, ply: usize) -> i32 {
        self.stats.nodes += 1;
        self.poll_abort();
        if self.stopped {
            return eval_cp(board);
        }

        let in_check = !board.checkers().is_empty();
        let mut best = if in_check { -MATE_SCORE } else { eval_cp(board) };
        if !in_check {
            if best >= beta {
                return best;
            }
            if best > alpha {
                alpha = best;
            }
        }
        if ply >= MAX_PLY - 2 {
            return if in_check { eval_cp(board) } else { best };
        }

        let moves = self.qsearch_moves(board, in_check);
        if in_check && moves.is_empty() {
            return mated_in(ply);
        }
        for &m in &moves {
            // Skip exchanges that lose material outright.
            if !in_check && !see::see_ge(board, m, QSEARCH_SEE_MARGIN) {
                continue;
            }
            let mut child = board.clone();
            child.play(m);
            let v = -self.qsearch(&child, -beta, -alpha, ply + 1);
            if v > best {
                best = v;
                if v > alpha {
                    alpha = v;
                    if v >= beta {
                        break;
                    }
                }
            }
        }
        best
    }

    fn qsearch_moves(&self, board: &Board, in_check: bool) -> Vec<Move> {
        let mut moves = Vec::with_capacity(32);
        if in_check {
            // Every evasion; mate detection needs the full set.
            board.generate_moves(|ml| {
                moves.extend(ml);
                false
            });
            return moves;
        }
        let targets = board.colors(opponent(board.side_to_move()));
        board.generate_moves(|ml| {
            for m in ml {
                if targets.has(m.to) || m.promotion.is_some() {
                    moves.push(m);
                }
            }
            false
        });
        moves.sort_by_key(|&m| -see::see(board, m));
        moves
    }

    // Priority order: TT move, captures by SEE, promotions, killers, then
    // quiets by their history and butterfly records.
    fn ordered_moves(&self, board: &Board, tt_move: Option<Move>, ply: usize) -> Vec<Move> {
        let mut moves = Vec::with_capacity(64);
        board.generate_moves(|ml| {
            moves.extend(ml);
            false
        });
        let stm = board.side_to_move();
        let enemy = board.colors(opponent(stm));
        moves.sort_by_key(|&m| {
            let score = if Some(m) == tt_move {
                1_000_000
            } else if enemy.has(m.to) {
                100_000 + see::see(board, m)
            } else if m.promotion.is_some() {
                90_000
            } else {
                let k = self.history.killer_bonus(ply, m);
                if k > 0 {
                    80_000 + k
                } else {
                    self.history.history_score(stm, m) + self.history.butterfly_score(stm, m)
                }
            };
            -score
        });
        moves
    }

    fn cached_eval(&mut self, board: &Board, key: u64) -> i32 {
        let gen = self.tt.generation();
        if let Some(&(v, age)) = self.eval_cache.get(&key) {
            if age == gen {
                return v;
            }
        }
        eval_cp(board)
    }
}

fn tt_cutoff(e: &Entry, alpha: i32, beta: i32) -> bool {
    match e.bound {
        Bound::Lower => e.value >= beta,
        Bound::Upper => e.value <= alpha,
        Bound::Exact => true,
    }
}
