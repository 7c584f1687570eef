use crate::evaluation::evaluate;
use crate::oracle::PositionOracle;
use crate::types::*;

/// Depth-bounded minimax with alpha-beta pruning.
///
/// White is the maximizing side. The engine borrows the position for the
/// whole search and hands it back exactly as it found it.
#[derive(Debug, Clone, Default)]
pub struct SearchEngine {
    config: SearchConfig,
    stats: SearchStats,
}

impl SearchEngine {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            stats: SearchStats::default(),
        }
    }

    /// Best move for the side to move, or `None` when it has no legal move.
    ///
    /// `maximizing` must be true exactly when White is to move. Nothing checks
    /// it against the position, and `TerminalScoring::MateAware` takes the
    /// mated side from it, so a wrong flag flips the sign of every mate score.
    pub fn select_move<P: PositionOracle>(&mut self, position: &mut P, depth: u32, maximizing: bool) -> Option<P::Move> {
        self.search(position, depth, maximizing).best_move
    }

    /// Searches with the configured depth.
    pub fn search_default<P: PositionOracle>(&mut self, position: &mut P, maximizing: bool) -> SearchResult<P::Move> {
        self.search(position, self.config.depth, maximizing)
    }

    /// Full result of a search. Same contract for `maximizing` as
    /// [`select_move`](Self::select_move).
    pub fn search<P: PositionOracle>(&mut self, position: &mut P, depth: u32, maximizing: bool) -> SearchResult<P::Move> {
        self.stats = SearchStats::default();
        let depth = clamp_depth(depth);

        let (best_move, score) = self.search_root(position, depth, maximizing);

        log::debug!(
            "depth {} best {} score {} nodes {} cutoffs {}",
            depth,
            best_move.map(|mv| mv.to_string()).unwrap_or_else(|| "none".into()),
            score,
            self.stats.nodes,
            self.stats.cutoffs
        );

        SearchResult {
            best_move,
            score,
            depth,
            stats: self.stats,
        }
    }

    fn search_root<P: PositionOracle>(&mut self, position: &mut P, depth: u32, maximizing: bool) -> (Option<P::Move>, Score) {
        self.stats.nodes += 1;

        let moves = self.ordered_moves(position);
        if moves.is_empty() {
            self.stats.leaves += 1;
            return (None, self.leaf_score(position, maximizing, 0));
        }

        let mut best_move = None;
        let mut best_score = worst_for(maximizing);
        let mut alpha = Score::MIN;
        let mut beta = Score::MAX;

        for mv in moves {
            let score = self.search_child(position, mv, depth - 1, !maximizing, alpha, beta, 1);

            if log::log_enabled!(log::Level::Trace) {
                log::trace!("root {} scored {} (a {}, b {})", mv, score, alpha, beta);
            }

            // strict comparison keeps the first of equally good moves
            let improved = if maximizing { score > best_score } else { score < best_score };
            if improved || best_move.is_none() {
                best_score = score;
                best_move = Some(mv);
            }

            if self.config.pruning {
                if maximizing {
                    alpha = alpha.max(best_score);
                } else {
                    beta = beta.min(best_score);
                }
            }
        }

        (best_move, best_score)
    }

    fn minimax<P: PositionOracle>(
        &mut self,
        position: &mut P,
        depth: u32,
        maximizing: bool,
        mut alpha: Score,
        mut beta: Score,
        ply: u32,
    ) -> Score {
        self.stats.nodes += 1;

        if depth == 0 || position.is_game_over() {
            self.stats.leaves += 1;
            return self.leaf_score(position, maximizing, ply);
        }

        let moves = self.ordered_moves(position);
        if moves.is_empty() {
            self.stats.leaves += 1;
            return self.leaf_score(position, maximizing, ply);
        }

        let mut best_score = worst_for(maximizing);
        let move_count = moves.len();

        for (index, mv) in moves.into_iter().enumerate() {
            let score = self.search_child(position, mv, depth - 1, !maximizing, alpha, beta, ply + 1);

            if maximizing {
                best_score = best_score.max(score);
            } else {
                best_score = best_score.min(score);
            }

            if !self.config.pruning {
                continue;
            }
            if maximizing {
                alpha = alpha.max(best_score);
            } else {
                beta = beta.min(best_score);
            }
            if beta <= alpha {
                self.stats.cutoffs += 1;
                if log::log_enabled!(log::Level::Trace) {
                    log::trace!(
                        "{:indent$}cutoff after {} at ply {}, skipped {}",
                        "",
                        mv,
                        ply,
                        move_count - index - 1,
                        indent = ply as usize * 2
                    );
                }
                break;
            }
        }

        best_score
    }

    /// Applies `mv`, searches below it and takes it back again.
    #[allow(clippy::too_many_arguments)]
    fn search_child<P: PositionOracle>(
        &mut self,
        position: &mut P,
        mv: P::Move,
        depth: u32,
        maximizing: bool,
        alpha: Score,
        beta: Score,
        ply: u32,
    ) -> Score {
        position.apply(mv);
        let score = self.minimax(position, depth, maximizing, alpha, beta, ply);
        let undone = position.undo();

        // A mismatch here means every later result would be computed on a
        // corrupted position.
        assert!(
            undone == Some(mv),
            "search invariant violated: applied {mv} but undo returned {undone:?}"
        );
        score
    }

    fn ordered_moves<P: PositionOracle>(&self, position: &P) -> Vec<P::Move> {
        let mut moves = position.legal_moves();
        if self.config.ordering == MoveOrdering::CapturesFirst {
            // sort_by_key is stable, so native order survives within each group
            moves.sort_by_key(|&mv| !position.is_capture(mv));
        }
        moves
    }

    fn leaf_score<P: PositionOracle>(&self, position: &P, maximizing: bool, ply: u32) -> Score {
        match self.config.terminal {
            TerminalScoring::Material => evaluate(position),
            TerminalScoring::MateAware => {
                if position.is_checkmate() {
                    // the side to move is mated
                    let mate = MATE_SCORE - ply as Score;
                    if maximizing {
                        -mate
                    } else {
                        mate
                    }
                } else if position.is_game_over() {
                    DRAW_SCORE
                } else {
                    evaluate(position)
                }
            }
        }
    }
}

fn worst_for(maximizing: bool) -> Score {
    if maximizing {
        Score::MIN
    } else {
        Score::MAX
    }
}

fn clamp_depth(depth: u32) -> u32 {
    let clamped = depth.clamp(1, MAX_DEPTH);
    if clamped != depth {
        log::warn!("search depth {depth} out of range, using {clamped}");
    }
    clamped
}
