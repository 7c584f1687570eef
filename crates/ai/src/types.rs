/// Material balance in pawn units, positive favours White.
pub type Score = i32;

/// Piece values in pawn units, indexed by piece type.
pub const PIECE_VALUES: [Score; 7] = [
    0, // Empty
    1, // Pawn
    3, // Knight
    3, // Bishop
    5, // Rook
    9, // Queen
    0, // King
];

/// Checkmate score used by `TerminalScoring::MateAware`. Far above any
/// material total so a forced mate always dominates.
pub const MATE_SCORE: Score = 10_000;
pub const DRAW_SCORE: Score = 0;

/// Maximum search depth
pub const MAX_DEPTH: u32 = 8;

/// Order in which children are expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MoveOrdering {
    /// The position's own enumeration order.
    #[default]
    Native,
    /// Captures before quiet moves, native order within each group.
    CapturesFirst,
}

/// How game-over positions are scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TerminalScoring {
    /// Same material count as a depth-limited leaf.
    #[default]
    Material,
    /// Checkmate is worth `MATE_SCORE - ply` to the winner, stalemate is a draw.
    MateAware,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    pub depth: u32,
    pub ordering: MoveOrdering,
    pub pruning: bool,
    pub terminal: TerminalScoring,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            depth: 2,
            ordering: MoveOrdering::Native,
            pruning: true,
            terminal: TerminalScoring::Material,
        }
    }
}

impl SearchConfig {
    /// Same config searched at one of the 1-4 difficulty levels offered to
    /// players.
    pub fn with_difficulty(self, level: u32) -> Self {
        Self {
            depth: level.clamp(1, 4),
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
    pub leaves: u64,
    pub cutoffs: u64,
}

/// Search result containing best move and evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult<M> {
    pub best_move: Option<M>,
    pub score: Score,
    pub depth: u32,
    pub stats: SearchStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_sets_only_the_depth() {
        let tuned = SearchConfig {
            ordering: MoveOrdering::CapturesFirst,
            terminal: TerminalScoring::MateAware,
            ..SearchConfig::default()
        };

        let config = tuned.with_difficulty(3);
        assert_eq!(config.depth, 3);
        assert_eq!(config.ordering, MoveOrdering::CapturesFirst);
        assert_eq!(config.terminal, TerminalScoring::MateAware);

        assert_eq!(tuned.with_difficulty(0).depth, 1);
        assert_eq!(tuned.with_difficulty(9).depth, 4);
    }
}
