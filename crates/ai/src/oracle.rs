use std::fmt;

use engine::{is_empty, piece_type, Board, Move, Piece, PAWN};

/// What the search needs from a rules engine: enumerate, apply and take back
/// moves, and say when the game is over.
///
/// Implementations own all legality. The search only ever applies moves it
/// got from `legal_moves` on the same position, and undoes them in reverse
/// order before returning.
pub trait PositionOracle {
    type Move: Copy + PartialEq + fmt::Debug + fmt::Display;

    fn legal_moves(&self) -> Vec<Self::Move>;

    fn apply(&mut self, mv: Self::Move);

    /// Takes back the most recent move and returns it, `None` when there is
    /// nothing to take back.
    fn undo(&mut self) -> Option<Self::Move>;

    fn is_game_over(&self) -> bool;
    fn is_check(&self) -> bool;
    fn is_checkmate(&self) -> bool;
    fn is_stalemate(&self) -> bool;

    /// Every piece currently on the board, in any order.
    fn occupied_pieces(&self) -> Vec<Piece>;

    /// Used by `MoveOrdering::CapturesFirst`.
    fn is_capture(&self, _mv: Self::Move) -> bool {
        false
    }
}

impl PositionOracle for Board {
    type Move = Move;

    fn legal_moves(&self) -> Vec<Move> {
        self.get_all_legal_moves()
    }

    fn apply(&mut self, mv: Move) {
        self.make_move_unchecked(mv);
    }

    fn undo(&mut self) -> Option<Move> {
        self.undo_move().ok().map(|game_move| game_move.mv)
    }

    fn is_game_over(&self) -> bool {
        Board::is_game_over(self)
    }

    fn is_check(&self) -> bool {
        self.is_in_check()
    }

    fn is_checkmate(&self) -> bool {
        Board::is_checkmate(self)
    }

    fn is_stalemate(&self) -> bool {
        Board::is_stalemate(self)
    }

    fn occupied_pieces(&self) -> Vec<Piece> {
        self.pieces().map(|(_, piece)| piece).collect()
    }

    fn is_capture(&self, mv: Move) -> bool {
        if !is_empty(self.get_piece(mv.to)) {
            return true;
        }
        // en passant lands on an empty square
        piece_type(self.get_piece(mv.from)) == PAWN && mv.from.file() != mv.to.file()
    }
}
