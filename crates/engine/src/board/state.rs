use crate::error::EngineError;
use crate::types::*;

use super::Board;

impl Board {
    /// Validates and plays a move.
    pub fn try_make_move(&mut self, mv: Move) -> Result<GameMove, EngineError> {
        if self.is_game_over() {
            return Err(EngineError::GameOver);
        }
        if !self.is_valid_move(mv) {
            return Err(EngineError::IllegalMove(mv));
        }
        Ok(self.make_move_unchecked(mv))
    }

    /// Plays a move that the caller already knows to be legal, typically one
    /// taken straight from `get_all_legal_moves`.
    pub fn make_move_unchecked(&mut self, mv: Move) -> GameMove {
        let moving_piece = self.get_piece(mv.from);
        let color = piece_color(moving_piece);
        let moving_type = piece_type(moving_piece);

        let is_en_passant = moving_type == PAWN
            && Some(mv.to) == self.en_passant_target
            && mv.from.file() != mv.to.file()
            && is_empty(self.get_piece(mv.to));
        let is_castling = moving_type == KING && mv.from.file().abs_diff(mv.to.file()) == 2;

        let captured_square = if is_en_passant {
            Square::new(mv.to.file(), mv.from.rank())
        } else {
            mv.to
        };
        let captured_piece = self.get_piece(captured_square);

        let game_move = GameMove {
            mv,
            moved_piece: moving_piece,
            captured_piece,
            captured_square,
            is_castling,
            is_en_passant,
            prev_castling_rights: self.castling_rights,
            prev_en_passant: self.en_passant_target,
            prev_half_move_clock: self.half_move_clock,
            prev_full_move_number: self.full_move_number,
        };

        self.set_piece(captured_square, EMPTY);
        if is_castling {
            let (rook_from, rook_to) = castling_rook_squares(mv);
            let rook = self.get_piece(rook_from);
            self.set_piece(rook_from, EMPTY);
            self.set_piece(rook_to, rook);
        }

        let placed = match mv.promotion {
            Some(promotion) => make_piece(promotion, color),
            None => moving_piece,
        };
        self.set_piece(mv.from, EMPTY);
        self.set_piece(mv.to, placed);

        self.update_castling_rights(mv, moving_piece);

        self.en_passant_target = if moving_type == PAWN && mv.from.rank().abs_diff(mv.to.rank()) == 2 {
            Some(Square::new(mv.from.file(), (mv.from.rank() + mv.to.rank()) / 2))
        } else {
            None
        };

        if moving_type == PAWN || !is_empty(captured_piece) {
            self.half_move_clock = 0;
        } else {
            self.half_move_clock = self.half_move_clock.saturating_add(1);
        }
        if color == BLACK {
            self.full_move_number = self.full_move_number.saturating_add(1);
        }
        self.current_turn = opposite_color(self.current_turn);

        self.move_history.push(game_move.clone());
        let key = self.position_key();
        self.position_keys.push(key);

        game_move
    }

    /// Takes back the last move, restoring every piece of state it touched.
    pub fn undo_move(&mut self) -> Result<GameMove, EngineError> {
        let game_move = self.move_history.pop().ok_or(EngineError::NothingToUndo)?;
        self.position_keys.pop();

        let mv = game_move.mv;
        self.current_turn = opposite_color(self.current_turn);

        self.set_piece(mv.to, EMPTY);
        self.set_piece(mv.from, game_move.moved_piece);
        self.set_piece(game_move.captured_square, game_move.captured_piece);

        if game_move.is_castling {
            let (rook_from, rook_to) = castling_rook_squares(mv);
            let rook = self.get_piece(rook_to);
            self.set_piece(rook_to, EMPTY);
            self.set_piece(rook_from, rook);
        }

        self.castling_rights = game_move.prev_castling_rights;
        self.en_passant_target = game_move.prev_en_passant;
        self.half_move_clock = game_move.prev_half_move_clock;
        self.full_move_number = game_move.prev_full_move_number;

        Ok(game_move)
    }

    fn update_castling_rights(&mut self, mv: Move, moving_piece: Piece) {
        if piece_type(moving_piece) == KING {
            let rights = if piece_color(moving_piece) == WHITE {
                WHITE_KINGSIDE | WHITE_QUEENSIDE
            } else {
                BLACK_KINGSIDE | BLACK_QUEENSIDE
            };
            remove_castling_right(&mut self.castling_rights, rights);
        }

        // A rook leaving or being captured on its corner loses that side.
        for square in [mv.from, mv.to] {
            let right = match (square.file(), square.rank()) {
                (0, 0) => WHITE_QUEENSIDE,
                (7, 0) => WHITE_KINGSIDE,
                (0, 7) => BLACK_QUEENSIDE,
                (7, 7) => BLACK_KINGSIDE,
                _ => continue,
            };
            remove_castling_right(&mut self.castling_rights, right);
        }
    }
}

fn castling_rook_squares(mv: Move) -> (Square, Square) {
    let rank = mv.from.rank();
    if mv.to.file() == 6 {
        (Square::new(7, rank), Square::new(5, rank))
    } else {
        (Square::new(0, rank), Square::new(3, rank))
    }
}
