use crate::types::*;

use super::validation::{find_king_in, is_attacked, DIAGONALS, KING_OFFSETS, KNIGHT_OFFSETS, ORTHOGONALS};
use super::Board;

const PROMOTION_PIECES: [u8; 4] = [QUEEN, ROOK, BISHOP, KNIGHT];

impl Board {
    /// Every legal move for the side to move. Origins are visited a1..h8 and
    /// each piece emits its moves in a fixed order, so the sequence is
    /// stable for a given position.
    pub fn get_all_legal_moves(&self) -> Vec<Move> {
        let mut moves = Vec::with_capacity(48);
        for index in 0..64u8 {
            let square = Square(index);
            if is_piece_color(self.get_piece(square), self.current_turn) {
                self.push_pseudo_legal_moves(square, &mut moves);
            }
        }
        moves.retain(|&mv| self.leaves_king_safe(mv));
        moves
    }

    /// Destinations reachable from `square` by the side to move.
    pub fn get_legal_moves(&self, square: Square) -> Vec<Square> {
        if !is_piece_color(self.get_piece(square), self.current_turn) {
            return Vec::new();
        }

        let mut moves = Vec::new();
        self.push_pseudo_legal_moves(square, &mut moves);

        let mut targets: Vec<Square> = Vec::with_capacity(moves.len());
        for mv in moves.into_iter().filter(|&mv| self.leaves_king_safe(mv)) {
            if !targets.contains(&mv.to) {
                targets.push(mv.to);
            }
        }
        targets
    }

    /// Stops at the first legal move found.
    pub fn can_player_move(&self) -> bool {
        let mut moves = Vec::with_capacity(32);
        for index in 0..64u8 {
            let square = Square(index);
            if is_piece_color(self.get_piece(square), self.current_turn) {
                moves.clear();
                self.push_pseudo_legal_moves(square, &mut moves);
                if moves.iter().any(|&mv| self.leaves_king_safe(mv)) {
                    return true;
                }
            }
        }
        false
    }

    fn push_pseudo_legal_moves(&self, square: Square, moves: &mut Vec<Move>) {
        let piece = self.get_piece(square);
        let color = piece_color(piece);

        match piece_type(piece) {
            PAWN => self.push_pawn_moves(square, color, moves),
            KNIGHT => self.push_step_moves(square, color, &KNIGHT_OFFSETS, moves),
            BISHOP => self.push_sliding_moves(square, color, &DIAGONALS, moves),
            ROOK => self.push_sliding_moves(square, color, &ORTHOGONALS, moves),
            QUEEN => {
                self.push_sliding_moves(square, color, &DIAGONALS, moves);
                self.push_sliding_moves(square, color, &ORTHOGONALS, moves);
            }
            KING => {
                self.push_step_moves(square, color, &KING_OFFSETS, moves);
                self.push_castling_moves(square, color, moves);
            }
            _ => {}
        }
    }

    fn push_pawn_moves(&self, square: Square, color: u8, moves: &mut Vec<Move>) {
        let (dr, start_rank, promotion_rank, en_passant_rank) =
            if color == WHITE { (1, 1, 7, 5) } else { (-1, 6, 0, 2) };

        let mut push = |to: Square| {
            if to.rank() == promotion_rank {
                for piece_type in PROMOTION_PIECES {
                    moves.push(Move::with_promotion(square, to, piece_type));
                }
            } else {
                moves.push(Move::new(square, to));
            }
        };

        if let Some(one_step) = square.offset(0, dr) {
            if is_empty(self.get_piece(one_step)) {
                push(one_step);
                if square.rank() == start_rank {
                    if let Some(two_step) = one_step.offset(0, dr) {
                        if is_empty(self.get_piece(two_step)) {
                            push(two_step);
                        }
                    }
                }
            }
        }

        for df in [-1, 1] {
            if let Some(target) = square.offset(df, dr) {
                let victim = self.get_piece(target);
                let captures_enemy = is_piece_color(victim, opposite_color(color));
                let en_passant = Some(target) == self.en_passant_target && target.rank() == en_passant_rank;
                if captures_enemy || en_passant {
                    push(target);
                }
            }
        }
    }

    fn push_step_moves(&self, square: Square, color: u8, offsets: &[(i8, i8)], moves: &mut Vec<Move>) {
        for &(df, dr) in offsets {
            if let Some(target) = square.offset(df, dr) {
                if !is_piece_color(self.get_piece(target), color) {
                    moves.push(Move::new(square, target));
                }
            }
        }
    }

    fn push_sliding_moves(&self, square: Square, color: u8, directions: &[(i8, i8)], moves: &mut Vec<Move>) {
        for &(df, dr) in directions {
            let mut current = square;
            while let Some(target) = current.offset(df, dr) {
                let piece = self.get_piece(target);
                if is_piece_color(piece, color) {
                    break;
                }
                moves.push(Move::new(square, target));
                if !is_empty(piece) {
                    break;
                }
                current = target;
            }
        }
    }

    fn push_castling_moves(&self, square: Square, color: u8, moves: &mut Vec<Move>) {
        let back_rank = if color == WHITE { 0 } else { 7 };
        if square != Square::new(4, back_rank) {
            return;
        }

        let enemy = opposite_color(color);
        let (kingside, queenside) = if color == WHITE {
            (WHITE_KINGSIDE, WHITE_QUEENSIDE)
        } else {
            (BLACK_KINGSIDE, BLACK_QUEENSIDE)
        };
        if get_castling_rights_for_color(self.castling_rights, color) == 0 || self.is_under_threat(square, enemy) {
            return;
        }

        let rook = make_piece(ROOK, color);
        let empty = |file: u8| is_empty(self.get_piece(Square::new(file, back_rank)));
        let safe = |file: u8| !self.is_under_threat(Square::new(file, back_rank), enemy);

        if has_castling_right(self.castling_rights, kingside)
            && self.get_piece(Square::new(7, back_rank)) == rook
            && empty(5)
            && empty(6)
            && safe(5)
        {
            moves.push(Move::new(square, Square::new(6, back_rank)));
        }

        if has_castling_right(self.castling_rights, queenside)
            && self.get_piece(Square::new(0, back_rank)) == rook
            && empty(1)
            && empty(2)
            && empty(3)
            && safe(3)
        {
            moves.push(Move::new(square, Square::new(2, back_rank)));
        }
    }

    /// Plays `mv` on a scratch copy of the placement and checks that the
    /// mover's king is not left attacked.
    fn leaves_king_safe(&self, mv: Move) -> bool {
        let mut squares = self.squares;
        let moving = squares[mv.from.index()];
        let color = piece_color(moving);

        if piece_type(moving) == PAWN
            && Some(mv.to) == self.en_passant_target
            && mv.from.file() != mv.to.file()
            && is_empty(squares[mv.to.index()])
        {
            squares[Square::new(mv.to.file(), mv.from.rank()).index()] = EMPTY;
        }
        if piece_type(moving) == KING && mv.from.file().abs_diff(mv.to.file()) == 2 {
            let rank = mv.from.rank();
            let (rook_from, rook_to) = if mv.to.file() == 6 { (7, 5) } else { (0, 3) };
            squares[Square::new(rook_to, rank).index()] = squares[Square::new(rook_from, rank).index()];
            squares[Square::new(rook_from, rank).index()] = EMPTY;
        }

        squares[mv.to.index()] = moving;
        squares[mv.from.index()] = EMPTY;

        let king_square = if piece_type(moving) == KING {
            Some(mv.to)
        } else {
            find_king_in(&squares, color)
        };

        match king_square {
            Some(king_square) => !is_attacked(&squares, king_square, opposite_color(color)),
            None => true,
        }
    }
}
