use crate::types::*;

use super::Board;

pub(crate) const KNIGHT_OFFSETS: [(i8, i8); 8] =
    [(1, 2), (2, 1), (2, -1), (1, -2), (-1, -2), (-2, -1), (-2, 1), (-1, 2)];
pub(crate) const KING_OFFSETS: [(i8, i8); 8] =
    [(1, 0), (1, 1), (0, 1), (-1, 1), (-1, 0), (-1, -1), (0, -1), (1, -1)];
pub(crate) const DIAGONALS: [(i8, i8); 4] = [(1, 1), (-1, 1), (-1, -1), (1, -1)];
pub(crate) const ORTHOGONALS: [(i8, i8); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];

/// True when any piece of `by_color` attacks `square` on the given placement.
pub(crate) fn is_attacked(squares: &[Piece; 64], square: Square, by_color: u8) -> bool {
    let at = |sq: Square| squares[sq.index()];

    // A pawn of `by_color` attacks diagonally forward, so look one rank back.
    let pawn_dr = if by_color == WHITE { -1 } else { 1 };
    let pawn = make_piece(PAWN, by_color);
    if [-1, 1]
        .iter()
        .filter_map(|&df| square.offset(df, pawn_dr))
        .any(|sq| at(sq) == pawn)
    {
        return true;
    }

    let knight = make_piece(KNIGHT, by_color);
    if KNIGHT_OFFSETS
        .iter()
        .filter_map(|&(df, dr)| square.offset(df, dr))
        .any(|sq| at(sq) == knight)
    {
        return true;
    }

    let king = make_piece(KING, by_color);
    if KING_OFFSETS
        .iter()
        .filter_map(|&(df, dr)| square.offset(df, dr))
        .any(|sq| at(sq) == king)
    {
        return true;
    }

    let queen = make_piece(QUEEN, by_color);
    let bishop = make_piece(BISHOP, by_color);
    let rook = make_piece(ROOK, by_color);

    let slider_hits = |directions: &[(i8, i8)], slider: Piece| {
        directions.iter().any(|&(df, dr)| {
            let mut current = square;
            while let Some(next) = current.offset(df, dr) {
                let piece = at(next);
                if !is_empty(piece) {
                    return piece == slider || piece == queen;
                }
                current = next;
            }
            false
        })
    };

    slider_hits(&DIAGONALS[..], bishop) || slider_hits(&ORTHOGONALS[..], rook)
}

pub(crate) fn find_king_in(squares: &[Piece; 64], color: u8) -> Option<Square> {
    let king = make_piece(KING, color);
    squares
        .iter()
        .position(|&piece| piece == king)
        .map(|index| Square(index as u8))
}

impl Board {
    pub fn is_under_threat(&self, square: Square, by_color: u8) -> bool {
        is_attacked(&self.squares, square, by_color)
    }

    pub fn find_king(&self, color: u8) -> Option<Square> {
        find_king_in(&self.squares, color)
    }

    /// Is the side to move in check?
    pub fn is_in_check(&self) -> bool {
        self.is_color_in_check(self.current_turn)
    }

    pub fn is_color_in_check(&self, color: u8) -> bool {
        match self.find_king(color) {
            Some(king_square) => self.is_under_threat(king_square, opposite_color(color)),
            None => false,
        }
    }

    pub fn is_valid_move(&self, mv: Move) -> bool {
        let from_piece = self.get_piece(mv.from);
        if !is_piece_color(from_piece, self.current_turn) {
            return false;
        }
        self.get_all_legal_moves().contains(&mv)
    }

    pub fn is_checkmate(&self) -> bool {
        self.is_in_check() && !self.can_player_move()
    }

    pub fn is_stalemate(&self) -> bool {
        !self.is_in_check() && !self.can_player_move()
    }

    /// Neither side can ever deliver mate: only kings and minor pieces,
    /// with at most one minor, or bishops that all share a square colour.
    pub fn is_insufficient_material(&self) -> bool {
        let mut minors = 0;
        let mut knights = 0;
        let mut bishop_square_colors = [false; 2];

        for (square, piece) in self.pieces() {
            match piece_type(piece) {
                KING => {}
                KNIGHT => {
                    minors += 1;
                    knights += 1;
                }
                BISHOP => {
                    minors += 1;
                    bishop_square_colors[((square.file() + square.rank()) % 2) as usize] = true;
                }
                _ => return false,
            }
        }

        if minors <= 1 {
            return true;
        }
        knights == 0 && !(bishop_square_colors[0] && bishop_square_colors[1])
    }

    pub fn is_fivefold_repetition(&self) -> bool {
        self.repetition_count() >= 5
    }

    pub fn game_status(&self) -> GameStatus {
        let can_move = self.can_player_move();
        let in_check = self.is_in_check();

        if !can_move {
            return if in_check {
                GameStatus::Checkmate(self.current_turn)
            } else {
                GameStatus::Stalemate
            };
        }
        if self.is_insufficient_material() {
            return GameStatus::Draw(DrawReason::InsufficientMaterial);
        }
        if self.half_move_clock >= 150 {
            return GameStatus::Draw(DrawReason::SeventyFiveMoves);
        }
        if self.is_fivefold_repetition() {
            return GameStatus::Draw(DrawReason::FivefoldRepetition);
        }
        if in_check {
            GameStatus::Check(self.current_turn)
        } else {
            GameStatus::InProgress
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.game_status().is_over()
    }
}
