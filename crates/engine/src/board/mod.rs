use crate::error::EngineError;
use crate::types::*;
use crate::zobrist;

pub mod moves;
pub mod state;
pub mod validation;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    pub squares: [Piece; 64],
    pub current_turn: u8,
    pub move_history: Vec<GameMove>,
    pub half_move_clock: u16,
    pub full_move_number: u16,
    pub castling_rights: u8,
    pub en_passant_target: Option<Square>,
    // key of every position reached so far, current position last
    position_keys: Vec<u64>,
}

impl Board {
    pub fn new() -> Self {
        let mut board = Self::empty();
        board.castling_rights = ALL_CASTLING_RIGHTS;
        board.setup_starting_position();
        board.reset_position_keys();
        board
    }

    fn empty() -> Self {
        Self {
            squares: [EMPTY; 64],
            current_turn: WHITE,
            move_history: Vec::new(),
            half_move_clock: 0,
            full_move_number: 1,
            castling_rights: 0,
            en_passant_target: None,
            position_keys: Vec::new(),
        }
    }

    fn setup_starting_position(&mut self) {
        const BACK_RANK: [u8; 8] = [ROOK, KNIGHT, BISHOP, QUEEN, KING, BISHOP, KNIGHT, ROOK];

        for (file, &piece_type) in BACK_RANK.iter().enumerate() {
            let file = file as u8;
            self.set_piece(Square::new(file, 0), make_piece(piece_type, WHITE));
            self.set_piece(Square::new(file, 1), make_piece(PAWN, WHITE));
            self.set_piece(Square::new(file, 6), make_piece(PAWN, BLACK));
            self.set_piece(Square::new(file, 7), make_piece(piece_type, BLACK));
        }
    }

    pub fn get_piece(&self, square: Square) -> Piece {
        self.squares[square.index()]
    }

    pub fn set_piece(&mut self, square: Square, piece: Piece) {
        self.squares[square.index()] = piece;
    }

    /// Occupied squares with their pieces, a1 first.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.squares
            .iter()
            .enumerate()
            .filter(|(_, &piece)| !is_empty(piece))
            .map(|(index, &piece)| (Square(index as u8), piece))
    }

    pub fn from_fen(fen: &str) -> Result<Self, EngineError> {
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if parts.len() < 4 || parts.len() > 6 {
            return Err(EngineError::InvalidFen(format!(
                "expected 4 to 6 fields, found {}",
                parts.len()
            )));
        }

        let mut board = Self::empty();
        board.parse_piece_placement(parts[0])?;

        board.current_turn = match parts[1] {
            "w" => WHITE,
            "b" => BLACK,
            other => return Err(EngineError::InvalidFen(format!("invalid active color '{other}'"))),
        };

        board.parse_castling_rights(parts[2])?;
        board.parse_en_passant(parts[3])?;

        if let Some(clock) = parts.get(4) {
            board.half_move_clock = clock
                .parse()
                .map_err(|_| EngineError::InvalidFen(format!("invalid halfmove clock '{clock}'")))?;
        }
        if let Some(number) = parts.get(5) {
            board.full_move_number = number
                .parse()
                .map_err(|_| EngineError::InvalidFen(format!("invalid fullmove number '{number}'")))?;
        }

        for color in [WHITE, BLACK] {
            let kings = board
                .pieces()
                .filter(|&(_, piece)| piece == make_piece(KING, color))
                .count();
            if kings != 1 {
                return Err(EngineError::InvalidFen(format!(
                    "{} has {} kings",
                    color_name(color),
                    kings
                )));
            }
        }

        board.reset_position_keys();
        Ok(board)
    }

    fn parse_piece_placement(&mut self, placement: &str) -> Result<(), EngineError> {
        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return Err(EngineError::InvalidFen("piece placement must have 8 ranks".into()));
        }

        for (rank_idx, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - rank_idx as u8; // FEN starts from rank 8
            let mut file = 0u8;

            for ch in rank_str.chars() {
                if let Some(empty_squares) = ch.to_digit(10) {
                    file += empty_squares as u8;
                } else {
                    if file >= 8 {
                        return Err(EngineError::InvalidFen(format!("too many pieces on rank {}", rank + 1)));
                    }
                    let piece_type = piece_from_letter(ch)
                        .ok_or_else(|| EngineError::InvalidFen(format!("unknown piece '{ch}'")))?;
                    let color = if ch.is_ascii_uppercase() { WHITE } else { BLACK };
                    self.set_piece(Square::new(file, rank), make_piece(piece_type, color));
                    file += 1;
                }
            }

            if file != 8 {
                return Err(EngineError::InvalidFen(format!("rank {} does not cover 8 files", rank + 1)));
            }
        }

        Ok(())
    }

    fn parse_castling_rights(&mut self, castling_str: &str) -> Result<(), EngineError> {
        self.castling_rights = 0;
        if castling_str == "-" {
            return Ok(());
        }

        for ch in castling_str.chars() {
            match ch {
                'K' => self.castling_rights |= WHITE_KINGSIDE,
                'Q' => self.castling_rights |= WHITE_QUEENSIDE,
                'k' => self.castling_rights |= BLACK_KINGSIDE,
                'q' => self.castling_rights |= BLACK_QUEENSIDE,
                _ => return Err(EngineError::InvalidFen(format!("invalid castling right '{ch}'"))),
            }
        }

        Ok(())
    }

    fn parse_en_passant(&mut self, en_passant_str: &str) -> Result<(), EngineError> {
        if en_passant_str == "-" {
            self.en_passant_target = None;
            return Ok(());
        }

        let square = Square::from_algebraic(en_passant_str)
            .ok_or_else(|| EngineError::InvalidFen(format!("invalid en passant square '{en_passant_str}'")))?;
        if square.rank() != 2 && square.rank() != 5 {
            return Err(EngineError::InvalidFen(format!(
                "en passant square '{en_passant_str}' is not on rank 3 or 6"
            )));
        }
        self.en_passant_target = Some(square);
        Ok(())
    }

    pub fn to_fen(&self) -> String {
        let mut fen = String::with_capacity(90);

        for rank in (0..8).rev() {
            let mut empty_run = 0;
            for file in 0..8 {
                let piece = self.get_piece(Square::new(file, rank));
                match piece_letter(piece_type(piece)) {
                    None => empty_run += 1,
                    Some(letter) => {
                        if empty_run > 0 {
                            fen.push(char::from(b'0' + empty_run));
                            empty_run = 0;
                        }
                        fen.push(if is_white(piece) { letter.to_ascii_uppercase() } else { letter });
                    }
                }
            }
            if empty_run > 0 {
                fen.push(char::from(b'0' + empty_run));
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(if self.current_turn == WHITE { 'w' } else { 'b' });
        fen.push(' ');

        if self.castling_rights == 0 {
            fen.push('-');
        } else {
            for (right, letter) in [
                (WHITE_KINGSIDE, 'K'),
                (WHITE_QUEENSIDE, 'Q'),
                (BLACK_KINGSIDE, 'k'),
                (BLACK_QUEENSIDE, 'q'),
            ] {
                if has_castling_right(self.castling_rights, right) {
                    fen.push(letter);
                }
            }
        }

        fen.push(' ');
        match self.en_passant_target {
            Some(square) => fen.push_str(&square.to_string()),
            None => fen.push('-'),
        }

        fen.push_str(&format!(" {} {}", self.half_move_clock, self.full_move_number));
        fen
    }

    /// Colour-swapped copy: every piece changes colour and rank, the side to
    /// move and all rights swap with it. History is not carried over.
    pub fn mirrored(&self) -> Self {
        let mut board = Self::empty();
        for (square, piece) in self.pieces() {
            board.set_piece(square.flip_rank(), flip_piece_color(piece));
        }
        board.current_turn = opposite_color(self.current_turn);
        board.castling_rights = ((self.castling_rights & 0b0011) << 2) | ((self.castling_rights & 0b1100) >> 2);
        board.en_passant_target = self.en_passant_target.map(|square| square.flip_rank());
        board.half_move_clock = self.half_move_clock;
        board.full_move_number = self.full_move_number;
        board.reset_position_keys();
        board
    }

    /// Hash of placement, side to move, castling rights and a usable
    /// en passant file.
    pub fn position_key(&self) -> u64 {
        let keys = zobrist::keys();
        let mut hash = 0u64;

        for (square, piece) in self.pieces() {
            hash ^= keys.piece_key(piece, square);
        }
        if self.current_turn == BLACK {
            hash ^= keys.side_key();
        }
        hash ^= keys.castling_key(self.castling_rights);
        if let Some(target) = self.en_passant_target {
            if self.en_passant_capture_possible(target) {
                hash ^= keys.en_passant_key(target.file());
            }
        }

        hash
    }

    fn en_passant_capture_possible(&self, target: Square) -> bool {
        let dr = if self.current_turn == WHITE { -1 } else { 1 };
        let own_pawn = make_piece(PAWN, self.current_turn);
        [-1, 1]
            .iter()
            .filter_map(|&df| target.offset(df, dr))
            .any(|square| self.get_piece(square) == own_pawn)
    }

    fn reset_position_keys(&mut self) {
        self.position_keys.clear();
        let key = self.position_key();
        self.position_keys.push(key);
    }

    /// How many times the current position has occurred.
    pub fn repetition_count(&self) -> usize {
        match self.position_keys.last() {
            Some(current) => self.position_keys.iter().filter(|&key| key == current).count(),
            None => 0,
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
