use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square(pub u8);

impl Square {
    pub fn new(file: u8, rank: u8) -> Self {
        Self(rank * 8 + file)
    }

    pub fn file(&self) -> u8 {
        self.0 % 8
    }

    pub fn rank(&self) -> u8 {
        self.0 / 8
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }

    /// Square reached by stepping `(df, dr)`, or `None` when it leaves the board.
    pub fn offset(&self, df: i8, dr: i8) -> Option<Self> {
        let file = self.file() as i8 + df;
        let rank = self.rank() as i8 + dr;
        if (0..8).contains(&file) && (0..8).contains(&rank) {
            Some(Self::new(file as u8, rank as u8))
        } else {
            None
        }
    }

    /// Parses `"e4"` style coordinates.
    pub fn from_algebraic(text: &str) -> Option<Self> {
        let bytes = text.as_bytes();
        if bytes.len() != 2 {
            return None;
        }
        let file = bytes[0].wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        if file < 8 && rank < 8 {
            Some(Self::new(file, rank))
        } else {
            None
        }
    }

    /// Maps a pointer position inside the drawn board to a square.
    /// `flipped` is set when Black is drawn at the bottom.
    pub fn from_coords(x: f32, y: f32, square_size: f32, flipped: bool) -> Option<Self> {
        if x < 0.0 || y < 0.0 {
            return None;
        }
        let col = (x / square_size) as u8;
        let row = (y / square_size) as u8;
        if col >= 8 || row >= 8 {
            return None;
        }
        if flipped {
            Some(Self::new(7 - col, row))
        } else {
            Some(Self::new(col, 7 - row))
        }
    }

    /// Same square seen from the other side of the board.
    pub fn flip_rank(&self) -> Self {
        Self::new(self.file(), 7 - self.rank())
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.file()) as char, (b'1' + self.rank()) as char)
    }
}

// 4-bit piece representation
// Bits 0-2: piece type (0=empty, 1=pawn, 2=knight, 3=bishop, 4=rook, 5=queen, 6=king)
// Bit 3: color (0=black, 1=white)
pub type Piece = u8;

pub const EMPTY: u8 = 0;

pub const PAWN: u8 = 1;
pub const KNIGHT: u8 = 2;
pub const BISHOP: u8 = 3;
pub const ROOK: u8 = 4;
pub const QUEEN: u8 = 5;
pub const KING: u8 = 6;

pub const BLACK: u8 = 0;
pub const WHITE: u8 = 8;

pub fn make_piece(piece_type: u8, color: u8) -> Piece {
    piece_type | color
}

pub fn piece_type(piece: Piece) -> u8 {
    piece & 7
}

pub fn piece_color(piece: Piece) -> u8 {
    piece & 8
}

pub fn is_white(piece: Piece) -> bool {
    !is_empty(piece) && piece_color(piece) == WHITE
}

pub fn is_black(piece: Piece) -> bool {
    !is_empty(piece) && piece_color(piece) == BLACK
}

pub fn is_empty(piece: Piece) -> bool {
    piece == EMPTY
}

pub fn opposite_color(color: u8) -> u8 {
    color ^ WHITE
}

pub fn is_piece_color(piece: Piece, color: u8) -> bool {
    !is_empty(piece) && piece_color(piece) == color
}

/// Same piece type, other colour.
pub fn flip_piece_color(piece: Piece) -> Piece {
    if is_empty(piece) {
        EMPTY
    } else {
        piece ^ WHITE
    }
}

pub fn color_name(color: u8) -> &'static str {
    if color == WHITE {
        "White"
    } else {
        "Black"
    }
}

/// Lowercase letter used in FEN and move tokens.
pub fn piece_letter(piece_type: u8) -> Option<char> {
    match piece_type {
        PAWN => Some('p'),
        KNIGHT => Some('n'),
        BISHOP => Some('b'),
        ROOK => Some('r'),
        QUEEN => Some('q'),
        KING => Some('k'),
        _ => None,
    }
}

pub fn piece_from_letter(letter: char) -> Option<u8> {
    match letter.to_ascii_lowercase() {
        'p' => Some(PAWN),
        'n' => Some(KNIGHT),
        'b' => Some(BISHOP),
        'r' => Some(ROOK),
        'q' => Some(QUEEN),
        'k' => Some(KING),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<u8>,
}

impl Move {
    pub fn new(from: Square, to: Square) -> Self {
        Self { from, to, promotion: None }
    }

    pub fn with_promotion(from: Square, to: Square, piece_type: u8) -> Self {
        Self { from, to, promotion: Some(piece_type) }
    }

    pub fn is_promotion(&self) -> bool {
        self.promotion.is_some()
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(letter) = self.promotion.and_then(piece_letter) {
            write!(f, "{}", letter)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawReason {
    InsufficientMaterial,
    SeventyFiveMoves,
    FivefoldRepetition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    InProgress,
    Check(u8),     // Which color is in check
    Checkmate(u8), // Which color is checkmated (other color wins)
    Stalemate,
    Draw(DrawReason),
}

impl GameStatus {
    pub fn is_over(&self) -> bool {
        matches!(self, GameStatus::Checkmate(_) | GameStatus::Stalemate | GameStatus::Draw(_))
    }
}

/// Everything needed to take a move back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameMove {
    pub mv: Move,
    pub moved_piece: Piece,
    pub captured_piece: Piece,
    pub captured_square: Square,
    pub is_castling: bool,
    pub is_en_passant: bool,
    pub prev_castling_rights: u8,
    pub prev_en_passant: Option<Square>,
    pub prev_half_move_clock: u16,
    pub prev_full_move_number: u16,
}

impl GameMove {
    pub fn is_capture(&self) -> bool {
        !is_empty(self.captured_piece)
    }
}

// Castling rights bitfield constants
pub const WHITE_KINGSIDE: u8 = 0b0001;
pub const WHITE_QUEENSIDE: u8 = 0b0010;
pub const BLACK_KINGSIDE: u8 = 0b0100;
pub const BLACK_QUEENSIDE: u8 = 0b1000;
pub const ALL_CASTLING_RIGHTS: u8 = 0b1111;

pub fn has_castling_right(castling_rights: u8, right: u8) -> bool {
    castling_rights & right != 0
}

pub fn remove_castling_right(castling_rights: &mut u8, right: u8) {
    *castling_rights &= !right;
}

pub fn get_castling_rights_for_color(castling_rights: u8, color: u8) -> u8 {
    if color == WHITE {
        castling_rights & (WHITE_KINGSIDE | WHITE_QUEENSIDE)
    } else {
        castling_rights & (BLACK_KINGSIDE | BLACK_QUEENSIDE)
    }
}
