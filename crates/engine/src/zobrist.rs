use std::sync::OnceLock;

use crate::types::*;

static KEYS: OnceLock<ZobristKeys> = OnceLock::new();

pub fn keys() -> &'static ZobristKeys {
    KEYS.get_or_init(ZobristKeys::new)
}

/// Hash keys for repetition detection.
pub struct ZobristKeys {
    pieces: [[u64; 64]; 12], // [piece_index][square]
    side_to_move: u64,
    castling_rights: [u64; 16],
    en_passant: [u64; 8], // by file
}

impl ZobristKeys {
    fn new() -> Self {
        let mut keys = ZobristKeys {
            pieces: [[0; 64]; 12],
            side_to_move: 0,
            castling_rights: [0; 16],
            en_passant: [0; 8],
        };

        let mut state = 0x9E37_79B9_7F4A_7C15u64;
        let mut next = || {
            // splitmix64
            state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
            let mut z = state;
            z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
            z ^ (z >> 31)
        };

        for piece in keys.pieces.iter_mut() {
            for square in piece.iter_mut() {
                *square = next();
            }
        }
        keys.side_to_move = next();
        for key in keys.castling_rights.iter_mut() {
            *key = next();
        }
        for key in keys.en_passant.iter_mut() {
            *key = next();
        }

        keys
    }

    pub fn piece_key(&self, piece: Piece, square: Square) -> u64 {
        let index = (piece_type(piece) - 1) as usize + if piece_color(piece) == WHITE { 0 } else { 6 };
        self.pieces[index][square.index()]
    }

    pub fn side_key(&self) -> u64 {
        self.side_to_move
    }

    pub fn castling_key(&self, castling_rights: u8) -> u64 {
        self.castling_rights[(castling_rights & ALL_CASTLING_RIGHTS) as usize]
    }

    pub fn en_passant_key(&self, file: u8) -> u64 {
        self.en_passant[file as usize]
    }
}
