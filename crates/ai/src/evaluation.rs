use engine::{is_white, piece_type, Piece};

use crate::oracle::PositionOracle;
use crate::types::*;

/// Material balance from White's point of view. Depends on piece placement
/// only, never on the side to move or the history.
pub fn evaluate<P: PositionOracle + ?Sized>(position: &P) -> Score {
    position.occupied_pieces().into_iter().map(signed_value).sum()
}

/// Value of one piece, positive for White and negative for Black.
pub fn signed_value(piece: Piece) -> Score {
    let value = PIECE_VALUES[piece_type(piece) as usize];
    if is_white(piece) {
        value
    } else {
        -value
    }
}
