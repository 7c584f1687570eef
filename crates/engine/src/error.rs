use thiserror::Error;

use crate::Move;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("illegal move {0}")]
    IllegalMove(Move),

    #[error("game is already over")]
    GameOver,

    #[error("no move to undo")]
    NothingToUndo,

    #[error("invalid FEN: {0}")]
    InvalidFen(String),
}
