use std::io;

use engine::{EngineError, Move};
use thiserror::Error;

use crate::token::TokenError;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("bad move token: {0}")]
    Decode(#[from] TokenError),

    #[error("illegal move {0}")]
    Illegal(Move),

    #[error("it is not your turn")]
    NotYourTurn,

    #[error("move arrived while it was our turn")]
    OutOfTurn,

    #[error("the game is over")]
    GameOver,

    #[error("no opponent is connected")]
    Disconnected,

    #[error("handshake failed: {0}")]
    Handshake(String),

    #[error("the game session has stopped")]
    SessionClosed,
}

impl From<EngineError> for ChannelError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::IllegalMove(mv) => ChannelError::Illegal(mv),
            EngineError::GameOver => ChannelError::GameOver,
            // the session never undoes or parses positions from the wire
            other => ChannelError::Io(io::Error::new(io::ErrorKind::InvalidData, other.to_string())),
        }
    }
}
