pub mod board;
pub mod error;
pub mod logger;
pub mod perft;
pub mod types;
pub mod zobrist;

pub use board::*;
pub use error::EngineError;
pub use logger::{GameLog, MoveSource};
pub use perft::*;
pub use types::*;
