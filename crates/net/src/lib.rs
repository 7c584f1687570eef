pub mod error;
pub mod host;
pub mod peer;
pub mod session;
pub mod token;
pub mod wire;

pub use error::ChannelError;
pub use host::{Host, DEFAULT_PORT};
pub use session::{GameSnapshot, SessionCommand, SessionConfig, SessionEvent, SessionHandle};
pub use token::{decode, encode, TokenError};
pub use wire::{Frame, Role};
