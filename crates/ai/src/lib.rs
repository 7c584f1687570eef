pub mod evaluation;
pub mod oracle;
pub mod search;
pub mod types;

pub use evaluation::*;
pub use oracle::PositionOracle;
pub use search::*;
pub use types::*;
