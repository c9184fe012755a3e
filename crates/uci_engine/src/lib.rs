//! UCI front end: parses protocol commands, keeps the current game and drives
//! the classical engine.

pub mod error;
pub mod options;
pub mod protocol;

pub use error::{UciError, UciResult};
pub use options::EngineOptions;
pub use protocol::UciProtocol;
