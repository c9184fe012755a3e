//! Protocol-level errors.

use std::io;

use chess_core::ChessError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UciError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("invalid arguments for {command}: {reason}")]
    InvalidArguments { command: &'static str, reason: String },

    #[error(transparent)]
    Chess(#[from] ChessError),

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

impl UciError {
    pub(crate) fn args(command: &'static str, reason: impl Into<String>) -> Self {
        UciError::InvalidArguments {
            command,
            reason: reason.into(),
        }
    }

    /// Only a broken channel ends the session; everything else is reported
    /// and the next line is read.
    pub fn is_fatal(&self) -> bool {
        matches!(self, UciError::Io(_))
    }
}

pub type UciResult<T> = Result<T, UciError>;
