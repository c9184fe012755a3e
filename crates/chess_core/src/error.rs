//! Error types for board setup, move parsing and game history.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChessError {
    /// Malformed FEN string
    #[error("invalid FEN \"{fen}\": {reason}")]
    InvalidFen { fen: String, reason: String },

    /// Malformed or inapplicable coordinate-notation move
    #[error("invalid move \"{text}\": {reason}")]
    InvalidMove { text: String, reason: String },

    /// Bad value for a keyword argument (e.g. `go wtime abc`)
    #[error("invalid argument for {key}: {reason}")]
    InvalidArgument { key: String, reason: String },

    /// `pop_move` with an empty history
    #[error("no move to pop")]
    EmptyHistory,
}

impl ChessError {
    pub(crate) fn fen(fen: &str, reason: impl Into<String>) -> Self {
        ChessError::InvalidFen {
            fen: fen.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn mv(text: &str, reason: impl Into<String>) -> Self {
        ChessError::InvalidMove {
            text: text.to_string(),
            reason: reason.into(),
        }
    }
}

pub type ChessResult<T> = Result<T, ChessError>;
