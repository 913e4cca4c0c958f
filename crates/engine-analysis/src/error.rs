//! Analysis error types

use std::time::Duration;

use thiserror::Error;

/// Transport-level failures talking to the engine process.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to spawn engine at {path}: {source}")]
    Spawn {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Engine I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Engine did not answer '{expected}' within {after:?}")]
    Handshake { expected: &'static str, after: Duration },

    #[error("Engine output stream closed")]
    Closed,

    #[error("Engine subscription lagged, {0} messages dropped")]
    Lagged(u64),
}

/// Why a score could not be read from a finished search.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Depth {depth} not reached before bestmove")]
    NotFoundAtDepth { depth: u32 },

    #[error("Depth {depth} reached but no score reported")]
    NoScore { depth: u32 },
}

/// Outcome of a single search that did not produce a reply.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("Search at depth {depth} timed out after {after:?}")]
    Timeout { depth: u32, after: Duration },

    #[error(transparent)]
    Transport(#[from] EngineError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    #[error("Malformed engine move: {0:?}")]
    Malformed(String),

    #[error("Illegal move {raw} in position {fen}")]
    Illegal { raw: String, fen: String },
}

/// Errors from the rules collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("Invalid FEN: {0}")]
    InvalidFen(String),

    #[error("Invalid square: {0}")]
    InvalidSquare(String),

    #[error("Invalid promotion piece: {0}")]
    InvalidPromotion(char),

    #[error("Illegal move {from}{to}")]
    IllegalMove { from: String, to: String },
}

/// A recoverable failure scoped to one position of a run.
#[derive(Error, Debug)]
pub enum PositionError {
    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Translate(#[from] TranslateError),
}

/// Errors that abort a whole analysis run.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Configuration error: {0}")]
    Config(&'static str),

    #[error("Search depth must be at least 1, got {0}")]
    InvalidDepth(u32),

    #[error("Invalid FEN at index {index}: {fen}")]
    InvalidFen { index: usize, fen: String },

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
}
