//! Engine coordinate moves to SAN

use std::fmt;

use shakmaty::fen::Fen;
use shakmaty::{Chess, EnPassantMode};

use crate::board;
use crate::error::{BoardError, TranslateError};

/// Coordinate move as printed on a `bestmove` line (`e2e4`, `e7e8q`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMove(String);

impl RawMove {
    /// Parse the move token of a `bestmove` line. `(none)` means the engine
    /// had no legal move to offer.
    pub fn from_bestmove_token(token: &str) -> Option<Self> {
        match token {
            "" | "(none)" | "0000" => None,
            t => Some(Self(t.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RawMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Move found by the previous search, waiting to be attributed to the next
/// record.
#[derive(Debug, Clone, Default)]
pub enum PendingMove {
    #[default]
    None,
    Pending { raw: RawMove, source: Chess },
}

impl PendingMove {
    /// Translate the pending move against its source position.
    pub fn translate(&self) -> Result<Option<String>, TranslateError> {
        match self {
            PendingMove::None => Ok(None),
            PendingMove::Pending { raw, source } => translate(raw, source).map(Some),
        }
    }
}

/// Render `raw` in SAN as played from `source`.
pub fn translate(raw: &RawMove, source: &Chess) -> Result<String, TranslateError> {
    let s = raw.as_str();
    if !(4..=5).contains(&s.len()) || !s.is_ascii() {
        return Err(TranslateError::Malformed(raw.to_string()));
    }

    let promotion = s[4..].chars().next();
    board::apply_move(source, &s[0..2], &s[2..4], promotion).map_err(|e| match e {
        BoardError::IllegalMove { .. } => TranslateError::Illegal {
            raw: raw.to_string(),
            fen: Fen::from_position(source, EnPassantMode::Legal).to_string(),
        },
        _ => TranslateError::Malformed(raw.to_string()),
    })
}
