//! Evaluation scores and their extraction from buffered engine output

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use shakmaty::Color;

use crate::error::ExtractError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreKind {
    #[serde(rename = "cp")]
    Centipawn,
    #[serde(rename = "mate")]
    Mate,
}

/// Engine score for a position. `value` is negated when the searched
/// position has Black to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationScore {
    #[serde(rename = "type")]
    pub kind: ScoreKind,
    pub value: i32,
}

impl EvaluationScore {
    pub fn centipawns(value: i32) -> Self {
        Self {
            kind: ScoreKind::Centipawn,
            value,
        }
    }

    pub fn mate(value: i32) -> Self {
        Self {
            kind: ScoreKind::Mate,
            value,
        }
    }

    /// Score recorded for a position that is already checkmate.
    pub fn checkmated() -> Self {
        Self::mate(0)
    }
}

impl fmt::Display for EvaluationScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ScoreKind::Centipawn => write!(f, "{:+.2}", self.value as f64 / 100.0),
            ScoreKind::Mate if self.value < 0 => write!(f, "-M{}", -self.value),
            ScoreKind::Mate => write!(f, "M{}", self.value),
        }
    }
}

/// Read the score for `depth` from the line just before the `bestmove`
/// terminator.
pub fn extract(
    buffer: &[String],
    depth: u32,
    side_to_move: Color,
) -> Result<EvaluationScore, ExtractError> {
    let not_found = ExtractError::NotFoundAtDepth { depth };

    if buffer.len() < 2 {
        return Err(not_found);
    }
    let line = &buffer[buffer.len() - 2];

    let Ok(depth_re) = Regex::new(&format!(r"(?m)^.*info depth {depth}\b.*$")) else {
        return Err(not_found);
    };
    let Some(depth_line) = depth_re.find(line) else {
        return Err(not_found);
    };

    let score = parse_score(depth_line.as_str()).ok_or(ExtractError::NoScore { depth })?;

    Ok(match side_to_move {
        Color::White => score,
        Color::Black => EvaluationScore {
            value: -score.value,
            ..score
        },
    })
}

/// Parse `score (cp|mate) <n>` from an info line
fn parse_score(line: &str) -> Option<EvaluationScore> {
    let score_re = Regex::new(r"score (cp|mate) (-?\d+)").ok()?;
    let caps = score_re.captures(line)?;
    let value: i32 = caps[2].parse().ok()?;

    match &caps[1] {
        "cp" => Some(EvaluationScore::centipawns(value)),
        _ => Some(EvaluationScore::mate(value)),
    }
}
