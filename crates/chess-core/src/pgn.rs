//! PGN parsing utilities: a lightweight regex-based parser.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::game_data::{GameData, GameMetadata};
use crate::positions::{positions_from_sans, STANDARD_START_FEN};

static HEADER_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\[(\w+)\s+"([^"]*)"\]"#).unwrap());
static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[[^\]]*\]").unwrap());
static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{[^}]*\}").unwrap());
static VARIATION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\([^)]*\)").unwrap());
static MOVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[KQRBN]?[a-h]?[1-8]?x?[a-h][1-8](?:=[QRBN])?[+#]?|O-O-O|O-O").unwrap()
});

#[derive(Error, Debug)]
pub enum PgnError {
    #[error("Invalid FEN: {0}")]
    InvalidFen(String),

    #[error("Invalid SAN at ply {ply}: {san}")]
    InvalidSan { ply: usize, san: String },

    #[error("Illegal move at ply {ply}: {san}")]
    IllegalMove { ply: usize, san: String },

    #[error("PGN contains no moves")]
    NoMoves,
}

/// Parse a PGN string into a GameData struct, replaying the moves to build
/// the FEN sequence. A `[FEN "..."]` header sets the start position.
pub fn parse_pgn(pgn: &str) -> Result<GameData, PgnError> {
    let mut white = "Unknown".to_string();
    let mut black = "Unknown".to_string();
    let mut result = "*".to_string();
    let mut date = None;
    let mut event = None;
    let mut fen = None;

    for cap in HEADER_TAG_RE.captures_iter(pgn) {
        let key = &cap[1];
        let value = cap[2].to_string();
        match key {
            "White" => white = value,
            "Black" => black = value,
            "Result" => result = value,
            "Date" => date = Some(value),
            "Event" => event = Some(value),
            "FEN" => fen = Some(value),
            _ => {}
        }
    }

    let moves = extract_moves(pgn);
    if moves.is_empty() {
        return Err(PgnError::NoMoves);
    }

    let start_fen = fen.as_deref().unwrap_or(STANDARD_START_FEN);
    let fens = positions_from_sans(start_fen, &moves)?;

    Ok(GameData {
        metadata: GameMetadata {
            white,
            black,
            result,
            date,
            event,
        },
        moves,
        fens,
    })
}

/// Extract SAN moves from PGN text (after removing headers, comments, variations).
fn extract_moves(pgn: &str) -> Vec<String> {
    let no_headers = HEADER_RE.replace_all(pgn, "");
    let no_comments = COMMENT_RE.replace_all(&no_headers, "");
    let no_variations = VARIATION_RE.replace_all(&no_comments, "");

    MOVE_RE
        .find_iter(&no_variations)
        .map(|m| m.as_str().to_string())
        .collect()
}
