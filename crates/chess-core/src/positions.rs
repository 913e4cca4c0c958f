//! FEN sequences: built from SAN move lists or read from plain text.

use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::{CastlingMode, Chess, EnPassantMode, Position};

use crate::pgn::PgnError;

pub const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Play `sans` from `start_fen` and return the start FEN followed by the FEN
/// after every move. Result tokens ("1-0", "*", ...) are skipped.
pub fn positions_from_sans(start_fen: &str, sans: &[String]) -> Result<Vec<String>, PgnError> {
    let fen: Fen = start_fen
        .parse()
        .map_err(|_| PgnError::InvalidFen(start_fen.to_string()))?;
    let mut pos: Chess = fen
        .into_position(CastlingMode::Standard)
        .map_err(|_| PgnError::InvalidFen(start_fen.to_string()))?;

    let mut fens = vec![Fen::from_position(&pos, EnPassantMode::Legal).to_string()];

    for (ply, san_str) in sans.iter().enumerate() {
        let san_str = san_str.trim();
        if san_str.is_empty() || is_result_token(san_str) {
            continue;
        }

        // Check and annotation suffixes are not part of the move itself
        let san: San = san_str
            .trim_end_matches(['+', '#', '!', '?'])
            .parse()
            .map_err(|_| PgnError::InvalidSan {
                ply,
                san: san_str.to_string(),
            })?;
        let mv = san.to_move(&pos).map_err(|_| PgnError::IllegalMove {
            ply,
            san: san_str.to_string(),
        })?;

        pos.play_unchecked(mv);
        fens.push(Fen::from_position(&pos, EnPassantMode::Legal).to_string());
    }

    Ok(fens)
}

/// One FEN per line; blank lines and `#` comments are ignored.
pub fn read_fen_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

fn is_result_token(token: &str) -> bool {
    matches!(token, "1-0" | "0-1" | "1/2-1/2" | "*")
}
