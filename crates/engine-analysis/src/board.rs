//! Rules collaborator backed by shakmaty: position loading, move
//! validation with SAN rendering, and checkmate detection.

use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, Color, Position, Role, Square};

use crate::error::BoardError;

pub fn load_position(fen: &str) -> Result<Chess, BoardError> {
    let parsed: Fen = fen
        .parse()
        .map_err(|_| BoardError::InvalidFen(fen.to_string()))?;
    parsed
        .into_position(CastlingMode::Standard)
        .map_err(|_| BoardError::InvalidFen(fen.to_string()))
}

/// Play `from`-`to` (with optional promotion letter) on a copy of `pos` and
/// return the move in SAN, including the `+`/`#` suffix.
pub fn apply_move(
    pos: &Chess,
    from: &str,
    to: &str,
    promotion: Option<char>,
) -> Result<String, BoardError> {
    let from_sq: Square = from
        .parse()
        .map_err(|_| BoardError::InvalidSquare(from.to_string()))?;
    let to_sq: Square = to
        .parse()
        .map_err(|_| BoardError::InvalidSquare(to.to_string()))?;
    let promotion = match promotion {
        Some(c) => Some(Role::from_char(c).ok_or(BoardError::InvalidPromotion(c))?),
        None => None,
    };

    let uci = UciMove::Normal {
        from: from_sq,
        to: to_sq,
        promotion,
    };
    let mv = uci.to_move(pos).map_err(|_| BoardError::IllegalMove {
        from: from.to_string(),
        to: to.to_string(),
    })?;

    let san = San::from_move(pos, mv.clone());
    let mut after = pos.clone();
    after.play_unchecked(mv);

    let suffix = if after.is_checkmate() {
        "#"
    } else if after.is_check() {
        "+"
    } else {
        ""
    };
    Ok(format!("{san}{suffix}"))
}

pub fn is_checkmate(pos: &Chess) -> bool {
    pos.is_checkmate()
}

pub fn side_to_move(pos: &Chess) -> Color {
    pos.turn()
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn test_load_position_rejects_garbage() {
        assert!(load_position(START).is_ok());
        assert!(matches!(
            load_position("not a fen"),
            Err(BoardError::InvalidFen(_))
        ));
    }

    #[test]
    fn test_apply_move_san() {
        let pos = load_position(START).unwrap();
        assert_eq!(apply_move(&pos, "e2", "e4", None).unwrap(), "e4");
        assert_eq!(apply_move(&pos, "g1", "f3", None).unwrap(), "Nf3");
    }

    #[test]
    fn test_apply_move_castling_from_king_squares() {
        let pos = load_position("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        assert_eq!(apply_move(&pos, "e1", "g1", None).unwrap(), "O-O");
        assert_eq!(apply_move(&pos, "e1", "c1", None).unwrap(), "O-O-O");
    }

    #[test]
    fn test_apply_move_promotion_and_mate_suffix() {
        let pos = load_position("7k/4P3/6K1/8/8/8/8/8 w - - 0 1").unwrap();
        assert_eq!(apply_move(&pos, "e7", "e8", Some('q')).unwrap(), "e8=Q#");
        assert_eq!(apply_move(&pos, "e7", "e8", Some('r')).unwrap(), "e8=R#");
        assert_eq!(apply_move(&pos, "e7", "e8", Some('n')).unwrap(), "e8=N");
    }

    #[test]
    fn test_apply_move_illegal() {
        let pos = load_position(START).unwrap();
        assert!(matches!(
            apply_move(&pos, "e2", "e5", None),
            Err(BoardError::IllegalMove { .. })
        ));
        assert!(matches!(
            apply_move(&pos, "z9", "e4", None),
            Err(BoardError::InvalidSquare(_))
        ));
        assert!(matches!(
            apply_move(&pos, "e2", "e4", Some('x')),
            Err(BoardError::InvalidPromotion('x'))
        ));
    }

    #[test]
    fn test_checkmate_detection() {
        // Fool's mate
        let mated =
            load_position("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3").unwrap();
        assert!(is_checkmate(&mated));
        assert!(!is_checkmate(&load_position(START).unwrap()));
    }

    #[test]
    fn test_side_to_move() {
        let pos = load_position("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1").unwrap();
        assert_eq!(side_to_move(&pos), Color::Black);
    }
}
