//! Position sources for engine analysis runs.
//!
//! Turns a PGN or a plain FEN list into the ordered FEN sequence the
//! analysis pipeline consumes.

pub mod game_data;
pub mod pgn;
pub mod positions;

pub use game_data::{GameData, GameMetadata};
pub use pgn::{parse_pgn, PgnError};
pub use positions::{positions_from_sans, read_fen_list, STANDARD_START_FEN};
