//! Canonical position strings.
//!
//! Positions use Forsyth-Edwards Notation. The hub never interprets the board
//! itself; it only reads the side-to-move field, which is the single source of
//! truth for whose turn it is.

use crate::game::types::Color;

/// Standard starting position.
pub const INITIAL_POSITION: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Side to move encoded in `position`, or `None` if the field is missing or
/// not one of `w`/`b`.
pub fn side_to_move(position: &str) -> Option<Color> {
    match position.split_whitespace().nth(1)? {
        "w" => Some(Color::White),
        "b" => Some(Color::Black),
        _ => None,
    }
}
