/// Board-game vocabulary shared by the hub: colors, results, moves and
/// canonical position helpers.
pub mod types;
pub mod position;
