/// Errors reported back to a single client over its WebSocket.
///
/// Every variant is local to the message that caused it: the hub sends the
/// `Display` text to the originating connection as an `error` event and leaves
/// its state untouched.
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HubError {
    #[error("Invalid message: {0}")]
    BadPayload(String),
    #[error("Game not found")]
    RoomNotFound,
    #[error("You are not seated in this game")]
    NotInRoom,
    #[error("Not your turn")]
    NotYourTurn,
    #[error("Move is missing the resulting position")]
    MissingPosition,
    #[error("Invalid position: {0}")]
    InvalidPosition(String),
    #[error("Game has already ended")]
    GameEnded,
    #[error("Could not allocate a unique game id")]
    RoomAlreadyExists,
}
