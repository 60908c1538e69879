use thiserror::Error;

/// Failures reported back to the requesting client as [`tilepair_protocol::Reply::Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("Room not found")]
    NotFound,
    #[error("Room is full")]
    Full,
    #[error("Only host can restart")]
    NotHost,
    #[error("Not in a room")]
    NotInRoom,
    #[error("Already in a room")]
    AlreadyInRoom,
    #[error("Waiting for an opponent")]
    WaitingForOpponent,
    #[error("No room codes left")]
    NoRoomIdsLeft,
    #[error("Invalid room code")]
    InvalidRoomId,
}

pub type Result<T> = std::result::Result<T, RoomError>;
