use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Board needs an even number of tiles")]
    OddTileCount,
    #[error("Board must have at least one row and column")]
    EmptyBoard,
    #[error("Game is not being played, no new moves are accepted")]
    NotPlaying,
    #[error("Board is settling, try again shortly")]
    Busy,
}

pub type Result<T> = core::result::Result<T, GameError>;
