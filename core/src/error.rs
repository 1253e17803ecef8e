use thiserror::Error;

use crate::{CellCount, Coord};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid board size {width}x{height}, both dimensions must be at least 1")]
    InvalidSize { width: Coord, height: Coord },
    #[error("Too many mines, requested {mines} but the board only has {cells} cells")]
    TooManyMines { mines: CellCount, cells: CellCount },
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Unknown difficulty {0:?}")]
    UnknownDifficulty(String),
}

pub type Result<T> = core::result::Result<T, GameError>;
