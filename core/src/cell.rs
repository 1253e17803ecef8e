use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::*;

/// What a cell holds, fixed when the board is built.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    Safe,
    Mined,
}

/// Player-visible state of a cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellState {
    Hidden,
    /// Safe cell opened by a sweep.
    Cleared,
    /// Mine shown after the game ended.
    Revealed,
    Flagged,
    /// The mine that ended the game.
    Exploded,
}

impl CellState {
    pub const fn is_hidden(self) -> bool {
        matches!(self, Self::Hidden)
    }

    pub const fn is_flagged(self) -> bool {
        matches!(self, Self::Flagged)
    }
}

impl Default for CellState {
    fn default() -> Self {
        Self::Hidden
    }
}

/// One board position. Neighbors and the adjacent mine count are resolved once when the board is built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    coords: Coord2,
    kind: CellKind,
    pub(crate) state: CellState,
    adjacent_mines: u8,
    pub(crate) neighbors: SmallVec<[Coord2; 8]>,
}

impl Cell {
    pub(crate) fn new(coords: Coord2, layout: &MineLayout) -> Self {
        let kind = if layout.contains_mine(coords) {
            CellKind::Mined
        } else {
            CellKind::Safe
        };
        Self {
            coords,
            kind,
            state: CellState::Hidden,
            adjacent_mines: layout.adjacent_mine_count(coords),
            neighbors: layout.iter_neighbors(coords).collect(),
        }
    }

    pub fn coords(&self) -> Coord2 {
        self.coords
    }

    pub fn kind(&self) -> CellKind {
        self.kind
    }

    pub fn is_mined(&self) -> bool {
        matches!(self.kind, CellKind::Mined)
    }

    pub fn state(&self) -> CellState {
        self.state
    }

    pub fn adjacent_mines(&self) -> u8 {
        self.adjacent_mines
    }

    /// Coordinates of the in-bounds neighbors.
    pub fn neighbors(&self) -> &[Coord2] {
        &self.neighbors
    }

    pub fn snapshot(&self) -> CellSnapshot {
        CellSnapshot {
            coords: self.coords,
            kind: self.kind,
            state: self.state,
            adjacent_mines: self.adjacent_mines,
        }
    }
}

/// Copy of a cell handed to change sinks and full redraws.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellSnapshot {
    pub coords: Coord2,
    pub kind: CellKind,
    pub state: CellState,
    pub adjacent_mines: u8,
}
