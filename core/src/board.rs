use core::fmt;
use ndarray::Array2;
use rand::Rng;
use rand::seq::IteratorRandom;
use serde::{Deserialize, Serialize};

use crate::*;

/// Grid of cells indexed `[x, y]`. The mine layout never changes after construction, only cell states do.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    cells: Array2<Cell>,
    config: GameConfig,
}

impl Board {
    /// Builds a board with a randomly seeded mine placement.
    pub fn new(config: GameConfig) -> Result<Self> {
        Self::with_generator(config, RandomMineGenerator::from_entropy())
    }

    /// Fails when `config` has a zero dimension or leaves no safe cell.
    pub fn with_generator(config: GameConfig, generator: impl MineGenerator) -> Result<Self> {
        let config = GameConfig::new(config.size, config.mines)?;
        Ok(Self::from_layout(&generator.generate(config)))
    }

    pub fn from_layout(layout: &MineLayout) -> Self {
        let cells = Array2::from_shape_fn(layout.size().to_nd_index(), |(x, y)| {
            Cell::new((x as Coord, y as Coord), layout)
        });
        Self {
            cells,
            config: layout.game_config(),
        }
    }

    pub fn config(&self) -> GameConfig {
        self.config
    }

    pub fn size(&self) -> Coord2 {
        self.config.size
    }

    pub fn width(&self) -> Coord {
        self.config.width()
    }

    pub fn height(&self) -> Coord {
        self.config.height()
    }

    pub fn mine_count(&self) -> CellCount {
        self.config.mines
    }

    pub fn safe_cell_count(&self) -> CellCount {
        self.config.safe_cells()
    }

    pub fn cell(&self, coords: Coord2) -> &Cell {
        &self.cells[coords.to_nd_index()]
    }

    /// Resolves signed caller coordinates, `None` when they fall outside the grid.
    pub fn resolve(&self, x: i32, y: i32) -> Option<Coord2> {
        checked_coords(x, y, self.size())
    }

    pub fn get(&self, x: i32, y: i32) -> Option<&Cell> {
        self.resolve(x, y).map(|coords| self.cell(coords))
    }

    pub fn neighbors_of(&self, coords: Coord2) -> impl Iterator<Item = &Cell> {
        self.cell(coords)
            .neighbors()
            .iter()
            .map(|&pos| self.cell(pos))
    }

    /// All cells, column by column.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn snapshots(&self) -> Vec<CellSnapshot> {
        self.cells().map(Cell::snapshot).collect()
    }

    pub fn snapshots_of(&self, coords: &[Coord2]) -> Vec<CellSnapshot> {
        coords.iter().map(|&pos| self.cell(pos).snapshot()).collect()
    }

    pub fn count_in_state(&self, state: CellState) -> CellCount {
        self.cells().filter(|cell| cell.state == state).count() as CellCount
    }

    pub(crate) fn set_state(&mut self, coords: Coord2, state: CellState) {
        self.cells[coords.to_nd_index()].state = state;
    }

    /// Clears `coords` and, through zero-count cells, every safe cell connected to it.
    ///
    /// Only hidden safe cells are cleared, so flagged cells stop the fill and each cell is returned at most once.
    /// Returns the cleared coordinates, empty when `coords` was not a hidden safe cell.
    pub fn expand(&mut self, coords: Coord2) -> Vec<Coord2> {
        let mut cleared = Vec::new();
        let mut pending = vec![coords];

        while let Some(pos) = pending.pop() {
            let cell = &mut self.cells[pos.to_nd_index()];
            if !cell.state.is_hidden() || cell.is_mined() {
                continue;
            }

            cell.state = CellState::Cleared;
            cleared.push(pos);
            log::trace!("Cleared cell at {:?}, adjacent mines: {}", pos, cell.adjacent_mines());

            if cell.adjacent_mines() == 0 {
                let neighbors = cell.neighbors.clone();
                pending.extend(
                    neighbors
                        .into_iter()
                        .filter(|&next| self.cells[next.to_nd_index()].state.is_hidden()),
                );
            }
        }

        cleared
    }

    /// Shows every mine that did not explode and returns the coordinates of all mines, exploded ones included.
    pub fn reveal_mines(&mut self) -> Vec<Coord2> {
        let mut mines = Vec::with_capacity(self.mine_count() as usize);
        for cell in self.cells.iter_mut().filter(|cell| cell.is_mined()) {
            if cell.state != CellState::Exploded {
                cell.state = CellState::Revealed;
            }
            mines.push(cell.coords());
        }
        mines
    }

    /// Picks a random safe cell without adjacent mines, a guaranteed cascade for the first sweep.
    pub fn safe_start<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Coord2> {
        let start = self
            .cells()
            .filter(|cell| !cell.is_mined() && cell.adjacent_mines() == 0)
            .map(Cell::coords)
            .choose(rng);
        if start.is_none() {
            log::warn!("No safe cell without adjacent mines on this board");
        }
        start
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use CellState::*;

        for column in self.cells.outer_iter() {
            for cell in column.iter() {
                let symbol = match (cell.state(), cell.kind()) {
                    (Hidden, CellKind::Safe) => 'H',
                    (Hidden, CellKind::Mined) => '!',
                    (Cleared, _) => '_',
                    (Revealed, _) => '*',
                    (Flagged, _) => 'F',
                    (Exploded, _) => 'X',
                };
                write!(f, "{symbol}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
