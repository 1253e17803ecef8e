use serde::{Deserialize, Serialize};
use web_time::Duration;

use crate::*;

/// Valid transitions:
/// - NotStarted -> InProgress
/// - InProgress -> Paused
/// - Paused -> InProgress
/// - InProgress -> Won
/// - InProgress -> Lost
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    /// Initial state, the clock has not run yet
    NotStarted,
    /// Moves are accepted and the clock runs
    InProgress,
    /// Clock stopped, moves are rejected until resumed
    Paused,
    /// Game ended and player won
    Won,
    /// Game ended and player lost
    Lost,
}

impl GameState {
    /// Indicates the game has ended and no moves can be made anymore
    pub const fn is_final(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }

    pub const fn can_resume(self) -> bool {
        !self.is_final() && !matches!(self, Self::InProgress)
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::NotStarted
    }
}

/// Runs one game at a time on a [`Board`], reporting every visible change to the sink `S`.
///
/// Moves are only legal while [`GameState::InProgress`]; calling them in any other state is a bug in the caller and
/// panics. Coordinates outside the board are ignored.
#[derive(Debug)]
pub struct GameEngine<S, C = SystemClock> {
    board: Board,
    state: GameState,
    flag_count: CellCount,
    cleared_count: CellCount,
    stopwatch: Stopwatch,
    sink: S,
    clock: C,
}

impl<S: ChangeSink> GameEngine<S> {
    /// Starts a randomly laid out game measured with the system clock.
    pub fn new(width: Coord, height: Coord, mines: CellCount, sink: S) -> Result<Self> {
        let board = Board::new(GameConfig {
            size: (width, height),
            mines,
        })?;
        Ok(Self::with_board(board, sink, SystemClock))
    }

    pub fn from_difficulty(difficulty: Difficulty, sink: S) -> Result<Self> {
        let config = difficulty.config();
        Self::new(config.width(), config.height(), config.mines, sink)
    }
}

impl<S: ChangeSink, C: Clock> GameEngine<S, C> {
    pub fn with_board(board: Board, sink: S, clock: C) -> Self {
        log::debug!(
            "New {}x{} game with {} mines",
            board.width(),
            board.height(),
            board.mine_count()
        );
        Self {
            board,
            state: GameState::NotStarted,
            flag_count: 0,
            cleared_count: 0,
            stopwatch: Stopwatch::default(),
            sink,
            clock,
        }
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn width(&self) -> Coord {
        self.board.width()
    }

    pub fn height(&self) -> Coord {
        self.board.height()
    }

    pub fn mine_count(&self) -> CellCount {
        self.board.mine_count()
    }

    pub fn flag_count(&self) -> CellCount {
        self.flag_count
    }

    /// How many mines have not been flagged yet, negative when over-flagged
    pub fn mines_left(&self) -> i64 {
        i64::from(self.board.mine_count()) - i64::from(self.flag_count)
    }

    pub fn cleared_count(&self) -> CellCount {
        self.cleared_count
    }

    /// Play time so far, counting only the intervals spent in progress.
    pub fn elapsed(&self) -> Duration {
        self.stopwatch.elapsed(self.clock.now())
    }

    pub fn cell(&self, x: i32, y: i32) -> Option<CellSnapshot> {
        self.board.get(x, y).map(Cell::snapshot)
    }

    pub fn all_cells(&self) -> Vec<CellSnapshot> {
        self.board.snapshots()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Facts to record as a score, only once the game is won.
    pub fn score(&self) -> Option<Score> {
        matches!(self.state, GameState::Won).then(|| Score {
            columns: self.width(),
            rows: self.height(),
            mines: self.mine_count(),
            elapsed: self.elapsed(),
        })
    }

    /// A random safe cell with no adjacent mines, if the board has one.
    pub fn safe_start(&self) -> Option<Coord2> {
        self.board.safe_start(&mut rand::rng())
    }

    pub fn resume(&mut self) {
        assert!(
            self.state.can_resume(),
            "resume called while game is {:?}",
            self.state
        );
        self.state = GameState::InProgress;
        self.stopwatch.start(self.clock.now());
        log::debug!("Game resumed, elapsed so far: {:?}", self.elapsed());
    }

    pub fn pause(&mut self) {
        assert!(
            matches!(self.state, GameState::InProgress),
            "pause called while game is {:?}",
            self.state
        );
        self.stop_timing();
        self.state = GameState::Paused;
        log::debug!("Game paused, elapsed: {:?}", self.elapsed());
    }

    /// Toggles a flag on a hidden cell. Opened cells are left alone.
    pub fn flag(&mut self, x: i32, y: i32) {
        self.check_in_progress("flag");

        let Some(coords) = self.board.resolve(x, y) else {
            log::trace!("Ignoring flag outside the board at ({}, {})", x, y);
            return;
        };

        match self.board.cell(coords).state() {
            CellState::Hidden => {
                self.board.set_state(coords, CellState::Flagged);
                self.flag_count += 1;
            }
            CellState::Flagged => {
                self.board.set_state(coords, CellState::Hidden);
                self.flag_count -= 1;
            }
            CellState::Cleared | CellState::Revealed | CellState::Exploded => return,
        }

        log::trace!("Flag toggled at {:?}, flags: {}", coords, self.flag_count);
        self.notify(&[coords]);
    }

    /// Opens a cell: safe cells flood-fill, a mine ends the game. Flagged cells are protected.
    pub fn sweep(&mut self, x: i32, y: i32) {
        self.check_in_progress("sweep");

        let Some(coords) = self.board.resolve(x, y) else {
            log::trace!("Ignoring sweep outside the board at ({}, {})", x, y);
            return;
        };

        let cell = self.board.cell(coords);
        if cell.state().is_flagged() {
            return;
        }

        match cell.kind() {
            CellKind::Safe => {
                let mut changed = self.board.expand(coords);
                if changed.is_empty() {
                    return;
                }
                self.cleared_count += changed.len() as CellCount;
                log::debug!(
                    "Swept {:?}, cleared {} cells, {} of {} safe cells open",
                    coords,
                    changed.len(),
                    self.cleared_count,
                    self.board.safe_cell_count()
                );

                if self.cleared_count == self.board.safe_cell_count() {
                    self.state = GameState::Won;
                    self.stop_timing();
                    changed.extend(self.reveal_mines());
                    log::debug!("Game won in {:?}", self.elapsed());
                }
                self.notify(&changed);
            }
            CellKind::Mined => {
                self.stop_timing();
                self.board.set_state(coords, CellState::Exploded);
                self.state = GameState::Lost;
                let mines = self.reveal_mines();
                log::debug!("Mine hit at {:?}, game lost", coords);
                self.notify(&mines);
            }
        }
    }

    /// Discards the board for a freshly generated one with the same configuration.
    pub fn new_game(&mut self) {
        self.new_game_with(RandomMineGenerator::from_entropy());
    }

    pub fn new_game_with(&mut self, generator: impl MineGenerator) {
        // the current board already passed validation
        let config = self.board.config();
        self.board = Board::from_layout(&generator.generate(config));
        self.state = GameState::NotStarted;
        self.flag_count = 0;
        self.cleared_count = 0;
        self.stopwatch = Stopwatch::default();
        log::debug!(
            "New {}x{} game with {} mines",
            config.width(),
            config.height(),
            config.mines
        );
        self.sink.cells_changed(&self.board.snapshots());
    }

    fn reveal_mines(&mut self) -> Vec<Coord2> {
        let mines = self.board.reveal_mines();
        // flagged mines are shown as revealed too
        self.flag_count = self.board.count_in_state(CellState::Flagged);
        mines
    }

    fn stop_timing(&mut self) {
        assert!(
            self.stopwatch.is_running(),
            "timing stopped while game is {:?}",
            self.state
        );
        self.stopwatch.stop(self.clock.now());
    }

    fn check_in_progress(&self, operation: &str) {
        assert!(
            matches!(self.state, GameState::InProgress),
            "{operation} called while game is {:?}",
            self.state
        );
    }

    fn notify(&mut self, coords: &[Coord2]) {
        let cells = self.board.snapshots_of(coords);
        self.sink.cells_changed(&cells);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    type TestEngine = GameEngine<RecordingSink, ManualClock>;

    fn engine(size: Coord2, mines: &[Coord2]) -> (TestEngine, ManualClock) {
        let layout = MineLayout::from_mine_coords(size, mines).unwrap();
        let clock = ManualClock::new();
        let engine = GameEngine::with_board(
            Board::from_layout(&layout),
            RecordingSink::default(),
            clock.clone(),
        );
        (engine, clock)
    }

    fn started(size: Coord2, mines: &[Coord2]) -> (TestEngine, ManualClock) {
        let (mut engine, clock) = engine(size, mines);
        engine.resume();
        (engine, clock)
    }

    fn state_at(engine: &TestEngine, x: i32, y: i32) -> CellState {
        engine.cell(x, y).unwrap().state
    }

    #[test]
    fn new_rejects_invalid_config() {
        assert!(matches!(
            GameEngine::new(2, 2, 4, NullSink),
            Err(GameError::TooManyMines { .. })
        ));
        assert!(matches!(
            GameEngine::new(0, 3, 0, NullSink),
            Err(GameError::InvalidSize { .. })
        ));
    }

    #[test]
    fn new_engine_starts_not_started() {
        let engine = GameEngine::from_difficulty(Difficulty::Easy, NullSink).unwrap();

        assert_eq!(engine.state(), GameState::NotStarted);
        assert_eq!(engine.width(), 10);
        assert_eq!(engine.height(), 10);
        assert_eq!(engine.mine_count(), 10);
        assert_eq!(engine.flag_count(), 0);
        assert_eq!(engine.elapsed(), Duration::ZERO);
        assert_eq!(engine.all_cells().len(), 100);
    }

    #[test]
    fn sweeping_only_safe_cell_wins() {
        let (mut engine, _) = started((2, 1), &[(0, 0)]);

        engine.sweep(1, 0);

        assert_eq!(engine.state(), GameState::Won);
        assert_eq!(state_at(&engine, 1, 0), CellState::Cleared);
        assert_eq!(state_at(&engine, 0, 0), CellState::Revealed);
        let batch = engine.sink().last().unwrap();
        let coords: HashSet<_> = batch.iter().map(|cell| cell.coords).collect();
        assert_eq!(coords, HashSet::from([(0, 0), (1, 0)]));
        assert_eq!(engine.sink().batches.len(), 1);
    }

    #[test]
    fn sweeping_mine_loses_and_reveals_others() {
        let (mut engine, _) = started((3, 3), &[(0, 0), (2, 2), (0, 2)]);

        engine.sweep(0, 0);

        assert_eq!(engine.state(), GameState::Lost);
        assert_eq!(state_at(&engine, 0, 0), CellState::Exploded);
        assert_eq!(state_at(&engine, 2, 2), CellState::Revealed);
        assert_eq!(state_at(&engine, 0, 2), CellState::Revealed);
        assert_eq!(state_at(&engine, 1, 1), CellState::Hidden);

        let batch = engine.sink().last().unwrap();
        assert_eq!(batch.len(), 3);
        assert!(batch.iter().all(|cell| cell.kind == CellKind::Mined));
        assert!(
            batch
                .iter()
                .any(|cell| cell.coords == (0, 0) && cell.state == CellState::Exploded)
        );
    }

    #[test]
    fn loss_reveals_flagged_mines() {
        let (mut engine, _) = started((3, 1), &[(0, 0), (2, 0)]);

        engine.flag(2, 0);
        assert_eq!(engine.flag_count(), 1);
        engine.sweep(0, 0);

        assert_eq!(state_at(&engine, 2, 0), CellState::Revealed);
        assert_eq!(engine.flag_count(), 0);
    }

    #[test]
    fn win_reveals_flagged_mines() {
        let (mut engine, _) = started((3, 1), &[(0, 0)]);
        engine.flag(0, 0);
        engine.sink_mut().take();

        engine.sweep(2, 0);

        assert_eq!(engine.state(), GameState::Won);
        assert_eq!(engine.flag_count(), 0);
        assert_eq!(state_at(&engine, 0, 0), CellState::Revealed);
        let batches = engine.sink().batches.clone();
        assert_eq!(batches.len(), 1);
        assert!(
            batches[0]
                .iter()
                .any(|cell| cell.coords == (0, 0) && cell.state == CellState::Revealed)
        );
        assert_eq!(batches[0].len(), 3);
    }

    #[test]
    fn only_unfinished_games_resume() {
        assert!(GameState::NotStarted.can_resume());
        assert!(GameState::Paused.can_resume());
        assert!(!GameState::InProgress.can_resume());
        assert!(!GameState::Won.can_resume());
        assert!(!GameState::Lost.can_resume());
        assert!(GameState::Lost.is_final());
    }

    #[test]
    fn sweep_cascade_notifies_once() {
        let (mut engine, _) = started((4, 4), &[(3, 3)]);

        engine.sweep(0, 0);

        assert_eq!(engine.state(), GameState::Won);
        assert_eq!(engine.cleared_count(), 15);
        let batches = engine.sink().batches.clone();
        assert_eq!(batches.len(), 1);
        let coords: HashSet<_> = batches[0].iter().map(|cell| cell.coords).collect();
        assert_eq!(coords.len(), 16);
        assert_eq!(batches[0].len(), 16);
    }

    #[test]
    fn partial_sweep_stays_in_progress() {
        let (mut engine, _) = started((3, 3), &[(0, 0)]);

        engine.sweep(1, 1);

        assert_eq!(engine.state(), GameState::InProgress);
        assert_eq!(engine.cleared_count(), 1);
        let batch = engine.sink().last().unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].coords, (1, 1));
        assert_eq!(batch[0].adjacent_mines, 1);
    }

    #[test]
    fn sweep_on_opened_cell_does_not_notify() {
        let (mut engine, _) = started((3, 3), &[(0, 0)]);

        engine.sweep(1, 1);
        engine.sweep(1, 1);

        assert_eq!(engine.sink().batches.len(), 1);
        assert_eq!(engine.cleared_count(), 1);
    }

    #[test]
    fn flagged_cell_is_protected() {
        let (mut engine, _) = started((3, 3), &[(0, 0)]);
        engine.flag(0, 0);
        engine.sink_mut().take();

        engine.sweep(0, 0);

        assert_eq!(engine.state(), GameState::InProgress);
        assert_eq!(state_at(&engine, 0, 0), CellState::Flagged);
        assert!(engine.sink().batches.is_empty());
    }

    #[test]
    fn flag_toggles_and_counts() {
        let (mut engine, _) = started((3, 3), &[(0, 0)]);

        engine.flag(2, 2);
        assert_eq!(engine.flag_count(), 1);
        assert_eq!(engine.mines_left(), 0);
        assert_eq!(state_at(&engine, 2, 2), CellState::Flagged);

        engine.flag(2, 1);
        assert_eq!(engine.mines_left(), -1);

        engine.flag(2, 2);
        assert_eq!(engine.flag_count(), 1);
        assert_eq!(state_at(&engine, 2, 2), CellState::Hidden);

        let batches = engine.sink().batches.clone();
        assert_eq!(batches.len(), 3);
        assert!(batches.iter().all(|batch| batch.len() == 1));
        assert_eq!(batches[2][0].coords, (2, 2));
    }

    #[test]
    fn flag_on_cleared_cell_is_noop() {
        let (mut engine, _) = started((3, 3), &[(0, 0)]);
        engine.sweep(1, 1);
        engine.sink_mut().take();

        engine.flag(1, 1);

        assert_eq!(engine.flag_count(), 0);
        assert_eq!(state_at(&engine, 1, 1), CellState::Cleared);
        assert!(engine.sink().batches.is_empty());
    }

    #[test]
    fn out_of_bounds_is_ignored() {
        let (mut engine, _) = started((3, 2), &[(0, 0)]);
        let before = engine.all_cells();

        engine.flag(-1, -1);
        engine.sweep(3, 2);
        engine.sweep(-1, 0);
        engine.flag(0, 2);

        assert_eq!(engine.all_cells(), before);
        assert_eq!(engine.flag_count(), 0);
        assert_eq!(engine.state(), GameState::InProgress);
        assert!(engine.sink().batches.is_empty());
    }

    #[test]
    fn elapsed_counts_only_running_intervals() {
        let (mut engine, clock) = engine((3, 3), &[(0, 0)]);
        clock.advance(Duration::from_secs(30));
        assert_eq!(engine.elapsed(), Duration::ZERO);

        engine.resume();
        clock.advance(Duration::from_secs(4));
        engine.pause();
        let first = engine.elapsed();
        assert_eq!(first, Duration::from_secs(4));

        clock.advance(Duration::from_secs(60));
        assert_eq!(engine.elapsed(), first);

        engine.resume();
        clock.advance(Duration::from_secs(6));
        assert_eq!(engine.elapsed(), Duration::from_secs(10));
        engine.pause();
        assert_eq!(engine.elapsed(), Duration::from_secs(10));
        assert_eq!(engine.state(), GameState::Paused);
    }

    #[test]
    fn timing_stops_when_game_ends() {
        let (mut engine, clock) = started((2, 1), &[(0, 0)]);
        clock.advance(Duration::from_secs(12));

        engine.sweep(1, 0);
        clock.advance(Duration::from_secs(50));

        assert_eq!(engine.elapsed(), Duration::from_secs(12));
        let score = engine.score().unwrap();
        assert_eq!(score.columns, 2);
        assert_eq!(score.rows, 1);
        assert_eq!(score.mines, 1);
        assert_eq!(score.elapsed, Duration::from_secs(12));
    }

    #[test]
    fn no_score_unless_won() {
        let (mut engine, _) = started((2, 1), &[(0, 0)]);
        assert_eq!(engine.score(), None);

        engine.sweep(0, 0);

        assert_eq!(engine.state(), GameState::Lost);
        assert_eq!(engine.score(), None);
    }

    #[test]
    #[should_panic(expected = "sweep called while game is NotStarted")]
    fn sweep_before_resume_panics() {
        let (mut engine, _) = engine((3, 3), &[(0, 0)]);
        engine.sweep(1, 1);
    }

    #[test]
    #[should_panic(expected = "flag called while game is Paused")]
    fn flag_while_paused_panics() {
        let (mut engine, _) = started((3, 3), &[(0, 0)]);
        engine.pause();
        engine.flag(1, 1);
    }

    #[test]
    #[should_panic(expected = "sweep called while game is Lost")]
    fn sweep_after_loss_panics() {
        let (mut engine, _) = started((3, 3), &[(0, 0)]);
        engine.sweep(0, 0);
        engine.sweep(1, 1);
    }

    #[test]
    #[should_panic(expected = "resume called while game is InProgress")]
    fn double_resume_panics() {
        let (mut engine, _) = started((3, 3), &[(0, 0)]);
        engine.resume();
    }

    #[test]
    #[should_panic(expected = "resume called while game is Won")]
    fn resume_after_win_panics() {
        let (mut engine, _) = started((2, 1), &[(0, 0)]);
        engine.sweep(1, 0);
        engine.resume();
    }

    #[test]
    #[should_panic(expected = "pause called while game is NotStarted")]
    fn pause_before_start_panics() {
        let (mut engine, _) = engine((3, 3), &[(0, 0)]);
        engine.pause();
    }

    #[test]
    fn new_game_resets_everything() {
        let (mut engine, clock) = started((4, 4), &[(0, 0)]);
        engine.flag(0, 0);
        engine.sweep(3, 3);
        clock.advance(Duration::from_secs(9));
        engine.sink_mut().take();

        engine.new_game_with(RandomMineGenerator::new(5));

        assert_eq!(engine.state(), GameState::NotStarted);
        assert_eq!(engine.flag_count(), 0);
        assert_eq!(engine.cleared_count(), 0);
        assert_eq!(engine.elapsed(), Duration::ZERO);
        assert_eq!(engine.mine_count(), 1);
        assert!(
            engine
                .all_cells()
                .iter()
                .all(|cell| cell.state == CellState::Hidden)
        );
        let batches = engine.sink().batches.clone();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 16);
    }

    #[test]
    fn closure_sink_receives_changes() {
        let layout = MineLayout::from_mine_coords((2, 2), &[(1, 1)]).unwrap();
        let mut seen = Vec::new();
        {
            let mut engine = GameEngine::with_board(
                Board::from_layout(&layout),
                |cells: &[CellSnapshot]| seen.extend_from_slice(cells),
                SystemClock,
            );
            engine.resume();
            engine.flag(1, 1);
        }

        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].state, CellState::Flagged);
    }

    #[test]
    fn safe_start_cascades() {
        let (mut engine, _) = started((6, 6), &[(0, 0), (5, 5)]);

        let (x, y) = engine.safe_start().unwrap();
        engine.sweep(i32::from(x), i32::from(y));

        assert!(engine.cleared_count() > 1);
    }
}
