// Core game logic
// Tracks revealed and marked cells on top of the minefield, drives reveal, chord, win/loss and the round timer

use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

use crate::xtm_field::{FieldError, Minefield};

/// Player mark on a hidden cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    None,
    Flag,
    Question,
}

/// Round status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Ready,   // waiting for the first reveal, no mines placed
    Playing, // mines placed, round in progress
    Won,
    Lost,
}

/// Result of a reveal or chord action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    Ignored,       // nothing changed
    Opened(usize), // number of newly revealed cells
    Exploded,      // a mine was revealed, round lost
    Won,           // last safe cell revealed
}

/// What a single cell should look like to the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellView {
    Hidden,
    Flagged,
    Questioned,
    Open(u8),  // revealed safe cell with its adjacent mine count
    Mine,      // mine shown after the round ended
    Exploded,  // the mine that ended the round
    WrongFlag, // flag on a safe cell, shown after a loss
}

/// Round timer: starts with the round, freezes when the round ends
#[derive(Debug, Clone)]
struct RoundTimer {
    started: Instant,
    frozen: Option<Duration>,
}

impl RoundTimer {
    fn start() -> Self {
        RoundTimer {
            started: Instant::now(),
            frozen: None,
        }
    }

    fn stop(&mut self) {
        if self.frozen.is_none() {
            self.frozen = Some(self.started.elapsed());
        }
    }

    fn elapsed(&self) -> Duration {
        self.frozen.unwrap_or_else(|| self.started.elapsed())
    }
}

/// Main game state
pub struct Game {
    field: Minefield,
    revealed: Vec<bool>,
    marks: Vec<Mark>,
    status: GameStatus,
    exploded: Option<(usize, usize)>,
    timer: RoundTimer,
    rng: StdRng,
    use_question_marks: bool,
    pub cursor: (usize, usize), // (row, col)
}

impl Game {
    /// Create a new round; mines are placed on the first reveal
    pub fn new(size: usize, mines: usize, rng: StdRng) -> Result<Self, FieldError> {
        let field = Minefield::new(size, mines)?;
        let cells = size * size;
        info!("New {}x{} game with {} mines", size, size, mines);
        Ok(Game {
            field,
            revealed: vec![false; cells],
            marks: vec![Mark::None; cells],
            status: GameStatus::Ready,
            exploded: None,
            timer: RoundTimer::start(),
            rng,
            use_question_marks: false,
            cursor: (0, 0),
        })
    }

    /// Create a new round with a fixed seed, or an entropy-seeded one
    pub fn from_seed(size: usize, mines: usize, seed: Option<u64>) -> Result<Self, FieldError> {
        let rng = match seed {
            Some(s) => {
                debug!("Using fixed RNG seed {}", s);
                StdRng::seed_from_u64(s)
            }
            None => StdRng::from_entropy(),
        };
        Game::new(size, mines, rng)
    }

    pub fn size(&self) -> usize {
        self.field.size()
    }

    pub fn mine_count(&self) -> usize {
        self.field.mine_count()
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_over(&self) -> bool {
        matches!(self.status, GameStatus::Won | GameStatus::Lost)
    }

    /// Read-only access to the underlying minefield
    pub fn field(&self) -> &Minefield {
        &self.field
    }

    pub fn set_question_marks(&mut self, enabled: bool) {
        self.use_question_marks = enabled;
    }

    fn index(&self, row: usize, col: usize) -> Result<usize, FieldError> {
        let size = self.field.size();
        if row < size && col < size {
            Ok(row * size + col)
        } else {
            Err(FieldError::OutOfRange { row, col, size })
        }
    }

    pub fn is_revealed(&self, row: usize, col: usize) -> Result<bool, FieldError> {
        Ok(self.revealed[self.index(row, col)?])
    }

    pub fn mark(&self, row: usize, col: usize) -> Result<Mark, FieldError> {
        Ok(self.marks[self.index(row, col)?])
    }

    /// Reveal a cell
    /// - First reveal of a round places mines with this cell as the safe origin
    /// - Zero-count cells open their neighbors (iterative flood fill)
    /// - Flagged cells are skipped, `?` cells may be revealed
    #[instrument(level = "trace", skip(self))]
    pub fn reveal(&mut self, row: usize, col: usize) -> Result<RevealOutcome, FieldError> {
        let idx = self.index(row, col)?;
        if self.is_over() || self.revealed[idx] || self.marks[idx] == Mark::Flag {
            return Ok(RevealOutcome::Ignored);
        }

        if self.status == GameStatus::Ready {
            self.field.place_mines(row, col, &mut self.rng)?;
            self.status = GameStatus::Playing;
            debug!("First reveal at ({}, {}), round started", row, col);
        }

        if self.field.is_mine(row, col)? {
            self.lose(row, col);
            return Ok(RevealOutcome::Exploded);
        }

        let opened = self.flood_fill(row, col)?;
        Ok(self.settle(opened))
    }

    /// Open every hidden neighbor of a revealed number whose flags are all placed
    /// Returns `Ignored` when the cell is not a satisfied number
    #[instrument(level = "trace", skip(self))]
    pub fn chord(&mut self, row: usize, col: usize) -> Result<RevealOutcome, FieldError> {
        let idx = self.index(row, col)?;
        if self.is_over() || !self.revealed[idx] {
            return Ok(RevealOutcome::Ignored);
        }
        let count = match self.field.adjacent_mines(row, col)? {
            Some(n) if n > 0 => n as usize,
            _ => return Ok(RevealOutcome::Ignored),
        };

        let neighbors: Vec<(usize, usize)> = self.field.neighbors(row, col)?.collect();
        let flags = neighbors
            .iter()
            .filter(|&&(r, c)| self.marks[r * self.size() + c] == Mark::Flag)
            .count();
        if flags != count {
            debug!("Chord at ({}, {}) refused: {} flags for {} mines", row, col, flags, count);
            return Ok(RevealOutcome::Ignored);
        }

        let size = self.size();
        let targets: Vec<(usize, usize)> = neighbors
            .into_iter()
            .filter(|&(r, c)| !self.revealed[r * size + c] && self.marks[r * size + c] != Mark::Flag)
            .collect();

        // A wrong flag leaves an unflagged mine among the targets
        if let Some(&(r, c)) = targets.iter().find(|&&(r, c)| self.field.is_mine(r, c).unwrap_or(false)) {
            self.lose(r, c);
            return Ok(RevealOutcome::Exploded);
        }

        let mut opened = 0;
        for (r, c) in targets {
            opened += self.flood_fill(r, c)?;
        }
        Ok(self.settle(opened))
    }

    /// Cycle the mark on a hidden cell and return the new mark
    /// none -> flag -> none, or none -> flag -> ? -> none with question marks enabled
    pub fn toggle_flag(&mut self, row: usize, col: usize) -> Result<Mark, FieldError> {
        let idx = self.index(row, col)?;
        if self.is_over() || self.revealed[idx] {
            return Ok(self.marks[idx]);
        }
        self.marks[idx] = match (self.marks[idx], self.use_question_marks) {
            (Mark::None, _) => Mark::Flag,
            (Mark::Flag, true) => Mark::Question,
            (Mark::Flag, false) | (Mark::Question, _) => Mark::None,
        };
        debug!("Cell ({}, {}) mark -> {:?}", row, col, self.marks[idx]);
        Ok(self.marks[idx])
    }

    /// Start a new round on the same field; mines are placed again on the next reveal
    pub fn reset(&mut self) {
        self.field.reset();
        self.revealed.iter_mut().for_each(|r| *r = false);
        self.marks.iter_mut().for_each(|m| *m = Mark::None);
        self.status = GameStatus::Ready;
        self.exploded = None;
        self.timer = RoundTimer::start();
        info!("Game reset");
    }

    /// Mine counter display value (mines minus flags)
    /// Can be negative if too many flags are placed
    pub fn remaining_mines(&self) -> isize {
        let flags = self.marks.iter().filter(|m| **m == Mark::Flag).count();
        self.field.mine_count() as isize - flags as isize
    }

    /// Whole seconds since the round began, frozen once it ended
    pub fn elapsed_secs(&self) -> u64 {
        self.timer.elapsed().as_secs()
    }

    /// Check if all non-mine cells have been revealed
    pub fn check_win(&self) -> bool {
        let size = self.size();
        (0..size * size).all(|i| {
            self.revealed[i] || self.field.is_mine(i / size, i % size).unwrap_or(false)
        })
    }

    pub fn cell_view(&self, row: usize, col: usize) -> Result<CellView, FieldError> {
        let idx = self.index(row, col)?;
        let mine = self.field.is_mine(row, col)?;
        let view = if self.exploded == Some((row, col)) {
            CellView::Exploded
        } else if self.revealed[idx] {
            match self.field.adjacent_mines(row, col)? {
                Some(n) => CellView::Open(n),
                None => CellView::Mine,
            }
        } else {
            match self.marks[idx] {
                Mark::Flag if self.status == GameStatus::Lost && !mine => CellView::WrongFlag,
                Mark::Flag => CellView::Flagged,
                _ if self.status == GameStatus::Lost && mine => CellView::Mine,
                Mark::Question => CellView::Questioned,
                Mark::None => CellView::Hidden,
            }
        };
        Ok(view)
    }

    /// Move the cursor, clamped to the board
    pub fn step_cursor(&mut self, drow: isize, dcol: isize) {
        let last = (self.size() - 1) as isize;
        let row = (self.cursor.0 as isize + drow).clamp(0, last) as usize;
        let col = (self.cursor.1 as isize + dcol).clamp(0, last) as usize;
        self.cursor = (row, col);
    }

    // Worklist flood fill; every cell is pushed at most once per reveal
    fn flood_fill(&mut self, row: usize, col: usize) -> Result<usize, FieldError> {
        let size = self.size();
        let mut opened = 0;
        let mut stack = vec![(row, col)];
        while let Some((r, c)) = stack.pop() {
            let idx = r * size + c;
            if self.revealed[idx] || self.marks[idx] == Mark::Flag {
                continue;
            }
            self.revealed[idx] = true;
            opened += 1;
            if self.field.adjacent_mines(r, c)? == Some(0) {
                stack.extend(
                    self.field
                        .neighbors(r, c)?
                        .filter(|&(nr, nc)| !self.revealed[nr * size + nc]),
                );
            }
        }
        Ok(opened)
    }

    fn settle(&mut self, opened: usize) -> RevealOutcome {
        if opened == 0 {
            return RevealOutcome::Ignored;
        }
        if !self.check_win() {
            return RevealOutcome::Opened(opened);
        }
        // Auto-flag remaining mines on a win
        let size = self.size();
        for i in 0..size * size {
            if self.field.is_mine(i / size, i % size).unwrap_or(false) {
                self.marks[i] = Mark::Flag;
            }
        }
        self.timer.stop();
        self.status = GameStatus::Won;
        info!("Game won in {}s", self.elapsed_secs());
        RevealOutcome::Won
    }

    fn lose(&mut self, row: usize, col: usize) {
        let idx = row * self.size() + col;
        self.revealed[idx] = true;
        self.exploded = Some((row, col));
        self.timer.stop();
        self.status = GameStatus::Lost;
        info!("Mine hit at ({}, {}) after {}s, game over", row, col, self.elapsed_secs());
    }
}
