// Minefield model
// Owns mine locations and adjacency counts; placement takes an injected random source

use rand::Rng;
use rand::seq::SliceRandom;
use thiserror::Error;
use tracing::{debug, trace};

/// Caller-contract violations reported by the minefield
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("invalid field configuration: {mines} mines on a {size}x{size} grid")]
    InvalidConfig { size: usize, mines: usize },
    #[error("cell ({row}, {col}) is outside the {size}x{size} grid")]
    OutOfRange { row: usize, col: usize, size: usize },
    #[error("mines are already placed, reset the field first")]
    AlreadyPlaced,
    #[error("expected {expected} mines, got {actual}")]
    MineCountMismatch { expected: usize, actual: usize },
}

/// Placement state of the field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldState {
    Empty,     // no mines yet
    Populated, // mines placed and counts computed
}

/// Square minefield of `size x size` cells
#[derive(Debug, Clone)]
pub struct Minefield {
    size: usize,
    mine_count: usize,
    mines: Vec<bool>,  // row-major, true marks a mine
    adjacent: Vec<u8>, // row-major counts; 0 at mine cells
    state: FieldState,
}

impl Minefield {
    /// Create an empty field
    /// Fails unless `size > 0` and at least one cell stays free of mines
    pub fn new(size: usize, mine_count: usize) -> Result<Self, FieldError> {
        let invalid = FieldError::InvalidConfig {
            size,
            mines: mine_count,
        };
        let cells = size.checked_mul(size).ok_or_else(|| invalid.clone())?;
        if size == 0 || mine_count >= cells {
            return Err(invalid);
        }
        Ok(Minefield {
            size,
            mine_count,
            mines: vec![false; cells],
            adjacent: vec![0; cells],
            state: FieldState::Empty,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn mine_count(&self) -> usize {
        self.mine_count
    }

    pub fn state(&self) -> FieldState {
        self.state
    }

    pub fn is_populated(&self) -> bool {
        self.state == FieldState::Populated
    }

    fn index(&self, row: usize, col: usize) -> Result<usize, FieldError> {
        if row < self.size && col < self.size {
            Ok(row * self.size + col)
        } else {
            Err(FieldError::OutOfRange {
                row,
                col,
                size: self.size,
            })
        }
    }

    /// Place `mine_count` mines uniformly among every cell except the origin
    /// The eligible cells are partially shuffled, so this always terminates,
    /// even when only the origin is left free
    pub fn place_mines<R: Rng + ?Sized>(
        &mut self,
        origin_row: usize,
        origin_col: usize,
        rng: &mut R,
    ) -> Result<(), FieldError> {
        if self.is_populated() {
            return Err(FieldError::AlreadyPlaced);
        }
        let origin = self.index(origin_row, origin_col)?;

        let mut candidates: Vec<usize> = (0..self.mines.len()).filter(|&i| i != origin).collect();
        let (chosen, _) = candidates.partial_shuffle(rng, self.mine_count);
        for &i in chosen.iter() {
            self.mines[i] = true;
        }

        self.compute_adjacency();
        self.state = FieldState::Populated;
        debug!(
            "Placed {} mines on {}x{} field, safe origin ({}, {})",
            self.mine_count, self.size, self.size, origin_row, origin_col
        );
        Ok(())
    }

    /// Place mines at exactly the given cells (duplicates count once)
    /// Used for pre-assigned layouts where randomness is not wanted
    pub fn place_mines_at(&mut self, cells: &[(usize, usize)]) -> Result<(), FieldError> {
        if self.is_populated() {
            return Err(FieldError::AlreadyPlaced);
        }
        let mut layout = vec![false; self.mines.len()];
        for &(row, col) in cells {
            layout[self.index(row, col)?] = true;
        }
        let actual = layout.iter().filter(|m| **m).count();
        if actual != self.mine_count {
            return Err(FieldError::MineCountMismatch {
                expected: self.mine_count,
                actual,
            });
        }

        self.mines = layout;
        self.compute_adjacency();
        self.state = FieldState::Populated;
        debug!("Placed {} mines from a fixed layout", actual);
        Ok(())
    }

    // Counts are only written for non-mine cells; mine cells keep the 0 from reset
    fn compute_adjacency(&mut self) {
        for row in 0..self.size {
            for col in 0..self.size {
                let idx = row * self.size + col;
                if self.mines[idx] {
                    continue;
                }
                let count = self
                    .around(row, col)
                    .filter(|&(r, c)| self.mines[r * self.size + c])
                    .count();
                self.adjacent[idx] = count as u8;
            }
        }
        trace!("Adjacency counts computed for {} cells", self.adjacent.len());
    }

    /// Iterate over the up-to-8 neighbors of a cell, clipped to the grid
    /// Corners have 3 neighbors, edges 5, interior cells 8
    pub fn neighbors(&self, row: usize, col: usize) -> Result<impl Iterator<Item = (usize, usize)> + use<>, FieldError> {
        self.index(row, col)?;
        Ok(self.around(row, col))
    }

    // Caller guarantees row and col are inside the grid
    fn around(&self, row: usize, col: usize) -> impl Iterator<Item = (usize, usize)> + use<> {
        let last = self.size - 1;
        let rows = row.saturating_sub(1)..=(row + 1).min(last);
        let cols = col.saturating_sub(1)..=(col + 1).min(last);
        rows.flat_map(move |r| cols.clone().map(move |c| (r, c)))
            .filter(move |&cell| cell != (row, col))
    }

    pub fn is_mine(&self, row: usize, col: usize) -> Result<bool, FieldError> {
        Ok(self.mines[self.index(row, col)?])
    }

    /// Number of mines around a cell, or `None` when the cell itself is a mine
    /// Every cell reports `Some(0)` before placement
    pub fn adjacent_mines(&self, row: usize, col: usize) -> Result<Option<u8>, FieldError> {
        let idx = self.index(row, col)?;
        if self.mines[idx] {
            Ok(None)
        } else {
            Ok(Some(self.adjacent[idx]))
        }
    }

    /// Clear every mine and count, keeping the allocated grids
    pub fn reset(&mut self) {
        self.mines.iter_mut().for_each(|m| *m = false);
        self.adjacent.iter_mut().for_each(|a| *a = 0);
        self.state = FieldState::Empty;
        trace!("Minefield reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn mines_of(field: &Minefield) -> Vec<(usize, usize)> {
        let n = field.size();
        (0..n)
            .flat_map(|r| (0..n).map(move |c| (r, c)))
            .filter(|&(r, c)| field.is_mine(r, c).unwrap())
            .collect()
    }

    #[test]
    fn new_field_is_empty() {
        let field = Minefield::new(4, 0).unwrap();
        assert_eq!(field.state(), FieldState::Empty);
        for r in 0..4 {
            for c in 0..4 {
                assert!(!field.is_mine(r, c).unwrap());
                assert_eq!(field.adjacent_mines(r, c).unwrap(), Some(0));
            }
        }
    }

    #[test]
    fn rejects_impossible_configurations() {
        assert_eq!(
            Minefield::new(0, 0).unwrap_err(),
            FieldError::InvalidConfig { size: 0, mines: 0 }
        );
        assert_eq!(
            Minefield::new(3, 9).unwrap_err(),
            FieldError::InvalidConfig { size: 3, mines: 9 }
        );
        assert!(Minefield::new(3, 8).is_ok());
    }

    #[test]
    fn single_corner_mine_counts() {
        let mut field = Minefield::new(3, 1).unwrap();
        field.place_mines_at(&[(0, 0)]).unwrap();
        assert_eq!(field.adjacent_mines(0, 1).unwrap(), Some(1));
        assert_eq!(field.adjacent_mines(1, 1).unwrap(), Some(1));
        assert_eq!(field.adjacent_mines(2, 2).unwrap(), Some(0));
        assert_eq!(field.adjacent_mines(0, 0).unwrap(), None);
    }

    #[test]
    fn neighbor_counts_by_position() {
        let field = Minefield::new(5, 0).unwrap();
        assert_eq!(field.neighbors(0, 0).unwrap().count(), 3);
        assert_eq!(field.neighbors(4, 4).unwrap().count(), 3);
        assert_eq!(field.neighbors(0, 2).unwrap().count(), 5);
        assert_eq!(field.neighbors(2, 4).unwrap().count(), 5);
        assert_eq!(field.neighbors(2, 2).unwrap().count(), 8);

        let tiny = Minefield::new(1, 0).unwrap();
        assert_eq!(tiny.neighbors(0, 0).unwrap().count(), 0);
    }

    #[test]
    fn neighbors_of_cell_outside_grid_is_out_of_range() {
        let field = Minefield::new(4, 0).unwrap();
        assert!(matches!(
            field.neighbors(4, 0),
            Err(FieldError::OutOfRange { row: 4, col: 0, size: 4 })
        ));
        assert!(matches!(field.neighbors(0, 4), Err(FieldError::OutOfRange { .. })));
        assert!(matches!(
            field.neighbors(usize::MAX, usize::MAX),
            Err(FieldError::OutOfRange { .. })
        ));
    }

    #[test]
    fn fixed_layout_on_five_by_five() {
        // M . . . M
        // . . . . .
        // . . M . .
        // . . . . .
        // M M . . .
        let mut field = Minefield::new(5, 5).unwrap();
        field
            .place_mines_at(&[(0, 0), (0, 4), (2, 2), (4, 0), (4, 1)])
            .unwrap();
        let expected: [[Option<u8>; 5]; 5] = [
            [None, Some(1), Some(0), Some(1), None],
            [Some(1), Some(2), Some(1), Some(2), Some(1)],
            [Some(0), Some(1), None, Some(1), Some(0)],
            [Some(2), Some(3), Some(2), Some(1), Some(0)],
            [None, None, Some(1), Some(0), Some(0)],
        ];
        for (r, row) in expected.iter().enumerate() {
            for (c, want) in row.iter().enumerate() {
                assert_eq!(field.adjacent_mines(r, c).unwrap(), *want, "cell ({r}, {c})");
            }
        }
    }

    #[test]
    fn placement_avoids_origin_and_places_exact_count() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut field = Minefield::new(9, 10).unwrap();
        field.place_mines(4, 4, &mut rng).unwrap();
        let mines = mines_of(&field);
        assert_eq!(mines.len(), 10);
        assert!(!mines.contains(&(4, 4)));
        assert!(field.is_populated());
    }

    #[test]
    fn placement_twice_fails_and_leaves_field_untouched() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut field = Minefield::new(6, 8).unwrap();
        field.place_mines(0, 0, &mut rng).unwrap();
        let before = mines_of(&field);
        assert_eq!(field.place_mines(1, 1, &mut rng), Err(FieldError::AlreadyPlaced));
        assert_eq!(field.place_mines_at(&[]), Err(FieldError::AlreadyPlaced));
        assert_eq!(mines_of(&field), before);
    }

    #[test]
    fn out_of_range_is_reported() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut field = Minefield::new(4, 2).unwrap();
        let err = FieldError::OutOfRange { row: 4, col: 0, size: 4 };
        assert_eq!(field.is_mine(4, 0), Err(err.clone()));
        assert_eq!(field.adjacent_mines(4, 0), Err(err.clone()));
        assert_eq!(field.place_mines(4, 0, &mut rng), Err(err));
        assert_eq!(field.state(), FieldState::Empty);
    }

    #[test]
    fn fixed_layout_must_match_mine_count() {
        let mut field = Minefield::new(4, 2).unwrap();
        assert_eq!(
            field.place_mines_at(&[(1, 1), (1, 1)]),
            Err(FieldError::MineCountMismatch { expected: 2, actual: 1 })
        );
        assert_eq!(field.state(), FieldState::Empty);
        field.place_mines_at(&[(1, 1), (2, 2)]).unwrap();
    }

    #[test]
    fn reset_clears_everything_and_allows_new_placement() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut field = Minefield::new(5, 12).unwrap();
        field.place_mines(2, 2, &mut rng).unwrap();
        field.reset();
        field.reset();
        assert_eq!(field.state(), FieldState::Empty);
        assert!(mines_of(&field).is_empty());
        for r in 0..5 {
            for c in 0..5 {
                assert_eq!(field.adjacent_mines(r, c).unwrap(), Some(0));
            }
        }
        field.place_mines(0, 0, &mut rng).unwrap();
        assert_eq!(mines_of(&field).len(), 12);
    }

    #[test]
    fn same_seed_same_layout() {
        let mut a = Minefield::new(8, 10).unwrap();
        let mut b = Minefield::new(8, 10).unwrap();
        a.place_mines(3, 3, &mut StdRng::seed_from_u64(42)).unwrap();
        b.place_mines(3, 3, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(mines_of(&a), mines_of(&b));
    }
}
