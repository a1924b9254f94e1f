//! Procedural maze carving via randomized recursive backtracking.
//!
//! The carver produces a perfect maze (a spanning tree of passages over the
//! odd-offset cell lattice), then punches extra openings through interior
//! walls so play has loops and shortcuts instead of exactly one path between
//! any two cells. Openings only ever turn walls into floor, so nothing that
//! was reachable from the start can become unreachable.

use crate::error::GameError;
use rand::seq::SliceRandom;
use rand::Rng;
use shared::Cell;

/// The maze board, indexed `[y][x]`. The perimeter is always walls.
pub type Grid = Vec<Vec<Cell>>;

/// Probability that an interior cell is forced open after carving.
const PERFORATION_CHANCE: f64 = 0.1;

/// Two-cell jumps used by the backtracker, one per axis direction.
const JUMPS: [(i32, i32); 4] = [(0, -2), (0, 2), (-2, 0), (2, 0)];

/// Carves a `width` x `height` maze starting from (1, 1).
///
/// Both dimensions must leave room for at least one interior cell, i.e. be
/// at least 3, otherwise this fails with a validation error.
pub fn carve(width: i32, height: i32, rng: &mut impl Rng) -> Result<Grid, GameError> {
    if width < 3 || height < 3 {
        return Err(GameError::InvalidMazeSize { width, height });
    }

    let mut grid = vec![vec![Cell::Wall; width as usize]; height as usize];
    grid[1][1] = Cell::Empty;
    backtrack(&mut grid, width, height, 1, 1, rng);

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            if rng.gen_bool(PERFORATION_CHANCE) {
                grid[y as usize][x as usize] = Cell::Empty;
            }
        }
    }

    Ok(grid)
}

/// Visits the four neighbors two cells away in random order; any that is
/// still a wall inside the interior gets opened along with the cell in
/// between, then carving continues from there.
fn backtrack(grid: &mut Grid, width: i32, height: i32, x: i32, y: i32, rng: &mut impl Rng) {
    let mut jumps = JUMPS;
    jumps.shuffle(rng);

    for (dx, dy) in jumps {
        let (nx, ny) = (x + dx, y + dy);
        if nx > 0
            && nx < width - 1
            && ny > 0
            && ny < height - 1
            && grid[ny as usize][nx as usize] == Cell::Wall
        {
            grid[(y + dy / 2) as usize][(x + dx / 2) as usize] = Cell::Empty;
            grid[ny as usize][nx as usize] = Cell::Empty;
            backtrack(grid, width, height, nx, ny, rng);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::VecDeque;

    /// Cells reachable from (1, 1) walking over anything that is not a wall.
    fn flood_fill(grid: &Grid) -> Vec<Vec<bool>> {
        let height = grid.len();
        let width = grid[0].len();
        let mut seen = vec![vec![false; width]; height];
        let mut queue = VecDeque::from([(1usize, 1usize)]);
        seen[1][1] = true;

        while let Some((x, y)) = queue.pop_front() {
            for (nx, ny) in [(x + 1, y), (x - 1, y), (x, y + 1), (x, y - 1)] {
                if nx < width && ny < height && !seen[ny][nx] && grid[ny][nx] != Cell::Wall {
                    seen[ny][nx] = true;
                    queue.push_back((nx, ny));
                }
            }
        }

        seen
    }

    #[test]
    fn test_carve_rejects_degenerate_sizes() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            carve(2, 10, &mut rng),
            Err(GameError::InvalidMazeSize { width: 2, .. })
        ));
        assert!(matches!(
            carve(10, 2, &mut rng),
            Err(GameError::InvalidMazeSize { height: 2, .. })
        ));
        assert!(carve(3, 3, &mut rng).is_ok());
    }

    #[test]
    fn test_carve_dimensions_and_cell_kinds() {
        let mut rng = StdRng::seed_from_u64(7);
        let grid = carve(15, 10, &mut rng).unwrap();

        assert_eq!(grid.len(), 10);
        for row in &grid {
            assert_eq!(row.len(), 15);
            for cell in row {
                assert!(matches!(cell, Cell::Wall | Cell::Empty));
            }
        }
    }

    #[test]
    fn test_carve_keeps_perimeter_walled() {
        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let grid = carve(20, 15, &mut rng).unwrap();

            assert!(grid[0].iter().all(|&c| c == Cell::Wall));
            assert!(grid[14].iter().all(|&c| c == Cell::Wall));
            for row in &grid {
                assert_eq!(row[0], Cell::Wall);
                assert_eq!(row[19], Cell::Wall);
            }
        }
    }

    #[test]
    fn test_carve_opens_the_start_cell() {
        let mut rng = StdRng::seed_from_u64(3);
        let grid = carve(15, 10, &mut rng).unwrap();
        assert_eq!(grid[1][1], Cell::Empty);
    }

    /// The spanning tree connects every odd-offset lattice cell to the
    /// start; perforation can only add more openings on top of that.
    #[test]
    fn test_carve_connects_the_corridor_lattice() {
        for seed in 0..25 {
            let mut rng = StdRng::seed_from_u64(seed);
            let grid = carve(15, 10, &mut rng).unwrap();
            let seen = flood_fill(&grid);

            for y in (1..9).step_by(2) {
                for x in (1..14).step_by(2) {
                    assert_eq!(grid[y][x], Cell::Empty, "lattice cell ({}, {})", x, y);
                    assert!(seen[y][x], "unreachable lattice cell ({}, {})", x, y);
                }
            }
        }
    }

    #[test]
    fn test_carve_is_deterministic_per_seed() {
        let grid_a = carve(20, 15, &mut StdRng::seed_from_u64(42)).unwrap();
        let grid_b = carve(20, 15, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(grid_a, grid_b);
    }
}
