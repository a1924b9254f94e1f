//! Level setup: wraps the maze carver and furnishes the board for a match.
//!
//! Runs once per match under the state lock, triggered by the first setup
//! message. Writes the finished grid, mob roster, player spawns, session
//! code and level straight into the shared [`GameState`].

use crate::error::GameError;
use crate::game::GameState;
use crate::maze::{self, Grid};
use log::info;
use rand::Rng;
use shared::{level_config, Cell, Mob, PlayerState, SESSION_CODE_MAX, SESSION_CODE_MIN};

/// Generates and decorates the board for `level` (1..=3).
///
/// Placement order matters: mobs and doors are stamped before keys and gems
/// so the rejection sampling for pickups can never land on a tile that is
/// about to be overwritten.
pub fn build_level(state: &mut GameState, level: u8, rng: &mut impl Rng) -> Result<(), GameError> {
    let (width, height, mob_count) =
        level_config(level).ok_or(GameError::InvalidLevel(level))?;

    let mut grid = maze::carve(width, height, rng)?;
    let (w, h) = (width as usize, height as usize);

    // Walkable 2x2 pocket around the start, whatever the carving produced.
    grid[1][1] = Cell::Start;
    grid[1][2] = Cell::Empty;
    grid[2][1] = Cell::Empty;
    grid[2][2] = Cell::Empty;

    // Same pocket on the near corner of the exit.
    grid[h - 2][w - 2] = Cell::Exit;
    grid[h - 3][w - 3] = Cell::Empty;
    grid[h - 2][w - 3] = Cell::Empty;
    grid[h - 3][w - 2] = Cell::Empty;

    state.mobs.clear();
    for _ in 0..mob_count {
        let mob = Mob {
            x: rng.gen_range(2..=width - 3),
            y: rng.gen_range(2..=height - 3),
            d: match rng.gen_range(-1..=1) {
                0 => 1,
                d => d,
            },
        };
        grid[mob.y as usize][mob.x as usize] = Cell::Mob;
        state.mobs.push(mob);
    }

    // Both doors guard the exit pocket; each one costs a key to pass.
    grid[h - 2][w - 3] = Cell::Door;
    grid[h - 3][w - 2] = Cell::Door;

    let key_count = rng.gen_range(3..=5);
    for _ in 0..key_count {
        place_on_empty(&mut grid, width, height, Cell::Key, rng);
    }
    let gem_count = rng.gen_range(3..=5);
    for _ in 0..gem_count {
        place_on_empty(&mut grid, width, height, Cell::Gem, rng);
    }

    state.players.insert(1, PlayerState::new(1, 1));
    state.players.insert(2, PlayerState::new(2, 1));

    state.session_code = rng.gen_range(SESSION_CODE_MIN..=SESSION_CODE_MAX);
    state.level = level;
    state.grid = Some(grid);

    info!(
        "Code the game: {}, level: {}",
        state.session_code, state.level
    );
    Ok(())
}

/// Resamples interior coordinates until the tile is plain floor.
fn place_on_empty(grid: &mut Grid, width: i32, height: i32, cell: Cell, rng: &mut impl Rng) {
    loop {
        let x = rng.gen_range(1..=width - 2) as usize;
        let y = rng.gen_range(1..=height - 2) as usize;
        if grid[y][x] == Cell::Empty {
            grid[y][x] = cell;
            return;
        }
    }
}
