//! Authoritative match state and the move state machine.
//!
//! One [`GameState`] exists per running match. Connection tasks mutate it
//! only while holding the server's state lock, so every move is applied as
//! one atomic step: tile effects, the walkability check, the position
//! update and the global mob advance all happen before anyone else can
//! observe the state.

use crate::error::GameError;
use crate::maze::Grid;
use log::info;
use shared::{Cell, Direction, GameMessage, Mob, Packet, PlayerState};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct GameState {
    /// `None` until the first setup message triggers level generation.
    pub grid: Option<Grid>,
    pub players: HashMap<u8, PlayerState>,
    pub mobs: Vec<Mob>,
    pub level: u8,
    /// Shared secret of the match, 0 while unset.
    pub session_code: u32,
    /// Event produced by the last processed move, if any.
    pub message: Option<GameMessage>,
}

impl GameState {
    pub fn new() -> Self {
        let mut players = HashMap::new();
        players.insert(1, PlayerState::new(1, 1));
        players.insert(2, PlayerState::new(1, 1));

        Self {
            grid: None,
            players,
            mobs: Vec::new(),
            level: 0,
            session_code: 0,
            message: None,
        }
    }

    pub fn started(&self) -> bool {
        self.grid.is_some()
    }

    /// Full copy of the match in wire form. Taken under the state lock so
    /// broadcasts always see a self-consistent snapshot.
    pub fn snapshot(&self) -> Packet {
        let grid = self
            .grid
            .as_ref()
            .map(|g| {
                g.iter()
                    .map(|row| row.iter().map(|c| c.to_char()).collect())
                    .collect()
            })
            .unwrap_or_default();

        Packet::State {
            grid,
            players: self.players.clone(),
            mobs: self.mobs.clone(),
            level: self.level,
            session_code: self.session_code,
            message: self.message.clone(),
        }
    }

    fn dimensions(&self) -> (i32, i32) {
        match &self.grid {
            Some(g) if !g.is_empty() => (g[0].len() as i32, g.len() as i32),
            _ => (0, 0),
        }
    }

    /// Tile at (x, y); anything outside the grid reads as a wall.
    fn cell(&self, x: i32, y: i32) -> Cell {
        let (width, height) = self.dimensions();
        if x < 0 || y < 0 || x >= width || y >= height {
            return Cell::Wall;
        }
        match &self.grid {
            Some(g) => g[y as usize][x as usize],
            None => Cell::Wall,
        }
    }

    fn set_cell(&mut self, x: i32, y: i32, cell: Cell) {
        let (width, height) = self.dimensions();
        if x < 0 || y < 0 || x >= width || y >= height {
            return;
        }
        if let Some(g) = &mut self.grid {
            g[y as usize][x as usize] = cell;
        }
    }

    fn player_mut(&mut self, player_id: u8) -> Result<&mut PlayerState, GameError> {
        self.players
            .get_mut(&player_id)
            .ok_or(GameError::PlayerNotFound(player_id))
    }

    /// Whether `player_id` may step onto (x, y).
    ///
    /// A closed door swallows one key and opens when the player has one;
    /// without a key it blocks. Floor, the exit, mobs and pickups are always
    /// enterable (mob collisions and pickups are resolved by the caller
    /// before this check). Walls and the outer ring block.
    pub fn can_enter(&mut self, x: i32, y: i32, player_id: u8) -> Result<bool, GameError> {
        let (width, height) = self.dimensions();
        if x < 0 || y < 0 || x >= width || y >= height {
            return Err(GameError::OutOfBounds { x, y });
        }
        if !self.players.contains_key(&player_id) {
            return Err(GameError::PlayerNotFound(player_id));
        }

        let cell = self.cell(x, y);
        if x >= 1 && x < width - 1 && y >= 1 && y < height - 1 {
            if cell == Cell::Door {
                let player = self.player_mut(player_id)?;
                if player.keys > 0 {
                    player.keys -= 1;
                    info!("Player {} open the door!", player_id);
                    self.message = Some(GameMessage::info(format!(
                        "Player {} open the door!",
                        player_id
                    )));
                    return Ok(true);
                }
            } else if matches!(
                cell,
                Cell::Empty | Cell::Exit | Cell::Mob | Cell::Key | Cell::Gem
            ) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Applies one move for `player_id` as a single atomic step.
    ///
    /// An unrecognized token is an explicit no-op, not an error. Otherwise:
    /// resolve a mob collision (lose a life, respawn at the start), pick up
    /// a key or gem under the target, then move if the tile is enterable,
    /// and finally advance every mob by one cell. Stepping onto the exit
    /// ends the match with a terminal message.
    pub fn apply_move(&mut self, player_id: u8, token: &str) -> Result<(), GameError> {
        let Some(direction) = Direction::parse(token) else {
            return Ok(());
        };
        if !self.started() {
            return Ok(());
        }

        let player = self
            .players
            .get(&player_id)
            .ok_or(GameError::PlayerNotFound(player_id))?;
        let (cx, cy) = (player.x, player.y);
        let (dx, dy) = direction.delta();
        let (mut nx, mut ny) = (cx + dx, cy + dy);

        self.message = None;

        if self.cell(nx, ny) == Cell::Mob {
            let player = self.player_mut(player_id)?;
            player.lives = player.lives.saturating_sub(1);
            player.x = 1;
            player.y = 1;
            let lives = player.lives;

            info!("Player {} hit a mob! Lives left: {}", player_id, lives);
            self.message = Some(GameMessage::info(format!(
                "Player {} hit a mob! Lives left: {}",
                player_id, lives
            )));
            self.set_cell(cx, cy, Cell::Empty);
            (nx, ny) = (1, 1);
            self.set_cell(1, 1, Cell::Player(player_id));

            if lives == 0 {
                info!("Player {} lost! The other player is winner!", player_id);
                self.message = Some(GameMessage::terminal(format!(
                    "Player {} lost! The other player is winner!",
                    player_id
                )));
            }
        }

        if self.cell(nx, ny) == Cell::Key {
            let player = self.player_mut(player_id)?;
            player.keys += 1;
            let keys = player.keys;
            info!("Player {} picked up a key! Total keys: {}", player_id, keys);
            self.message = Some(GameMessage::info(format!(
                "Player {} picked up a key! Total keys: {}",
                player_id, keys
            )));
            self.set_cell(nx, ny, Cell::Empty);
        }

        if self.cell(nx, ny) == Cell::Gem {
            let player = self.player_mut(player_id)?;
            player.gems += 1;
            let gems = player.gems;
            info!(
                "Player {} picked up a gem!!!! Total gems: {}",
                player_id, gems
            );
            self.message = Some(GameMessage::info(format!(
                "Player {} picked up a gem!!!! Total gems: {}",
                player_id, gems
            )));
            self.set_cell(nx, ny, Cell::Empty);
        }

        if self.can_enter(nx, ny, player_id)? {
            self.set_cell(cx, cy, Cell::Empty);
            let player = self.player_mut(player_id)?;
            player.x = nx;
            player.y = ny;

            if self.cell(nx, ny) != Cell::Exit {
                self.set_cell(nx, ny, Cell::Player(player_id));
            } else {
                info!("Player {} has escaped the maze! Game over!", player_id);
                self.message = Some(GameMessage::terminal(format!(
                    "Player {} has escaped the maze! Game over!",
                    player_id
                )));
            }
        }

        self.advance_mobs();
        Ok(())
    }

    /// Every mob steps once along its axis; doors, walls and pickups bounce
    /// it back instead of being trampled.
    fn advance_mobs(&mut self) {
        let (width, height) = self.dimensions();
        let mut mobs = std::mem::take(&mut self.mobs);

        for mob in &mut mobs {
            if mob.x >= 0 && mob.x < width && mob.y >= 0 && mob.y < height {
                self.set_cell(mob.x, mob.y, Cell::Empty);
            }

            let next = mob.x + mob.d;
            let blocked = next < 0
                || next >= width
                || matches!(
                    self.cell(next, mob.y),
                    Cell::Wall | Cell::Door | Cell::Gem | Cell::Key
                );

            if blocked {
                mob.d = -mob.d;
            } else {
                mob.x = next;
            }
            self.set_cell(mob.x, mob.y, Cell::Mob);
        }

        self.mobs = mobs;
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::MessageKind;

    /// Builds a state from rendered rows; mobs found in the grid are also
    /// registered in the roster heading right.
    fn state_from_rows(rows: &[&str]) -> GameState {
        let grid: Grid = rows
            .iter()
            .map(|row| row.chars().map(|c| Cell::from_char(c).unwrap()).collect())
            .collect();

        let mut state = GameState::new();
        for (y, row) in grid.iter().enumerate() {
            for (x, &cell) in row.iter().enumerate() {
                if cell == Cell::Mob {
                    state.mobs.push(Mob {
                        x: x as i32,
                        y: y as i32,
                        d: 1,
                    });
                }
            }
        }
        state.grid = Some(grid);
        state.session_code = 9;
        state.level = 1;
        state
    }

    fn small_fixture() -> GameState {
        let mut state = state_from_rows(&[
            "████", //
            "█  █",
            "█K░█",
            "████",
        ]);
        state.players.get_mut(&1).unwrap().keys = 1;
        state
    }

    #[test]
    fn test_can_enter_empty_cell() {
        let mut state = small_fixture();
        assert!(state.can_enter(2, 1, 1).unwrap());
    }

    #[test]
    fn test_can_enter_key_cell() {
        let mut state = small_fixture();
        assert!(state.can_enter(1, 2, 2).unwrap());
    }

    #[test]
    fn test_can_enter_door_with_key_consumes_it() {
        let mut state = small_fixture();
        assert!(state.can_enter(2, 2, 1).unwrap());
        assert_eq!(state.players[&1].keys, 0);

        let message = state.message.unwrap();
        assert_eq!(message.kind, MessageKind::Info);
        assert!(message.text.contains("open the door"));
    }

    #[test]
    fn test_can_enter_door_without_key_blocks() {
        let mut state = small_fixture();
        assert!(!state.can_enter(2, 2, 2).unwrap());
        assert_eq!(state.players[&2].keys, 0);
        assert!(state.message.is_none());
    }

    #[test]
    fn test_can_enter_wall_blocks() {
        let mut state = small_fixture();
        assert!(!state.can_enter(0, 0, 1).unwrap());
    }

    #[test]
    fn test_can_enter_out_of_bounds() {
        let mut state = small_fixture();
        assert!(matches!(
            state.can_enter(-1, 0, 1),
            Err(GameError::OutOfBounds { x: -1, y: 0 })
        ));
        assert!(matches!(
            state.can_enter(10, 10, 1),
            Err(GameError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_can_enter_unknown_player() {
        let mut state = small_fixture();
        assert!(matches!(
            state.can_enter(2, 1, 7),
            Err(GameError::PlayerNotFound(7))
        ));
    }

    #[test]
    fn test_apply_move_unknown_token_is_noop() {
        let mut state = small_fixture();
        state.message = Some(GameMessage::info("previous".into()));
        let before = state.clone();

        state.apply_move(1, "teleport").unwrap();

        assert_eq!(state.players, before.players);
        assert_eq!(state.grid, before.grid);
        assert_eq!(state.mobs, before.mobs);
        assert_eq!(state.message, before.message);
    }

    #[test]
    fn test_apply_move_onto_key() {
        let mut state = small_fixture();
        state.apply_move(1, "down").unwrap();

        let player = &state.players[&1];
        assert_eq!((player.x, player.y), (1, 2));
        assert_eq!(player.keys, 2);
        assert_eq!(state.grid.as_ref().unwrap()[2][1], Cell::Player(1));
        assert_eq!(state.grid.as_ref().unwrap()[1][1], Cell::Empty);

        let message = state.message.unwrap();
        assert!(message.text.contains("picked up a key"));
        assert!(message.text.contains("Total keys: 2"));
    }

    #[test]
    fn test_apply_move_onto_gem() {
        let mut state = state_from_rows(&[
            "████", //
            "█ ◇█",
            "█  █",
            "████",
        ]);
        state.apply_move(1, "right").unwrap();

        let player = &state.players[&1];
        assert_eq!((player.x, player.y), (2, 1));
        assert_eq!(player.gems, 1);
        assert!(state.message.unwrap().text.contains("picked up a gem"));
    }

    #[test]
    fn test_apply_move_onto_mob_costs_a_life() {
        let mut state = state_from_rows(&[
            "█████", //
            "█ M █",
            "█   █",
            "█████",
        ]);
        state.apply_move(1, "right").unwrap();

        let player = &state.players[&1];
        assert_eq!(player.lives, 2);
        assert_eq!((player.x, player.y), (1, 1));
        assert_eq!(state.grid.as_ref().unwrap()[1][1], Cell::Player(1));

        let message = state.message.clone().unwrap();
        assert_eq!(message.kind, MessageKind::Info);
        assert!(message.text.contains("hit a mob"));
        assert!(message.text.contains("Lives left: 2"));

        // The mob kept patrolling after the collision.
        assert_eq!(state.mobs[0].x, 3);
    }

    #[test]
    fn test_apply_move_onto_mob_with_last_life_is_terminal() {
        let mut state = state_from_rows(&[
            "█████", //
            "█ M █",
            "█   █",
            "█████",
        ]);
        state.players.get_mut(&1).unwrap().lives = 1;
        state.apply_move(1, "right").unwrap();

        assert_eq!(state.players[&1].lives, 0);
        let message = state.message.unwrap();
        assert_eq!(message.kind, MessageKind::Terminal);
        assert!(message.text.contains("lost"));
    }

    #[test]
    fn test_apply_move_onto_exit_is_terminal() {
        let mut state = state_from_rows(&[
            "████", //
            "█ E█",
            "█  █",
            "████",
        ]);
        state.apply_move(1, "right").unwrap();

        let player = &state.players[&1];
        assert_eq!((player.x, player.y), (2, 1));
        // The exit tile never gets a player marker stamped over it.
        assert_eq!(state.grid.as_ref().unwrap()[1][2], Cell::Exit);

        let message = state.message.unwrap();
        assert_eq!(message.kind, MessageKind::Terminal);
        assert!(message.text.contains("escaped the maze"));
    }

    #[test]
    fn test_apply_move_into_wall_is_blocked_but_mobs_advance() {
        let mut state = state_from_rows(&[
            "█████", //
            "█  M█",
            "█   █",
            "█████",
        ]);
        state.apply_move(1, "up").unwrap();

        let player = &state.players[&1];
        assert_eq!((player.x, player.y), (1, 1));

        // Mob at (3, 1) heading right into the wall flips instead of moving.
        assert_eq!(state.mobs[0].x, 3);
        assert_eq!(state.mobs[0].d, -1);
        assert_eq!(state.grid.as_ref().unwrap()[1][3], Cell::Mob);
    }

    #[test]
    fn test_mob_bounces_off_pickups() {
        let mut state = state_from_rows(&[
            "█████", //
            "█ MK█",
            "█   █",
            "█████",
        ]);
        state.apply_move(1, "up").unwrap();

        assert_eq!(state.mobs[0].x, 2);
        assert_eq!(state.mobs[0].d, -1);
        assert_eq!(state.grid.as_ref().unwrap()[1][3], Cell::Key);
    }

    #[test]
    fn test_apply_move_through_door_with_key() {
        let mut state = state_from_rows(&[
            "████", //
            "█ ░█",
            "█  █",
            "████",
        ]);
        state.players.get_mut(&1).unwrap().keys = 1;
        state.apply_move(1, "right").unwrap();

        let player = &state.players[&1];
        assert_eq!((player.x, player.y), (2, 1));
        assert_eq!(player.keys, 0);
        assert_eq!(state.grid.as_ref().unwrap()[1][2], Cell::Player(1));
        assert!(state.message.unwrap().text.contains("open the door"));
    }

    #[test]
    fn test_apply_move_door_without_key_blocks() {
        let mut state = state_from_rows(&[
            "████", //
            "█ ░█",
            "█  █",
            "████",
        ]);
        state.apply_move(1, "right").unwrap();

        assert_eq!((state.players[&1].x, state.players[&1].y), (1, 1));
        assert_eq!(state.grid.as_ref().unwrap()[1][2], Cell::Door);
    }

    #[test]
    fn test_apply_move_unknown_player() {
        let mut state = small_fixture();
        assert!(matches!(
            state.apply_move(9, "up"),
            Err(GameError::PlayerNotFound(9))
        ));
    }

    #[test]
    fn test_apply_move_before_setup_is_noop() {
        let mut state = GameState::new();
        state.apply_move(1, "up").unwrap();
        assert_eq!((state.players[&1].x, state.players[&1].y), (1, 1));
    }

    #[test]
    fn test_new_state_is_unset() {
        let state = GameState::new();
        assert!(!state.started());
        assert_eq!(state.session_code, 0);
        assert_eq!(state.level, 0);
        assert_eq!(state.players.len(), 2);
    }

    #[test]
    fn test_snapshot_of_fresh_state_has_empty_grid() {
        let state = GameState::new();
        match state.snapshot() {
            Packet::State {
                grid,
                session_code,
                message,
                ..
            } => {
                assert!(grid.is_empty());
                assert_eq!(session_code, 0);
                assert!(message.is_none());
            }
            _ => panic!("snapshot must be a state packet"),
        }
    }

    #[test]
    fn test_snapshot_renders_grid_rows() {
        let state = small_fixture();
        match state.snapshot() {
            Packet::State { grid, .. } => {
                assert_eq!(grid, vec!["████", "█  █", "█K░█", "████"]);
            }
            _ => panic!("snapshot must be a state packet"),
        }
    }
}
