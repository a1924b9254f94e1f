//! Terminal rendering of server snapshots.

use shared::{GameMessage, Mob, PlayerState};
use std::collections::HashMap;

/// Clears the terminal and prints the full state: maze rows, player
/// summaries, session code and the latest event message.
pub fn draw(
    grid: &[String],
    players: &HashMap<u8, PlayerState>,
    mobs: &[Mob],
    session_code: u32,
    message: Option<&GameMessage>,
) {
    // Home the cursor and wipe the screen.
    print!("\x1b[H\x1b[J");

    println!("\n--- Current state game ---");
    for row in grid {
        println!("{}", row);
    }

    println!("\nPlayers:");
    let mut ids: Vec<u8> = players.keys().copied().collect();
    ids.sort_unstable();
    for id in ids {
        let p = &players[&id];
        println!(
            "Player {}: ({}, {})  lives: {}  keys: {}  gems: {}",
            id, p.x, p.y, p.lives, p.keys, p.gems
        );
    }
    if !mobs.is_empty() {
        println!("Mobs on the prowl: {}", mobs.len());
    }
    println!("-----------------------------");

    if session_code != 0 {
        println!("Code the game: {}", session_code);
    }
    if let Some(message) = message {
        println!("{}", message.text);
    }
}
