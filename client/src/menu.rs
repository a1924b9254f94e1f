//! Interactive startup menu: create a new game or join one by code.

use shared::Packet;
use std::error::Error;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    New { level: u8 },
    Join { session_code: u32 },
}

/// The setup packet the server expects for a menu choice. Creating a game
/// carries the level and no code; joining carries the code and no level.
pub fn setup_packet(choice: MenuChoice) -> Packet {
    match choice {
        MenuChoice::New { level } => Packet::Setup {
            level,
            session_code: 0,
        },
        MenuChoice::Join { session_code } => Packet::Setup {
            level: 0,
            session_code,
        },
    }
}

/// Shows the menu and validates the player's input. Invalid input aborts
/// startup with a user-facing error.
pub fn run() -> Result<MenuChoice, Box<dyn Error>> {
    println!("    --- Menu ---");
    println!(" N) Create new game");
    println!(" J) Join existing game");

    let choice = prompt("\n    Insert command (N/J): ")?;
    match choice.trim().to_uppercase().as_str() {
        "N" => {
            let level = prompt("\n    Insert level game (1,2,3): ")?;
            parse_level(level.trim())
        }
        "J" => {
            let code = prompt("\n    Insert code game: ")?;
            parse_join_code(code.trim())
        }
        _ => Err("Invalid choice. Please restart the game.".into()),
    }
}

pub fn parse_level(input: &str) -> Result<MenuChoice, Box<dyn Error>> {
    match input {
        "1" | "2" | "3" => Ok(MenuChoice::New {
            level: input.parse()?,
        }),
        _ => Err("Invalid level. Please enter 1, 2 or 3.".into()),
    }
}

pub fn parse_join_code(input: &str) -> Result<MenuChoice, Box<dyn Error>> {
    let session_code = input
        .parse()
        .map_err(|_| "Invalid code! Please restart the game.")?;
    Ok(MenuChoice::Join { session_code })
}

fn prompt(text: &str) -> std::io::Result<String> {
    print!("{}", text);
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line)
}
