//! Wire protocol shared between the maze server and its clients.
//!
//! The server owns the authoritative game state and pushes a complete
//! snapshot to every connection after each processed move; clients only ever
//! send a session setup request or a move token. Everything that crosses the
//! socket is defined here so both sides agree on the schema, together with
//! the length-prefixed framing used to carry bincode packets over TCP.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lives each player starts the match with.
pub const STARTING_LIVES: u32 = 3;
/// Session codes are drawn uniformly from this inclusive range; 0 means the
/// match has not been set up yet.
pub const SESSION_CODE_MIN: u32 = 1;
pub const SESSION_CODE_MAX: u32 = 20;
/// Exactly two players per match, ids 1 and 2.
pub const MAX_PLAYERS: u8 = 2;

/// Fixed board geometry per difficulty level: (width, height, mob count).
/// Returns `None` for anything outside 1..=3.
pub fn level_config(level: u8) -> Option<(i32, i32, usize)> {
    match level {
        1 => Some((15, 10, 2)),
        2 => Some((20, 15, 4)),
        3 => Some((30, 20, 6)),
        _ => None,
    }
}

/// One tile of the maze.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    Wall,
    Empty,
    Start,
    Exit,
    Door,
    Key,
    Gem,
    Mob,
    Player(u8),
}

impl Cell {
    /// Character used for this tile in snapshot rows and terminal rendering.
    pub fn to_char(self) -> char {
        match self {
            Cell::Wall => '█',
            Cell::Empty => ' ',
            Cell::Start => 'S',
            Cell::Exit => 'E',
            Cell::Door => '░',
            Cell::Key => 'K',
            Cell::Gem => '◇',
            Cell::Mob => 'M',
            Cell::Player(1) => '1',
            Cell::Player(_) => '2',
        }
    }

    pub fn from_char(c: char) -> Option<Cell> {
        match c {
            '█' => Some(Cell::Wall),
            ' ' => Some(Cell::Empty),
            'S' => Some(Cell::Start),
            'E' => Some(Cell::Exit),
            '░' => Some(Cell::Door),
            'K' => Some(Cell::Key),
            '◇' => Some(Cell::Gem),
            'M' => Some(Cell::Mob),
            '1' => Some(Cell::Player(1)),
            '2' => Some(Cell::Player(2)),
            _ => None,
        }
    }
}

/// The four axis-aligned move directions. Clients send these as literal
/// tokens; anything else is accepted on the wire but ignored by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn parse(token: &str) -> Option<Direction> {
        match token {
            "up" => Some(Direction::Up),
            "down" => Some(Direction::Down),
            "left" => Some(Direction::Left),
            "right" => Some(Direction::Right),
            _ => None,
        }
    }

    /// (dx, dy) in grid coordinates, y growing downwards.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub x: i32,
    pub y: i32,
    pub lives: u32,
    pub keys: u32,
    pub gems: u32,
}

impl PlayerState {
    pub fn new(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            lives: STARTING_LIVES,
            keys: 0,
            gems: 0,
        }
    }
}

/// A mob patrols along the x axis one cell per processed move and flips its
/// direction when the next tile is blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mob {
    pub x: i32,
    pub y: i32,
    pub d: i32,
}

/// Whether a message is a passing notice or ends the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    Info,
    Terminal,
}

/// Event message attached to a snapshot. Clients display the text verbatim
/// and stop their loop when the kind is `Terminal`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMessage {
    pub kind: MessageKind,
    pub text: String,
}

impl GameMessage {
    pub fn info(text: String) -> Self {
        Self {
            kind: MessageKind::Info,
            text,
        }
    }

    pub fn terminal(text: String) -> Self {
        Self {
            kind: MessageKind::Terminal,
            text,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.kind == MessageKind::Terminal
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum Packet {
    /// First message of a connection: create a match (`session_code` 0) or
    /// join an existing one with its code.
    Setup { level: u8, session_code: u32 },
    /// A move token, normally one of "up", "down", "left", "right".
    Move { direction: String },
    /// Full state snapshot, broadcast after every processed client message.
    /// The grid is sent as rendered rows and is empty until the first setup
    /// message generates the maze.
    State {
        grid: Vec<String>,
        players: HashMap<u8, PlayerState>,
        mobs: Vec<Mob>,
        level: u8,
        session_code: u32,
        message: Option<GameMessage>,
    },
}

pub mod frame {
    //! Length-prefixed bincode frames over any async byte stream.
    //!
    //! TCP gives us a byte stream, not datagrams, so every packet is sent as
    //! a little-endian `u32` body length followed by the bincode body. A
    //! clean EOF between frames reads as `Ok(None)`, which is how a peer
    //! shutdown is detected.

    use super::Packet;
    use std::io;
    use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

    /// Upper bound on a frame body; a level 3 snapshot is a few KiB.
    pub const MAX_FRAME_LEN: u32 = 64 * 1024;

    pub async fn write_packet<W: AsyncWrite + Unpin>(
        writer: &mut W,
        packet: &Packet,
    ) -> io::Result<()> {
        let body = bincode::serialize(packet)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        writer.write_all(&(body.len() as u32).to_le_bytes()).await?;
        writer.write_all(&body).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Reads one frame. Returns `Ok(None)` when the peer closed the
    /// connection before the next header.
    pub async fn read_packet<R: AsyncRead + Unpin>(reader: &mut R) -> io::Result<Option<Packet>> {
        let mut header = [0u8; 4];
        match reader.read_exact(&mut header).await {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e),
        }

        let len = u32::from_le_bytes(header);
        if len > MAX_FRAME_LEN {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("frame of {} bytes exceeds limit", len),
            ));
        }

        let mut body = vec![0u8; len as usize];
        reader.read_exact(&mut body).await?;
        let packet = bincode::deserialize(&body)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(Some(packet))
    }
}
