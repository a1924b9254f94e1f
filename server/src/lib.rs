//! # Maze Game Server Library
//!
//! Authoritative server for a two-player maze escape match. The server owns
//! the single source of truth: the procedurally generated maze, both
//! players' positions and inventory, and the mob roster. Clients send setup
//! requests and move tokens; the server validates every move, resolves tile
//! effects, advances the mobs, and rebroadcasts a full state snapshot to
//! every connection after each change.
//!
//! ## Module Organization
//!
//! - [`maze`] — randomized depth-first carving plus the perforation pass
//!   that adds loops and shortcuts.
//! - [`level`] — wraps the carver per difficulty level: start/exit pockets,
//!   mobs, keyed doors, keys, gems, player spawns, session code.
//! - [`game`] — the shared [`game::GameState`] record and the move state
//!   machine (`apply_move` / `can_enter`).
//! - [`network`] — TCP accept loop, one task per connection, and the
//!   snapshot broadcaster.
//! - [`error`] — the [`error::GameError`] taxonomy.
//!
//! ## Concurrency
//!
//! Exactly two connection tasks share one `Mutex<GameState>`. The lock is
//! never held across a network receive; it covers packet interpretation and
//! the snapshot copy, so no move is ever observed half-applied. Broadcasts
//! send the copied snapshot after the lock is released.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::new("0.0.0.0:65434").await?;
//!     // Accepts two players, then serves the match until it ends.
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod game;
pub mod level;
pub mod maze;
pub mod network;
