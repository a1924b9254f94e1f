//! Terminal client for the maze game.
//!
//! The client holds no game logic. It asks the player whether to create or
//! join a match, sends the resulting setup packet, then runs two concurrent
//! loops: one renders every snapshot the server pushes, the other maps
//! keyboard lines to move tokens. A terminal-tagged message from the server
//! ends the session.

pub mod menu;
pub mod network;
pub mod rendering;
