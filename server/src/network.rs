//! Server network layer: connection lifecycle and snapshot distribution.
//!
//! One long-lived TCP connection per player, one tokio task per connection.
//! Each task blocks on its own framed read with the state lock released;
//! only interpreting a packet takes the lock, so moves from the two players
//! are applied whole, one at a time, in arrival order. After every state
//! change the handling task broadcasts a snapshot taken under the lock to
//! every registered connection.

use crate::error::GameError;
use crate::game::GameState;
use crate::level;
use log::{debug, error, info, warn};
use shared::{frame, GameMessage, Packet, MAX_PLAYERS};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

/// Registry of connected players' write halves. A connection is only ever
/// removed by its own handler task; broadcast failures leave it in place.
type Connections = Arc<Mutex<HashMap<u8, OwnedWriteHalf>>>;

/// Authoritative match server for exactly two players.
pub struct Server {
    listener: TcpListener,
    state: Arc<Mutex<GameState>>,
    connections: Connections,
}

impl Server {
    pub async fn new(addr: &str) -> Result<Self, GameError> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", addr);

        Ok(Server {
            listener,
            state: Arc::new(Mutex::new(GameState::new())),
            connections: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Address the listener actually bound to; useful when binding port 0.
    pub fn local_addr(&self) -> Result<SocketAddr, GameError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts both players, serves them until their connections close.
    pub async fn run(&mut self) -> Result<(), GameError> {
        let mut handles = Vec::new();

        for player_id in 1..=MAX_PLAYERS {
            let (stream, addr) = self.listener.accept().await?;
            info!("Player {} connected from {}", player_id, addr);

            let (read_half, write_half) = stream.into_split();
            {
                let mut connections = self.connections.lock().await;
                connections.insert(player_id, write_half);
            }
            send_initial(player_id, &self.state, &self.connections).await;

            let state = Arc::clone(&self.state);
            let connections = Arc::clone(&self.connections);
            handles.push(tokio::spawn(async move {
                handle_connection(read_half, player_id, state, connections).await;
            }));
        }

        info!("Both players connected. Game is starting...");

        for handle in handles {
            if let Err(e) = handle.await {
                error!("Connection task panicked: {}", e);
            }
        }
        Ok(())
    }
}

/// Pushes the current snapshot to a newly accepted connection, before any
/// client message. For the first player this is the empty pre-setup state.
async fn send_initial(player_id: u8, state: &Arc<Mutex<GameState>>, connections: &Connections) {
    let snapshot = state.lock().await.snapshot();
    let mut connections = connections.lock().await;
    if let Some(conn) = connections.get_mut(&player_id) {
        if let Err(e) = frame::write_packet(conn, &snapshot).await {
            error!("Error sending initial state to player {}: {}", player_id, e);
        }
    }
}

/// Receive loop of one player. Runs until the peer closes the connection,
/// a processing error occurs, or the player aborts the session with a wrong
/// code. Deregisters itself on the way out.
async fn handle_connection(
    mut reader: OwnedReadHalf,
    player_id: u8,
    state: Arc<Mutex<GameState>>,
    connections: Connections,
) {
    loop {
        let packet = match frame::read_packet(&mut reader).await {
            Ok(Some(packet)) => packet,
            Ok(None) => {
                info!("Player {} disconnected.", player_id);
                break;
            }
            Err(e) => {
                error!("Error receiving from player {}: {}", player_id, e);
                break;
            }
        };

        let (snapshot, abort) = {
            let mut state = state.lock().await;
            match handle_packet(&mut state, player_id, packet) {
                Ok(abort) => (state.snapshot(), abort),
                Err(e) => {
                    error!("Error with player {}: {}", player_id, e);
                    break;
                }
            }
        };

        broadcast(&connections, &snapshot).await;
        if abort {
            break;
        }
    }

    let mut connections = connections.lock().await;
    connections.remove(&player_id);
    info!("Player {} removed.", player_id);
}

/// Interprets one client packet under the state lock. Returns `Ok(true)`
/// when the connection must end after the follow-up broadcast (session-code
/// mismatch), `Err` when the connection must end without one.
fn handle_packet(
    state: &mut GameState,
    player_id: u8,
    packet: Packet,
) -> Result<bool, GameError> {
    match packet {
        Packet::Setup {
            level,
            session_code,
        } => {
            if !state.started() && state.session_code == 0 {
                info!("Player {} starts a new game at level {}", player_id, level);
                level::build_level(state, level, &mut rand::thread_rng())?;
            } else if session_code != state.session_code {
                warn!("Received wrong code the game {}", player_id);
                state.message = Some(GameMessage::terminal(format!(
                    "Player {} inserted wrong code:{}, the game closed!",
                    player_id, session_code
                )));
                return Ok(true);
            } else {
                info!("Player {} joined session {}", player_id, session_code);
            }
            Ok(false)
        }

        Packet::Move { direction } => {
            if !state.started() {
                warn!("Player {} moved before the maze was generated", player_id);
                return Ok(false);
            }
            debug!("Received move from Player {}: {}", player_id, direction);
            state.apply_move(player_id, &direction)?;
            Ok(false)
        }

        Packet::State { .. } => {
            warn!("Unexpected state packet from player {}", player_id);
            Ok(false)
        }
    }
}

/// Sends one serialized snapshot to every registered connection. A failing
/// connection is logged and skipped; it stays registered until its own
/// receive loop notices the disconnect.
async fn broadcast(connections: &Connections, snapshot: &Packet) {
    let mut connections = connections.lock().await;
    for (player_id, conn) in connections.iter_mut() {
        if let Err(e) = frame::write_packet(conn, snapshot).await {
            error!("Error sending to Player {}: {}", player_id, e);
        }
    }
}
