//! Client connection: setup handshake, snapshot receive loop, move sender.

use crate::menu::{setup_packet, MenuChoice};
use crate::rendering;
use log::{error, info};
use shared::{frame, Packet};
use std::error::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::oneshot;

pub struct Client {
    reader: OwnedReadHalf,
    writer: OwnedWriteHalf,
}

impl Client {
    pub async fn new(addr: &str) -> Result<Self, Box<dyn Error>> {
        let stream = TcpStream::connect(addr).await?;
        info!("Connected to server at {}", addr);

        let (reader, writer) = stream.into_split();
        Ok(Client { reader, writer })
    }

    /// Sends the setup packet, then runs the session: a spawned task renders
    /// every incoming snapshot while this loop maps keyboard lines to move
    /// tokens. `q` quits locally; a terminal message or a server disconnect
    /// ends the receive task and with it the whole session.
    pub async fn run(self, choice: MenuChoice) -> Result<(), Box<dyn Error>> {
        let Client {
            mut reader,
            mut writer,
        } = self;

        frame::write_packet(&mut writer, &setup_packet(choice)).await?;

        let (done_tx, mut done_rx) = oneshot::channel::<()>();
        let recv_task = tokio::spawn(async move {
            receive_loop(&mut reader).await;
            let _ = done_tx.send(());
        });

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                _ = &mut done_rx => break,

                line = lines.next_line() => {
                    match line? {
                        Some(line) => {
                            if !send_move(&mut writer, line.trim()).await? {
                                break;
                            }
                        }
                        None => break,
                    }
                }
            }
        }

        drop(writer);
        let _ = recv_task.await;
        println!("Game over!");
        Ok(())
    }
}

/// Renders snapshots until the server disconnects or the match ends.
async fn receive_loop(reader: &mut OwnedReadHalf) {
    loop {
        match frame::read_packet(reader).await {
            Ok(Some(Packet::State {
                grid,
                players,
                mobs,
                session_code,
                message,
                ..
            })) => {
                rendering::draw(&grid, &players, &mobs, session_code, message.as_ref());
                if message.map(|m| m.is_terminal()).unwrap_or(false) {
                    break;
                }
            }
            Ok(Some(_)) => {}
            Ok(None) => {
                println!("Disconnected from server.");
                break;
            }
            Err(e) => {
                error!("Error receiving data: {}", e);
                break;
            }
        }
    }
}

/// Maps one input line to a move token; returns false on quit.
async fn send_move(writer: &mut OwnedWriteHalf, input: &str) -> Result<bool, Box<dyn Error>> {
    let direction = match input {
        "w" | "W" => "up",
        "s" | "S" => "down",
        "a" | "A" => "left",
        "d" | "D" => "right",
        "q" | "Q" => {
            println!("Quitting game.");
            return Ok(false);
        }
        _ => return Ok(true),
    };

    frame::write_packet(
        writer,
        &Packet::Move {
            direction: direction.to_string(),
        },
    )
    .await?;
    Ok(true)
}
