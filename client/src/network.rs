//! Client network layer bridging the GUI (UDP) and the game server (TCP)

use crate::config::ClientConfig;
use crate::game::ClientGameState;
use log::{debug, info, warn};
use shared::{
    read_pump, write_pump, DatagramReader, DrawMessage, Encode, InputMessage, Outbox,
    ServerMessage,
};
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use thiserror::Error;
use tokio::net::{lookup_host, TcpStream, UdpSocket};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("could not resolve {address}: {source}")]
    Resolve {
        address: String,
        #[source]
        source: io::Error,
    },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("lost connection to server: {0}")]
    ServerLost(String),
}

/// Messages sent from the server connection tasks to the main client loop
#[derive(Debug)]
enum ServerEvent {
    Message(ServerMessage),
    Disconnected(String),
}

pub struct Client {
    game: ClientGameState,
    gui_socket: UdpSocket,
    gui_addr: SocketAddr,
    server: Outbox,
    server_events: mpsc::UnboundedReceiver<ServerEvent>,
    tasks: Vec<AbortHandle>,
}

/// Resolves a `host:port` string, taking the first address found.
pub async fn resolve(address: &str) -> Result<SocketAddr, ClientError> {
    let resolve_error = |source: io::Error| ClientError::Resolve {
        address: address.to_string(),
        source,
    };

    lookup_host(address)
        .await
        .map_err(resolve_error)?
        .next()
        .ok_or_else(|| resolve_error(io::Error::new(io::ErrorKind::NotFound, "no addresses")))
}

impl Client {
    /// Resolves both peers, opens the GUI socket and connects to the server.
    pub async fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        let gui_addr = resolve(&config.gui_address).await?;
        let server_addr = resolve(&config.server_address).await?;

        // Same family as the GUI so `send_to` can reach it.
        let gui_socket = if gui_addr.is_ipv6() {
            UdpSocket::bind((Ipv6Addr::UNSPECIFIED, config.port)).await?
        } else {
            UdpSocket::bind((Ipv4Addr::UNSPECIFIED, config.port)).await?
        };
        info!(
            "Listening for GUI input on {}, drawing to {}",
            gui_socket.local_addr()?,
            gui_addr
        );

        let stream = TcpStream::connect(server_addr).await?;
        stream.set_nodelay(true)?;
        info!("Connected to server at {}", server_addr);

        let (reader, writer) = stream.into_split();
        let (server, queue) = Outbox::new();
        let (events_tx, server_events) = mpsc::unbounded_channel();

        let events = events_tx.clone();
        let read_task = tokio::spawn(async move {
            let result = read_pump(reader, |message: ServerMessage| {
                events.send(ServerEvent::Message(message)).is_ok()
            })
            .await;

            if let Err(e) = result {
                let _ = events.send(ServerEvent::Disconnected(e.to_string()));
            }
        });

        let events = events_tx;
        let write_task = tokio::spawn(async move {
            if let Err(e) = write_pump(writer, queue).await {
                let _ = events.send(ServerEvent::Disconnected(e.to_string()));
            }
        });

        Ok(Client {
            game: ClientGameState::new(config.player_name),
            gui_socket,
            gui_addr,
            server,
            server_events,
            tasks: vec![read_task.abort_handle(), write_task.abort_handle()],
        })
    }

    /// Local address the GUI should send its input to.
    pub fn gui_local_addr(&self) -> io::Result<SocketAddr> {
        self.gui_socket.local_addr()
    }

    /// Main client loop. Only returns when the server connection is lost.
    pub async fn run(mut self) -> Result<(), ClientError> {
        let mut datagrams = DatagramReader::new();

        loop {
            tokio::select! {
                received = self.gui_socket.recv_from(datagrams.buffer_mut()) => {
                    match received {
                        Ok((len, from)) => match datagrams.decode::<InputMessage>(len) {
                            Ok(input) => self.handle_input(input)?,
                            Err(e) => warn!("Discarding datagram from {}: {}", from, e),
                        },
                        Err(e) => warn!("Error receiving from GUI: {}", e),
                    }
                },

                event = self.server_events.recv() => {
                    match event {
                        Some(ServerEvent::Message(message)) => {
                            self.handle_server_message(message).await;
                        }
                        Some(ServerEvent::Disconnected(reason)) => {
                            return Err(ClientError::ServerLost(reason));
                        }
                        None => {
                            return Err(ClientError::ServerLost("connection tasks stopped".to_string()));
                        }
                    }
                },
            }
        }
    }

    fn handle_input(&mut self, input: InputMessage) -> Result<(), ClientError> {
        let Some(message) = self.game.handle_input(input) else {
            return Ok(());
        };

        debug!("Sending {:?}", message);
        if !self.server.send_message(&message) {
            return Err(ClientError::ServerLost("write queue closed".to_string()));
        }
        Ok(())
    }

    async fn handle_server_message(&mut self, message: ServerMessage) {
        debug!("Received {}", message.kind());
        if let Some(draw) = self.game.handle_server_message(message) {
            self.draw(&draw).await;
        }
    }

    async fn draw(&self, draw: &DrawMessage) {
        if let Err(e) = self.gui_socket.send_to(&draw.to_bytes(), self.gui_addr).await {
            warn!("Failed to send draw message to {}: {}", self.gui_addr, e);
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}
