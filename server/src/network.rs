//! Server network layer handling TCP connections and turn scheduling

use crate::client_manager::{ClientManager, ConnectionId};
use crate::config::ServerConfig;
use crate::game::{GameState, Phase};
use log::{debug, error, info, warn};
use shared::{encode_frame, read_pump, write_pump, ClientMessage, Frame, Outbox, ServerMessage};
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

/// Messages sent from connection tasks to the main server loop
#[derive(Debug)]
pub enum NetworkEvent {
    Message {
        id: ConnectionId,
        message: ClientMessage,
    },
    Disconnected {
        id: ConnectionId,
        reason: String,
    },
}

/// Main server coordinating connections and the game
pub struct Server {
    config: ServerConfig,
    listener: TcpListener,
    clients: ClientManager,
    game: GameState,
    /// Frames a late connection needs to catch up: the accepted players while
    /// in the lobby, or `GameStarted` and every turn so far during a game.
    replay: Vec<Frame>,
    next_turn: Option<Instant>,

    events_tx: mpsc::UnboundedSender<NetworkEvent>,
    events_rx: mpsc::UnboundedReceiver<NetworkEvent>,
}

impl Server {
    /// Binds the listening socket on every interface.
    ///
    /// Prefers a dual-stack IPv6 socket and falls back to IPv4 on hosts
    /// without IPv6.
    ///
    /// Fails before touching the network if `config` is invalid.
    pub async fn bind(config: ServerConfig) -> Result<Self, Box<dyn std::error::Error>> {
        config.validate()?;

        let listener =
            match TcpListener::bind((Ipv6Addr::UNSPECIFIED, config.port)).await {
                Ok(listener) => listener,
                Err(e) => {
                    warn!("IPv6 bind failed ({}), falling back to IPv4", e);
                    TcpListener::bind((Ipv4Addr::UNSPECIFIED, config.port)).await?
                }
            };
        info!(
            "Server '{}' listening on {}",
            config.server_name,
            listener.local_addr()?
        );

        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Ok(Server {
            game: GameState::new(&config),
            config,
            listener,
            clients: ClientManager::new(),
            replay: Vec::new(),
            next_turn: None,
            events_tx,
            events_rx,
        })
    }

    /// Address the listener ended up on, useful when bound to port 0
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Main server loop coordinating connections and turns
    ///
    /// Reacts to whichever is ready first: a new connection, an event from
    /// a connection task, or the turn deadline while a game is running.
    /// Runs until the task is dropped.
    pub async fn run(mut self) {
        info!("Server started, waiting for {} players", self.config.players_count);

        loop {
            let deadline = self.next_turn.unwrap_or_else(Instant::now);

            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, addr)) => self.handle_connection(stream, addr),
                        Err(e) => {
                            error!("Error accepting connection: {}", e);
                            tokio::time::sleep(Duration::from_millis(10)).await;
                        }
                    }
                },

                Some(event) = self.events_rx.recv() => self.handle_event(event),

                _ = sleep_until(deadline), if self.next_turn.is_some() => {
                    self.handle_turn(deadline);
                },
            }
        }
    }

    /// Greets a new connection and spawns its reader and writer tasks
    fn handle_connection(&mut self, stream: TcpStream, addr: SocketAddr) {
        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to disable Nagle for {}: {}", addr, e);
        }

        let (reader, writer) = stream.into_split();
        let (outbox, queue) = Outbox::new();
        let id = self.clients.add(addr, outbox);

        self.clients.send(id, encode_frame(&self.config.hello()));
        for frame in &self.replay {
            self.clients.send(id, frame.clone());
        }

        let events = self.events_tx.clone();
        let read_task = tokio::spawn(async move {
            let result = read_pump(reader, |message: ClientMessage| {
                events
                    .send(NetworkEvent::Message { id, message })
                    .is_ok()
            })
            .await;

            if let Err(e) = result {
                let _ = events.send(NetworkEvent::Disconnected {
                    id,
                    reason: e.to_string(),
                });
            }
        });

        let events = self.events_tx.clone();
        let write_task = tokio::spawn(async move {
            if let Err(e) = write_pump(writer, queue).await {
                let _ = events.send(NetworkEvent::Disconnected {
                    id,
                    reason: e.to_string(),
                });
            }
        });

        self.clients.attach_task(id, read_task.abort_handle());
        self.clients.attach_task(id, write_task.abort_handle());
    }

    /// Routes an event from a connection task
    fn handle_event(&mut self, event: NetworkEvent) {
        match event {
            NetworkEvent::Message { id, message } => {
                // Late events from a connection that is already gone.
                if !self.clients.contains(id) {
                    return;
                }
                self.handle_message(id, message);
            }
            NetworkEvent::Disconnected { id, reason } => {
                if self.clients.remove(id) {
                    debug!("Connection {} closed: {}", id, reason);
                }
            }
        }
    }

    /// Joins go to the game while in the lobby; anything else becomes the
    /// connection's action for the next turn
    fn handle_message(&mut self, id: ConnectionId, message: ClientMessage) {
        match message {
            ClientMessage::Join { name } if self.game.phase() == Phase::Lobby => {
                self.handle_join(id, name);
            }
            message => {
                if !self.clients.store_message(id, message) {
                    debug!("Dropping action from connection {} without a player", id);
                }
            }
        }
    }

    /// Admits a player and starts the game once the lobby is full
    fn handle_join(&mut self, id: ConnectionId, name: String) {
        let Some(addr) = self.clients.address(id) else {
            return;
        };
        if self.clients.player(id).is_some() {
            return;
        }

        let Some(accepted) = self.game.handle_join(name, addr.to_string()) else {
            debug!("Join from connection {} rejected", id);
            return;
        };
        if let ServerMessage::AcceptedPlayer { id: player, .. } = &accepted {
            self.clients.bind_player(id, *player);
        }
        self.publish(&accepted);

        if self.game.is_enough_players() {
            self.start_game();
        }
    }

    /// Announces the game, sends turn 0 and arms the turn timer
    fn start_game(&mut self) {
        let (started, turn) = self.game.start_game();

        self.replay.clear();
        self.publish(&started);
        self.publish(&turn);
        self.next_turn = Some(Instant::now() + self.config.turn_duration);
    }

    /// Plays one turn with the collected actions and ends the game after
    /// the last one
    ///
    /// The next deadline is computed from the previous one so turns do not
    /// drift.
    fn handle_turn(&mut self, deadline: Instant) {
        let messages = self.clients.drain_mailbox();
        let turn = self.game.handle_turn(&messages);
        self.publish(&turn);

        if self.game.is_end_of_game() {
            let ended = self.game.end_game();
            self.replay.clear();
            self.clients.unbind_players();
            self.broadcast(encode_frame(&ended));
            self.next_turn = None;
        } else {
            self.next_turn = Some(deadline + self.config.turn_duration);
        }
    }

    /// Broadcasts a message and keeps it for connections that arrive later
    fn publish(&mut self, message: &ServerMessage) {
        let frame = encode_frame(message);
        self.replay.push(frame.clone());
        self.broadcast(frame);
    }

    /// Sends a frame to every connection, dropping those whose writer died
    fn broadcast(&mut self, frame: Frame) {
        for id in self.clients.broadcast(&frame) {
            self.clients.remove(id);
        }
    }
}
