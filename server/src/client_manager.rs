//! Connection bookkeeping for the game server
//!
//! This module tracks every open TCP connection, including:
//! - The outbound queue feeding each connection's write task
//! - Which connection controls which player once a join is accepted
//! - The latest action each player sent during the current turn
//!
//! All of it is owned by the server's event loop, so nothing here locks.

use log::info;
use shared::{ClientMessage, Frame, Outbox, PlayerId};
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::task::AbortHandle;

/// Server-assigned identifier of a TCP connection.
pub type ConnectionId = u64;

/// A single open connection and the tasks serving it.
///
/// Dropping a client aborts its socket tasks, which closes the socket.
#[derive(Debug)]
pub struct Client {
    pub id: ConnectionId,
    pub addr: SocketAddr,
    /// Player controlled by this connection, once a join was accepted.
    pub player: Option<PlayerId>,
    /// Latest action received during the current turn.
    pub pending: Option<ClientMessage>,
    outbox: Outbox,
    tasks: Vec<AbortHandle>,
}

impl Client {
    /// Creates a client with no player and no pending action
    ///
    /// `outbox` feeds the connection's write task; frames queued here are
    /// written to the socket in order.
    pub fn new(id: ConnectionId, addr: SocketAddr, outbox: Outbox) -> Self {
        Self {
            id,
            addr,
            player: None,
            pending: None,
            outbox,
            tasks: Vec::new(),
        }
    }

    /// Ties a spawned socket task to this client's lifetime.
    pub fn attach_task(&mut self, task: AbortHandle) {
        self.tasks.push(task);
    }

    /// Queues a frame behind everything already queued for this client
    pub fn send(&self, frame: Frame) -> bool {
        self.outbox.send(frame)
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Manages all open connections.
///
/// Connection ids are never reused, so events still in flight from a closed
/// connection can be recognised and ignored.
#[derive(Debug, Default)]
pub struct ClientManager {
    clients: HashMap<ConnectionId, Client>,
    next_id: ConnectionId,
}

impl ClientManager {
    /// Creates an empty connection roster
    ///
    /// Connection ids start from 0 and increase for every accepted socket.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a freshly accepted connection and returns its id.
    pub fn add(&mut self, addr: SocketAddr, outbox: Outbox) -> ConnectionId {
        let id = self.next_id;
        self.next_id += 1;

        info!("Client {} connected from {}", id, addr);
        self.clients.insert(id, Client::new(id, addr, outbox));
        id
    }

    /// Gives a spawned task to the connection so it is aborted on removal.
    /// Returns false, aborting the task, if the connection is already gone.
    pub fn attach_task(&mut self, id: ConnectionId, task: AbortHandle) -> bool {
        match self.clients.get_mut(&id) {
            Some(client) => {
                client.attach_task(task);
                true
            }
            None => {
                task.abort();
                false
            }
        }
    }

    /// Forgets a connection and stops its tasks.
    ///
    /// Any player bound to it stays in the game.
    pub fn remove(&mut self, id: ConnectionId) -> bool {
        match self.clients.remove(&id) {
            Some(client) => {
                info!("Client {} ({}) disconnected", client.id, client.addr);
                true
            }
            None => false,
        }
    }

    /// Returns true while the connection is open
    ///
    /// Used to drop events that were already in flight when it closed.
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.clients.contains_key(&id)
    }

    /// Peer address of a connection, used as the player's address on join
    pub fn address(&self, id: ConnectionId) -> Option<SocketAddr> {
        self.clients.get(&id).map(|client| client.addr)
    }

    /// Player controlled by a connection, if its join was accepted
    pub fn player(&self, id: ConnectionId) -> Option<PlayerId> {
        self.clients.get(&id).and_then(|client| client.player)
    }

    /// Gives control of `player` to a connection
    ///
    /// From now on its actions are stored for the next turn. Does nothing
    /// if the connection is already gone.
    pub fn bind_player(&mut self, id: ConnectionId, player: PlayerId) {
        if let Some(client) = self.clients.get_mut(&id) {
            client.player = Some(player);
        }
    }

    /// Releases every player binding and pending action after a game.
    pub fn unbind_players(&mut self) {
        for client in self.clients.values_mut() {
            client.player = None;
            client.pending = None;
        }
    }

    /// Records `message` as the connection's action for this turn, replacing
    /// any earlier one. Returns false if the connection has no player.
    pub fn store_message(&mut self, id: ConnectionId, message: ClientMessage) -> bool {
        match self.clients.get_mut(&id) {
            Some(client) if client.player.is_some() => {
                client.pending = Some(message);
                true
            }
            _ => false,
        }
    }

    /// Takes every pending action, keyed by the player that sent it.
    pub fn drain_mailbox(&mut self) -> HashMap<PlayerId, ClientMessage> {
        self.clients
            .values_mut()
            .filter_map(|client| {
                let message = client.pending.take()?;
                client.player.map(|player| (player, message))
            })
            .collect()
    }

    /// Queues a frame for one connection. Returns false if it is gone or its
    /// writer stopped.
    pub fn send(&self, id: ConnectionId, frame: Frame) -> bool {
        self.clients
            .get(&id)
            .map(|client| client.send(frame))
            .unwrap_or(false)
    }

    /// Queues a frame for every connection and returns the ids whose writer
    /// has already stopped.
    pub fn broadcast(&self, frame: &Frame) -> Vec<ConnectionId> {
        self.clients
            .values()
            .filter(|client| !client.send(frame.clone()))
            .map(|client| client.id)
            .collect()
    }

    /// Returns the number of open connections
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Returns true if no connections are open
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
