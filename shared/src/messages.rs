//! Message unions exchanged between server, client and GUI.
//!
//! Variant order matches the wire tag of each union (see `codec`).

use crate::types::{Bomb, BombId, Coord, Direction, Player, PlayerId, Position, Score};
use std::collections::BTreeMap;

/// Things that happened during a single turn, in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    BombPlaced {
        id: BombId,
        position: Position,
    },
    BombExploded {
        id: BombId,
        robots_destroyed: Vec<PlayerId>,
        blocks_destroyed: Vec<Position>,
    },
    PlayerMoved {
        id: PlayerId,
        position: Position,
    },
    BlockPlaced {
        position: Position,
    },
}

/// Client -> server, over TCP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    Join { name: String },
    PlaceBomb,
    PlaceBlock,
    Move { direction: Direction },
}

/// Server -> client, over TCP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    Hello {
        server_name: String,
        players_count: u8,
        size_x: Coord,
        size_y: Coord,
        game_length: u16,
        explosion_radius: u16,
        bomb_timer: u16,
    },
    AcceptedPlayer {
        id: PlayerId,
        player: Player,
    },
    GameStarted {
        players: BTreeMap<PlayerId, Player>,
    },
    Turn {
        turn: u16,
        events: Vec<Event>,
    },
    GameEnded {
        scores: BTreeMap<PlayerId, Score>,
    },
}

/// GUI -> client, over UDP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMessage {
    PlaceBomb,
    PlaceBlock,
    Move { direction: Direction },
}

/// Client -> GUI, over UDP. Always a complete snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawMessage {
    Lobby {
        server_name: String,
        players_count: u8,
        size_x: Coord,
        size_y: Coord,
        game_length: u16,
        explosion_radius: u16,
        bomb_timer: u16,
        players: BTreeMap<PlayerId, Player>,
    },
    Game {
        server_name: String,
        size_x: Coord,
        size_y: Coord,
        game_length: u16,
        turn: u16,
        players: BTreeMap<PlayerId, Player>,
        player_positions: BTreeMap<PlayerId, Position>,
        blocks: Vec<Position>,
        bombs: Vec<Bomb>,
        explosions: Vec<Position>,
        scores: BTreeMap<PlayerId, Score>,
    },
}

impl From<InputMessage> for ClientMessage {
    fn from(input: InputMessage) -> Self {
        match input {
            InputMessage::PlaceBomb => ClientMessage::PlaceBomb,
            InputMessage::PlaceBlock => ClientMessage::PlaceBlock,
            InputMessage::Move { direction } => ClientMessage::Move { direction },
        }
    }
}

impl ServerMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::Hello { .. } => "Hello",
            ServerMessage::AcceptedPlayer { .. } => "AcceptedPlayer",
            ServerMessage::GameStarted { .. } => "GameStarted",
            ServerMessage::Turn { .. } => "Turn",
            ServerMessage::GameEnded { .. } => "GameEnded",
        }
    }
}
