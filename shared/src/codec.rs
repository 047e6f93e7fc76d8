//! Big-endian binary wire format.
//!
//! Every message starts with a one-byte tag equal to the index of its
//! variant. Integers are fixed-width big-endian, strings carry a `u8` length
//! prefix, sequences and maps a `u32` element count. Map keys are always
//! one-byte player ids.
//!
//! Encoding is infallible. Decoding reports either `Incomplete` (the input
//! ended early, a stream reader should wait for more bytes) or one of the
//! malformed variants (the input can never become a valid message).

use crate::messages::{ClientMessage, DrawMessage, Event, InputMessage, ServerMessage};
use crate::types::{Bomb, Direction, Player, PlayerId, Position};
use std::collections::BTreeMap;
use thiserror::Error;

/// Largest payload a single UDP datagram can carry.
pub const MAX_DATAGRAM_SIZE: usize = 65507;

/// Longest string representable with a one-byte length prefix.
pub const MAX_STRING_LEN: usize = u8::MAX as usize;

mod tag {
    pub mod client {
        pub const JOIN: u8 = 0;
        pub const PLACE_BOMB: u8 = 1;
        pub const PLACE_BLOCK: u8 = 2;
        pub const MOVE: u8 = 3;
    }

    pub mod server {
        pub const HELLO: u8 = 0;
        pub const ACCEPTED_PLAYER: u8 = 1;
        pub const GAME_STARTED: u8 = 2;
        pub const TURN: u8 = 3;
        pub const GAME_ENDED: u8 = 4;
    }

    pub mod event {
        pub const BOMB_PLACED: u8 = 0;
        pub const BOMB_EXPLODED: u8 = 1;
        pub const PLAYER_MOVED: u8 = 2;
        pub const BLOCK_PLACED: u8 = 3;
    }

    pub mod input {
        pub const PLACE_BOMB: u8 = 0;
        pub const PLACE_BLOCK: u8 = 1;
        pub const MOVE: u8 = 2;
    }

    pub mod draw {
        pub const LOBBY: u8 = 0;
        pub const GAME: u8 = 1;
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The buffer ends before the message does.
    #[error("message incomplete, more bytes needed")]
    Incomplete,
    #[error("unknown {kind} tag {tag}")]
    UnknownTag { kind: &'static str, tag: u8 },
    #[error("invalid direction {0}")]
    InvalidDirection(u8),
    /// A datagram ended before its message did.
    #[error("datagram of {0} bytes holds a truncated message")]
    Truncated(usize),
    #[error("{0} trailing bytes after message")]
    TrailingBytes(usize),
    #[error("string is not valid UTF-8")]
    InvalidUtf8,
    #[error("player id {0} appears twice in one map")]
    DuplicateKey(PlayerId),
}

impl CodecError {
    /// True when waiting for more input could still produce a message.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, CodecError::Incomplete)
    }
}

pub trait Encode {
    fn encode(&self, out: &mut Vec<u8>);

    /// Encodes into a fresh buffer owned by the caller.
    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode(&mut out);
        out
    }
}

pub trait Decode: Sized {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError>;
}

/// Bounds-checked cursor over received bytes.
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        if self.remaining() < len {
            return Err(CodecError::Incomplete);
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.take(N)?);
        Ok(array)
    }

    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, CodecError> {
        Ok(u16::from_be_bytes(self.take_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, CodecError> {
        Ok(u32::from_be_bytes(self.take_array()?))
    }

    pub fn read<T: Decode>(&mut self) -> Result<T, CodecError> {
        T::decode(self)
    }
}

impl Encode for u8 {
    fn encode(&self, out: &mut Vec<u8>) {
        out.push(*self);
    }
}

impl Decode for u8 {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        reader.read_u8()
    }
}

impl Encode for u16 {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_be_bytes());
    }
}

impl Decode for u16 {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        reader.read_u16()
    }
}

impl Encode for u32 {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_be_bytes());
    }
}

impl Decode for u32 {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        reader.read_u32()
    }
}

impl Encode for String {
    fn encode(&self, out: &mut Vec<u8>) {
        debug_assert!(self.len() <= MAX_STRING_LEN, "string too long for wire");
        let bytes = self.as_bytes();
        let len = bytes.len().min(MAX_STRING_LEN);
        out.push(len as u8);
        out.extend_from_slice(&bytes[..len]);
    }
}

impl Decode for String {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let len = reader.read_u8()? as usize;
        let bytes = reader.take(len)?;
        // Lossy decoding could grow a name past what fits back on the wire.
        String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidUtf8)
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self, out: &mut Vec<u8>) {
        debug_assert!(self.len() <= u32::MAX as usize);
        (self.len() as u32).encode(out);
        for item in self {
            item.encode(out);
        }
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let count = reader.read_u32()? as usize;
        // Every element takes at least one byte, so never reserve more than remains.
        let mut items = Vec::with_capacity(count.min(reader.remaining()));
        for _ in 0..count {
            items.push(T::decode(reader)?);
        }
        Ok(items)
    }
}

impl<V: Encode> Encode for BTreeMap<PlayerId, V> {
    fn encode(&self, out: &mut Vec<u8>) {
        (self.len() as u32).encode(out);
        for (key, value) in self {
            key.encode(out);
            value.encode(out);
        }
    }
}

impl<V: Decode> Decode for BTreeMap<PlayerId, V> {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let count = reader.read_u32()?;
        let mut map = BTreeMap::new();
        for _ in 0..count {
            let key = reader.read_u8()?;
            let value = V::decode(reader)?;
            if map.insert(key, value).is_some() {
                return Err(CodecError::DuplicateKey(key));
            }
        }
        Ok(map)
    }
}

impl Encode for Direction {
    fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.to_u8());
    }
}

impl Decode for Direction {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let value = reader.read_u8()?;
        Direction::from_u8(value).ok_or(CodecError::InvalidDirection(value))
    }
}

impl Encode for Position {
    fn encode(&self, out: &mut Vec<u8>) {
        self.x.encode(out);
        self.y.encode(out);
    }
}

impl Decode for Position {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Position {
            x: reader.read_u16()?,
            y: reader.read_u16()?,
        })
    }
}

impl Encode for Player {
    fn encode(&self, out: &mut Vec<u8>) {
        self.name.encode(out);
        self.address.encode(out);
    }
}

impl Decode for Player {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Player {
            name: reader.read()?,
            address: reader.read()?,
        })
    }
}

impl Encode for Bomb {
    fn encode(&self, out: &mut Vec<u8>) {
        self.position.encode(out);
        self.timer.encode(out);
    }
}

impl Decode for Bomb {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Bomb {
            position: reader.read()?,
            timer: reader.read_u16()?,
        })
    }
}

impl Encode for Event {
    fn encode(&self, out: &mut Vec<u8>) {
        match self {
            Event::BombPlaced { id, position } => {
                out.push(tag::event::BOMB_PLACED);
                id.encode(out);
                position.encode(out);
            }
            Event::BombExploded {
                id,
                robots_destroyed,
                blocks_destroyed,
            } => {
                out.push(tag::event::BOMB_EXPLODED);
                id.encode(out);
                robots_destroyed.encode(out);
                blocks_destroyed.encode(out);
            }
            Event::PlayerMoved { id, position } => {
                out.push(tag::event::PLAYER_MOVED);
                id.encode(out);
                position.encode(out);
            }
            Event::BlockPlaced { position } => {
                out.push(tag::event::BLOCK_PLACED);
                position.encode(out);
            }
        }
    }
}

impl Decode for Event {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        match reader.read_u8()? {
            tag::event::BOMB_PLACED => Ok(Event::BombPlaced {
                id: reader.read_u32()?,
                position: reader.read()?,
            }),
            tag::event::BOMB_EXPLODED => Ok(Event::BombExploded {
                id: reader.read_u32()?,
                robots_destroyed: reader.read()?,
                blocks_destroyed: reader.read()?,
            }),
            tag::event::PLAYER_MOVED => Ok(Event::PlayerMoved {
                id: reader.read_u8()?,
                position: reader.read()?,
            }),
            tag::event::BLOCK_PLACED => Ok(Event::BlockPlaced {
                position: reader.read()?,
            }),
            tag => Err(CodecError::UnknownTag { kind: "event", tag }),
        }
    }
}

impl Encode for ClientMessage {
    fn encode(&self, out: &mut Vec<u8>) {
        match self {
            ClientMessage::Join { name } => {
                out.push(tag::client::JOIN);
                name.encode(out);
            }
            ClientMessage::PlaceBomb => out.push(tag::client::PLACE_BOMB),
            ClientMessage::PlaceBlock => out.push(tag::client::PLACE_BLOCK),
            ClientMessage::Move { direction } => {
                out.push(tag::client::MOVE);
                direction.encode(out);
            }
        }
    }
}

impl Decode for ClientMessage {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        match reader.read_u8()? {
            tag::client::JOIN => Ok(ClientMessage::Join {
                name: reader.read()?,
            }),
            tag::client::PLACE_BOMB => Ok(ClientMessage::PlaceBomb),
            tag::client::PLACE_BLOCK => Ok(ClientMessage::PlaceBlock),
            tag::client::MOVE => Ok(ClientMessage::Move {
                direction: reader.read()?,
            }),
            tag => Err(CodecError::UnknownTag {
                kind: "client message",
                tag,
            }),
        }
    }
}

impl Encode for ServerMessage {
    fn encode(&self, out: &mut Vec<u8>) {
        match self {
            ServerMessage::Hello {
                server_name,
                players_count,
                size_x,
                size_y,
                game_length,
                explosion_radius,
                bomb_timer,
            } => {
                out.push(tag::server::HELLO);
                server_name.encode(out);
                players_count.encode(out);
                size_x.encode(out);
                size_y.encode(out);
                game_length.encode(out);
                explosion_radius.encode(out);
                bomb_timer.encode(out);
            }
            ServerMessage::AcceptedPlayer { id, player } => {
                out.push(tag::server::ACCEPTED_PLAYER);
                id.encode(out);
                player.encode(out);
            }
            ServerMessage::GameStarted { players } => {
                out.push(tag::server::GAME_STARTED);
                players.encode(out);
            }
            ServerMessage::Turn { turn, events } => {
                out.push(tag::server::TURN);
                turn.encode(out);
                events.encode(out);
            }
            ServerMessage::GameEnded { scores } => {
                out.push(tag::server::GAME_ENDED);
                scores.encode(out);
            }
        }
    }
}

impl Decode for ServerMessage {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        match reader.read_u8()? {
            tag::server::HELLO => Ok(ServerMessage::Hello {
                server_name: reader.read()?,
                players_count: reader.read_u8()?,
                size_x: reader.read_u16()?,
                size_y: reader.read_u16()?,
                game_length: reader.read_u16()?,
                explosion_radius: reader.read_u16()?,
                bomb_timer: reader.read_u16()?,
            }),
            tag::server::ACCEPTED_PLAYER => Ok(ServerMessage::AcceptedPlayer {
                id: reader.read_u8()?,
                player: reader.read()?,
            }),
            tag::server::GAME_STARTED => Ok(ServerMessage::GameStarted {
                players: reader.read()?,
            }),
            tag::server::TURN => Ok(ServerMessage::Turn {
                turn: reader.read_u16()?,
                events: reader.read()?,
            }),
            tag::server::GAME_ENDED => Ok(ServerMessage::GameEnded {
                scores: reader.read()?,
            }),
            tag => Err(CodecError::UnknownTag {
                kind: "server message",
                tag,
            }),
        }
    }
}

impl Encode for InputMessage {
    fn encode(&self, out: &mut Vec<u8>) {
        match self {
            InputMessage::PlaceBomb => out.push(tag::input::PLACE_BOMB),
            InputMessage::PlaceBlock => out.push(tag::input::PLACE_BLOCK),
            InputMessage::Move { direction } => {
                out.push(tag::input::MOVE);
                direction.encode(out);
            }
        }
    }
}

impl Decode for InputMessage {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        match reader.read_u8()? {
            tag::input::PLACE_BOMB => Ok(InputMessage::PlaceBomb),
            tag::input::PLACE_BLOCK => Ok(InputMessage::PlaceBlock),
            tag::input::MOVE => Ok(InputMessage::Move {
                direction: reader.read()?,
            }),
            tag => Err(CodecError::UnknownTag {
                kind: "input message",
                tag,
            }),
        }
    }
}

impl Encode for DrawMessage {
    fn encode(&self, out: &mut Vec<u8>) {
        match self {
            DrawMessage::Lobby {
                server_name,
                players_count,
                size_x,
                size_y,
                game_length,
                explosion_radius,
                bomb_timer,
                players,
            } => {
                out.push(tag::draw::LOBBY);
                server_name.encode(out);
                players_count.encode(out);
                size_x.encode(out);
                size_y.encode(out);
                game_length.encode(out);
                explosion_radius.encode(out);
                bomb_timer.encode(out);
                players.encode(out);
            }
            DrawMessage::Game {
                server_name,
                size_x,
                size_y,
                game_length,
                turn,
                players,
                player_positions,
                blocks,
                bombs,
                explosions,
                scores,
            } => {
                out.push(tag::draw::GAME);
                server_name.encode(out);
                size_x.encode(out);
                size_y.encode(out);
                game_length.encode(out);
                turn.encode(out);
                players.encode(out);
                player_positions.encode(out);
                blocks.encode(out);
                bombs.encode(out);
                explosions.encode(out);
                scores.encode(out);
            }
        }
    }
}

impl Decode for DrawMessage {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        match reader.read_u8()? {
            tag::draw::LOBBY => Ok(DrawMessage::Lobby {
                server_name: reader.read()?,
                players_count: reader.read_u8()?,
                size_x: reader.read_u16()?,
                size_y: reader.read_u16()?,
                game_length: reader.read_u16()?,
                explosion_radius: reader.read_u16()?,
                bomb_timer: reader.read_u16()?,
                players: reader.read()?,
            }),
            tag::draw::GAME => Ok(DrawMessage::Game {
                server_name: reader.read()?,
                size_x: reader.read_u16()?,
                size_y: reader.read_u16()?,
                game_length: reader.read_u16()?,
                turn: reader.read_u16()?,
                players: reader.read()?,
                player_positions: reader.read()?,
                blocks: reader.read()?,
                bombs: reader.read()?,
                explosions: reader.read()?,
                scores: reader.read()?,
            }),
            tag => Err(CodecError::UnknownTag {
                kind: "draw message",
                tag,
            }),
        }
    }
}

/// Decodes one message from the front of `data`, returning it together with
/// the number of bytes it occupied.
pub fn decode_prefix<T: Decode>(data: &[u8]) -> Result<(T, usize), CodecError> {
    let mut reader = Reader::new(data);
    let message = T::decode(&mut reader)?;
    Ok((message, reader.position()))
}
