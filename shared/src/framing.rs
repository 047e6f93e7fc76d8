//! Message framing for the two transports.
//!
//! TCP is a byte stream without message boundaries: `StreamReader` keeps the
//! unconsumed tail of everything received so far and peels complete messages
//! off the front. An incomplete message leaves the buffer untouched; anything
//! malformed is fatal for the connection.
//!
//! UDP preserves boundaries: `DatagramReader` owns a receive buffer that each
//! datagram overwrites, and a datagram must contain exactly one message.

use crate::codec::{decode_prefix, CodecError, Decode, MAX_DATAGRAM_SIZE};

#[derive(Debug, Default)]
pub struct StreamReader {
    buffer: Vec<u8>,
}

impl StreamReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends freshly received bytes to the tail.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Number of received bytes not yet consumed by a decoded message.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Decodes the next complete message from the front of the buffer.
    ///
    /// Returns `Ok(None)` when the buffered bytes are only a prefix of a
    /// message. Decoded bytes are discarded; the buffer is left untouched on
    /// any error.
    pub fn next_message<T: Decode>(&mut self) -> Result<Option<T>, CodecError> {
        if self.buffer.is_empty() {
            return Ok(None);
        }
        match decode_prefix::<T>(&self.buffer) {
            Ok((message, used)) => {
                self.buffer.drain(..used);
                Ok(Some(message))
            }
            Err(CodecError::Incomplete) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Decodes every complete message currently buffered, in order.
    pub fn drain_messages<T: Decode>(&mut self) -> Result<Vec<T>, CodecError> {
        let mut messages = Vec::new();
        while let Some(message) = self.next_message()? {
            messages.push(message);
        }
        Ok(messages)
    }
}

pub struct DatagramReader {
    buffer: Box<[u8]>,
}

impl DatagramReader {
    pub fn new() -> Self {
        Self {
            buffer: vec![0u8; MAX_DATAGRAM_SIZE].into_boxed_slice(),
        }
    }

    /// Receive buffer for the next datagram. Its previous contents are
    /// meaningless once a new datagram lands.
    pub fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    /// Decodes the datagram occupying the first `len` bytes of the buffer.
    /// The datagram must hold exactly one message.
    pub fn decode<T: Decode>(&self, len: usize) -> Result<T, CodecError> {
        Self::decode_packet(&self.buffer[..len.min(self.buffer.len())])
    }

    pub fn decode_packet<T: Decode>(packet: &[u8]) -> Result<T, CodecError> {
        match decode_prefix::<T>(packet) {
            Ok((message, used)) if used == packet.len() => Ok(message),
            Ok((_, used)) => Err(CodecError::TrailingBytes(packet.len() - used)),
            Err(CodecError::Incomplete) => Err(CodecError::Truncated(packet.len())),
            Err(e) => Err(e),
        }
    }
}

impl Default for DatagramReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Encode;
    use crate::messages::{ClientMessage, Event, InputMessage, ServerMessage};
    use crate::types::{Direction, Player, Position};

    fn sample_server_messages() -> Vec<ServerMessage> {
        vec![
            ServerMessage::Hello {
                server_name: "Arena".to_string(),
                players_count: 2,
                size_x: 5,
                size_y: 6,
                game_length: 20,
                explosion_radius: 1,
                bomb_timer: 2,
            },
            ServerMessage::AcceptedPlayer {
                id: 0,
                player: Player::new("alice", "127.0.0.1:5000"),
            },
            ServerMessage::Turn {
                turn: 3,
                events: vec![
                    Event::PlayerMoved {
                        id: 0,
                        position: Position::new(1, 1),
                    },
                    Event::BombExploded {
                        id: 2,
                        robots_destroyed: vec![0],
                        blocks_destroyed: vec![Position::new(1, 2)],
                    },
                ],
            },
        ]
    }

    #[test]
    fn test_stream_decodes_regardless_of_chunking() {
        let messages = sample_server_messages();
        let bytes: Vec<u8> = messages.iter().flat_map(|m| m.to_bytes()).collect();

        for chunk_size in 1..=bytes.len() {
            let mut reader = StreamReader::new();
            let mut decoded = Vec::new();
            for chunk in bytes.chunks(chunk_size) {
                reader.extend(chunk);
                decoded.extend(reader.drain_messages::<ServerMessage>().unwrap());
            }
            assert_eq!(decoded, messages, "chunk size {}", chunk_size);
            assert_eq!(reader.buffered(), 0);
        }
    }

    #[test]
    fn test_stream_keeps_partial_message() {
        let bytes = ClientMessage::Join {
            name: "alice".to_string(),
        }
        .to_bytes();
        let mut reader = StreamReader::new();
        reader.extend(&bytes[..3]);
        assert_eq!(reader.next_message::<ClientMessage>().unwrap(), None);
        assert_eq!(reader.buffered(), 3);

        reader.extend(&bytes[3..]);
        assert_eq!(
            reader.next_message::<ClientMessage>().unwrap(),
            Some(ClientMessage::Join {
                name: "alice".to_string()
            })
        );
        assert_eq!(reader.buffered(), 0);
    }

    #[test]
    fn test_stream_reports_malformed_after_valid_messages() {
        let mut reader = StreamReader::new();
        reader.extend(&ClientMessage::PlaceBomb.to_bytes());
        reader.extend(&[9]);

        assert_eq!(
            reader.next_message::<ClientMessage>().unwrap(),
            Some(ClientMessage::PlaceBomb)
        );
        let err = reader.next_message::<ClientMessage>().unwrap_err();
        assert!(!err.is_incomplete());
        assert_eq!(reader.buffered(), 1);
    }

    #[test]
    fn test_datagram_accepts_exact_message() {
        let mut reader = DatagramReader::new();
        let bytes = InputMessage::Move {
            direction: Direction::Right,
        }
        .to_bytes();
        reader.buffer_mut()[..bytes.len()].copy_from_slice(&bytes);
        assert_eq!(
            reader.decode::<InputMessage>(bytes.len()).unwrap(),
            InputMessage::Move {
                direction: Direction::Right
            }
        );
    }

    #[test]
    fn test_datagram_rejects_trailing_bytes() {
        let mut bytes = InputMessage::PlaceBomb.to_bytes();
        bytes.push(0);
        assert_eq!(
            DatagramReader::decode_packet::<InputMessage>(&bytes),
            Err(CodecError::TrailingBytes(1))
        );
    }

    #[test]
    fn test_datagram_rejects_truncated_message() {
        assert_eq!(
            DatagramReader::decode_packet::<InputMessage>(&[2]),
            Err(CodecError::Truncated(1))
        );
        assert_eq!(
            DatagramReader::decode_packet::<InputMessage>(&[]),
            Err(CodecError::Truncated(0))
        );
    }

    #[test]
    fn test_datagram_contents_replaced_by_next_packet() {
        let mut reader = DatagramReader::new();
        let long = InputMessage::Move {
            direction: Direction::Up,
        }
        .to_bytes();
        reader.buffer_mut()[..long.len()].copy_from_slice(&long);
        reader.decode::<InputMessage>(long.len()).unwrap();

        let short = InputMessage::PlaceBlock.to_bytes();
        reader.buffer_mut()[..short.len()].copy_from_slice(&short);
        assert_eq!(
            reader.decode::<InputMessage>(short.len()).unwrap(),
            InputMessage::PlaceBlock
        );
    }
}
