pub mod board;
pub mod codec;
pub mod framing;
pub mod messages;
pub mod pump;
pub mod types;

pub use board::{blast, Blast, Board};
pub use codec::{CodecError, Decode, Encode, MAX_DATAGRAM_SIZE, MAX_STRING_LEN};
pub use framing::{DatagramReader, StreamReader};
pub use messages::{ClientMessage, DrawMessage, Event, InputMessage, ServerMessage};
pub use pump::{encode_frame, read_pump, write_pump, Frame, Outbox, TransportError};
pub use types::{Bomb, BombId, Coord, Direction, Player, PlayerId, PlayerInfo, Position, Score};
