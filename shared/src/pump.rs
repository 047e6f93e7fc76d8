//! Socket pumps: a read loop that turns bytes into messages, and a write
//! loop that drains an ordered per-connection queue.

use crate::codec::{CodecError, Decode, Encode};
use crate::framing::StreamReader;
use std::io;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

/// An encoded message, shareable between the queues of many connections.
pub type Frame = Arc<[u8]>;

const READ_CHUNK_SIZE: usize = 4096;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed message: {0}")]
    Codec(#[from] CodecError),
    #[error("connection closed by peer")]
    Closed,
}

pub fn encode_frame<M: Encode>(message: &M) -> Frame {
    message.to_bytes().into()
}

/// Sending side of a connection's outbound queue.
#[derive(Debug, Clone)]
pub struct Outbox {
    queue: mpsc::UnboundedSender<Frame>,
}

impl Outbox {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Frame>) {
        let (queue, rx) = mpsc::unbounded_channel();
        (Self { queue }, rx)
    }

    /// Queues a frame behind everything already queued. Returns false once
    /// the write pump has stopped.
    pub fn send(&self, frame: Frame) -> bool {
        self.queue.send(frame).is_ok()
    }

    pub fn send_message<M: Encode>(&self, message: &M) -> bool {
        self.send(encode_frame(message))
    }
}

/// Reads from `reader` until it fails, handing every decoded message to
/// `deliver` in arrival order.
///
/// Returns `Ok(())` when `deliver` returns false. End of stream is reported
/// as `TransportError::Closed`.
pub async fn read_pump<R, T, F>(mut reader: R, mut deliver: F) -> Result<(), TransportError>
where
    R: AsyncRead + Unpin,
    T: Decode,
    F: FnMut(T) -> bool,
{
    let mut stream = StreamReader::new();
    let mut chunk = vec![0u8; READ_CHUNK_SIZE];

    loop {
        let len = reader.read(&mut chunk).await?;
        if len == 0 {
            return Err(TransportError::Closed);
        }
        stream.extend(&chunk[..len]);

        while let Some(message) = stream.next_message::<T>()? {
            if !deliver(message) {
                return Ok(());
            }
        }
    }
}

/// Writes queued frames one at a time, in order, until every `Outbox` for
/// the queue is dropped or a write fails.
pub async fn write_pump<W>(
    mut writer: W,
    mut queue: mpsc::UnboundedReceiver<Frame>,
) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(frame) = queue.recv().await {
        writer.write_all(&frame).await?;
        writer.flush().await?;
    }
    Ok(())
}
