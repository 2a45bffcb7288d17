//! Buffered frame reading from network streams.
//!
//! [`FrameReader`] sits between a raw byte stream and the RESP parser. It keeps
//! whatever part of the next frame has already arrived in an internal buffer,
//! so frames split across TCP segments and several frames arriving in one
//! segment are both handled.

use bytes::{Buf, Bytes, BytesMut};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::resp::{self, RespError, RespValue};

/// Errors that can occur while reading frames from a stream.
#[derive(Error, Debug)]
pub enum CommandReadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("connection closed in the middle of a frame")]
    ConnectionClosed,
    #[error("protocol error: {0}")]
    Protocol(#[from] RespError),
    #[error("invalid response from master: {0}")]
    InvalidResponseFromMaster(String),
}

#[derive(Debug)]
pub struct FrameReader<R> {
    reader: R,
    buffer: BytesMut,
    bytes_consumed: u64,
}

impl<R> FrameReader<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: BytesMut::with_capacity(4 * 1024),
            bytes_consumed: 0,
        }
    }

    /// Reads the next client command as its list of arguments.
    ///
    /// Returns `Ok(None)` when the peer closed the connection between frames.
    /// Dropping the returned future before it resolves loses no data, so it can
    /// be raced against other events in `tokio::select!`.
    pub async fn read_command(&mut self) -> Result<Option<Vec<String>>, CommandReadError> {
        loop {
            if let Some((arguments, consumed)) = resp::parse_command(&self.buffer)? {
                self.consume(consumed);
                return Ok(Some(arguments));
            }

            if self.fill_buffer().await? == 0 {
                if self.buffer.is_empty() {
                    return Ok(None);
                }

                return Err(CommandReadError::ConnectionClosed);
            }
        }
    }

    /// Reads a single reply frame.
    pub async fn read_reply(&mut self) -> Result<RespValue, CommandReadError> {
        loop {
            if let Some((value, consumed)) = resp::parse_reply(&self.buffer)? {
                self.consume(consumed);
                return Ok(value);
            }

            if self.fill_buffer().await? == 0 {
                return Err(CommandReadError::ConnectionClosed);
            }
        }
    }

    /// Reads a `$<len>\r\n<len bytes>` payload that has no trailing CRLF.
    pub async fn read_snapshot(&mut self) -> Result<Bytes, CommandReadError> {
        loop {
            let mut position = 0;
            let header = resp::read_length(
                &self.buffer,
                &mut position,
                b'$',
                RespError::ExpectedBulkString,
            )?;

            if let Some(length) = header {
                let length = resp::bulk_length(length)?;

                if self.buffer.len() >= position + length {
                    self.consume(position);
                    let snapshot = self.buffer.split_to(length).freeze();
                    self.bytes_consumed += length as u64;

                    return Ok(snapshot);
                }
            }

            if self.fill_buffer().await? == 0 {
                return Err(CommandReadError::ConnectionClosed);
            }
        }
    }

    /// Total number of bytes handed out as frames so far.
    pub fn bytes_consumed(&self) -> u64 {
        self.bytes_consumed
    }

    fn consume(&mut self, count: usize) {
        self.buffer.advance(count);
        self.bytes_consumed += count as u64;
    }

    async fn fill_buffer(&mut self) -> std::io::Result<usize> {
        self.reader.read_buf(&mut self.buffer).await
    }
}
