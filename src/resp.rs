//! Redis Serialization Protocol (RESP) codec.
//!
//! Decoding is split in two: [`parse_command`] accepts only the client command
//! grammar (`*<N>\r\n` followed by `N` bulk strings) and [`parse_reply`] accepts
//! the reply shapes a replica sees from its master during the handshake. Both
//! work on a byte slice and report `Ok(None)` when the slice holds only part of
//! a frame, so callers can keep reading and retry.

use std::collections::BTreeMap;

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

const CRLF: &[u8] = b"\r\n";

/// Largest bulk string accepted from the wire (512 MB, as in Redis).
pub const MAX_BULK_LENGTH: usize = 512 * 1024 * 1024;

/// Malformed input on the wire. Fatal to the session that produced it.
#[derive(Error, Debug, PartialEq)]
pub enum RespError {
    #[error("expected '*' at the start of a command frame")]
    ExpectedArray,
    #[error("expected '$' at the start of a bulk string")]
    ExpectedBulkString,
    #[error("invalid length field")]
    InvalidLength,
    #[error("bulk string is not terminated by CRLF")]
    MissingTerminator,
    #[error("invalid UTF-8 sequence")]
    InvalidUtf8,
    #[error("unknown RESP type")]
    UnknownRespType,
}

/// A typed reply produced by a command handler.
#[derive(Debug, Clone, PartialEq)]
pub enum RespValue {
    SimpleString(String),
    Error(String),
    Integer(i64),
    Null,
    BulkString(String),
    Array(Vec<RespValue>),
    /// Rendered as a single simple string of `key:value\n` lines.
    Map(BTreeMap<String, String>),
    /// `$<len>\r\n<bytes>` with no trailing terminator (snapshot transfer).
    RawBytes(Bytes),
    /// Several replies, each encoded and written on its own.
    Sequence(Vec<RespValue>),
}

impl RespValue {
    /// Builds a command frame (array of bulk strings) from its parts.
    pub fn command<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RespValue::Array(
            parts
                .into_iter()
                .map(|part| RespValue::BulkString(part.into()))
                .collect(),
        )
    }

    pub fn ok() -> Self {
        RespValue::SimpleString("OK".to_string())
    }

    /// Encodes the whole value into one buffer. A [`RespValue::Sequence`]
    /// becomes the concatenation of its parts.
    pub fn encode(&self) -> Bytes {
        let mut dst = BytesMut::new();
        self.encode_into(&mut dst);
        dst.freeze()
    }

    /// Splits the value into the independent writes the session performs.
    pub fn wire_parts(&self) -> Vec<Bytes> {
        match self {
            RespValue::Sequence(values) => values.iter().flat_map(|v| v.wire_parts()).collect(),
            value => vec![value.encode()],
        }
    }

    fn encode_into(&self, dst: &mut BytesMut) {
        match self {
            RespValue::SimpleString(text) => put_line(dst, b'+', text, &['\r', '\n']),
            RespValue::Error(text) => put_line(dst, b'-', text, &['\r', '\n']),
            RespValue::Integer(value) => {
                dst.put_slice(format!(":{}\r\n", value).as_bytes());
            }
            RespValue::Null => dst.put_slice(b"$-1\r\n"),
            RespValue::BulkString(text) => {
                dst.put_slice(format!("${}\r\n", text.len()).as_bytes());
                dst.put_slice(text.as_bytes());
                dst.put_slice(CRLF);
            }
            RespValue::Array(values) => {
                dst.put_slice(format!("*{}\r\n", values.len()).as_bytes());
                for value in values {
                    value.encode_into(dst);
                }
            }
            RespValue::Map(pairs) => {
                let text: String = pairs
                    .iter()
                    .map(|(key, value)| format!("{}:{}\n", key, value))
                    .collect();
                put_line(dst, b'+', &text, &['\r']);
            }
            RespValue::RawBytes(bytes) => {
                dst.put_slice(format!("${}\r\n", bytes.len()).as_bytes());
                dst.put_slice(bytes);
            }
            RespValue::Sequence(values) => {
                for value in values {
                    value.encode_into(dst);
                }
            }
        }
    }
}

/// Writes a single-line frame. Line breaks in `text` would end the frame early,
/// so every char in `breaks` is written as a space.
fn put_line(dst: &mut BytesMut, prefix: u8, text: &str, breaks: &[char]) {
    dst.put_u8(prefix);
    if text.contains(breaks) {
        dst.put_slice(text.replace(breaks, " ").as_bytes());
    } else {
        dst.put_slice(text.as_bytes());
    }
    dst.put_slice(CRLF);
}

/// Converts a declared bulk length, rejecting negative and oversized values.
pub(crate) fn bulk_length(length: i64) -> Result<usize, RespError> {
    usize::try_from(length)
        .ok()
        .filter(|length| *length <= MAX_BULK_LENGTH)
        .ok_or(RespError::InvalidLength)
}

/// Parses one client command frame from the start of `src`.
///
/// Returns the decoded arguments and the number of bytes consumed, `Ok(None)`
/// if `src` ends before the frame does, or an error as soon as the bytes seen
/// so far cannot be the prefix of a valid frame.
pub fn parse_command(src: &[u8]) -> Result<Option<(Vec<String>, usize)>, RespError> {
    let mut position = 0;

    let Some(count) = read_length(src, &mut position, b'*', RespError::ExpectedArray)? else {
        return Ok(None);
    };
    let count = usize::try_from(count).map_err(|_| RespError::InvalidLength)?;

    let mut arguments = Vec::with_capacity(count.min(64));

    for _ in 0..count {
        let Some(length) =
            read_length(src, &mut position, b'$', RespError::ExpectedBulkString)?
        else {
            return Ok(None);
        };
        let length = bulk_length(length)?;

        let Some(content) = read_bulk_content(src, &mut position, length)? else {
            return Ok(None);
        };
        arguments.push(content);
    }

    Ok(Some((arguments, position)))
}

/// Parses one reply frame (simple string, error, integer, bulk string, null or
/// array) from the start of `src`.
pub fn parse_reply(src: &[u8]) -> Result<Option<(RespValue, usize)>, RespError> {
    let mut position = 0;
    let value = parse_reply_at(src, &mut position)?;

    Ok(value.map(|value| (value, position)))
}

fn parse_reply_at(src: &[u8], position: &mut usize) -> Result<Option<RespValue>, RespError> {
    let Some(&prefix) = src.get(*position) else {
        return Ok(None);
    };

    match prefix {
        b'+' | b'-' | b':' => {
            let Some(line) = read_line(src, position) else {
                return Ok(None);
            };
            let text = std::str::from_utf8(&line[1..]).map_err(|_| RespError::InvalidUtf8)?;

            Ok(Some(match prefix {
                b'+' => RespValue::SimpleString(text.to_string()),
                b'-' => RespValue::Error(text.to_string()),
                _ => RespValue::Integer(text.parse().map_err(|_| RespError::InvalidLength)?),
            }))
        }
        b'$' => {
            let Some(length) = read_length(src, position, b'$', RespError::ExpectedBulkString)?
            else {
                return Ok(None);
            };

            if length == -1 {
                return Ok(Some(RespValue::Null));
            }
            let length = bulk_length(length)?;

            Ok(read_bulk_content(src, position, length)?.map(RespValue::BulkString))
        }
        b'*' => {
            let Some(count) = read_length(src, position, b'*', RespError::ExpectedArray)? else {
                return Ok(None);
            };
            let count = usize::try_from(count).map_err(|_| RespError::InvalidLength)?;

            let mut values = Vec::with_capacity(count.min(64));
            for _ in 0..count {
                match parse_reply_at(src, position)? {
                    Some(value) => values.push(value),
                    None => return Ok(None),
                }
            }

            Ok(Some(RespValue::Array(values)))
        }
        _ => Err(RespError::UnknownRespType),
    }
}

/// Reads a `<prefix><integer>\r\n` header, advancing `position` past it.
pub(crate) fn read_length(
    src: &[u8],
    position: &mut usize,
    prefix: u8,
    wrong_prefix: RespError,
) -> Result<Option<i64>, RespError> {
    match src.get(*position) {
        None => return Ok(None),
        Some(&byte) if byte != prefix => return Err(wrong_prefix),
        Some(_) => {}
    }

    let Some(line) = read_line(src, position) else {
        return Ok(None);
    };

    std::str::from_utf8(&line[1..])
        .ok()
        .and_then(|digits| digits.parse::<i64>().ok())
        .map(Some)
        .ok_or(RespError::InvalidLength)
}

fn read_bulk_content(
    src: &[u8],
    position: &mut usize,
    length: usize,
) -> Result<Option<String>, RespError> {
    let end = *position + length;

    if src.len() < end + CRLF.len() {
        return Ok(None);
    }

    if &src[end..end + CRLF.len()] != CRLF {
        return Err(RespError::MissingTerminator);
    }

    let content = std::str::from_utf8(&src[*position..end])
        .map_err(|_| RespError::InvalidUtf8)?
        .to_string();
    *position = end + CRLF.len();

    Ok(Some(content))
}

/// Returns the line starting at `position` without its CRLF and moves
/// `position` past the terminator.
fn read_line<'a>(src: &'a [u8], position: &mut usize) -> Option<&'a [u8]> {
    let rest = &src[*position..];
    let end = rest.windows(2).position(|window| window == CRLF)?;

    *position += end + CRLF.len();
    Some(&rest[..end])
}
