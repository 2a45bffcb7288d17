//! Client side of the replication protocol, run by a replica.

use std::sync::OnceLock;

use bytes::Bytes;
use regex::Regex;
use tokio::{
    io::{AsyncRead, AsyncWrite, AsyncWriteExt},
    net::TcpStream,
};
use tracing::{debug, info, warn};

use crate::{
    input::{CommandReadError, FrameReader},
    resp::RespValue,
    server::MasterAddress,
};

/// What the master sent in answer to `PSYNC ? -1`.
#[derive(Debug, Clone, PartialEq)]
pub struct FullResync {
    pub master_repl_id: String,
    pub offset: i64,
    pub snapshot: Bytes,
}

/// Connects to `master`, performs the handshake and then follows the
/// replication stream until the master goes away.
pub async fn replicate_from_master(
    master: MasterAddress,
    listening_port: u16,
) -> Result<(), CommandReadError> {
    let stream = TcpStream::connect((master.host.as_str(), master.port)).await?;
    let (reader, mut writer) = stream.into_split();
    let mut reader = FrameReader::new(reader);

    let resync = handshake(&mut reader, &mut writer, listening_port).await?;
    info!(
        master = %master,
        master_replid = %resync.master_repl_id,
        offset = resync.offset,
        snapshot_bytes = resync.snapshot.len(),
        "full resync received"
    );

    follow_master(&mut reader).await?;
    Ok(())
}

/// Performs the replication handshake over an established connection.
///
/// Each step waits for and checks the master's reply before the next command
/// goes out:
/// 1. `PING` expecting `+PONG`
/// 2. `REPLCONF listening-port <port>` expecting `+OK`
/// 3. `REPLCONF capa psync2` expecting `+OK`
/// 4. `PSYNC ? -1` expecting `+FULLRESYNC <replid> <offset>`, followed by the
///    snapshot payload
pub async fn handshake<R, W>(
    reader: &mut FrameReader<R>,
    writer: &mut W,
    listening_port: u16,
) -> Result<FullResync, CommandReadError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let pong = send_and_read_reply(reader, writer, RespValue::command(["PING"])).await?;
    expect_simple_string(&pong, "PONG")?;

    let port = listening_port.to_string();
    let ok = send_and_read_reply(
        reader,
        writer,
        RespValue::command(["REPLCONF", "listening-port", port.as_str()]),
    )
    .await?;
    expect_simple_string(&ok, "OK")?;

    let ok = send_and_read_reply(
        reader,
        writer,
        RespValue::command(["REPLCONF", "capa", "psync2"]),
    )
    .await?;
    expect_simple_string(&ok, "OK")?;

    let fullresync =
        send_and_read_reply(reader, writer, RespValue::command(["PSYNC", "?", "-1"])).await?;
    let (master_repl_id, offset) = parse_fullresync(&fullresync)?;

    let snapshot = reader.read_snapshot().await?;
    debug!(bytes = snapshot.len(), "snapshot received");

    Ok(FullResync {
        master_repl_id,
        offset,
        snapshot,
    })
}

/// Reads the commands the master propagates, until it closes the connection.
///
/// Frames are decoded and logged but not applied to the local store. Returns
/// the number of bytes of replication stream processed.
pub async fn follow_master<R>(reader: &mut FrameReader<R>) -> Result<u64, CommandReadError>
where
    R: AsyncRead + Unpin,
{
    let start = reader.bytes_consumed();

    loop {
        match reader.read_command().await {
            Ok(Some(arguments)) => {
                debug!(
                    command = ?arguments,
                    offset = reader.bytes_consumed() - start,
                    "propagated command received"
                );
            }
            Ok(None) => {
                let processed = reader.bytes_consumed() - start;
                info!(processed, "master closed the replication stream");
                return Ok(processed);
            }
            Err(e) => {
                warn!("replication stream broken: {}", e);
                return Err(e);
            }
        }
    }
}

pub fn is_valid_repl_id(repl_id: &str) -> bool {
    static REPL_ID: OnceLock<Option<Regex>> = OnceLock::new();

    REPL_ID
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9]{40}$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(repl_id))
}

async fn send_and_read_reply<R, W>(
    reader: &mut FrameReader<R>,
    writer: &mut W,
    command: RespValue,
) -> Result<RespValue, CommandReadError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    writer.write_all(&command.encode()).await?;
    writer.flush().await?;

    reader.read_reply().await
}

fn expect_simple_string(reply: &RespValue, expected: &str) -> Result<(), CommandReadError> {
    match reply {
        RespValue::SimpleString(text) if text.eq_ignore_ascii_case(expected) => Ok(()),
        other => Err(CommandReadError::InvalidResponseFromMaster(format!(
            "expected +{}, got {:?}",
            expected, other
        ))),
    }
}

fn parse_fullresync(reply: &RespValue) -> Result<(String, i64), CommandReadError> {
    let invalid = || CommandReadError::InvalidResponseFromMaster(format!("{:?}", reply));

    let RespValue::SimpleString(line) = reply else {
        return Err(invalid());
    };

    let parts: Vec<&str> = line.split_whitespace().collect();
    let ["FULLRESYNC", repl_id, offset] = parts.as_slice() else {
        return Err(invalid());
    };

    if !is_valid_repl_id(repl_id) {
        return Err(invalid());
    }

    let offset = offset.parse::<i64>().map_err(|_| invalid())?;
    Ok((repl_id.to_string(), offset))
}
