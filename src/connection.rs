//! Per-connection read, dispatch and write loop.

use std::sync::Arc;

use bytes::Bytes;
use tokio::{
    io::{AsyncRead, AsyncWrite, AsyncWriteExt},
    sync::mpsc::UnboundedReceiver,
};
use tracing::{debug, warn};

use crate::{commands::ReplyTarget, input::FrameReader, resp::RespValue, state::ServerState};

/// Serves one client until it disconnects or sends a malformed frame.
///
/// Commands are answered strictly in arrival order. Once the client has been
/// registered as a replica through PSYNC, frames propagated by the master are
/// written to it in between replies to whatever it sends.
pub async fn handle_connection<S>(stream: S, client_address: String, state: Arc<ServerState>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut reader = FrameReader::new(reader);
    let reply_target = ReplyTarget::new(client_address);
    let mut replication_feed: Option<UnboundedReceiver<Bytes>> = None;

    loop {
        let arguments = tokio::select! {
            read = reader.read_command() => match read {
                Ok(Some(arguments)) => arguments,
                Ok(None) => {
                    debug!(client = reply_target.client_address(), "connection closed");
                    break;
                }
                Err(e) => {
                    warn!(client = reply_target.client_address(), "closing connection: {}", e);
                    break;
                }
            },
            Some(frame) = next_propagated_frame(&mut replication_feed) => {
                if let Err(e) = write_frame(&mut writer, &frame).await {
                    warn!(
                        replica = reply_target.client_address(),
                        "failed to write propagated frame: {}", e
                    );
                    break;
                }
                continue;
            }
        };

        let reply = state.dispatch(&reply_target, arguments);

        if let Err(e) = write_reply(&mut writer, &reply).await {
            warn!(client = reply_target.client_address(), "failed to write reply: {}", e);
            break;
        }

        if let Some(feed) = reply_target.take_replication_feed() {
            replication_feed = Some(feed);
        }
    }
}

/// Writes every wire part of `reply`, flushing after each.
pub async fn write_reply<W>(writer: &mut W, reply: &RespValue) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    for part in reply.wire_parts() {
        write_frame(writer, &part).await?;
    }

    Ok(())
}

async fn write_frame<W>(writer: &mut W, frame: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(frame).await?;
    writer.flush().await
}

async fn next_propagated_frame(feed: &mut Option<UnboundedReceiver<Bytes>>) -> Option<Bytes> {
    match feed {
        Some(feed) => feed.recv().await,
        None => std::future::pending().await,
    }
}
