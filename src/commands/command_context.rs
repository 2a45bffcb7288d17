use std::sync::{Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::{key_value_store::Store, replication::ReplicationManager};

/// Everything a command handler may read or touch.
pub struct CommandContext<'a> {
    pub store: &'a Store,
    pub replication: &'a ReplicationManager,
    pub reply: &'a ReplyTarget,
}

/// The connection a command came in on.
///
/// A connection that issues PSYNC becomes a replica: the handler opens a
/// replication feed here, and the session starts draining it once the
/// full-resync reply has been written, so propagated frames always follow the
/// snapshot on the wire.
#[derive(Debug)]
pub struct ReplyTarget {
    client_address: String,
    replication_feed: Mutex<Option<UnboundedReceiver<Bytes>>>,
}

impl ReplyTarget {
    pub fn new(client_address: impl Into<String>) -> Self {
        Self {
            client_address: client_address.into(),
            replication_feed: Mutex::new(None),
        }
    }

    pub fn client_address(&self) -> &str {
        &self.client_address
    }

    pub fn open_replication_feed(&self) -> UnboundedSender<Bytes> {
        let (sender, receiver) = unbounded_channel();
        *self.feed() = Some(receiver);

        sender
    }

    pub fn take_replication_feed(&self) -> Option<UnboundedReceiver<Bytes>> {
        self.feed().take()
    }

    fn feed(&self) -> MutexGuard<'_, Option<UnboundedReceiver<Bytes>>> {
        self.replication_feed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
