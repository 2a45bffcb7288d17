use std::sync::{
    atomic::{AtomicU64, Ordering},
    Mutex, MutexGuard, PoisonError,
};

use bytes::Bytes;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

use crate::resp::RespValue;

/// Outbound side of a replica connection on the master.
///
/// Frames pushed here are written to the replica by the session that owns the
/// connection, after the full-resync reply has gone out.
#[derive(Debug)]
pub struct ReplicaHandle {
    client_address: String,
    sender: UnboundedSender<Bytes>,
}

impl ReplicaHandle {
    pub fn new(client_address: String, sender: UnboundedSender<Bytes>) -> Self {
        Self {
            client_address,
            sender,
        }
    }
}

/// The set of replicas registered on a master.
#[derive(Debug, Default)]
pub struct ReplicaRegistry {
    replicas: Mutex<Vec<ReplicaHandle>>,
    offset: AtomicU64,
}

impl ReplicaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, handle: ReplicaHandle) {
        let mut replicas = self.lock();
        info!(replica = %handle.client_address, "replica registered");
        replicas.push(handle);
    }

    /// Queues `frame` for every registered replica and returns how many
    /// accepted it. Replicas whose connection is gone are dropped.
    pub fn broadcast(&self, frame: &RespValue) -> usize {
        let mut replicas = self.lock();
        if replicas.is_empty() {
            return 0;
        }

        let bytes = frame.encode();

        replicas.retain(|replica| match replica.sender.send(bytes.clone()) {
            Ok(()) => true,
            Err(_) => {
                warn!(replica = %replica.client_address, "replica connection closed, unregistering");
                false
            }
        });

        if replicas.is_empty() {
            return 0;
        }

        self.offset.fetch_add(bytes.len() as u64, Ordering::SeqCst);
        replicas.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes of replication stream produced so far.
    pub fn offset(&self) -> u64 {
        self.offset.load(Ordering::SeqCst)
    }

    pub fn client_addresses(&self) -> Vec<String> {
        self.lock()
            .iter()
            .map(|replica| replica.client_address.clone())
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ReplicaHandle>> {
        self.replicas.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
