//! Master/replica replication.
//!
//! On a master, [`ReplicationManager`] owns the replication id, the registry of
//! connected replicas and the stream offset, and forwards every write command
//! to the replicas. On a replica, [`handshake`] and [`follow_master`] run the
//! client side of the protocol against the configured master.

mod handshake;
mod rdb;
mod registry;

use std::collections::BTreeMap;

use rand::{distributions::Alphanumeric, Rng};

pub use handshake::{
    follow_master, handshake, is_valid_repl_id, replicate_from_master, FullResync,
};
pub use rdb::empty_rdb;
pub use registry::{ReplicaHandle, ReplicaRegistry};

use crate::{resp::RespValue, server::RedisRole};

const REPL_ID_LENGTH: usize = 40;

#[derive(Debug)]
pub struct ReplicationManager {
    role: RedisRole,
    repl_id: String,
    replicas: ReplicaRegistry,
}

impl ReplicationManager {
    pub fn new(role: RedisRole) -> Self {
        Self::with_repl_id(role, generate_repl_id())
    }

    pub fn with_repl_id(role: RedisRole, repl_id: String) -> Self {
        Self {
            role,
            repl_id,
            replicas: ReplicaRegistry::new(),
        }
    }

    pub fn role(&self) -> &RedisRole {
        &self.role
    }

    pub fn is_master(&self) -> bool {
        matches!(self.role, RedisRole::Master)
    }

    pub fn repl_id(&self) -> &str {
        &self.repl_id
    }

    pub fn replicas(&self) -> &ReplicaRegistry {
        &self.replicas
    }

    pub fn register_replica(&self, handle: ReplicaHandle) {
        self.replicas.register(handle);
    }

    /// Forwards a write command to every replica. A no-op on a replica or
    /// when nobody is listening.
    pub fn propagate(&self, name: &str, arguments: &[String]) {
        if !self.is_master() || self.replicas.is_empty() {
            return;
        }

        let parts = std::iter::once(name).chain(arguments.iter().map(String::as_str));
        self.replicas.broadcast(&RespValue::command(parts));
    }

    /// The replication section reported by INFO.
    pub fn info(&self) -> BTreeMap<String, String> {
        let mut info = BTreeMap::from([
            ("role".to_string(), self.role.as_string().to_string()),
            ("connected_slaves".to_string(), self.replicas.len().to_string()),
            ("master_replid".to_string(), self.repl_id.clone()),
            (
                "master_repl_offset".to_string(),
                self.replicas.offset().to_string(),
            ),
        ]);

        if let RedisRole::Replica(master) = &self.role {
            info.insert("master_host".to_string(), master.host.clone());
            info.insert("master_port".to_string(), master.port.to_string());
        }

        info
    }
}

fn generate_repl_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(REPL_ID_LENGTH)
        .map(char::from)
        .collect()
}
