use crate::{
    commands::{CommandContext, CommandRegistry, ReplyTarget},
    key_value_store::Store,
    replication::ReplicationManager,
    resp::RespValue,
    server::RedisRole,
};

/// Process-wide state shared by every connection.
#[derive(Debug)]
pub struct ServerState {
    pub store: Store,
    pub replication: ReplicationManager,
    pub commands: CommandRegistry,
}

impl ServerState {
    pub fn new(role: RedisRole) -> Self {
        Self::with_replication(ReplicationManager::new(role))
    }

    pub fn with_replication(replication: ReplicationManager) -> Self {
        Self {
            store: Store::new(),
            replication,
            commands: CommandRegistry::new(),
        }
    }

    /// Runs one decoded command on behalf of the connection behind `reply`.
    pub fn dispatch(&self, reply: &ReplyTarget, arguments: Vec<String>) -> RespValue {
        let ctx = CommandContext {
            store: &self.store,
            replication: &self.replication,
            reply,
        };

        self.commands.dispatch(&ctx, arguments)
    }
}
