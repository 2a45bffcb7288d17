//! PSYNC, the last step of the replication handshake.
//!
//! Only full resynchronization is supported: whatever id and offset the replica
//! asks for, it gets `FULLRESYNC <replid> <offset>` followed by a snapshot of
//! an empty database, and from then on receives every propagated write.

use tracing::{debug, info};

use crate::{
    commands::{command_context::CommandContext, command_error::CommandError, Command},
    replication::{empty_rdb, ReplicaHandle},
    resp::RespValue,
};

pub struct PsyncArguments {
    /// `?` when the replica has never synced.
    repl_id: String,
    offset: i64,
}

impl PsyncArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let [repl_id, offset] =
            <[String; 2]>::try_from(arguments).map_err(|_| CommandError::wrong_arity("psync"))?;

        let offset = offset
            .parse::<i64>()
            .map_err(|_| CommandError::InvalidPsyncOffset)?;

        Ok(Self { repl_id, offset })
    }
}

pub struct Psync;

impl Command for Psync {
    fn name(&self) -> &'static str {
        "PSYNC"
    }

    fn execute(
        &self,
        ctx: &CommandContext<'_>,
        arguments: Vec<String>,
    ) -> Result<RespValue, CommandError> {
        let psync_arguments = PsyncArguments::parse(arguments)?;
        let replication = ctx.replication;

        if !replication.is_master() {
            return Err(CommandError::PsyncOnReplica);
        }

        if psync_arguments.repl_id != "?" && psync_arguments.repl_id != replication.repl_id() {
            debug!(
                requested = psync_arguments.repl_id.as_str(),
                requested_offset = psync_arguments.offset,
                "unknown replication id, falling back to full resync"
            );
        }

        let snapshot = empty_rdb()?;
        let offset = replication.replicas().offset();

        let sender = ctx.reply.open_replication_feed();
        replication.register_replica(ReplicaHandle::new(
            ctx.reply.client_address().to_string(),
            sender,
        ));
        info!(
            replica = ctx.reply.client_address(),
            offset, "full resync started"
        );

        Ok(RespValue::Sequence(vec![
            RespValue::SimpleString(format!("FULLRESYNC {} {}", replication.repl_id(), offset)),
            RespValue::RawBytes(snapshot),
        ]))
    }
}
