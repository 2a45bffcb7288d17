//! REPLCONF, sent by a replica during the replication handshake.

use tracing::debug;

use crate::{
    commands::{command_context::CommandContext, command_error::CommandError, Command},
    resp::RespValue,
};

/// Option/value pairs as sent by the replica, e.g. `listening-port 6380` or
/// `capa psync2`.
pub struct ReplconfArguments {
    options: Vec<(String, String)>,
}

impl ReplconfArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.is_empty() || arguments.len() % 2 != 0 {
            return Err(CommandError::wrong_arity("replconf"));
        }

        let mut arguments = arguments.into_iter();
        let mut options = Vec::new();
        while let (Some(option), Some(value)) = (arguments.next(), arguments.next()) {
            options.push((option.to_lowercase(), value));
        }

        Ok(Self { options })
    }
}

/// Acknowledges every option without acting on it.
pub struct Replconf;

impl Command for Replconf {
    fn name(&self) -> &'static str {
        "REPLCONF"
    }

    fn execute(
        &self,
        ctx: &CommandContext<'_>,
        arguments: Vec<String>,
    ) -> Result<RespValue, CommandError> {
        let replconf_arguments = ReplconfArguments::parse(arguments)?;

        for (option, value) in &replconf_arguments.options {
            debug!(
                client = ctx.reply.client_address(),
                option = option.as_str(),
                value = value.as_str(),
                "REPLCONF option received"
            );
        }

        Ok(RespValue::ok())
    }
}
