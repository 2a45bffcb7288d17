use std::{collections::HashMap, fmt};

use tracing::debug;

use crate::{
    commands::{
        command_context::CommandContext,
        command_error::CommandError,
        del::Del,
        echo::Echo,
        get::Get,
        hget::HGet,
        hgetall::HGetAll,
        hset::HSet,
        info::Info,
        ping::Ping,
        replication::{Psync, Replconf},
        set::Set,
    },
    resp::RespValue,
};

/// A command the server knows how to run.
///
/// Implementations validate their own arguments and report every failure as a
/// [`CommandError`], which the registry turns into an error reply.
pub trait Command: Send + Sync {
    /// Upper-cased name the command is registered under.
    fn name(&self) -> &'static str;

    fn execute(
        &self,
        ctx: &CommandContext<'_>,
        arguments: Vec<String>,
    ) -> Result<RespValue, CommandError>;
}

pub struct CommandRegistry {
    commands: HashMap<&'static str, Box<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            commands: HashMap::new(),
        };

        registry.register(Box::new(Ping));
        registry.register(Box::new(Echo));
        registry.register(Box::new(Get));
        registry.register(Box::new(Set));
        registry.register(Box::new(Del));
        registry.register(Box::new(HSet));
        registry.register(Box::new(HGet));
        registry.register(Box::new(HGetAll));
        registry.register(Box::new(Info));
        registry.register(Box::new(Replconf));
        registry.register(Box::new(Psync));

        registry
    }

    pub fn register(&mut self, command: Box<dyn Command>) {
        self.commands.insert(command.name(), command);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name.to_uppercase().as_str())
    }

    /// Runs a decoded command. Failures come back as an error reply, never as
    /// a Rust error.
    pub fn dispatch(&self, ctx: &CommandContext<'_>, arguments: Vec<String>) -> RespValue {
        self.execute(ctx, arguments)
            .unwrap_or_else(|e| e.as_resp())
    }

    fn execute(
        &self,
        ctx: &CommandContext<'_>,
        arguments: Vec<String>,
    ) -> Result<RespValue, CommandError> {
        let mut arguments = arguments.into_iter();
        let Some(name) = arguments.next() else {
            return Err(CommandError::EmptyCommand);
        };

        let Some(command) = self.commands.get(name.to_uppercase().as_str()) else {
            return Err(CommandError::UnknownCommand(name));
        };

        debug!(
            command = command.name(),
            client = ctx.reply.client_address(),
            "dispatching command"
        );

        command.execute(ctx, arguments.collect())
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.commands.keys().copied().collect();
        names.sort_unstable();

        f.debug_struct("CommandRegistry")
            .field("commands", &names)
            .finish()
    }
}
