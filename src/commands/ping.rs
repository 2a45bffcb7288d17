use crate::{
    commands::{command_context::CommandContext, command_error::CommandError, Command},
    resp::RespValue,
};

pub struct PingArguments {
    message: Option<String>,
}

impl PingArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() > 1 {
            return Err(CommandError::wrong_arity("ping"));
        }

        Ok(Self {
            message: arguments.into_iter().next(),
        })
    }
}

/// `PING [message]`: replies `PONG`, or the message itself as a simple string.
pub struct Ping;

impl Command for Ping {
    fn name(&self) -> &'static str {
        "PING"
    }

    fn execute(
        &self,
        _ctx: &CommandContext<'_>,
        arguments: Vec<String>,
    ) -> Result<RespValue, CommandError> {
        let ping_arguments = PingArguments::parse(arguments)?;

        Ok(RespValue::SimpleString(
            ping_arguments.message.unwrap_or_else(|| "PONG".to_string()),
        ))
    }
}
