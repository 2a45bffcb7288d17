use crate::{
    commands::{command_context::CommandContext, command_error::CommandError, Command},
    resp::RespValue,
};

pub struct EchoArguments {
    message: String,
}

impl EchoArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let [message] = <[String; 1]>::try_from(arguments)
            .map_err(|_| CommandError::wrong_arity("echo"))?;

        Ok(Self { message })
    }
}

/// `ECHO message`: replies with the message as a bulk string.
pub struct Echo;

impl Command for Echo {
    fn name(&self) -> &'static str {
        "ECHO"
    }

    fn execute(
        &self,
        _ctx: &CommandContext<'_>,
        arguments: Vec<String>,
    ) -> Result<RespValue, CommandError> {
        let echo_arguments = EchoArguments::parse(arguments)?;

        Ok(RespValue::BulkString(echo_arguments.message))
    }
}
