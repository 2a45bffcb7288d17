use crate::{
    commands::{command_context::CommandContext, command_error::CommandError, Command},
    resp::RespValue,
};

/// Only the replication section exists, so asking for nothing and asking for
/// `replication` give the same answer.
pub struct InfoArguments;

impl InfoArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        match arguments.as_slice() {
            [] => Ok(Self),
            [section] if section.eq_ignore_ascii_case("replication") => Ok(Self),
            [_] => Err(CommandError::InvalidInfoSection),
            _ => Err(CommandError::wrong_arity("info")),
        }
    }
}

pub struct Info;

impl Command for Info {
    fn name(&self) -> &'static str {
        "INFO"
    }

    fn execute(
        &self,
        ctx: &CommandContext<'_>,
        arguments: Vec<String>,
    ) -> Result<RespValue, CommandError> {
        InfoArguments::parse(arguments)?;

        Ok(RespValue::Map(ctx.replication.info()))
    }
}
