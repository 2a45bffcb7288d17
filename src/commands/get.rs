use crate::{
    commands::{command_context::CommandContext, command_error::CommandError, Command},
    resp::RespValue,
};

pub struct GetArguments {
    key: String,
}

impl GetArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let [key] =
            <[String; 1]>::try_from(arguments).map_err(|_| CommandError::wrong_arity("get"))?;

        Ok(Self { key })
    }
}

/// `GET key`: the live value at `key`, or null once it is absent or expired.
pub struct Get;

impl Command for Get {
    fn name(&self) -> &'static str {
        "GET"
    }

    fn execute(
        &self,
        ctx: &CommandContext<'_>,
        arguments: Vec<String>,
    ) -> Result<RespValue, CommandError> {
        let get_arguments = GetArguments::parse(arguments)?;

        Ok(ctx
            .store
            .get(&get_arguments.key)
            .map_or(RespValue::Null, RespValue::BulkString))
    }
}
