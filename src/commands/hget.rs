use crate::{
    commands::{command_context::CommandContext, command_error::CommandError, Command},
    resp::RespValue,
};

pub struct HGetArguments {
    key: String,
    field: String,
}

impl HGetArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let [key, field] =
            <[String; 2]>::try_from(arguments).map_err(|_| CommandError::wrong_arity("hget"))?;

        Ok(Self { key, field })
    }
}

pub struct HGet;

impl Command for HGet {
    fn name(&self) -> &'static str {
        "HGET"
    }

    fn execute(
        &self,
        ctx: &CommandContext<'_>,
        arguments: Vec<String>,
    ) -> Result<RespValue, CommandError> {
        let HGetArguments { key, field } = HGetArguments::parse(arguments)?;

        Ok(ctx
            .store
            .hget(&key, &field)
            .map_or(RespValue::Null, RespValue::BulkString))
    }
}
