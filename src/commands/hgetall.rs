use crate::{
    commands::{command_context::CommandContext, command_error::CommandError, Command},
    resp::RespValue,
};

pub struct HGetAllArguments {
    key: String,
}

impl HGetAllArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let [key] = <[String; 1]>::try_from(arguments)
            .map_err(|_| CommandError::wrong_arity("hgetall"))?;

        Ok(Self { key })
    }
}

/// `HGETALL key`: field/value pairs flattened into one array, sorted by field,
/// or null when no hash was ever written at `key`.
pub struct HGetAll;

impl Command for HGetAll {
    fn name(&self) -> &'static str {
        "HGETALL"
    }

    fn execute(
        &self,
        ctx: &CommandContext<'_>,
        arguments: Vec<String>,
    ) -> Result<RespValue, CommandError> {
        let HGetAllArguments { key } = HGetAllArguments::parse(arguments)?;

        let Some(fields) = ctx.store.hgetall(&key) else {
            return Ok(RespValue::Null);
        };

        let mut fields: Vec<(String, String)> = fields.into_iter().collect();
        fields.sort_unstable();

        Ok(RespValue::Array(
            fields
                .into_iter()
                .flat_map(|(field, value)| {
                    [RespValue::BulkString(field), RespValue::BulkString(value)]
                })
                .collect(),
        ))
    }
}
