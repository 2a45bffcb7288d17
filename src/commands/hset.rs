use crate::{
    commands::{command_context::CommandContext, command_error::CommandError, Command},
    resp::RespValue,
};

pub struct HSetArguments {
    key: String,
    field: String,
    value: String,
}

impl HSetArguments {
    pub fn parse(arguments: &[String]) -> Result<Self, CommandError> {
        let [key, field, value] = arguments else {
            return Err(CommandError::wrong_arity("hset"));
        };

        Ok(Self {
            key: key.clone(),
            field: field.clone(),
            value: value.clone(),
        })
    }
}

/// `HSET key field value`. Propagated like SET, under the hash write lock.
pub struct HSet;

impl Command for HSet {
    fn name(&self) -> &'static str {
        "HSET"
    }

    fn execute(
        &self,
        ctx: &CommandContext<'_>,
        arguments: Vec<String>,
    ) -> Result<RespValue, CommandError> {
        let HSetArguments { key, field, value } = HSetArguments::parse(&arguments)?;

        ctx.store.hset_and_then(key, field, value, || {
            ctx.replication.propagate(self.name(), &arguments)
        });

        Ok(RespValue::ok())
    }
}
