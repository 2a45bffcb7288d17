use crate::{
    commands::{command_context::CommandContext, command_error::CommandError, Command},
    resp::RespValue,
};

pub struct DelArguments {
    keys: Vec<String>,
}

impl DelArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.is_empty() {
            return Err(CommandError::wrong_arity("del"));
        }

        Ok(Self { keys: arguments })
    }
}

/// `DEL key [key ...]`: replies with how many of the keys held a live value.
pub struct Del;

impl Command for Del {
    fn name(&self) -> &'static str {
        "DEL"
    }

    fn execute(
        &self,
        ctx: &CommandContext<'_>,
        arguments: Vec<String>,
    ) -> Result<RespValue, CommandError> {
        let DelArguments { keys } = DelArguments::parse(arguments)?;

        let (removed, ()) = ctx.store.delete_and_then(&keys, |removed| {
            if removed > 0 {
                ctx.replication.propagate(self.name(), &keys);
            }
        });

        Ok(RespValue::Integer(removed as i64))
    }
}
