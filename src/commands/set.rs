use std::time::Duration;

use crate::{
    commands::{command_context::CommandContext, command_error::CommandError, Command},
    resp::RespValue,
};

#[derive(Debug, PartialEq)]
pub struct SetArguments {
    key: String,
    value: String,
    ttl: Option<Duration>,
}

impl SetArguments {
    pub fn parse(arguments: &[String]) -> Result<Self, CommandError> {
        let ttl = match arguments {
            [_, _] => None,
            [_, _, option, milliseconds] => {
                if !option.eq_ignore_ascii_case("px") {
                    return Err(CommandError::SyntaxError);
                }

                let milliseconds = milliseconds
                    .parse::<i64>()
                    .map_err(|_| CommandError::InvalidInteger)?;
                let milliseconds = u64::try_from(milliseconds)
                    .ok()
                    .filter(|ms| *ms > 0)
                    .ok_or_else(|| CommandError::InvalidExpireTime("set".to_string()))?;

                Some(Duration::from_millis(milliseconds))
            }
            _ => return Err(CommandError::wrong_arity("set")),
        };

        Ok(Self {
            key: arguments[0].clone(),
            value: arguments[1].clone(),
            ttl,
        })
    }
}

/// `SET key value [PX milliseconds]`.
///
/// On a master the command is forwarded to replicas, as received, before the
/// scalar write lock is released, so replicas see SETs in commit order.
pub struct Set;

impl Command for Set {
    fn name(&self) -> &'static str {
        "SET"
    }

    fn execute(
        &self,
        ctx: &CommandContext<'_>,
        arguments: Vec<String>,
    ) -> Result<RespValue, CommandError> {
        let SetArguments { key, value, ttl } = SetArguments::parse(&arguments)?;

        ctx.store.set_and_then(key, value, ttl, || {
            ctx.replication.propagate(self.name(), &arguments)
        });

        Ok(RespValue::ok())
    }
}
