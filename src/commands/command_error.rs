use thiserror::Error;

use crate::resp::RespValue;

/// Errors a command reports back to the client. The connection stays open.
#[derive(Error, Debug, PartialEq)]
pub enum CommandError {
    #[error("empty command")]
    EmptyCommand,
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("wrong number of arguments for '{0}' command")]
    WrongNumberOfArguments(String),
    #[error("syntax error")]
    SyntaxError,
    #[error("value is not an integer or out of range")]
    InvalidInteger,
    #[error("invalid expire time in '{0}' command")]
    InvalidExpireTime(String),
    #[error("invalid INFO section")]
    InvalidInfoSection,
    #[error("PSYNC is only served by a master")]
    PsyncOnReplica,
    #[error("invalid PSYNC offset")]
    InvalidPsyncOffset,
    #[error("snapshot unavailable: {0}")]
    Snapshot(#[from] hex::FromHexError),
}

impl CommandError {
    pub fn wrong_arity(command: &str) -> Self {
        CommandError::WrongNumberOfArguments(command.to_lowercase())
    }

    pub fn as_resp(&self) -> RespValue {
        RespValue::Error(format!("ERR {}", self))
    }
}
