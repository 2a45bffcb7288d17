mod command_context;
mod command_error;
mod command_registry;
mod del;
mod echo;
mod get;
mod hget;
mod hgetall;
mod hset;
mod info;
mod ping;
mod replication;
mod set;

pub use command_context::{CommandContext, ReplyTarget};
pub use command_error::CommandError;
pub use command_registry::{Command, CommandRegistry};
