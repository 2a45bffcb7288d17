mod psync;
mod replconf;

pub use psync::Psync;
pub use replconf::Replconf;
