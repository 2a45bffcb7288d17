//! An in-memory key-value server speaking the Redis wire protocol (RESP).
//!
//! Supported commands: PING, ECHO, GET, SET (with `PX`), DEL, HSET, HGET,
//! HGETALL, INFO, REPLCONF and PSYNC. A server runs either as a master, which
//! streams its writes to every registered replica, or as a replica of a
//! configured master.
//!
//! Each connection is served by its own task; the store and the replication
//! state are shared between them through [`state::ServerState`].

pub mod commands;
pub mod connection;
pub mod input;
pub mod key_value_store;
pub mod replication;
pub mod resp;
pub mod server;
pub mod state;
