//! Configuration and the TCP accept loop.

use std::{ffi::OsString, fmt, str::FromStr, sync::Arc};

use clap::Parser;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::{connection::handle_connection, replication::replicate_from_master, state::ServerState};

pub const DEFAULT_PORT: u16 = 6379;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    InvalidArguments(#[from] clap::Error),
    #[error("invalid --replicaof value '{0}', expected \"<host> <port>\"")]
    InvalidReplicaOf(String),
}

#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "resp-kv", version, about = "In-memory key-value server speaking RESP")]
pub struct ServerConfig {
    /// Port to listen on.
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Master to replicate from, given as "<host> <port>".
    #[arg(long, value_name = "HOST PORT")]
    pub replicaof: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterAddress {
    pub host: String,
    pub port: u16,
}

impl FromStr for MasterAddress {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CliError::InvalidReplicaOf(s.to_string());
        let mut parts = s.split_whitespace();

        let (Some(host), Some(port), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(invalid());
        };

        let port = port.parse::<u16>().map_err(|_| invalid())?;

        Ok(MasterAddress {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for MasterAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedisRole {
    Master,
    Replica(MasterAddress),
}

impl RedisRole {
    pub fn as_string(&self) -> &'static str {
        match self {
            RedisRole::Master => "master",
            RedisRole::Replica(_) => "slave",
        }
    }
}

#[derive(Debug)]
pub struct RedisServer {
    pub port: u16,
    pub state: Arc<ServerState>,
}

impl RedisServer {
    /// Builds a server from command line arguments, program name first.
    pub fn new<I, T>(command_line_args: I) -> Result<Self, CliError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let config = ServerConfig::try_parse_from(command_line_args)?;
        Self::from_config(config)
    }

    pub fn from_config(config: ServerConfig) -> Result<Self, CliError> {
        let role = match config.replicaof {
            Some(master) => RedisRole::Replica(master.parse()?),
            None => RedisRole::Master,
        };

        Ok(Self::with_role(config.port, role))
    }

    pub fn with_role(port: u16, role: RedisRole) -> Self {
        Self {
            port,
            state: Arc::new(ServerState::new(role)),
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let listener = TcpListener::bind(("0.0.0.0", self.port)).await?;
        self.serve(listener).await
    }

    /// Accepts connections on `listener` until the process exits. A replica
    /// first starts following its master in the background.
    pub async fn serve(self, listener: TcpListener) -> anyhow::Result<()> {
        let local_address = listener.local_addr()?;
        let role = self.state.replication.role();
        info!(address = %local_address, role = role.as_string(), "listening");

        if let RedisRole::Replica(master) = role {
            let master = master.clone();
            let listening_port = local_address.port();

            tokio::spawn(async move {
                if let Err(e) = replicate_from_master(master.clone(), listening_port).await {
                    warn!(master = %master, "replication from master failed: {}", e);
                }
            });
        }

        loop {
            match listener.accept().await {
                Ok((stream, client_address)) => {
                    info!(client = %client_address, "accepted connection");
                    let state = Arc::clone(&self.state);
                    tokio::spawn(handle_connection(stream, client_address.to_string(), state));
                }
                Err(e) => warn!("failed to accept connection: {}", e),
            }
        }
    }
}
