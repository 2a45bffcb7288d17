use resp_kv::server::{CliError, RedisServer};

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let server = match RedisServer::new(std::env::args()) {
        Ok(server) => server,
        Err(CliError::InvalidArguments(e)) => e.exit(),
        Err(e) => return Err(e.into()),
    };

    server.run().await
}
