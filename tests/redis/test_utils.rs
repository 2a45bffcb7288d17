use std::{net::SocketAddr, sync::Arc, time::Duration};

use resp_kv::{
    commands::{CommandError, ReplyTarget},
    input::FrameReader,
    replication::ReplicationManager,
    resp::RespValue,
    server::{MasterAddress, RedisRole, RedisServer},
    state::ServerState,
};
use tokio::{
    io::AsyncWriteExt,
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpListener, TcpStream,
    },
    time::timeout,
};

pub const MASTER_REPL_ID: &str = "8371b4fb1155b71f4a04d3e1bc3e18c4a990aeeb";
pub const REPLICA_REPL_ID: &str = "c673350b6868f3661bd1231ad1b5389310d0a201";

/// Test utilities for simplifying Redis command tests
pub struct TestUtils;

/// Test environment holding the shared server state and the connection
/// commands are issued from
pub struct TestEnv {
    pub state: Arc<ServerState>,
    pub reply: ReplyTarget,
}

impl TestEnv {
    /// Create a new test environment with a master server
    pub fn new_master_server() -> Self {
        Self::with_role(RedisRole::Master, MASTER_REPL_ID)
    }

    /// Create a new test environment with a replica of a master on `master_port`
    pub fn new_replica_server(master_port: u16) -> Self {
        let master = MasterAddress {
            host: "127.0.0.1".to_string(),
            port: master_port,
        };

        Self::with_role(RedisRole::Replica(master), REPLICA_REPL_ID)
    }

    fn with_role(role: RedisRole, repl_id: &str) -> Self {
        let replication = ReplicationManager::with_repl_id(role, repl_id.to_string());

        Self {
            state: Arc::new(ServerState::with_replication(replication)),
            reply: ReplyTarget::new(TestUtils::client_address(41844)),
        }
    }

    /// Execute a command and return the reply
    pub fn exec_command(&self, command: RespValue) -> RespValue {
        self.state
            .dispatch(&self.reply, TestUtils::command_arguments(command))
    }

    /// Execute a command from another connection and return the reply
    pub fn exec_command_from(&self, reply: &ReplyTarget, command: RespValue) -> RespValue {
        self.state
            .dispatch(reply, TestUtils::command_arguments(command))
    }

    /// Execute a command and assert it succeeds with the expected reply
    pub fn exec_command_ok(&self, command: RespValue, expected_response: &RespValue) {
        let response = self.exec_command(command);
        assert_eq!(&response, expected_response);
    }

    /// Execute a command and assert it fails with the expected error
    pub fn exec_command_error(&self, command: RespValue, expected_error: CommandError) {
        let response = self.exec_command(command);
        assert_eq!(response, expected_error.as_resp());
    }
}

impl TestUtils {
    pub fn client_address(port: u16) -> String {
        format!("127.0.0.1:{}", port)
    }

    /// Extract the arguments of a command frame built by the helpers below
    pub fn command_arguments(command: RespValue) -> Vec<String> {
        let RespValue::Array(elements) = command else {
            panic!("Expected a command array, got {:?}", command);
        };

        elements
            .into_iter()
            .map(|element| match element {
                RespValue::BulkString(s) => s,
                other => panic!("Expected bulk string, got {:?}", other),
            })
            .collect()
    }

    /// Create a command from arbitrary parts, typically to test invalid input
    pub fn invalid_command(parts: &[&str]) -> RespValue {
        RespValue::command(parts.iter().copied())
    }

    /// Create a PING command
    pub fn ping_command() -> RespValue {
        RespValue::command(["PING"])
    }

    /// Create an ECHO command
    pub fn echo_command(message: &str) -> RespValue {
        RespValue::command(["ECHO", message])
    }

    /// Create a GET command
    pub fn get_command(key: &str) -> RespValue {
        RespValue::command(["GET", key])
    }

    /// Create a SET command
    pub fn set_command(key: &str, value: &str) -> RespValue {
        RespValue::command(["SET", key, value])
    }

    /// Create a SET command with expiration
    pub fn set_command_with_expiration(key: &str, value: &str, expiration_ms: u64) -> RespValue {
        let expiration_ms = expiration_ms.to_string();
        RespValue::command(["SET", key, value, "px", expiration_ms.as_str()])
    }

    /// Create a DEL command
    pub fn del_command(keys: &[&str]) -> RespValue {
        RespValue::command(std::iter::once("DEL").chain(keys.iter().copied()))
    }

    /// Create an HSET command
    pub fn hset_command(key: &str, field: &str, value: &str) -> RespValue {
        RespValue::command(["HSET", key, field, value])
    }

    /// Create an HGET command
    pub fn hget_command(key: &str, field: &str) -> RespValue {
        RespValue::command(["HGET", key, field])
    }

    /// Create an HGETALL command
    pub fn hgetall_command(key: &str) -> RespValue {
        RespValue::command(["HGETALL", key])
    }

    /// Create an INFO command for a section
    pub fn info_command(section: &str) -> RespValue {
        RespValue::command(["INFO", section])
    }

    /// Create a REPLCONF command
    pub fn replconf_command(option: &str, value: &str) -> RespValue {
        RespValue::command(["REPLCONF", option, value])
    }

    /// Create a PSYNC command
    pub fn psync_command(repl_id: &str, offset: &str) -> RespValue {
        RespValue::command(["PSYNC", repl_id, offset])
    }

    pub fn expected_simple_string(s: &str) -> RespValue {
        RespValue::SimpleString(s.to_string())
    }

    pub fn expected_bulk_string(s: &str) -> RespValue {
        RespValue::BulkString(s.to_string())
    }

    pub fn expected_integer(n: i64) -> RespValue {
        RespValue::Integer(n)
    }

    pub fn expected_null() -> RespValue {
        RespValue::Null
    }

    pub fn expected_bulk_string_array(items: &[&str]) -> RespValue {
        RespValue::Array(
            items
                .iter()
                .map(|item| RespValue::BulkString(item.to_string()))
                .collect(),
        )
    }

    /// Start a server from command line style arguments on an ephemeral port
    pub async fn spawn_server(args: &[&str]) -> (SocketAddr, Arc<ServerState>) {
        let server = RedisServer::new(args.iter().copied()).unwrap();
        let state = Arc::clone(&server.state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        tokio::spawn(server.serve(listener));

        (address, state)
    }

    pub async fn connect(address: SocketAddr) -> (FrameReader<OwnedReadHalf>, OwnedWriteHalf) {
        let stream = TcpStream::connect(address).await.unwrap();
        let (reader, writer) = stream.into_split();

        (FrameReader::new(reader), writer)
    }

    /// Send a command and wait for its reply
    pub async fn send_command(
        reader: &mut FrameReader<OwnedReadHalf>,
        writer: &mut OwnedWriteHalf,
        command: RespValue,
    ) -> RespValue {
        writer.write_all(&command.encode()).await.unwrap();

        timeout(Duration::from_secs(2), reader.read_reply())
            .await
            .expect("Timed out waiting for reply")
            .unwrap()
    }

    /// Poll `condition` until it holds, failing the test after two seconds
    pub async fn wait_until<F: Fn() -> bool>(condition: F) {
        timeout(Duration::from_secs(2), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("Timed out waiting for condition");
    }
}
