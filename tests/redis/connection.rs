use std::{sync::Arc, time::Duration};

use resp_kv::{
    connection::handle_connection, input::FrameReader, replication::empty_rdb, resp::RespValue,
};
use tokio::{
    io::{duplex, AsyncReadExt, AsyncWriteExt, DuplexStream},
    task::JoinHandle,
    time::timeout,
};

use crate::test_utils::{TestEnv, TestUtils, MASTER_REPL_ID};

fn spawn_session(env: &TestEnv, port: u16) -> (DuplexStream, JoinHandle<()>) {
    let (client, server) = duplex(4096);
    let session = tokio::spawn(handle_connection(
        server,
        TestUtils::client_address(port),
        Arc::clone(&env.state),
    ));

    (client, session)
}

async fn read_exactly(stream: &mut DuplexStream, expected: &[u8]) {
    let mut buffer = vec![0u8; expected.len()];
    timeout(Duration::from_secs(2), stream.read_exact(&mut buffer))
        .await
        .expect("Timed out waiting for reply")
        .unwrap();

    assert_eq!(
        String::from_utf8_lossy(&buffer),
        String::from_utf8_lossy(expected)
    );
}

#[tokio::test]
async fn test_session_answers_pipelined_commands_in_order() {
    let env = TestEnv::new_master_server();
    let (mut client, session) = spawn_session(&env, 41844);

    let mut pipeline = Vec::new();
    for command in [
        TestUtils::set_command("grape", "mango"),
        TestUtils::get_command("grape"),
        TestUtils::echo_command("hey"),
        TestUtils::invalid_command(&["NOPE"]),
        TestUtils::ping_command(),
    ] {
        pipeline.extend_from_slice(&command.encode());
    }
    client.write_all(&pipeline).await.unwrap();

    read_exactly(
        &mut client,
        b"+OK\r\n$5\r\nmango\r\n$3\r\nhey\r\n-ERR unknown command 'NOPE'\r\n+PONG\r\n",
    )
    .await;

    drop(client);
    timeout(Duration::from_secs(2), session).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_session_closes_on_protocol_error_without_reply() {
    let env = TestEnv::new_master_server();
    let (mut client, session) = spawn_session(&env, 41844);

    client.write_all(b"+PING\r\n").await.unwrap();
    timeout(Duration::from_secs(2), session).await.unwrap().unwrap();

    let mut rest = Vec::new();
    client.read_to_end(&mut rest).await.unwrap();
    assert!(rest.is_empty());
}

#[tokio::test]
async fn test_session_stays_open_after_command_error() {
    let env = TestEnv::new_master_server();
    let (mut client, _session) = spawn_session(&env, 41844);

    client.write_all(b"*0\r\n").await.unwrap();
    read_exactly(&mut client, b"-ERR empty command\r\n").await;

    client
        .write_all(&TestUtils::invalid_command(&["SET", "grape"]).encode())
        .await
        .unwrap();
    read_exactly(
        &mut client,
        b"-ERR wrong number of arguments for 'set' command\r\n",
    )
    .await;

    client
        .write_all(&TestUtils::ping_command().encode())
        .await
        .unwrap();
    read_exactly(&mut client, b"+PONG\r\n").await;
}

#[tokio::test]
async fn test_replica_session_receives_snapshot_then_propagated_writes() {
    let env = TestEnv::new_master_server();
    let (replica, _replica_session) = spawn_session(&env, 6380);
    let (mut client, _client_session) = spawn_session(&env, 41844);

    let (replica_reader, mut replica_writer) = tokio::io::split(replica);
    let mut replica_reader = FrameReader::new(replica_reader);

    replica_writer
        .write_all(&TestUtils::psync_command("?", "-1").encode())
        .await
        .unwrap();

    assert_eq!(
        replica_reader.read_reply().await.unwrap(),
        TestUtils::expected_simple_string(&format!("FULLRESYNC {} 0", MASTER_REPL_ID))
    );
    assert_eq!(
        replica_reader.read_snapshot().await.unwrap(),
        empty_rdb().unwrap()
    );

    client
        .write_all(&TestUtils::set_command("grape", "mango").encode())
        .await
        .unwrap();
    read_exactly(&mut client, b"+OK\r\n").await;

    client
        .write_all(&TestUtils::set_command_with_expiration("pear", "kiwi", 500).encode())
        .await
        .unwrap();
    read_exactly(&mut client, b"+OK\r\n").await;

    let propagated = timeout(Duration::from_secs(2), async {
        let first = replica_reader.read_command().await.unwrap();
        let second = replica_reader.read_command().await.unwrap();
        (first, second)
    })
    .await
    .expect("Timed out waiting for propagated writes");

    assert_eq!(
        propagated,
        (
            Some(TestUtils::command_arguments(TestUtils::set_command(
                "grape", "mango"
            ))),
            Some(TestUtils::command_arguments(
                TestUtils::set_command_with_expiration("pear", "kiwi", 500)
            )),
        )
    );

    // The replica connection still answers its own commands.
    replica_writer
        .write_all(&RespValue::command(["REPLCONF", "ack", "0"]).encode())
        .await
        .unwrap();
    assert_eq!(replica_reader.read_reply().await.unwrap(), RespValue::ok());
}

#[tokio::test]
async fn test_closed_replica_is_unregistered_on_next_write() {
    let env = TestEnv::new_master_server();
    let (mut replica, replica_session) = spawn_session(&env, 6380);

    replica
        .write_all(&TestUtils::psync_command("?", "-1").encode())
        .await
        .unwrap();
    TestUtils::wait_until(|| env.state.replication.replicas().len() == 1).await;

    drop(replica);
    timeout(Duration::from_secs(2), replica_session)
        .await
        .unwrap()
        .unwrap();

    env.exec_command_ok(
        TestUtils::set_command("grape", "mango"),
        &TestUtils::expected_simple_string("OK"),
    );
    assert!(env.state.replication.replicas().is_empty());
}
