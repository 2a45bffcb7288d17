use std::collections::BTreeMap;

use resp_kv::{commands::CommandError, resp::RespValue};

use crate::test_utils::{TestEnv, TestUtils, MASTER_REPL_ID};

fn expected_map(pairs: &[(&str, &str)]) -> RespValue {
    RespValue::Map(
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<BTreeMap<_, _>>(),
    )
}

#[test]
fn test_handle_info_command_on_master() {
    let env = TestEnv::new_master_server();
    let expected = expected_map(&[
        ("role", "master"),
        ("connected_slaves", "0"),
        ("master_replid", MASTER_REPL_ID),
        ("master_repl_offset", "0"),
    ]);

    for command in [
        TestUtils::info_command("replication"),
        TestUtils::info_command("REPLICATION"),
        TestUtils::invalid_command(&["INFO"]),
    ] {
        env.exec_command_ok(command, &expected);
    }
}

#[test]
fn test_handle_info_command_on_replica() {
    let env = TestEnv::new_replica_server(6379);

    let RespValue::Map(info) = env.exec_command(TestUtils::info_command("replication")) else {
        panic!("Expected a key-value map");
    };

    assert_eq!(info.get("role").map(String::as_str), Some("slave"));
    assert_eq!(info.get("master_host").map(String::as_str), Some("127.0.0.1"));
    assert_eq!(info.get("master_port").map(String::as_str), Some("6379"));
}

#[test]
fn test_info_reply_encoding() {
    let env = TestEnv::new_master_server();

    let encoded = env.exec_command(TestUtils::info_command("replication")).encode();
    let expected = format!(
        "+connected_slaves:0\nmaster_repl_offset:0\nmaster_replid:{}\nrole:master\n\r\n",
        MASTER_REPL_ID
    );

    assert_eq!(encoded, expected.as_bytes());
}

#[test]
fn test_handle_info_command_invalid() {
    let env = TestEnv::new_master_server();

    let test_cases = vec![
        (
            TestUtils::info_command("keyspace"),
            CommandError::InvalidInfoSection,
        ),
        (
            TestUtils::invalid_command(&["INFO", "replication", "server"]),
            CommandError::WrongNumberOfArguments("info".into()),
        ),
    ];

    for (command, expected_error) in test_cases {
        env.exec_command_error(command, expected_error);
    }
}
