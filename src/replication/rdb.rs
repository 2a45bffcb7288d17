use bytes::Bytes;

/// A valid RDB image (version 11) holding no keys.
const EMPTY_RDB_HEX: &str = "524544495330303131fa0972656469732d76657205372e322e30fa0a72656469732d62697473c040fa056374696d65c26d08bc65fa08757365642d6d656dc2b0c41000fa08616f662d62617365c000fff06e3bfec0ff5aa2";

/// The snapshot sent to a replica on full resync.
pub fn empty_rdb() -> Result<Bytes, hex::FromHexError> {
    hex::decode(EMPTY_RDB_HEX).map(Bytes::from)
}
