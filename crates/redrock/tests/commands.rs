//! Command-level scenarios: parsed commands through the dispatcher to replies

use bytes::Bytes;
use redrock::Dispatcher;
use resp::{encode_to_vec, Command, RespValue};
use std::path::PathBuf;
use std::sync::Arc;
use storage::RocksStore;

struct TestServer {
    dispatcher: Dispatcher,
    path: PathBuf,
}

impl TestServer {
    fn open() -> Self {
        let path = std::env::temp_dir().join(format!("redrock_cmd_{}", rand::random::<u64>()));
        let store = Arc::new(RocksStore::open(&path).unwrap());
        Self {
            dispatcher: Dispatcher::new(store),
            path,
        }
    }

    /// Run one command given as argv strings
    fn run(&self, parts: &[&str]) -> RespValue {
        let value = RespValue::Array(
            parts
                .iter()
                .map(|p| RespValue::BulkString(Some(Bytes::from(p.to_string()))))
                .collect(),
        );
        let command = Command::try_from(&value).unwrap();
        self.dispatcher.dispatch(command)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

fn bulk(s: &str) -> RespValue {
    RespValue::BulkString(Some(Bytes::from(s.to_string())))
}

fn bulks(parts: &[&str]) -> RespValue {
    RespValue::Array(parts.iter().map(|p| bulk(p)).collect())
}

#[test]
fn hash_scenario() {
    let srv = TestServer::open();

    assert_eq!(srv.run(&["HSET", "user", "name", "alice"]), RespValue::Integer(1));
    assert_eq!(srv.run(&["HSET", "user", "age", "30"]), RespValue::Integer(1));
    assert_eq!(srv.run(&["HGET", "user", "name"]), bulk("alice"));
    assert_eq!(srv.run(&["HLEN", "user"]), RespValue::Integer(2));
    assert_eq!(srv.run(&["HDEL", "user", "age", "name"]), RespValue::Integer(2));
    assert_eq!(srv.run(&["HLEN", "user"]), RespValue::Integer(0));
}

#[test]
fn zset_scenario() {
    let srv = TestServer::open();

    assert_eq!(
        srv.run(&["ZADD", "s", "-2", "a", "0", "b", "3", "c"]),
        RespValue::Integer(3)
    );
    assert_eq!(
        srv.run(&["ZRANGEBYSCORE", "s", "-5", "5"]),
        bulks(&["a", "b", "c"])
    );
    assert_eq!(
        srv.run(&["ZRANGEBYSCORE", "s", "-5", "5", "WITHSCORES"]),
        bulks(&["-2", "a", "0", "b", "3", "c"])
    );
    assert_eq!(srv.run(&["ZRANK", "s", "a"]), RespValue::Integer(0));
    assert_eq!(srv.run(&["ZREVRANK", "s", "a"]), RespValue::Integer(2));
    assert_eq!(srv.run(&["ZRANK", "s", "missing"]), RespValue::Null);
}

#[test]
fn zset_incr_and_range() {
    let srv = TestServer::open();

    srv.run(&["ZADD", "g", "1", "a", "2", "b"]);
    assert_eq!(srv.run(&["ZINCRBY", "g", "5", "a"]), bulk("6"));
    assert_eq!(srv.run(&["ZRANGE", "g", "0", "-1"]), bulks(&["b", "a"]));
    assert_eq!(
        srv.run(&["ZRANGE", "g", "0", "-1", "WITHSCORES"]),
        bulks(&["2", "b", "6", "a"])
    );
    assert_eq!(srv.run(&["ZREVRANGE", "g", "0", "-1"]), bulks(&["a", "b"]));
}

#[test]
fn zset_remove_and_teardown() {
    let srv = TestServer::open();

    srv.run(&["ZADD", "k", "1", "a", "2", "b", "3", "c"]);
    assert_eq!(srv.run(&["ZREMRANGEBYSCORE", "k", "2", "3"]), RespValue::Integer(2));
    assert_eq!(srv.run(&["ZRANGE", "k", "0", "-1"]), bulks(&["a"]));
    assert_eq!(srv.run(&["ZREM", "k", "a"]), RespValue::Integer(1));
    assert_eq!(srv.run(&["EXISTS", "k"]), RespValue::Integer(0));
    assert_eq!(srv.run(&["TYPE", "k"]), RespValue::SimpleString(Bytes::from("none")));
}

#[test]
fn string_commands() {
    let srv = TestServer::open();

    assert_eq!(srv.run(&["SET", "k", "v"]), RespValue::ok());
    assert_eq!(srv.run(&["GET", "k"]), bulk("v"));
    assert_eq!(srv.run(&["STRLEN", "k"]), RespValue::Integer(1));
    assert_eq!(srv.run(&["APPEND", "k", "xy"]), RespValue::Integer(3));
    assert_eq!(srv.run(&["GETSET", "k", "z"]), bulk("vxy"));
    assert_eq!(srv.run(&["SETNX", "k", "w"]), RespValue::Integer(0));
    assert_eq!(srv.run(&["GET", "missing"]), RespValue::Null);

    assert_eq!(srv.run(&["INCR", "n"]), RespValue::Integer(1));
    assert_eq!(srv.run(&["INCRBY", "n", "9"]), RespValue::Integer(10));
    assert_eq!(srv.run(&["DECRBY", "n", "4"]), RespValue::Integer(6));

    assert_eq!(srv.run(&["MSET", "a", "1", "b", "2"]), RespValue::ok());
    assert_eq!(
        srv.run(&["MGET", "a", "b", "nope"]),
        RespValue::Array(vec![bulk("1"), bulk("2"), RespValue::Null])
    );
}

#[test]
fn list_commands() {
    let srv = TestServer::open();

    assert_eq!(srv.run(&["RPUSH", "l", "b", "c"]), RespValue::Integer(2));
    assert_eq!(srv.run(&["LPUSH", "l", "a"]), RespValue::Integer(3));
    assert_eq!(srv.run(&["LLEN", "l"]), RespValue::Integer(3));
    assert_eq!(srv.run(&["LRANGE", "l", "0", "-1"]), bulks(&["a", "b", "c"]));
    assert_eq!(srv.run(&["LINDEX", "l", "-1"]), bulk("c"));
    assert_eq!(srv.run(&["LPOP", "l"]), bulk("a"));
    assert_eq!(srv.run(&["RPOP", "l"]), bulk("c"));
    assert_eq!(srv.run(&["LLEN", "l"]), RespValue::Integer(1));
}

#[test]
fn set_commands() {
    let srv = TestServer::open();

    assert_eq!(srv.run(&["SADD", "s", "a", "b", "a"]), RespValue::Integer(2));
    assert_eq!(srv.run(&["SCARD", "s"]), RespValue::Integer(2));
    assert_eq!(srv.run(&["SISMEMBER", "s", "a"]), RespValue::Integer(1));
    assert_eq!(srv.run(&["SISMEMBER", "s", "z"]), RespValue::Integer(0));
    assert_eq!(srv.run(&["SMEMBERS", "s"]), bulks(&["a", "b"]));
    assert_eq!(srv.run(&["SREM", "s", "a", "b"]), RespValue::Integer(2));
    assert_eq!(srv.run(&["EXISTS", "s"]), RespValue::Integer(0));
}

#[test]
fn wrong_type_rejected() {
    let srv = TestServer::open();

    srv.run(&["ZADD", "z", "1", "m"]);
    let reply = srv.run(&["HGET", "z", "field"]);
    match reply {
        RespValue::Error(message) => {
            assert!(String::from_utf8_lossy(&message).starts_with("WRONGTYPE"))
        }
        other => panic!("expected WRONGTYPE error, got {:?}", other),
    }

    // and the opposite direction
    srv.run(&["SET", "str", "v"]);
    assert!(matches!(srv.run(&["SADD", "str", "m"]), RespValue::Error(_)));
}

#[test]
fn del_and_type_across_kinds() {
    let srv = TestServer::open();

    srv.run(&["SET", "a", "1"]);
    srv.run(&["HSET", "b", "f", "v"]);
    srv.run(&["ZADD", "c", "1", "m"]);

    assert_eq!(srv.run(&["TYPE", "a"]), RespValue::SimpleString(Bytes::from("string")));
    assert_eq!(srv.run(&["TYPE", "b"]), RespValue::SimpleString(Bytes::from("hash")));
    assert_eq!(srv.run(&["TYPE", "c"]), RespValue::SimpleString(Bytes::from("zset")));

    assert_eq!(srv.run(&["EXISTS", "a", "b", "c", "d"]), RespValue::Integer(3));
    assert_eq!(srv.run(&["DEL", "a", "b", "c", "d"]), RespValue::Integer(3));
    assert_eq!(srv.run(&["EXISTS", "a", "b", "c"]), RespValue::Integer(0));

    // a key deleted as one kind can be reborn as another
    srv.run(&["SADD", "a", "m"]);
    assert_eq!(srv.run(&["TYPE", "a"]), RespValue::SimpleString(Bytes::from("set")));
}

#[test]
fn ping_and_echo() {
    let srv = TestServer::open();
    assert_eq!(
        srv.run(&["PING"]),
        RespValue::SimpleString(Bytes::from("PONG"))
    );
    assert_eq!(srv.run(&["PING", "hello"]), bulk("hello"));
    assert_eq!(srv.run(&["ECHO", "hi"]), bulk("hi"));
}

#[test]
fn replies_encode_as_valid_resp() {
    let srv = TestServer::open();

    srv.run(&["ZADD", "z", "1", "a"]);
    let reply = srv.run(&["ZRANGE", "z", "0", "-1", "WITHSCORES"]);
    assert_eq!(
        String::from_utf8_lossy(&encode_to_vec(&reply)),
        "*2\r\n$1\r\n1\r\n$1\r\na\r\n"
    );

    let reply = srv.run(&["GET", "missing"]);
    assert_eq!(String::from_utf8_lossy(&encode_to_vec(&reply)), "$-1\r\n");
}

#[test]
fn storage_errors_do_not_poison_state() {
    let srv = TestServer::open();

    srv.run(&["SET", "n", "abc"]);
    // INCR on a non-numeric value reports an error and leaves the value alone
    assert!(matches!(srv.run(&["INCR", "n"]), RespValue::Error(_)));
    assert_eq!(srv.run(&["GET", "n"]), bulk("abc"));
}
