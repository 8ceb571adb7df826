//! Command execution result type

use crate::RespValue;
use bytes::Bytes;

/// Command execution result
///
/// Represents the reply shapes the dispatcher produces, convertible to RespValue
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    /// OK response
    Ok,
    /// PONG response
    Pong,
    /// Custom simple string
    SimpleString(Bytes),
    /// Integer response
    Integer(i64),
    /// Single value (may be nil)
    Value(Option<Bytes>),
    /// Array of values
    Array(Vec<Option<Bytes>>),
    /// Error response
    Error(String),
}

impl CommandResult {
    pub fn value(v: Option<Vec<u8>>) -> Self {
        CommandResult::Value(v.map(Bytes::from))
    }

    pub fn array(values: Vec<Option<Vec<u8>>>) -> Self {
        CommandResult::Array(values.into_iter().map(|v| v.map(Bytes::from)).collect())
    }
}

impl From<CommandResult> for RespValue {
    fn from(result: CommandResult) -> Self {
        match result {
            CommandResult::Ok => RespValue::ok(),
            CommandResult::Pong => RespValue::SimpleString(Bytes::from_static(b"PONG")),
            CommandResult::SimpleString(s) => RespValue::SimpleString(s),
            CommandResult::Integer(n) => RespValue::Integer(n),
            CommandResult::Value(v) => match v {
                Some(bytes) => RespValue::BulkString(Some(bytes)),
                None => RespValue::Null,
            },
            CommandResult::Array(values) => RespValue::Array(
                values
                    .into_iter()
                    .map(|v| match v {
                        Some(bytes) => RespValue::BulkString(Some(bytes)),
                        None => RespValue::Null,
                    })
                    .collect(),
            ),
            CommandResult::Error(message) => RespValue::error(message),
        }
    }
}
