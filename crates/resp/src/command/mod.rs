//! Redis command parsing module
//!
//! Parses RespValue into type-safe Command structures

mod error;
mod result;

pub use error::{CommandError, CommandErrorKind};
pub use result::CommandResult;

use crate::RespValue;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Command type marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandType {
    /// Read command - never mutates storage
    Read,
    /// Write command - mutates storage
    Write,
}

/// Redis command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    // ==================== Connection Commands ====================
    /// PING [message]
    Ping { message: Option<Bytes> },
    /// ECHO message
    Echo { message: Bytes },

    // ==================== Key Commands ====================
    /// DEL key [key ...]
    Del { keys: Vec<Bytes> },
    /// EXISTS key [key ...]
    Exists { keys: Vec<Bytes> },
    /// TYPE key
    Type { key: Bytes },

    // ==================== String Commands ====================
    /// GET key
    Get { key: Bytes },
    /// SET key value
    Set { key: Bytes, value: Bytes },
    /// GETSET key value
    GetSet { key: Bytes, value: Bytes },
    /// SETNX key value
    SetNx { key: Bytes, value: Bytes },
    /// MGET key [key ...]
    MGet { keys: Vec<Bytes> },
    /// MSET key value [key value ...]
    MSet { kvs: Vec<(Bytes, Bytes)> },
    /// STRLEN key
    StrLen { key: Bytes },
    /// APPEND key value
    Append { key: Bytes, value: Bytes },
    /// INCR / INCRBY / DECR / DECRBY collapse to a delta
    IncrBy { key: Bytes, delta: i64 },

    // ==================== Hash Commands ====================
    /// HGET key field
    HGet { key: Bytes, field: Bytes },
    /// HSET key field value [field value ...]
    HSet { key: Bytes, fvs: Vec<(Bytes, Bytes)> },
    /// HMSET key field value [field value ...]
    HMSet { key: Bytes, fvs: Vec<(Bytes, Bytes)> },
    /// HMGET key field [field ...]
    HMGet { key: Bytes, fields: Vec<Bytes> },
    /// HGETALL key
    HGetAll { key: Bytes },
    /// HKEYS key
    HKeys { key: Bytes },
    /// HVALS key
    HVals { key: Bytes },
    /// HLEN key
    HLen { key: Bytes },
    /// HEXISTS key field
    HExists { key: Bytes, field: Bytes },
    /// HDEL key field [field ...]
    HDel { key: Bytes, fields: Vec<Bytes> },
    /// HINCRBY key field increment
    HIncrBy { key: Bytes, field: Bytes, delta: i64 },

    // ==================== List Commands ====================
    /// LPUSH key value [value ...]
    LPush { key: Bytes, values: Vec<Bytes> },
    /// RPUSH key value [value ...]
    RPush { key: Bytes, values: Vec<Bytes> },
    /// LPOP key
    LPop { key: Bytes },
    /// RPOP key
    RPop { key: Bytes },
    /// LLEN key
    LLen { key: Bytes },
    /// LINDEX key index
    LIndex { key: Bytes, index: i64 },
    /// LRANGE key start stop
    LRange { key: Bytes, start: i64, stop: i64 },

    // ==================== Set Commands ====================
    /// SADD key member [member ...]
    SAdd { key: Bytes, members: Vec<Bytes> },
    /// SREM key member [member ...]
    SRem { key: Bytes, members: Vec<Bytes> },
    /// SMEMBERS key
    SMembers { key: Bytes },
    /// SISMEMBER key member
    SIsMember { key: Bytes, member: Bytes },
    /// SCARD key
    SCard { key: Bytes },

    // ==================== ZSet Commands ====================
    /// ZADD key score member [score member ...]
    ZAdd { key: Bytes, members: Vec<(i64, Bytes)> },
    /// ZSCORE key member
    ZScore { key: Bytes, member: Bytes },
    /// ZINCRBY key increment member
    ZIncrBy {
        key: Bytes,
        increment: i64,
        member: Bytes,
    },
    /// ZRANK / ZREVRANK key member
    ZRank {
        key: Bytes,
        member: Bytes,
        reverse: bool,
    },
    /// ZRANGE / ZREVRANGE key start stop [WITHSCORES]
    ZRange {
        key: Bytes,
        start: i64,
        stop: i64,
        with_scores: bool,
        reverse: bool,
    },
    /// ZRANGEBYSCORE / ZREVRANGEBYSCORE key min max [WITHSCORES] [LIMIT offset count]
    ZRangeByScore {
        key: Bytes,
        min: i64,
        max: i64,
        with_scores: bool,
        offset: i64,
        count: i64,
        reverse: bool,
    },
    /// ZCARD key
    ZCard { key: Bytes },
    /// ZREM key member [member ...]
    ZRem { key: Bytes, members: Vec<Bytes> },
    /// ZREMRANGEBYSCORE key min max
    ZRemRangeByScore { key: Bytes, min: i64, max: i64 },
    /// ZREMRANGEBYRANK key start stop
    ZRemRangeByRank { key: Bytes, start: i64, stop: i64 },
}

impl Command {
    /// Get command type (read/write)
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Ping { .. }
            | Command::Echo { .. }
            | Command::Exists { .. }
            | Command::Type { .. }
            | Command::Get { .. }
            | Command::MGet { .. }
            | Command::StrLen { .. }
            | Command::HGet { .. }
            | Command::HMGet { .. }
            | Command::HGetAll { .. }
            | Command::HKeys { .. }
            | Command::HVals { .. }
            | Command::HLen { .. }
            | Command::HExists { .. }
            | Command::LLen { .. }
            | Command::LIndex { .. }
            | Command::LRange { .. }
            | Command::SMembers { .. }
            | Command::SIsMember { .. }
            | Command::SCard { .. }
            | Command::ZScore { .. }
            | Command::ZRank { .. }
            | Command::ZRange { .. }
            | Command::ZRangeByScore { .. }
            | Command::ZCard { .. } => CommandType::Read,

            Command::Del { .. }
            | Command::Set { .. }
            | Command::GetSet { .. }
            | Command::SetNx { .. }
            | Command::MSet { .. }
            | Command::Append { .. }
            | Command::IncrBy { .. }
            | Command::HSet { .. }
            | Command::HMSet { .. }
            | Command::HDel { .. }
            | Command::HIncrBy { .. }
            | Command::LPush { .. }
            | Command::RPush { .. }
            | Command::LPop { .. }
            | Command::RPop { .. }
            | Command::SAdd { .. }
            | Command::SRem { .. }
            | Command::ZAdd { .. }
            | Command::ZIncrBy { .. }
            | Command::ZRem { .. }
            | Command::ZRemRangeByScore { .. }
            | Command::ZRemRangeByRank { .. } => CommandType::Write,
        }
    }

    /// Whether this command mutates storage
    pub fn is_write(&self) -> bool {
        self.command_type() == CommandType::Write
    }

    /// Get command name
    pub fn name(&self) -> &'static str {
        match self {
            Command::Ping { .. } => "PING",
            Command::Echo { .. } => "ECHO",
            Command::Del { .. } => "DEL",
            Command::Exists { .. } => "EXISTS",
            Command::Type { .. } => "TYPE",
            Command::Get { .. } => "GET",
            Command::Set { .. } => "SET",
            Command::GetSet { .. } => "GETSET",
            Command::SetNx { .. } => "SETNX",
            Command::MGet { .. } => "MGET",
            Command::MSet { .. } => "MSET",
            Command::StrLen { .. } => "STRLEN",
            Command::Append { .. } => "APPEND",
            Command::IncrBy { .. } => "INCRBY",
            Command::HGet { .. } => "HGET",
            Command::HSet { .. } => "HSET",
            Command::HMSet { .. } => "HMSET",
            Command::HMGet { .. } => "HMGET",
            Command::HGetAll { .. } => "HGETALL",
            Command::HKeys { .. } => "HKEYS",
            Command::HVals { .. } => "HVALS",
            Command::HLen { .. } => "HLEN",
            Command::HExists { .. } => "HEXISTS",
            Command::HDel { .. } => "HDEL",
            Command::HIncrBy { .. } => "HINCRBY",
            Command::LPush { .. } => "LPUSH",
            Command::RPush { .. } => "RPUSH",
            Command::LPop { .. } => "LPOP",
            Command::RPop { .. } => "RPOP",
            Command::LLen { .. } => "LLEN",
            Command::LIndex { .. } => "LINDEX",
            Command::LRange { .. } => "LRANGE",
            Command::SAdd { .. } => "SADD",
            Command::SRem { .. } => "SREM",
            Command::SMembers { .. } => "SMEMBERS",
            Command::SIsMember { .. } => "SISMEMBER",
            Command::SCard { .. } => "SCARD",
            Command::ZAdd { .. } => "ZADD",
            Command::ZScore { .. } => "ZSCORE",
            Command::ZIncrBy { .. } => "ZINCRBY",
            Command::ZRank { reverse: false, .. } => "ZRANK",
            Command::ZRank { reverse: true, .. } => "ZREVRANK",
            Command::ZRange { reverse: false, .. } => "ZRANGE",
            Command::ZRange { reverse: true, .. } => "ZREVRANGE",
            Command::ZRangeByScore { reverse: false, .. } => "ZRANGEBYSCORE",
            Command::ZRangeByScore { reverse: true, .. } => "ZREVRANGEBYSCORE",
            Command::ZCard { .. } => "ZCARD",
            Command::ZRem { .. } => "ZREM",
            Command::ZRemRangeByScore { .. } => "ZREMRANGEBYSCORE",
            Command::ZRemRangeByRank { .. } => "ZREMRANGEBYRANK",
        }
    }
}

impl TryFrom<RespValue> for Command {
    type Error = CommandError;

    fn try_from(value: RespValue) -> Result<Self, Self::Error> {
        Self::try_from(&value)
    }
}

impl TryFrom<&RespValue> for Command {
    type Error = CommandError;

    fn try_from(value: &RespValue) -> Result<Self, Self::Error> {
        let args = extract_args(value)?;
        if args.is_empty() {
            return Err(CommandError::new(
                CommandErrorKind::EmptyCommand,
                "empty command",
            ));
        }

        let cmd_name = String::from_utf8_lossy(&args[0]).to_uppercase();
        parse_command(&cmd_name, &args[1..])
    }
}

/// Extract argument list from RespValue
fn extract_args(value: &RespValue) -> Result<Vec<Bytes>, CommandError> {
    match value {
        RespValue::Array(items) => {
            let mut args = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    RespValue::BulkString(Some(bytes)) => args.push(bytes.clone()),
                    RespValue::SimpleString(s) => args.push(s.clone()),
                    RespValue::Integer(n) => args.push(Bytes::from(n.to_string())),
                    _ => {
                        return Err(CommandError::new(
                            CommandErrorKind::InvalidArgument,
                            "invalid argument type",
                        ))
                    }
                }
            }
            Ok(args)
        }
        _ => Err(CommandError::new(
            CommandErrorKind::InvalidFormat,
            "command must be an array",
        )),
    }
}

/// Parse integer argument
fn parse_int(arg: &[u8], name: &str) -> Result<i64, CommandError> {
    std::str::from_utf8(arg)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| {
            CommandError::new(
                CommandErrorKind::InvalidArgument,
                format!("{} is not an integer or out of range", name),
            )
        })
}

/// Parse a score bound, accepting the -inf / +inf sentinels
fn parse_score_bound(arg: &[u8]) -> Result<i64, CommandError> {
    match arg {
        b"-inf" => Ok(i64::MIN),
        b"+inf" | b"inf" => Ok(i64::MAX),
        other => parse_int(other, "min or max"),
    }
}

/// Check argument count
fn check_arity(
    args: &[Bytes],
    min: usize,
    max: Option<usize>,
    cmd: &str,
) -> Result<(), CommandError> {
    let bad = args.len() < min || max.is_some_and(|max| args.len() > max);
    if bad {
        return Err(CommandError::new(
            CommandErrorKind::WrongArity,
            format!("wrong number of arguments for '{}' command", cmd),
        ));
    }
    Ok(())
}

/// Collect trailing field/value pairs, rejecting odd counts
fn collect_pairs(args: &[Bytes], cmd: &str) -> Result<Vec<(Bytes, Bytes)>, CommandError> {
    if args.is_empty() || args.len() % 2 != 0 {
        return Err(CommandError::new(
            CommandErrorKind::WrongArity,
            format!("wrong number of arguments for '{}' command", cmd),
        ));
    }
    Ok(args.chunks(2).map(|c| (c[0].clone(), c[1].clone())).collect())
}

/// Parse the WITHSCORES / LIMIT option tail shared by the score-range commands
fn parse_range_options(args: &[Bytes]) -> Result<(bool, i64, i64), CommandError> {
    let mut with_scores = false;
    let mut offset = 0i64;
    let mut count = -1i64;

    let mut i = 0;
    while i < args.len() {
        let opt = String::from_utf8_lossy(&args[i]).to_uppercase();
        match opt.as_str() {
            "WITHSCORES" => with_scores = true,
            "LIMIT" => {
                if i + 2 >= args.len() {
                    return Err(CommandError::new(
                        CommandErrorKind::SyntaxError,
                        "LIMIT requires offset and count",
                    ));
                }
                offset = parse_int(&args[i + 1], "offset")?;
                count = parse_int(&args[i + 2], "count")?;
                i += 2;
            }
            _ => {
                return Err(CommandError::new(
                    CommandErrorKind::SyntaxError,
                    format!("unknown option '{}'", opt),
                ))
            }
        }
        i += 1;
    }

    Ok((with_scores, offset, count))
}

/// Parse command
fn parse_command(cmd: &str, args: &[Bytes]) -> Result<Command, CommandError> {
    match cmd {
        // Connection commands
        "PING" => {
            check_arity(args, 0, Some(1), cmd)?;
            Ok(Command::Ping {
                message: args.first().cloned(),
            })
        }
        "ECHO" => {
            check_arity(args, 1, Some(1), cmd)?;
            Ok(Command::Echo {
                message: args[0].clone(),
            })
        }

        // Key commands
        "DEL" => {
            check_arity(args, 1, None, cmd)?;
            Ok(Command::Del {
                keys: args.to_vec(),
            })
        }
        "EXISTS" => {
            check_arity(args, 1, None, cmd)?;
            Ok(Command::Exists {
                keys: args.to_vec(),
            })
        }
        "TYPE" => {
            check_arity(args, 1, Some(1), cmd)?;
            Ok(Command::Type {
                key: args[0].clone(),
            })
        }

        // String commands
        "GET" => {
            check_arity(args, 1, Some(1), cmd)?;
            Ok(Command::Get {
                key: args[0].clone(),
            })
        }
        "SET" => {
            check_arity(args, 2, Some(2), cmd)?;
            Ok(Command::Set {
                key: args[0].clone(),
                value: args[1].clone(),
            })
        }
        "GETSET" => {
            check_arity(args, 2, Some(2), cmd)?;
            Ok(Command::GetSet {
                key: args[0].clone(),
                value: args[1].clone(),
            })
        }
        "SETNX" => {
            check_arity(args, 2, Some(2), cmd)?;
            Ok(Command::SetNx {
                key: args[0].clone(),
                value: args[1].clone(),
            })
        }
        "MGET" => {
            check_arity(args, 1, None, cmd)?;
            Ok(Command::MGet {
                keys: args.to_vec(),
            })
        }
        "MSET" => {
            check_arity(args, 2, None, cmd)?;
            Ok(Command::MSet {
                kvs: collect_pairs(args, cmd)?,
            })
        }
        "STRLEN" => {
            check_arity(args, 1, Some(1), cmd)?;
            Ok(Command::StrLen {
                key: args[0].clone(),
            })
        }
        "APPEND" => {
            check_arity(args, 2, Some(2), cmd)?;
            Ok(Command::Append {
                key: args[0].clone(),
                value: args[1].clone(),
            })
        }
        "INCR" => {
            check_arity(args, 1, Some(1), cmd)?;
            Ok(Command::IncrBy {
                key: args[0].clone(),
                delta: 1,
            })
        }
        "INCRBY" => {
            check_arity(args, 2, Some(2), cmd)?;
            Ok(Command::IncrBy {
                key: args[0].clone(),
                delta: parse_int(&args[1], "increment")?,
            })
        }
        "DECR" => {
            check_arity(args, 1, Some(1), cmd)?;
            Ok(Command::IncrBy {
                key: args[0].clone(),
                delta: -1,
            })
        }
        "DECRBY" => {
            check_arity(args, 2, Some(2), cmd)?;
            let delta = parse_int(&args[1], "decrement")?;
            let delta = delta.checked_neg().ok_or_else(|| {
                CommandError::new(
                    CommandErrorKind::InvalidArgument,
                    "decrement is not an integer or out of range",
                )
            })?;
            Ok(Command::IncrBy {
                key: args[0].clone(),
                delta,
            })
        }

        // Hash commands
        "HGET" => {
            check_arity(args, 2, Some(2), cmd)?;
            Ok(Command::HGet {
                key: args[0].clone(),
                field: args[1].clone(),
            })
        }
        "HSET" => {
            check_arity(args, 3, None, cmd)?;
            Ok(Command::HSet {
                key: args[0].clone(),
                fvs: collect_pairs(&args[1..], cmd)?,
            })
        }
        "HMSET" => {
            check_arity(args, 3, None, cmd)?;
            Ok(Command::HMSet {
                key: args[0].clone(),
                fvs: collect_pairs(&args[1..], cmd)?,
            })
        }
        "HMGET" => {
            check_arity(args, 2, None, cmd)?;
            Ok(Command::HMGet {
                key: args[0].clone(),
                fields: args[1..].to_vec(),
            })
        }
        "HGETALL" => {
            check_arity(args, 1, Some(1), cmd)?;
            Ok(Command::HGetAll {
                key: args[0].clone(),
            })
        }
        "HKEYS" => {
            check_arity(args, 1, Some(1), cmd)?;
            Ok(Command::HKeys {
                key: args[0].clone(),
            })
        }
        "HVALS" => {
            check_arity(args, 1, Some(1), cmd)?;
            Ok(Command::HVals {
                key: args[0].clone(),
            })
        }
        "HLEN" => {
            check_arity(args, 1, Some(1), cmd)?;
            Ok(Command::HLen {
                key: args[0].clone(),
            })
        }
        "HEXISTS" => {
            check_arity(args, 2, Some(2), cmd)?;
            Ok(Command::HExists {
                key: args[0].clone(),
                field: args[1].clone(),
            })
        }
        "HDEL" => {
            check_arity(args, 2, None, cmd)?;
            Ok(Command::HDel {
                key: args[0].clone(),
                fields: args[1..].to_vec(),
            })
        }
        "HINCRBY" => {
            check_arity(args, 3, Some(3), cmd)?;
            Ok(Command::HIncrBy {
                key: args[0].clone(),
                field: args[1].clone(),
                delta: parse_int(&args[2], "increment")?,
            })
        }

        // List commands
        "LPUSH" => {
            check_arity(args, 2, None, cmd)?;
            Ok(Command::LPush {
                key: args[0].clone(),
                values: args[1..].to_vec(),
            })
        }
        "RPUSH" => {
            check_arity(args, 2, None, cmd)?;
            Ok(Command::RPush {
                key: args[0].clone(),
                values: args[1..].to_vec(),
            })
        }
        "LPOP" => {
            check_arity(args, 1, Some(1), cmd)?;
            Ok(Command::LPop {
                key: args[0].clone(),
            })
        }
        "RPOP" => {
            check_arity(args, 1, Some(1), cmd)?;
            Ok(Command::RPop {
                key: args[0].clone(),
            })
        }
        "LLEN" => {
            check_arity(args, 1, Some(1), cmd)?;
            Ok(Command::LLen {
                key: args[0].clone(),
            })
        }
        "LINDEX" => {
            check_arity(args, 2, Some(2), cmd)?;
            Ok(Command::LIndex {
                key: args[0].clone(),
                index: parse_int(&args[1], "index")?,
            })
        }
        "LRANGE" => {
            check_arity(args, 3, Some(3), cmd)?;
            Ok(Command::LRange {
                key: args[0].clone(),
                start: parse_int(&args[1], "start")?,
                stop: parse_int(&args[2], "stop")?,
            })
        }

        // Set commands
        "SADD" => {
            check_arity(args, 2, None, cmd)?;
            Ok(Command::SAdd {
                key: args[0].clone(),
                members: args[1..].to_vec(),
            })
        }
        "SREM" => {
            check_arity(args, 2, None, cmd)?;
            Ok(Command::SRem {
                key: args[0].clone(),
                members: args[1..].to_vec(),
            })
        }
        "SMEMBERS" => {
            check_arity(args, 1, Some(1), cmd)?;
            Ok(Command::SMembers {
                key: args[0].clone(),
            })
        }
        "SISMEMBER" => {
            check_arity(args, 2, Some(2), cmd)?;
            Ok(Command::SIsMember {
                key: args[0].clone(),
                member: args[1].clone(),
            })
        }
        "SCARD" => {
            check_arity(args, 1, Some(1), cmd)?;
            Ok(Command::SCard {
                key: args[0].clone(),
            })
        }

        // ZSet commands
        "ZADD" => {
            check_arity(args, 3, None, cmd)?;
            if (args.len() - 1) % 2 != 0 {
                return Err(CommandError::new(
                    CommandErrorKind::WrongArity,
                    format!("wrong number of arguments for '{}' command", cmd),
                ));
            }
            let mut members = Vec::with_capacity((args.len() - 1) / 2);
            for pair in args[1..].chunks(2) {
                members.push((parse_int(&pair[0], "score")?, pair[1].clone()));
            }
            Ok(Command::ZAdd {
                key: args[0].clone(),
                members,
            })
        }
        "ZSCORE" => {
            check_arity(args, 2, Some(2), cmd)?;
            Ok(Command::ZScore {
                key: args[0].clone(),
                member: args[1].clone(),
            })
        }
        "ZINCRBY" => {
            check_arity(args, 3, Some(3), cmd)?;
            Ok(Command::ZIncrBy {
                key: args[0].clone(),
                increment: parse_int(&args[1], "increment")?,
                member: args[2].clone(),
            })
        }
        "ZRANK" | "ZREVRANK" => {
            check_arity(args, 2, Some(2), cmd)?;
            Ok(Command::ZRank {
                key: args[0].clone(),
                member: args[1].clone(),
                reverse: cmd == "ZREVRANK",
            })
        }
        "ZRANGE" | "ZREVRANGE" => {
            check_arity(args, 3, Some(4), cmd)?;
            let (with_scores, _, _) = parse_range_options(&args[3..])?;
            Ok(Command::ZRange {
                key: args[0].clone(),
                start: parse_int(&args[1], "start")?,
                stop: parse_int(&args[2], "stop")?,
                with_scores,
                reverse: cmd == "ZREVRANGE",
            })
        }
        "ZRANGEBYSCORE" | "ZREVRANGEBYSCORE" => {
            check_arity(args, 3, None, cmd)?;
            let reverse = cmd == "ZREVRANGEBYSCORE";
            // ZREVRANGEBYSCORE takes max before min
            let (min, max) = if reverse {
                (parse_score_bound(&args[2])?, parse_score_bound(&args[1])?)
            } else {
                (parse_score_bound(&args[1])?, parse_score_bound(&args[2])?)
            };
            let (with_scores, offset, count) = parse_range_options(&args[3..])?;
            Ok(Command::ZRangeByScore {
                key: args[0].clone(),
                min,
                max,
                with_scores,
                offset,
                count,
                reverse,
            })
        }
        "ZCARD" => {
            check_arity(args, 1, Some(1), cmd)?;
            Ok(Command::ZCard {
                key: args[0].clone(),
            })
        }
        "ZREM" => {
            check_arity(args, 2, None, cmd)?;
            Ok(Command::ZRem {
                key: args[0].clone(),
                members: args[1..].to_vec(),
            })
        }
        "ZREMRANGEBYSCORE" => {
            check_arity(args, 3, Some(3), cmd)?;
            Ok(Command::ZRemRangeByScore {
                key: args[0].clone(),
                min: parse_score_bound(&args[1])?,
                max: parse_score_bound(&args[2])?,
            })
        }
        "ZREMRANGEBYRANK" => {
            check_arity(args, 3, Some(3), cmd)?;
            Ok(Command::ZRemRangeByRank {
                key: args[0].clone(),
                start: parse_int(&args[1], "start")?,
                stop: parse_int(&args[2], "stop")?,
            })
        }

        _ => Err(CommandError::new(
            CommandErrorKind::UnknownCommand,
            format!("unknown command '{}'", cmd),
        )),
    }
}
