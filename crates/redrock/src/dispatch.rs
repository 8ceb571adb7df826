//! Command dispatcher
//!
//! Translates decoded protocol commands into registry lookups, handle method
//! calls, and RESP replies. The existence record's type tag is checked here,
//! so a command aimed at the wrong structure family answers WRONGTYPE before
//! touching the structure.

use resp::{Command, CommandResult, RespValue};
use std::sync::Arc;
use storage::{keys, Registry, RocksStore, StoreError, StoreResult, StructureKind};
use tracing::warn;

/// Command dispatcher over the structure registry
pub struct Dispatcher {
    registry: Registry,
}

impl Dispatcher {
    pub fn new(store: Arc<RocksStore>) -> Self {
        Self {
            registry: Registry::new(store),
        }
    }

    /// Execute a command and shape the reply
    pub fn dispatch(&self, command: Command) -> RespValue {
        let name = command.name();
        match self.execute(command) {
            Ok(result) => result.into(),
            Err(StoreError::WrongType) => RespValue::error(StoreError::WrongType.to_string()),
            Err(e) => {
                warn!("{} failed: {}", name, e);
                RespValue::error(format!("ERR {}", e))
            }
        }
    }

    /// WRONGTYPE unless the key is absent or already holds `want`
    fn check_kind(&self, key: &[u8], want: StructureKind) -> StoreResult<()> {
        match self.registry.store().get(&keys::existence_key(key))? {
            Some(tag) if tag != want.tag() => Err(StoreError::WrongType),
            _ => Ok(()),
        }
    }

    fn kind_of(&self, key: &[u8]) -> StoreResult<Option<StructureKind>> {
        let tag = self.registry.store().get(&keys::existence_key(key))?;
        Ok(tag.as_deref().and_then(StructureKind::from_tag))
    }

    /// Drop whatever structure `key` currently holds
    fn drop_key(&self, key: &[u8]) -> StoreResult<bool> {
        match self.kind_of(key)? {
            Some(StructureKind::String) => self.registry.string(key).drop_all()?,
            Some(StructureKind::Hash) => self.registry.hash(key).drop_all()?,
            Some(StructureKind::List) => self.registry.list(key).drop_all()?,
            Some(StructureKind::Set) => self.registry.set(key).drop_all()?,
            Some(StructureKind::ZSet) => self.registry.zset(key).drop_all()?,
            None => return Ok(false),
        }
        Ok(true)
    }

    fn execute(&self, command: Command) -> StoreResult<CommandResult> {
        match command {
            // ==================== Connection ====================
            Command::Ping { message } => Ok(match message {
                Some(m) => CommandResult::Value(Some(m)),
                None => CommandResult::Pong,
            }),
            Command::Echo { message } => Ok(CommandResult::Value(Some(message))),

            // ==================== Keys ====================
            Command::Del { keys } => {
                let mut dropped = 0;
                for key in &keys {
                    if self.drop_key(key)? {
                        dropped += 1;
                    }
                }
                Ok(CommandResult::Integer(dropped))
            }
            Command::Exists { keys: key_names } => {
                let store = self.registry.store();
                let mut present = 0;
                for key in &key_names {
                    if store.get(&keys::existence_key(key))?.is_some() {
                        present += 1;
                    }
                }
                Ok(CommandResult::Integer(present))
            }
            Command::Type { key } => {
                let name: &'static [u8] = match self.kind_of(&key)? {
                    Some(kind) => kind.tag(),
                    None => b"none",
                };
                Ok(CommandResult::SimpleString(bytes::Bytes::from_static(name)))
            }

            // ==================== Strings ====================
            Command::Get { key } => {
                self.check_kind(&key, StructureKind::String)?;
                Ok(CommandResult::value(self.registry.string(&key).get()?))
            }
            Command::Set { key, value } => {
                self.check_kind(&key, StructureKind::String)?;
                self.registry.string(&key).set(&value)?;
                Ok(CommandResult::Ok)
            }
            Command::GetSet { key, value } => {
                self.check_kind(&key, StructureKind::String)?;
                Ok(CommandResult::value(
                    self.registry.string(&key).get_set(&value)?,
                ))
            }
            Command::SetNx { key, value } => {
                self.check_kind(&key, StructureKind::String)?;
                let written = self.registry.string(&key).set_nx(&value)?;
                Ok(CommandResult::Integer(written as i64))
            }
            Command::MGet { keys: key_names } => {
                let mut out = Vec::with_capacity(key_names.len());
                for key in &key_names {
                    // wrong-type keys answer nil here rather than failing the
                    // whole reply
                    if self.check_kind(key, StructureKind::String).is_err() {
                        out.push(None);
                    } else {
                        out.push(self.registry.string(key).get()?);
                    }
                }
                Ok(CommandResult::array(out))
            }
            Command::MSet { kvs } => {
                for (key, value) in &kvs {
                    self.check_kind(key, StructureKind::String)?;
                    self.registry.string(key).set(value)?;
                }
                Ok(CommandResult::Ok)
            }
            Command::StrLen { key } => {
                self.check_kind(&key, StructureKind::String)?;
                Ok(CommandResult::Integer(
                    self.registry.string(&key).strlen()? as i64
                ))
            }
            Command::Append { key, value } => {
                self.check_kind(&key, StructureKind::String)?;
                Ok(CommandResult::Integer(
                    self.registry.string(&key).append(&value)? as i64,
                ))
            }
            Command::IncrBy { key, delta } => {
                self.check_kind(&key, StructureKind::String)?;
                Ok(CommandResult::Integer(
                    self.registry.string(&key).incr_by(delta)?,
                ))
            }

            // ==================== Hashes ====================
            Command::HGet { key, field } => {
                self.check_kind(&key, StructureKind::Hash)?;
                Ok(CommandResult::value(self.registry.hash(&key).get(&field)?))
            }
            Command::HSet { key, fvs } => {
                self.check_kind(&key, StructureKind::Hash)?;
                let pairs: Vec<(&[u8], &[u8])> =
                    fvs.iter().map(|(f, v)| (f.as_ref(), v.as_ref())).collect();
                let written = self.registry.hash(&key).set(&pairs)?;
                Ok(CommandResult::Integer(written as i64))
            }
            Command::HMSet { key, fvs } => {
                self.check_kind(&key, StructureKind::Hash)?;
                let pairs: Vec<(&[u8], &[u8])> =
                    fvs.iter().map(|(f, v)| (f.as_ref(), v.as_ref())).collect();
                self.registry.hash(&key).set(&pairs)?;
                Ok(CommandResult::Ok)
            }
            Command::HMGet { key, fields } => {
                self.check_kind(&key, StructureKind::Hash)?;
                let fields: Vec<&[u8]> = fields.iter().map(|f| f.as_ref()).collect();
                Ok(CommandResult::array(
                    self.registry.hash(&key).mget(&fields)?,
                ))
            }
            Command::HGetAll { key } => {
                self.check_kind(&key, StructureKind::Hash)?;
                let mut out = Vec::new();
                for (field, value) in self.registry.hash(&key).get_all()? {
                    out.push(Some(field));
                    out.push(Some(value));
                }
                Ok(CommandResult::array(out))
            }
            Command::HKeys { key } => {
                self.check_kind(&key, StructureKind::Hash)?;
                let fields = self.registry.hash(&key).fields()?;
                Ok(CommandResult::array(fields.into_iter().map(Some).collect()))
            }
            Command::HVals { key } => {
                self.check_kind(&key, StructureKind::Hash)?;
                let values = self.registry.hash(&key).values()?;
                Ok(CommandResult::array(values.into_iter().map(Some).collect()))
            }
            Command::HLen { key } => {
                self.check_kind(&key, StructureKind::Hash)?;
                Ok(CommandResult::Integer(self.registry.hash(&key).len()?))
            }
            Command::HExists { key, field } => {
                self.check_kind(&key, StructureKind::Hash)?;
                let present = self.registry.hash(&key).exists(&field)?;
                Ok(CommandResult::Integer(present as i64))
            }
            Command::HDel { key, fields } => {
                self.check_kind(&key, StructureKind::Hash)?;
                let fields: Vec<&[u8]> = fields.iter().map(|f| f.as_ref()).collect();
                let deleted = self.registry.hash(&key).del(&fields)?;
                Ok(CommandResult::Integer(deleted as i64))
            }
            Command::HIncrBy { key, field, delta } => {
                self.check_kind(&key, StructureKind::Hash)?;
                Ok(CommandResult::Integer(
                    self.registry.hash(&key).incr_by(&field, delta)?,
                ))
            }

            // ==================== Lists ====================
            Command::LPush { key, values } => {
                self.check_kind(&key, StructureKind::List)?;
                let values: Vec<&[u8]> = values.iter().map(|v| v.as_ref()).collect();
                let len = self.registry.list(&key).push_front(&values)?;
                Ok(CommandResult::Integer(len as i64))
            }
            Command::RPush { key, values } => {
                self.check_kind(&key, StructureKind::List)?;
                let values: Vec<&[u8]> = values.iter().map(|v| v.as_ref()).collect();
                let len = self.registry.list(&key).push_back(&values)?;
                Ok(CommandResult::Integer(len as i64))
            }
            Command::LPop { key } => {
                self.check_kind(&key, StructureKind::List)?;
                Ok(CommandResult::value(self.registry.list(&key).pop_front()?))
            }
            Command::RPop { key } => {
                self.check_kind(&key, StructureKind::List)?;
                Ok(CommandResult::value(self.registry.list(&key).pop_back()?))
            }
            Command::LLen { key } => {
                self.check_kind(&key, StructureKind::List)?;
                Ok(CommandResult::Integer(self.registry.list(&key).len()?))
            }
            Command::LIndex { key, index } => {
                self.check_kind(&key, StructureKind::List)?;
                Ok(CommandResult::value(self.registry.list(&key).index(index)?))
            }
            Command::LRange { key, start, stop } => {
                self.check_kind(&key, StructureKind::List)?;
                let values = self.registry.list(&key).range(start, stop)?;
                Ok(CommandResult::array(values.into_iter().map(Some).collect()))
            }

            // ==================== Sets ====================
            Command::SAdd { key, members } => {
                self.check_kind(&key, StructureKind::Set)?;
                let members: Vec<&[u8]> = members.iter().map(|m| m.as_ref()).collect();
                let added = self.registry.set(&key).add(&members)?;
                Ok(CommandResult::Integer(added as i64))
            }
            Command::SRem { key, members } => {
                self.check_kind(&key, StructureKind::Set)?;
                let members: Vec<&[u8]> = members.iter().map(|m| m.as_ref()).collect();
                let removed = self.registry.set(&key).remove(&members)?;
                Ok(CommandResult::Integer(removed as i64))
            }
            Command::SMembers { key } => {
                self.check_kind(&key, StructureKind::Set)?;
                let members = self.registry.set(&key).members()?;
                Ok(CommandResult::array(
                    members.into_iter().map(Some).collect(),
                ))
            }
            Command::SIsMember { key, member } => {
                self.check_kind(&key, StructureKind::Set)?;
                let present = self.registry.set(&key).contains(&member)?;
                Ok(CommandResult::Integer(present as i64))
            }
            Command::SCard { key } => {
                self.check_kind(&key, StructureKind::Set)?;
                Ok(CommandResult::Integer(self.registry.set(&key).card()?))
            }

            // ==================== Sorted sets ====================
            Command::ZAdd { key, members } => {
                self.check_kind(&key, StructureKind::ZSet)?;
                let pairs: Vec<(i64, &[u8])> =
                    members.iter().map(|(s, m)| (*s, m.as_ref())).collect();
                let added = self.registry.zset(&key).add(&pairs)?;
                Ok(CommandResult::Integer(added as i64))
            }
            Command::ZScore { key, member } => {
                self.check_kind(&key, StructureKind::ZSet)?;
                let score = self.registry.zset(&key).score(&member)?;
                Ok(CommandResult::value(
                    score.map(|s| s.to_string().into_bytes()),
                ))
            }
            Command::ZIncrBy {
                key,
                increment,
                member,
            } => {
                self.check_kind(&key, StructureKind::ZSet)?;
                let score = self.registry.zset(&key).incr_by(&member, increment)?;
                Ok(CommandResult::value(Some(score.to_string().into_bytes())))
            }
            Command::ZRank {
                key,
                member,
                reverse,
            } => {
                self.check_kind(&key, StructureKind::ZSet)?;
                Ok(match self.registry.zset(&key).rank(&member, reverse)? {
                    Some(rank) => CommandResult::Integer(rank as i64),
                    None => CommandResult::Value(None),
                })
            }
            Command::ZRange {
                key,
                start,
                stop,
                with_scores,
                reverse,
            } => {
                self.check_kind(&key, StructureKind::ZSet)?;
                let pairs = self.registry.zset(&key).range_by_index(start, stop, reverse)?;
                Ok(score_member_reply(pairs, with_scores))
            }
            Command::ZRangeByScore {
                key,
                min,
                max,
                with_scores,
                offset,
                count,
                reverse,
            } => {
                self.check_kind(&key, StructureKind::ZSet)?;
                let pairs = self
                    .registry
                    .zset(&key)
                    .range_by_score(min, max, offset, count, reverse)?;
                Ok(score_member_reply(pairs, with_scores))
            }
            Command::ZCard { key } => {
                self.check_kind(&key, StructureKind::ZSet)?;
                Ok(CommandResult::Integer(self.registry.zset(&key).len()?))
            }
            Command::ZRem { key, members } => {
                self.check_kind(&key, StructureKind::ZSet)?;
                let members: Vec<&[u8]> = members.iter().map(|m| m.as_ref()).collect();
                let removed = self.registry.zset(&key).remove(&members)?;
                Ok(CommandResult::Integer(removed as i64))
            }
            Command::ZRemRangeByScore { key, min, max } => {
                self.check_kind(&key, StructureKind::ZSet)?;
                let removed = self.registry.zset(&key).remove_by_score(min, max)?;
                Ok(CommandResult::Integer(removed as i64))
            }
            Command::ZRemRangeByRank { key, start, stop } => {
                self.check_kind(&key, StructureKind::ZSet)?;
                let removed = self.registry.zset(&key).remove_by_index(start, stop)?;
                Ok(CommandResult::Integer(removed as i64))
            }
        }
    }
}

/// Member sequence for range replies, score-first pairs under WITHSCORES
fn score_member_reply(pairs: Vec<(i64, Vec<u8>)>, with_scores: bool) -> CommandResult {
    let mut out = Vec::with_capacity(pairs.len() * 2);
    for (score, member) in pairs {
        if with_scores {
            out.push(Some(score.to_string().into_bytes()));
        }
        out.push(Some(member));
    }
    CommandResult::array(out)
}
