//! Sorted set handle
//!
//! A sorted set is encoded as two complementary key families: the member
//! index (`_z[key]m#member` -> score) answers membership and score lookups,
//! the score index (`_z[key]s#<sign><score8>#member` -> "") serves rank and
//! range scans in score order. Both entries for a member are created and
//! deleted by the same atomic batch.

use crate::db::{Direction, RocksStore};
use crate::error::{StoreError, StoreResult};
use crate::keys;
use crate::registry::StructureKind;
use parking_lot::Mutex;
use rocksdb::WriteBatch;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Scans longer than this report the "large" sentinel instead of an exact count
const LEN_SCAN_CAP: i64 = 100;

/// Handle for one sorted set
pub struct ZSetHandle {
    store: Arc<RocksStore>,
    key: Vec<u8>,
    mu: Mutex<()>,
}

impl ZSetHandle {
    pub fn new(store: Arc<RocksStore>, key: Vec<u8>) -> Self {
        Self {
            store,
            key,
            mu: Mutex::new(()),
        }
    }

    fn direction(reverse: bool) -> Direction {
        if reverse {
            Direction::Backward
        } else {
            Direction::Forward
        }
    }

    /// Score lookup without taking the guard
    fn score_of(&self, member: &[u8]) -> StoreResult<Option<i64>> {
        match self.store.get(&keys::zset_member_key(&self.key, member))? {
            Some(raw) => {
                let score = keys::decode_score_value(&raw).ok_or_else(|| {
                    StoreError::Io(format!("corrupt score entry ({} bytes)", raw.len()))
                })?;
                Ok(Some(score))
            }
            None => Ok(None),
        }
    }

    /// True when no member-index entry survives outside `doomed`
    fn emptied_after(&self, family_prefix: &[u8], doomed: &HashSet<Vec<u8>>) -> StoreResult<bool> {
        let mut empty = true;
        self.store
            .prefix_scan(family_prefix, Direction::Forward, |_i, k, _v, quit| {
                if !doomed.contains(k) {
                    empty = false;
                    *quit = true;
                }
            })?;
        Ok(empty)
    }

    /// Add or update members; returns how many were new
    pub fn add(&self, pairs: &[(i64, &[u8])]) -> StoreResult<usize> {
        let _guard = self.mu.lock();
        let mut batch = WriteBatch::default();
        // scores already staged in this batch, so a member repeated in one
        // call still ends up with exactly one score-index entry
        let mut staged: HashMap<Vec<u8>, i64> = HashMap::new();
        let mut added = 0;
        for (score, member) in pairs {
            let member_key = keys::zset_member_key(&self.key, member);
            let old_score = match staged.get(*member) {
                Some(staged_score) => Some(*staged_score),
                None => {
                    let on_disk = self
                        .store
                        .get(&member_key)?
                        .and_then(|raw| keys::decode_score_value(&raw));
                    if on_disk.is_none() {
                        added += 1;
                    }
                    on_disk
                }
            };
            if let Some(old_score) = old_score {
                batch.delete(keys::zset_score_key(&self.key, member, old_score));
            }
            batch.put(&member_key, (*score).to_be_bytes());
            batch.put(keys::zset_score_key(&self.key, member, *score), b"");
            staged.insert(member.to_vec(), *score);
        }
        batch.put(keys::existence_key(&self.key), StructureKind::ZSet.tag());
        self.store.write(batch)?;
        Ok(added)
    }

    /// Score of `member`, or None when absent
    pub fn score(&self, member: &[u8]) -> StoreResult<Option<i64>> {
        self.score_of(member)
    }

    /// Add `delta` to the member's score (materializing it at `delta` when
    /// absent) and return the new score
    pub fn incr_by(&self, member: &[u8], delta: i64) -> StoreResult<i64> {
        let _guard = self.mu.lock();
        let mut batch = WriteBatch::default();
        let new_score = match self.score_of(member)? {
            Some(old) => {
                batch.delete(keys::zset_score_key(&self.key, member, old));
                old.checked_add(delta)
                    .ok_or_else(|| StoreError::InvalidArgument("integer overflow".to_string()))?
            }
            None => delta,
        };
        batch.put(
            keys::zset_member_key(&self.key, member),
            new_score.to_be_bytes(),
        );
        batch.put(keys::zset_score_key(&self.key, member, new_score), b"");
        batch.put(keys::existence_key(&self.key), StructureKind::ZSet.tag());
        self.store.write(batch)?;
        Ok(new_score)
    }

    /// Zero-based position of `member` in score order, or None when absent
    pub fn rank(&self, member: &[u8], reverse: bool) -> StoreResult<Option<u64>> {
        let _guard = self.mu.lock();
        if self.score_of(member)?.is_none() {
            return Ok(None);
        }
        let prefix = keys::zset_score_prefix(&self.key);
        let mut found = None;
        self.store
            .prefix_scan(&prefix, Self::direction(reverse), |i, k, _v, quit| {
                if let Some((_, m)) = keys::decode_score_key(k, prefix.len()) {
                    if m == member {
                        found = Some(i as u64);
                        *quit = true;
                    }
                }
            })?;
        Ok(found)
    }

    /// Entries whose visit index falls in `[start, stop]`; `stop == -1` means
    /// "to the end", negative `start` is treated as 0
    pub fn range_by_index(
        &self,
        start: i64,
        stop: i64,
        reverse: bool,
    ) -> StoreResult<Vec<(i64, Vec<u8>)>> {
        let _guard = self.mu.lock();
        let start = start.max(0);
        let prefix = keys::zset_score_prefix(&self.key);
        let mut out = Vec::new();
        self.store
            .prefix_scan(&prefix, Self::direction(reverse), |i, k, _v, quit| {
                let i = i as i64;
                if i < start {
                    return;
                }
                if stop == -1 || i <= stop {
                    if let Some((score, member)) = keys::decode_score_key(k, prefix.len()) {
                        out.push((score, member.to_vec()));
                    }
                } else {
                    *quit = true;
                }
            })?;
        Ok(out)
    }

    /// Entries with `min <= score <= max`, skipping `offset`, emitting up to
    /// `count` (`count == -1` means unlimited)
    pub fn range_by_score(
        &self,
        min: i64,
        max: i64,
        offset: i64,
        count: i64,
        reverse: bool,
    ) -> StoreResult<Vec<(i64, Vec<u8>)>> {
        let _guard = self.mu.lock();
        let prefix = keys::zset_score_prefix(&self.key);
        let (lo, hi) = self.score_bounds(&prefix, min, max);
        let mut out = Vec::new();
        self.store
            .range_scan(&lo, &hi, Self::direction(reverse), |i, k, _v, quit| {
                let i = i as i64;
                if i < offset {
                    return;
                }
                if count != -1 && i >= offset + count {
                    *quit = true;
                    return;
                }
                if let Some((score, member)) = keys::decode_score_key(k, prefix.len()) {
                    out.push((score, member.to_vec()));
                }
            })?;
        Ok(out)
    }

    /// Byte bounds enclosing every score-index entry with a score in
    /// `[min, max]`: the upper bound is closed with MAXBYTE so that all
    /// members at `max` are included
    fn score_bounds(&self, prefix: &[u8], min: i64, max: i64) -> (Vec<u8>, Vec<u8>) {
        let mut lo = prefix.to_vec();
        lo.extend_from_slice(&keys::encode_score(min));
        let mut hi = prefix.to_vec();
        hi.extend_from_slice(&keys::encode_score(max));
        hi.push(keys::MAXBYTE);
        (lo, hi)
    }

    /// Remove members; returns how many were present. Removing the last
    /// member deletes the existence record in the same batch.
    pub fn remove(&self, members: &[&[u8]]) -> StoreResult<usize> {
        let _guard = self.mu.lock();
        let mut batch = WriteBatch::default();
        let mut doomed = HashSet::new();
        let mut removed = 0;
        for member in members {
            let member_key = keys::zset_member_key(&self.key, member);
            if doomed.contains(&member_key) {
                continue;
            }
            if let Some(raw) = self.store.get(&member_key)? {
                if let Some(score) = keys::decode_score_value(&raw) {
                    batch.delete(keys::zset_score_key(&self.key, member, score));
                }
                batch.delete(&member_key);
                doomed.insert(member_key);
                removed += 1;
            }
        }
        if removed > 0 {
            self.finish_removal(batch, &keys::zset_member_prefix(&self.key), &doomed)?;
        }
        Ok(removed)
    }

    /// Remove entries whose rank falls in `[start, stop]`; `stop == -1` means
    /// "to the end"
    pub fn remove_by_index(&self, start: i64, stop: i64) -> StoreResult<usize> {
        let _guard = self.mu.lock();
        let start = start.max(0);
        let prefix = keys::zset_score_prefix(&self.key);
        let mut batch = WriteBatch::default();
        let mut doomed = HashSet::new();
        let mut removed = 0;
        self.store
            .prefix_scan(&prefix, Direction::Forward, |i, k, _v, quit| {
                let i = i as i64;
                if i < start {
                    return;
                }
                if stop == -1 || i <= stop {
                    if let Some((_, member)) = keys::decode_score_key(k, prefix.len()) {
                        batch.delete(keys::zset_member_key(&self.key, member));
                        batch.delete(k);
                        doomed.insert(k.to_vec());
                        removed += 1;
                    }
                } else {
                    *quit = true;
                }
            })?;
        if removed > 0 {
            self.finish_removal(batch, &prefix, &doomed)?;
        }
        Ok(removed)
    }

    /// Remove entries with `min <= score <= max`
    pub fn remove_by_score(&self, min: i64, max: i64) -> StoreResult<usize> {
        let _guard = self.mu.lock();
        let prefix = keys::zset_score_prefix(&self.key);
        let (lo, hi) = self.score_bounds(&prefix, min, max);
        let mut batch = WriteBatch::default();
        let mut doomed = HashSet::new();
        let mut removed = 0;
        self.store
            .range_scan(&lo, &hi, Direction::Forward, |_i, k, _v, _quit| {
                if let Some((_, member)) = keys::decode_score_key(k, prefix.len()) {
                    batch.delete(keys::zset_member_key(&self.key, member));
                    batch.delete(k);
                    doomed.insert(k.to_vec());
                    removed += 1;
                }
            })?;
        if removed > 0 {
            self.finish_removal(batch, &prefix, &doomed)?;
        }
        Ok(removed)
    }

    /// Append the existence delete when the set empties, then apply the batch.
    ///
    /// The emptiness probe is best-effort: if it fails, the existence record
    /// lingers as a lazy marker and the removal still commits.
    fn finish_removal(
        &self,
        mut batch: WriteBatch,
        survivor_prefix: &[u8],
        doomed: &HashSet<Vec<u8>>,
    ) -> StoreResult<()> {
        if self.emptied_after(survivor_prefix, doomed).unwrap_or(false) {
            batch.delete(keys::existence_key(&self.key));
        }
        self.store.write(batch)
    }

    /// Member count: exact up to 100, the -1 sentinel beyond
    pub fn len(&self) -> StoreResult<i64> {
        let prefix = keys::zset_score_prefix(&self.key);
        let mut n = 0i64;
        self.store
            .prefix_scan(&prefix, Direction::Forward, |_i, _k, _v, quit| {
                n += 1;
                if n > LEN_SCAN_CAP {
                    n = -1;
                    *quit = true;
                }
            })?;
        Ok(n)
    }

    /// Delete every entry of the structure in one batch
    pub fn drop_all(&self) -> StoreResult<()> {
        let _guard = self.mu.lock();
        let mut batch = WriteBatch::default();
        self.store.prefix_scan(
            &keys::zset_prefix(&self.key),
            Direction::Forward,
            |_i, k, _v, _quit| {
                batch.delete(k);
            },
        )?;
        batch.delete(keys::existence_key(&self.key));
        self.store.write(batch)
    }
}
