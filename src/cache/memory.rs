//! In-process store with the same observable semantics as the Redis backend.
//!
//! Used for local runs without Redis and throughout the test suite. The
//! availability switch makes every call fail, which is how outages are
//! simulated.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::error::{CacheError, CacheResult};
use super::store::{CacheStats, KeyValueCache};

#[derive(Default)]
struct SortedSet {
    scores: HashMap<String, i64>,
    ordered: BTreeSet<(i64, String)>,
}

impl SortedSet {
    fn upsert(&mut self, member: &str, score: i64) {
        if let Some(previous) = self.scores.insert(member.to_string(), score) {
            self.ordered.remove(&(previous, member.to_string()));
        }
        self.ordered.insert((score, member.to_string()));
    }

    fn remove(&mut self, member: &str) {
        if let Some(score) = self.scores.remove(member) {
            self.ordered.remove(&(score, member.to_string()));
        }
    }

    fn oldest(&self) -> Option<&str> {
        self.ordered.first().map(|(_, member)| member.as_str())
    }

    fn len(&self) -> usize {
        self.scores.len()
    }
}

struct Entry {
    value: String,
    expires_at: Instant,
}

#[derive(Default)]
struct MemoryState {
    entries: HashMap<String, Entry>,
    sorted_sets: HashMap<String, SortedSet>,
}

impl MemoryState {
    fn live_entry(&mut self, key: &str) -> Option<&Entry> {
        let expired = self
            .entries
            .get(key)
            .is_some_and(|entry| entry.expires_at <= Instant::now());
        if expired {
            self.entries.remove(key);
        }
        self.entries.get(key)
    }
}

pub struct MemoryCache {
    state: Mutex<MemoryState>,
    available: AtomicBool,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            available: AtomicBool::new(true),
        }
    }

    /// Toggle simulated reachability; while unavailable every call fails.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Score of `member` in `index`, if present.
    pub async fn score(&self, index: &str, member: &str) -> Option<i64> {
        let state = self.state.lock().await;
        state
            .sorted_sets
            .get(index)
            .and_then(|set| set.scores.get(member).copied())
    }

    /// Members of `index` ordered from oldest to newest.
    pub async fn members(&self, index: &str) -> Vec<String> {
        let state = self.state.lock().await;
        state
            .sorted_sets
            .get(index)
            .map(|set| set.ordered.iter().map(|(_, m)| m.clone()).collect())
            .unwrap_or_default()
    }

    fn ensure_available(&self, op: &'static str) -> CacheResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(CacheError::unavailable(format!(
                "memory cache switched off during `{op}`"
            )))
        }
    }
}

#[async_trait]
impl KeyValueCache for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        self.ensure_available("get")?;
        let mut state = self.state.lock().await;
        Ok(state.live_entry(key).map(|entry| entry.value.clone()))
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        self.ensure_available("set_with_ttl")?;
        let mut state = self.state.lock().await;
        state.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.ensure_available("delete")?;
        self.state.lock().await.entries.remove(key);
        Ok(())
    }

    async fn sorted_set_upsert(&self, index: &str, member: &str, score: i64) -> CacheResult<()> {
        self.ensure_available("sorted_set_upsert")?;
        let mut state = self.state.lock().await;
        state
            .sorted_sets
            .entry(index.to_string())
            .or_default()
            .upsert(member, score);
        Ok(())
    }

    async fn sorted_set_len(&self, index: &str) -> CacheResult<u64> {
        self.ensure_available("sorted_set_len")?;
        let state = self.state.lock().await;
        Ok(state
            .sorted_sets
            .get(index)
            .map(|set| set.len() as u64)
            .unwrap_or(0))
    }

    async fn sorted_set_oldest(&self, index: &str) -> CacheResult<Option<String>> {
        self.ensure_available("sorted_set_oldest")?;
        let state = self.state.lock().await;
        Ok(state
            .sorted_sets
            .get(index)
            .and_then(|set| set.oldest().map(str::to_string)))
    }

    async fn sorted_set_remove(&self, index: &str, member: &str) -> CacheResult<()> {
        self.ensure_available("sorted_set_remove")?;
        let mut state = self.state.lock().await;
        if let Some(set) = state.sorted_sets.get_mut(index) {
            set.remove(member);
            if set.scores.is_empty() {
                state.sorted_sets.remove(index);
            }
        }
        Ok(())
    }

    async fn stats(&self) -> CacheResult<CacheStats> {
        self.ensure_available("stats")?;
        let started = Instant::now();
        let mut state = self.state.lock().await;
        let now = Instant::now();
        state.entries.retain(|_, entry| entry.expires_at > now);
        let keys = (state.entries.len() + state.sorted_sets.len()) as u64;
        Ok(CacheStats {
            round_trip: started.elapsed(),
            keys,
            memory: Vec::new(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}
