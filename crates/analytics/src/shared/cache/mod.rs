//! Кэш результатов запросов с временем устаревания (stale) и удаления (gc).
//!
//! Кэш передаётся в обёртки запросов явно, вместе с часами, поэтому тесты
//! управляют временем через `ManualClock`.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex, RwLock};

use crate::shared::config::CacheConfig;

pub mod query;

pub use query::{Query, QueryState};

/// Источник текущего времени
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Часы, которые двигаются только вручную
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Политика кэширования одного вида запросов
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryPolicy {
    /// После этого срока значение считается устаревшим и перезапрашивается
    pub stale_time: Duration,
    /// После этого срока значение удаляется из кэша
    pub gc_time: Duration,
    /// Количество повторов после первой неудачной попытки
    pub retry: u32,
    pub refetch_on_window_focus: bool,
}

impl QueryPolicy {
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            stale_time: Duration::seconds(config.stale_time_secs as i64),
            gc_time: Duration::seconds(config.gc_time_secs as i64),
            retry: config.retry,
            refetch_on_window_focus: config.refetch_on_window_focus,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale,
}

#[derive(Debug, Clone)]
pub struct CachedValue<V> {
    pub value: V,
    pub freshness: Freshness,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    updated_at: DateTime<Utc>,
}

pub struct QueryCache<V> {
    clock: Arc<dyn Clock>,
    policy: QueryPolicy,
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> QueryCache<V> {
    pub fn new(clock: Arc<dyn Clock>, policy: QueryPolicy) -> Self {
        Self {
            clock,
            policy,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> &QueryPolicy {
        &self.policy
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Значение по ключу; записи старше `gc_time` удаляются и не возвращаются.
    pub fn get(&self, key: &str) -> Option<CachedValue<V>> {
        let now = self.clock.now();
        {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            let entry = entries.get(key)?;
            let age = now - entry.updated_at;
            if age < self.policy.gc_time {
                let freshness = if age < self.policy.stale_time {
                    Freshness::Fresh
                } else {
                    Freshness::Stale
                };
                return Some(CachedValue {
                    value: entry.value.clone(),
                    freshness,
                    updated_at: entry.updated_at,
                });
            }
        }

        tracing::debug!("Query cache entry {} expired", key);
        self.remove(key);
        None
    }

    /// Заменяет значение целиком
    pub fn insert(&self, key: &str, value: V) {
        let entry = CacheEntry {
            value,
            updated_at: self.clock.now(),
        };
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), entry);
    }

    pub fn remove(&self, key: &str) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
    }

    /// Удаляет все записи старше `gc_time`, возвращает их количество
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let gc_time = self.policy.gc_time;
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, entry| now - entry.updated_at < gc_time);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Выполняет `op` до `retry + 1` раз подряд, без пауз между попытками.
pub async fn fetch_with_retry<T, E, F, Fut>(label: &str, retry: u32, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < retry => {
                attempt += 1;
                tracing::warn!("{}: attempt {} failed: {}, retrying", label, attempt, e);
            }
            Err(e) => {
                tracing::error!("{}: giving up after {} attempts: {}", label, attempt + 1, e);
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy() -> QueryPolicy {
        QueryPolicy {
            stale_time: Duration::hours(1),
            gc_time: Duration::hours(2),
            retry: 2,
            refetch_on_window_focus: false,
        }
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
        ))
    }

    #[test]
    fn test_fresh_then_stale_then_collected() {
        let clock = clock();
        let cache: QueryCache<u32> = QueryCache::new(clock.clone(), policy());
        cache.insert("cabinet-1", 42);

        let hit = cache.get("cabinet-1").unwrap();
        assert_eq!(hit.value, 42);
        assert_eq!(hit.freshness, Freshness::Fresh);

        clock.advance(Duration::minutes(61));
        assert_eq!(cache.get("cabinet-1").unwrap().freshness, Freshness::Stale);

        clock.advance(Duration::minutes(60));
        assert!(cache.get("cabinet-1").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_insert_replaces_whole_value() {
        let clock = clock();
        let cache: QueryCache<Vec<u32>> = QueryCache::new(clock.clone(), policy());
        cache.insert("k", vec![1, 2, 3]);
        clock.advance(Duration::minutes(90));
        cache.insert("k", vec![4]);
        let hit = cache.get("k").unwrap();
        assert_eq!(hit.value, vec![4]);
        assert_eq!(hit.freshness, Freshness::Fresh);
    }

    #[test]
    fn test_purge_expired() {
        let clock = clock();
        let cache: QueryCache<u32> = QueryCache::new(clock.clone(), policy());
        cache.insert("old", 1);
        clock.advance(Duration::minutes(150));
        cache.insert("new", 2);
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_policy_from_config() {
        let policy = QueryPolicy::from_config(&CacheConfig::default());
        assert_eq!(policy.stale_time, Duration::hours(1));
        assert_eq!(policy.gc_time, Duration::hours(2));
        assert_eq!(policy.retry, 2);
        assert!(!policy.refetch_on_window_focus);
    }

    #[tokio::test]
    async fn test_fetch_with_retry_recovers() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = fetch_with_retry("test", 2, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(format!("boom {}", n))
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fetch_with_retry_gives_up() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = fetch_with_retry("test", 1, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("down".to_string()) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
