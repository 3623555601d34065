//! Обёртка запроса: кэш + повторы + флаги состояния для UI.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;

use super::{fetch_with_retry, Clock, Freshness, QueryCache, QueryPolicy};

/// Снимок состояния запроса по ключу
#[derive(Debug, Clone)]
pub struct QueryState<V> {
    pub data: Option<V>,
    /// Текст последней ошибки; сбрасывается после успешной загрузки
    pub error: Option<String>,
    /// Идёт первая загрузка, данных ещё нет
    pub is_loading: bool,
    /// Идёт фоновая перезагрузка, старые данные доступны
    pub is_refetching: bool,
    pub is_stale: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Загрузка по ключу: сколько вызовов её ждёт и сколько раз она завершилась
struct InFlight {
    callers: usize,
    loads: u64,
    lock: Arc<AsyncMutex<()>>,
}

struct RecordedError {
    message: String,
    at: DateTime<Utc>,
}

pub struct Query<V> {
    label: &'static str,
    cache: QueryCache<V>,
    in_flight: Mutex<HashMap<String, InFlight>>,
    errors: Mutex<HashMap<String, RecordedError>>,
}

/// Снимает отметку "в работе" даже при отмене future
struct InFlightGuard<'a> {
    in_flight: &'a Mutex<HashMap<String, InFlight>>,
    key: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = in_flight.get_mut(&self.key) {
            entry.callers = entry.callers.saturating_sub(1);
            if entry.callers == 0 {
                in_flight.remove(&self.key);
            }
        }
    }
}

impl<V: Clone> Query<V> {
    pub fn new(label: &'static str, clock: Arc<dyn Clock>, policy: QueryPolicy) -> Self {
        Self {
            label,
            cache: QueryCache::new(clock, policy),
            in_flight: Mutex::new(HashMap::new()),
            errors: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> &QueryPolicy {
        self.cache.policy()
    }

    pub fn state(&self, key: &str) -> QueryState<V> {
        let cached = self.cache.get(key);
        let in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(key);
        let error = self.error(key);

        QueryState {
            is_loading: in_flight && cached.is_none(),
            is_refetching: in_flight && cached.is_some(),
            is_stale: cached.as_ref().map_or(true, |c| c.freshness == Freshness::Stale),
            updated_at: cached.as_ref().map(|c| c.updated_at),
            data: cached.map(|c| c.value),
            error,
        }
    }

    /// Перезапрашивать ли данные при возврате фокуса в окно
    pub fn should_refetch_on_focus(&self, key: &str) -> bool {
        self.policy().refetch_on_window_focus && self.state(key).is_stale
    }

    /// Удаляет просроченные значения и ошибки, возвращает число удалённых значений
    pub fn purge_expired(&self) -> usize {
        let now = self.cache.now();
        let gc_time = self.policy().gc_time;
        self.errors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|_, error| now - error.at < gc_time);
        self.cache.purge_expired()
    }

    /// Свежие данные из кэша или загрузка через `op` с повторами.
    pub async fn fetch<E, F, Fut>(&self, key: &str, op: F) -> Result<V, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: Display,
    {
        if let Some(cached) = self.cache.get(key) {
            if cached.freshness == Freshness::Fresh {
                tracing::debug!("{}: cache hit for {}", self.label, key);
                return Ok(cached.value);
            }
        }
        self.refetch(key, op).await
    }

    /// Загрузка в обход кэша; результат целиком заменяет прежний.
    ///
    /// Одновременные вызовы по одному ключу ждут уже идущую загрузку и
    /// получают её результат.
    pub async fn refetch<E, F, Fut>(&self, key: &str, op: F) -> Result<V, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: Display,
    {
        let (lock, seen_loads) = self.enter(key);
        let _guard = InFlightGuard {
            in_flight: &self.in_flight,
            key: key.to_string(),
        };
        let _loading = lock.lock().await;

        if self.loads(key) != seen_loads {
            if let Some(cached) = self.cache.get(key) {
                tracing::debug!("{}: joined concurrent load for {}", self.label, key);
                return Ok(cached.value);
            }
        }

        let retry = self.policy().retry;
        match fetch_with_retry(self.label, retry, op).await {
            Ok(value) => {
                self.cache.insert(key, value.clone());
                self.mark_loaded(key);
                self.errors
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .remove(key);
                Ok(value)
            }
            Err(e) => {
                let error = RecordedError {
                    message: e.to_string(),
                    at: self.cache.now(),
                };
                self.errors
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .insert(key.to_string(), error);
                Err(e)
            }
        }
    }

    fn enter(&self, key: &str) -> (Arc<AsyncMutex<()>>, u64) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        let entry = in_flight.entry(key.to_string()).or_insert_with(|| InFlight {
            callers: 0,
            loads: 0,
            lock: Arc::new(AsyncMutex::new(())),
        });
        entry.callers += 1;
        (entry.lock.clone(), entry.loads)
    }

    fn loads(&self, key: &str) -> u64 {
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .map_or(0, |entry| entry.loads)
    }

    fn mark_loaded(&self, key: &str) {
        if let Some(entry) = self
            .in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get_mut(key)
        {
            entry.loads += 1;
        }
    }

    /// Ошибка старше `gc_time` забывается вместе с ключом
    fn error(&self, key: &str) -> Option<String> {
        let now = self.cache.now();
        let gc_time = self.policy().gc_time;
        let mut errors = self.errors.lock().unwrap_or_else(|e| e.into_inner());
        match errors.get(key) {
            Some(error) if now - error.at < gc_time => Some(error.message.clone()),
            Some(_) => {
                errors.remove(key);
                None
            }
            None => None,
        }
    }

    #[cfg(test)]
    fn recorded_errors(&self) -> usize {
        self.errors.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::cache::ManualClock;
    use chrono::{Duration, TimeZone};
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::sync::Notify;

    fn setup() -> (Arc<ManualClock>, Arc<Query<u32>>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
        ));
        let policy = QueryPolicy {
            stale_time: Duration::hours(1),
            gc_time: Duration::hours(2),
            retry: 2,
            refetch_on_window_focus: false,
        };
        (clock.clone(), Arc::new(Query::new("test", clock, policy)))
    }

    #[tokio::test]
    async fn test_fresh_data_is_not_refetched() {
        let (clock, query) = setup();
        let calls = AtomicU32::new(0);
        let load = || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok::<u32, String>(n + 10) }
        };

        assert_eq!(query.fetch("a", load).await, Ok(10));
        assert_eq!(query.fetch("a", load).await, Ok(10));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        clock.advance(Duration::minutes(61));
        assert!(query.state("a").is_stale);
        assert_eq!(query.fetch("a", load).await, Ok(11));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_error_keeps_previous_data() {
        let (clock, query) = setup();
        query.fetch("a", || async { Ok::<u32, String>(1) }).await.unwrap();
        clock.advance(Duration::minutes(61));

        let calls = AtomicU32::new(0);
        let result = query
            .fetch("a", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<u32, String>("503".to_string()) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        let state = query.state("a");
        assert_eq!(state.data, Some(1));
        assert_eq!(state.error.as_deref(), Some("503"));
        assert!(!state.is_loading);

        query.refetch("a", || async { Ok::<u32, String>(2) }).await.unwrap();
        let state = query.state("a");
        assert_eq!(state.data, Some(2));
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_loading_and_refetching_flags() {
        let (clock, query) = setup();
        let gate = Arc::new(Notify::new());

        let task = {
            let query = query.clone();
            let gate = gate.clone();
            tokio::spawn(async move {
                query
                    .fetch("a", || {
                        let gate = gate.clone();
                        async move {
                            gate.notified().await;
                            Ok::<u32, String>(7)
                        }
                    })
                    .await
            })
        };
        tokio::task::yield_now().await;
        let state = query.state("a");
        assert!(state.is_loading);
        assert!(!state.is_refetching);

        gate.notify_one();
        assert_eq!(task.await.unwrap(), Ok(7));
        assert!(!query.state("a").is_loading);

        clock.advance(Duration::minutes(90));
        let task = {
            let query = query.clone();
            let gate = gate.clone();
            tokio::spawn(async move {
                query
                    .fetch("a", || {
                        let gate = gate.clone();
                        async move {
                            gate.notified().await;
                            Ok::<u32, String>(8)
                        }
                    })
                    .await
            })
        };
        tokio::task::yield_now().await;
        let state = query.state("a");
        assert!(state.is_refetching);
        assert_eq!(state.data, Some(7));

        gate.notify_one();
        assert_eq!(task.await.unwrap(), Ok(8));
    }

    #[test]
    fn test_no_refetch_on_focus_by_default() {
        let (_, query) = setup();
        assert!(!query.should_refetch_on_focus("a"));
    }

    #[tokio::test]
    async fn test_concurrent_fetches_share_one_load() {
        let (_, query) = setup();
        let gate = Arc::new(Notify::new());
        let calls = Arc::new(AtomicU32::new(0));

        let spawn_fetch = |value: u32, gate: Option<Arc<Notify>>| {
            let query = query.clone();
            let calls = calls.clone();
            tokio::spawn(async move {
                query
                    .fetch("a", || {
                        let gate = gate.clone();
                        let calls = calls.clone();
                        async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            if let Some(gate) = gate {
                                gate.notified().await;
                            }
                            Ok::<u32, String>(value)
                        }
                    })
                    .await
            })
        };

        let first = spawn_fetch(7, Some(gate.clone()));
        tokio::task::yield_now().await;
        let second = spawn_fetch(8, None);
        tokio::task::yield_now().await;

        let state = query.state("a");
        assert!(state.is_loading);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        gate.notify_one();
        assert_eq!(first.await.unwrap(), Ok(7));
        assert_eq!(second.await.unwrap(), Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let state = query.state("a");
        assert!(!state.is_loading);
        assert!(!state.is_refetching);
        assert_eq!(state.data, Some(7));
    }

    #[tokio::test]
    async fn test_waiting_caller_loads_after_failed_load() {
        let (_, query) = setup();
        let gate = Arc::new(Notify::new());

        let first = {
            let query = query.clone();
            let gate = gate.clone();
            tokio::spawn(async move {
                query
                    .refetch("a", || {
                        let gate = gate.clone();
                        async move {
                            gate.notified().await;
                            Err::<u32, String>("down".to_string())
                        }
                    })
                    .await
            })
        };
        tokio::task::yield_now().await;
        let second = {
            let query = query.clone();
            tokio::spawn(async move { query.fetch("a", || async { Ok::<u32, String>(3) }).await })
        };
        tokio::task::yield_now().await;

        // Три попытки первого вызова
        for _ in 0..3 {
            gate.notify_one();
            tokio::task::yield_now().await;
        }
        assert!(first.await.unwrap().is_err());
        assert_eq!(second.await.unwrap(), Ok(3));
        assert!(query.state("a").error.is_none());
    }

    #[tokio::test]
    async fn test_errors_expire_with_gc_time() {
        let (clock, query) = setup();
        let result = query
            .fetch("a", || async { Err::<u32, String>("503".to_string()) })
            .await;
        assert!(result.is_err());
        assert_eq!(query.recorded_errors(), 1);

        clock.advance(Duration::minutes(90));
        assert_eq!(query.state("a").error.as_deref(), Some("503"));

        clock.advance(Duration::minutes(31));
        query.purge_expired();
        assert_eq!(query.recorded_errors(), 0);
        assert!(query.state("a").error.is_none());
    }
}
