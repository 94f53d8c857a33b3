//! Cached, coalescing weather lookups.
//!
//! Summaries are cached per lowercased city name. Concurrent lookups for the
//! same key while nothing is cached share a single upstream request and all
//! observe its outcome. Failures are never cached.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use moka::{future::Cache, policy::EvictionPolicy};
use tracing::{debug, info};

use crate::{
    config::CacheConfig,
    error::{FetchError, LookupError},
    model::WeatherSummary,
    provider::ForecastClient,
    summary::summarize_forecast,
};

/// Lookup counters.
///
/// A miss is a lookup that ran its own upstream fetch. Callers that waited on
/// another caller's in-flight fetch count as hits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: u64,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug)]
pub struct WeatherService {
    client: Arc<dyn ForecastClient>,
    cache: Cache<String, WeatherSummary>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl WeatherService {
    pub fn new(client: Arc<dyn ForecastClient>, config: &CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(config.ttl())
            .eviction_policy(EvictionPolicy::lru())
            .build();

        Self {
            client,
            cache,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Return the summary for `city`, fetching it upstream on a cache miss.
    pub async fn summarize(&self, city: &str) -> Result<WeatherSummary, LookupError> {
        let key = city.to_lowercase();

        let entry = self
            .cache
            .entry(key)
            .or_try_insert_with(async {
                info!(city, "Cache miss, fetching forecast");
                let forecast = self.client.fetch(city).await?;
                Ok::<_, FetchError>(summarize_forecast(&forecast))
            })
            .await?;

        let counter = if entry.is_fresh() { &self.misses } else { &self.hits };
        counter.fetch_add(1, Ordering::Relaxed);

        debug!(city, cache_hit = !entry.is_fresh(), stats = ?self.stats(), "Lookup complete");

        Ok(entry.into_value())
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.cache.entry_count(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ForecastPoint, ForecastResponse};
    use async_trait::async_trait;
    use std::{sync::atomic::AtomicUsize, time::Duration};

    #[derive(Debug, Clone, Copy)]
    enum Reply {
        Forecast,
        NotFound,
        Down,
    }

    #[derive(Debug)]
    struct FakeClient {
        calls: AtomicUsize,
        delay: Duration,
        reply: Reply,
    }

    impl FakeClient {
        fn new(reply: Reply) -> Arc<Self> {
            Self::delayed(reply, Duration::ZERO)
        }

        fn delayed(reply: Reply, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delay,
                reply,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ForecastClient for FakeClient {
        async fn fetch(&self, city: &str) -> Result<ForecastResponse, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match self.reply {
                Reply::Forecast => Ok(ForecastResponse {
                    city_name: city.to_string(),
                    points: vec![
                        ForecastPoint {
                            timestamp: 0,
                            temperature_c: 10.0,
                            label: "2024-11-19 12:00:00".into(),
                        },
                        ForecastPoint {
                            timestamp: 0,
                            temperature_c: 20.0,
                            label: "2024-11-20 12:00:00".into(),
                        },
                    ],
                }),
                Reply::NotFound => Err(FetchError::CityNotFound(city.to_string())),
                Reply::Down => Err(FetchError::ServiceUnavailable),
            }
        }
    }

    fn service(client: Arc<FakeClient>, ttl_secs: u64) -> WeatherService {
        WeatherService::new(client, &CacheConfig { ttl_secs, max_capacity: 100 })
    }

    #[tokio::test]
    async fn second_lookup_is_served_from_cache() {
        let client = FakeClient::new(Reply::Forecast);
        let svc = service(client.clone(), 1800);

        let first = svc.summarize("London").await.unwrap();
        let second = svc.summarize("London").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.average_temperature, 15.0);
        assert_eq!(client.calls(), 1);

        let stats = svc.stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
    }

    #[tokio::test]
    async fn cache_key_ignores_case() {
        let client = FakeClient::new(Reply::Forecast);
        let svc = service(client.clone(), 1800);

        svc.summarize("London").await.unwrap();
        let cached = svc.summarize("LONDON").await.unwrap();

        assert_eq!(cached.city, "London");
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn whitespace_variants_are_distinct_keys() {
        let client = FakeClient::new(Reply::Forecast);
        let svc = service(client.clone(), 1800);

        svc.summarize("London").await.unwrap();
        svc.summarize(" London").await.unwrap();

        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let client = FakeClient::new(Reply::NotFound);
        let svc = service(client.clone(), 1800);

        let err = svc.summarize("InvalidCity").await.unwrap_err();
        assert_eq!(err.to_string(), "City not found for: InvalidCity");

        svc.summarize("InvalidCity").await.unwrap_err();
        assert_eq!(client.calls(), 2);
        assert_eq!(svc.stats().hits, 0);
    }

    #[tokio::test]
    async fn expired_entry_triggers_new_fetch() {
        let client = FakeClient::new(Reply::Forecast);
        let svc = service(client.clone(), 1);

        svc.summarize("Paris").await.unwrap();
        svc.summarize("Paris").await.unwrap();
        assert_eq!(client.calls(), 1);

        tokio::time::sleep(Duration::from_millis(1200)).await;

        svc.summarize("Paris").await.unwrap();
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_lookups_share_one_fetch() {
        let client = FakeClient::delayed(Reply::Forecast, Duration::from_millis(200));
        let svc = Arc::new(service(client.clone(), 1800));

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let svc = svc.clone();
                let city = if i % 2 == 0 { "Berlin" } else { "berlin" };
                tokio::spawn(async move { svc.summarize(city).await })
            })
            .collect();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(client.calls(), 1);
        assert!(results.windows(2).all(|w| w[0] == w[1]));

        let stats = svc.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 15);
    }

    #[tokio::test]
    async fn cache_never_exceeds_capacity() {
        let client = FakeClient::new(Reply::Forecast);
        let svc = service(client.clone(), 1800);

        for i in 0..250 {
            svc.summarize(&format!("city-{i}")).await.unwrap();
        }
        svc.cache.run_pending_tasks().await;

        assert_eq!(client.calls(), 250);
        assert!(svc.cache.entry_count() <= 100);
        assert!(svc.stats().entries <= 100);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_failures_share_one_fetch() {
        let client = FakeClient::delayed(Reply::Down, Duration::from_millis(200));
        let svc = Arc::new(service(client.clone(), 1800));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let svc = svc.clone();
                tokio::spawn(async move { svc.summarize("Madrid").await })
            })
            .collect();

        for handle in handles {
            let err = handle.await.unwrap().unwrap_err();
            assert!(matches!(err.fetch_error(), FetchError::ServiceUnavailable));
        }

        assert_eq!(client.calls(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn different_cities_are_not_serialized() {
        let client = FakeClient::delayed(Reply::Forecast, Duration::from_millis(300));
        let svc = Arc::new(service(client.clone(), 1800));

        let started = std::time::Instant::now();
        let (a, b, c) = tokio::join!(
            svc.summarize("Tokyo"),
            svc.summarize("Osaka"),
            svc.summarize("Kyoto"),
        );
        a.unwrap();
        b.unwrap();
        c.unwrap();

        assert_eq!(client.calls(), 3);
        assert!(started.elapsed() < Duration::from_millis(800));
    }
}
