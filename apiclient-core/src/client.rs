use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::{
    cache::{CacheKey, Cached, ResponseCache},
    config::ClientConfig,
    error::{AttemptError, LookupError, SourceFailure},
    http::HttpFetcher,
    model::{ExchangeRate, PriceQuote, WeatherReport},
    provider::{ProviderId, Source, exchange, price, weather},
    retry::RetryPolicy,
    stats::{Statistics, Stats},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueryKind {
    Price,
    Weather,
    ExchangeRate,
}

/// First value that passed a query's validity check.
struct Hit<T> {
    value: T,
    provider: ProviderId,
    elapsed: Duration,
}

/// Queries public data providers in priority order, falling back to the next
/// source when one fails.
///
/// Every query method returns either a normalized result or a
/// [`LookupError`]; transport problems never escape as panics.
#[derive(Debug)]
pub struct ApiClient {
    config: ClientConfig,
    fetcher: HttpFetcher,
    stats: Arc<Stats>,
    cache: ResponseCache,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Self {
        let stats = Arc::new(Stats::default());
        let fetcher = HttpFetcher::new(config.timeout(), stats.clone());
        let cache = ResponseCache::new(config.cache_ttl());

        info!(
            timeout_secs = config.timeout_secs,
            max_retries = config.max_retries,
            "api client created"
        );

        Self {
            config,
            fetcher,
            stats,
            cache,
        }
    }

    /// Bitcoin price in `currency` (case-insensitive).
    pub async fn get_bitcoin_price(&self, currency: &str) -> Result<PriceQuote, LookupError> {
        let currency = currency.to_uppercase();
        info!(currency = %currency, "requesting bitcoin price");

        let key = CacheKey::Price {
            currency: currency.clone(),
        };
        if let Some(Cached::Price(quote)) = self.cache.get(&key) {
            debug!(currency = %currency, "bitcoin price served from cache");
            return Ok(quote);
        }

        let sources = price::sources(&self.config.endpoints, &currency);
        let outcome = self
            .first_valid(&sources, self.policy(QueryKind::Price), |provider, body| {
                let price = price::extract_price(provider, body, &currency);
                (price > 0.0).then_some(price)
            })
            .await;

        match outcome {
            Ok(hit) => {
                self.stats.record_success();
                let quote = PriceQuote {
                    price: hit.value,
                    currency,
                    source: hit.provider,
                    response_time: hit.elapsed,
                    fetched_at: Utc::now(),
                };
                self.cache.insert(key, Cached::Price(quote.clone()));
                Ok(quote)
            }
            Err(failures) => {
                self.stats.record_failure();
                warn!(currency = %currency, "all bitcoin price sources failed");
                Err(LookupError::Price { currency, failures })
            }
        }
    }

    /// Current weather for `city`. Known cities are tried against a
    /// coordinate-based provider first.
    pub async fn get_weather(&self, city: &str) -> Result<WeatherReport, LookupError> {
        info!(city, "requesting weather");

        let key = CacheKey::Weather {
            city: city.to_string(),
        };
        if let Some(Cached::Weather(report)) = self.cache.get(&key) {
            debug!(city, "weather served from cache");
            return Ok(report);
        }

        let sources = weather::sources(&self.config.endpoints, city);
        let outcome = self
            .first_valid(&sources, self.policy(QueryKind::Weather), weather::extract)
            .await;

        match outcome {
            Ok(hit) => {
                self.stats.record_success();
                let (temperature, description) = hit.value;
                let report = WeatherReport {
                    city: city.to_string(),
                    temperature,
                    description,
                    source: hit.provider,
                    response_time: hit.elapsed,
                    fetched_at: Utc::now(),
                };
                self.cache.insert(key, Cached::Weather(report.clone()));
                Ok(report)
            }
            Err(failures) => {
                self.stats.record_failure();
                warn!(city, "all weather sources failed");
                Err(LookupError::Weather {
                    city: city.to_string(),
                    failures,
                })
            }
        }
    }

    /// Rate to convert one unit of `from_currency` into `to_currency`.
    /// Both codes are uppercased.
    pub async fn get_exchange_rate(
        &self,
        from_currency: &str,
        to_currency: &str,
    ) -> Result<ExchangeRate, LookupError> {
        let from = from_currency.to_uppercase();
        let to = to_currency.to_uppercase();
        info!(from = %from, to = %to, "requesting exchange rate");

        let key = CacheKey::ExchangeRate {
            from: from.clone(),
            to: to.clone(),
        };
        if let Some(Cached::ExchangeRate(rate)) = self.cache.get(&key) {
            debug!(from = %from, to = %to, "exchange rate served from cache");
            return Ok(rate);
        }

        let sources = exchange::sources(&self.config.endpoints, &from, &to);
        let outcome = self
            .first_valid(&sources, self.policy(QueryKind::ExchangeRate), |provider, body| {
                let rate = exchange::extract_rate(provider, body, &to);
                (rate > 0.0).then_some(rate)
            })
            .await;

        match outcome {
            Ok(hit) => {
                self.stats.record_success();
                let rate = ExchangeRate {
                    from_currency: from,
                    to_currency: to,
                    rate: hit.value,
                    source: hit.provider,
                    response_time: hit.elapsed,
                    fetched_at: Utc::now(),
                };
                self.cache.insert(key, Cached::ExchangeRate(rate.clone()));
                Ok(rate)
            }
            Err(failures) => {
                self.stats.record_failure();
                warn!(from = %from, to = %to, "all exchange rate sources failed");
                Err(LookupError::ExchangeRate {
                    from_currency: from,
                    to_currency: to,
                    failures,
                })
            }
        }
    }

    /// Whether the probe endpoint is reachable. Swallows every error.
    pub async fn test_connection(&self) -> bool {
        self.fetcher
            .is_reachable(&self.config.endpoints.probe, self.config.probe_timeout())
            .await
    }

    pub fn statistics(&self) -> Statistics {
        self.stats.snapshot(self.cache.len())
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
        info!("cache cleared");
    }

    /// Price lookups always retry with backoff; the other queries only when
    /// `uniform_retries` is set.
    fn policy(&self, kind: QueryKind) -> RetryPolicy {
        let backoff = RetryPolicy::Backoff {
            max_retries: self.config.max_retries,
            base: self.config.backoff_base(),
        };

        match kind {
            QueryKind::Price => backoff,
            QueryKind::Weather | QueryKind::ExchangeRate if self.config.uniform_retries => backoff,
            QueryKind::Weather | QueryKind::ExchangeRate => RetryPolicy::Once,
        }
    }

    /// Walks `sources` in order, attempting each per `policy`, and returns the
    /// first value `extract` accepts. `extract` only sees non-empty bodies of
    /// successful responses.
    async fn first_valid<T, F>(
        &self,
        sources: &[Source],
        policy: RetryPolicy,
        mut extract: F,
    ) -> Result<Hit<T>, Vec<SourceFailure>>
    where
        F: FnMut(ProviderId, &Map<String, Value>) -> Option<T>,
    {
        let mut failures = Vec::with_capacity(sources.len());

        for source in sources {
            let attempts = policy.attempts();
            let mut last_error = AttemptError::EmptyBody;

            for attempt in 0..attempts {
                let response = self.fetcher.get(&source.url, &source.params).await;

                last_error = match (&response.status, response.usable_body()) {
                    (Err(err), _) => err.clone(),
                    (Ok(()), None) => AttemptError::EmptyBody,
                    (Ok(()), Some(body)) => match extract(source.provider, body) {
                        Some(value) => {
                            info!(source = %source.provider, attempt, "query answered");
                            return Ok(Hit {
                                value,
                                provider: source.provider,
                                elapsed: response.elapsed,
                            });
                        }
                        None => AttemptError::InvalidValue,
                    },
                };

                debug!(
                    source = %source.provider,
                    attempt,
                    attempts,
                    error = %last_error,
                    "attempt failed"
                );

                if let Some(delay) = policy.delay_after(attempt) {
                    tokio::time::sleep(delay).await;
                }
            }

            warn!(source = %source.provider, attempts, error = %last_error, "source exhausted");
            failures.push(SourceFailure {
                provider: source.provider,
                attempts,
                last_error,
            });
        }

        Err(failures)
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

static DEFAULT_CLIENT: OnceLock<ApiClient> = OnceLock::new();

/// Process-wide client built from default settings on first use and never
/// torn down. Prefer owning an [`ApiClient`] and passing it where needed.
pub fn default_client() -> &'static ApiClient {
    DEFAULT_CLIENT.get_or_init(ApiClient::default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_asymmetry_is_default() {
        let client = ApiClient::default();

        assert!(matches!(
            client.policy(QueryKind::Price),
            RetryPolicy::Backoff { max_retries: 3, .. }
        ));
        assert_eq!(client.policy(QueryKind::Weather), RetryPolicy::Once);
        assert_eq!(client.policy(QueryKind::ExchangeRate), RetryPolicy::Once);
    }

    #[test]
    fn uniform_retries_apply_backoff_everywhere() {
        let client = ApiClient::new(ClientConfig {
            uniform_retries: true,
            max_retries: 2,
            ..ClientConfig::default()
        });

        let expected = RetryPolicy::Backoff {
            max_retries: 2,
            base: Duration::from_millis(500),
        };
        assert_eq!(client.policy(QueryKind::Weather), expected);
        assert_eq!(client.policy(QueryKind::ExchangeRate), expected);
    }

    #[test]
    fn fresh_client_reports_empty_statistics() {
        let stats = ApiClient::default().statistics();

        assert_eq!(stats.total_requests, 0);
        assert_eq!(stats.http_attempts, 0);
        assert_eq!(stats.success_rate, 0.0);
        assert_eq!(stats.cache_size, 0);
    }

    #[test]
    fn default_client_is_shared() {
        assert!(std::ptr::eq(default_client(), default_client()));
    }
}
