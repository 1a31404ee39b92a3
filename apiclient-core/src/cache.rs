use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use crate::model::{ExchangeRate, PriceQuote, WeatherReport};

/// Query kind plus its normalized parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Price { currency: String },
    Weather { city: String },
    ExchangeRate { from: String, to: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cached {
    Price(PriceQuote),
    Weather(WeatherReport),
    ExchangeRate(ExchangeRate),
}

struct Entry {
    value: Cached,
    expires_at: Instant,
}

/// In-memory TTL cache of successful lookups. With no TTL it stores nothing.
pub struct ResponseCache {
    ttl: Option<Duration>,
    entries: Mutex<HashMap<CacheKey, Entry>>,
}

impl ResponseCache {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<Cached> {
        self.ttl?;
        let mut entries = self.entries();

        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: CacheKey, value: Cached) {
        let Some(ttl) = self.ttl else { return };
        let entry = Entry {
            value,
            expires_at: Instant::now() + ttl,
        };

        self.entries().insert(key, entry);
    }

    /// Number of entries that have not expired yet.
    pub fn len(&self) -> usize {
        let mut entries = self.entries();
        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at > now);
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<CacheKey, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.entries().len())
            .finish()
    }
}
