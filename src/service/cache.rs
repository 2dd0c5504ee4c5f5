use super::{FittedForecast, ServiceSettings};
use crate::core::{HolidayCalendar, TimeSeriesData};
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Bumped whenever the fingerprint layout changes.
const FINGERPRINT_VERSION: &[u8] = b"oilseer-fit-v1";

/// Fits kept when no capacity is configured: only the latest history.
pub const DEFAULT_CAPACITY: usize = 1;

/// Fitted models keyed by the fingerprint of their inputs.
///
/// Entries are inserted whole and never mutated, so a reader either sees a
/// complete fit or nothing. At most `capacity` fits are held; inserting past
/// that evicts the least recently used one, so a service fed a growing
/// history keeps only the newest fits.
pub struct FitCache<M> {
    entries: DashMap<String, Arc<FittedForecast<M>>>,
    /// Keys from least to most recently used.
    recency: Mutex<VecDeque<String>>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl<M> FitCache<M> {
    /// A cache holding at most `capacity` fits (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: DashMap::new(),
            recency: Mutex::new(VecDeque::with_capacity(capacity + 1)),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    fn recency(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.recency.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up a fit, counting the hit or miss.
    pub fn get(&self, key: &str) -> Option<Arc<FittedForecast<M>>> {
        let found = self.entries.get(key).map(|entry| Arc::clone(entry.value()));
        match found {
            Some(fitted) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                let mut recency = self.recency();
                if let Some(pos) = recency.iter().position(|k| k == key) {
                    if let Some(k) = recency.remove(pos) {
                        recency.push_back(k);
                    }
                }
                Some(fitted)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a fit under its fingerprint, evicting the least recently used
    /// fits beyond capacity.
    pub fn insert(&self, fitted: Arc<FittedForecast<M>>) {
        let key = fitted.fingerprint.clone();
        let mut recency = self.recency();
        recency.retain(|k| *k != key);
        recency.push_back(key.clone());
        self.entries.insert(key, fitted);

        while recency.len() > self.capacity {
            let Some(stale) = recency.pop_front() else {
                break;
            };
            self.entries.remove(&stale);
            self.evictions.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(fingerprint = %&stale[..stale.len().min(12)], "evicted stale fit");
        }
    }

    /// Drop every cached fit. Returns how many were removed.
    pub fn invalidate(&self) -> usize {
        let mut recency = self.recency();
        let removed = self.entries.len();
        self.entries.clear();
        recency.clear();
        removed
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }
}

impl<M> Default for FitCache<M> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// SHA-256 over everything a fit depends on: the series, the holiday
/// dates, the holiday window, the horizon and the model tag.
pub fn fingerprint(
    series: &TimeSeriesData,
    holidays: &HolidayCalendar,
    settings: &ServiceSettings,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(FINGERPRINT_VERSION);

    hasher.update((series.len() as u64).to_le_bytes());
    for obs in series.observations() {
        hasher.update(obs.date.to_string().as_bytes());
        hasher.update(obs.value.to_bits().to_le_bytes());
    }

    hasher.update((holidays.len() as u64).to_le_bytes());
    for date in holidays.dates() {
        hasher.update(date.to_string().as_bytes());
    }

    hasher.update(settings.holiday_name.as_bytes());
    hasher.update([0]);
    hasher.update(settings.lower_window.to_le_bytes());
    hasher.update(settings.upper_window.to_le_bytes());
    hasher.update((settings.horizon_days as u64).to_le_bytes());
    hasher.update(settings.model_tag.as_bytes());

    hex::encode(hasher.finalize())
}
