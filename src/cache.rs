//! TTL cache for dashboard data over a pluggable key-value backend.
//!
//! Entries persist the full success envelope plus their own save timestamp,
//! so a payload read back from storage is indistinguishable from a fresh
//! service response. Expired entries keep their payload available for error
//! fallback instead of being dropped on read.

use crate::bucket::TimeRange;
use crate::error::{DashboardError, Result};
use crate::schema::{
    CashFlowDataPoint, CashFlowResponse, ChartDataPoint, ChartDataResponse, MetricKind,
    UserPreferences,
};
use chrono::Utc;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

/// Storage keys, one entry per metric plus user preferences.
pub const CASH_FLOW_KEY: &str = "dashboard-cash-flow-data";
pub const PROFIT_KEY: &str = "dashboard-profit-data";
pub const EXPENSES_KEY: &str = "dashboard-expenses-data";
pub const REVENUE_KEY: &str = "dashboard-revenue-data";
pub const USER_PREFERENCES_KEY: &str = "dashboard-user-preferences";

const ALL_KEYS: [&str; 5] = [
    CASH_FLOW_KEY,
    PROFIT_KEY,
    EXPENSES_KEY,
    REVENUE_KEY,
    USER_PREFERENCES_KEY,
];

/// How long a cached entry stays fresh.
pub const CACHE_TTL_MS: i64 = 5 * 60 * 1000;

pub fn metric_key(metric: MetricKind) -> &'static str {
    match metric {
        MetricKind::Profit => PROFIT_KEY,
        MetricKind::Expenses => EXPENSES_KEY,
        MetricKind::Revenue => REVENUE_KEY,
    }
}

/// Key-value persistence underneath the cache store.
pub trait StorageBackend: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

impl<T: StorageBackend + ?Sized> StorageBackend for Arc<T> {
    fn read(&self, key: &str) -> Result<Option<String>> {
        self.as_ref().read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.as_ref().write(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.as_ref().remove(key)
    }
}

/// One JSON file per key under a root directory.
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Open a file store rooted at `root`, creating the directory if needed.
    ///
    /// If `root` is `None`, uses the platform cache directory.
    pub fn new(root: Option<PathBuf>) -> Result<Self> {
        let root = root.unwrap_or_else(Self::default_root);
        fs::create_dir_all(&root).map_err(|err| {
            DashboardError::Storage(format!(
                "Cannot create cache directory {}: {}",
                root.display(),
                err
            ))
        })?;
        Ok(Self { root })
    }

    /// Platform cache directory, with a relative fallback when the platform
    /// offers none.
    pub fn default_root() -> PathBuf {
        if let Some(cache_dir) = dirs::cache_dir() {
            cache_dir.join("financial-dashboard-data")
        } else {
            PathBuf::from(".financial-dashboard-cache")
        }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }
}

impl StorageBackend for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.entry_path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(DashboardError::Storage(format!(
                "Cannot read {}: {}",
                key, err
            ))),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        fs::write(self.entry_path(key), value).map_err(|err| {
            DashboardError::Storage(format!("Cannot write {}: {}", key, err))
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.entry_path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(DashboardError::Storage(format!(
                "Cannot remove {}: {}",
                key, err
            ))),
        }
    }
}

/// In-memory backend for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| DashboardError::Storage("Cache lock poisoned".to_string()))
    }
}

impl StorageBackend for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries()?.remove(key);
        Ok(())
    }
}

/// Outcome of a cache read.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup<T> {
    Fresh { data: T, time_range: TimeRange },
    Expired { data: T, time_range: TimeRange },
    Miss,
}

impl<T> CacheLookup<T> {
    /// Payload if the entry is still within its TTL.
    pub fn fresh(self) -> Option<(T, TimeRange)> {
        match self {
            CacheLookup::Fresh { data, time_range } => Some((data, time_range)),
            _ => None,
        }
    }

    /// Payload regardless of freshness, for error fallback.
    pub fn any(self) -> Option<(T, TimeRange)> {
        match self {
            CacheLookup::Fresh { data, time_range }
            | CacheLookup::Expired { data, time_range } => Some((data, time_range)),
            CacheLookup::Miss => None,
        }
    }
}

/// Persisted layout: the response envelope with the entry's save stamp
/// flattened alongside it.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CachedEntry<R> {
    cached_at: i64,
    #[serde(flatten)]
    response: R,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CachedStamp {
    cached_at: i64,
}

trait CachedPayload: DeserializeOwned {
    type Data;
    fn into_parts(self) -> (Self::Data, TimeRange);
}

impl CachedPayload for ChartDataResponse {
    type Data = Vec<ChartDataPoint>;

    fn into_parts(self) -> (Self::Data, TimeRange) {
        (self.data, self.metadata.time_range)
    }
}

impl CachedPayload for CashFlowResponse {
    type Data = Vec<CashFlowDataPoint>;

    fn into_parts(self) -> (Self::Data, TimeRange) {
        (self.data, self.metadata.time_range)
    }
}

/// TTL cache over a pluggable backend; freshness is judged per entry.
pub struct CacheStore {
    backend: Box<dyn StorageBackend>,
    ttl_ms: i64,
}

impl CacheStore {
    pub fn new(backend: Box<dyn StorageBackend>) -> Self {
        Self {
            backend,
            ttl_ms: CACHE_TTL_MS,
        }
    }

    /// Override the TTL, mainly for expiry tests.
    pub fn with_ttl(backend: Box<dyn StorageBackend>, ttl_ms: i64) -> Self {
        Self { backend, ttl_ms }
    }

    pub fn save_chart_data(
        &self,
        metric: MetricKind,
        data: &[ChartDataPoint],
        time_range: TimeRange,
    ) -> Result<()> {
        let response = ChartDataResponse::new(data.to_vec(), time_range);
        self.save_entry(metric_key(metric), response)
    }

    pub fn save_cash_flow_data(
        &self,
        data: &[CashFlowDataPoint],
        time_range: TimeRange,
    ) -> Result<()> {
        let response = CashFlowResponse::new(data.to_vec(), time_range);
        self.save_entry(CASH_FLOW_KEY, response)
    }

    pub fn load_chart_data(&self, metric: MetricKind) -> Result<CacheLookup<Vec<ChartDataPoint>>> {
        self.load_entry::<ChartDataResponse>(metric_key(metric), Utc::now().timestamp_millis())
    }

    pub fn load_cash_flow_data(&self) -> Result<CacheLookup<Vec<CashFlowDataPoint>>> {
        self.load_entry::<CashFlowResponse>(CASH_FLOW_KEY, Utc::now().timestamp_millis())
    }

    /// Whether the entry under `key` exists and is within its TTL.
    pub fn is_valid(&self, key: &str) -> bool {
        self.is_valid_at(key, Utc::now().timestamp_millis())
    }

    /// Remove every known entry. Safe to call repeatedly.
    pub fn clear(&self) -> Result<()> {
        debug!("Clearing all cached dashboard data");
        for key in ALL_KEYS {
            self.backend.remove(key)?;
        }
        Ok(())
    }

    pub fn save_user_preferences(&self, preferences: &UserPreferences) -> Result<()> {
        let raw = serde_json::to_string(preferences)?;
        self.backend.write(USER_PREFERENCES_KEY, &raw)
    }

    /// Preferences are not TTL bound; absent or malformed entries read as
    /// `None`.
    pub fn load_user_preferences(&self) -> Result<Option<UserPreferences>> {
        let raw = match self.backend.read(USER_PREFERENCES_KEY)? {
            Some(raw) => raw,
            None => return Ok(None),
        };

        match serde_json::from_str(&raw) {
            Ok(preferences) => Ok(Some(preferences)),
            Err(err) => {
                warn!("Discarding malformed user preferences: {}", err);
                let _ = self.backend.remove(USER_PREFERENCES_KEY);
                Ok(None)
            }
        }
    }

    fn save_entry<R: Serialize>(&self, key: &str, response: R) -> Result<()> {
        let entry = CachedEntry {
            cached_at: Utc::now().timestamp_millis(),
            response,
        };
        let raw = serde_json::to_string(&entry)?;
        self.backend.write(key, &raw)?;
        debug!("Cached {} ({} bytes)", key, raw.len());
        Ok(())
    }

    fn load_entry<R: CachedPayload>(
        &self,
        key: &str,
        now_ms: i64,
    ) -> Result<CacheLookup<R::Data>> {
        let raw = match self.backend.read(key)? {
            Some(raw) => raw,
            None => return Ok(CacheLookup::Miss),
        };

        let entry: CachedEntry<R> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(err) => {
                // A malformed entry is unrecoverable; drop it so the next
                // save starts clean.
                warn!("Removing malformed cache entry {}: {}", key, err);
                let _ = self.backend.remove(key);
                return Ok(CacheLookup::Miss);
            }
        };

        let (data, time_range) = entry.response.into_parts();
        if now_ms - entry.cached_at >= self.ttl_ms {
            debug!("Cache entry {} has expired", key);
            return Ok(CacheLookup::Expired { data, time_range });
        }
        Ok(CacheLookup::Fresh { data, time_range })
    }

    fn is_valid_at(&self, key: &str, now_ms: i64) -> bool {
        let raw = match self.backend.read(key) {
            Ok(Some(raw)) => raw,
            _ => return false,
        };

        match serde_json::from_str::<CachedStamp>(&raw) {
            Ok(stamp) => now_ms - stamp.cached_at < self.ttl_ms,
            Err(_) => false,
        }
    }

    #[cfg(test)]
    fn load_chart_data_at(
        &self,
        metric: MetricKind,
        now_ms: i64,
    ) -> Result<CacheLookup<Vec<ChartDataPoint>>> {
        self.load_entry::<ChartDataResponse>(metric_key(metric), now_ms)
    }
}
