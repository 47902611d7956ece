//! Data models for the visit log

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Name of the single storage entry holding the serialized log
pub const STORAGE_KEY: &str = "warp-analytics";

/// Maximum number of page views retained in the log
pub const MAX_ENTRIES: usize = 1000;

/// Minimum interval between retention sweeps (24 hours)
pub const CLEANUP_INTERVAL_MS: i64 = 24 * 60 * 60 * 1000;

/// Retention window for page views (30 days)
pub const RETENTION_MS: i64 = 30 * 24 * 60 * 60 * 1000;

/// Width of a session time bucket (30 minutes)
pub const SESSION_BUCKET_MS: i64 = 30 * 60 * 1000;

/// One observed page visit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageView {
    /// Route path that was viewed (e.g. "/tools/bmi")
    pub page: String,

    /// Milliseconds since epoch, set at record time
    pub timestamp: i64,

    /// Coarse country code, best-effort and possibly synthetic
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    /// Coarse city name, same caveat
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

impl PageView {
    /// Heuristic identity surrogate: (country, city, 30-minute time bucket).
    ///
    /// Not identity-based — visitors sharing a geolocation bucket collapse
    /// into one key, and a session straddling a bucket boundary counts twice.
    /// The bucketing formula is kept stable for output compatibility.
    pub fn session_key(&self) -> (Option<&str>, Option<&str>, i64) {
        (
            self.country.as_deref(),
            self.city.as_deref(),
            self.timestamp.div_euclid(SESSION_BUCKET_MS),
        )
    }
}

/// The persisted aggregate: an append-only, capped, time-bounded log
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitLog {
    /// Insertion order = chronological order, at most MAX_ENTRIES
    pub page_views: Vec<PageView>,

    /// Timestamp of the last retention sweep
    pub last_cleanup: i64,
}

impl VisitLog {
    pub fn empty(now: i64) -> Self {
        Self {
            page_views: Vec::new(),
            last_cleanup: now,
        }
    }

    /// Tolerant decode of the stored blob. A missing entry or a parse
    /// failure yields the empty log; corruption is never surfaced.
    pub fn decode(stored: Option<String>, now: i64) -> Self {
        match stored {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(log) => log,
                Err(e) => {
                    warn!("failed to parse stored visit log, starting empty: {e}");
                    Self::empty(now)
                }
            },
            None => Self::empty(now),
        }
    }

    pub fn encode(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Lazy retention sweep, at most once per 24-hour window.
    ///
    /// Drops records older than 30 days, then truncates to the newest
    /// MAX_ENTRIES. Returns whether a sweep ran.
    pub fn cleanup(&mut self, now: i64) -> bool {
        if now - self.last_cleanup < CLEANUP_INTERVAL_MS {
            return false;
        }

        let cutoff = now - RETENTION_MS;
        self.page_views.retain(|pv| pv.timestamp > cutoff);
        self.truncate_to_cap();
        self.last_cleanup = now;
        true
    }

    /// Append one view, dropping the oldest entries past the cap
    pub fn append(&mut self, view: PageView) {
        self.page_views.push(view);
        self.truncate_to_cap();
    }

    fn truncate_to_cap(&mut self) {
        if self.page_views.len() > MAX_ENTRIES {
            let excess = self.page_views.len() - MAX_ENTRIES;
            self.page_views.drain(..excess);
        }
    }
}
