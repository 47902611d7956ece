//! Visit recorder
//!
//! Appends page-view records to the capped, time-bounded log. Recording is
//! best-effort: storage and geolocation failures are logged and swallowed so
//! a failed append never disrupts the calling page.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::analytics::geo::{GeoLocation, GeoResolver};
use crate::analytics::models::{PageView, VisitLog, STORAGE_KEY};
use crate::store::KeyValueStore;

pub struct VisitRecorder {
    store: Arc<dyn KeyValueStore>,
    primary: Arc<dyn GeoResolver>,
    fallback: Arc<dyn GeoResolver>,
    /// Serializes the load-mutate-save cycle so overlapping recordings
    /// cannot overwrite each other's appends (single-writer discipline).
    write_lock: Mutex<()>,
}

impl VisitRecorder {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        primary: Arc<dyn GeoResolver>,
        fallback: Arc<dyn GeoResolver>,
    ) -> Self {
        Self {
            store,
            primary,
            fallback,
            write_lock: Mutex::new(()),
        }
    }

    /// Record one page view. Never returns an error; each call is an
    /// independent event (no deduplication, no retry).
    pub async fn record_visit(&self, page: &str) {
        // Resolve geolocation outside the write lock: it is the only
        // suspending step and must not serialize against other writers.
        let geo = self.resolve_geo().await;
        let now = chrono::Utc::now().timestamp_millis();

        let _guard = self.write_lock.lock().await;

        let stored = match self.store.get(STORAGE_KEY).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!("failed to read visit log, treating as empty: {e}");
                None
            }
        };

        let mut log = VisitLog::decode(stored, now);

        if log.cleanup(now) {
            debug!(remaining = log.page_views.len(), "retention sweep completed");
        }

        log.append(PageView {
            page: page.to_string(),
            timestamp: now,
            country: Some(geo.country),
            city: Some(geo.city),
        });

        match log.encode() {
            Ok(encoded) => {
                if let Err(e) = self.store.put(STORAGE_KEY, &encoded).await {
                    warn!("failed to persist visit log, dropping this visit: {e}");
                }
            }
            Err(e) => {
                warn!("failed to serialize visit log, dropping this visit: {e}");
            }
        }
    }

    async fn resolve_geo(&self) -> GeoLocation {
        match self.primary.resolve().await {
            Ok(geo) => geo,
            Err(e) => {
                debug!("geolocation lookup failed, using synthetic fallback: {e}");
                match self.fallback.resolve().await {
                    Ok(geo) => geo,
                    Err(e) => {
                        // The synthetic resolver is infallible in practice
                        warn!("fallback geolocation failed: {e}");
                        GeoLocation {
                            country: crate::analytics::geo::DEFAULT_COUNTRY.to_string(),
                            city: crate::analytics::geo::UNKNOWN_CITY.to_string(),
                        }
                    }
                }
            }
        }
    }
}
