//! Visit tracking and aggregation
//!
//! The write side appends page-view records (with best-effort geolocation)
//! to a capped, time-bounded log held under a single storage entry. The
//! read side derives a dashboard snapshot from whatever is currently stored.
//! Both sides are tolerant of missing or corrupt storage and never surface
//! errors to their callers.

pub mod geo;
pub mod models;
pub mod recorder;
pub mod snapshot;

pub use geo::{FixedGeoResolver, GeoLocation, GeoResolver, HttpGeoResolver, SyntheticGeoResolver};
pub use models::{PageView, VisitLog, MAX_ENTRIES, STORAGE_KEY};
pub use recorder::VisitRecorder;
pub use snapshot::{build_snapshot, AnalyticsSnapshot, SnapshotService};
