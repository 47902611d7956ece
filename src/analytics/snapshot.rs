//! Snapshot aggregation
//!
//! Derives the read-only dashboard summary from the persisted log:
//! time-windowed visit counts, an approximate unique-visitor count via
//! session keys, top pages, top countries, and the recent-visitor listing.
//! Aggregation is a pure function of the log and the current time; it never
//! mutates storage and never fails (malformed storage reads as empty).

use chrono::{DateTime, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::warn;

use crate::analytics::models::{PageView, VisitLog, STORAGE_KEY};
use crate::store::KeyValueStore;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;
const TOP_LIMIT: usize = 5;
const RECENT_LIMIT: usize = 20;
const DATE_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Rollup for one time window. Visits and page views are the same figure in
/// this model; there is no separate "visit" event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowStats {
    pub visits: usize,
    pub page_views: usize,
    pub unique_visitors: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageCount {
    pub page: String,
    pub views: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryShare {
    pub country: String,
    pub visits: u64,
    /// Share of country-tagged month views, one decimal place
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentVisitor {
    /// Display sequence number, 1 = most recent
    pub id: usize,
    pub country: String,
    pub city: String,
    pub page: String,
    /// Localized "dd/mm/yyyy HH:MM" rendering of the visit time
    pub date: String,
}

/// Point-in-time summary of the visit log, recomputed on every call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    pub today: WindowStats,
    pub week: WindowStats,
    pub month: WindowStats,
    pub top_pages: Vec<PageCount>,
    pub top_countries: Vec<CountryShare>,
    pub recent_users: Vec<RecentVisitor>,
}

/// Build the snapshot from a log and a reference time.
///
/// Window boundaries: today = local midnight of `now`, week = now - 7 days,
/// month = now - 30 days. The timezone of `now` also drives the display
/// formatting of recent-visitor timestamps.
pub fn build_snapshot<Tz>(log: &VisitLog, now: DateTime<Tz>) -> AnalyticsSnapshot
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let now_ms = now.timestamp_millis();
    let today_start = local_midnight_ms(&now).unwrap_or(now_ms - DAY_MS);
    let week_start = now_ms - 7 * DAY_MS;
    let month_start = now_ms - 30 * DAY_MS;

    let in_window = |start: i64| -> Vec<&PageView> {
        log.page_views
            .iter()
            .filter(|pv| pv.timestamp >= start)
            .collect()
    };

    let today_views = in_window(today_start);
    let week_views = in_window(week_start);
    let month_views = in_window(month_start);

    let mut top_pages = top_pages(&month_views);
    if top_pages.is_empty() {
        top_pages.push(PageCount {
            page: "/".to_string(),
            views: 0,
        });
    }

    let mut top_countries = top_countries(&month_views);
    if top_countries.is_empty() {
        top_countries.push(CountryShare {
            country: "FR".to_string(),
            visits: 0,
            percent: 0.0,
        });
    }

    AnalyticsSnapshot {
        today: window_stats(&today_views),
        week: window_stats(&week_views),
        month: window_stats(&month_views),
        top_pages,
        top_countries,
        recent_users: recent_users(log, &now),
    }
}

fn local_midnight_ms<Tz: TimeZone>(now: &DateTime<Tz>) -> Option<i64> {
    let midnight = now.date_naive().and_time(NaiveTime::MIN);
    now.timezone()
        .from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.timestamp_millis())
}

fn window_stats(views: &[&PageView]) -> WindowStats {
    let sessions: HashSet<_> = views.iter().map(|pv| pv.session_key()).collect();
    WindowStats {
        visits: views.len(),
        page_views: views.len(),
        unique_visitors: sessions.len(),
    }
}

/// Frequency count preserving first-seen order, then a stable sort by count
/// descending — ties keep first-seen order.
fn ranked_counts<'a, I>(keys: I) -> Vec<(String, u64)>
where
    I: Iterator<Item = &'a str>,
{
    let mut counts: Vec<(String, u64)> = Vec::new();
    let mut index: HashMap<&'a str, usize> = HashMap::new();

    for key in keys {
        match index.get(key) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(key, counts.len());
                counts.push((key.to_string(), 1));
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(TOP_LIMIT);
    counts
}

fn top_pages(month_views: &[&PageView]) -> Vec<PageCount> {
    ranked_counts(month_views.iter().map(|pv| pv.page.as_str()))
        .into_iter()
        .map(|(page, views)| PageCount { page, views })
        .collect()
}

fn top_countries(month_views: &[&PageView]) -> Vec<CountryShare> {
    let tagged = month_views.iter().filter_map(|pv| pv.country.as_deref());
    let ranked = ranked_counts(tagged);

    let total: u64 = month_views
        .iter()
        .filter(|pv| pv.country.is_some())
        .count() as u64;
    let total = total.max(1);

    ranked
        .into_iter()
        .map(|(country, visits)| CountryShare {
            country,
            visits,
            percent: (visits as f64 * 1000.0 / total as f64).round() / 10.0,
        })
        .collect()
}

fn recent_users<Tz>(log: &VisitLog, now: &DateTime<Tz>) -> Vec<RecentVisitor>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let located: Vec<&PageView> = log
        .page_views
        .iter()
        .filter(|pv| pv.country.is_some() && pv.city.is_some())
        .collect();

    let start = located.len().saturating_sub(RECENT_LIMIT);
    located[start..]
        .iter()
        .rev()
        .enumerate()
        .map(|(i, pv)| RecentVisitor {
            id: i + 1,
            country: pv.country.clone().unwrap_or_default(),
            city: pv.city.clone().unwrap_or_default(),
            page: pv.page.clone(),
            date: format_visit_time(now, pv.timestamp),
        })
        .collect()
}

fn format_visit_time<Tz>(now: &DateTime<Tz>, timestamp: i64) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    match now.timezone().timestamp_millis_opt(timestamp).earliest() {
        Some(dt) => dt.format(DATE_FORMAT).to_string(),
        None => String::new(),
    }
}

/// Read side of the analytics module: loads whatever is currently stored
/// (no pruning) and derives the snapshot for the server's local time.
pub struct SnapshotService {
    store: Arc<dyn KeyValueStore>,
}

impl SnapshotService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Never fails: a storage read or parse failure yields the all-zero
    /// default snapshot.
    pub async fn snapshot(&self) -> AnalyticsSnapshot {
        let now = chrono::Local::now();
        let now_ms = now.timestamp_millis();

        let stored = match self.store.get(STORAGE_KEY).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!("failed to read visit log for snapshot, treating as empty: {e}");
                None
            }
        };

        let log = VisitLog::decode(stored, now_ms);
        build_snapshot(&log, now)
    }
}
