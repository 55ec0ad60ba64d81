/* This file is part of Sovereign Seas
 *
 * Copyright (C) 2024-2026 Sovereign Seas developers
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

//! Ad impression and click tracking with fingerprint deduplication and
//! a per-site hourly cap. Rejections carry the HTTP status a tracking
//! endpoint answers with.

use std::{collections::HashSet, fmt};

use async_trait::async_trait;
use log::{debug, warn};
use smol::lock::Mutex;

use crate::{Error, Result};

/// Length of the deduplication and rate-limit window, in seconds
pub const WINDOW_SECS: u64 = 60 * 60;

/// Events accepted per campaign and site within one window
pub const MAX_EVENTS_PER_WINDOW: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Impression,
    Click,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Impression => write!(f, "IMPRESSION"),
            Self::Click => write!(f, "CLICK"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackRequest {
    pub kind: EventKind,
    pub campaign_id: String,
    pub ad_id: String,
    pub site_id: String,
    pub fingerprint: Option<String>,
}

/// A stored tracking event
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackedEvent {
    pub id: u64,
    pub request: TrackRequest,
    /// UNIX timestamp in seconds
    pub timestamp: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackReceipt {
    pub event_id: u64,
}

/// Why an event was not recorded
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TrackRejection {
    MissingField(&'static str),
    UnknownAd,
    Duplicate,
    RateLimited,
    StoreFailure(String),
}

impl TrackRejection {
    /// HTTP status code of the rejection
    pub fn status(&self) -> u16 {
        match self {
            Self::MissingField(_) => 400,
            Self::UnknownAd => 404,
            Self::Duplicate => 409,
            Self::RateLimited => 429,
            Self::StoreFailure(_) => 500,
        }
    }
}

impl fmt::Display for TrackRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "Missing required field: {field}"),
            Self::UnknownAd => write!(f, "Campaign or ad not found"),
            Self::Duplicate => write!(f, "Duplicate event"),
            Self::RateLimited => write!(f, "Rate limit exceeded"),
            Self::StoreFailure(e) => write!(f, "Failed to record event: {e}"),
        }
    }
}

/// Persistence behind the tracker
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn ad_exists(&self, campaign_id: &str, ad_id: &str) -> Result<bool>;

    /// Whether an event with this kind, target and fingerprint was stored
    /// at or after `since`.
    async fn has_fingerprint(&self, request: &TrackRequest, fingerprint: &str, since: u64)
        -> Result<bool>;

    /// Events stored for a campaign and site at or after `since`.
    async fn count_since(&self, campaign_id: &str, site_id: &str, since: u64) -> Result<usize>;

    async fn insert(&self, request: TrackRequest, timestamp: u64) -> Result<u64>;
}

#[derive(Default)]
struct MemoryState {
    ads: HashSet<(String, String)>,
    events: Vec<TrackedEvent>,
    last_id: u64,
}

/// [`EventStore`] kept in process memory. Events that fell out of the
/// window are dropped on insert.
#[derive(Default)]
pub struct MemoryEventStore {
    state: Mutex<MemoryState>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register_ad(&self, campaign_id: &str, ad_id: &str) {
        self.state.lock().await.ads.insert((campaign_id.to_string(), ad_id.to_string()));
    }

    /// Events still inside the window of the latest insert
    pub async fn events(&self) -> Vec<TrackedEvent> {
        self.state.lock().await.events.clone()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn ad_exists(&self, campaign_id: &str, ad_id: &str) -> Result<bool> {
        let key = (campaign_id.to_string(), ad_id.to_string());
        Ok(self.state.lock().await.ads.contains(&key))
    }

    async fn has_fingerprint(
        &self,
        request: &TrackRequest,
        fingerprint: &str,
        since: u64,
    ) -> Result<bool> {
        let state = self.state.lock().await;
        Ok(state.events.iter().any(|e| {
            e.timestamp >= since &&
                e.request.kind == request.kind &&
                e.request.campaign_id == request.campaign_id &&
                e.request.ad_id == request.ad_id &&
                e.request.site_id == request.site_id &&
                e.request.fingerprint.as_deref() == Some(fingerprint)
        }))
    }

    async fn count_since(&self, campaign_id: &str, site_id: &str, since: u64) -> Result<usize> {
        let state = self.state.lock().await;
        Ok(state
            .events
            .iter()
            .filter(|e| {
                e.timestamp >= since &&
                    e.request.campaign_id == campaign_id &&
                    e.request.site_id == site_id
            })
            .count())
    }

    async fn insert(&self, request: TrackRequest, timestamp: u64) -> Result<u64> {
        let mut state = self.state.lock().await;
        let since = timestamp.saturating_sub(WINDOW_SECS);
        state.events.retain(|e| e.timestamp >= since);

        state.last_id += 1;
        let id = state.last_id;
        state.events.push(TrackedEvent { id, request, timestamp });
        Ok(id)
    }
}

pub struct EventTracker<S: EventStore> {
    store: S,
    /// Held from the duplicate check until the event is stored
    admission: Mutex<()>,
}

fn store_failure(e: Error) -> TrackRejection {
    TrackRejection::StoreFailure(e.to_string())
}

impl<S: EventStore> EventTracker<S> {
    pub fn new(store: S) -> Self {
        Self { store, admission: Mutex::new(()) }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Record an event observed at UNIX time `now`.
    pub async fn track(
        &self,
        request: TrackRequest,
        now: u64,
    ) -> std::result::Result<TrackReceipt, TrackRejection> {
        for (field, value) in [
            ("campaignId", &request.campaign_id),
            ("adId", &request.ad_id),
            ("siteId", &request.site_id),
        ] {
            if value.trim().is_empty() {
                return Err(TrackRejection::MissingField(field))
            }
        }

        let known = self
            .store
            .ad_exists(&request.campaign_id, &request.ad_id)
            .await
            .map_err(store_failure)?;
        if !known {
            return Err(TrackRejection::UnknownAd)
        }

        let since = now.saturating_sub(WINDOW_SECS);
        let _admission = self.admission.lock().await;

        if let Some(fingerprint) = request.fingerprint.as_deref().filter(|f| !f.is_empty()) {
            if self
                .store
                .has_fingerprint(&request, fingerprint, since)
                .await
                .map_err(store_failure)?
            {
                debug!(
                    target: "track::track",
                    "Duplicate {} for ad {}", request.kind, request.ad_id,
                );
                return Err(TrackRejection::Duplicate)
            }
        }

        let recent = self
            .store
            .count_since(&request.campaign_id, &request.site_id, since)
            .await
            .map_err(store_failure)?;
        if recent >= MAX_EVENTS_PER_WINDOW {
            warn!(
                target: "track::track",
                "Rate limit hit for campaign {} on site {}", request.campaign_id, request.site_id,
            );
            return Err(TrackRejection::RateLimited)
        }

        let event_id = self.store.insert(request, now).await.map_err(store_failure)?;
        Ok(TrackReceipt { event_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: u64 = 1_700_000_000;

    fn request(fingerprint: Option<&str>) -> TrackRequest {
        TrackRequest {
            kind: EventKind::Impression,
            campaign_id: "c1".to_string(),
            ad_id: "a1".to_string(),
            site_id: "s1".to_string(),
            fingerprint: fingerprint.map(String::from),
        }
    }

    fn tracker() -> EventTracker<MemoryEventStore> {
        let store = MemoryEventStore::new();
        smol::block_on(store.register_ad("c1", "a1"));
        EventTracker::new(store)
    }

    #[test]
    fn duplicate_within_window() {
        smol::block_on(async {
            let tracker = tracker();
            let first = tracker.track(request(Some("fp")), NOW).await.unwrap();
            assert_eq!(first.event_id, 1);

            let second = tracker.track(request(Some("fp")), NOW + 60).await.unwrap_err();
            assert_eq!(second, TrackRejection::Duplicate);
            assert_eq!(second.status(), 409);

            // A click is a different event
            let mut click = request(Some("fp"));
            click.kind = EventKind::Click;
            assert!(tracker.track(click, NOW + 60).await.is_ok());

            // Outside the window it counts again
            assert!(tracker.track(request(Some("fp")), NOW + WINDOW_SECS + 1).await.is_ok());
        });
    }

    #[test]
    fn anonymous_events_are_not_deduplicated() {
        smol::block_on(async {
            let tracker = tracker();
            assert!(tracker.track(request(None), NOW).await.is_ok());
            assert!(tracker.track(request(None), NOW).await.is_ok());
            assert_eq!(tracker.store().events().await.len(), 2);
        });
    }

    #[test]
    fn validation_and_lookup() {
        smol::block_on(async {
            let tracker = tracker();

            let mut missing = request(None);
            missing.site_id = String::new();
            let err = tracker.track(missing, NOW).await.unwrap_err();
            assert_eq!(err, TrackRejection::MissingField("siteId"));
            assert_eq!(err.status(), 400);

            let mut unknown = request(None);
            unknown.ad_id = "a2".to_string();
            assert_eq!(tracker.track(unknown, NOW).await.unwrap_err().status(), 404);
        });
    }

    #[test]
    fn hourly_cap_per_campaign_and_site() {
        smol::block_on(async {
            let tracker = tracker();
            for i in 0..MAX_EVENTS_PER_WINDOW {
                let fingerprint = format!("fp{i}");
                assert!(tracker.track(request(Some(&fingerprint)), NOW).await.is_ok());
            }

            let err = tracker.track(request(None), NOW).await.unwrap_err();
            assert_eq!(err.status(), 429);

            // Other sites have their own budget
            let mut other = request(None);
            other.site_id = "s2".to_string();
            assert!(tracker.track(other, NOW).await.is_ok());

            // And the window slides
            assert!(tracker.track(request(None), NOW + WINDOW_SECS + 1).await.is_ok());
        });
    }

    #[test]
    fn concurrent_duplicates_store_once() {
        let tracker = tracker();
        let results = smol::block_on(async {
            let first = tracker.track(request(Some("fp")), NOW);
            let second = tracker.track(request(Some("fp")), NOW);
            smol::future::zip(first, second).await
        });

        let rejected: Vec<_> = [results.0, results.1].into_iter().filter_map(|r| r.err()).collect();
        assert_eq!(rejected, vec![TrackRejection::Duplicate]);
        assert_eq!(smol::block_on(tracker.store().events()).len(), 1);
    }

    #[test]
    fn expired_events_are_pruned() {
        smol::block_on(async {
            let tracker = tracker();
            assert_eq!(tracker.track(request(None), NOW).await.unwrap().event_id, 1);
            assert_eq!(tracker.track(request(None), NOW + 10).await.unwrap().event_id, 2);

            let late = tracker.track(request(None), NOW + WINDOW_SECS + 5).await.unwrap();
            assert_eq!(late.event_id, 3);

            let kept: Vec<_> = tracker.store().events().await.iter().map(|e| e.id).collect();
            assert_eq!(kept, vec![2, 3]);
        });
    }
}
