// ABOUTME: Process-wide record of activity ids the pipeline has already handled
// ABOUTME: Injected behind a trait; the in-memory store lives only as long as the process
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cadecalc contributors

//! Event dedup tracking.
//!
//! The tracker is advisory: it suppresses redelivered webhooks and the
//! platform's event for an activity this service uploaded itself. After a
//! restart every id is unseen again.

use dashmap::DashSet;

/// Set of processed activity ids
pub trait DedupStore: Send + Sync {
    /// Whether `activity_id` was already handled
    fn seen(&self, activity_id: u64) -> bool;

    /// Record `activity_id` as handled
    fn mark_seen(&self, activity_id: u64);
}

/// Concurrent in-memory store
#[derive(Debug, Default)]
pub struct InMemoryDedupStore {
    ids: DashSet<u64>,
}

impl InMemoryDedupStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded ids
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether nothing was recorded yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl DedupStore for InMemoryDedupStore {
    fn seen(&self, activity_id: u64) -> bool {
        self.ids.contains(&activity_id)
    }

    fn mark_seen(&self, activity_id: u64) {
        self.ids.insert(activity_id);
    }
}

/// Ids with a delivery currently running
///
/// Acquiring returns a guard that releases the id when dropped.
#[derive(Debug, Default)]
pub struct InFlight {
    ids: DashSet<u64>,
}

/// Releases its id from [`InFlight`] on drop
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    owner: &'a InFlight,
    activity_id: u64,
}

impl InFlight {
    /// Claim `activity_id`; `None` if another delivery holds it
    pub fn try_acquire(&self, activity_id: u64) -> Option<InFlightGuard<'_>> {
        if !self.ids.insert(activity_id) {
            return None;
        }
        Some(InFlightGuard {
            owner: self,
            activity_id,
        })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.owner.ids.remove(&self.activity_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_flight_guard_releases_on_drop() {
        let in_flight = InFlight::default();
        let guard = in_flight.try_acquire(7).unwrap();
        assert!(in_flight.try_acquire(7).is_none());
        assert!(in_flight.try_acquire(8).is_some());
        drop(guard);
        assert!(in_flight.try_acquire(7).is_some());
    }
}
