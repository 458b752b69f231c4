// ABOUTME: Push-subscription event payload delivered by the platform on activity changes
// ABOUTME: Parsing is strict about required fields and lenient about unknown aspect types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cadecalc contributors

use serde::{Deserialize, Serialize};

use crate::constants::webhook::OBJECT_TYPE_ACTIVITY;

/// Kind of change reported by an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectType {
    /// Object was created
    Create,
    /// Object was updated
    Update,
    /// Object was deleted
    Delete,
    /// Anything the platform adds later
    #[serde(other)]
    Unknown,
}

/// Inbound webhook event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// `activity` or `athlete`
    pub object_type: String,
    /// Activity or athlete id
    pub object_id: u64,
    /// Kind of change
    pub aspect_type: AspectType,
    /// Athlete that owns the object
    pub owner_id: u64,
    /// Push subscription that produced the event
    #[serde(default)]
    pub subscription_id: Option<u64>,
    /// Unix seconds when the change happened
    #[serde(default)]
    pub event_time: Option<i64>,
    /// Changed fields for update events
    #[serde(default)]
    pub updates: Option<serde_json::Value>,
}

impl WebhookEvent {
    /// Parse a raw JSON body
    ///
    /// # Errors
    ///
    /// Returns the decode error when the body is not a valid event
    pub fn parse(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    /// Whether this event can lead to a replacement
    #[must_use]
    pub fn is_activity_change(&self) -> bool {
        self.object_type == OBJECT_TYPE_ACTIVITY
            && matches!(self.aspect_type, AspectType::Create | AspectType::Update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_update_event() {
        let body = br#"{"aspect_type":"update","event_time":1516126040,"object_id":1360128428,
            "object_type":"activity","owner_id":134815,"subscription_id":120475,
            "updates":{"title":"Messy"}}"#;
        let event = WebhookEvent::parse(body).unwrap();
        assert_eq!(event.aspect_type, AspectType::Update);
        assert_eq!(event.object_id, 1_360_128_428);
        assert!(event.is_activity_change());
    }

    #[test]
    fn test_delete_and_athlete_events_are_not_activity_changes() {
        let delete = WebhookEvent::parse(
            br#"{"aspect_type":"delete","object_id":1,"object_type":"activity","owner_id":2}"#,
        )
        .unwrap();
        assert!(!delete.is_activity_change());

        let athlete = WebhookEvent::parse(
            br#"{"aspect_type":"update","object_id":2,"object_type":"athlete","owner_id":2}"#,
        )
        .unwrap();
        assert!(!athlete.is_activity_change());
    }

    #[test]
    fn test_unknown_aspect_type_parses() {
        let event = WebhookEvent::parse(
            br#"{"aspect_type":"archive","object_id":1,"object_type":"activity","owner_id":2}"#,
        )
        .unwrap();
        assert_eq!(event.aspect_type, AspectType::Unknown);
    }

    #[test]
    fn test_missing_owner_is_malformed() {
        assert!(WebhookEvent::parse(br#"{"object_type":"activity","object_id":1}"#).is_err());
    }
}
