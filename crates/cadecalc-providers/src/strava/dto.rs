// ABOUTME: Strava API response bodies and their conversion to domain models
// ABOUTME: Only the fields the replacement pipeline reads are declared
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cadecalc contributors

use serde::Deserialize;

use crate::core::UploadStatus;
use crate::models::Activity;

#[derive(Debug, Deserialize)]
pub(super) struct AthleteRef {
    pub id: u64,
}

/// `GET /activities/{id}`
#[derive(Debug, Deserialize)]
pub(super) struct StravaActivityResponse {
    pub id: u64,
    pub athlete: AthleteRef,
    pub name: String,
    #[serde(rename = "type")]
    pub activity_type: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub trainer: bool,
    #[serde(default)]
    pub commute: bool,
    pub start_date: String,
    #[serde(default)]
    pub average_cadence: Option<f64>,
}

impl From<StravaActivityResponse> for Activity {
    fn from(response: StravaActivityResponse) -> Self {
        Self {
            id: response.id,
            owner_id: response.athlete.id,
            activity_type: response.activity_type,
            name: response.name,
            description: response.description,
            trainer: response.trainer,
            commute: response.commute,
            start_date: response.start_date,
            average_cadence: response.average_cadence,
            gear_ratio: None,
        }
        .with_parsed_gear_ratio()
    }
}

/// `POST /uploads` and `GET /uploads/{id}`
#[derive(Debug, Deserialize)]
pub(super) struct StravaUploadResponse {
    pub id: u64,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub activity_id: Option<u64>,
}

impl StravaUploadResponse {
    pub fn upload_status(self) -> UploadStatus {
        match (self.error, self.activity_id) {
            (Some(error), _) if !error.is_empty() => UploadStatus::Error(error),
            (_, Some(activity_id)) => UploadStatus::Ready(activity_id),
            _ => UploadStatus::Pending,
        }
    }
}

/// `POST /oauth/token`
#[derive(Debug, Deserialize)]
pub(super) struct StravaTokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
    #[serde(default)]
    pub athlete: Option<AthleteRef>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_conversion_parses_gear_ratio() {
        let response: StravaActivityResponse = serde_json::from_str(
            r#"{"id": 9, "athlete": {"id": 3, "resource_state": 1}, "name": "Commute",
                "type": "Ride", "description": "44x16\r\nwet", "trainer": false,
                "commute": true, "start_date": "2024-05-01T07:00:00Z", "distance": 1234.5}"#,
        )
        .unwrap();
        let activity = Activity::from(response);
        assert_eq!(activity.owner_id, 3);
        assert!(activity.commute);
        assert_eq!(activity.gear_ratio.map(|g| (g.chainring, g.cog)), Some((44, 16)));
        assert!(!activity.has_cadence());
    }

    #[test]
    fn test_upload_status_mapping() {
        let pending: StravaUploadResponse =
            serde_json::from_str(r#"{"id": 1, "status": "Your activity is still being processed.", "error": null, "activity_id": null}"#)
                .unwrap();
        assert_eq!(pending.upload_status(), UploadStatus::Pending);

        let ready: StravaUploadResponse =
            serde_json::from_str(r#"{"id": 1, "status": "Your activity is ready.", "error": null, "activity_id": 77}"#)
                .unwrap();
        assert_eq!(ready.upload_status(), UploadStatus::Ready(77));

        let failed: StravaUploadResponse =
            serde_json::from_str(r#"{"id": 1, "error": "duplicate of activity 5", "activity_id": null}"#).unwrap();
        assert_eq!(
            failed.upload_status(),
            UploadStatus::Error("duplicate of activity 5".to_owned())
        );
    }
}
