//! Attendance Operations
//!
//! Listing, the employee check-in/out action, and the global
//! time-window settings.

use super::ApiClient;
use crate::error::ClientResult;
use crate::model::{AttendanceRecord, CheckAction, TimeWindowSettings};
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Filter for attendance listings. Blank fields are omitted from the
/// query string.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ActionRequest<'a> {
    action: CheckAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    photo: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ActionResponse {
    #[serde(default)]
    message: Option<String>,
}

impl ApiClient {
    /// List attendance records, optionally filtered.
    pub async fn list_attendances(
        &self,
        filter: &AttendanceFilter,
    ) -> ClientResult<Vec<AttendanceRecord>> {
        self.get_json_query("/api/attendances", filter).await
    }

    /// List the calling employee's own records.
    pub async fn my_attendances(&self) -> ClientResult<Vec<AttendanceRecord>> {
        self.get_json("/api/attendances/me").await
    }

    /// Perform a check-in/break/check-out action, optionally attaching
    /// a capture photo (JPEG bytes, sent base64-encoded). Goes through
    /// the idempotent path so a timed-out submission retried by the
    /// client cannot double-record.
    pub async fn attendance_action(
        &self,
        action: CheckAction,
        photo_jpeg: Option<&[u8]>,
    ) -> ClientResult<Option<String>> {
        let encoded = photo_jpeg.map(|bytes| base64::engine::general_purpose::STANDARD.encode(bytes));
        let body = ActionRequest {
            action,
            photo: encoded.as_deref(),
        };

        let response: ActionResponse = self
            .post_idempotent("/api/attendances/action", &body)
            .await?;
        Ok(response.message)
    }

    /// Fetch the global time-window settings.
    pub async fn get_settings(&self) -> ClientResult<TimeWindowSettings> {
        self.get_json("/api/settings").await
    }

    /// Replace the global time-window settings.
    pub async fn update_settings(&self, settings: &TimeWindowSettings) -> ClientResult<()> {
        let _: serde_json::Value = self.post_json("/api/settings", settings).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_omits_blank_fields() {
        let filter = AttendanceFilter {
            start_date: Some("2026-08-01".into()),
            ..Default::default()
        };
        let value = serde_json::to_value(&filter).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert!(obj.contains_key("startDate"));
    }

    #[test]
    fn test_action_body_without_photo_has_no_photo_key() {
        let body = ActionRequest {
            action: CheckAction::CheckIn,
            photo: None,
        };
        let value = serde_json::to_value(&body).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert_eq!(obj["action"], "check_in");
    }

    #[test]
    fn test_action_body_with_photo() {
        let body = ActionRequest {
            action: CheckAction::CheckOut,
            photo: Some("aGVsbG8="),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["action"], "check_out");
        assert_eq!(value["photo"], "aGVsbG8=");
    }
}
