//! Per-User Scheduling Overrides
//!
//! Holiday-day assignments and bulk time-setting assignment.

use super::ApiClient;
use crate::error::ClientResult;
use crate::model::HolidaySettings;
use serde::Serialize;

/// Bulk assignment of a time-window override to a set of users.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkTimeAssignment {
    pub user_ids: Vec<u64>,
    pub check_in_time: String,
    pub check_out_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tolerance_minutes: Option<u32>,
}

impl ApiClient {
    /// List every user's holiday assignment.
    pub async fn list_holiday_settings(&self) -> ClientResult<Vec<HolidaySettings>> {
        self.get_json("/api/user-holiday-settings").await
    }

    /// Create or replace one user's holiday assignment.
    pub async fn save_holiday_settings(&self, settings: &HolidaySettings) -> ClientResult<()> {
        let _: serde_json::Value = self
            .post_json("/api/user-holiday-settings", settings)
            .await?;
        Ok(())
    }

    /// Remove one user's holiday assignment. Destructive; callers
    /// confirm before invoking.
    pub async fn delete_holiday_settings(&self, user_id: u64) -> ClientResult<()> {
        self.delete_unit(&format!("/api/user-holiday-settings/{}", user_id))
            .await
    }

    /// Assign a time-window override to many users at once.
    pub async fn bulk_assign_time_settings(
        &self,
        assignment: &BulkTimeAssignment,
    ) -> ClientResult<()> {
        let _: serde_json::Value = self
            .post_json("/api/user-time-settings/bulk-assign", assignment)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bulk_assignment_wire_shape() {
        let assignment = BulkTimeAssignment {
            user_ids: vec![1, 2, 3],
            check_in_time: "08:00".into(),
            check_out_time: "17:00".into(),
            tolerance_minutes: None,
        };
        let value = serde_json::to_value(&assignment).unwrap();
        assert_eq!(value["userIds"], serde_json::json!([1, 2, 3]));
        assert!(value.as_object().unwrap().get("toleranceMinutes").is_none());
    }
}
