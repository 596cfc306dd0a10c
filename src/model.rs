//! Domain Model
//!
//! Wire types for the attendance backend and the device middleware,
//! decoded into tagged enums at the deserialization boundary so that
//! flag-priority rules live in exactly one place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================
// Attendance
// ============================================

/// One attendance record as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: u64,
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub user_name: Option<String>,
    pub date: String,
    #[serde(default)]
    pub check_in: Option<DateTime<Utc>>,
    #[serde(default)]
    pub check_out: Option<DateTime<Utc>>,
    #[serde(default)]
    pub break_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub break_end: Option<DateTime<Utc>>,
    /// Day-level status, e.g. "Hadir" (present) or "Izin" (on leave).
    #[serde(default)]
    pub status: Option<String>,
    /// Punctuality label for the check-in, e.g. "On Time" or "Late".
    #[serde(default)]
    pub check_in_status: Option<String>,
    #[serde(default)]
    pub check_out_status: Option<String>,
}

impl AttendanceRecord {
    /// Label shown for the record. The punctuality label wins when set;
    /// a record that only carries a day-level status (a present record
    /// with a check-in but no check-in status) gets that generic label.
    pub fn badge(&self) -> &str {
        if let Some(s) = self.check_in_status.as_deref() {
            if !s.is_empty() {
                return s;
            }
        }
        if let Some(s) = self.status.as_deref() {
            if !s.is_empty() {
                return s;
            }
        }
        if self.check_in.is_some() {
            "Hadir"
        } else {
            "Absent"
        }
    }
}

/// Check-in/out action performed by an employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckAction {
    CheckIn,
    BreakStart,
    BreakEnd,
    CheckOut,
}

// ============================================
// Status-change requests
// ============================================

/// Lifecycle of a status-change request. Pending is the only
/// non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestState {
    Pending,
    Approved,
    Rejected,
}

impl RequestState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestState::Pending)
    }
}

/// Admin decision on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    /// State the request ends in.
    pub fn resulting_state(&self) -> RequestState {
        match self {
            Decision::Approve => RequestState::Approved,
            Decision::Reject => RequestState::Rejected,
        }
    }

    pub fn as_wire(&self) -> &'static str {
        match self {
            Decision::Approve => "Approved",
            Decision::Reject => "Rejected",
        }
    }
}

/// A user-submitted request to change a recorded attendance status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    pub id: u64,
    pub attendance_id: u64,
    #[serde(default)]
    pub user_name: Option<String>,
    pub current_status: String,
    pub requested_status: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default = "pending_state")]
    pub state: RequestState,
    #[serde(default)]
    pub note: Option<String>,
}

fn pending_state() -> RequestState {
    RequestState::Pending
}

// ============================================
// Scan records
// ============================================

/// Biometric match method, decoded once from the wire flags by fixed
/// priority: face, then palm, then card, then finger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMethod {
    Face,
    Palm,
    Card,
    Finger,
    Unknown,
}

/// Outcome of a scan event. A set stranger flag overrides the result
/// code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanOutcome {
    Success,
    Failed,
    NoPermission,
    Stranger,
    Unknown,
}

impl ScanOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ScanOutcome::Success => "Success",
            ScanOutcome::Failed => "Failed",
            ScanOutcome::NoPermission => "No Permission",
            ScanOutcome::Stranger => "Stranger",
            ScanOutcome::Unknown => "Unknown",
        }
    }
}

/// Raw scan record as the middleware reports it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScanRecordWire {
    #[serde(default)]
    person_sn: Option<String>,
    #[serde(default)]
    person_name: Option<String>,
    #[serde(default)]
    scan_time: Option<String>,
    #[serde(default)]
    face_flag: u8,
    #[serde(default)]
    palm_flag: u8,
    #[serde(default)]
    card_flag: u8,
    #[serde(default)]
    finger_flag: u8,
    #[serde(default)]
    result_flag: u8,
    #[serde(default)]
    stranger_flag: u8,
}

/// One biometric-match event, with the flag soup already resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "ScanRecordWire")]
pub struct ScanRecord {
    pub person_sn: Option<String>,
    pub person_name: Option<String>,
    pub scan_time: Option<String>,
    pub method: ScanMethod,
    pub outcome: ScanOutcome,
}

impl From<ScanRecordWire> for ScanRecord {
    fn from(wire: ScanRecordWire) -> Self {
        let method = if wire.face_flag != 0 {
            ScanMethod::Face
        } else if wire.palm_flag != 0 {
            ScanMethod::Palm
        } else if wire.card_flag != 0 {
            ScanMethod::Card
        } else if wire.finger_flag != 0 {
            ScanMethod::Finger
        } else {
            ScanMethod::Unknown
        };

        let outcome = if wire.stranger_flag != 0 {
            ScanOutcome::Stranger
        } else {
            match wire.result_flag {
                1 => ScanOutcome::Success,
                2 => ScanOutcome::Failed,
                3 => ScanOutcome::NoPermission,
                _ => ScanOutcome::Unknown,
            }
        };

        ScanRecord {
            person_sn: wire.person_sn,
            person_name: wire.person_name,
            scan_time: wire.scan_time,
            method,
            outcome,
        }
    }
}

// ============================================
// Persons
// ============================================

/// A person enrolled on the device.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub person_sn: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub id_number: Option<String>,
}

// ============================================
// Settings
// ============================================

/// Global time-window configuration for check-in/out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindowSettings {
    pub check_in_time: String,
    pub check_out_time: String,
    pub tolerance_minutes: u32,
    pub break_duration_minutes: u32,
}

/// Per-user weekly holiday assignment. A day field is the 1-based day
/// number, or null when the slot is unused; blank form input maps to
/// null on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HolidaySettings {
    pub user_id: u64,
    pub day1: Option<u8>,
    pub day2: Option<u8>,
    pub day3: Option<u8>,
    pub day4: Option<u8>,
    pub day5: Option<u8>,
    pub day6: Option<u8>,
    pub day7: Option<u8>,
}

impl HolidaySettings {
    /// Build from raw form values; empty or unparsable strings become
    /// null slots.
    pub fn from_form(user_id: u64, days: [&str; 7]) -> Self {
        let parse = |s: &str| s.trim().parse::<u8>().ok();
        Self {
            user_id,
            day1: parse(days[0]),
            day2: parse(days[1]),
            day3: parse(days[2]),
            day4: parse(days[3]),
            day5: parse(days[4]),
            day6: parse(days[5]),
            day7: parse(days[6]),
        }
    }
}

// ============================================
// Reports
// ============================================

/// Per-employee performance score computed by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiReport {
    pub user_id: u64,
    pub name: String,
    pub score: f64,
    #[serde(default)]
    pub present_days: u32,
    #[serde(default)]
    pub late_days: u32,
    #[serde(default)]
    pub absent_days: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn present_record() -> AttendanceRecord {
        AttendanceRecord {
            id: 1,
            user_id: Some(7),
            user_name: Some("Siti".into()),
            date: "2026-08-27".into(),
            check_in: Some(Utc::now()),
            check_out: None,
            break_start: None,
            break_end: None,
            status: Some("Hadir".into()),
            check_in_status: None,
            check_out_status: None,
        }
    }

    #[test]
    fn test_badge_generic_when_no_checkin_status() {
        // Present record with a check-in but no punctuality label must
        // fall back to the day-level status, not an empty badge.
        let record = present_record();
        assert_eq!(record.badge(), "Hadir");
    }

    #[test]
    fn test_badge_prefers_checkin_status() {
        let mut record = present_record();
        record.check_in_status = Some("Late".into());
        assert_eq!(record.badge(), "Late");
    }

    #[test]
    fn test_badge_absent_without_anything() {
        let mut record = present_record();
        record.status = None;
        record.check_in = None;
        assert_eq!(record.badge(), "Absent");
    }

    #[test]
    fn test_scan_method_priority() {
        let record: ScanRecord = serde_json::from_str(
            r#"{"faceFlag": 1, "palmFlag": 1, "cardFlag": 1, "resultFlag": 1}"#,
        )
        .unwrap();
        assert_eq!(record.method, ScanMethod::Face);

        let record: ScanRecord =
            serde_json::from_str(r#"{"palmFlag": 1, "cardFlag": 1, "resultFlag": 1}"#).unwrap();
        assert_eq!(record.method, ScanMethod::Palm);

        let record: ScanRecord = serde_json::from_str(r#"{"fingerFlag": 1}"#).unwrap();
        assert_eq!(record.method, ScanMethod::Finger);
    }

    #[test]
    fn test_scan_outcome_stranger_override() {
        let record: ScanRecord =
            serde_json::from_str(r#"{"faceFlag": 1, "resultFlag": 1, "strangerFlag": 1}"#)
                .unwrap();
        assert_eq!(record.outcome, ScanOutcome::Stranger);
    }

    #[test]
    fn test_scan_outcome_codes() {
        for (flag, expected) in [
            (1, ScanOutcome::Success),
            (2, ScanOutcome::Failed),
            (3, ScanOutcome::NoPermission),
            (9, ScanOutcome::Unknown),
        ] {
            let record: ScanRecord =
                serde_json::from_str(&format!(r#"{{"faceFlag": 1, "resultFlag": {}}}"#, flag))
                    .unwrap();
            assert_eq!(record.outcome, expected);
        }
    }

    #[test]
    fn test_holiday_blank_days_become_null() {
        let settings = HolidaySettings::from_form(3, ["1", "", "", "", "", "", ""]);
        let value = serde_json::to_value(&settings).unwrap();
        assert_eq!(value["day1"], serde_json::json!(1));
        assert_eq!(value["day2"], serde_json::Value::Null);
        assert_eq!(value["day7"], serde_json::Value::Null);
    }

    #[test]
    fn test_request_state_terminality() {
        assert!(!RequestState::Pending.is_terminal());
        assert!(RequestState::Approved.is_terminal());
        assert!(RequestState::Rejected.is_terminal());
        assert_eq!(Decision::Approve.resulting_state(), RequestState::Approved);
        assert_eq!(Decision::Reject.as_wire(), "Rejected");
    }
}
