//! Reports and Dashboard Aggregation
//!
//! KPI listing, the xlsx export download, and the dashboard summary
//! that fans out to several endpoints and reduces them to simple
//! percentages.

use super::attendance::AttendanceFilter;
use super::ApiClient;
use crate::error::ClientResult;
use crate::model::KpiReport;
use serde::Serialize;
use std::path::Path;

/// Date range for report export (inclusive, `YYYY-MM-DD`).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRange {
    pub start_date: String,
    pub end_date: String,
}

/// Aggregate numbers shown on the admin dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub total_records: usize,
    pub present: usize,
    pub late: usize,
    pub absent: usize,
    pub present_pct: f64,
    pub late_pct: f64,
    pub pending_requests: usize,
}

impl DashboardSummary {
    fn pct(part: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            part as f64 * 100.0 / total as f64
        }
    }
}

impl ApiClient {
    /// Fetch per-employee KPI scores.
    pub async fn kpi_reports(&self, range: &ReportRange) -> ClientResult<Vec<KpiReport>> {
        self.get_json_query("/api/reports/kpi", range).await
    }

    /// Download the xlsx export and write it to `dest`.
    pub async fn export_excel(&self, range: &ReportRange, dest: &Path) -> ClientResult<u64> {
        let bytes = self.get_bytes("/api/reports/export-excel", range).await?;
        let len = bytes.len() as u64;
        tokio::fs::write(dest, bytes).await?;
        tracing::info!(dest = %dest.display(), bytes = len, "Report exported");
        Ok(len)
    }

    /// Build the dashboard summary. Attendance and pending-request
    /// fetches run concurrently; percentages are computed over the
    /// returned attendance set.
    pub async fn dashboard_summary(
        &self,
        filter: &AttendanceFilter,
    ) -> ClientResult<DashboardSummary> {
        let (attendances, pending) =
            tokio::join!(self.list_attendances(filter), self.pending_requests());
        let attendances = attendances?;
        let pending = pending?;

        let total = attendances.len();
        let mut present = 0;
        let mut late = 0;
        for record in &attendances {
            match record.badge() {
                "Late" => late += 1,
                badge if record.check_in.is_some() || badge == "Hadir" => present += 1,
                _ => {}
            }
        }
        let absent = total - present - late;

        Ok(DashboardSummary {
            total_records: total,
            present,
            late,
            absent,
            present_pct: DashboardSummary::pct(present, total),
            late_pct: DashboardSummary::pct(late, total),
            pending_requests: pending.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pct_handles_empty_set() {
        assert_eq!(DashboardSummary::pct(0, 0), 0.0);
        assert_eq!(DashboardSummary::pct(1, 4), 25.0);
    }

    #[test]
    fn test_report_range_query_shape() {
        let range = ReportRange {
            start_date: "2026-08-01".into(),
            end_date: "2026-08-31".into(),
        };
        let value = serde_json::to_value(&range).unwrap();
        assert_eq!(value["startDate"], "2026-08-01");
        assert_eq!(value["endDate"], "2026-08-31");
    }
}
