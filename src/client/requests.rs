//! Status-Change Request Approval
//!
//! Admin workflow for reviewing user-submitted requests to change a
//! recorded attendance status. `Pending -> {Approved, Rejected}`, both
//! terminal; a decision re-fetches the pending set and signals
//! attendance views to reload.

use super::ApiClient;
use crate::error::{ClientError, ClientResult};
use crate::events::{AppEvent, EventBus};
use crate::model::{Decision, RequestState, StatusRequest};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DecisionBody<'a> {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'a str>,
}

impl ApiClient {
    /// Fetch all requests still awaiting a decision.
    pub async fn pending_requests(&self) -> ClientResult<Vec<StatusRequest>> {
        self.get_json("/api/attendance-status-requests/pending")
            .await
    }

    /// Submit a decision for one request.
    pub async fn decide_request(
        &self,
        request_id: u64,
        decision: Decision,
        note: Option<&str>,
    ) -> ClientResult<()> {
        let body = DecisionBody {
            status: decision.as_wire(),
            note,
        };
        self.put_unit(
            &format!("/api/attendance-status-requests/{}", request_id),
            &body,
        )
        .await
    }
}

/// Stateful review session over the pending set. Guards against
/// deciding a request that is no longer pending and keeps the local
/// list in step with the backend after each decision.
pub struct ReviewSession {
    client: Arc<ApiClient>,
    bus: EventBus,
    pending: Vec<StatusRequest>,
}

impl ReviewSession {
    pub fn new(client: Arc<ApiClient>, bus: EventBus) -> Self {
        Self {
            client,
            bus,
            pending: Vec::new(),
        }
    }

    pub fn pending(&self) -> &[StatusRequest] {
        &self.pending
    }

    /// Reload the pending set from the backend.
    pub async fn refresh(&mut self) -> ClientResult<&[StatusRequest]> {
        self.pending = self.client.pending_requests().await?;
        Ok(&self.pending)
    }

    /// Decide one pending request. The transition is terminal: a
    /// request not currently in the pending set (or already decided)
    /// is rejected client-side before any call is made. On success the
    /// pending set is re-fetched and refresh events are published.
    pub async fn decide(
        &mut self,
        request_id: u64,
        decision: Decision,
        note: Option<&str>,
    ) -> ClientResult<RequestState> {
        let request = self
            .pending
            .iter()
            .find(|r| r.id == request_id)
            .ok_or_else(|| {
                ClientError::Validation(format!("request {} is not pending", request_id))
            })?;

        if request.state.is_terminal() {
            return Err(ClientError::Validation(format!(
                "request {} was already decided",
                request_id
            )));
        }

        self.client
            .decide_request(request_id, decision, note)
            .await?;

        tracing::info!(
            request_id,
            decision = decision.as_wire(),
            "Status-change request decided"
        );

        // Reload rather than patching locally; the backend owns the
        // authoritative list.
        self.pending = self.client.pending_requests().await?;

        self.bus.publish(AppEvent::AttendanceRefreshed);
        self.bus.publish(AppEvent::NotificationsChanged);

        Ok(decision.resulting_state())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_body_wire_shape() {
        let body = DecisionBody {
            status: Decision::Approve.as_wire(),
            note: Some("verified with supervisor"),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["status"], "Approved");
        assert_eq!(value["note"], "verified with supervisor");

        let body = DecisionBody {
            status: Decision::Reject.as_wire(),
            note: None,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.as_object().unwrap().get("note").is_none());
    }

    fn pending_request(id: u64) -> StatusRequest {
        StatusRequest {
            id,
            attendance_id: 10 + id,
            user_name: Some("Budi".into()),
            current_status: "Late".into(),
            requested_status: "On Time".into(),
            reason: Some("traffic accident on route".into()),
            state: RequestState::Pending,
            note: None,
        }
    }

    #[tokio::test]
    async fn test_decide_unknown_request_fails_client_side() {
        let client = Arc::new(ApiClient::new(Default::default()));
        let mut session = ReviewSession::new(client, EventBus::default());
        session.pending = vec![pending_request(1)];

        // Request 99 is not in the pending set; no network call happens.
        let err = session
            .decide(99, Decision::Approve, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[tokio::test]
    async fn test_decide_already_terminal_fails_client_side() {
        let client = Arc::new(ApiClient::new(Default::default()));
        let mut session = ReviewSession::new(client, EventBus::default());
        let mut request = pending_request(4);
        request.state = RequestState::Approved;
        session.pending = vec![request];

        let err = session
            .decide(4, Decision::Reject, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }
}
