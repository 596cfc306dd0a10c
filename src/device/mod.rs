//! Biometric Device Middleware Proxy
//!
//! Client for the backend's device-proxy surface. The middleware
//! coordinates from `[device]` config are injected at construction and
//! forwarded verbatim in the body of every call; nothing here reads
//! ambient state.

pub mod enrollment;
pub mod scan;

use crate::client::ApiClient;
use crate::config::DeviceConfig;
use crate::error::{ClientError, ClientResult};
use crate::model::{Person, ScanRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Result of a connectivity probe against the middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// Probe in flight.
    Checking,
    /// The device-info proxy answered.
    Connected,
    /// The probe failed; shown to the operator, never retried
    /// automatically.
    Disconnected,
}

/// Middleware coordinates as the proxy endpoints expect them.
#[derive(Debug, Serialize)]
struct DeviceBag<'a> {
    #[serde(rename = "middlewareIP")]
    middleware_ip: &'a str,
    #[serde(rename = "deviceKey")]
    device_key: &'a str,
    secret: &'a str,
}

/// Body wrapper joining the coordinate bag with call-specific fields.
#[derive(Debug, Serialize)]
struct DeviceBody<'a, T: Serialize> {
    #[serde(flatten)]
    bag: DeviceBag<'a>,
    #[serde(flatten)]
    extra: T,
}

#[derive(Debug, Serialize)]
struct Empty {}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceRecord {
    pub face_id: String,
    #[serde(default)]
    pub person_sn: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PalmRecord {
    pub palm_id: String,
    #[serde(default)]
    pub person_sn: Option<String>,
}

/// Device middleware client, layered over the backend proxy.
pub struct DeviceClient {
    api: Arc<ApiClient>,
    device: DeviceConfig,
}

impl DeviceClient {
    pub fn new(api: Arc<ApiClient>, device: DeviceConfig) -> Self {
        Self { api, device }
    }

    pub fn device_config(&self) -> &DeviceConfig {
        &self.device
    }

    fn bag(&self) -> DeviceBag<'_> {
        DeviceBag {
            middleware_ip: &self.device.middleware_ip,
            device_key: &self.device.device_key,
            secret: &self.device.secret,
        }
    }

    /// POST to a proxy endpoint with the coordinate bag plus `extra`.
    async fn proxy<T: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        extra: T,
    ) -> ClientResult<R> {
        if !self.device.is_complete() {
            return Err(ClientError::Validation(
                "device middleware is not configured".to_string(),
            ));
        }
        let body = DeviceBody {
            bag: self.bag(),
            extra,
        };
        self.api.post_json(path, &body).await
    }

    /// Like [`proxy`], but for enrollment mutations that must not
    /// duplicate on retry.
    async fn proxy_idempotent<T: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        extra: T,
    ) -> ClientResult<R> {
        if !self.device.is_complete() {
            return Err(ClientError::Validation(
                "device middleware is not configured".to_string(),
            ));
        }
        let body = DeviceBody {
            bag: self.bag(),
            extra,
        };
        self.api.post_idempotent(path, &body).await
    }

    /// Fetch raw device info.
    pub async fn device_info(&self) -> ClientResult<serde_json::Value> {
        self.proxy("/api/device/info", Empty {}).await
    }

    /// Single connectivity probe: any answer from the device-info
    /// proxy means connected, any failure means disconnected.
    pub async fn check_connection(&self) -> ConnectionState {
        match self.device_info().await {
            Ok(_) => ConnectionState::Connected,
            Err(e) => {
                tracing::warn!(error = %e, "Device connection check failed");
                ConnectionState::Disconnected
            }
        }
    }

    /// List persons enrolled on the device.
    pub async fn persons(&self) -> ClientResult<Vec<Person>> {
        self.proxy("/api/device/persons", Empty {}).await
    }

    /// Remove a person and all their biometrics. Destructive; callers
    /// confirm before invoking.
    pub async fn delete_person(&self, person_sn: &str) -> ClientResult<()> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            person_sn: &'a str,
        }
        let _: serde_json::Value = self
            .proxy("/api/device/person/delete", Body { person_sn })
            .await?;
        Ok(())
    }

    /// Faces on file for a person. An empty list means none enrolled.
    pub async fn find_faces(&self, person_sn: &str) -> ClientResult<Vec<FaceRecord>> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            person_sn: &'a str,
        }
        self.proxy("/api/device/face/find", Body { person_sn }).await
    }

    /// Remove one registered face. Destructive; callers confirm.
    pub async fn delete_face(&self, person_sn: &str, face_id: &str) -> ClientResult<()> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            person_sn: &'a str,
            face_id: &'a str,
        }
        let _: serde_json::Value = self
            .proxy("/api/device/face/delete", Body { person_sn, face_id })
            .await?;
        Ok(())
    }

    /// Palms on file for a person.
    pub async fn find_palms(&self, person_sn: &str) -> ClientResult<Vec<PalmRecord>> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            person_sn: &'a str,
        }
        self.proxy("/api/palm/find", Body { person_sn }).await
    }

    /// Fetch recent scan events, newest first.
    pub async fn scan_records(&self, limit: Option<u32>) -> ClientResult<Vec<ScanRecord>> {
        #[derive(Serialize)]
        struct Body {
            #[serde(skip_serializing_if = "Option::is_none")]
            limit: Option<u32>,
        }
        self.proxy("/api/device/scan/records", Body { limit }).await
    }

    /// Point the middleware's event callback at `url`.
    pub async fn set_callback_url(&self, url: &str) -> ClientResult<()> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            callback_url: &'a str,
        }
        let _: serde_json::Value = self
            .proxy("/api/device/set-callback-url", Body { callback_url: url })
            .await?;
        Ok(())
    }

    /// Push the current time to the device clock.
    pub async fn sync_time(&self) -> ClientResult<()> {
        let _: serde_json::Value = self.proxy("/api/device/sync-time", Empty {}).await?;
        Ok(())
    }

    /// Reboot the device. Destructive; callers confirm.
    pub async fn restart(&self) -> ClientResult<()> {
        let _: serde_json::Value = self.proxy("/api/device/restart", Empty {}).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;

    fn device_config() -> DeviceConfig {
        DeviceConfig {
            middleware_ip: "10.0.0.5".into(),
            device_key: "key".into(),
            secret: "shh".into(),
        }
    }

    #[test]
    fn test_body_merges_bag_and_extra() {
        let config = device_config();
        let body = DeviceBody {
            bag: DeviceBag {
                middleware_ip: &config.middleware_ip,
                device_key: &config.device_key,
                secret: &config.secret,
            },
            extra: serde_json::json!({"personSn": "P-1"}),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["middlewareIP"], "10.0.0.5");
        assert_eq!(value["deviceKey"], "key");
        assert_eq!(value["secret"], "shh");
        assert_eq!(value["personSn"], "P-1");
    }

    #[tokio::test]
    async fn test_incomplete_config_rejected_before_any_call() {
        let api = Arc::new(ApiClient::new(ApiConfig::default()));
        let client = DeviceClient::new(api, DeviceConfig::default());
        let err = client.persons().await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }
}
