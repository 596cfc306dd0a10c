//! Backend REST Client
//!
//! HTTP client for the attendance backend. Carries the bearer token on
//! every call, maps transport failures onto [`ClientError`], and gives
//! mutations bounded retries behind a reused idempotency key so a
//! retried submission cannot create a duplicate record.

pub mod attendance;
pub mod reports;
pub mod requests;
pub mod schedule;

use crate::config::ApiConfig;
use crate::error::{ClientError, ClientResult};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

/// Header carrying the idempotency key for mutation retries.
const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// Attendance backend API client
pub struct ApiClient {
    client: Client,
    config: ApiConfig,
}

impl ApiClient {
    /// Create a new client with the given configuration
    pub fn new(config: ApiConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    /// Get the current configuration
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Attach the bearer token when one is configured.
    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        if self.config.auth_token.is_empty() {
            builder
        } else {
            builder.bearer_auth(&self.config.auth_token)
        }
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        if response.status().is_success() {
            response.json().await.map_err(ClientError::Request)
        } else {
            Err(ClientError::from_response(response).await)
        }
    }

    async fn read_unit(response: reqwest::Response) -> ClientResult<()> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(ClientError::from_response(response).await)
        }
    }

    /// GET a JSON resource.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let response = self
            .authed(self.client.get(self.url(path)))
            .send()
            .await
            .map_err(ClientError::from_transport)?;

        Self::read_json(response).await
    }

    /// GET a JSON resource with query parameters.
    pub(crate) async fn get_json_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> ClientResult<T> {
        let response = self
            .authed(self.client.get(self.url(path)).query(query))
            .send()
            .await
            .map_err(ClientError::from_transport)?;

        Self::read_json(response).await
    }

    /// GET a binary resource (report downloads).
    pub(crate) async fn get_bytes<Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> ClientResult<Vec<u8>> {
        let response = self
            .authed(self.client.get(self.url(path)).query(query))
            .send()
            .await
            .map_err(ClientError::from_transport)?;

        if response.status().is_success() {
            Ok(response.bytes().await.map_err(ClientError::Request)?.to_vec())
        } else {
            Err(ClientError::from_response(response).await)
        }
    }

    /// POST a body and decode the JSON response.
    pub(crate) async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let response = self
            .authed(self.client.post(self.url(path)).json(body))
            .send()
            .await
            .map_err(ClientError::from_transport)?;

        Self::read_json(response).await
    }

    /// PUT a body, ignoring the response payload.
    pub(crate) async fn put_unit<B: Serialize>(&self, path: &str, body: &B) -> ClientResult<()> {
        let response = self
            .authed(self.client.put(self.url(path)).json(body))
            .send()
            .await
            .map_err(ClientError::from_transport)?;

        Self::read_unit(response).await
    }

    /// DELETE a resource.
    pub(crate) async fn delete_unit(&self, path: &str) -> ClientResult<()> {
        let response = self
            .authed(self.client.delete(self.url(path)))
            .send()
            .await
            .map_err(ClientError::from_transport)?;

        Self::read_unit(response).await
    }

    /// POST a mutation with bounded retries. The idempotency key is
    /// generated once and reused on every attempt, so the backend can
    /// deduplicate a submission retried after a timeout. Only transient
    /// failures are retried; a definitive rejection returns at once.
    pub(crate) async fn post_idempotent<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let key = Uuid::new_v4().to_string();
        let mut last_error = ClientError::Unavailable;

        for attempt in 0..self.config.max_retries.max(1) {
            if attempt > 0 {
                let delay = std::time::Duration::from_secs((attempt as u64).pow(2));
                tokio::time::sleep(delay).await;
                tracing::debug!(path, attempt, "Retrying mutation");
            }

            let result = self
                .authed(
                    self.client
                        .post(self.url(path))
                        .header(IDEMPOTENCY_HEADER, &key)
                        .json(body),
                )
                .send()
                .await;

            match result {
                Ok(response) => {
                    if response.status().is_success() {
                        return Self::read_json(response).await;
                    }
                    return Err(ClientError::from_response(response).await);
                }
                Err(e) => {
                    let mapped = ClientError::from_transport(e);
                    if !mapped.is_transient() {
                        return Err(mapped);
                    }
                    last_error = mapped;
                }
            }
        }

        Err(last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let mut config = ApiConfig::default();
        config.base_url = "http://localhost:4000/".to_string();
        let client = ApiClient::new(config);
        assert_eq!(
            client.url("/api/attendances"),
            "http://localhost:4000/api/attendances"
        );
    }

    #[test]
    fn test_config_accessor() {
        let client = ApiClient::new(ApiConfig::default());
        assert_eq!(client.config().base_url, "http://localhost:4000");
    }
}
