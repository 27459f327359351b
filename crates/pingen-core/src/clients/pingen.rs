//! Pingen HTTP client for the identity and JSON:API resource services

use super::jsonapi::{add_query, ApiResponse, RawResponse};
use super::traits::{PingenApi, UploadSlot};
use crate::config::Settings;
use crate::constants::{
    IDEMPOTENCY_KEY_HEADER, JSON_API_CONTENT_TYPE, MIN_UPLOAD_TIMEOUT_SECS, USER_AGENT,
};
use crate::envelope::Envelope;
use crate::error::{PingenError, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Client as HttpClient, Method, RequestBuilder};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Timeout used for file uploads: the configured timeout, but never below the upload minimum
pub fn upload_timeout(configured: Duration) -> Duration {
    configured.max(Duration::from_secs(MIN_UPLOAD_TIMEOUT_SECS))
}

pub struct PingenClient {
    api_base: String,
    identity_base: String,
    http_client: HttpClient,
}

impl PingenClient {
    pub fn new(api_base: &str, identity_base: &str, timeout: Duration) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            identity_base: identity_base.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    pub fn from_settings(settings: &Settings, timeout: Duration) -> Result<Self> {
        Self::new(&settings.api_base, &settings.identity_base, timeout)
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn identity_base(&self) -> &str {
        &self.identity_base
    }

    /// Prepare a JSON:API request with bearer auth and an optional idempotency key
    fn json_api_request(
        &self,
        method: Method,
        url: &str,
        token: &str,
        payload: Option<&Value>,
        idempotency_key: Option<&str>,
    ) -> Result<RequestBuilder> {
        let mut request = self
            .http_client
            .request(method, url)
            .header(ACCEPT, JSON_API_CONTENT_TYPE)
            .header(CONTENT_TYPE, JSON_API_CONTENT_TYPE);

        if !token.is_empty() {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        if let Some(key) = idempotency_key.filter(|key| !key.is_empty()) {
            request = request.header(IDEMPOTENCY_KEY_HEADER, key);
        }
        if let Some(payload) = payload {
            request = request.body(serde_json::to_vec(payload)?);
        }
        Ok(request)
    }

    /// Send a request and read the whole response
    async fn execute(&self, request: RequestBuilder) -> Result<RawResponse> {
        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();
        log::debug!("Response status {} ({} bytes)", status, body.len());
        Ok(RawResponse { status, headers, body })
    }

    async fn get_json_api(&self, url: &str, token: &str, failure: &str) -> Result<ApiResponse> {
        log::debug!("GET {}", url);
        let request = self.json_api_request(Method::GET, url, token, None, None)?;
        self.execute(request)
            .await?
            .expect_status(&[200], failure)?
            .into_api_response()
    }
}

#[async_trait]
impl PingenApi for PingenClient {
    async fn get_token(&self, client_id: &str, client_secret: &str, scope: &str) -> Result<ApiResponse> {
        let url = format!("{}/auth/access-tokens", self.identity_base);
        let mut form = vec![
            ("grant_type", "client_credentials"),
            ("client_id", client_id),
            ("client_secret", client_secret),
        ];
        if !scope.is_empty() {
            form.push(("scope", scope));
        }

        log::debug!("POST {}", url);
        let request = self
            .http_client
            .post(&url)
            .header(ACCEPT, "application/json")
            .form(&form);

        self.execute(request)
            .await?
            .expect_status(&[200], "token request failed")?
            .into_api_response()
    }

    async fn list_organisations(&self, token: &str, params: &BTreeMap<String, String>) -> Result<ApiResponse> {
        let url = add_query(&format!("{}/organisations", self.api_base), params);
        self.get_json_api(&url, token, "list organisations failed").await
    }

    async fn list_letters(
        &self,
        token: &str,
        organisation_id: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<ApiResponse> {
        let url = add_query(
            &format!("{}/organisations/{}/letters", self.api_base, organisation_id),
            params,
        );
        self.get_json_api(&url, token, "list letters failed").await
    }

    async fn get_letter(&self, token: &str, organisation_id: &str, letter_id: &str) -> Result<ApiResponse> {
        let url = format!(
            "{}/organisations/{}/letters/{}",
            self.api_base, organisation_id, letter_id
        );
        self.get_json_api(&url, token, "get letter failed").await
    }

    async fn get_file_upload(&self, token: &str) -> Result<UploadSlot> {
        let url = format!("{}/file-upload", self.api_base);
        let response = self.get_json_api(&url, token, "file upload request failed").await?;
        let status = 200;

        let data = response.body.data();
        if !data.is_object() {
            return Err(PingenError::api("file upload response missing data", status, None));
        }
        let attributes = data.at(&["attributes"]);
        if !attributes.is_object() {
            return Err(PingenError::api(
                "file upload response missing attributes",
                status,
                None,
            ));
        }

        let url = attributes.str_at(&["url"]);
        let signature = attributes.str_at(&["url_signature"]);
        if url.is_empty() || signature.is_empty() {
            return Err(PingenError::api("file upload response missing url data", status, None));
        }

        Ok(UploadSlot {
            url: url.to_string(),
            signature: signature.to_string(),
        })
    }

    async fn upload_file(&self, upload_url: &str, path: &Path, timeout: Duration) -> Result<()> {
        let bytes = tokio::fs::read(path).await?;
        log::debug!("PUT {} bytes to upload url (timeout {:?})", bytes.len(), timeout);

        let request = self
            .http_client
            .put(upload_url)
            .timeout(timeout)
            .header(CONTENT_LENGTH, bytes.len())
            .body(bytes);

        self.execute(request)
            .await?
            .expect_status(&[200, 201, 204], "file upload failed")?;
        Ok(())
    }

    async fn create_letter(
        &self,
        token: &str,
        organisation_id: &str,
        payload: &Value,
        idempotency_key: Option<&str>,
    ) -> Result<ApiResponse> {
        let url = format!("{}/organisations/{}/letters", self.api_base, organisation_id);
        log::debug!("POST {}", url);
        let request =
            self.json_api_request(Method::POST, &url, token, Some(payload), idempotency_key)?;
        self.execute(request)
            .await?
            .expect_status(&[200, 201], "create letter failed")?
            .into_api_response()
    }

    async fn send_letter(
        &self,
        token: &str,
        organisation_id: &str,
        letter_id: &str,
        payload: &Value,
        idempotency_key: Option<&str>,
    ) -> Result<ApiResponse> {
        let url = format!(
            "{}/organisations/{}/letters/{}/send",
            self.api_base, organisation_id, letter_id
        );
        log::debug!("PATCH {}", url);
        let request =
            self.json_api_request(Method::PATCH, &url, token, Some(payload), idempotency_key)?;
        self.execute(request)
            .await?
            .expect_status(&[200, 204], "send letter failed")?
            .into_api_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_timeout_has_floor() {
        assert_eq!(upload_timeout(Duration::from_secs(5)), Duration::from_secs(60));
        assert_eq!(upload_timeout(Duration::from_secs(120)), Duration::from_secs(120));
    }

    #[test]
    fn test_trailing_slashes_trimmed() {
        let client = PingenClient::new(
            "https://api.example.test/",
            "https://identity.example.test//",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(client.api_base(), "https://api.example.test");
        assert_eq!(client.identity_base(), "https://identity.example.test");
    }
}
