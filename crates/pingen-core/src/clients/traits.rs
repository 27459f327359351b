//! Transport seam between the workflows and the Pingen HTTP services

use super::jsonapi::ApiResponse;
use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// One-time upload target handed out by `GET /file-upload`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSlot {
    pub url: String,
    pub signature: String,
}

/// Every call the CLI makes against the identity and resource services.
///
/// Each method performs exactly one HTTP exchange. Implemented by
/// [`super::PingenClient`]; tests substitute recording fakes.
#[async_trait]
pub trait PingenApi: Send + Sync {
    /// `POST <identity>/auth/access-tokens` with the client-credentials grant.
    /// An empty `scope` is left out of the form.
    async fn get_token(&self, client_id: &str, client_secret: &str, scope: &str) -> Result<ApiResponse>;

    async fn list_organisations(&self, token: &str, params: &BTreeMap<String, String>) -> Result<ApiResponse>;

    async fn list_letters(
        &self,
        token: &str,
        organisation_id: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<ApiResponse>;

    async fn get_letter(&self, token: &str, organisation_id: &str, letter_id: &str) -> Result<ApiResponse>;

    async fn get_file_upload(&self, token: &str) -> Result<UploadSlot>;

    /// PUT the whole file at `path` to a presigned `upload_url`
    async fn upload_file(&self, upload_url: &str, path: &Path, timeout: Duration) -> Result<()>;

    async fn create_letter(
        &self,
        token: &str,
        organisation_id: &str,
        payload: &Value,
        idempotency_key: Option<&str>,
    ) -> Result<ApiResponse>;

    async fn send_letter(
        &self,
        token: &str,
        organisation_id: &str,
        letter_id: &str,
        payload: &Value,
        idempotency_key: Option<&str>,
    ) -> Result<ApiResponse>;
}
