//! Shared test doubles for the Pingen integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use pingen_core::clients::{ApiResponse, PingenApi, UploadSlot};
use pingen_core::{PingenConfig, PingenError, Result, Settings};
use reqwest::header::HeaderMap;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

/// One recorded call against [`RecordingApi`]
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Token { scope: String },
    ListOrganisations(BTreeMap<String, String>),
    ListLetters { organisation_id: String },
    GetLetter { letter_id: String },
    FileUpload { token: String },
    Upload { url: String, timeout: Duration },
    Create { token: String, payload: Value, idempotency_key: Option<String> },
    Send { letter_id: String, payload: Value, idempotency_key: Option<String> },
}

/// In-memory [`PingenApi`] that records every call in order
pub struct RecordingApi {
    calls: Mutex<Vec<Call>>,
    pub token_body: Value,
    pub fail_upload: bool,
}

impl RecordingApi {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            token_body: json!({"access_token": "fresh-token", "expires_in": 3600}),
            fail_upload: false,
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_names(&self) -> Vec<&'static str> {
        self.calls()
            .iter()
            .map(|call| match call {
                Call::Token { .. } => "token",
                Call::ListOrganisations(_) => "list_organisations",
                Call::ListLetters { .. } => "list_letters",
                Call::GetLetter { .. } => "get_letter",
                Call::FileUpload { .. } => "file_upload",
                Call::Upload { .. } => "upload",
                Call::Create { .. } => "create",
                Call::Send { .. } => "send",
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn ok(body: Value) -> Result<ApiResponse> {
    Ok(ApiResponse::new(body, HeaderMap::new()))
}

#[async_trait]
impl PingenApi for RecordingApi {
    async fn get_token(&self, _client_id: &str, _client_secret: &str, scope: &str) -> Result<ApiResponse> {
        self.record(Call::Token { scope: scope.to_string() });
        ok(self.token_body.clone())
    }

    async fn list_organisations(&self, _token: &str, params: &BTreeMap<String, String>) -> Result<ApiResponse> {
        self.record(Call::ListOrganisations(params.clone()));
        ok(json!({"data": []}))
    }

    async fn list_letters(
        &self,
        _token: &str,
        organisation_id: &str,
        _params: &BTreeMap<String, String>,
    ) -> Result<ApiResponse> {
        self.record(Call::ListLetters {
            organisation_id: organisation_id.to_string(),
        });
        ok(json!({"data": []}))
    }

    async fn get_letter(&self, _token: &str, _organisation_id: &str, letter_id: &str) -> Result<ApiResponse> {
        self.record(Call::GetLetter {
            letter_id: letter_id.to_string(),
        });
        ok(json!({"data": {"id": letter_id}}))
    }

    async fn get_file_upload(&self, token: &str) -> Result<UploadSlot> {
        self.record(Call::FileUpload {
            token: token.to_string(),
        });
        Ok(UploadSlot {
            url: "https://upload.example.test/slot-1".to_string(),
            signature: "sig-1".to_string(),
        })
    }

    async fn upload_file(&self, upload_url: &str, _path: &Path, timeout: Duration) -> Result<()> {
        self.record(Call::Upload {
            url: upload_url.to_string(),
            timeout,
        });
        if self.fail_upload {
            return Err(PingenError::api("file upload failed", 403, None));
        }
        Ok(())
    }

    async fn create_letter(
        &self,
        token: &str,
        _organisation_id: &str,
        payload: &Value,
        idempotency_key: Option<&str>,
    ) -> Result<ApiResponse> {
        self.record(Call::Create {
            token: token.to_string(),
            payload: payload.clone(),
            idempotency_key: idempotency_key.map(str::to_string),
        });
        ok(json!({
            "data": {
                "id": "letter-1",
                "type": "letters",
                "attributes": {
                    "status": "validating",
                    "file_original_name": payload["data"]["attributes"]["file_original_name"],
                }
            }
        }))
    }

    async fn send_letter(
        &self,
        _token: &str,
        _organisation_id: &str,
        letter_id: &str,
        payload: &Value,
        idempotency_key: Option<&str>,
    ) -> Result<ApiResponse> {
        self.record(Call::Send {
            letter_id: letter_id.to_string(),
            payload: payload.clone(),
            idempotency_key: idempotency_key.map(str::to_string),
        });
        ok(json!({}))
    }
}

/// Staging settings with client credentials and an organisation, but no token
pub fn staging_settings() -> Settings {
    let cli = PingenConfig {
        organisation_id: "org-1".to_string(),
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string(),
        ..Default::default()
    };
    let empty = PingenConfig::default();
    Settings::resolve(&empty, &empty, &cli).unwrap()
}
