//! JSON:API request/response plumbing shared by the Pingen endpoints

use crate::constants::REQUEST_ID_HEADER;
use crate::envelope::empty_object;
use crate::error::{PingenError, Result};
use reqwest::header::HeaderMap;
use reqwest::{StatusCode, Url};
use serde_json::Value;
use std::collections::BTreeMap;

/// A decoded response envelope together with the response headers
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub body: Value,
    pub headers: HeaderMap,
}

impl ApiResponse {
    pub fn new(body: Value, headers: HeaderMap) -> Self {
        Self { body, headers }
    }

    /// Value of the request-correlation header, if the service sent one
    pub fn request_id(&self) -> Option<String> {
        request_id(&self.headers)
    }
}

/// Raw outcome of one HTTP exchange before classification
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Fail with an API error unless the status is one of `accepted`
    pub fn expect_status(self, accepted: &[u16], failure: &str) -> Result<Self> {
        if accepted.contains(&self.status.as_u16()) {
            return Ok(self);
        }
        log::debug!(
            "{}: status {} body {}",
            failure,
            self.status,
            String::from_utf8_lossy(&self.body)
        );
        Err(PingenError::api(
            failure,
            self.status.as_u16(),
            request_id(&self.headers),
        ))
    }

    /// Decode the body into an [`ApiResponse`]
    pub fn into_api_response(self) -> Result<ApiResponse> {
        let body = decode_body(&self.body)?;
        Ok(ApiResponse::new(body, self.headers))
    }
}

/// Decode a response body into a JSON object. An empty body decodes to an empty object.
pub fn decode_body(body: &[u8]) -> Result<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(empty_object());
    }
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| PingenError::Protocol(format!("invalid JSON in response body: {}", e)))?;
    if !value.is_object() {
        return Err(PingenError::Protocol(
            "response body is not a JSON object".to_string(),
        ));
    }
    Ok(value)
}

pub fn request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Set each non-empty parameter on `endpoint`'s query string.
///
/// Existing parameters that are not overridden are kept. Keys are emitted in
/// sorted order.
pub fn add_query(endpoint: &str, params: &BTreeMap<String, String>) -> String {
    if params.values().all(String::is_empty) {
        return endpoint.to_string();
    }

    let mut url = match Url::parse(endpoint) {
        Ok(url) => url,
        Err(e) => {
            log::warn!("Cannot add query parameters to {}: {}", endpoint, e);
            return endpoint.to_string();
        }
    };

    let mut values: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in url.query_pairs() {
        values.entry(key.into_owned()).or_default().push(value.into_owned());
    }
    for (key, value) in params {
        if value.is_empty() {
            continue;
        }
        values.insert(key.clone(), vec![value.clone()]);
    }

    url.query_pairs_mut()
        .clear()
        .extend_pairs(
            values
                .iter()
                .flat_map(|(key, list)| list.iter().map(move |value| (key, value))),
        );
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_decode_empty_body_is_empty_object() {
        assert_eq!(decode_body(b"").unwrap(), empty_object());
        assert_eq!(decode_body(b"  \n").unwrap(), empty_object());
    }

    #[test]
    fn test_decode_non_object_body_is_protocol_error() {
        assert!(matches!(decode_body(b"[1,2]").unwrap_err(), PingenError::Protocol(_)));
        assert!(matches!(decode_body(b"\"ok\"").unwrap_err(), PingenError::Protocol(_)));
    }

    #[test]
    fn test_decode_malformed_body_is_protocol_error() {
        let err = decode_body(b"<html>oops</html>").unwrap_err();
        assert!(matches!(err, PingenError::Protocol(_)));
    }

    #[test]
    fn test_add_query_encodes_brackets() {
        let url = add_query(
            "https://api.example.test/organisations",
            &params(&[("page[number]", "2")]),
        );
        assert_eq!(url, "https://api.example.test/organisations?page%5Bnumber%5D=2");
    }

    #[test]
    fn test_add_query_preserves_existing_parameters() {
        let url = add_query(
            "https://api.example.test/letters?sort=created_at&q=old",
            &params(&[("q", "new"), ("filter", "")]),
        );
        assert_eq!(url, "https://api.example.test/letters?q=new&sort=created_at");
    }

    #[test]
    fn test_add_query_without_params_is_identity() {
        let endpoint = "https://api.example.test/letters?x=1";
        assert_eq!(add_query(endpoint, &BTreeMap::new()), endpoint);
        assert_eq!(add_query(endpoint, &params(&[("sort", "")])), endpoint);
    }

    #[test]
    fn test_expect_status_carries_request_id() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("abc-123"));
        let raw = RawResponse {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            headers,
            body: Vec::new(),
        };
        match raw.expect_status(&[200, 201], "create letter failed") {
            Err(PingenError::Api { message, status, request_id }) => {
                assert_eq!(message, "create letter failed");
                assert_eq!(status, 422);
                assert_eq!(request_id.as_deref(), Some("abc-123"));
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[test]
    fn test_expect_status_accepts_listed_codes() {
        let raw = RawResponse {
            status: StatusCode::NO_CONTENT,
            headers: HeaderMap::new(),
            body: Vec::new(),
        };
        let response = raw.expect_status(&[200, 204], "send letter failed").unwrap();
        assert_eq!(response.into_api_response().unwrap().body, empty_object());
    }
}
